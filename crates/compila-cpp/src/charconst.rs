/// Parse a single C character constant (`'x'`, `L'x'`, `u'x'`, `U'x'`,
/// `u8'x'`) into its integer code point, bounded to the prefix's maximum
/// width (spec §4.F step 1, Design Notes "Char-constant parsing"): `u8` is
/// 8-bit, `u` is 16-bit, `L`/`U` are 32-bit, no prefix is treated as the
/// plain (8-bit-clamped) `char` case.
///
/// `token` must be the full constant including prefix and surrounding
/// quotes. Returns `None` if `token` isn't a well-formed character constant.
pub fn parse_char_constant(token: &str) -> Option<i128> {
    let (prefix, rest) = split_prefix(token);
    let width = match prefix {
        "" => 8,
        "L" => 32,
        "u" => 16,
        "U" => 32,
        "u8" => 8,
        _ => return None,
    };

    let inner = rest.strip_prefix('\'')?.strip_suffix('\'')?;
    let value = parse_escaped_char(inner)?;
    let mask = if width >= 128 { !0i128 } else { (1i128 << width) - 1 };
    Some(value & mask)
}

fn split_prefix(token: &str) -> (&str, &str) {
    for prefix in ["u8", "L", "u", "U"] {
        if let Some(rest) = token.strip_prefix(prefix) {
            if rest.starts_with('\'') {
                return (prefix, rest);
            }
        }
    }
    ("", token)
}

/// Parse the content between the quotes of a character constant (after the
/// prefix and quote characters have been stripped) into a single code
/// point, honoring the standard C escape forms. An unrecognized escape
/// falls back to the code unit of the character right after the backslash.
fn parse_escaped_char(inner: &str) -> Option<i128> {
    let mut chars = inner.chars();
    let first = chars.next()?;
    if first != '\\' {
        // A single (possibly multi-byte) source character with no escape.
        return Some(first as i128);
    }

    let escape = chars.next()?;
    match escape {
        'a' => Some(0x07),
        'b' => Some(0x08),
        'f' => Some(0x0C),
        'n' => Some(0x0A),
        'r' => Some(0x0D),
        't' => Some(0x09),
        'v' => Some(0x0B),
        '\'' => Some('\'' as i128),
        '"' => Some('"' as i128),
        '\\' => Some('\\' as i128),
        '?' => Some('?' as i128),
        'x' => {
            let hex: String = chars.clone().collect();
            i128::from_str_radix(&hex, 16).ok()
        }
        'u' => {
            let hex: String = chars.clone().take(4).collect();
            i128::from_str_radix(&hex, 16).ok()
        }
        'U' => {
            let hex: String = chars.clone().take(8).collect();
            i128::from_str_radix(&hex, 16).ok()
        }
        '0'..='7' => {
            let mut digits = String::new();
            digits.push(escape);
            for c in chars.clone().take(2) {
                if ('0'..='7').contains(&c) {
                    digits.push(c);
                } else {
                    break;
                }
            }
            i128::from_str_radix(&digits, 8).ok()
        }
        // Unknown escape: fall back to the second character's code unit
        // (Design Notes "Char-constant parsing").
        other => Some(other as i128),
    }
}

/// Strip the standard integer-literal suffixes (`u`, `U`, `l`, `L`, and
/// combinations thereof) from the end of a numeric literal token, leaving
/// the numeric text untouched (spec §4.F step 2).
pub fn strip_integer_suffix(token: &str) -> &str {
    let trimmed = token.trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));
    if trimmed.is_empty() {
        token
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_char_constant() {
        assert_eq!(parse_char_constant("'A'"), Some(65));
    }

    #[test]
    fn wide_char_constant_with_unicode_escape() {
        assert_eq!(parse_char_constant("L'\\u0041'"), Some(65));
    }

    #[test]
    fn u8_char_constant_masks_to_eight_bits() {
        assert_eq!(parse_char_constant("u8'\\xFF'"), Some(0xFF));
    }

    #[test]
    fn standard_escapes_resolve_correctly() {
        assert_eq!(parse_char_constant(r"'\n'"), Some(0x0A));
        assert_eq!(parse_char_constant(r"'\0'"), Some(0));
        assert_eq!(parse_char_constant(r"'\\'"), Some(b'\\' as i128));
    }

    #[test]
    fn unknown_escape_falls_back_to_the_second_character() {
        assert_eq!(parse_char_constant(r"'\q'"), Some('q' as i128));
    }

    #[test]
    fn suffix_stripping_preserves_numeric_text() {
        assert_eq!(strip_integer_suffix("123UL"), "123");
        assert_eq!(strip_integer_suffix("42ull"), "42");
        assert_eq!(strip_integer_suffix("7"), "7");
    }
}
