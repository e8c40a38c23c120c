use crate::defines::{Define, Defines};

/// Recursion cap shared by conditional-expression macro pre-expansion and
/// the post-pass macro inliner (spec §4.F/§4.G: "Recursion is capped at a
/// fixed depth (25) to prevent runaway expansion").
pub const MAX_EXPANSION_DEPTH: usize = 25;

/// Macro-expand `text` against `defines`.
///
/// When `protect_defined` is set, the operand of a `defined` operator
/// (`defined NAME` or `defined(NAME)`) is copied verbatim rather than
/// macro-expanded, since `defined` must see the raw macro name (spec §4.F
/// step 3/5). The post-pass inliner (component G) does not need this, since
/// `defined` is only meaningful inside a conditional expression.
pub fn expand_text(text: &str, defines: &Defines, protect_defined: bool) -> String {
    expand_depth(text, defines, protect_defined, MAX_EXPANSION_DEPTH)
}

fn expand_depth(text: &str, defines: &Defines, protect_defined: bool, depth: usize) -> String {
    if depth == 0 {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let rest = &text[i..];
        let c = rest.chars().next().unwrap();

        if c == '"' || c == '\'' {
            let (literal, len) = copy_quoted(rest, c);
            out.push_str(literal);
            i += len;
            continue;
        }

        if is_ident_start(c) {
            let (word, len) = take_ident(rest);
            if protect_defined && word == "defined" {
                out.push_str(word);
                i += len;
                let (tail, tail_len) = copy_defined_operand(&text[i..]);
                out.push_str(&tail);
                i += tail_len;
                continue;
            }

            match defines.get(word) {
                Some(Define::Object(body)) => {
                    let expanded = expand_depth(body, defines, protect_defined, depth - 1);
                    out.push_str(&expanded);
                    i += len;
                }
                Some(define @ Define::Function { .. }) => {
                    let after = &text[i + len..];
                    let skipped = after.len() - after.trim_start().len();
                    if after.trim_start().starts_with('(') {
                        let call_start = skipped;
                        if let Some((args, consumed)) = parse_call_args(&after[call_start..]) {
                            let expanded_args: Vec<String> = args
                                .iter()
                                .map(|a| expand_depth(a, defines, protect_defined, depth - 1))
                                .collect();
                            if let Some(body) = define.expand(&expanded_args) {
                                let expanded = expand_depth(&body, defines, protect_defined, depth - 1);
                                out.push_str(&expanded);
                                i += len + call_start + consumed;
                                continue;
                            }
                        }
                    }
                    out.push_str(word);
                    i += len;
                }
                None => {
                    out.push_str(word);
                    i += len;
                }
            }
            continue;
        }

        out.push(c);
        i += c.len_utf8();
    }

    out
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn take_ident(text: &str) -> (&str, usize) {
    let end = text
        .char_indices()
        .find(|(_, c)| !is_ident_continue(*c))
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    (&text[..end], end)
}

/// Copy a quoted string/char literal verbatim (including escapes), returning
/// the literal text and the number of bytes consumed.
fn copy_quoted(text: &str, quote: char) -> (&str, usize) {
    let mut chars = text.char_indices();
    chars.next(); // opening quote
    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return (&text[..idx + c.len_utf8()], idx + c.len_utf8());
        }
    }
    (text, text.len())
}

/// Copy the operand of `defined` verbatim: either `(NAME)` or a bare `NAME`
/// with whatever whitespace separates them, unexpanded.
fn copy_defined_operand(text: &str) -> (String, usize) {
    let leading_ws = text.len() - text.trim_start().len();
    let after_ws = &text[leading_ws..];
    if after_ws.starts_with('(') {
        if let Some(close) = after_ws.find(')') {
            return (text[..leading_ws + close + 1].to_string(), leading_ws + close + 1);
        }
    } else if let Some(c) = after_ws.chars().next() {
        if is_ident_start(c) {
            let (_, len) = take_ident(after_ws);
            return (text[..leading_ws + len].to_string(), leading_ws + len);
        }
    }
    (String::new(), 0)
}

/// Parse a parenthesized, comma-separated argument list starting at `text`
/// (which must begin with `(`). Splits on top-level commas only, respecting
/// nested parens and quoted strings. Returns the argument texts and the
/// number of bytes consumed (including both parens).
fn parse_call_args(text: &str) -> Option<(Vec<String>, usize)> {
    let mut depth = 0i32;
    let mut args = Vec::new();
    let mut current = String::new();
    let mut chars = text.char_indices().peekable();
    let mut consumed = 0;
    let mut saw_any = false;

    while let Some((idx, c)) = chars.next() {
        consumed = idx + c.len_utf8();
        match c {
            '(' => {
                depth += 1;
                if depth > 1 {
                    current.push(c);
                }
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    if saw_any || !current.trim().is_empty() {
                        args.push(current.trim().to_string());
                    }
                    return Some((args, consumed));
                }
                current.push(c);
            }
            ',' if depth == 1 => {
                args.push(current.trim().to_string());
                current.clear();
                saw_any = true;
            }
            '"' | '\'' => {
                let quote = c;
                current.push(c);
                for (_, nc) in chars.by_ref() {
                    current.push(nc);
                    if nc == quote {
                        break;
                    }
                }
            }
            _ => current.push(c),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::defines::Define;

    fn defines_with(pairs: &[(&str, Define)]) -> Defines {
        let mut defines = Defines::new();
        for (name, define) in pairs {
            defines.insert(*name, define.clone());
        }
        defines
    }

    #[test]
    fn object_like_macro_expands_inline() {
        let defines = defines_with(&[("X", Define::Object("1".to_string()))]);
        assert_eq!(expand_text("X + 1", &defines, false), "1 + 1");
    }

    #[test]
    fn function_like_macro_expands_with_arguments() {
        let defines = defines_with(&[(
            "SQ",
            Define::Function {
                params: vec!["x".to_string()],
                variadic: false,
                body: "((x)*(x))".to_string(),
            },
        )]);
        assert_eq!(expand_text("SQ(3+1)", &defines, false), "((3+1)*(3+1))");
    }

    #[test]
    fn defined_operand_is_not_expanded_when_protected() {
        let defines = defines_with(&[("FOO", Define::Object("99".to_string()))]);
        assert_eq!(expand_text("defined(FOO)", &defines, true), "defined(FOO)");
        assert_eq!(expand_text("defined FOO", &defines, true), "defined FOO");
    }

    #[test]
    fn nested_macro_arguments_are_expanded_before_substitution() {
        let defines = defines_with(&[
            ("ONE", Define::Object("1".to_string())),
            (
                "INC",
                Define::Function {
                    params: vec!["x".to_string()],
                    variadic: false,
                    body: "(x + 1)".to_string(),
                },
            ),
        ]);
        assert_eq!(expand_text("INC(ONE)", &defines, false), "(1 + 1)");
    }

    #[test]
    fn function_like_macro_name_without_call_is_left_unexpanded() {
        let defines = defines_with(&[(
            "SQ",
            Define::Function {
                params: vec!["x".to_string()],
                variadic: false,
                body: "((x)*(x))".to_string(),
            },
        )]);
        assert_eq!(expand_text("SQ + 1", &defines, false), "SQ + 1");
    }
}
