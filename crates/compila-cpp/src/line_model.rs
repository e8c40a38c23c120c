/// Line-splice and (optionally) comment-strip `source`, producing the
/// `logical_source` that directive processing runs over (spec §4.F "Line
/// model", §3 "Preprocessed output").
///
/// Splicing removes every `\\\n` (and, pragmatically, `\\\r\n`) so a
/// directive or macro body may continue across physical lines. Comment
/// stripping replaces block `/* ... */` and line `// ...` comments with
/// same-shaped whitespace so newline counts — and therefore line numbers in
/// later diagnostics — are preserved.
pub fn build_logical_source(source: &str, strip_comments: bool) -> String {
    let spliced = splice_lines(source);
    if strip_comments {
        strip_comments_preserving_newlines(&spliced)
    } else {
        spliced
    }
}

fn splice_lines(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\n') => {
                    chars.next();
                    continue;
                }
                Some('\r') => {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    if lookahead.peek() == Some(&'\n') {
                        chars.next();
                        chars.next();
                        continue;
                    }
                    out.push(c);
                }
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Replace comments with whitespace of the same shape: a line comment
/// becomes spaces up to (but not including) its terminating newline; a
/// block comment becomes spaces with embedded newlines preserved, so a
/// multi-line `/* ... */` doesn't collapse the line count.
fn strip_comments_preserving_newlines(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let bytes = source.as_bytes();
    let mut i = 0;
    let mut in_string: Option<char> = None;

    while i < bytes.len() {
        let rest = &source[i..];
        if let Some(quote) = in_string {
            let c = rest.chars().next().unwrap();
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = rest[c.len_utf8()..].chars().next() {
                    out.push(escaped);
                    i += c.len_utf8() + escaped.len_utf8();
                    continue;
                }
            } else if c == quote {
                in_string = None;
            }
            i += c.len_utf8();
            continue;
        }

        if rest.starts_with("//") {
            let end = rest.find('\n').unwrap_or(rest.len());
            out.push_str(&" ".repeat(rest[..end].chars().count()));
            i += end;
            continue;
        }
        if rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(rel_end) => {
                    let comment = &rest[..rel_end + 4];
                    for c in comment.chars() {
                        out.push(if c == '\n' { '\n' } else { ' ' });
                    }
                    i += comment.len();
                }
                None => {
                    for c in rest.chars() {
                        out.push(if c == '\n' { '\n' } else { ' ' });
                    }
                    i += rest.len();
                }
            }
            continue;
        }

        let c = rest.chars().next().unwrap();
        if c == '"' || c == '\'' {
            in_string = Some(c);
        }
        out.push(c);
        i += c.len_utf8();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splices_backslash_newline_continuations() {
        let source = "#define X \\\n  1\n";
        let logical = build_logical_source(source, false);
        assert_eq!(logical, "#define X   1\n");
    }

    #[test]
    fn strips_line_comments_preserving_newline() {
        let logical = build_logical_source("int x; // a comment\nint y;\n", true);
        assert_eq!(logical.lines().count(), 2);
        assert!(logical.lines().next().unwrap().trim_end().ends_with("x;"));
    }

    #[test]
    fn strips_block_comments_preserving_embedded_newlines() {
        let source = "a /* line1\nline2 */ b\n";
        let logical = build_logical_source(source, true);
        assert_eq!(logical.lines().count(), 2);
        assert!(logical.lines().next().unwrap().trim_end() == "a");
        assert!(logical.lines().nth(1).unwrap().trim_start().starts_with("b"));
    }

    #[test]
    fn comment_markers_inside_string_literals_are_left_alone() {
        let logical = build_logical_source("char *s = \"// not a comment\";\n", true);
        assert!(logical.contains("// not a comment"));
    }
}
