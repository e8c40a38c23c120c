use regex::Regex;
use std::sync::OnceLock;

/// A parsed preprocessor directive (spec §4.F "Directive semantics").
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    If(String),
    Ifdef(String),
    Ifndef(String),
    Elif(String),
    Elifdef(String),
    Elifndef(String),
    Else,
    Endif,
    Include(IncludeTarget),
    Embed(IncludeTarget),
    IncludeNext(IncludeTarget),
    EmbedNext(IncludeTarget),
    Define(String),
    Undef(String),
    Error(String),
    Warning(String),
    Line(String),
    Pragma(String),
    Unknown(String),
}

/// The parsed operand of an `#include`/`#embed` directive: the bracketed
/// name plus whether it was written relative (`"..."`) or not (`<...>`).
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeTarget {
    pub name: String,
    pub start_relative: bool,
}

fn directive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*#\s*(\w+)(?:\s+(.*))?$").expect("static regex compiles"))
}

/// Recognize a directive line per spec §4.F's `^\s*#\s*(\w+)(?:\s+(.*))?$`.
/// Returns `None` when the line doesn't start with `#` at all, or (per the
/// "Directive text with no argument" Design Note) is a `#` line that simply
/// fails to match — such a line is passed through verbatim by the caller.
pub fn recognize(line: &str) -> Option<Directive> {
    let caps = directive_re().captures(line)?;
    let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let args = caps.get(2).map(|m| m.as_str()).unwrap_or("").trim().to_string();

    Some(match name {
        "if" => Directive::If(args),
        "ifdef" => Directive::Ifdef(args),
        "ifndef" => Directive::Ifndef(args),
        "elif" => Directive::Elif(args),
        "elifdef" => Directive::Elifdef(args),
        "elifndef" => Directive::Elifndef(args),
        "else" => Directive::Else,
        "endif" => Directive::Endif,
        "include" => Directive::Include(parse_include_target(&args)),
        "embed" => Directive::Embed(parse_include_target(&args)),
        "include_next" => Directive::IncludeNext(parse_include_target(&args)),
        "embed_next" => Directive::EmbedNext(parse_include_target(&args)),
        "define" => Directive::Define(args),
        "undef" => Directive::Undef(args),
        "error" => Directive::Error(args),
        "warning" => Directive::Warning(args),
        "line" => Directive::Line(args),
        "pragma" => Directive::Pragma(args),
        other => Directive::Unknown(other.to_string()),
    })
}

/// Parse `<name>` (non-relative) or `"name"` (relative) include operands.
fn parse_include_target(args: &str) -> IncludeTarget {
    let trimmed = args.trim();
    if let Some(inner) = trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return IncludeTarget {
            name: inner.to_string(),
            start_relative: true,
        };
    }
    if let Some(inner) = trimmed.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        return IncludeTarget {
            name: inner.to_string(),
            start_relative: false,
        };
    }
    IncludeTarget {
        name: trimmed.to_string(),
        start_relative: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_if_with_expression_argument() {
        assert_eq!(recognize("#if X"), Some(Directive::If("X".to_string())));
    }

    #[test]
    fn recognizes_directive_with_leading_whitespace_and_spacing() {
        assert_eq!(
            recognize("  #  define NAME body"),
            Some(Directive::Define("NAME body".to_string()))
        );
    }

    #[test]
    fn directive_with_no_argument_defaults_to_empty_string() {
        assert_eq!(recognize("#else"), Some(Directive::Else));
        assert_eq!(recognize("#endif"), Some(Directive::Endif));
    }

    #[test]
    fn non_directive_hash_line_is_not_recognized() {
        assert_eq!(recognize("#!/usr/bin/env nonsense that has no name"), None);
    }

    #[test]
    fn quoted_include_is_relative_angle_bracket_is_not() {
        assert_eq!(
            recognize(r#"#include "local.h""#),
            Some(Directive::Include(IncludeTarget {
                name: "local.h".to_string(),
                start_relative: true,
            }))
        );
        assert_eq!(
            recognize("#include <system.h>"),
            Some(Directive::Include(IncludeTarget {
                name: "system.h".to_string(),
                start_relative: false,
            }))
        );
    }

    #[test]
    fn unknown_directive_name_is_preserved() {
        assert_eq!(recognize("#foo bar"), Some(Directive::Unknown("foo".to_string())));
    }
}
