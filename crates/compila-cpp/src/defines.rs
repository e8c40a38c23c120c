use std::collections::HashMap;

use regex::Regex;

/// An entry in the macro environment (spec §3 "Macro environment").
///
/// Object-like macros store their replacement text verbatim; function-like
/// macros store their parameter list and body, and are expanded by
/// substituting each parameter occurrence (matched on word boundaries) with
/// the corresponding argument text, then applying `##` token-paste.
#[derive(Debug, Clone)]
pub enum Define {
    Object(String),
    Function {
        params: Vec<String>,
        variadic: bool,
        body: String,
    },
}

impl Define {
    pub fn is_function_like(&self) -> bool {
        matches!(self, Define::Function { .. })
    }

    /// Expand a function-like macro against `args`, substituting parameters
    /// and applying `##` token-paste (spec §4.F "define NAME(params) BODY").
    ///
    /// Returns `None` for an object-like macro invoked with arguments, or an
    /// arity mismatch (excess arguments are folded into the variadic
    /// parameter when the macro is variadic).
    pub fn expand(&self, args: &[String]) -> Option<String> {
        let Define::Function {
            params,
            variadic,
            body,
        } = self
        else {
            return None;
        };

        if *variadic {
            if args.len() < params.len() {
                return None;
            }
        } else if args.len() != params.len() {
            return None;
        }

        let mut bindings: HashMap<&str, String> = HashMap::new();
        for (param, arg) in params.iter().zip(args.iter()) {
            bindings.insert(param.as_str(), arg.trim().to_string());
        }
        if *variadic {
            let rest = args[params.len().min(args.len())..].join(", ");
            bindings.insert("__VA_ARGS__", rest);
        }

        // Token-paste first: split on `##`, substitute each side, rejoin
        // without the whitespace `##` left behind.
        let pasted: Vec<String> = body
            .split("##")
            .map(|segment| substitute_params(segment.trim(), &bindings))
            .collect();
        Some(pasted.join(""))
    }
}

/// Substitute every word-boundary occurrence of a bound parameter name in
/// `text` with its argument text.
fn substitute_params(text: &str, bindings: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    let bytes = text.as_bytes();

    let is_ident_char = |c: char| c.is_alphanumeric() || c == '_';

    while let Some((start, c)) = chars.next() {
        if c.is_alphabetic() || c == '_' {
            let mut end = start + c.len_utf8();
            while end < bytes.len() {
                let next = text[end..].chars().next().unwrap();
                if is_ident_char(next) {
                    end += next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let word = &text[start..end];
            match bindings.get(word) {
                Some(replacement) => out.push_str(replacement),
                None => out.push_str(word),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// The macro environment threaded through one preprocess invocation and its
/// recursive `#include` calls (spec §3 "Macro environment", §5 "shared
/// mutable reference").
#[derive(Debug, Clone, Default)]
pub struct Defines {
    map: HashMap<String, Define>,
}

impl Defines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Define> {
        self.map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, define: Define) {
        self.map.insert(name.into(), define);
    }

    pub fn remove(&mut self, name: &str) -> Option<Define> {
        self.map.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Define)> {
        self.map.iter()
    }

    /// Refresh `__FILE__` and `__LINE__`, which the preprocessor updates
    /// before dispatching each physical line (spec §3 "Macro environment").
    pub fn refresh_location(&mut self, unit: &str, line: u32) {
        self.map
            .insert("__FILE__".to_string(), Define::Object(format!("\"{unit}\"")));
        self.map
            .insert("__LINE__".to_string(), Define::Object(line.to_string()));
    }
}

/// Rewrite a bare `defined NAME` occurrence in an object-like macro body to
/// the call form `defined(NAME)`, so that a stored macro body referencing
/// `defined` still evaluates correctly once substituted into a conditional
/// expression (spec §4.F "define NAME BODY"). `defined(NAME)` call forms are
/// left untouched. The operand stays a bare identifier rather than a quoted
/// string: the evaluator parses an explicit AST over this text (Design
/// Notes "do not embed a host evaluator"), and its `defined` operand is
/// always an identifier, never a string literal.
pub fn rewrite_defined_operator(body: &str) -> String {
    static PATTERN: &str = r"\bdefined\s+([A-Za-z_][A-Za-z0-9_]*)\b";
    let re = Regex::new(PATTERN).expect("static regex compiles");
    re.replace_all(body, "defined($1)").into_owned()
}
