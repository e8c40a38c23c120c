use regex::Regex;
use serde::{Deserialize, Serialize};

/// Failure to compile or assemble a [`Grammar`].
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("invalid regex for literal `{name}` (pattern `{pattern}`): {cause}")]
    InvalidPattern {
        name: String,
        pattern: String,
        cause: String,
    },
}

/// A compiled, anchored regex plus the source text it was built from.
///
/// The source is kept verbatim (without the leading `^` that makes it
/// anchored) both so the grammar config round-trips per spec §4.C/§6, and so
/// single-use-literal inlining (spec §4.E) can compare a literal's pattern
/// source against a BNF rule's quoted-string term.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    flags: Option<String>,
    regex: Regex,
}

impl Pattern {
    pub fn compile(source: &str, flags: Option<&str>) -> Result<Self, regex::Error> {
        let anchored = match flags {
            Some(f) if !f.is_empty() => format!("^(?{f}:{source})"),
            _ => format!("^(?:{source})"),
        };
        let regex = Regex::new(&anchored)?;
        Ok(Self {
            source: source.to_string(),
            flags: flags.filter(|f| !f.is_empty()).map(str::to_string),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> Option<&str> {
        self.flags.as_deref()
    }

    /// Length, in bytes, of the longest anchored match at the start of
    /// `input`, or `None` if the pattern does not match there at all.
    pub fn match_len(&self, input: &str) -> Option<usize> {
        self.regex.find(input).map(|m| m.end())
    }
}

/// A named regex the tokenizer matches against the remaining input.
#[derive(Debug, Clone)]
pub struct Literal {
    pub name: String,
    pub pattern: Pattern,
}

/// Whether a [`Part`] must match, may be skipped, or may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartType {
    Required,
    Optional,
    Repeated,
}

/// One element of a [`NodeDefinition`]'s pattern: a reference to another
/// definition or a literal, tagged with how it participates in the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub kind: String,
    #[serde(rename = "type")]
    pub part_type: PartType,
}

impl Part {
    pub fn required(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            part_type: PartType::Required,
        }
    }

    pub fn optional(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            part_type: PartType::Optional,
        }
    }

    pub fn repeated(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            part_type: PartType::Repeated,
        }
    }
}

/// Whether a [`NodeDefinition`]'s parts are tried in order until one
/// succeeds (alternation), or all matched in sequence (sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionType {
    Sequence,
    Alternation,
}

/// A named grammar rule: either an ordered sequence of parts, or an ordered
/// set of alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub def_type: DefinitionType,
    pub pattern: Vec<Part>,
}

/// The wire representation of a [`Literal`], matching spec §6: `pattern` is
/// the inner regex body without the leading `^`, `flags` is an optional
/// regex flag string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteralConfig {
    pub name: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}

/// The persisted shape of a [`Grammar`] (spec §6): literal patterns as
/// strings, rehydrated by wrapping each as `^(…)` at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarConfig {
    pub literals: Vec<LiteralConfig>,
    pub definitions: Vec<NodeDefinition>,
    pub root_nodes: Vec<String>,
    pub ignored_literals: Vec<String>,
}

/// The runtime grammar configuration consumed by the parser: literals with
/// compiled patterns, node definitions, the set of root node kinds, and the
/// set of literal kinds that are transparent to the parser.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub literals: Vec<Literal>,
    pub definitions: Vec<NodeDefinition>,
    pub root_nodes: Vec<String>,
    pub ignored_literals: Vec<String>,
}

impl Grammar {
    pub fn new(
        literals: Vec<Literal>,
        definitions: Vec<NodeDefinition>,
        root_nodes: Vec<String>,
        ignored_literals: Vec<String>,
    ) -> Self {
        Self {
            literals,
            definitions,
            root_nodes,
            ignored_literals,
        }
    }

    /// Compile a [`GrammarConfig`] into a runtime [`Grammar`], wrapping each
    /// literal pattern as `^(…)` as spec §4.C requires.
    pub fn from_config(config: GrammarConfig) -> Result<Self, GrammarError> {
        let mut literals = Vec::with_capacity(config.literals.len());
        for lit in config.literals {
            let pattern = Pattern::compile(&lit.pattern, lit.flags.as_deref()).map_err(|e| {
                GrammarError::InvalidPattern {
                    name: lit.name.clone(),
                    pattern: lit.pattern.clone(),
                    cause: e.to_string(),
                }
            })?;
            literals.push(Literal {
                name: lit.name,
                pattern,
            });
        }
        Ok(Self {
            literals,
            definitions: config.definitions,
            root_nodes: config.root_nodes,
            ignored_literals: config.ignored_literals,
        })
    }

    /// The inverse of [`Grammar::from_config`]: the canonical persisted form.
    pub fn to_config(&self) -> GrammarConfig {
        GrammarConfig {
            literals: self
                .literals
                .iter()
                .map(|lit| LiteralConfig {
                    name: lit.name.clone(),
                    pattern: lit.pattern.source().to_string(),
                    flags: lit.pattern.flags().map(str::to_string),
                })
                .collect(),
            definitions: self.definitions.clone(),
            root_nodes: self.root_nodes.clone(),
            ignored_literals: self.ignored_literals.clone(),
        }
    }

    pub fn literal(&self, name: &str) -> Option<&Literal> {
        self.literals.iter().find(|l| l.name == name)
    }

    pub fn definition(&self, name: &str) -> Option<&NodeDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn is_ignored(&self, kind: &str) -> bool {
        self.ignored_literals.iter().any(|name| name == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_grammar() {
        let config = GrammarConfig {
            literals: vec![
                LiteralConfig {
                    name: "ws".to_string(),
                    pattern: "[ \t]+".to_string(),
                    flags: None,
                },
                LiteralConfig {
                    name: "ident".to_string(),
                    pattern: "[a-zA-Z_][a-zA-Z0-9_]*".to_string(),
                    flags: None,
                },
            ],
            definitions: vec![NodeDefinition {
                name: "name".to_string(),
                def_type: DefinitionType::Sequence,
                pattern: vec![Part::required("ident")],
            }],
            root_nodes: vec!["name".to_string()],
            ignored_literals: vec!["ws".to_string()],
        };
        let grammar = Grammar::from_config(config.clone()).unwrap();
        let back = grammar.to_config();
        assert_eq!(back.literals.len(), config.literals.len());
        assert_eq!(back.root_nodes, config.root_nodes);
        assert_eq!(back.ignored_literals, config.ignored_literals);
    }

    #[test]
    fn invalid_pattern_is_reported_as_grammar_error() {
        let config = GrammarConfig {
            literals: vec![LiteralConfig {
                name: "broken".to_string(),
                pattern: "(".to_string(),
                flags: None,
            }],
            definitions: vec![],
            root_nodes: vec![],
            ignored_literals: vec![],
        };
        assert!(Grammar::from_config(config).is_err());
    }

    #[test]
    fn flags_apply_case_insensitivity() {
        let pattern = Pattern::compile("abc", Some("i")).unwrap();
        assert_eq!(pattern.match_len("ABCdef"), Some(3));
    }
}
