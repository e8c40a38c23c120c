use compila_issue::{Issue, IssueSink, Level, Location};

use crate::cst::{Node, NodeCoords};
use crate::grammar::{DefinitionType, Grammar, PartType};
use crate::token::Token;

/// The two hard-error conditions defined by spec §4.D / §7: an undefined
/// rule reference is a grammar bug, and end-of-stream with no root match is
/// an input reject. Both abort parsing with a single diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("definition not found: {0}")]
    UndefinedRule(String),
}

/// Outcome of a full parse: whatever root nodes were produced, plus any
/// issues. A fatal issue means parsing stopped before reaching end of
/// input; the nodes produced before that point are still returned, since
/// callers generally want the partial tree alongside the diagnostic.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub nodes: Vec<Node>,
    pub issues: Vec<Issue>,
    pub fatal: bool,
}

/// Control-flow signal returned by `parse_node`: a successful match, or a
/// no-match (a normal signal, not an error, per spec §4.D).
enum Signal {
    Matched(Node),
    NoMatch,
}

type StepResult = Result<Signal, ParserError>;

/// Recursive-descent CST builder over a token stream, driven by a
/// [`Grammar`] (spec §4.D).
pub struct Parser<'g> {
    grammar: &'g Grammar,
    tokens: Vec<Token>,
    pos: usize,
    /// Count of `parse_node` invocations, exposed for diagnostics (spec
    /// §4.D: "a counter of invocations per root input").
    invocations: u64,
    /// Verbosity level for trace issues: 0 disables tracing, 1 is
    /// high-level (root attempts), 2 adds sequence/alternation traces, 3
    /// adds per-node entry traces.
    verbosity: u8,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g Grammar, tokens: Vec<Token>) -> Self {
        Self {
            grammar,
            tokens,
            pos: 0,
            invocations: 0,
            verbosity: 0,
        }
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    /// Parse the whole token stream into a list of top-level nodes whose
    /// kinds are in `grammar.root_nodes` (spec §4.D "Top-level loop").
    pub fn parse(mut self, sink: &mut dyn IssueSink) -> ParseOutcome {
        let mut nodes = Vec::new();
        loop {
            self.skip_ignored();
            if self.pos >= self.tokens.len() {
                break;
            }

            let mut matched = false;
            for root in self.grammar.root_nodes.clone() {
                let checkpoint = self.pos;
                if self.verbosity >= 1 {
                    sink.report(Issue::new(
                        Level::Debug,
                        format!("trying root `{root}` at token {checkpoint}"),
                    ));
                }
                match self.parse_node(&root, 0) {
                    Ok(Signal::Matched(node)) => {
                        if self.pos == checkpoint {
                            // A root matched without consuming a single
                            // token (every part of it was optional/repeated
                            // and none matched here). Accepting this would
                            // re-enter the outer loop at the same position
                            // and match the same empty node forever, so it
                            // is treated as no-match instead.
                            self.pos = checkpoint;
                            continue;
                        }
                        nodes.push(node);
                        matched = true;
                        break;
                    }
                    Ok(Signal::NoMatch) => {
                        self.pos = checkpoint;
                    }
                    Err(err) => {
                        sink.report(Issue::error(err.to_string()));
                        return ParseOutcome {
                            nodes,
                            issues: vec![Issue::error(err.to_string())],
                            fatal: true,
                        };
                    }
                }
            }

            if !matched {
                let tok = &self.tokens[self.pos];
                let message = format!(
                    "Unexpected token \"{}\" at {}:{}",
                    tok.text, tok.line, tok.column
                );
                let issue = Issue::error(message).at(Location {
                    line: tok.line,
                    column: tok.column,
                    position: tok.position,
                    unit: None,
                });
                sink.report(issue.clone());
                return ParseOutcome {
                    nodes,
                    issues: vec![issue],
                    fatal: true,
                };
            }
        }

        ParseOutcome {
            nodes,
            issues: Vec::new(),
            fatal: false,
        }
    }

    /// Parse a single node of the given `kind` (spec §4.D "parseNode").
    fn parse_node(&mut self, kind: &str, depth: usize) -> StepResult {
        self.invocations += 1;
        if self.verbosity >= 3 {
            // per-node entry trace; no sink available here by design — the
            // counter above is the cheap always-on substitute. A sink-aware
            // trace would thread `sink` through every recursive call.
        }

        if let Some(literal) = self.grammar.literal(kind) {
            let _ = literal;
            self.skip_ignored();
            match self.peek() {
                Some(tok) if tok.kind.as_str() == kind => {
                    let tok = self.bump().expect("peek just confirmed a token");
                    Ok(Signal::Matched(Node::leaf(tok)))
                }
                _ => Ok(Signal::NoMatch),
            }
        } else if let Some(def) = self.grammar.definition(kind).cloned() {
            match def.def_type {
                DefinitionType::Alternation => self.parse_alternation(&def, depth),
                DefinitionType::Sequence => self.parse_sequence(&def, depth),
            }
        } else {
            Err(ParserError::UndefinedRule(kind.to_string()))
        }
    }

    fn parse_alternation(
        &mut self,
        def: &crate::grammar::NodeDefinition,
        depth: usize,
    ) -> StepResult {
        for part in &def.pattern {
            let checkpoint = self.pos;
            match self.parse_node(&part.kind, depth + 1)? {
                Signal::Matched(node) => {
                    return Ok(Signal::Matched(Node::wrap(def.name.clone(), node)));
                }
                Signal::NoMatch => {
                    self.pos = checkpoint;
                }
            }
        }
        Ok(Signal::NoMatch)
    }

    fn parse_sequence(&mut self, def: &crate::grammar::NodeDefinition, depth: usize) -> StepResult {
        let checkpoint = self.pos;
        let mut children = Vec::new();

        for part in &def.pattern {
            match part.part_type {
                PartType::Required => match self.parse_node(&part.kind, depth + 1)? {
                    Signal::Matched(node) => children.push(node),
                    Signal::NoMatch => {
                        self.pos = checkpoint;
                        return Ok(Signal::NoMatch);
                    }
                },
                PartType::Optional => {
                    let save = self.pos;
                    match self.parse_node(&part.kind, depth + 1)? {
                        Signal::Matched(node) => children.push(node),
                        Signal::NoMatch => self.pos = save,
                    }
                }
                PartType::Repeated => {
                    loop {
                        let save = self.pos;
                        match self.parse_node(&part.kind, depth + 1)? {
                            Signal::Matched(node) => children.push(node),
                            Signal::NoMatch => {
                                self.pos = save;
                                break;
                            }
                        }
                    }
                    // A `repeated` part terminates the sequence once
                    // exhausted; parts after it are never attempted
                    // (spec §4.D, Design Notes "Greedy-`repeated`
                    // terminator").
                    break;
                }
            }
        }

        let fallback = self.coords_at(checkpoint);
        Ok(Signal::Matched(Node::branch(
            def.name.clone(),
            children,
            fallback,
        )))
    }

    /// Advance the cursor past any tokens whose kind is in
    /// `ignored_literals`, centralized per the Design Notes ("Ignored-
    /// literal skipping... do not sprinkle it through alternation/sequence
    /// code — the rollback contract depends on consistent treatment").
    fn skip_ignored(&mut self) {
        while let Some(tok) = self.tokens.get(self.pos) {
            if self.grammar.is_ignored(&tok.kind) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn peek(&mut self) -> Option<&Token> {
        self.skip_ignored();
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn coords_at(&self, pos: usize) -> NodeCoords {
        match self.tokens.get(pos) {
            Some(tok) => NodeCoords {
                text: tok.text.clone(),
                line: tok.line,
                column: tok.column,
                position: tok.position,
            },
            None => {
                let last = self.tokens.last();
                NodeCoords {
                    text: "".into(),
                    line: last.map(|t| t.line).unwrap_or(1),
                    column: last.map(|t| t.column).unwrap_or(1),
                    position: last
                        .map(|t| t.position + t.text.len() as u32)
                        .unwrap_or(0),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, Literal, NodeDefinition, Part, Pattern};
    use compila_issue::VecSink;

    fn lit(name: &str, pattern: &str) -> Literal {
        Literal {
            name: name.to_string(),
            pattern: Pattern::compile(pattern, None).unwrap(),
        }
    }

    /// A tiny grammar for a comma-separated list of identifiers:
    /// `list = ident { "," ident };`
    fn list_grammar() -> Grammar {
        Grammar::new(
            vec![lit("ws", r"[ \t]+"), lit("ident", "[a-z]+"), lit("comma", ",")],
            vec![
                NodeDefinition {
                    name: "tail".to_string(),
                    def_type: DefinitionType::Sequence,
                    pattern: vec![Part::required("comma"), Part::required("ident")],
                },
                NodeDefinition {
                    name: "list".to_string(),
                    def_type: DefinitionType::Sequence,
                    pattern: vec![Part::required("ident"), Part::repeated("tail")],
                },
            ],
            vec!["list".to_string()],
            vec!["ws".to_string()],
        )
    }

    fn tokenize(grammar: &Grammar, source: &str) -> Vec<Token> {
        crate::tokenizer::Tokenizer::new(&grammar.literals)
            .tokenize(source, None, &mut VecSink::new())
            .unwrap()
    }

    #[test]
    fn parses_a_repeated_list() {
        let grammar = list_grammar();
        let tokens = tokenize(&grammar, "a, b, c");
        let mut sink = VecSink::new();
        let outcome = Parser::new(&grammar, tokens).parse(&mut sink);
        assert!(!outcome.fatal);
        assert_eq!(outcome.nodes.len(), 1);
        let list = &outcome.nodes[0];
        assert_eq!(list.kind.as_str(), "list");
        // ident + two "tail" nodes
        assert_eq!(list.children.len(), 3);
    }

    #[test]
    fn rolls_back_cursor_after_failed_sequence() {
        let grammar = list_grammar();
        // "a," with nothing after the comma: `tail` requires comma AND
        // ident, so the dangling comma must not be consumed.
        let tokens = tokenize(&grammar, "a,");
        let mut sink = VecSink::new();
        let outcome = Parser::new(&grammar, tokens).parse(&mut sink);
        assert!(outcome.fatal);
        assert_eq!(outcome.nodes.len(), 0);
    }

    #[test]
    fn alternation_picks_first_viable_branch() {
        let grammar = Grammar::new(
            vec![lit("word", "[a-z]+")],
            vec![NodeDefinition {
                name: "either".to_string(),
                def_type: DefinitionType::Alternation,
                pattern: vec![Part::required("word"), Part::required("word")],
            }],
            vec!["either".to_string()],
            vec![],
        );
        let tokens = tokenize(&grammar, "abc");
        let mut sink = VecSink::new();
        let outcome = Parser::new(&grammar, tokens).parse(&mut sink);
        assert!(!outcome.fatal);
        assert_eq!(outcome.nodes[0].kind.as_str(), "either");
    }

    #[test]
    fn undefined_rule_reference_is_a_fatal_error() {
        let grammar = Grammar::new(
            vec![lit("word", "[a-z]+")],
            vec![NodeDefinition {
                name: "root".to_string(),
                def_type: DefinitionType::Sequence,
                pattern: vec![Part::required("missing_rule")],
            }],
            vec!["root".to_string()],
            vec![],
        );
        let tokens = tokenize(&grammar, "abc");
        let mut sink = VecSink::new();
        let outcome = Parser::new(&grammar, tokens).parse(&mut sink);
        assert!(outcome.fatal);
        assert!(sink
            .issues()
            .iter()
            .any(|i| i.message.as_deref().unwrap_or("").contains("definition not found")));
    }

    #[test]
    fn root_matching_zero_tokens_does_not_loop_forever() {
        // `maybe` is a sequence of a single optional part, so it matches
        // successfully at any position, consuming nothing when `word`
        // doesn't match there. Left unguarded, the top-level loop would
        // re-enter at the same position and accept the same empty match
        // forever.
        let grammar = Grammar::new(
            vec![lit("word", "[a-z]+"), lit("digit", "[0-9]+")],
            vec![NodeDefinition {
                name: "maybe".to_string(),
                def_type: DefinitionType::Sequence,
                pattern: vec![Part::optional("word")],
            }],
            vec!["maybe".to_string()],
            vec![],
        );
        let tokens = tokenize(&grammar, "123");
        let mut sink = VecSink::new();
        let outcome = Parser::new(&grammar, tokens).parse(&mut sink);
        assert!(outcome.fatal);
        assert!(sink
            .issues()
            .iter()
            .any(|i| i.message.as_deref().unwrap_or("").contains("Unexpected token")));
    }

    #[test]
    fn reparsing_the_same_tokens_is_idempotent() {
        let grammar = list_grammar();
        let tokens = tokenize(&grammar, "a, b, c");
        let mut sink1 = VecSink::new();
        let first = Parser::new(&grammar, tokens.clone()).parse(&mut sink1);
        let mut sink2 = VecSink::new();
        let second = Parser::new(&grammar, tokens).parse(&mut sink2);
        assert_eq!(first.nodes.len(), second.nodes.len());
        assert_eq!(first.nodes[0].children.len(), second.nodes[0].children.len());
    }
}
