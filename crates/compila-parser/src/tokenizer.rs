use compila_issue::{Issue, IssueSink, Location};

use crate::grammar::Literal;
use crate::token::Token;

/// Longest-match lexer over an ordered list of anchored literal patterns
/// (spec §4.B).
pub struct Tokenizer<'g> {
    literals: &'g [Literal],
}

impl<'g> Tokenizer<'g> {
    pub fn new(literals: &'g [Literal]) -> Self {
        Self { literals }
    }

    /// Tokenize `source` in its entirety. On success every byte of `source`
    /// is covered by the returned tokens, in order. On failure, report an
    /// `Unexpected token: <char>` issue and return `None`: the partial
    /// result is discarded, per spec §4.B.
    pub fn tokenize(
        &self,
        source: &str,
        unit: Option<&str>,
        sink: &mut dyn IssueSink,
    ) -> Option<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut loc = Location::start();
        if let Some(unit) = unit {
            loc = loc.with_unit(unit);
        }
        let mut rest = source;

        while !rest.is_empty() {
            match self.longest_match(rest) {
                Some((literal_idx, len)) => {
                    let text = &rest[..len];
                    let literal_name = self.literals[literal_idx].name.as_str();
                    tokens.push(Token {
                        kind: literal_name.into(),
                        text: text.into(),
                        line: loc.line,
                        column: loc.column,
                        position: loc.position,
                    });
                    loc = loc.advance(text);
                    rest = &rest[len..];
                }
                None => {
                    let bad_char = rest.chars().next().expect("rest is non-empty");
                    sink.report(
                        Issue::error(format!("Unexpected token: {bad_char}"))
                            .at(loc)
                            .with_source(source.to_string()),
                    );
                    return None;
                }
            }
        }

        Some(tokens)
    }

    /// Find the literal that produces the longest match at the start of
    /// `input`. On ties, the earlier literal in the ordered list wins.
    /// Zero-length matches are rejected (treated as no-match).
    fn longest_match(&self, input: &str) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (idx, literal) in self.literals.iter().enumerate() {
            if let Some(len) = literal.pattern.match_len(input) {
                if len == 0 {
                    continue;
                }
                match best {
                    Some((_, best_len)) if len <= best_len => {}
                    _ => best = Some((idx, len)),
                }
            }
        }
        best
    }
}
