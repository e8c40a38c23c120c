//! Lowers a BNF-like concrete syntax tree into a runtime grammar (spec §4.E).
//!
//! [`bootstrap_grammar`] is the bundled grammar for the BNF-like
//! meta-language itself; tokenizing and parsing a BNF source against it
//! yields the CST that [`lower`] consumes to produce a target grammar,
//! which `compila-parser` can then run on any source in that target
//! language.

mod bootstrap;
mod lower;

pub use bootstrap::bootstrap_grammar;
pub use lower::{lower, IncludeResolver, NoIncludes};

use compila_issue::IssueSink;
use compila_parser::{Grammar, Node, Parser, Tokenizer};

/// Tokenize and parse `source` against the bundled bootstrap grammar,
/// returning its BNF CST. Issues from either pass are reported to `sink`.
pub fn parse_bnf_source(source: &str, unit: Option<&str>, sink: &mut dyn IssueSink) -> Vec<Node> {
    let grammar = bootstrap_grammar();
    let tokenizer = Tokenizer::new(&grammar.literals);
    match tokenizer.tokenize(source, unit, sink) {
        Some(tokens) => Parser::new(&grammar, tokens).parse(sink).nodes,
        None => Vec::new(),
    }
}

/// Parse `source` as a BNF-like grammar description and lower it into a
/// runtime [`Grammar`], resolving `##include` directives through
/// `include`.
pub fn lower_source(
    source: &str,
    unit: Option<&str>,
    include: &mut dyn IncludeResolver,
    sink: &mut dyn IssueSink,
) -> Grammar {
    let roots = parse_bnf_source(source, unit, sink);
    lower(&roots, include, sink)
}
