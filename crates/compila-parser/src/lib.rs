//! A data-driven tokenizer and recursive-descent parser engine.
//!
//! The same engine is reused for a BNF-like meta-grammar (see the
//! `compila-bnf` crate) and for whatever target grammar that meta-grammar
//! lowers into.

mod bowstring;
mod cst;
mod grammar;
mod token;
mod tokenizer;

mod parser;

pub use bowstring::BowString;
pub use cst::{Node, NodeCoords};
pub use grammar::{
    DefinitionType, Grammar, GrammarConfig, GrammarError, Literal, LiteralConfig, NodeDefinition,
    Part, PartType, Pattern,
};
pub use parser::{ParseOutcome, Parser, ParserError};
pub use token::Token;
pub use tokenizer::Tokenizer;
