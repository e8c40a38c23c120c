//! Source locations and diagnostic issues shared across the compila toolkit.
//!
//! This crate has no dependents within the toolkit; everything else
//! (tokenizer, parser, BNF lowering, preprocessor) reports through the
//! [`IssueSink`] trait defined here rather than writing to stdout/stderr
//! directly.

mod issue;
mod location;
mod sink;

pub use issue::{Issue, Level};
pub use location::Location;
pub use sink::{IssueSink, VecSink};
