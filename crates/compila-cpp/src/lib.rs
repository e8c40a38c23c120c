//! A C preprocessor: line splicing and comment stripping, nested
//! `#if`/`#elif`/`#else`/`#endif` conditional compilation, object- and
//! function-like macro expansion with `##` token-paste, `#include`/
//! `#include_next`/`#embed`/`#embed_next` resolution, and a standalone
//! macro-inlining pass over already-preprocessed text.
//!
//! Every pass reports through [`compila_issue::IssueSink`]; none of them
//! write to stdout/stderr directly.

mod builtins;
mod charconst;
mod conditional;
mod defines;
mod directive;
mod expr;
mod inliner;
mod line_model;
mod macro_expand;
mod preprocessor;
mod resolver;

pub use conditional::{ConditionalBlock, ConditionalStack};
pub use defines::{rewrite_defined_operator, Define, Defines};
pub use directive::{Directive, IncludeTarget};
pub use expr::{eval_condition, EvalError, Value};
pub use inliner::inline_macros;
pub use line_model::build_logical_source;
pub use preprocessor::{PreprocessOptions, PreprocessedOutput, Preprocessor};
pub use resolver::{FileResolver, InMemoryResolver, ResolvedFile};
