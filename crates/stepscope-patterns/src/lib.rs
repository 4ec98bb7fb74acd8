//! Shared step-matching primitives for stepscope.
//!
//! The crate exposes the canonical step keyword model and the
//! Cucumber-expression compiler used by the indexing engine, so the matcher
//! and the extraction pipeline share one definition of "what matches what"
//! without duplicating the regex construction code paths.

mod capture;
mod errors;
mod expression;
mod keyword;

pub use capture::captured_values;
pub use errors::PatternError;
pub use expression::{build_regex_from_expression, compile_expression, compile_regex};
pub use keyword::{KeywordFilter, StepKeyword, StepKeywordParseError};
