//! Error taxonomy for the indexing engine.
//!
//! Every per-file failure is non-fatal: the coordinator logs it and degrades
//! to "this item is temporarily absent or non-matching". Nothing in this
//! crate escalates to a process-terminating error.

use thiserror::Error;

/// Errors that can occur during indexing operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A feature file could not be parsed as Gherkin.
    #[error("failed to parse feature file: {0}")]
    FeatureParse(#[from] gherkin::ParseError),

    /// A definition file could not be parsed as Rust source.
    #[error("failed to parse definition source: {0}")]
    DefinitionParse(#[from] syn::Error),

    /// A file could not be read from the provider.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An invalid configuration value was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
