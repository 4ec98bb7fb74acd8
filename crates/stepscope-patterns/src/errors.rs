//! Error types surfaced while compiling step patterns.

use thiserror::Error;

/// Errors raised while turning a step pattern into a matcher.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The regular expression produced for the pattern failed to compile.
    ///
    /// For expression-kind patterns every metacharacter is escaped before
    /// placeholder substitution, so this only occurs for regex-kind patterns
    /// with a malformed body or flag set.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}
