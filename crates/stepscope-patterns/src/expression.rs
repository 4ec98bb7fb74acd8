//! Cucumber-expression compilation.
//!
//! Expressions are translated into anchored regular expressions in three
//! ordered stages: escape every regex metacharacter, substitute the typed
//! parameter placeholders for capture groups, and anchor the result so a
//! match must cover the entire step text. Each placeholder contributes
//! exactly one capture group; `{string}` contributes a three-way alternative
//! set in which exactly one group participates per match.

use regex::Regex;

use crate::errors::PatternError;

/// Placeholder substitutions applied to the escaped expression, in priority
/// order. The keys are the escaped spelling of each placeholder since
/// substitution runs after metacharacter escaping.
const PARAMETER_PATTERNS: [(&str, &str); 5] = [
    (r"\{int\}", r"(-?\d+)"),
    (r"\{float\}", r"(-?\d+(?:\.\d+)?)"),
    (r"\{word\}", r"(\S+)"),
    (r"\{string\}", r#"(?:"([^"]*)"|'([^']*)'|(\S+))"#),
    (r"\{\}", r"(.+)"),
];

/// Translate a Cucumber expression into an anchored regex source string.
///
/// # Examples
///
/// ```
/// use stepscope_patterns::build_regex_from_expression;
///
/// let source = build_regex_from_expression("I have {int} cukes");
/// assert_eq!(source, r"^I have (-?\d+) cukes$");
/// ```
#[must_use]
pub fn build_regex_from_expression(expression: &str) -> String {
    let mut source = regex::escape(expression);
    for (placeholder, replacement) in PARAMETER_PATTERNS {
        source = source.replace(placeholder, replacement);
    }
    format!("^{source}$")
}

/// Compile a Cucumber expression into a ready-to-use [`Regex`].
///
/// # Errors
///
/// Returns [`PatternError::Regex`] when the generated source fails to
/// compile. Escaping makes this unreachable for well-formed substitution
/// tables, but the fallible signature keeps the matcher honest.
///
/// # Examples
///
/// ```
/// use stepscope_patterns::compile_expression;
///
/// # fn main() -> Result<(), stepscope_patterns::PatternError> {
/// let regex = compile_expression("I click the {string} button")?;
/// assert!(regex.is_match("I click the \"Submit\" button"));
/// assert!(!regex.is_match("I click the \"Submit\" button twice"));
/// # Ok(())
/// # }
/// ```
pub fn compile_expression(expression: &str) -> Result<Regex, PatternError> {
    Ok(Regex::new(&build_regex_from_expression(expression))?)
}

/// Compile a regex-kind pattern together with its optional flags.
///
/// Flags are re-applied as an inline `(?flags)` prefix, mirroring how they
/// were written in the original definition source.
///
/// # Errors
///
/// Returns [`PatternError::Regex`] when the pattern body or flag set is
/// malformed.
pub fn compile_regex(pattern: &str, flags: Option<&str>) -> Result<Regex, PatternError> {
    let source = match flags {
        Some(flags) if !flags.is_empty() => format!("(?{flags}){pattern}"),
        _ => pattern.to_owned(),
    };
    Ok(Regex::new(&source)?)
}
