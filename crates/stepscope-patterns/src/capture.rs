//! Capture-group helpers for matched step text.

use regex::Regex;

/// Extract the participating capture-group values when `text` matches `re`,
/// returning `None` otherwise.
///
/// Capture group 0 (the full match) is skipped, as are alternative groups
/// that did not participate in the match, so a `{string}` placeholder yields
/// one value regardless of which quoting alternative matched. Values are
/// returned positionally, left to right.
///
/// # Examples
///
/// ```
/// use stepscope_patterns::{captured_values, compile_expression};
///
/// # fn main() -> Result<(), stepscope_patterns::PatternError> {
/// let regex = compile_expression("I click the {string} button")?;
/// let values = captured_values(&regex, "I click the \"Submit\" button");
/// assert_eq!(values, Some(vec!["Submit".to_string()]));
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn captured_values(re: &Regex, text: &str) -> Option<Vec<String>> {
    let caps = re.captures(text)?;
    let values = caps
        .iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str().to_string())
        .collect();
    Some(values)
}
