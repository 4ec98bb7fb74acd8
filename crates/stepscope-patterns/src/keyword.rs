//! Canonical step keyword model shared by the parser and the matcher.
//!
//! Continuation keywords (`And`, `But`, and the `*` wildcard) are kept as
//! distinct variants rather than resolved against the preceding step: the
//! indexing engine matches them permissively against every definition
//! keyword, so resolution is never required at indexing time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Keyword attached to a step in a feature file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKeyword {
    /// Setup preconditions for a scenario.
    Given,
    /// Perform the action under test.
    When,
    /// Assert the expected outcome.
    Then,
    /// Continuation sharing context with the previous step.
    And,
    /// Negative or contrasting continuation.
    But,
    /// The `*` wildcard keyword.
    Wildcard,
}

impl StepKeyword {
    /// Return the keyword as its canonical source spelling.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepscope_patterns::StepKeyword;
    ///
    /// assert_eq!(StepKeyword::Given.as_str(), "Given");
    /// assert_eq!(StepKeyword::Wildcard.as_str(), "*");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
            Self::Wildcard => "*",
        }
    }

    /// Whether this keyword inherits its meaning from the preceding step.
    ///
    /// Continuation keywords are matched against every definition keyword
    /// because their semantic keyword is not resolved during indexing.
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        matches!(self, Self::And | Self::But | Self::Wildcard)
    }

    /// The three concrete (non-continuation) keywords.
    pub const CONCRETE: [Self; 3] = [Self::Given, Self::When, Self::Then];
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`StepKeyword`] from a string fails.
///
/// Contains the unrecognised keyword text for diagnostic purposes. Callers
/// that need the documented default-fallback policy map this to
/// [`StepKeyword::Given`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepKeywordParseError(pub String);

impl fmt::Display for StepKeywordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid step keyword: {}", self.0)
    }
}

impl std::error::Error for StepKeywordParseError {}

impl FromStr for StepKeyword {
    type Err = StepKeywordParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised: String = value.split_whitespace().collect();
        if normalised == "*" {
            return Ok(Self::Wildcard);
        }
        if normalised.eq_ignore_ascii_case("given") {
            Ok(Self::Given)
        } else if normalised.eq_ignore_ascii_case("when") {
            Ok(Self::When)
        } else if normalised.eq_ignore_ascii_case("then") {
            Ok(Self::Then)
        } else if normalised.eq_ignore_ascii_case("and") {
            Ok(Self::And)
        } else if normalised.eq_ignore_ascii_case("but") {
            Ok(Self::But)
        } else {
            Err(StepKeywordParseError(normalised))
        }
    }
}

/// Keyword classifier carried by a step definition.
///
/// Registrations made through a keyword-specific function carry that keyword;
/// generic registrations match steps of every keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeywordFilter {
    /// Matches steps with a compatible concrete keyword.
    Keyword(StepKeyword),
    /// Matches steps of every keyword.
    Any,
}

impl KeywordFilter {
    /// Whether a step with the given keyword is compatible with this filter.
    ///
    /// Continuation keywords on the step side are compatible with every
    /// filter: their real keyword is inherited from the previous concrete
    /// step and is deliberately left unresolved during indexing.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepscope_patterns::{KeywordFilter, StepKeyword};
    ///
    /// let given = KeywordFilter::Keyword(StepKeyword::Given);
    /// assert!(given.accepts(StepKeyword::Given));
    /// assert!(given.accepts(StepKeyword::And));
    /// assert!(!given.accepts(StepKeyword::When));
    /// assert!(KeywordFilter::Any.accepts(StepKeyword::Then));
    /// ```
    #[must_use]
    pub fn accepts(&self, step_keyword: StepKeyword) -> bool {
        match self {
            Self::Any => true,
            Self::Keyword(own) => step_keyword.is_continuation() || step_keyword == *own,
        }
    }
}

impl fmt::Display for KeywordFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(kw) => kw.fmt(f),
            Self::Any => f.write_str("any"),
        }
    }
}
