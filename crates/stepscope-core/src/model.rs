//! Data model for indexed features, definitions, and match results.
//!
//! All structural types are immutable snapshots: a content change replaces a
//! file's records wholesale, never mutating them in place. Definitions are
//! shared behind [`Arc`] so match results reference the exact registration
//! they matched — identity, not pattern text, distinguishes two definitions
//! with identical patterns in different files.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stepscope_patterns::{KeywordFilter, StepKeyword};

use crate::error::IndexError;

/// How a step definition's pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    /// A Cucumber expression with typed placeholders.
    Expression,
    /// A raw regular expression.
    Regex,
}

/// Which pattern kinds participate in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchMode {
    /// Both expression and regex definitions match.
    #[default]
    Both,
    /// Only regex definitions match.
    RegexOnly,
    /// Only expression definitions match.
    ExpressionOnly,
}

impl FromStr for MatchMode {
    type Err = IndexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "both" => Ok(Self::Both),
            "regex" => Ok(Self::RegexOnly),
            "expression" => Ok(Self::ExpressionOnly),
            _ => Err(IndexError::InvalidConfig(format!(
                "unknown match mode '{value}', expected one of: both, regex, expression"
            ))),
        }
    }
}

/// A parsed feature document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Feature name from the `Feature:` header.
    pub name: String,
    /// Source file the feature was parsed from.
    pub path: PathBuf,
    /// Scenarios in document order, including the synthetic background
    /// scenario and scenarios lifted out of rule blocks.
    pub scenarios: Vec<Scenario>,
}

impl Feature {
    /// Iterate over every step in the feature, in document order.
    pub fn steps(&self) -> impl Iterator<Item = &FeatureStep> {
        self.scenarios.iter().flat_map(|s| s.steps.iter())
    }
}

/// Name given to the synthetic scenario holding background steps.
///
/// Background steps are indexed as an isolated pseudo-scenario and never
/// merged into subsequent scenarios' step lists.
pub const BACKGROUND_SCENARIO_NAME: &str = "Background";

/// A scenario (or synthetic background block) within a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name; [`BACKGROUND_SCENARIO_NAME`] for background blocks.
    pub name: String,
    /// Steps in source order.
    pub steps: Vec<FeatureStep>,
    /// 1-based line of the scenario header.
    pub line: usize,
}

/// A single step inside a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureStep {
    /// The step keyword as written (continuations are not resolved).
    pub keyword: StepKeyword,
    /// Step text following the keyword.
    pub text: String,
    /// 1-based source line.
    pub line: usize,
    /// Name of the owning scenario.
    pub scenario_name: String,
    /// Name of the owning feature.
    pub feature_name: String,
    /// Source file the step was parsed from.
    pub path: PathBuf,
}

/// Position of a definition's call expression within its source file.
///
/// Lines and columns are 0-based; the span covers the whole call expression
/// and exists for navigation, not for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    /// 0-based starting line.
    pub start_line: u32,
    /// 0-based starting column.
    pub start_column: u32,
    /// 0-based ending line.
    pub end_line: u32,
    /// 0-based ending column.
    pub end_column: u32,
}

/// A step-definition registration extracted from source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// The pattern text as registered.
    pub pattern: String,
    /// How the pattern is interpreted.
    pub kind: PatternKind,
    /// Flags split off a regex pattern's leading inline flag group.
    pub regex_flags: Option<String>,
    /// Keyword classifier derived from the registration function.
    pub keyword: KeywordFilter,
    /// Source file the registration was found in.
    pub path: PathBuf,
    /// Span of the registration call expression.
    pub span: SourceSpan,
    /// Name of the registration function as written at the call site.
    pub function_name: String,
}

/// Classification of a step by its match count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// No definition matched.
    Undefined,
    /// Exactly one definition matched.
    Matched,
    /// Two or more definitions matched.
    Ambiguous,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Undefined => "undefined",
            Self::Matched => "matched",
            Self::Ambiguous => "ambiguous",
        };
        f.write_str(label)
    }
}

/// The definitions matching one step, in definition discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The step that was matched.
    pub step: FeatureStep,
    /// Every definition that passed both the keyword and pattern tests.
    pub matches: Vec<Arc<StepDefinition>>,
}

impl MatchResult {
    /// Status derived from the match count.
    ///
    /// Always computed from the match list so the two can never disagree.
    #[must_use]
    pub fn status(&self) -> MatchStatus {
        match self.matches.len() {
            0 => MatchStatus::Undefined,
            1 => MatchStatus::Matched,
            _ => MatchStatus::Ambiguous,
        }
    }
}

/// Workspace-wide counts derived from the current index state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkspaceStats {
    /// Number of indexed features.
    pub features: usize,
    /// Number of scenarios across all features.
    pub scenarios: usize,
    /// Number of steps across all scenarios.
    pub steps: usize,
    /// Steps with no matching definition.
    pub undefined_steps: usize,
    /// Steps with more than one matching definition.
    pub ambiguous_steps: usize,
    /// Definitions matched by no step.
    pub unused_definitions: usize,
}
