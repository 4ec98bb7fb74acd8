//! Matching of indexed steps against compiled step definitions.

use std::sync::Arc;

use regex::Regex;
use stepscope_patterns::{compile_expression, compile_regex};

use crate::model::{FeatureStep, MatchMode, MatchResult, PatternKind, StepDefinition};

/// Matches steps against definitions under a configurable match mode.
///
/// Definitions are compiled once per [`match_steps`](Self::match_steps) call
/// and tested in stored order, so the match lists in the results follow
/// definition discovery order and are stable across re-matches of the same
/// snapshot.
#[derive(Debug)]
pub struct MatchEngine {
    mode: MatchMode,
}

impl MatchEngine {
    /// Create an engine with the given match mode.
    #[must_use]
    pub fn new(mode: MatchMode) -> Self {
        Self { mode }
    }

    /// Replace the active match mode for subsequent calls.
    ///
    /// Does not itself trigger re-matching; the coordinator requests a
    /// fresh match after changing the mode.
    pub fn set_match_mode(&mut self, mode: MatchMode) {
        self.mode = mode;
    }

    /// The currently active match mode.
    #[must_use]
    pub fn match_mode(&self) -> MatchMode {
        self.mode
    }

    /// Match every step against every definition and classify the results.
    ///
    /// Early exits: with no steps the result list is empty; with no
    /// definitions every step is classified undefined without any
    /// per-definition work.
    #[must_use]
    pub fn match_steps(
        &self,
        steps: &[FeatureStep],
        definitions: &[Arc<StepDefinition>],
    ) -> Vec<MatchResult> {
        if steps.is_empty() {
            return Vec::new();
        }

        if definitions.is_empty() {
            return steps
                .iter()
                .map(|step| MatchResult {
                    step: step.clone(),
                    matches: Vec::new(),
                })
                .collect();
        }

        let compiled: Vec<CompiledDefinition<'_>> = definitions
            .iter()
            .map(|definition| CompiledDefinition::new(definition, self.mode))
            .collect();

        steps
            .iter()
            .map(|step| {
                let matches = compiled
                    .iter()
                    .filter(|candidate| candidate.matches(step))
                    .map(|candidate| Arc::clone(candidate.definition))
                    .collect();
                MatchResult {
                    step: step.clone(),
                    matches,
                }
            })
            .collect()
    }
}

/// A definition paired with its compiled matcher for one matching pass.
struct CompiledDefinition<'a> {
    definition: &'a Arc<StepDefinition>,
    /// `None` when the definition's kind is disallowed by the active mode
    /// or its pattern failed to compile; such a definition never matches.
    regex: Option<Regex>,
}

impl<'a> CompiledDefinition<'a> {
    fn new(definition: &'a Arc<StepDefinition>, mode: MatchMode) -> Self {
        let regex = match (definition.kind, mode) {
            (PatternKind::Regex, MatchMode::ExpressionOnly)
            | (PatternKind::Expression, MatchMode::RegexOnly) => None,
            (PatternKind::Regex, _) => {
                compile_regex(&definition.pattern, definition.regex_flags.as_deref())
                    .map_err(|err| {
                        tracing::warn!(
                            pattern = %definition.pattern,
                            path = %definition.path.display(),
                            error = %err,
                            "invalid regex pattern, definition will never match"
                        );
                    })
                    .ok()
            }
            (PatternKind::Expression, _) => compile_expression(&definition.pattern)
                .map_err(|err| {
                    tracing::warn!(
                        pattern = %definition.pattern,
                        path = %definition.path.display(),
                        error = %err,
                        "failed to compile cucumber expression, definition will never match"
                    );
                })
                .ok(),
        };

        Self { definition, regex }
    }

    fn matches(&self, step: &FeatureStep) -> bool {
        if !self.definition.keyword.accepts(step.keyword) {
            return false;
        }
        self.regex
            .as_ref()
            .is_some_and(|regex| regex.is_match(&step.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use stepscope_patterns::{KeywordFilter, StepKeyword};

    use crate::model::{MatchStatus, SourceSpan};

    fn step(keyword: StepKeyword, text: &str) -> FeatureStep {
        FeatureStep {
            keyword,
            text: text.into(),
            line: 1,
            scenario_name: "s".into(),
            feature_name: "f".into(),
            path: PathBuf::from("f.feature"),
        }
    }

    fn definition(
        keyword: KeywordFilter,
        kind: PatternKind,
        pattern: &str,
    ) -> Arc<StepDefinition> {
        Arc::new(StepDefinition {
            pattern: pattern.into(),
            kind,
            regex_flags: None,
            keyword,
            path: PathBuf::from("steps.rs"),
            span: SourceSpan {
                start_line: 0,
                start_column: 0,
                end_line: 0,
                end_column: 0,
            },
            function_name: "given".into(),
        })
    }

    fn expression(keyword: StepKeyword, pattern: &str) -> Arc<StepDefinition> {
        definition(
            KeywordFilter::Keyword(keyword),
            PatternKind::Expression,
            pattern,
        )
    }

    #[test]
    fn no_steps_yields_an_empty_result_list() {
        let engine = MatchEngine::new(MatchMode::Both);
        let defs = vec![expression(StepKeyword::Given, "a step")];
        assert!(engine.match_steps(&[], &defs).is_empty());
    }

    #[test]
    fn no_definitions_classifies_every_step_undefined() {
        let engine = MatchEngine::new(MatchMode::Both);
        let steps = vec![
            step(StepKeyword::Given, "an empty cart"),
            step(StepKeyword::Then, "the cart is empty"),
        ];
        let results = engine.match_steps(&steps, &[]);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.status() == MatchStatus::Undefined));
        assert!(results.iter().all(|r| r.matches.is_empty()));
    }

    #[test]
    fn single_match_is_classified_matched() {
        let engine = MatchEngine::new(MatchMode::Both);
        let steps = vec![step(StepKeyword::Given, "I have 3 items in my cart")];
        let defs = vec![expression(StepKeyword::Given, "I have {int} items in my cart")];
        let results = engine.match_steps(&steps, &defs);
        assert_eq!(results[0].status(), MatchStatus::Matched);
        assert_eq!(results[0].matches.len(), 1);
    }

    #[test]
    fn keyword_mismatch_prevents_a_pattern_match() {
        let engine = MatchEngine::new(MatchMode::Both);
        let steps = vec![step(StepKeyword::When, "I have 3 items in my cart")];
        let defs = vec![expression(StepKeyword::Given, "I have {int} items in my cart")];
        let results = engine.match_steps(&steps, &defs);
        assert_eq!(results[0].status(), MatchStatus::Undefined);
    }

    #[test]
    fn continuation_step_matches_union_of_concrete_keywords() {
        let engine = MatchEngine::new(MatchMode::Both);
        let defs = vec![
            expression(StepKeyword::Given, "the light is on"),
            expression(StepKeyword::When, "the light is on"),
            expression(StepKeyword::Then, "the light is on"),
        ];

        let and_result = &engine.match_steps(&[step(StepKeyword::And, "the light is on")], &defs)[0];

        let union: usize = StepKeyword::CONCRETE
            .iter()
            .map(|&kw| {
                engine.match_steps(&[step(kw, "the light is on")], &defs)[0]
                    .matches
                    .len()
            })
            .sum();

        assert_eq!(and_result.matches.len(), union);
    }

    #[test]
    fn match_lists_follow_definition_discovery_order() {
        let engine = MatchEngine::new(MatchMode::Both);
        let steps = vec![step(StepKeyword::Given, "a duplicated step")];
        let first = expression(StepKeyword::Given, "a duplicated step");
        let second = expression(StepKeyword::Given, "a duplicated {word}");
        let defs = vec![Arc::clone(&first), Arc::clone(&second)];

        let results = engine.match_steps(&steps, &defs);
        assert_eq!(results[0].status(), MatchStatus::Ambiguous);
        assert!(Arc::ptr_eq(&results[0].matches[0], &first));
        assert!(Arc::ptr_eq(&results[0].matches[1], &second));
    }

    #[test]
    fn regex_only_mode_excludes_expression_definitions() {
        let engine = MatchEngine::new(MatchMode::RegexOnly);
        let steps = vec![step(StepKeyword::Given, "an empty cart")];
        let defs = vec![
            expression(StepKeyword::Given, "an empty cart"),
            definition(
                KeywordFilter::Keyword(StepKeyword::Given),
                PatternKind::Regex,
                "^an empty cart$",
            ),
        ];
        let results = engine.match_steps(&steps, &defs);
        assert_eq!(results[0].matches.len(), 1);
        assert_eq!(results[0].matches[0].kind, PatternKind::Regex);
    }

    #[test]
    fn expression_only_mode_excludes_regex_definitions() {
        let engine = MatchEngine::new(MatchMode::ExpressionOnly);
        let steps = vec![step(StepKeyword::Given, "an empty cart")];
        let defs = vec![definition(
            KeywordFilter::Keyword(StepKeyword::Given),
            PatternKind::Regex,
            "^an empty cart$",
        )];
        let results = engine.match_steps(&steps, &defs);
        assert_eq!(results[0].status(), MatchStatus::Undefined);
    }

    #[test]
    fn malformed_regex_definitions_never_match() {
        let engine = MatchEngine::new(MatchMode::Both);
        let steps = vec![step(StepKeyword::Given, "anything")];
        let defs = vec![definition(
            KeywordFilter::Keyword(StepKeyword::Given),
            PatternKind::Regex,
            "(unclosed",
        )];
        let results = engine.match_steps(&steps, &defs);
        assert_eq!(results[0].status(), MatchStatus::Undefined);
    }

    #[test]
    fn regex_definitions_apply_their_flags() {
        let engine = MatchEngine::new(MatchMode::Both);
        let steps = vec![step(StepKeyword::Then, "DONE")];
        let mut def = StepDefinition {
            pattern: "^done$".into(),
            kind: PatternKind::Regex,
            regex_flags: Some("i".into()),
            keyword: KeywordFilter::Keyword(StepKeyword::Then),
            path: PathBuf::from("steps.rs"),
            span: SourceSpan {
                start_line: 0,
                start_column: 0,
                end_line: 0,
                end_column: 0,
            },
            function_name: "then".into(),
        };
        let results = engine.match_steps(&steps, &[Arc::new(def.clone())]);
        assert_eq!(results[0].status(), MatchStatus::Matched);

        def.regex_flags = None;
        let results = engine.match_steps(&steps, &[Arc::new(def)]);
        assert_eq!(results[0].status(), MatchStatus::Undefined);
    }

    #[test]
    fn set_match_mode_applies_to_subsequent_calls_only() {
        let mut engine = MatchEngine::new(MatchMode::Both);
        assert_eq!(engine.match_mode(), MatchMode::Both);
        engine.set_match_mode(MatchMode::ExpressionOnly);
        assert_eq!(engine.match_mode(), MatchMode::ExpressionOnly);
    }
}
