//! Gherkin feature-file parsing into the indexed document model.
//!
//! Parsing is structural only: scenario and step shape, names, and source
//! lines. Semantic validation beyond that is out of scope. A parse failure
//! is non-fatal — the coordinator logs it and leaves any previously indexed
//! document for the same path in place until a successful reparse.

use std::path::Path;

use gherkin::GherkinEnv;
use stepscope_patterns::StepKeyword;

use crate::error::IndexError;
use crate::model::{BACKGROUND_SCENARIO_NAME, Feature, FeatureStep, Scenario};

/// Parse feature source text into an indexed [`Feature`].
///
/// Background blocks become a synthetic scenario named `"Background"`;
/// their steps are indexed and matchable like any other scenario's steps
/// but are never merged into subsequent scenarios. Scenarios inside rule
/// blocks are flattened into the feature's scenario list in document order.
///
/// # Errors
///
/// Returns [`IndexError::FeatureParse`] when the text is not valid Gherkin.
pub fn parse_feature(path: &Path, text: &str) -> Result<Feature, IndexError> {
    let mut source = text.to_owned();
    normalise_trailing_newline(&mut source);
    let document = gherkin::Feature::parse(&source, GherkinEnv::default())?;

    let mut scenarios = Vec::new();
    if let Some(background) = document.background.as_ref() {
        scenarios.push(background_scenario(path, &document.name, background));
    }
    for scenario in &document.scenarios {
        scenarios.push(convert_scenario(path, &document.name, scenario));
    }
    for rule in &document.rules {
        if let Some(background) = rule.background.as_ref() {
            scenarios.push(background_scenario(path, &document.name, background));
        }
        for scenario in &rule.scenarios {
            scenarios.push(convert_scenario(path, &document.name, scenario));
        }
    }

    Ok(Feature {
        name: document.name,
        path: path.to_path_buf(),
        scenarios,
    })
}

fn normalise_trailing_newline(text: &mut String) {
    if !text.ends_with('\n') {
        text.push('\n');
    }
}

fn convert_scenario(path: &Path, feature_name: &str, scenario: &gherkin::Scenario) -> Scenario {
    Scenario {
        name: scenario.name.clone(),
        steps: convert_steps(path, feature_name, &scenario.name, &scenario.steps),
        line: scenario.position.line,
    }
}

fn background_scenario(
    path: &Path,
    feature_name: &str,
    background: &gherkin::Background,
) -> Scenario {
    Scenario {
        name: BACKGROUND_SCENARIO_NAME.to_owned(),
        steps: convert_steps(
            path,
            feature_name,
            BACKGROUND_SCENARIO_NAME,
            &background.steps,
        ),
        line: background.position.line,
    }
}

fn convert_steps(
    path: &Path,
    feature_name: &str,
    scenario_name: &str,
    steps: &[gherkin::Step],
) -> Vec<FeatureStep> {
    steps
        .iter()
        .map(|step| FeatureStep {
            keyword: normalise_keyword(&step.keyword),
            text: step.value.clone(),
            line: step.position.line,
            scenario_name: scenario_name.to_owned(),
            feature_name: feature_name.to_owned(),
            path: path.to_path_buf(),
        })
        .collect()
}

/// Whitespace-normalise and parse a raw keyword, falling back to `Given`
/// for anything outside the fixed enumeration (documented policy, not an
/// error).
fn normalise_keyword(raw: &str) -> StepKeyword {
    raw.parse().unwrap_or(StepKeyword::Given)
}
