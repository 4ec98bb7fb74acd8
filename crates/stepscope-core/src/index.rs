//! In-memory workspace index of features, definitions, and match results.
//!
//! All three collections are keyed by source path in ordered maps, so every
//! iteration order is a pure function of the indexed content. Reindexing the
//! same workspace twice produces an identical index, which keeps derived
//! artefacts (diagnostics, stats, reports) stable across runs.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::{Feature, FeatureStep, MatchResult, MatchStatus, StepDefinition, WorkspaceStats};

/// The workspace-wide cross-reference index.
///
/// The index is a passive store: it never parses, extracts, or matches by
/// itself. The coordinator writes records in wholesale per-file replacements
/// and readers see a consistent snapshot between replacements.
#[derive(Debug, Default)]
pub struct WorkspaceIndex {
    features: BTreeMap<PathBuf, Feature>,
    definitions: BTreeMap<PathBuf, Vec<Arc<StepDefinition>>>,
    match_results: BTreeMap<PathBuf, Vec<MatchResult>>,
}

impl WorkspaceIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every indexed record.
    pub fn clear(&mut self) {
        self.features.clear();
        self.definitions.clear();
        self.match_results.clear();
    }

    /// Replace the indexed feature for its source path.
    pub fn set_feature(&mut self, feature: Feature) {
        self.features.insert(feature.path.clone(), feature);
    }

    /// Remove a feature and its match results.
    pub fn remove_feature(&mut self, path: &Path) {
        self.features.remove(path);
        self.match_results.remove(path);
    }

    /// Replace the definitions extracted from one source file.
    ///
    /// An empty list is stored as an absence: a file that registers nothing
    /// contributes nothing, and its entry disappears entirely.
    pub fn set_step_definitions(&mut self, path: &Path, definitions: Vec<Arc<StepDefinition>>) {
        if definitions.is_empty() {
            self.definitions.remove(path);
        } else {
            self.definitions.insert(path.to_path_buf(), definitions);
        }
    }

    /// Remove every definition contributed by one source file.
    pub fn remove_step_definitions(&mut self, path: &Path) {
        self.definitions.remove(path);
    }

    /// Replace the match results for one feature file.
    pub fn set_match_results(&mut self, path: &Path, results: Vec<MatchResult>) {
        if results.is_empty() {
            self.match_results.remove(path);
        } else {
            self.match_results.insert(path.to_path_buf(), results);
        }
    }

    /// The indexed feature for a path, if any.
    #[must_use]
    pub fn feature(&self, path: &Path) -> Option<&Feature> {
        self.features.get(path)
    }

    /// Every indexed feature, in path order.
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    /// Paths of every indexed feature, in path order.
    pub fn feature_paths(&self) -> impl Iterator<Item = &Path> {
        self.features.keys().map(PathBuf::as_path)
    }

    /// Paths of every file that contributed definitions, in path order.
    pub fn definition_paths(&self) -> impl Iterator<Item = &Path> {
        self.definitions.keys().map(PathBuf::as_path)
    }

    /// Every indexed step, features in path order.
    pub fn all_steps(&self) -> impl Iterator<Item = &FeatureStep> {
        self.features.values().flat_map(Feature::steps)
    }

    /// Definitions grouped by contributing file, files in path order.
    pub fn definitions_by_file(&self) -> impl Iterator<Item = (&Path, &[Arc<StepDefinition>])> {
        self.definitions
            .iter()
            .map(|(path, defs)| (path.as_path(), defs.as_slice()))
    }

    /// Every indexed definition: files in path order, registrations in
    /// source order within each file.
    #[must_use]
    pub fn all_definitions(&self) -> Vec<Arc<StepDefinition>> {
        self.definitions
            .values()
            .flat_map(|defs| defs.iter().map(Arc::clone))
            .collect()
    }

    /// The match results recorded for one feature file.
    #[must_use]
    pub fn match_results_for(&self, path: &Path) -> &[MatchResult] {
        self.match_results
            .get(path)
            .map_or(&[], Vec::as_slice)
    }

    /// Every recorded match result, features in path order.
    pub fn match_results(&self) -> impl Iterator<Item = &MatchResult> {
        self.match_results.values().flatten()
    }

    /// Match results currently classified with the given status.
    pub fn results_with_status(
        &self,
        status: MatchStatus,
    ) -> impl Iterator<Item = &MatchResult> {
        self.match_results()
            .filter(move |result| result.status() == status)
    }

    /// Definitions matched by no step, in index order.
    ///
    /// Membership is decided by definition identity, not pattern text, so
    /// two identical registrations in different files are tracked
    /// independently.
    #[must_use]
    pub fn unused_definitions(&self) -> Vec<Arc<StepDefinition>> {
        let used: HashSet<usize> = self
            .match_results()
            .flat_map(|result| result.matches.iter())
            .map(|def| Arc::as_ptr(def) as usize)
            .collect();

        self.definitions
            .values()
            .flatten()
            .filter(|def| !used.contains(&(Arc::as_ptr(def) as usize)))
            .map(Arc::clone)
            .collect()
    }

    /// Aggregate counts over the current index state.
    #[must_use]
    pub fn stats(&self) -> WorkspaceStats {
        let scenarios = self.features.values().map(|f| f.scenarios.len()).sum();
        let steps = self.all_steps().count();
        let undefined_steps = self.results_with_status(MatchStatus::Undefined).count();
        let ambiguous_steps = self.results_with_status(MatchStatus::Ambiguous).count();

        WorkspaceStats {
            features: self.features.len(),
            scenarios,
            steps,
            undefined_steps,
            ambiguous_steps,
            unused_definitions: self.unused_definitions().len(),
        }
    }
}
