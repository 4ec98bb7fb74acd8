//! Incremental coordination of parsing, extraction, and matching.
//!
//! The coordinator owns the workspace index and drives all writes to it.
//! Hosts call [`IndexCoordinator::reindex`] once at startup, then forward
//! file-change notifications; the coordinator debounces them, reprocesses
//! only the changed files, and re-matches the smallest scope the change can
//! affect. A watch channel carries a generation counter that observers use
//! to refresh derived artefacts after each applied update.
//!
//! Change notifications accumulate in a pending set keyed by path, so a
//! burst of edits to several files within one quiet period is applied as a
//! single batch; no notification is ever dropped by a later one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::extract::extract_definitions;
use crate::files::{ChangeKind, FileClass, FileEvent, FileProvider};
use crate::index::WorkspaceIndex;
use crate::matcher::MatchEngine;
use crate::model::{
    Feature, FeatureStep, MatchMode, MatchResult, MatchStatus, StepDefinition, WorkspaceStats,
};
use crate::parser::parse_feature;

/// Files processed between cooperative yields during batch work.
const REINDEX_BATCH: usize = 32;

/// Drives indexing and keeps the workspace index consistent under change.
///
/// Cloning is cheap; clones share the same index and pending state.
#[derive(Debug, Clone)]
pub struct IndexCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    provider: Arc<dyn FileProvider>,
    config: IndexConfig,
    index: Mutex<WorkspaceIndex>,
    engine: Mutex<MatchEngine>,
    pending: Mutex<Pending>,
    /// Token of the most recently started rebuild; a new rebuild cancels
    /// it so runs are mutually exclusive.
    active_reindex: Mutex<Option<CancellationToken>>,
    generation: watch::Sender<u64>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for CoordinatorInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorInner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Pending {
    /// Latest event per path; a later event for the same path supersedes
    /// the earlier one, events for other paths are untouched.
    events: HashMap<PathBuf, FileEvent>,
    timer: Option<JoinHandle<()>>,
}

/// One prepared index write, computed outside the index lock.
enum Update {
    Feature(Feature),
    RemoveFeature(PathBuf),
    Definitions(PathBuf, Vec<Arc<StepDefinition>>),
    RemoveDefinitions(PathBuf),
}

impl IndexCoordinator {
    /// Create a coordinator over a file provider.
    ///
    /// The index starts empty; call [`reindex`](Self::reindex) to populate
    /// it.
    #[must_use]
    pub fn new(config: IndexConfig, provider: Arc<dyn FileProvider>) -> Self {
        let (generation, _) = watch::channel(0);
        let engine = MatchEngine::new(config.match_mode);
        Self {
            inner: Arc::new(CoordinatorInner {
                provider,
                config,
                index: Mutex::new(WorkspaceIndex::new()),
                engine: Mutex::new(engine),
                pending: Mutex::new(Pending::default()),
                active_reindex: Mutex::new(None),
                generation,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Rebuild the entire index from a fresh discovery pass.
    ///
    /// Starting a rebuild cancels any rebuild still in flight. Work is
    /// batched with cooperative yields between batches; cancellation,
    /// whether from a superseding rebuild or from
    /// [`dispose`](Self::dispose), is observed at the next batch boundary
    /// and abandons the run without touching the existing index.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidConfig`] for malformed globs. Per-file
    /// read and parse failures are logged, never escalated.
    pub async fn reindex(&self) -> Result<(), IndexError> {
        let token = {
            let mut active = self
                .inner
                .active_reindex
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = active.take() {
                previous.cancel();
            }
            let token = self.inner.shutdown.child_token();
            *active = Some(token.clone());
            token
        };
        self.inner.run_full_reindex(&token).await
    }

    /// Record a file change and schedule it for debounced processing.
    ///
    /// Must be called within a tokio runtime. Events arriving inside an
    /// open quiet period join the pending batch; the batch is applied once
    /// the period elapses.
    pub fn notify_change(&self, event: FileEvent) {
        let mut pending = self.inner.lock_pending();
        pending.events.insert(event.path.clone(), event);
        if pending.timer.is_none() {
            let inner = Arc::clone(&self.inner);
            pending.timer = Some(tokio::spawn(debounce_loop(inner)));
        }
    }

    /// Apply every pending change now, without waiting out the quiet
    /// period.
    ///
    /// # Errors
    ///
    /// Propagates the same errors as [`reindex`](Self::reindex); per-file
    /// failures are logged and skipped.
    pub async fn flush_pending(&self) -> Result<(), IndexError> {
        self.inner.flush_pending().await
    }

    /// Switch the match mode and re-match every indexed feature under it.
    pub fn update_match_mode(&self, mode: MatchMode) {
        self.inner.update_match_mode(mode);
    }

    /// The currently active match mode.
    #[must_use]
    pub fn match_mode(&self) -> MatchMode {
        self.inner.lock_engine().match_mode()
    }

    /// Subscribe to the generation counter bumped after every applied
    /// update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.generation.subscribe()
    }

    /// Stop all background work and drop pending changes.
    ///
    /// In-flight rebuilds observe the cancellation at their next batch
    /// boundary and abandon their work. The index keeps its last applied
    /// state for readers.
    pub fn dispose(&self) {
        self.inner.shutdown.cancel();
        let mut pending = self.inner.lock_pending();
        pending.events.clear();
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
    }

    /// Aggregate counts over the current index state.
    #[must_use]
    pub fn stats(&self) -> WorkspaceStats {
        self.inner.lock_index().stats()
    }

    /// The indexed feature for a path, if any.
    #[must_use]
    pub fn feature(&self, path: &Path) -> Option<Feature> {
        self.inner.lock_index().feature(path).cloned()
    }

    /// Every indexed feature, in path order.
    #[must_use]
    pub fn features(&self) -> Vec<Feature> {
        self.inner.lock_index().features().cloned().collect()
    }

    /// Every indexed definition: files in path order, registrations in
    /// source order within each file.
    #[must_use]
    pub fn all_definitions(&self) -> Vec<Arc<StepDefinition>> {
        self.inner.lock_index().all_definitions()
    }

    /// Match results recorded for one feature file.
    #[must_use]
    pub fn match_results_for(&self, path: &Path) -> Vec<MatchResult> {
        self.inner.lock_index().match_results_for(path).to_vec()
    }

    /// Steps currently matched by no definition.
    #[must_use]
    pub fn undefined_steps(&self) -> Vec<MatchResult> {
        self.results_with_status(MatchStatus::Undefined)
    }

    /// Steps currently matched by more than one definition.
    #[must_use]
    pub fn ambiguous_steps(&self) -> Vec<MatchResult> {
        self.results_with_status(MatchStatus::Ambiguous)
    }

    /// Definitions matched by no step.
    #[must_use]
    pub fn unused_definitions(&self) -> Vec<Arc<StepDefinition>> {
        self.inner.lock_index().unused_definitions()
    }

    fn results_with_status(&self, status: MatchStatus) -> Vec<MatchResult> {
        self.inner
            .lock_index()
            .results_with_status(status)
            .cloned()
            .collect()
    }
}

/// Waits out the quiet period, applies the batch, and keeps going while
/// further changes arrive. Exits once a quiet period ends with nothing
/// pending.
async fn debounce_loop(inner: Arc<CoordinatorInner>) {
    loop {
        tokio::select! {
            () = inner.shutdown.cancelled() => return,
            () = tokio::time::sleep(inner.config.debounce) => {}
        }
        if let Err(err) = inner.flush_pending().await {
            tracing::warn!(error = %err, "failed to apply debounced changes");
        }
        let mut pending = inner.lock_pending();
        if pending.events.is_empty() {
            pending.timer = None;
            return;
        }
    }
}

impl CoordinatorInner {
    fn lock_index(&self) -> MutexGuard<'_, WorkspaceIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_engine(&self) -> MutexGuard<'_, MatchEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump_generation(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }

    async fn run_full_reindex(&self, token: &CancellationToken) -> Result<(), IndexError> {
        if token.is_cancelled() {
            return Ok(());
        }

        let feature_paths = self
            .provider
            .discover(&self.config.feature_globs, &self.config.exclude_globs)?;
        let definition_paths = self
            .provider
            .discover(&self.config.definition_globs, &self.config.exclude_globs)?;
        tracing::info!(
            features = feature_paths.len(),
            definition_files = definition_paths.len(),
            "starting full reindex"
        );

        let mut definitions: Vec<(PathBuf, Vec<Arc<StepDefinition>>)> = Vec::new();
        for batch in definition_paths.chunks(REINDEX_BATCH) {
            if token.is_cancelled() {
                return Ok(());
            }
            for path in batch {
                if let Some(source) = self.admit_and_read(path) {
                    let defs = extract_definitions(path, &source)
                        .into_iter()
                        .map(Arc::new)
                        .collect();
                    definitions.push((path.clone(), defs));
                }
            }
            tokio::task::yield_now().await;
        }

        let mut parsed: Vec<Feature> = Vec::new();
        let mut failed: Vec<PathBuf> = Vec::new();
        for batch in feature_paths.chunks(REINDEX_BATCH) {
            if token.is_cancelled() {
                return Ok(());
            }
            for path in batch {
                let Some(text) = self.admit_and_read(path) else {
                    continue;
                };
                match parse_feature(path, &text) {
                    Ok(feature) => parsed.push(feature),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "failed to parse feature");
                        failed.push(path.clone());
                    }
                }
            }
            tokio::task::yield_now().await;
        }

        if token.is_cancelled() {
            return Ok(());
        }

        {
            let engine = self.lock_engine();
            let mut index = self.lock_index();
            // Unparseable files keep their previous snapshot until a
            // successful reparse.
            let carried: Vec<Feature> = failed
                .iter()
                .filter_map(|path| index.feature(path).cloned())
                .collect();
            index.clear();
            for (path, defs) in definitions {
                index.set_step_definitions(&path, defs);
            }
            for feature in carried.into_iter().chain(parsed) {
                index.set_feature(feature);
            }
            let paths: Vec<PathBuf> = index.feature_paths().map(Path::to_path_buf).collect();
            rematch(&mut index, &engine, &paths);
        }

        self.bump_generation();
        Ok(())
    }

    async fn flush_pending(&self) -> Result<(), IndexError> {
        if self.shutdown.is_cancelled() {
            return Ok(());
        }
        let events: Vec<FileEvent> = {
            let mut pending = self.lock_pending();
            pending.events.drain().map(|(_, event)| event).collect()
        };
        if events.is_empty() {
            return Ok(());
        }
        self.apply_events(events).await
    }

    async fn apply_events(&self, events: Vec<FileEvent>) -> Result<(), IndexError> {
        let mut updates: Vec<Update> = Vec::new();
        let mut definitions_changed = false;
        let mut touched_features: Vec<PathBuf> = Vec::new();

        for (position, event) in events.iter().enumerate() {
            if self.shutdown.is_cancelled() {
                return Ok(());
            }
            if let Some(update) = self.prepare_update(event) {
                match &update {
                    Update::Feature(feature) => touched_features.push(feature.path.clone()),
                    Update::RemoveFeature(_) => {}
                    Update::Definitions(..) | Update::RemoveDefinitions(_) => {
                        definitions_changed = true;
                    }
                }
                updates.push(update);
            }
            if (position + 1) % REINDEX_BATCH == 0 {
                tokio::task::yield_now().await;
            }
        }

        if updates.is_empty() {
            return Ok(());
        }

        {
            let engine = self.lock_engine();
            let mut index = self.lock_index();
            for update in updates {
                match update {
                    Update::Feature(feature) => index.set_feature(feature),
                    Update::RemoveFeature(path) => index.remove_feature(&path),
                    Update::Definitions(path, defs) => index.set_step_definitions(&path, defs),
                    Update::RemoveDefinitions(path) => index.remove_step_definitions(&path),
                }
            }
            // A definition change can affect any feature; a feature change
            // affects only itself.
            let scope: Vec<PathBuf> = if definitions_changed {
                index.feature_paths().map(Path::to_path_buf).collect()
            } else {
                touched_features
            };
            rematch(&mut index, &engine, &scope);
        }

        self.bump_generation();
        Ok(())
    }

    fn prepare_update(&self, event: &FileEvent) -> Option<Update> {
        match (event.class, event.kind) {
            (FileClass::Feature, ChangeKind::Removed) => {
                Some(Update::RemoveFeature(event.path.clone()))
            }
            (FileClass::Definition, ChangeKind::Removed) => {
                Some(Update::RemoveDefinitions(event.path.clone()))
            }
            (FileClass::Feature, ChangeKind::Modified) => {
                let text = self.admit_and_read(&event.path)?;
                match parse_feature(&event.path, &text) {
                    Ok(feature) => Some(Update::Feature(feature)),
                    Err(err) => {
                        // Keep the previous snapshot until a successful
                        // reparse.
                        tracing::warn!(
                            path = %event.path.display(),
                            error = %err,
                            "failed to parse feature, keeping previous snapshot"
                        );
                        None
                    }
                }
            }
            (FileClass::Definition, ChangeKind::Modified) => {
                let source = self.admit_and_read(&event.path)?;
                let defs = extract_definitions(&event.path, &source)
                    .into_iter()
                    .map(Arc::new)
                    .collect();
                Some(Update::Definitions(event.path.clone(), defs))
            }
        }
    }

    /// Read a file if it passes the size guard; oversized or unreadable
    /// files are logged and skipped, leaving prior index entries intact.
    fn admit_and_read(&self, path: &Path) -> Option<String> {
        match self.provider.byte_size(path) {
            Ok(size) if size > self.config.max_file_bytes => {
                tracing::debug!(
                    path = %path.display(),
                    size,
                    limit = self.config.max_file_bytes,
                    "skipping oversized file"
                );
                return None;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to stat file");
                return None;
            }
        }
        match self.provider.read_text(path) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read file");
                None
            }
        }
    }

    fn update_match_mode(&self, mode: MatchMode) {
        {
            let mut engine = self.lock_engine();
            if engine.match_mode() == mode {
                return;
            }
            engine.set_match_mode(mode);
        }
        {
            let engine = self.lock_engine();
            let mut index = self.lock_index();
            let paths: Vec<PathBuf> = index.feature_paths().map(Path::to_path_buf).collect();
            rematch(&mut index, &engine, &paths);
        }
        self.bump_generation();
    }
}

/// Re-match the features at `paths` against the full definition set and
/// replace their recorded results.
fn rematch(index: &mut WorkspaceIndex, engine: &MatchEngine, paths: &[PathBuf]) {
    let definitions = index.all_definitions();
    for path in paths {
        let steps: Option<Vec<FeatureStep>> = index
            .feature(path)
            .map(|feature| feature.steps().cloned().collect());
        let Some(steps) = steps else {
            continue;
        };
        let results = engine.match_steps(&steps, &definitions);
        index.set_match_results(path, results);
    }
}
