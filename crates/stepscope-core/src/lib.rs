//! Cross-reference indexing between Gherkin features and step definitions.
//!
//! The engine parses feature files, statically extracts step-definition
//! registrations from Rust source, and matches every step against every
//! definition to classify it as matched, undefined, or ambiguous. An
//! incremental coordinator keeps the index current as files change,
//! debouncing bursts of edits and re-matching only the scope a change can
//! affect.
//!
//! Hosts embed the engine through [`IndexCoordinator`], supplying file
//! access via a [`FileProvider`] implementation:
//!
//! ```no_run
//! use std::sync::Arc;
//! use stepscope_core::{FileProvider, FsFileProvider, IndexConfig, IndexCoordinator};
//!
//! # async fn run() -> Result<(), stepscope_core::IndexError> {
//! let provider = Arc::new(FsFileProvider::new("."));
//! let coordinator = IndexCoordinator::new(
//!     IndexConfig::from_env()?,
//!     provider as Arc<dyn FileProvider>,
//! );
//! coordinator.reindex().await?;
//! for result in coordinator.undefined_steps() {
//!     println!("undefined: {} ({})", result.step.text, result.step.path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod extract;
pub mod files;
pub mod index;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod parser;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{IndexConfig, LogLevel};
pub use coordinator::IndexCoordinator;
pub use error::IndexError;
pub use extract::extract_definitions;
pub use files::{ChangeKind, FileClass, FileEvent, FileProvider, FsFileProvider};
pub use index::WorkspaceIndex;
pub use logging::init_logging;
pub use matcher::MatchEngine;
pub use model::{
    BACKGROUND_SCENARIO_NAME, Feature, FeatureStep, MatchMode, MatchResult, MatchStatus,
    PatternKind, Scenario, SourceSpan, StepDefinition, WorkspaceStats,
};
pub use parser::parse_feature;
