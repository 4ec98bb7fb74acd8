//! File access abstraction between the engine and its host.
//!
//! The coordinator never touches the filesystem directly; it goes through a
//! [`FileProvider`], so hosts can substitute overlay file systems (unsaved
//! editor buffers, virtual workspaces) and tests can run fully in memory.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::IndexError;

/// Which half of the index a file feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileClass {
    /// A Gherkin feature file.
    Feature,
    /// A Rust source file holding step-definition registrations.
    Definition,
}

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The file was created or its content changed.
    Modified,
    /// The file was deleted or renamed away.
    Removed,
}

/// A change notification delivered to the coordinator by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEvent {
    /// Path of the changed file.
    pub path: PathBuf,
    /// Which half of the index the file feeds.
    pub class: FileClass,
    /// What happened to it.
    pub kind: ChangeKind,
}

/// Read-only file access used by the coordinator.
pub trait FileProvider: Send + Sync {
    /// List every file matching `include` and not matching `exclude`, in
    /// deterministic (sorted) order.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidConfig`] for malformed globs and
    /// [`IndexError::Io`] for filesystem failures.
    fn discover(&self, include: &[String], exclude: &[String]) -> Result<Vec<PathBuf>, IndexError>;

    /// Read a file's content as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] when the file cannot be read.
    fn read_text(&self, path: &Path) -> Result<String, IndexError>;

    /// The file's size in bytes, checked before it is read.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] when the file cannot be inspected.
    fn byte_size(&self, path: &Path) -> Result<u64, IndexError>;
}

/// A [`FileProvider`] backed by the real filesystem, rooted at a workspace
/// directory.
#[derive(Debug, Clone)]
pub struct FsFileProvider {
    root: PathBuf,
}

impl FsFileProvider {
    /// Create a provider rooted at `root`; globs are matched against paths
    /// relative to it.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The workspace root this provider walks.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn build_glob_set(globs: &[String]) -> Result<GlobSet, IndexError> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        let compiled = Glob::new(glob).map_err(|err| {
            IndexError::InvalidConfig(format!("invalid glob '{glob}': {err}"))
        })?;
        builder.add(compiled);
    }
    builder
        .build()
        .map_err(|err| IndexError::InvalidConfig(format!("failed to build glob set: {err}")))
}

impl FileProvider for FsFileProvider {
    fn discover(&self, include: &[String], exclude: &[String]) -> Result<Vec<PathBuf>, IndexError> {
        let include_set = build_glob_set(include)?;
        let exclude_set = build_glob_set(exclude)?;

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    // Symlink loops are skipped, not fatal.
                    if err.loop_ancestor().is_some() {
                        continue;
                    }
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or_else(|_| entry.path());
            if include_set.is_match(relative) && !exclude_set.is_match(relative) {
                files.push(entry.path().to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    fn read_text(&self, path: &Path) -> Result<String, IndexError> {
        Ok(fs::read_to_string(path)?)
    }

    fn byte_size(&self, path: &Path) -> Result<u64, IndexError> {
        Ok(fs::metadata(path)?.len())
    }
}
