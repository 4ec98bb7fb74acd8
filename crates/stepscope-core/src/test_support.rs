//! In-memory file provider for exercising the engine without a filesystem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::IndexError;
use crate::files::FileProvider;

/// A [`FileProvider`] over an in-memory map of path to content.
///
/// Paths are matched against globs exactly as stored, so tests should use
/// workspace-relative paths such as `features/cart.feature`.
#[derive(Debug, Default)]
pub struct MemoryFileProvider {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryFileProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.lock().insert(path.into(), content.into());
    }

    /// Remove a file, mirroring a deletion on disk.
    pub fn remove(&self, path: &Path) {
        self.lock().remove(path);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, String>> {
        self.files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn build_glob_set(globs: &[String]) -> Result<GlobSet, IndexError> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        let compiled = Glob::new(glob)
            .map_err(|err| IndexError::InvalidConfig(format!("invalid glob '{glob}': {err}")))?;
        builder.add(compiled);
    }
    builder
        .build()
        .map_err(|err| IndexError::InvalidConfig(format!("failed to build glob set: {err}")))
}

impl FileProvider for MemoryFileProvider {
    fn discover(&self, include: &[String], exclude: &[String]) -> Result<Vec<PathBuf>, IndexError> {
        let include_set = build_glob_set(include)?;
        let exclude_set = build_glob_set(exclude)?;
        Ok(self
            .lock()
            .keys()
            .filter(|path| include_set.is_match(path) && !exclude_set.is_match(path))
            .cloned()
            .collect())
    }

    fn read_text(&self, path: &Path) -> Result<String, IndexError> {
        self.lock().get(path).cloned().ok_or_else(|| {
            IndexError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            ))
        })
    }

    fn byte_size(&self, path: &Path) -> Result<u64, IndexError> {
        self.read_text(path).map(|text| text.len() as u64)
    }
}
