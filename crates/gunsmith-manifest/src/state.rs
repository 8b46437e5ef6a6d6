//! Which manifest the bot is serving from.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gunsmith_core::RollIndex;
use tokio::sync::RwLock;

/// State shared between the message handler and the refresh task.
pub type SharedState = Arc<RwLock<ManifestState>>;

#[derive(Debug, Default)]
pub struct ManifestState {
    current: Option<PathBuf>,
    /// Superseded manifests waiting to be deleted.
    old: Vec<PathBuf>,
    last_refresh: Option<DateTime<Utc>>,
}

impl ManifestState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_current(path: impl Into<PathBuf>) -> Self {
        Self {
            current: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    #[must_use]
    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    #[must_use]
    pub fn old(&self) -> &[PathBuf] {
        &self.old
    }

    #[must_use]
    pub const fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// Point at `path`. A different previous manifest is queued for deletion.
    ///
    /// Returns `true` when the manifest changed.
    pub fn replace(&mut self, path: PathBuf) -> bool {
        self.last_refresh = Some(Utc::now());
        if self.current.as_deref() == Some(path.as_path()) {
            return false;
        }
        if let Some(previous) = self.current.replace(path) {
            self.old.push(previous);
        }
        true
    }

    /// Delete superseded manifests and their roll indexes.
    ///
    /// Failures are logged; the queue is cleared either way. Returns how many
    /// manifests were deleted.
    pub fn purge_old(&mut self) -> usize {
        let mut deleted = 0;
        for path in self.old.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    log::info!("Deleted old manifest {}", path.display());
                    deleted += 1;
                }
                Err(e) => {
                    log::error!("Failed to delete old manifest {}: {e}", path.display());
                }
            }
            let index = RollIndex::path_for(&path);
            if let Err(e) = fs::remove_file(&index) {
                if e.kind() != io::ErrorKind::NotFound {
                    log::error!("Failed to delete roll index {}: {e}", index.display());
                }
            }
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_queues_previous() {
        let mut state = ManifestState::with_current("/m/a.content");
        assert!(state.replace(PathBuf::from("/m/b.content")));
        assert_eq!(state.current(), Some(Path::new("/m/b.content")));
        assert_eq!(state.old(), [PathBuf::from("/m/a.content")]);
        assert!(state.last_refresh().is_some());
    }

    #[test]
    fn test_replace_same_path_is_noop() {
        let mut state = ManifestState::with_current("/m/a.content");
        assert!(!state.replace(PathBuf::from("/m/a.content")));
        assert!(state.old().is_empty());
        assert!(state.last_refresh().is_some());
    }

    #[test]
    fn test_first_replace_queues_nothing() {
        let mut state = ManifestState::new();
        assert!(state.replace(PathBuf::from("/m/a.content")));
        assert!(state.old().is_empty());
    }

    #[test]
    fn test_purge_old_deletes_manifest_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.content");
        let current = dir.path().join("new.content");
        fs::write(&old, "old").unwrap();
        fs::write(RollIndex::path_for(&old), "index").unwrap();
        fs::write(&current, "new").unwrap();

        let mut state = ManifestState::with_current(&old);
        state.replace(current.clone());
        assert_eq!(state.purge_old(), 1);

        assert!(!old.exists());
        assert!(!RollIndex::path_for(&old).exists());
        assert!(current.exists());
        assert!(state.old().is_empty());
    }

    #[test]
    fn test_purge_old_clears_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ManifestState::with_current(dir.path().join("gone.content"));
        state.replace(dir.path().join("new.content"));
        assert_eq!(state.purge_old(), 0);
        assert!(state.old().is_empty());
    }
}
