//! Create-exclusive claim store

use crate::config::Label;
use crate::error::ClaimError;

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Text written before the owner ID in every marker
pub const MARKER_PREFIX: &str = "Reserved by worker: ";

/// Result of a claim attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This worker created the marker and owns the directory
    Acquired { marker: PathBuf },
    /// A marker already existed, from a moment ago or from an earlier run
    Contended,
}

impl ClaimOutcome {
    /// Whether this worker now owns the directory
    pub fn is_acquired(&self) -> bool {
        matches!(self, ClaimOutcome::Acquired { .. })
    }
}

/// Claims job directories through marker files
#[derive(Debug, Clone)]
pub struct ClaimStore {
    label: Label,
}

impl ClaimStore {
    /// Create a store for markers named `<label>.lock`
    pub fn new(label: Label) -> Self {
        Self { label }
    }

    /// Marker path for `dir`
    pub fn marker_path(&self, dir: &Path) -> PathBuf {
        self.label.lock_path(dir)
    }

    /// Whether `dir` already carries a marker
    ///
    /// Advisory only. Two workers can both see `false`; [`try_claim`]
    /// decides which one wins.
    ///
    /// [`try_claim`]: ClaimStore::try_claim
    pub fn is_claimed(&self, dir: &Path) -> bool {
        self.marker_path(dir).is_file()
    }

    /// Atomically create the marker for `dir`
    ///
    /// Returns [`ClaimOutcome::Contended`] when the marker already exists.
    /// Any other I/O failure is an error.
    pub fn try_claim(&self, dir: &Path, owner: &str) -> Result<ClaimOutcome, ClaimError> {
        let marker = self.marker_path(dir);

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&marker)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(ClaimOutcome::Contended),
            Err(e) => {
                return Err(ClaimError::Io {
                    path: marker,
                    source: e,
                })
            }
        };

        // The marker exists from here on, even if the owner text fails to land
        file.write_all(format!("{}{}", MARKER_PREFIX, owner).as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| ClaimError::Io {
                path: marker.clone(),
                source: e,
            })?;

        Ok(ClaimOutcome::Acquired { marker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_claim_writes_owner_text() {
        let dir = tempdir().unwrap();
        let store = ClaimStore::new(Label::default());

        let outcome = store.try_claim(dir.path(), "abc123").unwrap();
        assert_eq!(
            outcome,
            ClaimOutcome::Acquired {
                marker: dir.path().join("worker.lock")
            }
        );

        let content = fs::read_to_string(dir.path().join("worker.lock")).unwrap();
        assert_eq!(content, "Reserved by worker: abc123");
        assert!(store.is_claimed(dir.path()));
    }

    #[test]
    fn test_second_claim_is_contended() {
        let dir = tempdir().unwrap();
        let store = ClaimStore::new(Label::default());

        assert!(store.try_claim(dir.path(), "first").unwrap().is_acquired());
        assert_eq!(
            store.try_claim(dir.path(), "second").unwrap(),
            ClaimOutcome::Contended
        );

        // The winner's marker is untouched
        let content = fs::read_to_string(store.marker_path(dir.path())).unwrap();
        assert_eq!(content, "Reserved by worker: first");
    }

    #[test]
    fn test_labels_claim_independently() {
        let dir = tempdir().unwrap();
        let sim = ClaimStore::new(Label::new("sim").unwrap());
        let post = ClaimStore::new(Label::new("post").unwrap());

        assert!(sim.try_claim(dir.path(), "w1").unwrap().is_acquired());
        assert!(post.try_claim(dir.path(), "w2").unwrap().is_acquired());
        assert!(!sim.try_claim(dir.path(), "w3").unwrap().is_acquired());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let store = ClaimStore::new(Label::default());

        let result = store.try_claim(&dir.path().join("gone"), "w1");
        assert!(matches!(result, Err(ClaimError::Io { .. })));
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        const CONTENDERS: usize = 16;

        let dir = tempdir().unwrap();
        let path = Arc::new(dir.path().to_path_buf());
        let barrier = Arc::new(Barrier::new(CONTENDERS));

        let handles: Vec<_> = (0..CONTENDERS)
            .map(|i| {
                let path = Arc::clone(&path);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let store = ClaimStore::new(Label::default());
                    barrier.wait();
                    store.try_claim(&path, &format!("worker-{}", i)).unwrap()
                })
            })
            .collect();

        let outcomes: Vec<ClaimOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = outcomes.iter().filter(|o| o.is_acquired()).count();
        let contended = outcomes
            .iter()
            .filter(|o| **o == ClaimOutcome::Contended)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(contended, CONTENDERS - 1);
    }
}
