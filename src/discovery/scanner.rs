//! Pattern scanner for candidate directories
//!
//! Yields existing directories that match a pattern. Entries that do not
//! match, are not directories, or vanish mid-listing are skipped silently.
//! Order is whatever the directory listing or glob expansion produces.

use crate::config::Pattern;

use regex::Regex;
use std::fs::ReadDir;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resolves patterns into candidate job directories
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryScanner;

impl DiscoveryScanner {
    pub fn new() -> Self {
        Self
    }

    /// Lazily list the directories currently matching `pattern`
    pub fn scan<'a>(&self, pattern: &'a Pattern) -> Candidates<'a> {
        match pattern {
            Pattern::Glob(glob_pattern) => match glob::glob(glob_pattern.as_str()) {
                Ok(paths) => Candidates::Glob(paths),
                Err(e) => {
                    warn!("Skipping glob pattern {}: {}", glob_pattern.as_str(), e);
                    Candidates::Empty
                }
            },
            Pattern::Regex { basepath, regex } => match std::fs::read_dir(basepath) {
                Ok(entries) => Candidates::Siblings { entries, regex },
                Err(e) => {
                    warn!("Failed to read basepath {}: {}", basepath.display(), e);
                    Candidates::Empty
                }
            },
        }
    }
}

/// Lazy sequence of candidate directories for one pattern
pub enum Candidates<'a> {
    /// Glob expansion
    Glob(glob::Paths),
    /// Children of a basepath whose names match a regex
    Siblings { entries: ReadDir, regex: &'a Regex },
    /// Pattern could not be resolved this pass
    Empty,
}

impl Iterator for Candidates<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        match self {
            Candidates::Glob(paths) => loop {
                match paths.next()? {
                    Ok(path) if is_directory(&path) => return Some(path),
                    Ok(_) => continue,
                    Err(e) => {
                        debug!("Skipping unreadable glob entry: {}", e);
                        continue;
                    }
                }
            },
            Candidates::Siblings { entries, regex } => loop {
                let entry = match entries.next()? {
                    Ok(entry) => entry,
                    Err(e) => {
                        debug!("Skipping unreadable directory entry: {}", e);
                        continue;
                    }
                };

                let name = entry.file_name();
                if !regex.is_match(&name.to_string_lossy()) {
                    continue;
                }

                let path = entry.path();
                if is_directory(&path) {
                    return Some(path);
                }
            },
            Candidates::Empty => None,
        }
    }
}

/// Directory check that follows symlinks
fn is_directory(path: &Path) -> bool {
    path.is_dir()
}
