//! Memoization of filesystem enumeration for wildcard patterns.
//!
//! Results are keyed by base directory as well as pattern text, so changing
//! the base directory never returns stale paths. The cache does not watch the
//! filesystem; call [`PatternCache::clear`] after files change.

use crate::pattern::{CompiledPattern, Match};
use crate::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct PatternCache {
    /// Raw glob candidates by (glob projection, base directory)
    globs: HashMap<(String, PathBuf), Vec<PathBuf>>,

    /// Filtered matches by (pattern text, base directory)
    matches: HashMap<(String, PathBuf), Vec<Match>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every match of `pattern` under `base_dir`, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Pattern`] if the glob projection is rejected.
    pub fn matches(&mut self, pattern: &CompiledPattern, base_dir: &Path) -> Result<Vec<Match>> {
        let key = (pattern.as_str().to_string(), base_dir.to_path_buf());
        if let Some(found) = self.matches.get(&key) {
            tracing::trace!(pattern = %pattern.as_str(), "pattern cache hit");
            return Ok(found.clone());
        }

        let glob_key = (pattern.glob_pattern().to_string(), base_dir.to_path_buf());
        let candidates = match self.globs.get(&glob_key) {
            Some(candidates) => candidates.clone(),
            None => {
                let candidates = pattern.glob(base_dir)?;
                self.globs.insert(glob_key, candidates.clone());
                candidates
            }
        };

        let found = pattern.matches_from(&candidates);
        self.matches.insert(key, found.clone());
        Ok(found)
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.globs.clear();
        self.matches.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty() && self.matches.is_empty()
    }
}
