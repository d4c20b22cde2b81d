//! The public entry point.

use crate::cache::PatternCache;
use crate::directive::DirectiveTag;
use crate::resolver::ResolveContext;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use yaml_rust2::Yaml;

/// Options for a [`Loader`].
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Directory that relative import paths and patterns resolve against.
    ///
    /// `None` uses the process working directory at loader construction.
    pub base_dir: Option<PathBuf>,

    /// Fail with [`Error::ImportCycle`] when an import re-enters a file (or
    /// anchor) that is still being resolved (default: true).
    pub detect_cycles: bool,

    /// Maximum number of nested imports (default: 64).
    ///
    /// Applies whether or not cycle detection is enabled.
    pub max_depth: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            base_dir: None,
            detect_cycles: true,
            max_depth: 64,
        }
    }
}

impl LoaderOptions {
    /// Set the base directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Enable or disable cycle detection.
    pub fn with_detect_cycles(mut self, detect: bool) -> Self {
        self.detect_cycles = detect;
        self
    }

    /// Set the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Loads YAML documents and resolves their directives.
///
/// The loader owns the pattern cache, which persists across loads until
/// [`Loader::clear_cache`] is called.
///
/// ## Example
///
/// ```rust,no_run
/// use yaml_extras::{Loader, LoaderOptions};
///
/// let mut loader = Loader::with_options(LoaderOptions::default().with_base_dir("config"));
/// let value = loader.load_str("settings: !import settings.yml").unwrap();
/// println!("{:?}", value["settings"]);
/// ```
#[derive(Debug)]
pub struct Loader {
    options: LoaderOptions,
    default_base_dir: PathBuf,
    base_dir: PathBuf,
    cache: PatternCache,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self::with_options(LoaderOptions::default())
    }

    pub fn with_options(options: LoaderOptions) -> Self {
        let default_base_dir = options.base_dir.clone().unwrap_or_else(working_dir);
        Self {
            base_dir: default_base_dir.clone(),
            default_base_dir,
            options,
            cache: PatternCache::new(),
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Current base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn set_base_dir(&mut self, dir: impl Into<PathBuf>) {
        self.base_dir = dir.into();
    }

    /// Restore the base directory chosen at construction.
    pub fn reset_base_dir(&mut self) {
        self.base_dir = self.default_base_dir.clone();
    }

    /// Run `f` with a temporary base directory, restoring the previous one
    /// afterwards.
    pub fn with_base_dir<T>(&mut self, dir: impl Into<PathBuf>, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.base_dir, dir.into());
        let result = f(self);
        self.base_dir = previous;
        result
    }

    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }

    /// Forget every cached pattern enumeration.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Load a document from a string.
    ///
    /// # Errors
    ///
    /// Returns the first parse or directive error encountered.
    pub fn load_str(&mut self, content: &str) -> Result<Yaml> {
        let mut ctx = ResolveContext::new(&self.base_dir, &mut self.cache, &self.options);
        ctx.load_source(content, None)
    }

    /// Load a document from a file.
    ///
    /// A relative `path` is taken relative to the process working directory;
    /// imports inside the document resolve against the base directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Import`] if the file cannot be read, or the first
    /// parse or directive error encountered.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Yaml> {
        let path = path.as_ref();
        let path = std::path::absolute(path).map_err(|err| Error::Import {
            tag: DirectiveTag::Import.as_str().to_string(),
            path: path.to_path_buf(),
            reason: err.to_string(),
            location: None,
        })?;
        tracing::debug!(path = %path.display(), base_dir = %self.base_dir.display(), "loading document");
        let mut ctx = ResolveContext::new(&self.base_dir, &mut self.cache, &self.options);
        ctx.load_root(&path)
    }
}

fn working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = LoaderOptions::default();
        assert_eq!(options.base_dir, None);
        assert!(options.detect_cycles);
        assert_eq!(options.max_depth, 64);
    }

    #[test]
    fn test_default_base_dir_is_working_dir() {
        let loader = Loader::new();
        assert_eq!(loader.base_dir(), working_dir().as_path());
    }

    #[test]
    fn test_base_dir_override_and_reset() {
        let mut loader = Loader::with_options(LoaderOptions::default().with_base_dir("/data"));
        assert_eq!(loader.base_dir(), Path::new("/data"));

        loader.set_base_dir("/other");
        assert_eq!(loader.base_dir(), Path::new("/other"));

        let seen = loader.with_base_dir("/scoped", |l| l.base_dir().to_path_buf());
        assert_eq!(seen, PathBuf::from("/scoped"));
        assert_eq!(loader.base_dir(), Path::new("/other"));

        loader.reset_base_dir();
        assert_eq!(loader.base_dir(), Path::new("/data"));
    }

    #[test]
    fn test_load_plain_string() {
        let mut loader = Loader::new();
        let value = loader.load_str("a: [1, 2]").unwrap();
        assert_eq!(value["a"][1], Yaml::Integer(2));
        assert!(loader.cache().is_empty());
    }
}
