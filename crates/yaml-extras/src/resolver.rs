//! Import resolution.
//!
//! A [`ResolveContext`] carries everything one load needs: the base
//! directory, the loader's pattern cache and options, and the stack of
//! imports currently being resolved. Imported documents are constructed with
//! the same context, so directives inside them resolve recursively against
//! the same base directory.

use crate::anchor;
use crate::cache::PatternCache;
use crate::directive::{DirectiveTag, ImportDirective};
use crate::loader::LoaderOptions;
use crate::node::Node;
use crate::parser;
use crate::pattern::{CompiledPattern, Match};
use crate::{Error, EventStream, Result};
use std::fs;
use std::path::{Path, PathBuf};
use yaml_rust2::Yaml;
use yaml_rust2::yaml::Hash;

/// Key under which non-mapping content is placed by
/// `!import-all-parameterized`.
pub const CONTENT_KEY: &str = "content";

/// State threaded through one load.
pub struct ResolveContext<'a> {
    base_dir: &'a Path,
    cache: &'a mut PatternCache,
    options: &'a LoaderOptions,
    /// Imports being resolved, outermost first
    active: Vec<ActiveImport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveImport {
    path: PathBuf,
    anchor: Option<String>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(base_dir: &'a Path, cache: &'a mut PatternCache, options: &'a LoaderOptions) -> Self {
        Self {
            base_dir,
            cache,
            options,
            active: Vec::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        self.base_dir
    }

    /// Parse, compose and construct one document.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised while parsing or resolving.
    pub fn load_source(&mut self, content: &str, filename: Option<&str>) -> Result<Yaml> {
        let stream = EventStream::parse(content, filename)?;
        let node = parser::compose(stream.events(), stream.filename())?;
        self.construct(&node)
    }

    /// Load a file as the root document, tracking it for cycle detection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Import`] if the file cannot be read, or any error
    /// raised while resolving it.
    pub fn load_root(&mut self, path: &Path) -> Result<Yaml> {
        self.load_path(DirectiveTag::Import, path, None)
    }

    /// Resolve an import directive to its value.
    ///
    /// # Errors
    ///
    /// Returns the import, anchor, cycle or pattern error that stopped it.
    pub fn resolve(&mut self, directive: &ImportDirective) -> Result<Yaml> {
        match directive {
            ImportDirective::Single { path } => self.import(path),
            ImportDirective::SingleAnchor { path, anchor } => self.import_anchor(path, anchor),
            ImportDirective::All { pattern } => self.import_all(pattern),
            ImportDirective::AllAnchor { pattern, anchor } => {
                self.import_all_anchor(pattern, anchor)
            }
            ImportDirective::AllParameterized { pattern } => {
                self.import_all_parameterized(pattern)
            }
        }
    }

    fn import(&mut self, path: &Path) -> Result<Yaml> {
        tracing::debug!(tag = %DirectiveTag::Import, path = %path.display(), "importing");
        self.load_path(DirectiveTag::Import, path, None)
    }

    fn import_anchor(&mut self, path: &Path, anchor: &str) -> Result<Yaml> {
        tracing::debug!(tag = %DirectiveTag::ImportAnchor, path = %path.display(), anchor, "importing");
        self.load_path(DirectiveTag::ImportAnchor, path, Some(anchor))
    }

    fn import_all(&mut self, pattern: &CompiledPattern) -> Result<Yaml> {
        let files = self.matched_files(DirectiveTag::ImportAll, pattern)?;
        let mut values = Vec::with_capacity(files.len());
        for found in &files {
            values.push(self.load_path(DirectiveTag::ImportAll, &found.path, None)?);
        }
        Ok(Yaml::Array(values))
    }

    fn import_all_anchor(&mut self, pattern: &CompiledPattern, anchor: &str) -> Result<Yaml> {
        let files = self.matched_files(DirectiveTag::ImportAllAnchor, pattern)?;
        let mut values = Vec::with_capacity(files.len());
        for found in &files {
            values.push(self.load_path(DirectiveTag::ImportAllAnchor, &found.path, Some(anchor))?);
        }
        Ok(Yaml::Array(values))
    }

    fn import_all_parameterized(&mut self, pattern: &CompiledPattern) -> Result<Yaml> {
        let tag = DirectiveTag::ImportAllParameterized;
        let files = self.matched_files(tag, pattern)?;
        let mut values = Vec::with_capacity(files.len());
        for found in files {
            let content = self.load_path(tag, &found.path, None)?;
            values.push(with_captures(content, &found));
        }
        Ok(Yaml::Array(values))
    }

    /// Enumerate a pattern through the cache, keeping regular files only.
    fn matched_files(&mut self, tag: DirectiveTag, pattern: &CompiledPattern) -> Result<Vec<Match>> {
        let matches = self
            .cache
            .matches(pattern, self.base_dir)
            .map_err(|err| err.or_tag(tag.as_str()))?;
        let total = matches.len();
        let files: Vec<Match> = matches
            .into_iter()
            .filter(|m| self.base_dir.join(&m.path).is_file())
            .collect();
        tracing::debug!(
            tag = %tag,
            pattern = %pattern.as_str(),
            matches = files.len(),
            skipped = total - files.len(),
            "enumerated import pattern"
        );
        Ok(files)
    }

    /// Read, parse and construct a file, or the anchored part of it.
    fn load_path(&mut self, tag: DirectiveTag, path: &Path, anchor: Option<&str>) -> Result<Yaml> {
        if self.active.len() >= self.options.max_depth {
            return Err(Error::NestingTooDeep {
                max_depth: self.options.max_depth,
                location: None,
            });
        }

        let full = self.base_dir.join(path);
        let content = fs::read_to_string(&full).map_err(|err| Error::Import {
            tag: tag.as_str().to_string(),
            path: full.clone(),
            reason: err.to_string(),
            location: None,
        })?;

        let entry = ActiveImport {
            path: fs::canonicalize(&full).unwrap_or_else(|_| full.clone()),
            anchor: anchor.map(str::to_string),
        };
        if self.options.detect_cycles && self.active.contains(&entry) {
            let mut chain: Vec<PathBuf> = self.active.iter().map(|a| a.path.clone()).collect();
            chain.push(entry.path);
            return Err(Error::ImportCycle {
                chain,
                location: None,
            });
        }

        self.active.push(entry);
        let result = self.construct_file(&full, &content, anchor);
        self.active.pop();
        result
    }

    fn construct_file(&mut self, full: &Path, content: &str, anchor: Option<&str>) -> Result<Yaml> {
        let filename = full.display().to_string();
        let stream = match anchor {
            Some(anchor) => EventStream::parse_until_anchor(content, Some(&filename), anchor)?,
            None => EventStream::parse(content, Some(&filename))?,
        };
        let events = match anchor {
            Some(anchor) => anchor::extract(stream.events(), anchor).map_err(|err| match err {
                Error::AnchorNotFound {
                    anchor, location, ..
                } => Error::AnchorNotFound {
                    anchor,
                    path: Some(full.to_path_buf()),
                    location,
                },
                other => other,
            })?,
            None => stream.events(),
        };
        let node: Node = parser::compose(events, Some(&filename))?;
        self.construct(&node)
    }
}

/// Attach a match's captures to its imported content.
///
/// Captures come first in pattern order and win over content keys with the
/// same name. Non-mapping content is placed under [`CONTENT_KEY`].
fn with_captures(content: Yaml, found: &Match) -> Yaml {
    let mut hash = Hash::new();
    if let Some(captures) = &found.captures {
        for (name, value) in captures.iter() {
            hash.insert(Yaml::String(name.to_string()), Yaml::String(value.to_string()));
        }
    }
    match content {
        Yaml::Hash(entries) => {
            for (key, value) in entries {
                if !hash.contains_key(&key) {
                    hash.insert(key, value);
                }
            }
        }
        other => {
            let key = Yaml::String(CONTENT_KEY.to_string());
            if !hash.contains_key(&key) {
                hash.insert(key, other);
            }
        }
    }
    Yaml::Hash(hash)
}
