//! Wildcard patterns with named captures.
//!
//! A pattern is a slash-separated path that may contain `*` (anything within
//! one segment), `**` (zero or more whole segments) and their named forms
//! `{name:*}` / `{name:**}`. Compiling a pattern yields two projections:
//!
//! - a plain glob (names dropped, literal text escaped) used to enumerate
//!   candidate paths on the filesystem with the `glob` crate;
//! - an anchored regular expression applied to each candidate's relative
//!   path, which filters candidates and reads the named bindings.

use crate::{Error, Result};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wildcard {
    /// `*`
    Star,
    /// `**`
    DoubleStar,
}

impl Wildcard {
    fn as_glob(self) -> &'static str {
        match self {
            Wildcard::Star => "*",
            Wildcard::DoubleStar => "**",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternToken {
    Literal(String),
    Wildcard {
        kind: Wildcard,
        name: Option<String>,
    },
}

/// Named bindings recovered from one matched path, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Captures(Vec<(String, String)>);

impl Captures {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Captures {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Captures(iter.into_iter().collect())
    }
}

/// A concrete path matched by a pattern.
///
/// `path` is relative to the base directory the pattern was enumerated
/// against. `captures` is `Some` exactly when the pattern has named wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Match {
    pub path: PathBuf,
    pub captures: Option<Captures>,
}

/// A compiled wildcard pattern.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    tokens: Vec<PatternToken>,
    glob: String,
    regex: Regex,
    names: Vec<String>,
}

/// Compile a wildcard pattern.
///
/// # Example
///
/// ```rust
/// use yaml_extras::pattern::compile;
/// use std::path::Path;
///
/// let pattern = compile("branches/{path:**}/{name:*}.yml").unwrap();
/// assert_eq!(pattern.glob_pattern(), "branches/**/*.yml");
///
/// let m = pattern.match_path(Path::new("branches/b1/b2/leaf.yml")).unwrap();
/// let captures = m.captures.unwrap();
/// assert_eq!(captures.get("path"), Some("b1/b2"));
/// assert_eq!(captures.get("name"), Some("leaf"));
/// ```
///
/// # Errors
///
/// Returns [`Error::Pattern`] if a named wildcard is malformed, its identifier
/// is invalid or repeated, or a `**` does not form a whole path segment.
pub fn compile(pattern: &str) -> Result<CompiledPattern> {
    let tokens = tokenize(pattern)?;

    let mut names = Vec::new();
    let mut seen = HashSet::new();
    for token in &tokens {
        if let PatternToken::Wildcard {
            name: Some(name), ..
        } = token
        {
            if !seen.insert(name.as_str()) {
                return Err(pattern_error(
                    pattern,
                    format!("wildcard name '{}' is used more than once", name),
                ));
            }
            names.push(name.clone());
        }
    }

    let glob = tokens
        .iter()
        .map(|token| match token {
            PatternToken::Literal(text) => glob::Pattern::escape(text),
            PatternToken::Wildcard { kind, .. } => kind.as_glob().to_string(),
        })
        .collect::<String>();

    let regex_source = to_regex(&tokens);
    let regex = Regex::new(&regex_source)
        .map_err(|err| pattern_error(pattern, format!("cannot build matcher: {}", err)))?;

    Ok(CompiledPattern {
        source: pattern.to_string(),
        tokens,
        glob,
        regex,
        names,
    })
}

impl CompiledPattern {
    /// The pattern text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    /// Plain-glob projection with named wildcards degraded to `*` / `**`.
    pub fn glob_pattern(&self) -> &str {
        &self.glob
    }

    /// The anchored capture regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Wildcard names in pattern order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn has_wildcards(&self) -> bool {
        self.tokens
            .iter()
            .any(|t| matches!(t, PatternToken::Wildcard { .. }))
    }

    pub fn has_named_wildcards(&self) -> bool {
        !self.names.is_empty()
    }

    /// Match a relative path against the pattern.
    pub fn match_path(&self, path: &Path) -> Option<Match> {
        let text = slash_path(path);
        let caps = self.regex.captures(&text)?;
        let captures = if self.has_named_wildcards() {
            Some(
                self.names
                    .iter()
                    .map(|name| {
                        let value = caps.name(name).map_or("", |m| m.as_str());
                        (name.clone(), value.to_string())
                    })
                    .collect(),
            )
        } else {
            None
        };
        Some(Match {
            path: path.to_path_buf(),
            captures,
        })
    }

    /// Enumerate the glob projection under `base_dir`.
    ///
    /// Returns candidate paths relative to `base_dir`; unreadable entries are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if the glob crate rejects the projection.
    pub fn glob(&self, base_dir: &Path) -> Result<Vec<PathBuf>> {
        let full = if Path::new(&self.source).is_absolute() {
            self.glob.clone()
        } else {
            let base = glob::Pattern::escape(&base_dir.to_string_lossy());
            Path::new(&base).join(&self.glob).to_string_lossy().into_owned()
        };

        let paths = glob::glob(&full)
            .map_err(|err| pattern_error(&self.source, err.to_string()))?;

        let mut candidates = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => {
                    let relative = match path.strip_prefix(base_dir) {
                        Ok(relative) => relative.to_path_buf(),
                        Err(_) => path,
                    };
                    candidates.push(relative);
                }
                Err(err) => {
                    tracing::warn!(pattern = %self.source, error = %err, "skipping unreadable path");
                }
            }
        }
        Ok(candidates)
    }

    /// Apply the capture regex to candidate paths.
    ///
    /// Candidates the regex rejects are dropped. The result is de-duplicated
    /// and sorted by path string.
    pub fn matches_from(&self, candidates: &[PathBuf]) -> Vec<Match> {
        let mut seen = HashSet::new();
        let mut matches: Vec<Match> = candidates
            .iter()
            .filter_map(|candidate| {
                let found = self.match_path(candidate);
                if found.is_none() {
                    tracing::trace!(pattern = %self.source, path = %candidate.display(), "glob candidate rejected");
                }
                found
            })
            .filter(|m| seen.insert(m.clone()))
            .collect();
        matches.sort_by_cached_key(|m| slash_path(&m.path));
        matches
    }

    /// Walk `base_dir` once and return every match, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if the glob projection is rejected.
    pub fn enumerate(&self, base_dir: &Path) -> Result<Vec<Match>> {
        let candidates = self.glob(base_dir)?;
        Ok(self.matches_from(&candidates))
    }

    /// Substitute captures back into the pattern's literal skeleton.
    ///
    /// Returns `None` if the pattern has unnamed wildcards or a binding is
    /// missing. A `{name:**}` bound to zero segments drops its separator.
    pub fn expand(&self, captures: &Captures) -> Option<String> {
        let mut out = String::new();
        let mut skip_slash = false;
        for token in &self.tokens {
            match token {
                PatternToken::Literal(text) => {
                    let text = if skip_slash {
                        text.strip_prefix('/').unwrap_or(text)
                    } else {
                        text
                    };
                    out.push_str(text);
                    skip_slash = false;
                }
                PatternToken::Wildcard { kind, name } => {
                    let value = captures.get(name.as_deref()?)?;
                    out.push_str(value);
                    skip_slash = *kind == Wildcard::DoubleStar && value.is_empty();
                }
            }
        }
        Some(out)
    }
}

fn pattern_error(pattern: &str, message: impl Into<String>) -> Error {
    Error::Pattern {
        tag: None,
        pattern: pattern.to_string(),
        message: message.into(),
        location: None,
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a pattern into literal runs and wildcards.
fn tokenize(pattern: &str) -> Result<Vec<PatternToken>> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' => {
                let Some(close) = chars[i..].iter().position(|&c| c == '}') else {
                    return Err(pattern_error(pattern, format!("unterminated '{{' at {}", i)));
                };
                let inner: String = chars[i + 1..i + close].iter().collect();
                let Some((name, wildcard)) = inner.split_once(':') else {
                    return Err(pattern_error(
                        pattern,
                        format!("expected '{{name:*}}' or '{{name:**}}', found '{{{}}}'", inner),
                    ));
                };
                if !is_identifier(name) {
                    return Err(pattern_error(
                        pattern,
                        format!("'{}' is not a valid wildcard name", name),
                    ));
                }
                let kind = match wildcard {
                    "*" => Wildcard::Star,
                    "**" => Wildcard::DoubleStar,
                    other => {
                        return Err(pattern_error(
                            pattern,
                            format!("unsupported wildcard '{}' in '{{{}}}'", other, inner),
                        ));
                    }
                };
                check_double_star(pattern, &chars, kind, i, i + close + 1)?;
                flush_literal(&mut tokens, &mut literal);
                tokens.push(PatternToken::Wildcard {
                    kind,
                    name: Some(name.to_string()),
                });
                i += close + 1;
            }
            '}' => {
                return Err(pattern_error(pattern, format!("unmatched '}}' at {}", i)));
            }
            '*' => {
                let run = chars[i..].iter().take_while(|&&c| c == '*').count();
                let kind = match run {
                    1 => Wildcard::Star,
                    2 => Wildcard::DoubleStar,
                    _ => {
                        return Err(pattern_error(
                            pattern,
                            format!("'{}' is not a wildcard", "*".repeat(run)),
                        ));
                    }
                };
                check_double_star(pattern, &chars, kind, i, i + run)?;
                flush_literal(&mut tokens, &mut literal);
                tokens.push(PatternToken::Wildcard { kind, name: None });
                i += run;
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }
    flush_literal(&mut tokens, &mut literal);
    Ok(tokens)
}

fn flush_literal(tokens: &mut Vec<PatternToken>, literal: &mut String) {
    if !literal.is_empty() {
        tokens.push(PatternToken::Literal(std::mem::take(literal)));
    }
}

/// `**` must stand alone between separators.
fn check_double_star(
    pattern: &str,
    chars: &[char],
    kind: Wildcard,
    start: usize,
    end: usize,
) -> Result<()> {
    if kind != Wildcard::DoubleStar {
        return Ok(());
    }
    let before_ok = start == 0 || chars[start - 1] == '/';
    let after_ok = end == chars.len() || chars[end] == '/';
    if before_ok && after_ok {
        Ok(())
    } else {
        Err(pattern_error(
            pattern,
            "'**' must form a whole path segment",
        ))
    }
}

fn to_regex(tokens: &[PatternToken]) -> String {
    let mut out = String::from("^");
    let mut skip_slash = false;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            PatternToken::Literal(text) => {
                let text = if skip_slash {
                    text.strip_prefix('/').unwrap_or(text)
                } else {
                    text
                };
                out.push_str(&regex::escape(text));
                skip_slash = false;
            }
            PatternToken::Wildcard { kind, name } => {
                let followed_by_slash = matches!(
                    tokens.get(i + 1),
                    Some(PatternToken::Literal(next)) if next.starts_with('/')
                );
                let body = match (kind, followed_by_slash) {
                    (Wildcard::Star, _) => "[^/]*".to_string(),
                    // Zero or more whole segments, the trailing separator included.
                    (Wildcard::DoubleStar, true) => {
                        skip_slash = true;
                        match name {
                            Some(name) => format!("(?:(?P<{}>[^/]+(?:/[^/]+)*)/)?", name),
                            None => "(?:[^/]+/)*".to_string(),
                        }
                    }
                    (Wildcard::DoubleStar, false) => ".*".to_string(),
                };
                match (name, skip_slash) {
                    (Some(name), false) => out.push_str(&format!("(?P<{}>{})", name, body)),
                    _ => out.push_str(&body),
                }
            }
        }
    }
    out.push('$');
    out
}

/// Render a path with `/` separators for regex matching and sorting.
pub(crate) fn slash_path(path: &Path) -> String {
    let text = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        text.into_owned()
    } else {
        text.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
