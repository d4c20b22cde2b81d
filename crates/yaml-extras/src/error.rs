//! Error types for directive resolution.

use crate::SourceInfo;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for yaml-extras operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a document load.
///
/// Nothing is recovered or retried: the first error raised anywhere in the
/// recursive resolution becomes the result of the top-level load.
#[derive(Debug, Error)]
pub enum Error {
    /// YAML syntax error, or an event stream that cannot be composed
    #[error("parse error: {message}{}", at(.location))]
    Parse {
        message: String,
        location: Option<SourceInfo>,
    },

    /// Malformed wildcard pattern
    #[error("{}invalid pattern '{pattern}': {message}{}", tag_prefix(.tag), at(.location))]
    Pattern {
        tag: Option<String>,
        pattern: String,
        message: String,
        location: Option<SourceInfo>,
    },

    /// A file referenced by a directive could not be read
    #[error("{tag} could not import '{}': {reason}{}", .path.display(), at(.location))]
    Import {
        tag: String,
        path: PathBuf,
        reason: String,
        location: Option<SourceInfo>,
    },

    /// The named anchor does not occur in the target document
    #[error("anchor '&{anchor}' not found{}{}", in_file(.path), at(.location))]
    AnchorNotFound {
        anchor: String,
        path: Option<PathBuf>,
        location: Option<SourceInfo>,
    },

    /// `!++` operands of different or unsupported kinds
    #[error("!++ {message}{}", at(.location))]
    ConcatType {
        message: String,
        location: Option<SourceInfo>,
    },

    /// A directive was given a node of the wrong shape
    #[error("{tag} {message}{}", at(.location))]
    DirectiveArgument {
        tag: String,
        message: String,
        location: Option<SourceInfo>,
    },

    /// A file (or anchor within it) imports itself, directly or transitively
    #[error("import cycle: {}{}", fmt_chain(.chain), at(.location))]
    ImportCycle {
        chain: Vec<PathBuf>,
        location: Option<SourceInfo>,
    },

    /// Imports nested deeper than the configured limit
    #[error("imports nested more than {max_depth} levels deep{}", at(.location))]
    NestingTooDeep {
        max_depth: usize,
        location: Option<SourceInfo>,
    },
}

impl Error {
    /// Attach a location to errors that do not carry one yet.
    pub fn or_location(mut self, source_info: &SourceInfo) -> Self {
        match &mut self {
            Error::Parse { location, .. }
            | Error::Import { location, .. }
            | Error::AnchorNotFound { location, .. }
            | Error::ConcatType { location, .. }
            | Error::DirectiveArgument { location, .. }
            | Error::ImportCycle { location, .. }
            | Error::NestingTooDeep { location, .. }
            | Error::Pattern { location, .. } => {
                if location.is_none() {
                    *location = Some(source_info.clone());
                }
            }
        }
        self
    }

    /// Name the directive tag on pattern errors raised before dispatch knew it.
    pub fn or_tag(mut self, directive: &str) -> Self {
        if let Error::Pattern { tag: tag @ None, .. } = &mut self {
            *tag = Some(directive.to_string());
        }
        self
    }

    /// The source location recorded for this error, if any.
    pub fn location(&self) -> Option<&SourceInfo> {
        match self {
            Error::Parse { location, .. }
            | Error::Import { location, .. }
            | Error::AnchorNotFound { location, .. }
            | Error::ConcatType { location, .. }
            | Error::DirectiveArgument { location, .. }
            | Error::ImportCycle { location, .. }
            | Error::NestingTooDeep { location, .. }
            | Error::Pattern { location, .. } => location.as_ref(),
        }
    }
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        Error::Parse {
            message: err.to_string(),
            location: None,
        }
    }
}

fn at(location: &Option<SourceInfo>) -> String {
    match location {
        Some(info) => format!(" (at {})", info),
        None => String::new(),
    }
}

fn tag_prefix(tag: &Option<String>) -> String {
    match tag {
        Some(tag) => format!("{} ", tag),
        None => String::new(),
    }
}

fn in_file(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" in {}", path.display()),
        None => String::new(),
    }
}

fn fmt_chain(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
