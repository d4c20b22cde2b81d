//! Directive tags and import arguments.
//!
//! The set of tags is closed. Each tag maps to one handler in
//! [`crate::construct`]; import tags additionally parse their scalar
//! argument into an [`ImportDirective`].

use crate::pattern::{self, CompiledPattern};
use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveTag {
    Import,
    ImportAnchor,
    ImportAll,
    ImportAllAnchor,
    ImportAllParameterized,
    Concat,
}

impl DirectiveTag {
    pub const ALL: [DirectiveTag; 6] = [
        DirectiveTag::Import,
        DirectiveTag::ImportAnchor,
        DirectiveTag::ImportAll,
        DirectiveTag::ImportAllAnchor,
        DirectiveTag::ImportAllParameterized,
        DirectiveTag::Concat,
    ];

    /// Look up a directive by its full tag, e.g. `!import.anchor`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == tag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveTag::Import => "!import",
            DirectiveTag::ImportAnchor => "!import.anchor",
            DirectiveTag::ImportAll => "!import-all",
            DirectiveTag::ImportAllAnchor => "!import-all.anchor",
            DirectiveTag::ImportAllParameterized => "!import-all-parameterized",
            DirectiveTag::Concat => "!++",
        }
    }

    /// True for the five import tags.
    pub fn is_import(self) -> bool {
        self != DirectiveTag::Concat
    }
}

impl fmt::Display for DirectiveTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated import argument.
#[derive(Debug, Clone)]
pub enum ImportDirective {
    Single {
        path: PathBuf,
    },
    SingleAnchor {
        path: PathBuf,
        anchor: String,
    },
    All {
        pattern: CompiledPattern,
    },
    AllAnchor {
        pattern: CompiledPattern,
        anchor: String,
    },
    AllParameterized {
        pattern: CompiledPattern,
    },
}

impl ImportDirective {
    /// Parse the scalar argument of an import tag.
    ///
    /// Anchor forms split on the last `" &"`; the anchor follows it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectiveArgument`] for a malformed argument (missing
    /// or invalid anchor, empty path, wrong kind of wildcards) and
    /// [`Error::Pattern`] if a pattern does not compile. `tag` must be an
    /// import tag.
    pub fn parse(tag: DirectiveTag, argument: &str) -> Result<Self> {
        let argument = argument.trim();
        match tag {
            DirectiveTag::Import => Ok(ImportDirective::Single {
                path: PathBuf::from(non_empty_path(tag, argument)?),
            }),
            DirectiveTag::ImportAnchor => {
                let (path, anchor) = split_anchor(tag, argument)?;
                Ok(ImportDirective::SingleAnchor {
                    path: PathBuf::from(path),
                    anchor,
                })
            }
            DirectiveTag::ImportAll => Ok(ImportDirective::All {
                pattern: unnamed_pattern(tag, argument)?,
            }),
            DirectiveTag::ImportAllAnchor => {
                let (text, anchor) = split_anchor(tag, argument)?;
                Ok(ImportDirective::AllAnchor {
                    pattern: unnamed_pattern(tag, text)?,
                    anchor,
                })
            }
            DirectiveTag::ImportAllParameterized => {
                let pattern = compile_for(tag, argument)?;
                if !pattern.has_named_wildcards() {
                    return Err(argument_error(
                        tag,
                        format!(
                            "requires at least one named wildcard such as {{name:*}}, found '{}'",
                            argument
                        ),
                    ));
                }
                Ok(ImportDirective::AllParameterized { pattern })
            }
            DirectiveTag::Concat => Err(argument_error(tag, "is not an import directive")),
        }
    }

    pub fn tag(&self) -> DirectiveTag {
        match self {
            ImportDirective::Single { .. } => DirectiveTag::Import,
            ImportDirective::SingleAnchor { .. } => DirectiveTag::ImportAnchor,
            ImportDirective::All { .. } => DirectiveTag::ImportAll,
            ImportDirective::AllAnchor { .. } => DirectiveTag::ImportAllAnchor,
            ImportDirective::AllParameterized { .. } => DirectiveTag::ImportAllParameterized,
        }
    }
}

fn argument_error(tag: DirectiveTag, message: impl Into<String>) -> Error {
    Error::DirectiveArgument {
        tag: tag.as_str().to_string(),
        message: message.into(),
        location: None,
    }
}

fn non_empty_path(tag: DirectiveTag, path: &str) -> Result<&str> {
    if path.is_empty() {
        Err(argument_error(tag, "expected a path, found an empty string"))
    } else {
        Ok(path)
    }
}

fn split_anchor(tag: DirectiveTag, argument: &str) -> Result<(&str, String)> {
    let Some((path, anchor)) = argument.rsplit_once(" &") else {
        return Err(argument_error(
            tag,
            format!("expected '<path> &<anchor>', found '{}'", argument),
        ));
    };
    let invalid = anchor.is_empty()
        || anchor
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ',' | '[' | ']' | '{' | '}'));
    if invalid {
        return Err(argument_error(
            tag,
            format!("'{}' is not a valid anchor name", anchor),
        ));
    }
    Ok((non_empty_path(tag, path.trim_end())?, anchor.to_string()))
}

fn compile_for(tag: DirectiveTag, text: &str) -> Result<CompiledPattern> {
    pattern::compile(non_empty_path(tag, text)?).map_err(|err| err.or_tag(tag.as_str()))
}

fn unnamed_pattern(tag: DirectiveTag, text: &str) -> Result<CompiledPattern> {
    let pattern = compile_for(tag, text)?;
    if pattern.has_named_wildcards() {
        return Err(argument_error(
            tag,
            format!(
                "does not accept named wildcards, use {} instead",
                DirectiveTag::ImportAllParameterized
            ),
        ));
    }
    Ok(pattern)
}
