//! Construction of resolved values from composed nodes.
//!
//! Directive-tagged nodes are handed to their handler; everything else is
//! built the way a plain YAML loader would, with merge keys intercepted
//! before the mapping is assembled.

use crate::concat;
use crate::directive::{DirectiveTag, ImportDirective};
use crate::merge::{self, MappingEntry};
use crate::node::{Node, NodeEntry, NodeKind};
use crate::resolver::ResolveContext;
use crate::{Error, Result, SourceInfo};
use yaml_rust2::Yaml;
use yaml_rust2::yaml::Hash;

/// A directive handler.
pub type Handler = for<'a, 'b> fn(&mut ResolveContext<'a>, &'b Node) -> Result<Yaml>;

/// Handler for each directive tag.
pub fn handler(tag: DirectiveTag) -> Handler {
    match tag {
        DirectiveTag::Concat => concat::concat,
        DirectiveTag::Import
        | DirectiveTag::ImportAnchor
        | DirectiveTag::ImportAll
        | DirectiveTag::ImportAllAnchor
        | DirectiveTag::ImportAllParameterized => import,
    }
}

/// Directive handler shared by the import tags.
fn import(ctx: &mut ResolveContext<'_>, node: &Node) -> Result<Yaml> {
    let tag = node
        .tag
        .as_deref()
        .and_then(DirectiveTag::from_tag)
        .unwrap_or(DirectiveTag::Import);
    let Some(argument) = node.as_scalar() else {
        return Err(Error::DirectiveArgument {
            tag: tag.as_str().to_string(),
            message: format!("expected a scalar argument, found {}", node.kind_name()),
            location: Some(node.source_info.clone()),
        });
    };
    let directive = ImportDirective::parse(tag, argument)?;
    ctx.resolve(&directive)
}

/// True for tags that belong to the directive table.
pub fn is_directive(node: &Node) -> bool {
    node.tag.as_deref().and_then(DirectiveTag::from_tag).is_some()
}

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

impl ResolveContext<'_> {
    /// Construct a node into a value, resolving any directives inside it.
    ///
    /// # Errors
    ///
    /// Propagates directive failures, with the node's location attached when
    /// the failure carries none.
    pub fn construct(&mut self, node: &Node) -> Result<Yaml> {
        if let Some(tag) = node.tag.as_deref().and_then(DirectiveTag::from_tag) {
            return handler(tag)(self, node).map_err(|err| err.or_location(&node.source_info));
        }

        if let Some(tag) = node.tag.as_deref() {
            if !tag.starts_with(CORE_TAG_PREFIX) {
                tracing::warn!(tag, location = %node.source_info, "ignoring unknown tag");
            }
        }

        match &node.kind {
            NodeKind::Scalar { value, plain } => {
                construct_scalar(node.tag.as_deref(), value, *plain, &node.source_info)
            }
            NodeKind::Sequence(items) => items
                .iter()
                .map(|item| self.construct(item))
                .collect::<Result<Vec<_>>>()
                .map(Yaml::Array),
            NodeKind::Mapping(entries) => self.construct_mapping(entries),
        }
    }

    fn construct_mapping(&mut self, entries: &[NodeEntry]) -> Result<Yaml> {
        let mut hash = Hash::new();
        for entry in merge::flatten_merge_keys(self, entries)? {
            let (key, value) = match entry {
                MappingEntry::Merged(key, value) => (key, value),
                MappingEntry::Explicit(entry) => {
                    (self.construct(&entry.key)?, self.construct(&entry.value)?)
                }
            };
            insert_in_place(&mut hash, key, value);
        }
        Ok(Yaml::Hash(hash))
    }
}

/// Insert or overwrite, keeping an existing key at its first position.
pub(crate) fn insert_in_place(hash: &mut Hash, key: Yaml, value: Yaml) {
    match hash.get_mut(&key) {
        Some(slot) => *slot = value,
        None => {
            hash.insert(key, value);
        }
    }
}

fn construct_scalar(tag: Option<&str>, value: &str, plain: bool, source_info: &SourceInfo) -> Result<Yaml> {
    let invalid = |kind: &str| Error::Parse {
        message: format!("'{}' is not a valid {}", value, kind),
        location: Some(source_info.clone()),
    };

    match tag.and_then(|t| t.strip_prefix(CORE_TAG_PREFIX)) {
        Some("str") => Ok(Yaml::String(value.to_string())),
        Some("int") => value
            .parse::<i64>()
            .map(Yaml::Integer)
            .map_err(|_| invalid("integer")),
        Some("float") => match value.parse::<f64>() {
            Ok(_) => Ok(Yaml::Real(value.to_string())),
            Err(_) => Err(invalid("float")),
        },
        Some("bool") => match parse_scalar_value(value) {
            Yaml::Boolean(b) => Ok(Yaml::Boolean(b)),
            _ => Err(invalid("boolean")),
        },
        Some("null") => Ok(Yaml::Null),
        _ if plain => Ok(parse_scalar_value(value)),
        _ => Ok(Yaml::String(value.to_string())),
    }
}

/// Type a plain scalar.
///
/// YAML 1.1 booleans and null spellings are accepted on top of the forms
/// `Yaml::from_str` knows (hex and octal integers, `.inf`, `.nan`).
fn parse_scalar_value(value: &str) -> Yaml {
    match value {
        "yes" | "Yes" | "YES" | "on" | "On" | "ON" => Yaml::Boolean(true),
        "no" | "No" | "NO" | "off" | "Off" | "OFF" => Yaml::Boolean(false),
        "Null" | "NULL" => Yaml::Null,
        _ => Yaml::from_str(value),
    }
}
