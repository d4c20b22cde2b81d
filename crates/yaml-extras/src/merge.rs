//! Merge-key (`<<`) interception.
//!
//! Merge sources are resolved before the mapping is built, so a `<<` whose
//! value is an import directive merges the imported content instead of the
//! directive node. Sources are applied in document order and later sources
//! override earlier ones. The mapping's explicit keys come after every
//! merged key and override them.

use crate::construct::insert_in_place;
use crate::node::{Node, NodeEntry};
use crate::resolver::ResolveContext;
use crate::{Error, Result};
use yaml_rust2::Yaml;
use yaml_rust2::yaml::Hash;

/// Tag for an explicitly typed merge key (`!!merge <<`).
pub const MERGE_TAG: &str = "tag:yaml.org,2002:merge";

/// One entry of a mapping after merge keys have been flattened.
#[derive(Debug)]
pub enum MappingEntry<'n> {
    /// A key contributed by a merge source, already constructed.
    Merged(Yaml, Yaml),
    /// An entry written in the mapping itself.
    Explicit(&'n NodeEntry),
}

pub fn is_merge_key(key: &Node) -> bool {
    key.is_plain_scalar("<<") || key.tag.as_deref() == Some(MERGE_TAG)
}

/// Rewrite a mapping's entries with every merge source resolved.
///
/// The result holds the merged keys first, in the order they were first
/// contributed, followed by the explicit entries.
///
/// # Errors
///
/// Returns [`Error::DirectiveArgument`] tagged `<<` if a source does not
/// yield mappings, or any error raised while resolving a source.
pub fn flatten_merge_keys<'n>(
    ctx: &mut ResolveContext<'_>,
    entries: &'n [NodeEntry],
) -> Result<Vec<MappingEntry<'n>>> {
    let mut merged = Hash::new();
    let mut explicit = Vec::with_capacity(entries.len());

    for entry in entries {
        if !is_merge_key(&entry.key) {
            explicit.push(MappingEntry::Explicit(entry));
            continue;
        }

        let value = ctx.construct(&entry.value)?;
        let mut sources = Vec::new();
        collect_sources(value, &mut sources)
            .map_err(|err| err.or_location(&entry.value.source_info))?;
        for source in sources {
            for (key, value) in source {
                insert_in_place(&mut merged, key, value);
            }
        }
    }

    if !merged.is_empty() {
        tracing::trace!(keys = merged.len(), "merged keys into mapping");
    }

    let mut result: Vec<MappingEntry<'n>> = merged
        .into_iter()
        .map(|(key, value)| MappingEntry::Merged(key, value))
        .collect();
    result.extend(explicit);
    Ok(result)
}

/// A mapping is one source; a sequence is a list of sources.
fn collect_sources(value: Yaml, out: &mut Vec<Hash>) -> Result<()> {
    match value {
        Yaml::Hash(hash) => {
            out.push(hash);
            Ok(())
        }
        Yaml::Array(items) => {
            for item in items {
                collect_sources(item, out)?;
            }
            Ok(())
        }
        other => Err(Error::DirectiveArgument {
            tag: "<<".to_string(),
            message: format!("expected a mapping to merge, found {}", describe(&other)),
            location: None,
        }),
    }
}

fn describe(value: &Yaml) -> &'static str {
    match value {
        Yaml::Null => "null",
        Yaml::Boolean(_) => "a boolean",
        Yaml::Integer(_) | Yaml::Real(_) => "a number",
        Yaml::String(_) => "a string",
        Yaml::Array(_) => "a sequence",
        Yaml::Hash(_) => "a mapping",
        _ => "an unsupported value",
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::PatternCache;
    use crate::loader::LoaderOptions;
    use crate::resolver::ResolveContext;
    use crate::{Error, Result};
    use std::path::Path;
    use yaml_rust2::{Yaml, YamlLoader};

    fn construct(text: &str) -> Result<Yaml> {
        let mut cache = PatternCache::new();
        let options = LoaderOptions::default();
        let mut ctx = ResolveContext::new(Path::new("."), &mut cache, &options);
        ctx.load_source(text, None)
    }

    fn yaml(text: &str) -> Yaml {
        YamlLoader::load_from_str(text).unwrap().remove(0)
    }

    #[test]
    fn test_explicit_keys_override_merged() {
        let value = construct("base: &base {a: 1, b: 2}\nchild:\n  b: 3\n  <<: *base\n").unwrap();
        assert_eq!(value["child"], yaml("a: 1\nb: 3"));
    }

    #[test]
    fn test_later_sources_override_earlier() {
        let text = "x: &x {a: 1, b: 1}\ny: &y {b: 2, c: 2}\nz:\n  <<: [*x, *y]\n";
        assert_eq!(construct(text).unwrap()["z"], yaml("a: 1\nb: 2\nc: 2"));
    }

    #[test]
    fn test_repeated_merge_keys_apply_in_order() {
        let text = "x: &x {a: 1}\ny: &y {a: 2, d: 4}\nz:\n  <<: *x\n  e: 5\n  <<: *y\n";
        assert_eq!(construct(text).unwrap()["z"], yaml("a: 2\nd: 4\ne: 5"));
    }

    #[test]
    fn test_tagged_merge_key() {
        let value = construct("x: &x {a: 1}\nz:\n  !!merge <<: *x\n  b: 2\n").unwrap();
        assert_eq!(value["z"], yaml("a: 1\nb: 2"));
    }

    #[test]
    fn test_quoted_key_is_not_a_merge() {
        let value = construct("z:\n  '<<': plain\n").unwrap();
        assert_eq!(value["z"]["<<"], Yaml::String("plain".into()));
    }

    #[test]
    fn test_scalar_source_is_rejected() {
        let err = construct("z:\n  <<: 3\n").unwrap_err();
        match err {
            Error::DirectiveArgument { tag, location, .. } => {
                assert_eq!(tag, "<<");
                assert_eq!(location.map(|l| l.line), Some(2));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
