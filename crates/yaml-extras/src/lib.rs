//! # yaml-extras
//!
//! YAML loading with import and concatenation directives.
//!
//! Documents can pull in other documents, or anchored fragments of them,
//! through tagged scalars:
//!
//! | Tag | Argument | Value |
//! |---|---|---|
//! | `!import` | `path` | the whole file |
//! | `!import.anchor` | `path &anchor` | the anchored node in the file |
//! | `!import-all` | pattern | every matched file, sorted by path |
//! | `!import-all.anchor` | `pattern &anchor` | the anchored node of every matched file |
//! | `!import-all-parameterized` | pattern with `{name:*}` / `{name:**}` | every matched file with its captures |
//! | `!++` | sequence of mappings or sequences | their concatenation |
//!
//! Any of them may be the value of a merge key (`<<`); the import is resolved
//! before the merge happens.
//!
//! ## Design
//!
//! Loading runs in three stages. The `yaml-rust2` event stream is recorded
//! with markers and anchor names ([`EventStream`]), composed into a tree of
//! tagged [`Node`]s, then constructed into [`yaml_rust2::Yaml`] values by a
//! [`resolver::ResolveContext`] that dispatches directive tags to their
//! handlers. Anchor imports slice the event stream ([`anchor::extract`])
//! instead of building the whole imported document.
//!
//! ## Example
//!
//! ```rust,no_run
//! use yaml_extras::Loader;
//!
//! let mut loader = Loader::new();
//! let value = loader
//!     .load_str(
//!         r#"
//! defaults: !import defaults.yml
//! people: !import-all-parameterized people/{name:*}.yml
//! "#,
//!     )
//!     .unwrap();
//! println!("{:?}", value["people"]);
//! ```

pub mod anchor;
pub mod cache;
pub mod concat;
pub mod construct;
pub mod directive;
mod error;
pub mod events;
pub mod loader;
pub mod merge;
mod node;
pub mod parser;
pub mod pattern;
pub mod resolver;
mod source_info;

pub use cache::PatternCache;
pub use directive::{DirectiveTag, ImportDirective};
pub use error::{Error, Result};
pub use events::{EventStream, RecordedEvent};
pub use loader::{Loader, LoaderOptions};
pub use node::{Node, NodeEntry, NodeKind};
pub use parser::{compose, parse, parse_file};
pub use pattern::{Captures, CompiledPattern, Match};
pub use source_info::SourceInfo;
