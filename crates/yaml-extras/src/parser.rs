//! Composition of recorded events into [`Node`] trees.

use crate::events::{EventStream, RecordedEvent};
use crate::{Error, Node, NodeEntry, Result, SourceInfo};
use std::collections::HashMap;
use yaml_rust2::parser::{Event, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Parse YAML from a string, producing a composed [`Node`] tree.
///
/// This parses a single YAML document. If the input contains multiple documents,
/// only the first one will be parsed. An empty input composes to a null scalar.
///
/// # Example
///
/// ```rust
/// use yaml_extras::parser::parse;
///
/// let node = parse("title: My Document").unwrap();
/// assert!(node.is_mapping());
/// ```
///
/// # Errors
///
/// Returns an error if the YAML is invalid or if composition fails.
pub fn parse(content: &str) -> Result<Node> {
    parse_impl(content, None)
}

/// Parse YAML from a string with an associated filename.
///
/// The filename is included in source location information for better
/// error reporting.
///
/// # Errors
///
/// Returns an error if the YAML is invalid or if composition fails.
pub fn parse_file(content: &str, filename: &str) -> Result<Node> {
    parse_impl(content, Some(filename))
}

fn parse_impl(content: &str, filename: Option<&str>) -> Result<Node> {
    let stream = EventStream::parse(content, filename)?;
    compose(stream.events(), stream.filename())
}

/// Compose a slice of recorded events into a node tree.
///
/// The slice may be a whole stream or a bare subtree such as the output of
/// [`crate::anchor::extract`]; stream and document markers are skipped.
/// Aliases must refer to anchors defined earlier within the same slice.
///
/// # Errors
///
/// Returns [`Error::Parse`] for unbalanced collections or undefined aliases.
pub fn compose(events: &[RecordedEvent], filename: Option<&str>) -> Result<Node> {
    let mut builder = NodeBuilder::new(filename);
    for recorded in events {
        builder.on_event(recorded)?;
        if builder.root.is_some() {
            break;
        }
    }
    builder.result()
}

/// Builder that folds events into a `Node` tree.
struct NodeBuilder {
    /// Optional filename for source info
    filename: Option<String>,

    /// Stack of collections being constructed
    stack: Vec<BuildNode>,

    /// Completed anchored nodes by anchor id, for alias expansion
    anchored: HashMap<usize, Node>,

    /// The completed root node
    root: Option<Node>,
}

/// A collection being constructed during composition.
enum BuildNode {
    Sequence {
        start_marker: Marker,
        anchor_id: usize,
        anchor: Option<String>,
        tag: Option<String>,
        items: Vec<Node>,
    },

    Mapping {
        start_marker: Marker,
        anchor_id: usize,
        anchor: Option<String>,
        tag: Option<String>,
        entries: Vec<(Node, Option<Node>)>,
    },
}

impl NodeBuilder {
    fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(|s| s.to_string()),
            stack: Vec::new(),
            anchored: HashMap::new(),
            root: None,
        }
    }

    fn result(self) -> Result<Node> {
        if !self.stack.is_empty() {
            return Err(Error::Parse {
                message: "event stream ended inside an unclosed collection".into(),
                location: None,
            });
        }
        Ok(self
            .root
            .unwrap_or_else(|| Node::scalar("", true, SourceInfo::default())))
    }

    fn make_source_info(&self, marker: &Marker, len: usize) -> SourceInfo {
        let info = SourceInfo::from_marker(marker, len);
        match &self.filename {
            Some(filename) => info.with_file(filename.clone()),
            None => info,
        }
    }

    fn complete(&mut self, anchor_id: usize, node: Node) {
        if anchor_id != 0 {
            self.anchored.insert(anchor_id, node.clone());
        }
        self.push_complete(node);
    }

    fn push_complete(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => self.root = Some(node),
            Some(BuildNode::Sequence { items, .. }) => items.push(node),
            Some(BuildNode::Mapping { entries, .. }) => {
                if let Some((_, value)) = entries.last_mut() {
                    if value.is_none() {
                        *value = Some(node);
                        return;
                    }
                }
                // This is a new key
                entries.push((node, None));
            }
        }
    }

    fn on_event(&mut self, recorded: &RecordedEvent) -> Result<()> {
        let marker = recorded.marker;
        match &recorded.event {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(value, style, anchor_id, tag) => {
                let source_info = self.make_source_info(&marker, value.chars().count());
                let plain = matches!(style, TScalarStyle::Plain);
                let node = Node::scalar(value.clone(), plain, source_info)
                    .with_tag(tag_name(tag))
                    .with_anchor(recorded.anchor.clone());
                self.complete(*anchor_id, node);
            }

            Event::SequenceStart(anchor_id, tag) => {
                self.stack.push(BuildNode::Sequence {
                    start_marker: marker,
                    anchor_id: *anchor_id,
                    anchor: recorded.anchor.clone(),
                    tag: tag_name(tag),
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => match self.stack.pop() {
                Some(BuildNode::Sequence {
                    start_marker,
                    anchor_id,
                    anchor,
                    tag,
                    items,
                }) => {
                    let len = marker.index().saturating_sub(start_marker.index());
                    let source_info = self.make_source_info(&start_marker, len);
                    let node = Node::sequence(items, source_info)
                        .with_tag(tag)
                        .with_anchor(anchor);
                    self.complete(anchor_id, node);
                }
                _ => return Err(self.unbalanced("sequence end", &marker)),
            },

            Event::MappingStart(anchor_id, tag) => {
                self.stack.push(BuildNode::Mapping {
                    start_marker: marker,
                    anchor_id: *anchor_id,
                    anchor: recorded.anchor.clone(),
                    tag: tag_name(tag),
                    entries: Vec::new(),
                });
            }

            Event::MappingEnd => match self.stack.pop() {
                Some(BuildNode::Mapping {
                    start_marker,
                    anchor_id,
                    anchor,
                    tag,
                    entries,
                }) => {
                    let len = marker.index().saturating_sub(start_marker.index());
                    let source_info = self.make_source_info(&start_marker, len);
                    let mut node_entries = Vec::with_capacity(entries.len());
                    for (key, value) in entries {
                        let Some(value) = value else {
                            return Err(self.unbalanced("mapping key without value", &marker));
                        };
                        node_entries.push(NodeEntry { key, value });
                    }
                    let node = Node::mapping(node_entries, source_info)
                        .with_tag(tag)
                        .with_anchor(anchor);
                    self.complete(anchor_id, node);
                }
                _ => return Err(self.unbalanced("mapping end", &marker)),
            },

            Event::Alias(anchor_id) => {
                let Some(target) = self.anchored.get(anchor_id) else {
                    return Err(Error::Parse {
                        message: "alias refers to an anchor that is not defined before it".into(),
                        location: Some(self.make_source_info(&marker, 0)),
                    });
                };
                // The copy keeps the anchored node's shape; its own anchor is not redefined.
                let node = target.clone().with_anchor(None);
                self.push_complete(node);
            }
        }
        Ok(())
    }

    fn unbalanced(&self, what: &str, marker: &Marker) -> Error {
        Error::Parse {
            message: format!("unexpected {}", what),
            location: Some(self.make_source_info(marker, 0)),
        }
    }
}

fn tag_name(tag: &Option<Tag>) -> Option<String> {
    tag.as_ref()
        .map(|tag| format!("{}{}", tag.handle, tag.suffix))
}
