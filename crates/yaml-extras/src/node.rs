//! Composed YAML nodes with tags, anchors and source locations.

use crate::SourceInfo;

/// A composed YAML node that has not been constructed into a value yet.
///
/// Directives are recognised at this level: the tag is still attached and the
/// scalar text is still raw, so a directive handler can inspect the node shape
/// before anything is resolved. Aliases are already expanded into copies of
/// the anchored node.
///
/// ## Example
///
/// ```rust
/// use yaml_extras::{EventStream, parser};
///
/// let stream = EventStream::parse("a: !import other.yml", None).unwrap();
/// let node = parser::compose(stream.events(), stream.filename()).unwrap();
/// let value = node.get("a").unwrap();
/// assert_eq!(value.tag.as_deref(), Some("!import"));
/// assert_eq!(value.as_scalar(), Some("other.yml"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,

    /// Full tag (handle and suffix), e.g. `!import` or `tag:yaml.org,2002:str`.
    pub tag: Option<String>,

    /// Anchor name defined on this node, if any.
    pub anchor: Option<String>,

    /// Source location for this node.
    pub source_info: SourceInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Raw scalar text; `plain` is false for quoted and block scalars, which
    /// are never type-inferred.
    Scalar { value: String, plain: bool },

    Sequence(Vec<Node>),

    /// Entries in document order. Duplicate keys are kept; repeated `<<`
    /// entries are meaningful.
    Mapping(Vec<NodeEntry>),
}

/// A key-value pair in a YAML mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEntry {
    pub key: Node,
    pub value: Node,
}

impl Node {
    /// Create a scalar node.
    pub fn scalar(value: impl Into<String>, plain: bool, source_info: SourceInfo) -> Self {
        Self {
            kind: NodeKind::Scalar {
                value: value.into(),
                plain,
            },
            tag: None,
            anchor: None,
            source_info,
        }
    }

    /// Create a sequence node.
    pub fn sequence(items: Vec<Node>, source_info: SourceInfo) -> Self {
        Self {
            kind: NodeKind::Sequence(items),
            tag: None,
            anchor: None,
            source_info,
        }
    }

    /// Create a mapping node.
    pub fn mapping(entries: Vec<NodeEntry>, source_info: SourceInfo) -> Self {
        Self {
            kind: NodeKind::Mapping(entries),
            tag: None,
            anchor: None,
            source_info,
        }
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_anchor(mut self, anchor: Option<String>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, NodeKind::Scalar { .. })
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, NodeKind::Sequence(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.kind, NodeKind::Mapping(_))
    }

    /// Raw scalar text if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// True for an untagged plain scalar with exactly this text.
    pub fn is_plain_scalar(&self, text: &str) -> bool {
        match &self.kind {
            NodeKind::Scalar { value, plain } => *plain && self.tag.is_none() && value == text,
            _ => false,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[NodeEntry]> {
        match &self.kind {
            NodeKind::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Get the first value in a mapping whose key is the scalar `key`.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?
            .iter()
            .find(|entry| entry.key.as_scalar() == Some(key))
            .map(|entry| &entry.value)
    }

    /// Short description of the node shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Scalar { .. } => "a scalar",
            NodeKind::Sequence(_) => "a sequence",
            NodeKind::Mapping(_) => "a mapping",
        }
    }

    /// Number of children (sequence length or mapping entry count).
    pub fn len(&self) -> usize {
        match &self.kind {
            NodeKind::Scalar { .. } => 0,
            NodeKind::Sequence(items) => items.len(),
            NodeKind::Mapping(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_creation() {
        let node = Node::scalar("test", true, SourceInfo::default());
        assert!(node.is_scalar());
        assert!(!node.is_sequence());
        assert!(!node.is_mapping());
        assert_eq!(node.as_scalar(), Some("test"));
        assert_eq!(node.len(), 0);
    }

    #[test]
    fn test_plain_scalar_check() {
        let plain = Node::scalar("<<", true, SourceInfo::default());
        let quoted = Node::scalar("<<", false, SourceInfo::default());
        let tagged = plain.clone().with_tag(Some("!import".into()));
        assert!(plain.is_plain_scalar("<<"));
        assert!(!quoted.is_plain_scalar("<<"));
        assert!(!tagged.is_plain_scalar("<<"));
    }

    #[test]
    fn test_mapping_lookup() {
        let info = SourceInfo::default();
        let node = Node::mapping(
            vec![
                NodeEntry {
                    key: Node::scalar("a", true, info.clone()),
                    value: Node::scalar("1", true, info.clone()),
                },
                NodeEntry {
                    key: Node::scalar("b", true, info.clone()),
                    value: Node::sequence(vec![], info.clone()),
                },
            ],
            info,
        );
        assert_eq!(node.len(), 2);
        assert_eq!(node.get("a").and_then(Node::as_scalar), Some("1"));
        assert!(node.get("b").is_some_and(Node::is_sequence));
        assert!(node.get("c").is_none());
        assert_eq!(node.kind_name(), "a mapping");
    }
}
