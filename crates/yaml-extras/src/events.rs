//! Recorded YAML event streams.
//!
//! `yaml-rust2` reports anchors on events as numeric ids only. Anchor
//! extraction needs the names, so while recording we also recover each
//! defining event's anchor name from the source text: the `&name` property
//! always sits between the previous event's marker and the marker of the
//! node it decorates. Comments and quoted scalars in between are skipped.

use crate::{Error, Result};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::Marker;

/// One parser event with its position and resolved anchor name.
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub event: Event,
    pub marker: Marker,
    pub anchor: Option<String>,
}

impl RecordedEvent {
    /// True for mapping-start and sequence-start events.
    pub fn opens_collection(&self) -> bool {
        matches!(
            self.event,
            Event::MappingStart(..) | Event::SequenceStart(..)
        )
    }

    /// True for mapping-end and sequence-end events.
    pub fn closes_collection(&self) -> bool {
        matches!(self.event, Event::MappingEnd | Event::SequenceEnd)
    }

    /// Numeric anchor id defined by this event (0 when there is none).
    pub fn anchor_id(&self) -> usize {
        match self.event {
            Event::Scalar(_, _, id, _) | Event::SequenceStart(id, _) | Event::MappingStart(id, _) => {
                id
            }
            _ => 0,
        }
    }
}

/// The event stream of the first document in a source.
#[derive(Debug, Clone)]
pub struct EventStream {
    filename: Option<String>,
    events: Vec<RecordedEvent>,
}

impl EventStream {
    /// Parse `content` into a recorded event stream.
    ///
    /// Only the first document is recorded, matching what the loader
    /// materializes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the YAML is syntactically invalid.
    pub fn parse(content: &str, filename: Option<&str>) -> Result<Self> {
        let mut parser = Parser::new_from_str(content);
        let mut recorder = EventRecorder::new(content);

        parser
            .load(&mut recorder, false) // false = single document only
            .map_err(Error::from)?;

        Ok(Self {
            filename: filename.map(|s| s.to_string()),
            events: recorder.events,
        })
    }

    /// Parse `content` only as far as the node anchored as `anchor`.
    ///
    /// Recording stops once that node's subtree is complete, so the rest of
    /// the document is never scanned. If the anchor does not occur, the
    /// whole first document is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the YAML up to the end of the anchored
    /// subtree is syntactically invalid.
    pub fn parse_until_anchor(content: &str, filename: Option<&str>, anchor: &str) -> Result<Self> {
        let mut parser = Parser::new_from_str(content);
        let mut recorder = EventRecorder::new(content);
        // Open collections inside the anchored node, once it has been seen
        let mut depth: Option<usize> = None;

        loop {
            let (ev, marker) = parser.next_token().map_err(Error::from)?;
            let Some(recorded) = recorder.record(ev, marker) else {
                continue;
            };
            if matches!(recorded.event, Event::DocumentEnd | Event::StreamEnd) {
                break;
            }
            match depth {
                None if recorded.anchor.as_deref() == Some(anchor) => {
                    if !recorded.opens_collection() {
                        break;
                    }
                    depth = Some(1);
                }
                None => {}
                Some(open) => {
                    let open = if recorded.opens_collection() {
                        open + 1
                    } else if recorded.closes_collection() {
                        open - 1
                    } else {
                        open
                    };
                    if open == 0 {
                        break;
                    }
                    depth = Some(open);
                }
            }
        }

        tracing::trace!(
            anchor,
            events = recorder.events.len(),
            "recorded events up to anchor"
        );
        Ok(Self {
            filename: filename.map(|s| s.to_string()),
            events: recorder.events,
        })
    }

    /// Filename this stream was parsed from, if known.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// All recorded events, stream markers included.
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Receiver that records every event and names anchors as they appear.
struct EventRecorder {
    source: Vec<char>,
    events: Vec<RecordedEvent>,
    /// Char offset of the previous event's marker; anchor search starts here
    last_index: usize,
}

impl EventRecorder {
    fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            events: Vec::new(),
            last_index: 0,
        }
    }
}

impl EventRecorder {
    /// Record one event, naming its anchor. `Nothing` events are dropped.
    fn record(&mut self, ev: Event, marker: Marker) -> Option<&RecordedEvent> {
        if matches!(ev, Event::Nothing) {
            return None;
        }

        let mut recorded = RecordedEvent {
            event: ev,
            marker,
            anchor: None,
        };

        if recorded.anchor_id() != 0 {
            recorded.anchor = anchor_name_before(&self.source, self.last_index, marker.index());
            if recorded.anchor.is_none() {
                tracing::warn!(
                    line = marker.line(),
                    col = marker.col() + 1,
                    "could not recover anchor name"
                );
            }
        }

        self.last_index = marker.index();
        self.events.push(recorded);
        self.events.last()
    }
}

impl MarkedEventReceiver for EventRecorder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        self.record(ev, marker);
    }
}

fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// Find the last `&name` property in `source[from..to]`.
///
/// A property starts at the beginning of the region or after whitespace or a
/// flow indicator, and runs until whitespace or a flow indicator. Comments
/// and quoted scalars in the region are skipped.
fn anchor_name_before(source: &[char], from: usize, to: usize) -> Option<String> {
    let to = to.min(source.len());
    if from >= to {
        return None;
    }

    let region = &source[from..to];
    let mut found = None;
    let mut i = 0;
    while i < region.len() {
        let c = region[i];
        let after_space = i == 0 || region[i - 1].is_whitespace();
        let at_boundary = after_space || is_flow_indicator(region[i - 1]);
        match c {
            '#' if after_space => {
                i = region[i..]
                    .iter()
                    .position(|&c| c == '\n')
                    .map_or(region.len(), |end| i + end);
            }
            '\'' | '"' if at_boundary => {
                if let Some(end) = closing_quote(region, i) {
                    i = end;
                }
            }
            '&' if at_boundary => {
                let name: String = region[i + 1..]
                    .iter()
                    .take_while(|c| !c.is_whitespace() && !is_flow_indicator(**c))
                    .collect();
                i += name.chars().count();
                if !name.is_empty() {
                    found = Some(name);
                }
            }
            _ => {}
        }
        i += 1;
    }
    found
}

/// Index of the quote closing the scalar opened at `open`.
///
/// Single-quoted scalars escape `'` by doubling it; double-quoted ones use a
/// backslash.
fn closing_quote(region: &[char], open: usize) -> Option<usize> {
    let quote = region[open];
    let mut i = open + 1;
    while i < region.len() {
        match region[i] {
            '\\' if quote == '"' => i += 1,
            c if c == quote => {
                if quote == '\'' && region.get(i + 1) == Some(&'\'') {
                    i += 1;
                } else {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchors(content: &str) -> Vec<String> {
        EventStream::parse(content, None)
            .unwrap()
            .events()
            .iter()
            .filter_map(|e| e.anchor.clone())
            .collect()
    }

    #[test]
    fn test_block_mapping_anchor() {
        assert_eq!(anchors("inner: &ptr\n  a: 1\n"), vec!["ptr"]);
    }

    #[test]
    fn test_flow_and_scalar_anchors() {
        let content = "dictionary: {  foo: bar, baz: buzz }\nitems: &list [foo, &second bar]\nsum: &sum 3\n";
        assert_eq!(anchors(content), vec!["list", "second", "sum"]);
    }

    #[test]
    fn test_anchor_after_import_argument() {
        // The " &ptr" inside the plain scalar is not an anchor property.
        let content = "a: !import.anchor x.yml &ptr\nb: &q 1\n";
        assert_eq!(anchors(content), vec!["q"]);
    }

    #[test]
    fn test_hyphenated_anchor_names() {
        let content = "child1: &child-1\n  name: Alice\nchild2: &child-2\n  name: Bob\n";
        assert_eq!(anchors(content), vec!["child-1", "child-2"]);
    }

    #[test]
    fn test_comment_after_anchor() {
        assert_eq!(anchors("inner: &ptr # see &other\n  a: 1\n"), vec!["ptr"]);
    }

    #[test]
    fn test_comment_line_between_anchor_and_block() {
        assert_eq!(anchors("inner: &ptr\n  # &note\n  a: 1\n"), vec!["ptr"]);
        assert_eq!(anchors("# &top\nitems: &list\n  - 1\n"), vec!["list"]);
    }

    #[test]
    fn test_quoted_key_containing_ampersand() {
        assert_eq!(anchors("\"x &y\": &q 1\n'it''s &z': &r 2\n"), vec!["q", "r"]);
    }

    #[test]
    fn test_parse_until_anchor_stops_after_subtree() {
        let content = "a: 1\nb: &ptr\n  c: [1, 2]\nd: 4\n";
        let partial = EventStream::parse_until_anchor(content, None, "ptr").unwrap();
        assert!(partial.len() < EventStream::parse(content, None).unwrap().len());
        assert!(matches!(partial.events().last().map(|e| &e.event), Some(Event::MappingEnd)));
        let has_d = partial
            .events()
            .iter()
            .any(|e| matches!(&e.event, Event::Scalar(v, ..) if v == "d"));
        assert!(!has_d);
    }

    #[test]
    fn test_parse_until_anchor_ignores_later_syntax_errors() {
        let content = "keep: &k 7\nbroken: [1, 2\n";
        assert!(EventStream::parse(content, None).is_err());
        let partial = EventStream::parse_until_anchor(content, None, "k").unwrap();
        assert_eq!(partial.events().last().and_then(|e| e.anchor.as_deref()), Some("k"));
    }

    #[test]
    fn test_parse_until_missing_anchor_records_document() {
        let content = "a: &x 1\nb: 2\n";
        let partial = EventStream::parse_until_anchor(content, None, "nope").unwrap();
        assert_eq!(partial.len(), EventStream::parse(content, None).unwrap().len());
    }

    #[test]
    fn test_stream_is_bracketed() {
        let stream = EventStream::parse("a: 1", Some("doc.yml")).unwrap();
        assert_eq!(stream.filename(), Some("doc.yml"));
        assert!(matches!(stream.events()[0].event, Event::StreamStart));
        assert!(matches!(stream.events()[1].event, Event::DocumentStart));
        assert!(matches!(
            stream.events().last().map(|e| &e.event),
            Some(Event::DocumentEnd)
        ));
    }

    #[test]
    fn test_syntax_error() {
        let result = EventStream::parse("a: [1, 2", None);
        assert!(matches!(result, Err(Error::Parse { .. })));
    }
}
