//! Extraction of one anchored subtree from a recorded event stream.

use crate::events::RecordedEvent;
use crate::{Error, Result};

/// Find the events that make up the node anchored as `&anchor`.
///
/// Scans forward once. A scalar carrying the anchor yields that single
/// event; a mapping or sequence start carrying it yields everything up to and
/// including the matching end event. The first definition wins.
///
/// The returned slice can be handed to [`crate::parser::compose`]. Aliases
/// inside it must refer to anchors defined inside it as well.
///
/// # Example
///
/// ```rust
/// use yaml_extras::{anchor, parser, EventStream};
///
/// let stream = EventStream::parse("a: 1\nb: &ptr\n  c: 2\n", None).unwrap();
/// let events = anchor::extract(stream.events(), "ptr").unwrap();
/// let node = parser::compose(events, None).unwrap();
/// assert_eq!(node.get("c").and_then(|n| n.as_scalar()), Some("2"));
/// ```
///
/// # Errors
///
/// Returns [`Error::AnchorNotFound`] if no node defines the anchor, or
/// [`Error::Parse`] if the stream ends before the anchored collection closes.
pub fn extract<'a>(events: &'a [RecordedEvent], anchor: &str) -> Result<&'a [RecordedEvent]> {
    let Some(start) = events
        .iter()
        .position(|e| e.anchor_id() != 0 && e.anchor.as_deref() == Some(anchor))
    else {
        return Err(Error::AnchorNotFound {
            anchor: anchor.to_string(),
            path: None,
            location: None,
        });
    };

    if !events[start].opens_collection() {
        tracing::trace!(anchor, "anchored scalar at event {}", start);
        return Ok(&events[start..=start]);
    }

    let mut depth = 0usize;
    for (offset, event) in events[start..].iter().enumerate() {
        if event.opens_collection() {
            depth += 1;
        } else if event.closes_collection() {
            depth -= 1;
            if depth == 0 {
                let end = start + offset;
                tracing::trace!(anchor, "anchored collection spans events {}..={}", start, end);
                return Ok(&events[start..=end]);
            }
        }
    }

    Err(Error::Parse {
        message: format!("anchored collection '&{}' is never closed", anchor),
        location: None,
    })
}
