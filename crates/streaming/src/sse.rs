//! Frames a byte stream into [`StreamingEvent`]s (component C1, spec §4.1).

use bytes::Bytes;
use eventsource_stream::{Event, Eventsource};
use futures_util::{Stream, StreamExt};

use crate::{citation, event::StreamingEvent};

/// Errors produced while parsing an SSE byte stream.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The underlying byte stream failed (a transport error).
    #[error("stream error: {0}")]
    Transport(String),
    /// A `data:` payload parsed as JSON but didn't match any known
    /// [`StreamingEvent`] shape.
    #[error("event failed shape validation: {0}")]
    UnknownShape(serde_json::Error),
}

/// Behavior when an event's `type` tag is recognized but its payload fails
/// to match that tag's expected shape (spec §4.1.4). A `data:` payload that
/// isn't even valid JSON is always logged and dropped regardless of this
/// policy; it never reaches this gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownEventPolicy {
    /// Propagate a [`ParseError::UnknownShape`] and stop the stream.
    Fail,
    /// Drop the event and continue parsing.
    Skip,
}

/// Parses `byte_stream` into a stream of [`StreamingEvent`]s, applying the
/// private-event citation normalization (see [`citation`]) to every
/// `content_block_delta` before it is typed.
pub fn parse<S, E>(
    byte_stream: S,
    unknown_event_policy: UnknownEventPolicy,
) -> impl Stream<Item = Result<StreamingEvent, ParseError>>
where
    S: Stream<Item = Result<Bytes, E>> + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    byte_stream
        .eventsource()
        .map(|frame| frame.map_err(|err| ParseError::Transport(err.to_string())))
        .filter_map(move |frame| {
            let outcome = frame.and_then(|event| parse_event(event, unknown_event_policy));
            async move {
                match outcome {
                    Ok(Some(event)) => Some(Ok(event)),
                    Ok(None) => None,
                    Err(err) => Some(Err(err)),
                }
            }
        })
}

/// Returns `Ok(None)` when the event was dropped — either by citation
/// normalization, a malformed `data:` payload (always dropped, never
/// gated), or `unknown_event_policy` skipping a shape-validation failure.
fn parse_event(event: Event, unknown_event_policy: UnknownEventPolicy) -> Result<Option<StreamingEvent>, ParseError> {
    if event.data.trim().is_empty() {
        return Ok(None);
    }

    let mut value: serde_json::Value = match serde_json::from_str(&event.data) {
        Ok(value) => value,
        Err(err) => {
            log::debug!("Dropping SSE event with malformed JSON payload: {err}");
            return Ok(None);
        }
    };

    if !citation::normalize_private_event(&mut value) {
        return Ok(None);
    }

    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => match unknown_event_policy {
            UnknownEventPolicy::Fail => Err(ParseError::UnknownShape(err)),
            UnknownEventPolicy::Skip => {
                log::debug!("Skipping event that failed shape validation: {err}");
                Ok(None)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    fn sse_bytes(payload: &str) -> Result<Bytes, std::io::Error> {
        Ok(Bytes::from(payload.to_string()))
    }

    #[tokio::test]
    async fn parses_sequential_events() {
        let raw = "event: message_start\ndata: {\"type\": \"message_start\", \"message\": {}}\n\n\
                    event: message_stop\ndata: {\"type\": \"message_stop\"}\n\n";
        let chunks = stream::iter(vec![sse_bytes(raw)]);

        let events: Vec<_> = parse(chunks, UnknownEventPolicy::Fail).collect().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(StreamingEvent::MessageStart { .. })));
        assert!(matches!(events[1], Ok(StreamingEvent::MessageStop)));
    }

    #[tokio::test]
    async fn drops_citation_without_url_without_erroring() {
        let raw = "data: {\"type\": \"content_block_delta\", \"index\": 0, \"delta\": {\"type\": \"citation_start_delta\", \"citation\": {}}}\n\n\
                    data: {\"type\": \"message_stop\"}\n\n";
        let chunks = stream::iter(vec![sse_bytes(raw)]);

        let events: Vec<_> = parse(chunks, UnknownEventPolicy::Fail).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Ok(StreamingEvent::MessageStop)));
    }

    #[tokio::test]
    async fn malformed_json_payload_is_dropped_under_skip_policy() {
        let raw = "data: not json at all\n\ndata: {\"type\": \"message_stop\"}\n\n";
        let chunks = stream::iter(vec![sse_bytes(raw)]);

        let events: Vec<_> = parse(chunks, UnknownEventPolicy::Skip).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Ok(StreamingEvent::MessageStop)));
    }

    #[tokio::test]
    async fn malformed_json_payload_is_dropped_even_under_fail_policy() {
        let raw = "data: not json at all\n\ndata: {\"type\": \"message_stop\"}\n\n";
        let chunks = stream::iter(vec![sse_bytes(raw)]);

        let events: Vec<_> = parse(chunks, UnknownEventPolicy::Fail).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Ok(StreamingEvent::MessageStop)));
    }

    #[tokio::test]
    async fn unrecognized_type_tag_passes_through_as_unknown_regardless_of_policy() {
        let raw = "data: {\"type\": \"some_future_event\", \"foo\": 1}\n\n";
        let chunks = stream::iter(vec![sse_bytes(raw)]);

        let events: Vec<_> = parse(chunks, UnknownEventPolicy::Fail).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Ok(StreamingEvent::Unknown(_))));
    }

    #[tokio::test]
    async fn shape_validation_failure_is_dropped_under_skip_policy() {
        let raw = "data: {\"type\": \"content_block_start\", \"content_block\": {}}\n\ndata: {\"type\": \"message_stop\"}\n\n";
        let chunks = stream::iter(vec![sse_bytes(raw)]);

        let events: Vec<_> = parse(chunks, UnknownEventPolicy::Skip).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Ok(StreamingEvent::MessageStop)));
    }

    #[tokio::test]
    async fn shape_validation_failure_propagates_under_fail_policy() {
        let raw = "data: {\"type\": \"content_block_start\", \"content_block\": {}}\n\ndata: {\"type\": \"message_stop\"}\n\n";
        let chunks = stream::iter(vec![sse_bytes(raw)]);

        let events: Vec<_> = parse(chunks, UnknownEventPolicy::Fail).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(ParseError::UnknownShape(_))));
    }
}
