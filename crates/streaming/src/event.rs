//! Typed Anthropic Messages API streaming events (component C1, spec §4.1).

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use serde_json::{Value, json};

const KNOWN_TYPE_TAGS: &[&str] = &[
    "message_start",
    "content_block_start",
    "content_block_delta",
    "content_block_stop",
    "message_delta",
    "message_stop",
    "ping",
    "error",
];

/// One event of an Anthropic Messages API SSE stream.
///
/// Mirrors the `type`-tagged event shapes documented for the Messages API.
/// Event bodies we don't need to inspect field-by-field are kept as raw
/// [`Value`] so forward-compatible upstream additions pass through
/// untouched; this also matches how the upstream client tolerates unknown
/// fields rather than rejecting the stream.
#[derive(Debug, Clone)]
pub enum StreamingEvent {
    /// Opens a new message; carries the initial (mostly empty) message object.
    MessageStart {
        /// The partial message object.
        message: Value,
    },
    /// Opens a content block at `index`.
    ContentBlockStart {
        /// Position of the block within `message.content`.
        index: usize,
        /// The initial content block object (e.g. `{"type": "text", "text": ""}`).
        content_block: Value,
    },
    /// Incremental update to the content block at `index`.
    ContentBlockDelta {
        /// Position of the block within `message.content`.
        index: usize,
        /// The delta payload; shape depends on `delta.type`.
        delta: Value,
    },
    /// Closes the content block at `index`.
    ContentBlockStop {
        /// Position of the block within `message.content`.
        index: usize,
    },
    /// Top-level message metadata update (stop reason, usage).
    MessageDelta {
        /// The delta payload.
        delta: MessageDeltaData,
        /// Cumulative usage, when present.
        usage: Option<Value>,
    },
    /// Terminal event for a successfully completed message.
    MessageStop,
    /// Keep-alive event carrying no data.
    Ping,
    /// Upstream reported an error mid-stream.
    Error {
        /// The error payload.
        error: Value,
    },
    /// Anything not matching a known `type` tag. Kept instead of rejected so
    /// that unrecognized-but-harmless events don't abort the stream.
    Unknown(Value),
}

impl Serialize for StreamingEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = match self {
            StreamingEvent::MessageStart { message } => json!({"type": "message_start", "message": message}),
            StreamingEvent::ContentBlockStart { index, content_block } => {
                json!({"type": "content_block_start", "index": index, "content_block": content_block})
            }
            StreamingEvent::ContentBlockDelta { index, delta } => {
                json!({"type": "content_block_delta", "index": index, "delta": delta})
            }
            StreamingEvent::ContentBlockStop { index } => json!({"type": "content_block_stop", "index": index}),
            StreamingEvent::MessageDelta { delta, usage } => {
                json!({"type": "message_delta", "delta": delta, "usage": usage})
            }
            StreamingEvent::MessageStop => json!({"type": "message_stop"}),
            StreamingEvent::Ping => json!({"type": "ping"}),
            StreamingEvent::Error { error } => json!({"type": "error", "error": error}),
            StreamingEvent::Unknown(value) => value.clone(),
        };
        value.serialize(serializer)
    }
}

/// Mirrors [`StreamingEvent`]'s known-tag shapes for validation during
/// deserialize. `serde` cannot mix an internally-tagged enum with a
/// per-variant `untagged` catch-all, so [`StreamingEvent`] carries its own
/// hand-rolled [`Deserialize`] that peeks `type`, matches it against this
/// type, and falls back to [`StreamingEvent::Unknown`] for anything else.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownEvent {
    MessageStart {
        message: Value,
    },
    ContentBlockStart {
        index: usize,
        content_block: Value,
    },
    ContentBlockDelta {
        index: usize,
        delta: Value,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        delta: MessageDeltaData,
        #[serde(default)]
        usage: Option<Value>,
    },
    MessageStop,
    Ping,
    Error {
        error: Value,
    },
}

impl From<KnownEvent> for StreamingEvent {
    fn from(event: KnownEvent) -> Self {
        match event {
            KnownEvent::MessageStart { message } => StreamingEvent::MessageStart { message },
            KnownEvent::ContentBlockStart { index, content_block } => {
                StreamingEvent::ContentBlockStart { index, content_block }
            }
            KnownEvent::ContentBlockDelta { index, delta } => StreamingEvent::ContentBlockDelta { index, delta },
            KnownEvent::ContentBlockStop { index } => StreamingEvent::ContentBlockStop { index },
            KnownEvent::MessageDelta { delta, usage } => StreamingEvent::MessageDelta { delta, usage },
            KnownEvent::MessageStop => StreamingEvent::MessageStop,
            KnownEvent::Ping => StreamingEvent::Ping,
            KnownEvent::Error { error } => StreamingEvent::Error { error },
        }
    }
}

impl<'de> Deserialize<'de> for StreamingEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let known_tag = value
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|tag| KNOWN_TYPE_TAGS.contains(&tag));

        if !known_tag {
            return Ok(StreamingEvent::Unknown(value));
        }

        serde_json::from_value::<KnownEvent>(value)
            .map(StreamingEvent::from)
            .map_err(D::Error::custom)
    }
}

/// Body of a [`StreamingEvent::MessageDelta`] event.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessageDeltaData {
    /// Why the message stopped, once known.
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// The stop sequence matched, if `stop_reason` is `"stop_sequence"`.
    #[serde(default)]
    pub stop_sequence: Option<String>,
}

impl StreamingEvent {
    /// Synthesizes the `message_delta` event emitted when the interceptor
    /// (component C2) force-terminates a stream after a client tool call.
    pub fn synthetic_message_delta(stop_reason: &str) -> Self {
        StreamingEvent::MessageDelta {
            delta: MessageDeltaData {
                stop_reason: Some(stop_reason.to_string()),
                stop_sequence: None,
            },
            usage: None,
        }
    }
}
