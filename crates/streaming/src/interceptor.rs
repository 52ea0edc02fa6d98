//! Rewrites a stream of [`StreamingEvent`]s to intercept client tool calls
//! before they reach the caller (component C2, spec §4.2).

use std::sync::Arc;

use crate::{
    event::StreamingEvent,
    registry::{ToolCallOrigin, ToolCallRegistry},
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    InClientToolUse { index: usize, tool_use_id: String },
    InServerToolUse { index: usize },
    InToolResult { index: usize },
}

/// What the caller should do with an event after [`Interceptor::process`].
pub enum Outcome {
    /// Forward the event unchanged.
    Forward(StreamingEvent),
    /// Drop the event; it carried no information the caller should see
    /// (a suppressed `tool_result` content block, or an event nested
    /// inside one).
    Suppress,
    /// A client tool call closed. Forward these synthetic events instead
    /// of the original `content_block_stop`, then end the stream.
    Terminate(Vec<StreamingEvent>),
}

/// Per-stream state machine implementing the interception described in
/// spec §4.2. Both client and server tool-use content blocks arrive typed
/// `tool_use`; a block is the server-executed web search only when its
/// `name` is `web_search` and the originating request actually asked for
/// web search (`has_web_search_tool`). Everything else typed `tool_use` is
/// a client tool call: it truncates the stream, synthesizing a `tool_use`
/// stop reason and registering the call against the `message_start` seen
/// earlier in the same stream, if any. `tool_result` blocks sent back by a
/// well-behaved upstream are suppressed in full, including any events
/// nested between their start and stop.
pub struct Interceptor {
    state: State,
    session_id: String,
    has_web_search_tool: bool,
    message_id: Option<String>,
    registry: Arc<ToolCallRegistry>,
}

impl Interceptor {
    /// Builds an interceptor for one streamed response. `has_web_search_tool`
    /// reflects whether the original request's tool list contained a
    /// web-search tool, the signal used to tell a server web-search
    /// `tool_use` block apart from a client one.
    pub fn new(session_id: String, has_web_search_tool: bool, registry: Arc<ToolCallRegistry>) -> Self {
        Self {
            state: State::Idle,
            session_id,
            has_web_search_tool,
            message_id: None,
            registry,
        }
    }

    /// Feeds one parsed event through the state machine.
    pub fn process(&mut self, event: StreamingEvent) -> Outcome {
        if let StreamingEvent::MessageStart { message } = &event {
            if let Some(id) = message.get("id").and_then(serde_json::Value::as_str) {
                self.message_id = Some(id.to_string());
            }
        }

        if matches!(self.state, State::InToolResult { .. }) {
            return self.on_event_during_tool_result(event);
        }

        match &event {
            StreamingEvent::ContentBlockStart { index, content_block } => {
                let index = *index;
                let content_block = content_block.clone();
                self.on_content_block_start(index, &content_block, event)
            }
            StreamingEvent::ContentBlockStop { index } => self.on_content_block_stop(*index, event),
            _ => Outcome::Forward(event),
        }
    }

    fn on_event_during_tool_result(&mut self, event: StreamingEvent) -> Outcome {
        if let StreamingEvent::ContentBlockStop { index } = &event {
            if matches!(self.state, State::InToolResult { index: open_index } if open_index == *index) {
                self.state = State::Idle;
            }
        }
        Outcome::Suppress
    }

    fn on_content_block_start(
        &mut self,
        index: usize,
        content_block: &serde_json::Value,
        event: StreamingEvent,
    ) -> Outcome {
        match content_block.get("type").and_then(serde_json::Value::as_str) {
            Some("tool_use") => {
                let is_server_web_search = self.has_web_search_tool
                    && content_block.get("name").and_then(serde_json::Value::as_str) == Some("web_search");

                if is_server_web_search {
                    self.state = State::InServerToolUse { index };
                } else {
                    let tool_use_id = content_block
                        .get("id")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    self.state = State::InClientToolUse { index, tool_use_id };
                }
                Outcome::Forward(event)
            }
            Some("tool_result") => {
                self.state = State::InToolResult { index };
                Outcome::Suppress
            }
            _ => Outcome::Forward(event),
        }
    }

    fn on_content_block_stop(&mut self, index: usize, event: StreamingEvent) -> Outcome {
        match &self.state {
            State::InClientToolUse { index: open_index, tool_use_id } if *open_index == index => {
                let tool_use_id = tool_use_id.clone();
                self.registry.register(
                    &tool_use_id,
                    ToolCallOrigin {
                        session_id: self.session_id.clone(),
                        message_id: self.message_id.clone(),
                    },
                );
                self.state = State::Idle;

                Outcome::Terminate(vec![
                    event,
                    StreamingEvent::synthetic_message_delta("tool_use"),
                    StreamingEvent::MessageStop,
                ])
            }
            State::InServerToolUse { index: open_index } if *open_index == index => {
                self.state = State::Idle;
                Outcome::Forward(event)
            }
            _ => Outcome::Forward(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    fn registry() -> Arc<ToolCallRegistry> {
        Arc::new(ToolCallRegistry::new(Duration::from_secs(60)))
    }

    #[test]
    fn client_tool_use_terminates_stream_and_registers() {
        let registry = registry();
        let mut interceptor = Interceptor::new("session-1".to_string(), false, registry.clone());

        let message_start = StreamingEvent::MessageStart {
            message: json!({"id": "msg-1", "role": "assistant"}),
        };
        assert!(matches!(interceptor.process(message_start), Outcome::Forward(_)));

        let start = StreamingEvent::ContentBlockStart {
            index: 0,
            content_block: json!({"type": "tool_use", "id": "tool-1", "name": "lookup"}),
        };
        assert!(matches!(interceptor.process(start), Outcome::Forward(_)));

        let stop = StreamingEvent::ContentBlockStop { index: 0 };
        match interceptor.process(stop) {
            Outcome::Terminate(events) => {
                assert_eq!(events.len(), 3);
                assert!(matches!(events[2], StreamingEvent::MessageStop));
            }
            _ => panic!("expected termination"),
        }

        let origin = registry.lookup("tool-1").expect("registered");
        assert_eq!(origin.session_id, "session-1");
        assert_eq!(origin.message_id.as_deref(), Some("msg-1"));
    }

    #[test]
    fn server_web_search_tool_passes_through() {
        let mut interceptor = Interceptor::new("session-1".to_string(), true, registry());

        let start = StreamingEvent::ContentBlockStart {
            index: 0,
            content_block: json!({"type": "tool_use", "id": "tool-1", "name": "web_search"}),
        };
        assert!(matches!(interceptor.process(start), Outcome::Forward(_)));

        let stop = StreamingEvent::ContentBlockStop { index: 0 };
        assert!(matches!(interceptor.process(stop), Outcome::Forward(_)));
    }

    #[test]
    fn web_search_block_is_client_tool_use_when_request_had_no_web_search_tool() {
        let registry = registry();
        let mut interceptor = Interceptor::new("session-1".to_string(), false, registry.clone());

        let start = StreamingEvent::ContentBlockStart {
            index: 0,
            content_block: json!({"type": "tool_use", "id": "tool-1", "name": "web_search"}),
        };
        assert!(matches!(interceptor.process(start), Outcome::Forward(_)));

        let stop = StreamingEvent::ContentBlockStop { index: 0 };
        assert!(matches!(interceptor.process(stop), Outcome::Terminate(_)));
        assert!(registry.lookup("tool-1").is_some());
    }

    #[test]
    fn tool_result_block_and_nested_events_are_suppressed() {
        let mut interceptor = Interceptor::new("session-1".to_string(), false, registry());

        let start = StreamingEvent::ContentBlockStart {
            index: 0,
            content_block: json!({"type": "tool_result", "tool_use_id": "tool-1"}),
        };
        assert!(matches!(interceptor.process(start), Outcome::Suppress));

        let delta = StreamingEvent::ContentBlockDelta {
            index: 0,
            delta: json!({"type": "text_delta", "text": "hi"}),
        };
        assert!(matches!(interceptor.process(delta), Outcome::Suppress));

        let stop = StreamingEvent::ContentBlockStop { index: 0 };
        assert!(matches!(interceptor.process(stop), Outcome::Suppress));

        let next = StreamingEvent::Ping;
        assert!(matches!(interceptor.process(next), Outcome::Forward(_)));
    }
}
