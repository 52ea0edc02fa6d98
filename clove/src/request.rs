//! Wire shape of an incoming Anthropic Messages API request and its
//! conversion into [`session::BuildInput`].

use serde::Deserialize;
use serde_json::Value;
use session::{BuildInput, IncomingImage, IncomingMessage, Tool};

/// The subset of the Messages API request body this proxy understands.
#[derive(Debug, Deserialize)]
pub struct MessagesRequest {
    /// Requested model identifier.
    pub model: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Conversation turns; `content` may be a plain string or a content-block array.
    pub messages: Vec<WireMessage>,
    /// System prompt, as a string or an array of text blocks.
    #[serde(default)]
    pub system: Option<Value>,
    /// Extended-thinking configuration.
    #[serde(default)]
    pub thinking: Option<ThinkingConfig>,
    /// Tool definitions.
    #[serde(default)]
    pub tools: Vec<WireTool>,
    /// Whether the caller wants an SSE response.
    #[serde(default)]
    pub stream: bool,
}

/// One message of the wire request.
#[derive(Debug, Deserialize)]
pub struct WireMessage {
    /// `"user"` or `"assistant"`.
    pub role: String,
    /// Plain text, or an array of content blocks.
    pub content: Value,
}

/// Extended-thinking configuration.
#[derive(Debug, Deserialize)]
pub struct ThinkingConfig {
    /// `"enabled"`, `"adaptive"`, or `"disabled"`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A tool definition on the wire.
#[derive(Debug, Deserialize)]
pub struct WireTool {
    /// Tool name.
    pub name: String,
    /// Tool type tag.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

fn system_to_string(system: Option<Value>) -> Option<String> {
    match system? {
        Value::String(text) => Some(text),
        Value::Array(blocks) => {
            let text: String = blocks
                .iter()
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n");
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}

/// Flattens a `tool_result` block's `content` (a plain string, or an array
/// of text blocks) into plain text, the same shapes `system_to_string`
/// accepts for a system prompt.
fn tool_result_content_to_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

fn content_to_message(role: String, content: Value) -> IncomingMessage {
    match content {
        Value::String(text) => IncomingMessage { role, text, images: vec![] },
        Value::Array(blocks) => {
            let mut text_parts = Vec::new();
            let mut images = Vec::new();

            for block in blocks {
                match block.get("type").and_then(Value::as_str) {
                    Some("text") => {
                        if let Some(text) = block.get("text").and_then(Value::as_str) {
                            text_parts.push(text.to_string());
                        }
                    }
                    Some("tool_result") => {
                        let tool_use_id = block.get("tool_use_id").and_then(Value::as_str).unwrap_or("unknown");
                        let result_text = tool_result_content_to_text(block.get("content"));
                        if !result_text.is_empty() {
                            text_parts.push(format!("[Tool result {tool_use_id}]\n{result_text}"));
                        }
                    }
                    Some("image") => {
                        let source = block.get("source");
                        let data = source.and_then(|s| s.get("data")).and_then(Value::as_str);
                        let media_type = source
                            .and_then(|s| s.get("media_type"))
                            .and_then(Value::as_str)
                            .unwrap_or("image/png");

                        if let Some(data) = data {
                            images.push(IncomingImage {
                                base64_data: data.to_string(),
                                content_type: media_type.to_string(),
                            });
                        }
                    }
                    _ => {}
                }
            }

            IncomingMessage {
                role,
                text: text_parts.join("\n"),
                images,
            }
        }
        _ => IncomingMessage { role, text: String::new(), images: vec![] },
    }
}

impl MessagesRequest {
    /// The `tool_use_id` of a `tool_result` content block in the most
    /// recent message, if present. A caller resuming a conversation after a
    /// client tool call sends exactly this shape; used to look the
    /// originating session back up in the tool-call registry (component C6)
    /// instead of assigning a fresh one.
    pub fn pending_tool_result_id(&self) -> Option<String> {
        let Value::Array(blocks) = &self.messages.last()?.content else {
            return None;
        };

        blocks.iter().find_map(|block| {
            (block.get("type").and_then(Value::as_str) == Some("tool_result"))
                .then(|| block.get("tool_use_id").and_then(Value::as_str))
                .flatten()
                .map(str::to_string)
        })
    }

    /// Converts this wire request into the [`BuildInput`] the request
    /// builder (component C3) expects.
    pub fn into_build_input(self) -> BuildInput {
        let messages = self
            .messages
            .into_iter()
            .map(|m| content_to_message(m.role, m.content))
            .collect();

        let tools = self
            .tools
            .into_iter()
            .map(|t| Tool {
                name: t.name,
                kind: t.kind.unwrap_or_else(|| "custom".to_string()),
            })
            .collect();

        BuildInput {
            messages,
            system: system_to_string(self.system),
            model: self.model,
            max_tokens: self.max_tokens,
            thinking_type: self.thinking.map(|t| t.kind),
            tools,
        }
    }
}
