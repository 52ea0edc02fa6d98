//! Types passed between the request builder and a [`crate::Session`].

use serde::Serialize;

/// One message of an incoming Anthropic-shaped request.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// `"user"` or `"assistant"`.
    pub role: String,
    /// Text content of the message. Multi-part content is pre-flattened by
    /// the caller into plain text plus a separate `images` list.
    pub text: String,
    /// Base64-encoded image attachments carried by this message.
    pub images: Vec<IncomingImage>,
}

/// A single base64-encoded image attachment.
#[derive(Debug, Clone)]
pub struct IncomingImage {
    /// Raw base64 payload (no data URL prefix).
    pub base64_data: String,
    /// The image's MIME type, e.g. `"image/png"`.
    pub content_type: String,
}

/// A tool definition from the incoming request.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Tool name.
    pub name: String,
    /// Tool type tag (e.g. `"custom"`, `"web_search_20250305"`).
    #[serde(rename = "type")]
    pub kind: String,
}

/// An attachment sent alongside the prompt.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    /// Always `"text"` for attachments synthesized from the merged prompt.
    #[serde(rename = "type")]
    pub kind: String,
    /// The attachment's body text.
    pub content: String,
}

impl Attachment {
    /// Wraps `text` as a text attachment.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            content: text.into(),
        }
    }
}

/// The payload dispatched to Claude-web's conversation-completion endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ClaudeWebRequest {
    /// Upper bound on generated tokens.
    pub max_tokens_to_sample: u32,
    /// The merged prompt, wrapped as a text attachment.
    pub attachments: Vec<Attachment>,
    /// File ids of previously uploaded images.
    pub files: Vec<String>,
    /// Requested model identifier.
    pub model: String,
    /// Always `"messages"`: selects the Messages-shaped response rendering.
    pub rendering_mode: String,
    /// Static system prompt override, or empty string.
    pub prompt: String,
    /// Always `"UTC"`.
    pub timezone: String,
    /// Tool definitions, with web-search tools rewritten to the v0 contract.
    pub tools: Vec<Tool>,
}
