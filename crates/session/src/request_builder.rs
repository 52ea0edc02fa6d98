//! Assembles a [`ClaudeWebRequest`] from an incoming Anthropic-shaped
//! request (component C3, spec §4.3).

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use config::RequestConfig;
use rand::seq::IndexedRandom;

use crate::{
    error::SessionError,
    model::{Attachment, ClaudeWebRequest, IncomingMessage, Tool},
    session::Session,
};

const WEB_SEARCH_TOOL_PREFIX: &str = "web_search_";

/// Whether the model's `thinking` configuration maps to Claude-web's
/// paprika (extended reasoning) mode.
pub fn paprika_mode_for_thinking(thinking_type: Option<&str>) -> Option<&'static str> {
    match thinking_type {
        Some("enabled") | Some("adaptive") => Some("extended"),
        _ => None,
    }
}

/// Splits `tools` into the pass-through list and whether any web-search
/// tool was requested. Any tool whose `type` starts with
/// `"web_search_"` is dropped from the pass-through list; if at least one
/// was present, a single canonical `web_search_v0` tool is prepended
/// (spec §4.3.2).
pub fn process_web_search_tools(tools: Vec<Tool>) -> (Vec<Tool>, bool) {
    let mut has_web_search = false;
    let mut processed: Vec<Tool> = tools
        .into_iter()
        .filter(|tool| {
            let is_web_search = tool.kind.starts_with(WEB_SEARCH_TOOL_PREFIX);
            has_web_search |= is_web_search;
            !is_web_search
        })
        .collect();

    if has_web_search {
        processed.insert(
            0,
            Tool {
                name: "web_search".to_string(),
                kind: "web_search_v0".to_string(),
            },
        );
    }

    (processed, has_web_search)
}

/// Flattens messages and an optional system prompt into a single prompt
/// string. Each message is rendered as a role-tagged turn; this is the
/// textual representation Claude-web expects for `rendering_mode=messages`.
fn merge_messages(messages: &[IncomingMessage], system: Option<&str>) -> String {
    let mut parts = Vec::new();

    if let Some(system) = system
        && !system.trim().is_empty()
    {
        parts.push(format!("System: {system}"));
    }

    for message in messages {
        if message.text.trim().is_empty() {
            continue;
        }
        let role = if message.role == "assistant" { "Assistant" } else { "Human" };
        parts.push(format!("{role}: {}", message.text));
    }

    parts.join("\n\n")
}

fn generate_padding(config: &RequestConfig) -> String {
    if config.padtxt_length == 0 {
        return String::new();
    }

    let pool: Vec<char> = config.pad_tokens().chars().collect();
    if pool.is_empty() {
        return String::new();
    }

    let mut rng = rand::rng();
    (0..config.padtxt_length).filter_map(|_| pool.choose(&mut rng)).collect()
}

/// Builds and dispatches one Claude-web turn for an incoming request.
pub struct RequestBuilder<'a> {
    request_config: &'a RequestConfig,
}

/// Result of assembling and dispatching a Claude-web turn.
pub struct BuildOutput {
    /// The raw SSE byte stream from Claude-web.
    pub stream: std::pin::Pin<Box<dyn futures_util::Stream<Item = Result<bytes::Bytes, SessionError>> + Send>>,
    /// Whether the originating request asked for web search, needed by the
    /// interceptor to tell a server web-search `tool_use` block apart from
    /// a client one.
    pub has_web_search: bool,
}

/// Inputs gathered from the incoming Anthropic-shaped request.
pub struct BuildInput {
    /// Conversation turns.
    pub messages: Vec<IncomingMessage>,
    /// Optional system prompt.
    pub system: Option<String>,
    /// Requested model identifier.
    pub model: String,
    /// `max_tokens` from the incoming request.
    pub max_tokens: u32,
    /// `thinking.type`, if the request enabled extended thinking.
    pub thinking_type: Option<String>,
    /// Tool definitions from the incoming request.
    pub tools: Vec<Tool>,
}

impl<'a> RequestBuilder<'a> {
    /// Builds a request builder bound to the process's request settings.
    pub fn new(request_config: &'a RequestConfig) -> Self {
        Self { request_config }
    }

    /// Builds a [`ClaudeWebRequest`], uploading any images via `session`,
    /// and dispatches it, returning the raw SSE byte stream.
    pub async fn build_and_send(&self, session: Arc<dyn Session>, input: BuildInput) -> Result<BuildOutput, SessionError> {
        if input.messages.is_empty() {
            return Err(SessionError::NoValidMessages);
        }

        let merged_text = merge_messages(&input.messages, input.system.as_deref());
        if merged_text.trim().is_empty() {
            return Err(SessionError::NoValidMessages);
        }

        let padding = generate_padding(self.request_config);
        let prompt_text = format!("{padding}{merged_text}");

        let mut image_file_ids = Vec::new();
        for (i, image) in input.messages.iter().flat_map(|m| m.images.iter()).enumerate() {
            let filename = format!("image_{i}.png");
            let data = match BASE64.decode(&image.base64_data) {
                Ok(data) => data,
                Err(err) => {
                    log::warn!("Skipping image {filename}: invalid base64: {err}");
                    continue;
                }
            };

            match session.upload_file(data, &filename, &image.content_type).await {
                Ok(file_id) => image_file_ids.push(file_id),
                Err(err) => log::warn!("Skipping image {filename}: upload failed: {err}"),
            }
        }

        session.ensure_conversation_initialized().await?;

        let paprika_mode = paprika_mode_for_thinking(input.thinking_type.as_deref());
        session.set_paprika_mode(paprika_mode).await?;

        let (tools, has_web_search) = process_web_search_tools(input.tools);
        session.set_web_search(has_web_search).await?;

        let request = ClaudeWebRequest {
            max_tokens_to_sample: input.max_tokens,
            attachments: vec![Attachment::from_text(prompt_text)],
            files: image_file_ids,
            model: input.model,
            rendering_mode: "messages".to_string(),
            prompt: self.request_config.custom_prompt.clone().unwrap_or_default(),
            timezone: "UTC".to_string(),
            tools,
        };

        let stream = session.send_message(request).await?;
        Ok(BuildOutput { stream, has_web_search })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_search_tools_are_deduplicated_into_v0() {
        let tools = vec![
            Tool { name: "web_search".to_string(), kind: "web_search_20250305".to_string() },
            Tool { name: "calculator".to_string(), kind: "custom".to_string() },
        ];

        let (processed, has_web_search) = process_web_search_tools(tools);

        assert!(has_web_search);
        assert_eq!(processed.len(), 2);
        assert_eq!(processed[0].kind, "web_search_v0");
        assert_eq!(processed[1].name, "calculator");
    }

    #[test]
    fn no_web_search_tools_leaves_list_untouched() {
        let tools = vec![Tool { name: "calculator".to_string(), kind: "custom".to_string() }];
        let (processed, has_web_search) = process_web_search_tools(tools);

        assert!(!has_web_search);
        assert_eq!(processed.len(), 1);
    }

    #[test]
    fn paprika_mode_maps_enabled_and_adaptive() {
        assert_eq!(paprika_mode_for_thinking(Some("enabled")), Some("extended"));
        assert_eq!(paprika_mode_for_thinking(Some("adaptive")), Some("extended"));
        assert_eq!(paprika_mode_for_thinking(Some("disabled")), None);
        assert_eq!(paprika_mode_for_thinking(None), None);
    }

    #[test]
    fn merge_messages_renders_role_tagged_transcript() {
        let messages = vec![
            IncomingMessage { role: "user".to_string(), text: "hi".to_string(), images: vec![] },
            IncomingMessage { role: "assistant".to_string(), text: "hello".to_string(), images: vec![] },
        ];

        let merged = merge_messages(&messages, Some("be terse"));
        assert!(merged.starts_with("System: be terse"));
        assert!(merged.contains("Human: hi"));
        assert!(merged.contains("Assistant: hello"));
    }
}
