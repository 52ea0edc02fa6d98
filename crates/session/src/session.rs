//! The per-account Claude-web conversation contract (component C4, spec §4.4).
//!
//! This crate only defines the contract: the wire details of the Claude-web
//! API itself (endpoints, cookies, response envelopes) are an external
//! collaborator's concern (spec §1), so the concrete implementation is
//! injected by the binary crate.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

use crate::error::SessionError;
use crate::model::ClaudeWebRequest;

/// A live connection to one Claude.ai conversation, scoped to a single
/// logical session.
#[async_trait]
pub trait Session: Send + Sync {
    /// Uploads an image, returning the file id Claude-web assigned it.
    async fn upload_file(&self, data: Vec<u8>, filename: &str, content_type: &str) -> Result<String, SessionError>;

    /// Ensures the underlying conversation exists, creating it lazily.
    async fn ensure_conversation_initialized(&self) -> Result<(), SessionError>;

    /// Sets the paprika (extended thinking) mode for subsequent turns.
    async fn set_paprika_mode(&self, mode: Option<&str>) -> Result<(), SessionError>;

    /// Enables or disables web search for subsequent turns.
    async fn set_web_search(&self, enabled: bool) -> Result<(), SessionError>;

    /// Sends the assembled request and returns the raw SSE byte stream.
    async fn send_message(
        &self,
        request: ClaudeWebRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<Bytes, SessionError>> + Send>>, SessionError>;
}
