//! Errors from building and dispatching a Claude-web request (spec §7).

use thiserror::Error;

/// Errors surfaced by [`crate::RequestBuilder`] and [`crate::Session`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The incoming request had no usable message content.
    #[error("request contained no valid messages")]
    NoValidMessages,
    /// An attachment failed to decode or upload; the attachment is skipped
    /// rather than failing the whole request, matching upstream behavior.
    #[error("failed to upload attachment {filename}: {reason}")]
    AttachmentUpload {
        /// Name the attachment was given.
        filename: String,
        /// Why the upload failed.
        reason: String,
    },
    /// The conversation could not be initialized.
    #[error("failed to initialize conversation: {0}")]
    ConversationInit(String),
    /// Sending the assembled message failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),
}
