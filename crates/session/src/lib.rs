#![deny(missing_docs)]
//! Request assembly, the per-account session contract, and the
//! cookie/OAuth rate-limit prober implementation (components C3, C4, C7).

mod error;
mod identity;
mod model;
mod prober;
mod request_builder;
mod session;

pub use error::SessionError;
pub use identity::{NotConfiguredIdentityClient, NotConfiguredSession};
pub use model::{Attachment, ClaudeWebRequest, IncomingImage, IncomingMessage, Tool};
pub use prober::HttpRateLimitProber;
pub use request_builder::{BuildInput, BuildOutput, RequestBuilder, paprika_mode_for_thinking, process_web_search_tools};
pub use session::Session;
