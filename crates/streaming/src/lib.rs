#![deny(missing_docs)]
//! SSE parsing, private-event normalization, and tool-call interception for
//! Anthropic Messages API streams (components C1, C2, C6).

mod citation;
mod event;
mod interceptor;
mod registry;
mod sse;

pub use event::{MessageDeltaData, StreamingEvent};
pub use interceptor::{Interceptor, Outcome};
pub use registry::{ToolCallOrigin, ToolCallRegistry};
pub use sse::{ParseError, UnknownEventPolicy, parse};
