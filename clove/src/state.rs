//! Shared application state wired up in [`crate::main`].

use std::sync::Arc;

use accounts::AccountPool;
use config::RequestConfig;
use secrecy::SecretString;
use session::Session;
use streaming::ToolCallRegistry;

/// Builds a [`Session`] bound to one account's cookie. The concrete
/// implementation (Claude-web endpoints, cookie transport) is an external
/// collaborator; this crate only needs something that satisfies the
/// contract to wire the rest of the pipeline together.
pub type SessionFactory = Arc<dyn Fn(&SecretString) -> Arc<dyn Session> + Send + Sync>;

/// Process-wide state shared across request handlers.
pub struct AppState {
    /// The account pool (component C5).
    pub pool: Arc<AccountPool>,
    /// Request-builder settings (component C3).
    pub request_config: RequestConfig,
    /// Tool-call registry (component C6).
    pub tool_calls: Arc<ToolCallRegistry>,
    /// Builds a [`Session`] for a given account cookie.
    pub session_factory: SessionFactory,
}
