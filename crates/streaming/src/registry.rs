//! TTL-backed registry mapping a tool call back to the session and message
//! that produced it (component C6, spec §4.6).

use std::time::Duration;

use mini_moka::sync::Cache;

/// Where a previously-seen client tool call came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallOrigin {
    /// The logical session the tool call belongs to.
    pub session_id: String,
    /// The assistant message that contained the tool call, if a
    /// `message_start` event was observed earlier in the same stream.
    pub message_id: Option<String>,
}

/// Keyed store of recently-emitted tool calls, expiring entries after a
/// fixed TTL so a client that never replies with a `tool_result` doesn't
/// leak memory indefinitely.
pub struct ToolCallRegistry {
    cache: Cache<String, ToolCallOrigin>,
}

impl ToolCallRegistry {
    /// Builds a registry whose entries expire `ttl` after insertion.
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).build(),
        }
    }

    /// Registers a tool call, overwriting any existing entry for the id.
    pub fn register(&self, tool_use_id: &str, origin: ToolCallOrigin) {
        self.cache.insert(tool_use_id.to_string(), origin);
    }

    /// Looks up the origin of a previously-registered tool call.
    pub fn lookup(&self, tool_use_id: &str) -> Option<ToolCallOrigin> {
        self.cache.get(&tool_use_id.to_string())
    }

    /// Removes a tool call, e.g. once its `tool_result` has been consumed.
    pub fn remove(&self, tool_use_id: &str) {
        self.cache.invalidate(&tool_use_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn register_then_lookup_round_trips() {
        let registry = ToolCallRegistry::new(Duration::from_secs(60));
        registry.register(
            "tool-1",
            ToolCallOrigin {
                session_id: "session-1".to_string(),
                message_id: Some("msg-1".to_string()),
            },
        );

        let origin = registry.lookup("tool-1").unwrap();
        assert_eq!(origin.session_id, "session-1");
    }

    #[test]
    fn lookup_missing_returns_none() {
        let registry = ToolCallRegistry::new(Duration::from_secs(60));
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn remove_evicts_entry() {
        let registry = ToolCallRegistry::new(Duration::from_secs(60));
        registry.register(
            "tool-1",
            ToolCallOrigin {
                session_id: "session-1".to_string(),
                message_id: Some("msg-1".to_string()),
            },
        );
        registry.remove("tool-1");
        assert!(registry.lookup("tool-1").is_none());
    }
}
