//! Normalizes Claude-web's private streaming events into public Anthropic
//! Messages API shapes (spec §4.1).

use serde_json::{Value, json};

/// Rewrites a raw SSE event in place.
///
/// Claude-web emits a `content_block_delta` with `delta.type ==
/// "citation_start_delta"` carrying a `citation` object keyed by
/// `url`/`title`/`uuid`. The public API instead expects `delta.type ==
/// "citations_delta"` with a `citation` object of type
/// `web_search_result_location`, `encrypted_index` defaulted from `uuid`
/// (falling back to `url`) and `cited_text` defaulted from `title`
/// (falling back to an empty string). Returns `false` when the event
/// should be dropped entirely (a citation delta with no usable `url`).
pub fn normalize_private_event(event: &mut Value) -> bool {
    let Some("content_block_delta") = event.get("type").and_then(Value::as_str) else {
        return true;
    };

    let Some(delta) = event.get_mut("delta") else {
        return true;
    };

    let Some("citation_start_delta") = delta.get("type").and_then(Value::as_str) else {
        return true;
    };

    let Some(citation) = delta.get("citation").cloned() else {
        return false;
    };

    let url = citation.get("url").and_then(Value::as_str).unwrap_or_default();
    if url.is_empty() {
        return false;
    }

    let title = citation.get("title").and_then(Value::as_str);
    let uuid = citation.get("uuid").and_then(Value::as_str);

    let normalized = json!({
        "type": "web_search_result_location",
        "url": url,
        "title": title,
        "encrypted_index": uuid.unwrap_or(url),
        "cited_text": title.unwrap_or(""),
    });

    delta["type"] = Value::String("citations_delta".to_string());
    delta["citation"] = normalized;

    true
}
