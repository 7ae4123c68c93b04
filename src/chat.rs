//! Parsing of Open WebUI's per-chat JSON blobs.
//!
//! Each row in the `chat` table stores the full conversation as one opaque
//! JSON document. The only facts the collector needs from it are the number
//! of assistant-authored messages and the list of model identifiers the chat
//! names. Parsing is a total function: empty, NULL, or malformed blobs count
//! as zero messages and no models, so one corrupt row can never abort an
//! aggregation pass.

use serde_json::Value;

/// Per-chat statistics extracted from a chat JSON blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatStats {
    /// Number of messages whose `role` field is exactly "assistant"
    pub assistant_messages: u64,
    /// The blob's `models` list; non-string entries are ignored, not coerced
    pub models: Vec<String>,
}

/// Parse a chat blob into [`ChatStats`]. Never fails.
pub fn parse_chat_blob(raw: Option<&str>) -> ChatStats {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return ChatStats::default();
    };
    let Ok(blob) = serde_json::from_str::<Value>(raw) else {
        return ChatStats::default();
    };

    let assistant_messages = blob
        .get("messages")
        .and_then(Value::as_array)
        .map(|messages| {
            messages
                .iter()
                .filter(|m| m.get("role").and_then(Value::as_str) == Some("assistant"))
                .count() as u64
        })
        .unwrap_or(0);

    let models = blob
        .get("models")
        .and_then(Value::as_array)
        .map(|models| models.iter().filter_map(Value::as_str).map(str::to_owned).collect())
        .unwrap_or_default();

    ChatStats { assistant_messages, models }
}
