use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{Message, MessageKind};

/// Body of the thread history endpoint.
///
/// Entries are kept as raw JSON because the backend has returned several
/// shapes over time: bare strings, `{type, content}` objects, and objects
/// whose `content` is a list of parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadHistory {
    #[serde(default)]
    pub messages: Vec<Value>,
}

fn kind_from_label(label: &str) -> Option<MessageKind> {
    match label.to_ascii_lowercase().as_str() {
        "human" | "user" => Some(MessageKind::User),
        "ai" | "assistant" | "bot" => Some(MessageKind::Bot),
        _ => None,
    }
}

fn text_of(content: &Value) -> Option<String> {
    match content {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => Some(
            parts
                .iter()
                .filter_map(|part| match part {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(obj) => obj.get("text").and_then(Value::as_str),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Convert raw history entries into finished messages.
///
/// Bare strings alternate user/bot by position. Objects are typed by their
/// `type` (or `role`) label; system, tool and unknown entries are skipped.
pub fn normalize_history(entries: &[Value]) -> Vec<Message> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry {
            Value::String(text) => {
                let kind = if index % 2 == 0 { MessageKind::User } else { MessageKind::Bot };
                Some(finished(kind, text.clone()))
            }
            Value::Object(obj) => {
                let label = obj
                    .get("type")
                    .or_else(|| obj.get("role"))
                    .and_then(Value::as_str)?;
                let Some(kind) = kind_from_label(label) else {
                    tracing::debug!("Skipping history entry of type {:?}", label);
                    return None;
                };
                let content = obj.get("content").and_then(text_of).unwrap_or_default();
                Some(finished(kind, content))
            }
            other => {
                tracing::debug!("Skipping unsupported history entry: {}", other);
                None
            }
        })
        .collect()
}

fn finished(kind: MessageKind, content: String) -> Message {
    match kind {
        MessageKind::User => Message::user(content, Vec::new()),
        MessageKind::Bot => Message::bot(content),
    }
}
