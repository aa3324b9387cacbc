use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::{Conversation, ConversationHandle};

/// Which agent graph answers a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Standard,
    Feynman,
}

/// Entry of the recent-threads listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub thread_name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Accepts RFC 3339 as well as the offset-less ISO form the backend emits
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(e) => {
            tracing::debug!("Ignoring unparseable thread timestamp {:?}: {}", raw, e);
            None
        }
    }
}

impl From<ThreadSummary> for Conversation {
    fn from(summary: ThreadSummary) -> Self {
        Self {
            handle: ConversationHandle::new(),
            created_at: parse_timestamp(summary.created_at.as_deref()),
            updated_at: parse_timestamp(summary.updated_at.as_deref()),
            id: summary.thread_id,
            title: summary.thread_name,
            messages: Vec::new(),
        }
    }
}

/// Response of the lecture transcript import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureTranscript {
    pub status: String,
    #[serde(default)]
    pub lecture_url: String,
    #[serde(default)]
    pub transcript: String,
}

impl LectureTranscript {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_to_conversation() {
        let summary = ThreadSummary {
            thread_id: "abc".to_string(),
            thread_name: "Photosynthesis".to_string(),
            created_at: Some("2024-03-01T10:15:30.123456".to_string()),
            updated_at: Some("2024-03-01T11:00:00+00:00".to_string()),
        };

        let conv = Conversation::from(summary);
        assert_eq!(conv.id, "abc");
        assert_eq!(conv.title, "Photosynthesis");
        assert!(conv.messages.is_empty());
        assert!(conv.created_at.is_some());
        assert!(conv.updated_at.is_some());
    }

    #[test]
    fn test_bad_timestamp_is_dropped() {
        assert!(parse_timestamp(Some("yesterday")).is_none());
        assert!(parse_timestamp(None).is_none());
    }

    #[test]
    fn test_chat_mode_serialization() {
        assert_eq!(serde_json::to_string(&ChatMode::Feynman).unwrap(), "\"feynman\"");
        assert_eq!(ChatMode::default(), ChatMode::Standard);
    }
}
