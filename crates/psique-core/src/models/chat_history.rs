use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Messages kept in a stored conversation. Older turns are dropped.
pub const MAX_STORED_MESSAGES: usize = 200;

/// The AI assistant conversation kept for one patient.
///
/// Rewritten after every question/answer pair so the conversation survives
/// page reloads.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChatHistory {
    pub patient_id: Uuid,
    pub model_id: String,
    pub messages: Vec<ChatHistoryMessage>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChatHistoryMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: jiff::Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatHistory {
    pub fn new(patient_id: Uuid, model_id: impl Into<String>, now: jiff::Timestamp) -> Self {
        Self {
            patient_id,
            model_id: model_id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push(&mut self, role: ChatRole, content: impl Into<String>, now: jiff::Timestamp) {
        self.messages.push(ChatHistoryMessage {
            role,
            content: content.into(),
            timestamp: now,
        });
        self.updated_at = now;
    }

    /// The most recent `limit` messages, oldest first, starting on a user turn.
    pub fn recent(&self, limit: usize) -> &[ChatHistoryMessage] {
        &self.messages[self.recent_start(limit)..]
    }

    /// Drop everything but the most recent `limit` messages.
    pub fn keep_recent(&mut self, limit: usize) {
        let start = self.recent_start(limit);
        self.messages.drain(..start);
    }

    fn recent_start(&self, limit: usize) -> usize {
        let mut start = self.messages.len().saturating_sub(limit);
        while start < self.messages.len() && self.messages[start].role != ChatRole::User {
            start += 1;
        }
        start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_never_starts_with_assistant() {
        let now = jiff::Timestamp::UNIX_EPOCH;
        let mut h = ChatHistory::new(Uuid::nil(), "m", now);
        h.push(ChatRole::User, "q1", now);
        h.push(ChatRole::Assistant, "a1", now);
        h.push(ChatRole::User, "q2", now);
        h.push(ChatRole::Assistant, "a2", now);

        let recent = h.recent(3);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "q2");
        assert_eq!(h.recent(10).len(), 4);
    }

    #[test]
    fn stored_history_is_bounded() {
        let now = jiff::Timestamp::UNIX_EPOCH;
        let mut h = ChatHistory::new(Uuid::nil(), "m", now);
        for i in 0..MAX_STORED_MESSAGES {
            h.push(ChatRole::User, format!("q{i}"), now);
            h.push(ChatRole::Assistant, format!("a{i}"), now);
        }
        h.keep_recent(MAX_STORED_MESSAGES);

        assert_eq!(h.messages.len(), MAX_STORED_MESSAGES);
        assert_eq!(h.messages[0].role, ChatRole::User);
        assert_eq!(h.messages[0].content, format!("q{}", MAX_STORED_MESSAGES / 2));
        assert_eq!(h.messages.last().unwrap().content, format!("a{}", MAX_STORED_MESSAGES - 1));
    }
}
