#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use super::Citation;
use super::Role;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> MessageId {
        return MessageId(Uuid::new_v4());
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "msg-{}", self.0);
    }
}

/// One turn of a conversation. Only the crate mutates the text and citations,
/// and only while the message is the open assistant reply of a session.
#[derive(Clone, Debug)]
pub struct Message {
    id: MessageId,
    role: Role,
    text: String,
    citations: Vec<Citation>,
    created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, text: &str) -> Message {
        return Message {
            id: MessageId::new(),
            role,
            text: text.to_string(),
            citations: vec![],
            created_at: Utc::now(),
        };
    }

    pub fn user(text: &str) -> Message {
        return Message::new(Role::User, text);
    }

    /// Empty placeholder filled by a streamed reply.
    pub fn assistant() -> Message {
        return Message::new(Role::Assistant, "");
    }

    pub fn id(&self) -> MessageId {
        return self.id;
    }

    pub fn role(&self) -> Role {
        return self.role;
    }

    pub fn text(&self) -> &str {
        return &self.text;
    }

    pub fn citations(&self) -> &[Citation] {
        return &self.citations;
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        return self.created_at;
    }

    pub(crate) fn append(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    pub(crate) fn cite(&mut self, citation: Citation) {
        self.citations.push(citation);
    }
}
