#[cfg(test)]
#[path = "chat_session_test.rs"]
mod tests;

use chrono::Utc;

use super::StreamHandle;
use crate::domain::models::ChatRequest;
use crate::domain::models::Message;
use crate::domain::models::MessageId;
use crate::domain::models::Selection;
use crate::domain::models::StreamEvent;
use crate::domain::models::TransportArc;

struct OpenReply {
    message_id: MessageId,
    handle: StreamHandle,
}

/// One conversation against a selection of papers and documents.
///
/// A session is owned by a single task. Replies are started with `send` and
/// driven by awaiting `next_event`, which applies each streamed event to the
/// open assistant message. Nothing on this type returns transport failures,
/// they end up in `error`.
pub struct ChatSession {
    transport: TransportArc,
    messages: Vec<Message>,
    selection: Selection,
    error: Option<String>,
    reply: Option<OpenReply>,
}

impl ChatSession {
    pub fn new(transport: TransportArc) -> ChatSession {
        return ChatSession {
            transport,
            messages: vec![],
            selection: Selection::default(),
            error: None,
            reply: None,
        };
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn selection(&self) -> &Selection {
        return &self.selection;
    }

    pub fn error(&self) -> Option<&str> {
        return self.error.as_deref();
    }

    pub fn is_streaming(&self) -> bool {
        return self.reply.is_some();
    }

    /// The assistant message currently receiving chunks.
    pub fn open_message(&self) -> Option<&Message> {
        let message_id = self.reply.as_ref()?.message_id;
        return self.messages.iter().find(|e| return e.id() == message_id);
    }

    /// Replaces both selection sets. An in-flight reply keeps the selection it
    /// was sent with.
    pub fn select_sources(&mut self, paper_ids: Vec<String>, document_ids: Vec<String>) {
        self.selection = Selection::new(paper_ids, document_ids);
        tracing::debug!(
            papers = ?self.selection.paper_ids(),
            documents = ?self.selection.document_ids(),
            "Selection replaced"
        );
    }

    /// Starts a new turn. Returns false without touching any state when the
    /// text is blank, nothing is selected, or a reply is still streaming.
    pub fn send(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.selection.is_empty() || self.is_streaming() {
            return false;
        }

        self.messages.push(Message::user(text));
        let assistant = Message::assistant();
        let message_id = assistant.id();
        self.messages.push(assistant);
        self.error = None;

        let request = ChatRequest::new(text, &self.selection);
        let handle = StreamHandle::open(self.transport.clone(), request);
        self.reply = Some(OpenReply { message_id, handle });

        tracing::debug!(message_id = %message_id, transport = %self.transport.name(), "Reply opened");
        return true;
    }

    /// Waits for the next event of the open reply and applies it. Returns the
    /// applied event, or `None` when no reply is streaming.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        let reply = self.reply.as_mut()?;
        let event = match reply.handle.next().await {
            Some(event) => event,
            None => StreamEvent::Error("Stream ended without a response.".to_string()),
        };

        self.apply(event.clone());
        return Some(event);
    }

    fn apply(&mut self, event: StreamEvent) {
        let message_id = match &self.reply {
            Some(reply) => reply.message_id,
            None => return,
        };

        match event {
            StreamEvent::Chunk(text) => {
                if let Some(message) = self.message_mut(message_id) {
                    message.append(&text);
                }
            }
            StreamEvent::Citation(citation) => {
                if let Some(message) = self.message_mut(message_id) {
                    message.cite(citation);
                }
            }
            StreamEvent::Done => {
                let elapsed_ms = self
                    .open_message()
                    .map(|e| return (Utc::now() - e.created_at()).num_milliseconds())
                    .unwrap_or_default();
                tracing::debug!(message_id = %message_id, elapsed_ms = elapsed_ms, "Reply finished");
                self.finalize();
            }
            StreamEvent::Error(err) => {
                tracing::warn!(message_id = %message_id, error = err.as_str(), "Reply failed");
                self.error = Some(err);
                self.finalize();
            }
        }
    }

    /// Cancels the open reply, keeping whatever it had received.
    pub fn stop(&mut self) {
        if let Some(reply) = self.reply.as_mut() {
            reply.handle.cancel();
            tracing::debug!(message_id = %reply.message_id, "Reply stopped");
        }

        self.finalize();
    }

    /// Stops any open reply and drops the conversation. The selection is kept.
    pub fn clear(&mut self) {
        self.stop();
        self.messages.clear();
        self.error = None;
    }

    fn finalize(&mut self) {
        self.reply = None;
    }

    fn message_mut(&mut self, message_id: MessageId) -> Option<&mut Message> {
        return self.messages.iter_mut().find(|e| return e.id() == message_id);
    }
}
