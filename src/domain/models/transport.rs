#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Serialize;
use strum::EnumVariantNames;
use tokio::sync::mpsc;

use super::Selection;
use super::StreamEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TransportName {
    Mock,
    Sse,
}

impl TransportName {
    pub fn parse(text: String) -> Option<TransportName> {
        if text == "mock" {
            return Some(TransportName::Mock);
        }

        if text == "sse" {
            return Some(TransportName::Sse);
        }

        return None;
    }
}

/// What the backend is asked for a single turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(rename = "message")]
    pub text: String,
    pub paper_ids: Vec<String>,
    pub document_ids: Vec<String>,
}

impl ChatRequest {
    pub fn new(text: &str, selection: &Selection) -> ChatRequest {
        return ChatRequest {
            text: text.to_string(),
            paper_ids: selection.paper_ids(),
            document_ids: selection.document_ids(),
        };
    }
}

pub type TransportArc = Arc<dyn Transport + Send + Sync>;

#[async_trait]
pub trait Transport {
    fn name(&self) -> TransportName;

    /// Used at startup to verify the backend can be reached.
    async fn health_check(&self) -> Result<()>;

    /// Streams a reply for the request. Chunks and citations are pushed through
    /// the channel in the order the backend produces them.
    ///
    /// Returning `Ok` marks the end of the reply, returning an error fails it.
    /// Terminal events are not sent by the transport itself, the stream worker
    /// emits them from the returned result.
    async fn stream_chat<'a>(
        &self,
        request: ChatRequest,
        tx: &'a mpsc::UnboundedSender<StreamEvent>,
    ) -> Result<()>;
}
