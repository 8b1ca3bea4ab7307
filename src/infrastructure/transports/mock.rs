#[cfg(test)]
#[path = "mock_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatRequest;
use crate::domain::models::Citation;
use crate::domain::models::StreamEvent;
use crate::domain::models::Transport;
use crate::domain::models::TransportName;

pub const MOCK_REPLY: &str = "Based on the papers you've selected, I can provide insights about the latest developments in machine learning. The transformer architecture has revolutionized natural language processing, enabling models to capture long-range dependencies more effectively than previous approaches.";

const MOCK_CITATION_TITLE: &str = "Attention Is All You Need";
const MOCK_CITATION_SECTION: &str = "Section 3";

/// Offline transport replaying a canned answer word by word.
pub struct Mock {
    chunk_delay: Duration,
    citation_delay: Duration,
}

impl Mock {
    pub fn new(config: &Config) -> Result<Mock> {
        let chunk_delay =
            Duration::from_millis(config.get(ConfigKey::MockChunkDelay).parse::<u64>()?);

        return Ok(Mock {
            chunk_delay,
            citation_delay: chunk_delay.saturating_mul(4),
        });
    }
}

#[async_trait]
impl Transport for Mock {
    fn name(&self) -> TransportName {
        return TransportName::Mock;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn stream_chat<'a>(
        &self,
        request: ChatRequest,
        tx: &'a mpsc::UnboundedSender<StreamEvent>,
    ) -> Result<()> {
        tracing::debug!(
            papers = request.paper_ids.len(),
            documents = request.document_ids.len(),
            "Mock reply started"
        );

        for word in MOCK_REPLY.split(' ') {
            time::sleep(self.chunk_delay).await;
            tx.send(StreamEvent::Chunk(format!("{word} ")))?;
        }

        if let Some(paper_id) = request.paper_ids.first() {
            time::sleep(self.citation_delay).await;
            tx.send(StreamEvent::Citation(Citation::new(
                paper_id,
                MOCK_CITATION_TITLE,
                Some(MOCK_CITATION_SECTION),
            )))?;
        }

        return Ok(());
    }
}
