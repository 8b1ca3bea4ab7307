#[cfg(test)]
#[path = "sse_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatRequest;
use crate::domain::models::Citation;
use crate::domain::models::StreamEvent;
use crate::domain::models::Transport;
use crate::domain::models::TransportName;

const DONE_MARKER: &str = "[DONE]";

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ServerEvent {
    Chunk {
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    Citation {
        paper_id: String,
        paper_title: String,
        section: Option<String>,
        relevance_snippet: Option<String>,
    },
    Error {
        message: String,
    },
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

/// Talks to the research backend over `POST /chat/stream`, reading the reply
/// as Server-Sent Events.
pub struct Sse {
    url: String,
    timeout: String,
}

impl Sse {
    pub fn new(config: &Config) -> Sse {
        return Sse {
            url: config.get(ConfigKey::ApiURL),
            timeout: config.get(ConfigKey::TransportHealthCheckTimeout),
        };
    }
}

#[async_trait]
impl Transport for Sse {
    fn name(&self) -> TransportName {
        return TransportName::Sse;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("API URL is not defined");
        }

        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Research API is not reachable");
                bail!("Research API is not reachable");
            }
        };

        let status = res.status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Research API health check failed");
            bail!("Research API health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn stream_chat<'a>(
        &self,
        request: ChatRequest,
        tx: &'a mpsc::UnboundedSender<StreamEvent>,
    ) -> Result<()> {
        let res = reqwest::Client::new()
            .post(format!("{url}/chat/stream", url = self.url))
            .json(&request)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.json::<ErrorResponse>().await.unwrap_or_default();
            tracing::error!(status = status, body = ?body, "Failed to open chat stream");
            bail!(body.message.unwrap_or_else(|| return "Stream failed".to_string()));
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).split(b'\n');

        while let Some(segment) = lines_reader.next_segment().await? {
            // Invalid UTF-8 is replaced rather than failing the reply.
            let line = String::from_utf8_lossy(&segment);
            let data = match line.strip_prefix("data: ") {
                Some(data) => data.trim_end(),
                None => continue,
            };

            if data == DONE_MARKER {
                break;
            }

            let event = match serde_json::from_str::<ServerEvent>(data) {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = ?err, data = data, "Skipping unparsable stream event");
                    continue;
                }
            };
            tracing::debug!(event = ?event, "Stream event");

            match event {
                ServerEvent::Chunk { content } => {
                    tx.send(StreamEvent::Chunk(content))?;
                }
                ServerEvent::Citation {
                    paper_id,
                    paper_title,
                    section,
                    relevance_snippet,
                } => {
                    let mut citation = Citation::new(&paper_id, &paper_title, section.as_deref());
                    if let Some(snippet) = relevance_snippet {
                        citation = citation.with_snippet(&snippet);
                    }
                    tx.send(StreamEvent::Citation(citation))?;
                }
                ServerEvent::Error { message } => {
                    bail!(message);
                }
            }
        }

        return Ok(());
    }
}
