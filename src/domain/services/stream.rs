use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::models::ChatRequest;
use crate::domain::models::StreamEvent;
use crate::domain::models::TransportArc;

/// An in-flight reply. The transport runs on its own task and its events are
/// marshalled back through a channel, so only the owner of the handle ever
/// observes them.
pub struct StreamHandle {
    events: mpsc::UnboundedReceiver<StreamEvent>,
    worker: JoinHandle<()>,
}

impl StreamHandle {
    /// Spawns the transport call. Must be called from within a tokio runtime.
    pub fn open(transport: TransportArc, request: ChatRequest) -> StreamHandle {
        let (tx, rx) = mpsc::unbounded_channel::<StreamEvent>();

        let worker = tokio::spawn(async move {
            let terminal = match transport.stream_chat(request, &tx).await {
                Ok(()) => StreamEvent::Done,
                Err(err) => {
                    tracing::error!(transport = %transport.name(), error = ?err, "Transport failed");
                    StreamEvent::Error(err.to_string())
                }
            };

            if tx.send(terminal).is_err() {
                tracing::debug!("Stream receiver dropped before the terminal event");
            }
        });

        return StreamHandle {
            events: rx,
            worker,
        };
    }

    /// Next event in delivery order, `None` once the stream is exhausted or
    /// cancelled.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        return self.events.recv().await;
    }

    /// Stops the transport task and discards anything still queued. Safe to
    /// call more than once.
    pub fn cancel(&mut self) {
        self.worker.abort();
        self.events.close();
        while self.events.try_recv().is_ok() {}
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
