use super::Citation;

/// Everything a transport stream can deliver, in order. `Done` and `Error` are
/// terminal and are emitted once per stream by the stream worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    Chunk(String),
    Citation(Citation),
    Done,
    Error(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        return matches!(self, StreamEvent::Done | StreamEvent::Error(_));
    }
}
