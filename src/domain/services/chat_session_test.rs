use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::ChatSession;
use crate::domain::models::ChatRequest;
use crate::domain::models::Citation;
use crate::domain::models::Role;
use crate::domain::models::StreamEvent;
use crate::domain::models::Transport;
use crate::domain::models::TransportName;

enum Script {
    Event(StreamEvent),
    Finish,
    Fail(String),
    Panic,
}

/// Transport whose replies are driven step by step from the test body.
#[derive(Default)]
struct ScriptedTransport {
    scripts: Mutex<VecDeque<mpsc::UnboundedReceiver<Script>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    /// Queues the script for the next reply.
    fn script(&self) -> mpsc::UnboundedSender<Script> {
        let (tx, rx) = mpsc::unbounded_channel::<Script>();
        self.scripts.lock().unwrap().push_back(rx);
        return tx;
    }

    fn requests(&self) -> Vec<ChatRequest> {
        return self.requests.lock().unwrap().clone();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> TransportName {
        return TransportName::Mock;
    }

    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    async fn stream_chat<'a>(
        &self,
        request: ChatRequest,
        tx: &'a mpsc::UnboundedSender<StreamEvent>,
    ) -> Result<()> {
        self.requests.lock().unwrap().push(request);
        let script = self.scripts.lock().unwrap().pop_front();
        let mut script = match script {
            Some(script) => script,
            None => bail!("No script queued"),
        };

        while let Some(step) = script.recv().await {
            match step {
                Script::Event(event) => tx.send(event)?,
                Script::Finish => return Ok(()),
                Script::Fail(message) => bail!(message),
                Script::Panic => panic!("transport blew up"),
            }
        }

        return Ok(());
    }
}

fn chunk(text: &str) -> Script {
    return Script::Event(StreamEvent::Chunk(text.to_string()));
}

fn cite(source_id: &str, title: &str, section: Option<&str>) -> Script {
    return Script::Event(StreamEvent::Citation(Citation::new(
        source_id, title, section,
    )));
}

fn new_session() -> (ChatSession, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::default());
    let session = ChatSession::new(transport.clone());
    return (session, transport);
}

fn papers(ids: &[&str]) -> Vec<String> {
    return ids.iter().map(|e| return e.to_string()).collect();
}

async fn drain(session: &mut ChatSession) -> Vec<StreamEvent> {
    let mut events = vec![];
    while let Some(event) = session.next_event().await {
        events.push(event);
    }

    return events;
}

mod send {
    use super::*;

    #[tokio::test]
    async fn it_streams_a_reply_with_citations() -> Result<()> {
        let (mut session, transport) = new_session();
        let script = transport.script();
        session.select_sources(papers(&["p1"]), vec![]);

        assert!(session.send("What is attention?"));
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[0].role(), Role::User);
        assert_eq!(session.messages()[0].text(), "What is attention?");
        assert_eq!(session.messages()[1].role(), Role::Assistant);
        assert_eq!(session.messages()[1].text(), "");
        assert!(session.is_streaming());

        script.send(chunk("Attention "))?;
        script.send(chunk("is "))?;
        script.send(chunk("key."))?;
        script.send(cite("p1", "Attention Is All You Need", Some("Sec 3")))?;
        script.send(Script::Finish)?;

        let events = drain(&mut session).await;
        assert_eq!(events.last(), Some(&StreamEvent::Done));

        let reply = &session.messages()[1];
        assert_eq!(reply.text(), "Attention is key.");
        assert_eq!(
            reply.citations(),
            &[Citation::new(
                "p1",
                "Attention Is All You Need",
                Some("Sec 3")
            )]
        );
        assert!(!session.is_streaming());
        assert!(session.open_message().is_none());
        assert_eq!(session.error(), None);

        return Ok(());
    }

    #[tokio::test]
    async fn it_concatenates_chunks_in_delivery_order() -> Result<()> {
        let cases: Vec<Vec<&str>> = vec![
            vec![],
            vec!["single"],
            vec!["a", "a", "a"],
            vec!["", "x", "", "y "],
            vec!["line one\n", "\tline two", " ünïcödé"],
        ];

        for chunks in cases {
            let (mut session, transport) = new_session();
            let script = transport.script();
            session.select_sources(papers(&["p1"]), vec![]);
            assert!(session.send("go"));

            for text in &chunks {
                script.send(chunk(text))?;
            }
            script.send(Script::Finish)?;
            drain(&mut session).await;

            assert_eq!(session.messages()[1].text(), chunks.concat());
        }

        return Ok(());
    }

    #[tokio::test]
    async fn it_keeps_interleaved_citations_in_arrival_order() -> Result<()> {
        let (mut session, transport) = new_session();
        let script = transport.script();
        session.select_sources(papers(&["p1", "p2"]), vec![]);
        assert!(session.send("Compare them"));

        script.send(cite("p2", "Second", None))?;
        script.send(chunk("One "))?;
        script.send(cite("p1", "First", Some("Sec 1")))?;
        script.send(chunk("two."))?;
        script.send(cite("p2", "Second", None))?;
        script.send(Script::Finish)?;
        drain(&mut session).await;

        let reply = &session.messages()[1];
        assert_eq!(reply.text(), "One two.");
        let ids = reply
            .citations()
            .iter()
            .map(|e| return e.source_id.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(ids, vec!["p2", "p1", "p2"]);

        return Ok(());
    }

    #[tokio::test]
    async fn it_passes_trimmed_text_and_selection_to_transport() -> Result<()> {
        let (mut session, transport) = new_session();
        let script = transport.script();
        session.select_sources(papers(&["p1"]), papers(&["doc-1"]));

        assert!(session.send("  What is attention?\n"));
        script.send(Script::Finish)?;
        drain(&mut session).await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text, "What is attention?");
        assert_eq!(requests[0].paper_ids, vec!["p1"]);
        assert_eq!(requests[0].document_ids, vec!["doc-1"]);

        return Ok(());
    }

    #[tokio::test]
    async fn it_ignores_blank_text() {
        let (mut session, _transport) = new_session();
        session.select_sources(papers(&["p1"]), vec![]);

        assert!(!session.send(""));
        assert!(!session.send("   \n\t"));
        assert!(session.messages().is_empty());
        assert!(!session.is_streaming());
    }

    #[tokio::test]
    async fn it_ignores_sends_without_selection() {
        let (mut session, transport) = new_session();

        assert!(!session.send("What is attention?"));
        assert_eq!(session.messages().len(), 0);
        assert!(!session.is_streaming());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn it_accepts_document_only_selection() -> Result<()> {
        let (mut session, transport) = new_session();
        let script = transport.script();
        session.select_sources(vec![], papers(&["doc-1"]));

        assert!(session.send("Summarize"));
        script.send(Script::Finish)?;
        drain(&mut session).await;

        assert_eq!(session.messages().len(), 2);
        return Ok(());
    }

    #[tokio::test]
    async fn it_ignores_sends_while_streaming() -> Result<()> {
        let (mut session, transport) = new_session();
        let script = transport.script();
        session.select_sources(papers(&["p1"]), vec![]);

        assert!(session.send("First"));
        let selection = session.selection().clone();

        assert!(!session.send("Second"));
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.selection(), &selection);
        assert!(session.is_streaming());

        script.send(Script::Finish)?;
        drain(&mut session).await;
        assert_eq!(transport.requests().len(), 1);

        return Ok(());
    }

    #[tokio::test]
    async fn it_keeps_in_flight_request_when_selection_changes() -> Result<()> {
        let (mut session, transport) = new_session();
        let script = transport.script();
        session.select_sources(papers(&["p1"]), vec![]);

        assert!(session.send("First"));
        session.select_sources(papers(&["p2"]), vec![]);
        assert!(session.is_streaming());

        script.send(chunk("ok"))?;
        script.send(Script::Finish)?;
        drain(&mut session).await;

        assert_eq!(transport.requests()[0].paper_ids, vec!["p1"]);
        assert_eq!(session.selection().paper_ids(), vec!["p2"]);
        assert_eq!(session.messages()[1].text(), "ok");

        return Ok(());
    }

    #[tokio::test]
    async fn it_tracks_the_open_message_by_id() -> Result<()> {
        let (mut session, transport) = new_session();
        let script = transport.script();
        session.select_sources(papers(&["p1"]), vec![]);

        assert!(session.send("First"));
        let open_id = session.open_message().map(|e| return e.id());
        assert_eq!(open_id, Some(session.messages()[1].id()));

        script.send(chunk("streamed"))?;
        session.next_event().await;
        assert_eq!(
            session.open_message().map(|e| return e.text().to_string()),
            Some("streamed".to_string())
        );

        script.send(Script::Finish)?;
        drain(&mut session).await;
        assert!(session.open_message().is_none());

        return Ok(());
    }

    #[tokio::test]
    async fn it_appends_turns_in_order() -> Result<()> {
        let (mut session, transport) = new_session();
        session.select_sources(papers(&["p1"]), vec![]);

        for (question, answer) in [("One?", "1"), ("Two?", "2")] {
            let script = transport.script();
            assert!(session.send(question));
            script.send(chunk(answer))?;
            script.send(Script::Finish)?;
            drain(&mut session).await;
        }

        let texts = session
            .messages()
            .iter()
            .map(|e| return format!("{}: {}", e.role(), e.text()))
            .collect::<Vec<String>>();
        insta::assert_snapshot!(texts.join("\n"), @r###"
        user: One?
        assistant: 1
        user: Two?
        assistant: 2
        "###);

        return Ok(());
    }
}

mod errors {
    use super::*;

    #[tokio::test]
    async fn it_keeps_partial_reply_on_transport_error() -> Result<()> {
        let (mut session, transport) = new_session();
        let script = transport.script();
        session.select_sources(papers(&["p1"]), vec![]);
        assert!(session.send("What is attention?"));

        script.send(chunk("Attention "))?;
        script.send(cite("p1", "Attention Is All You Need", None))?;
        script.send(chunk("is"))?;
        script.send(Script::Fail("backend exploded".to_string()))?;

        let events = drain(&mut session).await;
        assert_eq!(
            events.last(),
            Some(&StreamEvent::Error("backend exploded".to_string()))
        );

        let reply = &session.messages()[1];
        assert_eq!(reply.text(), "Attention is");
        assert_eq!(reply.citations().len(), 1);
        assert_eq!(session.error(), Some("backend exploded"));
        assert!(!session.is_streaming());

        return Ok(());
    }

    #[tokio::test]
    async fn it_records_missing_script_as_error() {
        let (mut session, _transport) = new_session();
        session.select_sources(papers(&["p1"]), vec![]);
        assert!(session.send("Anyone there?"));

        drain(&mut session).await;
        assert_eq!(session.error(), Some("No script queued"));
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn it_records_error_when_stream_closes_without_terminal_event() -> Result<()> {
        let (mut session, transport) = new_session();
        let script = transport.script();
        session.select_sources(papers(&["p1"]), vec![]);
        assert!(session.send("Hello"));

        script.send(chunk("Hal"))?;
        script.send(Script::Panic)?;
        drain(&mut session).await;

        assert_eq!(session.messages()[1].text(), "Hal");
        assert_eq!(session.error(), Some("Stream ended without a response."));
        assert!(!session.is_streaming());

        return Ok(());
    }

    #[tokio::test]
    async fn it_clears_error_on_next_send() -> Result<()> {
        let (mut session, transport) = new_session();
        session.select_sources(papers(&["p1"]), vec![]);

        let script = transport.script();
        assert!(session.send("First"));
        script.send(Script::Fail("nope".to_string()))?;
        drain(&mut session).await;
        assert_eq!(session.error(), Some("nope"));

        let script = transport.script();
        assert!(session.send("Second"));
        assert_eq!(session.error(), None);
        script.send(Script::Finish)?;
        drain(&mut session).await;
        assert_eq!(session.error(), None);

        return Ok(());
    }

    #[tokio::test]
    async fn it_keeps_error_on_rejected_send() -> Result<()> {
        let (mut session, transport) = new_session();
        session.select_sources(papers(&["p1"]), vec![]);

        let script = transport.script();
        assert!(session.send("First"));
        script.send(Script::Fail("nope".to_string()))?;
        drain(&mut session).await;

        assert!(!session.send("  "));
        assert_eq!(session.error(), Some("nope"));

        return Ok(());
    }
}

mod stop {
    use super::*;

    #[tokio::test]
    async fn it_stops_mid_stream_and_ignores_late_chunks() -> Result<()> {
        let (mut session, transport) = new_session();
        let script = transport.script();
        session.select_sources(papers(&["p1"]), vec![]);
        assert!(session.send("What is attention?"));

        script.send(chunk("Attention "))?;
        assert_eq!(
            session.next_event().await,
            Some(StreamEvent::Chunk("Attention ".to_string()))
        );

        session.stop();
        assert!(!session.is_streaming());

        let _ = script.send(chunk("is late."));
        let _ = script.send(Script::Finish);
        tokio::task::yield_now().await;

        assert_eq!(session.next_event().await, None);
        assert_eq!(session.messages()[1].text(), "Attention ");
        assert_eq!(session.error(), None);

        return Ok(());
    }

    #[tokio::test]
    async fn it_is_idempotent() {
        let (mut session, transport) = new_session();
        let _script = transport.script();
        session.select_sources(papers(&["p1"]), vec![]);

        session.stop();
        assert!(!session.is_streaming());

        assert!(session.send("Hello"));
        session.stop();
        session.stop();
        assert!(!session.is_streaming());
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn it_allows_sending_again_after_stop() -> Result<()> {
        let (mut session, transport) = new_session();
        session.select_sources(papers(&["p1"]), vec![]);

        let _first = transport.script();
        assert!(session.send("First"));
        session.stop();

        let second = transport.script();
        assert!(session.send("Second"));
        second.send(chunk("answer"))?;
        second.send(Script::Finish)?;
        drain(&mut session).await;

        assert_eq!(session.messages().len(), 4);
        assert_eq!(session.messages()[3].text(), "answer");

        return Ok(());
    }
}

mod clear {
    use super::*;

    #[tokio::test]
    async fn it_clears_after_stop_without_dangling_stream() {
        let (mut session, transport) = new_session();
        let _script = transport.script();
        session.select_sources(papers(&["p1"]), vec![]);
        assert!(session.send("Hello"));

        session.stop();
        session.clear();

        assert!(!session.is_streaming());
        assert!(session.messages().is_empty());
        assert_eq!(session.next_event().await, None);
    }

    #[tokio::test]
    async fn it_stops_open_reply_and_keeps_selection() -> Result<()> {
        let (mut session, transport) = new_session();
        let script = transport.script();
        session.select_sources(papers(&["p1"]), papers(&["doc-1"]));
        assert!(session.send("Hello"));

        script.send(chunk("Hi"))?;
        session.next_event().await;
        session.clear();

        assert!(!session.is_streaming());
        assert!(session.messages().is_empty());
        assert_eq!(session.selection().paper_ids(), vec!["p1"]);
        assert_eq!(session.selection().document_ids(), vec!["doc-1"]);

        return Ok(());
    }

    #[tokio::test]
    async fn it_clears_last_error() -> Result<()> {
        let (mut session, transport) = new_session();
        let script = transport.script();
        session.select_sources(papers(&["p1"]), vec![]);
        assert!(session.send("Hello"));

        script.send(Script::Fail("nope".to_string()))?;
        drain(&mut session).await;
        assert!(session.error().is_some());

        session.clear();
        assert_eq!(session.error(), None);

        return Ok(());
    }
}
