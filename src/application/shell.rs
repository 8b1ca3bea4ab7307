#[cfg(test)]
#[path = "shell_test.rs"]
mod tests;

use std::io::Write;

use anyhow::anyhow;
use anyhow::Result;
use owo_colors::OwoColorize;
use owo_colors::Stream;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::Selection;
use crate::domain::models::SlashCommand;
use crate::domain::models::SourceCatalog;
use crate::domain::models::StreamEvent;
use crate::domain::models::TransportName;
use crate::domain::services::ChatSession;
use crate::infrastructure::catalogs::MockCatalog;
use crate::infrastructure::transports::TransportManager;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /select (/s) [ID...] - Replaces the selected papers and documents. Ids can be separated by spaces or commas. Passing no ids clears the selection.
- /sources (/ls) [QUERY] - Lists the papers and documents you can chat with, optionally filtered by title.
- /selection - Shows the current selection.
- /stop - Stops the reply currently streaming. Whatever was received is kept.
- /clear - Stops any reply and clears the conversation. The selection is kept.
- /quit /exit (/q) - Exit Research Pal.
- /help (/h) - Provides this help menu.

Anything else is sent as a question about the selected sources.
        "#;

    return text.trim().to_string();
}

pub fn format_sources<C: SourceCatalog>(catalog: &C, query: &str) -> String {
    let papers = catalog.search_papers(query);
    let documents = catalog.search_documents(query);

    if papers.is_empty() && documents.is_empty() {
        return format!("No papers or documents match \"{query}\".");
    }

    let mut lines: Vec<String> = vec![];
    if !papers.is_empty() {
        lines.push("PAPERS:".to_string());
        for paper in papers {
            lines.push(format!(
                "- ({}) {} [arXiv {}] {}",
                paper.id,
                paper.title,
                paper.arxiv_id,
                paper.authors.join(", ")
            ));
        }
    }

    if !documents.is_empty() {
        lines.push("DOCUMENTS:".to_string());
        for document in documents {
            lines.push(format!(
                "- ({}) {} [{}, {}]",
                document.id, document.title, document.file_type, document.status
            ));
        }
    }

    return lines.join("\n");
}

pub fn format_selection(selection: &Selection) -> String {
    if selection.is_empty() {
        return "Nothing selected. Use /select to pick papers or documents.".to_string();
    }

    let mut parts: Vec<String> = vec![];
    if !selection.paper_ids().is_empty() {
        parts.push(format!("papers {}", selection.paper_ids().join(", ")));
    }
    if !selection.document_ids().is_empty() {
        parts.push(format!("documents {}", selection.document_ids().join(", ")));
    }

    return format!("Selected {}.", parts.join("; "));
}

pub fn format_citations(message: &Message) -> Option<String> {
    if message.role() != Role::Assistant || message.citations().is_empty() {
        return None;
    }

    let lines = message
        .citations()
        .iter()
        .map(|citation| {
            let line = format!("- {} [{}]", citation.label(), citation.source_id);
            if let Some(snippet) = &citation.snippet {
                return format!("{line}\n  \"{snippet}\"");
            }
            return line;
        })
        .collect::<Vec<String>>();

    return Some(format!("Sources:\n{}", lines.join("\n")));
}

#[derive(Debug, PartialEq, Eq)]
pub enum ShellOutcome {
    /// The question was handed to the session and a reply is streaming.
    Sent,
    Print(String),
    Ignored,
    Quit,
}

/// Line based front end over a single `ChatSession`.
pub struct Shell<C: SourceCatalog> {
    session: ChatSession,
    catalog: C,
    username: String,
}

impl<C: SourceCatalog> Shell<C> {
    pub fn new(session: ChatSession, catalog: C, username: &str) -> Shell<C> {
        return Shell {
            session,
            catalog,
            username: username.to_string(),
        };
    }

    pub fn session(&self) -> &ChatSession {
        return &self.session;
    }

    /// Resolves mixed ids against the catalog and replaces the selection with
    /// the known ones.
    pub fn select(&mut self, ids: &[String]) -> String {
        let partitioned = self.catalog.partition(ids);
        self.session
            .select_sources(partitioned.paper_ids, partitioned.document_ids);

        let mut res = format_selection(self.session.selection());
        if !partitioned.unknown.is_empty() {
            res = format!(
                "{res}\nIgnored unknown ids: {}",
                partitioned.unknown.join(", ")
            );
        }

        return res;
    }

    pub fn handle_input(&mut self, input: &str) -> ShellOutcome {
        if input.trim().is_empty() {
            return ShellOutcome::Ignored;
        }

        if let Some(command) = SlashCommand::parse(input) {
            if command.is_quit() {
                self.session.stop();
                return ShellOutcome::Quit;
            }
            if command.is_help() {
                return ShellOutcome::Print(help_text());
            }
            if command.is_select() {
                return ShellOutcome::Print(self.select(&command.ids()));
            }
            if command.is_sources() {
                return ShellOutcome::Print(format_sources(&self.catalog, &command.query()));
            }
            if command.is_selection() {
                return ShellOutcome::Print(format_selection(self.session.selection()));
            }
            if command.is_stop() {
                if !self.session.is_streaming() {
                    return ShellOutcome::Ignored;
                }
                self.session.stop();
                return ShellOutcome::Print("Stopped.".to_string());
            }
            if command.is_clear() {
                self.session.clear();
                return ShellOutcome::Print("Conversation cleared.".to_string());
            }
        }

        if self.session.is_streaming() {
            return ShellOutcome::Print(
                "Still answering, wait for the reply or use /stop.".to_string(),
            );
        }

        if self.session.selection().is_empty() {
            return ShellOutcome::Print(
                "Select at least one paper or document before asking a question. See /sources."
                    .to_string(),
            );
        }

        if self.session.send(input) {
            return ShellOutcome::Sent;
        }

        return ShellOutcome::Ignored;
    }

    fn print_prompt(&self) -> Result<()> {
        print!(
            "{} ",
            format!("{}>", self.username).if_supports_color(Stream::Stdout, |text| {
                return text.bold();
            })
        );
        std::io::stdout().flush()?;
        return Ok(());
    }

    fn render_event(&self, event: &StreamEvent) -> Result<()> {
        match event {
            StreamEvent::Chunk(text) => {
                print!("{text}");
                std::io::stdout().flush()?;
            }
            StreamEvent::Citation(_) => (),
            StreamEvent::Done | StreamEvent::Error(_) => {
                println!();
                if let Some(citations) = self.session.messages().last().and_then(format_citations) {
                    println!(
                        "{}",
                        citations.if_supports_color(Stream::Stdout, |text| {
                            return text.dimmed();
                        })
                    );
                }
                if let StreamEvent::Error(err) = event {
                    println!(
                        "{}",
                        format!("The reply failed: {err}").if_supports_color(
                            Stream::Stdout,
                            |text| {
                                return text.red();
                            }
                        )
                    );
                }
            }
        }

        return Ok(());
    }

    /// Reads stdin until `/quit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        return self.run_with(BufReader::new(tokio::io::stdin())).await;
    }

    /// Replies stream to stdout while input keeps being read, so `/stop` and
    /// `/clear` can cut them short. Once input ends, a streaming reply is
    /// still read through to its terminal event.
    pub async fn run_with<R: AsyncBufRead + Unpin>(&mut self, reader: R) -> Result<()> {
        let mut lines = reader.lines();
        let mut input_open = true;
        self.print_prompt()?;

        loop {
            if !input_open && !self.session.is_streaming() {
                break;
            }

            tokio::select! {
                line = lines.next_line(), if input_open => {
                    let line = match line? {
                        Some(line) => line,
                        None => {
                            input_open = false;
                            continue;
                        }
                    };

                    match self.handle_input(&line) {
                        ShellOutcome::Quit => break,
                        ShellOutcome::Sent => continue,
                        ShellOutcome::Print(text) => println!("{text}"),
                        ShellOutcome::Ignored => (),
                    }

                    if !self.session.is_streaming() {
                        self.print_prompt()?;
                    }
                }
                Some(event) = self.session.next_event(), if self.session.is_streaming() => {
                    self.render_event(&event)?;
                    if event.is_terminal() && input_open {
                        self.print_prompt()?;
                    }
                }
                else => break,
            }
        }

        self.session.stop();
        return Ok(());
    }
}

pub async fn start(config: Config) -> Result<()> {
    let transport_name = config.get(ConfigKey::Transport);
    let transport = TransportManager::get(
        TransportName::parse(transport_name.to_string())
            .ok_or_else(|| return anyhow!("No transport named {transport_name}"))?,
        &config,
    )?;

    if let Err(err) = transport.health_check().await {
        tracing::warn!(error = ?err, "Transport health check failed");
        println!(
            "{}",
            format!("Heads up, the {transport_name} transport isn't reachable, replies may fail.\n\nError: {err}")
                .if_supports_color(Stream::Stdout, |text| {
                    return text.yellow();
                })
        );
    }

    let mut shell = Shell::new(
        ChatSession::new(transport),
        MockCatalog::default(),
        &config.get(ConfigKey::Username),
    );

    let selection = config.selection();
    let initial_ids = selection
        .paper_ids()
        .into_iter()
        .chain(selection.document_ids())
        .collect::<Vec<String>>();
    println!("Hey there! Ask me anything about your papers. Type /help for commands.");
    println!("{}", shell.select(&initial_ids));

    return shell.run().await;
}
