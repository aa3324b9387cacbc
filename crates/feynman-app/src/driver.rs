use std::io::Write;
use std::ops::ControlFlow;
use std::path::Path;

use feynman_session::{SessionStore, StreamOutcome, MAX_ATTACHMENTS};
use feynman_types::{AttachmentRef, Conversation, MessageKind};

use crate::commands::{Command, HELP};
use crate::error::{AppError, AppResult};
use crate::printer::ReplyPrinter;
use crate::state::AppState;

/// Line-oriented front end over a [`ChatSession`](feynman_session::ChatSession)
pub struct Driver {
    state: AppState,
    pending: Vec<AttachmentRef>,
}

impl Driver {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Ctrl-C stops a streaming reply, or exits when nothing is streaming
    pub fn on_interrupt(&self) -> ControlFlow<()> {
        if self.state.session.cancel() {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }

    pub async fn execute(&mut self, command: Command) -> AppResult<ControlFlow<()>> {
        let session = &self.state.session;

        match command {
            Command::Send(text) => self.send(&text).await?,
            Command::New => {
                let conversation = session.new_conversation();
                println!("Started conversation {}", conversation.id);
            }
            Command::Threads => {
                let count = session.load_threads().await?;
                tracing::debug!("Server returned {} threads", count);
                self.print_conversations(&self.state.store.snapshot().conversations);
            }
            Command::Open(id) => {
                let conversation = session.select_conversation(&id).await?;
                print_transcript(&conversation);
            }
            Command::Delete(id) => {
                let removed = session.delete_conversation(&id)?;
                println!("Deleted \"{}\"", removed.title);
            }
            Command::Search(query) => self.print_conversations(&session.search(&query)),
            Command::Mode(mode) => {
                session.set_mode(mode);
                println!("Mode: {:?}", mode);
            }
            Command::Attach(path) => self.attach(&path).await?,
            Command::Import(url) => {
                let lecture = session.import_lecture(&url).await?;
                println!("Transcript of {}:\n{}", lecture.lecture_url, lecture.transcript);
            }
            Command::Cancel => {
                if !session.cancel() {
                    println!("Nothing is streaming");
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(ControlFlow::Break(())),
        }

        Ok(ControlFlow::Continue(()))
    }

    /// Submit and echo the reply as it streams. Ctrl-C cancels it.
    async fn send(&mut self, text: &str) -> AppResult<()> {
        let session = self.state.session.clone();
        let attachments = std::mem::take(&mut self.pending);
        let mut updates = self.state.store.subscribe();
        let mut printer = ReplyPrinter::new(self.state.config.chat.suppress_open_fences);

        let submit = session.submit(text, attachments);
        tokio::pin!(submit);

        let result = loop {
            tokio::select! {
                result = &mut submit => break result,
                Ok(()) = updates.changed() => {
                    let active = updates.borrow_and_update().active.clone();
                    if let Some(text) = printer.on_update(active.as_ref()) {
                        emit(&text);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    let _ = self.on_interrupt();
                }
            }
        };

        let report = result?;
        emit(&printer.on_finish(&report));
        if report.outcome == StreamOutcome::Cancelled {
            println!("[stopped]");
        }
        Ok(())
    }

    async fn attach(&mut self, path: &str) -> AppResult<()> {
        if self.pending.len() >= MAX_ATTACHMENTS {
            return Err(AppError::InvalidCommand(format!(
                "at most {} attachments per message",
                MAX_ATTACHMENTS
            )));
        }

        let metadata = tokio::fs::metadata(path).await?;
        let path = Path::new(path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let attachment = AttachmentRef::new(name, metadata.len(), guess_mime_type(path));

        println!("Attached {} ({} bytes)", attachment.name, attachment.size);
        self.pending.push(attachment);
        Ok(())
    }

    fn print_conversations(&self, conversations: &[Conversation]) {
        let active = self.state.store.active().map(|c| c.handle);
        if conversations.is_empty() {
            println!("No conversations");
        }
        for conversation in conversations {
            let marker = if Some(conversation.handle) == active { '*' } else { ' ' };
            println!("{} {:<16} {}", marker, conversation.id, conversation.title);
        }
    }
}

fn print_transcript(conversation: &Conversation) {
    println!("== {} ==", conversation.title);
    for message in &conversation.messages {
        let speaker = match message.kind {
            MessageKind::User => "you",
            MessageKind::Bot => "bot",
        };
        println!("{}: {}", speaker, message.content);
    }
}

fn emit(text: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
        tracing::warn!("Failed to write to stdout: {}", e);
    }
}

fn guess_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn driver() -> Driver {
        let config: Config = toml::from_str(
            r#"
            [server]
            base_url = "http://127.0.0.1:9"

            [logging]
            level = "info"
            format = "pretty"
            "#,
        )
        .unwrap();
        Driver::new(AppState::new(config).unwrap())
    }

    #[test]
    fn test_interrupt_when_idle_exits() {
        let driver = driver();
        assert_eq!(driver.on_interrupt(), ControlFlow::Break(()));
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("notes/Lecture.PDF")), "application/pdf");
        assert_eq!(guess_mime_type(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(guess_mime_type(Path::new("Makefile")), "application/octet-stream");
    }
}
