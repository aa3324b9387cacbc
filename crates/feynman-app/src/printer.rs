use feynman_session::{visible_prefix, StreamReport};
use feynman_types::{Conversation, MessageId};

/// Turns successive store snapshots into the text to append to the terminal.
///
/// Only the growth of the streaming reply is printed. When the text shown so
/// far is no longer a prefix of the reply (an error notice replaced it), the
/// whole reply is printed again on a new line.
#[derive(Debug, Default)]
pub struct ReplyPrinter {
    suppress_open_fences: bool,
    current: Option<MessageId>,
    printed: String,
}

impl ReplyPrinter {
    pub fn new(suppress_open_fences: bool) -> Self {
        Self {
            suppress_open_fences,
            ..Self::default()
        }
    }

    pub fn on_update(&mut self, active: Option<&Conversation>) -> Option<String> {
        let message = active?.streaming_message()?;
        let visible = if self.suppress_open_fences {
            visible_prefix(&message.content)
        } else {
            message.content.as_str()
        };
        self.advance(&message.id, visible)
    }

    /// Remainder of the finished reply, newline-terminated
    pub fn on_finish(&mut self, report: &StreamReport) -> String {
        let mut out = self.advance(&report.message_id, &report.content).unwrap_or_default();
        out.push('\n');
        self.current = None;
        self.printed.clear();
        out
    }

    fn advance(&mut self, id: &MessageId, visible: &str) -> Option<String> {
        if self.current.as_ref() != Some(id) {
            self.current = Some(id.clone());
            self.printed.clear();
        }

        let out = match visible.strip_prefix(self.printed.as_str()) {
            Some(suffix) => suffix.to_string(),
            None => format!("\n{}", visible),
        };
        self.printed.clear();
        self.printed.push_str(visible);

        (!out.is_empty()).then_some(out)
    }
}
