use std::str::FromStr;

use feynman_types::ChatMode;

use crate::error::AppError;

pub const HELP: &str = "\
Commands:
  /new              start a new conversation
  /threads          reload and list conversations
  /open <id>        open a conversation
  /delete <id>      delete a conversation
  /search <text>    find conversations by title
  /mode <standard|feynman>
  /attach <path>    attach a file to the next message
  /import <url>     fetch a lecture transcript
  /cancel           stop the streaming reply
  /help
  /quit
Anything else is sent as a message. Ctrl-C stops a streaming reply,
or exits when nothing is streaming.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    New,
    Threads,
    Open(String),
    Delete(String),
    Search(String),
    Mode(ChatMode),
    Attach(String),
    Import(String),
    Cancel,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = AppError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let Some(rest) = line.trim().strip_prefix('/') else {
            return Ok(Command::Send(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let required = |what: &str| {
            if arg.is_empty() {
                Err(AppError::InvalidCommand(format!("/{} needs {}", name, what)))
            } else {
                Ok(arg.to_string())
            }
        };

        match name {
            "new" => Ok(Command::New),
            "threads" => Ok(Command::Threads),
            "open" => required("a conversation id").map(Command::Open),
            "delete" => required("a conversation id").map(Command::Delete),
            "search" => Ok(Command::Search(arg.to_string())),
            "mode" => match arg {
                "standard" => Ok(Command::Mode(ChatMode::Standard)),
                "feynman" => Ok(Command::Mode(ChatMode::Feynman)),
                other => Err(AppError::InvalidCommand(format!("unknown mode '{}'", other))),
            },
            "attach" => required("a file path").map(Command::Attach),
            "import" => required("a lecture URL").map(Command::Import),
            "cancel" => Ok(Command::Cancel),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(AppError::InvalidCommand(format!("unknown command /{}", other))),
        }
    }
}
