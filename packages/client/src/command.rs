//! Parsing of prompt input.
//!
//! Lines starting with `/` are commands; anything else is a chat message.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Chat(String),
    /// `/call`: ask the relay for the first available peer
    Call,
    /// `/accept [connectionId]`: without an id, accepts the last incoming call
    Accept(Option<String>),
    Hangup,
    Leave,
    Who,
    Help,
    Quit,
    Unknown(String),
}

impl InputCommand {
    /// Parse one input line; blank lines yield `None`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Some(InputCommand::Chat(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let command = match name {
            "call" => InputCommand::Call,
            "accept" => InputCommand::Accept(parts.next().map(str::to_string)),
            "hangup" => InputCommand::Hangup,
            "leave" => InputCommand::Leave,
            "who" => InputCommand::Who,
            "help" => InputCommand::Help,
            "quit" | "exit" => InputCommand::Quit,
            other => InputCommand::Unknown(other.to_string()),
        };
        Some(command)
    }
}

pub const HELP: &str = "\
Commands:
  /call                 call the first available member
  /accept [id]          accept an incoming call (defaults to the last caller)
  /hangup               end the current call
  /leave                leave the room
  /who                  list room members
  /quit                 exit
Anything else is sent as a chat message.
";
