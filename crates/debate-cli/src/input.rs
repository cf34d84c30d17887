//! Stdin line parsing.
//!
//! Plain text is a chat message. Lines starting with `/` are commands:
//!
//! | Line | Effect |
//! |------|--------|
//! | `/typing on` or `/typing off` | typing indicator |
//! | `/react <message id> <emoji>` | reaction |
//! | `/image <url> [caption]` | message with image |
//! | `/join` | announce presence |
//! | `/connect`, `/disconnect` | socket lifecycle |
//! | `/quit` | disconnect and exit |

use debate_client::Command;
use thiserror::Error;

/// A parsed stdin line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank line.
    Empty,
    /// Send a chat message.
    Say(String),
    /// Start or stop typing.
    Typing(bool),
    /// React to a message.
    React {
        /// Target message.
        message_id: u64,
        /// Reaction emoji.
        emoji: String,
    },
    /// Send an image with an optional caption.
    Image {
        /// Uploaded image location.
        url: String,
        /// Caption, possibly empty.
        caption: String,
    },
    /// Announce presence.
    Join,
    /// Open the session socket.
    Connect,
    /// Close the session socket.
    Disconnect,
    /// Exit.
    Quit,
}

/// Why a command line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// The command name is not known.
    #[error("unknown command /{0}")]
    UnknownCommand(String),

    /// The command's arguments do not fit its usage.
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl Input {
    /// Parse one line.
    pub fn parse(line: &str) -> Result<Self, InputError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }
        let Some(command) = line.strip_prefix('/') else {
            return Ok(Self::Say(line.to_owned()));
        };

        let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
        let rest = rest.trim();
        match name {
            "typing" => match rest {
                "on" => Ok(Self::Typing(true)),
                "off" => Ok(Self::Typing(false)),
                _ => Err(InputError::Usage("/typing on|off")),
            },
            "react" => {
                const USAGE: &str = "/react <message id> <emoji>";
                let (id, emoji) =
                    rest.split_once(char::is_whitespace).ok_or(InputError::Usage(USAGE))?;
                let message_id = id.parse().map_err(|_| InputError::Usage(USAGE))?;
                Ok(Self::React { message_id, emoji: emoji.trim().to_owned() })
            },
            "image" => {
                if rest.is_empty() {
                    return Err(InputError::Usage("/image <url> [caption]"));
                }
                let (url, caption) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                Ok(Self::Image { url: url.to_owned(), caption: caption.trim().to_owned() })
            },
            "join" => Ok(Self::Join),
            "connect" => Ok(Self::Connect),
            "disconnect" => Ok(Self::Disconnect),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(InputError::UnknownCommand(other.to_owned())),
        }
    }

    /// Runtime command for this input. `Empty` maps to nothing.
    pub fn into_command(self) -> Option<Command> {
        match self {
            Self::Empty => None,
            Self::Say(message) => Some(Command::SendMessage(message)),
            Self::Typing(typing) => Some(Command::SendTyping(typing)),
            Self::React { message_id, emoji } => Some(Command::SendReaction { message_id, emoji }),
            Self::Image { url, caption } => {
                Some(Command::SendMessageWithImage { message: caption, image_url: url })
            },
            Self::Join => Some(Command::SendJoin),
            Self::Connect => Some(Command::Connect),
            Self::Disconnect => Some(Command::Disconnect),
            Self::Quit => Some(Command::Shutdown),
        }
    }
}
