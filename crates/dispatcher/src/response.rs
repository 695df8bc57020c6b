//! Response payloads produced by commands and the fallback chain.

use chat_client::Embed;

const NO_RESULT_MESSAGE: &str = "We couldn't find the data you were looking for.\nMake sure you're using proper grammar and query structure where applicable.";

/// Outcome of handling one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The side effect already happened; nothing is sent or correlated.
    NoAction,
    /// A visible reply.
    Reply(Embed),
    /// A failure shown to the user as a labelled error reply.
    Error(ErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Every query strategy failed or none was enabled.
    NoResult,
    UnknownCommand(String),
    CommandFailed(String),
}

impl Response {
    pub fn reply(embed: Embed) -> Self {
        Response::Reply(embed)
    }

    /// Whether delivering this response shows anything in chat.
    pub fn is_visible(&self) -> bool {
        !matches!(self, Response::NoAction)
    }

    /// The embed to deliver, if any.
    pub fn into_embed(self) -> Option<Embed> {
        match self {
            Response::NoAction => None,
            Response::Reply(embed) => Some(embed),
            Response::Error(kind) => Some(kind.to_embed()),
        }
    }
}

impl ErrorKind {
    /// Render as a red error embed.
    pub fn to_embed(&self) -> Embed {
        match self {
            ErrorKind::NoResult => Embed::error("Query Error", NO_RESULT_MESSAGE),
            ErrorKind::UnknownCommand(name) => Embed::error(
                "Command Error",
                format!("Unknown command ``{}``.", name),
            ),
            ErrorKind::CommandFailed(name) => Embed::error(
                "Command Error",
                format!("Something went wrong while running ``{}``.", name),
            ),
        }
    }
}
