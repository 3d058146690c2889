use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown message: {0:?}")]
    UnknownMessage(String),

    #[error("malformed {kind} line: {line:?}")]
    Malformed { kind: &'static str, line: String },

    #[error("save already requested; only one REQUEST_SAVE is allowed per run")]
    SaveAlreadyRequested,

    #[error("control channel closed before a reply arrived")]
    ChannelClosed,

    #[error("no save decision within {0:?}")]
    ReplyTimeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
