use std::path::PathBuf;

use thiserror::Error;
use xlm_host::HostError;
use xlm_protocol::ProtocolError;

/// Errors that end a merge run.
///
/// Per-file and per-sheet failures never surface here; they are logged and
/// recorded in the run's file outcomes instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no input files")]
    NoInputFiles,

    #[error("a merge run is already in progress")]
    AlreadyRunning,

    #[error("spreadsheet host error: {0}")]
    Host(#[from] HostError),

    #[error("save to {path} failed: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: HostError,
    },

    #[error("invalid save path {path:?}: {reason}")]
    InvalidSavePath { path: String, reason: String },

    #[error("control channel error: {0}")]
    Channel(#[from] ProtocolError),

    #[error("cannot read file list: {0}")]
    FileList(#[source] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
