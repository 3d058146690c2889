use std::path::PathBuf;

use xlm_types::FileFormat;

/// Errors raised by a spreadsheet host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// A workbook could not be opened.
    #[error("cannot open {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    /// A worksheet index does not exist in the workbook.
    #[error("worksheet index {index} out of range ({count} worksheets)")]
    SheetOutOfRange { index: usize, count: usize },

    /// A worksheet could not be copied.
    #[error("cannot copy worksheet {sheet:?}: {reason}")]
    Copy { sheet: String, reason: String },

    /// The host refused a new worksheet name.
    #[error("cannot rename worksheet {from:?} to {to:?}: {reason}")]
    Rename {
        from: String,
        to: String,
        reason: String,
    },

    /// A worksheet could not be deleted.
    #[error("cannot delete worksheet {sheet:?}: {reason}")]
    Delete { sheet: String, reason: String },

    /// Writing the workbook failed.
    #[error("cannot save to {path}: {reason}")]
    Save { path: PathBuf, reason: String },

    /// The host cannot write this format.
    #[error("format {0} is not supported by this host")]
    UnsupportedFormat(FileFormat),

    /// The host itself stopped responding. Fatal for the whole run.
    #[error("spreadsheet host unavailable: {0}")]
    Unavailable(String),

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostError {
    /// Returns `true` if the error means the host can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result alias for host operations.
pub type HostResult<T> = Result<T, HostError>;
