use serde::{Deserialize, Serialize};

/// Prefix of the log line that confirms the destination was written.
///
/// Together with the exit code this is the only load-bearing log content;
/// every other `LOG|` line is advisory.
pub const SAVED_LOG_PREFIX: &str = "Saved: ";

/// Messages the worker sends to its controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerMessage {
    /// Informational or diagnostic text. Never terminal.
    Log { message: String },
    /// About to process file `current` (1-based) of `total`.
    Progress {
        current: usize,
        total: usize,
        file_name: String,
    },
    /// Merge finished; the worker now blocks for one save decision.
    RequestSave { suggested_name: String },
}

impl WorkerMessage {
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Log { .. } => "LOG",
            Self::Progress { .. } => "PROGRESS",
            Self::RequestSave { .. } => "REQUEST_SAVE",
        }
    }
}

/// The controller's single reply to a save request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveDecision {
    /// Save the destination to this path (not yet normalized).
    SaveTo(String),
    /// Do not save.
    Decline,
}

impl SaveDecision {
    /// Interpret a reply line. Blank or whitespace-only means [`Self::Decline`].
    pub fn from_reply_line(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Self::Decline
        } else {
            Self::SaveTo(trimmed.to_string())
        }
    }

    /// Render as a reply line, without the trailing newline.
    pub fn to_reply_line(&self) -> &str {
        match self {
            Self::SaveTo(path) => path,
            Self::Decline => "",
        }
    }
}

/// Worker process exit codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitCode {
    /// Merged and saved.
    Success,
    /// Fatal error, including an empty file list.
    Failure,
    /// Cancellation observed during the merge; nothing was saved.
    CancelledDuringMerge,
    /// The controller declined to save.
    CancelledAtSave,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::CancelledDuringMerge => 2,
            Self::CancelledAtSave => 3,
        }
    }

    /// Map a raw exit status; anything unrecognized is a failure.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            2 => Self::CancelledDuringMerge,
            3 => Self::CancelledAtSave,
            _ => Self::Failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_reply_declines() {
        assert_eq!(SaveDecision::from_reply_line(""), SaveDecision::Decline);
        assert_eq!(SaveDecision::from_reply_line("  \t\r\n"), SaveDecision::Decline);
    }

    #[test]
    fn path_reply_is_trimmed() {
        assert_eq!(
            SaveDecision::from_reply_line("  C:\\out\\merged.xlsx \r\n"),
            SaveDecision::SaveTo("C:\\out\\merged.xlsx".into())
        );
    }

    #[test]
    fn reply_line_rendering() {
        assert_eq!(SaveDecision::SaveTo("/a.xlsx".into()).to_reply_line(), "/a.xlsx");
        assert_eq!(SaveDecision::Decline.to_reply_line(), "");
    }

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Failure.code(), 1);
        assert_eq!(ExitCode::CancelledDuringMerge.code(), 2);
        assert_eq!(ExitCode::CancelledAtSave.code(), 3);
        assert_eq!(ExitCode::from_code(-1), ExitCode::Failure);
        assert_eq!(ExitCode::from_code(3), ExitCode::CancelledAtSave);
    }

    #[test]
    fn type_names() {
        assert_eq!(WorkerMessage::log("x").type_name(), "LOG");
        let msg = WorkerMessage::RequestSave {
            suggested_name: "m.xlsx".into(),
        };
        assert_eq!(msg.type_name(), "REQUEST_SAVE");
    }
}
