use serde::{Deserialize, Serialize};

use crate::source::SourceFile;

/// What happened to a single source file during a merge run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// Every worksheet was copied.
    Merged { sheets: usize },
    /// Copying stopped part-way; `sheets` worksheets made it in.
    Partial { sheets: usize, reason: String },
    /// The file could not be opened or read and contributed nothing.
    Skipped { reason: String },
    /// Cancellation was observed while this file was being processed.
    Aborted { sheets: usize },
}

impl MergeOutcome {
    /// Number of worksheets this file contributed to the destination.
    pub fn sheets_copied(&self) -> usize {
        match self {
            Self::Merged { sheets } | Self::Partial { sheets, .. } | Self::Aborted { sheets } => {
                *sheets
            }
            Self::Skipped { .. } => 0,
        }
    }

    /// Returns `true` if the file was skipped entirely.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// A source file paired with its outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub file: SourceFile,
    pub outcome: MergeOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheets_copied_per_variant() {
        assert_eq!(MergeOutcome::Merged { sheets: 3 }.sheets_copied(), 3);
        assert_eq!(
            MergeOutcome::Partial { sheets: 1, reason: "copy failed".into() }.sheets_copied(),
            1
        );
        assert_eq!(MergeOutcome::Skipped { reason: "locked".into() }.sheets_copied(), 0);
        assert_eq!(MergeOutcome::Aborted { sheets: 2 }.sheets_copied(), 2);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(MergeOutcome::Skipped { reason: "x".into() }).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "x");
    }
}
