use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::format::FileFormat;

/// Prefix of lock files spreadsheet applications leave next to open workbooks.
const LOCK_FILE_PREFIX: &str = "~$";

/// A source workbook to merge.
///
/// The list of source files is fixed at run start and processed in the order
/// the controller enumerated it. Filtering temp and lock files is the
/// controller's job; [`SourceFile::is_merge_candidate`] is offered as a helper.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    path: PathBuf,
    display_name: String,
}

impl SourceFile {
    /// Create a source file, deriving its display name from the file name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, display_name }
    }

    /// Full path to the workbook.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Short name shown in progress and log lines.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Parse a newline-delimited file list.
    ///
    /// A leading byte-order mark is ignored, each line is trimmed, and blank
    /// lines are skipped. Order is preserved.
    pub fn parse_list(contents: &str) -> Vec<SourceFile> {
        contents
            .trim_start_matches('\u{feff}')
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(SourceFile::new)
            .collect()
    }

    /// Read and parse a UTF-8 file list from disk.
    pub fn load_list(path: &Path) -> std::io::Result<Vec<SourceFile>> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse_list(&contents))
    }

    /// Whether a path looks like a mergeable workbook: a supported extension
    /// and not an application lock file.
    pub fn is_merge_candidate(path: &Path) -> bool {
        let is_lock = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOCK_FILE_PREFIX));
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(FileFormat::from_extension)
            .is_some();
        supported && !is_lock
    }
}
