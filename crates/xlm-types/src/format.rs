use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A workbook file format the destination can be saved as.
///
/// Each format maps 1:1 to a file extension and to the numeric format code
/// understood by spreadsheet automation hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Office Open XML workbook (`.xlsx`).
    Xlsx,
    /// Macro-enabled Office Open XML workbook (`.xlsm`).
    Xlsm,
    /// Binary workbook (`.xlsb`).
    Xlsb,
    /// Legacy 97-2003 workbook (`.xls`).
    Xls,
}

impl FileFormat {
    /// All supported formats, in table order.
    pub const ALL: [FileFormat; 4] = [Self::Xlsx, Self::Xlsm, Self::Xlsb, Self::Xls];

    /// The host format code used by save-as.
    pub fn code(self) -> i32 {
        match self {
            Self::Xlsx => 51,
            Self::Xlsm => 52,
            Self::Xlsb => 50,
            Self::Xls => 56,
        }
    }

    /// The extension for this format, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Xlsm => "xlsm",
            Self::Xlsb => "xlsb",
            Self::Xls => "xls",
        }
    }

    /// Look up a format by extension (case-insensitive, leading dot optional).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    /// Choose the save format for a target path.
    ///
    /// Unrecognized or missing extensions fall back to [`FileFormat::Xlsx`].
    /// This leniency is deliberate compatibility with existing controllers,
    /// which never validate the extension they send.
    pub fn for_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(Self::Xlsx)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{} ({})", self.extension(), self.code())
    }
}
