use std::path::Path;

use xlm_types::names::{names_collide, FORBIDDEN_CHARS, MAX_SHEET_NAME_LEN};
use xlm_types::FileFormat;

use crate::error::HostResult;

/// A full-featured spreadsheet engine, reduced to the operations a merge needs.
///
/// All implementations must satisfy these invariants:
/// - Source workbooks are opened read-only and without prompting; they are
///   never written back.
/// - [`Self::copy_sheet_to_end`] appends the copy as the last worksheet of the
///   destination and returns its index.
/// - A freshly created workbook contains the host's default worksheet set.
/// - Worksheet indices are zero-based and in document order.
pub trait SpreadsheetHost {
    /// Handle to an open workbook.
    type Workbook;

    /// Short backend name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Create a new, unsaved workbook with the host's default worksheets.
    fn create_workbook(&mut self) -> HostResult<Self::Workbook>;

    /// Open an existing workbook read-only and non-interactively.
    fn open_workbook(&mut self, path: &Path) -> HostResult<Self::Workbook>;

    /// Names of all worksheets, in document order.
    fn sheet_names(&self, book: &Self::Workbook) -> HostResult<Vec<String>>;

    /// Copy worksheet `index` of `source` to the end of `dest`.
    ///
    /// Returns the index of the copy inside `dest`.
    fn copy_sheet_to_end(
        &mut self,
        source: &Self::Workbook,
        index: usize,
        dest: &mut Self::Workbook,
    ) -> HostResult<usize>;

    /// Rename worksheet `index`.
    fn rename_sheet(&mut self, book: &mut Self::Workbook, index: usize, name: &str)
        -> HostResult<()>;

    /// Delete worksheet `index`.
    fn delete_sheet(&mut self, book: &mut Self::Workbook, index: usize) -> HostResult<()>;

    /// Write the workbook to `path` in the given format.
    fn save_as(
        &mut self,
        book: &mut Self::Workbook,
        path: &Path,
        format: FileFormat,
    ) -> HostResult<()>;

    /// Close a workbook without saving changes.
    fn close_workbook(&mut self, book: Self::Workbook) -> HostResult<()>;

    /// Release the host itself. Called once, after every workbook is closed.
    fn quit(&mut self) -> HostResult<()>;

    /// Number of worksheets in the workbook.
    ///
    /// Default implementation counts [`Self::sheet_names`].
    fn sheet_count(&self, book: &Self::Workbook) -> HostResult<usize> {
        Ok(self.sheet_names(book)?.len())
    }
}

/// Name a host gives a copied worksheet before the engine renames it.
///
/// Mirrors the spreadsheet-application convention: the source name if it is
/// free, otherwise `Name (2)`, `Name (3)`, ... truncated to fit.
pub fn default_copy_name(existing: &[String], name: &str) -> String {
    let taken = |candidate: &str| existing.iter().any(|e| names_collide(e, candidate));
    if !taken(name) {
        return name.to_string();
    }
    let mut n = 2usize;
    loop {
        let suffix = format!(" ({n})");
        let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
        let base: String = name.chars().take(room).collect();
        let candidate = format!("{base}{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Check a rename the way a spreadsheet application would.
///
/// Returns the rejection reason, if any. `names` is the workbook's current
/// worksheet list and `index` the worksheet being renamed.
pub fn validate_rename(names: &[String], index: usize, new_name: &str) -> Result<(), String> {
    if new_name.is_empty() {
        return Err("name must not be empty".into());
    }
    if new_name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(format!("name exceeds {MAX_SHEET_NAME_LEN} characters"));
    }
    if let Some(ch) = new_name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(format!("name contains forbidden character {ch:?}"));
    }
    let clash = names
        .iter()
        .enumerate()
        .any(|(i, existing)| i != index && names_collide(existing, new_name));
    if clash {
        return Err("a worksheet with that name already exists".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn copy_name_free() {
        assert_eq!(default_copy_name(&names(&["Sheet1"]), "Data"), "Data");
    }

    #[test]
    fn copy_name_clash_uses_parenthesized_counter() {
        assert_eq!(default_copy_name(&names(&["Data"]), "Data"), "Data (2)");
        assert_eq!(
            default_copy_name(&names(&["Data", "data (2)"]), "Data"),
            "Data (3)"
        );
    }

    #[test]
    fn copy_name_respects_length_limit() {
        let long = "L".repeat(31);
        let copy = default_copy_name(&[long.clone()], &long);
        assert_eq!(copy.chars().count(), 31);
        assert!(copy.ends_with(" (2)"));
    }

    #[test]
    fn rename_rules() {
        let list = names(&["Sheet1", "Data"]);
        assert!(validate_rename(&list, 1, "Data").is_ok());
        assert!(validate_rename(&list, 1, "Summary").is_ok());
        assert!(validate_rename(&list, 1, "sheet1").is_err());
        assert!(validate_rename(&list, 1, "").is_err());
        assert!(validate_rename(&list, 1, "a/b").is_err());
        assert!(validate_rename(&list, 1, &"x".repeat(32)).is_err());
    }
}
