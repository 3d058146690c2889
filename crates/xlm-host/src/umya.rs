//! Spreadsheet host backed by `umya-spreadsheet`.
//!
//! Reads and writes Office Open XML workbooks in-process. Legacy `.xls` and
//! binary `.xlsb` sources fail to open and are skipped by the engine; saving
//! is limited to `.xlsx`.

use std::path::{Path, PathBuf};

use tracing::debug;
use umya_spreadsheet::{reader, writer, Spreadsheet};
use xlm_types::FileFormat;

use crate::error::{HostError, HostResult};
use crate::traits::{default_copy_name, validate_rename, SpreadsheetHost};

/// An open workbook inside [`UmyaHost`].
pub struct UmyaWorkbook {
    book: Spreadsheet,
    path: Option<PathBuf>,
}

impl UmyaWorkbook {
    /// The underlying spreadsheet.
    pub fn spreadsheet(&self) -> &Spreadsheet {
        &self.book
    }

    /// Path the workbook was opened from or last saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl std::fmt::Debug for UmyaWorkbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UmyaWorkbook")
            .field("path", &self.path)
            .field("sheets", &self.book.get_sheet_collection_no_check().len())
            .finish()
    }
}

/// In-process host over `umya-spreadsheet`.
#[derive(Debug, Default)]
pub struct UmyaHost {
    _private: (),
}

impl UmyaHost {
    pub fn new() -> Self {
        Self::default()
    }
}

fn names_of(book: &UmyaWorkbook) -> Vec<String> {
    book.book
        .get_sheet_collection_no_check()
        .iter()
        .map(|s| s.get_name().to_string())
        .collect()
}

fn name_at(book: &UmyaWorkbook, index: usize) -> HostResult<String> {
    let names = names_of(book);
    let count = names.len();
    names
        .into_iter()
        .nth(index)
        .ok_or(HostError::SheetOutOfRange { index, count })
}

impl SpreadsheetHost for UmyaHost {
    type Workbook = UmyaWorkbook;

    fn name(&self) -> &'static str {
        "umya"
    }

    fn create_workbook(&mut self) -> HostResult<UmyaWorkbook> {
        Ok(UmyaWorkbook {
            book: umya_spreadsheet::new_file(),
            path: None,
        })
    }

    fn open_workbook(&mut self, path: &Path) -> HostResult<UmyaWorkbook> {
        let book = reader::xlsx::read(path).map_err(|e| HostError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(
            path = %path.display(),
            sheets = book.get_sheet_collection_no_check().len(),
            "opened workbook"
        );
        Ok(UmyaWorkbook {
            book,
            path: Some(path.to_path_buf()),
        })
    }

    fn sheet_names(&self, book: &UmyaWorkbook) -> HostResult<Vec<String>> {
        Ok(names_of(book))
    }

    fn copy_sheet_to_end(
        &mut self,
        source: &UmyaWorkbook,
        index: usize,
        dest: &mut UmyaWorkbook,
    ) -> HostResult<usize> {
        let sheets = source.book.get_sheet_collection_no_check();
        let mut copy = sheets
            .get(index)
            .cloned()
            .ok_or(HostError::SheetOutOfRange {
                index,
                count: sheets.len(),
            })?;
        let name = default_copy_name(&names_of(dest), copy.get_name());
        copy.set_name(name);

        let collection = dest.book.get_sheet_collection_mut();
        collection.push(copy);
        Ok(collection.len() - 1)
    }

    fn rename_sheet(&mut self, book: &mut UmyaWorkbook, index: usize, name: &str) -> HostResult<()> {
        let current = name_at(book, index)?;
        let rename_error = |reason: String| HostError::Rename {
            from: current.clone(),
            to: name.to_string(),
            reason,
        };
        validate_rename(&names_of(book), index, name).map_err(&rename_error)?;
        book.book
            .set_sheet_name(index, name.to_string())
            .map_err(|e| rename_error(e.to_string()))
    }

    fn delete_sheet(&mut self, book: &mut UmyaWorkbook, index: usize) -> HostResult<()> {
        let name = name_at(book, index)?;
        book.book
            .remove_sheet_by_name(&name)
            .map_err(|e| HostError::Delete {
                sheet: name.clone(),
                reason: e.to_string(),
            })
    }

    fn save_as(&mut self, book: &mut UmyaWorkbook, path: &Path, format: FileFormat) -> HostResult<()> {
        if format != FileFormat::Xlsx {
            return Err(HostError::UnsupportedFormat(format));
        }
        writer::xlsx::write(&book.book, path).map_err(|e| HostError::Save {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        book.path = Some(path.to_path_buf());
        Ok(())
    }

    fn close_workbook(&mut self, book: UmyaWorkbook) -> HostResult<()> {
        debug!(path = ?book.path, "closed workbook");
        drop(book);
        Ok(())
    }

    fn quit(&mut self) -> HostResult<()> {
        Ok(())
    }
}
