use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;
use xlm_types::names::names_collide;
use xlm_types::FileFormat;

use crate::error::{HostError, HostResult};
use crate::traits::{default_copy_name, validate_rename, SpreadsheetHost};

/// A worksheet held in memory: a name and a grid of cell text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemorySheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl MemorySheet {
    /// An empty worksheet.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// A worksheet with a single cell of content, handy for tracing copies.
    pub fn with_cell(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: vec![vec![value.into()]],
        }
    }
}

/// An open workbook inside [`InMemoryHost`].
#[derive(Clone, Debug)]
pub struct MemoryWorkbook {
    id: u64,
    path: Option<PathBuf>,
    sheets: Vec<MemorySheet>,
}

impl MemoryWorkbook {
    /// Worksheets currently in the workbook.
    pub fn sheets(&self) -> &[MemorySheet] {
        &self.sheets
    }

    /// Path the workbook was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// A snapshot of a workbook written by [`SpreadsheetHost::save_as`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedWorkbook {
    pub path: PathBuf,
    pub format: FileFormat,
    pub sheets: Vec<MemorySheet>,
}

impl SavedWorkbook {
    /// Worksheet names in document order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Scripted spreadsheet host for tests and dry runs.
///
/// Source workbooks are registered up front; failures can be injected per
/// file, per worksheet, per rename target, or for the whole host. Every
/// lifecycle call is recorded so tests can assert on teardown.
pub struct InMemoryHost {
    files: HashMap<PathBuf, Vec<MemorySheet>>,
    initial_sheets: Vec<String>,
    failing_opens: HashSet<PathBuf>,
    failing_copies: HashSet<String>,
    rejected_names: HashSet<String>,
    save_failure: Option<String>,
    unavailable: bool,
    next_id: u64,
    open_ids: BTreeSet<u64>,
    created: usize,
    closed: usize,
    quit_calls: usize,
    saved: Vec<SavedWorkbook>,
}

impl InMemoryHost {
    /// Create a host whose new workbooks start with a single `Sheet1`.
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
            initial_sheets: vec!["Sheet1".to_string()],
            failing_opens: HashSet::new(),
            failing_copies: HashSet::new(),
            rejected_names: HashSet::new(),
            save_failure: None,
            unavailable: false,
            next_id: 1,
            open_ids: BTreeSet::new(),
            created: 0,
            closed: 0,
            quit_calls: 0,
            saved: Vec::new(),
        }
    }

    /// Replace the default worksheet set of new workbooks.
    pub fn with_initial_sheets(mut self, names: &[&str]) -> Self {
        self.initial_sheets = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Register a source workbook with empty worksheets of the given names.
    pub fn with_file(self, path: impl Into<PathBuf>, sheets: &[&str]) -> Self {
        let sheets = sheets.iter().map(|n| MemorySheet::named(*n)).collect();
        self.with_workbook(path, sheets)
    }

    /// Register a source workbook with explicit worksheet content.
    pub fn with_workbook(mut self, path: impl Into<PathBuf>, sheets: Vec<MemorySheet>) -> Self {
        self.files.insert(path.into(), sheets);
        self
    }

    /// Make opening `path` fail even if it is registered.
    pub fn fail_open(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing_opens.insert(path.into());
        self
    }

    /// Make copying any source worksheet named `sheet` fail.
    pub fn fail_copy(mut self, sheet: impl Into<String>) -> Self {
        self.failing_copies.insert(sheet.into());
        self
    }

    /// Make every rename to `name` fail, as a host-specific refusal.
    pub fn reject_name(mut self, name: impl Into<String>) -> Self {
        self.rejected_names.insert(name.into());
        self
    }

    /// Make every save fail with `reason`.
    pub fn fail_save(mut self, reason: impl Into<String>) -> Self {
        self.save_failure = Some(reason.into());
        self
    }

    /// Simulate the host process becoming unreachable.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Workbooks written so far, in save order.
    pub fn saved(&self) -> &[SavedWorkbook] {
        &self.saved
    }

    /// Number of workbooks created with [`SpreadsheetHost::create_workbook`].
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Number of workbooks closed.
    pub fn closed_count(&self) -> usize {
        self.closed
    }

    /// Number of workbooks opened or created but not yet closed.
    pub fn open_count(&self) -> usize {
        self.open_ids.len()
    }

    /// Number of times [`SpreadsheetHost::quit`] was called.
    pub fn quit_count(&self) -> usize {
        self.quit_calls
    }

    fn ensure_available(&self) -> HostResult<()> {
        if self.unavailable {
            return Err(HostError::Unavailable("in-memory host marked unavailable".into()));
        }
        Ok(())
    }

    fn issue(&mut self, path: Option<PathBuf>, sheets: Vec<MemorySheet>) -> MemoryWorkbook {
        let id = self.next_id;
        self.next_id += 1;
        self.open_ids.insert(id);
        MemoryWorkbook { id, path, sheets }
    }
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryHost")
            .field("files", &self.files.len())
            .field("open", &self.open_ids.len())
            .field("saved", &self.saved.len())
            .finish()
    }
}

fn sheet_at(book: &MemoryWorkbook, index: usize) -> HostResult<&MemorySheet> {
    book.sheets.get(index).ok_or(HostError::SheetOutOfRange {
        index,
        count: book.sheets.len(),
    })
}

fn names_of(book: &MemoryWorkbook) -> Vec<String> {
    book.sheets.iter().map(|s| s.name.clone()).collect()
}

impl SpreadsheetHost for InMemoryHost {
    type Workbook = MemoryWorkbook;

    fn name(&self) -> &'static str {
        "memory"
    }

    fn create_workbook(&mut self) -> HostResult<MemoryWorkbook> {
        self.ensure_available()?;
        self.created += 1;
        let sheets = self
            .initial_sheets
            .iter()
            .map(|n| MemorySheet::named(n.clone()))
            .collect();
        Ok(self.issue(None, sheets))
    }

    fn open_workbook(&mut self, path: &Path) -> HostResult<MemoryWorkbook> {
        self.ensure_available()?;
        if self.failing_opens.contains(path) {
            return Err(HostError::Open {
                path: path.to_path_buf(),
                reason: "file is corrupt or locked".into(),
            });
        }
        let sheets = self.files.get(path).cloned().ok_or_else(|| HostError::Open {
            path: path.to_path_buf(),
            reason: "file not found".into(),
        })?;
        debug!(path = %path.display(), sheets = sheets.len(), "opened in-memory workbook");
        Ok(self.issue(Some(path.to_path_buf()), sheets))
    }

    fn sheet_names(&self, book: &MemoryWorkbook) -> HostResult<Vec<String>> {
        self.ensure_available()?;
        Ok(names_of(book))
    }

    fn copy_sheet_to_end(
        &mut self,
        source: &MemoryWorkbook,
        index: usize,
        dest: &mut MemoryWorkbook,
    ) -> HostResult<usize> {
        self.ensure_available()?;
        let sheet = sheet_at(source, index)?;
        if self.failing_copies.contains(&sheet.name) {
            return Err(HostError::Copy {
                sheet: sheet.name.clone(),
                reason: "injected copy failure".into(),
            });
        }
        let mut copy = sheet.clone();
        copy.name = default_copy_name(&names_of(dest), &sheet.name);
        dest.sheets.push(copy);
        Ok(dest.sheets.len() - 1)
    }

    fn rename_sheet(&mut self, book: &mut MemoryWorkbook, index: usize, name: &str) -> HostResult<()> {
        self.ensure_available()?;
        let current = sheet_at(book, index)?.name.clone();
        let refused = self.rejected_names.iter().any(|r| names_collide(r, name));
        let verdict = if refused {
            Err("host refused the name".to_string())
        } else {
            validate_rename(&names_of(book), index, name)
        };
        if let Err(reason) = verdict {
            return Err(HostError::Rename {
                from: current,
                to: name.to_string(),
                reason,
            });
        }
        book.sheets[index].name = name.to_string();
        Ok(())
    }

    fn delete_sheet(&mut self, book: &mut MemoryWorkbook, index: usize) -> HostResult<()> {
        self.ensure_available()?;
        let name = sheet_at(book, index)?.name.clone();
        if book.sheets.len() <= 1 {
            return Err(HostError::Delete {
                sheet: name,
                reason: "a workbook must contain at least one worksheet".into(),
            });
        }
        book.sheets.remove(index);
        Ok(())
    }

    fn save_as(&mut self, book: &mut MemoryWorkbook, path: &Path, format: FileFormat) -> HostResult<()> {
        self.ensure_available()?;
        if let Some(reason) = &self.save_failure {
            return Err(HostError::Save {
                path: path.to_path_buf(),
                reason: reason.clone(),
            });
        }
        self.saved.push(SavedWorkbook {
            path: path.to_path_buf(),
            format,
            sheets: book.sheets.clone(),
        });
        book.path = Some(path.to_path_buf());
        Ok(())
    }

    fn close_workbook(&mut self, book: MemoryWorkbook) -> HostResult<()> {
        // Closing is allowed even when unavailable so teardown stays observable.
        if self.open_ids.remove(&book.id) {
            self.closed += 1;
        }
        Ok(())
    }

    fn quit(&mut self) -> HostResult<()> {
        self.quit_calls += 1;
        Ok(())
    }
}
