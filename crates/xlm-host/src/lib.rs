//! Spreadsheet engine capability for xlmerge.
//!
//! The merge engine never talks to a spreadsheet application directly. It
//! drives an implementation of [`SpreadsheetHost`], which exposes the handful
//! of workbook operations a merge needs: open, create, enumerate, copy,
//! rename, delete, save-as, close.
//!
//! # Backends
//!
//! - [`InMemoryHost`] - scripted fake with failure injection, for tests
//! - [`UmyaHost`] - reads and writes real `.xlsx` files via `umya-spreadsheet`
//!
//! # Design Rules
//!
//! 1. Hosts are single-threaded and mutated in place; every call takes `&mut self`.
//! 2. A copied worksheet is always appended at the end of the destination.
//! 3. A copy never fails because of a name clash: the host assigns an
//!    application-style default name (`Name (2)`) that the engine replaces.
//! 4. Only [`HostError::Unavailable`] is fatal; everything else is scoped to
//!    the workbook or worksheet it names.

pub mod error;
pub mod memory;
pub mod traits;
pub mod umya;

pub use error::{HostError, HostResult};
pub use memory::{InMemoryHost, MemorySheet, MemoryWorkbook, SavedWorkbook};
pub use traits::{default_copy_name, validate_rename, SpreadsheetHost};
pub use umya::{UmyaHost, UmyaWorkbook};
