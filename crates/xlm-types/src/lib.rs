//! Foundation types for xlmerge.
//!
//! This crate provides the pure, host-independent pieces of a merge run.
//! Every other xlmerge crate depends on `xlm-types`.
//!
//! # Key Types
//!
//! - [`SheetNameResolver`] - Produces valid, unique worksheet names
//! - [`SourceFile`] - One workbook to merge, in controller enumeration order
//! - [`FileFormat`] - The four supported save formats and their format codes
//! - [`MergeOutcome`] - What happened to a single source file

pub mod error;
pub mod format;
pub mod names;
pub mod outcome;
pub mod source;

pub use error::{NameError, NameResult};
pub use format::FileFormat;
pub use names::{
    names_collide, resolve_sheet_name, sanitize_sheet_name, SheetNameResolver,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_SHEET_NAME, FORBIDDEN_CHARS, MAX_SHEET_NAME_LEN,
};
pub use outcome::{FileOutcome, MergeOutcome};
pub use source::SourceFile;
