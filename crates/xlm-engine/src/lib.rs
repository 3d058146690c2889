//! Merge orchestration for xlmerge.
//!
//! A run creates one destination workbook, copies every worksheet of every
//! source file into it in order, resolves name collisions, prunes the
//! destination's initial sheets, and then negotiates the save target with the
//! controller over a [`ControlChannel`](xlm_protocol::ControlChannel).
//!
//! # Run states
//!
//! ```text
//! Init -> OpeningDestination -> ForEachFile { OpeningSource -> ForEachSheet { Copying -> Renaming } -> ClosingSource }
//!      -> PruningInitialSheets -> RequestingSave -> Saving -> Completed | CancelledAtSave
//! ```
//!
//! Cancellation is polled before each file and before each sheet and leads
//! straight to teardown without a save request. Teardown (closing the
//! destination and releasing the host) runs on every exit path.

pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod lock;
pub mod save;

pub use cancel::{CancellationSignal, CancellationToken, NeverCancelled};
pub use config::EngineConfig;
pub use engine::{MergeEngine, MergeRequest, RunReport, RunResult};
pub use error::{EngineError, EngineResult};
pub use lock::{RunGuard, RunLock};
