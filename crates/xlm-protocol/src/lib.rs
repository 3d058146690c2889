//! Control channel between the merge worker and its controller.
//!
//! The channel is line-oriented: one UTF-8 line per message, newline
//! terminated. The worker streams `LOG|` and `PROGRESS|` lines, emits at most
//! one `REQUEST_SAVE|` line, then blocks for exactly one reply line: a path,
//! or a blank line meaning "do not save". The process exit code carries the
//! terminal status.
//!
//! The wire format is the compatibility surface with existing controllers and
//! must stay stable.

pub mod cancel;
pub mod channel;
pub mod codec;
pub mod controller;
pub mod error;
pub mod memory;
pub mod message;

pub use cancel::CancelFlag;
pub use channel::{ControlChannel, LineChannel};
pub use codec::LineCodec;
pub use controller::{ControllerHandler, ControllerSession, RunStatus, SessionSummary};
pub use error::{ProtocolError, ProtocolResult};
pub use memory::ScriptedChannel;
pub use message::{ExitCode, SaveDecision, WorkerMessage, SAVED_LOG_PREFIX};
