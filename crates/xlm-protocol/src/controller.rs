//! Controller side of the control channel.
//!
//! A controller launches the worker, then pumps its stdout on a background
//! thread through a [`ControllerSession`], answering the single save request
//! and finally mapping the exit code with [`RunStatus::from_exit_code`].

use std::io::{BufRead, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::codec::LineCodec;
use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{ExitCode, WorkerMessage, SAVED_LOG_PREFIX};

/// Callbacks invoked as worker lines arrive.
pub trait ControllerHandler {
    fn on_log(&mut self, message: &str);

    fn on_progress(&mut self, current: usize, total: usize, file_name: &str);

    /// Decide where to save. `None` tells the worker not to save.
    fn on_save_request(&mut self, suggested_name: &str) -> Option<PathBuf>;
}

/// What a controller observed over one worker session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Whether the worker asked for a save location.
    pub save_requested: bool,
    /// Path from the worker's save-confirmation log line, if one was seen.
    pub saved_path: Option<String>,
}

/// Pumps worker output and answers the save request.
pub struct ControllerSession<R, W> {
    worker_output: R,
    worker_input: W,
}

impl<R: BufRead, W: Write> ControllerSession<R, W> {
    pub fn new(worker_output: R, worker_input: W) -> Self {
        Self {
            worker_output,
            worker_input,
        }
    }

    /// Process worker lines until the worker closes its output.
    ///
    /// Unrecognized non-blank lines are surfaced as logs, and malformed
    /// progress lines are dropped.
    pub fn run<H: ControllerHandler>(&mut self, handler: &mut H) -> ProtocolResult<SessionSummary> {
        let mut summary = SessionSummary::default();
        let mut line = String::new();

        loop {
            line.clear();
            if self.worker_output.read_line(&mut line)? == 0 {
                break;
            }
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            match LineCodec::decode(text) {
                Ok(WorkerMessage::Log { message }) => {
                    if let Some(path) = message.strip_prefix(SAVED_LOG_PREFIX) {
                        summary.saved_path = Some(path.to_string());
                    }
                    handler.on_log(&message);
                }
                Ok(WorkerMessage::Progress {
                    current,
                    total,
                    file_name,
                }) => handler.on_progress(current, total, &file_name),
                Ok(WorkerMessage::RequestSave { suggested_name }) => {
                    summary.save_requested = true;
                    let answer = handler
                        .on_save_request(&suggested_name)
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    writeln!(self.worker_input, "{answer}")?;
                    self.worker_input.flush()?;
                }
                Err(ProtocolError::Malformed { line, .. }) => {
                    debug!(%line, "dropping malformed worker line");
                }
                Err(_) => handler.on_log(text),
            }
        }

        Ok(summary)
    }
}

/// Final status of a worker run, as the controller reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Saved,
    Cancelled,
    NotSaved,
    Failed { exit_code: i32 },
}

impl RunStatus {
    pub fn from_exit_code(code: i32) -> Self {
        match ExitCode::from_code(code) {
            ExitCode::Success => Self::Saved,
            ExitCode::CancelledDuringMerge => Self::Cancelled,
            ExitCode::CancelledAtSave => Self::NotSaved,
            ExitCode::Failure => Self::Failed { exit_code: code },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Default)]
    struct Recorder {
        logs: Vec<String>,
        progress: Vec<(usize, usize, String)>,
        suggestions: Vec<String>,
        answer: Option<PathBuf>,
    }

    impl ControllerHandler for Recorder {
        fn on_log(&mut self, message: &str) {
            self.logs.push(message.to_string());
        }

        fn on_progress(&mut self, current: usize, total: usize, file_name: &str) {
            self.progress.push((current, total, file_name.to_string()));
        }

        fn on_save_request(&mut self, suggested_name: &str) -> Option<PathBuf> {
            self.suggestions.push(suggested_name.to_string());
            self.answer.clone()
        }
    }

    fn run_session(worker_output: &str, handler: &mut Recorder) -> (SessionSummary, String) {
        let mut reply = Vec::new();
        let summary = {
            let mut session = ControllerSession::new(Cursor::new(worker_output), &mut reply);
            session.run(handler).unwrap()
        };
        (summary, String::from_utf8(reply).unwrap())
    }

    #[test]
    fn full_session_with_save() {
        let output = "LOG|File count: 1\n\
                      PROGRESS|1|1|a.xlsx\n\
                      REQUEST_SAVE|merged.xlsx\n\
                      LOG|Saved: /out/merged.xlsx\n";
        let mut handler = Recorder {
            answer: Some(PathBuf::from("/out/merged.xlsx")),
            ..Default::default()
        };
        let (summary, reply) = run_session(output, &mut handler);

        assert!(summary.save_requested);
        assert_eq!(summary.saved_path.as_deref(), Some("/out/merged.xlsx"));
        assert_eq!(reply, "/out/merged.xlsx\n");
        assert_eq!(handler.progress, vec![(1, 1, "a.xlsx".to_string())]);
        assert_eq!(handler.suggestions, vec!["merged.xlsx"]);
    }

    #[test]
    fn declined_save_writes_blank_line() {
        let mut handler = Recorder::default();
        let (summary, reply) = run_session("REQUEST_SAVE|m.xlsx\n", &mut handler);
        assert!(summary.save_requested);
        assert!(summary.saved_path.is_none());
        assert_eq!(reply, "\n");
    }

    #[test]
    fn stray_lines_become_logs_and_bad_progress_is_dropped() {
        let mut handler = Recorder::default();
        let (_, reply) = run_session("\n  \nsomething odd\nPROGRESS|a|b|c\n", &mut handler);
        assert_eq!(handler.logs, vec!["something odd"]);
        assert!(handler.progress.is_empty());
        assert!(reply.is_empty());
    }

    #[test]
    fn exit_code_mapping() {
        assert_eq!(RunStatus::from_exit_code(0), RunStatus::Saved);
        assert_eq!(RunStatus::from_exit_code(2), RunStatus::Cancelled);
        assert_eq!(RunStatus::from_exit_code(3), RunStatus::NotSaved);
        assert_eq!(RunStatus::from_exit_code(1), RunStatus::Failed { exit_code: 1 });
        assert_eq!(RunStatus::from_exit_code(101), RunStatus::Failed { exit_code: 101 });
    }
}
