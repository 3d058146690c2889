use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use xlm_host::{HostError, SpreadsheetHost};
use xlm_protocol::{ControlChannel, ExitCode, SaveDecision, SAVED_LOG_PREFIX};
use xlm_types::{FileFormat, FileOutcome, MergeOutcome, SheetNameResolver, SourceFile};

use crate::cancel::CancellationSignal;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::lock::RunGuard;
use crate::save;

/// Input to one merge run. The file list is fixed for the run's lifetime.
#[derive(Clone, Debug, Default)]
pub struct MergeRequest {
    pub files: Vec<SourceFile>,
    /// Name to propose at save time instead of a generated one.
    pub suggested_name: Option<String>,
}

impl MergeRequest {
    pub fn new(files: Vec<SourceFile>) -> Self {
        Self {
            files,
            suggested_name: None,
        }
    }

    pub fn with_suggested_name(mut self, name: impl Into<String>) -> Self {
        self.suggested_name = Some(name.into());
        self
    }
}

/// Terminal state of a merge run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RunResult {
    /// Merged and written to this path.
    Completed(PathBuf),
    /// Cancellation was observed before the save request.
    CancelledDuringMerge,
    /// The controller declined to save.
    CancelledAtSave,
    /// The run hit a fatal error.
    Failed(String),
}

impl RunResult {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Completed(_) => ExitCode::Success,
            Self::CancelledDuringMerge => ExitCode::CancelledDuringMerge,
            Self::CancelledAtSave => ExitCode::CancelledAtSave,
            Self::Failed(_) => ExitCode::Failure,
        }
    }
}

/// Everything a caller learns about a finished run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub result: RunResult,
    /// One entry per source file reached, in processing order.
    pub outcomes: Vec<FileOutcome>,
}

impl RunReport {
    pub fn exit_code(&self) -> ExitCode {
        self.result.exit_code()
    }

    /// Total worksheets copied into the destination.
    pub fn sheets_copied(&self) -> usize {
        self.outcomes.iter().map(|o| o.outcome.sheets_copied()).sum()
    }
}

/// Copies every worksheet of every source file into one destination workbook.
///
/// Per-file and per-sheet failures are logged and the run continues. Only
/// host-level faults, channel failures and save failures end a run early,
/// and the destination workbook and host are released on every path.
pub struct MergeEngine<H: SpreadsheetHost> {
    host: H,
    config: EngineConfig,
    resolver: SheetNameResolver,
}

impl<H: SpreadsheetHost> MergeEngine<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, EngineConfig::default())
    }

    pub fn with_config(host: H, config: EngineConfig) -> Self {
        let resolver = SheetNameResolver::with_max_attempts(config.max_name_attempts);
        Self {
            host,
            config,
            resolver,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute one merge run.
    ///
    /// Holding `_guard` proves the caller owns the run lock.
    pub fn run<C, S>(
        &mut self,
        _guard: &RunGuard<'_>,
        request: &MergeRequest,
        channel: &mut C,
        cancel: &S,
    ) -> RunReport
    where
        C: ControlChannel,
        S: CancellationSignal + ?Sized,
    {
        let run_id = Uuid::now_v7();
        let span = info_span!(
            "merge_run",
            %run_id,
            host = self.host.name(),
            files = request.files.len()
        );
        let _enter = span.enter();

        let mut outcomes = Vec::with_capacity(request.files.len());
        let result = match self.execute(request, channel, cancel, &mut outcomes) {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "merge run failed");
                // The channel may be the thing that broke.
                let _ = channel.log(&format!("[ERROR] {e}"));
                RunResult::Failed(e.to_string())
            }
        };
        info!(result = ?result, "merge run finished");

        RunReport {
            run_id,
            result,
            outcomes,
        }
    }

    fn execute<C, S>(
        &mut self,
        request: &MergeRequest,
        channel: &mut C,
        cancel: &S,
        outcomes: &mut Vec<FileOutcome>,
    ) -> EngineResult<RunResult>
    where
        C: ControlChannel,
        S: CancellationSignal + ?Sized,
    {
        if request.files.is_empty() {
            return Err(EngineError::NoInputFiles);
        }
        channel.log(&format!("File count: {}", request.files.len()))?;

        let mut dest = match self.host.create_workbook() {
            Ok(book) => book,
            Err(e) => {
                self.quit_host();
                return Err(e.into());
            }
        };

        let result = self.merge_and_save(&mut dest, request, channel, cancel, outcomes);

        if let Err(e) = self.host.close_workbook(dest) {
            warn!(error = %e, "failed to close destination workbook");
        }
        self.quit_host();
        result
    }

    fn quit_host(&mut self) {
        if let Err(e) = self.host.quit() {
            warn!(error = %e, "failed to release spreadsheet host");
        }
    }

    fn merge_and_save<C, S>(
        &mut self,
        dest: &mut H::Workbook,
        request: &MergeRequest,
        channel: &mut C,
        cancel: &S,
        outcomes: &mut Vec<FileOutcome>,
    ) -> EngineResult<RunResult>
    where
        C: ControlChannel,
        S: CancellationSignal + ?Sized,
    {
        let initial_sheets = self.host.sheet_names(dest)?;
        let total = request.files.len();
        let mut copied = 0usize;

        for (i, file) in request.files.iter().enumerate() {
            if cancel.is_cancelled() {
                return cancelled(channel);
            }
            channel.progress(i + 1, total, file.display_name())?;

            let outcome = self.merge_file(file, dest, channel, cancel)?;
            copied += outcome.sheets_copied();
            let aborted = matches!(outcome, MergeOutcome::Aborted { .. });
            outcomes.push(FileOutcome {
                file: file.clone(),
                outcome,
            });
            if aborted {
                return cancelled(channel);
            }
        }

        if cancel.is_cancelled() {
            return cancelled(channel);
        }

        if copied > 0 {
            self.prune_initial_sheets(dest, &initial_sheets, channel)?;
        } else {
            channel.log("[WARN] No worksheets were copied.")?;
        }

        self.negotiate_save(dest, request, channel)
    }

    fn merge_file<C, S>(
        &mut self,
        file: &SourceFile,
        dest: &mut H::Workbook,
        channel: &mut C,
        cancel: &S,
    ) -> EngineResult<MergeOutcome>
    where
        C: ControlChannel,
        S: CancellationSignal + ?Sized,
    {
        channel.log(&format!("Opening: {}", file.display_name()))?;
        let source = match self.host.open_workbook(file.path()) {
            Ok(book) => book,
            Err(e) => return skip_file(file, e, channel),
        };

        let result = self.copy_sheets(file, &source, dest, channel, cancel);

        if let Err(e) = self.host.close_workbook(source) {
            warn!(file = %file.path().display(), error = %e, "failed to close source workbook");
        }
        result
    }

    fn copy_sheets<C, S>(
        &mut self,
        file: &SourceFile,
        source: &H::Workbook,
        dest: &mut H::Workbook,
        channel: &mut C,
        cancel: &S,
    ) -> EngineResult<MergeOutcome>
    where
        C: ControlChannel,
        S: CancellationSignal + ?Sized,
    {
        let names = match self.host.sheet_names(source) {
            Ok(names) => names,
            Err(e) => return skip_file(file, e, channel),
        };

        let mut copied = 0usize;
        for (index, name) in names.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(MergeOutcome::Aborted { sheets: copied });
            }

            let dest_index = match self.host.copy_sheet_to_end(source, index, dest) {
                Ok(i) => i,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    warn!(file = %file.display_name(), sheet = %name, error = %e, "copy failed");
                    channel.log(&format!(
                        "[WARN] Failed to copy '{name}' from {}: {e}",
                        file.display_name()
                    ))?;
                    return Ok(MergeOutcome::Partial {
                        sheets: copied,
                        reason: e.to_string(),
                    });
                }
            };
            copied += 1;

            let final_name = self.name_copied_sheet(dest, dest_index, name, channel)?;
            channel.log(&format!("  Copied: {name} -> {final_name}"))?;
        }

        Ok(MergeOutcome::Merged { sheets: copied })
    }

    /// Give the sheet at `index` a unique name derived from `desired`.
    ///
    /// Returns the name the sheet ends up with. A refused rename is retried
    /// once with `<desired>_copy`; after that the host-assigned name stays.
    fn name_copied_sheet<C: ControlChannel>(
        &mut self,
        dest: &mut H::Workbook,
        index: usize,
        desired: &str,
        channel: &mut C,
    ) -> EngineResult<String> {
        let names = self.host.sheet_names(dest)?;
        let current = names
            .get(index)
            .cloned()
            .ok_or(HostError::SheetOutOfRange {
                index,
                count: names.len(),
            })?;
        let others = || {
            names
                .iter()
                .enumerate()
                .filter(move |(i, _)| *i != index)
                .map(|(_, n)| n.as_str())
        };

        let mut last_error = None;
        for attempt in [desired.to_string(), format!("{desired}_copy")] {
            let candidate = match self.resolver.resolve(others(), &attempt) {
                Ok(candidate) => candidate,
                Err(e) => {
                    error!(sheet = %desired, error = %e, "no free worksheet name");
                    channel.log(&format!("[ERROR] {e}; keeping '{current}'"))?;
                    return Ok(current);
                }
            };
            if candidate == current {
                return Ok(current);
            }
            match self.host.rename_sheet(dest, index, &candidate) {
                Ok(()) => {
                    debug!(from = %current, to = %candidate, "renamed copied worksheet");
                    return Ok(candidate);
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    warn!(sheet = %current, candidate = %candidate, error = %e, "rename refused");
                    last_error = Some(e);
                }
            }
        }

        if let Some(e) = last_error {
            channel.log(&format!("[ERROR] Could not rename '{current}': {e}"))?;
        }
        Ok(current)
    }

    /// Delete the destination's initial sheets, keeping at least one sheet.
    fn prune_initial_sheets<C: ControlChannel>(
        &mut self,
        dest: &mut H::Workbook,
        initial: &[String],
        channel: &mut C,
    ) -> EngineResult<()> {
        for name in initial {
            let names = self.host.sheet_names(dest)?;
            if names.len() <= 1 {
                break;
            }
            let Some(index) = names.iter().position(|n| n == name) else {
                continue;
            };
            match self.host.delete_sheet(dest, index) {
                Ok(()) => debug!(sheet = %name, "removed initial worksheet"),
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    warn!(sheet = %name, error = %e, "could not remove initial worksheet");
                    channel.log(&format!("[WARN] Could not remove '{name}': {e}"))?;
                }
            }
        }
        Ok(())
    }

    fn negotiate_save<C: ControlChannel>(
        &mut self,
        dest: &mut H::Workbook,
        request: &MergeRequest,
        channel: &mut C,
    ) -> EngineResult<RunResult> {
        let suggested = save::suggested_name(
            &self.config,
            request.suggested_name.as_deref(),
            &request.files,
            Local::now(),
        );
        info!(%suggested, "requesting save location");

        let raw = match channel.request_save(&suggested)? {
            SaveDecision::SaveTo(raw) => raw,
            SaveDecision::Decline => {
                info!("controller declined to save");
                channel.log("Save cancelled.")?;
                return Ok(RunResult::CancelledAtSave);
            }
        };

        let cwd = std::env::current_dir().map_err(|e| EngineError::InvalidSavePath {
            path: raw.clone(),
            reason: format!("cannot resolve working directory: {e}"),
        })?;
        let path = save::normalize_save_path(&raw, self.config.extension(), &cwd)?;
        save::ensure_parent_exists(&path)?;

        let format = FileFormat::for_path(&path);
        let recognized = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(FileFormat::from_extension)
            .is_some();
        if !recognized {
            warn!(path = %path.display(), "unrecognized extension, saving as {format}");
            channel.log(&format!(
                "[WARN] Unrecognized extension; saving as {format}"
            ))?;
        }

        self.host
            .save_as(dest, &path, format)
            .map_err(|source| EngineError::Save {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), code = format.code(), "saved destination workbook");
        channel.log(&format!("{SAVED_LOG_PREFIX}{}", path.display()))?;
        Ok(RunResult::Completed(path))
    }
}

/// Record a file that could not be opened or read. Host-level faults escalate.
fn skip_file<C: ControlChannel>(
    file: &SourceFile,
    err: HostError,
    channel: &mut C,
) -> EngineResult<MergeOutcome> {
    if err.is_fatal() {
        return Err(err.into());
    }
    warn!(file = %file.path().display(), error = %err, "skipping source file");
    channel.log(&format!("[WARN] Skipping {}: {err}", file.display_name()))?;
    Ok(MergeOutcome::Skipped {
        reason: err.to_string(),
    })
}

fn cancelled<C: ControlChannel>(channel: &mut C) -> EngineResult<RunResult> {
    info!("cancellation observed");
    channel.log("[WARN] Merge cancelled.")?;
    Ok(RunResult::CancelledDuringMerge)
}
