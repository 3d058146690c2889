use std::io::{self, BufReader, Write};
use std::path::Path;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use xlm_engine::{
    CancellationSignal, EngineConfig, EngineError, MergeEngine, MergeRequest, RunLock,
};
use xlm_host::{SpreadsheetHost, UmyaHost};
use xlm_protocol::{CancelFlag, ControlChannel, ExitCode, LineChannel};
use xlm_types::{FileFormat, SourceFile};

use crate::cli::*;
use crate::config::WorkerConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Command::Worker(args) => cmd_worker(args),
        Command::Formats => {
            cmd_formats(&mut io::stdout().lock())?;
            Ok(0)
        }
    }
}

fn cmd_worker(args: WorkerArgs) -> anyhow::Result<i32> {
    let config = WorkerConfig::load(args.config.as_deref())?;
    init_tracing(&config.log_filter);

    let mut channel = LineChannel::new(BufReader::new(io::stdin()), io::stdout())
        .with_reply_timeout(config.engine.reply_timeout());
    let cancel = CancelFlag::new(args.cancel_flag);

    let code = run_worker(
        UmyaHost::new(),
        config.engine,
        &args.file_list,
        args.suggested_name,
        &mut channel,
        &cancel,
        RunLock::global(),
    );
    Ok(code.code())
}

/// Load the file list, take the run lock and merge.
pub fn run_worker<H, C, S>(
    host: H,
    config: EngineConfig,
    file_list: &Path,
    suggested_name: Option<String>,
    channel: &mut C,
    cancel: &S,
    lock: &RunLock,
) -> ExitCode
where
    H: SpreadsheetHost,
    C: ControlChannel,
    S: CancellationSignal,
{
    let files = match SourceFile::load_list(file_list) {
        Ok(files) => files,
        Err(e) => return refuse(channel, EngineError::FileList(e)),
    };
    let guard = match lock.acquire() {
        Ok(guard) => guard,
        Err(e) => return refuse(channel, e),
    };

    let mut request = MergeRequest::new(files);
    request.suggested_name = suggested_name;

    let mut engine = MergeEngine::with_config(host, config);
    let report = engine.run(&guard, &request, channel, cancel);
    info!(
        run_id = %report.run_id,
        sheets = report.sheets_copied(),
        code = report.exit_code().code(),
        "worker finished"
    );
    report.exit_code()
}

fn refuse<C: ControlChannel>(channel: &mut C, err: EngineError) -> ExitCode {
    error!(error = %err, "worker cannot start");
    let _ = channel.log(&format!("[ERROR] {err}"));
    ExitCode::Failure
}

fn cmd_formats(out: &mut impl Write) -> io::Result<()> {
    for format in FileFormat::ALL {
        writeln!(out, "{format}")?;
    }
    writeln!(out, "other extensions save as {}", FileFormat::Xlsx)
}

/// Diagnostics go to stderr; stdout carries the control channel.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
