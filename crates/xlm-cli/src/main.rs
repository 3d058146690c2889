use clap::Parser;

mod cli;
mod commands;
mod config;

fn main() {
    let cli = cli::Cli::parse();
    let code = match commands::run_command(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("xlmerge: {e:#}");
            xlm_protocol::ExitCode::Failure.code()
        }
    };
    std::process::exit(code);
}
