use std::process::ExitCode;

use anyhow::Result;
use clap::ArgMatches;
use roomcast_engine::RoutineError;
use roomcast_types::ValidationError;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod player;
mod render;

/// Exit status for malformed or invalid routines.
const EXIT_INVALID: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let matches = cli::build_cli().get_matches();

    match dispatch(&matches).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", render_error(&error));
            ExitCode::from(exit_status_for(&error))
        }
    }
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn dispatch(matches: &ArgMatches) -> Result<ExitCode> {
    match matches.subcommand() {
        Some(("validate", sub)) => commands::routine::validate(sub),
        Some(("plan", sub)) => commands::routine::plan(sub),
        Some(("run", sub)) => commands::routine::run(sub).await,
        Some(("init", sub)) => commands::routine::init(sub),
        Some(("config", sub)) => commands::config::run(sub),
        _ => anyhow::bail!("expected a subcommand; see --help"),
    }
}

/// One line holding the whole cause chain.
fn render_error(error: &anyhow::Error) -> String {
    format!("error: {error:#}")
}

fn exit_status_for(error: &anyhow::Error) -> u8 {
    let invalid = error.downcast_ref::<RoutineError>().is_some_and(RoutineError::is_validation)
        || error.downcast_ref::<ValidationError>().is_some();
    if invalid { EXIT_INVALID } else { 1 }
}
