//! `validate`, `plan`, `run`, and `init`.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use roomcast_engine::{
    CancelSignal, PresetFormat, ROUTINE_DEADLINE, dry_run_routine, load_routine, plan_routine, preset, render_preset, run_routine,
    validate_document,
};
use roomcast_types::{RoutineDocument, RoutineResult};
use tracing::{info, warn};

use super::open_settings;
use crate::player::AppleScriptCapability;
use crate::render::render_result;

pub fn validate(matches: &ArgMatches) -> Result<ExitCode> {
    let document = load(matches)?;
    let result = validate_document(&document)?;
    report(&result, matches.get_flag("json"))
}

pub fn plan(matches: &ArgMatches) -> Result<ExitCode> {
    let document = load(matches)?;
    let settings = open_settings(matches)?;
    let result = plan_routine(&document, settings.settings())?;
    report(&result, matches.get_flag("json"))
}

pub async fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let document = load(matches)?;
    let settings = open_settings(matches)?.settings().clone();
    let json = matches.get_flag("json");

    if matches.get_flag("dry-run") {
        let result = dry_run_routine(&document, &settings)?;
        return report(&result, json);
    }

    let cancel = CancelSignal::with_deadline(ROUTINE_DEADLINE);
    let worker_cancel = cancel.clone();
    let mut worker = tokio::task::spawn_blocking(move || {
        let capability = AppleScriptCapability::new(settings.airplay.app.clone(), worker_cancel.clone());
        run_routine(&document, &settings, &capability, &worker_cancel)
    });

    let joined = tokio::select! {
        joined = &mut worker => joined,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received; stopping the routine");
            cancel.interrupt();
            worker.await
        }
    };
    let result = joined.context("routine worker stopped unexpectedly")??;
    info!(routine = %result.name, ok = result.ok, "routine finished");
    report(&result, json)
}

pub fn init(matches: &ArgMatches) -> Result<ExitCode> {
    let preset_name = matches
        .get_one::<String>("preset")
        .ok_or_else(|| anyhow!("--preset is required"))?;
    let mut document = preset(preset_name).ok_or_else(|| anyhow!("unknown preset '{preset_name}'"))?;
    if let Some(name) = matches.get_one::<String>("name") {
        document.name = name.clone();
    }
    let format = if matches.get_flag("json") {
        PresetFormat::Json
    } else {
        PresetFormat::Yaml
    };
    print!("{}", render_preset(&document, format)?);
    Ok(ExitCode::SUCCESS)
}

fn load(matches: &ArgMatches) -> Result<RoutineDocument> {
    let file = matches.get_one::<String>("file").ok_or_else(|| anyhow!("--file is required"))?;
    Ok(load_routine(Path::new(file))?)
}

/// Print the result; a run that did not fully succeed exits with status 1.
fn report(result: &RoutineResult, json: bool) -> Result<ExitCode> {
    println!("{}", render_result(result, json)?);
    Ok(if result.ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
