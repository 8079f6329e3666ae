//! Entry points for the four processing modes.
//!
//! Every mode validates first; a document that fails validation never reaches resolution or
//! execution. Validate resolves against the routine's own defaults only, while plan, dry-run,
//! and run layer the persisted settings underneath.

use roomcast_types::{ResolvedStep, RoutineDefaults, RoutineDocument, RoutineResult, RunMode, validate_routine};
use roomcast_util::Settings;
use tracing::{debug, info};

use crate::RoutineError;
use crate::executor::{CancelSignal, ExecutionContext, PlaybackCapability, execute_steps};
use crate::resolve::{resolve_defaults, resolve_steps};
use crate::result::{ResultBuilder, planned_steps};

/// Check the document and report the steps it would resolve to.
pub fn validate_document(document: &RoutineDocument) -> Result<RoutineResult, RoutineError> {
    let builder = ResultBuilder::start(document, RunMode::Validate);
    let steps = prepare(document, &RoutineDefaults::default())?;
    Ok(builder.finish(planned_steps(&steps)))
}

/// Resolve every step against the layered defaults without touching the player.
pub fn plan_routine(document: &RoutineDocument, settings: &Settings) -> Result<RoutineResult, RoutineError> {
    preview(document, settings, RunMode::Plan)
}

/// Same output as [`plan_routine`], reported under the `dry-run` mode.
pub fn dry_run_routine(document: &RoutineDocument, settings: &Settings) -> Result<RoutineResult, RoutineError> {
    preview(document, settings, RunMode::DryRun)
}

/// Execute the routine against `capability`.
///
/// Step failures are captured in the returned result; only problems detected before the first
/// step runs are returned as errors.
pub fn run_routine(
    document: &RoutineDocument,
    settings: &Settings,
    capability: &dyn PlaybackCapability,
    cancel: &CancelSignal,
) -> Result<RoutineResult, RoutineError> {
    let builder = ResultBuilder::start(document, RunMode::Run);
    let steps = prepare(document, &settings.defaults)?;
    info!(routine = %document.name, steps = steps.len(), "routine run started");

    let context = ExecutionContext {
        capability,
        shortcuts: &settings.native,
        cancel,
    };
    let result = builder.finish(execute_steps(&steps, &context));
    info!(routine = %result.name, ok = result.ok, duration_ms = result.duration_ms, "routine run finished");
    Ok(result)
}

fn preview(document: &RoutineDocument, settings: &Settings, mode: RunMode) -> Result<RoutineResult, RoutineError> {
    let builder = ResultBuilder::start(document, mode);
    let steps = prepare(document, &settings.defaults)?;
    debug!(routine = %document.name, mode = %mode, steps = steps.len(), "routine previewed");
    Ok(builder.finish(planned_steps(&steps)))
}

fn prepare(document: &RoutineDocument, global: &RoutineDefaults) -> Result<Vec<ResolvedStep>, RoutineError> {
    validate_routine(document)?;
    let defaults = resolve_defaults(document.defaults.as_ref(), global);
    Ok(resolve_steps(document, &defaults)?)
}
