//! Sequential step execution with stop-on-first-failure.
//!
//! Steps run one at a time in document order. The first failing step halts the run; every
//! later step is reported as skipped and nothing already applied is rolled back.

use std::time::Instant;

use roomcast_types::{NativeShortcuts, ResolvedStep, StepResult};
use tracing::{info, warn};

mod cancel;
mod capability;
mod dispatch;
mod wait;

pub use cancel::{COMMAND_DEADLINE, CancelSignal, Cancelled, ROUTINE_DEADLINE};
pub use capability::{PlaybackCapability, Playlist};
pub use wait::POLL_INTERVAL;

/// Everything a step needs while it runs.
pub struct ExecutionContext<'a> {
    pub capability: &'a dyn PlaybackCapability,
    /// Shortcut tables consulted by the native backend.
    pub shortcuts: &'a NativeShortcuts,
    pub cancel: &'a CancelSignal,
}

/// Execute `steps` in order and return one result per step.
pub fn execute_steps(steps: &[ResolvedStep], context: &ExecutionContext<'_>) -> Vec<StepResult> {
    let (results, _halted) = steps
        .iter()
        .fold((Vec::with_capacity(steps.len()), false), |(mut results, halted), step| {
            if halted {
                results.push(StepResult::skipped_after_failure(step));
                return (results, true);
            }
            let result = run_step(step, context);
            let failed = !result.ok;
            results.push(result);
            (results, failed)
        });
    results
}

fn run_step(step: &ResolvedStep, context: &ExecutionContext<'_>) -> StepResult {
    let step_type = step.step.kind();
    if let Err(cancelled) = context.cancel.check() {
        warn!(step_index = step.index, step_type, reason = %cancelled, "step not started");
        return StepResult::failed(step, cancelled.to_string(), 0);
    }

    info!(step_index = step.index, step_type, "step started");
    let started = Instant::now();
    let outcome = dispatch::dispatch(step, context);
    let duration_ms = started.elapsed().as_millis().try_into().unwrap_or(u64::MAX);

    match outcome {
        Ok(()) => {
            info!(step_index = step.index, step_type, duration_ms, "step succeeded");
            StepResult::succeeded(step, duration_ms)
        }
        Err(error) => {
            let message = format!("{error:#}");
            warn!(step_index = step.index, step_type, duration_ms, error = %message, "step failed");
            StepResult::failed(step, message, duration_ms)
        }
    }
}
