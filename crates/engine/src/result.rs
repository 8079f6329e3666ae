//! Assembly of the uniform [`RoutineResult`] record.

use std::time::Instant;

use chrono::Utc;
use roomcast_types::{ResolvedStep, RoutineDocument, RoutineResult, RunMode, StepResult};

/// Captures the start of an invocation and stamps the finished result.
#[derive(Debug)]
pub struct ResultBuilder {
    name: String,
    version: String,
    mode: RunMode,
    started_at: chrono::DateTime<Utc>,
    clock: Instant,
}

impl ResultBuilder {
    pub fn start(document: &RoutineDocument, mode: RunMode) -> Self {
        Self {
            name: document.name.clone(),
            version: document.version.clone(),
            mode,
            started_at: Utc::now(),
            clock: Instant::now(),
        }
    }

    /// Overall `ok` holds only when every step succeeded.
    pub fn finish(self, steps: Vec<StepResult>) -> RoutineResult {
        RoutineResult {
            ok: steps.iter().all(|step| step.ok),
            name: self.name,
            version: self.version,
            mode: self.mode,
            started_at: self.started_at,
            ended_at: Utc::now(),
            duration_ms: self.clock.elapsed().as_millis().try_into().unwrap_or(u64::MAX),
            steps,
        }
    }
}

/// Results for modes that stop before execution.
pub fn planned_steps(steps: &[ResolvedStep]) -> Vec<StepResult> {
    steps.iter().map(StepResult::planned).collect()
}

#[cfg(test)]
mod tests {
    use roomcast_types::{ResolvedParams, Step, TransportAction};

    use super::*;

    fn stop(index: usize) -> ResolvedStep {
        ResolvedStep {
            index,
            step: Step::Transport { action: "stop".into() },
            resolved: ResolvedParams::Transport {
                action: TransportAction::Stop,
            },
        }
    }

    #[test]
    fn result_ok_tracks_every_step() {
        let document = RoutineDocument {
            version: "1".into(),
            name: "evening".into(),
            ..Default::default()
        };
        let steps = [stop(0), stop(1)];

        let planned = ResultBuilder::start(&document, RunMode::Plan).finish(planned_steps(&steps));
        assert!(planned.ok);
        assert_eq!(planned.steps.len(), 2);
        assert!(planned.ended_at >= planned.started_at);

        let failed = ResultBuilder::start(&document, RunMode::Run).finish(vec![
            StepResult::failed(&steps[0], "boom", 3),
            StepResult::skipped_after_failure(&steps[1]),
        ]);
        assert!(!failed.ok);
        assert_eq!(failed.failed_steps().count(), 1);
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let document = RoutineDocument {
            version: "1".into(),
            name: "evening".into(),
            ..Default::default()
        };
        let result = ResultBuilder::start(&document, RunMode::DryRun).finish(planned_steps(&[stop(0)]));
        let value = serde_json::to_value(&result).expect("serialize result");

        assert_eq!(value["mode"], "dry-run");
        assert!(value.get("startedAt").is_some());
        assert!(value.get("durationMs").is_some());
        let step = &value["steps"][0];
        assert_eq!(step["type"], "transport");
        assert_eq!(step["input"], serde_json::json!({"type": "transport", "action": "stop"}));
        assert_eq!(step["resolved"], serde_json::json!({"action": "stop"}));
        assert!(step.get("error").is_none());
    }
}
