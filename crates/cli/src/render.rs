//! Plain and JSON rendering of routine results.

use std::fmt::Write as _;

use anyhow::Result;
use roomcast_types::RoutineResult;

pub fn render_result(result: &RoutineResult, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(result)?);
    }

    let total = result.steps.len();
    let mut output = format!(
        "{} mode={} ok={} steps={} duration={}ms",
        result.name, result.mode, result.ok, total, result.duration_ms
    );
    for step in &result.steps {
        let _ = write!(output, "\n{}/{} {} ok={}", step.index + 1, total, step.kind, step.ok);
        if step.skipped {
            output.push_str(" skipped");
        } else if !step.error.is_empty() {
            let _ = write!(output, " error={}", step.error);
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use roomcast_types::{ResolvedParams, ResolvedStep, RunMode, Step, StepResult, TransportAction};

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

    fn failed_run() -> RoutineResult {
        let now = Utc::now();
        RoutineResult {
            name: "Evening".into(),
            version: "1".into(),
            mode: RunMode::Run,
            ok: false,
            started_at: now,
            ended_at: now,
            duration_ms: 12,
            steps: vec![
                StepResult::failed(&stop(0), "player unavailable", 12),
                StepResult::skipped_after_failure(&stop(1)),
            ],
        }
    }

    #[test]
    fn plain_output_lists_every_step() {
        let text = render_result(&failed_run(), false).expect("render");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Evening mode=run ok=false steps=2 duration=12ms",
                "1/2 transport ok=false error=player unavailable",
                "2/2 transport ok=false skipped",
            ]
        );
    }

    #[test]
    fn json_output_uses_wire_names() {
        let text = render_result(&failed_run(), true).expect("render");
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["mode"], "run");
        assert_eq!(value["steps"][1]["skipped"], true);
        assert_eq!(value["steps"][0]["durationMs"], 12);
    }
}
