//! Layered defaults and per-step parameter resolution.
//!
//! A value set on the step wins, then the routine's `defaults` block, then the persisted
//! global defaults. Resolution is pure: validate, plan, dry-run, and run all see identical
//! parameters for the same inputs.

use roomcast_types::{
    Backend, PlaybackState, ResolvedDefaults, ResolvedParams, ResolvedStep, RoutineDefaults, RoutineDocument, Step, TransportAction,
    ValidationError, parse_wait_timeout,
};

/// Merge routine-level defaults over the persisted global defaults.
pub fn resolve_defaults(routine: Option<&RoutineDefaults>, global: &RoutineDefaults) -> ResolvedDefaults {
    let routine = routine.cloned().unwrap_or_default();
    let backend = [routine.backend.as_str(), global.backend.as_str()]
        .into_iter()
        .find(|backend| !backend.trim().is_empty())
        .and_then(Backend::parse);
    let rooms = if routine.rooms.is_empty() { &global.rooms } else { &routine.rooms };

    ResolvedDefaults {
        backend,
        rooms: rooms.clone(),
        volume: routine.volume.or(global.volume).and_then(|volume| u8::try_from(volume).ok()),
        shuffle: routine.shuffle.or(global.shuffle),
    }
}

/// Project every step of a validated document onto the resolved defaults.
pub fn resolve_steps(document: &RoutineDocument, defaults: &ResolvedDefaults) -> Result<Vec<ResolvedStep>, ValidationError> {
    document
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            Ok(ResolvedStep {
                index,
                step: step.clone(),
                resolved: resolve_step(step, defaults, &format!("steps[{index}]"))?,
            })
        })
        .collect()
}

fn resolve_step(step: &Step, defaults: &ResolvedDefaults, path: &str) -> Result<ResolvedParams, ValidationError> {
    let backend = defaults.effective_backend();
    let resolved = match step {
        Step::OutSet { rooms } => ResolvedParams::Outputs {
            backend,
            rooms: rooms.clone(),
        },
        Step::Play { query, playlist_id } => ResolvedParams::Play {
            backend,
            rooms: defaults.rooms.clone(),
            playlist_id: non_blank(playlist_id),
            query: non_blank(query),
            volume: defaults.volume,
            shuffle: defaults.shuffle,
        },
        Step::VolumeSet { value, rooms } => {
            let value = value
                .and_then(|value| u8::try_from(value).ok())
                .filter(|value| *value <= 100)
                .ok_or_else(|| ValidationError::new(format!("{path}.value"), "must be between 0 and 100"))?;
            let rooms = match rooms {
                Some(rooms) if !rooms.is_empty() => rooms.clone(),
                _ => defaults.rooms.clone(),
            };
            ResolvedParams::Volume { backend, rooms, value }
        }
        Step::Wait { state, timeout } => {
            let parsed_state = PlaybackState::parse(state)
                .ok_or_else(|| ValidationError::new(format!("{path}.state"), format!("unsupported state \"{state}\"")))?;
            let duration = parse_wait_timeout(timeout).map_err(|message| ValidationError::new(format!("{path}.timeout"), message))?;
            ResolvedParams::Wait {
                state: parsed_state,
                timeout: timeout.trim().to_string(),
                timeout_ms: duration.as_millis().try_into().unwrap_or(u64::MAX),
            }
        }
        Step::Transport { action } => ResolvedParams::Transport {
            action: TransportAction::parse(action)
                .ok_or_else(|| ValidationError::new(format!("{path}.action"), format!("unsupported action \"{action}\"")))?,
        },
        Step::Unsupported { kind } => {
            return Err(ValidationError::new(format!("{path}.type"), format!("unsupported step type \"{kind}\"")));
        }
    };
    Ok(resolved)
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|text| !text.is_empty()).map(str::to_string)
}
