//! Structural and semantic validation for routine documents.
//!
//! Checks run in document order and stop at the first offending field. Every error names
//! the field path (for example `steps[2].value`) so authors can jump straight to it.

use std::time::Duration;

use thiserror::Error;

use super::{Backend, PlaybackState, ROUTINE_VERSION, RoutineDefaults, RoutineDocument, Step, TransportAction, duration::parse_duration};

/// Shortest timeout a `wait` step may declare.
pub const MIN_WAIT_TIMEOUT: Duration = Duration::from_secs(1);
/// Longest timeout a `wait` step may declare.
pub const MAX_WAIT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// A rule violation, anchored at a field path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.path, .message))]
pub struct ValidationError {
    /// Dotted/indexed path to the field, empty for document-level problems.
    pub path: String,
    /// Human-readable expectation.
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Error that concerns the document as a whole rather than one field.
    pub fn document(message: impl Into<String>) -> Self {
        Self::new(String::new(), message)
    }
}

fn render(path: &str, message: &str) -> String {
    if path.is_empty() {
        message.to_string()
    } else {
        format!("{path}: {message}")
    }
}

/// Validate a parsed routine document.
pub fn validate_routine(document: &RoutineDocument) -> Result<(), ValidationError> {
    if document.version != ROUTINE_VERSION {
        return Err(ValidationError::new(
            "version",
            format!("must be \"{ROUTINE_VERSION}\" (got \"{}\")", document.version),
        ));
    }
    if document.name.trim().is_empty() {
        return Err(ValidationError::new("name", "must not be empty"));
    }
    if let Some(defaults) = &document.defaults {
        validate_defaults(defaults, "defaults")?;
    }
    if document.steps.is_empty() {
        return Err(ValidationError::new("steps", "must contain at least one step"));
    }
    for (index, step) in document.steps.iter().enumerate() {
        validate_step(step, &format!("steps[{index}]"))?;
    }
    Ok(())
}

/// Validate a defaults block. `prefix` is the path the block lives under.
pub fn validate_defaults(defaults: &RoutineDefaults, prefix: &str) -> Result<(), ValidationError> {
    if !defaults.backend.trim().is_empty() && Backend::parse(&defaults.backend).is_none() {
        return Err(ValidationError::new(
            format!("{prefix}.backend"),
            format!("must be \"airplay\" or \"native\" (got \"{}\")", defaults.backend),
        ));
    }
    if let Some(volume) = defaults.volume {
        check_volume(volume, &format!("{prefix}.volume"))?;
    }
    check_room_names(&defaults.rooms, &format!("{prefix}.rooms"))
}

/// Parse a `wait` timeout and enforce the accepted range.
pub fn parse_wait_timeout(raw: &str) -> Result<Duration, String> {
    let timeout = parse_duration(raw).map_err(|error| error.to_string())?;
    if timeout < MIN_WAIT_TIMEOUT || timeout > MAX_WAIT_TIMEOUT {
        return Err(format!("must be between 1s and 10m (got \"{}\")", raw.trim()));
    }
    Ok(timeout)
}

fn validate_step(step: &Step, path: &str) -> Result<(), ValidationError> {
    match step {
        Step::OutSet { rooms } => {
            if rooms.is_empty() {
                return Err(ValidationError::new(format!("{path}.rooms"), "must list at least one room"));
            }
            check_room_names(rooms, &format!("{path}.rooms"))
        }
        Step::Play { query, playlist_id } => match (is_populated(query), is_populated(playlist_id)) {
            (true, false) | (false, true) => Ok(()),
            (false, false) => Err(ValidationError::new(path, "play requires either query or playlistId")),
            (true, true) => Err(ValidationError::new(path, "play accepts only one of query or playlistId")),
        },
        Step::VolumeSet { value, rooms } => {
            let Some(value) = value else {
                return Err(ValidationError::new(format!("{path}.value"), "is required"));
            };
            check_volume(*value, &format!("{path}.value"))?;
            match rooms {
                Some(rooms) => check_room_names(rooms, &format!("{path}.rooms")),
                None => Ok(()),
            }
        }
        Step::Wait { state, timeout } => {
            if PlaybackState::parse(state).is_none() {
                return Err(ValidationError::new(
                    format!("{path}.state"),
                    format!("must be one of playing, paused, stopped (got \"{state}\")"),
                ));
            }
            parse_wait_timeout(timeout)
                .map(|_| ())
                .map_err(|message| ValidationError::new(format!("{path}.timeout"), message))
        }
        Step::Transport { action } => match TransportAction::parse(action) {
            Some(_) => Ok(()),
            None => Err(ValidationError::new(
                format!("{path}.action"),
                format!("must be \"stop\" (got \"{action}\")"),
            )),
        },
        Step::Unsupported { kind } if kind.trim().is_empty() => Err(ValidationError::new(format!("{path}.type"), "is required")),
        Step::Unsupported { kind } => Err(ValidationError::new(
            format!("{path}.type"),
            format!("unsupported step type \"{kind}\""),
        )),
    }
}

fn check_volume(volume: i64, path: &str) -> Result<(), ValidationError> {
    if !(0..=100).contains(&volume) {
        return Err(ValidationError::new(path, format!("must be between 0 and 100 (got {volume})")));
    }
    Ok(())
}

fn check_room_names(rooms: &[String], path: &str) -> Result<(), ValidationError> {
    match rooms.iter().position(|room| room.trim().is_empty()) {
        Some(index) => Err(ValidationError::new(format!("{path}[{index}]"), "room name must not be empty")),
        None => Ok(()),
    }
}

fn is_populated(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.trim().is_empty())
}
