//! Starter routines emitted by `roomcast init`.

use anyhow::{Context, Result};
use roomcast_types::{ROUTINE_VERSION, RoutineDefaults, RoutineDocument, Step};

/// Names accepted by [`preset`].
pub const PRESET_NAMES: [&str; 3] = ["morning", "focus", "wind-down"];

/// Output encoding for a rendered preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresetFormat {
    #[default]
    Yaml,
    Json,
}

/// Build the named starter routine, `None` for an unknown name.
pub fn preset(name: &str) -> Option<RoutineDocument> {
    let document = match name.trim() {
        "morning" => routine(
            "Morning",
            defaults(&["Kitchen"], 30, true),
            vec![
                out_set(&["Kitchen"]),
                play("Morning Jazz"),
                wait_for("playing", "20s"),
                volume(35),
            ],
        ),
        "focus" => routine(
            "Focus",
            defaults(&["Office"], 25, false),
            vec![out_set(&["Office"]), play("Deep Focus"), wait_for("playing", "15s")],
        ),
        "wind-down" => routine(
            "Wind Down",
            defaults(&["Bedroom"], 20, true),
            vec![
                out_set(&["Bedroom"]),
                play("Evening Chill"),
                wait_for("playing", "20s"),
                volume(12),
            ],
        ),
        _ => return None,
    };
    Some(document)
}

/// Render a routine as YAML or pretty JSON.
pub fn render_preset(document: &RoutineDocument, format: PresetFormat) -> Result<String> {
    match format {
        PresetFormat::Yaml => serde_yaml::to_string(document).context("failed to render routine as YAML"),
        PresetFormat::Json => serde_json::to_string_pretty(document)
            .map(|json| json + "\n")
            .context("failed to render routine as JSON"),
    }
}

fn routine(name: &str, defaults: RoutineDefaults, steps: Vec<Step>) -> RoutineDocument {
    RoutineDocument {
        version: ROUTINE_VERSION.to_string(),
        name: name.to_string(),
        defaults: Some(defaults),
        steps,
    }
}

fn defaults(rooms: &[&str], volume: i64, shuffle: bool) -> RoutineDefaults {
    RoutineDefaults {
        backend: "airplay".to_string(),
        rooms: room_list(rooms),
        volume: Some(volume),
        shuffle: Some(shuffle),
    }
}

fn out_set(rooms: &[&str]) -> Step {
    Step::OutSet { rooms: room_list(rooms) }
}

fn play(query: &str) -> Step {
    Step::Play {
        query: Some(query.to_string()),
        playlist_id: None,
    }
}

fn wait_for(state: &str, timeout: &str) -> Step {
    Step::Wait {
        state: state.to_string(),
        timeout: timeout.to_string(),
    }
}

fn volume(value: i64) -> Step {
    Step::VolumeSet { value: Some(value), rooms: None }
}

fn room_list(rooms: &[&str]) -> Vec<String> {
    rooms.iter().map(|room| room.to_string()).collect()
}
