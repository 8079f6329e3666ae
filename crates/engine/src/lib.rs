//! # Roomcast Engine
//!
//! Parses, validates, resolves, and executes declarative playback routines.
//!
//! A routine is a YAML or JSON document listing steps such as selecting output rooms,
//! starting a playlist, adjusting volume, or waiting for playback to begin. The engine runs
//! those steps strictly in order and stops at the first failure.
//!
//! ## Usage
//!
//! ```rust
//! use roomcast_engine::{parse_routine, plan_routine};
//! use roomcast_util::Settings;
//!
//! let document = parse_routine(br#"
//! version: "1"
//! name: Morning
//! defaults:
//!   rooms: [Kitchen]
//! steps:
//!   - type: play
//!     query: Morning Jazz
//! "#)?;
//!
//! let plan = plan_routine(&document, &Settings::default())?;
//! assert!(plan.ok);
//! assert_eq!(plan.steps.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`resolve`**: layered defaults and per-step parameters
//! - **`executor`**: sequential dispatch, the wait poller, and cancellation
//! - **`result`**: the uniform result record
//! - **`runner`**: validate, plan, dry-run, and run entry points
//! - **`presets`**: starter routines

use std::io::Read;
use std::{fs, path::Path};

use roomcast_types::{RoutineDocument, ValidationError};

pub mod error;
pub mod executor;
pub mod presets;
pub mod resolve;
pub mod result;
pub mod runner;

pub use error::RoutineError;
pub use executor::{
    COMMAND_DEADLINE, CancelSignal, Cancelled, ExecutionContext, POLL_INTERVAL, PlaybackCapability, Playlist, ROUTINE_DEADLINE, execute_steps,
};
pub use presets::{PRESET_NAMES, PresetFormat, preset, render_preset};
pub use resolve::{resolve_defaults, resolve_steps};
pub use result::{ResultBuilder, planned_steps};
pub use runner::{dry_run_routine, plan_routine, run_routine, validate_document};

/// Path that selects standard input instead of a file.
pub const STDIN_SOURCE: &str = "-";

/// Parse routine bytes, detecting JSON by a leading `{` and treating anything else as YAML.
///
/// Parsing only checks the shape of the document; rule checks happen in
/// [`roomcast_types::validate_routine`].
pub fn parse_routine(raw: &[u8]) -> Result<RoutineDocument, ValidationError> {
    let content = std::str::from_utf8(raw).map_err(|error| ValidationError::document(format!("routine is not valid UTF-8: {error}")))?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::document("automation file is empty"));
    }

    if trimmed.starts_with('{') {
        serde_json::from_str(trimmed).map_err(|error| ValidationError::document(format!("invalid JSON: {error}")))
    } else {
        serde_yaml::from_str(trimmed).map_err(|error| ValidationError::document(format!("invalid YAML: {error}")))
    }
}

/// Read the raw routine from `path`, or from stdin when `path` is `-`.
pub fn read_routine_source(path: &Path) -> Result<Vec<u8>, RoutineError> {
    if path.as_os_str() == STDIN_SOURCE {
        return read_routine_from(std::io::stdin().lock(), path);
    }
    fs::read(path).map_err(|source| RoutineError::Input {
        path: path.to_path_buf(),
        source,
    })
}

/// Drain `reader`, attributing failures to `path`.
fn read_routine_from(mut reader: impl Read, path: &Path) -> Result<Vec<u8>, RoutineError> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).map_err(|source| RoutineError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(buffer)
}

/// Read and parse a routine in one go.
pub fn load_routine(path: &Path) -> Result<RoutineDocument, RoutineError> {
    let raw = read_routine_source(path)?;
    Ok(parse_routine(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_json_and_yaml() {
        let json = parse_routine(br#"  {"version":"1","name":"j","steps":[{"type":"transport","action":"stop"}]}"#).expect("json");
        let yaml = parse_routine(b"version: '1'\nname: y\nsteps:\n  - type: transport\n    action: stop\n").expect("yaml");
        assert_eq!(json.steps, yaml.steps);
        assert_eq!(json.name, "j");
    }

    #[test]
    fn empty_input_is_a_validation_error() {
        let error = parse_routine(b" \n\t ").expect_err("empty input");
        assert_eq!(error.to_string(), "automation file is empty");
    }

    #[test]
    fn syntax_errors_carry_the_parser_message() {
        let json_error = parse_routine(b"{\"version\": ").expect_err("bad json");
        assert!(json_error.message.starts_with("invalid JSON:"));

        let yaml_error = parse_routine(b"steps: [unterminated").expect_err("bad yaml");
        assert!(yaml_error.message.starts_with("invalid YAML:"));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let error = parse_routine(b"version: '1'\nname: t\nsteps:\n  - type: out.set\n    rooms: [\"Kit\xffchen\"]\n")
            .expect_err("invalid utf-8");
        assert!(error.message.starts_with("routine is not valid UTF-8"), "{error}");
    }

    #[test]
    fn numeric_versions_fail_to_parse() {
        assert!(parse_routine(b"version: 1.0\nname: t\nsteps: []\n").is_err());
        assert!(parse_routine(br#"{"version": 1, "name": "t", "steps": []}"#).is_err());
    }

    #[test]
    fn reads_routines_from_a_stream() {
        let stdin = Path::new(STDIN_SOURCE);
        let raw = read_routine_from(std::io::Cursor::new(b"version: '1'\nname: piped\nsteps: []\n".to_vec()), stdin).expect("read stream");
        assert_eq!(parse_routine(&raw).expect("parse stream").name, "piped");

        struct BrokenPipe;
        impl Read for BrokenPipe {
            fn read(&mut self, _buffer: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            }
        }
        let error = read_routine_from(BrokenPipe, stdin).expect_err("broken stream");
        assert!(matches!(error, RoutineError::Input { .. }));
        assert!(error.to_string().starts_with("failed to read routine from stdin"), "{error}");
    }

    #[test]
    fn load_routine_reads_files() {
        let directory = tempfile::tempdir().expect("tempdir");
        let path = directory.path().join("routine.yaml");
        fs::write(&path, "version: '1'\nname: file\nsteps:\n  - type: transport\n    action: stop\n").expect("write routine");

        let document = load_routine(&path).expect("load routine");
        assert_eq!(document.name, "file");
        assert_eq!(document.version, "1");

        let missing = load_routine(&directory.path().join("absent.yaml")).expect_err("missing file");
        assert!(matches!(missing, RoutineError::Input { .. }));
    }
}
