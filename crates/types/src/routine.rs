//! Strongly typed routine definitions shared across the engine, settings store, and CLI.
//!
//! A routine is authored as YAML or JSON. Steps travel over the wire as a flat record
//! discriminated by `type` ([`StepRecord`]); once parsed they are held as the closed [`Step`]
//! sum type so every variant only carries the fields that belong to it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};

pub mod duration;
pub mod validation;

/// The only document version understood by this release.
pub const ROUTINE_VERSION: &str = "1";

/// Error recorded on every step that never ran because an earlier step failed.
pub const SKIPPED_AFTER_FAILURE: &str = "skipped due to previous step failure";

/// Parsed routine document, not yet validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RoutineDocument {
    /// Document schema version; must equal [`ROUTINE_VERSION`].
    #[serde(default, deserialize_with = "deserialize_version")]
    pub version: String,
    /// Human-readable routine name.
    #[serde(default)]
    pub name: String,
    /// Routine-level defaults applied to steps that do not carry their own values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<RoutineDefaults>,
    /// Ordered steps executed sequentially.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Defaults shared by routine documents and persisted settings.
///
/// Values are kept as authored so the validator can point at the offending field; the
/// resolver converts them into [`ResolvedDefaults`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RoutineDefaults {
    /// `airplay`, `native`, or empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub backend: String,
    /// Rooms used by steps that do not name their own.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rooms: Vec<String>,
    /// Volume applied before playback starts, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
    /// Shuffle toggle applied before playback starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle: Option<bool>,
}

impl RoutineDefaults {
    /// Returns true when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.backend.trim().is_empty() && self.rooms.is_empty() && self.volume.is_none() && self.shuffle.is_none()
    }
}

/// Execution target for room-level actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Direct device control through the player application.
    #[default]
    Airplay,
    /// Delegates to named automation shortcuts.
    Native,
}

impl Backend {
    /// Parses an authored backend name. Empty input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "airplay" => Some(Self::Airplay),
            "native" => Some(Self::Native),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Airplay => "airplay",
            Self::Native => "native",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback states a `wait` step can wait for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    /// Parses a state name, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "playing" => Some(Self::Playing),
            "paused" => Some(Self::Paused),
            "stopped" => Some(Self::Stopped),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }

    /// Returns true when a state reported by the player names this state.
    pub fn matches(&self, reported: &str) -> bool {
        reported.trim().to_lowercase() == self.as_str()
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport actions understood by `transport` steps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportAction {
    Stop,
}

impl TransportAction {
    /// Parses an authored action; the name must match exactly.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Flat wire representation of a step, as written in routine files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// One action within a routine.
///
/// Fields that belong to another step type are dropped while parsing. Fields the validator
/// must inspect (for example a missing volume value) stay optional until validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "StepRecord", into = "StepRecord")]
pub enum Step {
    /// `out.set`: select the current output rooms.
    OutSet { rooms: Vec<String> },
    /// `play`: start a playlist chosen by search query or identifier.
    Play { query: Option<String>, playlist_id: Option<String> },
    /// `volume.set`: set the volume, optionally for specific rooms.
    VolumeSet { value: Option<i64>, rooms: Option<Vec<String>> },
    /// `wait`: poll until the player reaches a state.
    Wait { state: String, timeout: String },
    /// `transport`: transport control.
    Transport { action: String },
    /// Any step type this release does not know; always rejected by validation.
    Unsupported { kind: String },
}

impl Step {
    pub const OUT_SET: &'static str = "out.set";
    pub const PLAY: &'static str = "play";
    pub const VOLUME_SET: &'static str = "volume.set";
    pub const WAIT: &'static str = "wait";
    pub const TRANSPORT: &'static str = "transport";

    /// The authored `type` of this step.
    pub fn kind(&self) -> &str {
        match self {
            Self::OutSet { .. } => Self::OUT_SET,
            Self::Play { .. } => Self::PLAY,
            Self::VolumeSet { .. } => Self::VOLUME_SET,
            Self::Wait { .. } => Self::WAIT,
            Self::Transport { .. } => Self::TRANSPORT,
            Self::Unsupported { kind } => kind,
        }
    }
}

impl From<StepRecord> for Step {
    fn from(record: StepRecord) -> Self {
        match record.kind.as_str() {
            Step::OUT_SET => Step::OutSet {
                rooms: record.rooms.unwrap_or_default(),
            },
            Step::PLAY => Step::Play {
                query: record.query,
                playlist_id: record.playlist_id,
            },
            Step::VOLUME_SET => Step::VolumeSet {
                value: record.value,
                rooms: record.rooms,
            },
            Step::WAIT => Step::Wait {
                state: record.state.unwrap_or_default(),
                timeout: record.timeout.unwrap_or_default(),
            },
            Step::TRANSPORT => Step::Transport {
                action: record.action.unwrap_or_default(),
            },
            _ => Step::Unsupported { kind: record.kind },
        }
    }
}

impl From<Step> for StepRecord {
    fn from(step: Step) -> Self {
        let kind = step.kind().to_string();
        let record = StepRecord { kind, ..Default::default() };
        match step {
            Step::OutSet { rooms } => StepRecord {
                rooms: Some(rooms),
                ..record
            },
            Step::Play { query, playlist_id } => StepRecord {
                query,
                playlist_id,
                ..record
            },
            Step::VolumeSet { value, rooms } => StepRecord { value, rooms, ..record },
            Step::Wait { state, timeout } => StepRecord {
                state: Some(state),
                timeout: Some(timeout),
                ..record
            },
            Step::Transport { action } => StepRecord {
                action: Some(action),
                ..record
            },
            Step::Unsupported { .. } => record,
        }
    }
}

/// Defaults after merging the routine and persisted layers.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct ResolvedDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    pub rooms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shuffle: Option<bool>,
}

impl ResolvedDefaults {
    /// Backend used by room-level steps; airplay when no layer names one.
    pub fn effective_backend(&self) -> Backend {
        self.backend.unwrap_or_default()
    }
}

/// Concrete parameters a step would execute with.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ResolvedParams {
    Outputs {
        backend: Backend,
        rooms: Vec<String>,
    },
    Play {
        backend: Backend,
        rooms: Vec<String>,
        #[serde(rename = "playlistId", skip_serializing_if = "Option::is_none")]
        playlist_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        query: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        volume: Option<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        shuffle: Option<bool>,
    },
    Volume {
        backend: Backend,
        rooms: Vec<String>,
        value: u8,
    },
    Wait {
        state: PlaybackState,
        timeout: String,
        #[serde(rename = "timeoutMs")]
        timeout_ms: u64,
    },
    Transport {
        action: TransportAction,
    },
}

/// A validated step paired with the parameters it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStep {
    pub index: usize,
    pub step: Step,
    pub resolved: ResolvedParams,
}

/// The four ways a routine document can be processed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    Validate,
    Plan,
    DryRun,
    Run,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Plan => "plan",
            Self::DryRun => "dry-run",
            Self::Run => "run",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub input: Step,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedParams>,
    pub ok: bool,
    pub skipped: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub duration_ms: u64,
}

impl StepResult {
    fn base(resolved_step: &ResolvedStep) -> Self {
        Self {
            index: resolved_step.index,
            kind: resolved_step.step.kind().to_string(),
            input: resolved_step.step.clone(),
            resolved: Some(resolved_step.resolved.clone()),
            ok: true,
            skipped: false,
            error: String::new(),
            duration_ms: 0,
        }
    }

    /// Result synthesized for modes that do not execute anything.
    pub fn planned(resolved_step: &ResolvedStep) -> Self {
        Self::base(resolved_step)
    }

    pub fn succeeded(resolved_step: &ResolvedStep, duration_ms: u64) -> Self {
        Self {
            duration_ms,
            ..Self::base(resolved_step)
        }
    }

    pub fn failed(resolved_step: &ResolvedStep, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            ok: false,
            error: error.into(),
            duration_ms,
            ..Self::base(resolved_step)
        }
    }

    pub fn skipped_after_failure(resolved_step: &ResolvedStep) -> Self {
        Self {
            ok: false,
            skipped: true,
            error: SKIPPED_AFTER_FAILURE.to_string(),
            ..Self::base(resolved_step)
        }
    }
}

/// Uniform result record produced by every mode.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoutineResult {
    pub name: String,
    pub version: String,
    pub mode: RunMode,
    pub ok: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
}

impl RoutineResult {
    /// Steps that ran and failed, skipped steps excluded.
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|step| !step.ok && !step.skipped)
    }
}

/// Only string versions are accepted; the validator then checks the value. Numbers are refused
/// here because `1.0` and `1` would otherwise both read as `"1"`.
fn deserialize_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum VersionRepr {
        Text(String),
        Other(IgnoredAny),
    }

    match VersionRepr::deserialize(deserializer)? {
        VersionRepr::Text(text) => Ok(text),
        VersionRepr::Other(_) => Err(de::Error::custom(format!("version must be the string \"{ROUTINE_VERSION}\""))),
    }
}
