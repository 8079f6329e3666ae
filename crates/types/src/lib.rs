//! Shared type definitions for the Roomcast CLI.
//!
//! The routine model lives here so the engine, the settings store, and the CLI agree on one
//! vocabulary for documents, resolved steps, and results.

pub mod native;
pub mod routine;

pub use native::NativeShortcuts;
pub use routine::{
    Backend, PlaybackState, ROUTINE_VERSION, ResolvedDefaults, ResolvedParams, ResolvedStep, RoutineDefaults, RoutineDocument,
    RoutineResult, RunMode, SKIPPED_AFTER_FAILURE, Step, StepRecord, StepResult, TransportAction,
    duration::{DurationError, parse_duration},
    validation::{ValidationError, parse_wait_timeout, validate_defaults, validate_routine},
};
