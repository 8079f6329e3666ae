pub mod config;
pub mod routine;

use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;
use roomcast_engine::RoutineError;
use roomcast_util::{SettingsStore, expand_tilde};

/// Open the settings store, honouring the global `--config` flag.
pub fn open_settings(matches: &ArgMatches) -> Result<SettingsStore> {
    let path: Option<PathBuf> = matches.get_one::<String>("config").map(|raw| expand_tilde(raw));
    Ok(SettingsStore::open(path).map_err(RoutineError::from)?)
}
