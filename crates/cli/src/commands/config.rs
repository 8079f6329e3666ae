use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use roomcast_util::settings::SettingKey;

use super::open_settings;

pub fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let mut store = open_settings(matches)?;
    match matches.subcommand() {
        Some(("path", _)) => println!("{}", store.path().display()),
        Some(("show", sub)) => {
            if sub.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(store.settings())?);
            } else {
                println!("path = {}", store.path().display());
                for key in SettingKey::NAMES {
                    let value = store.get(key)?.unwrap_or_else(|| "(unset)".to_string());
                    println!("{key} = {value}");
                }
                println!("airplay.app = {}", store.settings().airplay.app);
            }
        }
        Some(("get", sub)) => {
            let key = key(sub)?;
            match store.get(key)? {
                Some(value) => println!("{value}"),
                None => return Ok(ExitCode::FAILURE),
            }
        }
        Some(("set", sub)) => {
            let key = key(sub)?;
            let value = sub.get_one::<String>("value").ok_or_else(|| anyhow!("a value is required"))?;
            store.set(key, value).with_context(|| format!("failed to set {key}"))?;
        }
        Some(("unset", sub)) => {
            let key = key(sub)?;
            store.unset(key).with_context(|| format!("failed to unset {key}"))?;
        }
        Some((other, _)) => bail!("unknown config command '{other}'"),
        None => bail!("expected a config subcommand"),
    }
    Ok(ExitCode::SUCCESS)
}

fn key(matches: &ArgMatches) -> Result<&str> {
    matches
        .get_one::<String>("key")
        .map(String::as_str)
        .ok_or_else(|| anyhow!("a settings key is required"))
}
