use clap::{Arg, ArgAction, Command};
use roomcast_engine::PRESET_NAMES;

/// Build the `roomcast` command tree.
pub fn build_cli() -> Command {
    Command::new("roomcast")
        .about("Run declarative playback routines across your rooms")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .action(ArgAction::Set)
                .value_name("PATH")
                .help("Settings file to use instead of the default location"),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a routine without running it")
                .arg(file_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("plan")
                .about("Show the parameters each step would run with")
                .arg(file_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("run")
                .about("Execute a routine")
                .arg(file_arg())
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Resolve every step without touching the player"),
                )
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("init")
                .about("Print a starter routine")
                .arg(
                    Arg::new("preset")
                        .long("preset")
                        .required(true)
                        .action(ArgAction::Set)
                        .value_parser(PRESET_NAMES)
                        .help("Starter routine to print"),
                )
                .arg(
                    Arg::new("name")
                        .long("name")
                        .action(ArgAction::Set)
                        .help("Override the routine name"),
                )
                .arg(Arg::new("json").long("json").action(ArgAction::SetTrue).help("Print JSON instead of YAML")),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect or change persisted defaults")
                .subcommand_required(true)
                .subcommand(Command::new("path").about("Print the settings file location"))
                .subcommand(Command::new("show").about("Print the current settings").arg(json_arg()))
                .subcommand(Command::new("get").about("Print one setting").arg(key_arg()))
                .subcommand(
                    Command::new("set")
                        .about("Change one setting")
                        .arg(key_arg())
                        .arg(Arg::new("value").required(true).action(ArgAction::Set).help("New value")),
                )
                .subcommand(Command::new("unset").about("Clear one setting").arg(key_arg())),
        )
}

fn file_arg() -> Arg {
    Arg::new("file")
        .long("file")
        .short('f')
        .required(true)
        .action(ArgAction::Set)
        .value_name("PATH")
        .help("Routine YAML/JSON file, or - for stdin")
}

fn json_arg() -> Arg {
    Arg::new("json").long("json").action(ArgAction::SetTrue).help("Print machine-readable JSON")
}

fn key_arg() -> Arg {
    Arg::new("key")
        .required(true)
        .action(ArgAction::Set)
        .help("defaults.backend, defaults.rooms, defaults.volume, or defaults.shuffle")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn parses_run_flags_and_global_config() {
        let matches = build_cli()
            .try_get_matches_from(["roomcast", "run", "-f", "morning.yaml", "--dry-run", "--config", "/tmp/rc.json"])
            .expect("parse run");
        let (name, run) = matches.subcommand().expect("subcommand");
        assert_eq!(name, "run");
        assert!(run.get_flag("dry-run"));
        assert!(!run.get_flag("json"));
        assert_eq!(run.get_one::<String>("file").map(String::as_str), Some("morning.yaml"));
        assert_eq!(run.get_one::<String>("config").map(String::as_str), Some("/tmp/rc.json"));
    }

    #[test]
    fn rejects_unknown_presets() {
        assert!(build_cli().try_get_matches_from(["roomcast", "init", "--preset", "party"]).is_err());
        assert!(build_cli().try_get_matches_from(["roomcast", "init", "--preset", "wind-down"]).is_ok());
    }
}
