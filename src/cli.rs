use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::AppConfig;
use crate::crew::export_csv::write_roster_csv;
use crate::data::crew::CrewDto;
use crate::logging;
use crate::server::{self, LocalSession};

const USAGE: &str = "usage: ready_room <serve|roster|buffs|import|export>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Roster,
    Buffs,
    Import,
    Export,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("roster") => Some(Command::Roster),
        Some("buffs") => Some(Command::Buffs),
        Some("import") => Some(Command::Import),
        Some("export") => Some(Command::Export),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return 1;
        }
    };
    logging::init(&config.log_filter);

    match command {
        Command::Serve => handle_serve(&config),
        Command::Roster => handle_roster(args, config),
        Command::Buffs => handle_buffs(args, config),
        Command::Import => handle_import(args, config),
        Command::Export => handle_export(args, config),
    }
}

fn runtime() -> Option<tokio::runtime::Runtime> {
    match tokio::runtime::Runtime::new() {
        Ok(runtime) => Some(runtime),
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            None
        }
    }
}

/// A fixture directory argument overrides the configured one.
fn with_fixture_dir(mut config: AppConfig, raw: Option<&String>) -> AppConfig {
    if let Some(dir) = raw {
        config.fixture_dir = PathBuf::from(dir);
    }
    config
}

/// Signs in and loads the player, printing the failure if there is one.
fn open_session(config: &AppConfig) -> Option<(tokio::runtime::Runtime, LocalSession)> {
    let runtime = runtime()?;
    let mut session = server::local_session(config);
    match runtime.block_on(server::connect(&mut session, config)) {
        Ok(()) => Some((runtime, session)),
        Err(err) => {
            eprintln!("failed to load player data: {err}");
            None
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T, what: &str) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize {what}: {err}");
            1
        }
    }
}

fn handle_serve(config: &AppConfig) -> i32 {
    let Some(runtime) = runtime() else {
        return 1;
    };
    match runtime.block_on(server::run_server(config)) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_roster(args: &[String], config: AppConfig) -> i32 {
    let config = with_fixture_dir(config, args.get(2));
    let Some((_runtime, session)) = open_session(&config) else {
        return 1;
    };
    print_json(session.roster(), "roster")
}

fn handle_buffs(args: &[String], config: AppConfig) -> i32 {
    let config = with_fixture_dir(config, args.get(2));
    let Some((_runtime, session)) = open_session(&config) else {
        return 1;
    };
    print_json(session.buff_config(), "buff config")
}

fn handle_import(args: &[String], config: AppConfig) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: ready_room import <allcrew.json> [fixture_dir]");
        return 2;
    };
    let records: Vec<CrewDto> = match fs::read_to_string(path)
        .map_err(|err| err.to_string())
        .and_then(|raw| serde_json::from_str(&raw).map_err(|err| err.to_string()))
    {
        Ok(records) => records,
        Err(err) => {
            eprintln!("import failed: {path}: {err}");
            return 1;
        }
    };

    let config = with_fixture_dir(config, args.get(3));
    let Some((_runtime, mut session)) = open_session(&config) else {
        return 1;
    };
    print_json(session.import_all_crew(&records), "imported crew")
}

fn handle_export(args: &[String], config: AppConfig) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: ready_room export <out.csv> [fixture_dir]");
        return 2;
    };
    let config = with_fixture_dir(config, args.get(3));
    let Some((_runtime, session)) = open_session(&config) else {
        return 1;
    };

    let file = match File::create(path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("export failed: {path}: {err}");
            return 1;
        }
    };
    match write_roster_csv(session.roster(), BufWriter::new(file)) {
        Ok(()) => {
            println!("export complete: crew={}, path='{}'", session.roster().len(), path);
            0
        }
        Err(err) => {
            eprintln!("export failed: {err}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn commands_parse_by_name() {
        assert_eq!(parse_command(&args(&["ready_room", "serve"])), Some(Command::Serve));
        assert_eq!(parse_command(&args(&["ready_room", "export", "x.csv"])), Some(Command::Export));
        assert_eq!(parse_command(&args(&["ready_room", "simulate"])), None);
        assert_eq!(parse_command(&args(&["ready_room"])), None);
    }

    #[test]
    fn unknown_command_is_a_usage_error() {
        assert_eq!(run_with_args(&args(&["ready_room", "warp"])), 2);
    }

    #[test]
    fn fixture_argument_overrides_config() {
        let config = with_fixture_dir(AppConfig::default(), Some(&"captures".to_string()));
        assert_eq!(config.fixture_dir, PathBuf::from("captures"));
        let config = with_fixture_dir(AppConfig::default(), None);
        assert_eq!(config.fixture_dir, PathBuf::from("data/fixtures"));
    }
}
