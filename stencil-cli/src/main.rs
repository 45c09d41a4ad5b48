mod cmd;
mod config;

use std::ffi::OsString;
use std::process::ExitCode;

use clap::ArgMatches;
use clap::error::ErrorKind;
use log::LevelFilter;

use crate::config::load_build_config;

/// Accepts the single-dash long flags `-prod` and `-debug` as well.
fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            if arg == "-prod" {
                OsString::from("--prod")
            } else if arg == "-debug" {
                OsString::from("--debug")
            } else {
                arg
            }
        })
        .collect()
}

fn parse_args<I: IntoIterator<Item = OsString>>(args: I) -> Result<ArgMatches, clap::Error> {
    cmd::build::make_command().try_get_matches_from(normalize_args(args))
}

/// Help and version requests succeed; every other argument error is a failed
/// run like any other.
fn usage_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn init_logger(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let matches = match parse_args(std::env::args_os()) {
        Ok(matches) => matches,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_code(&e));
        }
    };

    let config = match load_build_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_logger(config.build.debug);

    match cmd::build::execute(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
