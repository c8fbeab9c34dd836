//! `stl`: command-line front end for stateline.
//!
//! # Usage
//!
//! ```text
//! stl select 'cart.items[0].name' --file state.json
//! echo '{"a":{"b":1}}' | stl select a.b
//! stl named owner --file state.json
//! stl set prefs '{"theme":"dark"}'
//! stl show prefs
//! stl clear prefs
//! ```

mod cli;
mod commands;
mod logging;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use stateline_core::settings::{resolve_config_dir, SETTINGS_FILE};
use stateline_core::Settings;

use crate::cli::{Cli, LogFormatArg};
use crate::commands::Context;
use crate::logging::{init_logging, LogConfig, LogFormat};


fn main() {
    let cli = Cli::parse();

    let (config_dir, settings_path) = resolve_settings_path(cli.config.clone());
    let settings = match Settings::load(&settings_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let log_config = log_config_from_cli(&cli, &settings);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {}", e);
        process::exit(1);
    }

    let ctx = Context {
        settings,
        config_dir,
    };
    match commands::run(cli.command, &ctx) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    }
}


/// `--config FILE` names the settings file directly; its directory is the
/// config directory. Otherwise both come from [`resolve_config_dir`].
fn resolve_settings_path(explicit: Option<PathBuf>) -> (PathBuf, PathBuf) {
    match explicit {
        Some(file) => {
            let dir = file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            (dir, file)
        }
        None => {
            let dir = resolve_config_dir();
            let file = dir.join(SETTINGS_FILE);
            (dir, file)
        }
    }
}

fn log_config_from_cli(cli: &Cli, settings: &Settings) -> LogConfig {
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    LogConfig::from_verbosity(cli.verbose, cli.quiet)
        .with_format(format)
        .with_filter(settings.log_filter.clone())
}
