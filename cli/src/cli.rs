//! Command-line arguments for `stl`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "stl",
    version,
    about = "Select from and persist JSON application state",
    long_about = "Evaluate dotted/bracket selector paths against JSON documents and\n\
                  manage state documents persisted in the storage directory."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (default: $STATELINE_CONFIG_DIR/settings.yaml).
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Errors only.
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(long = "log-format", value_enum, default_value = "compact", global = true)]
    pub log_format: LogFormatArg,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a selector path against a JSON document.
    Select {
        /// Path such as `cart.items[0].name`.
        path: String,
        /// Read the document from FILE instead of stdin.
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Evaluate a selector declared under `selectors:` in the settings.
    Named {
        name: String,
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Apply an update to a persisted state document and print the result.
    Set {
        key: String,
        /// JSON update, shallow-merged unless --replace is given.
        json: String,
        #[arg(long)]
        replace: bool,
    },

    /// Print a persisted state document.
    Show { key: String },

    /// Remove a persisted state document.
    Clear { key: String },

    /// List persisted state documents.
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
