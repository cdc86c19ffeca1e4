//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for chorus
#[derive(Parser, Debug)]
#[command(name = "chorus")]
#[command(author, version, about = "Ask several LLMs at once and keep the answer you like")]
#[command(long_about = r#"
Chorus sends every question to all configured models at once and streams
their answers side by side. Pick one with /pick and it becomes part of the
conversation; the others are discarded.

Configuration files are loaded from (in priority order):
1. CHORUS_* environment variables
2. --config <path>     Explicit config file
3. ./chorus.toml       Project-level config
4. ~/.config/chorus/config.toml   Global config

Example:
  chorus
  chorus -m claude-sonnet-4.5 -m gpt-4o-mini
  chorus --transcript 3f2a9c1e-... --identity alice
"#)]
pub struct Cli {
    /// Models answering every question (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Identity the session acts for (default: $USER)
    #[arg(long, value_name = "NAME")]
    pub identity: Option<String>,

    /// Relay topic (default: chat/<identity>)
    #[arg(long, value_name = "TOPIC")]
    pub topic: Option<String>,

    /// Resume an existing transcript
    #[arg(long, value_name = "ID")]
    pub transcript: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write operation logs to daily files in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
