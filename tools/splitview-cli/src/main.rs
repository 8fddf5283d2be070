//! splitview CLI: compose a directory of clips into one split-screen video.
//!
//! Usage:
//!   splitview compose <DIR>   Compose every clip of DIR side by side
//!   splitview plan <DIR>      Probe and plan only; print the filter graph
//!   splitview info <DIR>      List eligible clips with their metadata
//!   splitview check           Check external tools and assets
//!   splitview config          Show or initialize the configuration file

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use splitview_clip_model::{CompositionOptions, FreezeAccounting};
use splitview_common::config::AppConfig;
use splitview_common::error::SplitviewError;

mod commands;

#[derive(Parser)]
#[command(
    name = "splitview",
    about = "Side-by-side video compositions from a directory of clips",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to $XDG_CONFIG_HOME/splitview/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose every clip of a directory, left to right in name order
    Compose {
        /// Directory containing the clips
        dir: PathBuf,

        /// Output directory (defaults to <DIR>_split_screen next to DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        composition: CompositionArgs,

        /// Open the result with the desktop's default player
        #[arg(long)]
        open: bool,
    },

    /// Probe and plan a composition without encoding it
    Plan {
        /// Directory containing the clips
        dir: PathBuf,

        /// Print the full plan as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        composition: CompositionArgs,
    },

    /// List eligible clips with probed metadata
    Info {
        /// Directory containing the clips
        dir: PathBuf,
    },

    /// Check external tools and assets
    Check,

    /// Show the effective configuration, or write the defaults to disk
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long, requires = "init")]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct CompositionArgs {
    /// Do not draw clip names under the clips
    #[arg(long)]
    no_subs: bool,

    /// Slow-motion factor (audio is dropped above 2)
    #[arg(long, default_value = "1.0")]
    slow_mo: f64,

    /// Seconds the last frame stays frozen
    #[arg(long, default_value = "2.0")]
    freeze: f64,

    /// Overlay a timer at the top-left of every clip
    #[arg(long)]
    timers: bool,

    /// Produce a silent composition
    #[arg(long)]
    no_audio: bool,

    /// Add the freeze once per clip, like earlier releases did
    #[arg(long)]
    legacy_freeze: bool,
}

impl CompositionArgs {
    fn to_options(&self) -> CompositionOptions {
        CompositionOptions {
            slow_motion_factor: self.slow_mo,
            freeze_duration_secs: self.freeze,
            insert_subtitles: !self.no_subs,
            insert_timers: self.timers,
            remove_audio: self.no_audio,
            freeze_accounting: if self.legacy_freeze {
                FreezeAccounting::PerClip
            } else {
                FreezeAccounting::Once
            },
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let mut config = cli
        .config
        .as_deref()
        .map(AppConfig::load_from)
        .unwrap_or_else(AppConfig::load);
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    splitview_common::logging::init_logging(&config.logging);

    if let Err(err) = run(cli, &config) {
        eprintln!("{}", failure_summary(&err));
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Compose {
            dir,
            output,
            composition,
            open,
        } => commands::compose::run(config, dir, output, composition.to_options(), open),
        Commands::Plan {
            dir,
            json,
            composition,
        } => commands::plan::run(config, dir, composition.to_options(), json),
        Commands::Info { dir } => commands::info::run(config, dir),
        Commands::Check => commands::check::run(config, cli.config.as_deref()),
        Commands::Config { init, force } => {
            commands::config::run(config, cli.config.as_deref(), init, force)
        }
    }
}

/// One line telling "nothing to do" apart from "a tool broke".
fn failure_summary(err: &anyhow::Error) -> String {
    match err.downcast_ref::<SplitviewError>() {
        Some(
            failure @ (SplitviewError::NoEligibleClips { .. } | SplitviewError::FileNotFound { .. }),
        ) => format!("[FAIL] No input found: {failure}"),
        Some(failure) if failure.is_external_tool_failure() => {
            format!("[FAIL] External tool failed: {failure}")
        }
        _ => format!("[FAIL] {err:#}"),
    }
}
