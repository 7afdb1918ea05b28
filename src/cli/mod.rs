//! CLI module for MatchReel
//!
//! Argument parsing and the glue between flags and the loaded configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::ReelConfig;
use crate::utils::logging::LogFormat;

pub mod args;
pub mod commands;

pub use args::{PlanArgs, RenderArgs, ScoreArgs, SourceArgs};

/// MatchReel
///
/// Assembles a competitor's match video report: a title card, captioned stage
/// clips joined by fades, merged into one file by ffmpeg.
#[derive(Parser, Debug)]
#[command(name = "matchreel")]
#[command(about = "MatchReel - Shooting match video reports from your stage clips")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./matchreel.toml when present)
    #[arg(short, long, env = "MATCHREEL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level or filter directive
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Per-job progress logging; keeps intermediate files
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the report video
    Render(RenderArgs),
    /// Print the job plan as JSON without running it
    Plan(PlanArgs),
    /// Decode packed paper score records
    Score(ScoreArgs),
    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    /// Whether the command needs a loaded configuration
    pub fn needs_config(&self) -> bool {
        !matches!(self.command, Commands::Score(_))
    }

    /// Fold global and per-command flags into `config`
    pub fn apply_to(&self, config: &mut ReelConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if self.verbose && config.logging.level == "info" {
            config.logging.level = "debug".to_string();
        }

        match &self.command {
            Commands::Render(args) => {
                args.source.apply_to(config);
                if let Some(workers) = args.workers {
                    config.pipeline.workers = workers;
                }
                if args.keep_intermediates {
                    config.pipeline.keep_intermediates = true;
                }
                if args.clean_on_failure {
                    config.pipeline.keep_on_failure = false;
                }
            }
            Commands::Plan(args) => args.source.apply_to(config),
            Commands::Score(_) | Commands::Config => {}
        }
    }
}
