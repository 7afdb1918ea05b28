//! MatchReel
//!
//! Builds a competitor's match video report with ffmpeg: a title card, one
//! captioned clip per stage with crossfades, merged into a single file.
//!
//! # Usage
//!
//! ```bash
//! matchreel --config reel.toml render --match club-2024-05 --shooter 42
//! matchreel plan --match club-2024-05 --shooter 42 > plan.json
//! matchreel score 0x11 0x200000001
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info};

use matchreel::adapters::ReelConfig;
use matchreel::app::DefaultAppContainer;
use matchreel::cli::{commands, Cli, Commands};
use matchreel::utils::logging::{init_logging, log_system_info};

/// Main entry point for the MatchReel CLI
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.needs_config() {
        ReelConfig::load(cli.config.as_deref())?
    } else {
        ReelConfig::default()
    };
    config.apply_env()?;
    cli.apply_to(&mut config);

    init_logging(&config.logging)?;
    log_system_info();
    debug!(?cli, "Parsed arguments");

    let result = match &cli.command {
        Commands::Render(_) => {
            info!("Executing render command");
            let container = DefaultAppContainer::new(config, cli.verbose)?;
            commands::render(&container).await
        }
        Commands::Plan(args) => {
            info!("Executing plan command");
            let container = DefaultAppContainer::new(config, cli.verbose)?;
            commands::plan(&container, args).await
        }
        Commands::Score(args) => commands::score(args),
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
