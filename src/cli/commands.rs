//! Command implementations

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::ReelConfig;
use crate::app::AppContainer;
use crate::cli::args::{PlanArgs, ScoreArgs};
use crate::domain::score::{self, PaperCategory, ScorePaper};
use crate::utils::format_file_size;
use crate::utils::time::format_duration;

/// Execute the render command
pub async fn render(container: &dyn AppContainer) -> Result<()> {
    let request = container.report_request();
    info!("Starting report render");
    info!("Match: {}", request.match_id);
    info!("Shooter: {}", request.shooter_id);
    info!("Output: {}", request.settings.output_path().display());

    let report = container
        .report_interactor()
        .render(&request)
        .await
        .context("Report render failed")?;

    let size = tokio::fs::metadata(&report.output)
        .await
        .map(|meta| format_file_size(meta.len()))
        .unwrap_or_else(|_| "unknown size".to_string());

    info!(
        "Rendered {} jobs in {}, removed {} intermediates",
        report.jobs,
        format_duration(report.elapsed),
        report.removed
    );
    println!("{} ({})", report.output.display(), size);
    Ok(())
}

/// Execute the plan command
pub async fn plan(container: &dyn AppContainer, args: &PlanArgs) -> Result<()> {
    let request = container.report_request();
    let prepared = container
        .report_interactor()
        .prepare(&request)
        .await
        .context("Failed to plan report")?;

    let json = if args.compact {
        serde_json::to_string(&prepared.plan)
    } else {
        serde_json::to_string_pretty(&prepared.plan)
    }
    .context("Failed to serialize plan")?;

    println!("{}", json);
    Ok(())
}

/// Execute the score command
pub fn score(args: &ScoreArgs) -> Result<()> {
    let paper = score::decode(&args.records);

    if args.json {
        let json = serde_json::to_string_pretty(&paper).context("Failed to serialize score")?;
        println!("{}", json);
    } else {
        print!("{}", score_table(&paper));
    }
    Ok(())
}

/// Print the effective configuration
pub fn show_config(config: &ReelConfig) -> Result<()> {
    let toml = config.to_toml()?;
    print!("{}", toml);
    Ok(())
}

fn score_table(paper: &ScorePaper) -> String {
    let mut out = String::new();
    for category in PaperCategory::ALL {
        let label = match category {
            PaperCategory::Alphas => "Alphas",
            PaperCategory::Bravos => "Bravos",
            PaperCategory::Charlies => "Charlies",
            PaperCategory::Deltas => "Deltas",
            PaperCategory::NoShoots => "No-shoots",
            PaperCategory::Misses => "Misses",
            PaperCategory::NoPenaltyMisses => "No-penalty misses",
        };
        out.push_str(&format!("{:<18} {}\n", label, paper.get(category)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_table_lists_every_category() {
        let paper = score::decode(&[0x11]);
        let table = score_table(&paper);

        assert_eq!(table.lines().count(), 7);
        assert!(table.starts_with("Alphas             1\n"));
        assert!(table.contains("Bravos             1\n"));
        assert!(table.contains("Misses             0\n"));
    }
}
