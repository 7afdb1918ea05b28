//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::adapters::ReelConfig;

/// Match and output selection shared by `render` and `plan`
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Match identifier (file stem under the source directory)
    #[arg(short, long = "match")]
    pub match_id: Option<String>,

    /// Competitor identifier within the match
    #[arg(short, long = "shooter")]
    pub shooter_id: Option<String>,

    /// Directory holding the match result files
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Directory for intermediates and the final file
    #[arg(short, long)]
    pub work_dir: Option<PathBuf>,

    /// Final file name inside the working directory
    #[arg(short, long)]
    pub output: Option<String>,
}

impl SourceArgs {
    pub fn apply_to(&self, config: &mut ReelConfig) {
        if let Some(match_id) = &self.match_id {
            config.source.match_id = match_id.clone();
        }
        if let Some(shooter_id) = &self.shooter_id {
            config.source.shooter_id = shooter_id.clone();
        }
        if let Some(dir) = &self.source_dir {
            config.source.dir = dir.clone();
        }
        if let Some(dir) = &self.work_dir {
            config.output.work_dir = dir.clone();
        }
        if let Some(name) = &self.output {
            config.output.file_name = name.clone();
        }
    }
}

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Clip chains encoded at the same time
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Keep intermediate files after a successful run
    #[arg(long)]
    pub keep_intermediates: bool,

    /// Remove completed intermediates when the run fails
    #[arg(long)]
    pub clean_on_failure: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Single-line JSON
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for the score command
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Packed records, decimal or 0x-prefixed hex
    #[arg(required = true, value_parser = parse_record)]
    pub records: Vec<u64>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

fn parse_record(value: &str) -> Result<u64, String> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid score record '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        assert_eq!(parse_record("17").unwrap(), 17);
        assert_eq!(parse_record("0x11").unwrap(), 17);
        assert_eq!(parse_record("0XfF").unwrap(), 255);
        assert!(parse_record("abc").is_err());
        assert!(parse_record("-1").is_err());
    }
}
