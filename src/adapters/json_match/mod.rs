//! JSON match data adapter
//!
//! Reads `<source_dir>/<match_id>.json`:
//!
//! ```json
//! {
//!   "title": "Spring Cup",
//!   "date": "2024-05-12",
//!   "results": [
//!     { "id": "42", "shooter": {...}, "division": {...}, "overall": {...}, "stages": [...] }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::domain::match_result::{MatchResult, Person, Placement, StageResult};
use crate::ports::*;

/// Shooter identifiers show up both as strings and as numbers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ShooterId {
    Text(String),
    Number(u64),
}

impl ShooterId {
    fn matches(&self, id: &str) -> bool {
        match self {
            ShooterId::Text(text) => text == id,
            ShooterId::Number(number) => number.to_string() == id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShooterEntry {
    id: ShooterId,
    shooter: Person,
    division: Placement,
    overall: Placement,
    #[serde(default)]
    stages: Vec<StageResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchFile {
    title: String,
    date: NaiveDate,
    #[serde(default)]
    results: Vec<ShooterEntry>,
}

impl MatchFile {
    fn into_result(self, shooter_id: &str) -> Result<MatchResult, DomainError> {
        let title = self.title;
        let entry = self
            .results
            .into_iter()
            .find(|entry| entry.id.matches(shooter_id))
            .ok_or_else(|| {
                DomainError::InputData(format!(
                    "Shooter {} not found in results of '{}'",
                    shooter_id, title
                ))
            })?;

        Ok(MatchResult {
            title,
            date: self.date,
            shooter: entry.shooter,
            division: entry.division,
            overall: entry.overall,
            stages: entry.stages,
        })
    }
}

/// Match data read from JSON files in a directory
#[derive(Debug, Clone)]
pub struct JsonMatchAdapter {
    source_dir: PathBuf,
}

impl JsonMatchAdapter {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
        }
    }

    pub fn match_path(&self, match_id: &str) -> PathBuf {
        self.source_dir.join(format!("{}.json", match_id))
    }

    fn parse(path: &Path, content: &str, shooter_id: &str) -> Result<MatchResult, DomainError> {
        let file: MatchFile = serde_json::from_str(content).map_err(|e| {
            DomainError::InputData(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        file.into_result(shooter_id)
    }
}

#[async_trait]
impl MatchDataPort for JsonMatchAdapter {
    async fn fetch(&self, match_id: &str, shooter_id: &str) -> Result<MatchResult, DomainError> {
        if match_id.trim().is_empty() || shooter_id.trim().is_empty() {
            return Err(DomainError::Configuration(
                "Both a match id and a shooter id are required".to_string(),
            ));
        }

        let path = self.match_path(match_id);
        debug!(path = %path.display(), "Reading match data");
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            DomainError::InputData(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let result = Self::parse(&path, &content, shooter_id)?;
        info!(
            shooter = %result.shooter.name,
            stages = result.stages.len(),
            "Loaded results for '{}'",
            result.title
        );
        Ok(result)
    }
}
