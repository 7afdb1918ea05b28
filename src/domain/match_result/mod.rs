//! Match results consumed by the report
//!
//! Provided by an external source and treated as read-only. Stage scores may
//! arrive already decoded or still packed; [`MatchResult::decoded`] turns the
//! latter into plain counters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::score::{self, Score, ScorePenalties, ScoreSteel};

/// Competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
}

/// Place, percent and points within a ranking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub place: u32,
    pub percent: f64,
    pub points: f64,
}

/// Stage score as packed by the scoring device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedScore {
    pub paper: Vec<u64>,
    #[serde(default)]
    pub steel: ScoreSteel,
    #[serde(default)]
    pub procedurals: u32,
}

/// Score in either form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageScore {
    Decoded(Score),
    Packed(PackedScore),
}

impl Default for StageScore {
    fn default() -> Self {
        StageScore::Decoded(Score::default())
    }
}

impl StageScore {
    pub fn decode(&self) -> Score {
        match self {
            StageScore::Decoded(score) => *score,
            StageScore::Packed(packed) => Score {
                paper: score::decode(&packed.paper),
                steel: packed.steel,
                penalties: ScorePenalties {
                    procedurals: packed.procedurals,
                },
            },
        }
    }
}

/// One stage of one competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResult {
    pub number: u32,
    pub name: String,
    pub time: f64,
    pub points: f64,
    pub stage_points: f64,
    pub stage_percent: f64,
    pub hit_factor: f64,
    #[serde(default)]
    pub division_place: Option<u32>,
    #[serde(default)]
    pub overall_place: Option<u32>,
    #[serde(default)]
    pub division_rate: Option<f64>,
    #[serde(default)]
    pub overall_rate: Option<f64>,
    #[serde(default)]
    pub penalties: u32,
    #[serde(default)]
    pub dq: bool,
    #[serde(default)]
    pub score: StageScore,
}

/// Everything the report needs about one competitor in one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub title: String,
    pub date: NaiveDate,
    pub shooter: Person,
    pub division: Placement,
    pub overall: Placement,
    pub stages: Vec<StageResult>,
}

impl MatchResult {
    pub fn stage(&self, number: u32) -> Result<&StageResult, DomainError> {
        self.stages
            .iter()
            .find(|stage| stage.number == number)
            .ok_or_else(|| {
                DomainError::InputData(format!(
                    "Stage {} not found in results for {}",
                    number, self.shooter.name
                ))
            })
    }

    /// Copy with every stage score decoded
    pub fn decoded(&self) -> MatchResult {
        let mut result = self.clone();
        for stage in &mut result.stages {
            stage.score = StageScore::Decoded(stage.score.decode());
        }
        result
    }

    /// Score summed across all stages
    pub fn total_score(&self) -> Score {
        self.stages.iter().map(|stage| stage.score.decode()).sum()
    }

    /// Shape checks performed before any job runs
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.shooter.name.trim().is_empty() {
            return Err(DomainError::InputData(
                "Match result has no shooter name".to_string(),
            ));
        }
        if self.stages.is_empty() {
            return Err(DomainError::InputData(format!(
                "No stage results for {}",
                self.shooter.name
            )));
        }
        let mut numbers: Vec<u32> = self.stages.iter().map(|stage| stage.number).collect();
        numbers.sort_unstable();
        if numbers.windows(2).any(|w| w[0] == w[1]) {
            return Err(DomainError::InputData(
                "Duplicate stage numbers in match result".to_string(),
            ));
        }
        Ok(())
    }
}
