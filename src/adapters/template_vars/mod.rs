//! Variable substitution for overlay text
//!
//! Templates use the `{name}` syntax over a flat context built from the match
//! result, e.g. `"{shooter.name}\n{division.place}. place {division.percent}%"`.
//! Unknown variables stay in the text verbatim.

use std::collections::HashMap;

use tracing::warn;

use crate::domain::errors::*;
use crate::domain::match_result::{MatchResult, Placement, StageResult};
use crate::domain::score::Score;
use crate::ports::*;

/// Variable context for one rendering
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: HashMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with every variable `scope` provides
    pub fn from_scope(scope: &RenderScope<'_>) -> Self {
        let mut ctx = Self::new().with_match(scope.match_result);
        if let Some(stage) = scope.stage {
            ctx = ctx.with_stage(stage);
        }
        ctx
    }

    /// Add match, shooter, placement and `totals.*` variables
    pub fn with_match(mut self, result: &MatchResult) -> Self {
        self.set("match.title", &result.title);
        self.set("match.date", &result.date.format("%Y-%m-%d").to_string());
        self.set("match.dateLong", &result.date.format("%-d %B %Y").to_string());
        self.set("shooter.name", &result.shooter.name);
        self.set(
            "shooter.division",
            result.shooter.division.as_deref().unwrap_or_default(),
        );
        self.set("shooter.class", result.shooter.class.as_deref().unwrap_or_default());
        self.set_placement("division", &result.division);
        self.set_placement("overall", &result.overall);

        let totals = result.total_score();
        self.set_score("totals", &totals);
        self.set("totals.stages", &result.stages.len().to_string());
        let time: f64 = result.stages.iter().map(|stage| stage.time).sum();
        self.set("totals.time", &format!("{:.2}", time));
        let points: f64 = result.stages.iter().map(|stage| stage.points).sum();
        self.set("totals.points", &format_number(points));
        let penalties: u32 = result.stages.iter().map(|stage| stage.penalties).sum();
        self.set("totals.penalties", &penalties.to_string());
        self
    }

    /// Add `stage.*` variables
    pub fn with_stage(mut self, stage: &StageResult) -> Self {
        self.set("stage.number", &stage.number.to_string());
        self.set("stage.name", &stage.name);
        self.set("stage.time", &format!("{:.2}", stage.time));
        self.set("stage.points", &format_number(stage.points));
        self.set("stage.stagePoints", &format!("{:.2}", stage.stage_points));
        self.set("stage.percent", &format!("{:.2}", stage.stage_percent));
        self.set("stage.hitFactor", &format!("{:.4}", stage.hit_factor));
        self.set(
            "stage.divisionPlace",
            &stage.division_place.map(|p| p.to_string()).unwrap_or_default(),
        );
        self.set(
            "stage.overallPlace",
            &stage.overall_place.map(|p| p.to_string()).unwrap_or_default(),
        );
        self.set_score("stage", &stage.score.decode());
        self.set("stage.penalties", &stage.penalties.to_string());
        self.set("stage.dq", &stage.dq.to_string());
        self.set("stage.divisionRate", &format_rate(stage.division_rate));
        self.set("stage.overallRate", &format_rate(stage.overall_rate));
        self
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    fn set_placement(&mut self, prefix: &str, placement: &Placement) {
        self.set(&format!("{}.place", prefix), &placement.place.to_string());
        self.set(&format!("{}.percent", prefix), &format!("{:.2}", placement.percent));
        self.set(&format!("{}.points", prefix), &format!("{:.2}", placement.points));
    }

    fn set_score(&mut self, prefix: &str, score: &Score) {
        let counters = [
            ("alphas", score.paper.alphas),
            ("bravos", score.paper.bravos),
            ("charlies", score.paper.charlies),
            ("deltas", score.paper.deltas),
            ("misses", score.misses()),
            ("noShoots", score.no_shoots()),
            ("noPenaltyMisses", score.no_penalty_misses()),
            ("steelHits", score.steel.hits),
            ("procedurals", score.penalties.procedurals),
            ("penaltyCount", score.penalty_count()),
        ];
        for (name, value) in counters {
            self.set(&format!("{}.{}", prefix, name), &value.to_string());
        }
    }

    /// Replace every `{name}` with its value.
    ///
    /// Returns the text and the names that had no value.
    pub fn substitute(&self, template: &str) -> (String, Vec<String>) {
        let mut output = String::with_capacity(template.len());
        let mut unknown = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            output.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find(|c: char| c == '}' || c == '{') {
                Some(close) if after.as_bytes()[close] == b'}' => {
                    let name = &after[..close];
                    match self.get(name.trim()) {
                        Some(value) => output.push_str(value),
                        None => {
                            unknown.push(name.to_string());
                            output.push('{');
                            output.push_str(name);
                            output.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                _ => {
                    output.push('{');
                    rest = after;
                }
            }
        }
        output.push_str(rest);
        (output, unknown)
    }
}

/// Whole numbers without a fraction, everything else with two decimals
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.2}", r)).unwrap_or_default()
}

/// Template adapter backed by [`TemplateContext`]
#[derive(Debug, Clone, Default)]
pub struct VarTemplateAdapter;

impl VarTemplateAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl TemplatePort for VarTemplateAdapter {
    fn render(&self, template: &str, scope: &RenderScope<'_>) -> Result<String, DomainError> {
        let (text, unknown) = TemplateContext::from_scope(scope).substitute(template);
        for name in unknown {
            warn!("Unknown template variable '{{{}}}' left as is", name);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::match_result::{Person, StageScore};
    use crate::domain::score::ScorePaper;
    use chrono::NaiveDate;

    fn result() -> MatchResult {
        let score = Score {
            paper: ScorePaper {
                alphas: 14,
                charlies: 3,
                misses: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        MatchResult {
            title: "Spring Cup".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
            shooter: Person {
                name: "Jo Doe".to_string(),
                division: Some("Production".to_string()),
                class: None,
            },
            division: Placement {
                place: 2,
                percent: 91.456,
                points: 830.2,
            },
            overall: Placement {
                place: 5,
                percent: 84.0,
                points: 760.1,
            },
            stages: vec![StageResult {
                number: 3,
                name: "Speed Trap".to_string(),
                time: 14.2,
                points: 110.0,
                stage_points: 95.1,
                stage_percent: 95.1,
                hit_factor: 7.7465,
                division_place: Some(1),
                overall_place: None,
                division_rate: None,
                overall_rate: None,
                penalties: 3,
                dq: false,
                score: StageScore::Decoded(score),
            }],
        }
    }

    #[test]
    fn test_match_variables() {
        let result = result();
        let scope = RenderScope {
            match_result: &result,
            stage: None,
        };
        let text = VarTemplateAdapter::new()
            .render(
                "{match.title} {match.date}\n{shooter.name} ({shooter.division}) #{division.place} {division.percent}%",
                &scope,
            )
            .unwrap();
        assert_eq!(text, "Spring Cup 2024-05-12\nJo Doe (Production) #2 91.46%");
    }

    #[test]
    fn test_stage_variables() {
        let result = result();
        let scope = RenderScope {
            match_result: &result,
            stage: result.stages.first(),
        };
        let text = VarTemplateAdapter::new()
            .render(
                "Stage {stage.number}: {stage.name} HF {stage.hitFactor} A{stage.alphas} C{stage.charlies} M{stage.misses} P{stage.penalties}/{stage.penaltyCount}",
                &scope,
            )
            .unwrap();
        assert_eq!(text, "Stage 3: Speed Trap HF 7.7465 A14 C3 M1 P3/1");
    }

    #[test]
    fn test_stage_penalties_and_dq_come_from_provider() {
        let mut result = result();
        result.stages[0] = StageResult {
            penalties: 3,
            dq: true,
            division_rate: Some(88.0),
            score: StageScore::default(),
            ..result.stages[0].clone()
        };
        let scope = RenderScope {
            match_result: &result,
            stage: result.stages.first(),
        };
        let adapter = VarTemplateAdapter::new();
        let text = adapter
            .render("P{stage.penalties} DQ{stage.dq}", &scope)
            .unwrap();
        assert_eq!(text, "P3 DQtrue");

        let text = adapter
            .render("{stage.penaltyCount}|{stage.divisionRate}|{stage.overallRate}", &scope)
            .unwrap();
        assert_eq!(text, "0|88.00|");
    }

    #[test]
    fn test_unknown_and_unbalanced_braces_are_kept() {
        let ctx = TemplateContext::new().with_var("a", "1");
        let (text, unknown) = ctx.substitute("{a} {b} {oops {a}} }");
        assert_eq!(text, "1 {b} {oops 1} }");
        assert_eq!(unknown, vec!["b".to_string()]);
    }

    #[test]
    fn test_totals() {
        let ctx = TemplateContext::new().with_match(&result());
        assert_eq!(ctx.get("totals.alphas"), Some("14"));
        assert_eq!(ctx.get("totals.points"), Some("110"));
        assert_eq!(ctx.get("totals.stages"), Some("1"));
        assert_eq!(ctx.get("totals.penalties"), Some("3"));
        assert_eq!(ctx.get("totals.penaltyCount"), Some("1"));
        assert_eq!(ctx.get("match.dateLong"), Some("12 May 2024"));
    }
}
