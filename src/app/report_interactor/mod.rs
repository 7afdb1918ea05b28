// Report interactor - Turns match data and a layout into a rendered report

use std::sync::Arc;

use tracing::{debug, info};

use crate::app::orchestrator::{PipelineOrchestrator, RunReport};
use crate::domain::errors::*;
use crate::domain::match_result::MatchResult;
use crate::domain::model::*;
use crate::domain::report::{ClipDraft, ReportLayout};
use crate::domain::rules::*;
use crate::planner::{plan_pipeline, PipelinePlan, TitleCard};
use crate::ports::*;

/// Everything needed to render one competitor's report
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub match_id: String,
    pub shooter_id: String,
    pub layout: ReportLayout,
    pub settings: RenderSettings,
}

/// Validated inputs and the plan derived from them
#[derive(Debug, Clone)]
pub struct PreparedReport {
    pub match_result: MatchResult,
    pub title: Option<TitleCard>,
    pub clips: Vec<ClipSpec>,
    pub plan: PipelinePlan,
}

/// Interactor for the report use case
pub struct ReportInteractor {
    match_data: Arc<dyn MatchDataPort>,
    templates: Arc<dyn TemplatePort>,
    orchestrator: PipelineOrchestrator,
}

impl ReportInteractor {
    pub fn new(
        match_data: Arc<dyn MatchDataPort>,
        templates: Arc<dyn TemplatePort>,
        orchestrator: PipelineOrchestrator,
    ) -> Self {
        Self {
            match_data,
            templates,
            orchestrator,
        }
    }

    pub fn orchestrator(&self) -> &PipelineOrchestrator {
        &self.orchestrator
    }

    /// Fetch, validate and plan without submitting any job.
    ///
    /// Every input and configuration error surfaces here.
    pub async fn prepare(&self, request: &ReportRequest) -> Result<PreparedReport, DomainError> {
        SettingsRules::validate(&request.settings)?;
        let drafts = request.layout.normalize()?;
        ClipRules::validate_drafts(&drafts)?;
        let title_layout = request.layout.active_title()?;
        if let Some(title) = title_layout {
            ClipRules::validate_title(title, &request.settings)?;
        }

        let match_result = self
            .match_data
            .fetch(&request.match_id, &request.shooter_id)
            .await?
            .decoded();
        match_result.validate()?;

        let title = match title_layout {
            Some(layout) => {
                let scope = RenderScope {
                    match_result: &match_result,
                    stage: None,
                };
                Some(TitleCard {
                    text: self.templates.render(&layout.template, &scope)?,
                    duration: layout.duration,
                    overlay: layout.overlay.clone(),
                    frame: layout.frame,
                })
            }
            None => None,
        };

        let clips = drafts
            .iter()
            .enumerate()
            .map(|(index, draft)| self.render_clip(index, draft, &match_result))
            .collect::<Result<Vec<_>, _>>()?;

        let plan = plan_pipeline(&request.settings, &clips, title.as_ref())?;
        info!(
            shooter = %match_result.shooter.name,
            clips = clips.len(),
            jobs = plan.job_count(),
            "Planned report"
        );

        Ok(PreparedReport {
            match_result,
            title,
            clips,
            plan,
        })
    }

    fn render_clip(
        &self,
        index: usize,
        draft: &ClipDraft,
        match_result: &MatchResult,
    ) -> Result<ClipSpec, DomainError> {
        let stage = draft
            .stage
            .map(|number| match_result.stage(number))
            .transpose()?;
        let scope = RenderScope {
            match_result,
            stage,
        };

        let text = draft
            .text_template
            .as_deref()
            .map(|template| self.templates.render(template, &scope))
            .transpose()?;

        match (text, &draft.overlay) {
            (Some(text), Some(config)) if !text.trim().is_empty() => {
                debug!(clip = index, "Caption: {:?}", text);
                Ok(draft.clip.clone().with_overlay(Overlay::new(text, config.clone())))
            }
            _ => Ok(draft.clip.clone()),
        }
    }

    /// Prepare and run the full pipeline
    pub async fn render(&self, request: &ReportRequest) -> Result<RunReport, DomainError> {
        let prepared = self.prepare(request).await?;
        self.orchestrator.run(&prepared.plan).await
    }
}
