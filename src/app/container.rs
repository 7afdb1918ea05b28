use std::sync::Arc;

use crate::adapters::{
    FFmpegAdapter, FFprobeAdapter, JsonMatchAdapter, LocalFsAdapter, ReelConfig,
    TracingProgressAdapter, VarTemplateAdapter,
};
use crate::app::orchestrator::{PipelineOptions, PipelineOrchestrator};
use crate::app::report_interactor::{ReportInteractor, ReportRequest};
use crate::domain::errors::DomainError;
use crate::ports::{FsPort, MatchDataPort, ProbePort, ProgressPort, TemplatePort, TranscodePort};

pub trait AppContainer: Send + Sync {
    fn report_interactor(&self) -> Arc<ReportInteractor>;
    fn report_request(&self) -> ReportRequest;
}

pub struct DefaultAppContainer {
    config: ReelConfig,
    report_interactor: Arc<ReportInteractor>,
}

impl DefaultAppContainer {
    /// Wire the production adapters. `diagnostics` keeps intermediates and
    /// logs per-job progress.
    pub fn new(config: ReelConfig, diagnostics: bool) -> Result<Self, DomainError> {
        config.validate()?;

        let transcode_port = Arc::new(FFmpegAdapter::new(
            config.engine.ffmpeg.clone(),
            config.encoding.clone(),
        ));
        let probe_port = Arc::new(FFprobeAdapter::new(config.engine.ffprobe.clone()));
        let fs_port = Arc::new(LocalFsAdapter::new());
        let progress_port = Arc::new(TracingProgressAdapter::new(diagnostics));
        let match_port = Arc::new(JsonMatchAdapter::new(config.source.dir.clone()));
        let template_port = Arc::new(VarTemplateAdapter::new());

        let options = PipelineOptions {
            workers: config.pipeline.workers,
            keep_intermediates: config.pipeline.keep_intermediates,
            keep_on_failure: config.pipeline.keep_on_failure,
        };

        let orchestrator = PipelineOrchestrator::new(
            transcode_port as Arc<dyn TranscodePort>,
            probe_port as Arc<dyn ProbePort>,
            fs_port as Arc<dyn FsPort>,
            progress_port as Arc<dyn ProgressPort>,
            options,
        );

        let report_interactor = Arc::new(ReportInteractor::new(
            match_port as Arc<dyn MatchDataPort>,
            template_port as Arc<dyn TemplatePort>,
            orchestrator,
        ));

        Ok(Self {
            config,
            report_interactor,
        })
    }

    pub fn config(&self) -> &ReelConfig {
        &self.config
    }
}

impl AppContainer for DefaultAppContainer {
    fn report_interactor(&self) -> Arc<ReportInteractor> {
        Arc::clone(&self.report_interactor)
    }

    fn report_request(&self) -> ReportRequest {
        ReportRequest {
            match_id: self.config.source.match_id.clone(),
            shooter_id: self.config.source.shooter_id.clone(),
            layout: self.config.layout(),
            settings: self.config.render_settings(),
        }
    }
}
