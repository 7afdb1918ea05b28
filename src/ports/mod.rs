// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::*;
use crate::domain::match_result::{MatchResult, StageResult};
use crate::domain::model::*;

/// Port for running one encode job on the external engine
#[async_trait]
pub trait TranscodePort: Send + Sync {
    /// Run `job` to completion and return the artifact it wrote.
    ///
    /// Progress events go to `progress` while the engine runs. Once `cancel`
    /// fires the job must stop promptly and fail with `DomainError::Cancelled`.
    async fn submit(
        &self,
        job: &EncodeJob,
        progress: mpsc::UnboundedSender<JobProgress>,
        cancel: CancellationToken,
    ) -> Result<PathBuf, DomainError>;
}

/// Port for media probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Container duration in seconds
    async fn duration(&self, path: &Path) -> Result<f64, DomainError>;

    /// Whether the file carries at least one audio stream
    async fn has_audio(&self, path: &Path) -> Result<bool, DomainError>;
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Create directory (including parent directories)
    async fn ensure_dir(&self, path: &Path) -> Result<(), DomainError>;

    /// Delete file; a missing file is not an error
    async fn remove_file(&self, path: &Path) -> Result<(), DomainError>;

    async fn exists(&self, path: &Path) -> bool;
}

/// Port for match result lookup
#[async_trait]
pub trait MatchDataPort: Send + Sync {
    async fn fetch(&self, match_id: &str, shooter_id: &str) -> Result<MatchResult, DomainError>;
}

/// Values a template may reference
#[derive(Debug, Clone, Copy)]
pub struct RenderScope<'a> {
    pub match_result: &'a MatchResult,
    /// Stage the text belongs to, if any
    pub stage: Option<&'a StageResult>,
}

/// Port for turning text templates into overlay text
pub trait TemplatePort: Send + Sync {
    fn render(&self, template: &str, scope: &RenderScope<'_>) -> Result<String, DomainError>;
}

/// Port for progress reporting
pub trait ProgressPort: Send + Sync {
    /// Called once before any job is submitted
    fn plan_started(&self, total_jobs: usize) {
        let _ = total_jobs;
    }

    /// Progress of a running job
    fn report(&self, job: &JobId, percent: f32, frames: u64);

    /// Job reached a terminal state
    fn finished(&self, job: &JobId, status: &JobStatus) {
        let _ = (job, status);
    }

    /// Diagnostics mode keeps intermediate artifacts
    fn is_diagnostics_enabled(&self) -> bool {
        false
    }
}
