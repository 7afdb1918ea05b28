//! Pipeline orchestrator
//!
//! Runs a [`PipelinePlan`]: the title chain first, then the clip chains
//! concurrently up to the worker limit, then the merge. Jobs inside a chain
//! run strictly in order. The first failure cancels every sibling chain and
//! no further job is submitted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::planner::{JobChain, PipelinePlan};
use crate::ports::*;

/// Run-level switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Clip chains running at the same time
    pub workers: usize,
    /// Keep intermediates after success
    pub keep_intermediates: bool,
    /// Keep completed artifacts after an abort
    pub keep_on_failure: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            keep_intermediates: false,
            keep_on_failure: true,
        }
    }
}

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Title,
    Clips,
    Merge,
    Done,
    Aborted,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub output: PathBuf,
    pub jobs: usize,
    pub elapsed: Duration,
    /// Intermediates deleted after the merge
    pub removed: usize,
}

#[derive(Debug, Default)]
struct PipelineRun {
    state: PipelineState,
    statuses: BTreeMap<JobId, JobStatus>,
    artifacts: Vec<Artifact>,
}

/// Executes job plans against the engine ports
#[derive(Clone)]
pub struct PipelineOrchestrator {
    transcode: Arc<dyn TranscodePort>,
    probe: Arc<dyn ProbePort>,
    fs: Arc<dyn FsPort>,
    progress: Arc<dyn ProgressPort>,
    options: PipelineOptions,
    run: Arc<Mutex<PipelineRun>>,
}

impl PipelineOrchestrator {
    pub fn new(
        transcode: Arc<dyn TranscodePort>,
        probe: Arc<dyn ProbePort>,
        fs: Arc<dyn FsPort>,
        progress: Arc<dyn ProgressPort>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            transcode,
            probe,
            fs,
            progress,
            options,
            run: Arc::new(Mutex::new(PipelineRun::default())),
        }
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    pub fn state(&self) -> PipelineState {
        self.run
            .lock()
            .map(|run| run.state)
            .unwrap_or(PipelineState::Aborted)
    }

    pub fn status(&self, job: &JobId) -> Option<JobStatus> {
        self.run.lock().ok()?.statuses.get(job).cloned()
    }

    /// Artifacts produced so far, in completion order
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.run
            .lock()
            .map(|run| run.artifacts.clone())
            .unwrap_or_default()
    }

    fn set_state(&self, state: PipelineState) {
        if let Ok(mut run) = self.run.lock() {
            debug!("Pipeline {:?} -> {:?}", run.state, state);
            run.state = state;
        }
    }

    fn set_status(&self, job: &JobId, status: JobStatus) {
        if let Ok(mut run) = self.run.lock() {
            if let JobStatus::Succeeded(path) = &status {
                run.artifacts.push(Artifact {
                    path: path.clone(),
                    producer: job.clone(),
                });
            }
            run.statuses.insert(job.clone(), status);
        }
    }

    fn reset(&self, plan: &PipelinePlan) {
        if let Ok(mut run) = self.run.lock() {
            run.state = PipelineState::Idle;
            run.artifacts.clear();
            run.statuses = plan
                .jobs()
                .map(|job| (job.id.clone(), JobStatus::Created))
                .collect();
        }
    }

    /// Execute the whole plan
    pub async fn run(&self, plan: &PipelinePlan) -> Result<RunReport, DomainError> {
        if self.options.workers == 0 {
            return Err(DomainError::Configuration(
                "Worker limit must be at least 1".to_string(),
            ));
        }
        let started = Instant::now();
        self.reset(plan);

        if let Some(work_dir) = plan.merge.output.parent() {
            self.fs.ensure_dir(work_dir).await?;
        }
        self.progress.plan_started(plan.job_count());

        let cancel = CancellationToken::new();
        match self.execute(plan, &cancel).await {
            Ok(output) => {
                self.set_state(PipelineState::Done);
                let removed = self.remove_intermediates(plan).await;
                let report = RunReport {
                    output,
                    jobs: plan.job_count(),
                    elapsed: started.elapsed(),
                    removed,
                };
                info!(
                    artifact = %report.output.display(),
                    "Report rendered in {:.1}s",
                    report.elapsed.as_secs_f64()
                );
                Ok(report)
            }
            Err(err) => {
                cancel.cancel();
                self.set_state(PipelineState::Aborted);
                error!("Pipeline aborted: {}", err);
                if !self.options.keep_on_failure {
                    self.remove_completed().await;
                }
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        plan: &PipelinePlan,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DomainError> {
        if let Some(title) = plan.title() {
            self.set_state(PipelineState::Title);
            self.run_chain(title, cancel).await?;
        }

        self.set_state(PipelineState::Clips);
        self.run_clip_chains(plan.clip_chains().cloned().collect(), cancel)
            .await?;

        self.set_state(PipelineState::Merge);
        info!(segments = plan.merge_list().len(), "Merging segments");
        self.run_job(plan.merge.clone(), cancel).await
    }

    /// Run independent chains with at most `workers` in flight
    async fn run_clip_chains(
        &self,
        chains: Vec<JobChain>,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        let semaphore = Arc::new(Semaphore::new(self.options.workers));
        let mut tasks = JoinSet::new();

        for chain in chains {
            let this = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Err(DomainError::Cancelled(chain.label.clone()));
                    }
                    permit = semaphore.acquire_owned() => permit
                        .map_err(|_| DomainError::Cancelled(chain.label.clone()))?,
                };

                let result = this.run_chain(&chain, &cancel).await;
                if result.is_err() {
                    // stop siblings before this worker slot frees up
                    cancel.cancel();
                }
                drop(permit);
                result
            });
        }

        let mut first_error: Option<DomainError> = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined.unwrap_or_else(|e| {
                cancel.cancel();
                Err(DomainError::Cancelled(format!("worker ({})", e)))
            });
            if let Err(err) = result {
                // a real failure outranks the cancellations it caused
                let replace = match &first_error {
                    None => true,
                    Some(DomainError::Cancelled(_)) => !matches!(err, DomainError::Cancelled(_)),
                    Some(_) => false,
                };
                if replace {
                    first_error = Some(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn run_chain(
        &self,
        chain: &JobChain,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DomainError> {
        debug!(chain = %chain.label, jobs = chain.jobs.len(), "Starting chain");
        let mut last = None;
        for job in &chain.jobs {
            if cancel.is_cancelled() {
                self.set_status(&job.id, JobStatus::Cancelled);
                return Err(DomainError::Cancelled(job.id.to_string()));
            }
            last = Some(self.run_job(job.clone(), cancel).await?);
        }
        last.ok_or_else(|| {
            DomainError::Configuration(format!("chain {} has no jobs", chain.label))
        })
    }

    /// Resolve, submit and track one job
    async fn run_job(
        &self,
        mut job: EncodeJob,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DomainError> {
        if let Some(source) = job.optional_audio_source().map(Path::to_path_buf) {
            self.ensure_audio(&mut job, &source)
                .await
                .map_err(|e| as_job_failure(&job, e))
                .map_err(|e| self.fail(&job, e))?;
        }
        if let Some(input) = job.needs_probe().map(Path::to_path_buf) {
            let duration = self
                .probe
                .duration(&input)
                .await
                .map_err(|e| as_job_failure(&job, e))
                .map_err(|e| self.fail(&job, e))?;
            debug!(job = %job.id, duration, "Resolved fade from input duration");
            job.resolve_fades(duration);
        }

        self.set_status(&job.id, JobStatus::Submitted);
        info!(job = %job.id, stage = %job.kind, "Submitting job");

        let (tx, mut rx) = mpsc::unbounded_channel::<JobProgress>();
        let forward = async {
            while let Some(event) = rx.recv().await {
                self.progress.report(&job.id, event.percent, event.frames);
                self.set_status(
                    &job.id,
                    JobStatus::Running {
                        percent: event.percent,
                    },
                );
            }
        };
        let submit = self.transcode.submit(&job, tx, cancel.clone());
        let (result, ()) = tokio::join!(submit, forward);

        match result {
            Ok(path) => {
                let status = JobStatus::Succeeded(path.clone());
                self.progress.finished(&job.id, &status);
                self.set_status(&job.id, status);
                Ok(path)
            }
            Err(DomainError::Cancelled(message)) => {
                self.progress.finished(&job.id, &JobStatus::Cancelled);
                self.set_status(&job.id, JobStatus::Cancelled);
                Err(DomainError::Cancelled(message))
            }
            Err(err) => Err(self.fail(&job, as_job_failure(&job, err))),
        }
    }

    /// Give a job reading an audio-less source a silent track instead
    async fn ensure_audio(&self, job: &mut EncodeJob, source: &Path) -> Result<(), DomainError> {
        if self.probe.has_audio(source).await? {
            return Ok(());
        }
        let duration = match job.expected_duration {
            Some(duration) => duration,
            None => self.probe.duration(source).await?,
        };
        debug!(job = %job.id, source = %source.display(), "Source has no audio, adding silence");
        job.fill_silence(duration);
        Ok(())
    }

    fn fail(&self, job: &EncodeJob, err: DomainError) -> DomainError {
        let status = JobStatus::Failed(err.to_string());
        self.progress.finished(&job.id, &status);
        self.set_status(&job.id, status);
        err
    }

    async fn remove_intermediates(&self, plan: &PipelinePlan) -> usize {
        if self.options.keep_intermediates || self.progress.is_diagnostics_enabled() {
            info!("Keeping intermediate artifacts");
            return 0;
        }
        let mut removed = 0;
        for path in plan.intermediates() {
            if path == plan.merge.output {
                continue;
            }
            if !self.fs.exists(&path).await {
                continue;
            }
            match self.fs.remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove intermediate: {}", e),
            }
        }
        debug!(removed, "Removed intermediates");
        removed
    }

    /// Best-effort cleanup after an abort
    async fn remove_completed(&self) {
        for artifact in self.artifacts() {
            if let Err(e) = self.fs.remove_file(&artifact.path).await {
                warn!("Failed to remove {}: {}", artifact.path.display(), e);
            }
        }
    }
}

/// Errors raised while running a job always name the job
fn as_job_failure(job: &EncodeJob, err: DomainError) -> DomainError {
    match err {
        DomainError::TranscodeJob { .. } | DomainError::Cancelled(_) => err,
        DomainError::Probe { path, message } => DomainError::TranscodeJob {
            job: job.id.to_string(),
            stage: job.kind.to_string(),
            message: format!("probe of {} failed: {}", path, message),
        },
        other => DomainError::TranscodeJob {
            job: job.id.to_string(),
            stage: job.kind.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter_graph::FilterGraph;
    use std::collections::BTreeSet;

    fn job() -> EncodeJob {
        EncodeJob {
            id: JobId::new("clip1.fadeOut"),
            kind: JobKind::FadeOut,
            inputs: vec![JobInput::Artifact(PathBuf::from("clip1.fadeIn.mp4"))],
            graph: FilterGraph::new(),
            maps: Vec::new(),
            audio: AudioHandling::Copy,
            output: PathBuf::from("clip1.fadeOut.mp4"),
            depends_on: BTreeSet::new(),
            expected_duration: None,
        }
    }

    #[test]
    fn test_probe_error_becomes_job_error() {
        let err = as_job_failure(
            &job(),
            DomainError::Probe {
                path: "clip1.fadeIn.mp4".to_string(),
                message: "no such file".to_string(),
            },
        );
        match err {
            DomainError::TranscodeJob {
                job,
                stage,
                message,
            } => {
                assert_eq!(job, "clip1.fadeOut");
                assert_eq!(stage, "fade-out");
                assert!(message.contains("no such file"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_cancellation_passes_through() {
        let err = as_job_failure(&job(), DomainError::Cancelled("clip1.fadeOut".to_string()));
        assert_eq!(err, DomainError::Cancelled("clip1.fadeOut".to_string()));
    }
}
