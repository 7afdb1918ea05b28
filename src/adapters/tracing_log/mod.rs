// Tracing log adapter - Progress reporting through structured logging

use tracing::{debug, info, warn};

use crate::domain::model::*;
use crate::ports::*;
use crate::utils::progress::ProgressBoard;
use crate::utils::time::format_duration;

/// Progress sink that logs per-job progress at debug level and overall
/// progress at info level
#[derive(Clone)]
pub struct TracingProgressAdapter {
    board: ProgressBoard,
    diagnostics: bool,
}

impl TracingProgressAdapter {
    pub fn new(diagnostics: bool) -> Self {
        Self {
            board: ProgressBoard::default(),
            diagnostics,
        }
    }

    pub fn board(&self) -> &ProgressBoard {
        &self.board
    }

    fn announce(&self, step: Option<u32>) {
        if let Some(step) = step {
            let eta = self
                .board
                .snapshot()
                .and_then(|snapshot| snapshot.eta)
                .map(format_duration)
                .unwrap_or_else(|| "-".to_string());
            info!(percent = step, eta = %eta, "Overall progress {}%", step);
        }
    }
}

impl ProgressPort for TracingProgressAdapter {
    fn plan_started(&self, total_jobs: usize) {
        self.board.start(total_jobs);
        info!(jobs = total_jobs, "Starting render");
    }

    fn report(&self, job: &JobId, percent: f32, frames: u64) {
        debug!(job = %job, percent, frames, "Job progress");
        let step = self.board.update(job.as_str(), percent, frames);
        self.announce(step);
    }

    fn finished(&self, job: &JobId, status: &JobStatus) {
        match status {
            JobStatus::Succeeded(path) => {
                debug!(job = %job, artifact = %path.display(), "Job succeeded");
                let step = self.board.finish(job.as_str(), true);
                self.announce(step);
            }
            JobStatus::Failed(message) => {
                warn!(job = %job, "Job failed: {}", message);
                self.board.finish(job.as_str(), false);
            }
            JobStatus::Cancelled => {
                debug!(job = %job, "Job cancelled");
                self.board.finish(job.as_str(), false);
            }
            _ => {}
        }
    }

    fn is_diagnostics_enabled(&self) -> bool {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_board_follows_reports() {
        let adapter = TracingProgressAdapter::new(true);
        assert!(adapter.is_diagnostics_enabled());

        adapter.plan_started(2);
        let job = JobId::new("clip0.resized");
        adapter.report(&job, 50.0, 120);
        assert_eq!(adapter.board().job("clip0.resized").map(|e| e.frames), Some(120));

        adapter.finished(&job, &JobStatus::Succeeded(PathBuf::from("x.mp4")));
        let snapshot = adapter.board().snapshot().unwrap();
        assert_eq!(snapshot.finished_jobs, 1);
        assert_eq!(snapshot.percent, 50.0);
    }
}
