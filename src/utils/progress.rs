//! Aggregated progress over many concurrently running jobs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Per-job progress entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JobEntry {
    pub percent: f32,
    pub frames: u64,
    pub done: bool,
}

/// Snapshot of the whole board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSnapshot {
    pub total_jobs: usize,
    pub finished_jobs: usize,
    /// Overall progress (0.0 - 100.0)
    pub percent: f64,
    pub elapsed: Duration,
    pub eta: Option<Duration>,
}

struct BoardInner {
    total_jobs: usize,
    jobs: HashMap<String, JobEntry>,
    start_time: Instant,
    /// Last reported 10% step
    last_step: u32,
}

/// Progress board with thread-safe updates
///
/// Job streams are independent; the aggregate only ever moves forward, so
/// concurrently reporting jobs can update it in any order.
#[derive(Clone)]
pub struct ProgressBoard {
    inner: Arc<Mutex<BoardInner>>,
    step: u32,
}

impl Default for ProgressBoard {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ProgressBoard {
    /// Board announcing every `step` percent of overall progress
    pub fn new(step: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BoardInner {
                total_jobs: 0,
                jobs: HashMap::new(),
                start_time: Instant::now(),
                last_step: 0,
            })),
            step: step.max(1),
        }
    }

    pub fn start(&self, total_jobs: usize) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.total_jobs = total_jobs;
            inner.jobs.clear();
            inner.start_time = Instant::now();
            inner.last_step = 0;
        }
    }

    /// Record job progress.
    ///
    /// Returns the overall percentage when it crossed a new step.
    pub fn update(&self, job: &str, percent: f32, frames: u64) -> Option<u32> {
        let mut inner = self.inner.lock().ok()?;
        let entry = inner.jobs.entry(job.to_string()).or_insert(JobEntry {
            percent: 0.0,
            frames: 0,
            done: false,
        });
        entry.percent = entry.percent.max(percent.clamp(0.0, 100.0));
        entry.frames = entry.frames.max(frames);
        self.crossed_step(&mut inner)
    }

    /// Mark a job as finished; successful jobs count as 100%
    pub fn finish(&self, job: &str, success: bool) -> Option<u32> {
        let mut inner = self.inner.lock().ok()?;
        let entry = inner.jobs.entry(job.to_string()).or_insert(JobEntry {
            percent: 0.0,
            frames: 0,
            done: false,
        });
        entry.done = true;
        if success {
            entry.percent = 100.0;
        }
        self.crossed_step(&mut inner)
    }

    fn crossed_step(&self, inner: &mut BoardInner) -> Option<u32> {
        let percent = Self::overall(inner);
        let step = (percent as u32 / self.step) * self.step;
        if step > inner.last_step {
            inner.last_step = step;
            Some(step)
        } else {
            None
        }
    }

    fn overall(inner: &BoardInner) -> f64 {
        if inner.total_jobs == 0 {
            return 0.0;
        }
        let sum: f64 = inner.jobs.values().map(|entry| entry.percent as f64).sum();
        (sum / inner.total_jobs as f64).min(100.0)
    }

    pub fn job(&self, job: &str) -> Option<JobEntry> {
        self.inner.lock().ok()?.jobs.get(job).copied()
    }

    pub fn snapshot(&self) -> Option<BoardSnapshot> {
        let inner = self.inner.lock().ok()?;
        let percent = Self::overall(&inner);
        let elapsed = inner.start_time.elapsed();
        let eta = (percent > 0.0 && percent < 100.0).then(|| {
            let total = elapsed.as_secs_f64() / (percent / 100.0);
            Duration::from_secs_f64((total - elapsed.as_secs_f64()).max(0.0))
        });
        Some(BoardSnapshot {
            total_jobs: inner.total_jobs,
            finished_jobs: inner.jobs.values().filter(|entry| entry.done).count(),
            percent,
            elapsed,
            eta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_are_reported_once() {
        let board = ProgressBoard::new(10);
        board.start(2);
        assert_eq!(board.update("a", 10.0, 5), None);
        assert_eq!(board.update("a", 40.0, 20), Some(20));
        assert_eq!(board.update("a", 41.0, 21), None);
        // regressions are ignored
        assert_eq!(board.update("a", 5.0, 1), None);
        assert_eq!(board.job("a").map(|entry| entry.percent), Some(41.0));
        assert_eq!(board.finish("b", true), Some(70));
    }

    #[test]
    fn test_snapshot() {
        let board = ProgressBoard::default();
        board.start(4);
        board.finish("a", true);
        board.finish("b", false);
        let snapshot = board.snapshot().unwrap();
        assert_eq!(snapshot.total_jobs, 4);
        assert_eq!(snapshot.finished_jobs, 2);
        assert_eq!(snapshot.percent, 25.0);
        assert!(snapshot.eta.is_some());
    }
}
