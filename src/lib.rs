//! MatchReel Library
//!
//! Plans and runs the ffmpeg job pipeline behind a shooting-match video
//! report. The domain and planner layers are pure; ports describe the outside
//! world and adapters implement them.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{ClipSpec, EncodeJob, JobId, Overlay, OverlayConfig};
pub use planner::{plan_pipeline, PipelinePlan};
