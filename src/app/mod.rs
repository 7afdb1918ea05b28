// Application layer - Use case interactors

pub mod container;
pub mod orchestrator;
pub mod report_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use orchestrator::{PipelineOptions, PipelineOrchestrator, PipelineState, RunReport};
pub use report_interactor::{PreparedReport, ReportInteractor, ReportRequest};
