// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fs_local;
pub mod json_match;
pub mod probe_ffprobe;
pub mod template_vars;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::{EncodingSettings, FFmpegAdapter};
pub use fs_local::LocalFsAdapter;
pub use json_match::JsonMatchAdapter;
pub use probe_ffprobe::FFprobeAdapter;
pub use template_vars::VarTemplateAdapter;
pub use toml_config::ReelConfig;
pub use tracing_log::TracingProgressAdapter;
