//! Product Swatcher Application
//!
//! Headless shell that replays composition jobs against a session and
//! writes the exported images.

pub mod job;
mod runner;

pub use job::{Job, Step};
pub use runner::{JobRunner, RunReport, run_job_file};

use std::path::PathBuf;
use swatcher_render::RendererError;
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid job: {0}")]
    Job(#[from] serde_json::Error),
    #[error("Render error: {0}")]
    Render(#[from] RendererError),
    #[error("Usage: {0}")]
    Usage(String),
}
