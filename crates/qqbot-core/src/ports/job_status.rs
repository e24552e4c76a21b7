//! Generation job status port.

use async_trait::async_trait;

/// Where a long-running generation job (image, video) stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    /// Finished; carries the URL of the produced asset.
    Succeeded(String),
    Failed(String),
}

/// Anything that can report the status of a submitted job.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn status(&self, job_id: &str) -> Result<JobStatus, JobStatusError>;
}

#[derive(Debug, thiserror::Error)]
pub enum JobStatusError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),
}
