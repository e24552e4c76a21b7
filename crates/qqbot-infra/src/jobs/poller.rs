//! Sleep-and-poll loop for image and video generation jobs.

use std::time::Duration;

use qqbot_core::ports::{JobStatus, JobStatusError, JobStatusSource};

/// Why waiting for a job did not produce a result.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Job failed: {0}")]
    Failed(String),

    #[error("Job still pending after {attempts} status checks")]
    TimedOut { attempts: u32 },

    #[error(transparent)]
    Source(#[from] JobStatusError),
}

/// Polls a [`JobStatusSource`] until the job settles.
#[derive(Debug, Clone)]
pub struct JobPoller {
    /// Pause before each status query.
    pub interval: Duration,
    /// Status queries before giving up.
    pub max_attempts: u32,
}

impl Default for JobPoller {
    /// Image jobs: 30 checks, 2 seconds apart.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

impl JobPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Video jobs take one to three minutes.
    pub fn for_video() -> Self {
        Self::new(Duration::from_secs(5), 36)
    }

    /// Wait for `job_id` and return the URL of the produced asset.
    pub async fn wait<S>(&self, source: &S, job_id: &str) -> Result<String, PollError>
    where
        S: JobStatusSource + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;

            match source.status(job_id).await? {
                JobStatus::Succeeded(url) => {
                    tracing::debug!(job_id, attempt, "Job succeeded");
                    return Ok(url);
                }
                JobStatus::Failed(reason) => {
                    tracing::warn!(job_id, attempt, reason = %reason, "Job failed");
                    return Err(PollError::Failed(reason));
                }
                status => {
                    tracing::trace!(job_id, attempt, ?status, "Job not finished");
                }
            }
        }

        tracing::warn!(job_id, attempts = self.max_attempts, "Gave up waiting for job");
        Err(PollError::TimedOut {
            attempts: self.max_attempts,
        })
    }
}
