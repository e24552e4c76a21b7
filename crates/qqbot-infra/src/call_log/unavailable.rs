//! Store that is never reachable.

use std::time::Duration;

use async_trait::async_trait;

use qqbot_core::ports::{CallLogError, CallLogStore};

/// Stands in for a store that could not be configured or connected at
/// startup. Every operation fails with [`CallLogError::Unavailable`], which
/// the limiter turns into the caller's default answer.
#[derive(Debug, Clone)]
pub struct UnavailableCallLogStore {
    reason: String,
}

impl UnavailableCallLogStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl CallLogStore for UnavailableCallLogStore {
    async fn fetch(&self, _key: &str) -> Result<Vec<String>, CallLogError> {
        Err(CallLogError::Unavailable(self.reason.clone()))
    }

    async fn replace(
        &self,
        _key: &str,
        _entries: &[String],
        _ttl: Duration,
    ) -> Result<(), CallLogError> {
        Err(CallLogError::Unavailable(self.reason.clone()))
    }

    fn backend(&self) -> &'static str {
        "unavailable"
    }
}
