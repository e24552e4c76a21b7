//! Application state - shared across all handlers.

use std::sync::Arc;

use qqbot_core::SlidingWindowLimiter;
use qqbot_core::domain::PolicyRegistry;
use qqbot_infra::connect_call_log_store;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<SlidingWindowLimiter>,
    pub policies: Arc<PolicyRegistry>,
}

impl AppState {
    /// Connect the call log store and build the limiter once for the
    /// whole process.
    pub async fn new(config: &AppConfig) -> Self {
        let store = connect_call_log_store(&config.redis).await;
        let limiter = SlidingWindowLimiter::new(store).with_key_prefix(&config.key_prefix);

        tracing::info!(
            backend = limiter.backend(),
            commands = config.policies.len(),
            "Application state initialized"
        );

        Self::from_parts(limiter, config.policies.clone())
    }

    pub fn from_parts(limiter: SlidingWindowLimiter, policies: PolicyRegistry) -> Self {
        Self {
            limiter: Arc::new(limiter),
            policies: Arc::new(policies),
        }
    }
}
