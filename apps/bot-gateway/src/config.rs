//! Application configuration loaded from environment variables.

use std::env;

use qqbot_core::domain::{CommandPolicy, PolicyRegistry, QuotaOverrides};
use qqbot_infra::RedisConfig;

const LIMIT_PREFIX: &str = "COMMAND_LIMIT_";
const OVERRIDE_PREFIX: &str = "QUOTA_OVERRIDE_";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub redis: RedisConfig,
    /// Namespace for call log keys; empty keeps `{action}_{subject}`.
    pub key_prefix: String,
    pub policies: PolicyRegistry,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            redis: RedisConfig::from_env(),
            key_prefix: env::var("RATE_LIMIT_KEY_PREFIX").unwrap_or_default(),
            policies: Self::load_policies(env::vars()),
        }
    }

    /// Built-in policies adjusted by the environment.
    ///
    /// Format:
    /// - `COMMAND_LIMIT_<CMD>=<window_minutes>,<max_count>[,global|user]`
    ///   changes or adds a command's limit.
    /// - `QUOTA_OVERRIDE_<CMD>=<subject>:<quota>;...` sets per-user quotas,
    ///   `-1` meaning unlimited.
    ///
    /// Malformed entries are logged and skipped.
    fn load_policies(vars: impl Iterator<Item = (String, String)>) -> PolicyRegistry {
        let mut registry = PolicyRegistry::builtin();
        let vars: Vec<(String, String)> = vars.collect();

        for (key, value) in &vars {
            let Some(command) = key.strip_prefix(LIMIT_PREFIX).map(str::to_lowercase) else {
                continue;
            };

            let mut policy = match registry.get(&command) {
                Ok(existing) => existing.clone(),
                Err(_) => CommandPolicy::per_user(command.as_str(), 1.0, 0),
            };
            match policy.apply_limit_spec(value) {
                Ok(()) => registry.insert(policy),
                Err(e) => tracing::warn!(variable = %key, error = %e, "Ignoring command limit"),
            }
        }

        for (key, value) in &vars {
            let Some(command) = key.strip_prefix(OVERRIDE_PREFIX).map(str::to_lowercase) else {
                continue;
            };

            let Some(policy) = registry.get_mut(&command) else {
                tracing::warn!(variable = %key, "Ignoring overrides for unknown command");
                continue;
            };
            match QuotaOverrides::parse(value) {
                Ok(overrides) => policy.overrides = overrides,
                Err(e) => tracing::warn!(variable = %key, error = %e, "Ignoring quota overrides"),
            }
        }

        registry
    }
}
