//! Data Transfer Objects - request/response types for the gateway API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw limiter check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitCheckRequest {
    pub action: String,
    /// QQ number or any other subject id; `*` for a global quota.
    pub subject: Value,
    pub window_minutes: f64,
    pub max_count: u32,
    #[serde(default)]
    pub default_on_unavailable: bool,
    /// Subject id to raw quota (`-1` is unlimited).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitCheckResponse {
    pub allowed: bool,
}

/// One invocation of a bot command by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionRequest {
    pub user_id: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionResponse {
    pub command: String,
    pub allowed: bool,
    /// Text to send back to the user when refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    /// Call log backend in use: `redis`, `memory` or `unavailable`.
    pub call_log_store: String,
}
