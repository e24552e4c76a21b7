//! Command policies: how each bot command is throttled.

use std::collections::BTreeMap;

use super::{QuotaOverrides, SubjectId};
use crate::error::DomainError;

/// Whose call log a command is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectScope {
    /// One log per calling user.
    PerUser,
    /// One log shared by everyone, under the wildcard subject.
    Global,
}

/// Throttling rules for one bot command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandPolicy {
    /// Command name as typed by users, without prefix.
    pub command: String,
    /// Action name the call log is stored under.
    pub action: String,
    pub window_minutes: f64,
    pub max_count: u32,
    pub scope: SubjectScope,
    /// Per-user quotas, keyed by the caller's id.
    pub overrides: QuotaOverrides,
    /// Answer to give when the call log store cannot be reached.
    pub default_on_unavailable: bool,
    /// Reply text sent back when a call is refused.
    pub refusal: String,
}

impl CommandPolicy {
    pub fn per_user(command: impl Into<String>, window_minutes: f64, max_count: u32) -> Self {
        Self::new(command.into(), window_minutes, max_count, SubjectScope::PerUser)
    }

    pub fn global(command: impl Into<String>, window_minutes: f64, max_count: u32) -> Self {
        Self::new(command.into(), window_minutes, max_count, SubjectScope::Global)
    }

    fn new(command: String, window_minutes: f64, max_count: u32, scope: SubjectScope) -> Self {
        Self {
            action: command.clone(),
            refusal: format!("{command} 的使用次数已达上限，请稍后再试"),
            command,
            window_minutes,
            max_count,
            scope,
            overrides: QuotaOverrides::new(),
            default_on_unavailable: false,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_overrides(mut self, overrides: QuotaOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_refusal(mut self, refusal: impl Into<String>) -> Self {
        self.refusal = refusal.into();
        self
    }

    pub fn fail_open(mut self, open: bool) -> Self {
        self.default_on_unavailable = open;
        self
    }

    /// Subject the call is counted against for this caller.
    pub fn subject_for(&self, user_id: &SubjectId) -> SubjectId {
        match self.scope {
            SubjectScope::PerUser => user_id.clone(),
            SubjectScope::Global => SubjectId::wildcard(),
        }
    }

    /// Apply a `<window_minutes>,<max_count>[,global|user]` limit spec.
    pub fn apply_limit_spec(&mut self, spec: &str) -> Result<(), DomainError> {
        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(DomainError::Validation(format!(
                "limit `{spec}` is not `<window_minutes>,<max_count>[,global|user]`"
            )));
        }

        let window_minutes: f64 = parts[0]
            .parse()
            .ok()
            .filter(|w: &f64| w.is_finite() && *w > 0.0)
            .ok_or_else(|| {
                DomainError::Validation(format!("limit `{spec}` has an invalid window"))
            })?;
        let max_count: u32 = parts[1].parse().map_err(|_| {
            DomainError::Validation(format!("limit `{spec}` has an invalid max count"))
        })?;
        let scope = match parts.get(2).map(|s| s.to_ascii_lowercase()) {
            None => self.scope,
            Some(s) if s == "global" => SubjectScope::Global,
            Some(s) if s == "user" => SubjectScope::PerUser,
            Some(other) => {
                return Err(DomainError::Validation(format!(
                    "limit `{spec}` has unknown scope `{other}`"
                )));
            }
        };

        self.window_minutes = window_minutes;
        self.max_count = max_count;
        self.scope = scope;
        Ok(())
    }
}

/// Policies by command name.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<String, CommandPolicy>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policies the plugins ship with.
    ///
    /// - `aiimg`: 4 generations per 192 hours per user.
    /// - `aivideo`: 5 generations per day, shared by everyone.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.insert(
            CommandPolicy::per_user("aiimg", 192.0 * 60.0, 4)
                .with_refusal("生图次数已达上限（4次/192小时）"),
        );
        registry.insert(
            CommandPolicy::global("aivideo", 24.0 * 60.0, 5)
                .with_refusal("今日视频生成次数已达上限（5次/天）"),
        );
        registry
    }

    pub fn insert(&mut self, policy: CommandPolicy) {
        self.policies.insert(policy.command.clone(), policy);
    }

    pub fn get(&self, command: &str) -> Result<&CommandPolicy, DomainError> {
        self.policies
            .get(command)
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "command policy",
                id: command.to_string(),
            })
    }

    pub fn get_mut(&mut self, command: &str) -> Option<&mut CommandPolicy> {
        self.policies.get_mut(command)
    }

    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
