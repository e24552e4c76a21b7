//! Quotas and per-subject overrides.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::SubjectId;
use crate::error::DomainError;

/// Maximum number of accepted calls inside a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Quota {
    Limited(u32),
    /// Never throttled and never recorded.
    Unlimited,
}

impl Quota {
    /// Raw value that override tables use for "unlimited".
    pub const UNLIMITED_RAW: i64 = -1;

    /// Interpret a raw integer quota. Negative values other than `-1`
    /// refuse everything.
    pub fn from_raw(raw: i64) -> Self {
        if raw == Self::UNLIMITED_RAW {
            Quota::Unlimited
        } else {
            Quota::Limited(raw.clamp(0, u32::MAX as i64) as u32)
        }
    }

    pub fn to_raw(self) -> i64 {
        match self {
            Quota::Limited(n) => n as i64,
            Quota::Unlimited => Self::UNLIMITED_RAW,
        }
    }
}

impl From<i64> for Quota {
    fn from(raw: i64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<Quota> for i64 {
    fn from(quota: Quota) -> Self {
        quota.to_raw()
    }
}

/// Per-subject quotas that supersede a feature's default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotaOverrides(HashMap<SubjectId, Quota>);

impl QuotaOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, subject: impl Into<SubjectId>, quota: Quota) -> Self {
        self.insert(subject, quota);
        self
    }

    pub fn insert(&mut self, subject: impl Into<SubjectId>, quota: Quota) {
        self.0.insert(subject.into(), quota);
    }

    pub fn get(&self, subject: &SubjectId) -> Option<Quota> {
        self.0.get(subject).copied()
    }

    /// The subject's override, or `Limited(default_max)` when none is set.
    pub fn resolve(&self, subject: &SubjectId, default_max: u32) -> Quota {
        self.get(subject).unwrap_or(Quota::Limited(default_max))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse `subject:quota` pairs separated by `;` or `,`,
    /// e.g. `10001:-1;10002:10`.
    pub fn parse(spec: &str) -> Result<Self, DomainError> {
        let mut overrides = Self::new();

        for pair in spec.split([';', ',']).map(str::trim).filter(|p| !p.is_empty()) {
            let (subject, quota) = pair.rsplit_once(':').ok_or_else(|| {
                DomainError::Validation(format!("override `{pair}` is not `subject:quota`"))
            })?;
            let subject = subject.trim();
            if subject.is_empty() {
                return Err(DomainError::Validation(format!(
                    "override `{pair}` has an empty subject"
                )));
            }
            let raw: i64 = quota.trim().parse().map_err(|_| {
                DomainError::Validation(format!("override `{pair}` has a non-integer quota"))
            })?;
            overrides.insert(subject, Quota::from_raw(raw));
        }

        Ok(overrides)
    }
}

impl<S: Into<SubjectId>> FromIterator<(S, Quota)> for QuotaOverrides {
    fn from_iter<I: IntoIterator<Item = (S, Quota)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(s, q)| (s.into(), q)).collect())
    }
}
