//! Subject identities and storage keys.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The entity a quota is tracked against.
///
/// Subjects arrive as QQ numbers (integers) or as strings, and override
/// tables are authored with either. Everything is normalized here so the
/// rest of the crate only ever compares canonical strings: the input is
/// trimmed, and anything that parses as an `i64` is re-rendered in its
/// plain decimal form (`" 0042"` and `42` are the same subject).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(String);

impl SubjectId {
    /// Subject shared by every caller of a global quota.
    pub const WILDCARD: &'static str = "*";

    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        match trimmed.parse::<i64>() {
            Ok(n) => Self(n.to_string()),
            Err(_) => Self(trimmed.to_string()),
        }
    }

    pub fn wildcard() -> Self {
        Self(Self::WILDCARD.to_string())
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == Self::WILDCARD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for SubjectId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&String> for SubjectId {
    fn from(raw: &String) -> Self {
        Self::new(raw)
    }
}

impl From<i64> for SubjectId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl From<u64> for SubjectId {
    fn from(n: u64) -> Self {
        Self::new(n.to_string())
    }
}

impl From<i32> for SubjectId {
    fn from(n: i32) -> Self {
        Self(n.to_string())
    }
}

impl From<u32> for SubjectId {
    fn from(n: u32) -> Self {
        Self(n.to_string())
    }
}

impl Serialize for SubjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SubjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawSubject {
            Signed(i64),
            Unsigned(u64),
            Text(String),
        }

        Ok(match RawSubject::deserialize(deserializer)? {
            RawSubject::Signed(n) => Self::from(n),
            RawSubject::Unsigned(n) => Self::from(n),
            RawSubject::Text(s) => Self::new(s),
        })
    }
}

/// Composite identity of a rate-limited call log: `(action, subject)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub action: String,
    pub subject: SubjectId,
}

impl RateLimitKey {
    pub fn new(action: impl Into<String>, subject: impl Into<SubjectId>) -> Self {
        Self {
            action: action.into(),
            subject: subject.into(),
        }
    }

    /// Single string key used for storage lookup.
    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.action, self.subject)
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.action, self.subject)
    }
}
