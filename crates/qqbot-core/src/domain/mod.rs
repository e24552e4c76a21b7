//! Domain types for rate limiting and command admission.

mod policy;
mod quota;
mod subject;

pub use policy::{CommandPolicy, PolicyRegistry, SubjectScope};
pub use quota::{Quota, QuotaOverrides};
pub use subject::{RateLimitKey, SubjectId};
