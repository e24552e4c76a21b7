//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod call_log;
mod clock;
mod job_status;

pub use call_log::{CALL_LOG_TTL, CallLogError, CallLogStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use job_status::{JobStatus, JobStatusError, JobStatusSource};
