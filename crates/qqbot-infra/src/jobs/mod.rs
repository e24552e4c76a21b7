//! Long-running generation job helpers.

mod poller;

pub use poller::{JobPoller, PollError};
