//! # qqbot Infrastructure
//!
//! Concrete implementations of the ports defined in `qqbot-core`.
//!
//! ## Feature Flags
//!
//! - `redis` (default) - Redis-backed call log store
//!
//! Without `redis` the store is in-memory or unavailable.
//!
//! ## Job polling
//!
//! [`JobPoller`] is a port for plugin-side job sources: a plugin that
//! submits image or video generation jobs implements
//! [`qqbot_core::ports::JobStatusSource`] for its vendor and waits on it
//! with [`JobPoller::wait`]. No vendor source ships with this crate, so
//! the gateway does not call it.

pub mod call_log;
pub mod jobs;

pub use call_log::{
    InMemoryCallLogStore, RedisConfig, UnavailableCallLogStore, connect_call_log_store,
};
pub use jobs::{JobPoller, PollError};

#[cfg(feature = "redis")]
pub use call_log::RedisCallLogStore;
