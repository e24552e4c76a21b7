//! # qqbot Core
//!
//! The domain layer shared by the bot plugins.
//! Rate-limit keys, quotas and command policies, the ports the
//! infrastructure must implement, and the sliding-window limiter itself.
//! No I/O happens here; stores and clocks are injected.

pub mod domain;
pub mod error;
pub mod limiter;
pub mod ports;

pub use error::DomainError;
pub use limiter::SlidingWindowLimiter;
