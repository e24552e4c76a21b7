//! Sliding-window rate limiter over a call log store.
//!
//! Each `(action, subject)` pair owns a list of accepted-call timestamps.
//! A check counts the entries newer than `now - window` and, when under
//! quota, rewrites the list as exactly those entries plus `now`. Stale
//! entries are therefore pruned on every accepted call, and a refused call
//! never touches the store.
//!
//! The read and the rewrite are separate round-trips. Two concurrent
//! checks on one key can both see an under-quota count and both be
//! accepted; for chat throttling that is tolerated.
//!
//! Store failures never escape: every check resolves to a `bool`, using
//! the caller's `default_on_unavailable` when the store cannot answer.

use std::sync::Arc;

use crate::domain::{CommandPolicy, Quota, QuotaOverrides, RateLimitKey, SubjectId};
use crate::ports::{CALL_LOG_TTL, CallLogError, CallLogStore, Clock, SystemClock};

/// Rate limiter service. Construct once and share through an `Arc`.
pub struct SlidingWindowLimiter {
    store: Arc<dyn CallLogStore>,
    clock: Arc<dyn Clock>,
    key_prefix: Option<String>,
}

impl SlidingWindowLimiter {
    pub fn new(store: Arc<dyn CallLogStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            key_prefix: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Namespace storage keys as `{prefix}:{action}_{subject}`.
    /// An empty prefix keeps the bare key.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.key_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Name of the backing store, e.g. `redis`.
    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    fn storage_key(&self, key: &RateLimitKey) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key.storage_key()),
            None => key.storage_key(),
        }
    }

    /// Decide whether `action` may run for `subject` now, allowing at most
    /// `max_count` accepted calls in the trailing `window_minutes`.
    /// Accepted calls are recorded; refused ones are not.
    pub async fn check(
        &self,
        action: &str,
        subject: impl Into<SubjectId>,
        window_minutes: f64,
        max_count: u32,
        default_on_unavailable: bool,
    ) -> bool {
        let key = RateLimitKey::new(action, subject);

        match self.try_check(&key, window_minutes, max_count).await {
            Ok(allowed) => allowed,
            Err(CallLogError::Unavailable(reason)) => {
                tracing::debug!(
                    key = %key,
                    reason = %reason,
                    default = default_on_unavailable,
                    "Call log store unavailable, using default"
                );
                default_on_unavailable
            }
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    error = %e,
                    default = default_on_unavailable,
                    "Rate limit check failed, using default"
                );
                default_on_unavailable
            }
        }
    }

    async fn try_check(
        &self,
        key: &RateLimitKey,
        window_minutes: f64,
        max_count: u32,
    ) -> Result<bool, CallLogError> {
        let storage_key = self.storage_key(key);
        let now = self.clock.now();
        let cutoff = now - window_minutes * 60.0;

        let stored = self.store.fetch(&storage_key).await?;
        let mut retained: Vec<f64> = stored
            .iter()
            .filter_map(|entry| entry.trim().parse::<f64>().ok())
            .filter(|ts| *ts > cutoff)
            .collect();

        if retained.len() >= max_count as usize {
            tracing::debug!(
                key = %key,
                count = retained.len(),
                max_count,
                "Rate limit reached"
            );
            return Ok(false);
        }

        retained.push(now);
        let entries: Vec<String> = retained.iter().map(f64::to_string).collect();
        self.store
            .replace(&storage_key, &entries, CALL_LOG_TTL)
            .await?;

        tracing::debug!(key = %key, count = entries.len(), max_count, "Call accepted");
        Ok(true)
    }

    /// Like [`check`](Self::check), but `overrides` may replace
    /// `default_max_count` for this subject. An unlimited override passes
    /// without reading or writing the store. Store failures refuse.
    pub async fn check_with_overrides(
        &self,
        action: &str,
        subject: impl Into<SubjectId>,
        window_minutes: f64,
        default_max_count: u32,
        overrides: &QuotaOverrides,
    ) -> bool {
        let subject = subject.into();

        match overrides.resolve(&subject, default_max_count) {
            Quota::Unlimited => {
                tracing::debug!(action, subject = %subject, "Unlimited subject, skipping check");
                true
            }
            Quota::Limited(max_count) => {
                self.check(action, subject, window_minutes, max_count, false)
                    .await
            }
        }
    }

    /// Run one invocation of a command through its policy.
    ///
    /// Overrides are looked up by the calling user even for global
    /// policies, so a listed user can bypass or reshape a shared quota.
    pub async fn admit(&self, policy: &CommandPolicy, user_id: impl Into<SubjectId>) -> bool {
        let user_id = user_id.into();

        match policy.overrides.resolve(&user_id, policy.max_count) {
            Quota::Unlimited => {
                tracing::debug!(
                    command = %policy.command,
                    user = %user_id,
                    "Unlimited user, skipping check"
                );
                true
            }
            Quota::Limited(max_count) => {
                self.check(
                    &policy.action,
                    policy.subject_for(&user_id),
                    policy.window_minutes,
                    max_count,
                    policy.default_on_unavailable,
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::ports::ManualClock;

    /// Store that keeps lists in a map and counts every call.
    #[derive(Default)]
    struct RecordingStore {
        lists: Mutex<HashMap<String, Vec<String>>>,
        ttls: Mutex<HashMap<String, Duration>>,
        fetches: AtomicUsize,
        replaces: AtomicUsize,
        failing: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }

        fn seed(&self, key: &str, entries: &[&str]) {
            self.lists.lock().unwrap().insert(
                key.to_string(),
                entries.iter().map(|e| e.to_string()).collect(),
            );
        }

        fn list(&self, key: &str) -> Vec<String> {
            self.lists
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .unwrap_or_default()
        }

        fn calls(&self) -> usize {
            self.fetches.load(Ordering::SeqCst) + self.replaces.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CallLogStore for RecordingStore {
        async fn fetch(&self, key: &str) -> Result<Vec<String>, CallLogError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return Err(CallLogError::Connection("connection refused".to_string()));
            }
            Ok(self.list(key))
        }

        async fn replace(
            &self,
            key: &str,
            entries: &[String],
            ttl: Duration,
        ) -> Result<(), CallLogError> {
            self.replaces.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return Err(CallLogError::Operation("pipeline aborted".to_string()));
            }
            self.lists
                .lock()
                .unwrap()
                .insert(key.to_string(), entries.to_vec());
            self.ttls.lock().unwrap().insert(key.to_string(), ttl);
            Ok(())
        }

        fn backend(&self) -> &'static str {
            "recording"
        }
    }

    fn limiter(store: &Arc<RecordingStore>, clock: &Arc<ManualClock>) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(store.clone()).with_clock(clock.clone())
    }

    #[tokio::test]
    async fn test_two_per_hour_scenario() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(0.0));
        let limiter = limiter(&store, &clock);

        assert!(limiter.check("cmd", "u1", 60.0, 2, false).await);
        assert_eq!(store.list("cmd_u1"), vec!["0"]);

        clock.set(10.0);
        assert!(limiter.check("cmd", "u1", 60.0, 2, false).await);
        assert_eq!(store.list("cmd_u1"), vec!["0", "10"]);

        clock.set(20.0);
        assert!(!limiter.check("cmd", "u1", 60.0, 2, false).await);
        assert_eq!(store.list("cmd_u1"), vec!["0", "10"]);

        // Cutoff is 1: the call at 0 has left the window, the one at 10 has not.
        clock.set(3601.0);
        assert!(limiter.check("cmd", "u1", 60.0, 2, false).await);
        assert_eq!(store.list("cmd_u1"), vec!["10", "3601"]);
    }

    #[tokio::test]
    async fn test_full_window_eviction_resets_log() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(0.0));
        let limiter = limiter(&store, &clock);

        assert!(limiter.check("cmd", "u1", 60.0, 2, false).await);
        clock.set(10.0);
        assert!(limiter.check("cmd", "u1", 60.0, 2, false).await);
        clock.set(20.0);
        assert!(!limiter.check("cmd", "u1", 60.0, 2, false).await);

        clock.set(3611.0);
        assert!(limiter.check("cmd", "u1", 60.0, 2, false).await);
        assert_eq!(store.list("cmd_u1"), vec!["3611"]);
    }

    #[tokio::test]
    async fn test_rejection_leaves_store_untouched() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(1000.0));
        let limiter = limiter(&store, &clock);

        assert!(limiter.check("cmd", "u1", 5.0, 1, false).await);
        let before = store.list("cmd_u1");
        let replaces = store.replaces.load(Ordering::SeqCst);

        assert!(!limiter.check("cmd", "u1", 5.0, 1, false).await);
        assert!(!limiter.check("cmd", "u1", 5.0, 1, false).await);

        assert_eq!(store.list("cmd_u1"), before);
        assert_eq!(store.replaces.load(Ordering::SeqCst), replaces);
    }

    #[tokio::test]
    async fn test_never_more_than_max_in_any_window() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(0.0));
        let limiter = limiter(&store, &clock);
        let window_secs = 60.0 * 60.0;
        let mut accepted: Vec<f64> = Vec::new();

        for step in 0..200 {
            clock.set(step as f64 * 7.0 * 60.0);
            if limiter.check("cmd", "u1", 60.0, 3, false).await {
                accepted.push(clock.now());
            }
        }

        assert!(!accepted.is_empty());
        for &t in &accepted {
            let in_window = accepted
                .iter()
                .filter(|&&a| a > t - window_secs && a <= t)
                .count();
            assert!(in_window <= 3, "{in_window} accepted in window ending at {t}");
        }
    }

    #[tokio::test]
    async fn test_entry_on_cutoff_is_excluded() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(600.0));
        let limiter = limiter(&store, &clock);
        store.seed("cmd_u1", &["0"]);

        assert!(limiter.check("cmd", "u1", 10.0, 1, false).await);
        assert_eq!(store.list("cmd_u1"), vec!["600"]);
    }

    #[tokio::test]
    async fn test_sub_minute_window() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(100.0));
        let limiter = limiter(&store, &clock);

        assert!(limiter.check("cmd", "u1", 0.5, 1, false).await);
        clock.advance(29.0);
        assert!(!limiter.check("cmd", "u1", 0.5, 1, false).await);
        clock.advance(2.0);
        assert!(limiter.check("cmd", "u1", 0.5, 1, false).await);
    }

    #[tokio::test]
    async fn test_corrupt_entries_are_skipped() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(100.0));
        let limiter = limiter(&store, &clock);
        store.seed("cmd_u1", &["abc", "", " 90.5 ", "NaN", "{}"]);

        assert!(limiter.check("cmd", "u1", 60.0, 2, false).await);
        assert_eq!(store.list("cmd_u1"), vec!["90.5", "100"]);

        assert!(!limiter.check("cmd", "u1", 60.0, 2, false).await);
    }

    #[tokio::test]
    async fn test_accepted_call_sets_safety_ttl() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(100.0));
        let limiter = limiter(&store, &clock);

        assert!(limiter.check("cmd", "u1", 60.0, 1, false).await);
        let ttls = store.ttls.lock().unwrap();
        assert_eq!(ttls.get("cmd_u1"), Some(&Duration::from_secs(2_592_000)));
    }

    #[tokio::test]
    async fn test_zero_quota_refuses() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(100.0));
        let limiter = limiter(&store, &clock);

        assert!(!limiter.check("cmd", "u1", 60.0, 0, true).await);
        assert!(store.list("cmd_u1").is_empty());
    }

    #[tokio::test]
    async fn test_outage_returns_configured_default() {
        let store = Arc::new(RecordingStore::failing());
        let clock = Arc::new(ManualClock::new(100.0));
        let limiter = limiter(&store, &clock);

        for _ in 0..3 {
            assert!(limiter.check("cmd", "u1", 60.0, 2, true).await);
            assert!(!limiter.check("cmd", "u1", 60.0, 2, false).await);
        }
        assert!(
            !limiter
                .check_with_overrides("cmd", "u1", 60.0, 2, &QuotaOverrides::new())
                .await
        );
    }

    #[tokio::test]
    async fn test_unlimited_override_never_touches_store() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(100.0));
        let limiter = limiter(&store, &clock);
        let overrides = QuotaOverrides::new().with("42", Quota::Unlimited);

        for _ in 0..10 {
            assert!(
                limiter
                    .check_with_overrides("aiimg", 42_i64, 60.0, 1, &overrides)
                    .await
            );
            assert!(
                limiter
                    .check_with_overrides("aiimg", "42", 60.0, 1, &overrides)
                    .await
            );
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_limited_override_replaces_default() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(100.0));
        let limiter = limiter(&store, &clock);
        let overrides = QuotaOverrides::new().with(7_i64, Quota::Limited(3));

        for _ in 0..3 {
            assert!(
                limiter
                    .check_with_overrides("aiimg", "7", 60.0, 1, &overrides)
                    .await
            );
        }
        assert!(
            !limiter
                .check_with_overrides("aiimg", "7", 60.0, 1, &overrides)
                .await
        );

        // Everyone else keeps the default.
        assert!(
            limiter
                .check_with_overrides("aiimg", "8", 60.0, 1, &overrides)
                .await
        );
        assert!(
            !limiter
                .check_with_overrides("aiimg", "8", 60.0, 1, &overrides)
                .await
        );
    }

    #[tokio::test]
    async fn test_global_policy_is_shared_across_users() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(100.0));
        let limiter = limiter(&store, &clock);
        let policy = CommandPolicy::global("aivideo", 1440.0, 2);

        assert!(limiter.admit(&policy, 1_i64).await);
        assert!(limiter.admit(&policy, 2_i64).await);
        assert!(!limiter.admit(&policy, 3_i64).await);
        assert_eq!(store.list("aivideo_*").len(), 2);
    }

    #[tokio::test]
    async fn test_per_user_policy_with_overrides() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(100.0));
        let limiter = limiter(&store, &clock);
        let policy = CommandPolicy::per_user("aiimg", 11520.0, 1)
            .with_overrides(QuotaOverrides::new().with("10001", Quota::Unlimited));

        assert!(limiter.admit(&policy, "20002").await);
        assert!(!limiter.admit(&policy, "20002").await);
        assert!(limiter.admit(&policy, "30003").await);

        for _ in 0..5 {
            assert!(limiter.admit(&policy, 10001_i64).await);
        }
        assert!(store.list("aiimg_10001").is_empty());
    }

    #[tokio::test]
    async fn test_policy_default_applies_on_outage() {
        let store = Arc::new(RecordingStore::failing());
        let clock = Arc::new(ManualClock::new(100.0));
        let limiter = limiter(&store, &clock);

        let closed = CommandPolicy::global("aivideo", 1440.0, 5);
        let open = CommandPolicy::global("aivideo", 1440.0, 5).fail_open(true);

        assert!(!limiter.admit(&closed, 1_i64).await);
        assert!(limiter.admit(&open, 1_i64).await);
    }

    #[tokio::test]
    async fn test_per_user_policy_default_differs_from_overrides_check() {
        let store = Arc::new(RecordingStore::failing());
        let clock = Arc::new(ManualClock::new(100.0));
        let limiter = limiter(&store, &clock);

        let closed = CommandPolicy::per_user("aiimg", 60.0, 4);
        let open = CommandPolicy::per_user("aiimg", 60.0, 4).fail_open(true);

        assert!(!limiter.admit(&closed, 10001_i64).await);
        assert!(limiter.admit(&open, 10001_i64).await);
        assert!(
            !limiter
                .check_with_overrides("aiimg", 10001_i64, 60.0, 4, &open.overrides)
                .await
        );
    }

    #[tokio::test]
    async fn test_key_prefix_namespaces_storage() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(100.0));
        let limiter = limiter(&store, &clock).with_key_prefix("qqbot");

        assert!(limiter.check("cmd", "u1", 60.0, 1, false).await);
        assert_eq!(store.list("qqbot:cmd_u1"), vec!["100"]);
        assert!(store.list("cmd_u1").is_empty());
        assert_eq!(limiter.backend(), "recording");
    }
}
