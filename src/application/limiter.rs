//! Sliding-window rate limiting with escalating blocks.
//!
//! The limiter bounds the frequency of sensitive operations per client
//! fingerprint, per operation category. Exceeding a window's budget imposes
//! a block; checks during a block are rejected without charging the counter,
//! so continued hammering never extends the penalty and the retry hint
//! shrinks monotonically toward the block boundary.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Store};
use crate::domain::policy::{LimitCategory, RateLimitPolicy};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Key identifying one client within one operation category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LimitKey {
    fingerprint: String,
    category: LimitCategory,
}

impl LimitKey {
    pub fn new(fingerprint: impl Into<String>, category: LimitCategory) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            category,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn category(&self) -> LimitCategory {
        self.category
    }
}

/// Per-key counting state, exclusively owned by the limiter's store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// Charged attempts in the current window
    pub count: u32,
    /// When the current counting window expires
    pub window_reset_at: Instant,
    /// When set and in the future, all attempts are rejected
    pub blocked_until: Option<Instant>,
}

impl RateLimitEntry {
    /// A freshly opened, uncharged window.
    fn opened(now: Instant, window: Duration) -> Self {
        Self {
            count: 0,
            window_reset_at: now + window,
            blocked_until: None,
        }
    }

    /// Whether both the window and any block have elapsed, making the entry
    /// eligible for garbage collection.
    pub fn expired(&self, now: Instant) -> bool {
        self.window_reset_at < now && self.blocked_until.map_or(true, |blocked| blocked < now)
    }
}

/// Outcome of a rate limit check.
///
/// `reset_in` is the time until the governing boundary: the window reset
/// while counting, the block end while blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    /// The category's attempt budget per window
    pub limit: u32,
    /// Attempts left in the current window, `0` when rejected
    pub remaining: u32,
    pub reset_in: Duration,
    /// Present only when rejected
    pub retry_after: Option<Duration>,
}

impl Decision {
    /// Render the decision as response header pairs for the HTTP
    /// collaborator. Durations are rounded up to whole seconds;
    /// `Retry-After` appears only on rejection.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", ceil_secs(self.reset_in).to_string()),
        ];
        if let Some(retry_after) = self.retry_after {
            headers.push(("Retry-After", ceil_secs(retry_after).to_string()));
        }
        headers
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Compose a client fingerprint from network address and client agent.
///
/// The agent string is truncated to 50 characters; missing parts become
/// `"unknown"`. Extracting the parts from request headers is the HTTP
/// collaborator's concern.
pub fn client_fingerprint(ip: Option<&str>, user_agent: Option<&str>) -> String {
    let ip = ip.filter(|s| !s.is_empty()).unwrap_or("unknown");
    let agent = user_agent.filter(|s| !s.is_empty()).unwrap_or("unknown");
    let agent_prefix: String = agent.chars().take(50).collect();
    format!("{ip}-{agent_prefix}")
}

/// Bounds the frequency of sensitive operations per client, with an
/// escalating penalty for abuse, using bounded memory.
///
/// State machine per key:
/// `NEW -> COUNTING -> (WINDOW_EXPIRED -> COUNTING) | (LIMIT_EXCEEDED -> BLOCKED -> COUNTING)`
///
/// Best-effort and in-memory: state does not survive a restart and is not
/// shared across instances.
#[derive(Clone)]
pub struct RateLimiter<S>
where
    S: Store<LimitKey, RateLimitEntry> + Clone,
{
    store: S,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
    policies: [RateLimitPolicy; LimitCategory::COUNT],
}

impl<S> RateLimiter<S>
where
    S: Store<LimitKey, RateLimitEntry> + Clone,
{
    /// Create a limiter with the built-in per-category policies.
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            metrics: Metrics::new(),
            policies: LimitCategory::default_policies(),
        }
    }

    /// Replace the policy for one category.
    pub fn with_policy(mut self, category: LimitCategory, policy: RateLimitPolicy) -> Self {
        self.policies[category.index()] = policy;
        self
    }

    /// The policy currently governing a category.
    pub fn policy(&self, category: LimitCategory) -> RateLimitPolicy {
        self.policies[category.index()]
    }

    /// Check whether an operation is admitted for this client, charging the
    /// window counter if so.
    ///
    /// The read-modify-write runs as a single atomic unit per key: two
    /// simultaneous requests for one remaining slot cannot both be admitted.
    pub fn check(&self, fingerprint: &str, category: LimitCategory) -> Decision {
        let policy = self.policies[category.index()];
        let now = self.clock.now();
        let key = LimitKey::new(fingerprint, category);

        let decision = self.store.with_entry_mut(
            key,
            || RateLimitEntry::opened(now, policy.window()),
            |entry| Self::apply(entry, policy, now),
        );

        if decision.allowed {
            self.metrics.record_allowed();
        } else {
            self.metrics.record_blocked();
            warn!(
                fingerprint,
                category = %category,
                retry_after_secs = decision.retry_after.map(ceil_secs),
                "rate limit exceeded"
            );
        }
        decision
    }

    fn apply(entry: &mut RateLimitEntry, policy: RateLimitPolicy, now: Instant) -> Decision {
        // An active block rejects without charging the counter.
        if let Some(blocked_until) = entry.blocked_until {
            if blocked_until > now {
                let wait = blocked_until.saturating_duration_since(now);
                return Decision {
                    allowed: false,
                    limit: policy.max_attempts(),
                    remaining: 0,
                    reset_in: wait,
                    retry_after: Some(wait),
                };
            }
        }

        // `<=` so a check landing exactly on the boundary opens a fresh
        // window; stale blocks are dropped with it.
        if entry.window_reset_at <= now {
            *entry = RateLimitEntry::opened(now, policy.window());
        }

        if entry.count >= policy.max_attempts() {
            entry.blocked_until = Some(now + policy.block_duration());
            return Decision {
                allowed: false,
                limit: policy.max_attempts(),
                remaining: 0,
                reset_in: policy.block_duration(),
                retry_after: Some(policy.block_duration()),
            };
        }

        entry.count += 1;
        Decision {
            allowed: true,
            limit: policy.max_attempts(),
            remaining: policy.max_attempts() - entry.count,
            reset_in: entry.window_reset_at.saturating_duration_since(now),
            retry_after: None,
        }
    }

    /// Purge entries whose window and block have both elapsed. Returns the
    /// number of entries removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.expired(now));
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            self.metrics.record_swept(removed);
        }
        removed
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }

    /// Drop all tracked state.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;
    use crate::infrastructure::store::ShardedStore;

    fn limiter_with_clock(clock: Arc<MockClock>) -> RateLimiter<Arc<ShardedStore<LimitKey, RateLimitEntry>>> {
        RateLimiter::new(Arc::new(ShardedStore::new()), clock)
    }

    #[test]
    fn test_first_check_opens_window() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with_clock(clock);

        let decision = limiter.check("client-a", LimitCategory::SurveySubmission);
        assert!(decision.allowed);
        assert_eq!(decision.limit, 3);
        assert_eq!(decision.remaining, 2);
        assert_eq!(decision.retry_after, None);
        assert_eq!(decision.reset_in, Duration::from_secs(15 * 60));
    }

    #[test]
    fn test_exceeding_limit_sets_block() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with_clock(clock);

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check("client-a", LimitCategory::SurveySubmission);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let decision = limiter.check("client-a", LimitCategory::SurveySubmission);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.retry_after, Some(Duration::from_secs(30 * 60)));
    }

    #[test]
    fn test_blocked_checks_do_not_extend_block() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with_clock(clock.clone());

        for _ in 0..4 {
            limiter.check("client-a", LimitCategory::SurveySubmission);
        }

        // Hammering while blocked: retry_after keeps shrinking
        clock.advance(Duration::from_secs(10 * 60));
        let decision = limiter.check("client-a", LimitCategory::SurveySubmission);
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after, Some(Duration::from_secs(20 * 60)));

        clock.advance(Duration::from_secs(10 * 60));
        let decision = limiter.check("client-a", LimitCategory::SurveySubmission);
        assert_eq!(decision.retry_after, Some(Duration::from_secs(10 * 60)));
    }

    #[test]
    fn test_block_expiry_opens_fresh_window() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with_clock(clock.clone());

        for _ in 0..4 {
            limiter.check("client-a", LimitCategory::SurveySubmission);
        }

        clock.advance(Duration::from_secs(30 * 60 + 1));
        let decision = limiter.check("client-a", LimitCategory::SurveySubmission);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 2);
    }

    #[test]
    fn test_window_expiry_resets_counter() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with_clock(clock.clone());

        limiter.check("client-a", LimitCategory::SurveySubmission);
        limiter.check("client-a", LimitCategory::SurveySubmission);

        // Exactly at the boundary counts as expired
        clock.advance(Duration::from_secs(15 * 60));
        let decision = limiter.check("client-a", LimitCategory::SurveySubmission);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 2);
    }

    #[test]
    fn test_fingerprints_isolated() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with_clock(clock);

        for _ in 0..4 {
            limiter.check("client-a", LimitCategory::SurveySubmission);
        }

        let decision = limiter.check("client-b", LimitCategory::SurveySubmission);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 2);
    }

    #[test]
    fn test_categories_isolated() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with_clock(clock);

        for _ in 0..4 {
            limiter.check("client-a", LimitCategory::SurveySubmission);
        }
        assert!(!limiter.check("client-a", LimitCategory::SurveySubmission).allowed);

        assert!(limiter.check("client-a", LimitCategory::EmailSending).allowed);
    }

    #[test]
    fn test_custom_policy_override() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let policy =
            RateLimitPolicy::new(Duration::from_secs(60), 1, Duration::from_secs(120)).unwrap();
        let limiter = limiter_with_clock(clock).with_policy(LimitCategory::GeneralApi, policy);

        assert!(limiter.check("client-a", LimitCategory::GeneralApi).allowed);
        let decision = limiter.check("client-a", LimitCategory::GeneralApi);
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_sweep_removes_only_fully_expired_entries() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with_clock(clock.clone());

        // client-a counts; client-b gets blocked
        limiter.check("client-a", LimitCategory::SurveySubmission);
        for _ in 0..4 {
            limiter.check("client-b", LimitCategory::SurveySubmission);
        }
        assert_eq!(limiter.tracked_keys(), 2);

        // Past both windows, but client-b's 30-minute block still lives
        clock.advance(Duration::from_secs(16 * 60));
        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_keys(), 1);

        clock.advance(Duration::from_secs(30 * 60));
        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_metrics_recorded() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with_clock(clock);

        for _ in 0..5 {
            limiter.check("client-a", LimitCategory::SurveySubmission);
        }

        assert_eq!(limiter.metrics().checks_allowed(), 3);
        assert_eq!(limiter.metrics().checks_blocked(), 2);
    }

    #[test]
    fn test_concurrent_checks_admit_exactly_the_budget() {
        use std::thread;

        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = Arc::new(limiter_with_clock(clock));
        let mut handles = vec![];

        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            handles.push(thread::spawn(move || {
                let mut allowed = 0;
                for _ in 0..10 {
                    if limiter.check("shared", LimitCategory::GeneralApi).allowed {
                        allowed += 1;
                    }
                }
                allowed
            }));
        }

        let total_allowed: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // 100 checks against a budget of 20: exactly 20 admitted
        assert_eq!(total_allowed, 20);
    }

    #[test]
    fn test_headers_while_counting() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with_clock(clock);

        let decision = limiter.check("client-a", LimitCategory::SurveySubmission);
        let headers = decision.headers();

        assert!(headers.contains(&("X-RateLimit-Limit", "3".to_string())));
        assert!(headers.contains(&("X-RateLimit-Remaining", "2".to_string())));
        assert!(headers.contains(&("X-RateLimit-Reset", "900".to_string())));
        assert!(!headers.iter().any(|(name, _)| *name == "Retry-After"));
    }

    #[test]
    fn test_headers_while_blocked() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with_clock(clock);

        for _ in 0..4 {
            limiter.check("client-a", LimitCategory::SurveySubmission);
        }
        let decision = limiter.check("client-a", LimitCategory::SurveySubmission);
        let headers = decision.headers();

        assert!(headers.contains(&("Retry-After", "1800".to_string())));
    }

    #[test]
    fn test_ceil_secs_rounds_up() {
        assert_eq!(ceil_secs(Duration::from_secs(10)), 10);
        assert_eq!(ceil_secs(Duration::from_millis(10_001)), 11);
        assert_eq!(ceil_secs(Duration::ZERO), 0);
    }

    #[test]
    fn test_client_fingerprint_composition() {
        assert_eq!(
            client_fingerprint(Some("203.0.113.7"), Some("Mozilla/5.0")),
            "203.0.113.7-Mozilla/5.0"
        );
        assert_eq!(client_fingerprint(None, None), "unknown-unknown");
        assert_eq!(client_fingerprint(Some(""), Some("")), "unknown-unknown");

        let long_agent = "x".repeat(200);
        let fingerprint = client_fingerprint(Some("1.2.3.4"), Some(&long_agent));
        assert_eq!(fingerprint.len(), "1.2.3.4-".len() + 50);
    }
}
