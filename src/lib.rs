//! # survey-guard
//!
//! Request hardening for an anonymous survey service: sliding-window rate
//! limiting with escalating blocks, plus total (never-failing) sanitization
//! and validation of untrusted submission payloads.
//!
//! The crate is the trust boundary between the HTTP surface and the rest of
//! the service. It makes two guarantees:
//!
//! - **Abuse is bounded.** Every sensitive operation is budgeted per client
//!   fingerprint and per category; exceeding a budget imposes a block that
//!   hammering cannot extend, and expired state is garbage collected so
//!   memory stays bounded.
//! - **Input is tamed, never rejected with a panic.** Validation functions
//!   accept arbitrary JSON and always return a well-formed value: malformed
//!   fields degrade to empty strings, `None`, or `0`, and dangerous markup
//!   is stripped until no denylisted construct survives.
//!
//! ## Quick Start
//!
//! Rate limiting a submission endpoint:
//!
//! ```rust
//! use survey_guard::{client_fingerprint, LimitCategory, RateLimiter, ShardedStore, SystemClock};
//! use std::sync::Arc;
//!
//! let limiter = RateLimiter::new(Arc::new(ShardedStore::new()), Arc::new(SystemClock::new()));
//!
//! let fingerprint = client_fingerprint(Some("203.0.113.7"), Some("Mozilla/5.0"));
//! let decision = limiter.check(&fingerprint, LimitCategory::SurveySubmission);
//!
//! assert!(decision.allowed);
//! for (name, value) in decision.headers() {
//!     // attach to the HTTP response
//!     let _ = (name, value);
//! }
//! ```
//!
//! Validating an untrusted payload:
//!
//! ```rust
//! use survey_guard::validate_survey_submission;
//! use serde_json::json;
//!
//! let submission = validate_survey_submission(&json!({
//!     "q2": "<script>alert(1)</script>hello",
//!     "completion_time": 245,
//! }));
//!
//! assert_eq!(submission.q2, "hello");
//! assert_eq!(submission.completion_time, 245);
//! assert!(submission.has_minimum_data());
//! ```
//!
//! ## Background sweeping
//!
//! Long-running processes should run the sweeper so one-off clients do not
//! accumulate entries forever (requires the `async` feature, on by default):
//!
//! ```rust,no_run
//! # use survey_guard::{RateLimiter, ShardedStore, Sweeper, SweeperConfig, SystemClock};
//! # use std::sync::Arc;
//! # async fn run() {
//! let limiter = RateLimiter::new(Arc::new(ShardedStore::new()), Arc::new(SystemClock::new()));
//!
//! let handle = Sweeper::new(limiter.clone(), SweeperConfig::default()).start();
//!
//! // ... serve traffic ...
//!
//! handle.shutdown().await.unwrap();
//! # }
//! ```
//!
//! ## Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`]: pure logic with no runtime concerns (policies, sanitizer,
//!   field and record validators)
//! - [`application`]: orchestration (the limiter, the sweeper, metrics) over
//!   ports ([`Clock`], [`Store`])
//! - [`infrastructure`]: adapters ([`SystemClock`], the DashMap-backed
//!   [`ShardedStore`], and test mocks)
//!
//! The limiter is in-memory and best-effort: state does not survive a
//! restart and is not shared across instances. A multi-instance deployment
//! would implement the [`Store`] port over a shared external store.
//!
//! ## Observability
//!
//! Rejections are logged through `tracing` at WARN with the fingerprint and
//! category as fields, and counters are available via [`Metrics`]:
//!
//! ```rust
//! # use survey_guard::{LimitCategory, RateLimiter, ShardedStore, SystemClock};
//! # use std::sync::Arc;
//! # let limiter = RateLimiter::new(Arc::new(ShardedStore::new()), Arc::new(SystemClock::new()));
//! # limiter.check("client", LimitCategory::GeneralApi);
//! let snapshot = limiter.metrics().snapshot();
//! println!("block rate: {:.2}%", snapshot.block_rate() * 100.0);
//! ```

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    policy::{LimitCategory, PolicyError, RateLimitPolicy},
    sanitize::{sanitize_text, EMAIL_MAX, LOCATION_MAX, TEXT_QUESTION_MAX},
    submission::{
        validate_email_submission, validate_survey_submission, EmailSubmission,
        ValidatedSubmission,
    },
    validate::{
        validate_age, validate_completion_time, validate_email, validate_location, AGE_MAX,
        AGE_MIN, COMPLETION_TIME_MAX,
    },
};

pub use application::{
    limiter::{client_fingerprint, Decision, LimitKey, RateLimitEntry, RateLimiter},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, Store},
    sweeper::{Sweeper, SweeperConfig, SweeperConfigError},
};

#[cfg(feature = "async")]
pub use application::sweeper::{ShutdownError, SweeperHandle};

pub use infrastructure::{clock::SystemClock, mocks::MockClock, store::ShardedStore};
