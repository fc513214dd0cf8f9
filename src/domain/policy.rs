//! Rate limiting policies and operation categories.
//!
//! Each sensitive operation category carries a static window/limit/block
//! triple. Policies are defined once and never mutated at runtime.

use std::fmt;
use std::time::Duration;

/// Error returned when a policy fails its invariant checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A window must admit at least one attempt
    ZeroMaxAttempts,
    /// A block must be at least as punitive as waiting out the window
    BlockShorterThanWindow,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::ZeroMaxAttempts => {
                write!(f, "max_attempts must be at least 1")
            }
            PolicyError::BlockShorterThanWindow => {
                write!(f, "block duration must be at least the window duration")
            }
        }
    }
}

impl std::error::Error for PolicyError {}

/// Window/limit/block triple governing one operation category.
///
/// # Example
/// ```
/// use survey_guard::RateLimitPolicy;
/// use std::time::Duration;
///
/// let policy = RateLimitPolicy::new(
///     Duration::from_secs(60),
///     10,
///     Duration::from_secs(120),
/// ).unwrap();
///
/// assert_eq!(policy.max_attempts(), 10);
///
/// // A block shorter than the window is rejected
/// assert!(RateLimitPolicy::new(
///     Duration::from_secs(60),
///     10,
///     Duration::from_secs(30),
/// ).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    window: Duration,
    max_attempts: u32,
    block_duration: Duration,
}

impl RateLimitPolicy {
    /// Create a new policy, validating its invariants.
    ///
    /// # Errors
    /// Returns `PolicyError::ZeroMaxAttempts` if `max_attempts` is zero, or
    /// `PolicyError::BlockShorterThanWindow` if the block would be cheaper
    /// than waiting out the window.
    pub fn new(
        window: Duration,
        max_attempts: u32,
        block_duration: Duration,
    ) -> Result<Self, PolicyError> {
        if max_attempts == 0 {
            return Err(PolicyError::ZeroMaxAttempts);
        }
        if block_duration < window {
            return Err(PolicyError::BlockShorterThanWindow);
        }
        Ok(Self {
            window,
            max_attempts,
            block_duration,
        })
    }

    /// Table constructor for the built-in defaults, which are known to
    /// satisfy the invariants.
    const fn from_parts(window_secs: u64, max_attempts: u32, block_secs: u64) -> Self {
        Self {
            window: Duration::from_secs(window_secs),
            max_attempts,
            block_duration: Duration::from_secs(block_secs),
        }
    }

    /// Length of the counting window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Attempts admitted per window before a block is imposed.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// How long a client stays blocked after exceeding the limit.
    pub fn block_duration(&self) -> Duration {
        self.block_duration
    }
}

/// Fixed enumeration of rate-limited operation kinds.
///
/// Each category has its own counting window per client fingerprint, so a
/// client blocked from submitting surveys can still, for example, request a
/// results email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitCategory {
    /// Submission of survey answers
    SurveySubmission,
    /// Sending a copy of answers by email
    EmailSending,
    /// Administrative login attempts
    AdminLogin,
    /// General administrative API access
    GeneralApi,
}

impl LimitCategory {
    /// Number of categories, for indexed policy tables.
    pub const COUNT: usize = 4;

    /// All categories, in table order.
    pub const ALL: [LimitCategory; Self::COUNT] = [
        LimitCategory::SurveySubmission,
        LimitCategory::EmailSending,
        LimitCategory::AdminLogin,
        LimitCategory::GeneralApi,
    ];

    /// Position of this category in indexed policy tables.
    pub(crate) fn index(self) -> usize {
        match self {
            LimitCategory::SurveySubmission => 0,
            LimitCategory::EmailSending => 1,
            LimitCategory::AdminLogin => 2,
            LimitCategory::GeneralApi => 3,
        }
    }

    /// The built-in policy for this category.
    ///
    /// | category          | window | max attempts | block  |
    /// |-------------------|--------|--------------|--------|
    /// | SurveySubmission  | 15 min | 3            | 30 min |
    /// | EmailSending      | 1 h    | 5            | 2 h    |
    /// | AdminLogin        | 15 min | 5            | 1 h    |
    /// | GeneralApi        | 5 min  | 20           | 15 min |
    pub fn default_policy(self) -> RateLimitPolicy {
        match self {
            LimitCategory::SurveySubmission => RateLimitPolicy::from_parts(15 * 60, 3, 30 * 60),
            LimitCategory::EmailSending => RateLimitPolicy::from_parts(60 * 60, 5, 2 * 60 * 60),
            LimitCategory::AdminLogin => RateLimitPolicy::from_parts(15 * 60, 5, 60 * 60),
            LimitCategory::GeneralApi => RateLimitPolicy::from_parts(5 * 60, 20, 15 * 60),
        }
    }

    /// The full default policy table, indexed by [`LimitCategory::index`].
    pub(crate) fn default_policies() -> [RateLimitPolicy; Self::COUNT] {
        Self::ALL.map(LimitCategory::default_policy)
    }

    /// Stable snake_case name, used in logs and limiter keys.
    pub fn as_str(self) -> &'static str {
        match self {
            LimitCategory::SurveySubmission => "survey_submission",
            LimitCategory::EmailSending => "email_sending",
            LimitCategory::AdminLogin => "admin_login",
            LimitCategory::GeneralApi => "general_api",
        }
    }
}

impl fmt::Display for LimitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
