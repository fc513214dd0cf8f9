//! Periodic garbage collection of expired rate limit entries.
//!
//! One-off clients would otherwise accumulate entries forever in a
//! long-running process. The sweeper owns the purge schedule: construct it
//! with the limiter it maintains, run it synchronously with [`Sweeper::run_once`]
//! or start the background task with [`Sweeper::start`] and stop it through
//! the returned handle on shutdown.

use crate::application::limiter::{LimitKey, RateLimitEntry, RateLimiter};
use crate::application::ports::Store;
use std::fmt;
use std::time::Duration;
use tracing::debug;

#[cfg(feature = "async")]
use tokio::time::interval;

/// Error returned when sweeper configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweeperConfigError {
    /// Sweep interval duration must be greater than zero
    ZeroInterval,
}

impl fmt::Display for SweeperConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweeperConfigError::ZeroInterval => {
                write!(f, "sweep interval must be greater than 0")
            }
        }
    }
}

impl std::error::Error for SweeperConfigError {}

/// Configuration for the background sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweeperConfig {
    /// How often to purge expired entries
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
        }
    }
}

impl SweeperConfig {
    /// Create a new sweeper config with the specified interval.
    ///
    /// # Errors
    /// Returns `SweeperConfigError::ZeroInterval` if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, SweeperConfigError> {
        if interval.is_zero() {
            return Err(SweeperConfigError::ZeroInterval);
        }
        Ok(Self { interval })
    }
}

/// Periodically purges expired entries from a limiter's store.
pub struct Sweeper<S>
where
    S: Store<LimitKey, RateLimitEntry> + Clone,
{
    limiter: RateLimiter<S>,
    config: SweeperConfig,
}

impl<S> Sweeper<S>
where
    S: Store<LimitKey, RateLimitEntry> + Clone,
{
    /// Create a new sweeper for a limiter.
    pub fn new(limiter: RateLimiter<S>, config: SweeperConfig) -> Self {
        Self { limiter, config }
    }

    /// Run a single sweep. Returns the number of entries removed.
    pub fn run_once(&self) -> usize {
        let removed = self.limiter.sweep();
        if removed > 0 {
            debug!(removed, "purged expired rate limit entries");
        }
        removed
    }

    /// Start sweeping periodically on a background task.
    ///
    /// The returned handle stops the task: call [`SweeperHandle::shutdown`]
    /// during graceful shutdown, or drop the handle and let
    /// [`SweeperHandle::abort`] end it immediately.
    #[cfg(feature = "async")]
    pub fn start(self) -> SweeperHandle
    where
        S: 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let join = tokio::spawn(async move {
            let mut ticker = interval(self.config.interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once();
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        SweeperHandle { shutdown_tx, join }
    }

    /// Get the sweeper configuration.
    pub fn config(&self) -> &SweeperConfig {
        &self.config
    }
}

/// Error returned when the sweeper task fails to stop cleanly.
#[cfg(feature = "async")]
#[derive(Debug)]
pub enum ShutdownError {
    /// The background task panicked before acknowledging shutdown
    TaskPanicked,
}

#[cfg(feature = "async")]
impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownError::TaskPanicked => write!(f, "sweeper task panicked"),
        }
    }
}

#[cfg(feature = "async")]
impl std::error::Error for ShutdownError {}

/// Handle controlling a running background sweeper.
#[cfg(feature = "async")]
pub struct SweeperHandle {
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    join: tokio::task::JoinHandle<()>,
}

#[cfg(feature = "async")]
impl SweeperHandle {
    /// Signal the task to stop and wait for it to finish.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        // The task may already have ended; a failed send is fine.
        let _ = self.shutdown_tx.send(());
        self.join.await.map_err(|_| ShutdownError::TaskPanicked)
    }

    /// Stop the task immediately without waiting.
    pub fn abort(&self) {
        self.join.abort();
    }
}
