//! Test doubles for deterministic testing.
//!
//! The mock clock lets tests step through rate limit windows and block
//! periods without sleeping.

pub mod clock;

pub use clock::MockClock;
