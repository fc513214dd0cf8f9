//! Infrastructure layer - adapters implementing the application ports.
//!
//! Concrete implementations live here:
//! - [`clock::SystemClock`] reads the monotonic system clock
//! - [`store::ShardedStore`] keeps limiter state in a sharded concurrent map
//! - [`mocks`] provides deterministic test doubles

pub mod clock;
pub mod mocks;
pub mod store;
