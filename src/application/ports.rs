//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the
//! application layer needs. Infrastructure adapters implement these ports.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;

/// Port for obtaining current time.
///
/// This abstraction allows the application layer to work with time without
/// depending on system clock implementation details. Infrastructure provides
/// concrete implementations (`SystemClock`, `MockClock`).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Port for concurrent key-value storage of rate limit state.
///
/// The limiter's check-then-update sequence for a key must not interleave
/// with another request's, so the central operation is `with_entry_mut`: the
/// implementation guarantees the accessor runs as a single atomic unit per
/// key. In production this is backed by a sharded concurrent map; a
/// multi-instance deployment would implement this port over a shared
/// external store instead.
pub trait Store<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Access an entry with mutable access, creating it if necessary.
    ///
    /// The accessor runs under the key's lock; no other caller observes the
    /// entry mid-update.
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R;

    /// Get the number of entries in the store.
    fn len(&self) -> usize;

    /// Check if the store is empty.
    fn is_empty(&self) -> bool;

    /// Clear all entries from the store.
    fn clear(&self);

    /// Remove entries for which the predicate returns false.
    ///
    /// Implementations must not hold the whole map locked for the duration
    /// of the scan; locking per entry or per shard is expected.
    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool;
}
