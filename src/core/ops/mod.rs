//! core::ops
//!
//! Coordination for mutating operations.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive lock around the baseline load-mutate-save sequence
//!
//! # Architecture
//!
//! Every baseline mutation:
//! 1. Acquires the baseline lock
//! 2. Re-reads the baseline from disk
//! 3. Applies its change and writes atomically
//! 4. Releases the lock

pub mod lock;

pub use lock::{BaselineLock, LockError, DEFAULT_LOCK_TIMEOUT};
