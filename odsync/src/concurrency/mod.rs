//! Coordination primitives of the sync engine.
//!
//! The consumer worker and the retry scheduler are the only long-lived tasks. Both observe the
//! [`shutdown`] channel or the lifetime of their inputs, and neither interrupts work in progress.

pub mod scheduler;
pub mod shutdown;
