//! Logging setup shared by the sync service binaries and their tests.

pub mod tracing;
