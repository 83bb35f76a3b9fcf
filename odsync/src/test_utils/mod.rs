//! Helpers for testing the sync engine against in-memory collaborators.
//!
//! - [`event`] builds events and message bodies.
//! - [`schema`] holds column fixtures for the in-memory store.
//! - [`test_queue_wrapper`] records queue traffic and notifies on conditions over it.
//! - [`pipeline`] creates pipelines with test-friendly settings.
//! - [`notify`] wraps [`tokio::sync::Notify`] with a timeout.
//! - [`database`] creates and drops throwaway Postgres databases.

pub mod database;
pub mod event;
pub mod notify;
pub mod pipeline;
pub mod schema;
pub mod test_queue_wrapper;
