//! Change-data-capture sync engine.
//!
//! Consumes queue messages carrying JSON arrays of [`types::ChangeCaptureEvent`]s and applies
//! them to a relational operational data store. Delivery is at least once and may be reordered,
//! so the engine converts duplicate creates into updates, discards updates that trail a delete,
//! and re-publishes messages whose updates arrived before their create.
//!
//! The entry point is [`pipeline::SyncPipeline`], generic over a [`store::Store`], a
//! [`queue::Queue`] and a [`state::SyncStateStore`].

pub mod apply;
pub mod concurrency;
pub mod error;
mod macros;
pub mod pipeline;
pub mod query;
pub mod queue;
pub mod schema;
pub mod state;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workers;
