//! Application of change capture events to the store.
//!
//! [`consumer::MessageProcessor`] handles one queue message end to end, [`router::EventRouter`]
//! applies single events, [`batch`] holds the bulk-create fast path and [`retry`] the bounded
//! re-publish policy for updates that outran their create.

pub mod batch;
pub mod consumer;
pub mod retry;
pub mod router;
