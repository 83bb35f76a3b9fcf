//! Local bookkeeping used to correct delivery-order anomalies.

pub mod base;
pub mod memory;

pub use base::SyncStateStore;
