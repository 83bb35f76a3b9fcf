//! Store gateways executing rendered statements against the operational data store.

pub mod base;
pub mod memory;
pub mod postgres;

pub use base::Store;
