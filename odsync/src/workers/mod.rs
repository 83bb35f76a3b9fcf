//! Background workers of the sync engine.

pub mod consumer;
