//! Data types flowing through the sync engine.

mod event;

pub use event::*;
