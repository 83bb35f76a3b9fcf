//! Rendering of events into parameterized statements against the cached schema.

mod builder;
mod statement;

pub use builder::*;
pub use statement::*;
