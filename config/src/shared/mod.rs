mod base;
mod connection;
mod queue;
mod replicator;
mod sync;

pub use base::*;
pub use connection::*;
pub use queue::*;
pub use replicator::*;
pub use sync::*;
