//! Target schema knowledge: the introspected column cache, source-to-target name mapping and
//! offline DDL rendering from object descriptions.

mod cache;
mod ddl;
mod naming;

pub use cache::*;
pub use ddl::*;
pub use naming::*;
