//! Configuration types and loading for the ODS sync services.
//!
//! Configuration is read from `configuration/base.*` and `configuration/{environment}.*` and
//! then overridden by `APP_`-prefixed environment variables. See [`load_config`].

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from};
