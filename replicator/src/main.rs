//! Replicator service binary.
//!
//! Loads the configuration, initializes tracing and runs the CDC sync pipeline, draining the
//! change-capture queue into the operational data store until it receives a shutdown signal.

use crate::config::load_replicator_config;
use crate::core::start_replicator_with_config;
use crate::error::{ReplicatorError, ReplicatorResult};

use ::config::shared::ReplicatorConfig;
use telemetry::tracing::init_tracing;
use tracing::error;

mod config;
mod core;
mod error;

fn main() -> ReplicatorResult<()> {
    let replicator_config = load_replicator_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME")).map_err(ReplicatorError::config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(replicator_config))?;

    Ok(())
}

async fn async_main(replicator_config: ReplicatorConfig) -> ReplicatorResult<()> {
    if let Err(err) = start_replicator_with_config(replicator_config).await {
        let err = ReplicatorError::from(err);
        error!("{}", err.render_report());

        return Err(err);
    }

    Ok(())
}
