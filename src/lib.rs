pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

use crate::domain::ports::{ConfigProvider, EventLog};
use std::path::Path;
use std::sync::Arc;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::Destination;
pub use config::EtlSettings;
pub use core::etl::{PipelineRunner, RunSummary};
pub use utils::error::{EtlError, Result};
pub use utils::logger::TracingLog;

/// Runs the whole pipeline once: provision the table, then extract, transform and
/// load `source` into `destination`.
///
/// `destination` is a path or a `sqlite://` connection string. The first stage
/// error is returned unchanged.
pub fn run_etl(destination: &str, source: impl AsRef<Path>) -> Result<()> {
    let destination = Destination::parse(destination)?;
    let mut runner = PipelineRunner::new(Arc::new(TracingLog::default()));
    runner.run(&destination, source.as_ref())?;
    Ok(())
}

/// Same as [`run_etl`], driven by resolved settings and reporting a summary.
pub fn run_configured<C: ConfigProvider>(config: &C, log: Arc<dyn EventLog>) -> Result<RunSummary> {
    let destination = Destination::parse(config.destination_url())?;
    if config.fresh_start() {
        destination.remove_existing(log.as_ref());
    }

    let mut runner = PipelineRunner::new_with_monitoring(log, config.monitoring_enabled());
    runner.run(&destination, config.source_path())
}
