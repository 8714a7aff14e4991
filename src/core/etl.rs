use crate::adapters::Destination;
use crate::core::extract::Extractor;
use crate::core::load::Loader;
use crate::core::schema::SchemaProvisioner;
use crate::core::transform::Transformer;
use crate::domain::ports::EventLog;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Provisioning,
    Extracting,
    Transforming,
    Loading,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Provisioning => "provisioning",
            Stage::Extracting => "extracting",
            Stage::Transforming => "transforming",
            Stage::Loading => "loading",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(Stage),
    Completed,
    /// Terminal; records the stage whose error ended the run.
    Failed(Stage),
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub rows_extracted: usize,
    pub duplicates_removed: usize,
    pub rows_loaded: usize,
}

/// Drives one run through provisioning, extraction, transformation and loading.
///
/// The first stage error ends the run in `Failed` and is returned unchanged. No stage
/// is retried here.
pub struct PipelineRunner {
    log: Arc<dyn EventLog>,
    provisioner: SchemaProvisioner,
    extractor: Extractor,
    transformer: Transformer,
    loader: Loader,
    monitor: SystemMonitor,
    state: RunState,
}

impl PipelineRunner {
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self {
            provisioner: SchemaProvisioner::new(log.clone()),
            extractor: Extractor::new(log.clone()),
            transformer: Transformer::new(log.clone()),
            loader: Loader::new(log.clone()),
            monitor: SystemMonitor::default(),
            state: RunState::Idle,
            log,
        }
    }

    pub fn new_with_monitoring(log: Arc<dyn EventLog>, monitor_enabled: bool) -> Self {
        Self {
            monitor: SystemMonitor::new(monitor_enabled),
            ..Self::new(log)
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn run(&mut self, destination: &Destination, source: &Path) -> Result<RunSummary> {
        self.state = RunState::Idle;
        self.log.info(&format!(
            "Starting ETL run: {} -> {}",
            source.display(),
            destination
        ));
        self.log.info(&format!(
            "Database engine created for file: {}",
            destination.path().display()
        ));

        self.enter(Stage::Provisioning);
        let provisioned = self.provisioner.ensure_schema(destination);
        self.conclude(Stage::Provisioning, provisioned)?;

        self.enter(Stage::Extracting);
        let extracted = self.extractor.extract(source);
        let raw = self.conclude(Stage::Extracting, extracted)?;
        let rows_extracted = raw.len();

        self.enter(Stage::Transforming);
        let transformed = self.transformer.transform(raw);
        let enriched = self.conclude(Stage::Transforming, transformed)?;

        self.enter(Stage::Loading);
        let loaded = self.loader.load(destination, enriched);
        let report = self.conclude(Stage::Loading, loaded)?;

        self.state = RunState::Completed;
        self.log.info("ETL process completed successfully.");

        Ok(RunSummary {
            rows_extracted,
            duplicates_removed: report.duplicates_removed,
            rows_loaded: report.rows_written,
        })
    }

    fn enter(&mut self, stage: Stage) {
        self.state = RunState::Running(stage);
        self.log.debug(&format!("Entering {} stage", stage));
    }

    fn conclude<T>(&mut self, stage: Stage, outcome: Result<T>) -> Result<T> {
        self.monitor.log_stats(&stage.to_string());

        outcome.inspect_err(|e| {
            self.state = RunState::Failed(stage);
            self.log.error(&format!("ETL run failed while {}: {}", stage, e));
        })
    }
}
