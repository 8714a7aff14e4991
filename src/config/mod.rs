#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

use crate::adapters::Destination;
use crate::app::scheduler::{DailySchedule, RetryPolicy};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, validate_path, validate_range, Validate};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_PIPELINE_NAME: &str = "customer-sale-analytics";
pub const DEFAULT_SOURCE_PATH: &str = "/app/data/bestseller.csv";
pub const DEFAULT_DESTINATION: &str = "/app/ecommerce.db";
pub const DEFAULT_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 300;
pub const MAX_RETRIES: u32 = 10;

fn default_schedule_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 11, 6)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSettings {
    /// First daily slot, in UTC.
    pub start: NaiveDateTime,
    pub retries: u32,
    pub retry_delay: Duration,
    pub catchup: bool,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            start: default_schedule_start(),
            retries: DEFAULT_RETRIES,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            catchup: false,
        }
    }
}

impl ScheduleSettings {
    pub fn to_schedule(&self) -> DailySchedule {
        DailySchedule {
            start: self.start.and_utc(),
            catchup: self.catchup,
            policy: RetryPolicy {
                retries: self.retries,
                delay: self.retry_delay,
            },
        }
    }
}

/// Fully resolved settings for a run or a schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct EtlSettings {
    pub name: String,
    pub description: Option<String>,
    pub source: PathBuf,
    pub destination: String,
    pub fresh_start: bool,
    pub monitoring: bool,
    pub json_logs: bool,
    pub schedule: ScheduleSettings,
}

impl Default for EtlSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_PIPELINE_NAME.to_string(),
            description: None,
            source: PathBuf::from(DEFAULT_SOURCE_PATH),
            destination: DEFAULT_DESTINATION.to_string(),
            fresh_start: false,
            monitoring: false,
            json_logs: false,
            schedule: ScheduleSettings::default(),
        }
    }
}

impl EtlSettings {
    /// Defaults overlaid with whatever the file sets.
    pub fn from_toml(config: &TomlConfig) -> Self {
        let mut settings = Self::default();

        if let Some(name) = &config.pipeline.name {
            settings.name = name.clone();
        }
        settings.description = config.pipeline.description.clone();
        if let Some(source) = &config.source {
            settings.source = PathBuf::from(&source.path);
        }
        if let Some(destination) = &config.destination {
            settings.destination = destination.url.clone();
            settings.fresh_start = destination.fresh_start.unwrap_or(false);
        }
        if let Some(schedule) = &config.schedule {
            let defaults = ScheduleSettings::default();
            settings.schedule = ScheduleSettings {
                start: schedule.start.unwrap_or(defaults.start),
                retries: schedule.retries.unwrap_or(defaults.retries),
                retry_delay: schedule
                    .retry_delay_seconds
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.retry_delay),
                catchup: schedule.catchup.unwrap_or(defaults.catchup),
            };
        }
        settings.monitoring = config.monitoring_enabled();
        settings.json_logs = config.json_logs();

        settings
    }

    pub fn destination(&self) -> Result<Destination> {
        Destination::parse(&self.destination)
    }
}

impl ConfigProvider for EtlSettings {
    fn source_path(&self) -> &Path {
        &self.source
    }

    fn destination_url(&self) -> &str {
        &self.destination
    }

    fn fresh_start(&self) -> bool {
        self.fresh_start
    }

    fn monitoring_enabled(&self) -> bool {
        self.monitoring
    }
}

impl Validate for EtlSettings {
    fn validate(&self) -> Result<()> {
        let source = self.source.to_string_lossy();
        validate_path("source.path", &source)?;
        validate_file_extension("source.path", &source, &["csv"])?;

        validate_path("destination.url", &self.destination)?;
        Destination::parse(&self.destination)?;

        validate_range("schedule.retries", self.schedule.retries, 0, MAX_RETRIES)?;
        Ok(())
    }
}
