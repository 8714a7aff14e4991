use super::toml_config::TomlConfig;
use super::EtlSettings;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "customer-sales-etl")]
#[command(about = "Loads e-commerce order CSV files into the Customer_Sale_Analytics table")]
pub struct CliConfig {
    /// Source CSV file
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Destination store: a path or a sqlite:// connection string
    #[arg(long)]
    pub destination: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Remove an existing destination file before running
    #[arg(long)]
    pub fresh: bool,

    /// Run on the daily schedule instead of once
    #[arg(long)]
    pub schedule: bool,

    /// Stop the schedule after this many runs
    #[arg(long, requires = "schedule")]
    pub max_runs: Option<usize>,

    /// Retries after a failed scheduled run
    #[arg(long)]
    pub retries: Option<u32>,

    /// Delay between scheduled retries, in seconds
    #[arg(long)]
    pub retry_delay_secs: Option<u64>,

    /// Emit JSON log lines
    #[arg(long)]
    pub json_logs: bool,

    /// Log process CPU and memory after each stage
    #[arg(long)]
    pub monitor: bool,

    /// Dry run - validate and show the resolved settings without touching any data
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 合併設定：預設值 < 設定檔 < 命令列參數
    pub fn resolve(&self) -> Result<EtlSettings> {
        let mut settings = match &self.config {
            Some(path) => EtlSettings::from_toml(&TomlConfig::from_file(path)?),
            None => EtlSettings::default(),
        };

        if let Some(source) = &self.source {
            settings.source = source.clone();
        }
        if let Some(destination) = &self.destination {
            settings.destination = destination.clone();
        }
        if let Some(retries) = self.retries {
            settings.schedule.retries = retries;
        }
        if let Some(delay) = self.retry_delay_secs {
            settings.schedule.retry_delay = Duration::from_secs(delay);
        }
        settings.fresh_start |= self.fresh;
        settings.monitoring |= self.monitor;
        settings.json_logs |= self.json_logs;

        Ok(settings)
    }
}
