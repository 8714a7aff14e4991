use clap::Parser;
use customer_sales_etl::app::scheduler;
use customer_sales_etl::utils::{logger, validation::Validate};
use customer_sales_etl::{run_configured, CliConfig, EtlError, EtlSettings, TracingLog};
use std::sync::Arc;

fn report_failure(e: &EtlError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(e.exit_code());
}

fn run_once(settings: &EtlSettings) {
    match run_configured(settings, Arc::new(TracingLog::default())) {
        Ok(summary) => {
            tracing::info!(
                "📊 {} rows extracted, {} duplicates removed, {} rows loaded",
                summary.rows_extracted,
                summary.duplicates_removed,
                summary.rows_loaded
            );
            println!("✅ ETL process completed successfully!");
            println!("📁 Data loaded into: {}", settings.destination);
        }
        Err(e) => report_failure(&e),
    }
}

async fn run_scheduled(settings: EtlSettings, max_runs: Option<usize>) -> anyhow::Result<()> {
    let schedule = settings.schedule.to_schedule();
    tracing::info!(
        "⏰ Daily schedule from {} (retries: {}, delay: {:?}, catchup: {})",
        schedule.start,
        schedule.policy.retries,
        schedule.policy.delay,
        schedule.catchup
    );

    let job_settings = settings.clone();
    let job = Arc::new(move || {
        run_configured(&job_settings, Arc::new(TracingLog::default())).map(|_| ())
    });

    tokio::select! {
        history = scheduler::run_daily(schedule, job, max_runs) => {
            let failed = history.iter().filter(|run| !run.succeeded).count();
            tracing::info!("🏁 Schedule finished: {} run(s), {} failed", history.len(), failed);
            if failed > 0 {
                anyhow::bail!("{} scheduled run(s) failed", failed);
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("🛑 Received interrupt, stopping schedule");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 先讀設定檔才知道要用哪種日誌格式
    let settings = cli.resolve();
    let json_logs = settings.as_ref().map(|s| s.json_logs).unwrap_or(cli.json_logs);

    // 初始化日誌
    if json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting customer-sales-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => report_failure(&e),
    };

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        report_failure(&e);
    }

    tracing::info!("🚀 Pipeline: {}", settings.name);
    if let Some(description) = &settings.description {
        tracing::info!("📝 {}", description);
    }

    if cli.dry_run {
        println!("🔍 Dry run - resolved settings for {}:", settings.name);
        println!("   source:       {}", settings.source.display());
        println!("   destination:  {}", settings.destination);
        println!("   fresh start:  {}", settings.fresh_start);
        println!("   monitoring:   {}", settings.monitoring);
        println!("   schedule:     {:?}", settings.schedule);
        return Ok(());
    }

    if settings.monitoring {
        tracing::info!("🔍 System monitoring enabled");
    }

    if cli.schedule {
        run_scheduled(settings, cli.max_runs).await
    } else {
        // 單次執行在 blocking pool 跑，避免卡住 runtime
        let once = settings.clone();
        tokio::task::spawn_blocking(move || run_once(&once)).await?;
        Ok(())
    }
}
