use catalog_scraper::config::LogFormat;
use catalog_scraper::domain::ports::ConfigProvider;
use catalog_scraper::utils::error::{ErrorSeverity, ScrapeError};
use catalog_scraper::utils::{logger, validation::Validate};
use catalog_scraper::{CliConfig, ReqwestTransport, RunSettings, ScrapeEngine, TomlConfig};
use clap::Parser;
use std::sync::Arc;

/// 依配置來源 (TOML 檔或命令列) 解析出執行參數
fn resolve_settings(cli: &CliConfig) -> Result<RunSettings, ScrapeError> {
    match &cli.config {
        Some(path) => {
            tracing::info!("📄 Loading configuration from {}", path.display());
            let config = TomlConfig::from_file(path)?;
            config.validate()?;
            let mut settings = RunSettings::from_provider(&config)?;
            settings.monitoring |= cli.monitoring_enabled();
            Ok(settings)
        }
        None => {
            cli.validate()?;
            RunSettings::from_provider(cli)
        }
    }
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_failure(stage: &str, e: &ScrapeError) -> ! {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e.severity()));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    match cli.log_format {
        LogFormat::Text => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }
    tracing::info!("Starting catalog-scraper");
    tracing::debug!("CLI config: {:?}", cli);

    let settings = match resolve_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => report_failure("Configuration", &e),
    };
    if settings.monitoring {
        tracing::info!("🔍 System monitoring enabled");
    }

    let transport = match ReqwestTransport::from_settings(&settings) {
        Ok(transport) => Arc::new(transport),
        Err(e) => report_failure("HTTP client setup", &e),
    };
    let engine = ScrapeEngine::new(transport, settings);

    match engine.run().await {
        Ok(summary) => {
            println!(
                "✅ Done. {} rows saved to {}",
                summary.rows_written,
                summary.output_path.display()
            );
            if !summary.is_complete() {
                println!("⚠️ Dropped pages: {:?}", summary.dropped_pages);
            }
        }
        Err(e) => report_failure("Scrape", &e),
    }

    Ok(())
}
