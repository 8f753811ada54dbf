use super::settings::{
    default_headers, merge_headers, RunSettings, DEFAULT_BASE_URL, DEFAULT_CONCURRENCY,
    DEFAULT_OUTPUT_PATH, DEFAULT_RETRY_DELAY_SECONDS, DEFAULT_RETRY_LIMIT,
    DEFAULT_TIMEOUT_SECONDS,
};
use crate::domain::ports::{BackoffSlotPolicy, ConfigProvider};
use crate::utils::error::Result;
use crate::utils::validation::{parse_header_pair, validate_range, Validate};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "catalog-scraper")]
#[command(about = "Fetch a paginated product catalog concurrently and save it as CSV")]
pub struct CliConfig {
    #[arg(long, help = "Load run parameters from a TOML file instead of flags")]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output_path: String,

    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, help = "Maximum in-flight requests")]
    pub concurrency: usize,

    #[arg(long, default_value_t = DEFAULT_RETRY_LIMIT, help = "Attempts per page")]
    pub retry_limit: u32,

    #[arg(
        long,
        default_value_t = DEFAULT_RETRY_DELAY_SECONDS,
        help = "Base backoff in seconds, multiplied by the attempt number"
    )]
    pub retry_delay: f64,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS, help = "Per-request timeout in seconds")]
    pub timeout: u64,

    #[arg(long, help = "Keep the concurrency slot while sleeping between retries")]
    pub hold_slot_during_backoff: bool,

    #[arg(long = "header", value_parser = parse_header_pair, help = "Extra request header KEY=VALUE")]
    pub headers: Vec<(String, String)>,

    #[arg(long, help = "Skip TLS certificate verification")]
    pub accept_invalid_certs: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage")]
    pub monitor: bool,
}

impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn headers(&self) -> Vec<(String, String)> {
        merge_headers(default_headers(), self.headers.clone())
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    fn retry_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_delay).unwrap_or(Duration::ZERO)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    fn backoff_slot_policy(&self) -> BackoffSlotPolicy {
        if self.hold_slot_during_backoff {
            BackoffSlotPolicy::Hold
        } else {
            BackoffSlotPolicy::Release
        }
    }

    fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    fn monitoring_enabled(&self) -> bool {
        self.monitor
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_range("retry_delay", self.retry_delay, 0.0, 300.0)?;
        RunSettings::from_provider(self).map(|_| ())
    }
}
