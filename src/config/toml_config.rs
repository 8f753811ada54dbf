use crate::config::settings::{
    default_headers, merge_headers, RunSettings, DEFAULT_CONCURRENCY, DEFAULT_OUTPUT_PATH,
    DEFAULT_RETRY_DELAY_SECONDS, DEFAULT_RETRY_LIMIT, DEFAULT_TIMEOUT_SECONDS,
};
use crate::domain::ports::{BackoffSlotPolicy, ConfigProvider};
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{validate_range, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    pub accept_invalid_certs: Option<bool>,
    pub headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    pub concurrency: Option<usize>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_seconds: Option<f64>,
    pub hold_slot_during_backoff: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex")
    })
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScrapeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ScrapeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CATALOG_URL})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    fn retry_delay_seconds(&self) -> f64 {
        self.fetch
            .retry_delay_seconds
            .unwrap_or(DEFAULT_RETRY_DELAY_SECONDS)
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        &self.source.base_url
    }

    fn output_path(&self) -> &str {
        self.output.path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn headers(&self) -> Vec<(String, String)> {
        let overrides = self.source.headers.clone().unwrap_or_default();
        merge_headers(default_headers(), overrides)
    }

    fn concurrency(&self) -> usize {
        self.fetch.concurrency.unwrap_or(DEFAULT_CONCURRENCY)
    }

    fn retry_limit(&self) -> u32 {
        self.fetch.retry_attempts.unwrap_or(DEFAULT_RETRY_LIMIT)
    }

    fn retry_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_delay_seconds()).unwrap_or(Duration::ZERO)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    fn backoff_slot_policy(&self) -> BackoffSlotPolicy {
        if self.fetch.hold_slot_during_backoff.unwrap_or(false) {
            BackoffSlotPolicy::Hold
        } else {
            BackoffSlotPolicy::Release
        }
    }

    fn accept_invalid_certs(&self) -> bool {
        self.source.accept_invalid_certs.unwrap_or(false)
    }

    fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        // 轉換成 Duration 前先檢查原始數值
        validate_range(
            "fetch.retry_delay_seconds",
            self.retry_delay_seconds(),
            0.0,
            300.0,
        )?;
        RunSettings::from_provider(self).map(|_| ())
    }
}
