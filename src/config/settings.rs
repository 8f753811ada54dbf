use crate::domain::ports::{BackoffSlotPolicy, ConfigProvider};
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_url, Validate,
};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://cms.satiram.az/api/v1/az/products";
pub const DEFAULT_OUTPUT_PATH: &str = "data/satiram.csv";
pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_RETRY_LIMIT: u32 = 4;
pub const DEFAULT_RETRY_DELAY_SECONDS: f64 = 2.0;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

const MAX_CONCURRENCY: usize = 512;
const MAX_RETRY_LIMIT: u32 = 20;
const MAX_RETRY_DELAY_SECONDS: f64 = 300.0;
const MAX_TIMEOUT_SECONDS: u64 = 600;

/// 每個請求預設帶上的標頭
pub fn default_headers() -> Vec<(String, String)> {
    vec![
        (
            "Accept".to_string(),
            "application/json, text/plain, */*".to_string(),
        ),
        ("Referer".to_string(), "https://satiram.az/".to_string()),
        (
            "User-Agent".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/145.0.0.0 Safari/537.36"
                .to_string(),
        ),
        ("DNT".to_string(), "1".to_string()),
    ]
}

/// 以 overrides 覆蓋 defaults 中同名 (不分大小寫) 的標頭，新標頭附加在後
pub fn merge_headers(
    defaults: Vec<(String, String)>,
    overrides: impl IntoIterator<Item = (String, String)>,
) -> Vec<(String, String)> {
    let mut merged = defaults;
    for (key, value) in overrides {
        match merged
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&key))
        {
            Some(slot) => slot.1 = value,
            None => merged.push((key, value)),
        }
    }
    merged
}

/// 一次執行的靜態參數，執行期間不可變
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub base_url: String,
    pub output_path: PathBuf,
    pub headers: Vec<(String, String)>,
    pub concurrency: usize,
    pub retry_limit: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub backoff_slot_policy: BackoffSlotPolicy,
    pub accept_invalid_certs: bool,
    pub monitoring: bool,
}

impl RunSettings {
    /// 從任一配置來源解析並驗證參數
    pub fn from_provider<C: ConfigProvider + ?Sized>(provider: &C) -> Result<Self> {
        let settings = Self {
            base_url: provider.base_url().to_string(),
            output_path: PathBuf::from(provider.output_path()),
            headers: provider.headers(),
            concurrency: provider.concurrency(),
            retry_limit: provider.retry_limit(),
            retry_delay: provider.retry_delay(),
            request_timeout: provider.request_timeout(),
            backoff_slot_policy: provider.backoff_slot_policy(),
            accept_invalid_certs: provider.accept_invalid_certs(),
            monitoring: provider.monitoring_enabled(),
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            headers: default_headers(),
            concurrency: DEFAULT_CONCURRENCY,
            retry_limit: DEFAULT_RETRY_LIMIT,
            retry_delay: Duration::from_secs_f64(DEFAULT_RETRY_DELAY_SECONDS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            backoff_slot_policy: BackoffSlotPolicy::default(),
            accept_invalid_certs: false,
            monitoring: false,
        }
    }
}

impl Validate for RunSettings {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_path("output_path", &self.output_path.to_string_lossy())?;
        validate_range("concurrency", self.concurrency, 1, MAX_CONCURRENCY)?;
        validate_range("retry_limit", self.retry_limit, 1, MAX_RETRY_LIMIT)?;
        validate_range(
            "retry_delay_seconds",
            self.retry_delay.as_secs_f64(),
            0.0,
            MAX_RETRY_DELAY_SECONDS,
        )?;
        if self.request_timeout.is_zero() {
            return Err(ScrapeError::InvalidConfigValueError {
                field: "timeout_seconds".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be greater than zero".to_string(),
            });
        }
        validate_range(
            "timeout_seconds",
            self.request_timeout.as_secs(),
            0,
            MAX_TIMEOUT_SECONDS,
        )?;
        for (key, _) in &self.headers {
            validate_non_empty_string("headers", key)?;
        }
        Ok(())
    }
}
