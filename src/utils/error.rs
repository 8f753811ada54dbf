use std::time::Duration;
use thiserror::Error;

/// 傳輸層錯誤：網路失敗或逾時，皆進入重試流程
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("network error: {0}")]
    Network(String),
}

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Page count discovery failed: {message}")]
    Discovery { message: String },

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP client error: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Output,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ScrapeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScrapeError::Discovery { .. }
            | ScrapeError::Transport(_)
            | ScrapeError::HttpStatus { .. }
            | ScrapeError::ApiError(_) => ErrorCategory::Network,
            ScrapeError::SerializationError(_) => ErrorCategory::Data,
            ScrapeError::CsvError(_) | ScrapeError::IoError(_) => ErrorCategory::Output,
            ScrapeError::InvalidConfigValueError { .. }
            | ScrapeError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單頁錯誤只會在重試迴圈內出現，不會升級到頂層
            ScrapeError::Transport(_)
            | ScrapeError::HttpStatus { .. }
            | ScrapeError::SerializationError(_) => ErrorSeverity::Medium,
            ScrapeError::Discovery { .. }
            | ScrapeError::ApiError(_)
            | ScrapeError::InvalidConfigValueError { .. }
            | ScrapeError::ConfigValidationError { .. } => ErrorSeverity::High,
            ScrapeError::CsvError(_) | ScrapeError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScrapeError::Discovery { message } => {
                format!("Could not determine how many pages the catalog has: {}", message)
            }
            ScrapeError::IoError(e) => format!("Could not write the output file: {}", e),
            ScrapeError::CsvError(e) => format!("Could not write CSV rows: {}", e),
            ScrapeError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the catalog URL is reachable and returns a 'pagination.last_page' field"
            }
            ErrorCategory::Data => "Inspect the API response; the payload shape may have changed",
            ErrorCategory::Output => {
                "Check that the output directory exists or can be created and is writable"
            }
            ErrorCategory::Configuration => "Fix the configuration value and run again",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
