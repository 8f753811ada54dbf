pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::ReqwestTransport;
pub use config::{RunSettings, TomlConfig};
pub use crate::core::{engine::ScrapeEngine, flatten::flatten};
pub use domain::model::{FlatRow, PageResult, RunSummary, COLUMNS};
pub use utils::error::{Result, ScrapeError};
