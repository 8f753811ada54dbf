pub mod settings;
pub mod toml_config;

pub use settings::RunSettings;
pub use toml_config::TomlConfig;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, LogFormat};

#[cfg(feature = "cli")]
pub mod cli;
