use config::{Config, Environment, File};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AppSettings, InstrumentSettings, Settings};

/// Loads the application settings from various sources.
///
/// Layered configuration loading:
/// 1. Reads from the default `config/base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g.,
///    `config/development.toml`), if present.
/// 3. Merges settings from environment variables with the `APP` prefix and
///    `__` separator (e.g., `APP_CONTROLLER__RISK_FRACTION=0.01`).
pub fn load_settings() -> Result<Settings> {
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        .add_source(File::with_name("config/base"))
        .add_source(File::with_name(&format!("config/{environment}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let settings: Settings = settings.try_deserialize()?;
    Ok(settings)
}
