use engine::ControllerSettings;
use execution::PaperSettings;
use indicators::SuperTrendSettings;
use risk::SizerSettings;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// The instrument the engine trades and the account it starts with.
    pub instrument: InstrumentSettings,
    #[serde(default)]
    pub indicator: SuperTrendSettings,
    #[serde(default)]
    pub sizing: SizerSettings,
    #[serde(default)]
    pub controller: ControllerSettings,
    #[serde(default)]
    pub execution: PaperSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development",
    /// "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct InstrumentSettings {
    /// The instrument identifier (e.g., "BTCUSDT").
    pub symbol: String,
    /// Starting cash for the paper account, in quote currency.
    pub initial_cash: Decimal,
}
