use chrono::{DateTime, NaiveDate, Utc};
use core_types::TradeRecord;
use rust_decimal::Decimal;
use serde::Serialize;

/// Direction of a trend-signal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalDirection {
    Up,
    Down,
}

/// A trade the controller has opened.
#[derive(Debug, Clone, Serialize)]
pub struct TradeOpenedEvent {
    pub time: DateTime<Utc>,
    pub price: Decimal,
    pub quantity: Decimal,
    pub stop_level: Decimal,
}

/// The engine's outbound event stream, consumed by reporting collaborators
/// (dashboards, CSV writers). `tag` and `content` give a clean JSON
/// representation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum EngineEvent {
    /// The indicator reported a signal transition on this bar.
    Signal {
        time: DateTime<Utc>,
        direction: SignalDirection,
        close: Decimal,
        trend_level: Decimal,
    },
    TradeOpened(TradeOpenedEvent),
    TradeClosed(TradeRecord),
    /// First bar of a new calendar day: daily counters were reset.
    DailyReset { date: NaiveDate, equity: Decimal },
    /// A signal was dropped by the trade-throttling rules.
    Throttled { time: DateTime<Utc>, reason: String },
    /// An execution failure paused signal handling until the given time.
    TradingPaused { until: DateTime<Utc>, reason: String },
    /// An insufficient-funds rejection shrank the risk fraction.
    RiskReduced { risk_fraction: f64 },
    /// A malformed bar was skipped at the engine boundary.
    InvalidBar { time: DateTime<Utc> },
}
