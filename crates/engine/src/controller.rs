use chrono::NaiveDate;
use core_types::{Bar, Error, Fill, OrderRequest, Position, Result, Side, Symbol, TradeRecord};
use events::{EngineEvent, TradeOpenedEvent};
use execution::PortfolioSnapshot;
use indicators::{SuperTrend, TrendSignal};
use num_traits::FromPrimitive;
use risk::PositionSizer;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::time::utc_time;

/// Factor applied to the live risk fraction after an insufficient-funds
/// rejection.
const RISK_REDUCTION_FACTOR: f64 = 0.8;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ControllerSettings {
    /// Fraction of equity risked per trade. This is the starting value;
    /// the controller lowers its live copy on insufficient-funds errors.
    #[serde(default = "default_risk_fraction")]
    pub risk_fraction: f64,

    #[serde(default = "default_max_daily_trades")]
    pub max_daily_trades: u32,

    #[serde(default = "default_min_trade_interval_minutes")]
    pub min_trade_interval_minutes: i64,

    /// Exit when the close moves this fraction against the entry price.
    #[serde(default = "default_stop_loss_fraction")]
    pub stop_loss_fraction: f64,

    /// Exit when the close moves this fraction in favor of the entry price.
    #[serde(default = "default_take_profit_fraction")]
    pub take_profit_fraction: f64,

    /// Length of the trading pause after a non-funds execution failure.
    #[serde(default = "default_pause_minutes")]
    pub pause_minutes: i64,
}

fn default_risk_fraction() -> f64 {
    0.02
}
fn default_max_daily_trades() -> u32 {
    10
}
fn default_min_trade_interval_minutes() -> i64 {
    30
}
fn default_stop_loss_fraction() -> f64 {
    0.05
}
fn default_take_profit_fraction() -> f64 {
    0.10
}
fn default_pause_minutes() -> i64 {
    5
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            risk_fraction: default_risk_fraction(),
            max_daily_trades: default_max_daily_trades(),
            min_trade_interval_minutes: default_min_trade_interval_minutes(),
            stop_loss_fraction: default_stop_loss_fraction(),
            take_profit_fraction: default_take_profit_fraction(),
            pause_minutes: default_pause_minutes(),
        }
    }
}

impl ControllerSettings {
    fn validate(&self) -> Result<()> {
        if self.risk_fraction <= 0.0 || self.risk_fraction > 1.0 {
            return Err(Error::InvalidConfiguration(format!(
                "risk_fraction must be in (0, 1], got {}",
                self.risk_fraction
            )));
        }
        if self.max_daily_trades == 0 {
            return Err(Error::InvalidConfiguration(
                "max_daily_trades must be positive".to_string(),
            ));
        }
        if self.min_trade_interval_minutes < 0 || self.pause_minutes < 0 {
            return Err(Error::InvalidConfiguration(
                "trade interval and pause must be non-negative".to_string(),
            ));
        }
        if self.stop_loss_fraction <= 0.0 || self.take_profit_fraction <= 0.0 {
            return Err(Error::InvalidConfiguration(
                "stop-loss and take-profit fractions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read-only slice of indicator state the controller consumes. Decoupling
/// it from the concrete indicator lets unit tests drive the controller
/// through arbitrary signal sequences.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorView {
    pub ready: bool,
    pub signal: TrendSignal,
    pub previous_signal: TrendSignal,
    pub trend_level: Option<f64>,
}

impl IndicatorView {
    pub fn is_buy_transition(&self) -> bool {
        self.ready && self.signal == TrendSignal::Up && self.previous_signal == TrendSignal::Down
    }

    pub fn is_sell_transition(&self) -> bool {
        self.ready && self.signal == TrendSignal::Down && self.previous_signal == TrendSignal::Up
    }
}

impl From<&SuperTrend> for IndicatorView {
    fn from(indicator: &SuperTrend) -> Self {
        Self {
            ready: indicator.is_ready(),
            signal: indicator.signal(),
            previous_signal: indicator.previous_signal(),
            trend_level: indicator.current_level(),
        }
    }
}

/// Why a close intent was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    SellSignal,
    TrailingStop,
    StopLoss,
    TakeProfit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntentKind {
    OpenLong { stop_price: Decimal },
    ClosePosition { reason: CloseReason },
}

/// An order the controller wants executed. State is not mutated until the
/// outcome comes back through [`TradeController::on_fill`] or
/// [`TradeController::on_execution_error`].
#[derive(Debug, Clone, PartialEq)]
pub struct TradeIntent {
    pub order: OrderRequest,
    pub kind: IntentKind,
}

/// Per-calendar-day risk bookkeeping. The roll fires exactly once per
/// distinct UTC date in the feed, no matter how many bars share the date.
#[derive(Debug, Clone, Copy)]
struct DailyRiskState {
    day_key: Option<NaiveDate>,
    start_of_day_equity: Decimal,
    trade_count: u32,
}

impl DailyRiskState {
    fn new() -> Self {
        Self {
            day_key: None,
            start_of_day_equity: Decimal::ZERO,
            trade_count: 0,
        }
    }

    /// Returns the new day key when the date advanced (or on the very
    /// first bar); `None` for every further bar of the same day.
    fn roll(&mut self, timestamp_ms: i64, equity: Decimal) -> Option<NaiveDate> {
        let date = utc_time(timestamp_ms).date_naive();
        if self.day_key == Some(date) {
            return None;
        }
        self.day_key = Some(date);
        self.start_of_day_equity = equity;
        self.trade_count = 0;
        Some(date)
    }
}

/// The trade-execution state machine over {Flat, Long}.
///
/// Consumes one indicator view per bar, strictly after that bar's indicator
/// update, and turns signal transitions into [`TradeIntent`]s gated by the
/// daily trade cap, the minimum trade interval and the pause window. It
/// owns the open [`Position`], the daily counters and the live risk
/// fraction. The controller performs no I/O: fills and failures are
/// reported back to it by the engine driver.
pub struct TradeController {
    symbol: Symbol,
    settings: ControllerSettings,
    sizer: PositionSizer,
    risk_fraction: f64,
    position: Option<Position>,
    daily: DailyRiskState,
    last_trade_time: Option<i64>,
    pause_until: Option<i64>,
    events: broadcast::Sender<EngineEvent>,
}

impl TradeController {
    pub fn new(
        symbol: Symbol,
        settings: ControllerSettings,
        sizer: PositionSizer,
        events: broadcast::Sender<EngineEvent>,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            symbol,
            risk_fraction: settings.risk_fraction,
            settings,
            sizer,
            position: None,
            daily: DailyRiskState::new(),
            last_trade_time: None,
            pause_until: None,
            events,
        })
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn risk_fraction(&self) -> f64 {
        self.risk_fraction
    }

    pub fn daily_trade_count(&self) -> u32 {
        self.daily.trade_count
    }

    /// Evaluates one bar and returns the order the controller wants
    /// executed, if any.
    pub fn on_bar(
        &mut self,
        bar: &Bar,
        view: &IndicatorView,
        snapshot: &PortfolioSnapshot,
    ) -> Option<TradeIntent> {
        if let Some(date) = self.daily.roll(bar.open_time, snapshot.total_equity) {
            tracing::info!(%date, equity = %snapshot.total_equity, "Daily reset.");
            let _ = self.events.send(EngineEvent::DailyReset {
                date,
                equity: snapshot.total_equity,
            });
        }

        // Signals are not meaningful until the indicator has warmed up.
        if !view.ready {
            return None;
        }

        // Protective exits run every bar, independent of signal
        // transitions, and are exempt from throttling and pause: they only
        // ever reduce exposure.
        if let Some(intent) = self.check_risk_exit(bar) {
            return Some(intent);
        }

        if view.is_buy_transition() {
            return self.handle_buy_transition(bar, view, snapshot);
        }
        if view.is_sell_transition() {
            return self.handle_sell_transition(bar);
        }

        self.update_trailing_stop(view);
        None
    }

    /// Reports the confirmed outcome of an executed intent. Position and
    /// counters are only mutated here, and only when the fresh portfolio
    /// snapshot shows the holdings actually changed. Returns the trade
    /// record when a position was closed.
    pub fn on_fill(
        &mut self,
        intent: &TradeIntent,
        fill: &Fill,
        snapshot_after: &PortfolioSnapshot,
        bar: &Bar,
    ) -> Option<TradeRecord> {
        match &intent.kind {
            IntentKind::OpenLong { stop_price } => {
                if snapshot_after.position_quantity <= Decimal::ZERO {
                    tracing::warn!(
                        symbol = %self.symbol,
                        "Entry fill reported but holdings are unchanged, ignoring."
                    );
                    return None;
                }

                self.position = Some(Position {
                    symbol: self.symbol.clone(),
                    quantity: fill.quantity,
                    entry_price: fill.price,
                    stop_level: *stop_price,
                    entry_time: bar.open_time,
                });
                self.register_trade(bar.open_time);

                tracing::info!(
                    symbol = %self.symbol,
                    quantity = %fill.quantity,
                    price = %fill.price,
                    stop = %stop_price,
                    "Opened long position."
                );
                let _ = self.events.send(EngineEvent::TradeOpened(TradeOpenedEvent {
                    time: utc_time(bar.open_time),
                    price: fill.price,
                    quantity: fill.quantity,
                    stop_level: *stop_price,
                }));
                None
            }
            IntentKind::ClosePosition { reason } => {
                let Some(position) = self.position.take() else {
                    tracing::warn!(symbol = %self.symbol, "Close fill without an open position.");
                    return None;
                };

                if snapshot_after.position_quantity >= position.quantity {
                    tracing::warn!(
                        symbol = %self.symbol,
                        holdings = %snapshot_after.position_quantity,
                        "Close fill reported but holdings were not reduced, keeping position."
                    );
                    self.position = Some(position);
                    return None;
                }

                let pnl = (fill.price - position.entry_price) * position.quantity;
                let record = TradeRecord {
                    symbol: self.symbol.clone(),
                    direction: Side::Long,
                    entry_time: position.entry_time,
                    exit_time: bar.open_time,
                    entry_price: position.entry_price,
                    exit_price: fill.price,
                    quantity: position.quantity,
                    pnl,
                };
                self.register_trade(bar.open_time);

                tracing::info!(
                    symbol = %self.symbol,
                    ?reason,
                    %pnl,
                    exit_price = %fill.price,
                    "Closed position."
                );
                let _ = self.events.send(EngineEvent::TradeClosed(record.clone()));
                Some(record)
            }
        }
    }

    /// Reports an execution failure. Insufficient funds shrinks the live
    /// risk fraction; anything else pauses signal handling for the
    /// configured window. No position or counter is touched.
    pub fn on_execution_error(&mut self, error: &execution::Error, timestamp_ms: i64) {
        match error {
            execution::Error::InsufficientFunds { .. } => {
                self.risk_fraction *= RISK_REDUCTION_FACTOR;
                tracing::warn!(
                    symbol = %self.symbol,
                    risk_fraction = self.risk_fraction,
                    "Insufficient funds, reducing risk fraction."
                );
                let _ = self.events.send(EngineEvent::RiskReduced {
                    risk_fraction: self.risk_fraction,
                });
            }
            other => {
                let until = timestamp_ms + self.settings.pause_minutes * 60_000;
                self.pause_until = Some(until);
                tracing::warn!(
                    symbol = %self.symbol,
                    error = %other,
                    until,
                    "Execution failure, pausing signal handling."
                );
                let _ = self.events.send(EngineEvent::TradingPaused {
                    until: utc_time(until),
                    reason: other.to_string(),
                });
            }
        }
    }

    fn handle_buy_transition(
        &mut self,
        bar: &Bar,
        view: &IndicatorView,
        snapshot: &PortfolioSnapshot,
    ) -> Option<TradeIntent> {
        // Hard invariant: never more than one open position.
        if self.position.is_some() {
            tracing::debug!(symbol = %self.symbol, "Buy transition while long, skipping.");
            return None;
        }
        if !self.can_trade(bar.open_time) {
            return None;
        }

        // The active band doubles as the initial stop.
        let stop_price = view.trend_level.and_then(Decimal::from_f64)?;
        let quantity = self.sizer.size(
            bar.close,
            stop_price,
            snapshot.total_equity,
            self.risk_fraction,
        );
        if quantity <= Decimal::ZERO {
            tracing::debug!(symbol = %self.symbol, "Sizer returned zero, no trade.");
            return None;
        }

        Some(TradeIntent {
            order: OrderRequest {
                symbol: self.symbol.clone(),
                side: Side::Long,
                quantity,
            },
            kind: IntentKind::OpenLong { stop_price },
        })
    }

    fn handle_sell_transition(&mut self, bar: &Bar) -> Option<TradeIntent> {
        let position = self.position.as_ref()?;
        if !self.can_trade(bar.open_time) {
            return None;
        }
        Some(self.close_intent(position.quantity, CloseReason::SellSignal))
    }

    /// Stop-loss, take-profit and trailing-stop breaches, checked on the
    /// close of every bar while long.
    fn check_risk_exit(&mut self, bar: &Bar) -> Option<TradeIntent> {
        let position = self.position.as_ref()?;

        let stop_fraction =
            Decimal::from_f64(self.settings.stop_loss_fraction).unwrap_or(Decimal::ZERO);
        let target_fraction =
            Decimal::from_f64(self.settings.take_profit_fraction).unwrap_or(Decimal::ZERO);
        let stop_price = position.entry_price * (dec!(1) - stop_fraction);
        let target_price = position.entry_price * (dec!(1) + target_fraction);

        let quantity = position.quantity;
        let reason = if bar.close <= position.stop_level {
            CloseReason::TrailingStop
        } else if bar.close <= stop_price {
            CloseReason::StopLoss
        } else if bar.close >= target_price {
            CloseReason::TakeProfit
        } else {
            return None;
        };

        tracing::info!(
            symbol = %self.symbol,
            ?reason,
            close = %bar.close,
            stop_level = %position.stop_level,
            "Protective exit triggered."
        );
        Some(self.close_intent(quantity, reason))
    }

    /// While long and the trend is still up, follow the rising trend level
    /// with the stored stop. The stop never retreats.
    fn update_trailing_stop(&mut self, view: &IndicatorView) {
        let Some(position) = self.position.as_mut() else {
            return;
        };
        if view.signal != TrendSignal::Up {
            return;
        }
        let Some(level) = view.trend_level.and_then(Decimal::from_f64) else {
            return;
        };
        if level > position.stop_level {
            tracing::debug!(symbol = %self.symbol, stop = %level, "Raised trailing stop.");
            position.stop_level = level;
        }
    }

    fn close_intent(&self, quantity: Decimal, reason: CloseReason) -> TradeIntent {
        TradeIntent {
            order: OrderRequest {
                symbol: self.symbol.clone(),
                side: Side::Short,
                quantity,
            },
            kind: IntentKind::ClosePosition { reason },
        }
    }

    /// Throttling gates for signal-driven trades. Violations are dropped,
    /// never queued.
    fn can_trade(&self, timestamp_ms: i64) -> bool {
        if let Some(until) = self.pause_until {
            if timestamp_ms < until {
                tracing::debug!(symbol = %self.symbol, until, "Trading paused, ignoring signal.");
                return false;
            }
        }

        if self.daily.trade_count >= self.settings.max_daily_trades {
            tracing::warn!(
                symbol = %self.symbol,
                count = self.daily.trade_count,
                "Daily trade cap reached, ignoring signal."
            );
            let _ = self.events.send(EngineEvent::Throttled {
                time: utc_time(timestamp_ms),
                reason: "daily trade cap reached".to_string(),
            });
            return false;
        }

        if let Some(last) = self.last_trade_time {
            let min_interval_ms = self.settings.min_trade_interval_minutes * 60_000;
            if timestamp_ms - last < min_interval_ms {
                tracing::debug!(symbol = %self.symbol, "Minimum trade interval not elapsed.");
                let _ = self.events.send(EngineEvent::Throttled {
                    time: utc_time(timestamp_ms),
                    reason: "minimum trade interval not elapsed".to_string(),
                });
                return false;
            }
        }

        true
    }

    fn register_trade(&mut self, timestamp_ms: i64) {
        self.daily.trade_count += 1;
        self.last_trade_time = Some(timestamp_ms);
    }
}
