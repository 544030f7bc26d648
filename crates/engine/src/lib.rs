pub mod controller;
mod time;

pub use controller::{
    CloseReason, ControllerSettings, IndicatorView, IntentKind, TradeController, TradeIntent,
};

use analytics::{PerformanceSummary, PerformanceTracker};
use core_types::{Bar, Symbol};
use events::{EngineEvent, SignalDirection};
use execution::{AccountView, Executor};
use indicators::{SuperTrend, SuperTrendSettings};
use num_traits::{FromPrimitive, ToPrimitive};
use risk::{PositionSizer, SizerSettings};
use rust_decimal::Decimal;
use tokio::sync::broadcast;

use crate::time::utc_time;

/// The per-instrument trading engine: one indicator, one controller, one
/// execution venue, processed strictly bar by bar.
///
/// Each bar runs the full pipeline to completion before the next one is
/// accepted: validate, update the indicator, evaluate the controller, await
/// the single order outcome if one was requested, then record equity. A bad
/// bar or a failed order never stops the feed.
pub struct Engine<E> {
    symbol: Symbol,
    indicator: SuperTrend,
    controller: TradeController,
    executor: E,
    tracker: PerformanceTracker,
    events: broadcast::Sender<EngineEvent>,
}

impl<E> Engine<E>
where
    E: Executor + AccountView,
{
    pub fn new(
        symbol: Symbol,
        indicator_settings: SuperTrendSettings,
        sizer_settings: SizerSettings,
        controller_settings: ControllerSettings,
        executor: E,
        events: broadcast::Sender<EngineEvent>,
    ) -> anyhow::Result<Self> {
        let indicator = SuperTrend::new(indicator_settings)?;
        let sizer = PositionSizer::new(sizer_settings)?;
        let controller =
            TradeController::new(symbol.clone(), controller_settings, sizer, events.clone())?;

        // The account starts flat, so equity at a zero mark is just cash.
        let initial_equity = executor.snapshot(&symbol, Decimal::ZERO).total_equity;
        let tracker = PerformanceTracker::new(initial_equity);

        Ok(Self {
            symbol,
            indicator,
            controller,
            executor,
            tracker,
            events,
        })
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    pub fn summary(&self) -> PerformanceSummary {
        self.tracker.summary()
    }

    /// Processes one bar through the full pipeline.
    pub async fn on_bar(&mut self, bar: &Bar) {
        if !bar.is_valid() {
            tracing::warn!(
                symbol = %self.symbol,
                open_time = bar.open_time,
                "Skipping malformed bar."
            );
            let _ = self.events.send(EngineEvent::InvalidBar {
                time: utc_time(bar.open_time),
            });
            return;
        }

        self.indicator.update(
            bar.high.to_f64().unwrap_or(0.0),
            bar.low.to_f64().unwrap_or(0.0),
            bar.close.to_f64().unwrap_or(0.0),
        );
        let view = IndicatorView::from(&self.indicator);
        self.emit_signal_event(bar, &view);

        let snapshot = self.executor.snapshot(&self.symbol, bar.close);
        if let Some(intent) = self.controller.on_bar(bar, &view, &snapshot) {
            match self
                .executor
                .execute(&intent.order, bar.close, bar.open_time)
                .await
            {
                Ok(fill) => {
                    let after = self.executor.snapshot(&self.symbol, bar.close);
                    if let Some(record) = self.controller.on_fill(&intent, &fill, &after, bar) {
                        self.tracker.record_trade(&record);
                    }
                }
                Err(error) => {
                    tracing::error!(symbol = %self.symbol, %error, "Order execution failed.");
                    self.controller.on_execution_error(&error, bar.open_time);
                }
            }
        }

        let equity = self.executor.snapshot(&self.symbol, bar.close).total_equity;
        self.tracker.record_equity(utc_time(bar.open_time), equity);
    }

    /// Drives a whole feed through the engine and returns the final
    /// performance summary.
    pub async fn run(&mut self, bars: &[Bar]) -> PerformanceSummary {
        tracing::info!(
            symbol = %self.symbol,
            bars = bars.len(),
            executor = self.executor.name(),
            "Engine run starting."
        );
        for bar in bars {
            self.on_bar(bar).await;
        }
        let summary = self.summary();
        tracing::info!(
            symbol = %self.symbol,
            trades = summary.trade_count,
            total_return = summary.total_return,
            "Engine run finished."
        );
        summary
    }

    fn emit_signal_event(&self, bar: &Bar, view: &IndicatorView) {
        let direction = if view.is_buy_transition() {
            SignalDirection::Up
        } else if view.is_sell_transition() {
            SignalDirection::Down
        } else {
            return;
        };

        let trend_level = view
            .trend_level
            .and_then(Decimal::from_f64)
            .unwrap_or_default();
        tracing::info!(
            symbol = %self.symbol,
            ?direction,
            close = %bar.close,
            trend_level = %trend_level,
            "Signal transition."
        );
        let _ = self.events.send(EngineEvent::Signal {
            time: utc_time(bar.open_time),
            direction,
            close: bar.close,
            trend_level,
        });
    }
}
