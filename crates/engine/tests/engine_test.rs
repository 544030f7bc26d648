use core_types::{Bar, Symbol};
use engine::{ControllerSettings, Engine};
use events::{EngineEvent, SignalDirection};
use execution::{PaperExecutor, PaperSettings};
use indicators::SuperTrendSettings;
use risk::SizerSettings;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::broadcast;

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;

fn bar(open_time: i64, close: Decimal) -> Bar {
    Bar {
        open_time,
        open: close,
        high: close + dec!(0.5),
        low: close - dec!(0.5),
        close,
        volume: dec!(10),
    }
}

/// 20 strictly decreasing closes followed by 20 strictly increasing ones,
/// hourly bars starting at the epoch.
fn v_shape() -> Vec<Bar> {
    let mut bars = Vec::new();
    let mut close = dec!(100);
    for i in 0..20 {
        close -= dec!(1);
        bars.push(bar(i * HOUR_MS, close));
    }
    for i in 20..40 {
        close += dec!(1);
        bars.push(bar(i * HOUR_MS, close));
    }
    bars
}

fn engine_with_cash(
    cash: Decimal,
) -> (Engine<PaperExecutor>, broadcast::Receiver<EngineEvent>) {
    let (tx, rx) = broadcast::channel(1024);
    let executor = PaperExecutor::new(PaperSettings::default(), cash);
    let engine = Engine::new(
        Symbol("BTCUSDT".to_string()),
        SuperTrendSettings {
            period: 5,
            multiplier: 3.0,
        },
        SizerSettings::default(),
        ControllerSettings {
            min_trade_interval_minutes: 0,
            // Wide protective exits so only the signal path fires here.
            stop_loss_fraction: 0.5,
            take_profit_fraction: 1.0,
            ..Default::default()
        },
        executor,
        tx,
    )
    .unwrap();
    (engine, rx)
}

fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn v_shaped_feed_opens_exactly_one_long() {
    let (mut engine, mut rx) = engine_with_cash(dec!(100_000));
    let summary = engine.run(&v_shape()).await;
    let events = drain(&mut rx);

    let up_signals: Vec<_> = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                EngineEvent::Signal {
                    direction: SignalDirection::Up,
                    ..
                }
            )
        })
        .collect();
    assert_eq!(up_signals.len(), 1, "expected exactly one up transition");
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, EngineEvent::Signal { direction: SignalDirection::Down, .. })),
        "no down transition should fire in a v-shaped feed"
    );

    let opened: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::TradeOpened(open) => Some(open),
            _ => None,
        })
        .collect();
    assert_eq!(opened.len(), 1);
    // Entry happens on the flip bar at close 85; sizing is capped by the
    // 10% allocation limit, so roughly 10k notional.
    assert_eq!(opened[0].price, dec!(85));
    assert!(opened[0].quantity > dec!(117));
    assert!(opened[0].quantity < dec!(118));
    assert!(opened[0].stop_level < dec!(85));

    // The trend never flips back, so the position rides to the end.
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, EngineEvent::TradeClosed(_)))
    );
    assert_eq!(summary.trade_count, 0);
    assert!(summary.final_equity > summary.initial_equity);
}

#[tokio::test]
async fn daily_reset_fires_once_per_calendar_date() {
    let (mut engine, mut rx) = engine_with_cash(dec!(100_000));

    // A flat feed across three calendar days produces no signals, only
    // daily rollovers.
    let mut bars = Vec::new();
    for day in 0..3 {
        for hour in 0..6 {
            bars.push(bar(day * DAY_MS + hour * HOUR_MS, dec!(100)));
        }
    }
    engine.run(&bars).await;

    let resets = drain(&mut rx)
        .iter()
        .filter(|e| matches!(e, EngineEvent::DailyReset { .. }))
        .count();
    assert_eq!(resets, 3);
}

#[tokio::test]
async fn rejected_entry_reduces_risk_and_the_feed_continues() {
    // A cash balance far below the minimum notional makes the paper venue
    // reject the entry; the engine must degrade, not halt.
    let (mut engine, mut rx) = engine_with_cash(dec!(50));
    let summary = engine.run(&v_shape()).await;
    let events = drain(&mut rx);

    assert!(
        !events
            .iter()
            .any(|e| matches!(e, EngineEvent::TradeOpened(_)))
    );
    let reduced: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::RiskReduced { risk_fraction } => Some(*risk_fraction),
            _ => None,
        })
        .collect();
    assert_eq!(reduced.len(), 1);
    assert!((reduced[0] - 0.016).abs() < 1e-12);

    // Every bar was still processed.
    assert_eq!(engine.tracker().equity_curve().len(), 40);
    assert_eq!(summary.trade_count, 0);
    assert_eq!(summary.final_equity, dec!(50));
}

#[tokio::test]
async fn malformed_bars_are_skipped_without_stopping_the_run() {
    let (mut engine, mut rx) = engine_with_cash(dec!(100_000));

    let mut bars = v_shape();
    // Invert one warmup bar's range.
    bars[3].high = dec!(10);
    bars[3].low = dec!(20);
    engine.run(&bars).await;

    let events = drain(&mut rx);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, EngineEvent::InvalidBar { .. }))
            .count(),
        1
    );
    // The remaining 39 bars went through the pipeline.
    assert_eq!(engine.tracker().equity_curve().len(), 39);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, EngineEvent::TradeOpened(_)))
    );
}
