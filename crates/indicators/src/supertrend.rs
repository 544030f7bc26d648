use crate::types::SuperTrendSettings;
use crate::{Error, Result};

/// The ternary trend state reported by the indicator.
///
/// `Neutral` only exists before the first bar has been processed; from then
/// on the indicator is always on one side of the band pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendSignal {
    #[default]
    Neutral,
    Up,
    Down,
}

/// Streaming Supertrend indicator.
///
/// Maintains a volatility band pair around the HL2 midpoint and a trend
/// signal derived from which band the price is currently respecting. The
/// band that is active (upper while the trend is down, lower while it is up)
/// is the "trend level" and doubles as the trailing-stop anchor for the
/// trade controller.
///
/// State is mutated only by [`update`](Self::update), exactly once per bar.
/// The indicator does not validate its inputs; rejecting malformed bars
/// (`low > high`) is the caller's responsibility and happens at the engine
/// boundary before the bar ever reaches this code.
#[derive(Debug, Clone)]
pub struct SuperTrend {
    settings: SuperTrendSettings,

    // Wilder ATR state. For the first `period` bars the ATR is the plain
    // arithmetic mean of observed true ranges, afterwards the recursion
    // `atr = (atr * (period - 1) + tr) / period` takes over.
    tr_sum: f64,
    atr: f64,

    // Continuity-constrained band pair. The upper band only ratchets down
    // (or resets to the candidate once the previous close has broken above
    // it); the lower band is symmetric.
    final_upper: f64,
    final_lower: f64,
    trend_level: f64,

    signal: TrendSignal,
    prev_signal: TrendSignal,

    prev_close: Option<f64>,
    bars_seen: u64,
    ready: bool,
}

impl SuperTrend {
    pub fn new(settings: SuperTrendSettings) -> Result<Self> {
        if settings.period < 1 {
            return Err(Error::InvalidParameters(
                "period must be at least 1".to_string(),
            ));
        }
        if settings.multiplier <= 0.0 || !settings.multiplier.is_finite() {
            return Err(Error::InvalidParameters(
                "multiplier must be a positive finite number".to_string(),
            ));
        }

        Ok(Self {
            settings,
            tr_sum: 0.0,
            atr: 0.0,
            final_upper: 0.0,
            final_lower: 0.0,
            trend_level: 0.0,
            signal: TrendSignal::Neutral,
            prev_signal: TrendSignal::Neutral,
            prev_close: None,
            bars_seen: 0,
            ready: false,
        })
    }

    /// Feeds one bar and returns the new trend level and signal.
    ///
    /// Before [`is_ready`](Self::is_ready) reports true the returned values
    /// are arithmetically defined but not yet meaningful; callers must not
    /// act on them.
    pub fn update(&mut self, high: f64, low: f64, close: f64) -> (f64, TrendSignal) {
        self.bars_seen += 1;

        let tr = match self.prev_close {
            None => high - low,
            Some(pc) => (high - low).max((high - pc).abs()).max((low - pc).abs()),
        };

        let period = f64::from(self.settings.period);
        self.atr = if self.bars_seen <= u64::from(self.settings.period) {
            self.tr_sum += tr;
            self.tr_sum / self.bars_seen as f64
        } else {
            (self.atr * (period - 1.0) + tr) / period
        };

        let midpoint = (high + low) / 2.0;
        let basic_upper = midpoint + self.settings.multiplier * self.atr;
        let basic_lower = midpoint - self.settings.multiplier * self.atr;

        match self.prev_close {
            // First bar: adopt the candidates unconditionally.
            None => {
                self.final_upper = basic_upper;
                self.final_lower = basic_lower;
            }
            Some(pc) => {
                if basic_upper < self.final_upper || pc > self.final_upper {
                    self.final_upper = basic_upper;
                }
                if basic_lower > self.final_lower || pc < self.final_lower {
                    self.final_lower = basic_lower;
                }
            }
        }

        self.prev_signal = self.signal;
        self.signal = match self.signal {
            // Seeded on the first bar; afterwards the trend only flips when
            // the close crosses the opposite band (hysteresis prevents the
            // middle zone from whipsawing the signal).
            TrendSignal::Neutral => {
                if close <= self.final_upper {
                    TrendSignal::Down
                } else {
                    TrendSignal::Up
                }
            }
            TrendSignal::Down if close > self.final_upper => TrendSignal::Up,
            TrendSignal::Up if close < self.final_lower => TrendSignal::Down,
            unchanged => unchanged,
        };

        self.trend_level = match self.signal {
            TrendSignal::Up => self.final_lower,
            _ => self.final_upper,
        };

        if self.bars_seen >= 2 * u64::from(self.settings.period) {
            self.ready = true;
        }

        self.prev_close = Some(close);
        (self.trend_level, self.signal)
    }

    /// True once `bars_seen >= 2 * period`; never reverts.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn bars_seen(&self) -> u64 {
        self.bars_seen
    }

    pub fn signal(&self) -> TrendSignal {
        self.signal
    }

    pub fn previous_signal(&self) -> TrendSignal {
        self.prev_signal
    }

    /// The active band, or `None` while warming up.
    pub fn current_level(&self) -> Option<f64> {
        self.ready.then_some(self.trend_level)
    }

    /// Current ATR, or `None` while warming up.
    pub fn atr(&self) -> Option<f64> {
        self.ready.then_some(self.atr)
    }

    /// True when the trend flipped from down to up on the last bar.
    pub fn is_buy_signal(&self) -> bool {
        self.ready && self.signal == TrendSignal::Up && self.prev_signal == TrendSignal::Down
    }

    /// True when the trend flipped from up to down on the last bar.
    pub fn is_sell_signal(&self) -> bool {
        self.ready && self.signal == TrendSignal::Down && self.prev_signal == TrendSignal::Up
    }

    /// Restores the indicator to its freshly constructed state.
    pub fn reset(&mut self) {
        self.tr_sum = 0.0;
        self.atr = 0.0;
        self.final_upper = 0.0;
        self.final_lower = 0.0;
        self.trend_level = 0.0;
        self.signal = TrendSignal::Neutral;
        self.prev_signal = TrendSignal::Neutral;
        self.prev_close = None;
        self.bars_seen = 0;
        self.ready = false;
    }
}
