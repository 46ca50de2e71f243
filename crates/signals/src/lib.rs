use core_types::{Bar, Signal, SignalType, Symbol};
use indicators::Rsi;
use std::collections::HashMap;

pub mod crossing;
pub mod divergence;
pub mod types;

pub use crossing::ThresholdCross;
pub use divergence::{DivergenceScan, PivotSignal};
pub use types::RsiSettings;

/// Multi-timeframe RSI signal detector for a single symbol.
///
/// Owns the per-timeframe crossing state; everything else is recomputed per
/// call. Not internally synchronized: give each symbol its own instance, or
/// serialize access externally.
pub struct SignalDetector {
    timeframes: Vec<String>,
    symbol: Symbol,
    rsi: Rsi,
    crossing: ThresholdCross,
    divergence: DivergenceScan,
}

impl SignalDetector {
    pub fn new(settings: &RsiSettings, timeframes: Vec<String>, symbol: Symbol) -> Self {
        Self {
            timeframes,
            symbol,
            rsi: Rsi::new(settings.period),
            crossing: ThresholdCross::new(
                settings.oversold_threshold,
                settings.overbought_threshold,
            ),
            divergence: DivergenceScan::new(),
        }
    }

    pub fn timeframes(&self) -> &[String] {
        &self.timeframes
    }

    /// Runs one detection pass over the supplied bar series and returns the
    /// detected signals: threshold crossings first, then divergences.
    ///
    /// Bars must be time-ordered oldest first per timeframe; that is the
    /// data layer's contract and is not re-checked here.
    pub fn detect(&mut self, bars_by_timeframe: &HashMap<String, Vec<Bar>>) -> Vec<Signal> {
        let mut signals = Vec::new();

        // Current RSI snapshot across every monitored timeframe; this also
        // becomes the `timeframes_status` payload of each emitted signal.
        let mut current_rsi: HashMap<String, Option<f64>> = HashMap::new();
        for timeframe in &self.timeframes {
            let value = bars_by_timeframe
                .get(timeframe)
                .and_then(|bars| self.rsi.latest(bars));
            current_rsi.insert(timeframe.clone(), value);
        }

        // Threshold crossings. Timeframes without a defined RSI are skipped
        // entirely so their previous value carries over to the next cycle.
        for timeframe in &self.timeframes {
            let Some(current) = current_rsi.get(timeframe).copied().flatten() else {
                continue;
            };
            let fired = self.crossing.observe(timeframe, current);
            if fired.is_empty() {
                continue;
            }
            let Some(last_bar) = bars_by_timeframe.get(timeframe).and_then(|bars| bars.last())
            else {
                continue;
            };
            for signal_type in fired {
                signals.push(self.build_signal(
                    signal_type,
                    timeframe,
                    current,
                    last_bar.timestamp,
                    &current_rsi,
                ));
            }
        }

        // Divergences, from the full RSI series per timeframe.
        for timeframe in &self.timeframes {
            let Some(bars) = bars_by_timeframe.get(timeframe) else {
                continue;
            };
            let series = self.rsi.calculate(bars);
            for pivot in self.divergence.scan(bars, &series) {
                signals.push(self.build_signal(
                    pivot.signal_type,
                    timeframe,
                    pivot.rsi_value,
                    bars[pivot.bar_index].timestamp,
                    &current_rsi,
                ));
            }
        }

        signals
    }

    fn build_signal(
        &self,
        signal_type: SignalType,
        timeframe: &str,
        rsi_value: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
        all_rsi: &HashMap<String, Option<f64>>,
    ) -> Signal {
        let timeframes_status = self
            .timeframes
            .iter()
            .map(|tf| (tf.clone(), all_rsi.get(tf).copied().flatten()))
            .collect();

        Signal {
            signal_type,
            timestamp,
            symbol: self.symbol.clone(),
            timeframe: timeframe.to_string(),
            rsi_value,
            // Entry signals are timeframe-specific; any timeframe entering
            // the territory alerts on its own, so this gate never blocks.
            confirmed: true,
            timeframes_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| {
                let close = Decimal::from_f64(*close).unwrap();
                Bar {
                    timestamp: start() + Duration::minutes(i as i64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: dec!(1000),
                }
            })
            .collect()
    }

    fn detector(timeframes: &[&str]) -> SignalDetector {
        SignalDetector::new(
            &RsiSettings::default(),
            timeframes.iter().map(|tf| tf.to_string()).collect(),
            Symbol("SPY".to_string()),
        )
    }

    #[test]
    fn crossing_detected_across_polling_cycles() {
        let mut detector = detector(&["1min"]);

        // Cycle 1: monotonically falling closes pin RSI at 0.
        let falling: Vec<f64> = (0..30).map(|i| 200.0 - i as f64).collect();
        let mut bars = HashMap::new();
        bars.insert("1min".to_string(), bars_from_closes(&falling));
        assert!(detector.detect(&bars).is_empty());

        // Cycle 2: monotonically rising closes push RSI to the sentinel
        // high, crossing the overbought threshold from below.
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        bars.insert("1min".to_string(), bars_from_closes(&rising));
        let signals = detector.detect(&bars);

        assert_eq!(signals.len(), 1);
        let signal = &signals[0];
        assert_eq!(signal.signal_type, SignalType::Overbought);
        assert_eq!(signal.timeframe, "1min");
        assert_eq!(signal.symbol, Symbol("SPY".to_string()));
        assert!(signal.confirmed);
        assert!((signal.rsi_value - 99.0099).abs() < 1e-4);
        // Timestamped at the last bar of the timeframe's series.
        assert_eq!(
            signal.timestamp,
            start() + Duration::minutes(29)
        );
    }

    #[test]
    fn status_covers_every_monitored_timeframe() {
        let mut detector = detector(&["1min", "5min", "30min"]);

        let falling: Vec<f64> = (0..30).map(|i| 200.0 - i as f64).collect();
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();

        let mut bars = HashMap::new();
        bars.insert("1min".to_string(), bars_from_closes(&falling));
        detector.detect(&bars);

        bars.insert("1min".to_string(), bars_from_closes(&rising));
        // 5min has too little history for a defined RSI; 30min is absent.
        bars.insert("5min".to_string(), bars_from_closes(&rising[..10]));
        let signals = detector.detect(&bars);

        assert_eq!(signals.len(), 1);
        let status = &signals[0].timeframes_status;
        assert_eq!(status.len(), 3);
        assert!(status["1min"].is_some());
        assert!(status["5min"].is_none());
        assert!(status["30min"].is_none());
    }

    #[test]
    fn undefined_rsi_does_not_disturb_crossing_state() {
        let mut detector = detector(&["1min"]);

        let falling: Vec<f64> = (0..30).map(|i| 200.0 - i as f64).collect();
        let mut bars = HashMap::new();
        bars.insert("1min".to_string(), bars_from_closes(&falling));
        detector.detect(&bars);

        // A cycle with insufficient history: previous RSI must survive.
        bars.insert("1min".to_string(), bars_from_closes(&falling[..5]));
        assert!(detector.detect(&bars).is_empty());

        // The stored previous (0.0) still triggers the upward crossing.
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        bars.insert("1min".to_string(), bars_from_closes(&rising));
        let signals = detector.detect(&bars);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].signal_type, SignalType::Overbought);
    }
}
