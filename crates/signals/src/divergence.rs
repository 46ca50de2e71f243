use core_types::{Bar, SignalType};

// Pivot geometry and scan limits for divergence detection.
const LOOKBACK_LEFT: usize = 5;
const LOOKBACK_RIGHT: usize = 5;
const MIN_PIVOT_GAP: usize = 5;
const MAX_PIVOT_GAP: usize = 60;
const MIN_BARS: usize = 20;
// Only the most recent bars are scanned so stale divergences are not
// re-reported cycle after cycle.
const SCAN_WINDOW: usize = 100;

/// A divergence hit, positioned by bar index within the scanned series.
///
/// `rsi_value` is taken at the pivot bar while `bar_index` is the scan
/// position `LOOKBACK_RIGHT` bars later. The emitted signal is timestamped
/// at the scan position, lagging the pivot it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotSignal {
    pub signal_type: SignalType,
    pub rsi_value: f64,
    pub bar_index: usize,
}

/// Momentum/price divergence scanner.
///
/// Stateless: every call re-derives pivots from the full bar/RSI history it
/// is handed, so repeated polling cycles re-detect the same divergence with
/// the same timestamp and the admission layer can suppress the repeats.
#[derive(Debug, Default)]
pub struct DivergenceScan;

impl DivergenceScan {
    pub fn new() -> Self {
        Self
    }

    /// Scans `bars` and the matching RSI series for bullish and bearish
    /// divergences. `rsi` must be index-aligned with `bars`. Returns an
    /// empty list when there is not enough history.
    pub fn scan(&self, bars: &[Bar], rsi: &[Option<f64>]) -> Vec<PivotSignal> {
        let n = bars.len();
        let mut found = Vec::new();
        if n < MIN_BARS || rsi.len() != n {
            return found;
        }

        let scan_start = LOOKBACK_RIGHT.max(n.saturating_sub(SCAN_WINDOW));
        let scan_end = n - LOOKBACK_LEFT;

        for i in scan_start..scan_end {
            let pivot_idx = i - LOOKBACK_RIGHT;

            // Bullish: higher RSI low against a lower price low.
            if is_pivot_low(rsi, pivot_idx) {
                if let Some(prev_idx) = nearest_earlier(rsi, pivot_idx, is_pivot_low) {
                    if let (Some(current), Some(previous)) = (rsi[pivot_idx], rsi[prev_idx]) {
                        if current > previous && bars[pivot_idx].low < bars[prev_idx].low {
                            found.push(PivotSignal {
                                signal_type: SignalType::BullishDivergence,
                                rsi_value: current,
                                bar_index: i,
                            });
                        }
                    }
                }
            }

            // Bearish: lower RSI high against a higher price high.
            if is_pivot_high(rsi, pivot_idx) {
                if let Some(prev_idx) = nearest_earlier(rsi, pivot_idx, is_pivot_high) {
                    if let (Some(current), Some(previous)) = (rsi[pivot_idx], rsi[prev_idx]) {
                        if current < previous && bars[pivot_idx].high > bars[prev_idx].high {
                            found.push(PivotSignal {
                                signal_type: SignalType::BearishDivergence,
                                rsi_value: current,
                                bar_index: i,
                            });
                        }
                    }
                }
            }
        }

        found
    }
}

/// True when `rsi[idx]` is defined and strictly below every other defined
/// value in the pivot window around `idx`.
fn is_pivot_low(rsi: &[Option<f64>], idx: usize) -> bool {
    let Some(value) = rsi[idx] else {
        return false;
    };
    pivot_window(rsi.len(), idx).all(|j| match rsi[j] {
        Some(other) if j != idx => value < other,
        _ => true,
    })
}

/// Mirror of `is_pivot_low`: strictly above every other defined neighbor.
fn is_pivot_high(rsi: &[Option<f64>], idx: usize) -> bool {
    let Some(value) = rsi[idx] else {
        return false;
    };
    pivot_window(rsi.len(), idx).all(|j| match rsi[j] {
        Some(other) if j != idx => value > other,
        _ => true,
    })
}

fn pivot_window(len: usize, idx: usize) -> impl Iterator<Item = usize> {
    let start = idx.saturating_sub(LOOKBACK_RIGHT);
    let end = (idx + LOOKBACK_LEFT).min(len - 1);
    start..=end
}

/// Walks backwards from `pivot_idx`, nearest gap first, for the closest
/// earlier pivot inside the allowed gap range.
fn nearest_earlier(
    rsi: &[Option<f64>],
    pivot_idx: usize,
    is_pivot: fn(&[Option<f64>], usize) -> bool,
) -> Option<usize> {
    for gap in MIN_PIVOT_GAP..=MAX_PIVOT_GAP {
        let prev_idx = pivot_idx.checked_sub(gap)?;
        if is_pivot(rsi, prev_idx) {
            return Some(prev_idx);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn flat_bars(n: usize) -> Vec<Bar> {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        (0..n)
            .map(|i| Bar {
                timestamp: start + Duration::minutes(i as i64),
                open: dec!(100),
                high: dec!(120),
                low: dec!(110),
                close: dec!(100),
                volume: dec!(1000),
            })
            .collect()
    }

    fn flat_rsi(n: usize) -> Vec<Option<f64>> {
        vec![Some(50.0); n]
    }

    fn set_low(bars: &mut [Bar], idx: usize, low: f64) {
        bars[idx].low = Decimal::from_f64(low).unwrap();
    }

    fn set_high(bars: &mut [Bar], idx: usize, high: f64) {
        bars[idx].high = Decimal::from_f64(high).unwrap();
    }

    #[test]
    fn too_little_history_is_a_noop() {
        let bars = flat_bars(19);
        let mut rsi = flat_rsi(19);
        rsi[8] = Some(30.0);
        assert!(DivergenceScan::new().scan(&bars, &rsi).is_empty());
    }

    #[test]
    fn bullish_divergence_with_valid_pivot_gap() {
        // Pivot lows 10 bars apart: higher RSI low (30 -> 35) against a
        // lower price low (100 -> 95).
        let mut bars = flat_bars(30);
        let mut rsi = flat_rsi(30);
        rsi[8] = Some(30.0);
        rsi[18] = Some(35.0);
        set_low(&mut bars, 8, 100.0);
        set_low(&mut bars, 18, 95.0);

        let found = DivergenceScan::new().scan(&bars, &rsi);
        assert_eq!(found.len(), 1);
        let hit = &found[0];
        assert_eq!(hit.signal_type, SignalType::BullishDivergence);
        assert_eq!(hit.rsi_value, 35.0);
        // Timestamp attribution: the signal sits at the scan position, five
        // bars after the pivot it was measured at.
        assert_eq!(hit.bar_index, 23);
    }

    #[test]
    fn pivot_gap_below_minimum_is_rejected() {
        // Dips 4 bars apart. The later dip is inside the earlier dip's pivot
        // window, and even the surviving pivot finds no partner in range.
        let mut bars = flat_bars(30);
        let mut rsi = flat_rsi(30);
        rsi[10] = Some(30.0);
        rsi[14] = Some(35.0);
        set_low(&mut bars, 10, 100.0);
        set_low(&mut bars, 14, 95.0);

        assert!(DivergenceScan::new().scan(&bars, &rsi).is_empty());
    }

    #[test]
    fn bearish_divergence_mirrors_bullish() {
        // Pivot highs 10 bars apart: lower RSI high (70 -> 65) against a
        // higher price high (100 -> 105).
        let mut bars = flat_bars(30);
        let mut rsi = flat_rsi(30);
        rsi[8] = Some(70.0);
        rsi[18] = Some(65.0);
        set_high(&mut bars, 8, 100.0);
        set_high(&mut bars, 18, 105.0);

        let found = DivergenceScan::new().scan(&bars, &rsi);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].signal_type, SignalType::BearishDivergence);
        assert_eq!(found[0].rsi_value, 65.0);
        assert_eq!(found[0].bar_index, 23);
    }

    #[test]
    fn rsi_lower_low_is_agreement_not_divergence() {
        // Lower RSI low and lower price low: momentum confirms price.
        let mut bars = flat_bars(30);
        let mut rsi = flat_rsi(30);
        rsi[8] = Some(35.0);
        rsi[18] = Some(30.0);
        set_low(&mut bars, 8, 100.0);
        set_low(&mut bars, 18, 95.0);

        assert!(DivergenceScan::new().scan(&bars, &rsi).is_empty());
    }

    #[test]
    fn pivots_outside_recent_window_are_not_scanned() {
        let mut bars = flat_bars(150);
        let mut rsi = flat_rsi(150);
        // Stale pair far in the past, would otherwise qualify.
        rsi[20] = Some(30.0);
        rsi[30] = Some(35.0);
        set_low(&mut bars, 20, 100.0);
        set_low(&mut bars, 30, 95.0);
        // Fresh pair inside the window.
        rsi[120] = Some(30.0);
        rsi[130] = Some(35.0);
        set_low(&mut bars, 120, 100.0);
        set_low(&mut bars, 130, 95.0);

        let found = DivergenceScan::new().scan(&bars, &rsi);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bar_index, 135);
    }

    #[test]
    fn undefined_rsi_cannot_be_a_pivot() {
        let mut bars = flat_bars(30);
        let mut rsi = flat_rsi(30);
        rsi[8] = None;
        rsi[18] = Some(35.0);
        set_low(&mut bars, 8, 100.0);
        set_low(&mut bars, 18, 95.0);

        assert!(DivergenceScan::new().scan(&bars, &rsi).is_empty());
    }
}
