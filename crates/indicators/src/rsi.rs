use core_types::Bar;
use num_traits::ToPrimitive;

/// Relative Strength Index calculator using Wilder's smoothing.
///
/// `calculate` is a pure function of the bar sequence: same bars in, same
/// series out. Values are `None` until enough history has accumulated.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        if period == 0 {
            panic!("RSI period must be greater than 0.");
        }
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Calculates the RSI series for `bars`. The output has the same length
    /// as the input; entries without enough history are `None`.
    ///
    /// Averages are seeded with the simple mean of the first `period`
    /// close-to-close gains/losses, then advanced one Wilder smoothing step
    /// per bar. The first defined value therefore lands at index
    /// `period + 1`: a series of exactly `period + 1` bars is still all
    /// `None`.
    pub fn calculate(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let n = bars.len();
        if n < self.period + 1 {
            return vec![None; n];
        }

        let closes: Vec<f64> = bars
            .iter()
            .map(|bar| bar.close.to_f64().unwrap_or(0.0))
            .collect();

        // Close-to-close deltas, split into gains and losses.
        let mut gains = Vec::with_capacity(n - 1);
        let mut losses = Vec::with_capacity(n - 1);
        for pair in closes.windows(2) {
            let delta = pair[1] - pair[0];
            gains.push(if delta > 0.0 { delta } else { 0.0 });
            losses.push(if delta < 0.0 { -delta } else { 0.0 });
        }

        let period = self.period as f64;
        let mut avg_gain = gains[..self.period].iter().sum::<f64>() / period;
        let mut avg_loss = losses[..self.period].iter().sum::<f64>() / period;

        // One leading None for the first bar (no delta) plus `period` seed
        // bars, then one output per smoothing step.
        let mut values: Vec<Option<f64>> = vec![None; self.period + 1];
        for i in self.period..gains.len() {
            avg_gain = (avg_gain * (period - 1.0) + gains[i]) / period;
            avg_loss = (avg_loss * (period - 1.0) + losses[i]) / period;

            // Sentinel RS when there are no losses in the window. This lands
            // at 100 - 100/101 ~= 99.0099, not exactly 100.
            let rs = if avg_loss == 0.0 {
                100.0
            } else {
                avg_gain / avg_loss
            };
            values.push(Some(100.0 - (100.0 / (1.0 + rs))));
        }

        values
    }

    /// The most recent RSI value, or `None` with insufficient history.
    pub fn latest(&self, bars: &[Bar]) -> Option<f64> {
        self.calculate(bars).last().copied().flatten()
    }
}
