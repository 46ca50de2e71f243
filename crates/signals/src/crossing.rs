use core_types::SignalType;
use std::collections::HashMap;

/// Edge-triggered oversold/overbought detector.
///
/// Holds one previous RSI value per monitored timeframe and fires only on a
/// genuine crossing into the territory, never on "is currently below/above".
/// The caller must skip timeframes whose current RSI is undefined; the
/// previous value is then left untouched for the next cycle.
#[derive(Debug)]
pub struct ThresholdCross {
    oversold: f64,
    overbought: f64,
    previous: HashMap<String, f64>,
}

impl ThresholdCross {
    pub fn new(oversold: f64, overbought: f64) -> Self {
        Self {
            oversold,
            overbought,
            previous: HashMap::new(),
        }
    }

    /// Feeds one new RSI observation for `timeframe` and returns the signal
    /// kinds that fired. The first observation never fires; it only seeds
    /// the previous value.
    pub fn observe(&mut self, timeframe: &str, current: f64) -> Vec<SignalType> {
        let mut fired = Vec::new();

        if let Some(previous) = self.previous.get(timeframe).copied() {
            if previous > self.oversold && current <= self.oversold {
                fired.push(SignalType::Oversold);
            }
            if previous < self.overbought && current >= self.overbought {
                fired.push(SignalType::Overbought);
            }
        }

        self.previous.insert(timeframe.to_string(), current);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_only_seeds_state() {
        let mut detector = ThresholdCross::new(30.0, 70.0);
        assert!(detector.observe("1min", 25.0).is_empty());
    }

    #[test]
    fn oversold_fires_on_downward_crossing() {
        let mut detector = ThresholdCross::new(30.0, 70.0);
        assert!(detector.observe("1min", 40.0).is_empty());
        // 35 is above the threshold, no crossing yet.
        assert!(detector.observe("1min", 35.0).is_empty());
        assert_eq!(detector.observe("1min", 28.0), vec![SignalType::Oversold]);
    }

    #[test]
    fn crossing_is_edge_triggered_not_level_triggered() {
        let mut detector = ThresholdCross::new(30.0, 70.0);
        detector.observe("1min", 40.0);
        assert_eq!(detector.observe("1min", 28.0), vec![SignalType::Oversold]);
        // Staying in oversold territory must not re-fire.
        assert!(detector.observe("1min", 25.0).is_empty());
        assert!(detector.observe("1min", 25.0).is_empty());
        assert!(detector.observe("1min", 25.0).is_empty());
    }

    #[test]
    fn overbought_fires_on_upward_crossing() {
        let mut detector = ThresholdCross::new(30.0, 70.0);
        detector.observe("5min", 65.0);
        assert_eq!(detector.observe("5min", 72.0), vec![SignalType::Overbought]);
        assert!(detector.observe("5min", 75.0).is_empty());
    }

    #[test]
    fn timeframes_track_state_independently() {
        let mut detector = ThresholdCross::new(30.0, 70.0);
        detector.observe("1min", 40.0);
        detector.observe("5min", 40.0);
        assert_eq!(detector.observe("1min", 29.0), vec![SignalType::Oversold]);
        // 5min still has previous=40, current above threshold.
        assert!(detector.observe("5min", 31.0).is_empty());
    }

    #[test]
    fn landing_exactly_on_threshold_counts_as_entry() {
        let mut detector = ThresholdCross::new(30.0, 70.0);
        detector.observe("1min", 30.5);
        assert_eq!(detector.observe("1min", 30.0), vec![SignalType::Oversold]);
    }
}
