use crate::types::AlertSettings;
use chrono::{DateTime, Duration, Utc};
use core_types::{Signal, SignalType};
use std::collections::{HashMap, HashSet};

/// De-duplication key for an alert.
///
/// Divergence signals carry the unix minute of their timestamp so the same
/// chart event re-detected across polling cycles collapses to one alert,
/// while divergences a minute apart stay distinguishable. Other signal
/// kinds key on `(type, timeframe)` alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AlertKey {
    signal_type: SignalType,
    timeframe: String,
    minute: Option<i64>,
}

impl AlertKey {
    fn for_signal(signal: &Signal) -> Self {
        let minute = signal
            .signal_type
            .is_divergence()
            .then(|| signal.timestamp.timestamp().div_euclid(60));
        Self {
            signal_type: signal.signal_type,
            timeframe: signal.timeframe.clone(),
            minute,
        }
    }
}

/// Gates detected signals before anything is delivered.
///
/// Two suppression mechanisms stack: a per-`SignalType` cooldown for
/// oversold/overbought alerts, and a process-lifetime set of seen keys.
/// The seen set is never pruned, and non-divergence keys carry no time
/// component, so a given `(SignalType, timeframe)` pair alerts at most once
/// per process lifetime; after the first recorded alert the cooldown timer
/// no longer matters for that pair. Callers supply `now`, keeping the
/// policy itself clock-free.
pub struct AlertManager {
    cooldown: Duration,
    last_alert: HashMap<SignalType, DateTime<Utc>>,
    seen: HashSet<AlertKey>,
}

impl AlertManager {
    pub fn new(settings: &AlertSettings) -> Self {
        Self {
            cooldown: Duration::seconds(settings.cooldown_seconds as i64),
            last_alert: HashMap::new(),
            seen: HashSet::new(),
        }
    }

    /// Whether `signal` should be delivered at time `now`.
    pub fn should_send(&self, signal: &Signal, now: DateTime<Utc>) -> bool {
        // Only confirmed signals go out.
        if !signal.confirmed {
            return false;
        }

        // Divergences are unique events; duplicate detection alone covers
        // them. Everything else honors the cooldown.
        if !signal.signal_type.is_divergence() {
            if let Some(last) = self.last_alert.get(&signal.signal_type) {
                if now.signed_duration_since(*last) < self.cooldown {
                    return false;
                }
            }
        }

        !self.seen.contains(&AlertKey::for_signal(signal))
    }

    /// Records a delivered alert: stamps the cooldown clock for the signal
    /// kind and remembers the de-duplication key.
    pub fn record(&mut self, signal: &Signal, now: DateTime<Utc>) {
        self.last_alert.insert(signal.signal_type, now);
        self.seen.insert(AlertKey::for_signal(signal));
    }

    /// Human-readable alert text for dashboards and webhooks.
    pub fn message(&self, signal: &Signal) -> String {
        let name = match signal.signal_type {
            SignalType::Oversold => "🔻 OVERSOLD",
            SignalType::Overbought => "🔺 OVERBOUGHT",
            SignalType::BullishDivergence => "📈 BULLISH DIVERGENCE",
            SignalType::BearishDivergence => "📉 BEARISH DIVERGENCE",
        };

        let mut timeframes: Vec<&String> = signal.timeframes_status.keys().collect();
        timeframes.sort();
        let status = timeframes
            .iter()
            .map(|tf| match signal.timeframes_status[*tf] {
                Some(value) => format!("{tf}: {value:.2}"),
                None => format!("{tf}: N/A"),
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{name} - {symbol}\nRSI: {rsi:.2} ({timeframe})\nTimeframes: {status}\nConfirmed: {confirmed}\nTime: {time}",
            symbol = signal.symbol,
            rsi = signal.rsi_value,
            timeframe = signal.timeframe,
            confirmed = if signal.confirmed { "✅" } else { "❌" },
            time = signal.timestamp.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Symbol;
    use std::collections::HashMap as StatusMap;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn signal(signal_type: SignalType, timeframe: &str, timestamp: DateTime<Utc>) -> Signal {
        let mut status = StatusMap::new();
        status.insert(timeframe.to_string(), Some(28.0));
        Signal {
            signal_type,
            timestamp,
            symbol: Symbol("SPY".to_string()),
            timeframe: timeframe.to_string(),
            rsi_value: 28.0,
            confirmed: true,
            timeframes_status: status,
        }
    }

    fn manager() -> AlertManager {
        AlertManager::new(&AlertSettings::default())
    }

    #[test]
    fn unconfirmed_signals_are_rejected() {
        let manager = manager();
        let mut s = signal(SignalType::Oversold, "1min", t0());
        s.confirmed = false;
        assert!(!manager.should_send(&s, t0()));
    }

    #[test]
    fn cooldown_blocks_same_type_within_window() {
        let mut manager = manager();
        let first = signal(SignalType::Oversold, "1min", t0());
        assert!(manager.should_send(&first, t0()));
        manager.record(&first, t0());

        // Same type on a different timeframe, one minute later: the
        // per-type cooldown still applies.
        let second = signal(SignalType::Oversold, "5min", t0() + Duration::seconds(60));
        assert!(!manager.should_send(&second, t0() + Duration::seconds(60)));

        // After the cooldown, the other timeframe's key is still unseen.
        assert!(manager.should_send(&second, t0() + Duration::seconds(400)));
    }

    #[test]
    fn non_divergence_pair_alerts_at_most_once_per_process() {
        let mut manager = manager();
        let first = signal(SignalType::Oversold, "1min", t0());
        assert!(manager.should_send(&first, t0()));
        manager.record(&first, t0());

        // A fresh oversold on the same pair, long after the cooldown has
        // elapsed: the permanent de-duplication key still rejects it.
        let later = t0() + Duration::seconds(10_000);
        let repeat = signal(SignalType::Oversold, "1min", later);
        assert!(!manager.should_send(&repeat, later));
    }

    #[test]
    fn divergences_skip_the_cooldown() {
        let mut manager = manager();
        let bullish = signal(SignalType::BullishDivergence, "1min", t0());
        manager.record(&bullish, t0());

        // Seconds later, a bearish divergence goes straight through.
        let bearish = signal(
            SignalType::BearishDivergence,
            "1min",
            t0() + Duration::seconds(10),
        );
        assert!(manager.should_send(&bearish, t0() + Duration::seconds(10)));
    }

    #[test]
    fn divergence_duplicates_collapse_by_minute() {
        let mut manager = manager();
        // t0 sits at :20 of its minute, so +30s stays inside the minute and
        // +90s lands in the next one.
        let first = signal(SignalType::BullishDivergence, "1min", t0());
        manager.record(&first, t0());

        let same_minute = signal(
            SignalType::BullishDivergence,
            "1min",
            t0() + Duration::seconds(30),
        );
        assert!(!manager.should_send(&same_minute, t0() + Duration::seconds(30)));

        let next_minute = signal(
            SignalType::BullishDivergence,
            "1min",
            t0() + Duration::seconds(90),
        );
        assert!(manager.should_send(&next_minute, t0() + Duration::seconds(90)));
    }

    #[test]
    fn message_lists_every_timeframe() {
        let manager = manager();
        let mut s = signal(SignalType::Oversold, "1min", t0());
        s.timeframes_status.insert("5min".to_string(), None);
        let message = manager.message(&s);
        assert!(message.contains("OVERSOLD - SPY"));
        assert!(message.contains("RSI: 28.00 (1min)"));
        assert!(message.contains("1min: 28.00"));
        assert!(message.contains("5min: N/A"));
    }
}
