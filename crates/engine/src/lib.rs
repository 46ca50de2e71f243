use alerts::{AlertManager, AlertStore, DiscordNotifier, StoredAlert};
use anyhow::Result;
use api_client::MarketDataProvider;
use app_config::Settings;
use chrono::Utc;
use core_types::{Bar, Symbol};
use events::{WsAlert, WsCache, WsMarketUpdate, WsMessage, WS_CACHE_SIZE};
use indicators::Rsi;
use signals::SignalDetector;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// The polling orchestrator: refreshes bars, runs detection, gates alerts
/// and fans admitted ones out to the dashboard, Discord and the history
/// file.
///
/// One engine owns one detector and one admission policy for one symbol
/// and runs on a single task; none of that state is shared across threads.
pub struct Engine {
    settings: Settings,
    symbol: Symbol,
    provider: Box<dyn MarketDataProvider>,
    detector: SignalDetector,
    alert_manager: AlertManager,
    rsi: Rsi,
    store: Arc<AlertStore>,
    discord: Option<DiscordNotifier>,
    ws_tx: broadcast::Sender<WsMessage>,
    ws_cache: WsCache,
    bars_cache: HashMap<String, Vec<Bar>>,
}

impl Engine {
    pub fn new(
        settings: Settings,
        provider: Box<dyn MarketDataProvider>,
        store: Arc<AlertStore>,
        ws_tx: broadcast::Sender<WsMessage>,
        ws_cache: WsCache,
    ) -> Result<Self> {
        let symbol = Symbol(settings.symbol.clone());
        let detector = SignalDetector::new(
            &settings.rsi,
            settings.timeframes.clone(),
            symbol.clone(),
        );
        let alert_manager = AlertManager::new(&settings.alerts);
        let rsi = Rsi::new(settings.rsi.period);
        let discord = settings
            .alerts
            .discord
            .as_ref()
            .map(DiscordNotifier::new)
            .transpose()?;
        let bars_cache = settings
            .timeframes
            .iter()
            .map(|tf| (tf.clone(), Vec::new()))
            .collect();

        Ok(Self {
            settings,
            symbol,
            provider,
            detector,
            alert_manager,
            rsi,
            store,
            discord,
            ws_tx,
            ws_cache,
            bars_cache,
        })
    }

    /// Runs the alerting loop until the process is terminated.
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(
            symbol = %self.symbol,
            timeframes = ?self.settings.timeframes,
            interval_seconds = self.settings.engine.polling_interval_seconds,
            provider = self.provider.name(),
            "Starting RSI alerting engine."
        );

        let interval = Duration::from_secs(self.settings.engine.polling_interval_seconds);
        loop {
            if let Err(err) = self.run_once().await {
                tracing::error!(%err, "Polling cycle failed.");
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// One polling cycle: refresh, detect, admit, deliver.
    pub async fn run_once(&mut self) -> Result<()> {
        if !self.is_market_hours().await {
            tracing::debug!("Market is closed, skipping cycle.");
            return Ok(());
        }

        self.refresh_bars().await;
        self.publish_market_update();

        let signals = self.detector.detect(&self.bars_cache);
        for signal in signals {
            let now = Utc::now();
            if !self.alert_manager.should_send(&signal, now) {
                tracing::debug!(
                    signal_type = %signal.signal_type,
                    timeframe = %signal.timeframe,
                    "Signal suppressed by admission policy."
                );
                continue;
            }

            let message = self.alert_manager.message(&signal);

            self.publish(WsMessage::Alert(WsAlert {
                signal: signal.clone(),
                message: message.clone(),
            }));

            if let Some(discord) = &self.discord {
                if let Err(err) = discord.send(&message).await {
                    tracing::error!(%err, "Discord delivery failed.");
                }
            }

            if let Err(err) = self.store.append(StoredAlert {
                signal: signal.clone(),
                message,
                sent_at: now,
            }) {
                tracing::error!(%err, "Failed to persist alert.");
            }

            self.alert_manager.record(&signal, now);
            tracing::info!(
                signal_type = %signal.signal_type,
                timeframe = %signal.timeframe,
                rsi = signal.rsi_value,
                "Alert sent."
            );
        }

        Ok(())
    }

    async fn is_market_hours(&self) -> bool {
        if self.settings.engine.bypass_market_hours {
            return true;
        }
        match self.provider.is_market_open().await {
            Ok(open) => open,
            Err(err) => {
                // Keep polling when the clock endpoint is unreachable.
                tracing::warn!(%err, "Market clock unavailable; assuming open.");
                true
            }
        }
    }

    /// Refreshes the bar cache for every monitored timeframe. A failed
    /// fetch keeps the previous series; the next cycle tries again.
    async fn refresh_bars(&mut self) {
        let count = self.settings.engine.historical_bars_count;
        for timeframe in &self.settings.timeframes {
            match self
                .provider
                .historical_bars(&self.symbol, timeframe, count)
                .await
            {
                Ok(bars) if !bars.is_empty() => {
                    tracing::debug!(timeframe = %timeframe, bars = bars.len(), "Updated bars.");
                    self.bars_cache.insert(timeframe.clone(), bars);
                }
                Ok(_) => {
                    tracing::warn!(timeframe = %timeframe, "No bars returned.");
                }
                Err(err) => {
                    tracing::error!(timeframe = %timeframe, %err, "Failed to update bars.");
                }
            }
        }
    }

    /// Logs the per-timeframe snapshot and pushes one market update to the
    /// dashboard.
    fn publish_market_update(&self) {
        let mut rsi_by_timeframe = HashMap::new();
        let mut current_price = None;

        for timeframe in &self.settings.timeframes {
            let Some(bars) = self.bars_cache.get(timeframe).filter(|bars| !bars.is_empty())
            else {
                tracing::info!(timeframe = %timeframe, "No bars available.");
                continue;
            };

            if current_price.is_none() {
                current_price = bars.last().map(|bar| bar.close);
            }

            match self.rsi.latest(bars) {
                Some(value) => {
                    tracing::info!(timeframe = %timeframe, bars = bars.len(), rsi = value, "Cycle snapshot.");
                    rsi_by_timeframe.insert(timeframe.clone(), value);
                }
                None => {
                    tracing::info!(timeframe = %timeframe, bars = bars.len(), "Not enough data for RSI.");
                }
            }
        }

        if let Some(price) = current_price {
            if !rsi_by_timeframe.is_empty() {
                self.publish(WsMessage::MarketUpdate(WsMarketUpdate {
                    timestamp: Utc::now(),
                    price,
                    rsi_by_timeframe,
                }));
            }
        }
    }

    /// Broadcasts to live clients and feeds the replay cache.
    fn publish(&self, message: WsMessage) {
        // A send error only means no dashboard client is connected.
        let _ = self.ws_tx.send(message.clone());

        let mut cache = self.ws_cache.lock().unwrap();
        if cache.len() >= WS_CACHE_SIZE {
            cache.pop_front();
        }
        cache.push_back(message);
    }
}
