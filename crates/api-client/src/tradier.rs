use crate::types::{ClockResponse, HistoryResponse, TimesalesResponse};
use crate::{Error, MarketDataProvider, Result};
use app_config::TradierSettings;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use core_types::{timeframe_minutes, Bar, Symbol};
use reqwest::StatusCode;

// A regular session is 390 minutes (09:30-16:00 ET).
const SESSION_MINUTES: usize = 390;
const MIN_CALENDAR_DAYS: usize = 30;
const MAX_CALENDAR_DAYS: usize = 365;

/// Tradier market-data connector.
///
/// Intraday bars come from the timesales endpoint one session at a time,
/// walking backwards from today until enough bars are gathered; weekends
/// and holidays answer 400 and are skipped. Daily bars use the history
/// endpoint.
pub struct TradierClient {
    http_client: reqwest::Client,
    settings: TradierSettings,
}

impl TradierClient {
    pub fn new(settings: &TradierSettings) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            settings: settings.clone(),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .get(format!("{}{}", self.settings.base_url, path))
            .bearer_auth(&self.settings.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// One session's intraday bars. An HTTP 400 marks a non-trading date
    /// and yields an empty list.
    async fn timesales_session(
        &self,
        symbol: &Symbol,
        timeframe: &str,
        date: NaiveDate,
    ) -> Result<Vec<Bar>> {
        let start = format!("{date} 09:30");
        let end = format!("{date} 16:00");
        let response = self
            .get("/markets/timesales")
            .query(&[
                ("symbol", symbol.0.as_str()),
                ("interval", timeframe),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("session_filter", "all"),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::BAD_REQUEST {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Error::ApiStatus {
                status: response.status().as_u16(),
                endpoint: "/markets/timesales".to_string(),
            });
        }

        let body: TimesalesResponse = response.json().await?;
        let bars = body
            .series
            .map(|series| series.data.iter().map(|point| point.to_bar()).collect())
            .unwrap_or_default();
        Ok(bars)
    }

    async fn intraday_bars(
        &self,
        symbol: &Symbol,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<Bar>> {
        let minutes = timeframe_minutes(timeframe)
            .map_err(|_| Error::UnsupportedTimeframe(timeframe.to_string()))?;

        // Estimate how many calendar days to probe: bars per session, then
        // trading days, then calendar days with weekend/holiday slack.
        let bars_per_session = (SESSION_MINUTES / minutes as usize).max(1);
        let trading_days = count / bars_per_session + 1;
        let max_days_back = (trading_days * 7 / 5 * 3 / 2).clamp(MIN_CALENDAR_DAYS, MAX_CALENDAR_DAYS);

        tracing::debug!(
            %symbol,
            timeframe,
            count,
            max_days_back,
            "Walking back through timesales sessions."
        );

        let today = Utc::now().date_naive();
        let mut sessions: Vec<Vec<Bar>> = Vec::new();
        let mut gathered = 0usize;

        for days_back in 0..max_days_back {
            let date = today - Duration::days(days_back as i64);
            let bars = self.timesales_session(symbol, timeframe, date).await?;
            if bars.is_empty() {
                continue;
            }
            gathered += bars.len();
            sessions.push(bars);
            if gathered >= count {
                break;
            }
        }

        // Sessions were collected newest first; flatten oldest first and
        // keep only the most recent `count` bars.
        sessions.reverse();
        let mut bars: Vec<Bar> = sessions.into_iter().flatten().collect();
        bars.sort_by_key(|bar| bar.timestamp);
        if bars.len() > count {
            bars.drain(..bars.len() - count);
        }
        Ok(bars)
    }

    async fn daily_bars(&self, symbol: &Symbol, count: usize) -> Result<Vec<Bar>> {
        let end = Utc::now().date_naive();
        let start = (end - Duration::days(30)).to_string();
        let end = end.to_string();

        let response = self
            .get("/markets/history")
            .query(&[
                ("symbol", symbol.0.as_str()),
                ("interval", "daily"),
                ("start", start.as_str()),
                ("end", end.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ApiStatus {
                status: response.status().as_u16(),
                endpoint: "/markets/history".to_string(),
            });
        }

        let body: HistoryResponse = response.json().await?;
        let mut bars: Vec<Bar> = body
            .history
            .map(|history| history.day.iter().filter_map(|day| day.to_bar()).collect())
            .unwrap_or_default();
        bars.sort_by_key(|bar| bar.timestamp);
        if bars.len() > count {
            bars.drain(..bars.len() - count);
        }
        Ok(bars)
    }
}

#[async_trait]
impl MarketDataProvider for TradierClient {
    fn name(&self) -> &'static str {
        "tradier"
    }

    async fn historical_bars(
        &self,
        symbol: &Symbol,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<Bar>> {
        if timeframe.ends_with("min") {
            self.intraday_bars(symbol, timeframe, count).await
        } else {
            self.daily_bars(symbol, count).await
        }
    }

    async fn is_market_open(&self) -> Result<bool> {
        let response = self.get("/markets/clock").send().await?;
        if !response.status().is_success() {
            return Err(Error::ApiStatus {
                status: response.status().as_u16(),
                endpoint: "/markets/clock".to_string(),
            });
        }
        let body: ClockResponse = response.json().await?;
        Ok(body.clock.state == "open")
    }
}
