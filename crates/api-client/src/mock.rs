use crate::{Error, MarketDataProvider, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use core_types::{timeframe_minutes, Bar, Symbol};
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Simulated market data: a gentle random walk around a base price.
///
/// Used when no provider credentials are available; behaves like a market
/// that is always open.
pub struct MockProvider {
    base_price: f64,
}

impl MockProvider {
    pub fn new(base_price: f64) -> Self {
        Self { base_price }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(500.0)
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn historical_bars(
        &self,
        _symbol: &Symbol,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<Bar>> {
        let minutes = timeframe_minutes(timeframe)
            .map_err(|_| Error::UnsupportedTimeframe(timeframe.to_string()))?;

        let mut rng = rand::rng();
        let now = Utc::now();
        let mut price = self.base_price;
        let mut bars = Vec::with_capacity(count);

        for i in 0..count {
            let timestamp =
                now - Duration::minutes(minutes as i64 * (count - i - 1) as i64);

            // +/- 0.2% drift per bar with a little intra-bar spread.
            price *= 1.0 + rng.random_range(-0.002..0.002);
            let open = price * rng.random_range(0.9995..1.0005);
            let high = price * rng.random_range(1.0..1.001);
            let low = price * rng.random_range(0.999..1.0);
            let volume: i64 = rng.random_range(100_000..10_000_000);

            bars.push(Bar {
                timestamp,
                open: Decimal::from_f64(open).unwrap_or_default(),
                high: Decimal::from_f64(high).unwrap_or_default(),
                low: Decimal::from_f64(low).unwrap_or_default(),
                close: Decimal::from_f64(price).unwrap_or_default(),
                volume: Decimal::from(volume),
            });
        }

        Ok(bars)
    }

    async fn is_market_open(&self) -> Result<bool> {
        Ok(true)
    }
}
