use async_trait::async_trait;
use core_types::{Bar, Symbol};

pub mod error;
pub mod mock;
pub mod tradier;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use mock::MockProvider;
pub use tradier::TradierClient;

/// The universal interface for a market data source.
///
/// Implementations return bar sequences sorted oldest first with strictly
/// increasing timestamps; downstream detection relies on that ordering.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// The name of the provider.
    fn name(&self) -> &'static str;

    /// Fetches up to `count` of the most recent bars for one timeframe.
    async fn historical_bars(
        &self,
        symbol: &Symbol,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<Bar>>;

    /// Fetches only the most recent bar, if any.
    async fn latest_bar(&self, symbol: &Symbol, timeframe: &str) -> Result<Option<Bar>> {
        Ok(self.historical_bars(symbol, timeframe, 1).await?.pop())
    }

    /// Whether the market is currently open for trading.
    async fn is_market_open(&self) -> Result<bool>;
}
