use alerts::AlertStore;
use anyhow::Result;
use api_client::{MarketDataProvider, MockProvider, TradierClient};
use app_config::{ProviderKind, Settings};
use clap::{Parser, Subcommand};
use engine::Engine;
use events::{WsCache, WsMessage, WS_CACHE_SIZE};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing_subscriber::prelude::*;
use web_server::types::StatusInfo;
use web_server::AppState;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A multi-timeframe RSI alerting service.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the polling loop together with the dashboard server.
    Run,

    /// Runs a single polling cycle and exits (useful for diagnostics).
    Once,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new().with_default(tracing::Level::INFO),
    );
    tracing_subscriber::registry().with(fmt_layer).init();

    let cli = Cli::parse();

    let settings = app_config::load_settings()?;
    tracing::info!(
        environment = %settings.app.environment,
        symbol = %settings.symbol,
        "Starting RSI alerter application"
    );

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_app(settings).await?,
        Commands::Once => run_once(settings).await?,
    }

    Ok(())
}

/// Selects the market data provider configured in the settings.
fn create_provider(settings: &Settings) -> Box<dyn MarketDataProvider> {
    match settings.provider {
        ProviderKind::Tradier => {
            if settings.tradier.api_key.is_empty() {
                tracing::warn!(
                    "Tradier API key is not set. Set APP_TRADIER__API_KEY or switch provider to \"mock\"."
                );
            }
            Box::new(TradierClient::new(&settings.tradier))
        }
        ProviderKind::Mock => Box::new(MockProvider::default()),
    }
}

/// Runs the dashboard server and the polling engine side by side.
async fn run_app(settings: Settings) -> Result<()> {
    let (ws_tx, _) = broadcast::channel::<WsMessage>(1024);
    let ws_cache: WsCache = Arc::new(Mutex::new(VecDeque::with_capacity(WS_CACHE_SIZE)));

    let store = Arc::new(AlertStore::new(
        &settings.alerts.history_file,
        settings.alerts.max_history,
    ));

    let provider = create_provider(&settings);
    let status = StatusInfo {
        symbol: settings.symbol.clone(),
        timeframes: settings.timeframes.clone(),
        provider: provider.name().to_string(),
        polling_interval_seconds: settings.engine.polling_interval_seconds,
    };

    let app_state = AppState {
        store: store.clone(),
        status,
        ws_tx: ws_tx.clone(),
        ws_cache: ws_cache.clone(),
    };
    let server_settings = settings.server.clone();
    tokio::spawn(async move {
        if let Err(err) = web_server::run(&server_settings, app_state).await {
            tracing::error!(%err, "Web server terminated.");
        }
    });

    let mut engine = Engine::new(settings, provider, store, ws_tx, ws_cache)?;
    engine.run().await
}

/// One polling cycle without the web server, then exit.
async fn run_once(settings: Settings) -> Result<()> {
    let (ws_tx, _) = broadcast::channel::<WsMessage>(1024);
    let ws_cache: WsCache = Arc::new(Mutex::new(VecDeque::with_capacity(WS_CACHE_SIZE)));

    let store = Arc::new(AlertStore::new(
        &settings.alerts.history_file,
        settings.alerts.max_history,
    ));
    let provider = create_provider(&settings);

    let mut engine = Engine::new(settings, provider, store, ws_tx, ws_cache)?;
    engine.run_once().await
}
