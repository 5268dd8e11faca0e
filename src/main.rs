use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use coindesk_proxy::{api, config, fetcher::CoindeskFetcher, service::CoinService, store::SqliteStore};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();

    info!("Coindesk Proxy starting...");

    let cfg = config::load()?;
    info!("  DB Path: {}", cfg.db_path);
    info!("  Port: {}", cfg.port);
    info!("  Coindesk URL: {}", cfg.coindesk_url);

    let store = SqliteStore::connect(&cfg.db_path).map_err(|e| eyre::eyre!("{e}"))?;
    let fetcher = CoindeskFetcher::new(
        &cfg.coindesk_url,
        Duration::from_secs(cfg.fetch_timeout_secs),
    )
    .map_err(|e| eyre::eyre!("{e}"))?;
    let service = Arc::new(CoinService::new(store, fetcher));

    let api_handle = tokio::spawn({
        let cfg = cfg.clone();
        async move { api::serve(cfg, service).await }
    });

    tokio::select! {
        res = api_handle => match res {
            Ok(Ok(_)) => info!("API exited cleanly"),
            Ok(Err(e)) => error!("API error: {:?}", e),
            Err(e) => error!("API task panicked: {:?}", e),
        },
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping...");
        }
    }

    info!("Coindesk Proxy stopped.");
    Ok(())
}
