// src/service.rs
use crate::error::{Result, ServiceError};
use crate::fetcher::PriceFetcher;
use crate::models::{Bpi, Coin, CoinRequest, CoinResponse};
use crate::normalizer;
use crate::store::RecordStore;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::info;

pub const CREATED_MSG: &str = "Created Coin!";
pub const DELETED_MSG: &str = "Deleted Coin";

/// Orchestrates the six coin operations over a record store and a price
/// fetcher. One instance is shared by all request handlers; construct it
/// explicitly and pass it down, there is no ambient singleton.
pub struct CoinService<S, F> {
    store: S,
    fetcher: F,
}

impl<S: RecordStore, F: PriceFetcher> CoinService<S, F> {
    pub fn new(store: S, fetcher: F) -> Self {
        CoinService { store, fetcher }
    }

    /// Read-only lookup. A miss yields the sentinel response, never an error.
    pub fn query(&self, chart_name: &str) -> Result<CoinResponse> {
        let coin = self.store.find_coin(chart_name)?;
        let bpis = match &coin {
            Some(c) => self.store.find_bpis(&c.chart_name)?,
            None => BTreeMap::new(),
        };
        Ok(normalizer::from_stored_records(coin, bpis))
    }

    /// Persist the coin and its full BPI set. Calling create again for the
    /// same chart name upserts.
    pub fn create(&self, req: CoinRequest) -> Result<&'static str> {
        let (coin, bpis) = aggregate_from_request(req)?;
        self.store.put_aggregate(&coin, &bpis)?;
        info!("Created coin {} with {} quotes", coin.chart_name, bpis.len());
        Ok(CREATED_MSG)
    }

    /// Replace mandarin name, disclaimer and the entire BPI set, then return
    /// the stored state with a fresh timestamp.
    pub fn update(&self, req: CoinRequest) -> Result<CoinResponse> {
        let (coin, bpis) = aggregate_from_request(req)?;
        self.store.put_aggregate(&coin, &bpis)?;
        info!("Updated coin {} with {} quotes", coin.chart_name, bpis.len());

        let stored = self.store.find_coin(&coin.chart_name)?;
        let stored_bpis = self.store.find_bpis(&coin.chart_name)?;
        Ok(normalizer::from_stored_records(stored, stored_bpis))
    }

    /// Remove the coin and its BPI set. A miss here is a hard failure.
    pub fn delete(&self, chart_name: &str) -> Result<&'static str> {
        if self.store.delete_aggregate(chart_name)? {
            info!("Deleted coin {}", chart_name);
            Ok(DELETED_MSG)
        } else {
            Err(ServiceError::NotFound)
        }
    }

    /// Raw upstream payload, verbatim and uncached.
    pub async fn fetch_external(&self) -> Result<String> {
        self.fetcher.fetch().await
    }

    /// Fetch the upstream payload and normalize it.
    pub async fn convert(&self) -> Result<CoinResponse> {
        let raw = self.fetcher.fetch().await?;
        normalizer::from_external_payload(&raw)
    }
}

/// Validate a request and shape it into store entities. BPI entries are
/// rekeyed so chart name and currency code always match their row.
fn aggregate_from_request(req: CoinRequest) -> Result<(Coin, BTreeMap<String, Bpi>)> {
    if req.chart_name.trim().is_empty() {
        return Err(ServiceError::Validation("chart name is empty".to_string()));
    }

    let coin = Coin {
        chart_name: req.chart_name.clone(),
        mandarin_name: req.mandarin_name,
        disclaimer: req.disclaimer,
        time: Utc::now(),
    };

    let bpis = req
        .bpi
        .into_iter()
        .map(|(code, mut bpi)| {
            bpi.chart_name = coin.chart_name.clone();
            bpi.currency_code = code.clone();
            (code, bpi)
        })
        .collect();

    Ok((coin, bpis))
}
