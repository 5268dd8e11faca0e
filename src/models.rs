// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Display format for response timestamps (UTC).
pub const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Chart name returned when a coin is absent from the store.
pub const NOT_FOUND: &str = "not found!";

pub fn format_utc(ts: DateTime<Utc>) -> String {
    ts.format(TIME_FORMAT).to_string()
}

/// A tracked asset, keyed by chart name
#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    pub chart_name: String,
    pub mandarin_name: String,
    pub disclaimer: String,
    pub time: DateTime<Utc>, // set on write
}

/// One currency quotation for a coin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bpi {
    pub chart_name: String,
    pub currency_code: String,
    pub symbol: String,
    pub rate_display: String, // formatted, e.g. "16,934.2840"
    pub currency_description: String,
    pub rate_float: f64,
}

/// Inbound DTO for create/update calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoinRequest {
    pub chart_name: String,
    #[serde(default)]
    pub mandarin_name: String,
    #[serde(default)]
    pub disclaimer: String,
    #[serde(default)]
    pub bpi: BTreeMap<String, Bpi>,
}

/// Canonical response shape for every read path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoinResponse {
    pub chart_name: String,
    pub mandarin_name: Option<String>,
    pub disclaimer: Option<String>,
    pub bpi: BTreeMap<String, Bpi>,
    pub time: String, // formatted per TIME_FORMAT
}

impl CoinResponse {
    /// Sentinel response for a read miss
    pub fn not_found() -> Self {
        CoinResponse {
            chart_name: NOT_FOUND.to_string(),
            mandarin_name: None,
            disclaimer: None,
            bpi: BTreeMap::new(),
            time: format_utc(Utc::now()),
        }
    }
}
