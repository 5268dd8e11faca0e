// src/normalizer.rs
use crate::error::Result;
use crate::models::{format_utc, Bpi, Coin, CoinResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

// Third-party schema, parsed as-is. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct ExternalPayload {
    time: Option<ExternalTime>,
    disclaimer: Option<String>,
    #[serde(rename = "chartName")]
    chart_name: String,
    bpi: BTreeMap<String, ExternalQuote>,
}

#[derive(Debug, Deserialize)]
struct ExternalTime {
    #[serde(rename = "updatedISO")]
    updated_iso: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalQuote {
    code: String,
    symbol: String,
    rate: String,
    description: String,
    rate_float: f64,
}

/// Parse the raw CoinDesk payload into the canonical response shape.
///
/// Currency codes, symbols, rates and descriptions carry over unchanged. The
/// payload's ISO update time is reformatted for display; when it is absent or
/// unparseable the current instant is used. The external schema has no
/// localized name, so `mandarin_name` stays empty.
pub fn from_external_payload(raw: &str) -> Result<CoinResponse> {
    let ExternalPayload {
        time,
        disclaimer,
        chart_name,
        bpi,
    } = serde_json::from_str(raw)?;

    let time = time
        .and_then(|t| t.updated_iso)
        .and_then(|iso| {
            DateTime::parse_from_rfc3339(&iso)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
        .unwrap_or_else(Utc::now);

    // the outer map key is the unique currency key; the quote's own code
    // field rides along as data
    let bpi = bpi
        .into_iter()
        .map(|(key, q)| {
            let entry = Bpi {
                chart_name: chart_name.clone(),
                currency_code: q.code,
                symbol: q.symbol,
                rate_display: q.rate,
                currency_description: q.description,
                rate_float: q.rate_float,
            };
            (key, entry)
        })
        .collect();

    Ok(CoinResponse {
        chart_name,
        mandarin_name: None,
        disclaimer,
        bpi,
        time: format_utc(time),
    })
}

/// Build the canonical response from stored records, stamped with the
/// current instant. A missing coin degrades to the sentinel response.
pub fn from_stored_records(coin: Option<Coin>, bpis: BTreeMap<String, Bpi>) -> CoinResponse {
    match coin {
        Some(coin) => CoinResponse {
            chart_name: coin.chart_name,
            mandarin_name: Some(coin.mandarin_name),
            disclaimer: Some(coin.disclaimer),
            bpi: bpis,
            time: format_utc(Utc::now()),
        },
        None => CoinResponse::not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NOT_FOUND;

    const FIXTURE: &str = r#"{
        "time": {
            "updated": "Dec 20, 2022 15:01:00 UTC",
            "updatedISO": "2022-12-20T15:01:00+00:00",
            "updateduk": "Dec 20, 2022 at 15:01 GMT"
        },
        "disclaimer": "This data was produced from the CoinDesk Bitcoin Price Index (USD).",
        "chartName": "Bitcoin",
        "bpi": {
            "USD": {
                "code": "USD",
                "symbol": "&#36;",
                "rate": "16,934.2840",
                "description": "United States Dollar",
                "rate_float": 16934.284
            },
            "GBP": {
                "code": "GBP",
                "symbol": "&pound;",
                "rate": "14,150.1522",
                "description": "British Pound Sterling",
                "rate_float": 14150.1522
            },
            "EUR": {
                "code": "EUR",
                "symbol": "&euro;",
                "rate": "16,496.4650",
                "description": "Euro",
                "rate_float": 16496.465
            }
        }
    }"#;

    #[test]
    fn parses_external_payload() {
        let res = from_external_payload(FIXTURE).unwrap();

        assert_eq!(res.chart_name, "Bitcoin");
        assert_eq!(res.mandarin_name, None);
        assert_eq!(
            res.disclaimer.as_deref(),
            Some("This data was produced from the CoinDesk Bitcoin Price Index (USD).")
        );
        assert_eq!(res.time, "2022/12/20 15:01:00");

        assert_eq!(
            res.bpi.keys().collect::<Vec<_>>(),
            vec!["EUR", "GBP", "USD"]
        );
        let usd = &res.bpi["USD"];
        assert_eq!(usd.chart_name, "Bitcoin");
        assert_eq!(usd.currency_code, "USD");
        assert_eq!(usd.symbol, "&#36;");
        assert_eq!(usd.rate_display, "16,934.2840");
        assert_eq!(usd.currency_description, "United States Dollar");
        assert_eq!(usd.rate_float, 16934.284);
    }

    #[test]
    fn entries_are_keyed_by_outer_map_key() {
        // a quote whose inner code disagrees with its map key must not
        // collide with another entry
        let raw = r#"{
            "chartName": "Bitcoin",
            "bpi": {
                "USD": {
                    "code": "XXX",
                    "symbol": "&#36;",
                    "rate": "1.0000",
                    "description": "mislabeled",
                    "rate_float": 1.0
                },
                "GBP": {
                    "code": "XXX",
                    "symbol": "&pound;",
                    "rate": "2.0000",
                    "description": "mislabeled",
                    "rate_float": 2.0
                }
            }
        }"#;
        let res = from_external_payload(raw).unwrap();
        assert_eq!(res.bpi.len(), 2);
        assert_eq!(res.bpi["USD"].currency_code, "XXX");
        assert_eq!(res.bpi["USD"].rate_float, 1.0);
        assert_eq!(res.bpi["GBP"].rate_float, 2.0);
    }

    #[test]
    fn missing_update_time_falls_back_to_now() {
        let raw = r#"{"chartName": "Bitcoin", "bpi": {}}"#;
        let res = from_external_payload(raw).unwrap();
        assert_eq!(res.chart_name, "Bitcoin");
        assert!(res.bpi.is_empty());
        assert!(!res.time.is_empty());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(from_external_payload("not json").is_err());
        assert!(from_external_payload(r#"{"bpi": {}}"#).is_err());
    }

    #[test]
    fn stored_records_map_into_response() {
        let coin = Coin {
            chart_name: "Bitcoin".to_string(),
            mandarin_name: "比特幣".to_string(),
            disclaimer: "d".to_string(),
            time: Utc::now(),
        };
        let mut bpis = BTreeMap::new();
        bpis.insert(
            "GBP".to_string(),
            Bpi {
                chart_name: "Bitcoin".to_string(),
                currency_code: "GBP".to_string(),
                symbol: "&pound;".to_string(),
                rate_display: "14,150.1522".to_string(),
                currency_description: "British Pound Sterling".to_string(),
                rate_float: 14150.1522,
            },
        );

        let res = from_stored_records(Some(coin), bpis.clone());
        assert_eq!(res.chart_name, "Bitcoin");
        assert_eq!(res.mandarin_name.as_deref(), Some("比特幣"));
        assert_eq!(res.bpi, bpis);
    }

    #[test]
    fn missing_coin_degrades_to_sentinel() {
        let res = from_stored_records(None, BTreeMap::new());
        assert_eq!(res.chart_name, NOT_FOUND);
        assert!(res.bpi.is_empty());
    }
}
