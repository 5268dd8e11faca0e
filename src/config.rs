use dotenvy::dotenv;
use eyre::Result;
use std::env;
use tracing::info;

pub const DEFAULT_COINDESK_URL: &str = "https://api.coindesk.com/v1/bpi/currentprice.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub port: u16,
    pub coindesk_url: String,
    pub fetch_timeout_secs: u64,
}

pub fn load() -> Result<Config> {
    dotenv().ok();

    let cfg = load_from(|key| env::var(key).ok());
    info!("Loaded config: {:?}", cfg);

    Ok(cfg)
}

fn load_from(var: impl Fn(&str) -> Option<String>) -> Config {
    let db_path = var("DATABASE_URL").unwrap_or_else(|| "coindesk.db".to_string());

    let port = var("PORT")
        .unwrap_or_else(|| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let coindesk_url = var("COINDESK_URL").unwrap_or_else(|| DEFAULT_COINDESK_URL.to_string());

    let fetch_timeout_secs = var("FETCH_TIMEOUT_SECS")
        .unwrap_or_else(|| "10".to_string())
        .parse()
        .unwrap_or(10);

    Config {
        db_path,
        port,
        coindesk_url,
        fetch_timeout_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = load_from(|_| None);
        assert_eq!(cfg.db_path, "coindesk.db");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.coindesk_url, DEFAULT_COINDESK_URL);
        assert_eq!(cfg.fetch_timeout_secs, 10);
    }

    #[test]
    fn set_values_override_defaults() {
        let cfg = load_from(|key| match key {
            "DATABASE_URL" => Some("/tmp/test.db".to_string()),
            "PORT" => Some("9000".to_string()),
            "FETCH_TIMEOUT_SECS" => Some("3".to_string()),
            _ => None,
        });
        assert_eq!(cfg.db_path, "/tmp/test.db");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.coindesk_url, DEFAULT_COINDESK_URL);
        assert_eq!(cfg.fetch_timeout_secs, 3);
    }

    #[test]
    fn unparseable_values_fall_back() {
        let cfg = load_from(|key| match key {
            "PORT" => Some("not-a-port".to_string()),
            _ => None,
        });
        assert_eq!(cfg.port, 8080);
    }
}
