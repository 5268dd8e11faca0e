use crate::error::Result;
use crate::models::{Bpi, Coin};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS coins (
  chart_name    TEXT PRIMARY KEY,
  mandarin_name TEXT NOT NULL,
  disclaimer    TEXT NOT NULL,
  time          TEXT NOT NULL -- RFC3339
);

CREATE TABLE IF NOT EXISTS bpis (
  chart_name           TEXT NOT NULL,
  currency_code        TEXT NOT NULL,
  symbol               TEXT NOT NULL,
  rate_display         TEXT NOT NULL,
  currency_description TEXT NOT NULL,
  rate_float           REAL NOT NULL,
  PRIMARY KEY (chart_name, currency_code)
);
"#;

/// CRUD contract over the coin aggregate (one Coin plus its BPI set).
///
/// A coin and its price set are written and deleted as one unit so a failure
/// mid-write cannot leave a coin with a partial BPI set.
pub trait RecordStore: Send + Sync {
    /// Upsert the coin and replace its full BPI set.
    fn put_aggregate(&self, coin: &Coin, bpis: &BTreeMap<String, Bpi>) -> Result<()>;
    fn find_coin(&self, chart_name: &str) -> Result<Option<Coin>>;
    fn find_bpis(&self, chart_name: &str) -> Result<BTreeMap<String, Bpi>>;
    /// Remove the coin and its BPI rows. Returns false when no coin existed.
    fn delete_aggregate(&self, chart_name: &str) -> Result<bool>;
}

/// SQLite-backed store, shared across request handlers
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a database file (WAL mode) and run schema migrations
    pub fn connect(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_connection(conn)
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(INIT_SQL)?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn parse_time(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl RecordStore for SqliteStore {
    fn put_aggregate(&self, coin: &Coin, bpis: &BTreeMap<String, Bpi>) -> Result<()> {
        let mut db = self.conn.lock().unwrap();
        let tx = db.transaction()?;

        tx.execute(
            r#"
            INSERT INTO coins (chart_name, mandarin_name, disclaimer, time)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(chart_name) DO UPDATE SET
                mandarin_name = excluded.mandarin_name,
                disclaimer    = excluded.disclaimer,
                time          = excluded.time
            "#,
            params![
                coin.chart_name,
                coin.mandarin_name,
                coin.disclaimer,
                coin.time.to_rfc3339()
            ],
        )?;

        // full replacement keeps the BPI set in lockstep with the request
        tx.execute(
            "DELETE FROM bpis WHERE chart_name = ?1",
            params![coin.chart_name],
        )?;
        for bpi in bpis.values() {
            tx.execute(
                r#"
                INSERT INTO bpis (
                    chart_name, currency_code, symbol,
                    rate_display, currency_description, rate_float
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    bpi.chart_name,
                    bpi.currency_code,
                    bpi.symbol,
                    bpi.rate_display,
                    bpi.currency_description,
                    bpi.rate_float
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn find_coin(&self, chart_name: &str) -> Result<Option<Coin>> {
        let db = self.conn.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT chart_name, mandarin_name, disclaimer, time
             FROM coins WHERE chart_name = ?1",
        )?;

        let row = stmt
            .query_row(params![chart_name], |r| {
                let time_str: String = r.get(3)?;
                Ok(Coin {
                    chart_name: r.get(0)?,
                    mandarin_name: r.get(1)?,
                    disclaimer: r.get(2)?,
                    time: parse_time(&time_str),
                })
            })
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        Ok(row)
    }

    fn find_bpis(&self, chart_name: &str) -> Result<BTreeMap<String, Bpi>> {
        let db = self.conn.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT chart_name, currency_code, symbol,
                    rate_display, currency_description, rate_float
             FROM bpis WHERE chart_name = ?1",
        )?;

        let rows = stmt.query_map(params![chart_name], |r| {
            Ok(Bpi {
                chart_name: r.get(0)?,
                currency_code: r.get(1)?,
                symbol: r.get(2)?,
                rate_display: r.get(3)?,
                currency_description: r.get(4)?,
                rate_float: r.get(5)?,
            })
        })?;

        let mut map = BTreeMap::new();
        for row in rows {
            let bpi = row?;
            map.insert(bpi.currency_code.clone(), bpi);
        }
        Ok(map)
    }

    fn delete_aggregate(&self, chart_name: &str) -> Result<bool> {
        let mut db = self.conn.lock().unwrap();
        let tx = db.transaction()?;
        let removed = tx.execute("DELETE FROM coins WHERE chart_name = ?1", params![chart_name])?;
        tx.execute("DELETE FROM bpis WHERE chart_name = ?1", params![chart_name])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}
