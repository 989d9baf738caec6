//! SQLite persistence adapter: bar history, signal log and position store.
//!
//! Bars use `INSERT OR REPLACE` keyed on (ticker, date), so an intraday
//! refresh replaces the same-day row instead of appending a duplicate.
//! Position exits run in a transaction with a `status = 'OPEN'` guard; a
//! racing exit simply loses and is reported as not-applied.

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::domain::error::DipscanError;
use crate::domain::ohlcv::Bar;
use crate::domain::position::{ExitFill, ExitReason, Position, PositionStatus};
use crate::domain::signal::{Confidence, Direction, Signal};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::position_store::PositionStore;
use crate::ports::price_port::PricePort;
use crate::ports::signal_store::SignalStore;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn db_err(e: impl ToString) -> DipscanError {
    DipscanError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: impl ToString) -> DipscanError {
    DipscanError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                raw.len(),
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DipscanError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| DipscanError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;
        // non-positive values fall back to the default
        let pool_size = u32::try_from(config.get_int("sqlite", "pool_size", 4))
            .ok()
            .filter(|size| *size > 0)
            .unwrap_or(4);

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(db_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, DipscanError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(db_err)?;
        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), DipscanError> {
        let conn = self.pool.get().map_err(db_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS ohlcv (
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL NOT NULL,
                PRIMARY KEY (ticker, date)
            );
            CREATE INDEX IF NOT EXISTS idx_ohlcv_date ON ohlcv(date);

            CREATE TABLE IF NOT EXISTS signals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL,
                generated_at TEXT NOT NULL,
                rsi REAL,
                atr REAL,
                score INTEGER NOT NULL,
                confidence TEXT NOT NULL,
                direction TEXT NOT NULL,
                reasons TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_signals_ticker ON signals(ticker);

            CREATE TABLE IF NOT EXISTS positions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL,
                signal_id INTEGER,
                entry_price REAL NOT NULL,
                quantity INTEGER NOT NULL,
                stop_loss REAL,
                target_price REAL,
                auto_exit INTEGER NOT NULL,
                status TEXT NOT NULL,
                entry_time TEXT NOT NULL,
                exit_price REAL,
                exit_time TEXT,
                exit_reason TEXT,
                pnl REAL,
                pnl_percent REAL
            );
            CREATE INDEX IF NOT EXISTS idx_positions_status ON positions(status);",
        )
        .map_err(query_err)?;

        Ok(())
    }

    /// Insert or replace bars. Replaces an existing same-day row, which is
    /// how an intraday refresh updates today's bar.
    pub fn upsert_bars(&self, bars: &[Bar]) -> Result<(), DipscanError> {
        let mut conn = self.pool.get().map_err(db_err)?;
        let tx = conn.transaction().map_err(query_err)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv (ticker, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    bar.ticker,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(())
    }

    fn row_to_position(row: &rusqlite::Row<'_>) -> Result<Position, rusqlite::Error> {
        let conversion = |idx: usize, e: DipscanError| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::other(e.to_string())),
            )
        };

        let status_raw: String = row.get(8)?;
        let status = PositionStatus::parse(&status_raw).map_err(|e| conversion(8, e))?;

        let entry_raw: String = row.get(9)?;
        let entry_time = parse_timestamp(&entry_raw)?;

        let exit_time = match row.get::<_, Option<String>>(11)? {
            Some(raw) => Some(parse_timestamp(&raw)?),
            None => None,
        };

        let exit_reason = match row.get::<_, Option<String>>(12)? {
            Some(raw) => Some(ExitReason::parse(&raw).map_err(|e| conversion(12, e))?),
            None => None,
        };

        Ok(Position {
            id: row.get(0)?,
            ticker: row.get(1)?,
            signal_id: row.get(2)?,
            entry_price: row.get(3)?,
            quantity: row.get(4)?,
            stop_loss: row.get(5)?,
            target_price: row.get(6)?,
            auto_exit: row.get(7)?,
            status,
            entry_time,
            exit_price: row.get(10)?,
            exit_time,
            exit_reason,
            pnl: row.get(13)?,
            pnl_percent: row.get(14)?,
        })
    }
}

const POSITION_COLUMNS: &str = "id, ticker, signal_id, entry_price, quantity, stop_loss, \
     target_price, auto_exit, status, entry_time, exit_price, exit_time, exit_reason, \
     pnl, pnl_percent";

impl DataPort for SqliteAdapter {
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<Bar>, DipscanError> {
        let conn = self.pool.get().map_err(db_err)?;

        let mut stmt = conn
            .prepare(
                "SELECT ticker, date, open, high, low, close, volume
                 FROM ohlcv WHERE ticker = ?1 ORDER BY date ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![ticker], |row| {
                let date_str: String = row.get(1)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        date_str.len(),
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(Bar {
                    ticker: row.get(0)?,
                    date,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: row.get(6)?,
                })
            })
            .map_err(query_err)?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row.map_err(query_err)?);
        }
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, DipscanError> {
        let conn = self.pool.get().map_err(db_err)?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT ticker FROM ohlcv ORDER BY ticker")
            .map_err(query_err)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_err)?;

        let mut tickers = Vec::new();
        for row in rows {
            tickers.push(row.map_err(query_err)?);
        }
        Ok(tickers)
    }
}

impl PricePort for SqliteAdapter {
    /// Latest stored close stands in for a live quote.
    fn current_price(&self, ticker: &str) -> Result<Option<f64>, DipscanError> {
        let conn = self.pool.get().map_err(db_err)?;
        conn.query_row(
            "SELECT close FROM ohlcv WHERE ticker = ?1 ORDER BY date DESC LIMIT 1",
            params![ticker],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(query_err(other)),
        })
    }
}

impl SignalStore for SqliteAdapter {
    fn record_signal(&self, signal: &Signal) -> Result<i64, DipscanError> {
        let conn = self.pool.get().map_err(db_err)?;
        conn.execute(
            "INSERT INTO signals (ticker, generated_at, rsi, atr, score, confidence, direction, reasons)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                signal.ticker,
                signal.generated_at.to_rfc3339(),
                signal.rsi,
                signal.atr,
                signal.score,
                signal.confidence.as_str(),
                signal.direction.as_str(),
                signal.reasons.join("\n"),
            ],
        )
        .map_err(query_err)?;

        Ok(conn.last_insert_rowid())
    }
}

impl SqliteAdapter {
    /// Most recent signals for display, newest first.
    pub fn recent_signals(&self, limit: usize) -> Result<Vec<Signal>, DipscanError> {
        let conn = self.pool.get().map_err(db_err)?;
        let mut stmt = conn
            .prepare(
                "SELECT ticker, generated_at, rsi, atr, score, confidence, direction, reasons
                 FROM signals ORDER BY id DESC LIMIT ?1",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let generated_raw: String = row.get(1)?;
                let generated_at = parse_timestamp(&generated_raw)?;
                let score: i32 = row.get(4)?;
                let direction_raw: String = row.get(6)?;
                let direction = match direction_raw.as_str() {
                    "LONG" => Direction::Long,
                    "SHORT" => Direction::Short,
                    _ => Direction::Neutral,
                };
                let reasons_raw: String = row.get(7)?;
                let reasons = if reasons_raw.is_empty() {
                    Vec::new()
                } else {
                    reasons_raw.split('\n').map(str::to_string).collect()
                };
                Ok(Signal {
                    ticker: row.get(0)?,
                    generated_at,
                    rsi: row.get(2)?,
                    atr: row.get(3)?,
                    score,
                    confidence: Confidence::from_score(score),
                    direction,
                    reasons,
                })
            })
            .map_err(query_err)?;

        let mut signals = Vec::new();
        for row in rows {
            signals.push(row.map_err(query_err)?);
        }
        Ok(signals)
    }
}

impl PositionStore for SqliteAdapter {
    fn open_positions(&self, auto_exit_only: bool) -> Result<Vec<Position>, DipscanError> {
        let conn = self.pool.get().map_err(db_err)?;
        let query = format!(
            "SELECT {POSITION_COLUMNS} FROM positions
             WHERE status = 'OPEN' {} ORDER BY id",
            if auto_exit_only {
                "AND auto_exit = 1"
            } else {
                ""
            }
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map([], Self::row_to_position)
            .map_err(query_err)?;

        let mut positions = Vec::new();
        for row in rows {
            positions.push(row.map_err(query_err)?);
        }
        Ok(positions)
    }

    fn get_position(&self, id: i64) -> Result<Option<Position>, DipscanError> {
        let conn = self.pool.get().map_err(db_err)?;
        let query = format!("SELECT {POSITION_COLUMNS} FROM positions WHERE id = ?1");
        conn.query_row(&query, params![id], Self::row_to_position)
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(query_err(other)),
            })
    }

    fn insert_position(&self, position: &Position) -> Result<i64, DipscanError> {
        let conn = self.pool.get().map_err(db_err)?;
        conn.execute(
            "INSERT INTO positions (ticker, signal_id, entry_price, quantity, stop_loss,
                 target_price, auto_exit, status, entry_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                position.ticker,
                position.signal_id,
                position.entry_price,
                position.quantity,
                position.stop_loss,
                position.target_price,
                position.auto_exit,
                position.status.as_str(),
                position.entry_time.to_rfc3339(),
            ],
        )
        .map_err(query_err)?;

        Ok(conn.last_insert_rowid())
    }

    fn settle_exit(&self, id: i64, fill: &ExitFill) -> Result<bool, DipscanError> {
        let mut conn = self.pool.get().map_err(db_err)?;
        let tx = conn.transaction().map_err(query_err)?;

        // single guarded UPDATE: status flip and pnl land together or not at all
        let changed = tx
            .execute(
                "UPDATE positions
                 SET exit_price = ?1, exit_time = ?2, exit_reason = ?3,
                     pnl = ?4, pnl_percent = ?5, status = 'CLOSED'
                 WHERE id = ?6 AND status = 'OPEN'",
                params![
                    fill.exit_price,
                    fill.exit_time.to_rfc3339(),
                    fill.exit_reason.as_str(),
                    fill.pnl,
                    fill.pnl_percent,
                    id
                ],
            )
            .map_err(query_err)?;

        tx.commit().map_err(query_err)?;
        Ok(changed == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    fn make_bar(ticker: &str, date: &str, close: f64) -> Bar {
        Bar {
            ticker: ticker.into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close - 1.0,
            high: close + 2.0,
            low: close - 2.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn upsert_and_fetch_ordered() {
        let db = adapter();
        db.upsert_bars(&[
            make_bar("INFY", "2024-01-02", 101.0),
            make_bar("INFY", "2024-01-01", 100.0),
        ])
        .unwrap();

        let bars = db.fetch_bars("INFY").unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].date < bars[1].date);
    }

    #[test]
    fn same_day_bar_is_replaced() {
        let db = adapter();
        db.upsert_bars(&[make_bar("INFY", "2024-01-01", 100.0)])
            .unwrap();
        // intraday refresh: same date, new close
        db.upsert_bars(&[make_bar("INFY", "2024-01-01", 104.0)])
            .unwrap();

        let bars = db.fetch_bars("INFY").unwrap();
        assert_eq!(bars.len(), 1);
        assert!((bars[0].close - 104.0).abs() < f64::EPSILON);
    }

    #[test]
    fn list_tickers_distinct_sorted() {
        let db = adapter();
        db.upsert_bars(&[
            make_bar("TCS", "2024-01-01", 100.0),
            make_bar("INFY", "2024-01-01", 100.0),
            make_bar("INFY", "2024-01-02", 101.0),
        ])
        .unwrap();
        assert_eq!(db.list_tickers().unwrap(), vec!["INFY", "TCS"]);
    }

    #[test]
    fn current_price_is_latest_close() {
        let db = adapter();
        db.upsert_bars(&[
            make_bar("INFY", "2024-01-01", 100.0),
            make_bar("INFY", "2024-01-02", 107.0),
        ])
        .unwrap();

        assert_eq!(db.current_price("INFY").unwrap(), Some(107.0));
        assert_eq!(db.current_price("GHOST").unwrap(), None);
    }

    #[test]
    fn signal_round_trip_preserves_reason_order() {
        let db = adapter();
        let signal = Signal {
            ticker: "INFY".into(),
            generated_at: Utc::now(),
            rsi: Some(28.4),
            atr: Some(3.2),
            score: 75,
            confidence: Confidence::High,
            direction: Direction::Long,
            reasons: vec![
                "Oversold RSI turning upward (RSI 28.4)".into(),
                "Consecutive bullish Heikin-Ashi candles".into(),
                "Volume 3.1x above 30-bar average".into(),
            ],
        };
        db.record_signal(&signal).unwrap();

        let loaded = db.recent_signals(5).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].reasons, signal.reasons);
        assert_eq!(loaded[0].direction, Direction::Long);
        assert_eq!(loaded[0].confidence, Confidence::High);
    }

    fn open_position(db: &SqliteAdapter, ticker: &str) -> i64 {
        let position = Position::open(
            ticker,
            None,
            100.0,
            10,
            Some(95.0),
            Some(110.0),
            true,
            Utc::now(),
        );
        db.insert_position(&position).unwrap()
    }

    #[test]
    fn position_round_trip() {
        let db = adapter();
        let id = open_position(&db, "INFY");

        let loaded = db.get_position(id).unwrap().unwrap();
        assert_eq!(loaded.ticker, "INFY");
        assert_eq!(loaded.status, PositionStatus::Open);
        assert_eq!(loaded.stop_loss, Some(95.0));
        assert!(loaded.exit_price.is_none());
        assert!(db.get_position(999).unwrap().is_none());
    }

    #[test]
    fn open_positions_filters_auto_exit() {
        let db = adapter();
        open_position(&db, "INFY");
        let manual = Position::open("TCS", None, 50.0, 5, None, None, false, Utc::now());
        db.insert_position(&manual).unwrap();

        assert_eq!(db.open_positions(false).unwrap().len(), 2);
        let auto_only = db.open_positions(true).unwrap();
        assert_eq!(auto_only.len(), 1);
        assert_eq!(auto_only[0].ticker, "INFY");
    }

    #[test]
    fn settle_exit_applies_once() {
        let db = adapter();
        let id = open_position(&db, "INFY");
        let position = db.get_position(id).unwrap().unwrap();
        let fill = position.exit_fill(110.0, ExitReason::Target, Utc::now());

        assert!(db.settle_exit(id, &fill).unwrap());
        // the guard makes a second settle a no-op
        assert!(!db.settle_exit(id, &fill).unwrap());

        let closed = db.get_position(id).unwrap().unwrap();
        assert_eq!(closed.status, PositionStatus::Closed);
        assert_eq!(closed.exit_reason, Some(ExitReason::Target));
        assert_eq!(closed.exit_price, Some(110.0));
        assert_eq!(closed.pnl, Some(100.0));
        assert_eq!(closed.pnl_percent, Some(10.0));
        assert!(closed.exit_time.is_some());
    }

    #[test]
    fn closed_positions_leave_open_listing() {
        let db = adapter();
        let id = open_position(&db, "INFY");
        let position = db.get_position(id).unwrap().unwrap();
        let fill = position.exit_fill(94.0, ExitReason::StopLoss, Utc::now());
        db.settle_exit(id, &fill).unwrap();

        assert!(db.open_positions(true).unwrap().is_empty());
    }
}
