//! SQLite store of previously fetched forecasts.
//!
//! Rows are only ever appended. A region with at least one row is served
//! from here forever; nothing expires.

use crate::error::CacheError;
use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRecord {
    pub area_code: String,
    pub area_name: String,
    pub forecast_text: String,
    pub timestamp: String,
}

/// Handle on the forecast table. A connection is opened for each operation.
#[derive(Debug, Clone)]
pub struct ForecastCache {
    path: PathBuf,
}

impl ForecastCache {
    /// Point the cache at `path` and create the table if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let cache = Self { path };
        cache.ensure_schema()?;
        Ok(cache)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, CacheError> {
        Ok(Connection::open(&self.path)?)
    }

    pub fn ensure_schema(&self) -> Result<(), CacheError> {
        self.connect()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS forecast (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                area_code TEXT NOT NULL,
                area_name TEXT NOT NULL,
                forecast TEXT NOT NULL,
                timestamp DATETIME NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Most recent row for `area_code`, if any.
    pub fn latest_for(&self, area_code: &str) -> Result<Option<ForecastRecord>, CacheError> {
        let conn = self.connect()?;
        let record = conn
            .query_row(
                r#"
                SELECT area_code, area_name, forecast, timestamp FROM forecast
                WHERE area_code = ?1
                ORDER BY timestamp DESC, id DESC
                LIMIT 1
                "#,
                params![area_code],
                |row| {
                    Ok(ForecastRecord {
                        area_code: row.get(0)?,
                        area_name: row.get(1)?,
                        forecast_text: row.get(2)?,
                        timestamp: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Insert a row stamped with the current local time.
    pub fn append(
        &self,
        area_code: &str,
        area_name: &str,
        forecast_text: &str,
    ) -> Result<ForecastRecord, CacheError> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.append_at(area_code, area_name, forecast_text, &timestamp)
    }

    pub fn append_at(
        &self,
        area_code: &str,
        area_name: &str,
        forecast_text: &str,
        timestamp: &str,
    ) -> Result<ForecastRecord, CacheError> {
        self.connect()?.execute(
            r#"
            INSERT INTO forecast (area_code, area_name, forecast, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![area_code, area_name, forecast_text, timestamp],
        )?;
        tracing::debug!("Cached forecast for {} at {}", area_code, timestamp);

        Ok(ForecastRecord {
            area_code: area_code.to_string(),
            area_name: area_name.to_string(),
            forecast_text: forecast_text.to_string(),
            timestamp: timestamp.to_string(),
        })
    }

    pub fn count_for(&self, area_code: &str) -> Result<usize, CacheError> {
        let count: i64 = self.connect()?.query_row(
            "SELECT COUNT(*) FROM forecast WHERE area_code = ?1",
            params![area_code],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
