//! MySQL access for the loader and verifier.
//!
//! One connection per run, owned by the caller for the whole pipeline and
//! dropped (closed) on every exit path. The target table is assumed to
//! pre-exist with the fourteen named columns plus an auto-increment `ID`
//! and a stored `AvgScore` column.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{error, info};
use sqlx::{
    Connection, ConnectOptions, MySqlConnection, Row,
    mysql::{MySqlConnectOptions, MySqlRow},
};

use crate::config::DbSettings;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connects to the configured server and database. A failure here is fatal
/// to the run; the logged hint points at the credential settings since a
/// bad user/password is by far the most common cause.
pub async fn connect(settings: &DbSettings) -> Result<MySqlConnection> {
    let options = MySqlConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(&settings.password)
        .database(&settings.database)
        .disable_statement_logging();

    let connected = tokio::time::timeout(CONNECT_TIMEOUT, MySqlConnection::connect_with(&options))
        .await
        .map_err(|_| {
            anyhow!(
                "Timed out connecting to MySQL at {}:{}",
                settings.host,
                settings.port
            )
        })
        .and_then(|result| result.map_err(Into::into));

    match connected {
        Ok(conn) => {
            info!("✓ Connected to MySQL server at {}:{}", settings.host, settings.port);
            info!("  Using database: {}", settings.database);
            Ok(conn)
        }
        Err(err) => {
            error!("✗ Database connection failed: {err}");
            info!("  Please check the configured host, user, and password settings");
            Err(err).context("Connecting to MySQL")
        }
    }
}

pub async fn count_rows(conn: &mut MySqlConnection, table: &str) -> Result<u64> {
    let row = sqlx::query(&format!("SELECT COUNT(*) FROM `{table}`"))
        .fetch_one(conn)
        .await
        .with_context(|| format!("Counting rows in `{table}`"))?;
    let count: i64 = row.try_get(0)?;
    Ok(count.max(0) as u64)
}

/// Destructive full-table clear. Not transactional with the load that
/// follows it.
pub async fn truncate_table(conn: &mut MySqlConnection, table: &str) -> Result<()> {
    sqlx::query(&format!("TRUNCATE TABLE `{table}`"))
        .execute(conn)
        .await
        .with_context(|| format!("Truncating `{table}`"))?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub id: i64,
    pub gender: Option<String>,
    pub math_score: i64,
    pub reading_score: i64,
    pub writing_score: i64,
    pub avg_score: f64,
}

pub async fn fetch_samples(
    conn: &mut MySqlConnection,
    table: &str,
    limit: usize,
) -> Result<Vec<SampleRow>> {
    // AvgScore is stored as DECIMAL; cast so it decodes as a plain double.
    let query = format!(
        "SELECT ID, Gender, MathScore, ReadingScore, WritingScore, \
                CAST(AvgScore AS DOUBLE) AS AvgScore \
         FROM `{table}` LIMIT {limit}"
    );
    let rows = sqlx::query(&query)
        .fetch_all(conn)
        .await
        .with_context(|| format!("Fetching sample rows from `{table}`"))?;
    rows.iter().map(sample_from_row).collect()
}

fn sample_from_row(row: &MySqlRow) -> Result<SampleRow> {
    Ok(SampleRow {
        id: row.try_get::<i64, _>("ID")?,
        gender: row.try_get("Gender")?,
        math_score: row.try_get::<i64, _>("MathScore")?,
        reading_score: row.try_get::<i64, _>("ReadingScore")?,
        writing_score: row.try_get::<i64, _>("WritingScore")?,
        avg_score: row.try_get::<f64, _>("AvgScore")?,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreAverages {
    pub math: Option<f64>,
    pub reading: Option<f64>,
    pub writing: Option<f64>,
}

/// Per-column averages rounded to 2 decimal places. `None` when the table
/// is empty.
pub async fn fetch_score_averages(
    conn: &mut MySqlConnection,
    table: &str,
) -> Result<ScoreAverages> {
    // AVG over INT yields DECIMAL; cast so the result decodes as a double.
    let query = format!(
        "SELECT CAST(ROUND(AVG(MathScore), 2) AS DOUBLE) AS avg_math, \
                CAST(ROUND(AVG(ReadingScore), 2) AS DOUBLE) AS avg_reading, \
                CAST(ROUND(AVG(WritingScore), 2) AS DOUBLE) AS avg_writing \
         FROM `{table}`"
    );
    let row = sqlx::query(&query)
        .fetch_one(conn)
        .await
        .with_context(|| format!("Computing score averages for `{table}`"))?;
    Ok(ScoreAverages {
        math: row.try_get("avg_math")?,
        reading: row.try_get("avg_reading")?,
        writing: row.try_get("avg_writing")?,
    })
}
