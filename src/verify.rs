//! Post-load verification: row count, sample rows, and score averages.
//!
//! Read-only. A failure here after a load is a reporting gap, not a data
//! loss: committed batches stay committed.

use anyhow::{Context, Result};
use log::info;
use sqlx::{Connection, MySqlConnection};

use crate::{cli::VerifyArgs, config::DbSettings, db, table};

pub async fn execute(args: &VerifyArgs) -> Result<()> {
    let settings = DbSettings::resolve(&args.db)?;
    let mut conn = db::connect(&settings).await?;
    report(&mut conn, &settings.table, args.samples).await?;
    conn.close().await.context("Closing database connection")?;
    Ok(())
}

pub async fn report(conn: &mut MySqlConnection, table_name: &str, samples: usize) -> Result<()> {
    info!("Verifying data load...");

    let total = db::count_rows(conn, table_name).await?;
    info!("✓ Total records in database: {total}");

    let rows = db::fetch_samples(conn, table_name, samples).await?;
    info!("Sample records (first {}):", rows.len());
    let headers = [
        "ID",
        "Gender",
        "MathScore",
        "ReadingScore",
        "WritingScore",
        "AvgScore",
    ]
    .map(String::from)
    .to_vec();
    let rendered: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                row.gender.clone().unwrap_or_default(),
                row.math_score.to_string(),
                row.reading_score.to_string(),
                row.writing_score.to_string(),
                format!("{:.2}", row.avg_score),
            ]
        })
        .collect();
    table::print_table(&headers, &rendered);

    let averages = db::fetch_score_averages(conn, table_name).await?;
    info!("Average scores:");
    info!("  Math: {}", format_average(averages.math));
    info!("  Reading: {}", format_average(averages.reading));
    info!("  Writing: {}", format_average(averages.writing));
    Ok(())
}

fn format_average(value: Option<f64>) -> String {
    match value {
        Some(avg) => format!("{avg:.2}"),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_average_renders_two_decimals_or_placeholder() {
        assert_eq!(format_average(Some(66.5)), "66.50");
        assert_eq!(format_average(None), "n/a");
    }
}
