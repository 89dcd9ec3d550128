//! The load pipeline: read, optionally clear, normalize, insert, verify.
//!
//! Batches are the unit of commit and of failure isolation. Each batch is a
//! single multi-row INSERT inside its own transaction; a failing batch is
//! logged and counted but never aborts the run. There is no sub-batch
//! partial success and no retry.

use std::{
    io::{self, BufRead, Write},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use log::{error, info, warn};
use sqlx::{Connection, MySqlConnection, QueryBuilder};

use crate::{
    cli::LoadArgs,
    config::DbSettings,
    dataset::Dataset,
    db, io_utils, normalize,
    record::{self, StudentRecord},
    verify,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    /// Ask the operator when the table already holds rows.
    Prompt,
    /// Clear without asking.
    AssumeYes,
    /// Append without asking.
    KeepExisting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub total: usize,
    pub inserted: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Destination for normalized record batches. The loader only sees
/// all-or-nothing batch outcomes through this seam, which also keeps the
/// batching logic testable without a live server.
#[allow(async_fn_in_trait)]
pub trait BatchSink {
    async fn insert(&mut self, batch: &[StudentRecord]) -> Result<()>;
}

/// Real sink: one parameterized multi-row INSERT per batch, committed in
/// its own transaction.
pub struct TableSink<'a> {
    conn: &'a mut MySqlConnection,
    table: &'a str,
}

impl<'a> TableSink<'a> {
    pub fn new(conn: &'a mut MySqlConnection, table: &'a str) -> Self {
        TableSink { conn, table }
    }
}

impl BatchSink for TableSink<'_> {
    async fn insert(&mut self, batch: &[StudentRecord]) -> Result<()> {
        let mut tx = self.conn.begin().await?;
        let mut builder = QueryBuilder::new(format!(
            "INSERT INTO `{}` ({}) ",
            self.table,
            record::INSERT_COLUMNS.join(", ")
        ));
        builder.push_values(batch, |mut b, rec| {
            b.push_bind(&rec.gender)
                .push_bind(&rec.ethnic_group)
                .push_bind(&rec.parent_educ)
                .push_bind(&rec.lunch_type)
                .push_bind(&rec.test_prep)
                .push_bind(&rec.parent_marital_status)
                .push_bind(&rec.practice_sport)
                .push_bind(&rec.is_first_child)
                .push_bind(rec.nr_siblings)
                .push_bind(&rec.transport_means)
                .push_bind(&rec.wkly_study_hours)
                .push_bind(rec.math_score)
                .push_bind(rec.reading_score)
                .push_bind(rec.writing_score);
        });
        builder.build().execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Inserts records in order-preserving chunks of `batch_size`. Every chunk
/// except possibly the last has exactly `batch_size` records.
pub async fn insert_in_batches<S: BatchSink>(
    sink: &mut S,
    records: &[StudentRecord],
    batch_size: usize,
) -> LoadSummary {
    let started = Instant::now();
    let batch_size = batch_size.max(1);
    let total = records.len();
    let mut inserted = 0usize;
    let mut failed = 0usize;

    info!("Starting batch insertion ({batch_size} records per batch)...");
    for batch in records.chunks(batch_size) {
        match sink.insert(batch).await {
            Ok(()) => {
                inserted += batch.len();
                let progress = (inserted as f64 / total as f64) * 100.0;
                info!("Progress: {inserted}/{total} ({progress:.1}%)");
            }
            Err(err) => {
                failed += batch.len();
                error!("✗ Batch insertion failed: {err:#}");
            }
        }
    }

    LoadSummary {
        total,
        inserted,
        failed,
        elapsed: started.elapsed(),
    }
}

/// Whether to clear a pre-populated table. Only consults the prompt when
/// rows exist and neither bypass flag was given; any answer other than
/// "yes" preserves the existing rows.
pub fn should_clear(
    existing: u64,
    mode: ClearMode,
    prompt: impl FnOnce(u64) -> Result<bool>,
) -> Result<bool> {
    if existing == 0 {
        return Ok(false);
    }
    match mode {
        ClearMode::AssumeYes => Ok(true),
        ClearMode::KeepExisting => Ok(false),
        ClearMode::Prompt => prompt(existing),
    }
}

fn prompt_operator(existing: u64) -> Result<bool> {
    warn!("Found {existing} existing records in database");
    print!("Do you want to clear existing data? (yes/no): ");
    io::stdout().flush().context("Flushing prompt")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Reading prompt answer")?;
    Ok(answer.trim().to_lowercase() == "yes")
}

fn clear_mode(args: &LoadArgs) -> ClearMode {
    if args.assume_yes {
        ClearMode::AssumeYes
    } else if args.keep_existing {
        ClearMode::KeepExisting
    } else {
        ClearMode::Prompt
    }
}

pub async fn execute(args: &LoadArgs) -> Result<()> {
    let started = Instant::now();
    let settings = DbSettings::resolve(&args.db)?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;

    info!("Step 1: Loading CSV file...");
    let dataset = Dataset::read(&args.input, delimiter, encoding)?;

    info!("Step 2: Connecting to MySQL database...");
    let mut conn = db::connect(&settings).await?;

    let existing = db::count_rows(&mut conn, &settings.table).await?;
    if should_clear(existing, clear_mode(args), prompt_operator)? {
        db::truncate_table(&mut conn, &settings.table).await?;
        info!("✓ Existing data cleared");
    } else if existing > 0 {
        info!("Keeping existing data. New records will be appended.");
    }

    info!("Step 3: Preparing data...");
    let cleaned = normalize::clean(&dataset);
    let records = record::build_records(&cleaned);
    info!("✓ Data prepared: {} records ready", records.len());

    info!("Step 4: Inserting data into database...");
    let summary = {
        let mut sink = TableSink::new(&mut conn, &settings.table);
        insert_in_batches(&mut sink, &records, args.batch_size).await
    };
    info!("✓ Insertion completed");
    info!("  Successfully inserted: {} records", summary.inserted);
    if summary.failed > 0 {
        warn!("  Failed records: {}", summary.failed);
    }

    info!("Step 5: Verifying data load...");
    verify::report(&mut conn, &settings.table, 5).await?;

    info!("DATA LOAD COMPLETED SUCCESSFULLY!");
    info!(
        "Total time taken: {:.2} seconds",
        started.elapsed().as_secs_f64()
    );
    info!("Records processed: {}", summary.inserted);

    conn.close().await.context("Closing database connection")?;
    info!("Database connection closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::anyhow;

    fn records(count: usize) -> Vec<StudentRecord> {
        (0..count)
            .map(|i| StudentRecord {
                gender: Some(format!("g{i}")),
                ethnic_group: None,
                parent_educ: None,
                lunch_type: None,
                test_prep: None,
                parent_marital_status: None,
                practice_sport: None,
                is_first_child: None,
                nr_siblings: 0,
                transport_means: None,
                wkly_study_hours: None,
                math_score: i as i64,
                reading_score: 0,
                writing_score: 0,
            })
            .collect()
    }

    /// Records batch sizes and fails the batches listed in `fail_batches`
    /// (0-based).
    struct FakeSink {
        batch_sizes: Vec<usize>,
        fail_batches: Vec<usize>,
    }

    impl FakeSink {
        fn new(fail_batches: Vec<usize>) -> Self {
            FakeSink {
                batch_sizes: Vec::new(),
                fail_batches,
            }
        }
    }

    impl BatchSink for FakeSink {
        async fn insert(&mut self, batch: &[StudentRecord]) -> Result<()> {
            let index = self.batch_sizes.len();
            self.batch_sizes.push(batch.len());
            if self.fail_batches.contains(&index) {
                Err(anyhow!("simulated constraint violation"))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn insert_in_batches_partitions_by_configured_size() {
        let mut sink = FakeSink::new(Vec::new());
        let summary = insert_in_batches(&mut sink, &records(5), 2).await;
        assert_eq!(sink.batch_sizes, vec![2, 2, 1]);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.inserted, 5);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn insert_in_batches_uses_one_full_batch_when_evenly_divisible() {
        let mut sink = FakeSink::new(Vec::new());
        let summary = insert_in_batches(&mut sink, &records(4), 2).await;
        assert_eq!(sink.batch_sizes, vec![2, 2]);
        assert_eq!(summary.inserted, 4);
    }

    #[tokio::test]
    async fn failing_batch_is_counted_and_does_not_abort_the_run() {
        let mut sink = FakeSink::new(vec![1]);
        let summary = insert_in_batches(&mut sink, &records(3), 2).await;
        assert_eq!(sink.batch_sizes, vec![2, 1]);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn batch_size_zero_is_clamped_to_one() {
        let mut sink = FakeSink::new(Vec::new());
        let summary = insert_in_batches(&mut sink, &records(3), 0).await;
        assert_eq!(sink.batch_sizes, vec![1, 1, 1]);
        assert_eq!(summary.inserted, 3);
    }

    #[test]
    fn should_clear_skips_prompt_for_empty_table() {
        let decision = should_clear(0, ClearMode::Prompt, |_| {
            panic!("prompt must not run for an empty table")
        })
        .unwrap();
        assert!(!decision);
    }

    #[test]
    fn should_clear_honors_bypass_flags() {
        assert!(should_clear(10, ClearMode::AssumeYes, |_| Ok(false)).unwrap());
        assert!(!should_clear(10, ClearMode::KeepExisting, |_| Ok(true)).unwrap());
    }

    #[test]
    fn should_clear_consults_prompt_when_rows_exist() {
        let mut seen = 0;
        let decision = should_clear(10, ClearMode::Prompt, |existing| {
            seen = existing;
            Ok(true)
        })
        .unwrap();
        assert!(decision);
        assert_eq!(seen, 10);
    }
}
