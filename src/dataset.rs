//! In-memory source table and the reader that produces it.
//!
//! A missing file and a malformed file are distinct contracts: the former
//! must fail before any database connection is attempted, the latter covers
//! every other read or decode problem. Both are fatal to the run.

use std::{fs::File, io::ErrorKind, path::Path, path::PathBuf};

use encoding_rs::Encoding;
use log::info;
use thiserror::Error;

use crate::io_utils;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },
    #[error("Error reading CSV: {message}")]
    Parse { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Dataset { headers, rows }
    }

    /// Loads the entire delimited file into memory.
    pub fn read(
        path: &Path,
        delimiter: u8,
        encoding: &'static Encoding,
    ) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => SourceError::NotFound {
                path: path.to_path_buf(),
            },
            _ => SourceError::Parse {
                message: err.to_string(),
            },
        })?;
        let mut reader = io_utils::open_csv_reader(file, delimiter);

        let headers = reader
            .byte_headers()
            .map_err(|err| SourceError::Parse {
                message: err.to_string(),
            })?
            .clone();
        let headers = io_utils::decode_record(&headers, encoding).map_err(|err| {
            SourceError::Parse {
                message: err.to_string(),
            }
        })?;

        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record.map_err(|err| SourceError::Parse {
                message: format!("row {}: {err}", row_idx + 2),
            })?;
            let decoded =
                io_utils::decode_record(&record, encoding).map_err(|err| SourceError::Parse {
                    message: format!("row {}: {err}", row_idx + 2),
                })?;
            rows.push(decoded);
        }

        let dataset = Dataset::new(headers, rows);
        info!("✓ CSV file loaded successfully");
        info!("  Total records: {}", dataset.rows.len());
        info!("  Columns: {}", dataset.headers.len());
        Ok(dataset)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}
