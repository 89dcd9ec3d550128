use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Load student-result CSV data into MySQL", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Read a CSV file, normalize it, and insert it into MySQL in batches
    Load(LoadArgs),
    /// Re-query the target table and report row count, samples, and averages
    Verify(VerifyArgs),
    /// Preview the first few rows of a CSV file in a formatted table
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct DbArgs {
    /// MySQL server host
    #[arg(long, env = "SCORELOAD_HOST", default_value = "localhost")]
    pub host: String,
    /// MySQL server port
    #[arg(long, env = "SCORELOAD_PORT", default_value_t = 3306)]
    pub port: u16,
    /// MySQL user name
    #[arg(short, long, env = "SCORELOAD_USER", default_value = "root")]
    pub user: String,
    /// MySQL password
    #[arg(short, long, env = "SCORELOAD_PASSWORD", default_value = "")]
    pub password: String,
    /// Database name
    #[arg(short, long, env = "SCORELOAD_DATABASE", default_value = "student_analysis")]
    pub database: String,
    /// Target table name
    #[arg(long, default_value = "student_results")]
    pub table: String,
    /// Optional YAML settings file; command-line flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Input CSV file to load
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of records to insert per batch
    #[arg(short = 'b', long = "batch-size", default_value_t = 1000)]
    pub batch_size: usize,
    /// Clear existing rows without prompting
    #[arg(long = "assume-yes", conflicts_with = "keep_existing")]
    pub assume_yes: bool,
    /// Keep existing rows without prompting; new records are appended
    #[arg(long = "keep-existing")]
    pub keep_existing: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    #[command(flatten)]
    pub db: DbArgs,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Number of sample rows to display
    #[arg(long, default_value_t = 5)]
    pub samples: usize,
    #[command(flatten)]
    pub db: DbArgs,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input CSV file to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_named_forms() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter("pipe").unwrap(), b'|');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
    }

    #[test]
    fn parse_delimiter_rejects_multi_character_input() {
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
