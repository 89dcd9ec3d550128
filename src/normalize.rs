//! Dataset cleanup ahead of insertion.
//!
//! Three passes, all total over anything the reader can produce:
//!
//! 1. Synthetic index columns (`Unnamed...` headers written by tools that
//!    serialize their own row index) are dropped wholesale.
//! 2. Cells are trimmed; an empty cell is the absent marker and becomes a
//!    SQL NULL when records are built.
//! 3. The four numeric columns are coerced to integer form, with empty or
//!    unparseable cells becoming 0. Conflating "unknown" with zero is the
//!    established load policy and is preserved as-is.
//!
//! Cleaning is idempotent: a second pass over cleaned output is a no-op.

use std::sync::OnceLock;

use regex::Regex;

use crate::dataset::Dataset;
use crate::record;

fn synthetic_index_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^Unnamed").expect("valid synthetic index pattern"))
}

pub fn is_synthetic_index(header: &str) -> bool {
    synthetic_index_pattern().is_match(header)
}

pub fn clean(dataset: &Dataset) -> Dataset {
    let kept: Vec<usize> = dataset
        .headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_synthetic_index(name))
        .map(|(idx, _)| idx)
        .collect();

    let headers: Vec<String> = kept.iter().map(|&i| dataset.headers[i].clone()).collect();
    let numeric: Vec<bool> = headers
        .iter()
        .map(|name| record::NUMERIC_COLUMNS.contains(&name.as_str()))
        .collect();

    let rows = dataset
        .rows
        .iter()
        .map(|row| {
            kept.iter()
                .enumerate()
                .map(|(out_idx, &src_idx)| {
                    let cell = row.get(src_idx).map(|s| s.trim()).unwrap_or("");
                    if numeric[out_idx] {
                        coerce_integer(cell)
                    } else {
                        cell.to_string()
                    }
                })
                .collect()
        })
        .collect();

    Dataset::new(headers, rows)
}

/// Integer coercion for score/count cells. Empty and unparseable inputs
/// both collapse to 0; fractional values are truncated toward zero.
fn coerce_integer(cell: &str) -> String {
    if cell.is_empty() {
        return "0".to_string();
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() => (value as i64).to_string(),
        _ => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_dataset() -> Dataset {
        Dataset::new(
            vec![
                "Unnamed: 0".to_string(),
                "Gender".to_string(),
                "NrSiblings".to_string(),
                "MathScore".to_string(),
            ],
            vec![
                vec![
                    "0".to_string(),
                    "female".to_string(),
                    "3.0".to_string(),
                    "71".to_string(),
                ],
                vec![
                    "1".to_string(),
                    " male ".to_string(),
                    String::new(),
                    "NA".to_string(),
                ],
            ],
        )
    }

    #[test]
    fn clean_drops_synthetic_index_columns() {
        let cleaned = clean(&raw_dataset());
        assert_eq!(cleaned.headers, vec!["Gender", "NrSiblings", "MathScore"]);
        for row in &cleaned.rows {
            assert_eq!(row.len(), 3);
        }
    }

    #[test]
    fn clean_coerces_numeric_columns_to_integers() {
        let cleaned = clean(&raw_dataset());
        // "3.0" truncates, empty and unparseable cells collapse to 0.
        assert_eq!(cleaned.rows[0][1], "3");
        assert_eq!(cleaned.rows[0][2], "71");
        assert_eq!(cleaned.rows[1][1], "0");
        assert_eq!(cleaned.rows[1][2], "0");
    }

    #[test]
    fn clean_trims_categorical_cells() {
        let cleaned = clean(&raw_dataset());
        assert_eq!(cleaned.rows[1][0], "male");
    }

    #[test]
    fn clean_is_idempotent() {
        let once = clean(&raw_dataset());
        let twice = clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn is_synthetic_index_matches_prefix_only() {
        assert!(is_synthetic_index("Unnamed: 0"));
        assert!(is_synthetic_index("Unnamed"));
        assert!(!is_synthetic_index("Gender"));
        assert!(!is_synthetic_index("ColumnUnnamed"));
    }
}
