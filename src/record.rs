//! Typed rows in the fixed column order the insert statement expects.

use crate::dataset::Dataset;

/// The fourteen target-table columns, in insert order.
pub const INSERT_COLUMNS: [&str; 14] = [
    "Gender",
    "EthnicGroup",
    "ParentEduc",
    "LunchType",
    "TestPrep",
    "ParentMaritalStatus",
    "PracticeSport",
    "IsFirstChild",
    "NrSiblings",
    "TransportMeans",
    "WklyStudyHours",
    "MathScore",
    "ReadingScore",
    "WritingScore",
];

/// Columns coerced to integers during normalization.
pub const NUMERIC_COLUMNS: [&str; 4] = ["NrSiblings", "MathScore", "ReadingScore", "WritingScore"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub gender: Option<String>,
    pub ethnic_group: Option<String>,
    pub parent_educ: Option<String>,
    pub lunch_type: Option<String>,
    pub test_prep: Option<String>,
    pub parent_marital_status: Option<String>,
    pub practice_sport: Option<String>,
    pub is_first_child: Option<String>,
    pub nr_siblings: i64,
    pub transport_means: Option<String>,
    pub wkly_study_hours: Option<String>,
    pub math_score: i64,
    pub reading_score: i64,
    pub writing_score: i64,
}

/// Maps every row of a cleaned dataset to a typed record. Total: a column
/// absent from the file yields NULL for categorical fields and 0 for the
/// numeric ones.
pub fn build_records(dataset: &Dataset) -> Vec<StudentRecord> {
    let index = FieldIndex::new(dataset);
    dataset.rows.iter().map(|row| index.record(row)).collect()
}

struct FieldIndex {
    positions: [Option<usize>; 14],
}

impl FieldIndex {
    fn new(dataset: &Dataset) -> Self {
        let mut positions = [None; 14];
        for (slot, name) in INSERT_COLUMNS.iter().enumerate() {
            positions[slot] = dataset.column_index(name);
        }
        FieldIndex { positions }
    }

    fn categorical(&self, row: &[String], slot: usize) -> Option<String> {
        let cell = self.positions[slot].and_then(|idx| row.get(idx))?;
        if cell.is_empty() {
            None
        } else {
            Some(cell.clone())
        }
    }

    fn numeric(&self, row: &[String], slot: usize) -> i64 {
        self.positions[slot]
            .and_then(|idx| row.get(idx))
            .and_then(|cell| cell.parse::<i64>().ok())
            .unwrap_or(0)
    }

    fn record(&self, row: &[String]) -> StudentRecord {
        StudentRecord {
            gender: self.categorical(row, 0),
            ethnic_group: self.categorical(row, 1),
            parent_educ: self.categorical(row, 2),
            lunch_type: self.categorical(row, 3),
            test_prep: self.categorical(row, 4),
            parent_marital_status: self.categorical(row, 5),
            practice_sport: self.categorical(row, 6),
            is_first_child: self.categorical(row, 7),
            nr_siblings: self.numeric(row, 8),
            transport_means: self.categorical(row, 9),
            wkly_study_hours: self.categorical(row, 10),
            math_score: self.numeric(row, 11),
            reading_score: self.numeric(row, 12),
            writing_score: self.numeric(row, 13),
        }
    }
}
