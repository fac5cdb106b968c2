//! Dataset merger
//!
//! Joins the unlabeled records with their labels on a key column, projects
//! the joined rows onto the training schema and appends them after the
//! training rows.

use crate::etl::Transformer;
use crate::table::{RecordTable, Row, Value};
use clap::ValueEnum;
use eyre::Result;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How unlabeled rows without exactly one label row are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum JoinPolicy {
    /// Fail with [`MergeError::JoinIntegrity`]
    #[default]
    Strict,
    /// Plain inner join: unmatched rows are dropped, rows with several
    /// label rows are repeated once per match
    Inner,
}

impl FromStr for JoinPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "inner" => Ok(Self::Inner),
            other => Err(format!("unknown join policy `{}`", other)),
        }
    }
}

impl fmt::Display for JoinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Inner => write!(f, "inner"),
        }
    }
}

/// Why the combined schema could not be formed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaMismatch {
    #[error("join key `{key}` is missing from the {table} table")]
    MissingKey { table: &'static str, key: String },

    #[error("column `{column}` appears in both the unlabeled and labels tables")]
    AmbiguousColumn { column: String },

    #[error("training column `{column}` is missing from the joined unlabeled and labels tables")]
    MissingColumn { column: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    #[error("schema mismatch: {0}")]
    SchemaMismatch(#[from] SchemaMismatch),

    #[error(
        "join integrity violated: unlabeled row {row} with key {key} matched {matches} label rows, expected exactly one"
    )]
    JoinIntegrity {
        row: usize,
        key: Value,
        matches: usize,
    },
}

/// The three tables a merge consumes
#[derive(Debug, Clone)]
pub struct MergeInput {
    pub training: RecordTable,
    pub unlabeled: RecordTable,
    pub labels: RecordTable,
}

/// Merge training, unlabeled and label tables into one labeled table
///
/// # Example
/// ```
/// use dataset_loader::table::{RecordTable, Value};
/// use dataset_loader::transform::DatasetMerger;
///
/// let columns = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
/// let training = RecordTable::new(columns(&["id", "label"]), vec![vec![1.into(), 0.into()]])?;
/// let unlabeled = RecordTable::new(columns(&["id"]), vec![vec![2.into()]])?;
/// let labels = RecordTable::new(columns(&["id", "label"]), vec![vec![2.into(), 1.into()]])?;
///
/// let combined = DatasetMerger::new("id").merge(&training, &unlabeled, &labels)?;
/// assert_eq!(combined.len(), 2);
/// assert_eq!(combined.get(1, "label"), Some(&Value::Integer(1)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct DatasetMerger {
    join_key: String,
    policy: JoinPolicy,
}

/// Where a training column is taken from in a joined row
#[derive(Clone, Copy)]
enum Source {
    Unlabeled(usize),
    Labels(usize),
}

/// Hashable view of a key cell. Integral floats compare equal to integers.
#[derive(Hash, PartialEq, Eq)]
enum JoinKey<'a> {
    Integer(i64),
    Float(u64),
    Text(&'a str),
}

impl<'a> JoinKey<'a> {
    fn of(value: &'a Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Integer(i) => Some(Self::Integer(*i)),
            Value::Float(f) if f.is_nan() => None,
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(Self::Integer(*f as i64))
            }
            Value::Float(f) => Some(Self::Float(f.to_bits())),
            Value::Text(s) => Some(Self::Text(s)),
        }
    }
}

impl DatasetMerger {
    pub fn new(join_key: impl Into<String>) -> Self {
        Self {
            join_key: join_key.into(),
            policy: JoinPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: JoinPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Merge the three tables
    ///
    /// The result has exactly the training columns, in training order:
    /// every training row, then one row per (unlabeled, label) match.
    ///
    /// # Errors
    /// - [`MergeError::SchemaMismatch`] if the key is missing from a table,
    ///   a non-key column is in both unlabeled and labels, or a training
    ///   column is in neither
    /// - [`MergeError::JoinIntegrity`] under [`JoinPolicy::Strict`] when an
    ///   unlabeled row matches zero or several label rows
    pub fn merge(
        &self,
        training: &RecordTable,
        unlabeled: &RecordTable,
        labels: &RecordTable,
    ) -> Result<RecordTable, MergeError> {
        let key = self.join_key.as_str();
        require_key(training, "training", key)?;
        let unlabeled_key = require_key(unlabeled, "unlabeled", key)?;
        let labels_key = require_key(labels, "labels", key)?;

        if let Some(column) = labels
            .columns()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != labels_key)
            .map(|(_, c)| c)
            .find(|c| unlabeled.column_index(c).is_some())
        {
            return Err(SchemaMismatch::AmbiguousColumn {
                column: column.clone(),
            }
            .into());
        }

        let projection = training
            .columns()
            .iter()
            .map(|column| {
                unlabeled
                    .column_index(column)
                    .map(Source::Unlabeled)
                    .or_else(|| labels.column_index(column).map(Source::Labels))
                    .ok_or_else(|| SchemaMismatch::MissingColumn {
                        column: column.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut index: HashMap<JoinKey<'_>, Vec<usize>> = HashMap::new();
        for (i, row) in labels.rows().iter().enumerate() {
            if let Some(k) = JoinKey::of(&row[labels_key]) {
                index.entry(k).or_default().push(i);
            }
        }

        let mut rows: Vec<Row> = Vec::with_capacity(training.len() + unlabeled.len());
        rows.extend(training.rows().iter().cloned());

        let (mut dropped, mut duplicated) = (0usize, 0usize);
        for (i, row) in unlabeled.rows().iter().enumerate() {
            let matches = JoinKey::of(&row[unlabeled_key])
                .and_then(|k| index.get(&k))
                .map(Vec::as_slice)
                .unwrap_or_default();

            if matches.len() != 1 {
                if self.policy == JoinPolicy::Strict {
                    return Err(MergeError::JoinIntegrity {
                        row: i,
                        key: row[unlabeled_key].clone(),
                        matches: matches.len(),
                    });
                }
                match matches.len() {
                    0 => dropped += 1,
                    n => duplicated += n - 1,
                }
            }

            for &label_row in matches {
                let label_row = &labels.rows()[label_row];
                rows.push(
                    projection
                        .iter()
                        .map(|source| match *source {
                            Source::Unlabeled(c) => row[c].clone(),
                            Source::Labels(c) => label_row[c].clone(),
                        })
                        .collect(),
                );
            }
        }

        if dropped > 0 {
            log::warn!("Dropped {} unlabeled row(s) without a label", dropped);
        }
        if duplicated > 0 {
            log::warn!(
                "Added {} extra row(s) for unlabeled rows with several labels",
                duplicated
            );
        }

        let combined = RecordTable::from_parts(training.columns().to_vec(), rows).harmonize();
        log::info!(
            "Shape of combined data: ({}, {})",
            combined.len(),
            combined.width()
        );
        Ok(combined)
    }
}

fn require_key(
    table: &RecordTable,
    name: &'static str,
    key: &str,
) -> Result<usize, SchemaMismatch> {
    table.column_index(key).ok_or_else(|| SchemaMismatch::MissingKey {
        table: name,
        key: key.to_string(),
    })
}

impl Transformer for DatasetMerger {
    type Input = MergeInput;
    type Output = RecordTable;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        Ok(self.merge(&input.training, &input.unlabeled, &input.labels)?)
    }
}

/// Merge with the default strict policy
pub fn merge(
    training: &RecordTable,
    unlabeled: &RecordTable,
    labels: &RecordTable,
    join_key: &str,
) -> Result<RecordTable, MergeError> {
    DatasetMerger::new(join_key).merge(training, unlabeled, labels)
}
