//! Named result tables produced by activity-inference methods.
//! Rows are samples, columns are network sources.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DecouplerError, Result};

// ---------------------------------------------------------------------------
// ScoreTable
// ---------------------------------------------------------------------------

/// One named result table (e.g. `wmean_estimate`, `wmean_pvals`).
/// Values are stored row-major: `values[row * n_sources + col]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub name: String,
    pub samples: Vec<String>,
    pub sources: Vec<String>,
    pub values: Vec<f64>,
}

impl ScoreTable {
    /// Build a table, validating that the value buffer matches the labels.
    pub fn new(
        name: impl Into<String>,
        samples: Vec<String>,
        sources: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let expected = samples.len() * sources.len();
        if values.len() != expected {
            return Err(DecouplerError::ShapeMismatch {
                name,
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            name,
            samples,
            sources,
            values,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn n_sources(&self) -> usize {
        self.sources.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.samples.len(), self.sources.len())
    }

    /// Value at (sample row, source column). None when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.samples.len() || col >= self.sources.len() {
            return None;
        }
        self.values.get(row * self.sources.len() + col).copied()
    }
}

// ---------------------------------------------------------------------------
// ResultSet
// ---------------------------------------------------------------------------

/// Accumulated result tables, keyed by each table's own name.
///
/// Insertion overwrites on name collision; the methods are expected to emit
/// distinct table names, so a collision is surfaced as a warning rather than
/// an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    tables: HashMap<String, ScoreTable>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table under its own name. A previous table with the same
    /// name is replaced and the collision is logged.
    pub fn insert(&mut self, table: ScoreTable) {
        if self.tables.contains_key(&table.name) {
            warn!(table = %table.name, "result table name collision, overwriting");
        }
        self.tables.insert(table.name.clone(), table);
    }

    pub fn get(&self, name: &str) -> Option<&ScoreTable> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScoreTable)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for ResultSet {
    type Item = (String, ScoreTable);
    type IntoIter = std::collections::hash_map::IntoIter<String, ScoreTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}
