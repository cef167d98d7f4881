//! Long-format regulatory network.
//!
//! Each row is one (source, target, weight) edge. Column names are
//! configurable for CSV input; defaults follow the conventional
//! `source`/`target`/`weight` header. No uniqueness constraint is enforced
//! here — each method validates what it needs.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use decoupler_common::{DecouplerError, Result};

/// One network edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Column names used when reading a long-format network table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkColumns {
    pub source: String,
    pub target: String,
    pub weight: String,
}

impl Default for NetworkColumns {
    fn default() -> Self {
        Self {
            source: "source".to_string(),
            target: "target".to_string(),
            weight: "weight".to_string(),
        }
    }
}

/// Long-format network: a flat edge list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub edges: Vec<Edge>,
}

impl Network {
    pub fn new(edges: Vec<Edge>) -> Self {
        Self { edges }
    }

    /// Read a network from a CSV stream using the given column names.
    /// Missing headers error immediately; malformed weights surface as CSV
    /// deserialization errors.
    pub fn from_csv<R: Read>(reader: R, columns: &NetworkColumns) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();

        let col = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DecouplerError::MissingColumn(name.to_string()))
        };
        let src_idx = col(&columns.source)?;
        let tgt_idx = col(&columns.target)?;
        let wgt_idx = col(&columns.weight)?;

        let mut edges = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let weight: f64 = record
                .get(wgt_idx)
                .unwrap_or_default()
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid weight value: {e}"))?;
            edges.push(Edge {
                source: record.get(src_idx).unwrap_or_default().to_string(),
                target: record.get(tgt_idx).unwrap_or_default().to_string(),
                weight,
            });
        }
        Ok(Self { edges })
    }

    pub fn from_csv_path(path: impl AsRef<Path>, columns: &NetworkColumns) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv(file, columns)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Distinct source identifiers, in first-seen order.
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for e in &self.edges {
            if !seen.contains(&e.source.as_str()) {
                seen.push(e.source.as_str());
            }
        }
        seen
    }

    /// (target, weight) pairs for one source.
    pub fn targets_of(&self, source: &str) -> Vec<(&str, f64)> {
        self.edges
            .iter()
            .filter(|e| e.source == source)
            .map(|e| (e.target.as_str(), e.weight))
            .collect()
    }

    /// Sources retaining at least `min_n` targets. Methods use this to drop
    /// under-connected sources; the dispatcher only forwards `min_n`.
    pub fn sources_with_min_targets(&self, min_n: usize) -> Vec<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for e in &self.edges {
            *counts.entry(e.source.as_str()).or_default() += 1;
        }
        self.sources()
            .into_iter()
            .filter(|s| counts.get(s).copied().unwrap_or(0) >= min_n)
            .collect()
    }
}
