//! Expression matrix input shapes.
//!
//! The dispatcher accepts three interchangeable forms:
//!   1. A bare `[features, matrix]` pair (sample labels synthesized by row).
//!   2. A fully labelled table (rows = samples, columns = features).
//!   3. An annotated container bundling the payload with labels and a slot
//!      for attaching named result tables.
//! All three normalise to an [`ExprMatrix`] view before dispatch.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use decoupler_common::{DecouplerError, Result, ResultSet, ScoreTable};

// ── Labelled table ────────────────────────────────────────────────────────────

/// Labelled expression table. Rows are samples, columns are features
/// (e.g. genes); values are row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprMatrix {
    pub samples: Vec<String>,
    pub features: Vec<String>,
    pub values: Vec<f64>,
}

impl ExprMatrix {
    pub fn new(samples: Vec<String>, features: Vec<String>, values: Vec<f64>) -> Result<Self> {
        let expected = samples.len() * features.len();
        if values.len() != expected {
            return Err(DecouplerError::ShapeMismatch {
                name: "expression matrix".to_string(),
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            samples,
            features,
            values,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Value at (sample row, feature column). None when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.samples.len() || col >= self.features.len() {
            return None;
        }
        self.values.get(row * self.features.len() + col).copied()
    }

    /// Column index of a feature by label.
    pub fn feature_index(&self, feature: &str) -> Option<usize> {
        self.features.iter().position(|f| f == feature)
    }
}

// ── Annotated container ───────────────────────────────────────────────────────

/// Annotated matrix container: numeric payload, row/column labels, and a
/// named-results attachment slot (the `obsm`-style side table store).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotatedMatrix {
    pub samples: Vec<String>,
    pub features: Vec<String>,
    pub values: Vec<f64>,
    /// Attached result tables, keyed by table name.
    pub results: HashMap<String, ScoreTable>,
}

impl AnnotatedMatrix {
    pub fn new(samples: Vec<String>, features: Vec<String>, values: Vec<f64>) -> Result<Self> {
        let expected = samples.len() * features.len();
        if values.len() != expected {
            return Err(DecouplerError::ShapeMismatch {
                name: "annotated matrix".to_string(),
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            samples,
            features,
            values,
            results: HashMap::new(),
        })
    }

    /// Materialise a labelled table view of the payload.
    pub fn to_expr(&self) -> ExprMatrix {
        ExprMatrix {
            samples: self.samples.clone(),
            features: self.features.clone(),
            values: self.values.clone(),
        }
    }

    /// Write every table of a result set into the attachment slot.
    pub fn attach(&mut self, results: ResultSet) {
        for (name, table) in results {
            self.results.insert(name, table);
        }
    }

    pub fn result(&self, name: &str) -> Option<&ScoreTable> {
        self.results.get(name)
    }
}

// ── Input shapes ──────────────────────────────────────────────────────────────

/// The three accepted matrix input shapes.
#[derive(Debug, Clone)]
pub enum MatrixInput {
    /// `[features, matrix]` pair: feature labels plus a row-major payload
    /// with `n_rows` samples. Sample labels are synthesized by row position.
    Pair {
        features: Vec<String>,
        n_rows: usize,
        values: Vec<f64>,
    },
    /// Fully labelled table.
    Table(ExprMatrix),
    /// Annotated container; normalisation reads the payload, attachment of
    /// results back into the container is a separate explicit step.
    Annotated(AnnotatedMatrix),
}

impl MatrixInput {
    /// Normalise to a labelled table view. Borrows when the input already
    /// is one, clones otherwise.
    pub fn as_expr(&self) -> Result<Cow<'_, ExprMatrix>> {
        match self {
            MatrixInput::Pair {
                features,
                n_rows,
                values,
            } => {
                let samples = (0..*n_rows).map(|i| i.to_string()).collect();
                Ok(Cow::Owned(ExprMatrix::new(
                    samples,
                    features.clone(),
                    values.clone(),
                )?))
            }
            MatrixInput::Table(expr) => Ok(Cow::Borrowed(expr)),
            MatrixInput::Annotated(adata) => Ok(Cow::Owned(adata.to_expr())),
        }
    }
}

impl From<ExprMatrix> for MatrixInput {
    fn from(expr: ExprMatrix) -> Self {
        MatrixInput::Table(expr)
    }
}

impl From<AnnotatedMatrix> for MatrixInput {
    fn from(adata: AnnotatedMatrix) -> Self {
        MatrixInput::Annotated(adata)
    }
}
