//! Activity-inference method seam.
//!
//! The statistical methods themselves live behind [`ActivityMethod`]; this
//! crate only knows the closed set of method kinds, the per-invocation
//! options, and the calling convention (matrix + network + options in,
//! named result tables out).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use decoupler_common::{DecouplerError, Result, ScoreTable};

use crate::matrix::ExprMatrix;
use crate::network::Network;

// ── Method kinds ──────────────────────────────────────────────────────────────

/// The fixed set of supported activity-inference methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    /// Weighted mean
    Wmean,
    /// Weighted sum
    Wsum,
    /// Univariate linear model
    Ulm,
    /// Multivariate linear model
    Mlm,
    /// Over-representation analysis
    Ora,
}

impl MethodKind {
    pub const ALL: [MethodKind; 5] = [
        MethodKind::Wmean,
        MethodKind::Wsum,
        MethodKind::Ulm,
        MethodKind::Mlm,
        MethodKind::Ora,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::Wmean => "wmean",
            MethodKind::Wsum => "wsum",
            MethodKind::Ulm => "ulm",
            MethodKind::Mlm => "mlm",
            MethodKind::Ora => "ora",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodKind {
    type Err = DecouplerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "wmean" => Ok(MethodKind::Wmean),
            "wsum" => Ok(MethodKind::Wsum),
            "ulm" => Ok(MethodKind::Ulm),
            "mlm" => Ok(MethodKind::Mlm),
            "ora" => Ok(MethodKind::Ora),
            other => Err(DecouplerError::UnknownMethod(other.to_string())),
        }
    }
}

// ── Per-invocation options ────────────────────────────────────────────────────

/// Options handed to one method invocation. Built fresh by the dispatcher
/// for every call: `min_n` and `verbose` always come from the dispatcher's
/// own parameters, caller-supplied extras never override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodOpts {
    /// Minimum number of targets a source must keep to be retained.
    pub min_n: usize,
    /// Whether the method should report progress.
    pub verbose: bool,
    /// Method-specific keyword overrides.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for MethodOpts {
    fn default() -> Self {
        Self {
            min_n: 5,
            verbose: true,
            extra: HashMap::new(),
        }
    }
}

// ── Method trait ──────────────────────────────────────────────────────────────

/// One activity-inference method. Implementations return a sequence of
/// named result tables (rows = samples, columns = sources), typically an
/// estimate table and a p-value table.
pub trait ActivityMethod: Send + Sync {
    fn run(&self, mat: &ExprMatrix, net: &Network, opts: &MethodOpts) -> Result<Vec<ScoreTable>>;
}

impl<T: ActivityMethod + ?Sized> ActivityMethod for std::sync::Arc<T> {
    fn run(&self, mat: &ExprMatrix, net: &Network, opts: &MethodOpts) -> Result<Vec<ScoreTable>> {
        (**self).run(mat, net, opts)
    }
}

// ── Mock implementation for testing ───────────────────────────────────────────

/// Deterministic stand-in method for unit tests and examples.
///
/// Emits `<name>_estimate` (weighted sum of each source's target columns)
/// and `<name>_pvals` (constant fill), dropping sources with fewer than
/// `min_n` targets. Captures the options of every invocation so tests can
/// assert what the dispatcher passed in.
pub struct MockMethod {
    name: String,
    pval_fill: f64,
    calls: std::sync::Mutex<Vec<MethodOpts>>,
}

impl MockMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pval_fill: 0.05,
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Override the constant p-value fill.
    pub fn with_pval_fill(mut self, pval: f64) -> Self {
        self.pval_fill = pval;
        self
    }

    /// Options captured from every invocation so far.
    pub fn calls(&self) -> Vec<MethodOpts> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ActivityMethod for MockMethod {
    fn run(&self, mat: &ExprMatrix, net: &Network, opts: &MethodOpts) -> Result<Vec<ScoreTable>> {
        self.calls.lock().unwrap().push(opts.clone());

        let sources: Vec<String> = net
            .sources_with_min_targets(opts.min_n)
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut estimates = Vec::with_capacity(mat.n_samples() * sources.len());
        for row in 0..mat.n_samples() {
            for source in &sources {
                let mut acc = 0.0;
                for (target, weight) in net.targets_of(source) {
                    if let Some(col) = mat.feature_index(target) {
                        acc += mat.get(row, col).unwrap_or(0.0) * weight;
                    }
                }
                estimates.push(acc);
            }
        }
        let pvals = vec![self.pval_fill; estimates.len()];

        Ok(vec![
            ScoreTable::new(
                format!("{}_estimate", self.name),
                mat.samples.clone(),
                sources.clone(),
                estimates,
            )?,
            ScoreTable::new(
                format!("{}_pvals", self.name),
                mat.samples.clone(),
                sources,
                pvals,
            )?,
        ])
    }
}
