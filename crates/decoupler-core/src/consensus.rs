//! Consensus aggregation seam.
//!
//! The consensus algorithm combines the p-values of the individual methods
//! into a single −log10(p-value)-style score. Like the methods themselves
//! it is an external collaborator behind a trait.

use decoupler_common::{Result, ResultSet, ScoreTable};

/// Combines an accumulated result set into consensus tables.
pub trait ConsensusAggregator: Send + Sync {
    fn combine(&self, results: &ResultSet) -> Result<Vec<ScoreTable>>;
}

// ── Mock implementation for testing ───────────────────────────────────────────

/// Deterministic stand-in aggregator: averages all `*_estimate` tables that
/// share the first table's shape and labels, and emits a constant p-value
/// table alongside.
pub struct MockConsensus;

impl ConsensusAggregator for MockConsensus {
    fn combine(&self, results: &ResultSet) -> Result<Vec<ScoreTable>> {
        let mut estimates: Vec<&ScoreTable> = results
            .iter()
            .filter(|(name, _)| name.ends_with("_estimate"))
            .map(|(_, t)| t)
            .collect();
        estimates.sort_by(|a, b| a.name.cmp(&b.name));

        let Some(first) = estimates.first() else {
            return Ok(vec![]);
        };
        let compatible: Vec<&ScoreTable> = estimates
            .iter()
            .copied()
            .filter(|t| t.samples == first.samples && t.sources == first.sources)
            .collect();

        let n = compatible.len() as f64;
        let mut values = vec![0.0; first.values.len()];
        for table in &compatible {
            for (acc, v) in values.iter_mut().zip(&table.values) {
                *acc += v / n;
            }
        }

        Ok(vec![
            ScoreTable::new(
                "consensus_estimate",
                first.samples.clone(),
                first.sources.clone(),
                values,
            )?,
            ScoreTable::new(
                "consensus_pvals",
                first.samples.clone(),
                first.sources.clone(),
                vec![0.05; first.values.len()],
            )?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(name: &str, fill: f64) -> ScoreTable {
        ScoreTable::new(
            name,
            vec!["s1".into()],
            vec!["tf1".into(), "tf2".into()],
            vec![fill, fill * 2.0],
        )
        .unwrap()
    }

    #[test]
    fn test_mock_consensus_averages_estimates() {
        let mut rs = ResultSet::new();
        rs.insert(estimate("wmean_estimate", 1.0));
        rs.insert(estimate("ulm_estimate", 3.0));
        let tables = MockConsensus.combine(&rs).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "consensus_estimate");
        assert_eq!(tables[0].get(0, 0), Some(2.0));
        assert_eq!(tables[0].get(0, 1), Some(4.0));
    }

    #[test]
    fn test_mock_consensus_empty_input() {
        let tables = MockConsensus.combine(&ResultSet::new()).unwrap();
        assert!(tables.is_empty());
    }
}
