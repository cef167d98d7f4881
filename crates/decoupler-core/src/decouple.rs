//! The dispatcher.
//!
//! Orchestrates one run over a shared matrix and network:
//!   1. Normalise the matrix input to a labelled table view.
//!   2. Invoke each selected method in order with fresh per-method options
//!      (`min_n` and `verbose` always forced from the dispatcher's own
//!      parameters).
//!   3. Flatten every returned table into one result set, keyed by the
//!      table's own name (later insertions win collisions).
//!   4. Optionally merge in the consensus aggregator's tables.
//!
//! Any collaborator error propagates unmodified; no partial result set is
//! ever returned and no caller-owned state is mutated on the error path.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use decoupler_common::{Result, ResultSet};

use crate::consensus::ConsensusAggregator;
use crate::matrix::{AnnotatedMatrix, ExprMatrix, MatrixInput};
use crate::method::{MethodKind, MethodOpts};
use crate::network::Network;
use crate::registry::MethodRegistry;

// ── Run config ────────────────────────────────────────────────────────────────

/// Parameters for a single dispatch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoupleConfig {
    /// Methods to run, in order.
    pub methods: Vec<MethodKind>,
    /// Per-method keyword overrides. `min_n` and `verbose` entries are
    /// ignored here; the top-level fields below always win.
    pub args: HashMap<MethodKind, HashMap<String, serde_json::Value>>,
    /// Whether to run the consensus aggregator over the accumulated results.
    pub consensus: bool,
    /// Minimum number of targets per source, forwarded to every method.
    pub min_n: usize,
    /// Progress reporting inside each method.
    pub verbose: bool,
}

impl Default for DecoupleConfig {
    fn default() -> Self {
        Self {
            methods: MethodKind::ALL.to_vec(),
            args: HashMap::new(),
            consensus: true,
            min_n: 5,
            verbose: true,
        }
    }
}

impl DecoupleConfig {
    /// Build a config from method names. All names are parsed up front, so
    /// an unknown name fails here, before any method runs.
    pub fn with_method_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let methods = names
            .iter()
            .map(|n| n.as_ref().parse::<MethodKind>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            methods,
            ..Default::default()
        })
    }

    /// Options for one method invocation: forced `min_n`/`verbose`, plus the
    /// caller's extras for that method minus those two reserved keys.
    fn opts_for(&self, kind: MethodKind) -> MethodOpts {
        let mut extra = self.args.get(&kind).cloned().unwrap_or_default();
        extra.remove("min_n");
        extra.remove("verbose");
        MethodOpts {
            min_n: self.min_n,
            verbose: self.verbose,
            extra,
        }
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Runs a configurable subset of activity-inference methods and merges
/// their outputs.
pub struct Decoupler {
    registry: MethodRegistry,
    consensus: Box<dyn ConsensusAggregator>,
}

impl Decoupler {
    pub fn new(registry: MethodRegistry, consensus: Box<dyn ConsensusAggregator>) -> Self {
        Self {
            registry,
            consensus,
        }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Run the selected methods over any accepted matrix shape and return
    /// the merged result set. The caller's input is never written to; use
    /// [`Decoupler::decouple_annotated`] or [`AnnotatedMatrix::attach`] to
    /// store results in a container.
    pub fn decouple(
        &self,
        mat: &MatrixInput,
        net: &Network,
        cfg: &DecoupleConfig,
    ) -> Result<ResultSet> {
        let expr = mat.as_expr()?;
        self.run(&expr, net, cfg)
    }

    /// Run over an annotated container and write every result table into
    /// its attachment slot. Returns no result set.
    pub fn decouple_annotated(
        &self,
        adata: &mut AnnotatedMatrix,
        net: &Network,
        cfg: &DecoupleConfig,
    ) -> Result<()> {
        let expr = adata.to_expr();
        let results = self.run(&expr, net, cfg)?;
        adata.attach(results);
        Ok(())
    }

    fn run(&self, expr: &ExprMatrix, net: &Network, cfg: &DecoupleConfig) -> Result<ResultSet> {
        let mut results = ResultSet::new();

        for &kind in &cfg.methods {
            let opts = cfg.opts_for(kind);
            if cfg.verbose {
                info!(method = %kind, min_n = cfg.min_n, "running activity method");
            } else {
                debug!(method = %kind, min_n = cfg.min_n, "running activity method");
            }
            let tables = self.registry.get(kind).run(expr, net, &opts)?;
            for table in tables {
                results.insert(table);
            }
        }

        if cfg.consensus {
            if cfg.verbose {
                info!(tables = results.len(), "running consensus");
            } else {
                debug!(tables = results.len(), "running consensus");
            }
            for table in self.consensus.combine(&results)? {
                results.insert(table);
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::MockConsensus;
    use crate::method::{ActivityMethod, MockMethod};
    use crate::network::Edge;
    use decoupler_common::{DecouplerError, ScoreTable};

    fn toy_matrix() -> ExprMatrix {
        // 3 samples x 4 features
        ExprMatrix::new(
            vec!["s1".into(), "s2".into(), "s3".into()],
            vec!["g1".into(), "g2".into(), "g3".into(), "g4".into()],
            vec![
                1.0, 2.0, 3.0, 4.0, //
                5.0, 6.0, 7.0, 8.0, //
                9.0, 10.0, 11.0, 12.0,
            ],
        )
        .unwrap()
    }

    /// Two sources with 5 targets each (targets may repeat; the network is
    /// long-format with no uniqueness constraint).
    fn dense_network() -> Network {
        let mut edges = Vec::new();
        for source in ["tf1", "tf2"] {
            for target in ["g1", "g2", "g3", "g4", "g1"] {
                edges.push(Edge {
                    source: source.into(),
                    target: target.into(),
                    weight: 1.0,
                });
            }
        }
        Network::new(edges)
    }

    fn mocked_dispatcher() -> Decoupler {
        Decoupler::new(MethodRegistry::mocked(), Box::new(MockConsensus))
    }

    #[test]
    fn test_result_keys_union_of_method_tables() {
        let dispatcher = mocked_dispatcher();
        let cfg = DecoupleConfig {
            methods: vec![MethodKind::Wmean, MethodKind::Ulm],
            consensus: false,
            min_n: 5,
            ..Default::default()
        };
        let results = dispatcher
            .decouple(&toy_matrix().into(), &dense_network(), &cfg)
            .unwrap();
        let mut names = results.names();
        names.sort();
        assert_eq!(
            names,
            vec!["ulm_estimate", "ulm_pvals", "wmean_estimate", "wmean_pvals"]
        );
    }

    #[test]
    fn test_consensus_tables_merged_when_enabled() {
        let dispatcher = mocked_dispatcher();
        let cfg = DecoupleConfig {
            methods: vec![MethodKind::Wmean, MethodKind::Wsum],
            consensus: true,
            min_n: 5,
            ..Default::default()
        };
        let results = dispatcher
            .decouple(&toy_matrix().into(), &dense_network(), &cfg)
            .unwrap();
        assert!(results.contains("consensus_estimate"));
        assert!(results.contains("consensus_pvals"));
        assert_eq!(results.len(), 6);
    }

    #[test]
    fn test_unknown_method_name_fails_before_dispatch() {
        let err = DecoupleConfig::with_method_names(&["wmean", "bad_method"]).unwrap_err();
        match err {
            DecouplerError::UnknownMethod(name) => assert_eq!(name, "bad_method"),
            other => panic!("expected UnknownMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_forced_min_n_and_verbose_reach_every_method() {
        let wmean = std::sync::Arc::new(MockMethod::new("wmean"));
        let ulm = std::sync::Arc::new(MockMethod::new("ulm"));
        let registry = MethodRegistry::new(
            Box::new(wmean.clone()),
            Box::new(MockMethod::new("wsum")),
            Box::new(ulm.clone()),
            Box::new(MockMethod::new("mlm")),
            Box::new(MockMethod::new("ora")),
        );
        let dispatcher = Decoupler::new(registry, Box::new(MockConsensus));

        // Caller tries to smuggle min_n/verbose through the extras.
        let mut args = HashMap::new();
        let mut wmean_extra = HashMap::new();
        wmean_extra.insert("min_n".to_string(), serde_json::json!(99));
        wmean_extra.insert("verbose".to_string(), serde_json::json!(true));
        wmean_extra.insert("times".to_string(), serde_json::json!(100));
        args.insert(MethodKind::Wmean, wmean_extra);

        let cfg = DecoupleConfig {
            methods: vec![MethodKind::Wmean, MethodKind::Ulm],
            args,
            consensus: false,
            min_n: 3,
            verbose: false,
        };
        dispatcher
            .decouple(&toy_matrix().into(), &dense_network(), &cfg)
            .unwrap();

        let wmean_calls = wmean.calls();
        let ulm_calls = ulm.calls();
        assert_eq!(wmean_calls.len(), 1);
        assert_eq!(wmean_calls[0].min_n, 3);
        assert!(!wmean_calls[0].verbose);
        assert!(!wmean_calls[0].extra.contains_key("min_n"));
        assert!(!wmean_calls[0].extra.contains_key("verbose"));
        assert_eq!(wmean_calls[0].extra.get("times"), Some(&serde_json::json!(100)));
        assert_eq!(ulm_calls[0].min_n, 3);
    }

    #[test]
    fn test_caller_args_left_untouched() {
        let dispatcher = mocked_dispatcher();
        let mut args = HashMap::new();
        args.insert(MethodKind::Wmean, HashMap::new());
        let cfg = DecoupleConfig {
            methods: vec![MethodKind::Wmean],
            args: args.clone(),
            consensus: false,
            min_n: 5,
            ..Default::default()
        };
        dispatcher
            .decouple(&toy_matrix().into(), &dense_network(), &cfg)
            .unwrap();
        assert_eq!(cfg.args, args);
        assert!(cfg.args[&MethodKind::Wmean].is_empty());
    }

    #[test]
    fn test_annotated_path_attaches_everything() {
        let dispatcher = mocked_dispatcher();
        let mat = toy_matrix();
        let mut adata = AnnotatedMatrix::new(mat.samples, mat.features, mat.values).unwrap();
        let cfg = DecoupleConfig {
            methods: vec![MethodKind::Wmean],
            consensus: true,
            min_n: 5,
            ..Default::default()
        };
        dispatcher
            .decouple_annotated(&mut adata, &dense_network(), &cfg)
            .unwrap();
        for name in [
            "wmean_estimate",
            "wmean_pvals",
            "consensus_estimate",
            "consensus_pvals",
        ] {
            assert!(adata.result(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn test_plain_path_leaves_annotated_input_untouched() {
        let dispatcher = mocked_dispatcher();
        let mat = toy_matrix();
        let adata = AnnotatedMatrix::new(mat.samples, mat.features, mat.values).unwrap();
        let cfg = DecoupleConfig {
            methods: vec![MethodKind::Wmean],
            consensus: false,
            min_n: 5,
            ..Default::default()
        };
        let results = dispatcher
            .decouple(&MatrixInput::Annotated(adata.clone()), &dense_network(), &cfg)
            .unwrap();
        assert!(!results.is_empty());
        assert!(adata.results.is_empty());
    }

    #[test]
    fn test_idempotence_without_consensus() {
        let dispatcher = mocked_dispatcher();
        let cfg = DecoupleConfig {
            methods: vec![MethodKind::Wmean, MethodKind::Mlm],
            consensus: false,
            min_n: 5,
            ..Default::default()
        };
        let input: MatrixInput = toy_matrix().into();
        let a = dispatcher.decouple(&input, &dense_network(), &cfg).unwrap();
        let b = dispatcher.decouple(&input, &dense_network(), &cfg).unwrap();
        let mut names_a = a.names();
        let mut names_b = b.names();
        names_a.sort();
        names_b.sort();
        assert_eq!(names_a, names_b);
        for name in names_a {
            assert_eq!(a.get(name).unwrap().values, b.get(name).unwrap().values);
        }
    }

    #[test]
    fn test_wmean_only_scenario_shapes() {
        // 3 samples x 4 features, two sources with >= 5 targets each.
        let dispatcher = mocked_dispatcher();
        let cfg = DecoupleConfig {
            methods: vec![MethodKind::Wmean],
            consensus: false,
            min_n: 5,
            ..Default::default()
        };
        let results = dispatcher
            .decouple(&toy_matrix().into(), &dense_network(), &cfg)
            .unwrap();
        let mut names = results.names();
        names.sort();
        assert_eq!(names, vec!["wmean_estimate", "wmean_pvals"]);
        for name in names {
            assert_eq!(results.get(name).unwrap().shape(), (3, 2));
        }
    }

    #[test]
    fn test_method_error_propagates_without_results() {
        struct FailingMethod;
        impl ActivityMethod for FailingMethod {
            fn run(
                &self,
                _mat: &ExprMatrix,
                _net: &Network,
                _opts: &MethodOpts,
            ) -> decoupler_common::Result<Vec<ScoreTable>> {
                Err(anyhow::anyhow!("singular fit").into())
            }
        }
        let registry = MethodRegistry::new(
            Box::new(MockMethod::new("wmean")),
            Box::new(FailingMethod),
            Box::new(MockMethod::new("ulm")),
            Box::new(MockMethod::new("mlm")),
            Box::new(MockMethod::new("ora")),
        );
        let dispatcher = Decoupler::new(registry, Box::new(MockConsensus));
        let cfg = DecoupleConfig {
            methods: vec![MethodKind::Wmean, MethodKind::Wsum],
            consensus: false,
            min_n: 5,
            ..Default::default()
        };
        let err = dispatcher
            .decouple(&toy_matrix().into(), &dense_network(), &cfg)
            .unwrap_err();
        assert!(err.to_string().contains("singular fit"));
    }
}
