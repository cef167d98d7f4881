//! decoupler-core — Activity-inference dispatcher.
//!
//! Runs a selected subset of statistical activity-inference methods over a
//! shared expression matrix and a long-format regulatory network, collects
//! their named result tables, and optionally merges a consensus score.
//! The methods themselves and the consensus aggregator are collaborators
//! behind traits; this crate owns the orchestration and the data model.

pub mod consensus;
pub mod decouple;
pub mod matrix;
pub mod method;
pub mod network;
pub mod registry;

// Re-export commonly used types
pub use consensus::ConsensusAggregator;
pub use decouple::{Decoupler, DecoupleConfig};
pub use decoupler_common::{DecouplerError, Result, ResultSet, ScoreTable};
pub use matrix::{AnnotatedMatrix, ExprMatrix, MatrixInput};
pub use method::{ActivityMethod, MethodKind, MethodOpts};
pub use network::{Edge, Network, NetworkColumns};
pub use registry::MethodRegistry;
