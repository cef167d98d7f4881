//! decoupler-common — Shared error type and result-table entities used
//! across the decoupler crates.

pub mod error;
pub mod table;

// Re-export commonly used types
pub use error::{DecouplerError, Result};
pub use table::{ResultSet, ScoreTable};
