//! Error types for the canonical schema model.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    /// A relationship names a table or column that is not part of the graph.
    #[error("relationship references unknown {kind} `{id}`")]
    DanglingReference { kind: &'static str, id: String },

    #[error("metadata graph serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
