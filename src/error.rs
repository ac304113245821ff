#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::types::RequestKey;

/// Errors raised by the analysis pipeline.
///
/// Only `InvalidGrammar`, `MalformedAst` and `DataConsistencyViolation` stop a
/// run. The hint variants are recoverable: loaders record them as skips and
/// keep going.
#[derive(thiserror::Error, Debug)]
pub enum HintkitError {
    /// A node type was assigned to more than one grammar category.
    #[error(
        "Node type `{node_type}` is listed under both `{first}` and `{second}` in the grammar."
    )]
    InvalidGrammar {
        /// The conflicting node type.
        node_type: String,
        /// Category the node type was first seen in.
        first:     String,
        /// Category that tried to claim it again.
        second:    String,
    },
    /// A generated hint document matched none of the known shapes.
    #[error("Unknown hint JSON format in `{id}`, keys: [{}]", .keys.join(", "))]
    UnknownHintFormat {
        /// Identifier (file stem) of the hint document.
        id:   String,
        /// Top-level keys found in the document, if it was an object.
        keys: Vec<String>,
    },
    /// A generated hint identifier could not be split into request and index.
    #[error("Hint identifier `{id}` has a non-numeric hint index `{index}`.")]
    InvalidHintIdentity {
        /// The full identifier.
        id:    String,
        /// The part after the separator.
        index: String,
    },
    /// A retained hint has no target AST.
    #[error(
        "Hint from `{algorithm}` for request {key} has no target AST after normalization; the \
         input data is inconsistent."
    )]
    DataConsistencyViolation {
        /// Algorithm that produced the hint.
        algorithm: String,
        /// Request the hint belongs to.
        key:       RequestKey,
    },
    /// An AST string could not be decoded as JSON.
    #[error("Could not decode AST JSON for {context}: {source}")]
    MalformedAst {
        /// Where the AST came from.
        context: String,
        /// The underlying decode error.
        #[source]
        source:  serde_json::Error,
    },
}

impl HintkitError {
    /// Indicates whether the error is a per-hint problem the pipeline can skip.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HintkitError::UnknownHintFormat { .. } | HintkitError::InvalidHintIdentity { .. }
        )
    }
}
