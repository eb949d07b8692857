//! Analysis failure modes
//!
//! Unresolved callees and empty source specs are not errors: the first is a
//! conservative omission during source identification, the second simply
//! yields an empty result. The only hard failure is a structurally invalid
//! IR graph, detected before propagation starts; no partial taint set is
//! returned for that function, and other functions are unaffected.

use taintflow_core::GraphError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("IR graph of function {function:?} violates the use-def contract: {source}")]
    InvalidGraph {
        function: String,
        #[source]
        source: GraphError,
    },
}
