//! # Taintflow Analysis
//!
//! Intraprocedural taint analysis over the `taintflow-core` IR: given a set
//! of taint-source callee names, find every value transitively influenced by
//! data originating at those call sites.
//!
//! Two cooperating pieces form the engine:
//!
//! - **Source identification** ([`sources`]) scans a function's call sites
//!   for configured source names and extracts their argument operands as
//!   seeds
//! - **Propagation** ([`propagate`]) runs a breadth-first worklist fixpoint
//!   over the "used-by" edges, marking each reachable instruction tainted
//!   exactly once and collecting provenance
//!
//! ## Quick start
//!
//! ```rust
//! use taintflow_analysis::prelude::*;
//!
//! let mut b = FunctionBuilder::new("read_config");
//! let buf = b.add_argument("buf");
//! let one = b.add_constant("1");
//! b.call("getenv_s", &[buf]);
//! let y = b.binary("add", buf, one);
//! let func = b.finish();
//!
//! let analysis = TaintAnalysis::new(TaintSourceSpec::c_stdio_defaults());
//! let result = analysis.analyze(&func).unwrap();
//! assert!(result.is_tainted(y));
//! ```
//!
//! The analysis is single-threaded and synchronous per function. [`analyze`]
//! takes `&self` and allocates all mutable state per run, so one
//! [`TaintAnalysis`] may analyze different functions from multiple threads
//! concurrently, as long as the IR itself is not being mutated.
//!
//! [`analyze`]: TaintAnalysis::analyze

pub mod error;
pub mod observer;
pub mod propagate;
pub mod report;
pub mod sources;

use serde::{Deserialize, Serialize};
use taintflow_core::{Function, ValueId};
use tracing::debug;

pub use error::AnalysisError;
pub use observer::{TaintObserver, TraceObserver};
pub use propagate::{Observation, TaintSet};
pub use sources::{identify_sources, Seed, TaintSourceSpec};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::AnalysisError;
    pub use crate::observer::{TaintObserver, TraceObserver};
    pub use crate::propagate::{Observation, TaintSet};
    pub use crate::sources::{identify_sources, Seed, TaintSourceSpec};
    pub use crate::{AnalysisResult, TaintAnalysis};
    pub use taintflow_core::prelude::*;
}

/// Outcome of analyzing one function: the tainted set plus the provenance
/// log in discovery order. Seeds are listed for reference but are not
/// members of the tainted set unless propagation reached them again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub function: String,
    pub seeds: Vec<Seed>,
    pub tainted: TaintSet,
    pub observations: Vec<Observation>,
}

impl AnalysisResult {
    pub fn is_tainted(&self, id: ValueId) -> bool {
        self.tainted.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.tainted.is_empty()
    }

    /// Tainted values in discovery order
    pub fn tainted_ids(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.tainted.iter().copied()
    }
}

/// The analysis engine. Holds only the read-only source spec; every run owns
/// its taint set and worklist, so the engine is freely shareable.
#[derive(Debug, Clone, Default)]
pub struct TaintAnalysis {
    spec: TaintSourceSpec,
}

impl TaintAnalysis {
    pub fn new(spec: TaintSourceSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &TaintSourceSpec {
        &self.spec
    }

    /// Analyze one function: validate the graph, identify source call sites,
    /// and propagate to a fixpoint.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidGraph`] if the function violates the use-def
    /// structural contract; no partial result is returned.
    pub fn analyze(&self, function: &Function) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with_observer(function, &mut observer::NullObserver)
    }

    /// Like [`analyze`](Self::analyze), with per-step callbacks for hosts
    /// that log or display progress. [`TraceObserver`] adapts the callbacks
    /// onto `tracing`.
    pub fn analyze_with_observer(
        &self,
        function: &Function,
        observer: &mut dyn TaintObserver,
    ) -> Result<AnalysisResult, AnalysisError> {
        function
            .validate()
            .map_err(|source| AnalysisError::InvalidGraph {
                function: function.name.clone(),
                source,
            })?;

        let seeds = sources::identify_sources(function, &self.spec);
        for seed in &seeds {
            observer.source_identified(seed.call, seed.operand);
        }

        let (tainted, observations) = propagate::propagate(function, &seeds, observer);
        debug!(
            function = %function.name,
            seeds = seeds.len(),
            tainted = tainted.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            function: function.name.clone(),
            seeds,
            tainted,
            observations,
        })
    }
}
