//! Per-step observation hooks
//!
//! The analysis is a pure computation over the use-def graph; hosts that want
//! live diagnostics subscribe through [`TaintObserver`] instead of the core
//! printing anything itself.

use crate::propagate::Observation;
use taintflow_core::ValueId;
use tracing::info;

/// Callbacks fired while an analysis run progresses. All methods default to
/// no-ops so implementors override only what they need.
pub trait TaintObserver {
    /// A taint-source call site contributed `operand` as a seed
    fn source_identified(&mut self, call: ValueId, operand: ValueId) {
        let _ = (call, operand);
    }

    /// A value was inserted into the taint set
    fn value_tainted(&mut self, observation: &Observation) {
        let _ = observation;
    }
}

/// Forwards observations to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceObserver;

impl TaintObserver for TraceObserver {
    fn source_identified(&mut self, call: ValueId, operand: ValueId) {
        info!(%call, %operand, "taint source operand");
    }

    fn value_tainted(&mut self, observation: &Observation) {
        match &observation.location {
            Some(location) => info!(value = %observation.value, %location, "tainted"),
            None => info!(value = %observation.value, "tainted"),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct NullObserver;

impl TaintObserver for NullObserver {}
