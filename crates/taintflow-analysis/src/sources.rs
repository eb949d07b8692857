//! Taint source configuration and call-site identification

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use taintflow_core::{Callee, Function, InstKind, ValueId};
use tracing::{debug, trace};

/// Set of callee names whose calls introduce taint into their argument
/// operands. An explicit value passed into each analysis run; never global
/// state. An empty spec is valid and yields zero seeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaintSourceSpec {
    names: IndexSet<String>,
}

impl TaintSourceSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// The classic C input routines: `__isoc99_scanf` and `getenv_s`
    pub fn c_stdio_defaults() -> Self {
        ["__isoc99_scanf", "getenv_s"].into_iter().collect()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TaintSourceSpec {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// One argument operand of a taint-source call site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    /// The source call instruction
    pub call: ValueId,
    /// The argument operand taint propagates from
    pub operand: ValueId,
}

/// Scan `function` in block/instruction order for calls whose callee name is
/// in `spec` and collect their argument operands as seeds. Indirect calls are
/// never sources regardless of any name a host may associate with them.
pub fn identify_sources(function: &Function, spec: &TaintSourceSpec) -> Vec<Seed> {
    let mut seeds = Vec::new();
    for (id, inst) in function.instructions() {
        let InstKind::Call { callee } = &inst.kind else {
            continue;
        };
        match callee {
            Callee::Direct(name) => {
                trace!(function = %function.name, call = %id, callee = %name, "call site");
                if spec.contains(name) {
                    debug!(
                        function = %function.name,
                        call = %id,
                        callee = %name,
                        operands = inst.operands.len(),
                        "taint source call site"
                    );
                    seeds.extend(inst.operands.iter().map(|&operand| Seed { call: id, operand }));
                }
            }
            Callee::Indirect => {}
        }
    }
    seeds
}
