//! Worklist-based taint propagation
//!
//! Breadth-first fixpoint over the "used-by" edges of the function's use-def
//! graph. Each value enters the worklist at most once, so a run performs
//! O(V + E) worklist operations and always terminates. Seeds are propagation
//! origins, not members of the reported set; a seed operand is reported
//! tainted only if some tainted value later reaches it as a user's result.

use crate::observer::TaintObserver;
use crate::sources::Seed;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use taintflow_core::{Function, SourceLocation, ValueId};
use tracing::debug;

/// Set of tainted values; iteration follows discovery order
pub type TaintSet = IndexSet<ValueId>;

/// Provenance record for one newly tainted value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub value: ValueId,
    pub location: Option<SourceLocation>,
}

/// Run the fixpoint. Assumes `function` has passed [`Function::validate`];
/// the public entry point in `lib.rs` enforces that.
pub(crate) fn propagate(
    function: &Function,
    seeds: &[Seed],
    observer: &mut dyn TaintObserver,
) -> (TaintSet, Vec<Observation>) {
    let mut tainted = TaintSet::new();
    let mut observations = Vec::new();
    let mut worklist: VecDeque<ValueId> = VecDeque::new();
    let mut enqueued: HashSet<ValueId> = HashSet::new();

    // The use of an operand inside its own source call is not a propagation
    // target. Every operand of a source call is a seed, so source call
    // instructions themselves never enter the tainted set.
    let origin_edges: HashSet<(ValueId, ValueId)> =
        seeds.iter().map(|seed| (seed.operand, seed.call)).collect();

    for seed in seeds {
        if enqueued.insert(seed.operand) {
            worklist.push_back(seed.operand);
        }
    }

    while let Some(value) = worklist.pop_front() {
        for &user in function.users(value) {
            if origin_edges.contains(&(value, user)) {
                continue;
            }
            if tainted.insert(user) {
                let location = function
                    .instruction(user)
                    .and_then(|inst| inst.location.clone());
                debug!(function = %function.name, value = %user, via = %value, "newly tainted");
                let observation = Observation {
                    value: user,
                    location,
                };
                observer.value_tainted(&observation);
                observations.push(observation);
                if enqueued.insert(user) {
                    worklist.push_back(user);
                }
            }
        }
    }

    (tainted, observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;
    use taintflow_core::FunctionBuilder;

    #[test]
    fn test_no_seeds_yields_empty_result() {
        let mut b = FunctionBuilder::new("f");
        let x = b.add_argument("x");
        b.unary("neg", x);
        let func = b.finish();

        let (tainted, observations) = propagate(&func, &[], &mut NullObserver);
        assert!(tainted.is_empty());
        assert!(observations.is_empty());
    }

    #[test]
    fn test_transitive_chain() {
        let mut b = FunctionBuilder::new("f");
        let buf = b.add_argument("buf");
        let one = b.add_constant("1");
        let two = b.add_constant("2");
        let call = b.call("getenv_s", &[buf]);
        let y = b.binary("add", buf, one);
        let z = b.binary("mul", y, two);
        let func = b.finish();

        let seeds = [Seed { call, operand: buf }];
        let (tainted, observations) = propagate(&func, &seeds, &mut NullObserver);

        let order: Vec<ValueId> = tainted.iter().copied().collect();
        assert_eq!(order, vec![y, z]);
        assert_eq!(
            observations.iter().map(|o| o.value).collect::<Vec<_>>(),
            vec![y, z]
        );
    }

    #[test]
    fn test_diamond_taints_join_once() {
        let mut b = FunctionBuilder::new("f");
        let src = b.add_argument("src");
        let call = b.call("getenv_s", &[src]);
        let left = b.unary("neg", src);
        let right = b.unary("not", src);
        let join = b.binary("add", left, right);
        let func = b.finish();

        let seeds = [Seed { call, operand: src }];
        let (tainted, observations) = propagate(&func, &seeds, &mut NullObserver);

        assert!(tainted.contains(&left));
        assert!(tainted.contains(&right));
        assert!(tainted.contains(&join));
        // BFS layer order: both direct users before the join, join reported once
        assert_eq!(
            observations.iter().map(|o| o.value).collect::<Vec<_>>(),
            vec![left, right, join]
        );
    }

    #[test]
    fn test_seed_reachable_as_user_is_reported() {
        // store(t, p) consumes the seed p outside its source call, so the
        // store is reported even though p itself never is
        let mut b = FunctionBuilder::new("f");
        let p = b.add_argument("p");
        let call = b.call("getenv_s", &[p]);
        let t = b.load(p);
        let st = b.store(t, p);
        let func = b.finish();

        let seeds = [Seed { call, operand: p }];
        let (tainted, _) = propagate(&func, &seeds, &mut NullObserver);

        assert!(tainted.contains(&t));
        assert!(tainted.contains(&st));
        assert!(!tainted.contains(&p));
        assert!(!tainted.contains(&call));
    }

    #[test]
    fn test_origin_call_not_tainted_by_own_operand() {
        let mut b = FunctionBuilder::new("f");
        let buf = b.add_argument("buf");
        let call = b.call("getenv_s", &[buf]);
        let y = b.unary("neg", buf);
        let func = b.finish();

        let seeds = [Seed { call, operand: buf }];
        let (tainted, _) = propagate(&func, &seeds, &mut NullObserver);

        assert!(!tainted.contains(&call));
        assert!(tainted.contains(&y));
    }

    #[test]
    fn test_observation_carries_location() {
        let mut b = FunctionBuilder::new("f");
        let buf = b.add_argument("buf");
        let call = b.call("getenv_s", &[buf]);
        let y = b.unary("neg", buf);
        b.location("main.c", 7, 2);
        let func = b.finish();

        let seeds = [Seed { call, operand: buf }];
        let (_, observations) = propagate(&func, &seeds, &mut NullObserver);

        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].value, y);
        assert_eq!(
            observations[0].location.as_ref().unwrap().to_string(),
            "main.c:7:2"
        );
    }
}
