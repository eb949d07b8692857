//! Property-style tests over randomly generated straight-line functions

use proptest::prelude::*;
use std::collections::HashSet;
use taintflow_analysis::prelude::*;

const SOURCE_NAME: &str = "src";

/// Instruction recipe; operand selectors are reduced modulo the number of
/// values defined so far, so every generated function is well-formed.
#[derive(Debug, Clone)]
enum Recipe {
    SourceCall(u16),
    PlainCall(u16),
    IndirectCall(u16),
    Binary(u16, u16),
    Unary(u16),
    Load(u16),
}

fn recipe_strategy() -> impl Strategy<Value = Recipe> {
    prop_oneof![
        any::<u16>().prop_map(Recipe::SourceCall),
        any::<u16>().prop_map(Recipe::PlainCall),
        any::<u16>().prop_map(Recipe::IndirectCall),
        (any::<u16>(), any::<u16>()).prop_map(|(a, b)| Recipe::Binary(a, b)),
        any::<u16>().prop_map(Recipe::Unary),
        any::<u16>().prop_map(Recipe::Load),
    ]
}

fn build(n_args: usize, recipes: &[Recipe]) -> Function {
    let mut b = FunctionBuilder::new("generated");
    let mut defined = Vec::new();
    for i in 0..n_args {
        defined.push(b.add_argument(format!("a{i}")));
    }
    defined.push(b.add_constant("0"));

    let pick = |sel: u16, defined: &[ValueId]| defined[sel as usize % defined.len()];

    for recipe in recipes {
        let id = match *recipe {
            Recipe::SourceCall(a) => {
                let arg = pick(a, &defined);
                b.call(SOURCE_NAME, &[arg])
            }
            Recipe::PlainCall(a) => {
                let arg = pick(a, &defined);
                b.call("helper", &[arg])
            }
            Recipe::IndirectCall(a) => {
                let arg = pick(a, &defined);
                b.indirect_call(&[arg])
            }
            Recipe::Binary(a, c) => {
                let lhs = pick(a, &defined);
                let rhs = pick(c, &defined);
                b.binary("add", lhs, rhs)
            }
            Recipe::Unary(a) => {
                let arg = pick(a, &defined);
                b.unary("neg", arg)
            }
            Recipe::Load(a) => {
                let arg = pick(a, &defined);
                b.load(arg)
            }
        };
        defined.push(id);
    }
    b.finish()
}

fn arb_function() -> impl Strategy<Value = Function> {
    (1usize..4, prop::collection::vec(recipe_strategy(), 0..16))
        .prop_map(|(n_args, recipes)| build(n_args, &recipes))
}

proptest! {
    /// Fixpoint closure: every user of a tainted value is tainted, except
    /// across a seed operand's edge into its own source call.
    #[test]
    fn closure_property(func in arb_function()) {
        let analysis = TaintAnalysis::new([SOURCE_NAME].into_iter().collect::<TaintSourceSpec>());
        let result = analysis.analyze(&func).unwrap();

        let origin_edges: HashSet<(ValueId, ValueId)> = result
            .seeds
            .iter()
            .map(|seed| (seed.operand, seed.call))
            .collect();

        for value in result.tainted_ids() {
            for &user in func.users(value) {
                prop_assert!(
                    result.is_tainted(user) || origin_edges.contains(&(value, user)),
                    "user {user} of tainted {value} escaped the fixpoint"
                );
            }
        }
    }

    /// Each value is reported at most once and the observation log mirrors
    /// the tainted set in discovery order.
    #[test]
    fn observations_mirror_taint_set(func in arb_function()) {
        let analysis = TaintAnalysis::new([SOURCE_NAME].into_iter().collect::<TaintSourceSpec>());
        let result = analysis.analyze(&func).unwrap();

        let observed: Vec<ValueId> = result.observations.iter().map(|o| o.value).collect();
        let unique: HashSet<ValueId> = observed.iter().copied().collect();
        prop_assert_eq!(unique.len(), observed.len());
        prop_assert_eq!(observed, result.tainted_ids().collect::<Vec<_>>());
    }

    /// Termination bound: at most one observation per value in the arena
    #[test]
    fn taint_bounded_by_arena(func in arb_function()) {
        let analysis = TaintAnalysis::new([SOURCE_NAME].into_iter().collect::<TaintSourceSpec>());
        let result = analysis.analyze(&func).unwrap();
        prop_assert!(result.observations.len() <= func.len());
    }

    /// No-seed idempotence: an empty spec yields an empty result for any
    /// function
    #[test]
    fn empty_spec_yields_nothing(func in arb_function()) {
        let analysis = TaintAnalysis::new(TaintSourceSpec::new());
        let result = analysis.analyze(&func).unwrap();
        prop_assert!(result.is_empty());
        prop_assert!(result.observations.is_empty());
        prop_assert!(result.seeds.is_empty());
    }

    /// Source exclusion: a spec naming no callee that appears resolves to an
    /// empty result
    #[test]
    fn unmatched_spec_yields_nothing(func in arb_function()) {
        let analysis = TaintAnalysis::new(
            ["never_called"].into_iter().collect::<TaintSourceSpec>(),
        );
        let result = analysis.analyze(&func).unwrap();
        prop_assert!(result.seeds.is_empty());
        prop_assert!(result.is_empty());
    }

    /// Determinism: analyzing the same function twice produces identical
    /// results
    #[test]
    fn analysis_is_deterministic(func in arb_function()) {
        let analysis = TaintAnalysis::new([SOURCE_NAME].into_iter().collect::<TaintSourceSpec>());
        let first = analysis.analyze(&func).unwrap();
        let second = analysis.analyze(&func).unwrap();
        prop_assert_eq!(first, second);
    }
}
