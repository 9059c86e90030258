//! Property-based tests for the lambda calculus engine
//!
//! Terms are generated as owned trees and moved into a fresh pool per case.

use lexp_rs::Strategy as RedexOrder;
use lexp_rs::{
    alpha_equivalent, beta, canonicalize, distance, parse, render, substitute, CellPool,
    StopReason, Reducer, ReductionConfig, Term, Var,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

// ===== Strategies for generating test data =====

fn arb_term() -> impl Strategy<Value = Term> {
    let leaf = (1..=6u64).prop_map(Term::var);

    leaf.prop_recursive(6, 64, 2, |inner| {
        prop_oneof![
            (1..=4u64, inner.clone()).prop_map(|(binder, body)| Term::abs(binder, body)),
            (inner.clone(), inner).prop_map(|(func, arg)| Term::app(func, arg)),
        ]
    })
}

fn free_vars(term: &Term) -> BTreeSet<Var> {
    fn go(term: &Term, bound: &mut Vec<Var>, out: &mut BTreeSet<Var>) {
        match term {
            Term::Var(v) => {
                if !bound.contains(v) {
                    out.insert(*v);
                }
            }
            Term::Abs(binder, body) => {
                bound.push(*binder);
                go(body, bound, out);
                bound.pop();
            }
            Term::App(func, arg) => {
                go(func, bound, out);
                go(arg, bound, out);
            }
        }
    }
    let mut out = BTreeSet::new();
    go(term, &mut Vec::new(), &mut out);
    out
}

// ===== Property Tests =====

proptest! {
    #[test]
    fn prop_render_parse_round_trip(term in arb_term()) {
        let mut pool = CellPool::new();
        let id = term.to_pool(&mut pool).unwrap();
        let text = render(&pool, id);
        prop_assert_eq!(&text, &term.to_string());

        let reparsed = parse(&mut pool, &text).unwrap();
        prop_assert!(alpha_equivalent(&pool, id, reparsed));
        prop_assert_eq!(Term::from_pool(&pool, reparsed), term);
    }

    #[test]
    fn prop_copy_is_equivalent_and_independent(term in arb_term()) {
        let mut pool = CellPool::new();
        let id = term.to_pool(&mut pool).unwrap();
        let copy = pool.copy(id).unwrap();
        prop_assert!(alpha_equivalent(&pool, id, copy));

        pool.prune(id).unwrap();
        prop_assert_eq!(Term::from_pool(&pool, copy), term.clone());
        prop_assert_eq!(pool.live(), term.size());
    }

    #[test]
    fn prop_self_distance_is_zero(term in arb_term()) {
        let mut pool = CellPool::new();
        let id = term.to_pool(&mut pool).unwrap();
        let copy = pool.copy(id).unwrap();
        prop_assert_eq!(distance(&mut pool, id, copy), 0);
    }

    #[test]
    fn prop_distance_is_symmetric(a in arb_term(), b in arb_term()) {
        let mut pool = CellPool::new();
        let a = a.to_pool(&mut pool).unwrap();
        let b = b.to_pool(&mut pool).unwrap();
        let ab = distance(&mut pool, a, b);
        let ba = distance(&mut pool, b, a);
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn prop_alpha_equivalent_terms_are_at_distance_zero(term in arb_term()) {
        let mut pool = CellPool::new();
        let id = term.to_pool(&mut pool).unwrap();
        let renamed = pool.copy(id).unwrap();
        prop_assume!(canonicalize(&mut pool, renamed));

        prop_assert!(alpha_equivalent(&pool, id, renamed));
        prop_assert_eq!(distance(&mut pool, id, renamed), 0);
    }

    #[test]
    fn prop_step_budget_respected(term in arb_term(), max_steps in 1..40usize) {
        let mut pool = CellPool::new();
        let id = term.to_pool(&mut pool).unwrap();
        let result = Reducer::new(ReductionConfig {
            strategy: RedexOrder::Canonical,
            max_steps,
            max_cells: 400,
        })
        .reduce(&mut pool, id)
        .unwrap();

        prop_assert!(result.steps <= max_steps);
        match result.stop {
            StopReason::StepLimit => prop_assert_eq!(result.steps, max_steps),
            StopReason::NormalForm => {
                prop_assert_eq!(Reducer::find_redex(&pool, id, RedexOrder::Canonical).unwrap(), None)
            }
            StopReason::CellLimit | StopReason::HeightLimit => {}
        }
    }

    #[test]
    fn prop_identity_application_yields_argument(arg in arb_term()) {
        let mut pool = CellPool::new();
        let arg_id = arg.to_pool(&mut pool).unwrap();
        let expected = pool.copy(arg_id).unwrap();
        let identity = parse(&mut pool, "(L 1.1)").unwrap();
        let redex = pool.app(identity, arg_id).unwrap();

        let steps = beta(&mut pool, redex, RedexOrder::Canonical, 1, 0).unwrap();
        prop_assert_eq!(steps, 1);
        prop_assert!(alpha_equivalent(&pool, redex, expected));
    }

    #[test]
    fn prop_substitution_never_captures(body in arb_term(), target in 1..=6u64, free in 1..=6u64) {
        let mut expected = free_vars(&body);
        if expected.remove(&target) {
            expected.insert(free);
        }

        let mut pool = CellPool::new();
        let body_id = body.to_pool(&mut pool).unwrap();
        let replacement = pool.var(free).unwrap();
        let result = substitute(&mut pool, body_id, target, replacement, None).unwrap();

        prop_assert_eq!(free_vars(&Term::from_pool(&pool, result)), expected);
    }
}
