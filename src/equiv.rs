//! Alpha-equivalence of pool-resident terms.

use crate::pool::CellPool;
use crate::term::{Node, TermId, Var};

/// Structural equality up to consistent renaming of bound variables.
///
/// Both terms are walked in lockstep while a scope list of binders is kept
/// per side. A variable pair is equivalent when both resolve to the same
/// scope frame, or when both are free and carry the same identifier.
pub fn alpha_equivalent(pool: &CellPool, a: TermId, b: TermId) -> bool {
    let mut left = Vec::new();
    let mut right = Vec::new();
    equiv_rec(pool, a, &mut left, b, &mut right)
}

fn equiv_rec(
    pool: &CellPool,
    a: TermId,
    left: &mut Vec<Var>,
    b: TermId,
    right: &mut Vec<Var>,
) -> bool {
    match (*pool.node(a), *pool.node(b)) {
        (Node::App { func: f1, arg: a1 }, Node::App { func: f2, arg: a2 }) => {
            equiv_rec(pool, f1, left, f2, right) && equiv_rec(pool, a1, left, a2, right)
        }
        (
            Node::Abs {
                binder: b1,
                body: body1,
            },
            Node::Abs {
                binder: b2,
                body: body2,
            },
        ) => {
            left.push(b1);
            right.push(b2);
            let equal = equiv_rec(pool, body1, left, body2, right);
            left.pop();
            right.pop();
            equal
        }
        (Node::Var(v1), Node::Var(v2)) => {
            // innermost frame first
            for (&x1, &x2) in left.iter().rev().zip(right.iter().rev()) {
                match (x1 == v1, x2 == v2) {
                    (true, true) => return true,
                    (false, false) => continue,
                    _ => return false,
                }
            }
            v1 == v2
        }
        _ => false,
    }
}
