//! Structural dissimilarity between two terms.
//!
//! Not a metric: the score is tuned as a fitness signal. Variables are
//! compared by binding distance, so renaming bound variables never changes
//! the result; shapes that do not line up (abstraction against application)
//! fall back to comparing per-level node counts.

use crate::pool::CellPool;
use crate::term::{Node, TermId, TermType, Var, MAX_ABST_DEPTH, MAX_TREE_HEIGHT};
use crate::traverse::{count_cells, walk, Phase, Visitor, Walk};
use tracing::warn;

/// Distance between `a` and `b`.
///
/// Both terms are annotated with binding distances first, which is why the
/// pool is borrowed mutably; the terms themselves are not changed.
pub fn distance(pool: &mut CellPool, a: TermId, b: TermId) -> u64 {
    annotate(pool, a);
    annotate(pool, b);
    diff(pool, a, b)
}

/// Store the binding distance of every variable occurrence.
///
/// A bound occurrence gets the number of abstractions between it and its
/// binder (1 for the innermost). A free one gets `-(depth + 1)`, where
/// `depth` is the number of enclosing abstractions. Abstractions nested deeper
/// than [`MAX_ABST_DEPTH`] are not annotated; their variables read as free
/// and compare by identifier.
pub fn annotate(pool: &mut CellPool, id: TermId) {
    let mut scope = Vec::with_capacity(64);
    annotate_rec(pool, id, &mut scope);
}

fn annotate_rec(pool: &mut CellPool, id: TermId, scope: &mut Vec<Var>) {
    match *pool.node(id) {
        Node::Var(v) => {
            let depth = scope.len();
            let bdist = match scope.iter().rposition(|&binder| binder == v) {
                Some(i) => (depth - i) as i64,
                None => -(depth as i64 + 1),
            };
            pool.set_bdist(id, bdist);
        }
        Node::Abs { binder, body } => {
            if scope.len() < MAX_ABST_DEPTH {
                scope.push(binder);
                annotate_rec(pool, body, scope);
                scope.pop();
            } else {
                warn!(
                    limit = MAX_ABST_DEPTH,
                    "abstraction nesting too deep; ignoring the subtree"
                );
                clear_bdist(pool, body);
            }
        }
        Node::App { func, arg } => {
            annotate_rec(pool, func, scope);
            annotate_rec(pool, arg, scope);
        }
    }
}

fn clear_bdist(pool: &mut CellPool, id: TermId) {
    match *pool.node(id) {
        Node::Var(_) => pool.set_bdist(id, 0),
        Node::Abs { body, .. } => clear_bdist(pool, body),
        Node::App { func, arg } => {
            clear_bdist(pool, func);
            clear_bdist(pool, arg);
        }
    }
}

fn diff(pool: &CellPool, a: TermId, b: TermId) -> u64 {
    match (*pool.node(a), *pool.node(b)) {
        (Node::Var(va), Node::Var(vb)) => {
            let wa = pool.bdist(a);
            let wb = pool.bdist(b);
            match (wa > 0, wb > 0) {
                (true, true) => wa.abs_diff(wb),
                // the free side is encoded negative, so this adds magnitudes
                (true, false) => (wa - wb) as u64,
                (false, true) => (wb - wa) as u64,
                (false, false) => va.abs_diff(vb),
            }
        }
        (Node::Var(_), _) => count_cells(pool, b) as u64,
        (_, Node::Var(_)) => count_cells(pool, a) as u64,
        (Node::Abs { body: ba, .. }, Node::Abs { body: bb, .. }) => diff(pool, ba, bb),
        (
            Node::App {
                func: fa,
                arg: aa,
            },
            Node::App {
                func: fb,
                arg: ab,
            },
        ) => diff(pool, fa, fb).saturating_add(diff(pool, aa, ab)),
        _ => {
            let pa = breadth_profile(pool, a);
            let pb = breadth_profile(pool, b);
            let levels = pa.len().max(pb.len());
            (0..levels)
                .map(|level| {
                    let ca = pa.get(level).copied().unwrap_or(0);
                    let cb = pb.get(level).copied().unwrap_or(0);
                    2 + ca.abs_diff(cb) as u64
                })
                .fold(0u64, u64::saturating_add)
        }
    }
}

/// Counts nodes per level, skipping everything at or below `limit`.
struct ProfileCounter {
    depth: usize,
    limit: usize,
    counts: Vec<usize>,
    truncated: bool,
}

impl Visitor for ProfileCounter {
    fn visit(&mut self, pool: &CellPool, id: TermId, phase: Phase) -> Walk {
        match phase {
            Phase::Descend => {
                if self.depth >= self.limit {
                    self.truncated = true;
                    return Walk::Skip;
                }
                if self.counts.len() <= self.depth {
                    self.counts.resize(self.depth + 1, 0);
                }
                self.counts[self.depth] += 1;
                if pool.node(id).ty() != TermType::Var {
                    self.depth += 1;
                }
                Walk::Continue
            }
            Phase::Ascend => {
                self.depth -= 1;
                Walk::Continue
            }
        }
    }
}

/// Number of nodes at each level of the term, root first.
///
/// At most [`MAX_TREE_HEIGHT`] levels are counted; deeper nodes are ignored
/// with a warning and the profile then spans the full ceiling.
pub fn breadth_profile(pool: &CellPool, id: TermId) -> Vec<usize> {
    let mut counter = ProfileCounter {
        depth: 0,
        limit: MAX_TREE_HEIGHT,
        counts: Vec::new(),
        truncated: false,
    };
    walk(pool, id, &mut counter);

    let mut counts = counter.counts;
    if counter.truncated {
        warn!(
            limit = MAX_TREE_HEIGHT,
            "term taller than the breadth profile; ignoring the excess"
        );
        counts.resize(MAX_TREE_HEIGHT, 0);
    }
    counts
}
