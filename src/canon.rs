//! Canonical naming of bound variables.
//!
//! After canonicalization the binder at abstraction depth `d` is named
//! `base + d`, where `base` is the largest free variable of the term. Closed
//! terms that are alpha-equivalent become identical cell for cell.

use crate::pool::CellPool;
use crate::term::{Node, TermId, Var, MAX_ABST_DEPTH};
use crate::traverse::{walk, Phase, Visitor, Walk};
use tracing::warn;

#[derive(Default)]
struct Renamer {
    scope: Vec<Var>,
    max_free: Var,
    // (cell, 1-origin depth of the binder it should be named after)
    edits: Vec<(TermId, usize)>,
    too_deep: bool,
}

impl Visitor for Renamer {
    fn visit(&mut self, pool: &CellPool, id: TermId, phase: Phase) -> Walk {
        match (*pool.node(id), phase) {
            (Node::Var(v), _) => {
                match self.scope.iter().rposition(|&binder| binder == v) {
                    Some(i) => self.edits.push((id, i + 1)),
                    None => self.max_free = self.max_free.max(v),
                }
                Walk::Continue
            }
            (Node::Abs { binder, .. }, Phase::Descend) => {
                if self.scope.len() >= MAX_ABST_DEPTH {
                    self.too_deep = true;
                    return Walk::Skip;
                }
                self.scope.push(binder);
                Walk::Continue
            }
            (Node::Abs { .. }, Phase::Ascend) => {
                self.edits.push((id, self.scope.len()));
                self.scope.pop();
                Walk::Continue
            }
            (Node::App { .. }, _) => Walk::Continue,
        }
    }
}

/// Rename every bound variable in place.
///
/// Returns `false`, leaving the term untouched, when abstractions nest deeper
/// than [`MAX_ABST_DEPTH`] or the new names would not fit in a [`Var`].
pub fn canonicalize(pool: &mut CellPool, id: TermId) -> bool {
    let mut renamer = Renamer::default();
    walk(pool, id, &mut renamer);

    if renamer.too_deep {
        warn!(
            limit = MAX_ABST_DEPTH,
            "abstraction nesting too deep; term left as is"
        );
        return false;
    }

    let base = renamer.max_free;
    let deepest = renamer.edits.iter().map(|&(_, d)| d).max().unwrap_or(0);
    if base.checked_add(deepest as Var).is_none() {
        warn!(base, "canonical names would overflow; term left as is");
        return false;
    }

    for (cell, depth) in renamer.edits {
        let name = base + depth as Var;
        let node = match *pool.node(cell) {
            Node::Var(_) => Node::Var(name),
            Node::Abs { body, .. } => Node::Abs { binder: name, body },
            Node::App { .. } => unreachable!("applications are never renamed"),
        };
        pool.set(cell, node);
    }
    true
}
