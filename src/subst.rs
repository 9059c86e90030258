//! Capture-avoiding substitution.
//!
//! Every abstraction crossed on the way down gets a fresh binder identifier,
//! strictly larger than any identifier occurring in the body, the replacement
//! or the target. A free variable of the replacement can therefore never be
//! captured by a binder of the body.

use crate::error::{LexpError, Result};
use crate::pool::CellPool;
use crate::term::{Node, TermId, Var};

/// Largest variable identifier in the term, binders included.
pub fn max_var(pool: &CellPool, id: TermId) -> Var {
    match *pool.node(id) {
        Node::Var(v) => v,
        Node::Abs { binder, body } => binder.max(max_var(pool, body)),
        Node::App { func, arg } => max_var(pool, func).max(max_var(pool, arg)),
    }
}

/// Rename the free occurrences of `from` in the term to `to`, in place.
///
/// This is a plain rename: `to` must not occur in the term.
pub fn rename_free(pool: &mut CellPool, id: TermId, from: Var, to: Var) {
    match *pool.node(id) {
        Node::Var(v) if v == from => pool.set(id, Node::Var(to)),
        Node::Var(_) => {}
        // `from` is shadowed below this binder
        Node::Abs { binder, .. } if binder == from => {}
        Node::Abs { body, .. } => rename_free(pool, body, from, to),
        Node::App { func, arg } => {
            rename_free(pool, func, from, to);
            rename_free(pool, arg, from, to);
        }
    }
}

/// `body[target := replacement]`.
///
/// Consumes `body`: its cells are reused in place where possible and the
/// returned handle is the root of the result. `replacement` is only read; each
/// occurrence of `target` receives a fresh deep copy of it. `max_hint`, when
/// given, must be at least the largest identifier in `body`, `replacement`
/// and `target`; `None` computes it.
pub fn substitute(
    pool: &mut CellPool,
    body: TermId,
    target: Var,
    replacement: TermId,
    max_hint: Option<Var>,
) -> Result<TermId> {
    let max = match max_hint {
        Some(max) => max,
        None => max_var(pool, body)
            .max(max_var(pool, replacement))
            .max(target),
    };
    subst_rec(pool, body, target, replacement, max)
}

fn subst_rec(
    pool: &mut CellPool,
    id: TermId,
    target: Var,
    replacement: TermId,
    max: Var,
) -> Result<TermId> {
    match *pool.node(id) {
        Node::Var(v) if v == target => {
            let copy = pool.copy(replacement)?;
            pool.release(id)?;
            Ok(copy)
        }
        Node::Var(_) => Ok(id),
        Node::App { func, arg } => {
            let func = subst_rec(pool, func, target, replacement, max)?;
            pool.set(id, Node::App { func, arg });
            let arg = subst_rec(pool, arg, target, replacement, max)?;
            pool.set(id, Node::App { func, arg });
            Ok(id)
        }
        Node::Abs { binder, body } => {
            let fresh = max
                .max(binder)
                .checked_add(1)
                .ok_or(LexpError::FreshVariableOverflow)?;
            rename_free(pool, body, binder, fresh);
            pool.set(
                id,
                Node::Abs {
                    binder: fresh,
                    body,
                },
            );

            let body = subst_rec(pool, body, target, replacement, fresh)?;
            pool.set(
                id,
                Node::Abs {
                    binder: fresh,
                    body,
                },
            );
            Ok(id)
        }
    }
}
