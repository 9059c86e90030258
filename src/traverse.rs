//! Depth-first traversal over pool-resident terms.
//!
//! A [`Visitor`] is called once on the way down to every node
//! ([`Phase::Descend`]) and, for abstractions and applications whose descent
//! returned [`Walk::Continue`], once more on the way up ([`Phase::Ascend`])
//! after all children were walked. Variables have no children and are only
//! ever descended into. Returning [`Walk::Skip`] from a descent prunes the
//! node's children and its ascent.

use crate::pool::CellPool;
use crate::term::{Node, TermId, TermType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Descend,
    Ascend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    Skip,
}

pub trait Visitor {
    fn visit(&mut self, pool: &CellPool, id: TermId, phase: Phase) -> Walk;
}

impl<F> Visitor for F
where
    F: FnMut(&CellPool, TermId, Phase) -> Walk,
{
    fn visit(&mut self, pool: &CellPool, id: TermId, phase: Phase) -> Walk {
        self(pool, id, phase)
    }
}

pub fn walk<V: Visitor + ?Sized>(pool: &CellPool, id: TermId, visitor: &mut V) {
    match *pool.node(id) {
        Node::Var(_) => {
            visitor.visit(pool, id, Phase::Descend);
        }
        Node::Abs { body, .. } => {
            if visitor.visit(pool, id, Phase::Descend) == Walk::Continue {
                walk(pool, body, visitor);
                visitor.visit(pool, id, Phase::Ascend);
            }
        }
        Node::App { func, arg } => {
            if visitor.visit(pool, id, Phase::Descend) == Walk::Continue {
                walk(pool, func, visitor);
                walk(pool, arg, visitor);
                visitor.visit(pool, id, Phase::Ascend);
            }
        }
    }
}

/// Number of cells in the term.
pub fn count_cells(pool: &CellPool, id: TermId) -> usize {
    let mut cells = 0;
    walk(pool, id, &mut |_: &CellPool, _: TermId, phase: Phase| {
        if phase == Phase::Descend {
            cells += 1;
        }
        Walk::Continue
    });
    cells
}

/// Number of application cells in the term.
pub fn count_applications(pool: &CellPool, id: TermId) -> usize {
    let mut applications = 0;
    walk(pool, id, &mut |pool: &CellPool, id: TermId, phase: Phase| {
        if phase == Phase::Descend && pool.node(id).ty() == TermType::App {
            applications += 1;
        }
        Walk::Continue
    });
    applications
}

/// Cell count and height of a term
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shape {
    pub cells: usize,
    pub height: usize,
}

#[derive(Default)]
struct ShapeCounter {
    depth: usize,
    shape: Shape,
}

impl Visitor for ShapeCounter {
    fn visit(&mut self, pool: &CellPool, id: TermId, phase: Phase) -> Walk {
        match phase {
            Phase::Descend => {
                let depth = self.depth + 1;
                self.shape.cells += 1;
                self.shape.height = self.shape.height.max(depth);
                // Variables get no ascent, so only inner nodes keep the level.
                if pool.node(id).ty() != TermType::Var {
                    self.depth = depth;
                }
            }
            Phase::Ascend => self.depth -= 1,
        }
        Walk::Continue
    }
}

/// Cell count and height in a single pass.
pub fn shape(pool: &CellPool, id: TermId) -> Shape {
    let mut counter = ShapeCounter::default();
    walk(pool, id, &mut counter);
    counter.shape
}
