//! Lambda calculus term representation.
//!
//! Terms live in a [`CellPool`](crate::pool::CellPool) and are addressed by
//! [`TermId`] handles. The owned [`Term`] tree is the high-level form used to
//! build inputs and to inspect results.

use crate::error::Result;
use crate::pool::CellPool;
use std::fmt;

/// Variable identifier.
pub type Var = u64;

/// Binder-scope stack ceiling of the distance annotation pass.
pub const MAX_ABST_DEPTH: usize = 1024;

/// Maximum term height. Bounds the breadth profile of the distance metric and
/// every recursive algorithm over terms.
pub const MAX_TREE_HEIGHT: usize = 2048;

/// Term type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermType {
    Var,
    Abs,
    App,
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TermType::Var => "variable",
            TermType::Abs => "abstraction",
            TermType::App => "application",
        };
        f.write_str(name)
    }
}

/// Handle to a cell in a [`CellPool`].
///
/// The generation is bumped every time the slot is released, so a handle that
/// outlives its cell is recognised instead of silently reading a recycled one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TermId {
    index: u32,
    generation: u32,
}

impl TermId {
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        TermId { index, generation }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    #[inline]
    pub(crate) const fn raw_index(self) -> u32 {
        self.index
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

/// Payload of a live cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Var(Var),
    Abs { binder: Var, body: TermId },
    App { func: TermId, arg: TermId },
}

impl Node {
    #[inline]
    pub fn ty(&self) -> TermType {
        match self {
            Node::Var(_) => TermType::Var,
            Node::Abs { .. } => TermType::Abs,
            Node::App { .. } => TermType::App,
        }
    }
}

/// Owned term tree (for building inputs and inspecting results)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Var(Var),
    Abs(Var, Box<Term>),
    App(Box<Term>, Box<Term>),
}

impl Term {
    pub fn var(v: Var) -> Self {
        Term::Var(v)
    }

    pub fn abs(binder: Var, body: Term) -> Self {
        Term::Abs(binder, Box::new(body))
    }

    pub fn app(func: Term, arg: Term) -> Self {
        Term::App(Box::new(func), Box::new(arg))
    }

    /// Allocate this tree in the pool
    pub fn to_pool(&self, pool: &mut CellPool) -> Result<TermId> {
        match self {
            Term::Var(v) => pool.var(*v),
            Term::Abs(binder, body) => {
                let body_id = body.to_pool(pool)?;
                pool.abs(*binder, body_id).map_err(|err| {
                    let _ = pool.prune(body_id);
                    err
                })
            }
            Term::App(func, arg) => {
                let func_id = func.to_pool(pool)?;
                let arg_id = match arg.to_pool(pool) {
                    Ok(id) => id,
                    Err(err) => {
                        let _ = pool.prune(func_id);
                        return Err(err);
                    }
                };
                pool.app(func_id, arg_id).map_err(|err| {
                    let _ = pool.prune(func_id);
                    let _ = pool.prune(arg_id);
                    err
                })
            }
        }
    }

    /// Read a pool-resident term back into an owned tree
    pub fn from_pool(pool: &CellPool, id: TermId) -> Self {
        match *pool.node(id) {
            Node::Var(v) => Term::Var(v),
            Node::Abs { binder, body } => Term::abs(binder, Self::from_pool(pool, body)),
            Node::App { func, arg } => {
                Term::app(Self::from_pool(pool, func), Self::from_pool(pool, arg))
            }
        }
    }

    /// Compute term size (number of nodes)
    pub fn size(&self) -> usize {
        match self {
            Term::Var(_) => 1,
            Term::Abs(_, body) => 1 + body.size(),
            Term::App(func, arg) => 1 + func.size() + arg.size(),
        }
    }
}

/// Renders the surface syntax accepted by the parser.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(v) => write!(f, "{}", v),
            Term::Abs(binder, body) => write!(f, "(L {}.{})", binder, body),
            Term::App(func, arg) => write!(f, "({} {})", func, arg),
        }
    }
}
