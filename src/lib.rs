//! Pool-backed lambda calculus engine.
//!
//! This library provides:
//! - A cell pool with free-list recycling and generation-checked handles
//! - A parser and a bounded-buffer printer for the `(L v.body)` / `(f a)` syntax
//! - Capture-avoiding substitution and normal-order reduction with step and
//!   cell budgets
//! - Alpha-equivalence, canonical naming and a structural distance score
//! - Parallel batch reduction with one pool per worker
//!
//! # Example
//!
//! ```
//! use lexp_rs::Engine;
//!
//! let mut engine = Engine::new();
//! let out = engine.reduce_text("((L 1.(L 2.1)) 3)").unwrap();
//! assert_eq!(out.reduction.steps, 1);
//! assert_eq!(engine.pool().live(), 0);
//! ```

pub mod error;
pub mod term;
pub mod pool;
pub mod lexer;
pub mod parser;
pub mod render;
pub mod traverse;
pub mod subst;
pub mod reduction;
pub mod equiv;
pub mod distance;
pub mod canon;
pub mod church;
pub mod engine;
pub mod schema;
pub mod batch;

pub use error::{LexpError, Result};
pub use term::{Node, Term, TermId, TermType, Var, MAX_ABST_DEPTH, MAX_TREE_HEIGHT};
pub use pool::{CellPool, PoolConfig, PoolInfo};
pub use parser::parse;
pub use render::{render, render_into};
pub use traverse::{count_applications, count_cells, walk, Phase, Visitor, Walk};
pub use subst::substitute;
pub use reduction::{beta, Reducer, Reduction, ReductionConfig, StopReason, Strategy};
pub use equiv::alpha_equivalent;
pub use distance::distance;
pub use canon::canonicalize;
pub use engine::{Engine, TextReduction};
pub use schema::ReductionRecord;
pub use batch::{run_batch, BatchConfig, BatchStats};
