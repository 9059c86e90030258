//! Engine: one cell pool plus default reduction settings.
//!
//! The pool is not shared between threads; run one engine per thread.

use crate::canon;
use crate::distance;
use crate::equiv;
use crate::error::Result;
use crate::parser;
use crate::pool::{CellPool, PoolConfig, PoolInfo};
use crate::reduction::{Reducer, Reduction, ReductionConfig, Strategy};
use crate::render;
use crate::term::{TermId, Var};
use crate::traverse;
use tracing::debug;

/// Outcome of reducing a term given as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReduction {
    pub reduction: Reduction,
    pub result: String,
    pub cells: usize,
}

pub struct Engine {
    pool: CellPool,
    config: ReductionConfig,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default(), ReductionConfig::default())
    }

    pub fn with_config(pool: PoolConfig, config: ReductionConfig) -> Self {
        Engine {
            pool: CellPool::with_config(pool),
            config,
        }
    }

    pub fn pool(&self) -> &CellPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut CellPool {
        &mut self.pool
    }

    pub fn config(&self) -> &ReductionConfig {
        &self.config
    }

    pub fn parse(&mut self, text: &str) -> Result<TermId> {
        parser::parse(&mut self.pool, text)
    }

    pub fn render(&self, id: TermId) -> String {
        render::render(&self.pool, id)
    }

    pub fn render_into(&self, id: TermId, buf: &mut [u8]) -> Result<usize> {
        render::render_into(&self.pool, id, buf)
    }

    pub fn copy(&mut self, id: TermId) -> Result<TermId> {
        self.pool.copy(id)
    }

    /// Free a whole term. The handle is consumed.
    pub fn free(&mut self, id: TermId) -> Result<()> {
        self.pool.prune(id)
    }

    pub fn variable(&mut self, v: Var) -> Result<TermId> {
        self.pool.var(v)
    }

    pub fn abstraction(&mut self, binder: Var, body: TermId) -> Result<TermId> {
        self.pool.abs(binder, body)
    }

    pub fn application(&mut self, func: TermId, arg: TermId) -> Result<TermId> {
        self.pool.app(func, arg)
    }

    /// The variable a 1-origin outward reference `index` denotes under
    /// `binding_level` enclosing abstractions binding `1..=binding_level`.
    ///
    /// References past the outermost binder stay free and keep `index`.
    pub fn bound_or_free_var(&mut self, index: Var, binding_level: Var) -> Result<TermId> {
        let v = if index > binding_level {
            index
        } else {
            binding_level - index + 1
        };
        self.pool.var(v)
    }

    /// Reduce with the engine's default settings.
    pub fn reduce(&mut self, id: TermId) -> Result<Reduction> {
        Reducer::new(self.config.clone()).reduce(&mut self.pool, id)
    }

    pub fn reduce_with(&mut self, id: TermId, config: ReductionConfig) -> Result<Reduction> {
        Reducer::new(config).reduce(&mut self.pool, id)
    }

    /// Bounded reduction returning the number of steps taken.
    pub fn beta(
        &mut self,
        id: TermId,
        strategy: Strategy,
        max_steps: usize,
        max_cells: usize,
    ) -> Result<usize> {
        crate::reduction::beta(&mut self.pool, id, strategy, max_steps, max_cells)
    }

    /// Parse, reduce and render one term, leaving no cells behind.
    pub fn reduce_text(&mut self, text: &str) -> Result<TextReduction> {
        let id = self.parse(text)?;
        let outcome = self.reduce(id).map(|reduction| TextReduction {
            reduction,
            result: self.render(id),
            cells: self.count_cells(id),
        });
        self.free(id)?;

        if let Ok(ref done) = outcome {
            debug!(input = text, steps = done.reduction.steps, "reduced term");
        }
        outcome
    }

    pub fn distance(&mut self, a: TermId, b: TermId) -> u64 {
        distance::distance(&mut self.pool, a, b)
    }

    pub fn alpha_equivalent(&self, a: TermId, b: TermId) -> bool {
        equiv::alpha_equivalent(&self.pool, a, b)
    }

    pub fn canonicalize(&mut self, id: TermId) -> bool {
        canon::canonicalize(&mut self.pool, id)
    }

    pub fn count_cells(&self, id: TermId) -> usize {
        traverse::count_cells(&self.pool, id)
    }

    pub fn pool_info(&self) -> PoolInfo {
        self.pool.info()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
