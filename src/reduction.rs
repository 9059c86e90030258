//! Normal-order β-reduction (leftmost-outermost strategy) with step and cell
//! budgets.
//!
//! Terms are rewritten in place: contracting a redex overwrites the redex cell
//! with the contractum, so the parent's handle stays valid and the root handle
//! of the term never changes.

use crate::error::{LexpError, Result};
use crate::pool::CellPool;
use crate::subst::substitute;
use crate::term::{Node, TermId, TermType, MAX_TREE_HEIGHT};
use crate::traverse::shape;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace, warn};

/// Redex selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Leftmost-outermost
    #[default]
    Canonical,
    /// Leftmost-innermost. Declared for interface compatibility; rejected by
    /// every reduction entry point.
    Innermost,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Canonical => "canonical",
            Strategy::Innermost => "innermost",
        }
    }

    fn ensure_supported(self) -> Result<()> {
        match self {
            Strategy::Canonical => Ok(()),
            Strategy::Innermost => Err(LexpError::UnsupportedStrategy(self.name())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "canonical" | "normal" | "leftmost-outermost" => Ok(Strategy::Canonical),
            "innermost" => Ok(Strategy::Innermost),
            other => Err(format!("unknown reduction strategy '{}'", other)),
        }
    }
}

/// Configuration for reduction
#[derive(Debug, Clone)]
pub struct ReductionConfig {
    pub strategy: Strategy,
    /// 0 = unbounded
    pub max_steps: usize,
    /// 0 = unbounded
    pub max_cells: usize,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        ReductionConfig {
            strategy: Strategy::Canonical,
            max_steps: 1000,
            max_cells: 1000,
        }
    }
}

/// Why a reduction run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    NormalForm,
    StepLimit,
    CellLimit,
    HeightLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StopReason::NormalForm => "normal form",
            StopReason::StepLimit => "step limit",
            StopReason::CellLimit => "cell limit",
            StopReason::HeightLimit => "height limit",
        };
        f.write_str(name)
    }
}

/// Result of a reduction run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reduction {
    pub steps: usize,
    pub stop: StopReason,
}

impl Reduction {
    /// Whether the term reached normal form
    pub fn converged(&self) -> bool {
        self.stop == StopReason::NormalForm
    }
}

/// Outcome of a single reduction step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Reduced,
    NoRedex,
}

/// Normal-order reducer
pub struct Reducer {
    config: ReductionConfig,
}

impl Reducer {
    pub fn new(config: ReductionConfig) -> Self {
        Reducer { config }
    }

    /// Reduce `term` in place until normal form or a budget runs out.
    ///
    /// Before every step the term is measured; the run stops when it holds
    /// more than `max_cells` cells or is taller than [`MAX_TREE_HEIGHT`].
    /// Hitting a budget is not an error: the term is left as it is and the
    /// returned step count tells how far reduction got.
    pub fn reduce(&self, pool: &mut CellPool, term: TermId) -> Result<Reduction> {
        let ReductionConfig {
            strategy,
            max_steps,
            max_cells,
        } = self.config;
        strategy.ensure_supported()?;

        let mut steps = 0;
        let stop = loop {
            if max_steps > 0 && steps >= max_steps {
                break StopReason::StepLimit;
            }

            let current = shape(pool, term);
            if max_cells > 0 && current.cells > max_cells {
                break StopReason::CellLimit;
            }
            if current.height > MAX_TREE_HEIGHT {
                warn!(
                    height = current.height,
                    limit = MAX_TREE_HEIGHT,
                    "term grew too tall; stopping reduction"
                );
                break StopReason::HeightLimit;
            }

            match Self::step(pool, term, strategy)? {
                Step::Reduced => {
                    steps += 1;
                    trace!(
                        step = steps,
                        cells = current.cells,
                        term = %crate::render::display(pool, term),
                        "contracted redex"
                    );
                }
                Step::NoRedex => break StopReason::NormalForm,
            }
        };

        debug!(steps, stop = %stop, "reduction finished");
        Ok(Reduction { steps, stop })
    }

    /// Contract the next redex chosen by `strategy`.
    pub fn step(pool: &mut CellPool, term: TermId, strategy: Strategy) -> Result<Step> {
        let redex = match Self::find_redex(pool, term, strategy)? {
            Some(redex) => redex,
            None => return Ok(Step::NoRedex),
        };

        if contract(pool, redex)? {
            Ok(Step::Reduced)
        } else {
            unreachable!("redex search returned {} which is not a redex", redex)
        }
    }

    /// Locate the next redex, `None` when the term is in normal form.
    pub fn find_redex(
        pool: &CellPool,
        term: TermId,
        strategy: Strategy,
    ) -> Result<Option<TermId>> {
        strategy.ensure_supported()?;
        Ok(leftmost_outermost(pool, term))
    }
}

fn leftmost_outermost(pool: &CellPool, id: TermId) -> Option<TermId> {
    match *pool.node(id) {
        Node::Var(_) => None,
        Node::Abs { body, .. } => leftmost_outermost(pool, body),
        Node::App { func, arg } => {
            if pool.node(func).ty() == TermType::Abs {
                return Some(id);
            }
            leftmost_outermost(pool, func).or_else(|| leftmost_outermost(pool, arg))
        }
    }
}

/// Contract the redex `(λv.body) arg` at `redex` in place.
///
/// Returns `false` when `redex` is not a redex.
pub fn contract(pool: &mut CellPool, redex: TermId) -> Result<bool> {
    let Node::App { func, arg } = *pool.node(redex) else {
        return Ok(false);
    };
    let Node::Abs { binder, body } = *pool.node(func) else {
        return Ok(false);
    };

    let result = substitute(pool, body, binder, arg, None)?;

    pool.transplant(result, redex)?;
    pool.release(func)?;
    pool.prune(arg)?;
    Ok(true)
}

/// Reduce with explicit budgets, returning the number of steps performed.
pub fn beta(
    pool: &mut CellPool,
    term: TermId,
    strategy: Strategy,
    max_steps: usize,
    max_cells: usize,
) -> Result<usize> {
    let reducer = Reducer::new(ReductionConfig {
        strategy,
        max_steps,
        max_cells,
    });
    Ok(reducer.reduce(pool, term)?.steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equiv::alpha_equivalent;
    use crate::parser::parse;
    use crate::render::render;
    use crate::traverse::count_cells;

    const OMEGA: &str = "((L 1.(1 1)) (L 1.(1 1)))";

    fn unbounded() -> ReductionConfig {
        ReductionConfig {
            strategy: Strategy::Canonical,
            max_steps: 0,
            max_cells: 0,
        }
    }

    #[test]
    fn test_identity_reduction() {
        // (L 1.1) (2 3) -> (2 3)
        let mut pool = CellPool::new();
        let term = parse(&mut pool, "((L 1.1) (2 3))").unwrap();

        let result = Reducer::new(unbounded()).reduce(&mut pool, term).unwrap();

        assert!(result.converged());
        assert_eq!(result.steps, 1);
        assert_eq!(render(&pool, term), "(2 3)");
        assert_eq!(pool.live(), 3);
    }

    #[test]
    fn test_normal_form_takes_no_steps() {
        let mut pool = CellPool::new();
        let term = parse(&mut pool, "(L 1.(1 (L 2.2)))").unwrap();
        let result = Reducer::new(unbounded()).reduce(&mut pool, term).unwrap();
        assert_eq!(
            result,
            Reduction {
                steps: 0,
                stop: StopReason::NormalForm
            }
        );
    }

    #[test]
    fn test_church_numeral() {
        // 2 f x -> f (f x)
        let mut pool = CellPool::new();
        let term = parse(&mut pool, "(((L 1.(L 2.(1 (1 2)))) 5) 6)").unwrap();

        let result = Reducer::new(unbounded()).reduce(&mut pool, term).unwrap();

        assert!(result.converged());
        assert_eq!(result.steps, 2);
        assert_eq!(render(&pool, term), "(5 (5 6))");
    }

    #[test]
    fn test_reduces_under_abstraction() {
        let mut pool = CellPool::new();
        let term = parse(&mut pool, "(L 1.((L 2.2) 1))").unwrap();
        let steps = beta(&mut pool, term, Strategy::Canonical, 0, 0).unwrap();
        assert_eq!(steps, 1);

        let expected = parse(&mut pool, "(L 9.9)").unwrap();
        assert!(alpha_equivalent(&pool, term, expected));
    }

    #[test]
    fn test_leftmost_outermost_order() {
        let mut pool = CellPool::new();

        let root = parse(&mut pool, "((L 1.1) ((L 2.2) 3))").unwrap();
        assert_eq!(
            Reducer::find_redex(&pool, root, Strategy::Canonical).unwrap(),
            Some(root)
        );

        let term = parse(&mut pool, "(((L 1.1) 2) ((L 3.3) 4))").unwrap();
        let redex = Reducer::find_redex(&pool, term, Strategy::Canonical)
            .unwrap()
            .unwrap();
        assert_eq!(render(&pool, redex), "((L 1.1) 2)");

        let term = parse(&mut pool, "(1 ((L 2.2) 3))").unwrap();
        let redex = Reducer::find_redex(&pool, term, Strategy::Canonical)
            .unwrap()
            .unwrap();
        assert_eq!(render(&pool, redex), "((L 2.2) 3)");

        let normal = parse(&mut pool, "(1 (L 2.(2 2)))").unwrap();
        assert_eq!(
            Reducer::find_redex(&pool, normal, Strategy::Canonical).unwrap(),
            None
        );
    }

    #[test]
    fn test_lazy_argument_discarded() {
        // The diverging argument is thrown away before it is ever reduced.
        let mut pool = CellPool::new();
        let term = parse(&mut pool, &format!("((L 1.(L 2.2)) {})", OMEGA)).unwrap();

        let result = Reducer::new(ReductionConfig::default())
            .reduce(&mut pool, term)
            .unwrap();

        assert!(result.converged());
        assert_eq!(result.steps, 1);
        assert_eq!(pool.live(), 2);
    }

    #[test]
    fn test_step_limit_on_omega() {
        let mut pool = CellPool::new();
        let term = parse(&mut pool, OMEGA).unwrap();
        let original = parse(&mut pool, OMEGA).unwrap();

        let steps = beta(&mut pool, term, Strategy::Canonical, 1, 100).unwrap();
        assert_eq!(steps, 1);
        assert!(alpha_equivalent(&pool, term, original));

        let steps = beta(&mut pool, term, Strategy::Canonical, 25, 100).unwrap();
        assert_eq!(steps, 25);
        assert_eq!(count_cells(&pool, term), 9);
    }

    #[test]
    fn test_cell_limit_stops_growth() {
        // Each step adds a copy of the argument.
        let mut pool = CellPool::new();
        let term = parse(&mut pool, "((L 1.((1 1) 1)) (L 1.((1 1) 1)))").unwrap();

        let result = Reducer::new(ReductionConfig {
            strategy: Strategy::Canonical,
            max_steps: 0,
            max_cells: 60,
        })
        .reduce(&mut pool, term)
        .unwrap();

        assert_eq!(result.stop, StopReason::CellLimit);
        assert!(result.steps > 0);
        assert!(count_cells(&pool, term) > 60);
    }

    #[test]
    fn test_innermost_rejected() {
        let mut pool = CellPool::new();
        let term = parse(&mut pool, "((L 1.1) 2)").unwrap();

        let err = beta(&mut pool, term, Strategy::Innermost, 0, 0).unwrap_err();
        assert_eq!(err, LexpError::UnsupportedStrategy("innermost"));
        assert!(Reducer::find_redex(&pool, term, Strategy::Innermost).is_err());
        assert_eq!(render(&pool, term), "((L 1.1) 2)");
    }

    #[test]
    fn test_contract_non_redex() {
        let mut pool = CellPool::new();
        let term = parse(&mut pool, "(1 2)").unwrap();
        assert!(!contract(&mut pool, term).unwrap());
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("canonical".parse::<Strategy>(), Ok(Strategy::Canonical));
        assert_eq!("Innermost".parse::<Strategy>(), Ok(Strategy::Innermost));
        assert!("eager".parse::<Strategy>().is_err());
    }
}
