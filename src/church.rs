//! Church-numeral inputs.

use crate::error::Result;
use crate::parser::parse;
use crate::pool::CellPool;
use crate::term::{Node, TermId};

pub use crate::traverse::count_applications;

/// `λn.λf.λx. n f (n f x)`
pub const DOUBLER: &str = "(L 3.(L 1.(L 2.((3 1) ((3 1) 2)))))";

/// Surface text of the numeral `n`: `(L 1.(L 2.(1 (1 ... 2))))`.
pub fn church_numeral_text(n: usize) -> String {
    let mut text = String::with_capacity(10 + 4 * n + 3);
    text.push_str("(L 1.(L 2.");
    for _ in 0..n {
        text.push_str("(1 ");
    }
    text.push('2');
    for _ in 0..n {
        text.push(')');
    }
    text.push_str("))");
    text
}

pub fn church_numeral(pool: &mut CellPool, n: usize) -> Result<TermId> {
    parse(pool, &church_numeral_text(n))
}

pub fn doubler(pool: &mut CellPool) -> Result<TermId> {
    parse(pool, DOUBLER)
}

/// The number a term encodes, if it has the shape of a Church numeral
/// (up to renaming of its two binders).
pub fn numeral_value(pool: &CellPool, id: TermId) -> Option<usize> {
    let Node::Abs { binder: f, body } = *pool.node(id) else {
        return None;
    };
    let Node::Abs { binder: x, body } = *pool.node(body) else {
        return None;
    };
    if f == x {
        return None;
    }

    let mut n = 0;
    let mut cur = body;
    loop {
        match *pool.node(cur) {
            Node::Var(v) if v == x => return Some(n),
            Node::App { func, arg } if *pool.node(func) == Node::Var(f) => {
                n += 1;
                cur = arg;
            }
            _ => return None,
        }
    }
}
