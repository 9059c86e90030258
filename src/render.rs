//! Term rendering to the textual syntax.
//!
//! [`render_into`] writes into a caller-supplied fixed buffer without
//! allocating: each recursive step only sees the capacity left after its
//! predecessors, and the buffer is NUL-terminated after every write, so a
//! buffer that is too small fails cleanly with a terminated prefix.

use crate::error::{LexpError, Result};
use crate::pool::CellPool;
use crate::term::{Node, TermId, Var};
use std::fmt;

/// Digits of `Var::MAX`
const VAR_DIGITS: usize = 20;

/// Render `id` into `buf`, returning the number of bytes written (excluding
/// the terminating NUL).
pub fn render_into(pool: &CellPool, id: TermId, buf: &mut [u8]) -> Result<usize> {
    if buf.is_empty() {
        return Err(LexpError::BufferOverflow { capacity: 0 });
    }
    let capacity = buf.len();
    render_bounded(pool, id, buf).ok_or(LexpError::BufferOverflow { capacity })
}

fn render_bounded(pool: &CellPool, id: TermId, buf: &mut [u8]) -> Option<usize> {
    let mut scratch = [0u8; VAR_DIGITS];

    match *pool.node(id) {
        Node::Var(v) => proceed_with(buf, format_var(v, &mut scratch)),
        Node::Abs { binder, body } => {
            let mut written = proceed_with(buf, b"(L ")?;
            written += proceed_with(&mut buf[written..], format_var(binder, &mut scratch))?;
            written += proceed_with(&mut buf[written..], b".")?;
            written += render_bounded(pool, body, &mut buf[written..])?;
            written += proceed_with(&mut buf[written..], b")")?;
            Some(written)
        }
        Node::App { func, arg } => {
            let mut written = proceed_with(buf, b"(")?;
            written += render_bounded(pool, func, &mut buf[written..])?;
            written += proceed_with(&mut buf[written..], b" ")?;
            written += render_bounded(pool, arg, &mut buf[written..])?;
            written += proceed_with(&mut buf[written..], b")")?;
            Some(written)
        }
    }
}

/// Copy as much of `text` as fits, keeping room for the terminating NUL.
/// `None` means the text was truncated.
fn proceed_with(buf: &mut [u8], text: &[u8]) -> Option<usize> {
    let room = buf.len().checked_sub(1)?;
    let n = text.len().min(room);
    buf[..n].copy_from_slice(&text[..n]);
    buf[n] = 0;
    (n == text.len()).then_some(n)
}

fn format_var(v: Var, scratch: &mut [u8; VAR_DIGITS]) -> &[u8] {
    let mut i = VAR_DIGITS;
    let mut rest = v;
    loop {
        i -= 1;
        scratch[i] = b'0' + (rest % 10) as u8;
        rest /= 10;
        if rest == 0 {
            break;
        }
    }
    &scratch[i..]
}

/// Render `id` into a fresh string.
pub fn render(pool: &CellPool, id: TermId) -> String {
    let mut output = String::with_capacity(64);
    render_term_impl(pool, id, &mut output);
    output
}

fn render_term_impl(pool: &CellPool, id: TermId, output: &mut String) {
    match *pool.node(id) {
        Node::Var(v) => output.push_str(&v.to_string()),
        Node::Abs { binder, body } => {
            output.push_str("(L ");
            output.push_str(&binder.to_string());
            output.push('.');
            render_term_impl(pool, body, output);
            output.push(')');
        }
        Node::App { func, arg } => {
            output.push('(');
            render_term_impl(pool, func, output);
            output.push(' ');
            render_term_impl(pool, arg, output);
            output.push(')');
        }
    }
}

/// `Display` adapter for a pool-resident term
pub struct Rendered<'a> {
    pool: &'a CellPool,
    id: TermId,
}

pub fn display(pool: &CellPool, id: TermId) -> Rendered<'_> {
    Rendered { pool, id }
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self.pool, self.id))
    }
}
