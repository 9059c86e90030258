//! LL(1) recursive-descent parser for the textual term syntax.
//!
//! ```text
//! term ::= VAR | '(' 'L' VAR '.' term ')' | '(' term term ')'
//! VAR  ::= digit+
//! ```
//!
//! A parse either consumes the whole input and yields a pool-resident term,
//! or fails without leaving any cells allocated.

use crate::error::{LexpError, Result};
use crate::lexer::{Lexer, Spanned, Token};
use crate::pool::CellPool;
use crate::term::{Term, TermId, Var, MAX_TREE_HEIGHT};
use std::str::FromStr;
use tracing::debug;

/// Parse `text` into a term allocated in `pool`.
pub fn parse(pool: &mut CellPool, text: &str) -> Result<TermId> {
    let mut parser = Parser {
        lexer: Lexer::new(text),
        pool,
    };

    let term = parser.term(0).map_err(|err| {
        debug!(input = text, error = %err, "failed to parse term");
        err
    })?;

    match parser.lexer.next_token() {
        Ok(Spanned {
            token: Token::End, ..
        }) => Ok(term),
        Ok(Spanned { position, .. }) => {
            parser.discard(term);
            Err(LexpError::TrailingInput { position })
        }
        Err(err) => {
            parser.discard(term);
            Err(err)
        }
    }
}

struct Parser<'a, 'p> {
    lexer: Lexer<'a>,
    pool: &'p mut CellPool,
}

impl Parser<'_, '_> {
    fn term(&mut self, depth: usize) -> Result<TermId> {
        if depth >= MAX_TREE_HEIGHT {
            return Err(LexpError::TooDeep {
                limit: MAX_TREE_HEIGHT,
            });
        }

        let next = self.lexer.next_token()?;
        match next.token {
            Token::Var(v) => self.pool.var(v),
            Token::LParen => {
                let peek = self.lexer.peek()?;
                match peek.token {
                    Token::Lambda => self.abstraction(depth),
                    Token::Var(_) | Token::LParen => self.application(depth),
                    _ => Err(unexpected("'L', a variable or '('", peek)),
                }
            }
            Token::End if depth == 0 => Err(LexpError::EmptyInput),
            _ => Err(unexpected("a term", next)),
        }
    }

    // '(' already consumed
    fn abstraction(&mut self, depth: usize) -> Result<TermId> {
        self.expect(Token::Lambda, "'L'")?;
        let binder = self.expect_var()?;
        self.expect(Token::Dot, "'.'")?;

        let body = self.term(depth + 1)?;
        if let Err(err) = self.expect(Token::RParen, "')'") {
            self.discard(body);
            return Err(err);
        }

        self.pool.abs(binder, body).map_err(|err| {
            self.discard(body);
            err
        })
    }

    // '(' already consumed
    fn application(&mut self, depth: usize) -> Result<TermId> {
        let func = self.term(depth + 1)?;
        let arg = match self.term(depth + 1) {
            Ok(arg) => arg,
            Err(err) => {
                self.discard(func);
                return Err(err);
            }
        };

        if let Err(err) = self.expect(Token::RParen, "')'") {
            self.discard(func);
            self.discard(arg);
            return Err(err);
        }

        self.pool.app(func, arg).map_err(|err| {
            self.discard(func);
            self.discard(arg);
            err
        })
    }

    fn expect(&mut self, want: Token, expected: &'static str) -> Result<Spanned> {
        let next = self.lexer.next_token()?;
        if next.token == want {
            Ok(next)
        } else {
            Err(unexpected(expected, next))
        }
    }

    fn expect_var(&mut self) -> Result<Var> {
        let next = self.lexer.next_token()?;
        match next.token {
            Token::Var(v) => Ok(v),
            _ => Err(unexpected("a variable", next)),
        }
    }

    fn discard(&mut self, id: TermId) {
        let _ = self.pool.prune(id);
    }
}

fn unexpected(expected: &'static str, found: Spanned) -> LexpError {
    LexpError::UnexpectedToken {
        position: found.position,
        expected,
        found: found.token.to_string(),
    }
}

impl FromStr for Term {
    type Err = LexpError;

    fn from_str(text: &str) -> Result<Self> {
        let mut pool = CellPool::new();
        let id = parse(&mut pool, text)?;
        Ok(Term::from_pool(&pool, id))
    }
}
