//! Tokenizer for the textual term syntax.
//!
//! Recognises decimal digit runs, the letter `L`, `(`, `)` and `.`; whitespace
//! separates tokens and is otherwise ignored.

use crate::error::{LexpError, Result};
use crate::term::Var;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    End,
    Var(Var),
    Lambda,
    LParen,
    RParen,
    Dot,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::End => f.write_str("end of input"),
            Token::Var(v) => write!(f, "variable {}", v),
            Token::Lambda => f.write_str("'L'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Dot => f.write_str("'.'"),
        }
    }
}

/// Token with the byte offset it starts at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Lexer {
            src: text.as_bytes(),
            pos: 0,
        }
    }

    /// Byte offset of the cursor
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Look at the next token without consuming it.
    pub fn peek(&self) -> Result<Spanned> {
        let mut probe = Lexer {
            src: self.src,
            pos: self.pos,
        };
        probe.next_token()
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Result<Spanned> {
        self.skip_whitespace();
        let position = self.pos;

        let Some(&byte) = self.src.get(self.pos) else {
            return Ok(Spanned {
                token: Token::End,
                position,
            });
        };

        let token = match byte {
            b'0'..=b'9' => Token::Var(self.scan_number()),
            b'L' => {
                self.pos += 1;
                Token::Lambda
            }
            b'(' => {
                self.pos += 1;
                Token::LParen
            }
            b')' => {
                self.pos += 1;
                Token::RParen
            }
            b'.' => {
                self.pos += 1;
                Token::Dot
            }
            _ => {
                let found = self.rest().chars().next().unwrap_or('\u{fffd}');
                return Err(LexpError::UnknownCharacter { position, found });
            }
        };

        Ok(Spanned { token, position })
    }

    /// Scan a digit run. Overflow saturates at `Var::MAX` with a warning.
    fn scan_number(&mut self) -> Var {
        let start = self.pos;
        let mut value: Var = 0;
        let mut overflowed = false;

        while let Some(&byte) = self.src.get(self.pos) {
            if !byte.is_ascii_digit() {
                break;
            }
            let digit = Var::from(byte - b'0');
            match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
                Some(v) => value = v,
                None => {
                    overflowed = true;
                    value = Var::MAX;
                }
            }
            self.pos += 1;
        }

        if overflowed {
            warn!(
                position = start,
                literal = %String::from_utf8_lossy(&self.src[start..self.pos]),
                "variable identifier exceeds the limit; saturated to {}",
                Var::MAX
            );
        }
        value
    }

    fn rest(&self) -> &'a str {
        std::str::from_utf8(&self.src[self.pos..]).unwrap_or("")
    }
}
