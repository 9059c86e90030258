//! Error types for the lambda expression engine.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexpError {
    #[error("unknown character '{found}' at position {position}")]
    UnknownCharacter { position: usize, found: char },
    #[error("syntax error at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: &'static str,
        found: String,
    },
    #[error("nothing to parse")]
    EmptyInput,
    #[error("trailing input after a complete term at position {position}")]
    TrailingInput { position: usize },
    #[error("term nesting exceeds the maximum height of {limit}")]
    TooDeep { limit: usize },
    #[error("cell pool exhausted: cannot grow beyond {capacity} cells")]
    PoolExhausted { capacity: usize },
    #[error("cannot obtain memory for {requested} more cells")]
    OutOfMemory { requested: usize },
    #[error("no fresh variable identifier left above {max}", max = u64::MAX)]
    FreshVariableOverflow,
    #[error("cell {index} is free or the handle is stale")]
    StaleHandle { index: u32 },
    #[error("output buffer of {capacity} bytes is too small")]
    BufferOverflow { capacity: usize },
    #[error("reduction strategy {0} is not implemented")]
    UnsupportedStrategy(&'static str),
}

impl LexpError {
    /// Resource exhaustion; the caller cannot continue with this engine.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LexpError::PoolExhausted { .. }
                | LexpError::OutOfMemory { .. }
                | LexpError::FreshVariableOverflow
        )
    }

    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            LexpError::UnknownCharacter { .. }
                | LexpError::UnexpectedToken { .. }
                | LexpError::EmptyInput
                | LexpError::TrailingInput { .. }
                | LexpError::TooDeep { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LexpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(LexpError::PoolExhausted { capacity: 4 }.is_fatal());
        assert!(LexpError::FreshVariableOverflow.is_fatal());
        assert!(!LexpError::EmptyInput.is_fatal());
        assert!(!LexpError::StaleHandle { index: 0 }.is_fatal());
    }

    #[test]
    fn test_syntax_classification() {
        assert!(LexpError::TrailingInput { position: 3 }.is_syntax());
        assert!(!LexpError::BufferOverflow { capacity: 1 }.is_syntax());
    }

    #[test]
    fn test_messages() {
        let err = LexpError::UnexpectedToken {
            position: 4,
            expected: "')'",
            found: "end of input".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "syntax error at position 4: expected ')', found end of input"
        );
    }
}
