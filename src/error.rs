// ABOUTME: Error taxonomy for the lexer, comment filter, parser, and evaluator

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TinyError {
    #[error("{message}")]
    LexError {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("comment error: {message}")]
    CommentError { message: String },

    #[error("Parsing Error! Please check the syntax")]
    ParseError,

    /// Call target not declared. Variable *reads* never raise this — they
    /// silently default to `Int(0)` per the language's own design choice.
    #[error("Undefined function: {0}")]
    NameError(String),

    #[error("{function}: expected {expected} argument(s), got {actual}")]
    ArityError {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("type error in `{operator}`: {message}")]
    TypeError { operator: String, message: String },

    #[error("index {index} out of bounds for array of length {len}")]
    IndexError { index: i64, len: usize },

    #[error("division by zero in `{operator}`")]
    DivideByZero { operator: String },
}

impl TinyError {
    pub fn type_error(operator: impl Into<String>, message: impl Into<String>) -> Self {
        TinyError::TypeError {
            operator: operator.into(),
            message: message.into(),
        }
    }

    pub fn arity_error(function: impl Into<String>, expected: usize, actual: usize) -> Self {
        TinyError::ArityError {
            function: function.into(),
            expected,
            actual,
        }
    }
}
