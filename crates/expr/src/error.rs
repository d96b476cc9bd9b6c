//! Expression compilation errors.

use thiserror::Error;

/// Errors raised while compiling an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// The text is not of the form `name(args)`.
    #[error("invalid operation `{0}`")]
    InvalidOperation(String),

    /// The argument list of a call is empty.
    #[error("invalid operand list `{0}`")]
    InvalidOperand(String),
}

pub type Result<T> = std::result::Result<T, ExprError>;
