use lalrex::LalrexError;
use thiserror::Error;

/// Errors of the calculator on top of table generation and parsing.
#[derive(Debug, Error)]
pub enum CalcError {
    /// The grammar failed to compile or the input failed to parse.
    #[error(transparent)]
    Parse(#[from] LalrexError),

    /// A numeric literal did not fit the value type.
    #[error("unable to parse number: {0}")]
    Number(#[from] std::num::ParseIntError),

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// The reduction stream and the value stack disagree.
    #[error("evaluation stack underflow")]
    StackUnderflow,
}
