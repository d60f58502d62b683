//! Integer calculator built on `lalrex`-generated tables.
//!
//! The grammar is compiled by [`lalrex::generate`] when a [`Calc`] is
//! created; evaluation folds the parse event stream, dispatching on the
//! action tags of the reductions and reading operand lexemes off the shifts.

pub mod calc;
pub mod error;
pub mod symtab;

pub use calc::{Calc, Evaluation};
pub use error::CalcError;
pub use symtab::SymTab;
