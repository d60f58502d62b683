//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Combined lexer and LALR(1) parse-table generator.
//!
//! `lalrex` turns a textual grammar specification (productions annotated
//! with token regexes, operator precedence, associativity, whitespace rules
//! and semantic action tags) into an immutable artifact holding
//!
//!  * a deterministic finite automaton that tokenizes input streams with
//!    longest-match semantics across every token at once, and
//!  * an LALR(1) shift/reduce table with precedence-resolved conflicts.
//!
//! The artifact drives the bundled runtime: [`Tables::lex`] returns one
//! token, [`Tables::parse`] runs the full shift/reduce loop and reports the
//! sequence of reductions (with their action tags) and matched lexemes for
//! the embedder to dispatch on.
//!
//! ```rust
//! let tables = lalrex::generate(
//!     r#"
//!     list {
//!         %whitespace "[ \t\n\r]+";
//!         items: items "[0-9]+" [push] | "[0-9]+" [first];
//!     }
//!     "#,
//! )
//! .unwrap();
//!
//! let tags: Vec<_> = tables
//!     .parse("10 20 30")
//!     .unwrap()
//!     .into_iter()
//!     .filter_map(|event| match event {
//!         lalrex::ParseEvent::Reduce { action, .. } => action,
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(tags, ["first", "push", "push"]);
//! ```
//!
//! Construction is single-threaded and performs no I/O; the grammar string
//! must outlive the artifact, which is then freely shareable across threads.

pub mod actions;
pub mod analysis;
pub mod bitset;
pub mod dfa;
pub mod error;
pub mod generate;
pub mod grammar;
pub mod lookahead;
pub mod matcher;
pub mod ranges;
pub mod regex;
pub mod states;
pub mod symbol;
pub mod tables;

pub use crate::actions::{GrammarTransition, TransitionKind};
pub use crate::error::{LalrexError, Position, Result};
pub use crate::generate::generate;
pub use crate::grammar::Grammar;
pub use crate::symbol::{
    Assoc, SymbolId, SymbolKind, END_SYMBOL, ERROR_SYMBOL, START_SYMBOL, WHITESPACE_SYMBOL,
};
pub use crate::tables::{ParseEvent, Tables};
