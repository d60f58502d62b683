//! Source positions and the fatal error channel of the generator.
//!
//! Construction either terminates with an artifact or aborts with a single
//! [`LalrexError`]; no partial artifact is ever returned. Ambiguities that
//! precedence declarations resolve are not errors, they are logged with
//! `log::warn!` by the table emitter.

use thiserror::Error;

/// A 1-based line/column position in the grammar source or in parsed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number (byte position in the line).
    pub column: usize,
}

impl Position {
    /// Creates a new `Position`.
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Computes the position of byte `offset` inside `src`.
    pub fn of_offset(src: &str, offset: usize) -> Self {
        let consumed = &src.as_bytes()[..offset.min(src.len())];
        let line = 1 + consumed.iter().filter(|&&b| b == b'\n').count();
        let column = 1 + consumed
            .iter()
            .rev()
            .take_while(|&&b| b != b'\n')
            .count();
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// All the ways table construction can abort.
///
/// The first fatal error stops the pipeline; the variant carries the
/// human-readable reason and the offending location where one is available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LalrexError {
    #[error("empty literal or regex at {0}")]
    EmptyLiteralOrRegex(Position),

    #[error("unterminated literal or regex at {0}")]
    UnterminatedLiteralOrRegex(Position),

    #[error("unable to parse regex {regex:?}")]
    MalformedRegex { regex: String },

    #[error("grammar is not ASCII")]
    NonAsciiGrammar,

    #[error("{expected} at {position}")]
    Syntax {
        expected: &'static str,
        position: Position,
    },

    #[error("undefined symbol {name:?}")]
    UndefinedSymbol { name: String },

    #[error("unreferenced symbol {name:?}")]
    UnreferencedSymbol { name: String },

    #[error("{what} of symbol {name:?} is declared more than once")]
    Redeclaration { name: String, what: &'static str },

    #[error(
        "symbol {replaced:?} is an alias for {replacement:?} but both have a declared {what}"
    )]
    DoubleDeclaration {
        replaced: String,
        replacement: String,
        what: &'static str,
    },

    #[error("shift/reduce conflict for {lhs:?} on {symbol:?}: {detail}")]
    ShiftReduceConflict {
        lhs: String,
        symbol: String,
        detail: String,
    },

    #[error("reduce/reduce conflict for {lhs:?} on {symbol:?}: {detail}")]
    ReduceReduceConflict {
        lhs: String,
        symbol: String,
        detail: String,
    },

    #[error("token not recognized when chars not accepted")]
    DegenerateDfa,

    #[error("no token matches input at {0}")]
    UnrecognizedInput(Position),

    #[error("unexpected token {name:?} at {position}")]
    UnexpectedToken { name: String, position: Position },

    #[error("unexpected end of input")]
    UnexpectedEnd,
}

/// Result alias used across the crate.
pub type Result<T, E = LalrexError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_of_offset() {
        let src = "ab\ncde\nf";
        assert_eq!(Position::of_offset(src, 0), Position::new(1, 1));
        assert_eq!(Position::of_offset(src, 2), Position::new(1, 3));
        assert_eq!(Position::of_offset(src, 3), Position::new(2, 1));
        assert_eq!(Position::of_offset(src, 6), Position::new(2, 4));
        assert_eq!(Position::of_offset(src, 7), Position::new(3, 1));
    }

    #[test]
    fn display() {
        let e = LalrexError::Syntax {
            expected: "expected ';'",
            position: Position::new(3, 7),
        };
        assert_eq!(e.to_string(), "expected ';' at 3:7");
    }
}
