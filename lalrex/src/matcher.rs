//! Backtracking cursor over an immutable character buffer.
//!
//! [`Matcher`] is the shared primitive under both the regex parser and the
//! grammar lexer. Alternatives are expressed as *tentative* matches: a closure
//! runs against the cursor and, unless it produces a value, the cursor is
//! rewound to where it was. Rewind happens on every exit path, including `?`
//! error propagation out of the closure.

use crate::error::{LalrexError, Position, Result};

/// Escape mapping applied after a backslash: `\b \n \f \r \t`, any other
/// character passes through literally (so `\'`, `\"`, `\\` work).
pub fn unescape(c: u8) -> u8 {
    match c {
        b'b' => 0x08,
        b'n' => b'\n',
        b'f' => 0x0c,
        b'r' => b'\r',
        b't' => b'\t',
        other => other,
    }
}

/// Cursor over the grammar (or regex) source.
#[derive(Debug, Clone)]
pub struct Matcher<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Matcher<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Remaining unconsumed input.
    #[inline]
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == self.src.len()
    }

    /// Next byte without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.src.len());
    }

    /// 1-based line/column of the cursor, for diagnostics.
    pub fn position(&self) -> Position {
        Position::of_offset(self.src, self.pos)
    }

    /// Runs `f` against the cursor; if it yields no value the cursor is
    /// rewound to its state before the call. Errors also rewind.
    pub fn tentative<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        let save = self.pos;
        let result = f(self);
        if !matches!(result, Ok(Some(_))) {
            log::trace!("tentative match rewound to offset {}", save);
            self.pos = save;
        }
        result
    }

    /// Consumes one byte unconditionally.
    pub fn match_any_char(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.advance(1);
        Some(c)
    }

    /// Consumes `c` if it is next.
    pub fn match_char(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.advance(1);
            true
        } else {
            false
        }
    }

    /// Consumes `s` if the input starts with it.
    pub fn match_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.advance(s.len());
            true
        } else {
            false
        }
    }

    /// Consumes and returns the next byte unless it is in `filter`.
    pub fn match_char_not_in(&mut self, filter: &[u8]) -> Option<u8> {
        let c = self.peek()?;
        if filter.contains(&c) {
            None
        } else {
            self.advance(1);
            Some(c)
        }
    }

    /// Consumes and returns the next byte if it is in `filter`.
    pub fn match_any_char_in(&mut self, filter: &[u8]) -> Option<u8> {
        let c = self.peek()?;
        if filter.contains(&c) {
            self.advance(1);
            Some(c)
        } else {
            None
        }
    }

    /// Reads a byte outside `filter`; a backslash reads one more byte and
    /// applies the escape mapping.
    pub fn match_possibly_escaped_char_not_in(&mut self, filter: &[u8]) -> Option<u8> {
        let c = self.match_char_not_in(filter)?;
        if c == b'\\' {
            self.match_any_char().map(unescape)
        } else {
            Some(c)
        }
    }

    /// Matches `//` and consumes through end of line.
    pub fn match_line_comment(&mut self) -> bool {
        if !self.match_str("//") {
            return false;
        }
        while let Some(c) = self.peek() {
            if c == b'\n' || c == b'\r' {
                break;
            }
            self.advance(1);
        }
        true
    }

    /// Matches `/*` and consumes through the next `*/`, across newlines.
    pub fn match_block_comment(&mut self) -> bool {
        if !self.match_str("/*") {
            return false;
        }
        while !self.is_empty() {
            if self.match_str("*/") {
                return true;
            }
            self.advance(1);
        }
        true
    }

    /// Greedily consumes any mixture of whitespace and comments.
    pub fn match_whitespace_or_comments(&mut self) -> bool {
        let mut matched = false;
        loop {
            if self.match_any_char_in(b" \x0c\n\r\t\x0b").is_some()
                || self.match_line_comment()
                || self.match_block_comment()
            {
                matched = true;
            } else {
                return matched;
            }
        }
    }

    /// Matches a quoted literal (`'`) or regex (`"`) body on a single line.
    ///
    /// Returns the body between the delimiters with escapes left raw. Hitting
    /// a newline or the end of input before the closing delimiter, or an empty
    /// body, is fatal.
    pub fn match_literal_or_regex(&mut self, delim: u8) -> Result<Option<&'a str>> {
        self.tentative(|m| {
            if !m.match_char(delim) {
                return Ok(None);
            }
            let body_start = m.pos;
            let mut escaped = false;
            loop {
                if m.is_empty() || m.match_any_char_in(b"\n\r").is_some() {
                    return Err(LalrexError::UnterminatedLiteralOrRegex(m.position()));
                }
                let Some(c) = m.match_any_char() else {
                    return Err(LalrexError::UnterminatedLiteralOrRegex(m.position()));
                };
                if escaped {
                    escaped = false;
                } else if c == b'\\' {
                    escaped = true;
                } else if c == delim {
                    break;
                }
            }
            let body = &m.src[body_start..m.pos - 1];
            if body.is_empty() {
                return Err(LalrexError::EmptyLiteralOrRegex(m.position()));
            }
            Ok(Some(body))
        })
    }

    /// Matches a single-quoted literal.
    pub fn match_literal(&mut self) -> Result<Option<&'a str>> {
        self.match_literal_or_regex(b'\'')
    }

    /// Matches a double-quoted regex.
    pub fn match_regex(&mut self) -> Result<Option<&'a str>> {
        self.match_literal_or_regex(b'"')
    }

    /// Matches an identifier: `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn match_id(&mut self) -> Option<&'a str> {
        let c = self.peek()?;
        if !(c.is_ascii_alphabetic() || c == b'_') {
            return None;
        }
        let start = self.pos;
        self.advance(1);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.advance(1);
            } else {
                break;
            }
        }
        Some(&self.src[start..self.pos])
    }
}
