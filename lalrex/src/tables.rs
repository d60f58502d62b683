//! The packed, immutable artifact and its runtime drivers.
//!
//! Construction works on growable arenas; [`Tables::from_grammar`] freezes
//! them by copy into contiguous buffers addressable by dense indices: a
//! symbol table, a productions-data buffer with a side index, the item and
//! state tables, the flat transition rows, and the combined lexer machine.
//! The result borrows only the grammar source and is freely shareable.
//!
//! Two drivers consume the artifact: [`Tables::lex`] returns one
//! longest-match token, and [`Tables::parse`] runs the shift/reduce loop,
//! reporting every shift (with its lexeme) and every reduction (with its
//! action tag).

use crate::actions::{GrammarTransition, TransitionKind};
use crate::dfa::{DfaState, DfaTables, DfaTransition};
use crate::error::{LalrexError, Position, Result};
use crate::grammar::Grammar;
use crate::states::{GrammarItem, ItemId, StateId};
use crate::symbol::{ProductionId, SymbolId, SymbolKind, END_SYMBOL, WHITESPACE_SYMBOL};

/// Offset and length of one row inside a flat buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Row {
    pub begin: usize,
    pub len: usize,
}

/// A two-dimensional table stored as one contiguous data buffer plus one
/// `Row` per logical row.
#[derive(Debug, Clone)]
pub struct Packed2d<T> {
    rows: Box<[Row]>,
    data: Box<[T]>,
}

impl<T: Clone> Packed2d<T> {
    fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Self {
        let mut index = Vec::with_capacity(rows.len());
        let mut data = Vec::new();
        for row in rows {
            let row = row.as_ref();
            index.push(Row { begin: data.len(), len: row.len() });
            data.extend_from_slice(row);
        }
        Self {
            rows: index.into_boxed_slice(),
            data: data.into_boxed_slice(),
        }
    }
}

impl<T> Packed2d<T> {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One row as a slice of the flat buffer.
    pub fn row(&self, i: usize) -> &[T] {
        let Row { begin, len } = self.rows[i];
        &self.data[begin..begin + len]
    }
}

/// Name and kind of a symbol, as packed into the artifact.
#[derive(Debug, Clone, Copy)]
pub struct PackedSymbol<'a> {
    pub name: &'a str,
    pub kind: SymbolKind,
}

/// The packed lexer machine.
#[derive(Debug, Clone)]
pub struct PackedDfa {
    states: Box<[DfaState]>,
    transitions: Box<[DfaTransition]>,
}

impl DfaTables for PackedDfa {
    fn states(&self) -> &[DfaState] {
        &self.states
    }
    fn transitions(&self) -> &[DfaTransition] {
        &self.transitions
    }
}

/// One event of a parse: what the driver did, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseEvent<'a, 'i> {
    /// A terminal was consumed.
    Shift { symbol: SymbolId, lexeme: &'i str },
    /// A production was applied; its action tag is the embedder's dispatch
    /// key.
    Reduce {
        production: ProductionId,
        action: Option<&'a str>,
    },
}

/// The generated artifact: lexer DFA plus LALR(1) tables.
///
/// String views point into the grammar source, which must outlive the
/// artifact.
#[derive(Debug, Clone)]
pub struct Tables<'a> {
    pub name: &'a str,
    symbols: Box<[PackedSymbol<'a>]>,
    /// Per production: `[lhs, rhs...]`.
    productions: Packed2d<usize>,
    actions: Box<[Option<&'a str>]>,
    items: Box<[GrammarItem]>,
    state_items: Packed2d<ItemId>,
    state_transitions: Packed2d<GrammarTransition>,
    dfa: PackedDfa,
}

/// Read access to one production of the artifact.
#[derive(Debug, Clone, Copy)]
pub struct ProductionRef<'t, 'a> {
    tables: &'t Tables<'a>,
    index: ProductionId,
}

impl<'t, 'a> ProductionRef<'t, 'a> {
    pub fn lhs(&self) -> SymbolId {
        self.tables.productions.row(self.index)[0]
    }

    pub fn rhs(&self) -> &'t [SymbolId] {
        &self.tables.productions.row(self.index)[1..]
    }

    pub fn action(&self) -> Option<&'a str> {
        self.tables.actions[self.index]
    }

    pub fn describe(&self) -> String {
        let mut out = format!("{} :", self.tables.symbols[self.lhs()].name);
        for &r in self.rhs() {
            out.push(' ');
            out.push_str(self.tables.symbols[r].name);
        }
        out
    }
}

/// Read access to one state of the artifact.
#[derive(Debug, Clone, Copy)]
pub struct StateRef<'t, 'a> {
    tables: &'t Tables<'a>,
    index: StateId,
}

impl<'t, 'a> StateRef<'t, 'a> {
    pub fn items(&self) -> impl Iterator<Item = GrammarItem> + 't {
        let tables = self.tables;
        tables
            .state_items
            .row(self.index)
            .iter()
            .map(move |&i| tables.items[i])
    }

    pub fn transitions(&self) -> &'t [GrammarTransition] {
        self.tables.state_transitions.row(self.index)
    }
}

impl<'a> Tables<'a> {
    /// Freezes a fully constructed grammar into the packed artifact.
    pub fn from_grammar(grammar: &Grammar<'a>) -> Self {
        let symbols: Vec<PackedSymbol<'a>> = grammar
            .symbols
            .iter()
            .map(|s| PackedSymbol { name: s.name, kind: s.kind })
            .collect();
        let productions: Vec<Vec<usize>> = grammar
            .productions
            .iter()
            .map(|p| {
                let mut row = Vec::with_capacity(p.rhs.len() + 1);
                row.push(p.lhs);
                row.extend_from_slice(&p.rhs);
                row
            })
            .collect();
        let state_items: Vec<&[ItemId]> = grammar
            .states
            .iter()
            .map(|s| s.items.as_slice())
            .collect();
        Self {
            name: grammar.name,
            symbols: symbols.into_boxed_slice(),
            productions: Packed2d::from_rows(&productions),
            actions: grammar
                .productions
                .iter()
                .map(|p| p.action)
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            items: grammar.items.clone().into_boxed_slice(),
            state_items: Packed2d::from_rows(&state_items),
            state_transitions: Packed2d::from_rows(&grammar.transitions),
            dfa: PackedDfa {
                states: grammar.lexer_dfa.states.clone().into_boxed_slice(),
                transitions: grammar.lexer_dfa.transitions.clone().into_boxed_slice(),
            },
        }
    }

    pub fn n_symbols(&self) -> usize {
        self.symbols.len()
    }

    pub fn n_productions(&self) -> usize {
        self.productions.len()
    }

    pub fn n_states(&self) -> usize {
        self.state_items.len()
    }

    pub fn symbol(&self, i: SymbolId) -> PackedSymbol<'a> {
        self.symbols[i]
    }

    /// Finds a symbol id by name and kind.
    pub fn find_symbol(&self, name: &str, kind: SymbolKind) -> Option<SymbolId> {
        self.symbols
            .iter()
            .position(|s| s.name == name && s.kind == kind)
    }

    pub fn production(&self, i: ProductionId) -> ProductionRef<'_, 'a> {
        ProductionRef { tables: self, index: i }
    }

    pub fn state(&self, i: StateId) -> StateRef<'_, 'a> {
        StateRef { tables: self, index: i }
    }

    /// Longest-match lexing of one token from the front of `input`.
    pub fn lex<'i>(&self, input: &'i str) -> Result<(&'i str, SymbolId)> {
        match self.dfa.longest_match(input.as_bytes()) {
            Some((len, token)) => Ok((&input[..len], token)),
            None => Err(LalrexError::UnrecognizedInput(Position::new(1, 1))),
        }
    }

    /// Runs the parser over `input`, returning the full event stream.
    pub fn parse<'i>(&self, input: &'i str) -> Result<Vec<ParseEvent<'a, 'i>>> {
        let mut tokenizer = Tokenizer { tables: self, input, offset: 0 };
        let mut events = Vec::new();
        let mut stack: Vec<StateId> = vec![0];
        let (mut symbol, mut lexeme) = tokenizer.next_token()?;

        loop {
            let state = *stack.last().expect("state stack is never empty");
            let Some(transition) = self
                .state(state)
                .transitions()
                .iter()
                .find(|t| t.symbol == symbol)
                .copied()
            else {
                return Err(LalrexError::UnexpectedToken {
                    name: self.symbols[symbol].name.to_string(),
                    position: Position::of_offset(input, tokenizer.offset),
                });
            };
            match transition.kind {
                TransitionKind::Shift => {
                    log::trace!("shift {:?} -> state {}", lexeme, transition.target);
                    events.push(ParseEvent::Shift { symbol, lexeme });
                    stack.push(transition.target);
                    (symbol, lexeme) = tokenizer.next_token()?;
                }
                TransitionKind::Reduce => {
                    let production = self.production(transition.target);
                    log::trace!("reduce by {}", production.describe());
                    events.push(ParseEvent::Reduce {
                        production: transition.target,
                        action: production.action(),
                    });
                    let keep = stack.len() - production.rhs().len();
                    stack.truncate(keep);
                    let top = *stack.last().expect("state stack is never empty");
                    let lhs = production.lhs();
                    let goto = self
                        .state(top)
                        .transitions()
                        .iter()
                        .find(|t| t.symbol == lhs && t.kind == TransitionKind::Shift)
                        .ok_or_else(|| LalrexError::UnexpectedToken {
                            name: self.symbols[lhs].name.to_string(),
                            position: Position::of_offset(input, tokenizer.offset),
                        })?;
                    stack.push(goto.target);
                }
                TransitionKind::Accept => {
                    log::trace!("accept");
                    return Ok(events);
                }
            }
        }
    }
}

/// Pulls whitespace-skipped tokens off the input for the parse driver.
struct Tokenizer<'t, 'a, 'i> {
    tables: &'t Tables<'a>,
    input: &'i str,
    offset: usize,
}

impl<'t, 'a, 'i> Tokenizer<'t, 'a, 'i> {
    fn next_token(&mut self) -> Result<(SymbolId, &'i str)> {
        loop {
            if self.offset == self.input.len() {
                return Ok((END_SYMBOL, ""));
            }
            let rest = &self.input[self.offset..];
            let (lexeme, symbol) = self.tables.lex(rest).map_err(|_| {
                LalrexError::UnrecognizedInput(Position::of_offset(self.input, self.offset))
            })?;
            if lexeme.is_empty() {
                return Err(LalrexError::UnrecognizedInput(Position::of_offset(
                    self.input,
                    self.offset,
                )));
            }
            self.offset += lexeme.len();
            if symbol == WHITESPACE_SYMBOL {
                continue;
            }
            log::trace!(
                "token {:?} as {:?}",
                lexeme,
                self.tables.symbols[symbol].name
            );
            return Ok((symbol, lexeme));
        }
    }
}
