//! Shift/reduce/accept action emission and conflict resolution.
//!
//! LR(0) construction already produced the shifts (and the non-terminal goto
//! edges, stored the same way). This pass adds one reduce transition per
//! completed item and lookahead terminal, resolving collisions on a
//! `(state, symbol)` cell by precedence and associativity.

use crate::error::{LalrexError, Result};
use crate::grammar::Grammar;
use crate::states::StateId;
use crate::symbol::{Assoc, ProductionId, SymbolId, END_SYMBOL, START_SYMBOL};

/// What taking a transition does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Shift,
    Reduce,
    Accept,
}

/// A transition of the parse table. `target` is a state for shifts and a
/// production for reductions; the accept transition ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrammarTransition {
    pub symbol: SymbolId,
    pub target: usize,
    pub kind: TransitionKind,
}

impl GrammarTransition {
    pub fn describe(&self, grammar: &Grammar) -> String {
        let name = grammar.symbols[self.symbol].name;
        match self.kind {
            TransitionKind::Shift => {
                format!("{:?} shifts to state {}", name, self.target)
            }
            TransitionKind::Reduce => format!(
                "{:?} reduces by {}",
                name,
                grammar.productions[self.target].describe(&grammar.symbols)
            ),
            TransitionKind::Accept => format!("{:?} accepts", name),
        }
    }
}

impl<'a> Grammar<'a> {
    /// Adds the reduce and accept transitions to the table.
    ///
    /// For every completed item, each terminal in its lookahead gets a reduce
    /// by that item's production; reducing by the synthesized start
    /// production on end-of-input is the accept.
    pub fn generate_transitions(&mut self) -> Result<()> {
        for state in 0..self.states.len() {
            for ii in 0..self.states[state].items.len() {
                let i = self.states[state].items[ii];
                let item = self.items[i];
                let production = &self.productions[item.production];
                if item.position < production.rhs.len() {
                    continue;
                }
                for symbol in 0..self.symbols.len() {
                    if !self.lookaheads[i].symbols.get(symbol) {
                        continue;
                    }
                    self.insert_reduce(state, symbol, item.production)?;
                }
            }
        }
        log::debug!("action table emitted for {} states", self.states.len());
        Ok(())
    }

    fn insert_reduce(
        &mut self,
        state: StateId,
        symbol: SymbolId,
        production: ProductionId,
    ) -> Result<()> {
        let kind = if production == self.symbols[START_SYMBOL].productions[0]
            && symbol == END_SYMBOL
        {
            TransitionKind::Accept
        } else {
            TransitionKind::Reduce
        };
        let Some(existing) = self.transitions[state]
            .iter()
            .position(|t| t.symbol == symbol)
        else {
            self.transitions[state].push(GrammarTransition {
                symbol,
                target: production,
                kind,
            });
            return Ok(());
        };
        match self.transitions[state][existing].kind {
            TransitionKind::Shift => self.resolve_shift_reduce(state, existing, production),
            _ => self.resolve_reduce_reduce(state, existing, production),
        }
    }

    /// Applies the precedence rules to a shift/reduce collision.
    ///
    /// Without precedence on both sides, or at equal precedence with no
    /// associativity, the conflict is fatal. A higher-precedence production
    /// reduces over a lower-precedence terminal and vice versa; at equal
    /// precedence, left associativity reduces and right associativity shifts.
    fn resolve_shift_reduce(
        &mut self,
        state: StateId,
        existing: usize,
        production: ProductionId,
    ) -> Result<()> {
        let transition = self.transitions[state][existing];
        let symbol = &self.symbols[transition.symbol];
        let production_precedence = self.productions[production].precedence(&self.symbols);

        if production_precedence == 0
            || symbol.precedence == 0
            || (symbol.precedence == production_precedence && symbol.assoc == Assoc::None)
        {
            return Err(LalrexError::ShiftReduceConflict {
                lhs: self.symbols[self.productions[production].lhs].name.to_string(),
                symbol: symbol.name.to_string(),
                detail: format!(
                    "{}; production precedence {} vs symbol precedence {} ({:?}) in state {}",
                    transition.describe(self),
                    production_precedence,
                    symbol.precedence,
                    symbol.assoc,
                    state
                ),
            });
        }

        if production_precedence > symbol.precedence
            || (symbol.precedence == production_precedence && symbol.assoc == Assoc::Left)
        {
            log::warn!(
                "shift/reduce on {:?} resolved to reduce by {} in state {}",
                symbol.name,
                self.productions[production].describe(&self.symbols),
                state
            );
            self.transitions[state][existing] = GrammarTransition {
                symbol: transition.symbol,
                target: production,
                kind: TransitionKind::Reduce,
            };
        } else {
            log::warn!(
                "shift/reduce on {:?} resolved to shift in state {}",
                symbol.name,
                state
            );
        }
        Ok(())
    }

    /// Applies the precedence rules to a reduce/reduce collision: one missing
    /// or equal precedence is fatal, otherwise the higher one wins the cell.
    fn resolve_reduce_reduce(
        &mut self,
        state: StateId,
        existing: usize,
        production: ProductionId,
    ) -> Result<()> {
        let transition = self.transitions[state][existing];
        let production_precedence = self.productions[production].precedence(&self.symbols);
        let existing_precedence =
            self.productions[transition.target].precedence(&self.symbols);

        if production_precedence == 0
            || existing_precedence == 0
            || production_precedence == existing_precedence
        {
            return Err(LalrexError::ReduceReduceConflict {
                lhs: self.symbols[self.productions[production].lhs].name.to_string(),
                symbol: self.symbols[transition.symbol].name.to_string(),
                detail: format!(
                    "{}; production precedence {} vs {} in state {}",
                    transition.describe(self),
                    production_precedence,
                    existing_precedence,
                    state
                ),
            });
        }

        if production_precedence > existing_precedence {
            log::warn!(
                "reduce/reduce on {:?} resolved to {} in state {}",
                self.symbols[transition.symbol].name,
                self.productions[production].describe(&self.symbols),
                state
            );
            self.transitions[state][existing].target = production;
        }
        Ok(())
    }
}
