//! Canonical LR(0) item sets and their GOTO transitions.
//!
//! States are ordered lists of item ids; two states are equal iff their lists
//! are equal, in order. Goto states are built directly on kernel items: the
//! direct dot advance, plus the pre-computed leftmost-reachable productions
//! whose right-hand side starts with the goto symbol (which is what closing
//! first and advancing after would produce). The full closures are written
//! back once the collection is complete, so the later lookahead passes see
//! every item of every state.

use crate::actions::{GrammarTransition, TransitionKind};
use crate::grammar::Grammar;
use crate::symbol::{Production, ProductionId, Symbol, SymbolId, END_SYMBOL, START_SYMBOL};

/// Index of an item in the item arena.
pub type ItemId = usize;
/// Index of a state.
pub type StateId = usize;

/// A dotted production: `lhs → rhs[..position] · rhs[position..]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrammarItem {
    pub production: ProductionId,
    pub position: usize,
}

impl GrammarItem {
    pub fn describe(&self, productions: &[Production], symbols: &[Symbol]) -> String {
        let production = &productions[self.production];
        let mut out = format!("{} :", symbols[production.lhs].name);
        for (i, &r) in production.rhs.iter().enumerate() {
            if i == self.position {
                out.push_str(" .");
            }
            out.push(' ');
            out.push_str(symbols[r].name);
        }
        if self.position == production.rhs.len() {
            out.push_str(" .");
        }
        out
    }
}

/// An LR(0) state: the ordered ids of its items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarState {
    pub items: Vec<ItemId>,
}

fn intern_item(items: &mut Vec<GrammarItem>, item: GrammarItem) -> ItemId {
    if let Some(i) = items.iter().position(|&x| x == item) {
        i
    } else {
        items.push(item);
        items.len() - 1
    }
}

impl GrammarState {
    /// Finds the id of `item` within this state.
    pub fn find_item(&self, items: &[GrammarItem], item: GrammarItem) -> Option<ItemId> {
        self.items.iter().copied().find(|&i| items[i] == item)
    }

    /// Closes the state: an item with the dot before a non-terminal pulls in
    /// that symbol's productions as fresh dotted items, transitively.
    pub fn add_closure(
        &mut self,
        items: &mut Vec<GrammarItem>,
        productions: &[Production],
        symbols: &[Symbol],
    ) {
        let mut i = 0;
        while i < self.items.len() {
            let item = items[self.items[i]];
            let rhs = &productions[item.production].rhs;
            if let Some(&next) = rhs.get(item.position) {
                for pi in 0..symbols[next].productions.len() {
                    let p = symbols[next].productions[pi];
                    let id = intern_item(items, GrammarItem { production: p, position: 0 });
                    if !self.items.contains(&id) {
                        self.items.push(id);
                    }
                }
            }
            i += 1;
        }
    }

    /// Builds the kernel of GOTO(self, symbol).
    pub fn create_goto_state(
        &self,
        symbol: SymbolId,
        items: &mut Vec<GrammarItem>,
        productions: &[Production],
        symbols: &[Symbol],
    ) -> GrammarState {
        let mut goto_state = GrammarState::default();
        for &i in &self.items {
            let item = items[i];
            let rhs = &productions[item.production].rhs;
            let Some(&next) = rhs.get(item.position) else {
                continue;
            };
            if next == symbol {
                let id = intern_item(
                    items,
                    GrammarItem { production: item.production, position: item.position + 1 },
                );
                if !goto_state.items.contains(&id) {
                    goto_state.items.push(id);
                }
            }
            for pi in 0..symbols[next].reachable_by_first.len() {
                let p = symbols[next].reachable_by_first[pi];
                if productions[p].rhs[0] == symbol {
                    let id = intern_item(items, GrammarItem { production: p, position: 1 });
                    if !goto_state.items.contains(&id) {
                        goto_state.items.push(id);
                    }
                }
            }
        }
        goto_state
    }

    pub fn describe(
        &self,
        items: &[GrammarItem],
        productions: &[Production],
        symbols: &[Symbol],
        prefix: &str,
    ) -> String {
        let mut out = String::new();
        for &i in &self.items {
            out.push_str(prefix);
            out.push_str("| ");
            out.push_str(&items[i].describe(productions, symbols));
            out.push('\n');
        }
        out
    }
}

impl<'a> Grammar<'a> {
    /// Builds the canonical LR(0) collection and its shift transitions.
    pub fn generate_states(&mut self) {
        let start_production = self.symbols[START_SYMBOL].productions[0];
        self.items.push(GrammarItem { production: start_production, position: 0 });
        let mut start = GrammarState { items: vec![0] };
        start.add_closure(&mut self.items, &self.productions, &self.symbols);
        self.states.push(start);
        self.transitions.push(Vec::new());

        let mut current: Vec<StateId> = vec![0];
        while !current.is_empty() {
            let mut next: Vec<StateId> = Vec::new();
            for &state in &current {
                for symbol in 0..self.symbols.len() {
                    if symbol == END_SYMBOL {
                        continue;
                    }
                    let goto_state = self.states[state].create_goto_state(
                        symbol,
                        &mut self.items,
                        &self.productions,
                        &self.symbols,
                    );
                    if goto_state.items.is_empty() {
                        continue;
                    }
                    let target = match self.states.iter().position(|s| *s == goto_state) {
                        Some(i) => i,
                        None => {
                            self.states.push(goto_state);
                            self.transitions.push(Vec::new());
                            next.push(self.states.len() - 1);
                            self.states.len() - 1
                        }
                    };
                    log::trace!(
                        "state {} shifts {:?} to state {}",
                        state,
                        self.symbols[symbol].name,
                        target
                    );
                    self.transitions[state].push(GrammarTransition {
                        symbol,
                        target,
                        kind: TransitionKind::Shift,
                    });
                }
            }
            current = next;
        }

        for i in 0..self.states.len() {
            let mut state = std::mem::take(&mut self.states[i]);
            state.add_closure(&mut self.items, &self.productions, &self.symbols);
            self.states[i] = state;
        }
        log::debug!(
            "lr(0) collection built: {} states, {} items",
            self.states.len(),
            self.items.len()
        );
        if log::log_enabled!(log::Level::Trace) {
            for (i, state) in self.states.iter().enumerate() {
                log::trace!("state {}:\n{}", i, self.describe_state(state, "  "));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_states<'a>(src: &'a str) -> Grammar<'a> {
        let mut g = Grammar::new();
        g.parse(src).unwrap();
        g.check().unwrap();
        g.optimize().unwrap();
        g.calculate_firsts();
        g.calculate_follows();
        g.set_precedence();
        g.precompute_reachable();
        g.generate_states();
        g
    }

    #[test]
    fn describes_items() {
        let g = with_states("tiny { s: 'a' 'b'; }");
        let item = GrammarItem { production: 1, position: 1 };
        assert_eq!(item.describe(&g.productions, &g.symbols), "s : a . b");
        let done = GrammarItem { production: 1, position: 2 };
        assert_eq!(done.describe(&g.productions, &g.symbols), "s : a b .");
    }

    #[test]
    fn start_state_is_closed() {
        let g = with_states("tiny { s: 'a' s | 'b'; }");
        // .start → · s plus the closure over both productions of s.
        let start = &g.states[0];
        assert_eq!(start.items.len(), 3);
        let kinds: Vec<_> = start
            .items
            .iter()
            .map(|&i| (g.items[i].production, g.items[i].position))
            .collect();
        assert!(kinds.contains(&(0, 0)));
        assert!(kinds.contains(&(1, 0)));
        assert!(kinds.contains(&(2, 0)));
    }

    #[test]
    fn construction_is_deterministic() {
        let src = "tiny { s: 'a' s 'b' | t; t: 'c' | ; }";
        let a = with_states(src);
        let b = with_states(src);
        assert_eq!(a.states, b.states);
        assert_eq!(a.items, b.items);
        let ta: Vec<_> = a.transitions.iter().collect();
        let tb: Vec<_> = b.transitions.iter().collect();
        assert_eq!(ta, tb);
    }

    #[test]
    fn goto_chains_reach_accepting_item() {
        let g = with_states("tiny { s: 'a'; }");
        // 0 --a--> state with s : a ·, and 0 --s--> state with .start : s ·.
        let a = g
            .symbols
            .iter()
            .position(|s| s.name == "a")
            .unwrap();
        let s = g.productions[0].rhs[0];
        let shift_a = g.transitions[0]
            .iter()
            .find(|t| t.symbol == a)
            .expect("terminal shift from the start state");
        let reduced = GrammarItem { production: 1, position: 1 };
        assert!(g.states[shift_a.target]
            .find_item(&g.items, reduced)
            .is_some());
        let shift_s = g.transitions[0]
            .iter()
            .find(|t| t.symbol == s)
            .expect("goto on the start non-terminal");
        let accepting = GrammarItem { production: 0, position: 1 };
        assert!(g.states[shift_s.target]
            .find_item(&g.items, accepting)
            .is_some());
    }

    #[test]
    fn states_are_deduplicated() {
        // Both alternatives of s end in the same single-item kernels.
        let g = with_states("tiny { s: 'a' s | 'a'; }");
        let mut seen = Vec::new();
        for state in &g.states {
            assert!(!seen.contains(&state.items), "duplicate state");
            seen.push(state.items.clone());
        }
    }
}
