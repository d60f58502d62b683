//! LALR(1) lookahead computation over the LR(0) collection.
//!
//! One lookahead record per item: a bitset over the symbol universe plus the
//! items it propagates to. Spontaneous lookaheads are seeded from the FIRST
//! of what follows the dot; propagation links connect each item to its dot
//! advance in the goto state, and closure items reached across a nullable
//! suffix; the fixed point then flows the bits along the links until no bit
//! is added anywhere.

use crate::bitset::BitSet;
use crate::grammar::Grammar;
use crate::states::{GrammarItem, ItemId};
use crate::symbol::END_SYMBOL;

/// Lookahead state of one item.
#[derive(Debug, Clone)]
pub struct Lookahead {
    pub symbols: BitSet,
    pub propagate_to: Vec<ItemId>,
}

impl Lookahead {
    pub fn new(n_symbols: usize) -> Self {
        Self {
            symbols: BitSet::new(n_symbols),
            propagate_to: Vec::new(),
        }
    }
}

impl<'a> Grammar<'a> {
    /// Seeds the spontaneously generated lookaheads.
    ///
    /// The start item expects end-of-input. For an item `A → α · B β` in a
    /// state, every item `B → · γ` of the same state receives FIRST(β),
    /// accumulated across the leading nullable run of β.
    pub fn generate_spontaneous_lookaheads(&mut self) {
        self.lookaheads = (0..self.items.len())
            .map(|_| Lookahead::new(self.symbols.len()))
            .collect();
        self.lookaheads[0].symbols.set(END_SYMBOL, true);

        for state in &self.states {
            for &i in &state.items {
                let item = self.items[i];
                let production = &self.productions[item.production];
                let Some(&symbol) = production.rhs.get(item.position) else {
                    continue;
                };

                let mut spontaneous = Vec::new();
                for &other in &production.rhs[item.position + 1..] {
                    spontaneous.extend_from_slice(&self.symbols[other].firsts);
                    if !self.symbols[other].nullable {
                        break;
                    }
                }

                for &p in &self.symbols[symbol].productions {
                    for &other_item in &state.items {
                        if self.items[other_item] == (GrammarItem { production: p, position: 0 })
                        {
                            for &s in &spontaneous {
                                self.lookaheads[other_item].symbols.set(s, true);
                            }
                        }
                    }
                }
            }
        }
        log::debug!("spontaneous lookaheads seeded for {} items", self.items.len());
    }

    /// Builds the propagation graph.
    ///
    /// A shift on X from state S to T links every `A → α · X β` in S to
    /// `A → α X · β` in T; and when everything after the dotted non-terminal
    /// is nullable, the item links to that symbol's closure items within the
    /// same state.
    pub fn build_propagation_links(&mut self) {
        for (si, state) in self.states.iter().enumerate() {
            for transition in &self.transitions[si] {
                for &i in &state.items {
                    let item = self.items[i];
                    let production = &self.productions[item.production];
                    if production.rhs.get(item.position) != Some(&transition.symbol) {
                        continue;
                    }
                    let advanced = GrammarItem {
                        production: item.production,
                        position: item.position + 1,
                    };
                    let target = self.states[transition.target]
                        .find_item(&self.items, advanced)
                        .expect("goto state holds the advanced item");
                    if !self.lookaheads[i].propagate_to.contains(&target) {
                        self.lookaheads[i].propagate_to.push(target);
                    }
                }
            }

            for &i in &state.items {
                let item = self.items[i];
                let production = &self.productions[item.production];
                let Some(&symbol) = production.rhs.get(item.position) else {
                    continue;
                };
                if !production.is_nullable_after(&self.symbols, item.position + 1) {
                    continue;
                }
                for &p in &self.symbols[symbol].productions {
                    let closure_item = GrammarItem { production: p, position: 0 };
                    if let Some(target) = state.find_item(&self.items, closure_item) {
                        if !self.lookaheads[i].propagate_to.contains(&target) {
                            self.lookaheads[i].propagate_to.push(target);
                        }
                    }
                }
            }
        }
    }

    /// Runs the propagation fixed point: any item whose set changed pushes
    /// its bits into its targets on the next round.
    pub fn propagate_lookaheads(&mut self) {
        let mut pending: Vec<ItemId> = (0..self.lookaheads.len()).collect();
        while !pending.is_empty() {
            let mut next = Vec::new();
            for &i in &pending {
                for ti in 0..self.lookaheads[i].propagate_to.len() {
                    let target = self.lookaheads[i].propagate_to[ti];
                    let source = self.lookaheads[i].symbols.clone();
                    let added = self.lookaheads[target].symbols.insert(&source);
                    if added != 0 && !next.contains(&target) {
                        next.push(target);
                    }
                }
            }
            pending = next;
        }
        if log::log_enabled!(log::Level::Trace) {
            for (i, lookahead) in self.lookaheads.iter().enumerate() {
                log::trace!(
                    "item {} [{}] expects {:?}",
                    i,
                    self.describe_item(&self.items[i]),
                    lookahead
                        .symbols
                        .ones()
                        .map(|s| self.symbols[s].name)
                        .collect::<Vec<_>>()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::GrammarItem;

    fn with_lookaheads<'a>(src: &'a str) -> Grammar<'a> {
        let mut g = Grammar::new();
        g.parse(src).unwrap();
        g.check().unwrap();
        g.optimize().unwrap();
        g.calculate_firsts();
        g.calculate_follows();
        g.set_precedence();
        g.precompute_reachable();
        g.generate_states();
        g.generate_spontaneous_lookaheads();
        g.build_propagation_links();
        g.propagate_lookaheads();
        g
    }

    fn item_id(g: &Grammar, production: usize, position: usize) -> ItemId {
        g.items
            .iter()
            .position(|&i| i == GrammarItem { production, position })
            .unwrap()
    }

    #[test]
    fn start_item_expects_end() {
        let g = with_lookaheads("tiny { s: 'a'; }");
        assert!(g.lookaheads[0].symbols.get(END_SYMBOL));
    }

    #[test]
    fn end_propagates_to_final_items() {
        let g = with_lookaheads("tiny { s: 'a' 'b'; }");
        // The completed item of `s: a b` is reached only at end of input.
        let done = item_id(&g, 1, 2);
        assert!(g.lookaheads[done].symbols.get(END_SYMBOL));
        // The accepting item of the start production as well.
        let accept = item_id(&g, 0, 1);
        assert!(g.lookaheads[accept].symbols.get(END_SYMBOL));
    }

    #[test]
    fn spontaneous_lookahead_from_following_terminal() {
        // The [t] action keeps the alias collapse away from t.
        let g = with_lookaheads("tiny { s: t 'z'; t: 'a' [t]; }");
        let z = g.symbols.iter().position(|s| s.name == "z").unwrap();
        // In the start state, `t → · a` spontaneously expects 'z'.
        let t_start = item_id(&g, 2, 0);
        assert!(g.lookaheads[t_start].symbols.get(z));
        // And the completed `t → a ·` receives it along the shift on 'a'.
        let t_done = item_id(&g, 2, 1);
        assert!(g.lookaheads[t_done].symbols.get(z));
        assert!(!g.lookaheads[t_done].symbols.get(END_SYMBOL));
    }

    #[test]
    fn nullable_suffix_propagates_context() {
        let g = with_lookaheads("tiny { s: t u; t: 'a' [t]; u: 'b' | ; }");
        // After t, u may derive nothing, so `t → a ·` must also expect
        // whatever follows s, here end-of-input, next to FIRST(u).
        let b = g.symbols.iter().position(|s| s.name == "b").unwrap();
        let t_done = item_id(&g, 2, 1);
        assert!(g.lookaheads[t_done].symbols.get(b));
        assert!(g.lookaheads[t_done].symbols.get(END_SYMBOL));
    }

    #[test]
    fn nested_context_merges_lookaheads() {
        let g = with_lookaheads("tiny { s: 'a' s 'b' | 'c'; }");
        // `s → c ·` is reached both at top level and nested under
        // `s: 'a' s 'b'`, so its merged lookahead holds 'b' and end-of-input.
        let b = g.symbols.iter().position(|s| s.name == "b").unwrap();
        let c_done = item_id(&g, 2, 1);
        assert!(g.lookaheads[c_done].symbols.get(b));
        assert!(g.lookaheads[c_done].symbols.get(END_SYMBOL));
    }
}
