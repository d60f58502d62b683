//! Fixed-point grammar analyses: nullability, FIRST, FOLLOW, default
//! precedence anchors, and the leftmost-derivation reachability used to seed
//! LR(0) closures.

use crate::grammar::Grammar;
use crate::symbol::{ProductionId, SymbolId, SymbolKind, END_SYMBOL, START_SYMBOL};

fn add_unique<T: PartialEq + Copy>(v: &mut Vec<T>, x: T) -> bool {
    if v.contains(&x) {
        false
    } else {
        v.push(x);
        true
    }
}

impl<'a> Grammar<'a> {
    /// Computes FIRST sets and nullability for every symbol.
    ///
    /// Terminals seed their own singleton; a non-terminal accumulates, for
    /// each of its productions, the FIRST of the leading nullable run plus the
    /// first non-nullable symbol, and becomes nullable when some production
    /// has an all-nullable right-hand side. Iterates until no set grows.
    pub fn calculate_firsts(&mut self) {
        let mut added = 1;
        while added != 0 {
            added = 0;
            for i in 0..self.symbols.len() {
                if self.symbols[i].kind != SymbolKind::NonTerminal {
                    added += add_unique(&mut self.symbols[i].firsts, i) as usize;
                    continue;
                }
                for pi in 0..self.symbols[i].productions.len() {
                    let p = self.symbols[i].productions[pi];
                    let rhs = self.productions[p].rhs.clone();
                    let mut non_nullable_found = false;
                    for &r in &rhs {
                        if non_nullable_found {
                            break;
                        }
                        non_nullable_found |= !self.symbols[r].nullable;
                        let firsts = self.symbols[r].firsts.clone();
                        for f in firsts {
                            added += add_unique(&mut self.symbols[i].firsts, f) as usize;
                        }
                    }
                    if !non_nullable_found && !self.symbols[i].nullable {
                        self.symbols[i].nullable = true;
                        added += 1;
                    }
                }
            }
        }
        log::debug!("firsts computed for {} symbols", self.symbols.len());
    }

    /// Computes FOLLOW sets.
    ///
    /// `.end` seeds FOLLOW of the start symbol. Walking each production from
    /// the right, every symbol of the trailing nullable run inherits the
    /// left-hand side's FOLLOW; every earlier symbol inherits the FIRST of
    /// the symbol that stopped that run. Iterates to a fixed point.
    pub fn calculate_follows(&mut self) {
        self.symbols[START_SYMBOL].follows.push(END_SYMBOL);
        let mut added = 1;
        while added != 0 {
            added = 0;
            for i in 0..self.symbols.len() {
                for pi in 0..self.symbols[i].productions.len() {
                    let p = self.symbols[i].productions[pi];
                    let rhs = self.productions[p].rhs.clone();
                    if rhs.is_empty() {
                        continue;
                    }
                    let lhs_follows = self.symbols[i].follows.clone();
                    let mut last_before_out = rhs.len() - 1;
                    for (ri, &r) in rhs.iter().enumerate().rev() {
                        for &f in &lhs_follows {
                            added += add_unique(&mut self.symbols[r].follows, f) as usize;
                        }
                        last_before_out = ri;
                        if !self.symbols[r].nullable {
                            break;
                        }
                    }
                    let stop_firsts = self.symbols[rhs[last_before_out]].firsts.clone();
                    for ri in 0..rhs.len() - 1 {
                        for &f in &stop_firsts {
                            added += add_unique(&mut self.symbols[rhs[ri]].follows, f) as usize;
                        }
                    }
                }
            }
        }
        log::debug!("follows computed for {} symbols", self.symbols.len());
    }

    /// Defaults the precedence anchor of every unanchored production to the
    /// rightmost terminal of its right-hand side.
    pub fn set_precedence(&mut self) {
        for production in &mut self.productions {
            if production.precedence_symbol.is_some() {
                continue;
            }
            production.precedence_symbol = production
                .rhs
                .iter()
                .rev()
                .copied()
                .find(|&r| self.symbols[r].kind == SymbolKind::Terminal);
            if let Some(anchor) = production.precedence_symbol {
                log::trace!(
                    "production {} anchored to {:?}",
                    production.describe(&self.symbols),
                    self.symbols[anchor].name
                );
            }
        }
    }

    /// Pre-computes, per symbol, the productions reachable by repeatedly
    /// expanding the leftmost right-hand-side symbol. LR(0) goto construction
    /// uses this to land directly on the closure-derived kernel items.
    pub fn precompute_reachable(&mut self) {
        for i in 0..self.symbols.len() {
            let mut reachable: Vec<ProductionId> = Vec::new();
            let mut stack: Vec<SymbolId> = vec![i];
            while let Some(s) = stack.pop() {
                for pi in 0..self.symbols[s].productions.len() {
                    let p = self.symbols[s].productions[pi];
                    if self.productions[p].rhs.is_empty() {
                        continue;
                    }
                    if add_unique(&mut reachable, p) {
                        stack.push(self.productions[p].rhs[0]);
                    }
                }
            }
            self.symbols[i].reachable_by_first = reachable;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Assoc;

    fn analyzed<'a>(src: &'a str) -> Grammar<'a> {
        let mut g = Grammar::new();
        g.parse(src).unwrap();
        g.check().unwrap();
        g.optimize().unwrap();
        g.calculate_firsts();
        g.calculate_follows();
        g.set_precedence();
        g.precompute_reachable();
        g
    }

    fn sym(g: &Grammar, name: &str) -> SymbolId {
        g.symbols.iter().position(|s| s.name == name).unwrap()
    }

    #[test]
    fn firsts_of_terminals_are_singletons() {
        let g = analyzed("tiny { s: 'a' 'b'; }");
        let a = sym(&g, "a");
        assert_eq!(g.symbols[a].firsts, vec![a]);
    }

    #[test]
    fn firsts_pass_through_nullable_prefix() {
        let g = analyzed("tiny { s: o 'b'; o: 'a' | ; }");
        let s = sym(&g, "s");
        let o = sym(&g, "o");
        let a = sym(&g, "a");
        let b = sym(&g, "b");
        assert!(g.symbols[o].nullable);
        assert!(!g.symbols[s].nullable);
        let mut firsts = g.symbols[s].firsts.clone();
        firsts.sort();
        assert_eq!(firsts, vec![a.min(b), a.max(b)]);
    }

    #[test]
    fn nullability_propagates_through_chains() {
        let g = analyzed("tiny { s: o o; o: p; p: 'a' | ; }");
        assert!(g.symbols[sym(&g, "s")].nullable);
        assert!(g.symbols[sym(&g, "p")].nullable);
    }

    #[test]
    fn follows_seed_and_inherit() {
        let g = analyzed("tiny { s: 'a' s | 'b'; }");
        let s = sym(&g, "s");
        let b = sym(&g, "b");
        assert_eq!(g.symbols[START_SYMBOL].follows, vec![END_SYMBOL]);
        // s is in tail position of `s: 'a' s`, so it inherits its own FOLLOW,
        // which contains end-of-input.
        assert!(g.symbols[s].follows.contains(&END_SYMBOL));
        assert!(g.symbols[b].follows.contains(&END_SYMBOL));
    }

    #[test]
    fn follows_grow_monotonically() {
        // Running the fixed point a second time adds nothing.
        let mut g = Grammar::new();
        g.parse("tiny { s: o 'b' s | 'c'; o: 'a' | ; }").unwrap();
        g.check().unwrap();
        g.optimize().unwrap();
        g.calculate_firsts();
        g.calculate_follows();
        let snapshot: Vec<Vec<SymbolId>> =
            g.symbols.iter().map(|s| s.follows.clone()).collect();
        g.calculate_follows();
        let again: Vec<Vec<SymbolId>> =
            g.symbols.iter().map(|s| s.follows.clone()).collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn default_anchor_is_rightmost_terminal() {
        let g = analyzed("tiny { %left '+'; s: s '+' u; u: 'x' | ; }");
        let plus = sym(&g, "+");
        // `s: s '+' u` anchors to '+', the rightmost terminal.
        let p = &g.productions[g.symbols[sym(&g, "s")].productions[0]];
        assert_eq!(p.precedence_symbol, Some(plus));
        assert_eq!(p.precedence(&g.symbols), 1);
        assert_eq!(g.symbols[plus].assoc, Assoc::Left);
    }

    #[test]
    fn explicit_anchor_is_kept() {
        let g = analyzed("tiny { %left u; s: 'x' %precedence u; u: 'y'; }");
        let p = &g.productions[g.symbols[sym(&g, "s")].productions[0]];
        // The alias collapse rewired the anchor to the terminal.
        let y = sym(&g, "y");
        assert_eq!(p.precedence_symbol, Some(y));
        assert_eq!(p.precedence(&g.symbols), 1);
    }

    #[test]
    fn reachability_follows_leftmost_symbols() {
        let g = analyzed("tiny { s: t 'z'; t: u 'y' | 'w'; u: 'x' u | ; }");
        let s = sym(&g, "s");
        // From s: its own production, both of t, and the non-empty one of u.
        let reachable = &g.symbols[s].reachable_by_first;
        assert_eq!(reachable.len(), 4);
        for &p in reachable {
            assert!(!g.productions[p].rhs.is_empty());
        }
    }
}
