//! Grammar meta-syntax front end.
//!
//! Parses the grammar specification
//!
//! ```text
//! grammar   := id '{' statement* '}'
//! statement := assocStmt | whitespaceStmt | productionStmt
//! assocStmt := ('%none' | '%left' | '%right') symbol+ ';'
//! whitespaceStmt := '%whitespace' regex+ ';'
//! productionStmt := id ':' alternative ('|' alternative)* ';'
//! alternative := symbol* ('%precedence' symbol)? ('[' id ']')?
//! symbol := 'error' | literal | regex | id
//! ```
//!
//! into the symbol and production tables, checks it, and applies the
//! alias-collapsing optimization. Comments and whitespace are skipped between
//! tokens; each statement matcher runs inside a tentative frame so a failed
//! alternative rewinds the cursor.

use crate::actions::GrammarTransition;
use crate::dfa::Dfa;
use crate::error::{LalrexError, Result};
use crate::lookahead::Lookahead;
use crate::matcher::Matcher;
use crate::regex::RegexToken;
use crate::states::{GrammarItem, GrammarState};
use crate::symbol::{
    Assoc, Production, ProductionId, Symbol, SymbolId, SymbolKind, END_SYMBOL, ERROR_SYMBOL,
    START_SYMBOL, WHITESPACE_SYMBOL,
};

/// The grammar under construction: every arena filled in by the pipeline
/// passes, from the parsed symbols through to the LALR tables and the
/// combined lexer machine.
#[derive(Debug, Default)]
pub struct Grammar<'a> {
    pub name: &'a str,
    pub symbols: Vec<Symbol<'a>>,
    pub productions: Vec<Production<'a>>,
    pub whitespace_tokens: Vec<RegexToken<'a>>,
    pub current_precedence: usize,

    pub items: Vec<GrammarItem>,
    pub states: Vec<GrammarState>,
    /// Transitions per state, filled by LR(0) construction (shifts) and the
    /// action emitter (reductions).
    pub transitions: Vec<Vec<GrammarTransition>>,
    pub lookaheads: Vec<Lookahead>,

    pub lexer_dfa: Dfa,
}

impl<'a> Grammar<'a> {
    pub fn new() -> Self {
        let mut grammar = Self::default();
        grammar.add_generic_symbols();
        grammar
    }

    /// Inserts the four pseudo-symbols at their fixed low ids.
    fn add_generic_symbols(&mut self) {
        debug_assert!(self.symbols.is_empty());
        self.symbols
            .push(Symbol::new(".start", SymbolKind::NonTerminal));
        self.symbols.push(Symbol::new(".end", SymbolKind::End));
        self.symbols.push(Symbol::new(".error", SymbolKind::Null));
        self.symbols
            .push(Symbol::new(".whitespace", SymbolKind::Null));
    }

    /// Finds the symbol with the given name and kind, inserting it if absent.
    /// Repeated calls with the same pair return the same id.
    pub fn insert_or_find_symbol(&mut self, name: &'a str, kind: SymbolKind) -> SymbolId {
        if let Some(i) = self
            .symbols
            .iter()
            .position(|s| s.name == name && s.kind == kind)
        {
            i
        } else {
            self.symbols.push(Symbol::new(name, kind));
            self.symbols.len() - 1
        }
    }

    /// `symbol := 'error' | literal | regex | id`
    fn match_symbol(&mut self, m: &mut Matcher<'a>) -> Result<Option<SymbolId>> {
        m.match_whitespace_or_comments();
        if let Some(l) = m.match_literal()? {
            let id = self.insert_or_find_symbol(l, SymbolKind::Terminal);
            self.symbols[id].literal = true;
            return Ok(Some(id));
        }
        if let Some(r) = m.match_regex()? {
            return Ok(Some(self.insert_or_find_symbol(r, SymbolKind::Terminal)));
        }
        if let Some(id) = m.match_id() {
            if id == "error" {
                return Ok(Some(ERROR_SYMBOL));
            }
            return Ok(Some(self.insert_or_find_symbol(id, SymbolKind::NonTerminal)));
        }
        Ok(None)
    }

    /// `assocStmt := ('%none' | '%left' | '%right') symbol+ ';'`
    ///
    /// Each statement opens a new precedence level; every symbol it names
    /// receives the level and the associativity, which can be assigned only
    /// once per symbol.
    fn match_associativity_statement(&mut self, m: &mut Matcher<'a>) -> Result<Option<()>> {
        m.tentative(|m| {
            m.match_whitespace_or_comments();
            let assoc = if m.match_str("%none") {
                Assoc::None
            } else if m.match_str("%left") {
                Assoc::Left
            } else if m.match_str("%right") {
                Assoc::Right
            } else {
                return Ok(None);
            };
            log::trace!("matched {:?} associativity statement", assoc);

            self.current_precedence += 1;
            while let Some(i) = self.match_symbol(m)? {
                let symbol = &mut self.symbols[i];
                if symbol.precedence != 0 {
                    return Err(LalrexError::Redeclaration {
                        name: symbol.name.to_string(),
                        what: "precedence",
                    });
                }
                symbol.assoc = assoc;
                symbol.precedence = self.current_precedence;
                log::trace!(
                    "symbol {:?} gets {:?} at precedence {}",
                    symbol.name,
                    assoc,
                    self.current_precedence
                );
            }

            m.match_whitespace_or_comments();
            if !m.match_char(b';') {
                return Err(LalrexError::Syntax {
                    expected: "expected ';' to end associativity statement",
                    position: m.position(),
                });
            }
            Ok(Some(()))
        })
    }

    /// `whitespaceStmt := '%whitespace' regex+ ';'`
    fn match_whitespace_statement(&mut self, m: &mut Matcher<'a>) -> Result<Option<()>> {
        m.tentative(|m| {
            m.match_whitespace_or_comments();
            if !m.match_str("%whitespace") {
                return Ok(None);
            }
            m.match_whitespace_or_comments();
            while let Some(regex) = m.match_regex()? {
                log::trace!("whitespace regex {:?}", regex);
                self.whitespace_tokens.push(RegexToken {
                    regex,
                    token: WHITESPACE_SYMBOL,
                    literal: false,
                });
                m.match_whitespace_or_comments();
            }
            if !m.match_char(b';') {
                return Err(LalrexError::Syntax {
                    expected: "expected ';' to end whitespace statement",
                    position: m.position(),
                });
            }
            Ok(Some(()))
        })
    }

    /// `productionStmt := id ':' alternative ('|' alternative)* ';'`
    ///
    /// The first left-hand side becomes the body of the auto-synthesized
    /// production `.start → lhs`.
    fn match_production_statement(&mut self, m: &mut Matcher<'a>) -> Result<Option<()>> {
        m.tentative(|m| {
            m.match_whitespace_or_comments();
            let Some(id) = m.match_id() else {
                return Ok(None);
            };
            let lhs = self.insert_or_find_symbol(id, SymbolKind::NonTerminal);
            log::trace!("production lhs {:?}", id);

            if self.productions.is_empty() {
                self.productions
                    .push(Production::new(START_SYMBOL, vec![lhs]));
                self.symbols[START_SYMBOL].productions.push(0);
            }

            m.match_whitespace_or_comments();
            if !m.match_char(b':') {
                return Ok(None);
            }

            loop {
                let mut rhs = Vec::new();
                m.match_whitespace_or_comments();
                while let Some(symbol) = self.match_symbol(m)? {
                    rhs.push(symbol);
                    m.match_whitespace_or_comments();
                }

                let mut precedence_symbol = None;
                if m.match_str("%precedence") {
                    let Some(symbol) = self.match_symbol(m)? else {
                        return Err(LalrexError::Syntax {
                            expected: "expected symbol from which to infer the precedence",
                            position: m.position(),
                        });
                    };
                    self.symbols[symbol].referred_as_precedence = true;
                    precedence_symbol = Some(symbol);
                    m.match_whitespace_or_comments();
                }

                let mut action = None;
                if m.match_char(b'[') {
                    m.match_whitespace_or_comments();
                    let Some(tag) = m.match_id() else {
                        return Err(LalrexError::Syntax {
                            expected: "expected identifier to be used as action",
                            position: m.position(),
                        });
                    };
                    action = Some(tag);
                    m.match_whitespace_or_comments();
                    if !m.match_char(b']') {
                        return Err(LalrexError::Syntax {
                            expected: "expected ']' to end action",
                            position: m.position(),
                        });
                    }
                    m.match_whitespace_or_comments();
                }

                self.symbols[lhs].productions.push(self.productions.len());
                self.productions.push(Production {
                    lhs,
                    rhs,
                    precedence_symbol,
                    action,
                });
                log::trace!(
                    "added production {}",
                    self.productions.last().unwrap().describe(&self.symbols)
                );

                if !m.match_char(b'|') {
                    break;
                }
            }

            if !m.match_char(b';') {
                return Err(LalrexError::Syntax {
                    expected: "expected ';' to end production statement",
                    position: m.position(),
                });
            }
            Ok(Some(()))
        })
    }

    /// Parses the whole grammar source into the symbol/production tables.
    pub fn parse(&mut self, src: &'a str) -> Result<()> {
        if !src.is_ascii() {
            return Err(LalrexError::NonAsciiGrammar);
        }
        let mut m = Matcher::new(src);
        m.match_whitespace_or_comments();
        let Some(name) = m.match_id() else {
            return Err(LalrexError::Syntax {
                expected: "expected identifier to name the grammar",
                position: m.position(),
            });
        };
        self.name = name;
        m.match_whitespace_or_comments();
        if !m.match_char(b'{') {
            return Err(LalrexError::Syntax {
                expected: "empty grammar: expected '{'",
                position: m.position(),
            });
        }

        while self.match_associativity_statement(&mut m)?.is_some()
            || self.match_whitespace_statement(&mut m)?.is_some()
            || self.match_production_statement(&mut m)?.is_some()
        {}

        m.match_whitespace_or_comments();
        if !m.match_char(b'}') {
            return Err(LalrexError::Syntax {
                expected: "expected '}' to end the grammar",
                position: m.position(),
            });
        }
        m.match_whitespace_or_comments();
        if !m.is_empty() {
            return Err(LalrexError::Syntax {
                expected: "expected end of input after the grammar",
                position: m.position(),
            });
        }
        // A body with no production statements never synthesized the start
        // production; there is nothing to build tables from.
        if self.productions.is_empty() {
            return Err(LalrexError::Syntax {
                expected: "empty grammar: expected at least one production",
                position: m.position(),
            });
        }
        log::debug!(
            "grammar {:?} parsed: {} symbols, {} productions",
            self.name,
            self.symbols.len(),
            self.productions.len()
        );
        Ok(())
    }

    /// Verifies that every non-terminal is defined and every symbol is used.
    pub fn check(&self) -> Result<()> {
        for symbol in &self.symbols {
            if symbol.kind == SymbolKind::NonTerminal
                && symbol.productions.is_empty()
                && !symbol.referred_as_precedence
            {
                return Err(LalrexError::UndefinedSymbol {
                    name: symbol.name.to_string(),
                });
            }
        }

        let mut counts = vec![0usize; self.symbols.len()];
        for production in &self.productions {
            for &r in &production.rhs {
                counts[r] += 1;
            }
            if let Some(p) = production.precedence_symbol {
                counts[p] += 1;
            }
        }
        for (i, symbol) in self.symbols.iter().enumerate() {
            let pseudo = matches!(
                i,
                START_SYMBOL | END_SYMBOL | ERROR_SYMBOL | WHITESPACE_SYMBOL
            );
            if !pseudo && counts[i] == 0 {
                return Err(LalrexError::UnreferencedSymbol {
                    name: symbol.name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Rewrites one reference during symbol removal, compacting indices.
    fn replace_symbol_reference(
        target: &mut SymbolId,
        replaced: SymbolId,
        replacement: SymbolId,
    ) {
        if *target == replaced {
            *target = replacement;
        }
        if *target > replaced {
            *target -= 1;
        }
    }

    /// Replaces every occurrence of `replaced` with `replacement` and drops
    /// the symbol. Precedence and associativity carry over to the replacement
    /// unless it already declares its own, in which case declaring both is
    /// fatal.
    fn replace_and_remove_symbol(
        &mut self,
        replaced: SymbolId,
        replacement: SymbolId,
    ) -> Result<()> {
        let both_declared = |a: usize, b: usize| a != 0 && b != 0;
        if both_declared(
            self.symbols[replaced].precedence,
            self.symbols[replacement].precedence,
        ) {
            return Err(LalrexError::DoubleDeclaration {
                replaced: self.symbols[replaced].name.to_string(),
                replacement: self.symbols[replacement].name.to_string(),
                what: "precedence",
            });
        }
        if self.symbols[replaced].assoc != Assoc::None
            && self.symbols[replacement].assoc != Assoc::None
        {
            return Err(LalrexError::DoubleDeclaration {
                replaced: self.symbols[replaced].name.to_string(),
                replacement: self.symbols[replacement].name.to_string(),
                what: "associativity",
            });
        }
        if self.symbols[replaced].precedence != 0 {
            self.symbols[replacement].precedence = self.symbols[replaced].precedence;
        }
        if self.symbols[replaced].assoc != Assoc::None {
            self.symbols[replacement].assoc = self.symbols[replaced].assoc;
        }
        if self.symbols[replaced].referred_as_precedence {
            self.symbols[replacement].referred_as_precedence = true;
        }

        for production in &mut self.productions {
            Self::replace_symbol_reference(&mut production.lhs, replaced, replacement);
            for r in &mut production.rhs {
                Self::replace_symbol_reference(r, replaced, replacement);
            }
            if let Some(p) = &mut production.precedence_symbol {
                Self::replace_symbol_reference(p, replaced, replacement);
            }
        }
        self.symbols.remove(replaced);
        Ok(())
    }

    /// Drops a production, renumbering the per-symbol production lists.
    fn remove_production(&mut self, production: ProductionId) {
        log::trace!(
            "removing production {}",
            self.productions[production].describe(&self.symbols)
        );
        self.productions.remove(production);
        for symbol in &mut self.symbols {
            symbol.productions.retain(|&p| p != production);
            for p in &mut symbol.productions {
                if *p > production {
                    *p -= 1;
                }
            }
        }
    }

    /// One step of the alias collapse: finds a non-terminal whose single
    /// production is an unactioned alias for a terminal, and substitutes the
    /// terminal for it everywhere.
    fn remove_one_redundant_production(&mut self) -> Result<bool> {
        for i in 0..self.symbols.len() {
            if matches!(i, START_SYMBOL | ERROR_SYMBOL) {
                continue;
            }
            let symbol = &self.symbols[i];
            let &[production] = symbol.productions.as_slice() else {
                continue;
            };
            let p = &self.productions[production];
            if p.action.is_some() {
                continue;
            }
            let &[actual] = p.rhs.as_slice() else {
                continue;
            };
            if self.symbols[actual].kind != SymbolKind::Terminal {
                continue;
            }
            log::trace!(
                "symbol {:?} with precedence {} is an alias for terminal {:?} with precedence {}",
                symbol.name,
                symbol.precedence,
                self.symbols[actual].name,
                self.symbols[actual].precedence
            );
            self.remove_production(production);
            self.replace_and_remove_symbol(i, actual)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Collapses single-production terminal aliases to a fixed point.
    pub fn optimize(&mut self) -> Result<()> {
        while self.remove_one_redundant_production()? {}
        log::debug!(
            "grammar optimized: {} symbols, {} productions",
            self.symbols.len(),
            self.productions.len()
        );
        Ok(())
    }

    pub fn describe_item(&self, item: &GrammarItem) -> String {
        item.describe(&self.productions, &self.symbols)
    }

    pub fn describe_state(&self, state: &GrammarState, prefix: &str) -> String {
        state.describe(&self.items, &self.productions, &self.symbols, prefix)
    }
}
