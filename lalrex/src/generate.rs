//! The construction pipeline, pass by pass.

use crate::dfa::Dfa;
use crate::error::Result;
use crate::grammar::Grammar;
use crate::regex::{RegexAst, RegexToken};
use crate::symbol::SymbolKind;
use crate::tables::Tables;

impl<'a> Grammar<'a> {
    /// Compiles the combined lexer machine over every whitespace regex and
    /// every terminal, in that priority order. Token ids are symbol ids.
    pub fn compile_lexer(&mut self) -> Result<()> {
        let mut tokens: Vec<RegexToken<'a>> = self.whitespace_tokens.clone();
        for (i, symbol) in self.symbols.iter().enumerate() {
            if symbol.kind == SymbolKind::Terminal {
                tokens.push(RegexToken {
                    regex: symbol.name,
                    token: i,
                    literal: symbol.literal,
                });
            }
        }
        for t in &tokens {
            log::trace!("lexer token {:?} -> {}", t.regex, t.token);
        }
        let ast = RegexAst::parse(&tokens)?;
        self.lexer_dfa = Dfa::build(&ast)?;
        Ok(())
    }
}

/// Builds the full artifact from a grammar source string.
///
/// Runs the whole pipeline: parse the meta-syntax, check and optimize the
/// grammar, compute FIRST/FOLLOW and precedence anchors, build the LR(0)
/// collection, compute LALR(1) lookaheads, emit the action table, and compile
/// the combined lexer. The first fatal error aborts with no artifact.
///
/// The returned tables borrow `src`; keep it alive as long as they are.
///
/// # Examples
///
/// ```rust
/// let tables = lalrex::generate(
///     r#"
///     calc {
///         %whitespace "[ \t]+";
///         %left '+';
///         %left '*';
///         expr: expr '+' expr [add]
///             | expr '*' expr [mul]
///             | "[0-9]+" [int];
///     }
///     "#,
/// )
/// .unwrap();
/// let events = tables.parse("1 + 2 * 3").unwrap();
/// assert!(events.len() > 5);
/// ```
pub fn generate(src: &str) -> Result<Tables<'_>> {
    let mut grammar = Grammar::new();
    grammar.parse(src)?;
    grammar.check()?;
    grammar.optimize()?;
    grammar.calculate_firsts();
    grammar.calculate_follows();
    grammar.set_precedence();
    grammar.precompute_reachable();
    grammar.generate_states();
    grammar.generate_spontaneous_lookaheads();
    grammar.build_propagation_links();
    grammar.propagate_lookaheads();
    grammar.generate_transitions()?;
    grammar.compile_lexer()?;
    Ok(Tables::from_grammar(&grammar))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LalrexError;

    #[test]
    fn lexer_prioritizes_whitespace_then_terminals() {
        let tables = generate(
            r#"ab {
                %whitespace "[ \t]+";
                s: 'a' s | "a+";
            }"#,
        )
        .unwrap();
        // "a" alone ties between the literal and the regex terminal; the
        // literal was interned first so it wins.
        let a = tables.find_symbol("a", SymbolKind::Terminal).unwrap();
        let many_a = tables.find_symbol("a+", SymbolKind::Terminal).unwrap();
        assert_eq!(tables.lex("a").unwrap(), ("a", a));
        assert_eq!(tables.lex("aa").unwrap(), ("aa", many_a));
    }

    #[test]
    fn literal_terminals_lex_verbatim() {
        let tables = generate(
            r#"lits {
                %whitespace "[ ]+";
                s: '(' s ')' | '+' | '.*';
            }"#,
        )
        .unwrap();
        let open = tables.find_symbol("(", SymbolKind::Terminal).unwrap();
        let plus = tables.find_symbol("+", SymbolKind::Terminal).unwrap();
        let dotstar = tables.find_symbol(".*", SymbolKind::Terminal).unwrap();
        assert_eq!(tables.lex("(x").unwrap(), ("(", open));
        assert_eq!(tables.lex("+").unwrap(), ("+", plus));
        // The literal '.*' matches exactly a dot and a star, nothing else.
        assert_eq!(tables.lex(".*abc").unwrap(), (".*", dotstar));
        assert!(tables.lex("ab").is_err());
    }

    #[test]
    fn pipeline_rejects_bad_regex_late() {
        let err = generate("bad { s: \"(\"; }").unwrap_err();
        assert!(matches!(err, LalrexError::MalformedRegex { .. }));
    }
}
