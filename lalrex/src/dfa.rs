//! Follow-position DFA construction and the longest-match runtime.
//!
//! A state is labelled by the set of regex leaves that may match next. The
//! initial label is the root's firsts; for each state the character ranges of
//! its CHAR leaves are split into atomic sub-ranges, and each sub-range maps
//! to the union of the `follows` of every leaf covering it, which is the label
//! of the destination state. States are deduplicated by label, ordered.
//!
//! The result is a flat transition list grouped by source state, plus one
//! record per state with its first-transition index, accepting flag and token.

use crate::error::{LalrexError, Result};
use crate::regex::{NodeId, NodeKind, RegexAst};
use crate::ranges::UnmergedCharRanges;

/// A transition over the character range `[lo, hi)`.
///
/// When `lo == hi` the transition is a terminal move and `to` holds the id of
/// the recognized token rather than a state index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DfaTransition {
    pub from: usize,
    pub lo: u8,
    pub hi: u8,
    pub to: usize,
}

/// One state of the machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DfaState {
    /// Index of this state's first transition in the flat list.
    pub transitions_begin: usize,
    pub accepting: bool,
    /// Token reported when `accepting`.
    pub token: usize,
}

/// Numbers of states and transitions, for sizing the fixed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DfaSizes {
    pub n_states: usize,
    pub n_transitions: usize,
}

/// Table access shared by the growable and the packed machine forms.
pub trait DfaTables {
    fn states(&self) -> &[DfaState];
    fn transitions(&self) -> &[DfaTransition];

    /// Runs the machine over `input`, returning the length of the longest
    /// prefix that ends in an accepting state together with the token id.
    ///
    /// The machine keeps moving while a transition covers the next character;
    /// only when no transition applies does the current state decide between
    /// acceptance and failure.
    fn longest_match(&self, input: &[u8]) -> Option<(usize, usize)> {
        let states = self.states();
        let transitions = self.transitions();
        let mut state = 0usize;
        let mut consumed = 0usize;
        while state < states.len() {
            let c = input.get(consumed).copied().unwrap_or(0);
            let next = transitions[states[state].transitions_begin..]
                .iter()
                .take_while(|t| t.from == state)
                .find(|t| t.lo <= c && c < t.hi);
            match next {
                Some(t) => {
                    state = t.to;
                    consumed += 1;
                }
                None if states[state].accepting => {
                    return Some((consumed, states[state].token));
                }
                None => return None,
            }
        }
        None
    }
}

/// The growable machine produced by construction.
#[derive(Debug, Clone, Default)]
pub struct Dfa {
    pub states: Vec<DfaState>,
    pub transitions: Vec<DfaTransition>,
}

impl DfaTables for Dfa {
    fn states(&self) -> &[DfaState] {
        &self.states
    }
    fn transitions(&self) -> &[DfaTransition] {
        &self.transitions
    }
}

impl Dfa {
    /// Sizes needed to allocate the fixed form.
    pub fn sizes(&self) -> DfaSizes {
        DfaSizes {
            n_states: self.states.len(),
            n_transitions: self.transitions.len(),
        }
    }

    /// Builds the machine from an annotated tree.
    pub fn build(ast: &RegexAst) -> Result<Self> {
        let mut labels: Vec<Vec<NodeId>> = vec![ast.node(ast.root()).firsts.clone()];
        let mut accepting: Vec<(usize, usize)> = Vec::new();
        let mut transitions: Vec<DfaTransition> = Vec::new();

        let mut i_state = 0;
        while i_state < labels.len() {
            let mut ranges = UnmergedCharRanges::new();
            for &leaf in &labels[i_state] {
                let (lo, hi) = leaf_range(ast, leaf);
                ranges.insert_range((lo, hi));
            }

            let recognized: Vec<usize> = labels[i_state]
                .iter()
                .filter_map(|&leaf| match ast.node(leaf).kind {
                    NodeKind::Token { token } => Some(token),
                    _ => None,
                })
                .collect();

            for (lo, hi) in ranges.atomic_ranges() {
                let mut next_label: Vec<NodeId> = Vec::new();
                for &leaf in &labels[i_state] {
                    let (leaf_lo, leaf_hi) = leaf_range(ast, leaf);
                    if lo >= leaf_lo && hi <= leaf_hi {
                        for &f in &ast.node(leaf).follows {
                            if !next_label.contains(&f) {
                                next_label.push(f);
                            }
                        }
                    }
                }

                if recognized.is_empty() && lo == hi {
                    return Err(LalrexError::DegenerateDfa);
                }

                let to = if lo == hi {
                    recognized[0]
                } else {
                    let mut i_next = labels.iter().position(|l| *l == next_label);
                    if i_next.is_none() && !next_label.is_empty() {
                        labels.push(next_label);
                        i_next = Some(labels.len() - 1);
                    }
                    // An uncoverable range points one past the last state.
                    i_next.unwrap_or(labels.len())
                };
                log::trace!(
                    "dfa state {} range [{:?},{:?}) -> {}",
                    i_state,
                    lo as char,
                    hi as char,
                    to
                );
                transitions.push(DfaTransition { from: i_state, lo, hi, to });
            }

            if let Some(&token) = recognized.first() {
                accepting.push((i_state, token));
            }
            i_state += 1;
        }

        let mut states = vec![DfaState::default(); labels.len()];
        let mut begin = 0;
        for (i, state) in states.iter_mut().enumerate() {
            state.transitions_begin = begin;
            begin += transitions.iter().filter(|t| t.from == i).count();
        }
        for (i, token) in accepting {
            states[i].accepting = true;
            states[i].token = token;
        }
        log::debug!(
            "dfa built: {} states, {} transitions",
            states.len(),
            transitions.len()
        );
        Ok(Self { states, transitions })
    }
}

fn leaf_range(ast: &RegexAst, leaf: NodeId) -> (u8, u8) {
    match ast.node(leaf).kind {
        NodeKind::Char { lo, hi } => (lo, hi),
        // Token leaves contribute the degenerate range.
        _ => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::RegexToken;

    fn build(patterns: &[(&str, usize)]) -> Dfa {
        let patterns: Vec<RegexToken> = patterns
            .iter()
            .map(|&(regex, token)| RegexToken { regex, token, literal: false })
            .collect();
        Dfa::build(&RegexAst::parse(&patterns).unwrap()).unwrap()
    }

    fn lex(dfa: &Dfa, input: &str) -> Option<(usize, usize)> {
        dfa.longest_match(input.as_bytes())
    }

    #[test]
    fn single_char_roundtrip() {
        let dfa = build(&[("c", 0)]);
        assert_eq!(lex(&dfa, "c"), Some((1, 0)));
        assert_eq!(lex(&dfa, "d"), None);
        assert_eq!(lex(&dfa, ""), None);
    }

    #[test]
    fn concatenation_is_associative() {
        let left = build(&[("(ab)c", 0)]);
        let right = build(&[("a(bc)", 0)]);
        for input in ["abc", "ab", "abcd", "bca", ""] {
            assert_eq!(lex(&left, input), lex(&right, input), "on {:?}", input);
        }
        assert_eq!(lex(&left, "abc"), Some((3, 0)));
    }

    #[test]
    fn alternation_with_groups() {
        let dfa = build(&[("c|d(f?|g)", 0)]);
        for input in ["c", "d", "df", "dg"] {
            assert!(lex(&dfa, input).is_some(), "on {:?}", input);
        }
        assert_eq!(lex(&dfa, "dfg"), Some((2, 0)));
        assert_eq!(lex(&dfa, "e"), None);
    }

    #[test]
    fn longest_match_wins() {
        let dfa = build(&[("a", 0), ("aaa", 1)]);
        assert_eq!(lex(&dfa, "a"), Some((1, 0)));
        assert_eq!(lex(&dfa, "aa"), Some((1, 0)));
        assert_eq!(lex(&dfa, "aaa"), Some((3, 1)));
        assert_eq!(lex(&dfa, "aaaa"), Some((3, 1)));
    }

    #[test]
    fn first_token_wins_ties() {
        let dfa = build(&[("c|d(f?|g)", 0), ("anna", 1), (".*", 2)]);
        // The catch-all matches the longest prefix of a partial keyword.
        assert_eq!(lex(&dfa, "ann"), Some((3, 2)));
        assert_eq!(lex(&dfa, "anna"), Some((4, 1)));
        assert_eq!(lex(&dfa, "c"), Some((1, 0)));
        // Nullable catch-all accepts the empty prefix.
        assert_eq!(lex(&dfa, ""), Some((0, 2)));
    }

    #[test]
    fn numeric_tokens() {
        let dfa = build(&[
            (r"(\+|\-)?[0-9]+", 0),
            (r"(\+|\-)?[0-9]+(\.[0-9]+)?((e|E)(\+|\-)?[0-9]+)?", 1),
            ("[^h]+", 2),
        ]);
        assert_eq!(lex(&dfa, "-332.235e-34"), Some((12, 1)));
        assert_eq!(lex(&dfa, "33"), Some((2, 0)));
        assert_eq!(lex(&dfa, "ello world!"), Some((11, 2)));
    }

    #[test]
    fn sizes_are_consistent() {
        let dfa = build(&[("ab|cd", 0)]);
        let sizes = dfa.sizes();
        assert_eq!(sizes.n_states, dfa.states.len());
        assert_eq!(sizes.n_transitions, dfa.transitions.len());
        // Transition grouping covers the whole flat list.
        for (i, s) in dfa.states.iter().enumerate() {
            let count = dfa.transitions.iter().filter(|t| t.from == i).count();
            for t in &dfa.transitions[s.transitions_begin..s.transitions_begin + count] {
                assert_eq!(t.from, i);
            }
        }
    }
}
