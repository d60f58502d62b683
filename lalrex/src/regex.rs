//! Regular expression syntax trees.
//!
//! A hand-written precedence-climbing parser turns each regex into a tree of
//! tagged nodes held in a single arena; cross-links (the `follows` lists
//! written by the annotation pass) are dense indices into that arena, never
//! pointers, since they may refer forward in the tree.
//!
//! Several regexes are compiled together: each is wrapped as
//! `AND(expr, TOKEN(id))` and the wrappers are folded right into a chain of
//! `OR`, so one machine recognizes every token and reports which one matched.

use crate::error::{LalrexError, Result};
use crate::matcher::Matcher;
use crate::ranges::{MergedCharRanges, CHAR_CLASSES, CHAR_MAX};

/// Index of a node in the arena.
pub type NodeId = usize;

/// The tagged node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Or(NodeId, NodeId),
    And(NodeId, NodeId),
    Opt(NodeId),
    Many(NodeId),
    NonZero(NodeId),
    /// Matches one character in the half-open range `[lo, hi)`.
    Char { lo: u8, hi: u8 },
    /// Marks acceptance of the token with the given id.
    Token { token: usize },
}

/// A node plus its follow-position annotations.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub nullable: bool,
    pub firsts: Vec<NodeId>,
    pub lasts: Vec<NodeId>,
    pub follows: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            nullable: false,
            firsts: Vec::new(),
            lasts: Vec::new(),
            follows: Vec::new(),
        }
    }
}

/// A regex string tagged with the token id it recognizes.
///
/// A `literal` pattern is matched verbatim: escape sequences still apply, but
/// the regex operators do not, so `'a+b'` in a grammar matches the three
/// characters `a+b`.
#[derive(Debug, Clone, Copy)]
pub struct RegexToken<'a> {
    pub regex: &'a str,
    pub token: usize,
    pub literal: bool,
}

/// Arena of regex nodes; children always precede their parents.
#[derive(Debug, Clone, Default)]
pub struct RegexAst {
    nodes: Vec<Node>,
    root: NodeId,
}

impl RegexAst {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        self.nodes.len() - 1
    }

    /// Parses an ordered list of regexes into one combined tree.
    ///
    /// Earlier entries take priority when several tokens accept the same
    /// longest prefix.
    pub fn parse(patterns: &[RegexToken]) -> Result<Self> {
        let mut ast = Self::default();
        let mut tagged = Vec::with_capacity(patterns.len());
        for pat in patterns {
            let mut m = Matcher::new(pat.regex);
            let parsed = if pat.literal {
                match_literal_chars(&mut m, &mut ast)
            } else {
                match_or_expr(&mut m, &mut ast)?
            };
            let expr = match parsed {
                Some(expr) if m.is_empty() => expr,
                _ => {
                    return Err(LalrexError::MalformedRegex {
                        regex: pat.regex.to_string(),
                    })
                }
            };
            let token = ast.push(NodeKind::Token { token: pat.token });
            tagged.push(ast.push(NodeKind::And(expr, token)));
        }
        let root = tagged
            .into_iter()
            .rev()
            .reduce(|rhs, lhs| ast.push(NodeKind::Or(lhs, rhs)))
            .ok_or(LalrexError::MalformedRegex {
                regex: String::new(),
            })?;
        ast.root = root;
        ast.annotate();
        Ok(ast)
    }

    /// Computes nullable, firsts, lasts and follows for every node.
    ///
    /// The arena orders children before parents, so a single forward sweep is
    /// a bottom-up traversal and a second forward sweep sees every subtree
    /// before the node that combines it.
    fn annotate(&mut self) {
        for i in 0..self.nodes.len() {
            self.nodes[i].nullable = match self.nodes[i].kind {
                NodeKind::Or(l, r) => self.nodes[l].nullable || self.nodes[r].nullable,
                NodeKind::And(l, r) => self.nodes[l].nullable && self.nodes[r].nullable,
                NodeKind::Opt(_) | NodeKind::Many(_) => true,
                NodeKind::NonZero(c) => self.nodes[c].nullable,
                NodeKind::Char { lo, hi } => lo == hi,
                NodeKind::Token { .. } => true,
            };
        }

        for i in 0..self.nodes.len() {
            let (firsts, lasts) = match self.nodes[i].kind {
                NodeKind::Or(l, r) => {
                    let mut firsts = self.nodes[l].firsts.clone();
                    firsts.extend_from_slice(&self.nodes[r].firsts);
                    let mut lasts = self.nodes[l].lasts.clone();
                    lasts.extend_from_slice(&self.nodes[r].lasts);
                    (firsts, lasts)
                }
                NodeKind::And(l, r) => {
                    let mut firsts = self.nodes[l].firsts.clone();
                    if self.nodes[l].nullable {
                        firsts.extend_from_slice(&self.nodes[r].firsts);
                    }
                    let mut lasts = self.nodes[r].lasts.clone();
                    if self.nodes[r].nullable {
                        lasts.extend_from_slice(&self.nodes[l].lasts);
                    }
                    (firsts, lasts)
                }
                NodeKind::Opt(c) | NodeKind::Many(c) | NodeKind::NonZero(c) => {
                    (self.nodes[c].firsts.clone(), self.nodes[c].lasts.clone())
                }
                NodeKind::Char { .. } | NodeKind::Token { .. } => (vec![i], vec![i]),
            };
            self.nodes[i].firsts = firsts;
            self.nodes[i].lasts = lasts;
        }

        for i in 0..self.nodes.len() {
            match self.nodes[i].kind {
                NodeKind::And(l, r) => {
                    let firsts = self.nodes[r].firsts.clone();
                    for last in self.nodes[l].lasts.clone() {
                        self.nodes[last].follows.extend_from_slice(&firsts);
                    }
                }
                NodeKind::Many(c) | NodeKind::NonZero(c) => {
                    let firsts = self.nodes[i].firsts.clone();
                    for last in self.nodes[c].lasts.clone() {
                        if matches!(
                            self.nodes[last].kind,
                            NodeKind::Char { .. } | NodeKind::Token { .. }
                        ) {
                            self.nodes[last].follows.extend_from_slice(&firsts);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// A quoted literal body: possibly escaped characters, concatenated, with no
/// operator interpretation.
fn match_literal_chars(m: &mut Matcher, ast: &mut RegexAst) -> Option<NodeId> {
    let mut expr: Option<NodeId> = None;
    while let Some(c) = m.match_possibly_escaped_char_not_in(&[]) {
        let node = ast.push(NodeKind::Char { lo: c, hi: c + 1 });
        expr = Some(match expr {
            Some(prev) => ast.push(NodeKind::And(prev, node)),
            None => node,
        });
    }
    expr
}

/// `orExpr := andExpr ('|' andExpr)?`
fn match_or_expr(m: &mut Matcher, ast: &mut RegexAst) -> Result<Option<NodeId>> {
    let Some(lhs) = match_and_expr(m, ast)? else {
        return Ok(None);
    };
    let rhs = m.tentative(|m| {
        if !m.match_char(b'|') {
            return Ok(None);
        }
        match_and_expr(m, ast)
    })?;
    Ok(Some(match rhs {
        Some(rhs) => ast.push(NodeKind::Or(lhs, rhs)),
        None => lhs,
    }))
}

/// `andExpr := postfixExpr andExpr?`, concatenation, right-nested.
fn match_and_expr(m: &mut Matcher, ast: &mut RegexAst) -> Result<Option<NodeId>> {
    let Some(lhs) = match_postfix_expr(m, ast)? else {
        return Ok(None);
    };
    Ok(Some(match match_and_expr(m, ast)? {
        Some(rhs) => ast.push(NodeKind::And(lhs, rhs)),
        None => lhs,
    }))
}

/// `postfixExpr := (bracket | group | dot | escapedChar) ('+'|'?'|'*')?`
fn match_postfix_expr(m: &mut Matcher, ast: &mut RegexAst) -> Result<Option<NodeId>> {
    let mut expr = match_bracket_expr(m, ast)?;
    if expr.is_none() {
        expr = match_sub_expr(m, ast)?;
    }
    if expr.is_none() {
        expr = match_dot(m, ast);
    }
    if expr.is_none() {
        expr = match_escaped_char(m, ast);
    }
    let Some(expr) = expr else {
        return Ok(None);
    };
    Ok(Some(match m.match_any_char_in(b"+?*") {
        Some(b'+') => ast.push(NodeKind::NonZero(expr)),
        Some(b'?') => ast.push(NodeKind::Opt(expr)),
        Some(b'*') => ast.push(NodeKind::Many(expr)),
        _ => expr,
    }))
}

/// `group := '(' orExpr ')'`
fn match_sub_expr(m: &mut Matcher, ast: &mut RegexAst) -> Result<Option<NodeId>> {
    m.tentative(|m| {
        if !m.match_char(b'(') {
            return Ok(None);
        }
        let Some(expr) = match_or_expr(m, ast)? else {
            return Ok(None);
        };
        if !m.match_char(b')') {
            return Ok(None);
        }
        Ok(Some(expr))
    })
}

/// `.` matches any char but `\0`.
fn match_dot(m: &mut Matcher, ast: &mut RegexAst) -> Option<NodeId> {
    if m.match_char(b'.') {
        Some(ast.push(NodeKind::Char { lo: 1, hi: CHAR_MAX }))
    } else {
        None
    }
}

/// Any char outside `|*+?()`, with the escape mapping applied.
fn match_escaped_char(m: &mut Matcher, ast: &mut RegexAst) -> Option<NodeId> {
    let c = m.match_possibly_escaped_char_not_in(b"|*+?()")?;
    Some(ast.push(NodeKind::Char { lo: c, hi: c + 1 }))
}

/// `bracket := '[' '^'? item+ ']'` with POSIX classes, single chars and
/// `X-Y` ranges; `-` right after `[`/`[^` or right before `]` is literal.
fn match_bracket_expr(m: &mut Matcher, ast: &mut RegexAst) -> Result<Option<NodeId>> {
    m.tentative(|m| {
        if !m.match_char(b'[') {
            return Ok(None);
        }
        let negated = m.match_char(b'^');
        let mut matchable = MergedCharRanges::new();
        if m.match_char(b'-') {
            matchable.insert_char(b'-');
        }

        loop {
            if let Some(class) = CHAR_CLASSES.iter().find(|class| m.match_str(class.name)) {
                log::trace!("bracket expression matched class {}", class.name);
                matchable.insert_class(class);
                continue;
            }
            let Some(b) = m.match_possibly_escaped_char_not_in(b"^]-") else {
                break;
            };
            let range_end = m.tentative(|m| {
                if !m.match_char(b'-') {
                    return Ok(None);
                }
                Ok(m.match_possibly_escaped_char_not_in(b"^]-"))
            })?;
            match range_end {
                Some(e) => matchable.insert_range((b, e)),
                None => matchable.insert_char(b),
            }
        }

        if m.match_char(b'-') {
            matchable.insert_char(b'-');
        }
        if !m.match_char(b']') {
            return Ok(None);
        }
        if negated {
            matchable.negate();
        }

        // Right-nested OR of one CHAR node per merged interval.
        let mut expr: Option<NodeId> = None;
        for &(lo, hi) in matchable.ranges() {
            let node = ast.push(NodeKind::Char { lo, hi });
            expr = Some(match expr {
                Some(prev) => ast.push(NodeKind::Or(prev, node)),
                None => node,
            });
        }
        Ok(expr)
    })
}
