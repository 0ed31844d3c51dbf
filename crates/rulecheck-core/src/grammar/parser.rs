//! # Rule Grammar Parser
//!
//! Packrat-style tabulation over the grammar
//!
//! ```text
//! rctree := prs+
//! prs    := pr | PROP+ pr | pr? req
//! pr     := PROP pr+ req | PROP req
//! req    := CMP? ROBJ? (RPROP | ARPROP)
//! ```
//!
//! Both `pr` productions start with `PROP`, so no fixed lookahead decides
//! between them. Instead every rule returns all of its derivations from a
//! position, keyed by end, and the caller picks. Choices are resolved by
//! longest match: each `prs` group takes the longest span that still lets
//! the rest of the stream reduce. On equal spans `pr` beats `pr? req`, which
//! beats `PROP+ pr` (shorter `PROP` runs first). Inside `pr` the nested
//! production wins and its first child munches longest.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::grammar::derivation::{ParseTree, PrNode, PrsNode, ReqNode};
use crate::grammar::terminal::{GrammarToken, Terminal};
use crate::label::SourceSpan;

/// No reduction exists for the token stream.
///
/// `index` points at the furthest token the parser could not get past, in
/// the slice passed to [`GrammarParser::parse`]. It equals the slice length
/// when the input ended too early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("syntax error at token {index}: unexpected {}", found_label(.found))]
pub struct SyntaxError {
    pub index: usize,
    pub found: Option<Terminal>,
    pub span: Option<SourceSpan>,
}

fn found_label(found: &Option<Terminal>) -> String {
    match found {
        Some(terminal) => terminal.to_string(),
        None => "end of input".to_string(),
    }
}

/// Parser for the rule grammar.
#[derive(Debug, Clone, Default)]
pub struct GrammarParser {
    allow_bare_requirement: bool,
}

impl GrammarParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a rule whose first group is a bare requirement, with no property.
    ///
    /// Off by default: `[CMP, RPROP]` names no property and is rejected.
    pub fn with_bare_requirement(mut self, allow: bool) -> Self {
        self.allow_bare_requirement = allow;
        self
    }

    /// Reduces a token stream to a derivation.
    ///
    /// Tokens whose terminal is not rule content are skipped. The whole
    /// remaining stream must reduce.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] at the furthest offending token if no
    /// reduction exists, including for a stream with no rule content.
    pub fn parse(&self, tokens: &[GrammarToken]) -> Result<ParseTree, SyntaxError> {
        let mut packrat = Packrat::new(tokens, self.allow_bare_requirement);
        if packrat.content.is_empty() {
            return Err(packrat.error(tokens));
        }

        match packrat.reduce() {
            Some(groups) => {
                debug!(
                    tokens = tokens.len(),
                    groups = groups.len(),
                    "reduced terminal stream"
                );
                Ok(ParseTree { groups })
            }
            None => {
                let err = packrat.error(tokens);
                debug!(index = err.index, "no reduction for terminal stream");
                Err(err)
            }
        }
    }

    /// Parses a bare terminal stream; token `i` spans `i..i+1`.
    pub fn parse_terminals(&self, terminals: &[Terminal]) -> Result<ParseTree, SyntaxError> {
        self.parse(&GrammarToken::from_terminals(terminals))
    }

    pub fn accepts(&self, terminals: &[Terminal]) -> bool {
        self.parse_terminals(terminals).is_ok()
    }
}

/// All `pr` derivations from one position, by end.
type PrTable = BTreeMap<usize, PrNode>;
/// All `pr+` derivations from one position, by end.
type SeqTable = BTreeMap<usize, Vec<PrNode>>;

/// A memo entry plus the furthest content index probed while building it.
#[derive(Default)]
struct Memo<T> {
    table: Rc<T>,
    reach: usize,
}

/// One `prs` alternative, resolved against the memo tables on demand.
#[derive(Debug, Clone, Copy)]
enum Candidate {
    Single,
    Direct { pr_end: Option<usize>, req: ReqNode },
    Qualified { run: usize },
}

/// Memo tables over the rule-content stream.
///
/// Every table at `i` depends only on tables at positions after `i`, so all
/// of them are filled from the end of the stream backwards and no stream
/// length can exhaust the stack.
struct Packrat {
    content: Vec<Terminal>,
    /// Index of each content terminal in the caller's token slice.
    origin: Vec<usize>,
    allow_bare_requirement: bool,
    pr_memo: Vec<Memo<PrTable>>,
    seq_memo: Vec<Memo<SeqTable>>,
    furthest: usize,
}

impl Packrat {
    fn new(tokens: &[GrammarToken], allow_bare_requirement: bool) -> Self {
        let (origin, content): (Vec<usize>, Vec<Terminal>) = tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| token.terminal.is_rule_content())
            .map(|(i, token)| (i, token.terminal))
            .unzip();
        let slots = content.len() + 1;

        Self {
            content,
            origin,
            allow_bare_requirement,
            pr_memo: (0..slots).map(|_| Memo::default()).collect(),
            seq_memo: (0..slots).map(|_| Memo::default()).collect(),
            furthest: 0,
        }
    }

    fn expect(&mut self, i: usize, pred: impl Fn(Terminal) -> bool) -> bool {
        if self.content.get(i).is_some_and(|&t| pred(t)) {
            true
        } else {
            self.furthest = self.furthest.max(i);
            false
        }
    }

    fn error(&self, tokens: &[GrammarToken]) -> SyntaxError {
        match self.origin.get(self.furthest) {
            Some(&index) => SyntaxError {
                index,
                found: Some(tokens[index].terminal),
                span: Some(tokens[index].span),
            },
            None => SyntaxError {
                index: tokens.len(),
                found: None,
                span: None,
            },
        }
    }

    /// `rctree` over the whole stream.
    ///
    /// Each position keeps the first candidate, best first, whose end
    /// reduces to the end of the stream. On failure `furthest` holds the
    /// furthest index probed along every path tried from position 0.
    fn reduce(&mut self) -> Option<Vec<PrsNode>> {
        self.fill_tables();

        let n = self.content.len();
        let mut plan: Vec<Option<(usize, Candidate)>> = vec![None; n];
        let mut reach = vec![0; n + 1];
        for i in (0..n).rev() {
            self.furthest = 0;
            let candidates = self.prs_candidates(i);
            let mut probed = self.furthest;
            for (end, candidate) in candidates {
                probed = probed.max(reach[end]);
                if end == n || plan[end].is_some() {
                    plan[i] = Some((end, candidate));
                    break;
                }
            }
            reach[i] = probed;
        }
        self.furthest = reach[0];

        let mut groups = Vec::new();
        let mut i = 0;
        while i < n {
            let (end, candidate) = plan[i]?;
            groups.push(self.materialize(i, end, candidate)?);
            i = end;
        }
        Some(groups)
    }

    fn fill_tables(&mut self) {
        for i in (0..=self.content.len()).rev() {
            self.furthest = 0;
            let table = self.build_pr(i);
            self.pr_memo[i] = Memo {
                table: Rc::new(table),
                reach: self.furthest,
            };

            self.furthest = 0;
            let table = self.build_seq(i);
            self.seq_memo[i] = Memo {
                table: Rc::new(table),
                reach: self.furthest,
            };
        }
        self.furthest = 0;
    }

    /// Every `prs` alternative from `i` with its end, best first.
    fn prs_candidates(&mut self, i: usize) -> Vec<(usize, Candidate)> {
        // (end, alternative rank, PROP+ run length, candidate)
        let mut ranked: Vec<(usize, u8, usize, Candidate)> = Vec::new();

        let prs = self.pr_at(i);
        for &end in prs.keys() {
            ranked.push((end, 0, 0, Candidate::Single));
            if let Some((req, req_end)) = self.req_at(end) {
                let direct = Candidate::Direct {
                    pr_end: Some(end),
                    req,
                };
                ranked.push((req_end, 1, 0, direct));
            }
        }

        if i > 0 || self.allow_bare_requirement {
            if let Some((req, end)) = self.req_at(i) {
                ranked.push((end, 1, 0, Candidate::Direct { pr_end: None, req }));
            }
        }

        let mut run = 0;
        while self.expect(i + run, |t| t == Terminal::Prop) {
            run += 1;
            for &end in self.pr_at(i + run).keys() {
                ranked.push((end, 2, run, Candidate::Qualified { run }));
            }
        }

        ranked.sort_by_key(|(end, rank, run, _)| (Reverse(*end), *rank, *run));
        ranked
            .into_iter()
            .map(|(end, _, _, candidate)| (end, candidate))
            .collect()
    }

    /// Builds the derivation node for a chosen candidate.
    fn materialize(&self, i: usize, end: usize, candidate: Candidate) -> Option<PrsNode> {
        let node = match candidate {
            Candidate::Single => PrsNode::Single(self.pr_memo[i].table.get(&end)?.clone()),
            Candidate::Direct { pr_end, req } => {
                let pr = match pr_end {
                    Some(pr_end) => Some(self.pr_memo[i].table.get(&pr_end)?.clone()),
                    None => None,
                };
                PrsNode::Direct { pr, req }
            }
            Candidate::Qualified { run } => PrsNode::Qualified {
                props: self.origin[i..i + run].to_vec(),
                pr: self.pr_memo[i + run].table.get(&end)?.clone(),
            },
        };
        Some(node)
    }

    fn pr_at(&mut self, i: usize) -> Rc<PrTable> {
        let memo = &self.pr_memo[i];
        self.furthest = self.furthest.max(memo.reach);
        Rc::clone(&memo.table)
    }

    fn pr_seq_at(&mut self, i: usize) -> Rc<SeqTable> {
        let memo = &self.seq_memo[i];
        self.furthest = self.furthest.max(memo.reach);
        Rc::clone(&memo.table)
    }

    /// Every `pr` derivation from `i`.
    fn build_pr(&mut self, i: usize) -> PrTable {
        let mut table = PrTable::new();
        if self.expect(i, |t| t == Terminal::Prop) {
            let prop = self.origin[i];

            let sequences = self.pr_seq_at(i + 1);
            for (&seq_end, children) in sequences.iter().rev() {
                if let Some((req, end)) = self.req_at(seq_end) {
                    table.entry(end).or_insert_with(|| PrNode::Nested {
                        prop,
                        children: children.clone(),
                        req,
                    });
                }
            }

            if let Some((req, end)) = self.req_at(i + 1) {
                table.entry(end).or_insert(PrNode::Base { prop, req });
            }
        }
        table
    }

    /// Every `pr+` derivation from `i`.
    fn build_seq(&mut self, i: usize) -> SeqTable {
        let mut table = SeqTable::new();
        let firsts = self.pr_at(i);
        for (&first_end, first) in firsts.iter().rev() {
            table
                .entry(first_end)
                .or_insert_with(|| vec![first.clone()]);

            let rest = self.pr_seq_at(first_end);
            for (&end, tail) in rest.iter().rev() {
                table.entry(end).or_insert_with(|| {
                    let mut children = Vec::with_capacity(tail.len() + 1);
                    children.push(first.clone());
                    children.extend(tail.iter().cloned());
                    children
                });
            }
        }
        table
    }

    /// The single `req` derivation from `i`, if any.
    fn req_at(&mut self, i: usize) -> Option<(ReqNode, usize)> {
        let mut j = i;
        let cmp = if self.expect(j, |t| t == Terminal::Cmp) {
            j += 1;
            Some(self.origin[j - 1])
        } else {
            None
        };
        let robj = if self.expect(j, |t| t == Terminal::Robj) {
            j += 1;
            Some(self.origin[j - 1])
        } else {
            None
        };

        if self.expect(j, Terminal::is_value) {
            let req = ReqNode {
                cmp,
                robj,
                value: self.origin[j],
            };
            Some((req, j + 1))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::terminal::Terminal::{Arprop, Cmp, Obj, Other, Prop, Robj, Rprop};

    fn parse(terminals: &[Terminal]) -> Result<ParseTree, SyntaxError> {
        GrammarParser::new().parse_terminals(terminals)
    }

    #[test]
    fn test_base_property() {
        let tree = parse(&[Prop, Rprop]).unwrap();
        assert_eq!(
            tree.groups,
            vec![PrsNode::Single(PrNode::Base {
                prop: 0,
                req: ReqNode {
                    cmp: None,
                    robj: None,
                    value: 1
                }
            })]
        );
    }

    #[test]
    fn test_requirement_with_all_fields() {
        let tree = parse(&[Prop, Cmp, Robj, Rprop]).unwrap();
        let PrsNode::Single(pr) = &tree.groups[0] else {
            panic!("expected a single property, got {:?}", tree.groups[0]);
        };
        assert_eq!(
            *pr.req(),
            ReqNode {
                cmp: Some(1),
                robj: Some(2),
                value: 3
            }
        );
    }

    #[test]
    fn test_prop_run_qualifies_property() {
        let tree = parse(&[Prop, Prop, Rprop]).unwrap();
        assert_eq!(tree.groups.len(), 1);
        let PrsNode::Qualified { props, pr } = &tree.groups[0] else {
            panic!("expected a qualified group, got {:?}", tree.groups[0]);
        };
        assert_eq!(props, &vec![0]);
        assert_eq!(pr.prop(), 1);
    }

    #[test]
    fn test_nested_property_munches_longest() {
        let tree = parse(&[Prop, Prop, Rprop, Arprop]).unwrap();
        assert_eq!(tree.groups.len(), 1);
        let PrsNode::Single(PrNode::Nested { prop, children, req }) = &tree.groups[0] else {
            panic!("expected a nested property, got {:?}", tree.groups[0]);
        };
        assert_eq!(*prop, 0);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].prop(), 1);
        assert_eq!(req.value, 3);
    }

    #[test]
    fn test_deep_nesting() {
        let tree = parse(&[Prop, Prop, Prop, Rprop, Arprop, Arprop]).unwrap();
        let PrsNode::Single(pr) = &tree.groups[0] else {
            panic!("expected a single property");
        };
        assert_eq!(pr.depth(), 3);
    }

    #[test]
    fn test_trailing_requirement_joins_group() {
        let tree = parse(&[Prop, Rprop, Arprop]).unwrap();
        assert_eq!(tree.groups.len(), 1);
        assert!(matches!(
            &tree.groups[0],
            PrsNode::Direct { pr: Some(_), req } if req.value == 2
        ));
    }

    #[test]
    fn test_multiple_groups() {
        let tree = parse(&[Prop, Rprop, Prop, Cmp, Rprop]).unwrap();
        assert_eq!(tree.groups.len(), 2);
    }

    #[test]
    fn test_noise_is_skipped_with_original_indices() {
        let tree = parse(&[Obj, Prop, Other, Rprop]).unwrap();
        let PrsNode::Single(pr) = &tree.groups[0] else {
            panic!("expected a single property");
        };
        assert_eq!(pr.prop(), 1);
        assert_eq!(pr.req().value, 3);
    }

    #[test]
    fn test_missing_property_rejected() {
        let err = parse(&[Cmp, Rprop]).unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.found, Some(Cmp));

        let lenient = GrammarParser::new().with_bare_requirement(true);
        assert!(lenient.accepts(&[Cmp, Rprop]));
    }

    #[test]
    fn test_truncated_input() {
        let err = parse(&[Prop, Cmp]).unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.found, None);
        assert!(err.to_string().contains("end of input"));
    }

    #[test]
    fn test_empty_stream_rejected() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.index, 0);

        let err = parse(&[Obj, Other]).unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.found, None);
    }

    #[test]
    fn test_error_carries_span() {
        let tokens = vec![
            GrammarToken::new(Rprop, SourceSpan::new(0, 3)),
            GrammarToken::new(Prop, SourceSpan::new(5, 9)),
        ];
        let err = GrammarParser::new().parse(&tokens).unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.span, Some(SourceSpan::new(0, 3)));
    }

    #[test]
    fn test_long_prop_run_is_qualified() {
        let mut terminals = vec![Prop; 3000];
        terminals.push(Rprop);
        let tree = parse(&terminals).unwrap();
        assert_eq!(tree.groups.len(), 1);
        let PrsNode::Qualified { props, pr } = &tree.groups[0] else {
            panic!("expected a qualified group");
        };
        assert_eq!(props.len(), 2999);
        assert_eq!(pr.prop(), 2999);
    }

    #[test]
    fn test_many_groups() {
        let terminals: Vec<Terminal> = [Prop, Cmp, Rprop].repeat(5000);
        let tree = parse(&terminals).unwrap();
        assert_eq!(tree.groups.len(), 5000);
    }

    #[test]
    fn test_long_stream_without_requirement() {
        let err = parse(&vec![Prop; 5000]).unwrap_err();
        assert_eq!(err.index, 5000);
        assert_eq!(err.found, None);
    }
}
