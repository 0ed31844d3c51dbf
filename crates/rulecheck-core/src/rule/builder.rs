//! # Rule Tree Builder
//!
//! Walks a grammar derivation and emits the typed [`RuleTree`].

use crate::error::{Result, RuleCheckError};
use crate::grammar::{
    GrammarParser, GrammarToken, ParseTree, PrNode, PrsNode, ReqNode, Terminal,
};
use crate::label::Interval;
use crate::types::{PrGroup, Property, PropertyRef, Requirement, RuleTree};

/// Builds rule trees from token streams.
#[derive(Debug, Clone, Default)]
pub struct RuleTreeBuilder {
    parser: GrammarParser,
}

impl RuleTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a specifically configured parser.
    pub fn with_parser(parser: GrammarParser) -> Self {
        Self { parser }
    }

    pub fn parser(&self) -> &GrammarParser {
        &self.parser
    }

    /// Converts a derivation into a rule tree.
    ///
    /// `tokens` must be the slice `derivation` was parsed from.
    pub fn build(&self, derivation: &ParseTree, tokens: &[GrammarToken]) -> RuleTree {
        let groups = derivation
            .groups
            .iter()
            .map(|group| build_group(group, tokens))
            .collect();
        RuleTree { groups }
    }

    /// Parses `tokens` and builds the tree.
    ///
    /// # Errors
    ///
    /// Returns `RuleCheckError::NoRuleFound` if the stream does not reduce.
    pub fn build_from_tokens(&self, tokens: &[GrammarToken]) -> Result<RuleTree> {
        let derivation = self
            .parser
            .parse(tokens)
            .map_err(RuleCheckError::NoRuleFound)?;
        Ok(self.build(&derivation, tokens))
    }

    /// Builds the tree for an interval label; spans index the labeled sequence.
    pub fn build_from_iit(&self, iit: &[Interval]) -> Result<RuleTree> {
        self.build_from_tokens(&GrammarToken::from_iit(iit))
    }
}

fn build_group(group: &PrsNode, tokens: &[GrammarToken]) -> PrGroup {
    match group {
        PrsNode::Single(pr) => PrGroup {
            properties: vec![rule_ref(pr, tokens)],
            requirement: None,
        },
        PrsNode::Qualified { props, pr } => {
            let mut properties: Vec<PropertyRef> = props
                .iter()
                .map(|&i| PropertyRef::Qualifier {
                    span: tokens[i].span,
                })
                .collect();
            properties.push(rule_ref(pr, tokens));
            PrGroup {
                properties,
                requirement: None,
            }
        }
        PrsNode::Direct { pr, req } => PrGroup {
            properties: pr.iter().map(|pr| rule_ref(pr, tokens)).collect(),
            requirement: Some(build_requirement(req, tokens)),
        },
    }
}

fn rule_ref(pr: &PrNode, tokens: &[GrammarToken]) -> PropertyRef {
    PropertyRef::Rule {
        property: build_property(pr, tokens),
    }
}

fn build_property(pr: &PrNode, tokens: &[GrammarToken]) -> Property {
    let children = match pr {
        PrNode::Nested { children, .. } => children
            .iter()
            .map(|child| build_property(child, tokens))
            .collect(),
        PrNode::Base { .. } => Vec::new(),
    };
    Property {
        name: tokens[pr.prop()].span,
        children,
        requirement: build_requirement(pr.req(), tokens),
    }
}

fn build_requirement(req: &ReqNode, tokens: &[GrammarToken]) -> Requirement {
    Requirement {
        comparator: req.cmp.map(|i| tokens[i].span),
        restriction_object: req.robj.map(|i| tokens[i].span),
        value: tokens[req.value].span,
        is_alternate: tokens[req.value].terminal == Terminal::Arprop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::SourceSpan;

    fn iv(start: usize, end: usize, tag: &str) -> Interval {
        Interval::new(start, end, tag)
    }

    #[test]
    fn test_build_base_rule() {
        let seq = "设计压力不应大于5MPa";
        let iit = vec![iv(0, 4, "prop"), iv(4, 8, "cmp"), iv(8, 12, "Rprop")];
        let tree = RuleTreeBuilder::new().build_from_iit(&iit).unwrap();

        assert_eq!(tree.groups.len(), 1);
        let group = &tree.groups[0];
        assert!(group.requirement.is_none());
        let PropertyRef::Rule { property } = &group.properties[0] else {
            panic!("expected a rule property");
        };
        assert_eq!(property.name.text(seq), "设计压力");
        assert!(property.children.is_empty());
        let req = property.requirement;
        assert_eq!(req.comparator.map(|s| s.text(seq)).as_deref(), Some("不应大于"));
        assert_eq!(req.restriction_object, None);
        assert_eq!(req.value.text(seq), "5MPa");
        assert!(!req.is_alternate);
    }

    #[test]
    fn test_build_nested_rule() {
        // 设计工作压力 轴向伸长率 0.8MPa 5%
        let iit = vec![
            iv(0, 6, "prop"),
            iv(6, 11, "prop"),
            iv(11, 17, "Rprop"),
            iv(17, 19, "aRprop"),
        ];
        let tree = RuleTreeBuilder::new().build_from_iit(&iit).unwrap();
        let props = tree.properties();
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].name, SourceSpan::new(0, 6));
        assert_eq!(props[0].children.len(), 1);
        assert!(props[0].requirement.is_alternate);
        assert_eq!(props[1].name, SourceSpan::new(6, 11));
    }

    #[test]
    fn test_build_qualified_rule() {
        let iit = vec![iv(0, 2, "prop"), iv(3, 5, "prop"), iv(5, 7, "Rprop")];
        let tree = RuleTreeBuilder::new().build_from_iit(&iit).unwrap();
        let properties = &tree.groups[0].properties;
        assert_eq!(properties.len(), 2);
        assert_eq!(
            properties[0],
            PropertyRef::Qualifier {
                span: SourceSpan::new(0, 2)
            }
        );
        assert!(matches!(properties[1], PropertyRef::Rule { .. }));
    }

    #[test]
    fn test_subject_objects_are_ignored() {
        let iit = vec![
            iv(0, 3, "obj"),
            iv(4, 7, "obj"),
            iv(8, 12, "prop"),
            iv(12, 16, "cmp"),
            iv(16, 19, "Rprop"),
        ];
        let tree = RuleTreeBuilder::new().build_from_iit(&iit).unwrap();
        assert_eq!(tree.properties().len(), 1);
        assert_eq!(tree.properties()[0].name, SourceSpan::new(8, 12));
    }

    #[test]
    fn test_no_rule_found() {
        let iit = vec![iv(0, 4, "cmp"), iv(4, 8, "Rprop")];
        let err = RuleTreeBuilder::new().build_from_iit(&iit).unwrap_err();
        let RuleCheckError::NoRuleFound(syntax) = &err else {
            panic!("expected NoRuleFound, got {err:?}");
        };
        assert_eq!(syntax.index, 0);
        assert_eq!(syntax.span, Some(SourceSpan::new(0, 4)));
        assert!(!err.is_batch_fatal());
    }

    #[test]
    fn test_direct_requirement_group() {
        let iit = vec![iv(0, 2, "prop"), iv(2, 4, "Rprop"), iv(5, 7, "aRprop")];
        let tree = RuleTreeBuilder::new().build_from_iit(&iit).unwrap();
        let group = &tree.groups[0];
        assert_eq!(group.properties.len(), 1);
        let req = group.requirement.expect("group requirement");
        assert!(req.is_alternate);
        assert_eq!(tree.requirements().len(), 2);
    }
}
