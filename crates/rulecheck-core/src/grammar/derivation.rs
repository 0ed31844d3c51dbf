//! Derivation nodes produced by the grammar parser.
//!
//! Every `usize` is an index into the token slice the parser was given, so
//! the tree builder can look spans up without re-parsing.

use serde::Serialize;

/// `rctree := prs+`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseTree {
    pub groups: Vec<PrsNode>,
}

/// `prs := pr | PROP+ pr | pr? req`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PrsNode {
    Single(PrNode),
    Qualified { props: Vec<usize>, pr: PrNode },
    Direct { pr: Option<PrNode>, req: ReqNode },
}

/// `pr := PROP pr+ req | PROP req`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PrNode {
    Nested {
        prop: usize,
        children: Vec<PrNode>,
        req: ReqNode,
    },
    Base {
        prop: usize,
        req: ReqNode,
    },
}

/// `req := CMP? ROBJ? (RPROP | ARPROP)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReqNode {
    pub cmp: Option<usize>,
    pub robj: Option<usize>,
    pub value: usize,
}

impl PrNode {
    pub fn prop(&self) -> usize {
        match self {
            PrNode::Nested { prop, .. } | PrNode::Base { prop, .. } => *prop,
        }
    }

    pub fn req(&self) -> &ReqNode {
        match self {
            PrNode::Nested { req, .. } | PrNode::Base { req, .. } => req,
        }
    }

    /// Nesting depth: 1 for a base property.
    pub fn depth(&self) -> usize {
        match self {
            PrNode::Base { .. } => 1,
            PrNode::Nested { children, .. } => {
                1 + children.iter().map(PrNode::depth).max().unwrap_or(0)
            }
        }
    }
}
