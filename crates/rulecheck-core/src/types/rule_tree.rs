//! # Rule Tree
//!
//! Typed result of reducing a sentence's terminal stream. Every node points
//! back into the source sentence through a [`SourceSpan`]; text is only
//! resolved on demand.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::label::SourceSpan;

/// Root of a parsed rule: one or more property groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTree {
    pub groups: Vec<PrGroup>,
}

/// One top-level group of the rule.
///
/// `requirement` is set only for groups that end in a bare requirement
/// (optionally preceded by a property).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrGroup {
    pub properties: Vec<PropertyRef>,
    pub requirement: Option<Requirement>,
}

/// A property mentioned by a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyRef {
    /// A leading property name that qualifies the rule after it.
    Qualifier { span: SourceSpan },
    /// A property with its own requirement.
    Rule { property: Property },
}

/// A property, its nested sub-properties, and the requirement closing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: SourceSpan,
    pub children: Vec<Property>,
    pub requirement: Requirement,
}

/// `comparator? restriction_object? value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub comparator: Option<SourceSpan>,
    pub restriction_object: Option<SourceSpan>,
    pub value: SourceSpan,
    /// The value was tagged as an alternate (`aRprop`).
    pub is_alternate: bool,
}

impl RuleTree {
    /// Every property with a requirement, depth first.
    pub fn properties(&self) -> Vec<&Property> {
        let mut out = Vec::new();
        for group in &self.groups {
            for property in &group.properties {
                if let PropertyRef::Rule { property } = property {
                    collect_properties(property, &mut out);
                }
            }
        }
        out
    }

    /// Every requirement in source order of its value.
    pub fn requirements(&self) -> Vec<&Requirement> {
        let mut out: Vec<&Requirement> = self
            .properties()
            .into_iter()
            .map(|property| &property.requirement)
            .chain(self.groups.iter().filter_map(|g| g.requirement.as_ref()))
            .collect();
        out.sort_by_key(|req| req.value.start);
        out
    }

    /// Indented plain-text outline, resolving spans against `seq`.
    pub fn outline(&self, seq: &str) -> String {
        let mut out = String::new();
        for (i, group) in self.groups.iter().enumerate() {
            let _ = writeln!(out, "group {}", i + 1);
            for property in &group.properties {
                match property {
                    PropertyRef::Qualifier { span } => {
                        let _ = writeln!(out, "  qualifier {}", span.text(seq));
                    }
                    PropertyRef::Rule { property } => outline_property(property, seq, 1, &mut out),
                }
            }
            if let Some(req) = &group.requirement {
                let _ = writeln!(out, "  {}", req.describe(seq));
            }
        }
        out
    }
}

impl Requirement {
    /// `cmp=... robj=... value=...` with spans resolved against `seq`.
    pub fn describe(&self, seq: &str) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(cmp) = self.comparator {
            parts.push(format!("cmp={}", cmp.text(seq)));
        }
        if let Some(robj) = self.restriction_object {
            parts.push(format!("robj={}", robj.text(seq)));
        }
        let key = if self.is_alternate { "alt" } else { "value" };
        parts.push(format!("{key}={}", self.value.text(seq)));
        parts.join(" ")
    }

    /// The whole `[first, last)` range covered by the requirement.
    pub fn span(&self) -> SourceSpan {
        let start = self
            .comparator
            .or(self.restriction_object)
            .unwrap_or(self.value)
            .start;
        SourceSpan::new(start, self.value.end)
    }
}

fn collect_properties<'a>(property: &'a Property, out: &mut Vec<&'a Property>) {
    out.push(property);
    for child in &property.children {
        collect_properties(child, out);
    }
}

fn outline_property(property: &Property, seq: &str, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{indent}property {}", property.name.text(seq));
    for child in &property.children {
        outline_property(child, seq, depth + 1, out);
    }
    let _ = writeln!(out, "{indent}  {}", property.requirement.describe(seq));
}
