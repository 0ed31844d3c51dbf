use std::fmt;

use serde::{Deserialize, Serialize};

use crate::label::{Interval, SourceSpan};

/// Terminal categories of the rule grammar.
///
/// Only the first five are rule content; the rest are accepted in the
/// input and dropped before reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Terminal {
    Prop,
    Cmp,
    Robj,
    Rprop,
    Arprop,
    Obj,
    Other,
    Others,
    Char,
    Newline,
}

impl Terminal {
    /// Maps a fine-grained tag to its terminal.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "prop" => Self::Prop,
            "cmp" => Self::Cmp,
            "Robj" => Self::Robj,
            "Rprop" => Self::Rprop,
            "aRprop" => Self::Arprop,
            "obj" | "sobj" => Self::Obj,
            _ => Self::Other,
        }
    }

    /// Whether the grammar reduces this terminal.
    #[must_use]
    pub fn is_rule_content(self) -> bool {
        matches!(
            self,
            Self::Prop | Self::Cmp | Self::Robj | Self::Rprop | Self::Arprop
        )
    }

    /// `RPROP` or `ARPROP`.
    #[must_use]
    pub fn is_value(self) -> bool {
        matches!(self, Self::Rprop | Self::Arprop)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prop => "PROP",
            Self::Cmp => "CMP",
            Self::Robj => "ROBJ",
            Self::Rprop => "RPROP",
            Self::Arprop => "ARPROP",
            Self::Obj => "OBJ",
            Self::Other => "OTHER",
            Self::Others => "OTHERS",
            Self::Char => "CHAR",
            Self::Newline => "NEWLINE",
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal with the source range it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarToken {
    pub terminal: Terminal,
    pub span: SourceSpan,
}

impl GrammarToken {
    pub fn new(terminal: Terminal, span: SourceSpan) -> Self {
        Self { terminal, span }
    }

    /// One token per interval, in start order.
    pub fn from_iit(iit: &[Interval]) -> Vec<Self> {
        let mut sorted: Vec<&Interval> = iit.iter().collect();
        sorted.sort_by_key(|iv| iv.start);
        sorted
            .into_iter()
            .map(|iv| Self::new(Terminal::from_tag(&iv.tag), iv.span()))
            .collect()
    }

    /// Tokens over a bare terminal stream; token `i` spans `i..i+1`.
    pub fn from_terminals(terminals: &[Terminal]) -> Vec<Self> {
        terminals
            .iter()
            .enumerate()
            .map(|(i, &terminal)| Self::new(terminal, SourceSpan::new(i, i + 1)))
            .collect()
    }
}
