pub mod derivation;
pub mod parser;
pub mod terminal;

pub use derivation::{ParseTree, PrNode, PrsNode, ReqNode};
pub use parser::{GrammarParser, SyntaxError};
pub use terminal::{GrammarToken, Terminal};
