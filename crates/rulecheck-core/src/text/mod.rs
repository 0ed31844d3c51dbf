pub mod tokenizer;

pub use tokenizer::{CharTokenizer, clean_sentence};
