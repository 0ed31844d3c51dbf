pub mod builder;

pub use builder::RuleTreeBuilder;
