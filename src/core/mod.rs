pub mod condition;
pub mod dataset;
pub mod evaluator;
pub mod tree;
pub mod types;
pub mod validation;

pub use condition::Condition;
pub use dataset::{ColumnSet, Dataset, Row};
pub use evaluator::{count_matches, evaluate};
pub use tree::{ConditionGroup, ConditionTree, GroupedView};
pub use types::*;
