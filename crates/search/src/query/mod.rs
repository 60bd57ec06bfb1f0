//! Query handle: a small SELECT builder rendering parameterised SQL.

mod builder;
mod condition;
mod fragment;

pub use builder::{Join, JoinKind, SelectQuery};
pub use condition::{ColumnRef, Comparison, Condition, ConditionGroup, Conjunction};
pub use fragment::{SqlFragment, SqlParam, quote_identifier};
