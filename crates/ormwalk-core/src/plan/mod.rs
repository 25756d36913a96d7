//! Join plan model produced by the walker.

mod explain;
mod join;
mod result;

pub use join::{BridgeJoin, ColumnRef, JoinCondition, JoinKind, JoinNode, LogicalAlias};
pub use result::{
    LockMode, PlanResult, ResultType, ResultTypeDescriptor, UserAliasList,
};
