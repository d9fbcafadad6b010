//! Condition value model.
//!
//! This module defines the condition tree produced by the input processors
//! and consumed by the generators:
//!
//! - [`SearchCondition`] - root object: field set plus root group
//! - [`ValuesGroup`] - AND/OR node holding field bags and child groups
//! - [`ValuesBag`] - every value given for one field within one group
//! - [`Value`] and its holders ([`SingleValue`], [`Range`], [`Compare`],
//!   [`PatternMatch`])
//! - [`ConditionErrorMessage`] - accumulated validation problems

mod condition;
mod errors;
mod value;
mod values_bag;
mod values_group;

pub use condition::SearchCondition;
pub use errors::ConditionErrorMessage;
pub use value::{
    Compare, CompareOperator, PatternMatch, PatternMatchType, Range, SingleValue, Value, ValueKind,
};
pub use values_bag::ValuesBag;
pub use values_group::{GroupLogical, ValuesGroup};
