//! Relational backend.
//!
//! [`SqlConditionGenerator`] renders a condition as a boolean SQL expression
//! with named parameters, for use in a WHERE clause. Dialect differences are
//! limited to pattern matching, string concatenation and conversion
//! expressions.

mod conversion;
mod dialect;
mod fragment;
mod generator;
mod parameters;
mod pattern;

pub use conversion::{ConversionHints, SqlConversion};
pub use dialect::SqlDialect;
pub use fragment::{BoundParam, DbType, SqlFragment, SqlParam};
pub use generator::{DEFAULT_PARAM_PREFIX, SqlConditionGenerator, SqlFieldMapping};
pub use parameters::ParameterBag;
pub use pattern::{PatternMode, escape_like};
