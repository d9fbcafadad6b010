//! Helios Search Condition Compiler
//!
//! This crate turns user-supplied search input into a typed condition tree,
//! normalizes it, and compiles it into backend queries: parameterized SQL
//! WHERE fragments or Elasticsearch bool queries.
//!
//! # Features
//!
//! - **Query syntax**: field clauses, AND/OR groups, exclusions, ranges,
//!   comparisons and pattern matches, parsed with byte-accurate syntax errors
//! - **Structured input**: the same condition as JSON
//! - **Optimizer chain**: validation, duplicate removal, range merging and
//!   comparison folding; idempotent
//! - **Generators**: SQLite, PostgreSQL, MySQL and SQL Server fragments with
//!   named parameters, and Elasticsearch query documents
//! - **Conversions**: per-field column/value rewriting, e.g. searching a
//!   birthday column by age
//! - **Cache**: fingerprinted compiled fragments on a pluggable backend
//!
//! Feature flags:
//! - `sqlite` (default) - SQLite user functions and parameter binding
//!
//! # Architecture
//!
//! - [`types`] - the condition tree
//! - [`field`] - field sets and field configuration
//! - [`input`] - lexer, parser and structured input
//! - [`optimizer`] - optimizer passes
//! - [`backends`] - SQL and document generators
//! - [`conversion`] - built-in conversions
//! - [`cache`] - compiled fragment cache
//! - [`export`] - textual and structured exporters
//! - [`error`] - error types
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use helios_search::SearchProcessor;
//! use helios_search::backends::sql::{DbType, SqlConditionGenerator, SqlDialect, SqlParam};
//! use helios_search::conversion::AgeDateConversion;
//! use helios_search::field::{FieldConfig, FieldSet, FieldType};
//!
//! let fields = Arc::new(
//!     FieldSet::builder("users")
//!         .add(
//!             FieldConfig::builder("age", FieldType::Birthday)
//!                 .accept_comparisons()
//!                 .sql_conversion(Arc::new(AgeDateConversion))
//!                 .build(),
//!         )
//!         .build()
//!         .unwrap(),
//! );
//!
//! let condition = SearchProcessor::default()
//!     .process_strict("age: 25", &fields)
//!     .unwrap();
//!
//! let mut generator = SqlConditionGenerator::new(SqlDialect::MySql);
//! generator.set_field("age", "u.birthday", DbType::Date);
//!
//! let fragment = generator.apply(&condition).unwrap();
//! assert_eq!(fragment.sql, "TIMESTAMPDIFF(YEAR, u.birthday, CURDATE()) = :search_0");
//! assert_eq!(fragment.params[0].value, SqlParam::Integer(25));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod cache;
pub mod config;
pub mod conversion;
pub mod error;
pub mod export;
pub mod field;
pub mod input;
pub mod optimizer;
pub mod processor;
pub mod types;

// Re-export commonly used types at crate root
pub use config::SearchConfig;
pub use error::{SearchError, SearchResult};
pub use processor::SearchProcessor;
pub use types::{SearchCondition, ValuesBag, ValuesGroup};

// Re-export generator traits
pub use backends::{CompiledFragment, ConditionGenerator};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
