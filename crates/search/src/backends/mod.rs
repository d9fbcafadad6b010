//! Condition generators.
//!
//! A generator turns a finalized [`SearchCondition`] into the native query
//! form of one backend:
//!
//! - [`sql`] - boolean SQL expression with named parameters
//! - [`elasticsearch`] - nested bool query document
//!
//! Generators only read the condition. A generation error leaves the
//! condition untouched, so it can be compiled against another backend.

pub mod elasticsearch;
pub mod sql;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use serde::{Deserialize, Serialize};

use crate::error::GenerationResult;
use crate::types::SearchCondition;

use self::sql::SqlFragment;

/// Backend-specific output of a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", content = "fragment", rename_all = "lowercase")]
pub enum CompiledFragment {
    /// Relational WHERE fragment.
    Sql(SqlFragment),
    /// Document-search query.
    Document(serde_json::Value),
}

impl CompiledFragment {
    /// Returns the SQL fragment, if this is one.
    pub fn as_sql(&self) -> Option<&SqlFragment> {
        match self {
            CompiledFragment::Sql(fragment) => Some(fragment),
            CompiledFragment::Document(_) => None,
        }
    }

    /// Returns the query document, if this is one.
    pub fn as_document(&self) -> Option<&serde_json::Value> {
        match self {
            CompiledFragment::Document(query) => Some(query),
            CompiledFragment::Sql(_) => None,
        }
    }
}

/// Common interface of the generators.
pub trait ConditionGenerator: Send + Sync {
    /// Identifies the backend and everything that influences its output
    /// apart from the condition itself (dialect, mappings, naming).
    ///
    /// Two generators with the same id must produce equal fragments for
    /// equal conditions; the condition cache relies on it.
    fn backend_id(&self) -> String;

    /// Compiles a condition.
    fn compile(&self, condition: &SearchCondition) -> GenerationResult<CompiledFragment>;
}
