//! Error types for the search condition compiler.
//!
//! Errors are split by the stage that raises them. Everything in this module
//! is fatal: it aborts the current compilation and no partial condition is
//! returned. Recoverable validation problems are not errors; they are
//! collected as [`ConditionErrorMessage`](crate::types::ConditionErrorMessage)s
//! on the condition tree itself.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::field::FieldType;
use crate::types::{ConditionErrorMessage, ValueKind};

/// The primary error type for all compiler operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Lexer or parser failures
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Unknown fields and unaccepted value kinds
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    /// Nesting, group and value count limits
    #[error(transparent)]
    Limit(#[from] LimitError),

    /// Backend condition generation failures
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Field configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Condition cache errors
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Structured input could not be decoded.
    #[error("invalid structured input: {0}")]
    InvalidInput(#[from] serde_json::Error),

    /// The condition carries validation errors and strict processing was requested.
    #[error("search condition is invalid ({} error(s))", errors.len())]
    InvalidCondition { errors: Vec<ConditionErrorMessage> },
}

/// Result type alias for compiler operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// The input could not be tokenized or does not follow the query grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error at position {position}: {message}")]
pub struct SyntaxError {
    /// Byte offset into the input.
    pub position: usize,
    pub message: String,
}

impl SyntaxError {
    /// Creates a new syntax error at the given byte offset.
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }

    /// Creates an "expected X, got Y" error.
    pub fn unexpected(position: usize, expected: &[&str], found: &str) -> Self {
        let expected = match expected {
            [] => "end of input".to_string(),
            [single] => (*single).to_string(),
            many => format!("one of {}", many.join(", ")),
        };
        Self::new(position, format!("expected {}, got {}", expected, found))
    }
}

/// The input is well-formed but refers to things the field set does not allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("field '{field}' does not accept {kind} values")]
    UnsupportedValueType { field: String, kind: ValueKind },
}

/// A structural limit was exceeded while building the condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LimitError {
    #[error(
        "group {group_idx} exceeds the maximum nesting level of {max} (nesting level {nesting_level})"
    )]
    GroupsNesting {
        max: usize,
        group_idx: usize,
        nesting_level: usize,
    },

    #[error(
        "group {group_idx} at nesting level {nesting_level} contains {count} groups, maximum is {max}"
    )]
    GroupsOverflow {
        max: usize,
        count: usize,
        group_idx: usize,
        nesting_level: usize,
    },

    #[error(
        "field '{field}' in group {group_idx} at nesting level {nesting_level} contains {count} values, maximum is {max}"
    )]
    ValuesOverflow {
        field: String,
        max: usize,
        count: usize,
        group_idx: usize,
        nesting_level: usize,
    },
}

/// A backend generator could not compile the condition.
///
/// Generation errors never touch the condition itself; the same condition can
/// be handed to another backend afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("{feature} is not supported by the {dialect} platform")]
    UnsupportedPlatform { dialect: String, feature: String },

    #[error("no mapping configured for field '{field}'")]
    MissingFieldMapping { field: String },

    #[error("cannot map unknown field '{field}'")]
    UnknownField { field: String },

    #[error("refusing to compile a search condition with {count} validation error(s)")]
    InvalidCondition { count: usize },

    #[error("conversion failed for field '{field}': {message}")]
    Conversion { field: String, message: String },
}

/// Result type alias for generator operations.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// A locked field configuration was modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("configuration of field '{field}' is locked and cannot be changed")]
pub struct ConfigLockedError {
    pub field: String,
}

/// Field and field set configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(transparent)]
    Locked(#[from] ConfigLockedError),

    #[error("field '{field}' is declared more than once")]
    DuplicateField { field: String },

    #[error("invalid field set definition: {message}")]
    InvalidDefinition { message: String },

    #[error("field '{field}' of type {field_type} cannot accept pattern-match values")]
    PatternsOnNonText { field: String, field_type: FieldType },
}

/// Condition cache errors.
///
/// The cache is advisory; callers log these and fall back to compiling.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to (de)serialize cached fragment: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache backend error: {message}")]
    Backend { message: String },
}
