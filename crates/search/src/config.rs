//! Compiler configuration.
//!
//! Limits and generator settings, overridable through environment variables
//! or command line arguments.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SEARCH_MAX_NESTING_LEVEL` | 100 | Maximum group depth |
//! | `SEARCH_MAX_GROUPS` | 100 | Maximum sibling groups per group |
//! | `SEARCH_MAX_VALUES` | 10000 | Default per-field value limit |
//! | `SEARCH_PARAM_PREFIX` | search_ | Bound parameter name prefix |
//! | `SEARCH_CACHE_TTL` | 10m | Cache entry TTL |
//! | `SEARCH_CACHE_CAPACITY` | 10000 | In-memory cache capacity |
//! | `SEARCH_LOG_LEVEL` | info | Log level |
//!
//! # Example
//!
//! ```rust
//! use helios_search::SearchConfig;
//!
//! let config = SearchConfig {
//!     max_nesting_level: 5,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! assert_eq!(config.processor_config().max_nesting_level, 5);
//! ```

use std::time::Duration;

use clap::Parser;
use tracing::warn;

use crate::backends::sql::DEFAULT_PARAM_PREFIX;
use crate::cache::ConditionCache;
use crate::input::ProcessorConfig;

/// Search compiler configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "search")]
#[command(about = "Search condition compiler settings")]
pub struct SearchConfig {
    /// Maximum nesting level of groups.
    #[arg(long, env = "SEARCH_MAX_NESTING_LEVEL", default_value = "100")]
    pub max_nesting_level: usize,

    /// Maximum number of child groups per group.
    #[arg(long, env = "SEARCH_MAX_GROUPS", default_value = "100")]
    pub max_groups: usize,

    /// Maximum number of values per field and group, unless the field sets its own.
    #[arg(long, env = "SEARCH_MAX_VALUES", default_value = "10000")]
    pub max_values: usize,

    /// Prefix of bound SQL parameter names.
    #[arg(long, env = "SEARCH_PARAM_PREFIX", default_value = DEFAULT_PARAM_PREFIX)]
    pub param_prefix: String,

    /// Time-to-live of cached fragments (e.g. 30s, 10m, 1h).
    #[arg(long, env = "SEARCH_CACHE_TTL", default_value = "10m", value_parser = humantime::parse_duration)]
    pub cache_ttl: Duration,

    /// Maximum number of cached fragments.
    #[arg(long, env = "SEARCH_CACHE_CAPACITY", default_value = "10000")]
    pub cache_capacity: u64,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "SEARCH_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_nesting_level: 100,
            max_groups: 100,
            max_values: 10_000,
            param_prefix: DEFAULT_PARAM_PREFIX.to_string(),
            cache_ttl: Duration::from_secs(600),
            cache_capacity: 10_000,
            log_level: "info".to_string(),
        }
    }
}

impl SearchConfig {
    /// Creates a configuration from environment variables.
    ///
    /// A malformed variable is logged and the defaults are used instead.
    pub fn from_env() -> Self {
        Self::from_args(["search"])
    }

    /// Parses command-line style arguments, with environment variables as
    /// fallback, returning the defaults on failure.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Invalid search configuration, using defaults");
                Self::default()
            }
        }
    }

    /// Limits for the input processors.
    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            max_nesting_level: self.max_nesting_level,
            max_groups: self.max_groups,
            max_values: self.max_values,
        }
    }

    /// An in-memory condition cache with the configured capacity and TTL.
    pub fn condition_cache(&self) -> ConditionCache {
        ConditionCache::in_memory(self.cache_capacity, Some(self.cache_ttl))
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_nesting_level == 0 {
            errors.push("Max nesting level cannot be 0".to_string());
        }

        if self.max_groups == 0 {
            errors.push("Max groups cannot be 0".to_string());
        }

        if self.max_values == 0 {
            errors.push("Max values cannot be 0".to_string());
        }

        if self.param_prefix.is_empty()
            || !self
                .param_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            errors.push(format!(
                "Parameter prefix '{}' must be non-empty and contain only ASCII letters, digits and '_'",
                self.param_prefix
            ));
        }

        if self.cache_ttl.is_zero() {
            errors.push("Cache TTL cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
