//! Pattern matching per dialect.

use crate::error::{GenerationError, GenerationResult};
use crate::types::{PatternMatch, PatternMatchType};

use super::dialect::SqlDialect;
use super::fragment::{DbType, SqlParam};
use super::parameters::ParameterBag;

/// How LIKE patterns get their wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PatternMode {
    /// Wildcards are part of the bound value (`:v` = `%foo%`).
    #[default]
    BoundWildcards,
    /// Wildcards are concatenated in SQL (`'%' || :v || '%'`).
    Concatenation,
}

impl PatternMode {
    /// Short name used in backend ids.
    pub fn name(&self) -> &'static str {
        match self {
            PatternMode::BoundWildcards => "bound",
            PatternMode::Concatenation => "concat",
        }
    }
}

/// Escapes the LIKE wildcards and the escape character itself.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Renders one pattern match against `column`.
pub(crate) fn render_pattern(
    dialect: SqlDialect,
    mode: PatternMode,
    column: &str,
    pattern: &PatternMatch,
    params: &mut ParameterBag,
) -> GenerationResult<String> {
    let negated = pattern.match_type.is_negated();
    let ci = pattern.case_insensitive;

    match pattern.match_type.positive() {
        PatternMatchType::Regex => render_regex(dialect, column, pattern, params),
        PatternMatchType::Equals => {
            let value = params.bind(SqlParam::string(&pattern.value), DbType::Text);
            let op = if negated { "<>" } else { "=" };
            Ok(if ci {
                format!("LOWER({}) {} LOWER({})", column, op, value)
            } else {
                format!("{} {} {}", column, op, value)
            })
        }
        kind => {
            let (leading, trailing) = match kind {
                PatternMatchType::Contains => (true, true),
                PatternMatchType::StartsWith => (false, true),
                _ => (true, false),
            };
            let escaped = escape_like(&pattern.value);

            let value = match mode {
                PatternMode::BoundWildcards => {
                    let mut bound = String::with_capacity(escaped.len() + 2);
                    if leading {
                        bound.push('%');
                    }
                    bound.push_str(&escaped);
                    if trailing {
                        bound.push('%');
                    }
                    params.bind(SqlParam::String(bound), DbType::Text)
                }
                PatternMode::Concatenation => {
                    let placeholder = params.bind(SqlParam::String(escaped), DbType::Text);
                    let mut parts = Vec::with_capacity(3);
                    if leading {
                        parts.push("'%'");
                    }
                    parts.push(placeholder.as_str());
                    if trailing {
                        parts.push("'%'");
                    }
                    dialect.concat(&parts)
                }
            };

            let op = if negated { "NOT LIKE" } else { "LIKE" };
            Ok(if ci {
                format!(
                    "LOWER({}) {} LOWER({}){}",
                    column,
                    op,
                    value,
                    dialect.like_escape()
                )
            } else {
                format!("{} {} {}{}", column, op, value, dialect.like_escape())
            })
        }
    }
}

fn render_regex(
    dialect: SqlDialect,
    column: &str,
    pattern: &PatternMatch,
    params: &mut ParameterBag,
) -> GenerationResult<String> {
    let negated = pattern.match_type.is_negated();
    let ci = pattern.case_insensitive;

    match dialect {
        SqlDialect::Postgres => {
            let value = params.bind(SqlParam::string(&pattern.value), DbType::Text);
            let op = match (negated, ci) {
                (false, false) => "~",
                (false, true) => "~*",
                (true, false) => "!~",
                (true, true) => "!~*",
            };
            Ok(format!("{} {} {}", column, op, value))
        }
        SqlDialect::MySql => {
            let value = params.bind(SqlParam::string(&pattern.value), DbType::Text);
            let flags = if ci { "i" } else { "c" };
            let not = if negated { "NOT " } else { "" };
            Ok(format!(
                "{}REGEXP_LIKE({}, {}, '{}')",
                not, column, value, flags
            ))
        }
        SqlDialect::Sqlite => {
            let regex = if ci {
                format!("(?i){}", pattern.value)
            } else {
                pattern.value.clone()
            };
            let value = params.bind(SqlParam::String(regex), DbType::Text);
            let op = if negated { "NOT REGEXP" } else { "REGEXP" };
            Ok(format!("{} {} {}", column, op, value))
        }
        SqlDialect::SqlServer => Err(GenerationError::UnsupportedPlatform {
            dialect: dialect.name().to_string(),
            feature: "regular expression matching".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(
        dialect: SqlDialect,
        mode: PatternMode,
        pattern: PatternMatch,
    ) -> (String, Vec<SqlParam>) {
        let mut params = ParameterBag::new("p");
        let sql = render_pattern(dialect, mode, "name", &pattern, &mut params).unwrap();
        (sql, params.into_params().into_iter().map(|p| p.value).collect())
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
    }

    #[test]
    fn test_contains_case_insensitive() {
        let (sql, params) = render(
            SqlDialect::Postgres,
            PatternMode::BoundWildcards,
            PatternMatch::new("fo%o", PatternMatchType::Contains, true),
        );
        assert_eq!(sql, "LOWER(name) LIKE LOWER(:p0)");
        assert_eq!(params, vec![SqlParam::string("%fo\\%o%")]);
    }

    #[test]
    fn test_starts_with_sqlite_escape() {
        let (sql, params) = render(
            SqlDialect::Sqlite,
            PatternMode::BoundWildcards,
            PatternMatch::new("ab", PatternMatchType::NotStartsWith, false),
        );
        assert_eq!(sql, "name NOT LIKE :p0 ESCAPE '\\'");
        assert_eq!(params, vec![SqlParam::string("ab%")]);
    }

    #[test]
    fn test_concatenation_mode() {
        let (sql, params) = render(
            SqlDialect::MySql,
            PatternMode::Concatenation,
            PatternMatch::new("x", PatternMatchType::EndsWith, false),
        );
        assert_eq!(sql, "name LIKE CONCAT('%', :p0)");
        assert_eq!(params, vec![SqlParam::string("x")]);
    }

    #[test]
    fn test_equals_and_regex() {
        let (sql, _) = render(
            SqlDialect::Sqlite,
            PatternMode::BoundWildcards,
            PatternMatch::new("x", PatternMatchType::NotEquals, true),
        );
        assert_eq!(sql, "LOWER(name) <> LOWER(:p0)");

        let (sql, params) = render(
            SqlDialect::Sqlite,
            PatternMode::BoundWildcards,
            PatternMatch::new("^a+$", PatternMatchType::Regex, true),
        );
        assert_eq!(sql, "name REGEXP :p0");
        assert_eq!(params, vec![SqlParam::string("(?i)^a+$")]);

        let (sql, _) = render(
            SqlDialect::Postgres,
            PatternMode::BoundWildcards,
            PatternMatch::new("a", PatternMatchType::NotRegex, true),
        );
        assert_eq!(sql, "name !~* :p0");

        let (sql, _) = render(
            SqlDialect::MySql,
            PatternMode::BoundWildcards,
            PatternMatch::new("a", PatternMatchType::Regex, false),
        );
        assert_eq!(sql, "REGEXP_LIKE(name, :p0, 'c')");
    }

    #[test]
    fn test_regex_unsupported_on_sqlserver() {
        let mut params = ParameterBag::new("p");
        let err = render_pattern(
            SqlDialect::SqlServer,
            PatternMode::BoundWildcards,
            "name",
            &PatternMatch::new("a", PatternMatchType::Regex, false),
            &mut params,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::UnsupportedPlatform { ref dialect, .. } if dialect == "sqlserver"
        ));
        assert!(params.is_empty());
    }
}
