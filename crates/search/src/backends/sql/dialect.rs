//! Relational dialects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The SQL dialect a fragment is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// SQLite.
    #[default]
    Sqlite,
    /// PostgreSQL.
    Postgres,
    /// MySQL and MariaDB.
    MySql,
    /// Microsoft SQL Server.
    SqlServer,
}

impl SqlDialect {
    /// Lowercase dialect name.
    pub fn name(&self) -> &'static str {
        match self {
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::Postgres => "postgres",
            SqlDialect::MySql => "mysql",
            SqlDialect::SqlServer => "sqlserver",
        }
    }

    /// Concatenates string expressions with the dialect's primitive.
    pub fn concat(&self, parts: &[&str]) -> String {
        match self {
            SqlDialect::Sqlite | SqlDialect::Postgres => parts.join(" || "),
            SqlDialect::MySql => format!("CONCAT({})", parts.join(", ")),
            SqlDialect::SqlServer => parts.join(" + "),
        }
    }

    /// Suffix declaring `\` as the LIKE escape character, where it is not the default.
    pub fn like_escape(&self) -> &'static str {
        match self {
            SqlDialect::Sqlite | SqlDialect::SqlServer => " ESCAPE '\\'",
            SqlDialect::Postgres | SqlDialect::MySql => "",
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(SqlDialect::Sqlite),
            "postgres" | "postgresql" | "pgsql" => Ok(SqlDialect::Postgres),
            "mysql" | "mariadb" => Ok(SqlDialect::MySql),
            "sqlserver" | "mssql" => Ok(SqlDialect::SqlServer),
            _ => Err(format!("unknown SQL dialect: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat() {
        assert_eq!(SqlDialect::Postgres.concat(&["'%'", ":v"]), "'%' || :v");
        assert_eq!(SqlDialect::MySql.concat(&["'%'", ":v"]), "CONCAT('%', :v)");
        assert_eq!(SqlDialect::SqlServer.concat(&["'%'", ":v"]), "'%' + :v");
    }

    #[test]
    fn test_parse() {
        assert_eq!("PostgreSQL".parse::<SqlDialect>(), Ok(SqlDialect::Postgres));
        assert_eq!("mssql".parse::<SqlDialect>(), Ok(SqlDialect::SqlServer));
        assert!("oracle".parse::<SqlDialect>().is_err());
    }
}
