//! SQLite integration.
//!
//! Generated fragments rely on two user functions SQLite does not ship:
//! `REGEXP` for regex pattern matches and `search_conversion_age` for the
//! age conversion. [`SqliteFunctionRegistry`] installs them once per
//! connection; [`bind_fragment`] binds a fragment's parameters to a
//! prepared statement.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Utc};
use parking_lot::Mutex;
use regex::Regex;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{Connection, Statement};
use tracing::debug;

use crate::backends::sql::{SqlFragment, SqlParam};
use crate::conversion::SQLITE_AGE_FUNCTION;

/// Identifies a connection within a [`SqliteFunctionRegistry`].
///
/// The id is chosen by the owner of the connection (a pool slot, a
/// connection counter) and must stay stable for the connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle(pub u64);

/// Tracks which connections have the search functions installed.
#[derive(Debug, Default)]
pub struct SqliteFunctionRegistry {
    registered: Mutex<HashSet<ConnectionHandle>>,
}

impl SqliteFunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the functions on `conn` unless already done for `handle`.
    ///
    /// Returns true if the functions were installed by this call.
    pub fn ensure_registered(
        &self,
        handle: ConnectionHandle,
        conn: &Connection,
    ) -> rusqlite::Result<bool> {
        let mut registered = self.registered.lock();
        if registered.contains(&handle) {
            return Ok(false);
        }
        register_functions(conn)?;
        registered.insert(handle);
        debug!(handle = handle.0, "Registered SQLite search functions");
        Ok(true)
    }

    /// Forgets a connection, e.g. after it was closed.
    pub fn release(&self, handle: ConnectionHandle) -> bool {
        self.registered.lock().remove(&handle)
    }

    /// Returns true if the functions were installed for `handle`.
    pub fn is_registered(&self, handle: ConnectionHandle) -> bool {
        self.registered.lock().contains(&handle)
    }
}

/// Installs `REGEXP` and the age function on a connection.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    // `X REGEXP Y` calls regexp(Y, X).
    conn.create_scalar_function("regexp", 2, flags, |ctx| {
        let pattern: String = ctx.get(0)?;
        let text: Option<String> = ctx.get(1)?;
        let Some(text) = text else {
            return Ok(false);
        };
        let regex = Regex::new(&pattern)
            .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
        Ok(regex.is_match(&text))
    })?;

    // Depends on the current date.
    conn.create_scalar_function(SQLITE_AGE_FUNCTION, 1, FunctionFlags::SQLITE_UTF8, |ctx| {
        age_in_years(ctx, Utc::now().date_naive())
    })?;

    Ok(())
}

fn age_in_years(ctx: &Context<'_>, today: NaiveDate) -> rusqlite::Result<Option<i64>> {
    let birthday: Option<String> = ctx.get(0)?;
    let Some(birthday) = birthday else {
        return Ok(None);
    };
    // Accepts dates and timestamps starting with a date.
    let date_part = birthday.get(..10).unwrap_or(&birthday);
    let Ok(birthday) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") else {
        return Ok(None);
    };
    Ok(Some(years_between(birthday, today)))
}

/// Whole years from `birthday` to `today`.
pub(crate) fn years_between(birthday: NaiveDate, today: NaiveDate) -> i64 {
    let mut years = i64::from(today.year() - birthday.year());
    if (today.month(), today.day()) < (birthday.month(), birthday.day()) {
        years -= 1;
    }
    years
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::String(s) => ToSqlOutput::from(s.as_str()),
            SqlParam::Integer(i) => ToSqlOutput::from(*i),
            SqlParam::Decimal(d) => ToSqlOutput::from(d.to_string()),
            SqlParam::Date(d) => ToSqlOutput::from(d.format("%Y-%m-%d").to_string()),
            SqlParam::DateTime(dt) => ToSqlOutput::from(dt.to_rfc3339()),
            SqlParam::Boolean(b) => ToSqlOutput::from(*b),
        })
    }
}

/// Binds every parameter of `fragment` to a statement prepared from SQL
/// containing the fragment.
///
/// Run the statement with `raw_query` or `raw_execute` afterwards.
pub fn bind_fragment(stmt: &mut Statement<'_>, fragment: &SqlFragment) -> rusqlite::Result<()> {
    for param in &fragment.params {
        let name = format!(":{}", param.name);
        let index = stmt
            .parameter_index(&name)?
            .ok_or(rusqlite::Error::InvalidParameterName(name))?;
        stmt.raw_bind_parameter(index, &param.value)?;
    }
    Ok(())
}
