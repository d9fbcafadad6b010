//! Placeholder allocation for one compilation.

use super::fragment::{BoundParam, DbType, SqlParam};

/// Allocates `:{prefix}{n}` placeholders and collects the bound values.
///
/// A bag lives for exactly one generator run, so numbering starts at zero
/// for every compilation and is never shared between threads.
#[derive(Debug)]
pub struct ParameterBag {
    prefix: String,
    params: Vec<BoundParam>,
}

impl ParameterBag {
    /// Creates an empty bag naming parameters `{prefix}{n}`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            params: Vec::new(),
        }
    }

    /// Binds a value and returns its placeholder (including the `:`).
    pub fn bind(&mut self, value: SqlParam, db_type: DbType) -> String {
        let name = format!("{}{}", self.prefix, self.params.len());
        let placeholder = format!(":{}", name);
        self.params.push(BoundParam {
            name,
            value,
            db_type,
        });
        placeholder
    }

    /// Number of values bound so far.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if nothing was bound.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// The bound parameters, in binding order.
    pub fn into_params(self) -> Vec<BoundParam> {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strictly_incrementing_names() {
        let mut bag = ParameterBag::new("search_");
        assert_eq!(bag.bind(SqlParam::Integer(1), DbType::Integer), ":search_0");
        assert_eq!(bag.bind(SqlParam::string("a"), DbType::Text), ":search_1");
        let params = bag.into_params();
        assert_eq!(params[1].name, "search_1");
        assert_eq!(params[1].value, SqlParam::string("a"));
    }
}
