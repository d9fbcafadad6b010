//! Recursive-descent parser for the textual query syntax.
//!
//! # Grammar
//!
//! ```text
//! query       = [ '*' ] body EOF
//! body        = [ part ( sep part )* [ ';' ] ]
//! sep         = ';' | ','                       (',' only after a group)
//! part        = fieldClause | group
//! group       = [ '*' ] '(' body ')'            ('*(' opens an OR group)
//! fieldClause = IDENT ':' value ( ',' value )*
//! value       = pattern | compare | [ '!' ] ( range | single )
//! range       = [ '[' | ']' ] text '-' text [ '[' | ']' ]
//! compare     = ( '<' | '<=' | '>' | '>=' | '<>' ) text
//! pattern     = '~' [ 'i' ] [ '!' ] ( '*' | '>' | '<' | '?' | '=' ) text
//! text        = QUOTED | run of adjacent literal tokens
//! ```
//!
//! # Example
//!
//! ```text
//! name: "Doe", ~i*smith; age: 18-25, >60; *(status: active; id: !1-10)
//! ```
//!
//! The value kind is decided by the lexical form alone, in the order
//! pattern, comparison, range, single. A form the field does not accept is
//! an error; it is never reinterpreted as another kind.

use tracing::debug;

use crate::error::{SearchResult, SemanticError, SyntaxError};
use crate::field::FieldSet;
use crate::types::{CompareOperator, GroupLogical, PatternMatchType, ValuesGroup};

use super::ProcessorConfig;
use super::lexer::{Lexer, Token, TokenKind, invalid_token_error};
use super::values::{GroupScope, RawValue};

/// Token kinds that may start an unquoted text.
const RUN_START: &[TokenKind] = &[
    TokenKind::Literal,
    TokenKind::Dot,
    TokenKind::Plus,
    TokenKind::LBrace,
    TokenKind::Slash,
];

/// Token kinds joined into an unquoted text when adjacent to the previous token.
const RUN_JOIN: &[TokenKind] = &[
    TokenKind::Literal,
    TokenKind::Dot,
    TokenKind::Slash,
    TokenKind::Plus,
    TokenKind::Ampersand,
    TokenKind::Question,
    TokenKind::LBrace,
    TokenKind::RBrace,
    TokenKind::Star,
];

/// Parser for one query string.
pub(crate) struct Parser<'a> {
    lexer: Lexer,
    field_set: &'a FieldSet,
    config: &'a ProcessorConfig,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(input: &str, field_set: &'a FieldSet, config: &'a ProcessorConfig) -> Self {
        Self {
            lexer: Lexer::new(input),
            field_set,
            config,
        }
    }

    /// Parses the whole input into a root group.
    pub(crate) fn parse(mut self) -> SearchResult<ValuesGroup> {
        let logical = if self.at_root_or_marker() {
            self.lexer.next_token();
            GroupLogical::Or
        } else {
            GroupLogical::And
        };

        let mut root = ValuesGroup::new(logical);
        let mut scope = GroupScope::root();
        self.parse_body(&mut root, &mut scope, TokenKind::Eof)?;

        debug!(
            logical = %root.logical,
            fields = root.fields.len(),
            groups = root.groups.len(),
            values = root.count_values(),
            "Parsed search query"
        );
        Ok(root)
    }

    /// A leading `*` not directly followed by `(` makes the root group OR.
    fn at_root_or_marker(&self) -> bool {
        let first = self.lexer.peek();
        if first.kind != TokenKind::Star {
            return false;
        }
        let second = self.lexer.glimpse(1);
        !(second.kind == TokenKind::LParen && first.is_adjacent_to(second))
    }

    fn peek(&self) -> Result<Token, SyntaxError> {
        let token = self.lexer.peek();
        if token.kind == TokenKind::None {
            return Err(invalid_token_error(token));
        }
        Ok(token.clone())
    }

    fn advance(&mut self) -> Result<Token, SyntaxError> {
        let token = self.lexer.next_token();
        if token.kind == TokenKind::None {
            return Err(invalid_token_error(token));
        }
        Ok(token.clone())
    }

    fn parse_body(
        &mut self,
        group: &mut ValuesGroup,
        scope: &mut GroupScope,
        closing: TokenKind,
    ) -> SearchResult<()> {
        loop {
            if self.peek()?.kind == closing {
                return Ok(());
            }

            let was_group = self.parse_part(group, scope)?;

            let token = self.peek()?;
            match token.kind {
                TokenKind::Semicolon => {
                    self.lexer.next_token();
                }
                TokenKind::Comma if was_group => {
                    self.lexer.next_token();
                }
                kind if kind == closing => return Ok(()),
                _ => {
                    let closing_str = closing.to_string();
                    let mut expected = vec!["';'", closing_str.as_str()];
                    if was_group {
                        expected.push("','");
                    }
                    return Err(
                        SyntaxError::unexpected(token.position, &expected, &token.to_string())
                            .into(),
                    );
                }
            }
        }
    }

    /// Parses a field clause or a group, returning true for a group.
    fn parse_part(&mut self, group: &mut ValuesGroup, scope: &mut GroupScope) -> SearchResult<bool> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Identifier => {
                self.lexer.next_token();
                self.parse_field_clause(&token, group, scope)?;
                Ok(false)
            }
            TokenKind::LParen => {
                self.parse_group(GroupLogical::And, group, scope)?;
                Ok(true)
            }
            TokenKind::Star
                if self.lexer.glimpse(1).kind == TokenKind::LParen
                    && token.is_adjacent_to(self.lexer.glimpse(1)) =>
            {
                self.lexer.next_token();
                self.parse_group(GroupLogical::Or, group, scope)?;
                Ok(true)
            }
            _ => Err(SyntaxError::unexpected(
                token.position,
                &["field name", "group"],
                &token.to_string(),
            )
            .into()),
        }
    }

    fn parse_group(
        &mut self,
        logical: GroupLogical,
        parent: &mut ValuesGroup,
        parent_scope: &mut GroupScope,
    ) -> SearchResult<()> {
        // Opening parenthesis, checked by the caller.
        self.lexer.next_token();

        let index = parent.groups.len();
        parent_scope.check_groups(index + 1, self.config)?;

        let mut scope = parent_scope.child(index);
        scope.check_nesting(self.config)?;

        let mut child = ValuesGroup::new(logical);
        self.parse_body(&mut child, &mut scope, TokenKind::RParen)?;
        // parse_body only returns once the closing parenthesis is next
        self.lexer.next_token();

        parent.groups.push(child);
        Ok(())
    }

    fn parse_field_clause(
        &mut self,
        identifier: &Token,
        group: &mut ValuesGroup,
        scope: &mut GroupScope,
    ) -> SearchResult<()> {
        let field_set = self.field_set;
        let field = field_set
            .get(&identifier.value)
            .ok_or_else(|| SemanticError::UnknownField {
                field: identifier.value.clone(),
            })?;

        loop {
            let raw = self.parse_value()?;
            scope.add_value(group, field, raw, self.config)?;

            if self.peek()?.kind == TokenKind::Comma {
                self.lexer.next_token();
            } else {
                return Ok(());
            }
        }
    }

    fn parse_value(&mut self) -> Result<RawValue, SyntaxError> {
        match self.peek()?.kind {
            TokenKind::Tilde => self.parse_pattern(),
            TokenKind::Lower | TokenKind::Greater => self.parse_compare(),
            _ => self.parse_range_or_single(),
        }
    }

    fn parse_pattern(&mut self) -> Result<RawValue, SyntaxError> {
        self.lexer.next_token();

        let mut case_insensitive = false;
        let flag = self.peek()?;
        if flag.kind == TokenKind::Literal && flag.value == "i" {
            self.lexer.next_token();
            case_insensitive = true;
        }

        let mut negated = false;
        if self.peek()?.kind == TokenKind::Exclamation {
            self.lexer.next_token();
            negated = true;
        }

        let symbol = self.advance()?;
        let match_type = symbol
            .kind
            .symbol()
            .and_then(PatternMatchType::from_symbol)
            .ok_or_else(|| {
                SyntaxError::unexpected(
                    symbol.position,
                    &["'*'", "'>'", "'<'", "'?'", "'='"],
                    &symbol.to_string(),
                )
            })?;
        let match_type = if negated {
            match_type.negated()
        } else {
            match_type
        };

        let value = self.parse_text()?;
        Ok(RawValue::Pattern {
            value,
            match_type,
            case_insensitive,
        })
    }

    fn parse_compare(&mut self) -> Result<RawValue, SyntaxError> {
        let first = self.advance()?;
        let next = self.peek()?;
        let joined = first.is_adjacent_to(&next);

        let operator = match (first.kind, next.kind) {
            (TokenKind::Lower, TokenKind::Equals) if joined => CompareOperator::LowerOrEqual,
            (TokenKind::Lower, TokenKind::Greater) if joined => CompareOperator::NotEqual,
            (TokenKind::Greater, TokenKind::Equals) if joined => CompareOperator::GreaterOrEqual,
            (TokenKind::Lower, _) => CompareOperator::Lower,
            _ => CompareOperator::Greater,
        };
        if operator.as_str().len() == 2 {
            self.lexer.next_token();
        }

        let view = self.parse_text()?;
        Ok(RawValue::Compare { view, operator })
    }

    fn parse_range_or_single(&mut self) -> Result<RawValue, SyntaxError> {
        let mut excluded = false;
        if self.peek()?.kind == TokenKind::Exclamation {
            self.lexer.next_token();
            excluded = true;
        }

        let mut bracketed = false;
        let mut inclusive_lower = true;
        match self.peek()?.kind {
            TokenKind::LBracket => {
                self.lexer.next_token();
                bracketed = true;
            }
            TokenKind::RBracket => {
                self.lexer.next_token();
                bracketed = true;
                inclusive_lower = false;
            }
            _ => {}
        }

        let lower = self.parse_text()?;

        let separator = self.peek()?;
        if separator.kind != TokenKind::Minus {
            if bracketed {
                return Err(SyntaxError::unexpected(
                    separator.position,
                    &["'-'"],
                    &separator.to_string(),
                ));
            }
            return Ok(RawValue::Single {
                view: lower,
                excluded,
            });
        }
        self.lexer.next_token();

        let upper = self.parse_text()?;

        let mut inclusive_upper = true;
        match self.peek()?.kind {
            TokenKind::RBracket => {
                self.lexer.next_token();
            }
            TokenKind::LBracket => {
                self.lexer.next_token();
                inclusive_upper = false;
            }
            _ => {}
        }

        Ok(RawValue::Range {
            lower,
            upper,
            inclusive_lower,
            inclusive_upper,
            excluded,
        })
    }

    /// Parses a quoted string or the longest run of adjacent literal tokens.
    fn parse_text(&mut self) -> Result<String, SyntaxError> {
        let first = self.peek()?;
        if first.kind == TokenKind::QuotedString {
            self.lexer.next_token();
            return Ok(first.value);
        }

        let mut text = String::new();
        if first.kind == TokenKind::Minus {
            // A '-' glued to a literal is a sign.
            let next = self.lexer.glimpse(1);
            if !(next.kind == TokenKind::Literal && first.is_adjacent_to(next)) {
                return Err(SyntaxError::unexpected(
                    first.position,
                    &["value"],
                    &first.to_string(),
                ));
            }
            self.lexer.next_token();
            text.push('-');
        } else if !RUN_START.contains(&first.kind) {
            return Err(SyntaxError::unexpected(
                first.position,
                &["value"],
                &first.to_string(),
            ));
        }

        let mut last = self.advance()?;
        text.push_str(&last.value);

        loop {
            let next = self.lexer.peek();
            if !(RUN_JOIN.contains(&next.kind) && last.is_adjacent_to(next)) {
                break;
            }
            last = next.clone();
            self.lexer.next_token();
            text.push_str(&last.value);
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LimitError, SearchError};
    use crate::field::{FieldConfig, FieldType};
    use crate::types::{Value, ValueKind};

    fn field_set() -> FieldSet {
        FieldSet::builder("test")
            .add(
                FieldConfig::builder("id", FieldType::Integer)
                    .accept_ranges()
                    .accept_comparisons()
                    .build(),
            )
            .add(
                FieldConfig::builder("name", FieldType::Text)
                    .accept_pattern_matches()
                    .build(),
            )
            .build()
            .unwrap()
    }

    fn parse(input: &str) -> SearchResult<ValuesGroup> {
        let set = field_set();
        let config = ProcessorConfig::default();
        Parser::new(input, &set, &config).parse()
    }

    #[test]
    fn test_negative_number_is_a_sign() {
        let root = parse("id: -5--1").unwrap();
        let range = &root.field("id").unwrap().ranges[0];
        assert_eq!(range.lower.value, Value::Integer(-5));
        assert_eq!(range.upper.value, Value::Integer(-1));
    }

    #[test]
    fn test_two_char_operators_need_adjacency() {
        let root = parse("id: >=5, <>7").unwrap();
        let comparisons = &root.field("id").unwrap().comparisons;
        assert_eq!(comparisons[0].operator, CompareOperator::GreaterOrEqual);
        assert_eq!(comparisons[1].operator, CompareOperator::NotEqual);

        // '> =5' is '>' followed by a value starting with '='
        assert!(matches!(parse("id: > =5"), Err(SearchError::Syntax(_))));
    }

    #[test]
    fn test_root_or_marker_vs_or_group() {
        assert_eq!(parse("* id: 1").unwrap().logical, GroupLogical::Or);

        let root = parse("*(id: 1)").unwrap();
        assert_eq!(root.logical, GroupLogical::And);
        assert_eq!(root.groups[0].logical, GroupLogical::Or);
    }

    #[test]
    fn test_text_run_joins_adjacent_tokens() {
        let root = parse("name: foo.bar/baz+1").unwrap();
        assert_eq!(
            root.field("name").unwrap().simple_values[0].value,
            Value::from("foo.bar/baz+1")
        );
    }

    #[test]
    fn test_bracket_without_range() {
        let err = parse("id: [5").unwrap_err();
        assert!(matches!(err, SearchError::Syntax(SyntaxError { position: 6, .. })));
    }

    #[test]
    fn test_comma_between_clauses_is_rejected() {
        assert!(parse("(id: 1), (id: 2)").is_ok());
        assert!(matches!(
            parse("id: 1; name: a, id: 2"),
            Err(SearchError::Syntax(_))
        ));
    }

    #[test]
    fn test_unsupported_kind_reported_not_reinterpreted() {
        let err = parse("name: 1-5").unwrap_err();
        assert!(matches!(
            err,
            SearchError::Semantic(SemanticError::UnsupportedValueType {
                kind: ValueKind::Range,
                ..
            })
        ));
    }

    #[test]
    fn test_group_overflow() {
        let set = field_set();
        let config = ProcessorConfig {
            max_groups: 1,
            ..ProcessorConfig::default()
        };
        let err = Parser::new("(id: 1), (id: 2)", &set, &config)
            .parse()
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::Limit(LimitError::GroupsOverflow {
                max: 1,
                count: 2,
                ..
            })
        ));
    }
}
