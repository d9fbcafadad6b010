//! Tokenizer for the textual query syntax.
//!
//! The lexer scans the whole input once and then serves tokens through a
//! cursor, so the parser gets cheap lookahead ([`Lexer::peek`],
//! [`Lexer::glimpse`]) and can restart from a saved offset.
//!
//! Whitespace is skipped. Anything the grammar cannot use (control
//! characters, an unterminated quote) becomes a [`TokenKind::None`] token;
//! the parser reports it with its byte offset.

use std::fmt;

use tracing::trace;

use crate::error::SyntaxError;

/// Token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A field name followed by `:` (the colon is part of the token).
    Identifier,
    /// An unquoted run of characters that are not symbols.
    Literal,
    /// A `"..."` string; the value holds the unescaped content.
    QuotedString,
    /// `,`
    Comma,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `=`
    Equals,
    /// `>`
    Greater,
    /// `<`
    Lower,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `!`
    Exclamation,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `~`
    Tilde,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `?`
    Question,
    /// `&`
    Ampersand,
    /// `.`
    Dot,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// Input that cannot be tokenized.
    None,
    /// End of input.
    Eof,
}

impl TokenKind {
    fn from_symbol(c: char) -> Option<Self> {
        let kind = match c {
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '=' => TokenKind::Equals,
            '>' => TokenKind::Greater,
            '<' => TokenKind::Lower,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '!' => TokenKind::Exclamation,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '?' => TokenKind::Question,
            '&' => TokenKind::Ampersand,
            '.' => TokenKind::Dot,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => write!(f, "field name"),
            TokenKind::Literal => write!(f, "literal"),
            TokenKind::QuotedString => write!(f, "quoted string"),
            TokenKind::None => write!(f, "invalid input"),
            TokenKind::Eof => write!(f, "end of input"),
            other => write!(f, "'{}'", other.symbol().unwrap_or('?')),
        }
    }
}

impl TokenKind {
    /// The character of a symbol token.
    pub fn symbol(&self) -> Option<char> {
        let c = match self {
            TokenKind::Comma => ',',
            TokenKind::LParen => '(',
            TokenKind::RParen => ')',
            TokenKind::Equals => '=',
            TokenKind::Greater => '>',
            TokenKind::Lower => '<',
            TokenKind::Plus => '+',
            TokenKind::Minus => '-',
            TokenKind::Star => '*',
            TokenKind::Slash => '/',
            TokenKind::Exclamation => '!',
            TokenKind::Semicolon => ';',
            TokenKind::Colon => ':',
            TokenKind::Tilde => '~',
            TokenKind::LBracket => '[',
            TokenKind::RBracket => ']',
            TokenKind::Question => '?',
            TokenKind::Ampersand => '&',
            TokenKind::Dot => '.',
            TokenKind::LBrace => '{',
            TokenKind::RBrace => '}',
            _ => return None,
        };
        Some(c)
    }
}

/// A token with its location in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token type.
    pub kind: TokenKind,
    /// Token text (field name for identifiers, unescaped content for quoted strings).
    pub value: String,
    /// Byte offset of the first character.
    pub position: usize,
    /// Length in bytes of the source text the token covers.
    pub len: usize,
}

impl Token {
    /// Returns true if `next` starts exactly where this token ends.
    pub fn is_adjacent_to(&self, next: &Token) -> bool {
        self.position + self.len == next.position
    }

    /// Returns true if the token is the given kind.
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    fn describe(&self) -> String {
        match self.kind {
            TokenKind::Literal | TokenKind::Identifier => format!("'{}'", self.value),
            TokenKind::QuotedString => format!("\"{}\"", self.value),
            _ => self.kind.to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Forward-only token cursor over one input string.
#[derive(Debug, Clone)]
pub struct Lexer {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Lexer {
    /// Scans the input.
    pub fn new(input: &str) -> Self {
        Self {
            tokens: scan(input),
            cursor: 0,
        }
    }

    /// Returns the current token and advances.
    ///
    /// Once the end is reached every call returns the [`TokenKind::Eof`] token.
    pub fn next_token(&mut self) -> &Token {
        let idx = self.cursor.min(self.tokens.len() - 1);
        if self.cursor < self.tokens.len() - 1 {
            self.cursor += 1;
        }
        &self.tokens[idx]
    }

    /// Returns the current token without advancing.
    pub fn peek(&self) -> &Token {
        self.glimpse(0)
    }

    /// Returns the token `n` positions after the current one.
    pub fn glimpse(&self, n: usize) -> &Token {
        let idx = (self.cursor + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// Rewinds to the first token.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor to the first token starting at or after `offset`.
    pub fn reset_position(&mut self, offset: usize) {
        self.cursor = self
            .tokens
            .iter()
            .position(|t| t.position >= offset || t.kind == TokenKind::Eof)
            .unwrap_or(self.tokens.len() - 1);
    }

    /// Byte offset of the current token.
    pub fn position(&self) -> usize {
        self.peek().position
    }

    /// Returns true once the cursor reached the end.
    pub fn is_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }
}

/// Tokenizes the whole input, failing on the first invalid token.
///
/// The returned list always ends with an [`TokenKind::Eof`] token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    let tokens = scan(input);
    if let Some(bad) = tokens.iter().find(|t| t.kind == TokenKind::None) {
        return Err(invalid_token_error(bad));
    }
    Ok(tokens)
}

/// Builds the syntax error for a [`TokenKind::None`] token.
pub(crate) fn invalid_token_error(token: &Token) -> SyntaxError {
    if token.value.starts_with('"') {
        SyntaxError::new(token.position, "unterminated quoted string")
    } else {
        SyntaxError::new(
            token.position,
            format!("unexpected character {:?}", token.value),
        )
    }
}

fn is_literal_char(c: char) -> bool {
    !c.is_whitespace() && !c.is_control() && c != '"' && TokenKind::from_symbol(c).is_none()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn scan(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = if c == '"' {
            chars.next();
            let mut value = String::new();
            let mut end = None;
            while let Some((idx, ch)) = chars.next() {
                if ch == '"' {
                    if matches!(chars.peek(), Some((_, '"'))) {
                        chars.next();
                        value.push('"');
                        continue;
                    }
                    end = Some(idx + 1);
                    break;
                }
                value.push(ch);
            }
            match end {
                Some(end) => Token {
                    kind: TokenKind::QuotedString,
                    value,
                    position: start,
                    len: end - start,
                },
                None => Token {
                    kind: TokenKind::None,
                    value: input[start..].to_string(),
                    position: start,
                    len: input.len() - start,
                },
            }
        } else if let Some(kind) = TokenKind::from_symbol(c) {
            chars.next();
            Token {
                kind,
                value: c.to_string(),
                position: start,
                len: c.len_utf8(),
            }
        } else if c.is_control() {
            chars.next();
            Token {
                kind: TokenKind::None,
                value: c.to_string(),
                position: start,
                len: c.len_utf8(),
            }
        } else {
            let mut end = start;
            while let Some(&(idx, ch)) = chars.peek() {
                if !is_literal_char(ch) {
                    break;
                }
                end = idx + ch.len_utf8();
                chars.next();
            }
            let value = &input[start..end];

            // A word followed by ':' (whitespace allowed in between) names a field.
            let rest = &input[end..];
            let gap = rest.len() - rest.trim_start().len();
            if value.chars().all(is_word_char) && rest[gap..].starts_with(':') {
                let colon = end + gap;
                while matches!(chars.peek(), Some(&(idx, _)) if idx <= colon) {
                    chars.next();
                }
                Token {
                    kind: TokenKind::Identifier,
                    value: value.to_string(),
                    position: start,
                    len: colon + 1 - start,
                }
            } else {
                Token {
                    kind: TokenKind::Literal,
                    value: value.to_string(),
                    position: start,
                    len: end - start,
                }
            }
        };

        trace!(kind = ?token.kind, position = token.position, "scanned token");
        tokens.push(token);
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        value: String::new(),
        position: input.len(),
        len: 0,
    });
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        scan(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_identifier_and_literals() {
        let tokens = tokenize("name: foo, bar").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].value, "name");
        assert_eq!(tokens[1].kind, TokenKind::Literal);
        assert_eq!(tokens[1].value, "foo");
        assert_eq!(tokens[1].position, 6);
        assert_eq!(tokens[2].kind, TokenKind::Comma);
        assert_eq!(tokens[3].value, "bar");
        assert_eq!(tokens[4].kind, TokenKind::Eof);
    }

    #[test]
    fn test_identifier_with_space_before_colon() {
        let tokens = tokenize("id  : 1").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].len, 5);
        assert_eq!(tokens[1].value, "1");
    }

    #[test]
    fn test_quoted_string_with_doubled_quotes() {
        let tokens = tokenize(r#"name: "say ""hi"", ok""#).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::QuotedString);
        assert_eq!(tokens[1].value, r#"say "hi", ok"#);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = tokenize(r#"name: "foo"#).unwrap_err();
        assert_eq!(err.position, 6);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_control_character() {
        let err = tokenize("name: a\u{0007}").unwrap_err();
        assert_eq!(err.position, 7);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(
            kinds("~i!*[]<>"),
            vec![
                TokenKind::Tilde,
                TokenKind::Literal,
                TokenKind::Exclamation,
                TokenKind::Star,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Lower,
                TokenKind::Greater,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_adjacency() {
        let tokens = scan("1-10 - 2");
        assert!(tokens[0].is_adjacent_to(&tokens[1]));
        assert!(tokens[1].is_adjacent_to(&tokens[2]));
        assert!(!tokens[2].is_adjacent_to(&tokens[3]));
    }

    #[test]
    fn test_unicode_literal_offsets() {
        let tokens = scan("naam: ñandú;x");
        assert_eq!(tokens[1].value, "ñandú");
        assert_eq!(tokens[2].kind, TokenKind::Semicolon);
        assert_eq!(tokens[2].position, 6 + "ñandú".len());
    }

    #[test]
    fn test_lookahead_and_reset() {
        let mut lexer = Lexer::new("a: 1; b: 2");
        assert_eq!(lexer.peek().value, "a");
        assert_eq!(lexer.glimpse(2).kind, TokenKind::Semicolon);
        lexer.next_token();
        lexer.next_token();
        assert_eq!(lexer.peek().kind, TokenKind::Semicolon);

        lexer.reset_position(6);
        assert_eq!(lexer.peek().value, "b");

        lexer.reset();
        assert_eq!(lexer.next_token().value, "a");
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut lexer = Lexer::new("");
        assert!(lexer.is_eof());
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.glimpse(5).kind, TokenKind::Eof);
    }
}
