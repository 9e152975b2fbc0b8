//! SQL tokenizer.
//!
//! Turns raw query text into a stream of [`SpannedToken`]s. Every token
//! carries the byte offset, line and column where it starts so that the
//! parser can report precise error locations and recover the exact source
//! text of projection items.

use std::fmt;

use super::error::{ParseError, ParseResult};

/// A position in the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    /// Byte offset into the input.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number, counted in characters.
    pub column: usize,
}

/// A token together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    /// The token itself.
    pub token: Token,
    /// Where the token starts.
    pub start: Location,
    /// Byte offset one past the last character of the token.
    pub end: usize,
}

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A numeric literal, kept as written.
    Number(String),
    /// A single-quoted string literal with escapes resolved.
    String(String),
    /// An identifier. Double-quoted identifiers keep their inner text.
    Ident(String),
    /// A reserved word.
    Keyword(Keyword),
    Period,
    Comma,
    Semicolon,
    OpenParen,
    CloseParen,
    Asterisk,
    Plus,
    Minus,
    Slash,
    Percent,
    Concat,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::String(s) => write!(f, "string '{}'", s),
            Token::Ident(s) => write!(f, "identifier {}", s),
            Token::Keyword(k) => write!(f, "keyword {}", k),
            Token::Period => f.write_str("'.'"),
            Token::Comma => f.write_str("','"),
            Token::Semicolon => f.write_str("';'"),
            Token::OpenParen => f.write_str("'('"),
            Token::CloseParen => f.write_str("')'"),
            Token::Asterisk => f.write_str("'*'"),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Slash => f.write_str("'/'"),
            Token::Percent => f.write_str("'%'"),
            Token::Concat => f.write_str("'||'"),
            Token::Equal => f.write_str("'='"),
            Token::NotEqual => f.write_str("'<>'"),
            Token::LessThan => f.write_str("'<'"),
            Token::LessThanOrEqual => f.write_str("'<='"),
            Token::GreaterThan => f.write_str("'>'"),
            Token::GreaterThanOrEqual => f.write_str("'>='"),
        }
    }
}

impl From<Keyword> for Token {
    fn from(keyword: Keyword) -> Self {
        Token::Keyword(keyword)
    }
}

macro_rules! keywords {
    ($($variant:ident => $text:literal),* $(,)?) => {
        /// Reserved SQL keywords.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(missing_docs)]
        pub enum Keyword {
            $($variant),*
        }

        impl Keyword {
            /// Looks up a keyword, ignoring case.
            pub fn lookup(word: &str) -> Option<Self> {
                $(
                    if word.eq_ignore_ascii_case($text) {
                        return Some(Keyword::$variant);
                    }
                )*
                None
            }

            /// The canonical upper-case spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text),*
                }
            }
        }
    };
}

keywords! {
    Alter => "ALTER",
    And => "AND",
    As => "AS",
    Asc => "ASC",
    Between => "BETWEEN",
    By => "BY",
    Create => "CREATE",
    Cross => "CROSS",
    Delete => "DELETE",
    Desc => "DESC",
    Distinct => "DISTINCT",
    Drop => "DROP",
    False => "FALSE",
    From => "FROM",
    Full => "FULL",
    Group => "GROUP",
    Having => "HAVING",
    In => "IN",
    Inner => "INNER",
    Insert => "INSERT",
    Is => "IS",
    Join => "JOIN",
    Left => "LEFT",
    Like => "LIKE",
    Limit => "LIMIT",
    Not => "NOT",
    Null => "NULL",
    Offset => "OFFSET",
    On => "ON",
    Or => "OR",
    Order => "ORDER",
    Outer => "OUTER",
    Right => "RIGHT",
    Select => "SELECT",
    True => "TRUE",
    Union => "UNION",
    Update => "UPDATE",
    Where => "WHERE",
    With => "WITH",
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits SQL text into tokens.
pub struct Lexer<'a> {
    input: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenizes the whole input.
    pub fn tokenize(input: &'a str) -> ParseResult<Vec<SpannedToken>> {
        Lexer::new(input).collect()
    }

    /// The location the lexer is currently at.
    pub fn location(&self) -> Location {
        Location {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.bump();
        }
    }

    /// Skips whitespace, `-- line` comments and `/* block */` comments.
    fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            let rest = self.rest();
            if rest.starts_with("--") {
                self.bump_while(|c| c != '\n');
            } else if rest.starts_with("/*") {
                let start = self.location();
                self.bump();
                self.bump();
                loop {
                    if self.rest().starts_with("*/") {
                        self.bump();
                        self.bump();
                        break;
                    }
                    if self.bump().is_none() {
                        return Err(ParseError::invalid_token("unterminated block comment", start));
                    }
                }
            } else if self.peek().is_some_and(char::is_whitespace) {
                self.bump_while(char::is_whitespace);
            } else {
                return Ok(());
            }
        }
    }

    fn scan(&mut self) -> ParseResult<Option<SpannedToken>> {
        self.skip_trivia()?;
        let start = self.location();
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let token = match c {
            '\'' => self.scan_string(start)?,
            '"' => self.scan_quoted_ident(start)?,
            c if c.is_ascii_digit() => self.scan_number(),
            '.' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            c if c.is_alphabetic() || c == '_' => self.scan_word(),
            _ => self.scan_symbol(start)?,
        };
        Ok(Some(SpannedToken {
            token,
            start,
            end: self.offset,
        }))
    }

    fn scan_word(&mut self) -> Token {
        let begin = self.offset;
        self.bump_while(|c| c.is_alphanumeric() || c == '_');
        let word = &self.input[begin..self.offset];
        match Keyword::lookup(word) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Ident(word.to_string()),
        }
    }

    fn scan_number(&mut self) -> Token {
        let begin = self.offset;
        self.bump_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            self.bump();
            self.bump_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_digits = match self.peek_second() {
                Some('+' | '-') => self.rest().chars().nth(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_digits {
                self.bump();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.bump();
                }
                self.bump_while(|c| c.is_ascii_digit());
            }
        }
        Token::Number(self.input[begin..self.offset].to_string())
    }

    fn scan_string(&mut self, start: Location) -> ParseResult<Token> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.bump();
                    value.push('\'');
                }
                Some('\'') => return Ok(Token::String(value)),
                Some(c) => value.push(c),
                None => {
                    return Err(ParseError::invalid_token("unterminated string literal", start))
                }
            }
        }
    }

    fn scan_quoted_ident(&mut self, start: Location) -> ParseResult<Token> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') if self.peek() == Some('"') => {
                    self.bump();
                    value.push('"');
                }
                Some('"') if value.is_empty() => {
                    return Err(ParseError::invalid_token("empty quoted identifier", start))
                }
                Some('"') => return Ok(Token::Ident(value)),
                Some(c) => value.push(c),
                None => {
                    return Err(ParseError::invalid_token(
                        "unterminated quoted identifier",
                        start,
                    ))
                }
            }
        }
    }

    fn scan_symbol(&mut self, start: Location) -> ParseResult<Token> {
        let Some(c) = self.bump() else {
            return Err(ParseError::invalid_token("unexpected end of input", start));
        };
        let token = match c {
            '.' => Token::Period,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            '*' => Token::Asterisk,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '=' => Token::Equal,
            '|' if self.peek() == Some('|') => {
                self.bump();
                Token::Concat
            }
            '!' if self.peek() == Some('=') => {
                self.bump();
                Token::NotEqual
            }
            '<' => match self.peek() {
                Some('=') => {
                    self.bump();
                    Token::LessThanOrEqual
                }
                Some('>') => {
                    self.bump();
                    Token::NotEqual
                }
                _ => Token::LessThan,
            },
            '>' if self.peek() == Some('=') => {
                self.bump();
                Token::GreaterThanOrEqual
            }
            '>' => Token::GreaterThan,
            other => {
                return Err(ParseError::invalid_token(
                    format!("unexpected character '{}'", other),
                    start,
                ))
            }
        };
        Ok(token)
    }
}

impl Iterator for Lexer<'_> {
    type Item = ParseResult<SpannedToken>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan().transpose()
    }
}
