// SPDX-License-Identifier: MIT

//! Lexer for rule expressions
//!
//! Produces tokens lazily, one per [`Lexer::next_token`] call, with a single
//! character of lookahead. Lexical failures never panic; they come back as
//! [`TokenKind::Error`] tokens whose literal is the error message.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Identifier,
    Number,
    String,
    Operator,
    /// `true`, `false` or `in`
    Keyword,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Semicolon,
    Error,
}

/// A lexical token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token. Strings hold their unescaped contents and
    /// error tokens hold the error message.
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, literal: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line,
            column,
        }
    }

    /// True when the token is `kind` with exactly this literal
    pub fn is(&self, kind: TokenKind, literal: &str) -> bool {
        self.kind == kind && self.literal == literal
    }

    /// Whether an expression can end with this token. Decides if a following
    /// `-` is subtraction or the sign of a number.
    fn ends_operand(&self) -> bool {
        match self.kind {
            TokenKind::Identifier => !OPERATOR_WORDS.contains(&self.literal.as_str()),
            TokenKind::Number
            | TokenKind::String
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace => true,
            TokenKind::Keyword => self.literal != "in",
            _ => false,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::String => write!(f, "{:?}", self.literal),
            _ => write!(f, "{}", self.literal),
        }
    }
}

const KEYWORDS: [&str; 3] = ["true", "false", "in"];

/// Identifiers the parser reads as binary operators
const OPERATOR_WORDS: [&str; 5] = ["xor", "contains", "startsWith", "endsWith", "matches"];

/// Lexical analyzer for rule expressions
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    /// Whether the previously returned token can end an operand
    after_operand: bool,
    /// Set once the `Eof` token has been handed out by the iterator
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
            after_operand: false,
            finished: false,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Return the next token. Once the input is exhausted every call returns `Eof`.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;
        let Some(c) = self.bump() else {
            return Token::new(TokenKind::Eof, "", line, column);
        };

        let token = match c {
            '=' | '!' | '<' | '>' => {
                if self.bump_if('=') {
                    Token::new(TokenKind::Operator, format!("{}=", c), line, column)
                } else {
                    Token::new(TokenKind::Operator, c, line, column)
                }
            }
            '&' | '|' => {
                if self.bump_if(c) {
                    Token::new(TokenKind::Operator, format!("{}{}", c, c), line, column)
                } else {
                    illegal(c, line, column)
                }
            }
            '*' => {
                if self.bump_if('*') {
                    Token::new(TokenKind::Operator, "**", line, column)
                } else {
                    Token::new(TokenKind::Operator, "*", line, column)
                }
            }
            '-' if !self.after_operand && self.peek().is_some_and(|p| p.is_ascii_digit()) => {
                self.read_number(c, line, column)
            }
            '+' | '-' | '/' | '%' => Token::new(TokenKind::Operator, c, line, column),
            '(' => Token::new(TokenKind::LParen, c, line, column),
            ')' => Token::new(TokenKind::RParen, c, line, column),
            '{' => Token::new(TokenKind::LBrace, c, line, column),
            '}' => Token::new(TokenKind::RBrace, c, line, column),
            '[' => Token::new(TokenKind::LBracket, c, line, column),
            ']' => Token::new(TokenKind::RBracket, c, line, column),
            ',' => Token::new(TokenKind::Comma, c, line, column),
            '.' => Token::new(TokenKind::Dot, c, line, column),
            ';' => Token::new(TokenKind::Semicolon, c, line, column),
            '"' | '\'' => self.read_string(c, line, column),
            c if c.is_ascii_digit() => self.read_number(c, line, column),
            c if c.is_ascii_alphabetic() || c == '$' => self.read_identifier(c, line, column),
            other => illegal(other, line, column),
        };

        self.after_operand = token.ends_operand();
        token
    }

    fn read_identifier(&mut self, first: char, line: usize, column: usize) -> Token {
        let mut ident = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }

        let kind = if KEYWORDS.contains(&ident.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, ident, line, column)
    }

    fn read_number(&mut self, first: char, line: usize, column: usize) -> Token {
        let mut literal = String::from(first);
        self.read_digits(&mut literal);

        if self.bump_if('.') {
            literal.push('.');
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Token::new(
                    TokenKind::Error,
                    format!("invalid number literal '{}'", literal),
                    line,
                    column,
                );
            }
            self.read_digits(&mut literal);
        }

        Token::new(TokenKind::Number, literal, line, column)
    }

    fn read_digits(&mut self, literal: &mut String) {
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            literal.push(c);
            self.bump();
        }
    }

    fn read_string(&mut self, quote: char, line: usize, column: usize) -> Token {
        let mut contents = String::new();
        loop {
            match self.bump() {
                None => {
                    return Token::new(
                        TokenKind::Error,
                        "unterminated string literal",
                        line,
                        column,
                    )
                }
                Some(c) if c == quote => break,
                Some('\\') => match self.bump() {
                    Some('n') => contents.push('\n'),
                    Some('t') => contents.push('\t'),
                    Some('r') => contents.push('\r'),
                    Some(escaped) => contents.push(escaped),
                    None => {
                        return Token::new(
                            TokenKind::Error,
                            "unterminated string literal",
                            line,
                            column,
                        )
                    }
                },
                Some(c) => contents.push(c),
            }
        }
        Token::new(TokenKind::String, contents, line, column)
    }
}

fn illegal(c: char, line: usize, column: usize) -> Token {
    Token::new(
        TokenKind::Error,
        format!("illegal character '{}'", c),
        line,
        column,
    )
}

/// Yields every token including the final `Eof`, then stops
impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}
