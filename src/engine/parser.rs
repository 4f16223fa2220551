// SPDX-License-Identifier: MIT

//! Recursive-descent parser for rule expressions
//!
//! Grammar, lowest to highest precedence (binary operators are left-associative):
//!
//! ```text
//! expression     := andExpr ( ('||' | 'xor') andExpr )*
//! andExpr        := comparison ( '&&' comparison )*
//! comparison     := additive ( compOp additive )?
//! additive       := multiplicative ( ('+' | '-') multiplicative )*
//! multiplicative := unary ( ('*' | '/' | '%' | '**') unary )*
//! unary          := '!' unary | primary
//! primary        := '(' expression ')' | '(' list ')' | '[' list? ']'
//!                 | string | number | 'true' | 'false'
//!                 | identifier '(' list? ')' | identifier ( '.' identifier )*
//! ```
//!
//! A comparison level holds at most one comparison, so `a < b < c` is rejected.

use super::ast::{BinaryOp, Expression, UnaryOp};
use super::lexer::{Lexer, Token, TokenKind};
use super::value::Value;
use crate::error::ParseError;

/// Maximum height of a parsed tree, and maximum nesting of unary operators
/// and parentheses
pub const MAX_DEPTH: usize = 256;

/// Parse an expression string into an AST
pub fn parse(input: &str) -> Result<Expression, ParseError> {
    let expr = Parser::new(input).parse()?;
    log::trace!("parsed '{}' as {}", input, expr);
    Ok(expr)
}

/// Parser over the token stream of one source string
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            depth: 0,
        }
    }

    /// Parse a complete expression; any input left over is an error
    pub fn parse(mut self) -> Result<Expression, ParseError> {
        self.check_lexical()?;
        let Parsed { expr, .. } = self.expression()?;

        if self.current.kind != TokenKind::Eof {
            return Err(ParseError::TrailingInput {
                found: self.current.to_string(),
                line: self.current.line,
                column: self.current.column,
            });
        }
        Ok(expr)
    }

    fn check_lexical(&self) -> Result<(), ParseError> {
        if self.current.kind == TokenKind::Error {
            return Err(ParseError::Lexical {
                message: self.current.literal.clone(),
                line: self.current.line,
                column: self.current.column,
            });
        }
        Ok(())
    }

    /// Move to the next token, returning the one just consumed
    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token();
        let consumed = std::mem::replace(&mut self.current, next);
        self.check_lexical()?;
        Ok(consumed)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        if self.current.kind == TokenKind::Eof {
            ParseError::UnexpectedEof {
                expected: expected.to_string(),
            }
        } else {
            ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: self.current.to_string(),
                line: self.current.line,
                column: self.current.column,
            }
        }
    }

    fn expression(&mut self) -> Result<Parsed, ParseError> {
        let mut left = self.and_expression()?;

        loop {
            let op = if self.current.is(TokenKind::Operator, "||") {
                BinaryOp::Or
            } else if self.current.is(TokenKind::Identifier, "xor") {
                BinaryOp::Xor
            } else {
                break;
            };
            self.advance()?;
            let right = self.and_expression()?;
            left = binary(op, left, right)?;
        }

        Ok(left)
    }

    fn and_expression(&mut self) -> Result<Parsed, ParseError> {
        let mut left = self.comparison()?;

        while self.current.is(TokenKind::Operator, "&&") {
            self.advance()?;
            let right = self.comparison()?;
            left = binary(BinaryOp::And, left, right)?;
        }

        Ok(left)
    }

    fn comparison(&mut self) -> Result<Parsed, ParseError> {
        let left = self.additive()?;

        match self.comparison_operator() {
            Some(op) => {
                self.advance()?;
                let right = self.additive()?;
                binary(op, left, right)
            }
            None => Ok(left),
        }
    }

    fn comparison_operator(&self) -> Option<BinaryOp> {
        match self.current.kind {
            TokenKind::Operator | TokenKind::Keyword | TokenKind::Identifier => {
                BinaryOp::from_symbol(&self.current.literal).filter(BinaryOp::is_comparison)
            }
            _ => None,
        }
    }

    fn additive(&mut self) -> Result<Parsed, ParseError> {
        let mut left = self.multiplicative()?;

        loop {
            let op = match self.operator_literal() {
                Some("+") => BinaryOp::Add,
                Some("-") => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.multiplicative()?;
            left = binary(op, left, right)?;
        }

        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Parsed, ParseError> {
        let mut left = self.unary()?;

        loop {
            let op = match self.operator_literal() {
                Some("*") => BinaryOp::Mul,
                Some("/") => BinaryOp::Div,
                Some("%") => BinaryOp::Mod,
                Some("**") => BinaryOp::Pow,
                _ => break,
            };
            self.advance()?;
            let right = self.unary()?;
            left = binary(op, left, right)?;
        }

        Ok(left)
    }

    fn operator_literal(&self) -> Option<&str> {
        (self.current.kind == TokenKind::Operator).then_some(self.current.literal.as_str())
    }

    fn unary(&mut self) -> Result<Parsed, ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep { limit: MAX_DEPTH });
        }

        let result = if self.current.is(TokenKind::Operator, "!") {
            self.advance()?;
            self.unary().and_then(|operand| {
                Parsed::node(
                    Expression::unary(UnaryOp::Not, operand.expr),
                    operand.height,
                )
            })
        } else {
            self.primary()
        };

        self.depth -= 1;
        result
    }

    fn primary(&mut self) -> Result<Parsed, ParseError> {
        match self.current.kind {
            TokenKind::LParen => self.parenthesized(),
            TokenKind::LBracket => {
                self.advance()?;
                let items = self.list(TokenKind::RBracket, "']'")?;
                Parsed::list(items)
            }
            TokenKind::String => {
                let token = self.advance()?;
                Ok(Parsed::leaf(Expression::literal(token.literal)))
            }
            TokenKind::Number => {
                let token = self.advance()?;
                parse_number(&token).map(|n| Parsed::leaf(Expression::literal(n)))
            }
            TokenKind::Keyword if self.current.literal == "true" => {
                self.advance()?;
                Ok(Parsed::leaf(Expression::literal(true)))
            }
            TokenKind::Keyword if self.current.literal == "false" => {
                self.advance()?;
                Ok(Parsed::leaf(Expression::literal(false)))
            }
            TokenKind::Identifier => self.identifier(),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `( expr )` groups, `( a, b, ... )` and `()` are list literals
    fn parenthesized(&mut self) -> Result<Parsed, ParseError> {
        self.advance()?;
        if self.current.kind == TokenKind::RParen {
            self.advance()?;
            return Parsed::list(Vec::new());
        }

        let first = self.expression()?;
        if self.current.kind == TokenKind::Comma {
            self.advance()?;
            let mut items = vec![first];
            items.extend(self.list(TokenKind::RParen, "')'")?);
            return Parsed::list(items);
        }

        self.expect(TokenKind::RParen, "')'")?;
        Ok(first)
    }

    /// Comma-separated expressions up to and including `close`. A trailing
    /// comma is accepted.
    fn list(&mut self, close: TokenKind, expected: &str) -> Result<Vec<Parsed>, ParseError> {
        let mut items = Vec::new();
        while self.current.kind != close {
            items.push(self.expression()?);
            if self.current.kind == TokenKind::Comma {
                self.advance()?;
            } else if self.current.kind != close {
                return Err(self.unexpected(&format!("',' or {}", expected)));
            }
        }
        self.advance()?;
        Ok(items)
    }

    fn identifier(&mut self) -> Result<Parsed, ParseError> {
        let token = self.advance()?;
        let has_sigil = token.literal.starts_with('$');
        let name = token.literal.trim_start_matches('$');
        if name.is_empty() {
            return Err(ParseError::UnexpectedToken {
                expected: "variable name".to_string(),
                found: token.literal.clone(),
                line: token.line,
                column: token.column,
            });
        }

        if !has_sigil && self.current.kind == TokenKind::LParen {
            self.advance()?;
            let args = self.list(TokenKind::RParen, "')'")?;
            let height = max_height(&args);
            return Parsed::node(
                Expression::Call {
                    function: name.to_string(),
                    args: args.into_iter().map(|arg| arg.expr).collect(),
                },
                height,
            );
        }

        let mut path = Vec::new();
        while self.current.kind == TokenKind::Dot {
            self.advance()?;
            let segment = self.expect(TokenKind::Identifier, "field name")?;
            path.push(segment.literal);
        }

        Ok(Parsed::leaf(Expression::Variable {
            name: name.to_string(),
            path,
        }))
    }
}

/// An expression with the height of its tree. Evaluation recurses once per
/// level, so no tree taller than [`MAX_DEPTH`] leaves the parser.
struct Parsed {
    expr: Expression,
    height: usize,
}

impl Parsed {
    fn leaf(expr: Expression) -> Self {
        Self { expr, height: 1 }
    }

    /// A node one level above children of `child_height`
    fn node(expr: Expression, child_height: usize) -> Result<Self, ParseError> {
        let height = child_height + 1;
        if height > MAX_DEPTH {
            return Err(ParseError::TooDeep { limit: MAX_DEPTH });
        }
        Ok(Self { expr, height })
    }

    fn list(items: Vec<Parsed>) -> Result<Self, ParseError> {
        let height = max_height(&items);
        Self::node(
            Expression::List {
                items: items.into_iter().map(|item| item.expr).collect(),
            },
            height,
        )
    }
}

fn binary(op: BinaryOp, left: Parsed, right: Parsed) -> Result<Parsed, ParseError> {
    let height = left.height.max(right.height);
    Parsed::node(Expression::binary(op, left.expr, right.expr), height)
}

fn max_height(items: &[Parsed]) -> usize {
    items.iter().map(|item| item.height).max().unwrap_or(0)
}

/// Integers first, then floats
fn parse_number(token: &Token) -> Result<Value, ParseError> {
    if let Ok(i) = token.literal.parse::<i64>() {
        return Ok(Value::Int64(i));
    }
    if let Ok(f) = token.literal.parse::<f64>() {
        return Ok(Value::Float64(f));
    }
    Err(ParseError::InvalidNumber {
        literal: token.literal.clone(),
        line: token.line,
        column: token.column,
    })
}
