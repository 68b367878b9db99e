//! Recursive-descent parser.
//!
//! Grammar, loosest binding first. Every binary level is left-associative, `^` included.
//!
//! ```text
//! Expression     := Addition
//! Addition       := Call (('+'|'-') Call)*
//! Call           := Multiplication Arguments?
//! Arguments      := Call | '(' Expression (',' Expression)* ')'
//! Multiplication := Exponentiation (('*'|'/') Exponentiation)*
//! Exponentiation := Basic ('^' Basic)*
//! Basic          := '(' Expression ')' | '-' Basic Arguments? | NUMBER | IDENT | STRING
//! ```
//!
//! Only a bare name or number takes arguments. Under a minus the arguments bind
//! inside the negation, so `-sin t` is `-(sin t)` and `y * -cos t` is `y * -(cos t)`.

use super::lexer::{Lexer, Token, TokenKind};
use super::{BinaryOp, Callee, CompiledFn, Expr};
use crate::error::{Error, ParseError, Result};

/// Parses a string expression into an AST.
pub fn parse(source: &str) -> Result<Expr> {
    let mut parser = Parser::new(source)?;
    let expr = parser.parse_expression()?;
    if let Some(token) = parser.next {
        return Err(ParseError::Expected {
            wanted: "end of input".to_string(),
            found: describe(&token),
        }
        .into());
    }
    Ok(expr)
}

fn describe(token: &Token<'_>) -> String {
    format!("{} \"{}\" at position {}", token.kind, token.lexeme, token.position)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    next: Option<Token<'a>>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let next = lexer.next().transpose()?;
        Ok(Self { lexer, next })
    }

    fn is(&self, kinds: &[TokenKind]) -> bool {
        self.next.is_some_and(|token| kinds.contains(&token.kind))
    }

    /// Consumes the lookahead, which must be one of `kinds`.
    fn eat(&mut self, kinds: &[TokenKind]) -> Result<Token<'a>> {
        let wanted = || {
            kinds
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or ")
        };
        let token = match self.next {
            None => return Err(ParseError::UnexpectedEnd { wanted: wanted() }.into()),
            Some(token) if !kinds.contains(&token.kind) => {
                return Err(ParseError::Expected {
                    wanted: wanted(),
                    found: describe(&token),
                }
                .into())
            }
            Some(token) => token,
        };
        self.next = self.lexer.next().transpose()?;
        Ok(token)
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_addition()
    }

    fn parse_addition(&mut self) -> Result<Expr> {
        let mut left = self.parse_call()?;
        while self.is(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = match self.eat(&[TokenKind::Plus, TokenKind::Minus])?.kind {
                TokenKind::Plus => BinaryOp::Add,
                _ => BinaryOp::Sub,
            };
            let right = self.parse_call()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_call(&mut self) -> Result<Expr> {
        let head = self.parse_multiplication()?;
        if self.at_arguments() {
            let callee = self.callee(head)?;
            return self.parse_arguments(callee);
        }
        Ok(head)
    }

    fn at_arguments(&self) -> bool {
        self.is(&[TokenKind::Number, TokenKind::Ident, TokenKind::LParen])
    }

    /// Parses what follows a callee: a juxtaposed `Call` or a parenthesized list.
    fn parse_arguments(&mut self, callee: Callee) -> Result<Expr> {
        if !self.is(&[TokenKind::LParen]) {
            let arg = self.parse_call()?;
            return Ok(Expr::Call {
                callee,
                args: vec![arg],
            });
        }

        self.eat(&[TokenKind::LParen])?;
        let mut args = vec![self.parse_expression()?];
        while self.is(&[TokenKind::Comma]) {
            self.eat(&[TokenKind::Comma])?;
            args.push(self.parse_expression()?);
        }
        self.eat(&[TokenKind::RParen])?;
        Ok(Expr::Call { callee, args })
    }

    /// Only a bare name or a number literal can be applied.
    fn callee(&self, head: Expr) -> Result<Callee> {
        match head {
            Expr::Ident(name) => Ok(Callee::Name(name)),
            Expr::Number(value) => Ok(Callee::Number(value)),
            _ => Err(self.not_callable()),
        }
    }

    fn not_callable(&self) -> Error {
        let found = self
            .next
            .as_ref()
            .map(|token| format!("an expression applied to {}", describe(token)))
            .unwrap_or_else(|| "an expression".to_string());
        ParseError::Expected {
            wanted: "function name".to_string(),
            found,
        }
        .into()
    }

    fn parse_multiplication(&mut self) -> Result<Expr> {
        let mut left = self.parse_exponentiation()?;
        while self.is(&[TokenKind::Star, TokenKind::Slash]) {
            let op = match self.eat(&[TokenKind::Star, TokenKind::Slash])?.kind {
                TokenKind::Star => BinaryOp::Mul,
                _ => BinaryOp::Div,
            };
            let right = self.parse_exponentiation()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_exponentiation(&mut self) -> Result<Expr> {
        let mut left = self.parse_basic()?;
        while self.is(&[TokenKind::Caret]) {
            self.eat(&[TokenKind::Caret])?;
            let right = self.parse_basic()?;
            left = binary(BinaryOp::Pow, left, right);
        }
        Ok(left)
    }

    fn parse_basic(&mut self) -> Result<Expr> {
        let Some(token) = self.next else {
            return Err(ParseError::UnexpectedEnd {
                wanted: "expression".to_string(),
            }
            .into());
        };

        match token.kind {
            TokenKind::LParen => {
                self.eat(&[TokenKind::LParen])?;
                let expr = self.parse_expression()?;
                self.eat(&[TokenKind::RParen])?;
                Ok(expr)
            }
            TokenKind::Minus => {
                self.eat(&[TokenKind::Minus])?;
                let mut operand = self.parse_basic()?;
                if matches!(operand, Expr::Ident(_) | Expr::Number(_)) && self.at_arguments() {
                    let callee = self.callee(operand)?;
                    operand = self.parse_arguments(callee)?;
                }
                Ok(Expr::Neg(Box::new(operand)))
            }
            TokenKind::Number => {
                let token = self.eat(&[TokenKind::Number])?;
                let value = token.lexeme.parse::<f64>().map_err(|_| ParseError::Expected {
                    wanted: "number".to_string(),
                    found: describe(&token),
                })?;
                Ok(Expr::Number(value))
            }
            TokenKind::Ident => {
                let token = self.eat(&[TokenKind::Ident])?;
                Ok(Expr::Ident(token.lexeme.to_string()))
            }
            TokenKind::Str => {
                let token = self.eat(&[TokenKind::Str])?;
                let inner = &token.lexeme[1..token.lexeme.len() - 1];
                // Checked now so syntax errors surface when the outer expression compiles.
                let expr = parse(inner)?;
                Ok(Expr::Nested(CompiledFn::new(inner, expr)))
            }
            _ => Err(ParseError::InvalidExpression {
                found: describe(&token),
            }
            .into()),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
