// crates/pavilion-expr/src/parser.rs
// ============================================================================
// Module: Expression Parser
// Description: Recursive-descent parser over the lexer's token stream.
// Purpose: Build an `Expr` tree honoring the documented operator precedence:
//          or, and, not, comparison, additive, multiplicative, unary minus,
//          power (right-associative).
// Dependencies: crate::lexer, crate::ast, crate::error
// ============================================================================

use crate::ast::BinOp;
use crate::ast::Expr;
use crate::error::ExprError;
use crate::lexer::Lexer;
use crate::lexer::SpannedToken;
use crate::lexer::Token;

/// Parses a complete expression from source text (the interior of `{{ }}`,
/// with any trailing `: <format spec>` already split off by the caller).
///
/// # Errors
///
/// Returns [`ExprError`] on any lexical or syntactic failure.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let tokens = Lexer::new(source).lex()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_or()?;
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser<'a> {
    tokens: Vec<SpannedToken<'a>>,
    index: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<SpannedToken<'a>>) -> Self {
        Self { tokens, index: 0 }
    }

    fn current(&self) -> &SpannedToken<'a> {
        &self.tokens[self.index]
    }

    fn advance(&mut self) {
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
    }

    fn matches(&mut self, token: Token<'_>) -> bool {
        if std::mem::discriminant(&self.current().token) == std::mem::discriminant(&token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token<'_>, expected: &'static str) -> Result<(), ExprError> {
        if self.matches(token) {
            Ok(())
        } else {
            Err(ExprError::UnexpectedToken {
                expected,
                found: self.describe_current(),
                position: self.current().position,
            })
        }
    }

    fn expect_eof(&self) -> Result<(), ExprError> {
        if matches!(self.current().token, Token::Eof) {
            Ok(())
        } else {
            Err(ExprError::TrailingInput(self.current().position))
        }
    }

    fn describe_current(&self) -> String {
        match self.current().token {
            Token::Reference(s) | Token::Number(s) | Token::Str(s) => s.to_string(),
            Token::Eof => "end of expression".to_string(),
            _ => format!("{:?}", self.current().token),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.matches(Token::Or) {
            let right = self.parse_and()?;
            left = Expr::BinOp(BinOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_not()?;
        while self.matches(Token::And) {
            let right = self.parse_not()?;
            left = Expr::BinOp(BinOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ExprError> {
        if self.matches(Token::Not) {
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let left = self.parse_additive()?;
        let op = match self.current().token {
            Token::Eq => BinOp::Eq,
            Token::Ne => BinOp::Ne,
            Token::Lt => BinOp::Lt,
            Token::Le => BinOp::Le,
            Token::Gt => BinOp::Gt,
            Token::Ge => BinOp::Ge,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive()?;
        Ok(Expr::BinOp(op, Box::new(left), Box::new(right)))
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current().token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::BinOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current().token {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::TrueDiv,
                Token::DoubleSlash => BinOp::FloorDiv,
                Token::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.matches(Token::Minus) {
            let inner = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ExprError> {
        let base = self.parse_primary()?;
        if self.matches(Token::Caret) {
            let exponent = self.parse_unary()?;
            return Ok(Expr::BinOp(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let SpannedToken { token, position } = *self.current();
        match token {
            Token::Number(raw) => {
                self.advance();
                parse_number_literal(raw, position)
            }
            Token::Str(raw) => {
                self.advance();
                Ok(Expr::Str(raw.to_string()))
            }
            Token::Reference(name) => {
                self.advance();
                if self.matches(Token::LParen) {
                    let args = self.parse_argument_list()?;
                    Ok(Expr::Call(name.to_string(), args))
                } else {
                    Ok(Expr::Reference(name.to_string()))
                }
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_or()?;
                self.expect(Token::RParen, "`)`")?;
                Ok(inner)
            }
            _ => Err(ExprError::UnexpectedToken {
                expected: "a reference, literal, function call, or `(`",
                found: self.describe_current(),
                position,
            }),
        }
    }

    fn parse_argument_list(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.matches(Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            if self.matches(Token::Comma) {
                continue;
            }
            self.expect(Token::RParen, "`)` after arguments")?;
            break;
        }
        Ok(args)
    }
}

fn parse_number_literal(raw: &str, position: usize) -> Result<Expr, ExprError> {
    if raw.contains('.') {
        raw.parse::<f64>()
            .map(Expr::Float)
            .map_err(|_| ExprError::InvalidNumber { raw: raw.to_string(), position })
    } else {
        raw.parse::<i64>()
            .map(Expr::Int)
            .map_err(|_| ExprError::InvalidNumber { raw: raw.to_string(), position })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::BinOp(
                BinOp::Add,
                Box::new(Expr::Int(1)),
                Box::new(Expr::BinOp(BinOp::Mul, Box::new(Expr::Int(2)), Box::new(Expr::Int(3))))
            )
        );
    }

    #[test]
    fn power_is_right_associative() {
        let expr = parse("2 ^ 3 ^ 2").unwrap();
        assert_eq!(
            expr,
            Expr::BinOp(
                BinOp::Pow,
                Box::new(Expr::Int(2)),
                Box::new(Expr::BinOp(BinOp::Pow, Box::new(Expr::Int(3)), Box::new(Expr::Int(2))))
            )
        );
    }

    #[test]
    fn parses_function_call() {
        let expr = parse("keys(x)").unwrap();
        assert_eq!(expr, Expr::Call("keys".to_string(), vec![Expr::Reference("x".to_string())]));
    }

    #[test]
    fn rejects_trailing_input() {
        assert!(matches!(parse("1 + 1)"), Err(ExprError::UnexpectedToken { .. })));
    }
}
