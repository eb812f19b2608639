//! Expression parsing.

use qcirc_ir::Modifier;

use super::Parser;
use crate::ast::{ArrayExpr, BinOp, CallExpr, Expr, ExprKind, UnaryOp};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

/// Binding power of prefix `not`, between `and` and the comparisons.
const NOT_PRECEDENCE: u8 = 3;

impl Parser {
    /// Parse an expression.
    pub(super) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_binary_expr(0)
    }

    /// Parse binary expression with precedence climbing.
    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut left = self.parse_operand()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance();

            let right = self.parse_binary_expr(prec + 1)?;
            let span = left.span;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(left),
                    rhs: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    /// Parse an operand of a binary operator, including prefix `not`.
    fn parse_operand(&mut self) -> ParseResult<Expr> {
        if self.check(&Token::Not) {
            let span = self.advance().span;
            let operand = self.parse_binary_expr(NOT_PRECEDENCE)?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_unary_expr()
    }

    /// Parse unary minus. Binds looser than `**`, so `-2 ** 2` is `-(2 ** 2)`.
    fn parse_unary_expr(&mut self) -> ParseResult<Expr> {
        if self.check(&Token::Minus) {
            let span = self.advance().span;
            let operand = self.parse_unary_expr()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_power_expr()
    }

    /// Parse `**`, which is right associative.
    fn parse_power_expr(&mut self) -> ParseResult<Expr> {
        let base = self.parse_postfix_expr()?;
        if self.consume(&Token::Power) {
            let exponent = self.parse_unary_expr()?;
            let span = base.span;
            return Ok(Expr::new(
                ExprKind::Binary {
                    op: BinOp::Pow,
                    lhs: Box::new(base),
                    rhs: Box::new(exponent),
                },
                span,
            ));
        }
        Ok(base)
    }

    /// Parse calls, indexing, member access and the dagger suffix.
    fn parse_postfix_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary_expr()?;

        loop {
            match self.peek() {
                Token::LParen => {
                    let callee = expr.as_path().ok_or_else(|| ParseError::InvalidSyntax {
                        message: "only names can be called".into(),
                        span: expr.span,
                    })?;
                    self.advance();
                    let args = self.parse_expression_list(&Token::RParen)?;
                    self.expect(&Token::RParen)?;
                    expr = Expr::new(ExprKind::Call(CallExpr::new(callee, args)), expr.span);
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&Token::RBracket)?;
                    let span = expr.span;
                    expr = Expr::new(
                        ExprKind::Index {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                Token::Dot => {
                    self.advance();
                    let member = self.parse_identifier()?;
                    let span = expr.span;
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            member,
                        },
                        span,
                    );
                }
                Token::Dagger => {
                    let span = self.advance().span;
                    match &mut expr.kind {
                        ExprKind::Call(call) => call.modifiers.push(Modifier::Inv),
                        _ => {
                            return Err(ParseError::InvalidSyntax {
                                message: "'†' can only follow a call".into(),
                                span,
                            });
                        }
                    }
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse primary expression.
    fn parse_primary_expr(&mut self) -> ParseResult<Expr> {
        let span = self.peek_span();
        let kind = match self.peek() {
            Token::IntLiteral(v) => ExprKind::Int(*v),
            Token::FloatLiteral(v) => ExprKind::Float(*v),
            Token::True => ExprKind::Bool(true),
            Token::False => ExprKind::Bool(false),
            Token::StringLiteral(s) => ExprKind::Str(s.clone()),
            Token::Identifier(name) => ExprKind::Ident(name.clone()),
            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                return Ok(expr);
            }
            Token::LBracket => {
                self.advance();
                let array = self.parse_array()?;
                return Ok(Expr::new(ExprKind::Array(array), span));
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok(Expr::new(kind, span))
    }

    /// Parse the inside of `[...]` after the opening bracket: a list,
    /// a range or a stepped range.
    fn parse_array(&mut self) -> ParseResult<ArrayExpr> {
        if self.consume(&Token::RBracket) {
            return Ok(ArrayExpr::List(vec![]));
        }

        let first = self.parse_expression()?;
        if self.consume(&Token::Colon) {
            let second = self.parse_expression()?;
            let array = if self.consume(&Token::Colon) {
                let third = self.parse_expression()?;
                ArrayExpr::Range {
                    start: Box::new(first),
                    step: Some(Box::new(second)),
                    end: Box::new(third),
                }
            } else {
                ArrayExpr::Range {
                    start: Box::new(first),
                    step: None,
                    end: Box::new(second),
                }
            };
            self.expect(&Token::RBracket)?;
            return Ok(array);
        }

        let mut items = vec![first];
        while self.consume(&Token::Comma) {
            if self.check(&Token::RBracket) {
                break;
            }
            items.push(self.parse_expression()?);
        }
        self.expect(&Token::RBracket)?;
        Ok(ArrayExpr::List(items))
    }

    /// Peek at binary operator.
    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek() {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::SlashSlash => Some(BinOp::FloorDiv),
            Token::Percent => Some(BinOp::Mod),
            Token::EqEq => Some(BinOp::Eq),
            Token::NotEq => Some(BinOp::NotEq),
            Token::Lt => Some(BinOp::Lt),
            Token::LtEq => Some(BinOp::LtEq),
            Token::Gt => Some(BinOp::Gt),
            Token::GtEq => Some(BinOp::GtEq),
            Token::And => Some(BinOp::And),
            Token::Or => Some(BinOp::Or),
            _ => None,
        }
    }

    /// Parse a comma separated list up to (not including) `close`.
    pub(super) fn parse_expression_list(&mut self, close: &Token) -> ParseResult<Vec<Expr>> {
        let mut exprs = Vec::new();
        while !self.check(close) {
            exprs.push(self.parse_expression()?);
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        Ok(exprs)
    }
}

/// Get operator precedence. `**` is handled separately.
fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 1,
        BinOp::And => 2,
        BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => 4,
        BinOp::Add | BinOp::Sub => 5,
        BinOp::Mul | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => 6,
        BinOp::Pow => 7,
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinOp, Expr, ExprKind, StmtKind, UnaryOp};
    use crate::parser::parse;

    fn expr(source: &str) -> Expr {
        let program = parse(&format!("x = {source}")).unwrap();
        match program.statements.into_iter().next().unwrap().kind {
            StmtKind::Assign { value, .. } => value,
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    fn binary(e: &Expr) -> (BinOp, &Expr, &Expr) {
        match &e.kind {
            ExprKind::Binary { op, lhs, rhs } => (*op, lhs, rhs),
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_mul_binds_tighter_than_add() {
        let e = expr("1 + 2 * 3");
        let (op, _, rhs) = binary(&e);
        assert_eq!(op, BinOp::Add);
        assert_eq!(binary(rhs).0, BinOp::Mul);
    }

    #[test]
    fn test_power_is_right_associative() {
        let e = expr("2 ** 3 ** 2");
        let (op, lhs, rhs) = binary(&e);
        assert_eq!(op, BinOp::Pow);
        assert!(matches!(lhs.kind, ExprKind::Int(2)));
        assert_eq!(binary(rhs).0, BinOp::Pow);
    }

    #[test]
    fn test_unary_minus_below_power() {
        let e = expr("-2 ** 2");
        let ExprKind::Unary { op: UnaryOp::Neg, operand } = &e.kind else {
            panic!("expected negation");
        };
        assert_eq!(binary(operand).0, BinOp::Pow);
    }

    #[test]
    fn test_not_below_comparison() {
        let e = expr("not a == b and c");
        let (op, lhs, _) = binary(&e);
        assert_eq!(op, BinOp::And);
        let ExprKind::Unary { op: UnaryOp::Not, operand } = &lhs.kind else {
            panic!("expected not");
        };
        assert_eq!(binary(operand).0, BinOp::Eq);
    }

    #[test]
    fn test_or_lowest() {
        let e = expr("a and b or c");
        assert_eq!(binary(&e).0, BinOp::Or);
    }

    #[test]
    fn test_floor_div_and_mod() {
        let e = expr("7 // 2 % 3");
        let (op, lhs, _) = binary(&e);
        assert_eq!(op, BinOp::Mod);
        assert_eq!(binary(lhs).0, BinOp::FloorDiv);
    }

    #[test]
    fn test_postfix_chain() {
        let e = expr("Cls.values[2]");
        let ExprKind::Index { base, .. } = &e.kind else {
            panic!("expected index");
        };
        assert_eq!(base.as_path().as_deref(), Some("Cls.values"));
    }

    #[test]
    fn test_call_arguments_across_lines() {
        let e = expr("max(1,\n  2,\n  3)");
        assert_eq!(e.as_call().unwrap().args.len(), 3);
    }

    #[test]
    fn test_only_names_are_callable() {
        assert!(parse("x = (a + b)(1)").is_err());
        assert!(parse("x = a†").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert!(matches!(expr("\"hi\"").kind, ExprKind::Str(ref s) if s == "hi"));
    }
}
