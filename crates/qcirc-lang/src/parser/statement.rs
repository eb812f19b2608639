//! Statement parsing.

use qcirc_ir::{Modifier, RegisterKind};

use super::Parser;
use crate::ast::{AssignOp, ExprKind, FuncDecl, GateDecl, Param, Stmt, StmtKind, TypeName};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a statement.
    pub(super) fn parse_statement(&mut self) -> ParseResult<Stmt> {
        match self.peek() {
            Token::Qubit => self.parse_register_decl(RegisterKind::Qubit),
            Token::Bit => self.parse_register_decl(RegisterKind::Bit),
            Token::Var | Token::Const => self.parse_binding(),
            Token::Def => self.parse_func_decl(),
            Token::Gate => self.parse_gate_decl(),
            Token::Class => self.parse_class_decl(),
            Token::For => self.parse_for(),
            Token::If => self.parse_if(),
            Token::Return => self.parse_return(),
            Token::Ctrl | Token::Inv => self.parse_modified_call(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Parse `qubit[n] name` / `bit[n] name`.
    fn parse_register_decl(&mut self, kind: RegisterKind) -> ParseResult<Stmt> {
        let span = self.advance().span;

        let size = if self.consume(&Token::LBracket) {
            let size = self.parse_size()?;
            self.expect(&Token::RBracket)?;
            size
        } else {
            1
        };

        let name = self.parse_identifier()?;
        Ok(Stmt::new(StmtKind::QuantumDecl { kind, size, name }, span))
    }

    /// Parse a non-negative integer literal that fits in `u32`.
    fn parse_size(&mut self) -> ParseResult<u32> {
        let span = self.peek_span();
        match self.peek() {
            Token::IntLiteral(v) => {
                let v = *v;
                self.advance();
                u32::try_from(v).map_err(|_| ParseError::InvalidSyntax {
                    message: format!("size {v} is out of range"),
                    span,
                })
            }
            _ => Err(self.unexpected("integer literal")),
        }
    }

    /// Parse `var name[: type] = value` or `const name[: type] = value`.
    fn parse_binding(&mut self) -> ParseResult<Stmt> {
        let start = self.advance();
        let name = self.parse_identifier()?;
        let ty = if self.consume(&Token::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(&Token::Eq)?;
        let value = self.parse_expression()?;

        let kind = if start.token == Token::Const {
            StmtKind::ConstDecl { name, ty, value }
        } else {
            StmtKind::VarDecl { name, ty, value }
        };
        Ok(Stmt::new(kind, start.span))
    }

    /// Parse a type name: `int`, `float`, `bool`, `str`, `qubit`, `bit`,
    /// optionally followed by `[]`.
    pub(super) fn parse_type(&mut self) -> ParseResult<TypeName> {
        let span = self.peek_span();
        let base = match self.peek() {
            Token::Qubit => TypeName::Qubit,
            Token::Bit => TypeName::Bit,
            Token::Identifier(name) => match TypeName::from_ident(name) {
                Some(ty) => ty,
                None => return Err(self.unexpected("type name")),
            },
            _ => return Err(self.unexpected("type name")),
        };
        self.advance();

        if self.consume(&Token::LBracket) {
            self.expect(&Token::RBracket)?;
            return base.array_of().ok_or_else(|| ParseError::InvalidSyntax {
                message: format!("'{base}' has no array form"),
                span,
            });
        }
        Ok(base)
    }

    /// Parse a parenthesized parameter list. Untyped parameters are only
    /// allowed for gate-macros, where they default to `qubit`.
    fn parse_params(&mut self, allow_untyped: bool) -> ParseResult<Vec<Param>> {
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        while !self.check(&Token::RParen) {
            let span = self.peek_span();
            let name = self.parse_identifier()?;
            let ty = if self.consume(&Token::Colon) {
                self.parse_type()?
            } else if allow_untyped {
                TypeName::Qubit
            } else {
                return Err(self.unexpected("':'"));
            };
            params.push(Param { name, ty, span });
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        Ok(params)
    }

    /// Parse `def name(params) [-> type] { ... }`.
    fn parse_func_decl(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let name = self.parse_identifier()?;
        let params = self.parse_params(false)?;
        let return_type = if self.consume(&Token::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = self.parse_block()?;

        Ok(Stmt::new(
            StmtKind::FuncDecl(FuncDecl {
                name,
                params,
                return_type,
                body,
            }),
            span,
        ))
    }

    /// Parse `gate name(params) { ... }`.
    fn parse_gate_decl(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let name = self.parse_identifier()?;
        let params = self.parse_params(true)?;
        let body = self.parse_block()?;

        Ok(Stmt::new(
            StmtKind::GateDecl(GateDecl { name, params, body }),
            span,
        ))
    }

    /// Parse `class Name { members }`.
    fn parse_class_decl(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let name = self.parse_identifier()?;
        let members = self.parse_block()?;
        Ok(Stmt::new(StmtKind::ClassDecl { name, members }, span))
    }

    /// Parse `for i in iterable { ... }` or `for (i in iterable) { ... }`.
    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let parenthesized = self.consume(&Token::LParen);
        let var = self.parse_identifier()?;
        self.expect(&Token::In)?;
        let iterable = self.parse_expression()?;
        if parenthesized {
            self.expect(&Token::RParen)?;
        }
        let body = self.parse_block()?;
        Ok(Stmt::new(StmtKind::For { var, iterable, body }, span))
    }

    /// Parse an `if` with its `elif`/`else` chain.
    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let condition = self.parse_expression()?;
        let then_body = self.parse_block()?;

        // `elif` and `else` may start on the line after the closing brace.
        let resume = self.pos;
        self.skip_newlines();
        let else_body = if self.check(&Token::Elif) {
            Some(vec![self.parse_if()?])
        } else if self.consume(&Token::Else) {
            Some(self.parse_block()?)
        } else {
            self.pos = resume;
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_body,
                else_body,
            },
            span,
        ))
    }

    /// Parse `return [value]`.
    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let value = match self.peek() {
            Token::Newline | Token::Semicolon | Token::RBrace | Token::Eof => None,
            _ => Some(self.parse_expression()?),
        };
        Ok(Stmt::new(StmtKind::Return(value), span))
    }

    /// Parse a call prefixed by `ctrl`, `ctrl[n]` or `inv`.
    fn parse_modified_call(&mut self) -> ParseResult<Stmt> {
        let span = self.peek_span();
        let mut prefix = Vec::new();
        loop {
            if self.consume(&Token::Inv) {
                prefix.push(Modifier::Inv);
            } else if self.consume(&Token::Ctrl) {
                let count = if self.consume(&Token::LBracket) {
                    let count_span = self.peek_span();
                    let n = self.parse_size()?;
                    self.expect(&Token::RBracket)?;
                    if n == 0 {
                        return Err(ParseError::InvalidSyntax {
                            message: "control count must be at least 1".into(),
                            span: count_span,
                        });
                    }
                    n
                } else {
                    1
                };
                prefix.push(Modifier::Ctrl(count));
            } else {
                break;
            }
        }

        let mut expr = self.parse_expression()?;
        match &mut expr.kind {
            ExprKind::Call(call) => {
                prefix.append(&mut call.modifiers);
                call.modifiers = prefix;
            }
            _ => {
                return Err(ParseError::InvalidSyntax {
                    message: "modifiers must be followed by a call".into(),
                    span: expr.span,
                });
            }
        }
        expr.span = span;
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }

    /// Parse an expression statement or an assignment.
    fn parse_expression_statement(&mut self) -> ParseResult<Stmt> {
        let span = self.peek_span();
        let expr = self.parse_expression()?;

        let op = match self.peek() {
            Token::Eq => AssignOp::Assign,
            Token::PlusEq => AssignOp::AddAssign,
            Token::MinusEq => AssignOp::SubAssign,
            Token::StarEq => AssignOp::MulAssign,
            Token::SlashEq => AssignOp::DivAssign,
            _ => return Ok(Stmt::new(StmtKind::Expr(expr), span)),
        };
        self.advance();
        let value = self.parse_expression()?;

        Ok(Stmt::new(
            StmtKind::Assign {
                target: expr,
                op,
                value,
            },
            span,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{ArrayExpr, ExprKind, StmtKind, TypeName};
    use crate::parser::parse;

    #[test]
    fn test_bindings() {
        let program = parse("var x: int = 3\nconst N = 4").unwrap();
        assert!(matches!(
            &program.statements[0].kind,
            StmtKind::VarDecl { name, ty: Some(TypeName::Int), .. } if name == "x"
        ));
        assert!(matches!(
            &program.statements[1].kind,
            StmtKind::ConstDecl { ty: None, .. }
        ));
    }

    #[test]
    fn test_register_default_size() {
        let program = parse("qubit a").unwrap();
        assert!(matches!(
            program.statements[0].kind,
            StmtKind::QuantumDecl { size: 1, .. }
        ));
    }

    #[test]
    fn test_func_decl() {
        let program = parse("def half(x: int) -> int { return x // 2 }").unwrap();
        let StmtKind::FuncDecl(func) = &program.statements[0].kind else {
            panic!("expected function");
        };
        assert_eq!(func.params[0].ty, TypeName::Int);
        assert_eq!(func.return_type, Some(TypeName::Int));
        assert!(matches!(func.body[0].kind, StmtKind::Return(Some(_))));
    }

    #[test]
    fn test_func_params_need_types() {
        assert!(parse("def f(x) { }").is_err());
    }

    #[test]
    fn test_gate_params_default_to_qubit() {
        let program = parse("gate R(theta: float, a) { Rx(theta, a) }").unwrap();
        let StmtKind::GateDecl(gate) = &program.statements[0].kind else {
            panic!("expected gate");
        };
        assert_eq!(gate.params[0].ty, TypeName::Float);
        assert_eq!(gate.params[1].ty, TypeName::Qubit);
    }

    #[test]
    fn test_array_param_types() {
        let program = parse("def layer(r: qubit[], angles: float[]) { }").unwrap();
        let StmtKind::FuncDecl(func) = &program.statements[0].kind else {
            panic!("expected function");
        };
        assert_eq!(func.params[0].ty, TypeName::QubitArray);
        assert_eq!(func.params[1].ty, TypeName::FloatArray);
        assert!(parse("def f(s: str[]) { }").is_err());
    }

    #[test]
    fn test_for_forms() {
        for source in [
            "for i in [0:4] { H(q[i]) }",
            "for (i in [0:4]) { H(q[i]) }",
            "for i in [0:2:8] {\n H(q[i])\n}",
            "for i in [1, 3, 5] { H(q[i]) }",
        ] {
            let program = parse(source).unwrap();
            assert!(matches!(program.statements[0].kind, StmtKind::For { .. }), "{source}");
        }

        let program = parse("for i in [0:2:8] { }").unwrap();
        let StmtKind::For { iterable, .. } = &program.statements[0].kind else {
            panic!("expected loop");
        };
        assert!(matches!(
            &iterable.kind,
            ExprKind::Array(ArrayExpr::Range { step: Some(_), .. })
        ));
    }

    #[test]
    fn test_if_chain_across_lines() {
        let source = "if N > 2 {\n X(q)\n}\nelif N == 2 {\n Y(q)\n}\nelse {\n Z(q)\n}\nH(q)";
        let program = parse(source).unwrap();
        assert_eq!(program.statements.len(), 2);
        let StmtKind::If { else_body: Some(else_body), .. } = &program.statements[0].kind else {
            panic!("expected if with else");
        };
        let StmtKind::If { else_body: Some(inner), .. } = &else_body[0].kind else {
            panic!("expected nested elif");
        };
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn test_class_members() {
        let program = parse("class Oracles {\n const K = 2\n gate flip(a) { X(a) }\n}").unwrap();
        let StmtKind::ClassDecl { name, members } = &program.statements[0].kind else {
            panic!("expected class");
        };
        assert_eq!(name, "Oracles");
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn test_compound_assignment() {
        let program = parse("x += 1").unwrap();
        assert!(matches!(program.statements[0].kind, StmtKind::Assign { .. }));
    }

    #[test]
    fn test_modifier_requires_call() {
        assert!(parse("ctrl x").is_err());
        assert!(parse("ctrl[0] X(q[0], q[1])").is_err());
    }

    #[test]
    fn test_return_without_value() {
        let program = parse("def f() { return }").unwrap();
        let StmtKind::FuncDecl(func) = &program.statements[0].kind else {
            panic!("expected function");
        };
        assert!(matches!(func.body[0].kind, StmtKind::Return(None)));
    }
}
