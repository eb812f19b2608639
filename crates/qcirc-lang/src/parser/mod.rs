//! Recursive-descent parser for the Qcirc circuit language.

mod expression;
mod statement;

use tracing::{debug, instrument};

use crate::ast::{Program, Stmt};
use crate::error::{ParseError, ParseResult, SyntaxError};
use crate::lexer::{SpannedToken, Token, tokenize};
use crate::span::Span;

/// Parse a source string into a [`Program`].
#[instrument(skip(source), fields(bytes = source.len()))]
pub fn parse(source: &str) -> Result<Program, SyntaxError> {
    let tokens = tokenize(source)?;
    Ok(parse_tokens(tokens)?)
}

/// Parse an already tokenized source.
///
/// The token list must end with [`Token::Eof`], as produced by [`tokenize`].
pub fn parse_tokens(tokens: Vec<SpannedToken>) -> ParseResult<Program> {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program()?;
    debug!(statements = program.statements.len(), "parsed program");
    Ok(program)
}

/// Parser state.
pub(super) struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(mut tokens: Vec<SpannedToken>) -> Self {
        if tokens.last().is_none_or(|t| t.token != Token::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or(Span::new(1, 1));
            tokens.push(SpannedToken {
                token: Token::Eof,
                span,
            });
        }
        Self { tokens, pos: 0 }
    }

    /// Peek at the current token.
    pub(super) fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    /// Position of the current token.
    pub(super) fn peek_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    /// Check if we've reached the end marker.
    pub(super) fn is_eof(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    /// Advance and return the current token. Stays on the end marker.
    pub(super) fn advance(&mut self) -> SpannedToken {
        let token = self.tokens[self.pos].clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        token
    }

    /// Check if current token matches.
    pub(super) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    /// Consume token if it matches.
    pub(super) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token and return its position.
    pub(super) fn expect(&mut self, token: &Token) -> ParseResult<Span> {
        if self.check(token) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&format!("'{token}'")))
        }
    }

    /// Build the error for the current token.
    pub(super) fn unexpected(&self, expected: &str) -> ParseError {
        let current = &self.tokens[self.pos];
        if current.token == Token::Eof {
            ParseError::UnexpectedEof {
                expected: expected.to_string(),
                span: current.span,
            }
        } else {
            ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("'{}'", current.token),
                span: current.span,
            }
        }
    }

    /// Skip newline tokens.
    pub(super) fn skip_newlines(&mut self) {
        while self.consume(&Token::Newline) {}
    }

    /// Skip any run of statement separators.
    pub(super) fn skip_separators(&mut self) {
        while self.consume(&Token::Newline) || self.consume(&Token::Semicolon) {}
    }

    /// Require a separator after a statement, unless a block or the input ends.
    pub(super) fn end_statement(&mut self) -> ParseResult<()> {
        match self.peek() {
            Token::Newline | Token::Semicolon => {
                self.advance();
                Ok(())
            }
            Token::RBrace | Token::Eof => Ok(()),
            _ => Err(self.unexpected("newline or ';'")),
        }
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            if self.is_eof() {
                break;
            }
            statements.push(self.parse_statement()?);
            self.end_statement()?;
        }
        Ok(Program { statements })
    }

    /// Parse a braced block of statements.
    pub(super) fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.skip_newlines();
        self.expect(&Token::LBrace)?;
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            if self.consume(&Token::RBrace) {
                break;
            }
            if self.is_eof() {
                return Err(self.unexpected("'}'"));
            }
            statements.push(self.parse_statement()?);
            self.end_statement()?;
        }
        Ok(statements)
    }

    /// Parse an identifier.
    pub(super) fn parse_identifier(&mut self) -> ParseResult<String> {
        if let Token::Identifier(name) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected("identifier"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CallTarget, ExprKind, StmtKind};
    use qcirc_ir::{Modifier, RegisterKind};

    fn parse_ok(source: &str) -> Program {
        parse(source).unwrap()
    }

    #[test]
    fn test_parse_bell() {
        let program = parse_ok(
            "qubit[2] q\nbit[2] c\ngate Bell(a, b) {\n    H(a)\n    CNot(a, b)\n}\nBell(q[0], q[1])\nmeasure_all(q, c)\n",
        );
        assert_eq!(program.statements.len(), 5);
        assert!(matches!(
            program.statements[0].kind,
            StmtKind::QuantumDecl { kind: RegisterKind::Qubit, size: 2, .. }
        ));
        let StmtKind::GateDecl(gate) = &program.statements[2].kind else {
            panic!("expected gate declaration");
        };
        assert_eq!(gate.name, "Bell");
        assert_eq!(gate.body.len(), 2);
    }

    #[test]
    fn test_semicolons_and_blank_lines() {
        let program = parse_ok("qubit q;;\n\n H(q); X(q)\n");
        assert_eq!(program.statements.len(), 3);
    }

    #[test]
    fn test_missing_separator() {
        let err = parse("H(q) X(q)").unwrap_err();
        assert!(matches!(
            err,
            SyntaxError::Parse(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_unexpected_eof_in_block() {
        let err = parse("gate G(a) {\n H(a)\n").unwrap_err();
        assert!(matches!(
            err,
            SyntaxError::Parse(ParseError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_lex_error_surfaces() {
        assert!(matches!(parse("H(q) $"), Err(SyntaxError::Lex(_))));
    }

    #[test]
    fn test_modifier_prefix_and_dagger() {
        let program = parse_ok("ctrl inv Rx(q[0], pi / 2, q[1])\nH(q[0])†\nctrl[2] X(q[0], q[1], q[2])");
        let modifiers: Vec<_> = program
            .statements
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Expr(e) => e.as_call().unwrap().modifiers.clone(),
                _ => panic!("expected call"),
            })
            .collect();
        assert_eq!(modifiers[0], vec![Modifier::Ctrl(1), Modifier::Inv]);
        assert_eq!(modifiers[1], vec![Modifier::Inv]);
        assert_eq!(modifiers[2], vec![Modifier::Ctrl(2)]);
    }

    #[test]
    fn test_parser_leaves_targets_unresolved() {
        let program = parse_ok("Oracles.flip(q[0])");
        let StmtKind::Expr(expr) = &program.statements[0].kind else {
            panic!("expected expression statement");
        };
        let call = expr.as_call().unwrap();
        assert_eq!(call.callee, "Oracles.flip");
        assert_eq!(call.target, None::<CallTarget>);
        assert!(matches!(call.args[0].kind, ExprKind::Index { .. }));
    }

    #[test]
    fn test_error_position() {
        let err = parse("qubit[2] q\nH(q[0]\n").unwrap_err();
        let SyntaxError::Parse(err) = err else {
            panic!("expected parse error");
        };
        assert_eq!(err.span().line, 3);
    }
}
