//! Qcirc Language Front End
//!
//! This crate turns source text of the Qcirc circuit language into an
//! abstract syntax tree. It performs no semantic judgment: any identifier or
//! dotted path is accepted as a call target, and types are checked later by
//! `qcirc-compile`.
//!
//! # Example
//!
//! ```rust
//! use qcirc_lang::{parse, ast::StmtKind};
//!
//! let source = r"
//! qubit[2] q
//! bit[2] c
//! H(q[0])
//! CNot(q[0], q[1])
//! measure_all(q, c)
//! ";
//!
//! let program = parse(source).unwrap();
//! assert_eq!(program.statements.len(), 5);
//! assert!(matches!(program.statements[0].kind, StmtKind::QuantumDecl { .. }));
//! ```
//!
//! # Syntax Overview
//!
//! - `#` starts a comment that runs to the end of the line.
//! - Statements are separated by newlines or `;`. Newlines inside `(...)` and
//!   `[...]` do not end a statement.
//! - Blocks use braces: `for i in [0:4] { H(q[i]) }`.
//! - Modifiers prefix a call (`ctrl`, `ctrl[n]`, `inv`); a trailing `†` is
//!   shorthand for `inv`.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

pub use ast::{CallExpr, CallTarget, CallableId, Expr, ExprKind, Program, Stmt, StmtKind};
pub use error::{LexError, LexErrorKind, LexResult, ParseError, ParseResult, SyntaxError};
pub use lexer::{SpannedToken, Token, tokenize};
pub use parser::{parse, parse_tokens};
pub use span::Span;
