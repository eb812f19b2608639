//! Verification of the expanded program.

use tracing::debug;

use qcirc_lang::ast::StmtKind;
use qcirc_lang::{CallTarget, Program};

use super::ExpansionContext;
use crate::error::{CompileResult, ExpansionError};
use crate::pass::{Pass, PassKind};

/// Analysis pass that checks the expansion left only register declarations
/// and built-in quantum calls.
pub struct VerifyExpanded;

impl Pass for VerifyExpanded {
    fn name(&self) -> &'static str {
        "verify_expanded"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, program: &mut Program, _ctx: &mut ExpansionContext<'_>) -> CompileResult<()> {
        let mut calls = 0;
        for stmt in &program.statements {
            match &stmt.kind {
                StmtKind::QuantumDecl { .. } => {}
                StmtKind::Expr(expr)
                    if matches!(
                        expr.as_call().and_then(|c| c.target),
                        Some(CallTarget::Builtin(_))
                    ) =>
                {
                    calls += 1;
                }
                other => {
                    return Err(ExpansionError::internal(
                        format!("statement survived expansion: {}", describe(other)),
                        stmt.span,
                    )
                    .into());
                }
            }
        }
        debug!(calls, "expanded program verified");
        Ok(())
    }
}

fn describe(kind: &StmtKind) -> &'static str {
    match kind {
        StmtKind::QuantumDecl { .. } => "register declaration",
        StmtKind::VarDecl { .. } => "variable declaration",
        StmtKind::ConstDecl { .. } => "constant declaration",
        StmtKind::FuncDecl(_) => "function declaration",
        StmtKind::GateDecl(_) => "gate declaration",
        StmtKind::ClassDecl { .. } => "class declaration",
        StmtKind::For { .. } => "loop",
        StmtKind::If { .. } => "conditional",
        StmtKind::Return(_) => "return",
        StmtKind::Assign { .. } => "assignment",
        StmtKind::Expr(_) => "non-builtin expression",
        StmtKind::Modified { .. } => "modifier scope",
    }
}
