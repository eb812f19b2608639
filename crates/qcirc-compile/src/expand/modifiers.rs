//! Modifier propagation.

use tracing::trace;

use qcirc_ir::Modifier;
use qcirc_ir::modifier::{compose, is_inverted};
use qcirc_lang::ast::StmtKind;
use qcirc_lang::{Expr, ExprKind, Program, Stmt};

use super::ExpansionContext;
use crate::error::{CompileResult, ExpansionError};
use crate::pass::{Pass, PassKind};

/// Flattens modifier scopes onto the calls inside them.
///
/// Every call in a scope gets the scope's modifiers composed onto its own
/// and the scope's control operands in front of its arguments. Under an odd
/// number of inversions the scope's calls are emitted in reverse order.
/// Nested scopes are flattened innermost first.
pub struct PropagateModifiers;

impl Pass for PropagateModifiers {
    fn name(&self) -> &'static str {
        "propagate_modifiers"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn should_run(&self, program: &Program, _ctx: &ExpansionContext<'_>) -> bool {
        program
            .statements
            .iter()
            .any(|s| matches!(s.kind, StmtKind::Modified { .. }))
    }

    fn run(&self, program: &mut Program, _ctx: &mut ExpansionContext<'_>) -> CompileResult<()> {
        let statements = std::mem::take(&mut program.statements);
        let mut out = Vec::with_capacity(statements.len());
        for stmt in statements {
            match stmt.kind {
                StmtKind::Modified {
                    modifiers,
                    controls,
                    body,
                } => out.extend(flatten(&modifiers, &controls, body)?),
                kind => out.push(Stmt::new(kind, stmt.span)),
            }
        }
        program.statements = out;
        Ok(())
    }
}

fn flatten(modifiers: &[Modifier], controls: &[Expr], body: Vec<Stmt>) -> CompileResult<Vec<Stmt>> {
    let mut calls = Vec::with_capacity(body.len());
    for stmt in body {
        match stmt.kind {
            StmtKind::Modified {
                modifiers: inner,
                controls: inner_controls,
                body,
            } => calls.extend(flatten(&inner, &inner_controls, body)?),
            kind => calls.push(Stmt::new(kind, stmt.span)),
        }
    }

    for stmt in &mut calls {
        let StmtKind::Expr(Expr {
            kind: ExprKind::Call(call),
            ..
        }) = &mut stmt.kind
        else {
            return Err(ExpansionError::internal(
                "only gate calls may appear under a modifier",
                stmt.span,
            )
            .into());
        };
        call.modifiers = compose(modifiers, &call.modifiers);
        call.args.splice(0..0, controls.iter().cloned());
        trace!(callee = %call.callee, modifiers = call.modifiers.len(), "propagated modifiers");
    }

    if is_inverted(modifiers) {
        calls.reverse();
    }
    Ok(calls)
}
