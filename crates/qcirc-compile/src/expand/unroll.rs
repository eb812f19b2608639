//! Loop unrolling and constant folding.

use tracing::trace;

use qcirc_ir::modifier::control_count;
use qcirc_lang::ast::{ArrayExpr, Builtin, StmtKind};
use qcirc_lang::{CallExpr, CallTarget, Expr, ExprKind, Program, Span, Stmt};

use super::ExpansionContext;
use crate::error::{CompileError, CompileResult, ExpansionError, SemanticError};
use crate::eval::{Env, EvalError, Evaluator};
use crate::pass::{Pass, PassKind};

/// Interprets the classical part of the inlined program.
///
/// Loops are replaced by one copy of their body per iteration value, branches
/// by the selected body, and classical statements by their effect on the
/// compile-time environment. Every surviving built-in call has its classical
/// arguments folded to literals and its operands reduced to a register name,
/// a register element with a literal index, or a list of those.
pub struct UnrollLoops;

impl Pass for UnrollLoops {
    fn name(&self) -> &'static str {
        "unroll_loops"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, program: &mut Program, ctx: &mut ExpansionContext<'_>) -> CompileResult<()> {
        let evaluator = Evaluator::new(ctx.symbols, ctx.limits);
        let mut unroller = Unroller {
            evaluator,
            env: Env::new(),
            ctx,
        };
        let statements = std::mem::take(&mut program.statements);
        let mut out = Vec::with_capacity(statements.len());
        unroller.unroll_block(&statements, &mut out)?;
        program.statements = out;
        Ok(())
    }
}

struct Unroller<'a, 'c> {
    evaluator: Evaluator<'a>,
    env: Env,
    ctx: &'c mut ExpansionContext<'a>,
}

impl Unroller<'_, '_> {
    fn unroll_block(&mut self, stmts: &[Stmt], out: &mut Vec<Stmt>) -> CompileResult<()> {
        for stmt in stmts {
            self.unroll_stmt(stmt, out)?;
        }
        Ok(())
    }

    fn unroll_stmt(&mut self, stmt: &Stmt, out: &mut Vec<Stmt>) -> CompileResult<()> {
        let span = stmt.span;
        match &stmt.kind {
            StmtKind::QuantumDecl { .. } => out.push(stmt.clone()),

            StmtKind::For {
                var,
                iterable,
                body,
            } => {
                let items = self.evaluator.iterate(iterable, &mut self.env)?;
                trace!(var = %var, iterations = items.len(), "unrolling loop");
                for item in items {
                    self.ctx.stats.loop_iterations += 1;
                    self.env.set(var.clone(), item);
                    self.unroll_block(body, out)?;
                }
            }

            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                let taken = self
                    .evaluator
                    .eval(condition, &mut self.env)?
                    .as_bool(condition.span)?;
                if taken {
                    self.unroll_block(then_body, out)?;
                } else if let Some(else_body) = else_body {
                    self.unroll_block(else_body, out)?;
                }
            }

            StmtKind::Expr(Expr {
                kind: ExprKind::Call(call),
                span: call_span,
            }) if matches!(call.target, Some(CallTarget::Builtin(_))) => {
                let call = self.fold_call(call)?;
                self.count_operation(*call_span)?;
                out.push(Stmt::new(
                    StmtKind::Expr(Expr::new(ExprKind::Call(call), *call_span)),
                    span,
                ));
            }

            StmtKind::Modified {
                modifiers,
                controls,
                body,
            } => {
                let controls = controls
                    .iter()
                    .map(|c| self.fold_operand(c))
                    .collect::<CompileResult<Vec<_>>>()?;
                let mut unrolled = Vec::with_capacity(body.len());
                self.unroll_block(body, &mut unrolled)?;
                out.push(Stmt::new(
                    StmtKind::Modified {
                        modifiers: modifiers.clone(),
                        controls,
                        body: unrolled,
                    },
                    span,
                ));
            }

            StmtKind::VarDecl { .. }
            | StmtKind::ConstDecl { .. }
            | StmtKind::Assign { .. }
            | StmtKind::Expr(_) => {
                self.evaluator
                    .exec(std::slice::from_ref(stmt), &mut self.env)?;
            }

            StmtKind::Return(_)
            | StmtKind::FuncDecl(_)
            | StmtKind::GateDecl(_)
            | StmtKind::ClassDecl { .. } => {
                return Err(ExpansionError::internal(
                    "declaration or return left after inlining",
                    span,
                )
                .into());
            }
        }
        Ok(())
    }

    fn count_operation(&mut self, span: Span) -> CompileResult<()> {
        self.ctx.stats.operations += 1;
        if self.ctx.stats.operations > self.ctx.limits.max_operations {
            return Err(ExpansionError::LimitExceeded {
                limit: "max_operations",
                value: self.ctx.limits.max_operations,
                span,
            }
            .into());
        }
        Ok(())
    }

    /// Fold the arguments of a built-in call. Gate parameters become
    /// literals; everything else is an operand.
    fn fold_call(&mut self, call: &CallExpr) -> CompileResult<CallExpr> {
        let controls = control_count(&call.modifiers);
        let params = match call.target {
            Some(CallTarget::Builtin(Builtin::Gate(gate))) => controls..controls + gate.num_params(),
            _ => 0..0,
        };

        let mut args = Vec::with_capacity(call.args.len());
        for (i, arg) in call.args.iter().enumerate() {
            let folded = if params.contains(&i) {
                self.evaluator
                    .eval(arg, &mut self.env)?
                    .to_expr(arg.span)
            } else {
                self.fold_operand(arg)?
            };
            args.push(folded);
        }

        Ok(CallExpr {
            callee: call.callee.clone(),
            args,
            modifiers: call.modifiers.clone(),
            target: call.target,
        })
    }

    /// Reduce an operand expression to registers, literal-indexed elements
    /// and lists of those.
    fn fold_operand(&mut self, expr: &Expr) -> CompileResult<Expr> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Ident(name) if self.evaluator.register_size(name).is_some() => {
                Ok(expr.clone())
            }
            ExprKind::Index { base, index } => {
                let base = self.fold_operand(base)?;
                let index = self
                    .evaluator
                    .eval(index, &mut self.env)?
                    .as_int(index.span)?;
                match base.kind {
                    ExprKind::Ident(_) => Ok(Expr::new(
                        ExprKind::Index {
                            base: Box::new(base),
                            index: Box::new(Expr::int(index, span)),
                        },
                        span,
                    )),
                    ExprKind::Array(ArrayExpr::List(items)) => {
                        let len = items.len();
                        usize::try_from(index)
                            .ok()
                            .and_then(|i| items.into_iter().nth(i))
                            .ok_or_else(|| {
                                CompileError::from(EvalError::IndexOutOfRange { index, len, span })
                            })
                    }
                    _ => Err(operand_error(span)),
                }
            }
            ExprKind::Array(ArrayExpr::List(items)) => {
                let items = items
                    .iter()
                    .map(|item| self.fold_operand(item))
                    .collect::<CompileResult<Vec<_>>>()?;
                Ok(Expr::new(ExprKind::Array(ArrayExpr::List(items)), span))
            }
            _ => Err(operand_error(span)),
        }
    }
}

fn operand_error(span: Span) -> CompileError {
    SemanticError::IllegalOperand {
        message: "operand does not denote a qubit or bit".into(),
        span,
    }
    .into()
}
