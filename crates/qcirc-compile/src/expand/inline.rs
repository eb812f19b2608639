//! Inlining of quantum functions and gate-macros.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use qcirc_ir::modifier::control_count;
use qcirc_lang::ast::{ArrayExpr, StmtKind};
use qcirc_lang::{CallExpr, CallTarget, CallableId, Expr, ExprKind, Program, Span, Stmt};

use super::ExpansionContext;
use crate::error::{CompileResult, ExpansionError};
use crate::pass::{Pass, PassKind};

/// Replaces every call to a quantum function or gate-macro with the callee's
/// body, depth-first and left to right.
///
/// Classical arguments are bound by value through a `const` declaration in
/// front of the body; qubit and bit arguments are substituted for the
/// parameter. Every binder of an inlined body gets an instance suffix so that
/// two inlined copies never share a name. Declarations are dropped, classes
/// are reduced to their variables, and classical calls in statement position
/// are dropped.
pub struct InlineCalls;

impl Pass for InlineCalls {
    fn name(&self) -> &'static str {
        "inline_calls"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, program: &mut Program, ctx: &mut ExpansionContext<'_>) -> CompileResult<()> {
        let statements = std::mem::take(&mut program.statements);
        let mut stack = Vec::new();
        program.statements = inline_block(statements, ctx, &mut stack)?;
        Ok(())
    }
}

fn inline_block(
    stmts: Vec<Stmt>,
    ctx: &mut ExpansionContext<'_>,
    stack: &mut Vec<CallableId>,
) -> CompileResult<Vec<Stmt>> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        let span = stmt.span;
        match stmt.kind {
            StmtKind::FuncDecl(_) | StmtKind::GateDecl(_) => {}

            StmtKind::ClassDecl { members, .. } => {
                out.extend(members.into_iter().filter(|m| {
                    matches!(m.kind, StmtKind::VarDecl { .. } | StmtKind::ConstDecl { .. })
                }));
            }

            StmtKind::For {
                var,
                iterable,
                body,
            } => {
                let body = inline_block(body, ctx, stack)?;
                out.push(Stmt::new(
                    StmtKind::For {
                        var,
                        iterable,
                        body,
                    },
                    span,
                ));
            }

            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                let then_body = inline_block(then_body, ctx, stack)?;
                let else_body = else_body
                    .map(|body| inline_block(body, ctx, stack))
                    .transpose()?;
                out.push(Stmt::new(
                    StmtKind::If {
                        condition,
                        then_body,
                        else_body,
                    },
                    span,
                ));
            }

            StmtKind::Modified {
                modifiers,
                controls,
                body,
            } => {
                let body = inline_block(body, ctx, stack)?;
                out.push(Stmt::new(
                    StmtKind::Modified {
                        modifiers,
                        controls,
                        body,
                    },
                    span,
                ));
            }

            StmtKind::Expr(Expr {
                kind: ExprKind::Call(call),
                span: call_span,
            }) => match call.target {
                Some(CallTarget::GateMacro(id) | CallTarget::Function(id))
                    if ctx.symbols.callable(id).is_quantum =>
                {
                    out.extend(inline_call(call, call_span, ctx, stack)?);
                }
                Some(CallTarget::Function(_) | CallTarget::Intrinsic(_)) => {
                    trace!(callee = %call.callee, "dropping classical call statement");
                }
                Some(CallTarget::Builtin(_)) => {
                    out.push(Stmt::new(
                        StmtKind::Expr(Expr::new(ExprKind::Call(call), call_span)),
                        span,
                    ));
                }
                Some(CallTarget::GateMacro(_)) | None => {
                    return Err(ExpansionError::internal(
                        format!("call to '{}' was not resolved to an inlinable target", call.callee),
                        call_span,
                    )
                    .into());
                }
            },

            kind => out.push(Stmt::new(kind, span)),
        }
    }
    Ok(out)
}

fn inline_call(
    call: CallExpr,
    span: Span,
    ctx: &mut ExpansionContext<'_>,
    stack: &mut Vec<CallableId>,
) -> CompileResult<Vec<Stmt>> {
    let symbols = ctx.symbols;
    let Some(CallTarget::GateMacro(id) | CallTarget::Function(id)) = call.target else {
        return Err(ExpansionError::internal(format!("'{}' cannot be inlined", call.callee), span).into());
    };
    let callable = symbols.callable(id);

    if stack.contains(&id) {
        return Err(ExpansionError::internal(
            format!("cyclic reference to '{}' during inlining", callable.name),
            span,
        )
        .into());
    }
    if stack.len() >= ctx.limits.max_inline_depth {
        return Err(ExpansionError::LimitExceeded {
            limit: "max_inline_depth",
            value: ctx.limits.max_inline_depth,
            span,
        }
        .into());
    }

    let controls_len = control_count(&call.modifiers);
    if call.args.len() != controls_len + callable.params.len() {
        return Err(ExpansionError::internal(
            format!("argument count for '{}' does not match its signature", callable.name),
            span,
        )
        .into());
    }
    let mut controls = call.args;
    let args = controls.split_off(controls_len);

    let instance = ctx.next_instance();
    let mut subst = Substitution::default();
    let mut binders = Vec::new();
    collect_binders(&callable.body, &mut binders);
    for binder in binders {
        let renamed = format!("{binder}#{instance}");
        subst.renames.insert(binder, renamed);
    }

    let mut body = Vec::with_capacity(callable.body.len() + args.len());
    for (param, arg) in callable.params.iter().zip(args) {
        if param.ty.is_operand() {
            subst.operands.insert(param.name.clone(), arg);
        } else {
            let renamed = format!("{}#{instance}", param.name);
            subst.renames.insert(param.name.clone(), renamed.clone());
            body.push(Stmt::new(
                StmtKind::ConstDecl {
                    name: renamed,
                    ty: param.ty.type_name(),
                    value: arg,
                },
                span,
            ));
        }
    }
    let mut callee_body = callable.body.clone();
    subst.apply_block(&mut callee_body);
    body.extend(callee_body);

    ctx.stats.inlined_statements += statement_count(&body);
    if ctx.stats.inlined_statements > ctx.limits.max_operations {
        return Err(ExpansionError::LimitExceeded {
            limit: "max_operations",
            value: ctx.limits.max_operations,
            span,
        }
        .into());
    }
    ctx.stats.inlined_calls += 1;
    debug!(callee = %callable.name, depth = stack.len() + 1, instance, "inlining call");

    stack.push(id);
    let inlined = inline_block(body, ctx, stack)?;
    stack.pop();

    if call.modifiers.is_empty() {
        return Ok(inlined);
    }
    Ok(vec![Stmt::new(
        StmtKind::Modified {
            modifiers: call.modifiers,
            controls,
            body: inlined,
        },
        span,
    )])
}

/// Statements in `stmts`, nested bodies included.
fn statement_count(stmts: &[Stmt]) -> usize {
    stmts
        .iter()
        .map(|stmt| {
            1 + match &stmt.kind {
                StmtKind::For { body, .. } | StmtKind::Modified { body, .. } => {
                    statement_count(body)
                }
                StmtKind::If {
                    then_body,
                    else_body,
                    ..
                } => statement_count(then_body) + else_body.as_deref().map_or(0, statement_count),
                _ => 0,
            }
        })
        .sum()
}

/// Names bound by `var`, `const` and `for` anywhere in `stmts`.
fn collect_binders(stmts: &[Stmt], out: &mut Vec<String>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::VarDecl { name, .. } | StmtKind::ConstDecl { name, .. } => {
                out.push(name.clone());
            }
            StmtKind::For { var, body, .. } => {
                out.push(var.clone());
                collect_binders(body, out);
            }
            StmtKind::If {
                then_body,
                else_body,
                ..
            } => {
                collect_binders(then_body, out);
                if let Some(else_body) = else_body {
                    collect_binders(else_body, out);
                }
            }
            StmtKind::Modified { body, .. } => collect_binders(body, out),
            _ => {}
        }
    }
}

/// Renames and operand replacements for one inlined body.
#[derive(Debug, Default)]
struct Substitution {
    renames: FxHashMap<String, String>,
    operands: FxHashMap<String, Expr>,
}

impl Substitution {
    fn apply_block(&self, stmts: &mut [Stmt]) {
        for stmt in stmts {
            self.apply_stmt(stmt);
        }
    }

    fn rename(&self, name: &mut String) {
        if let Some(renamed) = self.renames.get(name) {
            name.clone_from(renamed);
        }
    }

    fn apply_stmt(&self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::VarDecl { name, value, .. } | StmtKind::ConstDecl { name, value, .. } => {
                self.rename(name);
                self.apply_expr(value);
            }
            StmtKind::For {
                var,
                iterable,
                body,
            } => {
                self.rename(var);
                self.apply_expr(iterable);
                self.apply_block(body);
            }
            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                self.apply_expr(condition);
                self.apply_block(then_body);
                if let Some(else_body) = else_body {
                    self.apply_block(else_body);
                }
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.apply_expr(value);
                }
            }
            StmtKind::Assign { target, value, .. } => {
                self.apply_expr(target);
                self.apply_expr(value);
            }
            StmtKind::Expr(expr) => self.apply_expr(expr),
            StmtKind::Modified { controls, body, .. } => {
                controls.iter_mut().for_each(|c| self.apply_expr(c));
                self.apply_block(body);
            }
            StmtKind::QuantumDecl { .. }
            | StmtKind::FuncDecl(_)
            | StmtKind::GateDecl(_)
            | StmtKind::ClassDecl { .. } => {}
        }
    }

    fn apply_expr(&self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Ident(name) => {
                if let Some(operand) = self.operands.get(name) {
                    *expr = operand.clone();
                } else {
                    self.rename(name);
                }
            }
            ExprKind::Member { object, .. } => self.apply_expr(object),
            ExprKind::Index { base, index } => {
                self.apply_expr(base);
                self.apply_expr(index);
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                self.apply_expr(lhs);
                self.apply_expr(rhs);
            }
            ExprKind::Unary { operand, .. } => self.apply_expr(operand),
            ExprKind::Call(call) => call.args.iter_mut().for_each(|a| self.apply_expr(a)),
            ExprKind::Array(ArrayExpr::List(items)) => {
                items.iter_mut().for_each(|i| self.apply_expr(i));
            }
            ExprKind::Array(ArrayExpr::Range { start, step, end }) => {
                self.apply_expr(start);
                if let Some(step) = step {
                    self.apply_expr(step);
                }
                self.apply_expr(end);
            }
            ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Bool(_) | ExprKind::Str(_) => {}
        }
    }
}
