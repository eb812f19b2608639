//! Checks that run after every statement has been resolved.

use tracing::debug;

use qcirc_lang::ast::{ArrayExpr, StmtKind};
use qcirc_lang::{CallTarget, CallableId, Expr, ExprKind, Stmt};

use super::{Analyzer, QuantumUse};
use crate::config::LimitsConfig;
use crate::error::{SemanticError, SemanticResult};
use crate::eval::{Env, EvalError, Evaluator, Value};
use crate::symbols::CallableKind;

/// Collect the quantum content of `stmts`, not descending into nested
/// declarations.
pub(crate) fn collect_use(stmts: &[Stmt]) -> QuantumUse {
    let mut uses = QuantumUse::default();
    for stmt in stmts {
        collect_stmt(stmt, &mut uses);
    }
    uses
}

fn collect_stmt(stmt: &Stmt, uses: &mut QuantumUse) {
    match &stmt.kind {
        StmtKind::VarDecl { value, .. } | StmtKind::ConstDecl { value, .. } => {
            collect_expr(value, uses);
        }
        StmtKind::For { iterable, body, .. } => {
            collect_expr(iterable, uses);
            body.iter().for_each(|s| collect_stmt(s, uses));
        }
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            collect_expr(condition, uses);
            then_body.iter().for_each(|s| collect_stmt(s, uses));
            for s in else_body.iter().flatten() {
                collect_stmt(s, uses);
            }
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                collect_expr(value, uses);
            }
        }
        StmtKind::Assign { value, .. } => collect_expr(value, uses),
        StmtKind::Expr(expr) => collect_expr(expr, uses),
        StmtKind::Modified { body, .. } => {
            uses.direct = true;
            body.iter().for_each(|s| collect_stmt(s, uses));
        }
        StmtKind::QuantumDecl { .. }
        | StmtKind::FuncDecl(_)
        | StmtKind::GateDecl(_)
        | StmtKind::ClassDecl { .. } => {}
    }
}

fn collect_expr(expr: &Expr, uses: &mut QuantumUse) {
    match &expr.kind {
        ExprKind::Call(call) => {
            match call.target {
                Some(CallTarget::Builtin(builtin)) => {
                    uses.direct = true;
                    uses.non_unitary |= !builtin.is_unitary();
                }
                Some(CallTarget::GateMacro(id) | CallTarget::Function(id)) => {
                    uses.callees.insert(id);
                }
                Some(CallTarget::Intrinsic(_)) | None => {}
            }
            call.args.iter().for_each(|a| collect_expr(a, uses));
        }
        ExprKind::Member { object, .. } => collect_expr(object, uses),
        ExprKind::Index { base, index } => {
            collect_expr(base, uses);
            collect_expr(index, uses);
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            collect_expr(lhs, uses);
            collect_expr(rhs, uses);
        }
        ExprKind::Unary { operand, .. } => collect_expr(operand, uses),
        ExprKind::Array(ArrayExpr::List(items)) => {
            items.iter().for_each(|i| collect_expr(i, uses));
        }
        ExprKind::Array(ArrayExpr::Range { start, step, end }) => {
            collect_expr(start, uses);
            if let Some(step) = step {
                collect_expr(step, uses);
            }
            collect_expr(end, uses);
        }
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Bool(_)
        | ExprKind::Str(_)
        | ExprKind::Ident(_) => {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Active,
    Done,
}

impl Analyzer {
    /// Depth-first walk of the call graph. Rejects cycles and computes the
    /// final quantum and unitary flags in post-order.
    pub(super) fn check_call_graph(&mut self) -> SemanticResult<()> {
        let count = self.symbols.callables().len();
        let edges: Vec<QuantumUse> = self
            .symbols
            .callables()
            .iter()
            .map(|c| collect_use(&c.body))
            .collect();
        let mut marks = vec![Mark::Unvisited; count];
        let mut stack = Vec::new();

        for root in 0..count {
            if marks[root] == Mark::Unvisited {
                self.visit(CallableId(root as u32), &edges, &mut marks, &mut stack)?;
            }
        }
        debug!(callables = count, "call graph is acyclic");
        Ok(())
    }

    fn visit(
        &mut self,
        id: CallableId,
        edges: &[QuantumUse],
        marks: &mut [Mark],
        stack: &mut Vec<CallableId>,
    ) -> SemanticResult<()> {
        let index = id.0 as usize;
        marks[index] = Mark::Active;
        stack.push(id);

        for &callee in &edges[index].callees {
            match marks[callee.0 as usize] {
                Mark::Active => {
                    let start = stack.iter().position(|c| *c == callee).unwrap_or(0);
                    let path = stack[start..]
                        .iter()
                        .chain(std::iter::once(&callee))
                        .map(|c| self.symbols.callable(*c).name.as_str())
                        .collect::<Vec<_>>()
                        .join(" -> ");
                    return Err(SemanticError::RecursionDetected {
                        path,
                        span: self.symbols.callable(callee).span,
                    });
                }
                Mark::Unvisited => self.visit(callee, edges, marks, stack)?,
                Mark::Done => {}
            }
        }

        let uses = &edges[index];
        let callees_quantum = uses
            .callees
            .iter()
            .any(|c| self.symbols.callable(*c).is_quantum);
        let callees_unitary = uses
            .callees
            .iter()
            .all(|c| self.symbols.callable(*c).is_unitary);
        let callable = self.symbols.callable_mut(id);
        callable.is_quantum =
            callable.kind == CallableKind::GateMacro || uses.direct || callees_quantum;
        callable.is_unitary = !uses.non_unitary && callees_unitary;

        stack.pop();
        marks[index] = Mark::Done;
        Ok(())
    }

    fn is_quantum_use(&self, uses: &QuantumUse) -> bool {
        uses.direct
            || uses
                .callees
                .iter()
                .any(|c| self.symbols.callable(*c).is_quantum)
    }

    /// Checks that depend on the final callable flags.
    pub(super) fn check_deferred(&self) -> SemanticResult<()> {
        for callable in self.symbols.callables() {
            if callable.kind == CallableKind::Function
                && callable.is_quantum
                && callable.return_type.is_some()
            {
                return Err(SemanticError::MisplacedReturn {
                    message: format!(
                        "function '{}' applies quantum operations and cannot declare a return type",
                        callable.name
                    ),
                    span: callable.span,
                });
            }
        }

        let facts = &self.facts;
        for fact in &facts.returns {
            let callable = self.symbols.callable(fact.callee);
            if callable.is_quantum {
                return Err(SemanticError::MisplacedReturn {
                    message: format!(
                        "function '{}' applies quantum operations and cannot return",
                        callable.name
                    ),
                    span: fact.span,
                });
            }
        }

        for fact in &facts.value_uses {
            let callable = self.symbols.callable(fact.callee);
            if callable.is_quantum {
                return Err(SemanticError::QuantumFunctionAsValue {
                    name: callable.name.clone(),
                    span: fact.span,
                });
            }
        }

        for fact in &facts.modified_calls {
            let callable = self.symbols.callable(fact.callee);
            if !callable.is_unitary || !callable.is_quantum {
                return Err(SemanticError::ModifierOnNonUnitary {
                    name: callable.name.clone(),
                    span: fact.span,
                });
            }
        }

        for fact in &facts.non_static_args {
            let callable = self.symbols.callable(fact.callee);
            if callable.is_quantum {
                return Err(SemanticError::NonStaticArgument {
                    name: callable.name.clone(),
                    span: fact.span,
                });
            }
        }

        if let Some(fact) = facts
            .loops
            .iter()
            .find(|f| !f.is_static && self.is_quantum_use(&f.uses))
        {
            return Err(SemanticError::NonStaticLoopBound { span: fact.span });
        }

        if let Some(fact) = facts
            .conditions
            .iter()
            .find(|f| !f.is_static && self.is_quantum_use(&f.uses))
        {
            return Err(SemanticError::NonStaticCondition { span: fact.span });
        }

        Ok(())
    }

    /// Evaluate constants with static initializers in declaration order.
    ///
    /// Constants whose value depends on something only known during expansion
    /// are left for the expander.
    pub(super) fn evaluate_constants(&self) -> SemanticResult<Env> {
        let evaluator = Evaluator::new(&self.symbols, &LimitsConfig::default());
        let mut env = Env::new();
        for constant in &self.facts.constants {
            match evaluator.eval(&constant.value, &mut env) {
                Ok(value) => env.set(constant.name.clone(), value.coerce(constant.ty)),
                Err(
                    EvalError::NotConstant { .. }
                    | EvalError::LoopLimit { .. }
                    | EvalError::IterationBudget { .. },
                ) => {}
                Err(err) => {
                    return Err(SemanticError::Evaluation {
                        message: err.to_string(),
                        span: err.span(),
                    });
                }
            }
        }
        Ok(env)
    }

    /// Bounds-check register indices whose value is known after constant
    /// evaluation.
    pub(super) fn check_constant_indices(&self, constants: &Env) -> SemanticResult<()> {
        let evaluator = Evaluator::new(&self.symbols, &LimitsConfig::default());
        let mut env = constants.clone();
        for fact in &self.facts.indices {
            let Ok(Value::Int(index)) = evaluator.eval(&fact.index, &mut env) else {
                continue;
            };
            if index < 0 || index >= i64::from(fact.size) {
                return Err(SemanticError::IndexOutOfRange {
                    register: fact.register.clone(),
                    index,
                    size: fact.size,
                    span: fact.span,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::analyzer::analyze;
    use crate::error::SemanticError;
    use qcirc_lang::{Span, parse};

    fn reject(source: &str) -> SemanticError {
        analyze(parse(source).unwrap()).unwrap_err()
    }

    #[test]
    fn test_recursive_gate_macro() {
        let err = reject("qubit q\ngate a(x) { b(x) }\ngate b(x) { a(x) }\na(q)");
        let SemanticError::RecursionDetected { path, .. } = err else {
            panic!("expected recursion, got {err:?}");
        };
        assert_eq!(path, "a -> b -> a");
    }

    #[test]
    fn test_self_recursive_classical_function() {
        let err = reject("def f(n: int) -> int { return f(n - 1) }");
        assert!(matches!(err, SemanticError::RecursionDetected { ref path, .. } if path == "f -> f"));
    }

    #[test]
    fn test_modifier_on_non_unitary_callable() {
        let err = reject(
            "qubit[2] q\nbit[2] c\ngate m(a: qubit, b: bit) { Measure(a, b) }\nctrl m(q[0], q[1], c[0])",
        );
        assert!(matches!(err, SemanticError::ModifierOnNonUnitary { ref name, .. } if name == "m"));
    }

    #[test]
    fn test_dynamic_loop_bound_around_quantum_code() {
        let err = reject("qubit[4] q\nvar n = 4\nfor i in [0:n] { H(q[i]) }");
        assert_eq!(err, SemanticError::NonStaticLoopBound { span: Span::new(3, 10) });
    }

    #[test]
    fn test_dynamic_loop_without_quantum_code_is_allowed() {
        let source = "var n = 4\nvar total = 0\nfor i in [0:n] { total += i }";
        assert!(analyze(parse(source).unwrap()).is_ok());
    }

    #[test]
    fn test_dynamic_condition_through_function() {
        let err = reject("qubit q\nvar flag = true\ndef flip() { X(q) }\nif flag { flip() }");
        assert!(matches!(err, SemanticError::NonStaticCondition { .. }));
    }

    #[test]
    fn test_quantum_function_cannot_return() {
        let err = reject("qubit q\ndef f() -> int { H(q); return 1 }");
        assert!(matches!(err, SemanticError::MisplacedReturn { .. }));
    }

    #[test]
    fn test_non_static_argument_to_quantum_function() {
        let err = reject(
            "qubit q\ndef rot(theta: float) { Rx(theta, q) }\nvar t = 0.5\nrot(t)",
        );
        assert!(matches!(err, SemanticError::NonStaticArgument { ref name, .. } if name == "rot"));
    }

    #[test]
    fn test_constant_index_out_of_range() {
        let err = reject("qubit[2] q\nconst K = 1 + 1\nH(q[K])");
        assert!(matches!(
            err,
            SemanticError::IndexOutOfRange { index: 2, size: 2, .. }
        ));
        let err = reject("qubit[2] q\nH(q[2])");
        assert!(matches!(err, SemanticError::IndexOutOfRange { .. }));
    }

    #[test]
    fn test_constant_division_by_zero() {
        let err = reject("const K = 1 // 0");
        assert!(matches!(err, SemanticError::Evaluation { .. }));
    }
}
