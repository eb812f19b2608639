//! Compile-time evaluation of classical code.
//!
//! The [`Evaluator`] interprets classical expressions and statements,
//! including calls to purely classical functions, against an [`Env`]. After
//! analysis every binder carries a program-wide unique name, so one flat map
//! is enough to hold globals, class members and locals at once.

use rustc_hash::FxHashMap;
use std::cell::Cell;
use std::fmt;
use thiserror::Error;

use qcirc_lang::ast::{ArrayExpr, BinOp, Intrinsic, StmtKind, UnaryOp};
use qcirc_lang::{CallExpr, CallTarget, CallableId, Expr, ExprKind, Span, Stmt};

use crate::config::LimitsConfig;
use crate::error::{CompileError, ExpansionError, SemanticError};
use crate::symbols::SymbolTable;
use crate::types::Type;

/// Value of a built-in constant.
pub fn builtin_constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "tau" => Some(std::f64::consts::TAU),
        "euler" => Some(std::f64::consts::E),
        _ => None,
    }
}

/// A compile-time value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Array(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::Array(_) => "array",
        }
    }

    pub fn as_int(&self, span: Span) -> EvalResult<i64> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(EvalError::invalid(
                format!("expected int, found {}", other.type_name()),
                span,
            )),
        }
    }

    /// Numeric value, widening `int` to `float`.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self, span: Span) -> EvalResult<f64> {
        match self {
            Value::Int(v) => Ok(*v as f64),
            Value::Float(v) => Ok(*v),
            other => Err(EvalError::invalid(
                format!("expected a number, found {}", other.type_name()),
                span,
            )),
        }
    }

    pub fn as_bool(&self, span: Span) -> EvalResult<bool> {
        match self {
            Value::Bool(v) => Ok(*v),
            other => Err(EvalError::invalid(
                format!("expected bool, found {}", other.type_name()),
                span,
            )),
        }
    }

    pub fn into_array(self, span: Span) -> EvalResult<Vec<Value>> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(EvalError::invalid(
                format!("expected an array, found {}", other.type_name()),
                span,
            )),
        }
    }

    /// Widen to the declared type where `int` flows into `float`.
    #[allow(clippy::cast_precision_loss)]
    pub fn coerce(self, ty: Option<Type>) -> Value {
        match (ty, self) {
            (Some(Type::Float), Value::Int(v)) => Value::Float(v as f64),
            (Some(Type::FloatArray), Value::Array(items)) => Value::Array(
                items
                    .into_iter()
                    .map(|v| v.coerce(Some(Type::Float)))
                    .collect(),
            ),
            (_, value) => value,
        }
    }

    /// The literal expression for this value.
    pub fn to_expr(&self, span: Span) -> Expr {
        let kind = match self {
            Value::Int(v) => ExprKind::Int(*v),
            Value::Float(v) => ExprKind::Float(*v),
            Value::Bool(v) => ExprKind::Bool(*v),
            Value::Str(v) => ExprKind::Str(v.clone()),
            Value::Array(items) => ExprKind::Array(ArrayExpr::List(
                items.iter().map(|v| v.to_expr(span)).collect(),
            )),
        };
        Expr::new(kind, span)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Array(items) => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/// Why an evaluation did not produce a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The name has no compile-time value in this environment.
    #[error("'{name}' has no compile-time value")]
    NotConstant { name: String, span: Span },

    #[error("division by zero")]
    DivisionByZero { span: Span },

    #[error("integer overflow")]
    Overflow { span: Span },

    #[error("{message}")]
    InvalidOperation { message: String, span: Span },

    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: i64, len: usize, span: Span },

    #[error("loop exceeds {limit} iterations")]
    LoopLimit { limit: usize, span: Span },

    #[error("loops exceed {limit} iterations in total")]
    IterationBudget { limit: usize, span: Span },

    #[error("function '{name}' returned no value")]
    NoReturnValue { name: String, span: Span },
}

impl EvalError {
    fn invalid(message: impl Into<String>, span: Span) -> Self {
        EvalError::InvalidOperation {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            EvalError::NotConstant { span, .. }
            | EvalError::DivisionByZero { span }
            | EvalError::Overflow { span }
            | EvalError::InvalidOperation { span, .. }
            | EvalError::IndexOutOfRange { span, .. }
            | EvalError::LoopLimit { span, .. }
            | EvalError::IterationBudget { span, .. }
            | EvalError::NoReturnValue { span, .. } => *span,
        }
    }
}

impl From<EvalError> for CompileError {
    fn from(err: EvalError) -> Self {
        let span = err.span();
        let message = err.to_string();
        match err {
            EvalError::LoopLimit { limit, .. } => ExpansionError::LimitExceeded {
                limit: "max_loop_iterations",
                value: limit,
                span,
            }
            .into(),
            EvalError::IterationBudget { limit, .. } => ExpansionError::LimitExceeded {
                limit: "max_total_iterations",
                value: limit,
                span,
            }
            .into(),
            EvalError::NotConstant { .. } => ExpansionError::internal(message, span).into(),
            _ => SemanticError::Evaluation { message, span }.into(),
        }
    }
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Compile-time bindings by unique name.
#[derive(Debug, Clone, Default)]
pub struct Env {
    values: FxHashMap<String, Value>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// How a block finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Option<Value>),
}

/// Interpreter for classical code.
///
/// Every loop entered through [`Evaluator::iterate`] is charged against one
/// budget shared by all evaluations of this evaluator, so nested loops and
/// loops inside called functions cannot multiply past it.
pub struct Evaluator<'a> {
    symbols: &'a SymbolTable,
    registers: FxHashMap<String, u32>,
    max_loop_iterations: usize,
    max_total_iterations: usize,
    iterations: Cell<usize>,
}

impl<'a> Evaluator<'a> {
    pub fn new(symbols: &'a SymbolTable, limits: &LimitsConfig) -> Self {
        Self {
            symbols,
            registers: symbols.register_sizes(),
            max_loop_iterations: limits.max_loop_iterations,
            max_total_iterations: limits.max_total_iterations,
            iterations: Cell::new(0),
        }
    }

    /// Loop iterations charged so far.
    pub fn iterations(&self) -> usize {
        self.iterations.get()
    }

    fn charge(&self, count: usize, span: Span) -> EvalResult<()> {
        let total = self.iterations.get().saturating_add(count);
        if total > self.max_total_iterations {
            return Err(EvalError::IterationBudget {
                limit: self.max_total_iterations,
                span,
            });
        }
        self.iterations.set(total);
        Ok(())
    }

    /// Size of a declared register.
    pub fn register_size(&self, name: &str) -> Option<u32> {
        self.registers.get(name).copied()
    }

    /// Evaluate an expression.
    pub fn eval(&self, expr: &Expr, env: &mut Env) -> EvalResult<Value> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Int(v) => Ok(Value::Int(*v)),
            ExprKind::Float(v) => Ok(Value::Float(*v)),
            ExprKind::Bool(v) => Ok(Value::Bool(*v)),
            ExprKind::Str(v) => Ok(Value::Str(v.clone())),
            ExprKind::Ident(name) => self.lookup(name, env, span),
            ExprKind::Member { .. } => {
                let path = expr.as_path().unwrap_or_default();
                self.lookup(&path, env, span)
            }
            ExprKind::Index { base, index } => {
                let items = self.eval(base, env)?.into_array(base.span)?;
                let index = self.eval(index, env)?.as_int(index.span)?;
                usize::try_from(index)
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .ok_or(EvalError::IndexOutOfRange {
                        index,
                        len: items.len(),
                        span,
                    })
            }
            ExprKind::Binary { op, lhs, rhs } => match op {
                BinOp::And => Ok(Value::Bool(
                    self.eval(lhs, env)?.as_bool(lhs.span)?
                        && self.eval(rhs, env)?.as_bool(rhs.span)?,
                )),
                BinOp::Or => Ok(Value::Bool(
                    self.eval(lhs, env)?.as_bool(lhs.span)?
                        || self.eval(rhs, env)?.as_bool(rhs.span)?,
                )),
                _ => {
                    let l = self.eval(lhs, env)?;
                    let r = self.eval(rhs, env)?;
                    binary(*op, &l, &r, span)
                }
            },
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand, env)?;
                match (op, value) {
                    (UnaryOp::Neg, Value::Int(v)) => {
                        v.checked_neg().map(Value::Int).ok_or(EvalError::Overflow { span })
                    }
                    (UnaryOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
                    (UnaryOp::Not, Value::Bool(v)) => Ok(Value::Bool(!v)),
                    (_, other) => Err(EvalError::invalid(
                        format!("invalid operand of type {}", other.type_name()),
                        span,
                    )),
                }
            }
            ExprKind::Call(call) => self.eval_call(call, span, env),
            ExprKind::Array(ArrayExpr::List(items)) => items
                .iter()
                .map(|item| self.eval(item, env))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::Array),
            ExprKind::Array(ArrayExpr::Range { .. }) => self.iterate(expr, env).map(Value::Array),
        }
    }

    /// Evaluate an iterable to its elements in iteration order, enforcing the
    /// per-loop limit and charging the elements to the shared budget.
    pub fn iterate(&self, iterable: &Expr, env: &mut Env) -> EvalResult<Vec<Value>> {
        let span = iterable.span;
        let items = match &iterable.kind {
            ExprKind::Array(ArrayExpr::Range { start, step, end }) => {
                let start = self.eval(start, env)?.as_int(start.span)?;
                let end = self.eval(end, env)?.as_int(end.span)?;
                let step = match step {
                    Some(step) => self.eval(step, env)?.as_int(step.span)?,
                    None => 1,
                };
                if step == 0 {
                    return Err(EvalError::invalid("range step cannot be zero", span));
                }
                let count = range_len(start, end, step);
                if count > self.max_loop_iterations as i128 {
                    return Err(EvalError::LoopLimit {
                        limit: self.max_loop_iterations,
                        span,
                    });
                }
                let mut items = Vec::new();
                let mut value = start;
                for _ in 0..count {
                    items.push(Value::Int(value));
                    value = value.checked_add(step).unwrap_or(value);
                }
                items
            }
            _ => self.eval(iterable, env)?.into_array(span)?,
        };

        if items.len() > self.max_loop_iterations {
            return Err(EvalError::LoopLimit {
                limit: self.max_loop_iterations,
                span,
            });
        }
        self.charge(items.len(), span)?;
        Ok(items)
    }

    /// Execute classical statements.
    pub fn exec(&self, stmts: &[Stmt], env: &mut Env) -> EvalResult<Flow> {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec_stmt(stmt, env)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&self, stmt: &Stmt, env: &mut Env) -> EvalResult<Flow> {
        match &stmt.kind {
            StmtKind::VarDecl { name, ty, value } | StmtKind::ConstDecl { name, ty, value } => {
                let value = self.eval(value, env)?.coerce(ty.map(Type::from));
                env.set(name.clone(), value);
            }
            StmtKind::Assign { target, op, value } => {
                self.assign(target, *op, value, stmt.span, env)?;
            }
            StmtKind::For {
                var,
                iterable,
                body,
            } => {
                for item in self.iterate(iterable, env)? {
                    env.set(var.clone(), item);
                    if let Flow::Return(value) = self.exec(body, env)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                let branch = if self.eval(condition, env)?.as_bool(condition.span)? {
                    Some(then_body)
                } else {
                    else_body.as_ref()
                };
                if let Some(body) = branch {
                    return self.exec(body, env);
                }
            }
            StmtKind::Return(value) => {
                let value = value.as_ref().map(|v| self.eval(v, env)).transpose()?;
                return Ok(Flow::Return(value));
            }
            StmtKind::Expr(expr) => match &expr.kind {
                ExprKind::Call(call) if matches!(call.target, Some(CallTarget::Function(_))) => {
                    self.call_function(call, expr.span, env)?;
                }
                _ => {
                    self.eval(expr, env)?;
                }
            },
            StmtKind::FuncDecl(_) | StmtKind::GateDecl(_) | StmtKind::ClassDecl { .. } => {}
            StmtKind::QuantumDecl { .. } | StmtKind::Modified { .. } => {
                return Err(EvalError::invalid(
                    "quantum statement in classical code",
                    stmt.span,
                ));
            }
        }
        Ok(Flow::Normal)
    }

    /// Apply an assignment to the environment.
    pub fn assign(
        &self,
        target: &Expr,
        op: qcirc_lang::ast::AssignOp,
        value: &Expr,
        span: Span,
        env: &mut Env,
    ) -> EvalResult<()> {
        let name = target
            .as_path()
            .ok_or_else(|| EvalError::invalid("invalid assignment target", target.span))?;
        let rhs = self.eval(value, env)?;
        let current = env.get(&name).cloned();
        let new = match (op.binary_op(), current.as_ref()) {
            (None, _) => rhs,
            (Some(op), Some(current)) => binary(op, current, &rhs, span)?,
            (Some(_), None) => {
                return Err(EvalError::NotConstant {
                    name,
                    span: target.span,
                });
            }
        };
        let new = match current {
            Some(Value::Float(_)) => new.coerce(Some(Type::Float)),
            _ => new,
        };
        env.set(name, new);
        Ok(())
    }

    fn lookup(&self, name: &str, env: &Env, span: Span) -> EvalResult<Value> {
        if let Some(value) = env.get(name) {
            return Ok(value.clone());
        }
        builtin_constant(name)
            .map(Value::Float)
            .ok_or_else(|| EvalError::NotConstant {
                name: name.to_string(),
                span,
            })
    }

    fn eval_call(&self, call: &CallExpr, span: Span, env: &mut Env) -> EvalResult<Value> {
        match call.target {
            Some(CallTarget::Intrinsic(intrinsic)) => self.intrinsic(intrinsic, call, span, env),
            Some(CallTarget::Function(id)) => {
                self.call_function(call, span, env)?
                    .ok_or_else(|| EvalError::NoReturnValue {
                        name: self.symbols.callable(id).name.clone(),
                        span,
                    })
            }
            Some(CallTarget::Builtin(_) | CallTarget::GateMacro(_)) => Err(EvalError::invalid(
                format!("quantum operation '{}' has no value", call.callee),
                span,
            )),
            None => Err(EvalError::invalid(
                format!("unresolved call to '{}'", call.callee),
                span,
            )),
        }
    }

    /// Call a classical function, returning its result if it produced one.
    pub fn call_function(
        &self,
        call: &CallExpr,
        span: Span,
        env: &mut Env,
    ) -> EvalResult<Option<Value>> {
        let Some(CallTarget::Function(id)) = call.target else {
            return Err(EvalError::invalid(
                format!("'{}' is not a function", call.callee),
                span,
            ));
        };
        let args = call
            .args
            .iter()
            .map(|arg| self.eval(arg, env))
            .collect::<EvalResult<Vec<_>>>()?;
        self.invoke(id, args, span, env)
    }

    fn invoke(
        &self,
        id: CallableId,
        args: Vec<Value>,
        span: Span,
        env: &mut Env,
    ) -> EvalResult<Option<Value>> {
        let callable = self.symbols.callable(id);
        if args.len() != callable.params.len() {
            return Err(EvalError::invalid(
                format!(
                    "'{}' expects {} arguments, found {}",
                    callable.name,
                    callable.params.len(),
                    args.len()
                ),
                span,
            ));
        }
        for (param, arg) in callable.params.iter().zip(args) {
            env.set(param.name.clone(), arg.coerce(Some(param.ty)));
        }
        match self.exec(&callable.body, env)? {
            Flow::Return(value) => Ok(value.map(|v| v.coerce(callable.return_type))),
            Flow::Normal => Ok(None),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn intrinsic(
        &self,
        intrinsic: Intrinsic,
        call: &CallExpr,
        span: Span,
        env: &mut Env,
    ) -> EvalResult<Value> {
        if intrinsic == Intrinsic::Len {
            let [arg] = call.args.as_slice() else {
                return Err(EvalError::invalid("len expects one argument", span));
            };
            let len = match &arg.kind {
                ExprKind::Ident(name) if self.registers.contains_key(name) => {
                    i64::from(self.registers[name])
                }
                ExprKind::Array(ArrayExpr::List(items)) => items.len() as i64,
                _ => self.eval(arg, env)?.into_array(arg.span)?.len() as i64,
            };
            return Ok(Value::Int(len));
        }

        let mut args = call
            .args
            .iter()
            .map(|arg| self.eval(arg, env))
            .collect::<EvalResult<Vec<_>>>()?;

        if matches!(intrinsic, Intrinsic::Min | Intrinsic::Max) {
            if let [Value::Array(_)] = args.as_slice() {
                args = args.remove(0).into_array(span)?;
            }
            if args.is_empty() {
                return Err(EvalError::invalid(
                    format!("{} of an empty sequence", intrinsic.name()),
                    span,
                ));
            }
            let pick_max = intrinsic == Intrinsic::Max;
            if args.iter().all(|v| matches!(v, Value::Int(_))) {
                let ints = args.iter().map(|v| v.as_int(span)).collect::<EvalResult<Vec<_>>>()?;
                let best = if pick_max { ints.iter().max() } else { ints.iter().min() };
                return best.copied().map(Value::Int).ok_or_else(|| {
                    EvalError::invalid(format!("{} of an empty sequence", intrinsic.name()), span)
                });
            }
            let floats = args.iter().map(|v| v.as_f64(span)).collect::<EvalResult<Vec<_>>>()?;
            let best = floats.into_iter().reduce(|a, b| {
                if pick_max { a.max(b) } else { a.min(b) }
            });
            return best.map(Value::Float).ok_or_else(|| {
                EvalError::invalid(format!("{} of an empty sequence", intrinsic.name()), span)
            });
        }

        let [arg] = args.as_slice() else {
            return Err(EvalError::invalid(
                format!("{} expects one argument", intrinsic.name()),
                span,
            ));
        };

        match intrinsic {
            Intrinsic::Abs => match arg {
                Value::Int(v) => v.checked_abs().map(Value::Int).ok_or(EvalError::Overflow { span }),
                other => Ok(Value::Float(other.as_f64(span)?.abs())),
            },
            Intrinsic::Sqrt => {
                let x = arg.as_f64(span)?;
                if x < 0.0 {
                    return Err(EvalError::invalid("square root of a negative number", span));
                }
                Ok(Value::Float(x.sqrt()))
            }
            Intrinsic::Sin => Ok(Value::Float(arg.as_f64(span)?.sin())),
            Intrinsic::Cos => Ok(Value::Float(arg.as_f64(span)?.cos())),
            Intrinsic::Tan => Ok(Value::Float(arg.as_f64(span)?.tan())),
            Intrinsic::Exp => Ok(Value::Float(arg.as_f64(span)?.exp())),
            Intrinsic::Float => Ok(Value::Float(arg.as_f64(span)?)),
            Intrinsic::Int => match arg {
                Value::Int(v) => Ok(Value::Int(*v)),
                Value::Bool(v) => Ok(Value::Int(i64::from(*v))),
                other => {
                    let x = other.as_f64(span)?.trunc();
                    if !x.is_finite() || x < i64::MIN as f64 || x >= i64::MAX as f64 {
                        return Err(EvalError::Overflow { span });
                    }
                    Ok(Value::Int(x as i64))
                }
            },
            Intrinsic::Len | Intrinsic::Min | Intrinsic::Max => Err(EvalError::invalid(
                format!("unexpected use of {}", intrinsic.name()),
                span,
            )),
        }
    }
}

/// Number of elements in `[start:step:end]`.
fn range_len(start: i64, end: i64, step: i64) -> i128 {
    let (start, end, step) = (i128::from(start), i128::from(end), i128::from(step));
    if step > 0 && end > start {
        (end - start + step - 1) / step
    } else if step < 0 && start > end {
        (start - end - step - 1) / -step
    } else {
        0
    }
}

/// Apply a non-short-circuit binary operator.
#[allow(clippy::cast_precision_loss)]
pub fn binary(op: BinOp, lhs: &Value, rhs: &Value, span: Span) -> EvalResult<Value> {
    use Value::{Bool, Float, Int, Str};

    match (op, lhs, rhs) {
        (BinOp::Add, Int(a), Int(b)) => a.checked_add(*b).map(Int).ok_or(EvalError::Overflow { span }),
        (BinOp::Sub, Int(a), Int(b)) => a.checked_sub(*b).map(Int).ok_or(EvalError::Overflow { span }),
        (BinOp::Mul, Int(a), Int(b)) => a.checked_mul(*b).map(Int).ok_or(EvalError::Overflow { span }),
        (BinOp::FloorDiv, Int(a), Int(b)) => {
            if *b == 0 {
                return Err(EvalError::DivisionByZero { span });
            }
            floor_div(*a, *b).map(Int).ok_or(EvalError::Overflow { span })
        }
        (BinOp::Mod, Int(a), Int(b)) => {
            if *b == 0 {
                return Err(EvalError::DivisionByZero { span });
            }
            let q = floor_div(*a, *b).ok_or(EvalError::Overflow { span })?;
            Ok(Int(a - b * q))
        }
        (BinOp::Pow, Int(a), Int(b)) => {
            if *b < 0 {
                return Err(EvalError::invalid("negative exponent in integer power", span));
            }
            u32::try_from(*b)
                .ok()
                .and_then(|b| a.checked_pow(b))
                .map(Int)
                .ok_or(EvalError::Overflow { span })
        }
        (BinOp::Eq, Bool(a), Bool(b)) => Ok(Bool(a == b)),
        (BinOp::NotEq, Bool(a), Bool(b)) => Ok(Bool(a != b)),
        (BinOp::Eq, Str(a), Str(b)) => Ok(Bool(a == b)),
        (BinOp::NotEq, Str(a), Str(b)) => Ok(Bool(a != b)),
        (op, Int(a), Int(b)) if op.is_comparison() => Ok(Bool(compare(op, a, b))),
        (op, a, b) if op.is_comparison() => {
            let (a, b) = (a.as_f64(span)?, b.as_f64(span)?);
            Ok(Bool(compare(op, &a, &b)))
        }
        (BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::FloorDiv | BinOp::Mod | BinOp::Pow, a, b) => {
            let (a, b) = (a.as_f64(span)?, b.as_f64(span)?);
            let value = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Pow => a.powf(b),
                _ if b == 0.0 => return Err(EvalError::DivisionByZero { span }),
                BinOp::Div => a / b,
                BinOp::FloorDiv => (a / b).floor(),
                _ => a - b * (a / b).floor(),
            };
            if value.is_finite() {
                Ok(Float(value))
            } else {
                Err(EvalError::invalid(format!("non-finite result of '{op}'"), span))
            }
        }
        (op, a, b) => Err(EvalError::invalid(
            format!(
                "operator '{op}' does not apply to {} and {}",
                a.type_name(),
                b.type_name()
            ),
            span,
        )),
    }
}

fn compare<T: PartialOrd>(op: BinOp, a: &T, b: &T) -> bool {
    match op {
        BinOp::Eq => a == b,
        BinOp::NotEq => a != b,
        BinOp::Lt => a < b,
        BinOp::LtEq => a <= b,
        BinOp::Gt => a > b,
        _ => a >= b,
    }
}

/// Integer division rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(1, 1)
    }

    fn int(v: i64) -> Value {
        Value::Int(v)
    }

    fn limits(per_loop: usize, total: usize) -> LimitsConfig {
        LimitsConfig {
            max_loop_iterations: per_loop,
            max_total_iterations: total,
            ..LimitsConfig::default()
        }
    }

    #[test]
    fn test_floor_division_and_modulo_follow_sign_of_divisor() {
        assert_eq!(binary(BinOp::FloorDiv, &int(7), &int(2), span()), Ok(int(3)));
        assert_eq!(binary(BinOp::FloorDiv, &int(-7), &int(2), span()), Ok(int(-4)));
        assert_eq!(binary(BinOp::FloorDiv, &int(7), &int(-2), span()), Ok(int(-4)));
        assert_eq!(binary(BinOp::Mod, &int(-7), &int(2), span()), Ok(int(1)));
        assert_eq!(binary(BinOp::Mod, &int(7), &int(-2), span()), Ok(int(-1)));
    }

    #[test]
    fn test_true_division_yields_float() {
        assert_eq!(
            binary(BinOp::Div, &int(1), &int(2), span()),
            Ok(Value::Float(0.5))
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            binary(BinOp::Div, &int(1), &int(0), span()),
            Err(EvalError::DivisionByZero { .. })
        ));
        assert!(matches!(
            binary(BinOp::Mod, &int(1), &int(0), span()),
            Err(EvalError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_power_and_overflow() {
        assert_eq!(binary(BinOp::Pow, &int(2), &int(10), span()), Ok(int(1024)));
        assert!(matches!(
            binary(BinOp::Pow, &int(2), &int(64), span()),
            Err(EvalError::Overflow { .. })
        ));
        assert!(binary(BinOp::Pow, &int(2), &int(-1), span()).is_err());
    }

    #[test]
    fn test_mixed_comparison() {
        assert_eq!(
            binary(BinOp::Lt, &int(1), &Value::Float(1.5), span()),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn test_range_len() {
        assert_eq!(range_len(0, 4, 1), 4);
        assert_eq!(range_len(0, 5, 2), 3);
        assert_eq!(range_len(5, 0, -2), 3);
        assert_eq!(range_len(3, 3, 1), 0);
        assert_eq!(range_len(4, 0, 1), 0);
    }

    #[test]
    fn test_eval_range_and_limit() {
        let symbols = SymbolTable::new();
        let evaluator = Evaluator::new(&symbols, &limits(3, 100));
        let mut env = Env::new();
        let program = qcirc_lang::parse("for i in [0:3] { }\nfor i in [0:4] { }").unwrap();

        let StmtKind::For { iterable, .. } = &program.statements[0].kind else {
            panic!("expected loop");
        };
        let items = evaluator.iterate(iterable, &mut env).unwrap();
        assert_eq!(items, vec![int(0), int(1), int(2)]);

        let StmtKind::For { iterable, .. } = &program.statements[1].kind else {
            panic!("expected loop");
        };
        assert!(matches!(
            evaluator.iterate(iterable, &mut env),
            Err(EvalError::LoopLimit { limit: 3, .. })
        ));
    }

    #[test]
    fn test_nested_loops_share_iteration_budget() {
        let symbols = SymbolTable::new();
        let evaluator = Evaluator::new(&symbols, &limits(10, 50));
        let mut env = Env::new();
        env.set("k", int(0));
        let program = qcirc_lang::parse(
            "for i in [0:10] { for j in [0:10] { k += 1 } }",
        )
        .unwrap();

        let err = evaluator.exec(&program.statements, &mut env).unwrap_err();
        assert!(matches!(err, EvalError::IterationBudget { limit: 50, .. }));
        assert!(evaluator.iterations() <= 50);
        assert!(matches!(
            CompileError::from(err),
            CompileError::Expansion(ExpansionError::LimitExceeded {
                limit: "max_total_iterations",
                ..
            })
        ));
    }

    #[test]
    fn test_builtin_constants() {
        let symbols = SymbolTable::new();
        let evaluator = Evaluator::new(&symbols, &LimitsConfig::default());
        let mut env = Env::new();
        let expr = Expr::ident("pi", span());
        assert_eq!(
            evaluator.eval(&expr, &mut env),
            Ok(Value::Float(std::f64::consts::PI))
        );
        env.set("pi", int(3));
        assert_eq!(evaluator.eval(&expr, &mut env), Ok(int(3)));
        assert!(matches!(
            evaluator.eval(&Expr::ident("x", span()), &mut env),
            Err(EvalError::NotConstant { .. })
        ));
    }
}
