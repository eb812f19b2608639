//! Name resolution and type checking.

use tracing::trace;

use qcirc_ir::modifier::control_count;
use qcirc_ir::{Register, RegisterKind};
use qcirc_lang::ast::{ArrayExpr, AssignOp, BinOp, Builtin, Intrinsic, StmtKind, TypeName, UnaryOp};
use qcirc_lang::{CallExpr, CallTarget, CallableId, Expr, ExprKind, Span, Stmt};

use super::checks::collect_use;
use super::{Analyzer, CallFact, ConstFact, ControlFact, ExprInfo, IndexFact};
use crate::error::{SemanticError, SemanticResult};
use crate::eval::builtin_constant;
use crate::symbols::{CallableKind, ScopeId, ScopeKind, Symbol, SymbolTable, Variable};
use crate::types::Type;

/// What a name or dotted path refers to.
enum Resolved {
    Register(RegisterKind),
    Variable { var: Variable, outer: bool },
    Function(CallableId),
    GateMacro(CallableId),
    Class,
    Constant,
}

impl Analyzer {
    pub(super) fn resolve_block(&mut self, stmts: &mut [Stmt], scope: ScopeId) -> SemanticResult<()> {
        for stmt in stmts {
            self.resolve_stmt(stmt, scope)?;
        }
        Ok(())
    }

    pub(super) fn resolve_stmt(&mut self, stmt: &mut Stmt, scope: ScopeId) -> SemanticResult<()> {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::QuantumDecl { kind, size, name } => {
                if scope != SymbolTable::global() {
                    return Err(SemanticError::MisplacedDeclaration {
                        message: format!("register '{name}' must be declared at the top level"),
                        span,
                    });
                }
                self.symbols.declare(
                    scope,
                    name,
                    Symbol::QuantumRegister {
                        kind: *kind,
                        size: *size,
                    },
                    span,
                )?;
                self.symbols.add_register(Register::new(name.clone(), *kind, *size));
            }

            StmtKind::VarDecl { name, ty, value } => {
                self.resolve_binding(name, *ty, value, true, scope, span)?;
            }

            StmtKind::ConstDecl { name, ty, value } => {
                self.resolve_binding(name, *ty, value, false, scope, span)?;
            }

            StmtKind::FuncDecl(decl) => {
                let id = match self.predeclared(scope, &decl.name) {
                    Some(id) => id,
                    None => self.declare_function(decl, scope, None, span)?,
                };
                self.resolve_callable_body(id, &mut decl.body)?;
            }

            StmtKind::GateDecl(decl) => {
                let id = match self.predeclared(scope, &decl.name) {
                    Some(id) => id,
                    None => self.declare_gate(decl, scope, None, span)?,
                };
                self.resolve_callable_body(id, &mut decl.body)?;
            }

            StmtKind::ClassDecl { name, members } => {
                let class_scope = match self.symbols.lookup_local(scope, name) {
                    Some(Symbol::Class(class_scope)) if scope == SymbolTable::global() => *class_scope,
                    _ => {
                        return Err(SemanticError::MisplacedDeclaration {
                            message: format!("class '{name}' must be declared at the top level"),
                            span,
                        });
                    }
                };
                for member in members.iter_mut() {
                    match member.kind {
                        StmtKind::ConstDecl { .. }
                        | StmtKind::VarDecl { .. }
                        | StmtKind::FuncDecl(_)
                        | StmtKind::GateDecl(_) => self.resolve_stmt(member, class_scope)?,
                        _ => {
                            return Err(SemanticError::MisplacedDeclaration {
                                message: format!(
                                    "class '{name}' may only contain constants, variables, functions and gates"
                                ),
                                span: member.span,
                            });
                        }
                    }
                }
            }

            StmtKind::For {
                var,
                iterable,
                body,
            } => {
                let info = self.resolve_expr(iterable, scope)?;
                let element = info
                    .ty
                    .element()
                    .filter(|t| !t.is_operand())
                    .ok_or_else(|| SemanticError::TypeMismatch {
                        expected: "a classical array or range".into(),
                        found: info.ty.to_string(),
                        span: iterable.span,
                    })?;

                let block = self.symbols.push_scope(ScopeKind::Block, scope);
                let unique = self.fresh(var);
                self.symbols.declare(
                    block,
                    var,
                    Symbol::Variable(Variable {
                        unique: unique.clone(),
                        ty: element,
                        mutable: false,
                        is_static: info.is_static,
                    }),
                    span,
                )?;
                *var = unique;
                self.resolve_block(body, block)?;

                self.facts.loops.push(ControlFact {
                    is_static: info.is_static,
                    uses: collect_use(body),
                    span: iterable.span,
                });
            }

            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                let info = self.resolve_value(condition, scope)?;
                if info.ty != Type::Bool {
                    return Err(SemanticError::TypeMismatch {
                        expected: Type::Bool.to_string(),
                        found: info.ty.to_string(),
                        span: condition.span,
                    });
                }

                let then_scope = self.symbols.push_scope(ScopeKind::Block, scope);
                self.resolve_block(then_body, then_scope)?;
                let mut uses = collect_use(then_body);
                if let Some(else_body) = else_body {
                    let else_scope = self.symbols.push_scope(ScopeKind::Block, scope);
                    self.resolve_block(else_body, else_scope)?;
                    let other = collect_use(else_body);
                    uses.direct |= other.direct;
                    uses.non_unitary |= other.non_unitary;
                    uses.callees.extend(other.callees);
                }

                self.facts.conditions.push(ControlFact {
                    is_static: info.is_static,
                    uses,
                    span: condition.span,
                });
            }

            StmtKind::Return(value) => self.resolve_return(value.as_mut(), scope, span)?,

            StmtKind::Assign { target, op, value } => {
                self.resolve_assign(target, *op, value, scope, span)?;
            }

            StmtKind::Expr(expr) => {
                let expr_span = expr.span;
                match &mut expr.kind {
                    ExprKind::Call(call) => {
                        self.resolve_call(call, expr_span, scope, true)?;
                    }
                    _ => {
                        self.resolve_value(expr, scope)?;
                    }
                }
            }

            StmtKind::Modified { controls, body, .. } => {
                for control in controls.iter_mut() {
                    self.resolve_operand(control, scope, RegisterKind::Qubit)?;
                }
                let block = self.symbols.push_scope(ScopeKind::Block, scope);
                self.resolve_block(body, block)?;
            }
        }
        Ok(())
    }

    /// The id of a callable declared in phase 1, if `scope` is where those live.
    fn predeclared(&self, scope: ScopeId, name: &str) -> Option<CallableId> {
        if !matches!(
            self.symbols.scope(scope).kind,
            ScopeKind::Global | ScopeKind::Class(_)
        ) {
            return None;
        }
        match self.symbols.lookup_local(scope, name) {
            Some(Symbol::Function(id) | Symbol::GateMacro(id)) => Some(*id),
            _ => None,
        }
    }

    fn resolve_callable_body(&mut self, id: CallableId, body: &mut [Stmt]) -> SemanticResult<()> {
        let callable = self.symbols.callable(id);
        let parent = callable.scope;
        let span = callable.span;
        let params = callable.params.clone();

        let scope = self.symbols.push_scope(ScopeKind::Function(id), parent);
        for param in &params {
            let source_name = param
                .name
                .split_once('%')
                .map_or(param.name.as_str(), |(name, _)| name);
            self.symbols.declare(
                scope,
                source_name,
                Symbol::Variable(Variable {
                    unique: param.name.clone(),
                    ty: param.ty,
                    mutable: false,
                    is_static: true,
                }),
                span,
            )?;
        }
        self.resolve_block(body, scope)?;

        // Provisional flags for value-position calls later in the file; the
        // call graph check recomputes both.
        let uses = collect_use(body);
        let callees_quantum = uses
            .callees
            .iter()
            .any(|c| self.symbols.callable(*c).is_quantum);
        let callable = self.symbols.callable_mut(id);
        callable.body = body.to_vec();
        if callable.kind == CallableKind::Function {
            callable.is_quantum = uses.direct || callees_quantum;
        }
        trace!(callable = %callable.name, quantum = callable.is_quantum, "resolved body");
        Ok(())
    }

    fn resolve_binding(
        &mut self,
        name: &mut String,
        annotation: Option<TypeName>,
        value: &mut Expr,
        mutable: bool,
        scope: ScopeId,
        span: Span,
    ) -> SemanticResult<()> {
        let info = self.resolve_value(value, scope)?;
        let declared = annotation.map(Type::from);
        if let Some(declared) = declared {
            if declared.is_operand() {
                return Err(SemanticError::IllegalOperand {
                    message: format!("'{name}' cannot hold a {declared} value"),
                    span,
                });
            }
            if !declared.accepts(info.ty) {
                return Err(SemanticError::TypeMismatch {
                    expected: declared.to_string(),
                    found: info.ty.to_string(),
                    span: value.span,
                });
            }
        }
        let ty = declared.unwrap_or(info.ty);
        let is_static = !mutable && info.is_static;

        let unique = match &self.symbols.scope(scope).kind {
            ScopeKind::Global => name.clone(),
            ScopeKind::Class(class) => format!("{class}.{name}"),
            ScopeKind::Function(_) | ScopeKind::Block => self.fresh(name),
        };
        self.symbols.declare(
            scope,
            name,
            Symbol::Variable(Variable {
                unique: unique.clone(),
                ty,
                mutable,
                is_static,
            }),
            span,
        )?;

        if is_static && !self.symbols.is_local_scope(scope) {
            self.facts.constants.push(ConstFact {
                name: unique.clone(),
                ty: declared,
                value: value.clone(),
            });
        }
        *name = unique;
        Ok(())
    }

    fn resolve_return(
        &mut self,
        value: Option<&mut Expr>,
        scope: ScopeId,
        span: Span,
    ) -> SemanticResult<()> {
        let Some(id) = self.symbols.enclosing_callable(scope) else {
            return Err(SemanticError::MisplacedReturn {
                message: "return outside a function".into(),
                span,
            });
        };
        let callable = self.symbols.callable(id);
        if callable.kind == CallableKind::GateMacro {
            return Err(SemanticError::MisplacedReturn {
                message: format!("gate '{}' cannot return", callable.name),
                span,
            });
        }
        let return_type = callable.return_type;

        match (return_type, value) {
            (None, None) => {}
            (None, Some(value)) => {
                let info = self.resolve_value(value, scope)?;
                return Err(SemanticError::TypeMismatch {
                    expected: "no return value".into(),
                    found: info.ty.to_string(),
                    span: value.span,
                });
            }
            (Some(expected), None) => {
                return Err(SemanticError::TypeMismatch {
                    expected: expected.to_string(),
                    found: Type::Void.to_string(),
                    span,
                });
            }
            (Some(expected), Some(value)) => {
                let info = self.resolve_value(value, scope)?;
                if !expected.accepts(info.ty) {
                    return Err(SemanticError::TypeMismatch {
                        expected: expected.to_string(),
                        found: info.ty.to_string(),
                        span: value.span,
                    });
                }
            }
        }

        self.facts.returns.push(CallFact { callee: id, span });
        Ok(())
    }

    fn resolve_assign(
        &mut self,
        target: &mut Expr,
        op: AssignOp,
        value: &mut Expr,
        scope: ScopeId,
        span: Span,
    ) -> SemanticResult<()> {
        let Some(path) = target.as_path() else {
            return Err(SemanticError::IllegalOperand {
                message: "only variables can be assigned".into(),
                span: target.span,
            });
        };

        let var = match self.resolve_name(&path, scope, target.span)? {
            Resolved::Variable { var, outer } => {
                if !var.mutable {
                    return Err(SemanticError::ImmutableAssignment { name: path, span });
                }
                if outer && self.symbols.enclosing_callable(scope).is_some() {
                    return Err(SemanticError::ImmutableAssignment { name: path, span });
                }
                var
            }
            _ => return Err(SemanticError::ImmutableAssignment { name: path, span }),
        };

        let info = self.resolve_value(value, scope)?;
        let result = match op.binary_op() {
            Some(op) => binary_type(op, var.ty, info.ty, span)?,
            None => info.ty,
        };
        if !var.ty.accepts(result) {
            return Err(SemanticError::TypeMismatch {
                expected: var.ty.to_string(),
                found: result.to_string(),
                span: value.span,
            });
        }

        *target = Expr::ident(var.unique, target.span);
        Ok(())
    }

    /// Resolve a name or a `Class.member` path.
    fn resolve_name(&self, path: &str, scope: ScopeId, span: Span) -> SemanticResult<Resolved> {
        let (symbol, outer) = match path.split_once('.') {
            None => {
                let Some(found) = self.symbols.lookup(scope, path) else {
                    if builtin_constant(path).is_some() {
                        return Ok(Resolved::Constant);
                    }
                    return Err(SemanticError::UndeclaredIdentifier {
                        name: path.to_string(),
                        span,
                    });
                };
                let local = self.symbols.is_local_scope(found.scope);
                if local && found.crossed_function && matches!(found.symbol, Symbol::Variable(_)) {
                    return Err(SemanticError::ClosureCapture {
                        name: path.to_string(),
                        span,
                    });
                }
                (found.symbol, !local)
            }
            Some((class, member)) => {
                let class_scope = match self.symbols.lookup(scope, class).map(|l| l.symbol) {
                    Some(Symbol::Class(class_scope)) => *class_scope,
                    Some(_) => {
                        return Err(SemanticError::IllegalOperand {
                            message: format!("'{class}' has no members"),
                            span,
                        });
                    }
                    None => {
                        return Err(SemanticError::UndeclaredIdentifier {
                            name: class.to_string(),
                            span,
                        });
                    }
                };
                let symbol = self.symbols.lookup_local(class_scope, member).ok_or_else(|| {
                    SemanticError::UndeclaredIdentifier {
                        name: path.to_string(),
                        span,
                    }
                })?;
                (symbol, true)
            }
        };

        Ok(match symbol {
            Symbol::QuantumRegister { kind, .. } => Resolved::Register(*kind),
            Symbol::Variable(var) => Resolved::Variable {
                var: var.clone(),
                outer,
            },
            Symbol::Function(id) => Resolved::Function(*id),
            Symbol::GateMacro(id) => Resolved::GateMacro(*id),
            Symbol::Class(_) => Resolved::Class,
        })
    }

    /// Resolve an expression that must produce a classical value.
    pub(super) fn resolve_value(&mut self, expr: &mut Expr, scope: ScopeId) -> SemanticResult<ExprInfo> {
        let info = self.resolve_expr(expr, scope)?;
        require_classical(info, expr)?;
        Ok(info)
    }

    fn resolve_expr(&mut self, expr: &mut Expr, scope: ScopeId) -> SemanticResult<ExprInfo> {
        let span = expr.span;
        match &mut expr.kind {
            ExprKind::Int(_) => Ok(ExprInfo::new(Type::Int, true)),
            ExprKind::Float(_) => Ok(ExprInfo::new(Type::Float, true)),
            ExprKind::Bool(_) => Ok(ExprInfo::new(Type::Bool, true)),
            ExprKind::Str(_) => Ok(ExprInfo::new(Type::Str, true)),

            ExprKind::Index { base, index } => {
                let base_info = self.resolve_expr(base, scope)?;
                let index_info = self.resolve_value(index, scope)?;
                if index_info.ty != Type::Int {
                    return Err(SemanticError::TypeMismatch {
                        expected: Type::Int.to_string(),
                        found: index_info.ty.to_string(),
                        span: index.span,
                    });
                }
                let element = base_info.ty.element().ok_or_else(|| SemanticError::TypeMismatch {
                    expected: "an array or register".into(),
                    found: base_info.ty.to_string(),
                    span: base.span,
                })?;
                if let ExprKind::Ident(name) = &base.kind {
                    if let Some(size) = self.register_size(name) {
                        self.facts.indices.push(IndexFact {
                            register: name.clone(),
                            size,
                            index: (**index).clone(),
                            span: index.span,
                        });
                    }
                }
                Ok(ExprInfo::new(
                    element,
                    base_info.is_static && index_info.is_static,
                ))
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let l = self.resolve_value(lhs, scope)?;
                let r = self.resolve_value(rhs, scope)?;
                let ty = binary_type(*op, l.ty, r.ty, span)?;
                Ok(ExprInfo::new(ty, l.is_static && r.is_static))
            }

            ExprKind::Unary { op, operand } => {
                let info = self.resolve_value(operand, scope)?;
                let ok = match op {
                    UnaryOp::Neg => info.ty.is_numeric(),
                    UnaryOp::Not => info.ty == Type::Bool,
                };
                if !ok {
                    return Err(SemanticError::TypeMismatch {
                        expected: match op {
                            UnaryOp::Neg => "int or float".into(),
                            UnaryOp::Not => Type::Bool.to_string(),
                        },
                        found: info.ty.to_string(),
                        span: operand.span,
                    });
                }
                Ok(info)
            }

            ExprKind::Call(call) => self.resolve_call(call, span, scope, false),

            ExprKind::Array(ArrayExpr::List(items)) => {
                let mut infos = Vec::with_capacity(items.len());
                for item in items.iter_mut() {
                    infos.push(self.resolve_expr(item, scope)?);
                }
                let is_static = infos.iter().all(|i| i.is_static);
                let ty = list_type(&infos).ok_or_else(|| SemanticError::TypeMismatch {
                    expected: "elements of one type".into(),
                    found: infos
                        .iter()
                        .map(|i| i.ty.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    span,
                })?;
                Ok(ExprInfo::new(ty, is_static))
            }

            ExprKind::Array(ArrayExpr::Range { start, step, end }) => {
                let mut is_static = true;
                for bound in [Some(start), step.as_mut(), Some(end)].into_iter().flatten() {
                    let info = self.resolve_value(bound, scope)?;
                    if info.ty != Type::Int {
                        return Err(SemanticError::TypeMismatch {
                            expected: Type::Int.to_string(),
                            found: info.ty.to_string(),
                            span: bound.span,
                        });
                    }
                    is_static &= info.is_static;
                }
                Ok(ExprInfo::new(Type::IntArray, is_static))
            }

            ExprKind::Ident(_) | ExprKind::Member { .. } => self.resolve_name_expr(expr, scope),
        }
    }

    fn resolve_name_expr(&mut self, expr: &mut Expr, scope: ScopeId) -> SemanticResult<ExprInfo> {
        let span = expr.span;
        let Some(path) = expr.as_path() else {
            return Err(SemanticError::IllegalOperand {
                message: "member access needs a class name".into(),
                span,
            });
        };

        match self.resolve_name(&path, scope, span)? {
            Resolved::Register(kind) => {
                let ty = match kind {
                    RegisterKind::Qubit => Type::QubitArray,
                    RegisterKind::Bit => Type::BitArray,
                };
                Ok(ExprInfo::new(ty, true))
            }
            Resolved::Variable { var, .. } => {
                *expr = Expr::ident(var.unique, span);
                Ok(ExprInfo::new(var.ty, var.is_static))
            }
            Resolved::Constant => Ok(ExprInfo::new(Type::Float, true)),
            Resolved::Function(_) => Err(SemanticError::TypeMismatch {
                expected: "a value".into(),
                found: format!("function '{path}'"),
                span,
            }),
            Resolved::GateMacro(_) => Err(SemanticError::QuantumFunctionAsValue { name: path, span }),
            Resolved::Class => Err(SemanticError::TypeMismatch {
                expected: "a value".into(),
                found: format!("class '{path}'"),
                span,
            }),
        }
    }

    /// Resolve the callee of a call to its target, canonicalizing class
    /// members to their qualified name.
    fn resolve_callee(&self, call: &mut CallExpr, scope: ScopeId, span: Span) -> SemanticResult<CallTarget> {
        let name = call.callee.clone();
        if !name.contains('.') && self.symbols.lookup(scope, &name).is_none() {
            if let Some(builtin) = Builtin::from_name(&name) {
                return Ok(CallTarget::Builtin(builtin));
            }
            if let Some(intrinsic) = Intrinsic::from_name(&name) {
                return Ok(CallTarget::Intrinsic(intrinsic));
            }
            return Err(SemanticError::UndeclaredIdentifier { name, span });
        }

        let target = match self.resolve_name(&name, scope, span)? {
            Resolved::Function(id) => CallTarget::Function(id),
            Resolved::GateMacro(id) => CallTarget::GateMacro(id),
            _ => return Err(SemanticError::NotCallable { name, span }),
        };
        if let CallTarget::Function(id) | CallTarget::GateMacro(id) = target {
            call.callee = self.symbols.callable(id).name.clone();
        }
        Ok(target)
    }

    pub(super) fn resolve_call(
        &mut self,
        call: &mut CallExpr,
        span: Span,
        scope: ScopeId,
        statement: bool,
    ) -> SemanticResult<ExprInfo> {
        let target = self.resolve_callee(call, scope, span)?;
        call.target = Some(target);
        let name = call.callee.clone();

        if !call.modifiers.is_empty() {
            match target {
                CallTarget::Builtin(builtin) if !builtin.is_unitary() => {
                    return Err(SemanticError::ModifierOnNonUnitary { name, span });
                }
                CallTarget::Intrinsic(_) => {
                    return Err(SemanticError::ModifierOnNonUnitary { name, span });
                }
                CallTarget::Function(id) | CallTarget::GateMacro(id) => {
                    self.facts.modified_calls.push(CallFact { callee: id, span });
                }
                CallTarget::Builtin(_) => {}
            }
        }

        if !statement {
            match target {
                CallTarget::Builtin(_) | CallTarget::GateMacro(_) => {
                    return Err(SemanticError::QuantumFunctionAsValue { name, span });
                }
                CallTarget::Function(id) => {
                    let callable = self.symbols.callable(id);
                    if callable.return_type.is_none() {
                        if callable.is_quantum {
                            return Err(SemanticError::QuantumFunctionAsValue { name, span });
                        }
                        return Err(SemanticError::TypeMismatch {
                            expected: "a value".into(),
                            found: format!("'{name}', which returns nothing"),
                            span,
                        });
                    }
                    self.facts.value_uses.push(CallFact { callee: id, span });
                }
                CallTarget::Intrinsic(_) => {}
            }
        }

        let controls = control_count(&call.modifiers);
        if controls > call.args.len() {
            return Err(SemanticError::ArityMismatch {
                name,
                expected: controls,
                found: call.args.len(),
                span,
            });
        }
        let found = call.args.len();
        let rest = found - controls;
        let (control_args, args) = call.args.split_at_mut(controls);
        for control in control_args {
            self.resolve_operand(control, scope, RegisterKind::Qubit)?;
        }

        let arity = |expected: usize| {
            if rest == expected {
                Ok(())
            } else {
                Err(SemanticError::ArityMismatch {
                    name: name.clone(),
                    expected: controls + expected,
                    found,
                    span,
                })
            }
        };

        match target {
            CallTarget::Builtin(Builtin::Gate(gate)) => {
                arity(gate.num_params() + gate.num_qubits())?;
                let (params, qubits) = args.split_at_mut(gate.num_params());
                for param in params {
                    let info = self.resolve_value(param, scope)?;
                    if !info.ty.is_numeric() {
                        return Err(SemanticError::TypeMismatch {
                            expected: Type::Float.to_string(),
                            found: info.ty.to_string(),
                            span: param.span,
                        });
                    }
                }
                for qubit in qubits {
                    self.resolve_operand(qubit, scope, RegisterKind::Qubit)?;
                }
                Ok(ExprInfo::new(Type::Void, true))
            }

            CallTarget::Builtin(Builtin::Measure) => {
                arity(2)?;
                self.resolve_operand(&mut args[0], scope, RegisterKind::Qubit)?;
                self.resolve_operand(&mut args[1], scope, RegisterKind::Bit)?;
                Ok(ExprInfo::new(Type::Void, true))
            }

            CallTarget::Builtin(Builtin::Reset) => {
                arity(1)?;
                self.resolve_operand(&mut args[0], scope, RegisterKind::Qubit)?;
                Ok(ExprInfo::new(Type::Void, true))
            }

            CallTarget::Builtin(Builtin::Barrier) => {
                if args.is_empty() {
                    return Err(SemanticError::ArityMismatch {
                        name,
                        expected: 1,
                        found: 0,
                        span,
                    });
                }
                for arg in args.iter_mut() {
                    let info = self.resolve_expr(arg, scope)?;
                    if !matches!(info.ty, Type::Qubit | Type::QubitArray) {
                        return Err(SemanticError::IllegalOperand {
                            message: format!("Barrier expects qubits, found {}", info.ty),
                            span: arg.span,
                        });
                    }
                }
                Ok(ExprInfo::new(Type::Void, true))
            }

            CallTarget::Builtin(Builtin::MeasureAll) => {
                arity(2)?;
                for (arg, expected) in args.iter_mut().zip([Type::QubitArray, Type::BitArray]) {
                    let info = self.resolve_expr(arg, scope)?;
                    if info.ty != expected {
                        return Err(SemanticError::IllegalOperand {
                            message: format!("measure_all expects {expected}, found {}", info.ty),
                            span: arg.span,
                        });
                    }
                }
                let sizes: Vec<Option<u32>> = args
                    .iter()
                    .map(|arg| match &arg.kind {
                        ExprKind::Ident(name) => self.register_size(name),
                        _ => None,
                    })
                    .collect();
                if let [Some(qubits), Some(bits)] = sizes.as_slice() {
                    if qubits != bits {
                        return Err(SemanticError::IllegalOperand {
                            message: format!(
                                "measure_all needs registers of equal size, found {qubits} and {bits}"
                            ),
                            span,
                        });
                    }
                }
                Ok(ExprInfo::new(Type::Void, true))
            }

            CallTarget::GateMacro(id) | CallTarget::Function(id) => {
                let callable = self.symbols.callable(id);
                let params = callable.params.clone();
                let return_type = callable.return_type.unwrap_or(Type::Void);
                arity(params.len())?;

                let mut all_static = true;
                let mut first_dynamic = None;
                for (arg, param) in args.iter_mut().zip(&params) {
                    match param.ty {
                        Type::Qubit => self.resolve_operand(arg, scope, RegisterKind::Qubit)?,
                        Type::Bit => self.resolve_operand(arg, scope, RegisterKind::Bit)?,
                        Type::QubitArray | Type::BitArray => {
                            let info = self.resolve_expr(arg, scope)?;
                            if info.ty != param.ty {
                                return Err(SemanticError::TypeMismatch {
                                    expected: param.ty.to_string(),
                                    found: info.ty.to_string(),
                                    span: arg.span,
                                });
                            }
                        }
                        expected => {
                            let info = self.resolve_value(arg, scope)?;
                            if !expected.accepts(info.ty) {
                                return Err(SemanticError::TypeMismatch {
                                    expected: expected.to_string(),
                                    found: info.ty.to_string(),
                                    span: arg.span,
                                });
                            }
                            if !info.is_static {
                                all_static = false;
                                first_dynamic.get_or_insert(arg.span);
                            }
                        }
                    }
                }

                if let Some(arg_span) = first_dynamic {
                    if matches!(target, CallTarget::GateMacro(_)) {
                        return Err(SemanticError::NonStaticArgument {
                            name,
                            span: arg_span,
                        });
                    }
                    self.facts.non_static_args.push(CallFact {
                        callee: id,
                        span: arg_span,
                    });
                }
                Ok(ExprInfo::new(return_type, all_static))
            }

            CallTarget::Intrinsic(intrinsic) => self.resolve_intrinsic(intrinsic, &name, args, scope, span),
        }
    }

    fn resolve_intrinsic(
        &mut self,
        intrinsic: Intrinsic,
        name: &str,
        args: &mut [Expr],
        scope: ScopeId,
        span: Span,
    ) -> SemanticResult<ExprInfo> {
        let arity_error = |expected: usize, found: usize| SemanticError::ArityMismatch {
            name: name.to_string(),
            expected,
            found,
            span,
        };

        if intrinsic == Intrinsic::Len {
            let [arg] = args else {
                return Err(arity_error(1, args.len()));
            };
            let info = self.resolve_expr(arg, scope)?;
            if !info.ty.is_array() {
                return Err(SemanticError::TypeMismatch {
                    expected: "an array or register".into(),
                    found: info.ty.to_string(),
                    span: arg.span,
                });
            }
            return Ok(ExprInfo::new(Type::Int, info.is_static));
        }

        let mut infos = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            infos.push(self.resolve_value(arg, scope)?);
        }
        let is_static = infos.iter().all(|i| i.is_static);

        if matches!(intrinsic, Intrinsic::Min | Intrinsic::Max) {
            let element_types: Vec<Type> = match infos.as_slice() {
                [] => return Err(arity_error(1, 0)),
                [single] if single.ty.is_array() => single.ty.element().into_iter().collect(),
                _ => infos.iter().map(|i| i.ty).collect(),
            };
            if let Some(bad) = element_types.iter().find(|t| !t.is_numeric()) {
                return Err(SemanticError::TypeMismatch {
                    expected: "int or float".into(),
                    found: bad.to_string(),
                    span,
                });
            }
            let ty = if element_types.iter().all(|t| *t == Type::Int) {
                Type::Int
            } else {
                Type::Float
            };
            return Ok(ExprInfo::new(ty, is_static));
        }

        let [info] = infos.as_slice() else {
            return Err(arity_error(1, infos.len()));
        };
        let accepted = match intrinsic {
            Intrinsic::Int => info.ty.is_numeric() || info.ty == Type::Bool,
            _ => info.ty.is_numeric(),
        };
        if !accepted {
            return Err(SemanticError::TypeMismatch {
                expected: "int or float".into(),
                found: info.ty.to_string(),
                span: args[0].span,
            });
        }
        let ty = match intrinsic {
            Intrinsic::Abs => info.ty,
            Intrinsic::Int => Type::Int,
            _ => Type::Float,
        };
        Ok(ExprInfo::new(ty, is_static))
    }

    /// Resolve an argument that must denote a single qubit or bit.
    pub(super) fn resolve_operand(
        &mut self,
        arg: &mut Expr,
        scope: ScopeId,
        kind: RegisterKind,
    ) -> SemanticResult<()> {
        let info = self.resolve_expr(arg, scope)?;
        let (single, whole) = match kind {
            RegisterKind::Qubit => (Type::Qubit, Type::QubitArray),
            RegisterKind::Bit => (Type::Bit, Type::BitArray),
        };

        if info.ty == single {
            return Ok(());
        }
        if info.ty == whole {
            // Registers of size 1 stand for their only element; the size of a
            // register passed through a parameter is checked after unrolling.
            if let ExprKind::Ident(name) = &arg.kind {
                if let Some(size) = self.register_size(name) {
                    if size != 1 {
                        return Err(SemanticError::IllegalOperand {
                            message: format!(
                                "register '{name}' of size {size} cannot be used as a single {kind}"
                            ),
                            span: arg.span,
                        });
                    }
                }
            }
            return Ok(());
        }
        Err(SemanticError::IllegalOperand {
            message: format!("expected a {kind} operand, found {}", info.ty),
            span: arg.span,
        })
    }

    /// Size of a declared register, if `name` is one.
    fn register_size(&self, name: &str) -> Option<u32> {
        match self.symbols.lookup_local(SymbolTable::global(), name) {
            Some(Symbol::QuantumRegister { size, .. }) => Some(*size),
            _ => None,
        }
    }
}

/// Reject qubits, bits and void where a classical value is needed.
fn require_classical(info: ExprInfo, expr: &Expr) -> SemanticResult<()> {
    match info.ty {
        Type::Bit | Type::BitArray => Err(SemanticError::IllegalOperand {
            message: "classical bits cannot be read in expressions".into(),
            span: expr.span,
        }),
        Type::Qubit | Type::QubitArray => Err(SemanticError::IllegalOperand {
            message: "qubits cannot be used as values".into(),
            span: expr.span,
        }),
        Type::Void => Err(SemanticError::TypeMismatch {
            expected: "a value".into(),
            found: Type::Void.to_string(),
            span: expr.span,
        }),
        _ => Ok(()),
    }
}

/// Result type of a binary operator.
fn binary_type(op: BinOp, lhs: Type, rhs: Type, span: Span) -> SemanticResult<Type> {
    let mismatch = |expected: &str, found: Type| SemanticError::TypeMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
        span,
    };

    if op.is_logical() {
        for ty in [lhs, rhs] {
            if ty != Type::Bool {
                return Err(mismatch("bool", ty));
            }
        }
        return Ok(Type::Bool);
    }

    if matches!(op, BinOp::Eq | BinOp::NotEq) {
        let comparable = (lhs.is_numeric() && rhs.is_numeric())
            || (lhs == rhs && matches!(lhs, Type::Bool | Type::Str));
        if !comparable {
            return Err(SemanticError::TypeMismatch {
                expected: lhs.to_string(),
                found: rhs.to_string(),
                span,
            });
        }
        return Ok(Type::Bool);
    }

    for ty in [lhs, rhs] {
        if !ty.is_numeric() {
            return Err(mismatch("int or float", ty));
        }
    }
    Ok(match op {
        _ if op.is_comparison() => Type::Bool,
        BinOp::Div => Type::Float,
        _ if lhs == Type::Int && rhs == Type::Int => Type::Int,
        _ => Type::Float,
    })
}

/// Type of a list literal from its element types.
fn list_type(items: &[ExprInfo]) -> Option<Type> {
    let Some(first) = items.first() else {
        return Some(Type::IntArray);
    };
    if items.iter().all(|i| i.ty == first.ty) {
        return first.ty.array_of();
    }
    if items.iter().all(|i| i.ty.is_numeric()) {
        return Some(Type::FloatArray);
    }
    None
}
