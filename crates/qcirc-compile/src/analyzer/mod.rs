//! Semantic analysis.
//!
//! The analyzer validates a parsed [`Program`] and returns it together with
//! its symbol tables. It runs in phases:
//!
//! 1. Declare every top-level and class-level callable and class, so calls
//!    may refer to callables declared later in the file.
//! 2. Resolve statements in source order: bind names, check types, store the
//!    [`CallTarget`](qcirc_lang::CallTarget) of every call and rename local
//!    binders to program-wide unique names.
//! 3. Check the call graph for cycles and derive which callables are quantum
//!    and which are unitary.
//! 4. Run the checks that need those flags (modifiers, inline arguments,
//!    loop bounds, conditions, returns).
//! 5. Evaluate static constants and bounds-check constant register indices.

mod checks;
mod resolve;

use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

use qcirc_lang::ast::{FuncDecl, GateDecl, StmtKind};
use qcirc_lang::{CallableId, Expr, Program, Span};

use crate::error::SemanticResult;
use crate::eval::Env;
use crate::symbols::{Callable, CallableKind, Parameter, ScopeId, ScopeKind, Symbol, SymbolTable};
use crate::types::Type;

/// A validated program with its symbol tables.
#[derive(Debug, Clone)]
pub struct AnalyzedProgram {
    /// The program with every call resolved and local binders renamed.
    pub program: Program,
    /// Scopes, callables and registers.
    pub symbols: SymbolTable,
    /// Values of constants that are known before expansion.
    pub constants: Env,
}

/// Validate a program.
#[instrument(skip_all, fields(statements = program.statements.len()))]
pub fn analyze(mut program: Program) -> SemanticResult<AnalyzedProgram> {
    let mut analyzer = Analyzer::new();

    analyzer.declare_top_level(&program)?;
    for stmt in &mut program.statements {
        analyzer.resolve_stmt(stmt, SymbolTable::global())?;
    }
    analyzer.check_call_graph()?;
    analyzer.check_deferred()?;
    let constants = analyzer.evaluate_constants()?;
    analyzer.check_constant_indices(&constants)?;

    info!(
        callables = analyzer.symbols.callables().len(),
        registers = analyzer.symbols.registers().len(),
        constants = constants.len(),
        "semantic analysis complete"
    );

    Ok(AnalyzedProgram {
        program,
        symbols: analyzer.symbols,
        constants,
    })
}

/// Static-ness and type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExprInfo {
    pub ty: Type,
    pub is_static: bool,
}

impl ExprInfo {
    const fn new(ty: Type, is_static: bool) -> Self {
        Self { ty, is_static }
    }
}

/// Quantum content of a statement list.
#[derive(Debug, Clone, Default)]
pub(crate) struct QuantumUse {
    /// Contains a built-in quantum operation.
    pub direct: bool,
    /// Contains a measurement, reset or barrier.
    pub non_unitary: bool,
    /// User callables referenced.
    pub callees: BTreeSet<CallableId>,
}

/// A loop or branch whose static-ness matters only if it gates quantum code.
#[derive(Debug, Clone)]
struct ControlFact {
    is_static: bool,
    uses: QuantumUse,
    span: Span,
}

/// A call site whose legality depends on the callee's flags.
#[derive(Debug, Clone)]
struct CallFact {
    callee: CallableId,
    span: Span,
}

/// A register index to bounds-check once constants are known.
#[derive(Debug, Clone)]
struct IndexFact {
    register: String,
    size: u32,
    index: Expr,
    span: Span,
}

/// A constant with a static initializer.
#[derive(Debug, Clone)]
struct ConstFact {
    name: String,
    ty: Option<Type>,
    value: Expr,
}

/// Facts recorded during resolution and checked after the call graph.
#[derive(Debug, Default)]
struct Facts {
    loops: Vec<ControlFact>,
    conditions: Vec<ControlFact>,
    modified_calls: Vec<CallFact>,
    non_static_args: Vec<CallFact>,
    value_uses: Vec<CallFact>,
    returns: Vec<CallFact>,
    indices: Vec<IndexFact>,
    constants: Vec<ConstFact>,
}

pub(crate) struct Analyzer {
    symbols: SymbolTable,
    facts: Facts,
    next_unique: u32,
}

impl Analyzer {
    fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            facts: Facts::default(),
            next_unique: 0,
        }
    }

    /// A program-wide unique name for a local binder.
    fn fresh(&mut self, name: &str) -> String {
        let unique = format!("{name}%{}", self.next_unique);
        self.next_unique += 1;
        unique
    }

    /// Phase 1: callables and classes visible from anywhere in the file.
    fn declare_top_level(&mut self, program: &Program) -> SemanticResult<()> {
        let global = SymbolTable::global();
        for stmt in &program.statements {
            match &stmt.kind {
                StmtKind::FuncDecl(decl) => {
                    self.declare_function(decl, global, None, stmt.span)?;
                }
                StmtKind::GateDecl(decl) => {
                    self.declare_gate(decl, global, None, stmt.span)?;
                }
                StmtKind::ClassDecl { name, members } => {
                    let scope = self.symbols.push_scope(ScopeKind::Class(name.clone()), global);
                    self.symbols
                        .declare(global, name, Symbol::Class(scope), stmt.span)?;
                    for member in members {
                        match &member.kind {
                            StmtKind::FuncDecl(decl) => {
                                self.declare_function(decl, scope, Some(name), member.span)?;
                            }
                            StmtKind::GateDecl(decl) => {
                                self.declare_gate(decl, scope, Some(name), member.span)?;
                            }
                            _ => {}
                        }
                    }
                    debug!(class = %name, "declared class");
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn declare_function(
        &mut self,
        decl: &FuncDecl,
        scope: ScopeId,
        class: Option<&str>,
        span: Span,
    ) -> SemanticResult<CallableId> {
        let params = self.parameters(&decl.params)?;
        let callable = Callable {
            name: qualified(class, &decl.name),
            kind: CallableKind::Function,
            params,
            return_type: decl.return_type.map(Type::from),
            body: vec![],
            span,
            scope,
            is_quantum: false,
            is_unitary: true,
        };
        let id = self.symbols.add_callable(callable);
        self.symbols
            .declare(scope, &decl.name, Symbol::Function(id), span)?;
        Ok(id)
    }

    fn declare_gate(
        &mut self,
        decl: &GateDecl,
        scope: ScopeId,
        class: Option<&str>,
        span: Span,
    ) -> SemanticResult<CallableId> {
        let params = self.parameters(&decl.params)?;
        let callable = Callable {
            name: qualified(class, &decl.name),
            kind: CallableKind::GateMacro,
            params,
            return_type: None,
            body: vec![],
            span,
            scope,
            is_quantum: true,
            is_unitary: true,
        };
        let id = self.symbols.add_callable(callable);
        self.symbols
            .declare(scope, &decl.name, Symbol::GateMacro(id), span)?;
        Ok(id)
    }

    fn parameters(&mut self, params: &[qcirc_lang::ast::Param]) -> SemanticResult<Vec<Parameter>> {
        let mut out: Vec<Parameter> = Vec::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            if params[..i].iter().any(|p| p.name == param.name) {
                return Err(crate::error::SemanticError::DuplicateDeclaration {
                    name: param.name.clone(),
                    span: param.span,
                });
            }
            out.push(Parameter {
                name: self.fresh(&param.name),
                ty: Type::from(param.ty),
            });
        }
        Ok(out)
    }
}

fn qualified(class: Option<&str>, name: &str) -> String {
    match class {
        Some(class) => format!("{class}.{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SemanticError;
    use qcirc_lang::{CallTarget, ExprKind, parse};

    fn analyze_source(source: &str) -> SemanticResult<AnalyzedProgram> {
        analyze(parse(source).unwrap())
    }

    fn first_call_target(program: &Program, index: usize) -> Option<CallTarget> {
        match &program.statements[index].kind {
            StmtKind::Expr(expr) => expr.as_call().and_then(|c| c.target),
            _ => None,
        }
    }

    #[test]
    fn test_resolves_builtin_and_macro_targets() {
        let analyzed = analyze_source(
            "qubit[2] q\ngate Bell(a, b) { H(a); CNot(a, b) }\nBell(q[0], q[1])\nH(q[0])",
        )
        .unwrap();
        assert_eq!(
            first_call_target(&analyzed.program, 2),
            Some(CallTarget::GateMacro(CallableId(0)))
        );
        assert!(matches!(
            first_call_target(&analyzed.program, 3),
            Some(CallTarget::Builtin(_))
        ));
        let bell = analyzed.symbols.callable(CallableId(0));
        assert!(bell.is_quantum);
        assert!(bell.is_unitary);
        assert_eq!(bell.params.len(), 2);
    }

    #[test]
    fn test_forward_reference_to_callable() {
        let analyzed = analyze_source("qubit q\nflip(q)\ngate flip(a) { X(a) }");
        assert!(analyzed.is_ok());
    }

    #[test]
    fn test_local_binders_are_renamed() {
        let analyzed =
            analyze_source("qubit[2] q\nfor i in [0:2] { H(q[i]) }").unwrap();
        let StmtKind::For { var, body, .. } = &analyzed.program.statements[1].kind else {
            panic!("expected loop");
        };
        assert!(var.starts_with("i%"));
        let StmtKind::Expr(expr) = &body[0].kind else {
            panic!("expected call");
        };
        let call = expr.as_call().unwrap();
        let ExprKind::Index { index, .. } = &call.args[0].kind else {
            panic!("expected index");
        };
        assert_eq!(index.kind, ExprKind::Ident(var.clone()));
    }

    #[test]
    fn test_class_members_are_qualified() {
        let analyzed = analyze_source(
            "qubit q\nclass Oracles { const K = 2; gate flip(a) { X(a) } }\nOracles.flip(q)\nconst M = Oracles.K",
        )
        .unwrap();
        assert_eq!(analyzed.symbols.callable(CallableId(0)).name, "Oracles.flip");
        let StmtKind::ConstDecl { value, .. } = &analyzed.program.statements[3].kind else {
            panic!("expected const");
        };
        assert_eq!(value.kind, ExprKind::Ident("Oracles.K".into()));
        assert_eq!(
            analyzed.constants.get("M"),
            Some(&crate::eval::Value::Int(2))
        );
    }

    #[test]
    fn test_undeclared_identifier() {
        let err = analyze_source("qubit q\nH(r[0])").unwrap_err();
        assert!(matches!(err, SemanticError::UndeclaredIdentifier { ref name, .. } if name == "r"));
        assert_eq!(err.span(), Span::new(2, 3));
    }

    #[test]
    fn test_duplicate_declaration() {
        let err = analyze_source("qubit q\nbit q").unwrap_err();
        assert!(matches!(err, SemanticError::DuplicateDeclaration { .. }));
        let err = analyze_source("gate g(a, a) { X(a) }").unwrap_err();
        assert!(matches!(err, SemanticError::DuplicateDeclaration { .. }));
    }
}
