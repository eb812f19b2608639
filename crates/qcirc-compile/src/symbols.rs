//! Symbol tables.
//!
//! Scopes live in an arena indexed by [`ScopeId`]. The global scope is
//! always id 0; class, function and block scopes point at their parent, and
//! inner scopes shadow outer ones by name. User callables are stored in a
//! second table indexed by [`CallableId`], which is what a resolved
//! [`CallTarget`](qcirc_lang::CallTarget) refers to.

use rustc_hash::FxHashMap;

use qcirc_ir::{Register, RegisterKind};
use qcirc_lang::{CallableId, Span, Stmt};

use crate::error::{SemanticError, SemanticResult};
use crate::types::Type;

/// Index of a scope in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// What introduced a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    /// Members of a class, by class name.
    Class(String),
    /// Parameters and locals of a callable.
    Function(CallableId),
    /// Body of a loop or branch.
    Block,
}

/// A name bound in a scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    QuantumRegister { kind: RegisterKind, size: u32 },
    Variable(Variable),
    Function(CallableId),
    GateMacro(CallableId),
    Class(ScopeId),
}

/// A classical binding or a callable parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Program-wide unique name the binding is rewritten to.
    pub unique: String,
    pub ty: Type,
    pub mutable: bool,
    /// Whether the value is known at compile time.
    pub is_static: bool,
}

/// One scope in the arena.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    symbols: FxHashMap<String, Symbol>,
}

/// Function or gate-macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    Function,
    GateMacro,
}

/// A formal parameter after renaming.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

/// Signature and resolved body of a user callable.
#[derive(Debug, Clone)]
pub struct Callable {
    /// Qualified name (`Bell`, `Oracles.flip`).
    pub name: String,
    pub kind: CallableKind,
    pub params: Vec<Parameter>,
    pub return_type: Option<Type>,
    /// Body with every name resolved, filled in by analysis.
    pub body: Vec<Stmt>,
    pub span: Span,
    /// Scope the callable is declared in.
    pub scope: ScopeId,
    /// Transitively contains quantum operations (mandatory inline).
    pub is_quantum: bool,
    /// Transitively contains no measurement, reset or barrier.
    pub is_unitary: bool,
}

/// Result of a scoped lookup.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    pub symbol: &'a Symbol,
    /// Scope the name was found in.
    pub scope: ScopeId,
    /// Whether the search left a function scope before finding the name.
    pub crossed_function: bool,
}

/// All scopes, callables and registers of one compilation.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    callables: Vec<Callable>,
    registers: Vec<Register>,
}

impl SymbolTable {
    /// Create a table holding only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                parent: None,
                symbols: FxHashMap::default(),
            }],
            callables: vec![],
            registers: vec![],
        }
    }

    /// The global scope.
    pub const fn global() -> ScopeId {
        ScopeId(0)
    }

    /// Open a new scope below `parent`.
    pub fn push_scope(&mut self, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            symbols: FxHashMap::default(),
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Bind `name` in `scope`, rejecting a second binding of the same name.
    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        symbol: Symbol,
        span: Span,
    ) -> SemanticResult<()> {
        let symbols = &mut self.scopes[scope.0 as usize].symbols;
        if symbols.contains_key(name) {
            return Err(SemanticError::DuplicateDeclaration {
                name: name.to_string(),
                span,
            });
        }
        symbols.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Find `name` in `scope` or its ancestors.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<Lookup<'_>> {
        let mut current = Some(scope);
        let mut crossed_function = false;
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(Lookup {
                    symbol,
                    scope: id,
                    crossed_function,
                });
            }
            if matches!(scope.kind, ScopeKind::Function(_)) {
                crossed_function = true;
            }
            current = scope.parent;
        }
        None
    }

    /// Find `name` in `scope` only.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scope(scope).symbols.get(name)
    }

    /// Whether bindings in `scope` are locals of some callable.
    pub fn is_local_scope(&self, scope: ScopeId) -> bool {
        matches!(
            self.scope(scope).kind,
            ScopeKind::Function(_) | ScopeKind::Block
        )
    }

    /// The callable whose body `scope` belongs to, if any.
    pub fn enclosing_callable(&self, scope: ScopeId) -> Option<CallableId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let ScopeKind::Function(callable) = scope.kind {
                return Some(callable);
            }
            current = scope.parent;
        }
        None
    }

    pub fn add_callable(&mut self, callable: Callable) -> CallableId {
        let id = CallableId(self.callables.len() as u32);
        self.callables.push(callable);
        id
    }

    pub fn callable(&self, id: CallableId) -> &Callable {
        &self.callables[id.0 as usize]
    }

    pub fn callable_mut(&mut self, id: CallableId) -> &mut Callable {
        &mut self.callables[id.0 as usize]
    }

    pub fn callables(&self) -> &[Callable] {
        &self.callables
    }

    /// Record a top-level register in declaration order.
    pub fn add_register(&mut self, register: Register) {
        self.registers.push(register);
    }

    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    /// Register sizes keyed by name.
    pub fn register_sizes(&self) -> FxHashMap<String, u32> {
        self.registers
            .iter()
            .map(|r| (r.name.clone(), r.size))
            .collect()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
