//! Abstract syntax tree for the Qcirc circuit language.
//!
//! Every node owns its children and carries the [`Span`] of its first token.
//! The parser fills in structure only; the semantic analyzer later stores the
//! resolved [`CallTarget`] on each [`CallExpr`], and the expander introduces
//! [`StmtKind::Modified`] scopes while inlining.

use serde::{Deserialize, Serialize};
use std::fmt;

use qcirc_ir::{Modifier, RegisterKind, StandardGate};

use crate::span::Span;

/// A complete source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Top-level statements in source order.
    pub statements: Vec<Stmt>,
}

/// A statement with its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    /// Create a new statement.
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// A statement in a program or block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// Register declaration: `qubit[n] name` or `bit[n] name`.
    QuantumDecl {
        kind: RegisterKind,
        size: u32,
        name: String,
    },

    /// Mutable binding: `var x: int = 3`.
    VarDecl {
        name: String,
        ty: Option<TypeName>,
        value: Expr,
    },

    /// Immutable binding: `const N = 4`.
    ConstDecl {
        name: String,
        ty: Option<TypeName>,
        value: Expr,
    },

    /// Function definition: `def f(x: int) -> int { ... }`.
    FuncDecl(FuncDecl),

    /// Gate-macro definition: `gate Bell(a, b) { ... }`.
    GateDecl(GateDecl),

    /// Class definition, a static namespace of members.
    ClassDecl { name: String, members: Vec<Stmt> },

    /// Loop: `for i in [0:N] { ... }`.
    For {
        var: String,
        iterable: Expr,
        body: Vec<Stmt>,
    },

    /// Conditional. An `elif` chain is nested in `else_body`.
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
    },

    /// `return` with an optional value.
    Return(Option<Expr>),

    /// Assignment: `x = e`, `x += e`, ...
    Assign {
        target: Expr,
        op: AssignOp,
        value: Expr,
    },

    /// Expression evaluated for its effect, usually a call.
    Expr(Expr),

    /// An inlined call carrying modifiers. Produced by the expander only.
    Modified {
        modifiers: Vec<Modifier>,
        controls: Vec<Expr>,
        body: Vec<Stmt>,
    },
}

/// A function definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeName>,
    pub body: Vec<Stmt>,
}

/// A gate-macro definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// A formal parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeName,
    pub span: Span,
}

/// A type as written in a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeName {
    Int,
    Float,
    Bool,
    Str,
    Qubit,
    Bit,
    QubitArray,
    BitArray,
    IntArray,
    FloatArray,
    BoolArray,
}

impl TypeName {
    /// Look up a scalar type written as an identifier.
    pub fn from_ident(name: &str) -> Option<Self> {
        match name {
            "int" => Some(TypeName::Int),
            "float" => Some(TypeName::Float),
            "bool" => Some(TypeName::Bool),
            "str" => Some(TypeName::Str),
            _ => None,
        }
    }

    /// The `[]` form of a scalar type, if the language has one.
    pub fn array_of(self) -> Option<Self> {
        match self {
            TypeName::Int => Some(TypeName::IntArray),
            TypeName::Float => Some(TypeName::FloatArray),
            TypeName::Bool => Some(TypeName::BoolArray),
            TypeName::Qubit => Some(TypeName::QubitArray),
            TypeName::Bit => Some(TypeName::BitArray),
            _ => None,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeName::Int => "int",
            TypeName::Float => "float",
            TypeName::Bool => "bool",
            TypeName::Str => "str",
            TypeName::Qubit => "qubit",
            TypeName::Bit => "bit",
            TypeName::QubitArray => "qubit[]",
            TypeName::BitArray => "bit[]",
            TypeName::IntArray => "int[]",
            TypeName::FloatArray => "float[]",
            TypeName::BoolArray => "bool[]",
        };
        f.write_str(s)
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl AssignOp {
    /// The binary operator a compound assignment applies.
    pub fn binary_op(self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinOp::Add),
            AssignOp::SubAssign => Some(BinOp::Sub),
            AssignOp::MulAssign => Some(BinOp::Mul),
            AssignOp::DivAssign => Some(BinOp::Div),
        }
    }
}

/// An expression with its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    /// Create a new expression.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Integer literal.
    pub fn int(value: i64, span: Span) -> Self {
        Self::new(ExprKind::Int(value), span)
    }

    /// Float literal.
    pub fn float(value: f64, span: Span) -> Self {
        Self::new(ExprKind::Float(value), span)
    }

    /// Identifier reference.
    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Ident(name.into()), span)
    }

    /// The call inside this expression, if it is one.
    pub fn as_call(&self) -> Option<&CallExpr> {
        match &self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Dotted path for identifiers and member chains (`a`, `A.b`).
    pub fn as_path(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name.clone()),
            ExprKind::Member { object, member } => {
                object.as_path().map(|p| format!("{p}.{member}"))
            }
            _ => None,
        }
    }
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Ident(String),
    /// `object.member`
    Member { object: Box<Expr>, member: String },
    /// `base[index]`
    Index { base: Box<Expr>, index: Box<Expr> },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Call(CallExpr),
    Array(ArrayExpr),
}

/// A call, optionally carrying gate modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    /// Dotted callee path as written (`H`, `Oracles.flip`).
    pub callee: String,
    /// Arguments in call order; control operands first when modified.
    pub args: Vec<Expr>,
    /// Modifiers outer-to-inner, as written.
    pub modifiers: Vec<Modifier>,
    /// Resolved by semantic analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<CallTarget>,
}

impl CallExpr {
    /// Create an unresolved call.
    pub fn new(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            callee: callee.into(),
            args,
            modifiers: vec![],
            target: None,
        }
    }
}

/// Array literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayExpr {
    /// `[a, b, c]`
    List(Vec<Expr>),
    /// `[start:end]` or `[start:step:end]`, end exclusive.
    Range {
        start: Box<Expr>,
        step: Option<Box<Expr>>,
        end: Box<Expr>,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinOp {
    /// Whether the operator yields a `bool` from two operands.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq
        )
    }

    /// Whether the operator is `and` / `or`.
    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        };
        f.write_str(s)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Index of a user callable (function or gate-macro) in the callable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallableId(pub u32);

impl fmt::Display for CallableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a call resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallTarget {
    /// A built-in quantum operation.
    Builtin(Builtin),
    /// A user gate-macro.
    GateMacro(CallableId),
    /// A user function.
    Function(CallableId),
    /// A classical intrinsic evaluated at compile time.
    Intrinsic(Intrinsic),
}

/// Built-in quantum operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Builtin {
    Gate(StandardGate),
    Measure,
    Reset,
    Barrier,
    MeasureAll,
}

impl Builtin {
    /// Resolve a built-in operation by source name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Measure" => Some(Builtin::Measure),
            "Reset" => Some(Builtin::Reset),
            "Barrier" => Some(Builtin::Barrier),
            "measure_all" => Some(Builtin::MeasureAll),
            _ => StandardGate::from_name(name).map(Builtin::Gate),
        }
    }

    /// Whether `ctrl`/`inv` may be applied.
    pub fn is_unitary(self) -> bool {
        matches!(self, Builtin::Gate(_))
    }

    /// Source name.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Gate(g) => g.name(),
            Builtin::Measure => "Measure",
            Builtin::Reset => "Reset",
            Builtin::Barrier => "Barrier",
            Builtin::MeasureAll => "measure_all",
        }
    }
}

/// Compile-time classical functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intrinsic {
    Len,
    Abs,
    Min,
    Max,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Exp,
    Int,
    Float,
}

impl Intrinsic {
    /// Resolve an intrinsic by source name.
    pub fn from_name(name: &str) -> Option<Self> {
        let intrinsic = match name {
            "len" => Intrinsic::Len,
            "abs" => Intrinsic::Abs,
            "min" => Intrinsic::Min,
            "max" => Intrinsic::Max,
            "sqrt" => Intrinsic::Sqrt,
            "sin" => Intrinsic::Sin,
            "cos" => Intrinsic::Cos,
            "tan" => Intrinsic::Tan,
            "exp" => Intrinsic::Exp,
            "int" => Intrinsic::Int,
            "float" => Intrinsic::Float,
            _ => return None,
        };
        Some(intrinsic)
    }

    /// Source name.
    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::Len => "len",
            Intrinsic::Abs => "abs",
            Intrinsic::Min => "min",
            Intrinsic::Max => "max",
            Intrinsic::Sqrt => "sqrt",
            Intrinsic::Sin => "sin",
            Intrinsic::Cos => "cos",
            Intrinsic::Tan => "tan",
            Intrinsic::Exp => "exp",
            Intrinsic::Int => "int",
            Intrinsic::Float => "float",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_path() {
        let span = Span::default();
        let member = Expr::new(
            ExprKind::Member {
                object: Box::new(Expr::ident("Oracles", span)),
                member: "flip".into(),
            },
            span,
        );
        assert_eq!(member.as_path().as_deref(), Some("Oracles.flip"));
        assert_eq!(Expr::int(1, span).as_path(), None);
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(Builtin::from_name("CX"), Some(Builtin::Gate(StandardGate::CX)));
        assert_eq!(Builtin::from_name("measure_all"), Some(Builtin::MeasureAll));
        assert!(!Builtin::Measure.is_unitary());
        assert_eq!(Builtin::from_name("Bell"), None);
    }
}
