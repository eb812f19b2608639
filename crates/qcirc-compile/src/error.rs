//! Error types for the compilation pipeline.

use thiserror::Error;

use qcirc_ir::IrError;
use qcirc_lang::{LexError, ParseError, Span, SyntaxError};
use qcirc_qasm3::EmitError;

/// Errors found by semantic analysis.
///
/// Lowering reports operand problems that only become visible after
/// unrolling with the same variants, anchored at the originating call.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum SemanticError {
    #[error("Undeclared identifier '{name}' at {span}")]
    UndeclaredIdentifier { name: String, span: Span },

    #[error("Duplicate declaration of '{name}' at {span}")]
    DuplicateDeclaration { name: String, span: Span },

    #[error("Type mismatch at {span}: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Cannot assign to immutable binding '{name}' at {span}")]
    ImmutableAssignment { name: String, span: Span },

    #[error("Illegal operand at {span}: {message}")]
    IllegalOperand { message: String, span: Span },

    #[error("'{name}' expects {expected} arguments, found {found} at {span}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("Index {index} out of range for register '{register}' of size {size} at {span}")]
    IndexOutOfRange {
        register: String,
        index: i64,
        size: u32,
        span: Span,
    },

    #[error("Operand {operand} used twice in one operation at {span}")]
    DuplicateOperand { operand: String, span: Span },

    #[error("Loop bound around quantum operations is not known at compile time at {span}")]
    NonStaticLoopBound { span: Span },

    #[error("Condition gating quantum operations is not known at compile time at {span}")]
    NonStaticCondition { span: Span },

    #[error("Argument to inline function '{name}' is not known at compile time at {span}")]
    NonStaticArgument { name: String, span: Span },

    #[error("Recursion detected: {path} at {span}")]
    RecursionDetected { path: String, span: Span },

    #[error("'{name}' captures a local of an enclosing function at {span}")]
    ClosureCapture { name: String, span: Span },

    #[error("Modifiers cannot be applied to non-unitary '{name}' at {span}")]
    ModifierOnNonUnitary { name: String, span: Span },

    #[error("Misplaced declaration at {span}: {message}")]
    MisplacedDeclaration { message: String, span: Span },

    #[error("Misplaced return at {span}: {message}")]
    MisplacedReturn { message: String, span: Span },

    #[error("Quantum function '{name}' cannot be used as a value at {span}")]
    QuantumFunctionAsValue { name: String, span: Span },

    #[error("'{name}' is not callable at {span}")]
    NotCallable { name: String, span: Span },

    #[error("Compile-time evaluation failed at {span}: {message}")]
    Evaluation { message: String, span: Span },
}

impl SemanticError {
    /// Location of the error.
    pub fn span(&self) -> Span {
        match self {
            SemanticError::UndeclaredIdentifier { span, .. }
            | SemanticError::DuplicateDeclaration { span, .. }
            | SemanticError::TypeMismatch { span, .. }
            | SemanticError::ImmutableAssignment { span, .. }
            | SemanticError::IllegalOperand { span, .. }
            | SemanticError::ArityMismatch { span, .. }
            | SemanticError::IndexOutOfRange { span, .. }
            | SemanticError::DuplicateOperand { span, .. }
            | SemanticError::NonStaticLoopBound { span }
            | SemanticError::NonStaticCondition { span }
            | SemanticError::NonStaticArgument { span, .. }
            | SemanticError::RecursionDetected { span, .. }
            | SemanticError::ClosureCapture { span, .. }
            | SemanticError::ModifierOnNonUnitary { span, .. }
            | SemanticError::MisplacedDeclaration { span, .. }
            | SemanticError::MisplacedReturn { span, .. }
            | SemanticError::QuantumFunctionAsValue { span, .. }
            | SemanticError::NotCallable { span, .. }
            | SemanticError::Evaluation { span, .. } => *span,
        }
    }

    /// Translate an IR validation failure into the matching source error.
    pub(crate) fn from_ir(err: IrError, span: Span) -> Self {
        match err {
            IrError::DuplicateRegister(name) => SemanticError::DuplicateDeclaration { name, span },
            IrError::UnknownRegister(name) => SemanticError::UndeclaredIdentifier { name, span },
            IrError::IndexOutOfRange {
                register,
                index,
                size,
            } => SemanticError::IndexOutOfRange {
                register,
                index: i64::from(index),
                size,
                span,
            },
            IrError::DuplicateOperand { operand, .. } => SemanticError::DuplicateOperand {
                operand: operand.to_string(),
                span,
            },
            IrError::QubitCountMismatch {
                gate_name,
                expected,
                got,
            }
            | IrError::ParameterCountMismatch {
                gate_name,
                expected,
                got,
            } => SemanticError::ArityMismatch {
                name: gate_name,
                expected,
                found: got,
                span,
            },
            IrError::ModifierOnNonUnitary(name) => {
                SemanticError::ModifierOnNonUnitary { name, span }
            }
            other => SemanticError::IllegalOperand {
                message: other.to_string(),
                span,
            },
        }
    }
}

/// Faults raised while expanding a validated program.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ExpansionError {
    /// A construct analysis should have rejected reached the expander.
    #[error("Internal expansion fault at {span}: {message}")]
    Internal { message: String, span: Span },

    /// A configured limit was exceeded.
    #[error("Limit '{limit}' of {value} exceeded at {span}")]
    LimitExceeded {
        limit: &'static str,
        value: usize,
        span: Span,
    },
}

impl ExpansionError {
    pub(crate) fn internal(message: impl Into<String>, span: Span) -> Self {
        ExpansionError::Internal {
            message: message.into(),
            span,
        }
    }

    /// Location of the error.
    pub fn span(&self) -> Span {
        match self {
            ExpansionError::Internal { span, .. } | ExpansionError::LimitExceeded { span, .. } => {
                *span
            }
        }
    }
}

/// Stable classification of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lexical,
    Parse,
    Semantic,
    Expansion,
    Emit,
}

/// Any failure of [`compile`](crate::compile).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("Lexical error: {0}")]
    Lex(#[from] LexError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Semantic error: {0}")]
    Semantic(#[from] SemanticError),

    #[error("Expansion error: {0}")]
    Expansion(#[from] ExpansionError),

    #[error("Emit error: {0}")]
    Emit(#[from] EmitError),
}

impl CompileError {
    /// The stage that failed.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Lex(_) => ErrorKind::Lexical,
            CompileError::Parse(_) => ErrorKind::Parse,
            CompileError::Semantic(_) => ErrorKind::Semantic,
            CompileError::Expansion(_) => ErrorKind::Expansion,
            CompileError::Emit(_) => ErrorKind::Emit,
        }
    }

    /// Source location, when the failure has one.
    pub fn location(&self) -> Option<Span> {
        match self {
            CompileError::Lex(e) => Some(e.span),
            CompileError::Parse(e) => Some(e.span()),
            CompileError::Semantic(e) => Some(e.span()),
            CompileError::Expansion(e) => Some(e.span()),
            CompileError::Emit(_) => None,
        }
    }
}

impl From<SyntaxError> for CompileError {
    fn from(err: SyntaxError) -> Self {
        match err {
            SyntaxError::Lex(e) => CompileError::Lex(e),
            SyntaxError::Parse(e) => CompileError::Parse(e),
        }
    }
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Result type for semantic analysis.
pub type SemanticResult<T> = Result<T, SemanticError>;
