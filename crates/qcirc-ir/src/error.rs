//! Error types for the IR crate.

use thiserror::Error;

use crate::register::{OperandRef, RegisterKind};

/// Errors that can occur while building a [`Circuit`](crate::Circuit).
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A register with the same name was already declared.
    #[error("Register '{0}' is already declared")]
    DuplicateRegister(String),

    /// Operand refers to a register that was never declared.
    #[error("Unknown register '{0}'")]
    UnknownRegister(String),

    /// Operand refers to a register of the wrong kind.
    #[error("Operand {operand} must be a {expected} operand{}", format_gate_context(.gate_name))]
    OperandKindMismatch {
        /// The offending operand.
        operand: OperandRef,
        /// The kind the instruction needed.
        expected: RegisterKind,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Index beyond the declared register size.
    #[error("Index {index} out of range for register '{register}' of size {size}")]
    IndexOutOfRange {
        /// Register name.
        register: String,
        /// Offending index.
        index: u32,
        /// Declared size.
        size: u32,
    },

    /// Gate applied to the wrong number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits (controls included).
        expected: usize,
        /// Actual number of qubits provided.
        got: usize,
    },

    /// Gate given the wrong number of classical parameters.
    #[error("Gate '{gate_name}' requires {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected parameter count.
        expected: usize,
        /// Actual parameter count.
        got: usize,
    },

    /// The same qubit appears twice in one operation.
    #[error("Duplicate qubit {operand} in operation{}", format_gate_context(.gate_name))]
    DuplicateOperand {
        /// The duplicate operand.
        operand: OperandRef,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Modifiers attached to an operation that is not a unitary gate.
    #[error("Modifiers cannot be applied to '{0}'")]
    ModifierOnNonUnitary(String),
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
