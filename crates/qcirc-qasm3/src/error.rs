//! Error types for the OpenQASM 3 emitter.

use thiserror::Error;

/// Errors that can occur while emitting OpenQASM 3.
///
/// A well-formed [`Circuit`](qcirc_ir::Circuit) never triggers these; they
/// signal an internal invariant violation upstream.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EmitError {
    /// The gate table has no mnemonic for a gate.
    #[error("No OpenQASM mnemonic for gate '{0}'")]
    UnknownGate(String),

    /// A parameter is NaN or infinite.
    #[error("Gate '{gate}' has non-finite parameter {value}")]
    NonFiniteParameter {
        /// Name of the gate.
        gate: String,
        /// The offending value.
        value: f64,
    },

    /// An instruction has an operand layout the emitter cannot render.
    #[error("Malformed '{name}' instruction: {reason}")]
    MalformedInstruction {
        /// Instruction name.
        name: String,
        /// What is wrong.
        reason: String,
    },
}

/// Result type for emission.
pub type EmitResult<T> = Result<T, EmitError>;
