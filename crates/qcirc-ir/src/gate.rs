//! Built-in quantum gate kinds.

use serde::{Deserialize, Serialize};

/// Standard gates with known semantics.
///
/// This is the closed set of unitary gates the source language provides as
/// built-ins. Calls are resolved to a variant once, during semantic analysis;
/// nothing downstream matches on gate names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx,
    /// Rotation around Y axis.
    Ry,
    /// Rotation around Z axis.
    Rz,
    /// Phase gate.
    P,
    /// Universal single-qubit gate U(θ, φ, λ).
    U,

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// Controlled rotation around X.
    CRx,
    /// Controlled rotation around Y.
    CRy,
    /// Controlled rotation around Z.
    CRz,
    /// Controlled phase gate.
    CP,

    // Three-qubit gates
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,
}

impl StandardGate {
    /// Every standard gate, in declaration order.
    pub const ALL: [StandardGate; 27] = [
        StandardGate::I,
        StandardGate::X,
        StandardGate::Y,
        StandardGate::Z,
        StandardGate::H,
        StandardGate::S,
        StandardGate::Sdg,
        StandardGate::T,
        StandardGate::Tdg,
        StandardGate::SX,
        StandardGate::SXdg,
        StandardGate::Rx,
        StandardGate::Ry,
        StandardGate::Rz,
        StandardGate::P,
        StandardGate::U,
        StandardGate::CX,
        StandardGate::CY,
        StandardGate::CZ,
        StandardGate::CH,
        StandardGate::Swap,
        StandardGate::CRx,
        StandardGate::CRy,
        StandardGate::CRz,
        StandardGate::CP,
        StandardGate::CCX,
        StandardGate::CSwap,
    ];

    /// Canonical source-language name of this gate.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            StandardGate::I => "I",
            StandardGate::X => "X",
            StandardGate::Y => "Y",
            StandardGate::Z => "Z",
            StandardGate::H => "H",
            StandardGate::S => "S",
            StandardGate::Sdg => "Sdg",
            StandardGate::T => "T",
            StandardGate::Tdg => "Tdg",
            StandardGate::SX => "SX",
            StandardGate::SXdg => "SXdg",
            StandardGate::Rx => "Rx",
            StandardGate::Ry => "Ry",
            StandardGate::Rz => "Rz",
            StandardGate::P => "P",
            StandardGate::U => "U",
            StandardGate::CX => "CNot",
            StandardGate::CY => "CY",
            StandardGate::CZ => "CZ",
            StandardGate::CH => "CH",
            StandardGate::Swap => "Swap",
            StandardGate::CRx => "CRx",
            StandardGate::CRy => "CRy",
            StandardGate::CRz => "CRz",
            StandardGate::CP => "CP",
            StandardGate::CCX => "CCX",
            StandardGate::CSwap => "CSwap",
        }
    }

    /// Look up a gate by its source-language name or one of its aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let gate = match name {
            "I" | "Id" => StandardGate::I,
            "X" => StandardGate::X,
            "Y" => StandardGate::Y,
            "Z" => StandardGate::Z,
            "H" => StandardGate::H,
            "S" => StandardGate::S,
            "Sdg" => StandardGate::Sdg,
            "T" => StandardGate::T,
            "Tdg" => StandardGate::Tdg,
            "SX" => StandardGate::SX,
            "SXdg" => StandardGate::SXdg,
            "Rx" => StandardGate::Rx,
            "Ry" => StandardGate::Ry,
            "Rz" => StandardGate::Rz,
            "P" | "Phase" => StandardGate::P,
            "U" => StandardGate::U,
            "CNot" | "CX" => StandardGate::CX,
            "CY" => StandardGate::CY,
            "CZ" => StandardGate::CZ,
            "CH" => StandardGate::CH,
            "Swap" => StandardGate::Swap,
            "CRx" => StandardGate::CRx,
            "CRy" => StandardGate::CRy,
            "CRz" => StandardGate::CRz,
            "CP" | "CPhase" => StandardGate::CP,
            "CCX" | "Toffoli" => StandardGate::CCX,
            "CSwap" | "Fredkin" => StandardGate::CSwap,
            _ => return None,
        };
        Some(gate)
    }

    /// Get the number of qubits this gate operates on, without modifiers.
    #[inline]
    pub fn num_qubits(self) -> usize {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::SXdg
            | StandardGate::Rx
            | StandardGate::Ry
            | StandardGate::Rz
            | StandardGate::P
            | StandardGate::U => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CRx
            | StandardGate::CRy
            | StandardGate::CRz
            | StandardGate::CP => 2,

            StandardGate::CCX | StandardGate::CSwap => 3,
        }
    }

    /// Get the number of classical angle parameters.
    #[inline]
    pub fn num_params(self) -> usize {
        match self {
            StandardGate::Rx
            | StandardGate::Ry
            | StandardGate::Rz
            | StandardGate::P
            | StandardGate::CRx
            | StandardGate::CRy
            | StandardGate::CRz
            | StandardGate::CP => 1,
            StandardGate::U => 3,
            _ => 0,
        }
    }

    /// Check if this gate takes parameters.
    pub fn is_parameterized(self) -> bool {
        self.num_params() > 0
    }
}
