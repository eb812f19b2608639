//! Register and operand types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a register holds qubits or classical bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterKind {
    /// Quantum register (`qubit[n]`).
    Qubit,
    /// Classical register (`bit[n]`).
    Bit,
}

impl RegisterKind {
    /// Keyword used to declare this kind of register.
    pub fn keyword(self) -> &'static str {
        match self {
            RegisterKind::Qubit => "qubit",
            RegisterKind::Bit => "bit",
        }
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A declared register: a named, fixed-size sequence of qubits or bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Register {
    /// Register name as written in the source.
    pub name: String,
    /// Qubit or bit.
    pub kind: RegisterKind,
    /// Number of elements, fixed at declaration.
    pub size: u32,
}

impl Register {
    /// Create a new register.
    pub fn new(name: impl Into<String>, kind: RegisterKind, size: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
        }
    }

    /// Whether `index` addresses an element of this register.
    #[inline]
    pub fn contains(&self, index: u32) -> bool {
        index < self.size
    }
}

/// A concrete reference to one register element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperandRef {
    /// The register name.
    pub register: String,
    /// The element index within the register.
    pub index: u32,
}

impl OperandRef {
    /// Create a new operand reference.
    pub fn new(register: impl Into<String>, index: u32) -> Self {
        Self {
            register: register.into(),
            index,
        }
    }
}

impl fmt::Display for OperandRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}
