//! Circuit instructions combining operations with operands.

use serde::{Deserialize, Serialize};

use crate::gate::StandardGate;
use crate::modifier::Modifier;
use crate::register::OperandRef;

/// The kind of instruction in a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A unitary gate operation.
    Gate(StandardGate),
    /// Measurement of one qubit into one bit.
    Measure,
    /// Reset qubit to |0⟩.
    Reset,
    /// Barrier (synchronization point).
    Barrier,
}

impl InstructionKind {
    /// Source-level name of the operation.
    pub fn name(self) -> &'static str {
        match self {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure => "Measure",
            InstructionKind::Reset => "Reset",
            InstructionKind::Barrier => "Barrier",
        }
    }

    /// Whether modifiers may be attached to this kind.
    #[inline]
    pub fn is_unitary(self) -> bool {
        matches!(self, InstructionKind::Gate(_))
    }
}

/// A complete instruction with operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Evaluated classical parameters (angles), in signature order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<f64>,
    /// Qubits this instruction operates on; control qubits come first.
    pub qubits: Vec<OperandRef>,
    /// Classical bits this instruction writes (for measure).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clbits: Vec<OperandRef>,
    /// Canonical modifier list, outer-to-inner.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn gate(
        gate: StandardGate,
        params: Vec<f64>,
        qubits: impl IntoIterator<Item = OperandRef>,
    ) -> Self {
        Self {
            kind: InstructionKind::Gate(gate),
            params,
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
            modifiers: vec![],
        }
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: OperandRef, clbit: OperandRef) -> Self {
        Self {
            kind: InstructionKind::Measure,
            params: vec![],
            qubits: vec![qubit],
            clbits: vec![clbit],
            modifiers: vec![],
        }
    }

    /// Create a reset instruction.
    pub fn reset(qubit: OperandRef) -> Self {
        Self {
            kind: InstructionKind::Reset,
            params: vec![],
            qubits: vec![qubit],
            clbits: vec![],
            modifiers: vec![],
        }
    }

    /// Create a barrier instruction.
    pub fn barrier(qubits: impl IntoIterator<Item = OperandRef>) -> Self {
        Self {
            kind: InstructionKind::Barrier,
            params: vec![],
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
            modifiers: vec![],
        }
    }

    /// Attach a modifier list.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Get the name of this instruction.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_instruction() {
        let inst = Instruction::gate(StandardGate::CX, vec![], [
            OperandRef::new("q", 0),
            OperandRef::new("q", 1),
        ]);
        assert!(inst.is_gate());
        assert_eq!(inst.name(), "CNot");
        assert_eq!(inst.qubits.len(), 2);
    }

    #[test]
    fn test_measure_instruction() {
        let inst = Instruction::measure(OperandRef::new("q", 0), OperandRef::new("c", 0));
        assert!(inst.is_measure());
        assert!(!inst.kind.is_unitary());
        assert_eq!(inst.clbits, vec![OperandRef::new("c", 0)]);
    }
}
