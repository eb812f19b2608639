//! The lowered circuit: register facts plus a validated instruction sequence.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::modifier::{self, Modifier};
use crate::register::{OperandRef, Register, RegisterKind};

/// A quantum circuit in linear form.
///
/// Registers keep their declaration order and instructions keep program
/// order; both orders are part of the output contract. Every instruction is
/// validated against the declared registers when it is pushed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Registers in declaration order.
    registers: Vec<Register>,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the two-qubit Bell circuit with measurements.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::new();
        circuit.add_register("q", RegisterKind::Qubit, 2)?;
        circuit.add_register("c", RegisterKind::Bit, 2)?;
        circuit.h(OperandRef::new("q", 0))?;
        circuit.cx(OperandRef::new("q", 0), OperandRef::new("q", 1))?;
        circuit.measure(OperandRef::new("q", 0), OperandRef::new("c", 0))?;
        circuit.measure(OperandRef::new("q", 1), OperandRef::new("c", 1))?;
        Ok(circuit)
    }

    /// Declare a register.
    pub fn add_register(
        &mut self,
        name: impl Into<String>,
        kind: RegisterKind,
        size: u32,
    ) -> IrResult<&mut Self> {
        let name = name.into();
        if self.register(&name).is_some() {
            return Err(IrError::DuplicateRegister(name));
        }
        self.registers.push(Register::new(name, kind, size));
        Ok(self)
    }

    /// Look up a register by name.
    pub fn register(&self, name: &str) -> Option<&Register> {
        self.registers.iter().find(|r| r.name == name)
    }

    /// Registers in declaration order.
    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Total number of declared qubits.
    pub fn num_qubits(&self) -> usize {
        self.count(RegisterKind::Qubit)
    }

    /// Total number of declared classical bits.
    pub fn num_clbits(&self) -> usize {
        self.count(RegisterKind::Bit)
    }

    fn count(&self, kind: RegisterKind) -> usize {
        self.registers
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.size as usize)
            .sum()
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if the circuit has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Validate and append an instruction.
    pub fn push(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.validate(&instruction)?;
        self.instructions.push(instruction);
        Ok(self)
    }

    // =========================================================================
    // Convenience builders
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: OperandRef) -> IrResult<&mut Self> {
        self.push(Instruction::gate(StandardGate::H, vec![], [qubit]))
    }

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: OperandRef, target: OperandRef) -> IrResult<&mut Self> {
        self.push(Instruction::gate(StandardGate::CX, vec![], [control, target]))
    }

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: OperandRef, clbit: OperandRef) -> IrResult<&mut Self> {
        self.push(Instruction::measure(qubit, clbit))
    }

    /// Serialize the circuit as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn validate(&self, inst: &Instruction) -> IrResult<()> {
        let gate_name = Some(inst.name().to_string());

        if !inst.modifiers.is_empty() && !inst.kind.is_unitary() {
            return Err(IrError::ModifierOnNonUnitary(inst.name().to_string()));
        }

        for q in &inst.qubits {
            self.check_operand(q, RegisterKind::Qubit, &gate_name)?;
        }
        for c in &inst.clbits {
            self.check_operand(c, RegisterKind::Bit, &gate_name)?;
        }

        let mut seen = FxHashSet::default();
        for q in &inst.qubits {
            if !seen.insert(q) {
                return Err(IrError::DuplicateOperand {
                    operand: q.clone(),
                    gate_name,
                });
            }
        }

        match inst.kind {
            InstructionKind::Gate(gate) => {
                let expected = gate.num_qubits() + modifier::control_count(&inst.modifiers);
                if inst.modifiers.contains(&Modifier::Ctrl(0)) {
                    return Err(IrError::QubitCountMismatch {
                        gate_name: gate.name().to_string(),
                        expected,
                        got: inst.qubits.len(),
                    });
                }
                check_count(&inst.qubits, expected, gate.name())?;
                if inst.params.len() != gate.num_params() {
                    return Err(IrError::ParameterCountMismatch {
                        gate_name: gate.name().to_string(),
                        expected: gate.num_params(),
                        got: inst.params.len(),
                    });
                }
            }
            InstructionKind::Measure => {
                check_count(&inst.qubits, 1, "Measure")?;
                check_count(&inst.clbits, 1, "Measure")?;
            }
            InstructionKind::Reset => check_count(&inst.qubits, 1, "Reset")?,
            InstructionKind::Barrier => {}
        }
        Ok(())
    }

    #[allow(clippy::ref_option)]
    fn check_operand(
        &self,
        operand: &OperandRef,
        expected: RegisterKind,
        gate_name: &Option<String>,
    ) -> IrResult<()> {
        let reg = self
            .register(&operand.register)
            .ok_or_else(|| IrError::UnknownRegister(operand.register.clone()))?;
        if reg.kind != expected {
            return Err(IrError::OperandKindMismatch {
                operand: operand.clone(),
                expected,
                gate_name: gate_name.clone(),
            });
        }
        if !reg.contains(operand.index) {
            return Err(IrError::IndexOutOfRange {
                register: reg.name.clone(),
                index: operand.index,
                size: reg.size,
            });
        }
        Ok(())
    }
}

fn check_count(operands: &[OperandRef], expected: usize, gate: &str) -> IrResult<()> {
    if operands.len() == expected {
        Ok(())
    } else {
        Err(IrError::QubitCountMismatch {
            gate_name: gate.into(),
            expected,
            got: operands.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(i: u32) -> OperandRef {
        OperandRef::new("q", i)
    }

    #[test]
    fn test_bell() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.len(), 4);
        assert_eq!(circuit.registers()[0].name, "q");
    }

    #[test]
    fn test_duplicate_register() {
        let mut circuit = Circuit::new();
        circuit.add_register("q", RegisterKind::Qubit, 1).unwrap();
        let err = circuit.add_register("q", RegisterKind::Bit, 1).unwrap_err();
        assert_eq!(err, IrError::DuplicateRegister("q".into()));
    }

    #[test]
    fn test_index_out_of_range() {
        let mut circuit = Circuit::new();
        circuit.add_register("q", RegisterKind::Qubit, 2).unwrap();
        let err = circuit.h(q(2)).unwrap_err();
        assert!(matches!(err, IrError::IndexOutOfRange { index: 2, size: 2, .. }));
    }

    #[test]
    fn test_duplicate_operand() {
        let mut circuit = Circuit::new();
        circuit.add_register("q", RegisterKind::Qubit, 2).unwrap();
        let err = circuit.cx(q(0), q(0)).unwrap_err();
        assert!(matches!(err, IrError::DuplicateOperand { .. }));
    }

    #[test]
    fn test_controls_extend_arity() {
        let mut circuit = Circuit::new();
        circuit.add_register("q", RegisterKind::Qubit, 3).unwrap();
        let inst = Instruction::gate(StandardGate::X, vec![], [q(0), q(1)])
            .with_modifiers(vec![Modifier::Ctrl(1)]);
        circuit.push(inst).unwrap();

        let bad = Instruction::gate(StandardGate::X, vec![], [q(0)])
            .with_modifiers(vec![Modifier::Ctrl(1)]);
        assert!(matches!(
            circuit.push(bad).unwrap_err(),
            IrError::QubitCountMismatch { expected: 2, got: 1, .. }
        ));
    }

    #[test]
    fn test_measure_needs_bit_register() {
        let mut circuit = Circuit::new();
        circuit.add_register("q", RegisterKind::Qubit, 1).unwrap();
        let err = circuit.measure(q(0), q(0)).unwrap_err();
        assert!(matches!(err, IrError::OperandKindMismatch { expected: RegisterKind::Bit, .. }));
    }

    #[test]
    fn test_modifier_on_measure_rejected() {
        let mut circuit = Circuit::new();
        circuit.add_register("q", RegisterKind::Qubit, 1).unwrap();
        circuit.add_register("c", RegisterKind::Bit, 1).unwrap();
        let inst = Instruction::measure(q(0), OperandRef::new("c", 0))
            .with_modifiers(vec![Modifier::Inv]);
        assert!(matches!(
            circuit.push(inst).unwrap_err(),
            IrError::ModifierOnNonUnitary(_)
        ));
    }
}
