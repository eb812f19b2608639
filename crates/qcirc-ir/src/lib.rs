//! Qcirc Circuit Intermediate Representation
//!
//! This crate provides the data structures shared by the back half of the
//! Qcirc compilation pipeline: the lowering stage produces a [`Circuit`] and
//! the OpenQASM 3 emitter consumes it.
//!
//! # Overview
//!
//! A [`Circuit`] is a flat, ordered list of [`Instruction`]s together with the
//! register facts (name, kind, size) declared by the source program. Every
//! operand is concrete: a register name plus an integer index, already
//! bounds-checked when the instruction was pushed.
//!
//! # Core Components
//!
//! - **Registers**: [`Register`], [`RegisterKind`] and [`OperandRef`]
//! - **Gates**: [`StandardGate`], the closed set of built-in gates
//! - **Modifiers**: [`Modifier`] (`ctrl(n)` / `inv`) and the composition law in
//!   [`modifier`]
//! - **Instructions**: [`Instruction`] combining an operation with its operands
//! - **Circuit**: [`Circuit`], the validated instruction sequence
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qcirc_ir::{Circuit, Instruction, OperandRef, RegisterKind, StandardGate};
//!
//! let mut circuit = Circuit::new();
//! circuit.add_register("q", RegisterKind::Qubit, 2).unwrap();
//! circuit.add_register("c", RegisterKind::Bit, 2).unwrap();
//!
//! circuit
//!     .push(Instruction::gate(StandardGate::H, vec![], [OperandRef::new("q", 0)]))
//!     .unwrap();
//! circuit
//!     .push(Instruction::gate(
//!         StandardGate::CX,
//!         vec![],
//!         [OperandRef::new("q", 0), OperandRef::new("q", 1)],
//!     ))
//!     .unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.len(), 2);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod modifier;
pub mod register;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use modifier::Modifier;
pub use register::{OperandRef, Register, RegisterKind};
