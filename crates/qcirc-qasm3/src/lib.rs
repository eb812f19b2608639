//! OpenQASM 3 Code Generation
//!
//! This crate renders a lowered [`Circuit`](qcirc_ir::Circuit) as OpenQASM 3
//! text. Gate names are looked up in an immutable [`GateTable`] that is
//! passed to the emitter explicitly; [`emit`] uses the shared
//! [`DEFAULT_GATE_TABLE`].
//!
//! # Example
//!
//! ```rust
//! use qcirc_ir::Circuit;
//! use qcirc_qasm3::emit;
//!
//! let circuit = Circuit::bell().unwrap();
//! let qasm = emit(&circuit).unwrap();
//!
//! assert!(qasm.starts_with("OPENQASM 3;\ninclude \"stdgates.inc\";\n"));
//! assert!(qasm.contains("cx q[0], q[1];"));
//! assert!(qasm.contains("measure q[1] -> c[1];"));
//! ```
//!
//! # Output Layout
//!
//! 1. `OPENQASM 3;` and `include "stdgates.inc";`
//! 2. A blank line, then one declaration per register in declaration order
//! 3. A blank line, then one statement per instruction
//!
//! Runs of measurements are set apart from other operations by a blank line
//! unless [`EmitOptions::measure_spacing`] is off. Angles that are `k*pi/d`
//! with `d <= 16` are written symbolically.

pub mod emitter;
pub mod error;
pub mod table;

pub use emitter::{EmitOptions, emit, emit_with};
pub use error::{EmitError, EmitResult};
pub use table::{DEFAULT_GATE_TABLE, GateTable};
