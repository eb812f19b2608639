//! Qcirc Compiler
//!
//! This crate takes a parsed Qcirc program to OpenQASM 3. It owns every stage
//! between the front end (`qcirc-lang`) and the emitter (`qcirc-qasm3`).
//!
//! # Overview
//!
//! ```text
//! Source ──► parse ──► analyze ──► expand ──► lower ──► emit
//!                        │            │          │
//!                  SymbolTable   PassManager   Circuit
//! ```
//!
//! 1. **Analysis** ([`analyze`]): name resolution, type checking, the
//!    call-graph cycle check and every rejection that does not depend on
//!    evaluated values. Each call gets its [`CallTarget`](qcirc_lang::CallTarget).
//! 2. **Expansion** ([`expand`]): inlining, loop unrolling, constant folding
//!    and modifier propagation, run as passes by a [`PassManager`].
//! 3. **Lowering** ([`lower`]): the expanded program becomes a [`Circuit`](qcirc_ir::Circuit)
//!    whose operands are concrete register elements.
//!
//! Compilation is all-or-nothing: the first error aborts with a
//! [`CompileError`] carrying the source location where one exists.
//!
//! # Example: Bell Pair
//!
//! ```rust
//! use qcirc_compile::compile;
//!
//! let source = r"
//! qubit[2] q
//! bit[2] c
//! gate Bell(a, b) {
//!     H(a)
//!     CNot(a, b)
//! }
//! Bell(q[0], q[1])
//! measure_all(q, c)
//! ";
//!
//! let qasm = compile(source).unwrap();
//! assert!(qasm.contains("h q[0];\ncx q[0], q[1];\n"));
//! assert!(qasm.ends_with("measure q[0] -> c[0];\nmeasure q[1] -> c[1];\n"));
//! ```
//!
//! # Limits
//!
//! Expansion is bounded by [`LimitsConfig`]: emitted operations, inlining
//! depth and iterations of a single loop. A program that exceeds one fails
//! with [`ExpansionError::LimitExceeded`].

pub mod analyzer;
pub mod config;
pub mod error;
pub mod eval;
pub mod expand;
pub mod lowering;
pub mod manager;
pub mod pass;
pub mod pipeline;
pub mod symbols;
pub mod types;

pub use analyzer::{AnalyzedProgram, analyze};
pub use config::{CompilerConfig, ConfigError, LimitsConfig, OutputConfig};
pub use error::{
    CompileError, CompileResult, ErrorKind, ExpansionError, SemanticError, SemanticResult,
};
pub use expand::{ExpansionContext, ExpansionStats, expand};
pub use lowering::lower;
pub use manager::PassManager;
pub use pass::{Pass, PassKind};
pub use pipeline::{Counts, Executor, RunError, compile, compile_with, run};
