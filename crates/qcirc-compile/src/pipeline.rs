//! End-to-end entry points.

use std::collections::BTreeMap;
use std::error::Error;

use thiserror::Error;
use tracing::{debug, info, instrument};

use qcirc_qasm3::{DEFAULT_GATE_TABLE, emit_with};

use crate::analyzer::analyze;
use crate::config::CompilerConfig;
use crate::error::{CompileError, CompileResult};
use crate::expand::expand;
use crate::lowering::lower;

/// Measurement histogram: bitstring to number of shots that produced it.
pub type Counts = BTreeMap<String, u64>;

/// A backend that runs OpenQASM 3 text.
pub trait Executor {
    /// Run `qasm` for `shots` shots.
    fn execute(&self, qasm: &str, shots: u32) -> Result<Counts, Box<dyn Error + Send + Sync>>;
}

/// Failure of [`run`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Execution failed: {0}")]
    Execution(#[source] Box<dyn Error + Send + Sync>),
}

/// Compile source text to OpenQASM 3 with the default configuration.
pub fn compile(source: &str) -> CompileResult<String> {
    compile_with(source, &CompilerConfig::default())
}

/// Compile source text to OpenQASM 3.
#[instrument(skip_all, fields(bytes = source.len()))]
pub fn compile_with(source: &str, config: &CompilerConfig) -> CompileResult<String> {
    let program = qcirc_lang::parse(source)?;
    debug!(statements = program.statements.len(), "parsed");

    let analyzed = analyze(program)?;
    let expanded = expand(&analyzed, config)?;
    let circuit = lower(&expanded, config)?;
    let qasm = emit_with(&circuit, &DEFAULT_GATE_TABLE, &config.emit_options())?;

    info!(operations = circuit.len(), bytes = qasm.len(), "compiled");
    Ok(qasm)
}

/// Compile `source` and hand the result to `executor`.
#[instrument(skip_all, fields(shots))]
pub fn run(source: &str, shots: u32, executor: &dyn Executor) -> Result<Counts, RunError> {
    let qasm = compile(source)?;
    let counts = executor
        .execute(&qasm, shots)
        .map_err(RunError::Execution)?;
    info!(outcomes = counts.len(), "execution finished");
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        seen: RefCell<Vec<(String, u32)>>,
    }

    impl Executor for Recorder {
        fn execute(&self, qasm: &str, shots: u32) -> Result<Counts, Box<dyn Error + Send + Sync>> {
            self.seen.borrow_mut().push((qasm.to_string(), shots));
            Ok(Counts::from([("00".to_string(), u64::from(shots))]))
        }
    }

    struct Failing;

    impl Executor for Failing {
        fn execute(&self, _qasm: &str, _shots: u32) -> Result<Counts, Box<dyn Error + Send + Sync>> {
            Err("device offline".into())
        }
    }

    #[test]
    fn test_run_passes_compiled_text() {
        let recorder = Recorder {
            seen: RefCell::new(Vec::new()),
        };
        let counts = run("qubit q\nbit c\nH(q)\nMeasure(q, c)", 100, &recorder).unwrap();
        assert_eq!(counts["00"], 100);

        let seen = recorder.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].0.contains("h q[0];"));
        assert_eq!(seen[0].1, 100);
    }

    #[test]
    fn test_run_does_not_execute_invalid_source() {
        let recorder = Recorder {
            seen: RefCell::new(Vec::new()),
        };
        let err = run("H(q[0])", 10, &recorder).unwrap_err();
        assert!(matches!(err, RunError::Compile(_)));
        assert!(recorder.seen.borrow().is_empty());
    }

    #[test]
    fn test_run_reports_executor_failure() {
        let err = run("qubit q\nX(q)", 1, &Failing).unwrap_err();
        assert!(matches!(err, RunError::Execution(_)));
        assert!(err.to_string().contains("device offline"));
    }

    #[test]
    fn test_measure_spacing_can_be_disabled() {
        let mut config = CompilerConfig::default();
        config.output.measure_spacing = false;
        let qasm = compile_with("qubit q\nbit c\nH(q)\nMeasure(q, c)", &config).unwrap();
        assert!(qasm.contains("h q[0];\nmeasure q[0] -> c[0];\n"));
    }
}
