//! Lowering of an expanded program to a [`Circuit`].
//!
//! Register declarations become register facts in declaration order and
//! every built-in call becomes one instruction, except `measure_all`, which
//! becomes one measurement per index. Operands are checked again here since
//! unrolling may have produced indices the analyzer could not see.

use rustc_hash::FxHashMap;
use tracing::{info, instrument};

use qcirc_ir::modifier::{canonicalize, control_count};
use qcirc_ir::{Circuit, Instruction, OperandRef, RegisterKind};
use qcirc_lang::ast::{ArrayExpr, Builtin, StmtKind};
use qcirc_lang::{CallExpr, CallTarget, Expr, ExprKind, Program, Span};

use crate::config::CompilerConfig;
use crate::error::{CompileResult, ExpansionError, SemanticError};

/// Lower an expanded program.
#[instrument(skip_all, fields(statements = program.statements.len()))]
pub fn lower(program: &Program, config: &CompilerConfig) -> CompileResult<Circuit> {
    let mut lowerer = Lowerer {
        circuit: Circuit::new(),
        sizes: FxHashMap::default(),
        max_operations: config.limits.max_operations,
    };

    for stmt in &program.statements {
        match &stmt.kind {
            StmtKind::QuantumDecl { kind, size, name } => {
                lowerer
                    .circuit
                    .add_register(name.clone(), *kind, *size)
                    .map_err(|e| SemanticError::from_ir(e, stmt.span))?;
                lowerer.sizes.insert(name.clone(), *size);
            }
            StmtKind::Expr(expr) => match expr.as_call() {
                Some(call) => lowerer.lower_call(call, expr.span)?,
                None => return Err(ExpansionError::internal("expression left after expansion", expr.span).into()),
            },
            _ => {
                return Err(ExpansionError::internal("statement left after expansion", stmt.span).into());
            }
        }
    }

    info!(
        registers = lowerer.circuit.registers().len(),
        instructions = lowerer.circuit.len(),
        "lowered program"
    );
    Ok(lowerer.circuit)
}

struct Lowerer {
    circuit: Circuit,
    sizes: FxHashMap<String, u32>,
    max_operations: usize,
}

impl Lowerer {
    fn lower_call(&mut self, call: &CallExpr, span: Span) -> CompileResult<()> {
        let Some(CallTarget::Builtin(builtin)) = call.target else {
            return Err(ExpansionError::internal(
                format!("call to '{}' left after expansion", call.callee),
                span,
            )
            .into());
        };

        match builtin {
            Builtin::Gate(gate) => {
                let controls = control_count(&call.modifiers);
                let num_params = gate.num_params();
                if call.args.len() != controls + num_params + gate.num_qubits() {
                    return Err(SemanticError::ArityMismatch {
                        name: call.callee.clone(),
                        expected: controls + num_params + gate.num_qubits(),
                        found: call.args.len(),
                        span,
                    }
                    .into());
                }

                let mut qubits = Vec::with_capacity(controls + gate.num_qubits());
                let mut params = Vec::with_capacity(num_params);
                for (i, arg) in call.args.iter().enumerate() {
                    if (controls..controls + num_params).contains(&i) {
                        params.push(literal(arg)?);
                    } else {
                        qubits.push(self.single(arg, RegisterKind::Qubit)?);
                    }
                }
                let instruction =
                    Instruction::gate(gate, params, qubits).with_modifiers(canonicalize(&call.modifiers));
                self.push(instruction, span)
            }

            Builtin::Measure => {
                let [qubit, bit] = call.args.as_slice() else {
                    return Err(arity(call, 2, span));
                };
                let qubit = self.single(qubit, RegisterKind::Qubit)?;
                let bit = self.single(bit, RegisterKind::Bit)?;
                self.push(Instruction::measure(qubit, bit), span)
            }

            Builtin::Reset => {
                let [qubit] = call.args.as_slice() else {
                    return Err(arity(call, 1, span));
                };
                let qubit = self.single(qubit, RegisterKind::Qubit)?;
                self.push(Instruction::reset(qubit), span)
            }

            Builtin::Barrier => {
                let mut qubits = Vec::new();
                for arg in &call.args {
                    qubits.extend(self.operands(arg)?);
                }
                self.push(Instruction::barrier(qubits), span)
            }

            Builtin::MeasureAll => {
                let [qubits, bits] = call.args.as_slice() else {
                    return Err(arity(call, 2, span));
                };
                let qubits = self.operands(qubits)?;
                let bits = self.operands(bits)?;
                if qubits.len() != bits.len() {
                    return Err(SemanticError::IllegalOperand {
                        message: format!(
                            "measure_all needs registers of equal size, found {} qubits and {} bits",
                            qubits.len(),
                            bits.len()
                        ),
                        span,
                    }
                    .into());
                }
                for (qubit, bit) in qubits.into_iter().zip(bits) {
                    self.push(Instruction::measure(qubit, bit), span)?;
                }
                Ok(())
            }
        }
    }

    fn push(&mut self, instruction: Instruction, span: Span) -> CompileResult<()> {
        self.circuit
            .push(instruction)
            .map_err(|e| SemanticError::from_ir(e, span))?;
        if self.circuit.len() > self.max_operations {
            return Err(ExpansionError::LimitExceeded {
                limit: "max_operations",
                value: self.max_operations,
                span,
            }
            .into());
        }
        Ok(())
    }

    /// Every element an operand expression denotes, in order.
    fn operands(&self, expr: &Expr) -> CompileResult<Vec<OperandRef>> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Ident(name) => {
                let size = self.size(name, span)?;
                Ok((0..size).map(|i| OperandRef::new(name.clone(), i)).collect())
            }
            ExprKind::Index { base, index } => {
                let (ExprKind::Ident(name), ExprKind::Int(index)) = (&base.kind, &index.kind) else {
                    return Err(ExpansionError::internal("operand index was not folded", span).into());
                };
                let size = self.size(name, span)?;
                let index = u32::try_from(*index).map_err(|_| SemanticError::IndexOutOfRange {
                    register: name.clone(),
                    index: *index,
                    size,
                    span,
                })?;
                Ok(vec![OperandRef::new(name.clone(), index)])
            }
            ExprKind::Array(ArrayExpr::List(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.extend(self.operands(item)?);
                }
                Ok(out)
            }
            _ => Err(ExpansionError::internal("operand was not folded", span).into()),
        }
    }

    /// The one element an operand expression denotes.
    fn single(&self, expr: &Expr, kind: RegisterKind) -> CompileResult<OperandRef> {
        let mut operands = self.operands(expr)?;
        if operands.len() != 1 {
            let message = match &expr.kind {
                ExprKind::Ident(name) => format!(
                    "register '{name}' of size {} cannot be used as a single {kind}",
                    operands.len()
                ),
                _ => format!("expected a single {kind}, found {} operands", operands.len()),
            };
            return Err(SemanticError::IllegalOperand {
                message,
                span: expr.span,
            }
            .into());
        }
        Ok(operands.remove(0))
    }

    fn size(&self, name: &str, span: Span) -> CompileResult<u32> {
        self.sizes.get(name).copied().ok_or_else(|| {
            SemanticError::UndeclaredIdentifier {
                name: name.to_string(),
                span,
            }
            .into()
        })
    }
}

/// A folded gate parameter.
#[allow(clippy::cast_precision_loss)]
fn literal(expr: &Expr) -> CompileResult<f64> {
    match expr.kind {
        ExprKind::Int(v) => Ok(v as f64),
        ExprKind::Float(v) => Ok(v),
        _ => Err(ExpansionError::internal("gate parameter was not folded", expr.span).into()),
    }
}

fn arity(call: &CallExpr, expected: usize, span: Span) -> crate::error::CompileError {
    SemanticError::ArityMismatch {
        name: call.callee.clone(),
        expected,
        found: call.args.len(),
        span,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::expand::test_util::expand_source;
    use qcirc_ir::{InstructionKind, Modifier, StandardGate};

    fn lower_source(source: &str) -> CompileResult<Circuit> {
        lower(&expand_source(source), &CompilerConfig::default())
    }

    #[test]
    fn test_bell_lowering() {
        let circuit = lower_source(
            "qubit[2] q\nbit[2] c\ngate Bell(a, b) { H(a); CNot(a, b) }\nBell(q[0], q[1])\nmeasure_all(q, c)",
        )
        .unwrap();
        assert_eq!(circuit.registers().len(), 2);
        assert_eq!(circuit.len(), 4);
        assert_eq!(circuit.instructions()[1].kind, InstructionKind::Gate(StandardGate::CX));
        assert_eq!(circuit.instructions()[3].clbits, vec![OperandRef::new("c", 1)]);
    }

    #[test]
    fn test_size_one_register_is_a_qubit() {
        let circuit = lower_source("qubit q\nqubit[2] r\nH(q)\nBarrier(q, r)").unwrap();
        assert_eq!(circuit.instructions()[0].qubits, vec![OperandRef::new("q", 0)]);
        assert_eq!(circuit.instructions()[1].qubits.len(), 3);
    }

    #[test]
    fn test_modifiers_are_canonical() {
        let circuit = lower_source("qubit[2] q\ninv ctrl X(q[0], q[1])").unwrap();
        assert_eq!(
            circuit.instructions()[0].modifiers,
            vec![Modifier::Ctrl(1), Modifier::Inv]
        );
    }

    #[test]
    fn test_unrolled_index_out_of_range() {
        let err = lower_source("qubit[2] q\nfor i in [0:3] { H(q[i]) }").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Semantic(SemanticError::IndexOutOfRange { index: 2, size: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_operand() {
        let err = lower_source("qubit[2] q\nfor i in [0:1] { CNot(q[i], q[0]) }").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Semantic(SemanticError::DuplicateOperand { .. })
        ));
    }

    #[test]
    fn test_operation_limit() {
        let analyzed = crate::analyzer::analyze(
            qcirc_lang::parse("qubit q\nfor i in [0:10] { X(q) }").unwrap(),
        )
        .unwrap();
        let mut config = CompilerConfig::default();
        config.limits.max_operations = 5;
        let err = crate::expand::expand(&analyzed, &config).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Expansion(ExpansionError::LimitExceeded {
                limit: "max_operations",
                ..
            })
        ));
    }
}
