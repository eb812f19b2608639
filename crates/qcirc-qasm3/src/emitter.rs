//! OpenQASM 3 emitter for serializing circuits.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use qcirc_ir::{Circuit, Instruction, InstructionKind, Modifier, OperandRef};

use crate::error::{EmitError, EmitResult};
use crate::table::{DEFAULT_GATE_TABLE, GateTable};

/// Largest denominator tried when rendering an angle as a fraction of `pi`.
const MAX_PI_DENOMINATOR: i64 = 16;

/// Absolute tolerance for recognizing `k*pi/d`.
const PI_TOLERANCE: f64 = 1e-10;

/// Largest multiplier `k` of `k*pi/d` that converts to an integer exactly.
const MAX_PI_MULTIPLE: f64 = 9_007_199_254_740_992.0;

/// Layout choices for the emitted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitOptions {
    /// Separate runs of measurements from other operations with a blank line.
    pub measure_spacing: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            measure_spacing: true,
        }
    }
}

/// Emit a circuit as OpenQASM 3 using the default gate table and options.
pub fn emit(circuit: &Circuit) -> EmitResult<String> {
    emit_with(circuit, &DEFAULT_GATE_TABLE, &EmitOptions::default())
}

/// Emit a circuit as OpenQASM 3 with an explicit gate table and options.
#[instrument(skip_all, fields(ops = circuit.len()))]
pub fn emit_with(circuit: &Circuit, table: &GateTable, options: &EmitOptions) -> EmitResult<String> {
    let mut emitter = Emitter::new(table, options);
    emitter.emit_circuit(circuit)?;
    debug!(bytes = emitter.output.len(), "emitted OpenQASM 3");
    Ok(emitter.output)
}

/// OpenQASM 3 emitter.
struct Emitter<'a> {
    output: String,
    table: &'a GateTable,
    options: &'a EmitOptions,
}

impl<'a> Emitter<'a> {
    fn new(table: &'a GateTable, options: &'a EmitOptions) -> Self {
        Self {
            output: String::new(),
            table,
            options,
        }
    }

    fn emit_circuit(&mut self, circuit: &Circuit) -> EmitResult<()> {
        self.writeln("OPENQASM 3;");
        self.writeln("include \"stdgates.inc\";");

        if !circuit.registers().is_empty() {
            self.writeln("");
            for reg in circuit.registers() {
                self.writeln(&format!("{}[{}] {};", reg.kind.keyword(), reg.size, reg.name));
            }
        }

        if !circuit.is_empty() {
            self.writeln("");
        }

        let mut previous_was_measure = None;
        for instruction in circuit.instructions() {
            let is_measure = instruction.is_measure();
            if self.options.measure_spacing
                && previous_was_measure.is_some_and(|prev| prev != is_measure)
            {
                self.writeln("");
            }
            self.emit_instruction(instruction)?;
            previous_was_measure = Some(is_measure);
        }

        Ok(())
    }

    fn emit_instruction(&mut self, instruction: &Instruction) -> EmitResult<()> {
        match instruction.kind {
            InstructionKind::Gate(gate) => {
                let mnemonic = self
                    .table
                    .mnemonic(gate)
                    .ok_or_else(|| EmitError::UnknownGate(gate.name().to_string()))?;
                let modifiers = emit_modifiers(&instruction.modifiers);
                let qubits = emit_operands(&instruction.qubits);

                if instruction.params.is_empty() {
                    self.writeln(&format!("{modifiers}{mnemonic} {qubits};"));
                } else {
                    let params = instruction
                        .params
                        .iter()
                        .map(|&p| emit_angle(p, gate.name()))
                        .collect::<EmitResult<Vec<_>>>()?
                        .join(", ");
                    self.writeln(&format!("{modifiers}{mnemonic}({params}) {qubits};"));
                }
            }

            InstructionKind::Measure => {
                let (Some(qubit), Some(clbit)) =
                    (instruction.qubits.first(), instruction.clbits.first())
                else {
                    return Err(EmitError::MalformedInstruction {
                        name: instruction.name().to_string(),
                        reason: "expected one qubit and one bit".into(),
                    });
                };
                self.writeln(&format!("measure {qubit} -> {clbit};"));
            }

            InstructionKind::Reset => {
                let qubits = emit_operands(&instruction.qubits);
                self.writeln(&format!("reset {qubits};"));
            }

            InstructionKind::Barrier => {
                let qubits = emit_operands(&instruction.qubits);
                if qubits.is_empty() {
                    self.writeln("barrier;");
                } else {
                    self.writeln(&format!("barrier {qubits};"));
                }
            }
        }

        Ok(())
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

fn emit_modifiers(modifiers: &[Modifier]) -> String {
    modifiers
        .iter()
        .map(|m| match m {
            Modifier::Ctrl(1) => "ctrl @ ".to_string(),
            Modifier::Ctrl(n) => format!("ctrl({n}) @ "),
            Modifier::Inv => "inv @ ".to_string(),
        })
        .collect()
}

fn emit_operands(operands: &[OperandRef]) -> String {
    operands
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render an angle, preferring an exact multiple of `pi`.
fn emit_angle(value: f64, gate: &str) -> EmitResult<String> {
    if !value.is_finite() {
        return Err(EmitError::NonFiniteParameter {
            gate: gate.to_string(),
            value,
        });
    }
    Ok(pi_fraction(value).unwrap_or_else(|| format_float(value)))
}

/// `k*pi/d` for the smallest `d <= 16`, if `value` is such a multiple.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn pi_fraction(value: f64) -> Option<String> {
    let pi = std::f64::consts::PI;
    if value == 0.0 {
        return None;
    }
    (1..=MAX_PI_DENOMINATOR).find_map(|d| {
        let k = (value * d as f64 / pi).round();
        if k == 0.0
            || k.abs() > MAX_PI_MULTIPLE
            || (value - k * pi / d as f64).abs() > PI_TOLERANCE
        {
            return None;
        }
        let k = k as i64;
        Some(match (k, d) {
            (1, 1) => "pi".to_string(),
            (-1, 1) => "-pi".to_string(),
            (k, 1) => format!("{k}*pi"),
            (1, d) => format!("pi/{d}"),
            (-1, d) => format!("-pi/{d}"),
            (k, d) => format!("{k}*pi/{d}"),
        })
    })
}

/// Shortest round-trip representation, always containing a `.`.
fn format_float(value: f64) -> String {
    let s = format!("{value}");
    if s.contains('.') { s } else { format!("{s}.0") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcirc_ir::{RegisterKind, StandardGate};
    use std::f64::consts::PI;

    fn q(i: u32) -> OperandRef {
        OperandRef::new("q", i)
    }

    #[test]
    fn test_emit_bell() {
        let circuit = Circuit::bell().unwrap();
        let qasm = emit(&circuit).unwrap();
        assert_eq!(
            qasm,
            "OPENQASM 3;\ninclude \"stdgates.inc\";\n\nqubit[2] q;\nbit[2] c;\n\nh q[0];\ncx q[0], q[1];\n\nmeasure q[0] -> c[0];\nmeasure q[1] -> c[1];\n"
        );
    }

    #[test]
    fn test_measure_spacing_disabled() {
        let circuit = Circuit::bell().unwrap();
        let options = EmitOptions {
            measure_spacing: false,
        };
        let qasm = emit_with(&circuit, &GateTable::standard(), &options).unwrap();
        assert!(qasm.contains("cx q[0], q[1];\nmeasure q[0] -> c[0];"));
    }

    #[test]
    fn test_empty_circuit_ends_with_single_newline() {
        let qasm = emit(&Circuit::new()).unwrap();
        assert_eq!(qasm, "OPENQASM 3;\ninclude \"stdgates.inc\";\n");

        let mut circuit = Circuit::new();
        circuit.add_register("q", RegisterKind::Qubit, 1).unwrap();
        let qasm = emit(&circuit).unwrap();
        assert!(qasm.ends_with("qubit[1] q;\n"));
        assert!(!qasm.ends_with("\n\n"));
    }

    #[test]
    fn test_modifiers_render_outer_to_inner() {
        let mut circuit = Circuit::new();
        circuit.add_register("q", RegisterKind::Qubit, 4).unwrap();
        let inst = Instruction::gate(StandardGate::Rx, vec![PI / 2.0], [q(0), q(1), q(2), q(3)])
            .with_modifiers(vec![Modifier::Ctrl(2), Modifier::Ctrl(1), Modifier::Inv]);
        circuit.push(inst).unwrap();

        let qasm = emit(&circuit).unwrap();
        assert!(qasm.contains("ctrl(2) @ ctrl @ inv @ rx(pi/2) q[0], q[1], q[2], q[3];"));
    }

    #[test]
    fn test_angles() {
        assert_eq!(emit_angle(PI, "rx").unwrap(), "pi");
        assert_eq!(emit_angle(-PI, "rx").unwrap(), "-pi");
        assert_eq!(emit_angle(PI / 4.0, "rx").unwrap(), "pi/4");
        assert_eq!(emit_angle(-PI / 2.0, "rx").unwrap(), "-pi/2");
        assert_eq!(emit_angle(3.0 * PI / 8.0, "rx").unwrap(), "3*pi/8");
        assert_eq!(emit_angle(2.0 * PI, "rx").unwrap(), "2*pi");
        assert_eq!(emit_angle(PI / 16.0, "rx").unwrap(), "pi/16");
        assert_eq!(emit_angle(PI / 17.0, "rx").unwrap(), format_float(PI / 17.0));
        assert_eq!(emit_angle(0.0, "rx").unwrap(), "0.0");
        assert_eq!(emit_angle(0.5, "rx").unwrap(), "0.5");
        assert_eq!(emit_angle(1.0, "rx").unwrap(), "1.0");
        assert!(emit_angle(f64::NAN, "rx").is_err());
    }

    #[test]
    fn test_large_angles_render_as_floats() {
        assert_eq!(pi_fraction(1e20), None);
        assert_eq!(emit_angle(1e20, "rx").unwrap(), "100000000000000000000.0");
        assert_eq!(emit_angle(-1e20, "rx").unwrap(), "-100000000000000000000.0");

        let huge = emit_angle(1e300, "rx").unwrap();
        assert!(!huge.contains("pi"));
        assert_eq!(huge.parse::<f64>().unwrap(), 1e300);

        assert_eq!(emit_angle(1000.0 * PI, "rx").unwrap(), "1000*pi");
    }

    #[test]
    fn test_reset_and_barrier() {
        let mut circuit = Circuit::new();
        circuit.add_register("q", RegisterKind::Qubit, 2).unwrap();
        circuit.push(Instruction::reset(q(1))).unwrap();
        circuit.push(Instruction::barrier([q(0), q(1)])).unwrap();
        let qasm = emit(&circuit).unwrap();
        assert!(qasm.ends_with("\nreset q[1];\nbarrier q[0], q[1];\n"));
    }

    #[test]
    fn test_unknown_gate_in_custom_table() {
        let circuit = Circuit::bell().unwrap();
        let err = emit_with(&circuit, &GateTable::empty(), &EmitOptions::default()).unwrap_err();
        assert_eq!(err, EmitError::UnknownGate("H".into()));
    }
}
