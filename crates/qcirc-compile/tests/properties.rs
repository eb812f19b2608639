//! Property-based tests for the compiler.
//!
//! Compilation must be deterministic and loop unrolling must produce one
//! statement per iteration, in iteration order.

use proptest::prelude::*;
use qcirc_compile::compile;

/// Gate calls on a register of `size` qubits.
fn arb_call(size: u32) -> impl Strategy<Value = String> {
    let single = (prop::sample::select(vec!["H", "X", "Y", "Z", "S", "T"]), 0..size)
        .prop_map(|(gate, q)| format!("{gate}(r[{q}])"));
    let rotation = (prop::sample::select(vec!["Rx", "Ry", "Rz"]), -8_i32..=8, 0..size)
        .prop_map(|(gate, k, q)| format!("{gate}({k} * pi / 4, r[{q}])"));
    let pair = (0..size, 1..size).prop_map(move |(a, offset)| {
        let b = (a + offset) % size;
        format!("CNot(r[{a}], r[{b}])")
    });
    prop_oneof![single, rotation, pair]
}

fn arb_program() -> impl Strategy<Value = String> {
    (2_u32..=5).prop_flat_map(|size| {
        prop::collection::vec(arb_call(size), 1..=12).prop_map(move |calls| {
            format!(
                "qubit[{size}] q\nbit[{size}] c\ngate body(r: qubit[]) {{\n{}\n}}\nbody(q)\nmeasure_all(q, c)\n",
                calls.join("\n")
            )
        })
    })
}

proptest! {
    #[test]
    fn compilation_is_deterministic(source in arb_program()) {
        let first = compile(&source).unwrap();
        let second = compile(&source).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn unrolling_emits_one_statement_per_iteration(n in 1_i64..40) {
        let source = format!("qubit[40] q\nfor i in [0:{n}] {{ H(q[i]) }}");
        let qasm = compile(&source).unwrap();
        let lines: Vec<&str> = qasm.lines().filter(|l| l.starts_with("h ")).collect();
        prop_assert_eq!(lines.len() as i64, n);
        for (i, line) in lines.iter().enumerate() {
            prop_assert_eq!(*line, format!("h q[{i}];"));
        }
    }

    #[test]
    fn double_inverse_is_identity(k in -8_i32..=8) {
        let plain = compile(&format!("qubit q\nRz({k} * pi / 4, q)")).unwrap();
        let inverted = compile(&format!("qubit q\ninv inv Rz({k} * pi / 4, q)")).unwrap();
        prop_assert_eq!(plain, inverted);
    }
}
