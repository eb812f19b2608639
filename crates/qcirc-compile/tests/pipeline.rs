//! End-to-end tests: source text in, OpenQASM 3 out.

use qcirc_compile::{
    CompileError, CompilerConfig, ErrorKind, ExpansionError, SemanticError, compile, compile_with,
};

const BELL_QASM: &str = "OPENQASM 3;
include \"stdgates.inc\";

qubit[2] q;
bit[2] c;

h q[0];
cx q[0], q[1];

measure q[0] -> c[0];
measure q[1] -> c[1];
";

/// Helper: the statement lines after the header and declarations.
fn body(qasm: &str) -> Vec<&str> {
    qasm.lines()
        .skip(2)
        .filter(|line| {
            !line.is_empty() && !line.starts_with("qubit") && !line.starts_with("bit")
        })
        .collect()
}

fn semantic(source: &str) -> SemanticError {
    match compile(source) {
        Err(CompileError::Semantic(err)) => err,
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_bell_pair_renders_exactly() {
    let source = "qubit[2] q
bit[2] c
gate Bell(a, b) {
    H(a)
    CNot(a, b)
}
Bell(q[0], q[1])
measure_all(q, c)
";
    assert_eq!(compile(source).unwrap(), BELL_QASM);
}

#[test]
fn test_inlining_matches_manual_expansion() {
    let with_macro = compile(
        "qubit[3] q
gate ghz_step(a, b) { CNot(a, b) }
def prepare(n: int) {
    H(q[0])
    for i in [0:n - 1] { ghz_step(q[i], q[i + 1]) }
}
prepare(3)",
    )
    .unwrap();
    let manual = compile("qubit[3] q\nH(q[0])\nCNot(q[0], q[1])\nCNot(q[1], q[2])").unwrap();
    assert_eq!(with_macro, manual);
}

#[test]
fn test_loop_unrolls_in_order() {
    let qasm = compile("qubit[4] q\nconst N = 4\nfor i in [0:N] { X(q[i]) }").unwrap();
    assert_eq!(body(&qasm), vec!["x q[0];", "x q[1];", "x q[2];", "x q[3];"]);
}

#[test]
fn test_modifiers_render_outer_to_inner() {
    let qasm = compile(
        "qubit[3] q
gate t(a) { T(a) }
inv inv t(q[0])
ctrl ctrl X(q[0], q[1], q[2])
ctrl[2] inv S(q[0], q[1], q[2])",
    )
    .unwrap();
    assert_eq!(
        body(&qasm),
        vec![
            "t q[0];",
            "ctrl @ ctrl @ x q[0], q[1], q[2];",
            "ctrl(2) @ inv @ s q[0], q[1], q[2];",
        ]
    );
}

#[test]
fn test_inverted_macro_reverses_body() {
    let qasm = compile("qubit[2] q\ngate Bell(a, b) { H(a); CNot(a, b) }\nBell(q[0], q[1])†").unwrap();
    assert_eq!(body(&qasm), vec!["inv @ cx q[0], q[1];", "inv @ h q[0];"]);
}

#[test]
fn test_parameters_render_symbolically() {
    let qasm = compile("qubit q\nRx(pi / 2, q)\nRz(0.25, q)").unwrap();
    assert_eq!(body(&qasm), vec!["rx(pi/2) q[0];", "rz(0.25) q[0];"]);
}

#[test]
fn test_class_members_and_conditions() {
    let qasm = compile(
        "qubit[2] q
class Oracle {
    const MARKED = 1
    gate mark(a) { Z(a) }
}
for i in [0:2] {
    if i == Oracle.MARKED { Oracle.mark(q[i]) } else { H(q[i]) }
}",
    )
    .unwrap();
    assert_eq!(body(&qasm), vec!["h q[0];", "z q[1];"]);
}

// ============================================================================
// Rejections
// ============================================================================

#[test]
fn test_rejects_controlled_measurement() {
    let err = semantic("qubit[2] q\nbit[2] c\nctrl Measure(q[0], q[1], c[0])");
    assert!(matches!(err, SemanticError::ModifierOnNonUnitary { .. }));

    let err = semantic("qubit[2] q\nbit[2] c\nctrl Measure(q[0], c[0])");
    assert!(matches!(err, SemanticError::ModifierOnNonUnitary { .. }));
}

#[test]
fn test_rejects_float_to_int_overflow() {
    let err = semantic("qubit q\nconst K = int(9223372036854775808.0)\nX(q)");
    assert!(matches!(err, SemanticError::Evaluation { .. }));

    assert!(compile("qubit q\nconst K = int(-9223372036854775808.0)\nX(q)").is_ok());
}

#[test]
fn test_rejects_dynamic_loop_bound() {
    let err = semantic("qubit[4] q\nvar n = 4\nfor i in [0:n] { H(q[i]) }");
    assert!(matches!(err, SemanticError::NonStaticLoopBound { .. }));
}

#[test]
fn test_rejects_undeclared_identifier() {
    let err = semantic("qubit q\nH(r)");
    assert!(matches!(err, SemanticError::UndeclaredIdentifier { ref name, .. } if name == "r"));
}

#[test]
fn test_rejects_recursive_gate_macro() {
    let err = semantic("qubit q\ngate loop_(a) { loop_(a) }\nloop_(q)");
    assert!(matches!(err, SemanticError::RecursionDetected { .. }));
}

#[test]
fn test_rejects_index_past_register_size() {
    let err = compile("qubit[2] q\nH(q[2])").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Semantic);
    assert_eq!(err.location().map(|s| s.line), Some(2));
}

#[test]
fn test_syntax_errors_are_classified() {
    assert_eq!(compile("qubit q\nH(q) $").unwrap_err().kind(), ErrorKind::Lexical);
    assert_eq!(compile("qubit[2 q").unwrap_err().kind(), ErrorKind::Parse);
}

// ============================================================================
// Limits
// ============================================================================

#[test]
fn test_operation_limit() {
    let mut config = CompilerConfig::default();
    config.limits.max_operations = 10;
    let err = compile_with("qubit q\nfor i in [0:11] { X(q) }", &config).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Expansion(ExpansionError::LimitExceeded {
            limit: "max_operations",
            ..
        })
    ));
    assert!(compile_with("qubit q\nfor i in [0:10] { X(q) }", &config).is_ok());
}

#[test]
fn test_operation_limit_bounds_inlining() {
    let mut source = String::from("qubit q\ngate g0(a) { X(a) }\n");
    for i in 1..=26 {
        source.push_str(&format!("gate g{i}(a) {{ g{}(a); g{}(a) }}\n", i - 1, i - 1));
    }
    source.push_str("g26(q)");

    let mut config = CompilerConfig::default();
    config.limits.max_operations = 10_000;
    let err = compile_with(&source, &config).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Expansion(ExpansionError::LimitExceeded {
            limit: "max_operations",
            ..
        })
    ));
    assert_eq!(err.kind(), ErrorKind::Expansion);
}

#[test]
fn test_nested_loops_share_iteration_budget() {
    let source = "qubit q
var k = 0
for i in [0:100000] { for j in [0:100000] { for m in [0:100000] { k += 1 } } }
X(q)";
    let mut config = CompilerConfig::default();
    config.limits.max_total_iterations = 300_000;
    let err = compile_with(source, &config).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Expansion(ExpansionError::LimitExceeded {
            limit: "max_total_iterations",
            ..
        })
    ));

    config.limits.max_total_iterations = 1000;
    let nested = "qubit[4] q\nfor i in [0:4] { for j in [0:4] { X(q[j]) } }";
    assert!(compile_with(nested, &config).is_ok());
    config.limits.max_loop_iterations = 4;
    config.limits.max_total_iterations = 19;
    assert!(compile_with(nested, &config).is_err());
}

#[test]
fn test_loop_iteration_limit() {
    let mut config = CompilerConfig::default();
    config.limits.max_loop_iterations = 100;
    let err = compile_with("qubit q\nfor i in [0:1000] { X(q) }", &config).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Expansion(ExpansionError::LimitExceeded {
            limit: "max_loop_iterations",
            ..
        })
    ));
}

#[test]
fn test_inline_depth_limit() {
    let mut config = CompilerConfig::default();
    config.limits.max_inline_depth = 2;
    let source = "qubit q
gate a(x) { X(x) }
gate b(x) { a(x) }
gate c(x) { b(x) }
c(q)";
    let err = compile_with(source, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Expansion);
    assert!(compile(source).is_ok());
}
