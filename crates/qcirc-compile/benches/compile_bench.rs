//! Benchmarks for the Qcirc compilation pipeline
//!
//! Run with: cargo bench -p qcirc-compile

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qcirc_compile::{CompilerConfig, analyze, compile, expand};

const BELL: &str = "qubit[2] q
bit[2] c
gate Bell(a, b) {
    H(a)
    CNot(a, b)
}
Bell(q[0], q[1])
measure_all(q, c)
";

/// GHZ preparation on `n` qubits through a gate macro and a loop.
fn ghz_source(n: usize) -> String {
    format!(
        "qubit[{n}] q
bit[{n}] c
gate entangle(a, b) {{ CNot(a, b) }}
H(q[0])
for i in [0:{n} - 1] {{ entangle(q[i], q[i + 1]) }}
measure_all(q, c)
"
    )
}

/// Quantum Fourier transform on `n` qubits with nested loops and
/// controlled phase rotations.
fn qft_source(n: usize) -> String {
    format!(
        "qubit[{n}] q
const N = {n}
def qft() {{
    for j in [0:N] {{
        H(q[j])
        for k in [j + 1:N] {{
            ctrl P(q[k], pi / (2 ** (k - j)), q[j])
        }}
    }}
}}
qft()
"
    )
}

/// Benchmark end-to-end compilation
fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    group.bench_function("bell", |b| {
        b.iter(|| compile(black_box(BELL)).unwrap());
    });

    for n in &[8, 32, 128] {
        let source = ghz_source(*n);
        group.bench_with_input(BenchmarkId::new("ghz", n), &source, |b, source| {
            b.iter(|| compile(black_box(source)).unwrap());
        });
    }

    for n in &[4, 8, 16] {
        let source = qft_source(*n);
        group.bench_with_input(BenchmarkId::new("qft", n), &source, |b, source| {
            b.iter(|| compile(black_box(source)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark the expansion stage alone
fn bench_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand");
    let config = CompilerConfig::default();

    for n in &[8, 16] {
        let analyzed = analyze(qcirc_lang::parse(&qft_source(*n)).unwrap()).unwrap();
        group.bench_with_input(BenchmarkId::new("qft", n), &analyzed, |b, analyzed| {
            b.iter(|| expand(black_box(analyzed), &config).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_expand);
criterion_main!(benches);
