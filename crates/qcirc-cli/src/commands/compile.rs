//! Compile command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use tracing::info;

use qcirc_compile::{CompileError, CompilerConfig, analyze, compile_with, expand, lower};

use super::common::{load_source, located, write_output};
use crate::Emit;

/// Execute the compile command.
pub fn execute(
    input: &Path,
    output: Option<&Path>,
    emit: Emit,
    config_file: Option<&Path>,
) -> Result<()> {
    let config = CompilerConfig::load(config_file).context("Failed to load configuration")?;
    let source = load_source(input)?;
    info!(input = %input.display(), ?emit, "compiling");

    let content = render(&source, emit, &config).map_err(|e| match e {
        Rendered::Compile(err) => located(err, input),
        Rendered::Json(err) => anyhow::Error::new(err).context("Failed to serialize output"),
    })?;

    write_output(output, &content)?;
    if let Some(path) = output {
        eprintln!(
            "{} Compiled {} -> {}",
            style("✓").green().bold(),
            style(input.display()).green(),
            style(path.display()).green()
        );
    }
    Ok(())
}

enum Rendered {
    Compile(CompileError),
    Json(serde_json::Error),
}

impl From<CompileError> for Rendered {
    fn from(err: CompileError) -> Self {
        Rendered::Compile(err)
    }
}

impl From<serde_json::Error> for Rendered {
    fn from(err: serde_json::Error) -> Self {
        Rendered::Json(err)
    }
}

fn render(source: &str, emit: Emit, config: &CompilerConfig) -> Result<String, Rendered> {
    match emit {
        Emit::Qasm => Ok(compile_with(source, config)?),
        Emit::Ast => {
            let program = qcirc_lang::parse(source).map_err(CompileError::from)?;
            Ok(serde_json::to_string_pretty(&program)? + "\n")
        }
        Emit::Ir => {
            let program = qcirc_lang::parse(source).map_err(CompileError::from)?;
            let analyzed = analyze(program).map_err(CompileError::from)?;
            let expanded = expand(&analyzed, config)?;
            let circuit = lower(&expanded, config)?;
            Ok(circuit.to_json()? + "\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BELL: &str = "qubit[2] q\nbit[2] c\nH(q[0])\nCNot(q[0], q[1])\nmeasure_all(q, c)\n";

    #[test]
    fn test_render_formats() {
        let config = CompilerConfig::default();

        let Ok(qasm) = render(BELL, Emit::Qasm, &config) else {
            panic!("qasm failed");
        };
        assert!(qasm.starts_with("OPENQASM 3;"));

        let Ok(ir) = render(BELL, Emit::Ir, &config) else {
            panic!("ir failed");
        };
        let value: serde_json::Value = serde_json::from_str(&ir).unwrap();
        assert_eq!(value["instructions"].as_array().map(Vec::len), Some(4));

        let Ok(ast) = render(BELL, Emit::Ast, &config) else {
            panic!("ast failed");
        };
        let value: serde_json::Value = serde_json::from_str(&ast).unwrap();
        assert_eq!(value["statements"].as_array().map(Vec::len), Some(5));
    }

    #[test]
    fn test_ast_skips_analysis() {
        let config = CompilerConfig::default();
        assert!(render("H(r[0])", Emit::Ast, &config).is_ok());
        assert!(matches!(
            render("H(r[0])", Emit::Ir, &config),
            Err(Rendered::Compile(_))
        ));
    }
}
