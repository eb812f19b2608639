//! Check command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use qcirc_compile::{CompileError, analyze};

use super::common::{load_source, located};

/// Execute the check command: parse and analyze, report what was found.
pub fn execute(input: &Path) -> Result<()> {
    let source = load_source(input)?;

    let program = qcirc_lang::parse(&source).map_err(|e| located(e.into(), input))?;
    let analyzed = analyze(program).map_err(|e| located(CompileError::from(e), input))?;

    println!(
        "{} {} is valid",
        style("✓").green().bold(),
        style(input.display()).green()
    );
    println!("  Statements: {}", analyzed.program.statements.len());
    println!("  Registers:  {}", analyzed.symbols.registers().len());
    println!("  Callables:  {}", analyzed.symbols.callables().len());
    Ok(())
}
