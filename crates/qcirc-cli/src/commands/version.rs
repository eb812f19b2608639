//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - quantum circuit language to OpenQASM 3",
        style("Qcirc").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qcirc-lang     Lexer, syntax tree and parser");
    println!("  qcirc-compile  Analysis, expansion and lowering");
    println!("  qcirc-ir       Circuit intermediate representation");
    println!("  qcirc-qasm3    OpenQASM 3 emitter");
    println!("  qcirc-cli      Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style(env!("CARGO_PKG_REPOSITORY")).underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
