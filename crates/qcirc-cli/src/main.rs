//! Qcirc Command-Line Interface
//!
//! The main entry point for the `qcirc` tool.
//!
//! ```text
//! qcirc compile bell.qc                 # OpenQASM 3 on stdout
//! qcirc compile bell.qc -o bell.qasm    # ... or into a file
//! qcirc compile bell.qc --emit ir       # lowered circuit as JSON
//! qcirc check bell.qc                   # analysis only
//! ```
//!
//! Exit status: 0 on success, 1 for lexical or parse errors, 2 for semantic
//! errors, 3 for expansion or emit faults and 4 for I/O or configuration
//! failures.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{check, common, compile, version};

/// Qcirc - compile quantum circuit programs to OpenQASM 3
#[derive(Parser)]
#[command(name = "qcirc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program
    Compile {
        /// Source file
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// What to emit
        #[arg(long, value_enum, default_value_t = Emit::Qasm)]
        emit: Emit,

        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Parse and analyze a program without generating code
    Check {
        /// Source file
        input: PathBuf,
    },

    /// Show version information
    Version,
}

/// Output format of the compile command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// OpenQASM 3 text
    Qasm,
    /// The lowered circuit as JSON
    Ir,
    /// The syntax tree as JSON
    Ast,
}

fn main() {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over -v
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Compile {
            input,
            output,
            emit,
            config,
        } => compile::execute(&input, output.as_deref(), emit, config.as_deref()),

        Commands::Check { input } => check::execute(&input),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(common::exit_code(&e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compile_defaults() {
        let cli = Cli::try_parse_from(["qcirc", "compile", "bell.qc"]).unwrap();
        let Commands::Compile {
            input,
            output,
            emit,
            config,
        } = cli.command
        else {
            panic!("expected compile");
        };
        assert_eq!(input, PathBuf::from("bell.qc"));
        assert_eq!(output, None);
        assert_eq!(emit, Emit::Qasm);
        assert_eq!(config, None);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_compile_options() {
        let cli = Cli::try_parse_from([
            "qcirc", "-vv", "compile", "in.qc", "-o", "out.json", "--emit", "ir", "--config",
            "qcirc.yaml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Compile { output, emit, config, .. } = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(output, Some(PathBuf::from("out.json")));
        assert_eq!(emit, Emit::Ir);
        assert_eq!(config, Some(PathBuf::from("qcirc.yaml")));
    }

    #[test]
    fn test_parse_rejects_unknown_emit() {
        assert!(Cli::try_parse_from(["qcirc", "compile", "in.qc", "--emit", "llvm"]).is_err());
    }

    #[test]
    fn test_parse_check_and_version() {
        let cli = Cli::try_parse_from(["qcirc", "check", "in.qc", "-v"]).unwrap();
        assert!(matches!(cli.command, Commands::Check { .. }));
        assert_eq!(cli.verbose, 1);

        let cli = Cli::try_parse_from(["qcirc", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }
}
