//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use qcirc_compile::{CompileError, ErrorKind};

/// Read a source file.
pub fn load_source(path: &Path) -> Result<String> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Write output to a file, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write file: {}", path.display())),
        None => {
            print!("{content}");
            Ok(())
        }
    }
}

/// Process exit status for a failed command.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CompileError>().map(CompileError::kind) {
        Some(ErrorKind::Lexical | ErrorKind::Parse) => 1,
        Some(ErrorKind::Semantic) => 2,
        Some(ErrorKind::Expansion | ErrorKind::Emit) => 3,
        None => 4,
    }
}

/// Attach the source path and position to a compilation error.
pub fn located(err: CompileError, path: &Path) -> anyhow::Error {
    let context = match err.location() {
        Some(span) => format!("{}:{}:{}", path.display(), span.line, span.column),
        None => path.display().to_string(),
    };
    anyhow::Error::new(err).context(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcirc_compile::{ExpansionError, SemanticError};
    use qcirc_lang::Span;

    #[test]
    fn test_exit_codes() {
        let semantic: CompileError = SemanticError::NonStaticLoopBound {
            span: Span::new(1, 1),
        }
        .into();
        assert_eq!(exit_code(&located(semantic, Path::new("a.qc"))), 2);

        let expansion: CompileError = ExpansionError::LimitExceeded {
            limit: "max_operations",
            value: 1,
            span: Span::new(1, 1),
        }
        .into();
        assert_eq!(exit_code(&anyhow::Error::new(expansion)), 3);

        let parse = qcirc_compile::compile("qubit[2 q").unwrap_err();
        assert_eq!(exit_code(&located(parse, Path::new("a.qc"))), 1);

        assert_eq!(exit_code(&anyhow::anyhow!("File not found: a.qc")), 4);
    }

    #[test]
    fn test_located_prefixes_position() {
        let err = qcirc_compile::compile("qubit q\nH(r)").unwrap_err();
        let message = format!("{:#}", located(err, Path::new("prog.qc")));
        assert!(message.starts_with("prog.qc:2:"), "{message}");
        assert!(message.contains("Undeclared identifier 'r'"));
    }
}
