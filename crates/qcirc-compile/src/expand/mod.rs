//! Compile-time expansion.
//!
//! Expansion turns a validated program into a flat list of register
//! declarations and built-in quantum calls whose arguments are literals.
//! It runs as a sequence of passes under a [`PassManager`]:
//!
//! 1. [`InlineCalls`] replaces every quantum function and gate-macro call
//!    with its body. Calls with modifiers become modifier scopes.
//! 2. [`UnrollLoops`] evaluates classical code, unrolls loops, selects
//!    branches and folds call arguments to literals.
//! 3. [`PropagateModifiers`] flattens modifier scopes onto the calls inside.
//! 4. [`VerifyExpanded`] checks that nothing else is left.

mod inline;
mod modifiers;
mod unroll;
mod verify;

pub use inline::InlineCalls;
pub use modifiers::PropagateModifiers;
pub use unroll::UnrollLoops;
pub use verify::VerifyExpanded;

use tracing::instrument;

use qcirc_lang::Program;

use crate::analyzer::AnalyzedProgram;
use crate::config::{CompilerConfig, LimitsConfig};
use crate::error::CompileResult;
use crate::manager::PassManager;
use crate::symbols::SymbolTable;

/// Counters collected while expanding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    /// Function and gate-macro calls replaced by their bodies.
    pub inlined_calls: usize,
    /// Statements copied out of inlined bodies.
    pub inlined_statements: usize,
    /// Loop iterations unrolled.
    pub loop_iterations: usize,
    /// Built-in quantum calls emitted by unrolling.
    pub operations: usize,
}

/// Shared state for the passes of one expansion.
pub struct ExpansionContext<'a> {
    pub symbols: &'a SymbolTable,
    pub limits: &'a LimitsConfig,
    pub stats: ExpansionStats,
    next_instance: u32,
}

impl<'a> ExpansionContext<'a> {
    pub fn new(symbols: &'a SymbolTable, limits: &'a LimitsConfig) -> Self {
        Self {
            symbols,
            limits,
            stats: ExpansionStats::default(),
            next_instance: 0,
        }
    }

    /// A fresh suffix for the binders of one inlined body.
    pub(crate) fn next_instance(&mut self) -> u32 {
        let instance = self.next_instance;
        self.next_instance += 1;
        instance
    }
}

/// Expand an analyzed program with the standard pass pipeline.
#[instrument(skip_all)]
pub fn expand(analyzed: &AnalyzedProgram, config: &CompilerConfig) -> CompileResult<Program> {
    let mut program = analyzed.program.clone();
    let mut ctx = ExpansionContext::new(&analyzed.symbols, &config.limits);
    PassManager::expansion().run(&mut program, &mut ctx)?;
    Ok(program)
}

#[cfg(test)]
pub(crate) mod test_util {
    use qcirc_lang::{Program, StmtKind, parse};

    use crate::analyzer::analyze;
    use crate::config::CompilerConfig;

    /// Parse, analyze and expand `source` with default limits.
    pub fn expand_source(source: &str) -> Program {
        let analyzed = analyze(parse(source).unwrap()).unwrap();
        super::expand(&analyzed, &CompilerConfig::default()).unwrap()
    }

    /// Render the calls of an expanded program as `name(args)` strings.
    pub fn calls(program: &Program) -> Vec<String> {
        program
            .statements
            .iter()
            .filter_map(|stmt| match &stmt.kind {
                StmtKind::Expr(expr) => expr.as_call().map(render_call),
                _ => None,
            })
            .collect()
    }

    fn render_call(call: &qcirc_lang::CallExpr) -> String {
        let mods: String = call
            .modifiers
            .iter()
            .map(|m| format!("{m} @ "))
            .collect();
        let args: Vec<String> = call.args.iter().map(render_expr).collect();
        format!("{mods}{}({})", call.callee, args.join(", "))
    }

    fn render_expr(expr: &qcirc_lang::Expr) -> String {
        use qcirc_lang::ExprKind;
        match &expr.kind {
            ExprKind::Int(v) => v.to_string(),
            ExprKind::Float(v) => format!("{v:?}"),
            ExprKind::Ident(name) => name.clone(),
            ExprKind::Index { base, index } => {
                format!("{}[{}]", render_expr(base), render_expr(index))
            }
            other => format!("{other:?}"),
        }
    }
}
