//! Pass manager for orchestrating expansion.

use tracing::{debug, info, instrument};

use qcirc_lang::Program;

use crate::error::CompileResult;
use crate::expand::{ExpansionContext, InlineCalls, PropagateModifiers, UnrollLoops, VerifyExpanded};
use crate::pass::Pass;

/// Manages and executes a sequence of expansion passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// The standard expansion pipeline: inline, unroll, propagate modifiers,
    /// then verify that only built-in operations remain.
    pub fn expansion() -> Self {
        let mut pm = Self::new();
        pm.add_pass(InlineCalls);
        pm.add_pass(UnrollLoops);
        pm.add_pass(PropagateModifiers);
        pm.add_pass(VerifyExpanded);
        pm
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes on the given program.
    #[instrument(skip_all)]
    pub fn run(&self, program: &mut Program, ctx: &mut ExpansionContext<'_>) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on {} statements",
            self.passes.len(),
            program.statements.len()
        );

        for pass in &self.passes {
            if pass.should_run(program, ctx) {
                debug!("Running pass: {}", pass.name());
                pass.run(program, ctx)?;
                debug!(
                    "Pass {} completed, statements: {}",
                    pass.name(),
                    program.statements.len()
                );
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!(
            inlined = ctx.stats.inlined_calls,
            iterations = ctx.stats.loop_iterations,
            operations = ctx.stats.operations,
            "Pass manager completed"
        );

        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
