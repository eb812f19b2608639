//! Pass trait and types for expansion passes.

use qcirc_lang::Program;

use crate::error::CompileResult;
use crate::expand::ExpansionContext;

/// The kind of expansion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Analysis pass that reads but does not modify the program.
    Analysis,
    /// Transformation pass that rewrites the program.
    Transformation,
}

/// An expansion pass that operates on a resolved program.
///
/// Each pass performs one rewrite of the program towards the flat list of
/// built-in quantum operations that lowering consumes.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Run the pass on the given program.
    ///
    /// Analysis passes should not modify the program; transformation passes
    /// may record statistics in the context.
    fn run(&self, program: &mut Program, ctx: &mut ExpansionContext<'_>) -> CompileResult<()>;

    /// Check if this pass should run based on current state.
    fn should_run(&self, _program: &Program, _ctx: &ExpansionContext<'_>) -> bool {
        true
    }
}
