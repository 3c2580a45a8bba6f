pub mod type_check;
pub mod verify;

pub use type_check::TypeCheckPass;
pub use verify::VerifyPass;

use crate::error::PassError;
use crate::ir::ops::RiseOp;

/// A check over a constructed lowering unit.
///
/// Passes are read-only and deterministic: the same unit yields the same
/// outcome on every run.
pub trait Pass {
    /// Human-readable name, used in error messages and diagnostics.
    fn name(&self) -> &'static str;

    /// Run the pass on `unit`, normally a `rise.lowering_unit`.
    fn run(&mut self, unit: &RiseOp) -> Result<(), PassError>;
}

/// Runs an ordered sequence of passes, stopping at the first failure.
///
/// Structural verification runs before type checking: type rules assume
/// every operand resolves to a definition.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    /// If set, logs the printed IR after the pass with this name completes.
    dump_after: Option<String>,
}

impl PassManager {
    pub fn new() -> Self {
        Self { passes: Vec::new(), dump_after: None }
    }

    /// The standard pipeline: `VerifyPass` then `TypeCheckPass`.
    pub fn standard() -> Self {
        let mut pm = Self::new();
        pm.add_pass(VerifyPass);
        pm.add_pass(TypeCheckPass::default());
        pm
    }

    /// Appends a pass to the end of the pipeline.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Logs the printed IR at debug level after the named pass completes.
    pub fn set_dump_after(&mut self, pass_name: impl Into<String>) {
        self.dump_after = Some(pass_name.into());
    }

    /// Runs all passes in registration order on `unit`.
    ///
    /// Returns `Err((pass_name, error))` at the first failure.
    pub fn run(&mut self, unit: &RiseOp) -> Result<(), (String, PassError)> {
        for pass in &mut self.passes {
            tracing::debug!(pass = pass.name(), "running pass");
            pass.run(unit).map_err(|e| (pass.name().to_owned(), e))?;
            if let Some(ref target) = self.dump_after {
                if pass.name() == target.as_str() {
                    use crate::ir::printer::emit_ir_text;
                    if let Ok(text) = emit_ir_text(unit) {
                        tracing::debug!(pass = pass.name(), "IR after pass:\n{}", text);
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the names of all registered passes in pipeline order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
