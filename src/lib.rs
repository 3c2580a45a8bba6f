//! RISE: a typed IR for a functional, data-parallel array language.
//!
//! ```text
//! RiseBuilder (inference + scopes) → RiseOp tree (rise.lowering_unit)
//!   → PassManager [verify, type-check] → emit_ir_text
//! ```
//!
//! The type system lives in `ir::types`, the op catalog and its direct
//! constructors in `ir::ops`, and the stateful builder in `builder`.

pub mod builder;
pub mod error;
pub mod ir;
pub mod parser;
pub mod pass;

pub use builder::{BuilderConfig, RiseBuilder};
pub use error::Error;
pub use ir::printer::emit_ir_text;

use crate::ir::ops::RiseOp;
use crate::pass::PassManager;

/// Runs the standard pass pipeline over a lowering unit.
pub fn verify(unit: &RiseOp) -> Result<(), Error> {
    let mut pm = PassManager::standard();
    pm.run(unit).map_err(|(_, e)| Error::Pass(e))
}

/// Verifies a lowering unit and returns its printed text.
pub fn verify_and_print(unit: &RiseOp) -> Result<String, Error> {
    verify(unit)?;
    emit_ir_text(unit)
}
