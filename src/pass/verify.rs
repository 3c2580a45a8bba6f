//! Structural verification pass.
//!
//! Checks the SSA shape of a lowering unit without looking at types. Values
//! are visible in their own block after their definition and inside every
//! region nested below that point.

use std::collections::HashSet;

use crate::error::PassError;
use crate::ir::block::{Block, Region};
use crate::ir::ops::{OpKind, RiseOp};
use crate::ir::value::ValueId;
use crate::pass::Pass;

/// Validates structural invariants across a lowering unit.
///
/// Checks:
/// 1. The root is a `rise.lowering_unit`.
/// 2. Every operand is defined earlier in its block or in an enclosing scope.
/// 3. Every value is defined exactly once.
/// 4. `rise.return` appears only as the last op of a block, and every lambda
///    body ends with one.
/// 5. Every combinator is immediately followed by the `rise.apply` that
///    consumes it.
/// 6. Every region holds exactly one block.
pub struct VerifyPass;

impl Pass for VerifyPass {
    fn name(&self) -> &'static str {
        "verify"
    }

    fn run(&mut self, unit: &RiseOp) -> Result<(), PassError> {
        let RiseOp::LoweringUnit { body } = unit else {
            return Err(PassError::TypeError {
                op: unit.name(),
                value: "-".into(),
                detail: "expected a 'rise.lowering_unit' at the top level".into(),
            });
        };
        let mut state = Scopes::default();
        verify_region(&mut state, body, false)
    }
}

#[derive(Default)]
struct Scopes {
    /// Values visible per open scope, innermost last.
    visible: Vec<HashSet<ValueId>>,
    /// Every value defined anywhere so far.
    defined: HashSet<ValueId>,
}

impl Scopes {
    fn is_visible(&self, id: ValueId) -> bool {
        self.visible.iter().any(|scope| scope.contains(&id))
    }

    fn define(&mut self, id: ValueId, block: &Block) -> Result<(), PassError> {
        if !self.defined.insert(id) {
            return Err(PassError::MultipleDefinition {
                block: block.id.to_string(),
                value: id.to_string(),
            });
        }
        if let Some(scope) = self.visible.last_mut() {
            scope.insert(id);
        }
        Ok(())
    }
}

fn verify_region(state: &mut Scopes, region: &Region, require_return: bool) -> Result<(), PassError> {
    let block = match region.blocks.as_slice() {
        [only] => only,
        blocks => {
            let label = blocks
                .first()
                .map(|b| b.id.to_string())
                .unwrap_or_else(|| "<empty region>".into());
            return Err(PassError::MissingTerminator {
                block: label,
                detail: format!("region must hold exactly one block, found {}", blocks.len()),
            });
        }
    };

    state.visible.push(HashSet::new());
    let outcome = verify_block(state, block, require_return);
    state.visible.pop();
    outcome
}

fn verify_block(state: &mut Scopes, block: &Block, require_return: bool) -> Result<(), PassError> {
    let label = block.id.to_string();

    for arg in &block.args {
        state.define(arg.id, block)?;
    }

    let n = block.ops.len();
    for (i, op) in block.ops.iter().enumerate() {
        if op.is_terminator() && i != n - 1 {
            return Err(PassError::MissingTerminator {
                block: label,
                detail: format!("'rise.return' at position {} is followed by {} more op(s)", i, n - 1 - i),
            });
        }

        for operand in op.operands() {
            if !state.is_visible(operand.id) {
                return Err(PassError::UseBeforeDef {
                    block: label,
                    value: operand.id.to_string(),
                });
            }
        }

        if let Some(region) = op.region() {
            verify_region(state, region, op.kind() == OpKind::Lambda)?;
        }

        if op.is_combinator() {
            check_applied(op, block.ops.get(i + 1), &label)?;
        }

        if let Some(result) = op.result() {
            state.define(result.id, block)?;
        }
    }

    if require_return && !block.is_sealed() {
        return Err(PassError::MissingTerminator {
            block: label,
            detail: "lambda body does not end with 'rise.return'".into(),
        });
    }
    Ok(())
}

fn check_applied(op: &RiseOp, next: Option<&RiseOp>, label: &str) -> Result<(), PassError> {
    let Some(result) = op.result() else {
        return Ok(());
    };
    match next {
        Some(RiseOp::Apply { fun, .. }) if fun.id == result.id => Ok(()),
        _ => Err(PassError::UnappliedCombinator {
            block: label.to_owned(),
            op: op.name(),
            value: result.id.to_string(),
        }),
    }
}
