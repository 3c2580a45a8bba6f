//! Type consistency pass.
//!
//! Re-derives every declared type from the information an op carries and
//! compares it with what was recorded at construction:
//! - combinators: result type must equal the shape built from `n`/`s`/`t`
//! - `rise.apply`: callee must be a function; result must be its curried
//!   result; argument count must match the curried arity (optional); when
//!   the callee is a `rise.map` or `rise.reduce`, the function argument must
//!   take the combinator's `s`
//! - `rise.lambda`: result type must equal the type derived from its body
//! - `rise.in`: result type must equal the `type` attribute
//! - `rise.literal`: result must be a scalar, float constants need a float
//! - every operand handle must carry the type its definition recorded
//!
//! `rise.embed` bodies are walked for definitions but their result type is
//! trusted.

use std::collections::HashMap;

use crate::error::PassError;
use crate::ir::block::{Block, Region};
use crate::ir::ops::{lambda_type, LiteralValue, RiseOp};
use crate::ir::types::{DataType, RiseType};
use crate::ir::value::ValueId;
use crate::pass::Pass;

pub struct TypeCheckPass {
    pub check_apply_arity: bool,
}

impl Default for TypeCheckPass {
    fn default() -> Self {
        Self {
            check_apply_arity: true,
        }
    }
}

impl Pass for TypeCheckPass {
    fn name(&self) -> &'static str {
        "type-check"
    }

    fn run(&mut self, unit: &RiseOp) -> Result<(), PassError> {
        let mut env = Env::default();
        self.check_op(&mut env, unit)
    }
}

#[derive(Default)]
struct Env {
    /// Recorded type of every value defined so far.
    types: HashMap<ValueId, RiseType>,
    /// Element type `s` of each `rise.map` / `rise.reduce` result.
    elem_inputs: HashMap<ValueId, DataType>,
}

fn type_error(op: &RiseOp, detail: String) -> PassError {
    PassError::TypeError {
        op: op.name(),
        value: op
            .result()
            .map(|v| v.id.to_string())
            .unwrap_or_else(|| "-".into()),
        detail,
    }
}

impl TypeCheckPass {
    fn check_region(&self, env: &mut Env, region: &Region) -> Result<(), PassError> {
        for block in &region.blocks {
            self.check_block(env, block)?;
        }
        Ok(())
    }

    fn check_block(&self, env: &mut Env, block: &Block) -> Result<(), PassError> {
        for arg in &block.args {
            env.types.insert(arg.id, arg.ty.clone());
        }
        for op in &block.ops {
            self.check_op(env, op)?;
        }
        Ok(())
    }

    fn check_op(&self, env: &mut Env, op: &RiseOp) -> Result<(), PassError> {
        for operand in op.operands() {
            if let Some(recorded) = env.types.get(&operand.id) {
                if *recorded != operand.ty {
                    return Err(type_error(
                        op,
                        format!(
                            "operand {} is used as {} but was defined as {}",
                            operand.id, operand.ty, recorded
                        ),
                    ));
                }
            }
        }

        if let Some(region) = op.region() {
            self.check_region(env, region)?;
        }

        if let Some(expected) = op.combinator_type() {
            if let Some(result) = op.result() {
                if result.ty != expected {
                    return Err(type_error(
                        op,
                        format!("declared type {} does not match attributes, expected {}", result.ty, expected),
                    ));
                }
            }
        }

        match op {
            RiseOp::Apply { result, fun, args } => {
                let Some(fun_ty) = fun.fun_type() else {
                    return Err(type_error(op, format!("callee {} has non-function type {}", fun.id, fun.ty)));
                };
                let expected = RiseType::Data(fun_ty.curried_result().clone());
                if result.ty != expected {
                    return Err(type_error(
                        op,
                        format!("result type {} differs from callee result {}", result.ty, expected),
                    ));
                }
                if self.check_apply_arity && fun_ty.arity() != args.len() {
                    return Err(type_error(
                        op,
                        format!("callee takes {} argument(s) but {} were supplied", fun_ty.arity(), args.len()),
                    ));
                }
                if let (Some(elem), Some(f)) = (env.elem_inputs.get(&fun.id), args.first()) {
                    let takes_elem = f
                        .fun_type()
                        .map_or(false, |ft| ft.input.as_data() == Some(elem));
                    if !takes_elem {
                        return Err(type_error(
                            op,
                            format!("function argument {} of type {} does not take {}", f.id, f.ty, elem),
                        ));
                    }
                }
            }
            RiseOp::Map { result, s, .. } | RiseOp::Reduce { result, s, .. } => {
                env.elem_inputs.insert(result.id, s.clone());
            }
            RiseOp::Lambda { result, body } => {
                let Some(block) = body.block() else {
                    return Err(type_error(op, "lambda region must hold exactly one block".into()));
                };
                let derived = lambda_type(block).map_err(|e| type_error(op, e.to_string()))?;
                if result.ty != derived {
                    return Err(type_error(
                        op,
                        format!("declared type {} differs from body type {}", result.ty, derived),
                    ));
                }
            }
            RiseOp::In { result, ty, .. } => {
                if result.ty != RiseType::Data(ty.clone()) {
                    return Err(type_error(
                        op,
                        format!("result type {} differs from 'type' attribute {}", result.ty, ty),
                    ));
                }
            }
            RiseOp::Literal { result, value } => match result.data_type() {
                Some(DataType::Scalar(dt)) => {
                    if matches!(value, LiteralValue::Float(_)) && !dt.is_float() {
                        return Err(type_error(op, format!("float constant {} typed as {}", value, result.ty)));
                    }
                }
                _ => {
                    return Err(type_error(op, format!("literal must be a scalar, found {}", result.ty)));
                }
            },
            _ => {}
        }

        if let Some(result) = op.result() {
            env.types.insert(result.id, result.ty.clone());
        }
        Ok(())
    }
}
