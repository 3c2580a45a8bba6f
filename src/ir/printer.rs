//! IR pretty-printer.
//!
//! Emits a human-readable text form of a RISE op tree. Output is
//! deterministic: ops in program order, nested regions indented under the op
//! that owns them.

use std::fmt::Write;

use crate::error::Error;
use crate::ir::block::{Block, Region};
use crate::ir::ops::RiseOp;
use crate::ir::value::Value;

/// Emits the text form of `op` (normally a `rise.lowering_unit`).
pub fn emit_ir_text(op: &RiseOp) -> Result<String, Error> {
    let mut out = String::new();
    emit_op(&mut out, op, 0)?;
    Ok(out)
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn value_list(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn emit_region(out: &mut String, region: &Region, depth: usize) -> Result<(), Error> {
    writeln!(out, " {{")?;
    for block in &region.blocks {
        emit_block(out, block, depth)?;
    }
    indent(out, depth);
    write!(out, "}}")?;
    Ok(())
}

fn emit_block(out: &mut String, block: &Block, depth: usize) -> Result<(), Error> {
    indent(out, depth);
    write!(out, "{}", block.id)?;
    if !block.args.is_empty() {
        write!(out, "(")?;
        for (i, arg) in block.args.iter().enumerate() {
            if i > 0 {
                write!(out, ", ")?;
            }
            write!(out, "{}: {}", arg.id, arg.ty)?;
        }
        write!(out, ")")?;
    }
    writeln!(out, ":")?;
    for op in &block.ops {
        emit_op(out, op, depth + 1)?;
    }
    Ok(())
}

fn emit_op(out: &mut String, op: &RiseOp, depth: usize) -> Result<(), Error> {
    indent(out, depth);
    if let Some(result) = op.result() {
        write!(out, "{} = ", result.id)?;
    }
    write!(out, "{}", op.name())?;

    match op {
        RiseOp::In { input, ty, .. } => {
            write!(out, " {} {{type = {}}}", input.id, ty)?;
        }
        RiseOp::Out { input, output } => {
            write!(out, " {}, {}", input.id, output.id)?;
        }
        RiseOp::Zip { n, s, t, .. } | RiseOp::Map { n, s, t, .. } | RiseOp::Reduce { n, s, t, .. } => {
            write!(out, " {{n = {}, s = {}, t = {}}}", n, s, t)?;
        }
        RiseOp::Tuple { s, t, .. } | RiseOp::Fst { s, t, .. } | RiseOp::Snd { s, t, .. } => {
            write!(out, " {{s = {}, t = {}}}", s, t)?;
        }
        RiseOp::Apply { fun, args, .. } => {
            write!(out, " {}({})", fun.id, value_list(args))?;
        }
        RiseOp::Embed { args, .. } => {
            write!(out, "({})", value_list(args))?;
        }
        RiseOp::Return { value } => {
            write!(out, " {}", value.id)?;
        }
        RiseOp::Literal { value, .. } => {
            write!(out, " {}", value)?;
        }
        RiseOp::Lambda { .. } | RiseOp::LoweringUnit { .. } => {}
    }

    if let Some(result) = op.result() {
        write!(out, " : {}", result.ty)?;
    }
    if let Some(region) = op.region() {
        emit_region(out, region, depth)?;
    }
    writeln!(out)?;
    Ok(())
}
