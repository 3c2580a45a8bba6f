//! Builder tests: type inference for each combinator, invariant checks, and
//! scope management.

use rise_ir::error::BuildError;
use rise_ir::ir::block::{Block, BlockId};
use rise_ir::ir::ops::{LiteralValue, OpKind, RiseOp};
use rise_ir::ir::types::{DType, DataType, Nat, RiseType};
use rise_ir::ir::value::{Value, ValueId};
use rise_ir::{BuilderConfig, RiseBuilder};

fn i32_ty() -> DataType {
    DataType::scalar(DType::I32)
}

fn f32_ty() -> DataType {
    DataType::scalar(DType::F32)
}

fn arr(n: u64, elem: DataType) -> DataType {
    DataType::array(Nat(n), elem)
}

fn kinds(block: &Block) -> Vec<OpKind> {
    block.ops.iter().map(RiseOp::kind).collect()
}

fn unit_block(unit: &RiseOp) -> &Block {
    match unit {
        RiseOp::LoweringUnit { body } => body.block().expect("unit must hold one block"),
        other => panic!("expected a lowering unit, got {}", other.name()),
    }
}

/// Runs `body` inside a lowering unit whose block takes `inputs` as
/// arguments, wrapping each in `rise.in`.
fn with_inputs<F>(inputs: &[DataType], body: F) -> RiseOp
where
    F: FnOnce(&mut RiseBuilder, &[Value]) -> Result<(), BuildError>,
{
    let arg_types: Vec<RiseType> = inputs.iter().cloned().map(RiseType::Data).collect();
    let mut b = RiseBuilder::new();
    b.lowering_unit_with_args(&arg_types, |b, args| {
        let mut values = Vec::new();
        for (arg, ty) in args.iter().zip(inputs) {
            values.push(b.in_value(arg, ty.clone())?);
        }
        body(b, &values)
    })
    .expect("lowering unit should build")
}

// ---------------------------------------------------------------------------
// zip
// ---------------------------------------------------------------------------

#[test]
fn test_zip_infers_tuple_array() {
    let unit = with_inputs(&[arr(3, i32_ty()), arr(3, f32_ty())], |b, xs| {
        let z = b.zip(&xs[0], &xs[1])?;
        assert_eq!(z.ty, RiseType::array(Nat(3), DataType::tuple(i32_ty(), f32_ty())));
        b.ret(&z)
    });
    let block = unit_block(&unit);
    assert_eq!(
        kinds(block),
        vec![OpKind::In, OpKind::In, OpKind::Zip, OpKind::Apply, OpKind::Return]
    );
    match &block.ops[2] {
        RiseOp::Zip { n, s, t, .. } => {
            assert_eq!(*n, Nat(3));
            assert_eq!(s, &i32_ty());
            assert_eq!(t, &f32_ty());
        }
        other => panic!("expected rise.zip, got {}", other.name()),
    }
}

#[test]
fn test_zip_rejects_length_mismatch_without_emitting() {
    with_inputs(&[arr(3, i32_ty()), arr(4, i32_ty())], |b, xs| {
        let before = b.current_block().map(|blk| blk.ops.len());
        let err = b.zip(&xs[0], &xs[1]).unwrap_err();
        assert!(matches!(err, BuildError::ShapeMismatch { op: "rise.zip", .. }), "{}", err);
        assert_eq!(b.current_block().map(|blk| blk.ops.len()), before);
        b.ret(&xs[0])
    });
}

#[test]
fn test_zip_rejects_non_array_operand() {
    with_inputs(&[arr(3, i32_ty()), i32_ty()], |b, xs| {
        let err = b.zip(&xs[0], &xs[1]).unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { op: "rise.zip", .. }), "{}", err);
        b.ret(&xs[0])
    });
}

// ---------------------------------------------------------------------------
// tuple / fst / snd
// ---------------------------------------------------------------------------

#[test]
fn test_projections_invert_tuple() {
    with_inputs(&[arr(2, i32_ty()), arr(2, f32_ty())], |b, xs| {
        let pair = b.tuple(&xs[0], &xs[1])?;
        assert_eq!(pair.ty, RiseType::tuple(i32_ty(), f32_ty()));
        let first = b.fst(&pair)?;
        let second = b.snd(&pair)?;
        assert_eq!(first.ty, RiseType::Data(i32_ty()));
        assert_eq!(second.ty, RiseType::Data(f32_ty()));
        b.ret(&second)
    });
}

#[test]
fn test_tuple_requires_arrays() {
    with_inputs(&[i32_ty(), arr(2, f32_ty())], |b, xs| {
        let err = b.tuple(&xs[0], &xs[1]).unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { op: "rise.tuple", .. }));
        b.ret(&xs[1])
    });
}

#[test]
fn test_fst_rejects_non_tuple() {
    with_inputs(&[arr(2, i32_ty())], |b, xs| {
        let err = b.fst(&xs[0]).unwrap_err();
        match &err {
            BuildError::TypeMismatch { op, expected, found, .. } => {
                assert_eq!(*op, "rise.fst");
                assert_eq!(expected, "a tuple");
                assert_eq!(found, "array<2, scalar<i32>>");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(matches!(b.snd(&xs[0]), Err(BuildError::TypeMismatch { op: "rise.snd", .. })));
        b.ret(&xs[0])
    });
}

// ---------------------------------------------------------------------------
// map
// ---------------------------------------------------------------------------

#[test]
fn test_map_takes_length_from_input_array() {
    // f : scalar<i32> -> array<2, scalar<f32>>; xs : array<5, scalar<i32>>
    with_inputs(&[arr(5, i32_ty())], |b, xs| {
        let f = b.lambda(&[RiseType::Data(i32_ty())], |b, args| {
            let produced = b.embed_with(args, RiseType::array(Nat(2), f32_ty()), |b, inner| {
                b.ret(&inner[0])
            })?;
            b.ret(&produced)
        })?;
        let mapped = b.map(&f, &xs[0])?;
        assert_eq!(mapped.ty, RiseType::array(Nat(5), f32_ty()));
        b.ret(&mapped)
    });
}

#[test]
fn test_map_with_scalar_result_function() {
    with_inputs(&[arr(6, i32_ty())], |b, xs| {
        let f = b.lambda(&[RiseType::Data(i32_ty())], |b, args| b.ret(&args[0]))?;
        let mapped = b.map(&f, &xs[0])?;
        assert_eq!(mapped.ty, RiseType::array(Nat(6), i32_ty()));
        let block = b.current_block().expect("scope is open");
        match &block.ops[block.ops.len() - 2] {
            RiseOp::Map { n, s, t, .. } => {
                assert_eq!((*n, s, t), (Nat(6), &i32_ty(), &i32_ty()));
            }
            other => panic!("expected rise.map, got {}", other.name()),
        }
        b.ret(&mapped)
    });
}

#[test]
fn test_map_requires_function_and_array() {
    with_inputs(&[arr(6, i32_ty()), i32_ty()], |b, xs| {
        let err = b.map(&xs[1], &xs[0]).unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { op: "rise.map", .. }));
        let f = b.lambda(&[RiseType::Data(i32_ty())], |b, args| b.ret(&args[0]))?;
        let err = b.map(&f, &xs[1]).unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { op: "rise.map", .. }));
        b.ret(&xs[0])
    });
}

#[test]
fn test_map_rejects_function_over_other_element_type() {
    with_inputs(&[arr(4, f32_ty())], |b, xs| {
        let f = b.lambda(&[RiseType::Data(i32_ty())], |b, args| b.ret(&args[0]))?;
        let before = b.current_block().map(|blk| blk.ops.len());
        let err = b.map(&f, &xs[0]).unwrap_err();
        match &err {
            BuildError::TypeMismatch { op, operand, expected, .. } => {
                assert_eq!(*op, "rise.map");
                assert!(operand.starts_with("function operand"), "{}", operand);
                assert_eq!(expected, "a function taking scalar<f32>");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(b.current_block().map(|blk| blk.ops.len()), before);
        b.ret(&xs[0])
    });
}

// ---------------------------------------------------------------------------
// reduce
// ---------------------------------------------------------------------------

#[test]
fn test_reduce_builds_lambda_reduce_and_apply() {
    let unit = with_inputs(&[arr(8, f32_ty()), f32_ty()], |b, xs| {
        let scalar = RiseType::Data(f32_ty());
        let sum = b.reduce(&xs[1], &xs[0], &[scalar.clone(), scalar], |b, args| {
            let combined = b.embed_with(args, RiseType::Data(f32_ty()), |b, inner| b.ret(&inner[0]))?;
            b.ret(&combined)
        })?;
        assert_eq!(sum.ty, RiseType::Data(f32_ty()));
        b.ret(&sum)
    });
    let block = unit_block(&unit);
    assert_eq!(
        kinds(block),
        vec![
            OpKind::In,
            OpKind::In,
            OpKind::Lambda,
            OpKind::Reduce,
            OpKind::Apply,
            OpKind::Return
        ]
    );
    match (&block.ops[2], &block.ops[4]) {
        (RiseOp::Lambda { result: lambda, .. }, RiseOp::Apply { args, .. }) => {
            assert_eq!(args.len(), 3);
            assert_eq!(args[0].id, lambda.id);
        }
        _ => panic!("unexpected op layout"),
    }
}

#[test]
fn test_reduce_rejects_non_array_before_building_lambda() {
    let unit = with_inputs(&[f32_ty()], |b, xs| {
        let err = b
            .reduce(&xs[0], &xs[0], &[], |b, _| b.ret(&xs[0]))
            .unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { op: "rise.reduce", .. }));
        b.ret(&xs[0])
    });
    assert_eq!(kinds(unit_block(&unit)), vec![OpKind::In, OpKind::Return]);
}

#[test]
fn test_reduce_rejects_combiner_over_other_element_type() {
    let unit = with_inputs(&[arr(8, f32_ty()), i32_ty()], |b, xs| {
        let scalar = RiseType::Data(i32_ty());
        let err = b
            .reduce(&xs[1], &xs[0], &[scalar.clone(), scalar], |b, args| b.ret(&args[1]))
            .unwrap_err();
        match &err {
            BuildError::TypeMismatch { op, expected, found, .. } => {
                assert_eq!(*op, "rise.reduce");
                assert_eq!(expected, "a function taking scalar<f32>");
                assert_eq!(found, "a function taking scalar<i32>");
            }
            other => panic!("unexpected error {:?}", other),
        }
        b.ret(&xs[1])
    });
    assert_eq!(kinds(unit_block(&unit)), vec![OpKind::In, OpKind::In, OpKind::Return]);
}

// ---------------------------------------------------------------------------
// lambda
// ---------------------------------------------------------------------------

#[test]
fn test_lambda_type_curries_arguments_in_order() {
    with_inputs(&[i32_ty()], |b, xs| {
        let a = RiseType::Data(i32_ty());
        let bb = RiseType::Data(f32_ty());
        let r = DataType::tuple(i32_ty(), i32_ty());
        let f = b.lambda(&[a.clone(), bb.clone()], |b, _| {
            let out = b.embed(&[], RiseType::Data(r.clone()), Block::new(BlockId(1000)))?;
            b.ret(&out)
        })?;
        assert_eq!(f.ty, RiseType::fun(a, RiseType::fun(bb, r.clone())));
        b.ret(&xs[0])
    });
}

#[test]
fn test_lambda_without_return_is_malformed() {
    with_inputs(&[i32_ty()], |b, xs| {
        let err = b
            .lambda(&[RiseType::Data(i32_ty())], |_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, BuildError::MalformedScope { op: "rise.lambda", .. }), "{}", err);
        b.ret(&xs[0])
    });
}

#[test]
fn test_lambda_body_may_capture_outer_values() {
    let unit = with_inputs(&[arr(4, i32_ty())], |b, xs| {
        let outer = xs[0].clone();
        let f = b.lambda(&[RiseType::Data(i32_ty())], |b, _| b.ret(&outer))?;
        assert_eq!(f.ty, RiseType::fun(i32_ty(), arr(4, i32_ty())));
        b.ret(&f)
    });
    rise_ir::verify(&unit).expect("captured values are visible in nested scopes");
}

// ---------------------------------------------------------------------------
// Scope restoration
// ---------------------------------------------------------------------------

#[test]
fn test_scope_restored_after_nested_scopes() {
    let mut b = RiseBuilder::new();
    assert_eq!(b.current_block_id(), None);
    b.lowering_unit(|b| {
        let top = b.current_block_id();
        assert!(top.is_some());
        let lit = b.literal(LiteralValue::Int(1), i32_ty())?;
        let f = b.lambda(&[RiseType::Data(i32_ty())], |b, args| {
            assert_ne!(b.current_block_id(), top);
            assert_eq!(b.scope_depth(), 2);
            let g = b.lambda(&[], |b, _| b.ret(&args[0]))?;
            assert_eq!(b.scope_depth(), 2);
            b.ret(&g)
        })?;
        assert_eq!(b.current_block_id(), top);
        assert_eq!(b.scope_depth(), 1);
        let applied = b.apply(&f, &[lit])?;
        b.ret(&applied)
    })
    .expect("unit should build");
    assert_eq!(b.current_block_id(), None);
    assert_eq!(b.scope_depth(), 0);
}

#[test]
fn test_scope_restored_when_body_fails() {
    let mut b = RiseBuilder::new();
    b.lowering_unit(|b| {
        let top = b.current_block_id();
        let lit = b.literal(LiteralValue::Int(1), i32_ty())?;

        let err = b
            .lambda(&[], |b, _| {
                b.zip(&lit, &lit)?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { .. }));
        assert_eq!(b.current_block_id(), top);
        assert_eq!(b.scope_depth(), 1);

        b.ret(&lit)
    })
    .expect("unit should build");
    assert_eq!(b.scope_depth(), 0);
}

#[test]
fn test_scope_restored_when_body_panics() {
    let mut b = RiseBuilder::new();
    b.lowering_unit(|b| {
        let top = b.current_block_id();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            b.lambda(&[], |_, _| -> Result<(), BuildError> { panic!("body failed") })
        }));
        assert!(outcome.is_err());
        assert_eq!(b.current_block_id(), top);
        let lit = b.literal(LiteralValue::Int(0), i32_ty())?;
        b.ret(&lit)
    })
    .expect("unit should build");
}

#[test]
fn test_failed_unit_body_restores_empty_stack() {
    let mut b = RiseBuilder::new();
    let err = b
        .lowering_unit(|b| {
            let lit = b.literal(LiteralValue::Float(1.5), i32_ty())?;
            b.ret(&lit)
        })
        .unwrap_err();
    assert!(matches!(err, BuildError::InvalidLiteral { .. }));
    assert_eq!(b.scope_depth(), 0);
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

#[test]
fn test_apply_enforces_arity() {
    with_inputs(&[i32_ty()], |b, xs| {
        let two = [RiseType::Data(i32_ty()), RiseType::Data(i32_ty())];
        let f = b.lambda(&two, |b, args| b.ret(&args[1]))?;
        let err = b.apply(&f, std::slice::from_ref(&xs[0])).unwrap_err();
        assert_eq!(err, BuildError::ArityMismatch { expected: 2, found: 1 });
        let full = b.apply(&f, &[xs[0].clone(), xs[0].clone()])?;
        assert_eq!(full.ty, RiseType::Data(i32_ty()));
        b.ret(&full)
    });
}

#[test]
fn test_apply_arity_check_can_be_disabled() {
    let config = BuilderConfig {
        check_apply_arity: false,
        ..BuilderConfig::default()
    };
    let mut b = RiseBuilder::with_config(config);
    b.lowering_unit_with_args(&[RiseType::Data(i32_ty())], |b, args| {
        let two = [RiseType::Data(i32_ty()), RiseType::Data(f32_ty())];
        let f = b.lambda(&two, |b, inner| b.ret(&inner[1]))?;
        // The result is still the fully unwrapped type.
        let partial = b.apply(&f, &args[..1])?;
        assert_eq!(partial.ty, RiseType::Data(f32_ty()));
        b.ret(&partial)
    })
    .expect("unit should build");
}

#[test]
fn test_apply_rejects_non_function_callee() {
    with_inputs(&[i32_ty()], |b, xs| {
        let err = b.apply(&xs[0], &[]).unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { op: "rise.apply", .. }));
        b.ret(&xs[0])
    });
}

// ---------------------------------------------------------------------------
// literal / embed / boundary ops
// ---------------------------------------------------------------------------

#[test]
fn test_literal_uses_declared_type() {
    with_inputs(&[i32_ty()], |b, xs| {
        let n = b.literal(LiteralValue::Int(3), DataType::scalar(DType::I64))?;
        assert_eq!(n.ty, RiseType::scalar(DType::I64));
        let x = b.literal(LiteralValue::Float(0.25), DataType::scalar(DType::F64))?;
        assert_eq!(x.ty, RiseType::scalar(DType::F64));
        let err = b.literal(LiteralValue::Int(3), arr(2, i32_ty())).unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { op: "rise.literal", .. }));
        b.ret(&xs[0])
    });
}

#[test]
fn test_embed_trusts_supplied_type() {
    let unit = with_inputs(&[i32_ty(), f32_ty()], |b, xs| {
        let foreign = Block::new(BlockId(500));
        let out_ty = RiseType::array(Nat(9), DataType::scalar(DType::I8));
        let e = b.embed(xs, out_ty.clone(), foreign)?;
        assert_eq!(e.ty, out_ty);
        b.ret(&e)
    });
    match &unit_block(&unit).ops[2] {
        RiseOp::Embed { args, body, .. } => {
            assert_eq!(args.len(), 2);
            assert!(body.block().is_some());
        }
        other => panic!("expected rise.embed, got {}", other.name()),
    }
}

#[test]
fn test_out_can_terminate_unit() {
    let unit = with_inputs(&[arr(4, i32_ty()), arr(4, i32_ty())], |b, xs| b.out(&xs[0], &xs[1]));
    assert_eq!(
        kinds(unit_block(&unit)),
        vec![OpKind::In, OpKind::In, OpKind::Out]
    );
}

#[test]
fn test_unit_without_terminator_is_malformed() {
    let mut b = RiseBuilder::new();
    let err = b
        .lowering_unit(|b| {
            b.literal(LiteralValue::Int(1), i32_ty())?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, BuildError::MalformedScope { op: "rise.lowering_unit", .. }));

    let mut lenient = RiseBuilder::with_config(BuilderConfig {
        require_unit_terminator: false,
        ..BuilderConfig::default()
    });
    lenient
        .lowering_unit(|b| {
            b.literal(LiteralValue::Int(1), i32_ty())?;
            Ok(())
        })
        .expect("terminator not required");
}

#[test]
fn test_emitting_after_return_is_rejected() {
    let mut b = RiseBuilder::new();
    b.lowering_unit(|b| {
        let lit = b.literal(LiteralValue::Int(1), i32_ty())?;
        b.ret(&lit)?;
        let err = b.literal(LiteralValue::Int(2), i32_ty()).unwrap_err();
        assert!(matches!(err, BuildError::MalformedScope { op: "rise.literal", .. }));
        Ok(())
    })
    .expect("unit ends with its return");
}

#[test]
fn test_no_insertion_point_outside_scope() {
    let mut b = RiseBuilder::new();
    let xs = Value::new(ValueId(0), RiseType::array(Nat(2), i32_ty()));
    let err = b.zip(&xs, &xs).unwrap_err();
    assert_eq!(err, BuildError::NoInsertionPoint { op: "rise.zip" });
    assert!(matches!(
        b.lambda(&[], |b, _| b.ret(&xs)),
        Err(BuildError::NoInsertionPoint { op: "rise.lambda" })
    ));
}
