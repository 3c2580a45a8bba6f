//! The RISE operation catalog.
//!
//! Each `RiseOp` variant is one node kind. Combinators (`Zip`, `Tuple`, `Fst`,
//! `Snd`, `Map`, `Reduce`) take no operands: they declare a function value
//! whose type is fixed by their `n`/`s`/`t` attributes, and an `Apply` right
//! after them supplies the real operands.
//!
//! The associated constructors (`RiseOp::zip`, `RiseOp::apply`, ...) are the
//! direct construction surface. They take pre-allocated result ids and do no
//! scope bookkeeping; `RiseBuilder` layers inference and insertion on top.

use crate::error::BuildError;
use crate::ir::block::{Block, Region};
use crate::ir::types::{DataType, FunType, Nat, RiseType};
use crate::ir::value::{Value, ValueId};

/// Every node kind in the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    In,
    Out,
    Zip,
    Tuple,
    Fst,
    Snd,
    Map,
    Reduce,
    Lambda,
    Apply,
    Embed,
    Return,
    Literal,
    LoweringUnit,
}

impl OpKind {
    pub const ALL: [OpKind; 14] = [
        OpKind::In,
        OpKind::Out,
        OpKind::Zip,
        OpKind::Tuple,
        OpKind::Fst,
        OpKind::Snd,
        OpKind::Map,
        OpKind::Reduce,
        OpKind::Lambda,
        OpKind::Apply,
        OpKind::Embed,
        OpKind::Return,
        OpKind::Literal,
        OpKind::LoweringUnit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OpKind::In => "rise.in",
            OpKind::Out => "rise.out",
            OpKind::Zip => "rise.zip",
            OpKind::Tuple => "rise.tuple",
            OpKind::Fst => "rise.fst",
            OpKind::Snd => "rise.snd",
            OpKind::Map => "rise.map",
            OpKind::Reduce => "rise.reduce",
            OpKind::Lambda => "rise.lambda",
            OpKind::Apply => "rise.apply",
            OpKind::Embed => "rise.embed",
            OpKind::Return => "rise.return",
            OpKind::Literal => "rise.literal",
            OpKind::LoweringUnit => "rise.lowering_unit",
        }
    }

    pub fn from_name(name: &str) -> Option<OpKind> {
        OpKind::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Kinds that declare a generic function value and must be applied.
    pub fn is_combinator(self) -> bool {
        matches!(
            self,
            OpKind::Zip | OpKind::Tuple | OpKind::Fst | OpKind::Snd | OpKind::Map | OpKind::Reduce
        )
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A constant carried by `rise.literal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
}

impl std::fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiteralValue::Int(n) => write!(f, "{}", n),
            LiteralValue::Float(v) => write!(f, "{:?}", v),
        }
    }
}

/// A single RISE node.
///
/// Invariants:
/// - An op produces at most one result, typed at construction.
/// - `Return` is the last op of its block.
/// - Only `Lambda`, `Embed` and `LoweringUnit` own a region.
#[derive(Debug, Clone, PartialEq)]
pub enum RiseOp {
    /// Marks an external value as entering the typed region under `ty`.
    In {
        result: Value,
        input: Value,
        ty: DataType,
    },
    /// Writes `input` to the external sink `output`.
    Out { input: Value, output: Value },

    // ---- Combinators ----
    Zip {
        result: Value,
        n: Nat,
        s: DataType,
        t: DataType,
    },
    Tuple {
        result: Value,
        s: DataType,
        t: DataType,
    },
    Fst {
        result: Value,
        s: DataType,
        t: DataType,
    },
    Snd {
        result: Value,
        s: DataType,
        t: DataType,
    },
    Map {
        result: Value,
        n: Nat,
        s: DataType,
        t: DataType,
    },
    Reduce {
        result: Value,
        n: Nat,
        s: DataType,
        t: DataType,
    },

    // ---- Abstraction and application ----
    Lambda { result: Value, body: Region },
    Apply {
        result: Value,
        fun: Value,
        args: Vec<Value>,
    },
    /// Foreign computation; the region is not type-checked against `args`.
    Embed {
        result: Value,
        args: Vec<Value>,
        body: Region,
    },
    Return { value: Value },
    Literal { result: Value, value: LiteralValue },

    /// Top-level container; root of a constructed program.
    LoweringUnit { body: Region },
}

// ---------------------------------------------------------------------------
// Generic combinator shapes
// ---------------------------------------------------------------------------

fn array(n: Nat, elem: &DataType) -> RiseType {
    RiseType::array(n, elem.clone())
}

/// `Array(n,s) -> Array(n,t) -> Array(n, Tuple(s,t))`
pub fn zip_type(n: Nat, s: &DataType, t: &DataType) -> RiseType {
    RiseType::fun(
        array(n, s),
        RiseType::fun(
            array(n, t),
            RiseType::array(n, DataType::tuple(s.clone(), t.clone())),
        ),
    )
}

/// `s -> t -> Tuple(s,t)`
pub fn tuple_type(s: &DataType, t: &DataType) -> RiseType {
    RiseType::fun(
        s.clone(),
        RiseType::fun(t.clone(), DataType::tuple(s.clone(), t.clone())),
    )
}

/// `Tuple(s,t) -> s`
pub fn fst_type(s: &DataType, t: &DataType) -> RiseType {
    RiseType::fun(DataType::tuple(s.clone(), t.clone()), s.clone())
}

/// `Tuple(s,t) -> t`
pub fn snd_type(s: &DataType, t: &DataType) -> RiseType {
    RiseType::fun(DataType::tuple(s.clone(), t.clone()), t.clone())
}

/// `(s -> t) -> Array(n,s) -> Array(n,t)`
pub fn map_type(n: Nat, s: &DataType, t: &DataType) -> RiseType {
    RiseType::fun(
        RiseType::fun(s.clone(), t.clone()),
        RiseType::fun(array(n, s), array(n, t)),
    )
}

/// `(s -> t -> t) -> t -> Array(n,s) -> t`
pub fn reduce_type(n: Nat, s: &DataType, t: &DataType) -> RiseType {
    RiseType::fun(
        RiseType::fun(s.clone(), RiseType::fun(t.clone(), t.clone())),
        RiseType::fun(t.clone(), RiseType::fun(array(n, s), t.clone())),
    )
}

/// Derives a lambda's type from its body block: the trailing `Return`
/// operand type, wrapped by each argument type from last to first.
pub fn lambda_type(block: &Block) -> Result<RiseType, BuildError> {
    match block.last_op() {
        Some(RiseOp::Return { value }) => {
            let arg_types: Vec<RiseType> = block.args.iter().map(|a| a.ty.clone()).collect();
            Ok(FunType::curried(&arg_types, value.ty.clone()))
        }
        Some(other) => Err(BuildError::MalformedScope {
            op: OpKind::Lambda.name(),
            detail: format!("body ends with '{}' instead of 'rise.return'", other.name()),
        }),
        None => Err(BuildError::MalformedScope {
            op: OpKind::Lambda.name(),
            detail: "body is empty; expected a trailing 'rise.return'".into(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Direct constructors
// ---------------------------------------------------------------------------

impl RiseOp {
    pub fn in_value(result: ValueId, input: &Value, ty: DataType) -> RiseOp {
        RiseOp::In {
            result: Value::new(result, ty.clone()),
            input: input.clone(),
            ty,
        }
    }

    pub fn out(input: &Value, output: &Value) -> RiseOp {
        RiseOp::Out {
            input: input.clone(),
            output: output.clone(),
        }
    }

    pub fn zip(result: ValueId, n: Nat, s: DataType, t: DataType) -> RiseOp {
        let ty = zip_type(n, &s, &t);
        RiseOp::Zip {
            result: Value::new(result, ty),
            n,
            s,
            t,
        }
    }

    pub fn tuple(result: ValueId, s: DataType, t: DataType) -> RiseOp {
        let ty = tuple_type(&s, &t);
        RiseOp::Tuple {
            result: Value::new(result, ty),
            s,
            t,
        }
    }

    pub fn fst(result: ValueId, s: DataType, t: DataType) -> RiseOp {
        let ty = fst_type(&s, &t);
        RiseOp::Fst {
            result: Value::new(result, ty),
            s,
            t,
        }
    }

    pub fn snd(result: ValueId, s: DataType, t: DataType) -> RiseOp {
        let ty = snd_type(&s, &t);
        RiseOp::Snd {
            result: Value::new(result, ty),
            s,
            t,
        }
    }

    pub fn map(result: ValueId, n: Nat, s: DataType, t: DataType) -> RiseOp {
        let ty = map_type(n, &s, &t);
        RiseOp::Map {
            result: Value::new(result, ty),
            n,
            s,
            t,
        }
    }

    pub fn reduce(result: ValueId, n: Nat, s: DataType, t: DataType) -> RiseOp {
        let ty = reduce_type(n, &s, &t);
        RiseOp::Reduce {
            result: Value::new(result, ty),
            n,
            s,
            t,
        }
    }

    /// Applies `fun` to `args`. The result type is the curried result of
    /// `fun`'s type; arity is not checked here.
    pub fn apply(result: ValueId, fun: &Value, args: &[Value]) -> Result<RiseOp, BuildError> {
        let fun_ty = fun.fun_type().ok_or_else(|| BuildError::TypeMismatch {
            op: OpKind::Apply.name(),
            operand: format!("callee {}", fun.id),
            expected: "fun".into(),
            found: fun.ty.to_string(),
        })?;
        let result_ty = fun_ty.curried_result().clone();
        Ok(RiseOp::Apply {
            result: Value::new(result, result_ty),
            fun: fun.clone(),
            args: args.to_vec(),
        })
    }

    /// Wraps `block` as a lambda. Fails if the block does not end with
    /// `rise.return`.
    pub fn lambda(result: ValueId, block: Block) -> Result<RiseOp, BuildError> {
        let ty = lambda_type(&block)?;
        Ok(RiseOp::Lambda {
            result: Value::new(result, ty),
            body: Region::from_block(block),
        })
    }

    pub fn embed(result: ValueId, args: &[Value], result_ty: RiseType, block: Block) -> RiseOp {
        RiseOp::Embed {
            result: Value::new(result, result_ty),
            args: args.to_vec(),
            body: Region::from_block(block),
        }
    }

    pub fn ret(value: &Value) -> RiseOp {
        RiseOp::Return {
            value: value.clone(),
        }
    }

    /// A constant of the declared scalar type. Float constants need a float
    /// scalar; integer constants fit any scalar.
    pub fn literal(result: ValueId, value: LiteralValue, ty: DataType) -> Result<RiseOp, BuildError> {
        match (&ty, value) {
            (DataType::Scalar(dt), LiteralValue::Float(_)) if !dt.is_float() => {
                return Err(BuildError::InvalidLiteral {
                    detail: format!("float constant {} cannot have type {}", value, ty),
                });
            }
            (DataType::Scalar(_), _) => {}
            _ => {
                return Err(BuildError::TypeMismatch {
                    op: OpKind::Literal.name(),
                    operand: "type".into(),
                    expected: "scalar".into(),
                    found: ty.to_string(),
                });
            }
        }
        Ok(RiseOp::Literal {
            result: Value::new(result, ty),
            value,
        })
    }

    pub fn lowering_unit(block: Block) -> RiseOp {
        RiseOp::LoweringUnit {
            body: Region::from_block(block),
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl RiseOp {
    pub fn kind(&self) -> OpKind {
        match self {
            RiseOp::In { .. } => OpKind::In,
            RiseOp::Out { .. } => OpKind::Out,
            RiseOp::Zip { .. } => OpKind::Zip,
            RiseOp::Tuple { .. } => OpKind::Tuple,
            RiseOp::Fst { .. } => OpKind::Fst,
            RiseOp::Snd { .. } => OpKind::Snd,
            RiseOp::Map { .. } => OpKind::Map,
            RiseOp::Reduce { .. } => OpKind::Reduce,
            RiseOp::Lambda { .. } => OpKind::Lambda,
            RiseOp::Apply { .. } => OpKind::Apply,
            RiseOp::Embed { .. } => OpKind::Embed,
            RiseOp::Return { .. } => OpKind::Return,
            RiseOp::Literal { .. } => OpKind::Literal,
            RiseOp::LoweringUnit { .. } => OpKind::LoweringUnit,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// The value produced by this op, if any.
    pub fn result(&self) -> Option<&Value> {
        match self {
            RiseOp::In { result, .. }
            | RiseOp::Zip { result, .. }
            | RiseOp::Tuple { result, .. }
            | RiseOp::Fst { result, .. }
            | RiseOp::Snd { result, .. }
            | RiseOp::Map { result, .. }
            | RiseOp::Reduce { result, .. }
            | RiseOp::Lambda { result, .. }
            | RiseOp::Apply { result, .. }
            | RiseOp::Embed { result, .. }
            | RiseOp::Literal { result, .. } => Some(result),
            RiseOp::Out { .. } | RiseOp::Return { .. } | RiseOp::LoweringUnit { .. } => None,
        }
    }

    /// Values consumed by this op, in operand order.
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            RiseOp::In { input, .. } => vec![input],
            RiseOp::Out { input, output } => vec![input, output],
            RiseOp::Apply { fun, args, .. } => {
                let mut ops = vec![fun];
                ops.extend(args.iter());
                ops
            }
            RiseOp::Embed { args, .. } => args.iter().collect(),
            RiseOp::Return { value } => vec![value],
            RiseOp::Zip { .. }
            | RiseOp::Tuple { .. }
            | RiseOp::Fst { .. }
            | RiseOp::Snd { .. }
            | RiseOp::Map { .. }
            | RiseOp::Reduce { .. }
            | RiseOp::Lambda { .. }
            | RiseOp::Literal { .. }
            | RiseOp::LoweringUnit { .. } => vec![],
        }
    }

    pub fn region(&self) -> Option<&Region> {
        match self {
            RiseOp::Lambda { body, .. }
            | RiseOp::Embed { body, .. }
            | RiseOp::LoweringUnit { body } => Some(body),
            _ => None,
        }
    }

    /// Only `rise.return` terminates a block.
    pub fn is_terminator(&self) -> bool {
        matches!(self, RiseOp::Return { .. })
    }

    pub fn is_combinator(&self) -> bool {
        self.kind().is_combinator()
    }

    /// Re-derives a combinator's function type from its attributes.
    /// `None` for non-combinators.
    pub fn combinator_type(&self) -> Option<RiseType> {
        let ty = match self {
            RiseOp::Zip { n, s, t, .. } => zip_type(*n, s, t),
            RiseOp::Tuple { s, t, .. } => tuple_type(s, t),
            RiseOp::Fst { s, t, .. } => fst_type(s, t),
            RiseOp::Snd { s, t, .. } => snd_type(s, t),
            RiseOp::Map { n, s, t, .. } => map_type(*n, s, t),
            RiseOp::Reduce { n, s, t, .. } => reduce_type(*n, s, t),
            _ => return None,
        };
        Some(ty)
    }
}
