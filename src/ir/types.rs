//! The RISE type system.
//!
//! Two disjoint families: data types (`Nat`, `Array`, `Scalar`, `Tuple`) and
//! function types (`Fun`). `RiseType` is the union used wherever an operand or
//! result may carry either. All comparisons are structural.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// A compile-time-known array length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nat(pub u64);

impl Nat {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for Nat {
    fn from(n: u64) -> Self {
        Nat(n)
    }
}

impl fmt::Display for Nat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Nat {
    type Err = ParseError;

    /// Parses a bare decimal integer literal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidNat { text: s.to_owned() });
        }
        text.parse::<u64>()
            .map(Nat)
            .map_err(|_| ParseError::InvalidNat { text: s.to_owned() })
    }
}

/// Primitive element kinds wrapped by `DataType::Scalar`. Opaque to the
/// type rules; only compared for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    I1,
    I8,
    I16,
    I32,
    I64,
    Index,
    F16,
    F32,
    F64,
}

impl DType {
    pub fn is_float(self) -> bool {
        matches!(self, DType::F16 | DType::F32 | DType::F64)
    }

    pub fn name(self) -> &'static str {
        match self {
            DType::I1 => "i1",
            DType::I8 => "i8",
            DType::I16 => "i16",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::Index => "index",
            DType::F16 => "f16",
            DType::F32 => "f32",
            DType::F64 => "f64",
        }
    }

    pub fn from_name(name: &str) -> Option<DType> {
        let dt = match name {
            "i1" => DType::I1,
            "i8" => DType::I8,
            "i16" => DType::I16,
            "i32" => DType::I32,
            "i64" => DType::I64,
            "index" => DType::Index,
            "f16" => DType::F16,
            "f32" => DType::F32,
            "f64" => DType::F64,
            _ => return None,
        };
        Some(dt)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A first-order data type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Nat(Nat),
    Array { size: Nat, elem: Box<DataType> },
    Scalar(DType),
    Tuple(Box<DataType>, Box<DataType>),
}

impl DataType {
    pub fn array(size: impl Into<Nat>, elem: DataType) -> Self {
        DataType::Array {
            size: size.into(),
            elem: Box::new(elem),
        }
    }

    pub fn scalar(dtype: DType) -> Self {
        DataType::Scalar(dtype)
    }

    pub fn tuple(left: DataType, right: DataType) -> Self {
        DataType::Tuple(Box::new(left), Box::new(right))
    }

    /// Returns `(size, elem)` if this is an array.
    pub fn as_array(&self) -> Option<(Nat, &DataType)> {
        match self {
            DataType::Array { size, elem } => Some((*size, elem)),
            _ => None,
        }
    }

    /// Returns `(left, right)` if this is a tuple.
    pub fn as_tuple(&self) -> Option<(&DataType, &DataType)> {
        match self {
            DataType::Tuple(l, r) => Some((l, r)),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Nat(n) => write!(f, "{}", n),
            DataType::Array { size, elem } => write!(f, "array<{}, {}>", size, elem),
            DataType::Scalar(dt) => write!(f, "scalar<{}>", dt),
            DataType::Tuple(l, r) => write!(f, "tuple<{}, {}>", l, r),
        }
    }
}

/// A single-argument function type. Multi-argument functions are curried:
/// `A -> (B -> R)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunType {
    pub input: Box<RiseType>,
    pub output: Box<RiseType>,
}

impl FunType {
    pub fn new(input: impl Into<RiseType>, output: impl Into<RiseType>) -> Self {
        FunType {
            input: Box::new(input.into()),
            output: Box::new(output.into()),
        }
    }

    /// Builds `Fun(a1, Fun(a2, ... result))`. The last argument wraps the
    /// result innermost. With no arguments the result is returned unchanged.
    pub fn curried(args: &[RiseType], result: RiseType) -> RiseType {
        args.iter()
            .rev()
            .fold(result, |acc, arg| RiseType::Fun(FunType::new(arg.clone(), acc)))
    }

    /// Final non-function type reached by following `output` through the chain.
    pub fn curried_result(&self) -> &DataType {
        let mut ty = self.output.as_ref();
        loop {
            match ty {
                RiseType::Fun(inner) => ty = inner.output.as_ref(),
                RiseType::Data(data) => return data,
            }
        }
    }

    /// Number of arguments the fully curried function consumes.
    pub fn arity(&self) -> usize {
        let mut n = 1;
        let mut ty = self.output.as_ref();
        while let RiseType::Fun(inner) = ty {
            n += 1;
            ty = inner.output.as_ref();
        }
        n
    }

    /// Input types of each curried layer, outermost first.
    pub fn curried_inputs(&self) -> Vec<&RiseType> {
        let mut inputs = vec![self.input.as_ref()];
        let mut ty = self.output.as_ref();
        while let RiseType::Fun(inner) = ty {
            inputs.push(inner.input.as_ref());
            ty = inner.output.as_ref();
        }
        inputs
    }
}

impl fmt::Display for FunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fun<{} -> {}>", self.input, self.output)
    }
}

/// Any RISE type: data or function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RiseType {
    Data(DataType),
    Fun(FunType),
}

impl RiseType {
    pub fn nat(n: u64) -> Self {
        RiseType::Data(DataType::Nat(Nat(n)))
    }

    pub fn array(size: impl Into<Nat>, elem: DataType) -> Self {
        RiseType::Data(DataType::array(size, elem))
    }

    pub fn scalar(dtype: DType) -> Self {
        RiseType::Data(DataType::Scalar(dtype))
    }

    pub fn tuple(left: DataType, right: DataType) -> Self {
        RiseType::Data(DataType::tuple(left, right))
    }

    pub fn fun(input: impl Into<RiseType>, output: impl Into<RiseType>) -> Self {
        RiseType::Fun(FunType::new(input, output))
    }

    pub fn as_data(&self) -> Option<&DataType> {
        match self {
            RiseType::Data(d) => Some(d),
            RiseType::Fun(_) => None,
        }
    }

    pub fn as_fun(&self) -> Option<&FunType> {
        match self {
            RiseType::Fun(f) => Some(f),
            RiseType::Data(_) => None,
        }
    }

    pub fn is_fun(&self) -> bool {
        matches!(self, RiseType::Fun(_))
    }

    /// Unwraps a curried chain to its final data type. A data type is its
    /// own result.
    pub fn curried_result(&self) -> &DataType {
        match self {
            RiseType::Data(d) => d,
            RiseType::Fun(f) => f.curried_result(),
        }
    }

    /// Number of curried arguments; zero for data types.
    pub fn arity(&self) -> usize {
        match self {
            RiseType::Data(_) => 0,
            RiseType::Fun(f) => f.arity(),
        }
    }
}

impl From<DataType> for RiseType {
    fn from(d: DataType) -> Self {
        RiseType::Data(d)
    }
}

impl From<FunType> for RiseType {
    fn from(f: FunType) -> Self {
        RiseType::Fun(f)
    }
}

impl From<Nat> for RiseType {
    fn from(n: Nat) -> Self {
        RiseType::Data(DataType::Nat(n))
    }
}

impl fmt::Display for RiseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiseType::Data(d) => write!(f, "{}", d),
            RiseType::Fun(fun) => write!(f, "{}", fun),
        }
    }
}

impl FromStr for RiseType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse_type(s)
    }
}
