use crate::ir::types::{DataType, FunType, RiseType};

/// An opaque, index-based reference to an SSA value.
///
/// Invariant: a `ValueId` is unique within the lowering unit whose
/// `ValueIds` allocator produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(pub u32);

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// A produced value together with its inferred type.
///
/// This is the only operand form accepted by the builder and the op
/// constructors. Cloning a handle does not create a new value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value {
    pub id: ValueId,
    pub ty: RiseType,
}

impl Value {
    pub fn new(id: ValueId, ty: impl Into<RiseType>) -> Self {
        Value { id, ty: ty.into() }
    }

    pub fn data_type(&self) -> Option<&DataType> {
        self.ty.as_data()
    }

    pub fn fun_type(&self) -> Option<&FunType> {
        self.ty.as_fun()
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Monotonic allocator for fresh `ValueId`s.
#[derive(Debug, Default, Clone)]
pub struct ValueIds {
    next: u32,
}

impl ValueIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> ValueId {
        let id = ValueId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next
    }
}
