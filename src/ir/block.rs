use crate::ir::ops::RiseOp;
use crate::ir::types::RiseType;
use crate::ir::value::{Value, ValueId, ValueIds};

/// An opaque index identifying a block within a lowering unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u32);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "^bb{}", self.0)
    }
}

/// An append-only sequence of operations with typed arguments.
///
/// Invariants maintained by `RiseBuilder`:
/// 1. `args` are defined before any op in this block.
/// 2. At most one `Return`, and only as the last op.
/// 3. Every combinator op is directly followed by the `Apply` consuming it.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub args: Vec<Value>,
    pub ops: Vec<RiseOp>,
}

impl Block {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            args: Vec::new(),
            ops: Vec::new(),
        }
    }

    /// Creates a block with one fresh argument per type.
    pub fn from_arg_types(id: BlockId, ids: &mut ValueIds, arg_types: &[RiseType]) -> Self {
        let args = arg_types
            .iter()
            .map(|ty| Value::new(ids.fresh(), ty.clone()))
            .collect();
        Self {
            id,
            args,
            ops: Vec::new(),
        }
    }

    /// Returns the trailing `Return` if the block is sealed by one.
    pub fn terminator(&self) -> Option<&RiseOp> {
        self.ops.last().filter(|op| op.is_terminator())
    }

    pub fn is_sealed(&self) -> bool {
        self.terminator().is_some()
    }

    pub fn last_op(&self) -> Option<&RiseOp> {
        self.ops.last()
    }

    pub fn push(&mut self, op: RiseOp) {
        self.ops.push(op);
    }

    /// Iterates over all `ValueId`s defined directly in this block
    /// (arguments, then op results). Nested regions are not included.
    pub fn all_defs(&self) -> impl Iterator<Item = ValueId> + '_ {
        let arg_ids = self.args.iter().map(|a| a.id);
        let result_ids = self.ops.iter().filter_map(|op| op.result().map(|v| v.id));
        arg_ids.chain(result_ids)
    }
}

/// An ordered list of blocks owned by an op. RISE ops only ever carry
/// single-block regions.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub blocks: Vec<Block>,
}

impl Region {
    pub fn from_block(block: Block) -> Self {
        Self {
            blocks: vec![block],
        }
    }

    /// The region's only block.
    pub fn block(&self) -> Option<&Block> {
        match self.blocks.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}
