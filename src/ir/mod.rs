pub mod block;
pub mod ops;
pub mod printer;
pub mod types;
pub mod value;

pub use block::{Block, BlockId, Region};
pub use ops::{LiteralValue, OpKind, RiseOp};
pub use types::{DType, DataType, FunType, Nat, RiseType};
pub use value::{Value, ValueId, ValueIds};
