//! Type-inferring builder for RISE programs.
//!
//! `RiseBuilder` owns a stack of open blocks. The top of the stack is the
//! active insertion block; every emitted op is appended there. Nested bodies
//! (lambdas, embeds, lowering units) push a fresh block, run a caller
//! callback, and pop it again through `ScopeGuard`, which restores the stack
//! on every exit path including `Err` returns and unwinding.
//!
//! Typical use:
//!
//! ```text
//! let unit = RiseBuilder::new().lowering_unit_with_args(&[buf, buf], |b, args| {
//!     let xs = b.in_value(&args[0], arr.clone())?;
//!     let ys = b.in_value(&args[1], arr.clone())?;
//!     let zipped = b.zip(&xs, &ys)?;
//!     b.ret(&zipped)
//! })?;
//! ```

use std::ops::{Deref, DerefMut};

use crate::error::BuildError;
use crate::ir::block::{Block, BlockId};
use crate::ir::ops::{LiteralValue, OpKind, RiseOp};
use crate::ir::types::{DataType, FunType, Nat, RiseType};
use crate::ir::value::{Value, ValueId, ValueIds};

/// Builder knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Reject `apply` calls whose argument count differs from the callee's
    /// curried arity.
    pub check_apply_arity: bool,
    /// Require a lowering unit body to end with `rise.return` or `rise.out`.
    pub require_unit_terminator: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            check_apply_arity: true,
            require_unit_terminator: true,
        }
    }
}

/// Stateful construction façade. See the module docs.
#[derive(Debug, Default)]
pub struct RiseBuilder {
    config: BuilderConfig,
    ids: ValueIds,
    next_block: u32,
    scopes: Vec<Block>,
}

/// Keeps a pushed scope on the builder's stack and truncates the stack back
/// to its entry depth when dropped.
struct ScopeGuard<'a> {
    builder: &'a mut RiseBuilder,
    depth: usize,
}

impl<'a> ScopeGuard<'a> {
    fn enter(builder: &'a mut RiseBuilder, block: Block) -> Self {
        let depth = builder.scopes.len();
        tracing::debug!(block = %block.id, depth, "open scope");
        builder.scopes.push(block);
        ScopeGuard { builder, depth }
    }

    /// Pops the scope's block. Anything a misbehaving body left above it is
    /// discarded.
    fn close(self) -> Option<Block> {
        let block = self.builder.scopes.split_off(self.depth).into_iter().next();
        if let Some(block) = &block {
            tracing::debug!(block = %block.id, ops = block.ops.len(), "close scope");
        }
        block
    }
}

impl Deref for ScopeGuard<'_> {
    type Target = RiseBuilder;

    fn deref(&self) -> &RiseBuilder {
        self.builder
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut RiseBuilder {
        self.builder
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.builder.scopes.truncate(self.depth);
    }
}

// ---------------------------------------------------------------------------
// Operand checks
// ---------------------------------------------------------------------------

fn expect_array<'v>(op: OpKind, what: &str, value: &'v Value) -> Result<(Nat, &'v DataType), BuildError> {
    value
        .data_type()
        .and_then(DataType::as_array)
        .ok_or_else(|| mismatch(op, what, value, "an array"))
}

fn expect_tuple<'v>(op: OpKind, what: &str, value: &'v Value) -> Result<(&'v DataType, &'v DataType), BuildError> {
    value
        .data_type()
        .and_then(DataType::as_tuple)
        .ok_or_else(|| mismatch(op, what, value, "a tuple"))
}

fn expect_fun<'v>(op: OpKind, what: &str, value: &'v Value) -> Result<&'v FunType, BuildError> {
    value
        .fun_type()
        .ok_or_else(|| mismatch(op, what, value, "a function"))
}

/// Fails unless `fun` takes an `elem` as its first argument.
fn expect_input(op: OpKind, fun: &Value, fun_ty: &FunType, elem: &DataType) -> Result<(), BuildError> {
    match fun_ty.input.as_data() {
        Some(input) if input == elem => Ok(()),
        _ => Err(mismatch(op, "function operand", fun, &format!("a function taking {}", elem))),
    }
}

fn mismatch(op: OpKind, what: &str, value: &Value, expected: &str) -> BuildError {
    BuildError::TypeMismatch {
        op: op.name(),
        operand: format!("{} {}", what, value.id),
        expected: expected.to_owned(),
        found: value.ty.to_string(),
    }
}

impl RiseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// The active insertion block, if a scope is open.
    pub fn current_block(&self) -> Option<&Block> {
        self.scopes.last()
    }

    pub fn current_block_id(&self) -> Option<BlockId> {
        self.scopes.last().map(|b| b.id)
    }

    /// Number of currently open scopes.
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    fn fresh_value(&mut self) -> ValueId {
        self.ids.fresh()
    }

    fn fresh_block_id(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        id
    }

    /// Fails unless there is an open, unsealed insertion block.
    fn ensure_open(&self, op: OpKind) -> Result<(), BuildError> {
        match self.scopes.last() {
            None => Err(BuildError::NoInsertionPoint { op: op.name() }),
            Some(block) if block.is_sealed() => Err(BuildError::MalformedScope {
                op: op.name(),
                detail: format!("block {} already ends with 'rise.return'", block.id),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Appends to the active block. Callers run `ensure_open` first.
    fn attach(&mut self, op: RiseOp) {
        tracing::trace!(op = op.name(), result = ?op.result().map(|v| v.id), "emit");
        if let Some(block) = self.scopes.last_mut() {
            block.push(op);
        }
    }

    /// Builds the `Apply` for `fun` and `args`, checking arity when enabled.
    fn make_apply(&mut self, fun: &Value, args: &[Value]) -> Result<RiseOp, BuildError> {
        let fun_ty = expect_fun(OpKind::Apply, "callee", fun)?;
        if self.config.check_apply_arity && fun_ty.arity() != args.len() {
            return Err(BuildError::ArityMismatch {
                expected: fun_ty.arity(),
                found: args.len(),
            });
        }
        let result = self.fresh_value();
        RiseOp::apply(result, fun, args)
    }

    /// Emits a combinator followed by the `Apply` consuming it. Either both
    /// ops are appended or neither is.
    fn emit_applied(&mut self, combinator: RiseOp, args: &[Value]) -> Result<Value, BuildError> {
        self.ensure_open(combinator.kind())?;
        let fun = combinator
            .result()
            .cloned()
            .ok_or_else(|| BuildError::MalformedScope {
                op: combinator.name(),
                detail: "combinator has no result".into(),
            })?;
        let apply = self.make_apply(&fun, args)?;
        let result = apply.result().cloned();
        self.attach(combinator);
        self.attach(apply);
        result.ok_or_else(|| BuildError::MalformedScope {
            op: OpKind::Apply.name(),
            detail: "apply has no result".into(),
        })
    }

    /// Runs `body` inside a fresh block with the given argument types and
    /// returns the finished block. The previous insertion block is active
    /// again when this returns, whether `body` succeeded or not.
    fn scoped<F>(&mut self, arg_types: &[RiseType], body: F) -> Result<Block, BuildError>
    where
        F: FnOnce(&mut RiseBuilder, &[Value]) -> Result<(), BuildError>,
    {
        let id = self.fresh_block_id();
        let block = Block::from_arg_types(id, &mut self.ids, arg_types);
        let args = block.args.clone();
        let mut guard = ScopeGuard::enter(self, block);
        let outcome = body(&mut *guard, &args);
        let block = guard.close();
        outcome?;
        block.ok_or_else(|| BuildError::MalformedScope {
            op: OpKind::Lambda.name(),
            detail: format!("scope {} was closed by its own body", id),
        })
    }

    // -----------------------------------------------------------------------
    // Boundary ops
    // -----------------------------------------------------------------------

    /// Marks `input` as entering the typed region as a value of type `ty`.
    pub fn in_value(&mut self, input: &Value, ty: DataType) -> Result<Value, BuildError> {
        self.ensure_open(OpKind::In)?;
        let result = self.fresh_value();
        let op = RiseOp::in_value(result, input, ty);
        let value = op.result().cloned();
        self.attach(op);
        value.ok_or(BuildError::NoInsertionPoint { op: OpKind::In.name() })
    }

    /// Writes `input` to the external sink `output`.
    pub fn out(&mut self, input: &Value, output: &Value) -> Result<(), BuildError> {
        self.ensure_open(OpKind::Out)?;
        self.attach(RiseOp::out(input, output));
        Ok(())
    }

    /// Terminates the active scope with `value`.
    pub fn ret(&mut self, value: &Value) -> Result<(), BuildError> {
        self.ensure_open(OpKind::Return)?;
        self.attach(RiseOp::ret(value));
        Ok(())
    }

    /// A constant under the caller-declared scalar type.
    pub fn literal(&mut self, value: LiteralValue, ty: DataType) -> Result<Value, BuildError> {
        self.ensure_open(OpKind::Literal)?;
        let result = self.fresh_value();
        let op = RiseOp::literal(result, value, ty)?;
        let value = op.result().cloned();
        self.attach(op);
        value.ok_or(BuildError::NoInsertionPoint { op: OpKind::Literal.name() })
    }

    // -----------------------------------------------------------------------
    // Combinators
    // -----------------------------------------------------------------------

    /// `zip(xs: Array(n,s), ys: Array(n,t)) : Array(n, Tuple(s,t))`
    pub fn zip(&mut self, left: &Value, right: &Value) -> Result<Value, BuildError> {
        let (n, s) = expect_array(OpKind::Zip, "left operand", left)?;
        let (m, t) = expect_array(OpKind::Zip, "right operand", right)?;
        if n != m {
            return Err(BuildError::ShapeMismatch {
                op: OpKind::Zip.name(),
                detail: format!(
                    "array lengths differ: {} has length {} but {} has length {}",
                    left.id, n, right.id, m
                ),
            });
        }
        let result = self.fresh_value();
        let zip = RiseOp::zip(result, n, s.clone(), t.clone());
        self.emit_applied(zip, &[left.clone(), right.clone()])
    }

    /// Pairs two arrays' element types: `tuple(Array(_,s), Array(_,t)) : Tuple(s,t)`.
    pub fn tuple(&mut self, left: &Value, right: &Value) -> Result<Value, BuildError> {
        let (_, s) = expect_array(OpKind::Tuple, "left operand", left)?;
        let (_, t) = expect_array(OpKind::Tuple, "right operand", right)?;
        let result = self.fresh_value();
        let tuple = RiseOp::tuple(result, s.clone(), t.clone());
        self.emit_applied(tuple, &[left.clone(), right.clone()])
    }

    /// `fst(v: Tuple(s,t)) : s`
    pub fn fst(&mut self, value: &Value) -> Result<Value, BuildError> {
        let (s, t) = expect_tuple(OpKind::Fst, "operand", value)?;
        let result = self.fresh_value();
        let fst = RiseOp::fst(result, s.clone(), t.clone());
        self.emit_applied(fst, std::slice::from_ref(value))
    }

    /// `snd(v: Tuple(s,t)) : t`
    pub fn snd(&mut self, value: &Value) -> Result<Value, BuildError> {
        let (s, t) = expect_tuple(OpKind::Snd, "operand", value)?;
        let result = self.fresh_value();
        let snd = RiseOp::snd(result, s.clone(), t.clone());
        self.emit_applied(snd, std::slice::from_ref(value))
    }

    /// `map(f, xs: Array(n,s)) : Array(n,t)`.
    ///
    /// `t` comes from `f`'s curried result: its element type when that result
    /// is an array, the result itself otherwise. The length is always `n`,
    /// never the length of an array returned by `f`. `f` must take an `s`.
    pub fn map(&mut self, fun: &Value, array: &Value) -> Result<Value, BuildError> {
        let (n, s) = expect_array(OpKind::Map, "array operand", array)?;
        let fun_ty = expect_fun(OpKind::Map, "function operand", fun)?;
        expect_input(OpKind::Map, fun, fun_ty, s)?;
        let output = fun_ty.curried_result();
        let t = match output.as_array() {
            Some((_, elem)) => elem.clone(),
            None => output.clone(),
        };
        let result = self.fresh_value();
        let map = RiseOp::map(result, n, s.clone(), t);
        self.emit_applied(map, &[fun.clone(), array.clone()])
    }

    /// `reduce(f, init, xs: Array(n,s)) : t`, where `f` is built as a lambda
    /// over `arg_types` by `body` and `t` is its curried result. The first
    /// entry of `arg_types` must be `s`.
    pub fn reduce<F>(
        &mut self,
        init: &Value,
        array: &Value,
        arg_types: &[RiseType],
        body: F,
    ) -> Result<Value, BuildError>
    where
        F: FnOnce(&mut RiseBuilder, &[Value]) -> Result<(), BuildError>,
    {
        self.ensure_open(OpKind::Reduce)?;
        let (n, s) = expect_array(OpKind::Reduce, "array operand", array)?;
        let s = s.clone();
        if arg_types.first() != Some(&RiseType::Data(s.clone())) {
            return Err(BuildError::TypeMismatch {
                op: OpKind::Reduce.name(),
                operand: "combining function".into(),
                expected: format!("a function taking {}", s),
                found: match arg_types.first() {
                    Some(ty) => format!("a function taking {}", ty),
                    None => "a function without arguments".into(),
                },
            });
        }
        let lambda = self.lambda(arg_types, body)?;
        let t = lambda.ty.curried_result().clone();
        let result = self.fresh_value();
        let reduce = RiseOp::reduce(result, n, s, t);
        self.emit_applied(reduce, &[lambda, init.clone(), array.clone()])
    }

    // -----------------------------------------------------------------------
    // Abstraction and application
    // -----------------------------------------------------------------------

    /// Builds a lambda whose body block has one argument per `arg_types`
    /// entry. `body` must finish the block with `ret`. The lambda's type is
    /// `Fun(a1, Fun(a2, ... R))` where `R` is the returned value's type.
    pub fn lambda<F>(&mut self, arg_types: &[RiseType], body: F) -> Result<Value, BuildError>
    where
        F: FnOnce(&mut RiseBuilder, &[Value]) -> Result<(), BuildError>,
    {
        self.ensure_open(OpKind::Lambda)?;
        let block = self.scoped(arg_types, body)?;
        let result = self.fresh_value();
        let op = RiseOp::lambda(result, block)?;
        let value = op.result().cloned();
        self.attach(op);
        value.ok_or(BuildError::NoInsertionPoint { op: OpKind::Lambda.name() })
    }

    /// Applies `fun` to `args`; the result is `fun`'s curried result type.
    pub fn apply(&mut self, fun: &Value, args: &[Value]) -> Result<Value, BuildError> {
        self.ensure_open(OpKind::Apply)?;
        let op = self.make_apply(fun, args)?;
        let value = op.result().cloned();
        self.attach(op);
        value.ok_or(BuildError::NoInsertionPoint { op: OpKind::Apply.name() })
    }

    /// Embeds foreign code. `block` is wrapped as-is and `result_ty` is taken
    /// on trust.
    pub fn embed(&mut self, args: &[Value], result_ty: RiseType, block: Block) -> Result<Value, BuildError> {
        self.ensure_open(OpKind::Embed)?;
        let result = self.fresh_value();
        let op = RiseOp::embed(result, args, result_ty, block);
        let value = op.result().cloned();
        self.attach(op);
        value.ok_or(BuildError::NoInsertionPoint { op: OpKind::Embed.name() })
    }

    /// Like `embed`, but builds the foreign block in a nested scope whose
    /// arguments mirror the types of `args`.
    pub fn embed_with<F>(&mut self, args: &[Value], result_ty: RiseType, body: F) -> Result<Value, BuildError>
    where
        F: FnOnce(&mut RiseBuilder, &[Value]) -> Result<(), BuildError>,
    {
        self.ensure_open(OpKind::Embed)?;
        let arg_types: Vec<RiseType> = args.iter().map(|a| a.ty.clone()).collect();
        let block = self.scoped(&arg_types, body)?;
        self.embed(args, result_ty, block)
    }

    // -----------------------------------------------------------------------
    // Top level
    // -----------------------------------------------------------------------

    /// Builds a lowering unit with an argument-less top-level block.
    pub fn lowering_unit<F>(&mut self, body: F) -> Result<RiseOp, BuildError>
    where
        F: FnOnce(&mut RiseBuilder) -> Result<(), BuildError>,
    {
        self.lowering_unit_with_args(&[], |b, _| body(b))
    }

    /// Builds a lowering unit whose top-level block takes `arg_types`
    /// (external buffers fed to `rise.in` / `rise.out`). The unit is returned,
    /// not attached to any enclosing block.
    pub fn lowering_unit_with_args<F>(&mut self, arg_types: &[RiseType], body: F) -> Result<RiseOp, BuildError>
    where
        F: FnOnce(&mut RiseBuilder, &[Value]) -> Result<(), BuildError>,
    {
        let block = self.scoped(arg_types, body)?;
        if self.config.require_unit_terminator
            && !matches!(block.last_op(), Some(RiseOp::Return { .. } | RiseOp::Out { .. }))
        {
            return Err(BuildError::MalformedScope {
                op: OpKind::LoweringUnit.name(),
                detail: format!(
                    "body must end with 'rise.return' or 'rise.out', found {}",
                    block.last_op().map(RiseOp::name).unwrap_or("an empty block")
                ),
            });
        }
        tracing::debug!(block = %block.id, ops = block.ops.len(), "built lowering unit");
        Ok(RiseOp::lowering_unit(block))
    }
}
