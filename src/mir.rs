//! Mid-level IR: typed three-address code organized into basic blocks.
//!
//! A [`Function`] is a flat `Vec<BasicBlock>`; each block is a run of
//! [`Operation`]s ending in exactly one terminating operation (`Return`,
//! `Jump`, `Branch`). Values are named by [`TmpId`] and always carry a
//! [`TypeId`]; there is no untyped intermediate step.

use crate::source::SourceRef;
use crate::types::TypeId;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TmpId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BlockId(pub u32);

#[derive(Clone, Copy, Debug)]
pub enum Operand {
    Tmp(TmpId),
    IntConst(i64, TypeId),
    FloatConst(f64, TypeId),
    BoolConst(bool),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A single three-address operation. Every op that produces a value binds
/// a fresh [`TmpId`]; the block's terminating op never produces one.
#[derive(Clone, Debug)]
pub enum Operation {
    BinOp { dest: TmpId, op: BinOp, lhs: Operand, rhs: Operand, ty: TypeId, src: SourceRef },
    Load { dest: TmpId, place: TmpId, ty: TypeId, src: SourceRef },
    Store { place: TmpId, value: Operand, src: SourceRef },
    AddrOf { dest: TmpId, place: TmpId, ty: TypeId, src: SourceRef },
    Call { dest: Option<TmpId>, func: String, args: Vec<Operand>, ty: TypeId, src: SourceRef },
    Cast { dest: TmpId, value: Operand, ty: TypeId, src: SourceRef },
    /// Terminator: unconditional jump.
    Jump { target: BlockId, src: SourceRef },
    /// Terminator: conditional jump.
    Branch { cond: Operand, if_true: BlockId, if_false: BlockId, src: SourceRef },
    /// Terminator: return from the function.
    Return { value: Option<Operand>, src: SourceRef },
    /// Terminator: marks a block the lowering knows can never execute
    /// (e.g. past a jump-skips-initialization error, or the tail of a
    /// function whose every path already returned).
    Unreachable { src: SourceRef },
}

impl Operation {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Operation::Jump { .. } | Operation::Branch { .. } | Operation::Return { .. } | Operation::Unreachable { .. }
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct BasicBlock {
    pub ops: Vec<Operation>,
}

impl BasicBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `op`, after checking that the block doesn't already have a
    /// terminator — a basic block has exactly one, and it's always last.
    pub fn push(&mut self, op: Operation) {
        debug_assert!(
            self.ops.last().map(|o| !o.is_terminator()).unwrap_or(true),
            "pushed an operation after a block terminator"
        );
        self.ops.push(op);
    }

    pub fn terminator(&self) -> Option<&Operation> {
        self.ops.last().filter(|o| o.is_terminator())
    }
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub ty: TypeId,
    pub tmp: TmpId,
}

/// A lowered function: parameters, return type, and a flat list of basic
/// blocks. Block 0 is always the entry block.
#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: TypeId,
    pub blocks: Vec<BasicBlock>,
    pub tmp_types: Vec<TypeId>,
    pub src: SourceRef,
}

impl Function {
    pub fn new(name: impl Into<String>, ret: TypeId, src: SourceRef) -> Self {
        Self { name: name.into(), params: Vec::new(), ret, blocks: Vec::new(), tmp_types: Vec::new(), src }
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new());
        id
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0 as usize]
    }

    /// Allocates a fresh temporary of type `ty`.
    pub fn new_tmp(&mut self, ty: TypeId) -> TmpId {
        let id = TmpId(self.tmp_types.len() as u32);
        self.tmp_types.push(ty);
        id
    }

    pub fn tmp_type(&self, id: TmpId) -> TypeId {
        self.tmp_types[id.0 as usize]
    }

    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    /// Every block ends in exactly one terminator. Used by the unreachable
    /// and return-consistency passes as a cheap sanity precondition.
    pub fn all_blocks_terminated(&self) -> bool {
        self.blocks.iter().all(|b| b.terminator().is_some())
    }
}
