//! Unreachable-code analysis.
//!
//! A block is reachable if it's the entry block or some other reachable
//! block's terminator names it as a target. This is a plain forward
//! reachability walk over the block graph; blocks left unvisited at the
//! end are unreachable.

use rustc_hash::FxHashSet;

use crate::diagnostics::{Diagnostics, Error};
use crate::mir::{BlockId, Function, Operation};
use crate::token::TokenStream;

pub struct UnreachableCheck<'f> {
    func: &'f Function,
}

impl<'f> UnreachableCheck<'f> {
    pub fn new(func: &'f Function) -> Self {
        Self { func }
    }

    pub fn run(&self, tokens: &TokenStream, diags: &mut Diagnostics) {
        let reachable = self.reachable_blocks();
        for (idx, block) in self.func.blocks.iter().enumerate() {
            let id = BlockId(idx as u32);
            if reachable.contains(&id) {
                continue;
            }
            if let Some(op) = block.ops.first() {
                let src = op_src(op);
                diags.add(
                    Error::new(format!("unreachable code in '{}'", self.func.name))
                        .with_message(src, "this code can never execute", tokens),
                );
            }
        }
    }

    fn reachable_blocks(&self) -> FxHashSet<BlockId> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![self.func.entry()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            for target in successors(self.func.block(id).terminator()) {
                stack.push(target);
            }
        }
        seen
    }
}

fn successors(term: Option<&Operation>) -> Vec<BlockId> {
    match term {
        Some(Operation::Jump { target, .. }) => vec![*target],
        Some(Operation::Branch { if_true, if_false, .. }) => vec![*if_true, *if_false],
        _ => Vec::new(),
    }
}

fn op_src(op: &Operation) -> crate::source::SourceRef {
    match op {
        Operation::BinOp { src, .. }
        | Operation::Load { src, .. }
        | Operation::Store { src, .. }
        | Operation::AddrOf { src, .. }
        | Operation::Call { src, .. }
        | Operation::Cast { src, .. }
        | Operation::Jump { src, .. }
        | Operation::Branch { src, .. }
        | Operation::Return { src, .. }
        | Operation::Unreachable { src } => *src,
    }
}
