//! Use-before-assignment dataflow.
//!
//! A forward, block-by-block dataflow pass: a `Store` to a place marks it
//! assigned; a `Load` from a place that hasn't been stored to on every
//! path reaching it is a use-before-assignment. Parameters start assigned
//! (the caller has already supplied their values). Blocks are visited in
//! index order and a place is considered assigned at block entry only if
//! every predecessor already had it assigned — approximated here by
//! intersecting the assigned-sets of blocks already visited that jump or
//! branch into this one, which is exact for the reducible control flow
//! `lower_func` produces (blocks are only ever entered via a `Jump` or
//! `Branch` that was itself already lowered).

use rustc_hash::FxHashSet;

use crate::diagnostics::{Diagnostics, Error};
use crate::mir::{BlockId, Function, Operand, Operation, TmpId};
use crate::token::TokenStream;

pub struct UseBeforeAssignCheck<'f> {
    func: &'f Function,
}

impl<'f> UseBeforeAssignCheck<'f> {
    pub fn new(func: &'f Function) -> Self {
        Self { func }
    }

    pub fn run(&self, tokens: &TokenStream, diags: &mut Diagnostics) {
        let predecessors = self.predecessors();
        let mut assigned_at_entry: Vec<Option<FxHashSet<TmpId>>> = vec![None; self.func.blocks.len()];
        let initial: FxHashSet<TmpId> = self.func.params.iter().map(|p| p.tmp).collect();
        assigned_at_entry[0] = Some(initial);

        for (idx, block) in self.func.blocks.iter().enumerate() {
            let id = BlockId(idx as u32);
            let mut assigned = assigned_at_entry[idx].clone().unwrap_or_else(|| self.intersect_preds(&predecessors, id, &assigned_at_entry));

            for op in &block.ops {
                self.check_operands(op, &assigned, tokens, diags);
                if let Operation::Store { place, .. } = op {
                    assigned.insert(*place);
                }
            }

            for &succ in &successors(block.terminator()) {
                let entry = assigned_at_entry[succ.0 as usize].take();
                assigned_at_entry[succ.0 as usize] = Some(match entry {
                    Some(existing) => existing.intersection(&assigned).copied().collect(),
                    None => assigned.clone(),
                });
            }
        }
    }

    fn intersect_preds(
        &self,
        predecessors: &[Vec<BlockId>],
        id: BlockId,
        assigned_at_entry: &[Option<FxHashSet<TmpId>>],
    ) -> FxHashSet<TmpId> {
        let preds = &predecessors[id.0 as usize];
        let mut sets = preds.iter().filter_map(|p| assigned_at_entry[p.0 as usize].clone());
        match sets.next() {
            Some(first) => sets.fold(first, |acc, s| acc.intersection(&s).copied().collect()),
            None => FxHashSet::default(),
        }
    }

    /// Only `Load.place` is subject to definite-assignment tracking: it
    /// names a storage slot that may or may not have been `Store`d to yet.
    /// Every other operand is a `TmpId` produced earlier in the same
    /// dataflow walk by the operation that computed it, so it's valid the
    /// moment it exists — there's no "unassigned computed value".
    fn check_operands(&self, op: &Operation, assigned: &FxHashSet<TmpId>, tokens: &TokenStream, diags: &mut Diagnostics) {
        if let Operation::Load { place, src, .. } = op {
            if !assigned.contains(place) {
                diags.add(Error::new(format!(
                    "'{}' reads an unassigned local",
                    self.func.name
                )).with_message(*src, "read here", tokens));
            }
        }
    }

    fn predecessors(&self) -> Vec<Vec<BlockId>> {
        let mut preds = vec![Vec::new(); self.func.blocks.len()];
        for (idx, block) in self.func.blocks.iter().enumerate() {
            let id = BlockId(idx as u32);
            for succ in successors(block.terminator()) {
                preds[succ.0 as usize].push(id);
            }
        }
        preds
    }
}

fn successors(term: Option<&Operation>) -> Vec<BlockId> {
    match term {
        Some(Operation::Jump { target, .. }) => vec![*target],
        Some(Operation::Branch { if_true, if_false, .. }) => vec![*if_true, *if_false],
        _ => Vec::new(),
    }
}
