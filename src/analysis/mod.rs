//! The five whole-function analysis passes that run after MIR lowering.
//!
//! Each pass follows the same shape: an environment struct borrowing the
//! [`Function`](crate::mir::Function) it's checking, a `run` method that
//! walks it once and writes findings into a shared
//! [`Diagnostics`](crate::diagnostics::Diagnostics) sink, and no early
//! abort — passes don't stop each other, since a user fixing one class of
//! error wants to see the others in the same run.

pub mod borrow;
pub mod completeness;
pub mod return_consistency;
pub mod unreachable;
pub mod use_before_assign;

use crate::diagnostics::Diagnostics;
use crate::mir::Function;
use crate::token::TokenStream;
use crate::types::TypeGraph;

/// Runs all five passes over `func` in the fixed order the pipeline
/// specifies: unreachable code, return-type consistency, type
/// completeness, use-before-assignment, then the borrow-check skeleton.
pub fn run_all(func: &Function, graph: &TypeGraph, tokens: &TokenStream, diags: &mut Diagnostics) {
    unreachable::UnreachableCheck::new(func).run(tokens, diags);
    return_consistency::ReturnConsistencyCheck::new(func, graph).run(tokens, diags);
    completeness::CompletenessCheck::new(func, graph).run(tokens, diags);
    use_before_assign::UseBeforeAssignCheck::new(func).run(tokens, diags);
    borrow::BorrowCheck::new(func).run(diags);
}
