//! Type completeness.
//!
//! By the time MIR lowering runs, every `TypeId` it references must be
//! complete: you can't store, load, or pass by value a composite or enum
//! whose fields or variants were never filled in (an incomplete type is
//! only legal behind a pointer or reference). This pass walks every
//! operand's type and flags incomplete direct uses.

use crate::diagnostics::{Diagnostics, Error};
use crate::mir::Function;
use crate::token::TokenStream;
use crate::types::{TypeGraph, TypeId};

pub struct CompletenessCheck<'f> {
    func: &'f Function,
    graph: &'f TypeGraph,
}

impl<'f> CompletenessCheck<'f> {
    pub fn new(func: &'f Function, graph: &'f TypeGraph) -> Self {
        Self { func, graph }
    }

    pub fn run(&self, tokens: &TokenStream, diags: &mut Diagnostics) {
        for (idx, ty) in self.func.tmp_types.iter().enumerate() {
            self.check(*ty, idx, tokens, diags);
        }
    }

    fn check(&self, ty: TypeId, tmp_idx: usize, tokens: &TokenStream, diags: &mut Diagnostics) {
        if !self.graph.is_complete(ty) {
            let name = self.graph.name_of(ty).unwrap_or("<anonymous>");
            let src = self.func.src;
            diags.add(
                Error::new(format!("use of incomplete type '{name}'")).with_message(
                    src,
                    format!("temporary #{tmp_idx} has an incomplete type"),
                    tokens,
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileTable;

    fn src() -> crate::source::SourceRef {
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        crate::source::SourceRef::new(f, 1, 0, 1)
    }

    #[test]
    fn complete_type_passes() {
        let s = src();
        let mut graph = TypeGraph::new();
        let i32id = graph.int(crate::types::IntWidth::I32, s);
        let mut func = Function::new("f", i32id, s);
        func.new_tmp(i32id);
        let mut diags = Diagnostics::new();
        CompletenessCheck::new(&func, &graph).run(&TokenStream::new(), &mut diags);
        assert!(!diags.has_errors());
    }

    #[test]
    fn incomplete_composite_direct_use_is_flagged() {
        let s = src();
        let mut graph = TypeGraph::new();
        let point = graph.declare_composite("Point", s);
        let mut func = Function::new("f", point, s);
        func.new_tmp(point);
        let mut diags = Diagnostics::new();
        CompletenessCheck::new(&func, &graph).run(&TokenStream::new(), &mut diags);
        assert!(diags.has_errors());
    }

    #[test]
    fn completed_composite_no_longer_flagged() {
        let s = src();
        let mut graph = TypeGraph::new();
        let point = graph.declare_composite("Point", s);
        graph.complete_composite(point, Vec::new());
        let mut func = Function::new("f", point, s);
        func.new_tmp(point);
        let mut diags = Diagnostics::new();
        CompletenessCheck::new(&func, &graph).run(&TokenStream::new(), &mut diags);
        assert!(!diags.has_errors());
    }
}
