//! Return-type consistency.
//!
//! Every `Return` operation in a function must either all carry a value
//! (when the function's declared return type isn't `void`) or all omit one
//! (when it is). Mixing the two, or returning a value of a different type
//! than the function's declared return type, is reported here rather than
//! left to a later type check, since MIR has already resolved every
//! operand's `TypeId`.

use crate::diagnostics::{Diagnostics, Error};
use crate::mir::{Function, Operand, Operation};
use crate::source::SourceRef;
use crate::token::TokenStream;
use crate::types::{TypeGraph, TypeKind};

pub struct ReturnConsistencyCheck<'f> {
    func: &'f Function,
    graph: &'f TypeGraph,
}

impl<'f> ReturnConsistencyCheck<'f> {
    pub fn new(func: &'f Function, graph: &'f TypeGraph) -> Self {
        Self { func, graph }
    }

    pub fn run(&self, tokens: &TokenStream, diags: &mut Diagnostics) {
        let wants_void = matches!(self.graph.get(self.func.ret).kind, TypeKind::Void);
        for block in &self.func.blocks {
            for op in &block.ops {
                if let Operation::Return { value, src } = op {
                    match (wants_void, value) {
                        (true, Some(_)) => {
                            diags.add(
                                Error::new(format!(
                                    "'{}' returns void but this return has a value",
                                    self.func.name
                                ))
                                .with_message(*src, "here", tokens),
                            );
                        }
                        (false, None) => {
                            diags.add(
                                Error::new(format!(
                                    "'{}' must return a value on every path",
                                    self.func.name
                                ))
                                .with_message(*src, "missing return value", tokens),
                            );
                        }
                        (false, Some(operand)) => self.check_value_type(operand, *src, tokens, diags),
                        (true, None) => {}
                    }
                }
            }
        }
    }

    /// Compares the returned operand's resolved type against the function's
    /// declared return type, emitting two messages on a mismatch: one at
    /// the return itself, one at the function signature.
    fn check_value_type(&self, operand: &Operand, src: SourceRef, tokens: &TokenStream, diags: &mut Diagnostics) {
        let actual_name = match operand {
            Operand::Tmp(tmp) => {
                let actual = self.func.tmp_type(*tmp);
                (actual != self.func.ret).then(|| self.graph.display_name(actual))
            }
            Operand::IntConst(_, ty) | Operand::FloatConst(_, ty) => {
                (*ty != self.func.ret).then(|| self.graph.display_name(*ty))
            }
            Operand::BoolConst(_) => {
                (!matches!(self.graph.get(self.func.ret).kind, TypeKind::Bool)).then(|| "bool".to_string())
            }
        };
        let Some(actual_name) = actual_name else { return };
        diags.add(
            Error::new(format!(
                "return value of type {actual_name} but function is declared to return {}",
                self.graph.display_name(self.func.ret)
            ))
            .with_message(src, "return value has this type", tokens)
            .with_message(self.func.src, "function is declared to return here", tokens),
        );
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
    fn void_function_with_empty_return_is_fine() {
        let s = src();
        let mut graph = TypeGraph::new();
        let void = graph.void(s);
        let mut func = Function::new("f", void, s);
        let entry = func.new_block();
        func.block_mut(entry).push(Operation::Return { value: None, src: s });
        let mut diags = Diagnostics::new();
        ReturnConsistencyCheck::new(&func, &graph).run(&TokenStream::new(), &mut diags);
        assert!(!diags.has_errors());
    }

    #[test]
    fn void_function_returning_a_value_is_flagged() {
        let s = src();
        let mut graph = TypeGraph::new();
        let void = graph.void(s);
        let i32id = graph.int(crate::types::IntWidth::I32, s);
        let mut func = Function::new("f", void, s);
        let entry = func.new_block();
        func.block_mut(entry)
            .push(Operation::Return { value: Some(crate::mir::Operand::IntConst(1, i32id)), src: s });
        let mut diags = Diagnostics::new();
        ReturnConsistencyCheck::new(&func, &graph).run(&TokenStream::new(), &mut diags);
        assert!(diags.has_errors());
    }

    #[test]
    fn nonvoid_function_with_missing_value_is_flagged() {
        let s = src();
        let mut graph = TypeGraph::new();
        let i32id = graph.int(crate::types::IntWidth::I32, s);
        let mut func = Function::new("f", i32id, s);
        let entry = func.new_block();
        func.block_mut(entry).push(Operation::Return { value: None, src: s });
        let mut diags = Diagnostics::new();
        ReturnConsistencyCheck::new(&func, &graph).run(&TokenStream::new(), &mut diags);
        assert!(diags.has_errors());
    }

    #[test]
    fn returning_wrong_type_is_flagged_with_two_messages() {
        let s = src();
        let mut graph = TypeGraph::new();
        let i32id = graph.int(crate::types::IntWidth::I32, s);
        let f32id = graph.float32(s);
        let mut func = Function::new("f", i32id, s);
        let entry = func.new_block();
        func.block_mut(entry)
            .push(Operation::Return { value: Some(Operand::FloatConst(1.0, f32id)), src: s });
        let mut diags = Diagnostics::new();
        ReturnConsistencyCheck::new(&func, &graph).run(&TokenStream::new(), &mut diags);
        assert!(diags.has_errors());
        assert_eq!(diags.get(0).messages.len(), 2);
        assert!(diags.get(0).headline.contains("f32"));
        assert!(diags.get(0).headline.contains("i32"));
    }

    #[test]
    fn returning_matching_type_is_fine() {
        let s = src();
        let mut graph = TypeGraph::new();
        let i32id = graph.int(crate::types::IntWidth::I32, s);
        let mut func = Function::new("f", i32id, s);
        let entry = func.new_block();
        func.block_mut(entry).push(Operation::Return { value: Some(Operand::IntConst(1, i32id)), src: s });
        let mut diags = Diagnostics::new();
        ReturnConsistencyCheck::new(&func, &graph).run(&TokenStream::new(), &mut diags);
        assert!(!diags.has_errors());
    }
}
