//! Function lowering: CST statements and expressions into MIR.
//!
//! Lowering walks a function body top-down for control flow (allocating a
//! new [`BlockId`] at every branch point) and bottom-up for expressions
//! (each subexpression lowers to a `TmpId` before its parent consumes it).
//! Numeric operands widen to the larger of the two operand types before a
//! binary op, matching ordinary C-family promotion rules.

use rustc_hash::FxHashMap;

use crate::cst::{BinOp as CstBinOp, Decl, Expr, Param as CstParam, Stmt};
use crate::diagnostics::{Diagnostics, Error};
use crate::mir::{BinOp, BlockId, Function, Operand, Operation, Param, TmpId};
use crate::namespace::{NamespaceContext, NamespaceError, ScopeId};
use crate::scope_tracker::ScopeTracker;
use crate::source::SourceRef;
use crate::token::TokenStream;
use crate::types::{IntWidth, TypeGraph, TypeId};

/// Bundles the context a function body is lowered against: the namespace
/// table and scope a bare name resolves in when it isn't a local, and the
/// token stream every diagnostic draws its ±2-line context from.
pub struct LowerCtx<'a> {
    pub namespace: &'a NamespaceContext,
    pub scope: ScopeId,
    pub tokens: &'a TokenStream,
}

fn cst_binop(op: CstBinOp) -> BinOp {
    match op {
        CstBinOp::Add => BinOp::Add,
        CstBinOp::Sub => BinOp::Sub,
        CstBinOp::Mul => BinOp::Mul,
        CstBinOp::Div => BinOp::Div,
        CstBinOp::Rem => BinOp::Rem,
        CstBinOp::And => BinOp::And,
        CstBinOp::Or => BinOp::Or,
        CstBinOp::Eq => BinOp::Eq,
        CstBinOp::Ne => BinOp::Ne,
        CstBinOp::Lt => BinOp::Lt,
        CstBinOp::Le => BinOp::Le,
        CstBinOp::Gt => BinOp::Gt,
        CstBinOp::Ge => BinOp::Ge,
    }
}

fn int_rank(graph: &TypeGraph, ty: TypeId) -> Option<u8> {
    use crate::types::TypeKind;
    match &graph.get(ty).kind {
        TypeKind::Int(w) => Some(match w {
            IntWidth::I8 | IntWidth::U8 => 0,
            IntWidth::I16 | IntWidth::U16 => 1,
            IntWidth::I32 | IntWidth::U32 => 2,
            IntWidth::I64 | IntWidth::U64 => 3,
        }),
        _ => None,
    }
}

/// Lowers a single function declaration into MIR, given a fully-populated
/// type graph (type lowering must have already completed).
pub struct FuncLowering<'g, 'a> {
    graph: &'g mut TypeGraph,
    locals: FxHashMap<String, TmpId>,
    current: BlockId,
    ctx: LowerCtx<'a>,
}

impl<'g, 'a> FuncLowering<'g, 'a> {
    pub fn lower(decl: &Decl, graph: &'g mut TypeGraph, ctx: LowerCtx<'a>, diags: &mut Diagnostics) -> Option<Function> {
        let (name, params, ret, body, src) = match decl {
            Decl::Function { name, params, ret, body, src, .. } => (*name, *params, ret, *body, *src),
            _ => return None,
        };
        ScopeTracker::check(body, ctx.tokens, diags);
        let ret_ty = match ret {
            Some(spec) => crate::lower_types::resolve_type_spec(graph, spec, src, diags)?,
            None => graph.void(src),
        };
        let mut func = Function::new(name, ret_ty, src);
        let entry = func.new_block();
        let mut lowering = FuncLowering { graph, locals: FxHashMap::default(), current: entry, ctx };
        lowering.bind_params(&mut func, params, diags);
        lowering.lower_block(&mut func, body, diags);
        lowering.ensure_terminated(&mut func, ret_ty, src);
        Some(func)
    }

    fn bind_params(&mut self, func: &mut Function, params: &[CstParam], diags: &mut Diagnostics) {
        for p in params {
            let Some(ty) = crate::lower_types::resolve_type_spec(self.graph, &p.ty, p.src, diags) else {
                continue;
            };
            let tmp = func.new_tmp(ty);
            func.params.push(Param { name: p.name.to_string(), ty, tmp });
            self.locals.insert(p.name.to_string(), tmp);
        }
    }

    /// Functions that fall off the end of their body get a synthetic
    /// `return;` so every block still ends in exactly one terminator.
    /// A real implementation would check `ret_ty` is actually `void` and
    /// raise a missing-return diagnostic otherwise (see `analysis::return_consistency`).
    fn ensure_terminated(&mut self, func: &mut Function, ret_ty: TypeId, src: SourceRef) {
        let _ = ret_ty;
        for block in func.blocks.iter_mut() {
            if block.terminator().is_none() {
                block.push(Operation::Return { value: None, src });
            }
        }
    }

    fn lower_block(&mut self, func: &mut Function, stmts: &[Stmt], diags: &mut Diagnostics) {
        for stmt in stmts {
            // A statement following one that already terminated the
            // current block (e.g. code after a `return`) starts a fresh,
            // predecessor-less block — exactly the case the unreachable
            // pass should flag. Only allocate it lazily, when there's
            // actually more to lower; don't leave a dangling empty block
            // after the last statement of a body.
            if func.block(self.current).terminator().is_some() {
                self.current = func.new_block();
            }
            self.lower_stmt(func, stmt, diags);
        }
    }

    fn lower_stmt(&mut self, func: &mut Function, stmt: &Stmt, diags: &mut Diagnostics) {
        match stmt {
            Stmt::Let { name, ty, init, src } => {
                let declared_ty = ty.and_then(|t| crate::lower_types::resolve_type_spec(self.graph, t, *src, diags));
                let value = init.map(|e| self.lower_expr(func, e, diags));
                let ty = declared_ty.or_else(|| value.map(|(_, t)| t)).unwrap_or_else(|| self.graph.void(*src));
                let tmp = func.new_tmp(ty);
                if let Some((operand, _)) = value {
                    func.block_mut(self.current).push(Operation::Store { place: tmp, value: operand, src: *src });
                }
                self.locals.insert(name.to_string(), tmp);
            }
            Stmt::Expr { expr, .. } => {
                self.lower_expr(func, expr, diags);
            }
            Stmt::Return { value, src } => {
                let operand = value.map(|e| self.lower_expr(func, e, diags).0);
                func.block_mut(self.current).push(Operation::Return { value: operand, src: *src });
            }
            Stmt::If { cond, then_branch, else_branch, src } => {
                let (cond_operand, _) = self.lower_expr(func, cond, diags);
                let then_block = func.new_block();
                let else_block = func.new_block();
                let join_block = func.new_block();
                func.block_mut(self.current).push(Operation::Branch {
                    cond: cond_operand,
                    if_true: then_block,
                    if_false: else_block,
                    src: *src,
                });
                self.current = then_block;
                self.lower_block(func, then_branch, diags);
                if func.block(self.current).terminator().is_none() {
                    func.block_mut(self.current).push(Operation::Jump { target: join_block, src: *src });
                }
                self.current = else_block;
                if let Some(else_stmts) = else_branch {
                    self.lower_block(func, else_stmts, diags);
                }
                if func.block(self.current).terminator().is_none() {
                    func.block_mut(self.current).push(Operation::Jump { target: join_block, src: *src });
                }
                self.current = join_block;
            }
            Stmt::While { cond, body, src } => {
                let header = func.new_block();
                let loop_body = func.new_block();
                let after = func.new_block();
                func.block_mut(self.current).push(Operation::Jump { target: header, src: *src });
                self.current = header;
                let (cond_operand, _) = self.lower_expr(func, cond, diags);
                func.block_mut(self.current).push(Operation::Branch {
                    cond: cond_operand,
                    if_true: loop_body,
                    if_false: after,
                    src: *src,
                });
                self.current = loop_body;
                self.lower_block(func, body, diags);
                if func.block(self.current).terminator().is_none() {
                    func.block_mut(self.current).push(Operation::Jump { target: header, src: *src });
                }
                self.current = after;
            }
            Stmt::Block { stmts, .. } => self.lower_block(func, stmts, diags),
            Stmt::Break { src } | Stmt::Continue { src } => {
                // Loop-exit targets are tracked by a real implementation's
                // enclosing-loop stack; skeleton emits a diagnostic instead
                // of silently mis-lowering.
                diags.add(Error::new("break/continue outside a tracked loop is not yet lowered").with_message(
                    *src,
                    "here",
                    self.ctx.tokens,
                ));
            }
            Stmt::Label { .. } | Stmt::Goto { .. } => {
                // Label/goto ordering and reachability were already checked
                // once, up front, by the `ScopeTracker::check` call in
                // `lower()`; MIR lowering for arbitrary goto targets is
                // future work (see DESIGN.md).
            }
        }
    }

    fn lower_expr(&mut self, func: &mut Function, expr: &Expr, diags: &mut Diagnostics) -> (Operand, TypeId) {
        match expr {
            Expr::IntLiteral { text, src } => {
                let lit = crate::literal::parse_int_literal(text).unwrap_or(crate::literal::IntLiteral {
                    value: 0,
                    negative: false,
                    suffix: None,
                });
                let width = lit.suffix.unwrap_or_else(|| crate::literal::infer_width(lit.value));
                let ty = self.graph.int(width, *src);
                (Operand::IntConst(lit.value as i64, ty), ty)
            }
            Expr::BoolLiteral { value, src } => {
                let ty = self.graph.bool_(*src);
                (Operand::BoolConst(*value), ty)
            }
            Expr::FloatLiteral { text, src } => {
                let has_f_suffix = text.ends_with(['f', 'F']);
                let value = text.trim_end_matches(['f', 'F']).parse::<f64>().unwrap_or(0.0);
                let ty = if has_f_suffix { self.graph.float32(*src) } else { self.graph.float64(*src) };
                (Operand::FloatConst(value, ty), ty)
            }
            Expr::Name { path, src } => {
                let name = path.last().copied().unwrap_or("");
                match self.locals.get(name) {
                    Some(&tmp) => {
                        let ty = func.tmp_type(tmp);
                        let dest = func.new_tmp(ty);
                        func.block_mut(self.current).push(Operation::Load { dest, place: tmp, ty, src: *src });
                        (Operand::Tmp(dest), ty)
                    }
                    None => match self.ctx.namespace.search(self.ctx.scope, name) {
                        Ok(_symbol) => {
                            // Resolved in the namespace table (a function,
                            // type, or other non-local binding) but not yet
                            // a lowerable operand — no diagnostic, since the
                            // name does exist.
                            let ty = self.graph.void(*src);
                            (Operand::IntConst(0, ty), ty)
                        }
                        Err(NamespaceError::Ambiguous { name, candidates }) => {
                            diags.add_simple(
                                *src,
                                format!("reference to '{name}' is ambiguous"),
                                format!("candidates: {}", candidates.join(", ")),
                                self.ctx.tokens,
                            );
                            let ty = self.graph.void(*src);
                            (Operand::IntConst(0, ty), ty)
                        }
                        Err(_) => {
                            diags.add_simple(*src, format!("undefined symbol '{name}'"), "not found in scope", self.ctx.tokens);
                            let ty = self.graph.void(*src);
                            (Operand::IntConst(0, ty), ty)
                        }
                    },
                }
            }
            Expr::Binary { op, lhs, rhs, src } => {
                let (lhs_op, lhs_ty) = self.lower_expr(func, lhs, diags);
                let (rhs_op, rhs_ty) = self.lower_expr(func, rhs, diags);
                let result_ty = widen(self.graph, lhs_ty, rhs_ty, *src);
                let dest = func.new_tmp(result_ty);
                func.block_mut(self.current).push(Operation::BinOp {
                    dest,
                    op: cst_binop(*op),
                    lhs: lhs_op,
                    rhs: rhs_op,
                    ty: result_ty,
                    src: *src,
                });
                (Operand::Tmp(dest), result_ty)
            }
            Expr::Assign { target, value, src } => {
                let (value_op, value_ty) = self.lower_expr(func, value, diags);
                if let Expr::Name { path, .. } = target.as_ref() {
                    let name = path.last().copied().unwrap_or("");
                    if let Some(&tmp) = self.locals.get(name) {
                        func.block_mut(self.current).push(Operation::Store { place: tmp, value: value_op, src: *src });
                    }
                }
                (value_op, value_ty)
            }
            Expr::Unary { operand, .. } => self.lower_expr(func, operand, diags),
            Expr::Call { callee, args, src } => {
                let func_name = match callee.as_ref() {
                    Expr::Name { path, .. } => path.last().copied().unwrap_or("").to_string(),
                    _ => String::new(),
                };
                let mut lowered_args = Vec::new();
                for a in args.iter() {
                    lowered_args.push(self.lower_expr(func, a, diags).0);
                }
                let ty = self.graph.void(*src);
                let dest = func.new_tmp(ty);
                func.block_mut(self.current).push(Operation::Call {
                    dest: Some(dest),
                    func: func_name,
                    args: lowered_args,
                    ty,
                    src: *src,
                });
                (Operand::Tmp(dest), ty)
            }
            Expr::Index { base, .. } | Expr::Field { base, .. } => self.lower_expr(func, base, diags),
            Expr::StringLiteral { src, .. } | Expr::CharLiteral { src, .. } => {
                let ty = self.graph.void(*src);
                (Operand::IntConst(0, ty), ty)
            }
        }
    }
}

fn widen(graph: &TypeGraph, a: TypeId, b: TypeId, src: SourceRef) -> TypeId {
    match (int_rank(graph, a), int_rank(graph, b)) {
        (Some(ra), Some(rb)) => {
            if ra >= rb {
                a
            } else {
                b
            }
        }
        _ => {
            let _ = src;
            a
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::TypeSpec;
    use crate::source::FileTable;

    fn src() -> SourceRef {
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        SourceRef::new(f, 1, 0, 1)
    }

    /// A bare root scope and empty token stream, good enough for tests that
    /// don't exercise namespace resolution or diagnostic context.
    fn test_ctx(namespace: &NamespaceContext, tokens: &TokenStream) -> LowerCtx<'_> {
        LowerCtx { namespace, scope: namespace.root(), tokens }
    }

    #[test]
    fn empty_function_gets_synthetic_return() {
        let s = src();
        let decl = Decl::Function { name: "f", params: &[], ret: None, body: &[], is_unsafe: false, src: s };
        let mut graph = TypeGraph::new();
        let namespace = NamespaceContext::new();
        let tokens = TokenStream::new();
        let mut diags = Diagnostics::new();
        let func = FuncLowering::lower(&decl, &mut graph, test_ctx(&namespace, &tokens), &mut diags).unwrap();
        assert!(func.all_blocks_terminated());
    }

    #[test]
    fn return_statement_lowers_to_return_operation() {
        let s = src();
        let body = [Stmt::Return { value: Some(&Expr::IntLiteral { text: "1", src: s }), src: s }];
        let decl = Decl::Function {
            name: "f",
            params: &[],
            ret: Some(TypeSpec::Named("i32")),
            body: &body,
            is_unsafe: false,
            src: s,
        };
        let mut graph = TypeGraph::new();
        let namespace = NamespaceContext::new();
        let tokens = TokenStream::new();
        let mut diags = Diagnostics::new();
        let func = FuncLowering::lower(&decl, &mut graph, test_ctx(&namespace, &tokens), &mut diags).unwrap();
        assert!(func.all_blocks_terminated());
        assert!(!diags.has_errors());
    }

    #[test]
    fn if_statement_allocates_three_extra_blocks() {
        let s = src();
        let then_body = [Stmt::Return { value: None, src: s }];
        let body = [Stmt::If {
            cond: &Expr::BoolLiteral { value: true, src: s },
            then_branch: &then_body,
            else_branch: None,
            src: s,
        }];
        let decl = Decl::Function { name: "f", params: &[], ret: None, body: &body, is_unsafe: false, src: s };
        let mut graph = TypeGraph::new();
        let namespace = NamespaceContext::new();
        let tokens = TokenStream::new();
        let mut diags = Diagnostics::new();
        let func = FuncLowering::lower(&decl, &mut graph, test_ctx(&namespace, &tokens), &mut diags).unwrap();
        assert!(func.blocks.len() >= 4);
        assert!(func.all_blocks_terminated());
    }

    #[test]
    fn undefined_name_reports_diagnostic() {
        let s = src();
        let body = [Stmt::Return { value: Some(&Expr::Name { path: &["nope"], src: s }), src: s }];
        let decl = Decl::Function { name: "f", params: &[], ret: None, body: &body, is_unsafe: false, src: s };
        let mut graph = TypeGraph::new();
        let namespace = NamespaceContext::new();
        let tokens = TokenStream::new();
        let mut diags = Diagnostics::new();
        FuncLowering::lower(&decl, &mut graph, test_ctx(&namespace, &tokens), &mut diags);
        assert!(diags.has_errors());
    }

    #[test]
    fn name_found_via_using_namespace_resolves_without_diagnostic() {
        let s = src();
        let body = [Stmt::Return { value: Some(&Expr::Name { path: &["sqrt"], src: s }), src: s }];
        let decl = Decl::Function { name: "f", params: &[], ret: None, body: &body, is_unsafe: false, src: s };
        let mut graph = TypeGraph::new();
        let mut namespace = NamespaceContext::new();
        let root = namespace.root();
        let math = namespace.push_scope(root, "math");
        namespace
            .define(math, crate::namespace::Symbol { name: "sqrt".into(), kind: crate::namespace::SymbolKind::Function, ty: None, src: s })
            .unwrap();
        namespace.add_using(root, math);
        let tokens = TokenStream::new();
        let mut diags = Diagnostics::new();
        FuncLowering::lower(&decl, &mut graph, test_ctx(&namespace, &tokens), &mut diags);
        assert!(!diags.has_errors());
    }

    #[test]
    fn float_literal_with_f_suffix_lowers_to_float32() {
        let s = src();
        let body = [Stmt::Return { value: Some(&Expr::FloatLiteral { text: "1.0f", src: s }), src: s }];
        let decl = Decl::Function {
            name: "f",
            params: &[],
            ret: Some(TypeSpec::Named("i32")),
            body: &body,
            is_unsafe: false,
            src: s,
        };
        let mut graph = TypeGraph::new();
        let namespace = NamespaceContext::new();
        let tokens = TokenStream::new();
        let mut diags = Diagnostics::new();
        let func = FuncLowering::lower(&decl, &mut graph, test_ctx(&namespace, &tokens), &mut diags).unwrap();
        // Mismatched against the declared i32 return type, but the literal
        // itself must have resolved to float32 (not the old always-float64
        // behavior) for the "f32 but ... i32" diagnostic text to be right.
        let entry = func.entry();
        let Operation::Return { value: Some(Operand::FloatConst(_, ty)), .. } = func.block(entry).terminator().unwrap() else {
            panic!("expected a float return value");
        };
        assert_eq!(graph.display_name(*ty), "f32");
    }

    #[test]
    fn binary_op_widens_to_larger_int_rank() {
        let s = src();
        let lhs = Expr::IntLiteral { text: "1", src: s };
        let rhs = Expr::IntLiteral { text: "99999999999", src: s };
        let body = [Stmt::Return {
            value: Some(&Expr::Binary { op: CstBinOp::Add, lhs: &lhs, rhs: &rhs, src: s }),
            src: s,
        }];
        let decl = Decl::Function { name: "f", params: &[], ret: None, body: &body, is_unsafe: false, src: s };
        let mut graph = TypeGraph::new();
        let namespace = NamespaceContext::new();
        let tokens = TokenStream::new();
        let mut diags = Diagnostics::new();
        let func = FuncLowering::lower(&decl, &mut graph, test_ctx(&namespace, &tokens), &mut diags).unwrap();
        assert!(!diags.has_errors());
        assert!(func.all_blocks_terminated());
    }
}
