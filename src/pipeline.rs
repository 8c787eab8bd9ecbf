//! Pipeline sequencing.
//!
//! [`Session`] owns one compile end-to-end: source table, diagnostics
//! sink, and type graph, stepping through tokenize → type-lower →
//! function-lower → analyze in the fixed order the rest of the crate's
//! modules assume. Each stage is logged at `debug!` so a `RUST_LOG=debug`
//! run traces exactly where time (or a crash) went.

use log::debug;

use crate::cst::SourceFile;
use crate::diagnostics::Diagnostics;
use crate::lower_func::{FuncLowering, LowerCtx};
use crate::mir::Function;
use crate::namespace::{self, NamespaceContext, ScopeId};
use crate::source::FileTable;
use crate::token::TokenStream;
use crate::types::TypeGraph;
use crate::{analysis, lower_types};

/// One end-to-end compile. Holds the tables a single run accumulates
/// state into; nothing here is meant to outlive the run.
pub struct Session {
    pub files: FileTable,
    pub types: TypeGraph,
    pub diagnostics: Diagnostics,
    pub functions: Vec<Function>,
    pub tokens: TokenStream,
    pub namespace: NamespaceContext,
}

impl Session {
    pub fn new() -> Self {
        Self {
            files: FileTable::new(),
            types: TypeGraph::new(),
            diagnostics: Diagnostics::new(),
            functions: Vec::new(),
            tokens: TokenStream::new(),
            namespace: NamespaceContext::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Runs the full pipeline with an empty token stream — the convenience
    /// entry point for callers that already have a `SourceFile` but no
    /// `±2 lines of context` to draw from (e.g. hand-built test trees).
    pub fn compile(&mut self, file: &SourceFile) {
        self.compile_with_tokens(file, TokenStream::new());
    }

    /// Runs the full pipeline over one already-parsed source file: declare
    /// types, complete types, build the namespace table, lower every
    /// function, then run all five analysis passes over each lowered
    /// function. `tokens` backs every diagnostic's ±2-line context.
    pub fn compile_with_tokens(&mut self, file: &SourceFile, tokens: TokenStream) {
        self.tokens = tokens;

        debug!("declaring types");
        lower_types::declare_types(&mut self.types, file);

        debug!("completing types");
        lower_types::complete_types(&mut self.types, file, &mut self.diagnostics);

        debug!("building namespace table");
        self.namespace = namespace::build(file, &self.tokens, &mut self.diagnostics);

        debug!("lowering functions");
        let root = self.namespace.root();
        self.lower_decls(file.decls, root);

        debug!("running analysis passes");
        for func in &self.functions {
            analysis::run_all(func, &self.types, &self.tokens, &mut self.diagnostics);
        }

        debug!(
            "compile finished: {} function(s), {} diagnostic(s)",
            self.functions.len(),
            self.diagnostics.size()
        );
    }

    fn lower_decls(&mut self, decls: &[crate::cst::Decl], scope: ScopeId) {
        for decl in decls {
            match decl {
                crate::cst::Decl::Function { name, .. } => {
                    debug!("lowering function '{name}'");
                    let ctx = LowerCtx { namespace: &self.namespace, scope, tokens: &self.tokens };
                    if let Some(func) = FuncLowering::lower(decl, &mut self.types, ctx, &mut self.diagnostics) {
                        self.functions.push(func);
                    }
                }
                crate::cst::Decl::Namespace { name, decls, .. } => {
                    if let Some(child) = self.namespace.child_scope(scope, name) {
                        self.lower_decls(decls, child);
                    }
                }
                _ => {}
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{Decl, TypeSpec};
    use crate::source::SourceRef;

    fn src() -> SourceRef {
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        SourceRef::new(f, 1, 0, 1)
    }

    #[test]
    fn compiling_empty_file_has_no_errors() {
        let file = SourceFile { decls: &[] };
        let mut session = Session::new();
        session.compile(&file);
        assert!(!session.has_errors());
    }

    #[test]
    fn compiling_one_function_lowers_it() {
        let s = src();
        let decls = [Decl::Function {
            name: "main",
            params: &[],
            ret: Some(TypeSpec::Named("i32")),
            body: &[crate::cst::Stmt::Return {
                value: Some(&crate::cst::Expr::IntLiteral { text: "0", src: s }),
                src: s,
            }],
            is_unsafe: false,
            src: s,
        }];
        let file = SourceFile { decls: &decls };
        let mut session = Session::new();
        session.compile(&file);
        assert_eq!(session.functions.len(), 1);
        assert!(!session.has_errors());
    }

    #[test]
    fn unknown_type_in_class_field_is_surfaced_as_diagnostic() {
        let s = src();
        let fields = [crate::cst::FieldDecl { name: "x", ty: TypeSpec::Named("Bogus"), src: s }];
        let decls = [Decl::Class { name: "Point", fields: &fields, src: s }];
        let file = SourceFile { decls: &decls };
        let mut session = Session::new();
        session.compile(&file);
        assert!(session.has_errors());
    }

    #[test]
    fn ambiguous_reference_through_two_used_namespaces_is_flagged() {
        let s = src();
        let a_body = [Decl::Function { name: "pi", params: &[], ret: None, body: &[], is_unsafe: false, src: s }];
        let b_body = [Decl::Function { name: "pi", params: &[], ret: None, body: &[], is_unsafe: false, src: s }];
        let caller_body = [crate::cst::Stmt::Return {
            value: Some(&crate::cst::Expr::Name { path: &["pi"], src: s }),
            src: s,
        }];
        let decls = [
            Decl::Namespace { name: "a", decls: &a_body, src: s },
            Decl::Namespace { name: "b", decls: &b_body, src: s },
            Decl::Namespace {
                name: "caller",
                decls: &[
                    Decl::Using { path: &["a"], src: s },
                    Decl::Using { path: &["b"], src: s },
                    Decl::Function {
                        name: "call_pi",
                        params: &[],
                        ret: None,
                        body: &caller_body,
                        is_unsafe: false,
                        src: s,
                    },
                ],
                src: s,
            },
        ];
        let file = SourceFile { decls: &decls };
        let mut session = Session::new();
        session.compile(&file);
        assert!(session.has_errors());
    }
}
