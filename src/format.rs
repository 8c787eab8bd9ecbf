//! Output formatters.
//!
//! `format_tree` renders a [`SourceFile`]'s CST as an indented XML tree,
//! one element per node, for the `format-tree` CLI command. `format_identity`
//! reconstructs the original source text from a [`TokenStream`] — the
//! round-trip property that proves the stream lost no bytes during
//! tokenization.

use std::fmt::Write as _;

use crate::cst::{Decl, Expr, SourceFile, Stmt, TypeSpec};
use crate::token::TokenStream;

pub struct Formatter;

impl Formatter {
    /// Reconstructs the original source text byte-for-byte.
    pub fn format_identity(tokens: &TokenStream) -> String {
        tokens.reconstruct()
    }

    /// Renders `file` as an indented XML-like tree.
    pub fn format_tree(file: &SourceFile) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "<source-file>");
        for decl in file.decls {
            write_decl(&mut out, decl, 1);
        }
        let _ = writeln!(out, "</source-file>");
        out
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_decl(out: &mut String, decl: &Decl, depth: usize) {
    indent(out, depth);
    match decl {
        Decl::Function { name, params, ret, body, is_unsafe, .. } => {
            let _ = writeln!(
                out,
                "<function name=\"{name}\" unsafe=\"{is_unsafe}\" params=\"{}\">",
                params.len()
            );
            if let Some(ret) = ret {
                indent(out, depth + 1);
                let _ = writeln!(out, "<returns>{}</returns>", type_spec_text(ret));
            }
            for stmt in *body {
                write_stmt(out, stmt, depth + 1);
            }
            indent(out, depth);
            let _ = writeln!(out, "</function>");
        }
        Decl::Class { name, fields, .. } => {
            let _ = writeln!(out, "<class name=\"{name}\">");
            for f in *fields {
                indent(out, depth + 1);
                let _ = writeln!(out, "<field name=\"{}\" type=\"{}\"/>", f.name, type_spec_text(&f.ty));
            }
            indent(out, depth);
            let _ = writeln!(out, "</class>");
        }
        Decl::Enum { name, variants, .. } => {
            let _ = writeln!(out, "<enum name=\"{name}\">");
            for v in *variants {
                indent(out, depth + 1);
                let _ = writeln!(out, "<variant name=\"{}\"/>", v.name);
            }
            indent(out, depth);
            let _ = writeln!(out, "</enum>");
        }
        Decl::Typedef { name, target, .. } => {
            let _ = writeln!(out, "<typedef name=\"{name}\" target=\"{}\"/>", type_spec_text(target));
        }
        Decl::Namespace { name, decls, .. } => {
            let _ = writeln!(out, "<namespace name=\"{name}\">");
            for d in *decls {
                write_decl(out, d, depth + 1);
            }
            indent(out, depth);
            let _ = writeln!(out, "</namespace>");
        }
        Decl::Using { path, .. } => {
            let _ = writeln!(out, "<using path=\"{}\"/>", path.join("::"));
        }
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    indent(out, depth);
    match stmt {
        Stmt::Let { name, .. } => {
            let _ = writeln!(out, "<let name=\"{name}\"/>");
        }
        Stmt::Expr { .. } => {
            let _ = writeln!(out, "<expr/>");
        }
        Stmt::Return { .. } => {
            let _ = writeln!(out, "<return/>");
        }
        Stmt::If { then_branch, else_branch, .. } => {
            let _ = writeln!(out, "<if>");
            for s in *then_branch {
                write_stmt(out, s, depth + 1);
            }
            if let Some(else_branch) = else_branch {
                indent(out, depth + 1);
                let _ = writeln!(out, "<else>");
                for s in *else_branch {
                    write_stmt(out, s, depth + 2);
                }
                indent(out, depth + 1);
                let _ = writeln!(out, "</else>");
            }
            indent(out, depth);
            let _ = writeln!(out, "</if>");
        }
        Stmt::While { body, .. } => {
            let _ = writeln!(out, "<while>");
            for s in *body {
                write_stmt(out, s, depth + 1);
            }
            indent(out, depth);
            let _ = writeln!(out, "</while>");
        }
        Stmt::Break { .. } => {
            let _ = writeln!(out, "<break/>");
        }
        Stmt::Continue { .. } => {
            let _ = writeln!(out, "<continue/>");
        }
        Stmt::Label { name, .. } => {
            let _ = writeln!(out, "<label name=\"{name}\"/>");
        }
        Stmt::Goto { label, .. } => {
            let _ = writeln!(out, "<goto label=\"{label}\"/>");
        }
        Stmt::Block { stmts, .. } => {
            let _ = writeln!(out, "<block>");
            for s in *stmts {
                write_stmt(out, s, depth + 1);
            }
            indent(out, depth);
            let _ = writeln!(out, "</block>");
        }
    }
}

fn type_spec_text(spec: &TypeSpec) -> String {
    match spec {
        TypeSpec::Named(name) => name.to_string(),
        TypeSpec::Pointer(inner) => format!("{}*", type_spec_text(inner)),
        TypeSpec::Reference(inner) => format!("{}&", type_spec_text(inner)),
        TypeSpec::Array(inner, len) => format!("{}[{}]", type_spec_text(inner), len),
    }
}

#[allow(dead_code)]
fn expr_kind_name(expr: &Expr) -> &'static str {
    match expr {
        Expr::IntLiteral { .. } => "int-literal",
        Expr::FloatLiteral { .. } => "float-literal",
        Expr::StringLiteral { .. } => "string-literal",
        Expr::CharLiteral { .. } => "char-literal",
        Expr::BoolLiteral { .. } => "bool-literal",
        Expr::Name { .. } => "name",
        Expr::Binary { .. } => "binary",
        Expr::Unary { .. } => "unary",
        Expr::Call { .. } => "call",
        Expr::Index { .. } => "index",
        Expr::Field { .. } => "field",
        Expr::Assign { .. } => "assign",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FileId, FileTable, SourceRef};
    use crate::token::TokenKind;

    fn src() -> SourceRef {
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        SourceRef::new(f, 1, 0, 1)
    }

    #[test]
    fn format_identity_round_trips() {
        let mut files = FileTable::new();
        let f: FileId = files.intern("a.gy");
        let mut ts = TokenStream::new();
        ts.add_token(TokenKind::KwFn, "fn", f, 1, 0);
        ts.add_token(TokenKind::Whitespace, " ", f, 1, 2);
        ts.add_token(TokenKind::Identifier, "main", f, 1, 3);
        assert_eq!(Formatter::format_identity(&ts), "fn main");
    }

    #[test]
    fn format_tree_wraps_root_element() {
        let file = SourceFile { decls: &[] };
        let out = Formatter::format_tree(&file);
        assert!(out.starts_with("<source-file>"));
        assert!(out.trim_end().ends_with("</source-file>"));
    }

    #[test]
    fn format_tree_renders_function_with_name() {
        let s = src();
        let decls = [Decl::Function { name: "main", params: &[], ret: None, body: &[], is_unsafe: false, src: s }];
        let file = SourceFile { decls: &decls };
        let out = Formatter::format_tree(&file);
        assert!(out.contains("name=\"main\""));
    }

    #[test]
    fn format_tree_nests_namespace_children() {
        let s = src();
        let inner = [Decl::Function { name: "f", params: &[], ret: None, body: &[], is_unsafe: false, src: s }];
        let decls = [Decl::Namespace { name: "ns", decls: &inner, src: s }];
        let file = SourceFile { decls: &decls };
        let out = Formatter::format_tree(&file);
        assert!(out.contains("<namespace name=\"ns\">"));
        assert!(out.contains("name=\"f\""));
    }
}
