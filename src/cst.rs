//! Concrete syntax tree.
//!
//! CST nodes are a closed, tagged-variant enum per production, each
//! carrying its [`SourceRef`] and an arena-allocated slice of children. No
//! parser lives in this crate (that's an external collaborator, as with
//! the tokenizer); this module is the tree's data model, built by hand in
//! tests the way a real parser's output would look.

use bumpalo::collections::Vec as ArenaVec;
use bumpalo::Bump;

use crate::source::SourceRef;

/// Arena wrapper, generalizing the teacher's single-purpose bump arena into
/// a reusable generic owner for CST nodes, type-graph scratch data, and
/// anything else that wants to live for the length of one compile.
pub struct Arena {
    bump: Bump,
}

impl Arena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    pub fn alloc<T>(&self, value: T) -> &T {
        self.bump.alloc(value)
    }

    pub fn alloc_slice<'a, T: Clone>(&'a self, items: &[T]) -> &'a [T] {
        let mut v = ArenaVec::with_capacity_in(items.len(), &self.bump);
        v.extend_from_slice(items);
        v.into_bump_slice()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
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

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnOp {
    Neg,
    Not,
    Deref,
    AddrOf,
}

/// Type specifiers as written in source, before resolution against the
/// type graph.
#[derive(Clone, Debug)]
pub enum TypeSpec<'a> {
    Named(&'a str),
    Pointer(&'a TypeSpec<'a>),
    Reference(&'a TypeSpec<'a>),
    Array(&'a TypeSpec<'a>, u64),
}

#[derive(Clone, Debug)]
pub enum Expr<'a> {
    IntLiteral { text: &'a str, src: SourceRef },
    FloatLiteral { text: &'a str, src: SourceRef },
    StringLiteral { text: &'a str, src: SourceRef },
    CharLiteral { text: &'a str, src: SourceRef },
    BoolLiteral { value: bool, src: SourceRef },
    Name { path: &'a [&'a str], src: SourceRef },
    Binary { op: BinOp, lhs: &'a Expr<'a>, rhs: &'a Expr<'a>, src: SourceRef },
    Unary { op: UnOp, operand: &'a Expr<'a>, src: SourceRef },
    Call { callee: &'a Expr<'a>, args: &'a [Expr<'a>], src: SourceRef },
    Index { base: &'a Expr<'a>, index: &'a Expr<'a>, src: SourceRef },
    Field { base: &'a Expr<'a>, name: &'a str, src: SourceRef },
    Assign { target: &'a Expr<'a>, value: &'a Expr<'a>, src: SourceRef },
}

impl<'a> Expr<'a> {
    pub fn src(&self) -> SourceRef {
        match *self {
            Expr::IntLiteral { src, .. }
            | Expr::FloatLiteral { src, .. }
            | Expr::StringLiteral { src, .. }
            | Expr::CharLiteral { src, .. }
            | Expr::BoolLiteral { src, .. }
            | Expr::Name { src, .. }
            | Expr::Binary { src, .. }
            | Expr::Unary { src, .. }
            | Expr::Call { src, .. }
            | Expr::Index { src, .. }
            | Expr::Field { src, .. }
            | Expr::Assign { src, .. } => src,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Stmt<'a> {
    Let { name: &'a str, ty: Option<&'a TypeSpec<'a>>, init: Option<&'a Expr<'a>>, src: SourceRef },
    Expr { expr: &'a Expr<'a>, src: SourceRef },
    Return { value: Option<&'a Expr<'a>>, src: SourceRef },
    If { cond: &'a Expr<'a>, then_branch: &'a [Stmt<'a>], else_branch: Option<&'a [Stmt<'a>]>, src: SourceRef },
    While { cond: &'a Expr<'a>, body: &'a [Stmt<'a>], src: SourceRef },
    Break { src: SourceRef },
    Continue { src: SourceRef },
    Label { name: &'a str, src: SourceRef },
    Goto { label: &'a str, src: SourceRef },
    Block { stmts: &'a [Stmt<'a>], src: SourceRef },
}

impl<'a> Stmt<'a> {
    pub fn src(&self) -> SourceRef {
        match *self {
            Stmt::Let { src, .. }
            | Stmt::Expr { src, .. }
            | Stmt::Return { src, .. }
            | Stmt::If { src, .. }
            | Stmt::While { src, .. }
            | Stmt::Break { src }
            | Stmt::Continue { src }
            | Stmt::Label { src, .. }
            | Stmt::Goto { src, .. }
            | Stmt::Block { src, .. } => src,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Param<'a> {
    pub name: &'a str,
    pub ty: TypeSpec<'a>,
    pub src: SourceRef,
}

#[derive(Clone, Debug)]
pub struct FieldDecl<'a> {
    pub name: &'a str,
    pub ty: TypeSpec<'a>,
    pub src: SourceRef,
}

#[derive(Clone, Debug)]
pub struct VariantDecl<'a> {
    pub name: &'a str,
    pub discriminant: Option<i64>,
    pub src: SourceRef,
}

/// Top-level and nested declarations. `Namespace` and `Class` nest further
/// declarations, giving the tree the same shape `NamespaceContext` scopes
/// mirror one-to-one.
#[derive(Clone, Debug)]
pub enum Decl<'a> {
    Function {
        name: &'a str,
        params: &'a [Param<'a>],
        ret: Option<TypeSpec<'a>>,
        body: &'a [Stmt<'a>],
        is_unsafe: bool,
        src: SourceRef,
    },
    Class {
        name: &'a str,
        fields: &'a [FieldDecl<'a>],
        src: SourceRef,
    },
    Enum {
        name: &'a str,
        variants: &'a [VariantDecl<'a>],
        src: SourceRef,
    },
    Typedef {
        name: &'a str,
        target: TypeSpec<'a>,
        src: SourceRef,
    },
    Namespace {
        name: &'a str,
        decls: &'a [Decl<'a>],
        src: SourceRef,
    },
    Using {
        path: &'a [&'a str],
        src: SourceRef,
    },
}

impl<'a> Decl<'a> {
    pub fn src(&self) -> SourceRef {
        match *self {
            Decl::Function { src, .. }
            | Decl::Class { src, .. }
            | Decl::Enum { src, .. }
            | Decl::Typedef { src, .. }
            | Decl::Namespace { src, .. }
            | Decl::Using { src, .. } => src,
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        match *self {
            Decl::Function { name, .. }
            | Decl::Class { name, .. }
            | Decl::Enum { name, .. }
            | Decl::Typedef { name, .. }
            | Decl::Namespace { name, .. } => Some(name),
            Decl::Using { .. } => None,
        }
    }
}

/// A whole compiled file: its top-level declarations.
#[derive(Clone, Debug)]
pub struct SourceFile<'a> {
    pub decls: &'a [Decl<'a>],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileTable;

    fn src() -> SourceRef {
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        SourceRef::new(f, 1, 0, 1)
    }

    #[test]
    fn arena_allocates_and_returns_stable_refs() {
        let arena = Arena::new();
        let a = arena.alloc(5i32);
        let b = arena.alloc(6i32);
        assert_eq!(*a, 5);
        assert_eq!(*b, 6);
    }

    #[test]
    fn arena_alloc_slice_preserves_order() {
        let arena = Arena::new();
        let s = arena.alloc_slice(&[1, 2, 3]);
        assert_eq!(s, &[1, 2, 3]);
    }

    #[test]
    fn expr_src_reports_its_own_location() {
        let s = src();
        let e = Expr::IntLiteral { text: "1", src: s };
        assert_eq!(e.src(), s);
    }

    #[test]
    fn decl_name_is_none_for_using() {
        let s = src();
        let d = Decl::Using { path: &["a", "b"], src: s };
        assert_eq!(d.name(), None);
    }

    #[test]
    fn nested_namespace_holds_child_decls() {
        let arena = Arena::new();
        let s = src();
        let inner_decls = [Decl::Function {
            name: "f",
            params: &[],
            ret: None,
            body: &[],
            is_unsafe: false,
            src: s,
        }];
        let decls = arena.alloc_slice(&inner_decls);
        let ns = Decl::Namespace { name: "outer", decls, src: s };
        assert_eq!(ns.name(), Some("outer"));
        match ns {
            Decl::Namespace { decls, .. } => assert_eq!(decls.len(), 1),
            _ => unreachable!(),
        }
    }
}
