//! Namespace and scope tracking.
//!
//! [`NamespaceContext`] is a tree of scopes (global namespace, nested
//! namespaces, class bodies) each owning a flat table of [`Symbol`]s. Lookup
//! walks from the current scope outward, then tries qualified paths against
//! the root, mirroring the two-step "local first, then qualified" search a
//! nested-namespace language needs.

use rustc_hash::FxHashMap;

use crate::cst::{Decl, SourceFile};
use crate::diagnostics::{Diagnostics, Error};
use crate::source::SourceRef;
use crate::token::TokenStream;
use crate::types::TypeId;

/// A handle to a scope within a [`NamespaceContext`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ScopeId(u32);

/// What kind of thing a name is bound to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SymbolKind {
    Variable,
    Function,
    Type,
    Namespace,
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Option<TypeId>,
    pub src: SourceRef,
}

struct Scope {
    name: String,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    symbols: FxHashMap<String, Symbol>,
    /// Namespaces opened in this scope via `using namespace X;`.
    uses: Vec<ScopeId>,
}

/// Error produced by a failed lookup or a conflicting definition.
#[derive(Clone, Debug)]
pub enum NamespaceError {
    Undefined { name: String },
    AlreadyDefined { name: String, first: SourceRef },
    Ambiguous { name: String, candidates: Vec<String> },
}

/// Tree of scopes rooted at the global namespace.
pub struct NamespaceContext {
    scopes: Vec<Scope>,
    root: ScopeId,
}

impl NamespaceContext {
    pub fn new() -> Self {
        let root = Scope {
            name: String::new(),
            parent: None,
            children: Vec::new(),
            symbols: FxHashMap::default(),
            uses: Vec::new(),
        };
        Self { scopes: vec![root], root: ScopeId(0) }
    }

    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Creates a new child scope named `name` under `parent`.
    pub fn push_scope(&mut self, parent: ScopeId, name: &str) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            symbols: FxHashMap::default(),
            uses: Vec::new(),
        });
        self.scopes[parent.0 as usize].children.push(id);
        id
    }

    /// Existing child scope named `name` directly under `parent`, if any.
    pub fn child_scope(&self, parent: ScopeId, name: &str) -> Option<ScopeId> {
        self.scopes[parent.0 as usize]
            .children
            .iter()
            .copied()
            .find(|&c| self.scopes[c.0 as usize].name == name)
    }

    /// Opens `target` as a `using namespace` import visible from `scope`.
    pub fn add_using(&mut self, scope: ScopeId, target: ScopeId) {
        self.scopes[scope.0 as usize].uses.push(target);
    }

    /// Resolves a `::`-separated path to the namespace scope it names,
    /// starting the first segment from `scope` outward like
    /// [`Self::find_namespace`] and then descending through children only.
    pub fn resolve_namespace_path(&self, scope: ScopeId, path: &[&str]) -> Option<ScopeId> {
        let (&first, rest) = path.split_first()?;
        let mut cursor = self.find_namespace(scope, first).ok()?;
        for segment in rest {
            cursor = self.child_scope(cursor, segment)?;
        }
        Some(cursor)
    }

    /// Defines `symbol` in `scope`. Fails if the name is already bound
    /// directly in this scope (shadowing an outer scope's binding is fine).
    pub fn define(&mut self, scope: ScopeId, symbol: Symbol) -> Result<(), NamespaceError> {
        let table = &mut self.scopes[scope.0 as usize].symbols;
        if let Some(existing) = table.get(&symbol.name) {
            return Err(NamespaceError::AlreadyDefined { name: symbol.name, first: existing.src });
        }
        table.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Searches for `name` starting at `scope`, walking up through parents.
    /// If the lexical chain never binds `name` directly, falls back to the
    /// namespaces opened via `using` along that same chain: one match wins,
    /// two or more distinct matches is an `Ambiguous` reference.
    pub fn search(&self, scope: ScopeId, name: &str) -> Result<&Symbol, NamespaceError> {
        let mut current = Some(scope);
        let mut uses_seen = Vec::new();
        while let Some(id) = current {
            let s = &self.scopes[id.0 as usize];
            if let Some(sym) = s.symbols.get(name) {
                return Ok(sym);
            }
            uses_seen.extend(s.uses.iter().copied());
            current = s.parent;
        }

        let candidates: Vec<ScopeId> =
            uses_seen.into_iter().filter(|&u| self.scopes[u.0 as usize].symbols.contains_key(name)).collect();
        match candidates.as_slice() {
            [] => Err(NamespaceError::Undefined { name: name.to_string() }),
            [only] => Ok(&self.scopes[only.0 as usize].symbols[name]),
            many => Err(NamespaceError::Ambiguous {
                name: name.to_string(),
                candidates: many.iter().map(|&u| format!("{}::{name}", self.qualified_name(u))).collect(),
            }),
        }
    }

    /// Resolves a `::`-separated qualified path starting at `scope`.
    /// Each segment except the last must name a namespace scope; the last
    /// segment is looked up directly in that scope (no further upward
    /// search once a qualifier is present).
    pub fn search_qualified(&self, scope: ScopeId, path: &[&str]) -> Result<&Symbol, NamespaceError> {
        if path.len() == 1 {
            return self.search(scope, path[0]);
        }
        let mut cursor = self.find_namespace(scope, path[0])?;
        for segment in &path[1..path.len() - 1] {
            cursor = self.find_namespace(cursor, segment)?;
        }
        let last = path[path.len() - 1];
        self.scopes[cursor.0 as usize]
            .symbols
            .get(last)
            .ok_or_else(|| NamespaceError::Undefined { name: last.to_string() })
    }

    fn find_namespace(&self, from: ScopeId, name: &str) -> Result<ScopeId, NamespaceError> {
        let scope = &self.scopes[from.0 as usize];
        for &child in &scope.children {
            if self.scopes[child.0 as usize].name == name {
                return Ok(child);
            }
        }
        if let Some(parent) = scope.parent {
            return self.find_namespace(parent, name);
        }
        Err(NamespaceError::Undefined { name: name.to_string() })
    }

    /// Fully-qualified dotted path of a scope, for `dump-namespaces`.
    pub fn qualified_name(&self, scope: ScopeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0 as usize];
            if !s.name.is_empty() {
                parts.push(s.name.clone());
            }
            current = s.parent;
        }
        parts.reverse();
        parts.join("::")
    }

    /// All symbols directly defined in `scope`, sorted by name for
    /// deterministic dumps.
    pub fn symbols_in(&self, scope: ScopeId) -> Vec<&Symbol> {
        let mut syms: Vec<&Symbol> = self.scopes[scope.0 as usize].symbols.values().collect();
        syms.sort_by(|a, b| a.name.cmp(&b.name));
        syms
    }

    pub fn children(&self, scope: ScopeId) -> &[ScopeId] {
        &self.scopes[scope.0 as usize].children
    }
}

impl Default for NamespaceContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a `NamespaceContext` for `file` in two passes: the first
/// registers every namespace (as a scope, recursing into its children) and
/// every function/class/enum/typedef (as a symbol in the enclosing scope);
/// the second wires each `Decl::Using` into [`NamespaceContext::add_using`]
/// so a `using` naming a namespace declared later in the file still
/// resolves.
pub fn build(file: &SourceFile, tokens: &TokenStream, diags: &mut Diagnostics) -> NamespaceContext {
    let mut ctx = NamespaceContext::new();
    let root = ctx.root();
    declare_decls(&mut ctx, root, file.decls, tokens, diags);
    wire_usings(&mut ctx, root, file.decls);
    ctx
}

fn declare_decls(ctx: &mut NamespaceContext, scope: ScopeId, decls: &[Decl], tokens: &TokenStream, diags: &mut Diagnostics) {
    for decl in decls {
        match decl {
            Decl::Namespace { name, decls: inner, .. } => {
                let child = ctx.child_scope(scope, name).unwrap_or_else(|| ctx.push_scope(scope, name));
                declare_decls(ctx, child, inner, tokens, diags);
            }
            Decl::Function { name, src, .. } => declare_symbol(ctx, scope, name, SymbolKind::Function, *src, tokens, diags),
            Decl::Class { name, src, .. } => declare_symbol(ctx, scope, name, SymbolKind::Type, *src, tokens, diags),
            Decl::Enum { name, src, .. } => declare_symbol(ctx, scope, name, SymbolKind::Type, *src, tokens, diags),
            Decl::Typedef { name, src, .. } => declare_symbol(ctx, scope, name, SymbolKind::Type, *src, tokens, diags),
            Decl::Using { .. } => {}
        }
    }
}

fn declare_symbol(
    ctx: &mut NamespaceContext,
    scope: ScopeId,
    name: &str,
    kind: SymbolKind,
    src: SourceRef,
    tokens: &TokenStream,
    diags: &mut Diagnostics,
) {
    let symbol = Symbol { name: name.to_string(), kind, ty: None, src };
    if let Err(NamespaceError::AlreadyDefined { name, first }) = ctx.define(scope, symbol) {
        diags.add(
            Error::new(format!("'{name}' is already defined in this scope"))
                .with_message(src, "redefined here", tokens)
                .with_message(first, "first defined here", tokens),
        );
    }
}

fn wire_usings(ctx: &mut NamespaceContext, scope: ScopeId, decls: &[Decl]) {
    for decl in decls {
        match decl {
            Decl::Using { path, .. } => {
                if let Some(target) = ctx.resolve_namespace_path(scope, path) {
                    ctx.add_using(scope, target);
                }
            }
            Decl::Namespace { name, decls: inner, .. } => {
                if let Some(child) = ctx.child_scope(scope, name) {
                    wire_usings(ctx, child, inner);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileTable;

    fn sym(name: &str, src: SourceRef) -> Symbol {
        Symbol { name: name.to_string(), kind: SymbolKind::Variable, ty: None, src }
    }

    #[test]
    fn define_then_search_finds_symbol() {
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        let mut ctx = NamespaceContext::new();
        let root = ctx.root();
        ctx.define(root, sym("x", SourceRef::new(f, 1, 0, 1))).unwrap();
        assert!(ctx.search(root, "x").is_ok());
    }

    #[test]
    fn redefinition_in_same_scope_errors() {
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        let mut ctx = NamespaceContext::new();
        let root = ctx.root();
        ctx.define(root, sym("x", SourceRef::new(f, 1, 0, 1))).unwrap();
        let err = ctx.define(root, sym("x", SourceRef::new(f, 2, 0, 1)));
        assert!(matches!(err, Err(NamespaceError::AlreadyDefined { .. })));
    }

    #[test]
    fn search_walks_up_to_parent_scope() {
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        let mut ctx = NamespaceContext::new();
        let root = ctx.root();
        ctx.define(root, sym("outer", SourceRef::new(f, 1, 0, 1))).unwrap();
        let child = ctx.push_scope(root, "inner");
        assert!(ctx.search(child, "outer").is_ok());
    }

    #[test]
    fn search_undefined_name_errors() {
        let ctx = NamespaceContext::new();
        let root = ctx.root();
        assert!(matches!(ctx.search(root, "nope"), Err(NamespaceError::Undefined { .. })));
    }

    #[test]
    fn qualified_search_resolves_through_nested_namespace() {
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        let mut ctx = NamespaceContext::new();
        let root = ctx.root();
        let ns = ctx.push_scope(root, "math");
        ctx.define(ns, sym("pi", SourceRef::new(f, 1, 0, 2))).unwrap();
        assert!(ctx.search_qualified(root, &["math", "pi"]).is_ok());
    }

    #[test]
    fn qualified_name_joins_scope_chain() {
        let mut ctx = NamespaceContext::new();
        let root = ctx.root();
        let a = ctx.push_scope(root, "a");
        let b = ctx.push_scope(a, "b");
        assert_eq!(ctx.qualified_name(b), "a::b");
    }

    #[test]
    fn using_two_namespaces_with_the_same_name_is_ambiguous() {
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        let mut ctx = NamespaceContext::new();
        let root = ctx.root();
        let ns_a = ctx.push_scope(root, "a");
        let ns_b = ctx.push_scope(root, "b");
        ctx.define(ns_a, sym("pi", SourceRef::new(f, 1, 0, 2))).unwrap();
        ctx.define(ns_b, sym("pi", SourceRef::new(f, 2, 0, 2))).unwrap();
        let using_scope = ctx.push_scope(root, "caller");
        ctx.add_using(using_scope, ns_a);
        ctx.add_using(using_scope, ns_b);
        assert!(matches!(ctx.search(using_scope, "pi"), Err(NamespaceError::Ambiguous { .. })));
    }

    #[test]
    fn using_one_namespace_resolves_its_symbol() {
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        let mut ctx = NamespaceContext::new();
        let root = ctx.root();
        let ns = ctx.push_scope(root, "math");
        ctx.define(ns, sym("pi", SourceRef::new(f, 1, 0, 2))).unwrap();
        let using_scope = ctx.push_scope(root, "caller");
        ctx.add_using(using_scope, ns);
        assert!(ctx.search(using_scope, "pi").is_ok());
    }

    #[test]
    fn build_registers_nested_namespace_functions() {
        use crate::cst::{Arena, Decl};
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        let s = SourceRef::new(f, 1, 0, 1);
        let arena = Arena::new();
        let inner = arena.alloc_slice(&[Decl::Function {
            name: "f",
            params: &[],
            ret: None,
            body: &[],
            is_unsafe: false,
            src: s,
        }]);
        let decls = arena.alloc_slice(&[Decl::Namespace { name: "outer", decls: inner, src: s }]);
        let file = SourceFile { decls };
        let tokens = TokenStream::new();
        let mut diags = Diagnostics::new();
        let ctx = build(&file, &tokens, &mut diags);
        assert!(!diags.has_errors());
        let outer = ctx.child_scope(ctx.root(), "outer").unwrap();
        assert!(ctx.search(outer, "f").is_ok());
    }

    #[test]
    fn build_using_resolves_through_forward_declared_namespace() {
        use crate::cst::{Arena, Decl};
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        let s = SourceRef::new(f, 1, 0, 1);
        let arena = Arena::new();
        let math_decls = arena.alloc_slice(&[Decl::Function {
            name: "sqrt",
            params: &[],
            ret: None,
            body: &[],
            is_unsafe: false,
            src: s,
        }]);
        let caller_decls = arena.alloc_slice(&[Decl::Using { path: &["math"], src: s }]);
        let decls = arena.alloc_slice(&[
            Decl::Namespace { name: "caller", decls: caller_decls, src: s },
            Decl::Namespace { name: "math", decls: math_decls, src: s },
        ]);
        let file = SourceFile { decls };
        let tokens = TokenStream::new();
        let mut diags = Diagnostics::new();
        let ctx = build(&file, &tokens, &mut diags);
        let caller = ctx.child_scope(ctx.root(), "caller").unwrap();
        assert!(ctx.search(caller, "sqrt").is_ok());
    }

    #[test]
    fn symbols_in_scope_are_sorted_by_name() {
        let mut files = FileTable::new();
        let f = files.intern("a.gy");
        let mut ctx = NamespaceContext::new();
        let root = ctx.root();
        ctx.define(root, sym("zebra", SourceRef::new(f, 1, 0, 1))).unwrap();
        ctx.define(root, sym("apple", SourceRef::new(f, 2, 0, 1))).unwrap();
        let names: Vec<&str> = ctx.symbols_in(root).iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "zebra"]);
    }
}
