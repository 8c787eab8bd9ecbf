//! Type graph.
//!
//! Types are interned into a [`TypeGraph`] keyed by structural identity, so
//! two occurrences of `i32*` or `Point` resolve to the same [`TypeId`]. A
//! composite or enum type can exist in the graph as an *incomplete* forward
//! declaration before its body is lowered; completion only ever adds fields
//! or variants; it never removes or changes what's already recorded.

use rustc_hash::FxHashMap;

use crate::source::SourceRef;

/// A handle into the [`TypeGraph`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TypeId(u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    pub src: SourceRef,
}

#[derive(Clone, Debug)]
pub struct Variant {
    pub name: String,
    pub discriminant: i64,
    pub src: SourceRef,
}

#[derive(Clone, Debug)]
pub enum TypeKind {
    Void,
    Bool,
    Int(IntWidth),
    Float32,
    Float64,
    Char,
    Pointer(TypeId),
    Reference(TypeId),
    Array(TypeId, u64),
    /// A named struct/class type. `fields` is empty until completion.
    Composite { name: String, fields: Vec<Field>, complete: bool },
    /// A named enum type. `variants` is empty until completion.
    Enum { name: String, variants: Vec<Variant>, complete: bool },
    Function { params: Vec<TypeId>, ret: TypeId },
}

#[derive(Clone, Debug)]
pub struct TypeEntry {
    pub kind: TypeKind,
    pub src: SourceRef,
}

/// Interning table for every type the pipeline encounters, with named
/// (composite/enum) types also reachable by name for declare-then-complete
/// lowering.
pub struct TypeGraph {
    entries: Vec<TypeEntry>,
    by_name: FxHashMap<String, TypeId>,
    pointer_of: FxHashMap<TypeId, TypeId>,
    reference_of: FxHashMap<TypeId, TypeId>,
    array_of: FxHashMap<(TypeId, u64), TypeId>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_name: FxHashMap::default(),
            pointer_of: FxHashMap::default(),
            reference_of: FxHashMap::default(),
            array_of: FxHashMap::default(),
        }
    }

    fn push(&mut self, kind: TypeKind, src: SourceRef) -> TypeId {
        let id = TypeId(self.entries.len() as u32);
        self.entries.push(TypeEntry { kind, src });
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeEntry {
        &self.entries[id.0 as usize]
    }

    pub fn by_name(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Declares an incomplete composite type, or returns the existing
    /// `TypeId` if one with this name is already declared.
    pub fn declare_composite(&mut self, name: &str, src: SourceRef) -> TypeId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.push(
            TypeKind::Composite { name: name.to_string(), fields: Vec::new(), complete: false },
            src,
        );
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Fills in the fields of a previously declared composite type.
    /// Monotonic: only valid while the type is still incomplete.
    pub fn complete_composite(&mut self, id: TypeId, fields: Vec<Field>) {
        match &mut self.entries[id.0 as usize].kind {
            TypeKind::Composite { complete, fields: slot, .. } => {
                debug_assert!(!*complete, "type already completed");
                *slot = fields;
                *complete = true;
            }
            _ => panic!("not a composite type"),
        }
    }

    pub fn declare_enum(&mut self, name: &str, src: SourceRef) -> TypeId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.push(TypeKind::Enum { name: name.to_string(), variants: Vec::new(), complete: false }, src);
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn complete_enum(&mut self, id: TypeId, variants: Vec<Variant>) {
        match &mut self.entries[id.0 as usize].kind {
            TypeKind::Enum { complete, variants: slot, .. } => {
                debug_assert!(!*complete, "type already completed");
                *slot = variants;
                *complete = true;
            }
            _ => panic!("not an enum type"),
        }
    }

    pub fn is_complete(&self, id: TypeId) -> bool {
        match &self.entries[id.0 as usize].kind {
            TypeKind::Composite { complete, .. } | TypeKind::Enum { complete, .. } => *complete,
            _ => true,
        }
    }

    /// Interns a simple scalar kind, creating it if this is the first request.
    fn intern_scalar(&mut self, kind: TypeKind, src: SourceRef) -> TypeId {
        // Scalars are few and fixed; linear scan is cheap and keeps the
        // graph free of duplicate Void/Bool/IntN entries.
        for (i, entry) in self.entries.iter().enumerate() {
            if std::mem::discriminant(&entry.kind) == std::mem::discriminant(&kind) {
                if let (TypeKind::Int(a), TypeKind::Int(b)) = (&entry.kind, &kind) {
                    if a == b {
                        return TypeId(i as u32);
                    }
                    continue;
                }
                return TypeId(i as u32);
            }
        }
        self.push(kind, src)
    }

    pub fn void(&mut self, src: SourceRef) -> TypeId {
        self.intern_scalar(TypeKind::Void, src)
    }

    pub fn bool_(&mut self, src: SourceRef) -> TypeId {
        self.intern_scalar(TypeKind::Bool, src)
    }

    pub fn int(&mut self, width: IntWidth, src: SourceRef) -> TypeId {
        self.intern_scalar(TypeKind::Int(width), src)
    }

    pub fn float32(&mut self, src: SourceRef) -> TypeId {
        self.intern_scalar(TypeKind::Float32, src)
    }

    pub fn float64(&mut self, src: SourceRef) -> TypeId {
        self.intern_scalar(TypeKind::Float64, src)
    }

    pub fn pointer_to(&mut self, target: TypeId, src: SourceRef) -> TypeId {
        if let Some(&id) = self.pointer_of.get(&target) {
            return id;
        }
        let id = self.push(TypeKind::Pointer(target), src);
        self.pointer_of.insert(target, id);
        id
    }

    pub fn reference_to(&mut self, target: TypeId, src: SourceRef) -> TypeId {
        if let Some(&id) = self.reference_of.get(&target) {
            return id;
        }
        let id = self.push(TypeKind::Reference(target), src);
        self.reference_of.insert(target, id);
        id
    }

    pub fn array_of(&mut self, element: TypeId, len: u64, src: SourceRef) -> TypeId {
        if let Some(&id) = self.array_of.get(&(element, len)) {
            return id;
        }
        let id = self.push(TypeKind::Array(element, len), src);
        self.array_of.insert((element, len), id);
        id
    }

    pub fn function(&mut self, params: Vec<TypeId>, ret: TypeId, src: SourceRef) -> TypeId {
        self.push(TypeKind::Function { params, ret }, src)
    }

    pub fn name_of(&self, id: TypeId) -> Option<&str> {
        match &self.entries[id.0 as usize].kind {
            TypeKind::Composite { name, .. } | TypeKind::Enum { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Human-readable name for a type, for diagnostics (`"i32"`, `"f32"`,
    /// `"Point"`, ...).
    pub fn display_name(&self, id: TypeId) -> String {
        match &self.entries[id.0 as usize].kind {
            TypeKind::Void => "void".to_string(),
            TypeKind::Bool => "bool".to_string(),
            TypeKind::Int(w) => int_width_name(*w).to_string(),
            TypeKind::Float32 => "f32".to_string(),
            TypeKind::Float64 => "f64".to_string(),
            TypeKind::Char => "char".to_string(),
            TypeKind::Pointer(target) => format!("{}*", self.display_name(*target)),
            TypeKind::Reference(target) => format!("{}&", self.display_name(*target)),
            TypeKind::Array(elem, len) => format!("{}[{}]", self.display_name(*elem), len),
            TypeKind::Composite { name, .. } | TypeKind::Enum { name, .. } => name.clone(),
            TypeKind::Function { .. } => "function".to_string(),
        }
    }
}

fn int_width_name(w: IntWidth) -> &'static str {
    match w {
        IntWidth::I8 => "i8",
        IntWidth::I16 => "i16",
        IntWidth::I32 => "i32",
        IntWidth::I64 => "i64",
        IntWidth::U8 => "u8",
        IntWidth::U16 => "u16",
        IntWidth::U32 => "u32",
        IntWidth::U64 => "u64",
    }
}

impl Default for TypeGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileTable;

    fn src(files: &mut FileTable) -> SourceRef {
        let f = files.intern("a.gy");
        SourceRef::new(f, 1, 0, 1)
    }

    #[test]
    fn declare_composite_is_idempotent_by_name() {
        let mut files = FileTable::new();
        let s = src(&mut files);
        let mut g = TypeGraph::new();
        let a = g.declare_composite("Point", s);
        let b = g.declare_composite("Point", s);
        assert_eq!(a, b);
    }

    #[test]
    fn composite_starts_incomplete_then_completes() {
        let mut files = FileTable::new();
        let s = src(&mut files);
        let mut g = TypeGraph::new();
        let id = g.declare_composite("Point", s);
        assert!(!g.is_complete(id));
        let i32id = g.int(IntWidth::I32, s);
        g.complete_composite(id, vec![Field { name: "x".into(), ty: i32id, src: s }]);
        assert!(g.is_complete(id));
    }

    #[test]
    fn pointer_to_is_interned() {
        let mut files = FileTable::new();
        let s = src(&mut files);
        let mut g = TypeGraph::new();
        let i32id = g.int(IntWidth::I32, s);
        let p1 = g.pointer_to(i32id, s);
        let p2 = g.pointer_to(i32id, s);
        assert_eq!(p1, p2);
    }

    #[test]
    fn array_of_distinguishes_by_length() {
        let mut files = FileTable::new();
        let s = src(&mut files);
        let mut g = TypeGraph::new();
        let i32id = g.int(IntWidth::I32, s);
        let a3 = g.array_of(i32id, 3, s);
        let a4 = g.array_of(i32id, 4, s);
        assert_ne!(a3, a4);
    }

    #[test]
    fn int_widths_are_distinct_scalars() {
        let mut files = FileTable::new();
        let s = src(&mut files);
        let mut g = TypeGraph::new();
        let a = g.int(IntWidth::I32, s);
        let b = g.int(IntWidth::I64, s);
        assert_ne!(a, b);
        let c = g.int(IntWidth::I32, s);
        assert_eq!(a, c);
    }

    #[test]
    fn display_name_renders_scalars_and_composites() {
        let mut files = FileTable::new();
        let s = src(&mut files);
        let mut g = TypeGraph::new();
        let f32id = g.float32(s);
        let point = g.declare_composite("Point", s);
        assert_eq!(g.display_name(f32id), "f32");
        assert_eq!(g.display_name(point), "Point");
    }

    #[test]
    fn by_name_finds_declared_type() {
        let mut files = FileTable::new();
        let s = src(&mut files);
        let mut g = TypeGraph::new();
        let id = g.declare_enum("Color", s);
        assert_eq!(g.by_name("Color"), Some(id));
        assert_eq!(g.by_name("Nope"), None);
    }
}
