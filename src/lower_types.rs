//! Type lowering: CST type specifiers and declarations into the type graph.
//!
//! Runs in two passes over a [`SourceFile`]: declare first (every
//! class/enum gets a `TypeId`, possibly incomplete), then complete (fields
//! and variants are filled in, now that every name they might reference is
//! at least declared). This lets mutually-recursive types — `struct A { b:
//! B* }` / `struct B { a: A* }` — resolve regardless of declaration order.

use crate::cst::{Decl, FieldDecl, SourceFile, TypeSpec, VariantDecl};
use crate::diagnostics::{Diagnostics, Error};
use crate::source::SourceRef;
use crate::types::{Field, IntWidth, TypeGraph, TypeId, Variant};

/// Resolves a type specifier against already-declared names. Used in both
/// passes: in the declare pass for pointer/reference/array element types
/// (which may themselves reference not-yet-completed composites — that's
/// fine, only field access needs completion), and in the complete pass for
/// field/variant member types.
pub fn resolve_type_spec(
    graph: &mut TypeGraph,
    spec: &TypeSpec,
    src: SourceRef,
    diags: &mut Diagnostics,
) -> Option<TypeId> {
    match spec {
        TypeSpec::Named(name) => match *name {
            "void" => Some(graph.void(src)),
            "bool" => Some(graph.bool_(src)),
            "i8" => Some(graph.int(IntWidth::I8, src)),
            "i16" => Some(graph.int(IntWidth::I16, src)),
            "i32" => Some(graph.int(IntWidth::I32, src)),
            "i64" => Some(graph.int(IntWidth::I64, src)),
            "u8" => Some(graph.int(IntWidth::U8, src)),
            "u16" => Some(graph.int(IntWidth::U16, src)),
            "u32" => Some(graph.int(IntWidth::U32, src)),
            "u64" => Some(graph.int(IntWidth::U64, src)),
            other => match graph.by_name(other) {
                Some(id) => Some(id),
                None => {
                    diags.add(Error::new(format!("unknown type '{other}'")));
                    None
                }
            },
        },
        TypeSpec::Pointer(inner) => {
            let target = resolve_type_spec(graph, inner, src, diags)?;
            Some(graph.pointer_to(target, src))
        }
        TypeSpec::Reference(inner) => {
            let target = resolve_type_spec(graph, inner, src, diags)?;
            Some(graph.reference_to(target, src))
        }
        TypeSpec::Array(inner, len) => {
            let element = resolve_type_spec(graph, inner, src, diags)?;
            Some(graph.array_of(element, *len, src))
        }
    }
}

/// Pass one: walk every declaration and register class/enum names in the
/// type graph as incomplete. Does not look inside bodies.
pub fn declare_types(graph: &mut TypeGraph, file: &SourceFile) {
    declare_decls(graph, file.decls);
}

fn declare_decls(graph: &mut TypeGraph, decls: &[Decl]) {
    for decl in decls {
        match decl {
            Decl::Class { name, src, .. } => {
                graph.declare_composite(name, *src);
            }
            Decl::Enum { name, src, .. } => {
                graph.declare_enum(name, *src);
            }
            Decl::Namespace { decls, .. } => declare_decls(graph, decls),
            _ => {}
        }
    }
}

/// Pass two: fill in fields/variants for every declared composite/enum,
/// now that all names are at least visible.
pub fn complete_types(graph: &mut TypeGraph, file: &SourceFile, diags: &mut Diagnostics) {
    complete_decls(graph, file.decls, diags);
}

fn complete_decls(graph: &mut TypeGraph, decls: &[Decl], diags: &mut Diagnostics) {
    for decl in decls {
        match decl {
            Decl::Class { name, fields, src, .. } => {
                let id = graph.by_name(name).expect("declared in pass one");
                let resolved = resolve_fields(graph, fields, diags);
                if !graph.is_complete(id) {
                    graph.complete_composite(id, resolved);
                } else {
                    let _ = src;
                    diags.add(Error::new(format!("type '{name}' already defined")));
                }
            }
            Decl::Enum { name, variants, .. } => {
                let id = graph.by_name(name).expect("declared in pass one");
                let resolved = resolve_variants(variants);
                if !graph.is_complete(id) {
                    graph.complete_enum(id, resolved);
                }
            }
            Decl::Namespace { decls, .. } => complete_decls(graph, decls, diags),
            _ => {}
        }
    }
}

fn resolve_fields(graph: &mut TypeGraph, fields: &[FieldDecl], diags: &mut Diagnostics) -> Vec<Field> {
    fields
        .iter()
        .filter_map(|f| {
            let ty = resolve_type_spec(graph, &f.ty, f.src, diags)?;
            Some(Field { name: f.name.to_string(), ty, src: f.src })
        })
        .collect()
}

fn resolve_variants(variants: &[VariantDecl]) -> Vec<Variant> {
    let mut next = 0i64;
    variants
        .iter()
        .map(|v| {
            let discriminant = v.discriminant.unwrap_or(next);
            next = discriminant + 1;
            Variant { name: v.name.to_string(), discriminant, src: v.src }
        })
        .collect()
}
