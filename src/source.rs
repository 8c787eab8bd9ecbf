//! Source location tracking for error reporting.
//!
//! A [`SourceRef`] identifies a single contiguous run of text within a
//! named source file using 1-based line numbers and 0-based columns,
//! mirroring the `(filename, line, column, length)` tuple the rest of the
//! pipeline threads through tokens, CST nodes, types, and MIR operations.
//!
//! Filenames are interned so that `SourceRef` stays `Copy` and cheap to pass
//! around, the same trade the teacher's `Interner` makes for identifiers.

use std::collections::HashMap;

/// A lightweight handle to an interned filename.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FileId(u32);

/// Interns source file names so [`SourceRef`] can stay `Copy`.
#[derive(Default)]
pub struct FileTable {
    map: HashMap<String, FileId>,
    names: Vec<String>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a filename, returning its handle. Re-interning the same name
    /// returns the same handle.
    pub fn intern(&mut self, name: &str) -> FileId {
        if let Some(&id) = self.map.get(name) {
            return id;
        }
        let id = FileId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.map.insert(name.to_string(), id);
        id
    }

    pub fn resolve(&self, id: FileId) -> &str {
        &self.names[id.0 as usize]
    }
}

/// A `(filename, line, column, length)` reference into source text.
///
/// Lines are 1-based (matching how editors and compilers report them);
/// columns and length are 0-based byte offsets within the line. `SourceRef`
/// carries no borrow on the file table, so it can be stored freely in
/// tokens, CST nodes, types, and MIR operations.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SourceRef {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

impl SourceRef {
    pub fn new(file: FileId, line: u32, column: u32, length: u32) -> Self {
        debug_assert!(line >= 1, "source lines are 1-based");
        Self { file, line, column, length }
    }

    /// A placeholder reference used before any real token has been read.
    pub fn zero(file: FileId) -> Self {
        Self { file, line: 1, column: 0, length: 0 }
    }
}
