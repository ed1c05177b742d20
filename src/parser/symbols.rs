//! Scoped symbol table used to disambiguate C declarations.
//!
//! C's grammar cannot tell `foo_t *x;` (a pointer declaration) apart from
//! `foo_t * x` (a multiplication) without knowing whether `foo_t` names a
//! type.  The parser records every typedef alias it sees here and consults
//! [`SymbolTable::is_typedef`] at each decision point.

use rustc_hash::FxHashMap;

/// What a recorded name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Typedef,
    Variable,
    Function,
    Struct,
    Enum,
    Union,
}

/// One lexical scope: a name → kind map plus a link to the enclosing scope.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: FxHashMap<String, SymbolKind>,
    parent: Option<Box<SymbolTable>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Opens a child scope enclosing `parent`.
    pub fn with_parent(parent: SymbolTable) -> Self {
        SymbolTable {
            symbols: FxHashMap::default(),
            parent: Some(Box::new(parent)),
        }
    }

    /// Closes this scope, handing back the enclosing one.
    pub fn into_parent(self) -> Option<SymbolTable> {
        self.parent.map(|p| *p)
    }

    /// Records a name in the current scope.  Idempotent: re-adding a name
    /// already present in this scope leaves its kind unchanged.
    pub fn add(&mut self, name: &str, kind: SymbolKind) {
        self.symbols.entry(name.to_owned()).or_insert(kind);
    }

    /// Looks up a name, walking outward through enclosing scopes.
    pub fn lookup(&self, name: &str) -> Option<SymbolKind> {
        match self.symbols.get(name) {
            Some(kind) => Some(*kind),
            None => self.parent.as_ref().and_then(|p| p.lookup(name)),
        }
    }

    pub fn is_typedef(&self, name: &str) -> bool {
        self.lookup(name) == Some(SymbolKind::Typedef)
    }
}

/// Typedef names assumed to exist without seeing their declarations, so
/// headers the formatter never reads don't derail declaration detection.
pub const WELL_KNOWN_TYPEDEFS: &[&str] = &[
    "size_t", "ssize_t", "ptrdiff_t", "intptr_t", "uintptr_t", "int8_t", "int16_t", "int32_t",
    "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t", "va_list", "FILE", "DIR", "time_t",
    "clock_t", "pid_t", "uid_t", "gid_t", "off_t", "mode_t", "bool",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_lookup() {
        let mut table = SymbolTable::new();
        table.add("node_t", SymbolKind::Typedef);
        table.add("count", SymbolKind::Variable);
        assert!(table.is_typedef("node_t"));
        assert!(!table.is_typedef("count"));
        assert_eq!(table.lookup("count"), Some(SymbolKind::Variable));
        assert_eq!(table.lookup("missing"), None);
    }

    #[test]
    fn add_is_idempotent_per_scope() {
        let mut table = SymbolTable::new();
        table.add("x", SymbolKind::Typedef);
        table.add("x", SymbolKind::Variable);
        assert_eq!(table.lookup("x"), Some(SymbolKind::Typedef));
    }

    #[test]
    fn lookup_walks_parent_chain() {
        let mut global = SymbolTable::new();
        global.add("list_t", SymbolKind::Typedef);
        let mut inner = SymbolTable::with_parent(global);
        inner.add("local", SymbolKind::Variable);

        assert!(inner.is_typedef("list_t"));
        assert_eq!(inner.lookup("local"), Some(SymbolKind::Variable));

        let global = inner.into_parent().unwrap();
        assert_eq!(global.lookup("local"), None);
        assert!(global.is_typedef("list_t"));
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let mut global = SymbolTable::new();
        global.add("value", SymbolKind::Typedef);
        let mut inner = SymbolTable::with_parent(global);
        inner.add("value", SymbolKind::Variable);
        assert_eq!(inner.lookup("value"), Some(SymbolKind::Variable));
    }
}
