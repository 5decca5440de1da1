//! String interning for identifiers, type names and file names.

use rustc_hash::FxHashMap;
use std::fmt;

/// Handle to an interned string. Two symbols are equal iff their strings are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interns strings to unique Symbol IDs
#[derive(Debug, Clone, Default)]
pub struct Interner {
    map: FxHashMap<String, Symbol>,
    strings: Vec<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }
        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.map.insert(s.to_string(), sym);
        sym
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.0 as usize]
    }

    /// Look up a string without interning it.
    pub fn lookup(&self, s: &str) -> Option<Symbol> {
        self.map.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_returns_same_symbol() {
        let mut interner = Interner::new();
        let s1 = interner.intern("Main");
        let s2 = interner.intern("Main");
        let s3 = interner.intern("main");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn resolve_and_lookup() {
        let mut interner = Interner::new();
        let sym = interner.intern("SELF_TYPE");
        assert_eq!(interner.resolve(sym), "SELF_TYPE");
        assert_eq!(interner.lookup("SELF_TYPE"), Some(sym));
        assert_eq!(interner.lookup("Object"), None);
    }
}
