//! Lexical scopes mapping identifiers to their declared types.

use rustc_hash::FxHashMap;

use crate::intern::Symbol;

#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<FxHashMap<Symbol, Symbol>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    pub fn exit_scope(&mut self) {
        debug_assert!(!self.frames.is_empty(), "exit_scope without matching enter_scope");
        self.frames.pop();
    }

    /// Bind `name` in the innermost scope, shadowing outer bindings.
    pub fn add(&mut self, name: Symbol, ty: Symbol) {
        if self.frames.is_empty() {
            self.enter_scope();
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name, ty);
        }
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: Symbol) -> Option<Symbol> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(&name).copied())
    }

    pub fn lookup_current(&self, name: Symbol) -> Option<Symbol> {
        self.frames.last().and_then(|frame| frame.get(&name).copied())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let int = interner.intern("Int");
        let string = interner.intern("String");

        let mut scopes = ScopeStack::new();
        scopes.enter_scope();
        scopes.add(x, int);
        scopes.enter_scope();
        assert_eq!(scopes.lookup(x), Some(int));
        assert_eq!(scopes.lookup_current(x), None);

        scopes.add(x, string);
        assert_eq!(scopes.lookup(x), Some(string));

        scopes.exit_scope();
        assert_eq!(scopes.lookup(x), Some(int));
        scopes.exit_scope();
        assert_eq!(scopes.lookup(x), None);
        assert_eq!(scopes.depth(), 0);
    }
}
