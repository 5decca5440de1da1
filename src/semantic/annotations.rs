//! Static types inferred for expression nodes.

use rustc_hash::FxHashMap;

use crate::ast::{Expr, ExprId};
use crate::intern::Symbol;

/// Side table from expression id to inferred type. The tree itself stays
/// immutable.
#[derive(Debug, Clone, Default)]
pub struct TypeAnnotations {
    types: FxHashMap<ExprId, Symbol>,
}

impl TypeAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ExprId, ty: Symbol) {
        self.types.insert(id, ty);
    }

    pub fn get(&self, id: ExprId) -> Option<Symbol> {
        self.types.get(&id).copied()
    }

    pub fn type_of(&self, expr: &Expr) -> Option<Symbol> {
        self.get(expr.id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn merge(&mut self, other: TypeAnnotations) {
        self.types.extend(other.types);
    }
}
