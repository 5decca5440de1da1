//! Symbols the analysis compares against, interned once up front.

use crate::intern::{Interner, Symbol};

/// Predefined class, method and identifier names.
#[derive(Debug, Clone, Copy)]
pub struct WellKnown {
    pub object: Symbol,
    pub io: Symbol,
    pub int: Symbol,
    pub bool_: Symbol,
    pub string: Symbol,
    /// The "type of the receiver" placeholder, `SELF_TYPE`.
    pub self_type: Symbol,
    /// The self-reference identifier, `self`.
    pub self_: Symbol,
    /// Parent of the root class; never a valid class name.
    pub no_class: Symbol,
    /// Type of an absent expression.
    pub no_type: Symbol,
    pub prim_slot: Symbol,
    pub basic_file: Symbol,

    pub arg: Symbol,
    pub arg2: Symbol,
    pub val: Symbol,
    pub str_field: Symbol,

    pub abort: Symbol,
    pub type_name: Symbol,
    pub copy: Symbol,
    pub out_string: Symbol,
    pub out_int: Symbol,
    pub in_string: Symbol,
    pub in_int: Symbol,
    pub length: Symbol,
    pub concat: Symbol,
    pub substr: Symbol,
}

impl WellKnown {
    pub fn new(interner: &mut Interner) -> Self {
        Self {
            object: interner.intern("Object"),
            io: interner.intern("IO"),
            int: interner.intern("Int"),
            bool_: interner.intern("Bool"),
            string: interner.intern("String"),
            self_type: interner.intern("SELF_TYPE"),
            self_: interner.intern("self"),
            no_class: interner.intern("_no_class"),
            no_type: interner.intern("_no_type"),
            prim_slot: interner.intern("_prim_slot"),
            basic_file: interner.intern("<basic class>"),
            arg: interner.intern("arg"),
            arg2: interner.intern("arg2"),
            val: interner.intern("_val"),
            str_field: interner.intern("_str_field"),
            abort: interner.intern("abort"),
            type_name: interner.intern("type_name"),
            copy: interner.intern("copy"),
            out_string: interner.intern("out_string"),
            out_int: interner.intern("out_int"),
            in_string: interner.intern("in_string"),
            in_int: interner.intern("in_int"),
            length: interner.intern("length"),
            concat: interner.intern("concat"),
            substr: interner.intern("substr"),
        }
    }

    /// Int, Bool and String: compared by value and closed to inheritance.
    pub fn is_primitive(&self, ty: Symbol) -> bool {
        ty == self.int || ty == self.bool_ || ty == self.string
    }
}
