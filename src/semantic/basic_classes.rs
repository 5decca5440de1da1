//! The predefined classes every program starts with.
//!
//! Method bodies are empty: the runtime supplies them.
//!
//! ```text
//! Object   abort() : Object, type_name() : String, copy() : SELF_TYPE
//! IO       out_string(String) : SELF_TYPE, out_int(Int) : SELF_TYPE,
//!          in_string() : String, in_int() : Int
//! Int      _val : _prim_slot
//! Bool     _val : _prim_slot
//! String   _val : Int, _str_field : _prim_slot, length() : Int,
//!          concat(String) : String, substr(Int, Int) : String
//! ```

use crate::ast::{AttrDecl, ClassDecl, Expr, ExprId, ExprKind, Feature, Formal, MethodDecl};
use crate::intern::Symbol;
use super::well_known::WellKnown;

/// Expression id shared by the absent bodies of predefined features.
pub const BUILTIN_EXPR: ExprId = ExprId(u32::MAX);

fn no_expr() -> Expr {
    Expr {
        id: BUILTIN_EXPR,
        line: 0,
        kind: ExprKind::NoExpr,
    }
}

fn method(name: Symbol, formals: &[(Symbol, Symbol)], return_type: Symbol) -> Feature {
    Feature::Method(MethodDecl {
        name,
        formals: formals
            .iter()
            .map(|&(name, type_decl)| Formal {
                name,
                type_decl,
                line: 0,
            })
            .collect(),
        return_type,
        body: no_expr(),
        line: 0,
    })
}

fn attr(name: Symbol, type_decl: Symbol) -> Feature {
    Feature::Attribute(AttrDecl {
        name,
        type_decl,
        init: no_expr(),
        line: 0,
    })
}

fn class(wk: &WellKnown, name: Symbol, parent: Symbol, features: Vec<Feature>) -> ClassDecl {
    ClassDecl {
        name,
        parent,
        features,
        file: wk.basic_file,
        line: 0,
    }
}

/// Object, IO, Int, Bool and String, in that order.
pub fn basic_classes(wk: &WellKnown) -> Vec<ClassDecl> {
    let object = class(
        wk,
        wk.object,
        wk.no_class,
        vec![
            method(wk.abort, &[], wk.object),
            method(wk.type_name, &[], wk.string),
            method(wk.copy, &[], wk.self_type),
        ],
    );

    let io = class(
        wk,
        wk.io,
        wk.object,
        vec![
            method(wk.out_string, &[(wk.arg, wk.string)], wk.self_type),
            method(wk.out_int, &[(wk.arg, wk.int)], wk.self_type),
            method(wk.in_string, &[], wk.string),
            method(wk.in_int, &[], wk.int),
        ],
    );

    let int = class(wk, wk.int, wk.object, vec![attr(wk.val, wk.prim_slot)]);
    let bool_ = class(wk, wk.bool_, wk.object, vec![attr(wk.val, wk.prim_slot)]);

    let string = class(
        wk,
        wk.string,
        wk.object,
        vec![
            attr(wk.val, wk.int),
            attr(wk.str_field, wk.prim_slot),
            method(wk.length, &[], wk.int),
            method(wk.concat, &[(wk.arg, wk.string)], wk.string),
            method(wk.substr, &[(wk.arg, wk.int), (wk.arg2, wk.int)], wk.string),
        ],
    );

    vec![object, io, int, bool_, string]
}
