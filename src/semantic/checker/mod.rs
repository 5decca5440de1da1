//! Per-class type checking.

mod expressions;

use rustc_hash::FxHashSet;

use crate::ast::{AttrDecl, ClassDecl, Expr, ExprId, Feature, MethodDecl};
use crate::intern::{Interner, Symbol};
use super::annotations::TypeAnnotations;
use super::diagnostics::{Diagnostics, SemanticErrorKind};
use super::hierarchy::ClassHierarchy;
use super::method_table::MethodTables;
use super::scope::ScopeStack;
use super::well_known::WellKnown;

/// Type checks the features of one class. The class being checked is
/// fixed at construction and resolves every `SELF_TYPE` seen inside it.
pub struct ClassChecker<'c, 'a> {
    class: &'c ClassDecl,
    file: &'c str,
    hierarchy: &'c ClassHierarchy<'a>,
    methods: &'c MethodTables,
    interner: &'c Interner,
    wk: WellKnown,
    check_attribute_initializers: bool,
    scopes: ScopeStack,
    diagnostics: Diagnostics,
    annotations: TypeAnnotations,
    /// Expressions that fell back to `Object` after an error. Checks on
    /// their parents stay quiet about them.
    recovered: FxHashSet<ExprId>,
}

impl<'c, 'a> ClassChecker<'c, 'a> {
    pub fn new(
        class: &'c ClassDecl,
        hierarchy: &'c ClassHierarchy<'a>,
        methods: &'c MethodTables,
        interner: &'c Interner,
        check_attribute_initializers: bool,
    ) -> Self {
        Self {
            class,
            file: interner.resolve(class.file),
            hierarchy,
            methods,
            interner,
            wk: *hierarchy.well_known(),
            check_attribute_initializers,
            scopes: ScopeStack::new(),
            diagnostics: Diagnostics::new(),
            annotations: TypeAnnotations::new(),
            recovered: FxHashSet::default(),
        }
    }

    pub fn check(mut self) -> (Diagnostics, TypeAnnotations) {
        let _span = tracing::debug_span!("check_class", class = self.name(self.class.name)).entered();

        let path = self.hierarchy.inheritance_path(self.class.name, self.class.name);
        for &ancestor in &path {
            self.scopes.enter_scope();
            self.register_attributes(ancestor);
        }

        let class = self.class;
        for feature in &class.features {
            match feature {
                Feature::Method(method) => self.check_method(method),
                Feature::Attribute(attr) => self.check_attribute(attr),
            }
        }

        for _ in &path {
            self.scopes.exit_scope();
        }
        debug_assert_eq!(self.scopes.depth(), 0);

        (self.diagnostics, self.annotations)
    }

    /// Bind the attributes of `owner`, one scope per ancestor. Problems are
    /// only reported for the class being checked; ancestors report their
    /// own when they are checked.
    fn register_attributes(&mut self, owner: Symbol) {
        let hierarchy = self.hierarchy;
        let Some(decl) = hierarchy.get(owner) else {
            return;
        };
        let report = owner == self.class.name;

        for attr in decl.attributes() {
            if attr.name == self.wk.self_ {
                if report {
                    self.error(attr.line, SemanticErrorKind::SelfAttribute);
                }
                continue;
            }
            if self.scopes.lookup(attr.name).is_some() {
                if report {
                    let name = self.name(attr.name);
                    self.error(attr.line, SemanticErrorKind::DuplicateAttribute { name });
                }
                continue;
            }
            self.scopes.add(attr.name, attr.type_decl);
        }
    }

    fn check_method(&mut self, method: &MethodDecl) {
        let return_defined = self.hierarchy.is_type_defined(method.return_type);
        if !return_defined {
            let kind = SemanticErrorKind::UndefinedReturnType {
                method: self.name(method.name),
                ty: self.name(method.return_type),
            };
            self.error(method.line, kind);
        }

        self.scoped(|this| {
            for formal in &method.formals {
                if formal.name == this.wk.self_ {
                    let kind = SemanticErrorKind::SelfFormal {
                        method: this.name(method.name),
                    };
                    this.error(formal.line, kind);
                    continue;
                }
                if this.scopes.lookup_current(formal.name).is_some() {
                    let kind = SemanticErrorKind::DuplicateFormal {
                        method: this.name(method.name),
                        name: this.name(formal.name),
                    };
                    this.error(formal.line, kind);
                    continue;
                }
                if !this.hierarchy.contains(formal.type_decl) {
                    let kind = SemanticErrorKind::UndefinedFormalType {
                        method: this.name(method.name),
                        name: this.name(formal.name),
                        ty: this.name(formal.type_decl),
                    };
                    this.error(formal.line, kind);
                }
                this.scopes.add(formal.name, formal.type_decl);
            }

            let body_type = this.infer(&method.body);
            if return_defined
                && !this.conforms(method.return_type, body_type)
                && !this.is_recovered(&method.body)
            {
                let kind = SemanticErrorKind::ReturnTypeMismatch {
                    method: this.name(method.name),
                    declared: this.name(method.return_type),
                    found: this.name(body_type),
                };
                this.error(method.line, kind);
            }
        });
    }

    fn check_attribute(&mut self, attr: &AttrDecl) {
        let type_defined = self.hierarchy.is_type_defined(attr.type_decl);
        if !type_defined {
            let kind = SemanticErrorKind::UndefinedAttributeType {
                name: self.name(attr.name),
                ty: self.name(attr.type_decl),
            };
            self.error(attr.line, kind);
        }

        let init_type = self.infer(&attr.init);
        if self.check_attribute_initializers
            && type_defined
            && !attr.init.is_no_expr()
            && !self.conforms(attr.type_decl, init_type)
            && !self.is_recovered(&attr.init)
        {
            let kind = SemanticErrorKind::AttributeInitMismatch {
                name: self.name(attr.name),
                declared: self.name(attr.type_decl),
                found: self.name(init_type),
            };
            self.error(attr.line, kind);
        }
    }

    /// Run `f` inside a fresh scope; the scope is always closed again.
    fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scopes.enter_scope();
        let result = f(self);
        self.scopes.exit_scope();
        result
    }

    fn conforms(&self, ancestor: Symbol, child: Symbol) -> bool {
        self.hierarchy.check_inheritance(ancestor, child, self.class.name)
    }

    fn is_recovered(&self, expr: &Expr) -> bool {
        self.recovered.contains(&expr.id)
    }

    fn error(&mut self, line: usize, kind: SemanticErrorKind) {
        self.diagnostics.report(self.file, line, kind);
    }

    fn name(&self, sym: Symbol) -> String {
        self.interner.resolve(sym).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprIdGen, ExprKind, Program};
    use crate::parser::parse_source;
    use crate::semantic::basic_classes::basic_classes;

    fn check_class(source: &str, class: &str) -> (Program, Interner, Diagnostics, TypeAnnotations) {
        let mut interner = Interner::new();
        let wk = WellKnown::new(&mut interner);
        let mut ids = ExprIdGen::new();
        let program = parse_source("c.cl", source, &mut interner, &mut ids).unwrap();
        let main = interner.intern("Main");

        let mut diags = Diagnostics::new();
        let hierarchy =
            ClassHierarchy::build(&program, basic_classes(&wk), main, wk, &interner, &mut diags).unwrap();
        let methods = MethodTables::build(&hierarchy);
        let target = program.find_class(interner.lookup(class).unwrap()).unwrap();
        let (diagnostics, annotations) = ClassChecker::new(target, &hierarchy, &methods, &interner, true).check();
        drop(hierarchy);
        (program, interner, diagnostics, annotations)
    }

    #[test]
    fn every_expression_is_annotated() {
        let (program, interner, diags, annotations) = check_class(
            "class Main { f(n : Int) : Bool { { n <- n * 2; isvoid n; } }; };",
            "Main",
        );
        assert!(diags.is_empty());

        let Feature::Method(method) = &program.classes[0].features[0] else {
            panic!("expected method");
        };
        let ExprKind::Block(body) = &method.body.kind else {
            panic!("expected block");
        };
        let ExprKind::Assign { value, .. } = &body[0].kind else {
            panic!("expected assignment");
        };
        let ExprKind::Arith { left, right, .. } = &value.kind else {
            panic!("expected arithmetic");
        };

        let ty = |e: &Expr| interner.resolve(annotations.type_of(e).unwrap()).to_string();
        assert_eq!(ty(&method.body), "Bool");
        assert_eq!(ty(&body[0]), "Int");
        assert_eq!(ty(left), "Int");
        assert_eq!(ty(right), "Int");
        assert_eq!(ty(&body[1]), "Bool");
        // block, assign, arith, n, 2, isvoid, n
        assert_eq!(annotations.len(), 7);
    }

    #[test]
    fn attributes_of_ancestors_are_in_scope() {
        let (_, _, diags, _) = check_class(
            "class Main { }; class A { a : Int; }; class B inherits A { b : Int <- a; f() : Int { a + b }; };",
            "B",
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn self_type_resolves_against_checked_class() {
        let (_, _, diags, _) = check_class(
            "class Main { }; class A { me() : A { self }; }; class B inherits A { you() : SELF_TYPE { self }; };",
            "B",
        );
        assert!(diags.is_empty());

        let (_, _, diags, _) = check_class(
            "class Main { }; class A { me() : SELF_TYPE { new A }; };",
            "A",
        );
        assert_eq!(diags.len(), 1);
    }
}
