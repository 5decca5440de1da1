//! Per-class method signatures and override validation.

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::intern::{Interner, Symbol};
use super::diagnostics::{Diagnostics, SemanticErrorKind};
use super::hierarchy::ClassHierarchy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: Symbol,
    pub formal_types: Vec<Symbol>,
    pub return_type: Symbol,
    /// Class whose body declares the method.
    pub defined_in: Symbol,
    pub line: usize,
}

type ClassMethods = IndexMap<Symbol, MethodSignature, FxBuildHasher>;

/// Methods declared directly in each class, in declaration order.
/// Inherited methods are found by walking the hierarchy.
#[derive(Debug, Default)]
pub struct MethodTables {
    tables: FxHashMap<Symbol, ClassMethods>,
}

impl MethodTables {
    /// Collect signatures. A method declared twice in one class keeps its
    /// first declaration.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn build(hierarchy: &ClassHierarchy<'_>) -> Self {
        let mut tables = FxHashMap::default();

        for class in hierarchy.classes() {
            let mut methods = ClassMethods::with_hasher(FxBuildHasher);
            for method in class.methods() {
                methods.entry(method.name).or_insert_with(|| MethodSignature {
                    name: method.name,
                    formal_types: method.formals.iter().map(|f| f.type_decl).collect(),
                    return_type: method.return_type,
                    defined_in: class.name,
                    line: method.line,
                });
            }
            tracing::trace!(class = class.name.index(), methods = methods.len(), "method table");
            tables.insert(class.name, methods);
        }

        Self { tables }
    }

    /// Compare every method against same-named methods of its ancestors,
    /// root first. At most one error per method.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn check_overrides(&self, hierarchy: &ClassHierarchy<'_>, interner: &Interner, diags: &mut Diagnostics) {
        for class in hierarchy.classes() {
            let Some(own) = self.tables.get(&class.name) else {
                continue;
            };
            let path = hierarchy.inheritance_path(class.name, class.name);
            let ancestors = &path[..path.len().saturating_sub(1)];
            let file = interner.resolve(class.file);

            for method in own.values() {
                for &ancestor in ancestors {
                    let Some(original) = self.lookup(ancestor, method.name) else {
                        continue;
                    };
                    if let Some(kind) = override_mismatch(original, method, class.name, interner) {
                        diags.report(file, method.line, kind);
                        break;
                    }
                }
            }
        }
    }

    /// A method declared directly in `class`.
    pub fn lookup(&self, class: Symbol, method: Symbol) -> Option<&MethodSignature> {
        self.tables.get(&class).and_then(|methods| methods.get(&method))
    }

    /// The definition a dispatch on `class_type` reaches: the nearest
    /// declaration walking from the class up to `Object`.
    pub fn resolve(
        &self,
        hierarchy: &ClassHierarchy<'_>,
        class_type: Symbol,
        method: Symbol,
        current: Symbol,
    ) -> Option<&MethodSignature> {
        hierarchy
            .inheritance_path(class_type, current)
            .into_iter()
            .rev()
            .find_map(|class| self.lookup(class, method))
    }
}

fn override_mismatch(
    original: &MethodSignature,
    redefined: &MethodSignature,
    class: Symbol,
    interner: &Interner,
) -> Option<SemanticErrorKind> {
    let class = interner.resolve(class).to_string();
    let method = interner.resolve(redefined.name).to_string();

    if original.formal_types.len() != redefined.formal_types.len() {
        return Some(SemanticErrorKind::OverrideArity {
            class,
            method,
            expected: original.formal_types.len(),
            found: redefined.formal_types.len(),
        });
    }

    original
        .formal_types
        .iter()
        .zip(&redefined.formal_types)
        .position(|(a, b)| a != b)
        .map(|i| SemanticErrorKind::OverrideFormalType {
            class,
            method,
            position: i + 1,
            expected: interner.resolve(original.formal_types[i]).to_string(),
            found: interner.resolve(redefined.formal_types[i]).to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprIdGen, Program};
    use crate::parser::parse_source;
    use crate::semantic::basic_classes::basic_classes;
    use crate::semantic::well_known::WellKnown;

    fn setup(source: &str) -> (Program, Interner, WellKnown) {
        let mut interner = Interner::new();
        let wk = WellKnown::new(&mut interner);
        interner.intern("Main");
        let mut ids = ExprIdGen::new();
        let program = parse_source("m.cl", source, &mut interner, &mut ids).unwrap();
        (program, interner, wk)
    }

    fn check(source: &str) -> Vec<SemanticErrorKind> {
        let (program, interner, wk) = setup(source);
        let mut diags = Diagnostics::new();
        let main = interner.lookup("Main").unwrap();
        let h = ClassHierarchy::build(&program, basic_classes(&wk), main, wk, &interner, &mut diags).unwrap();
        let tables = MethodTables::build(&h);
        tables.check_overrides(&h, &interner, &mut diags);
        diags.into_vec().into_iter().map(|d| d.kind).collect()
    }

    #[test]
    fn first_declaration_wins() {
        let (program, interner, wk) = setup("
            class Main {
                f(x : Int) : Int { x };
                f() : String { \"s\" };
            };
        ");
        let mut diags = Diagnostics::new();
        let main = interner.lookup("Main").unwrap();
        let h = ClassHierarchy::build(&program, basic_classes(&wk), main, wk, &interner, &mut diags).unwrap();
        let tables = MethodTables::build(&h);

        let f = tables.lookup(main, interner.lookup("f").unwrap()).unwrap();
        assert_eq!(f.formal_types, vec![wk.int]);
        assert_eq!(f.return_type, wk.int);
    }

    #[test]
    fn resolve_prefers_nearest_definition() {
        let (program, interner, wk) = setup("
            class Main inherits IO {
                out_string(s : String) : SELF_TYPE { self };
            };
            class Sub inherits Main { };
        ");
        let mut diags = Diagnostics::new();
        let main = interner.lookup("Main").unwrap();
        let sub = interner.lookup("Sub").unwrap();
        let h = ClassHierarchy::build(&program, basic_classes(&wk), main, wk, &interner, &mut diags).unwrap();
        let tables = MethodTables::build(&h);

        let sig = tables.resolve(&h, sub, wk.out_string, sub).unwrap();
        assert_eq!(sig.defined_in, main);
        let sig = tables.resolve(&h, wk.self_type, wk.copy, sub).unwrap();
        assert_eq!(sig.defined_in, wk.object);
        assert!(tables.resolve(&h, sub, wk.length, sub).is_none());
    }

    #[test]
    fn compatible_override_is_silent() {
        let errors = check("
            class Main { f(a : Int, b : String) : Object { a }; };
            class B inherits Main { f(x : Int, y : String) : Object { y }; };
        ");
        assert!(errors.is_empty());
    }

    #[test]
    fn arity_mismatch_reported_once() {
        let errors = check("
            class Main { f(a : Int) : Object { a }; };
            class B inherits Main { f(a : Bool, b : Int) : Object { a }; };
        ");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SemanticErrorKind::OverrideArity { expected: 1, found: 2, .. }));
    }

    #[test]
    fn first_differing_formal_reported() {
        let errors = check("
            class Main { f(a : Int, b : Int, c : Int) : Object { a }; };
            class B inherits Main { };
            class C inherits B { f(a : Int, b : Bool, c : String) : Object { a }; };
        ");
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            SemanticErrorKind::OverrideFormalType { position, expected, found, .. } => {
                assert_eq!(*position, 2);
                assert_eq!(expected, "Int");
                assert_eq!(found, "Bool");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn builtin_override_checked() {
        let errors = check("
            class Main inherits IO { out_int(x : String) : SELF_TYPE { self }; };
        ");
        assert_eq!(errors.len(), 1);
    }
}
