//! Class registry and the inheritance queries built on it.

use std::borrow::Cow;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};

use crate::ast::{ClassDecl, Program};
use crate::intern::{Interner, Symbol};
use super::diagnostics::{Diagnostics, SemanticErrorKind};
use super::well_known::WellKnown;

type ClassMap<'a> = IndexMap<Symbol, Cow<'a, ClassDecl>, FxBuildHasher>;

/// Every class of the program, predefined ones first, keyed by name.
///
/// Only constructed for programs whose inheritance graph is a tree rooted
/// at `Object`, so parent walks always terminate.
#[derive(Debug)]
pub struct ClassHierarchy<'a> {
    classes: ClassMap<'a>,
    wk: WellKnown,
}

impl<'a> ClassHierarchy<'a> {
    /// Register and validate all classes.
    ///
    /// Returns `None` when a fatal hierarchy error was reported. The first
    /// redefined class stops registration on the spot. A missing entry class
    /// is reported and validation still runs, which stops at the first
    /// unknown or illegal parent or cycle.
    pub fn build(
        program: &'a Program,
        basics: Vec<ClassDecl>,
        entry_class: Symbol,
        wk: WellKnown,
        interner: &Interner,
        diags: &mut Diagnostics,
    ) -> Option<Self> {
        let mut classes = ClassMap::with_hasher(FxBuildHasher);
        for class in basics {
            classes.insert(class.name, Cow::Owned(class));
        }

        for class in &program.classes {
            let file = interner.resolve(class.file);
            if class.name == wk.self_type {
                diags.report(file, class.line, SemanticErrorKind::SelfTypeRedeclared);
            }
            if classes.contains_key(&class.name) {
                diags.report(
                    file,
                    class.line,
                    SemanticErrorKind::ClassRedefined {
                        class: interner.resolve(class.name).to_string(),
                    },
                );
                return None;
            }
            classes.insert(class.name, Cow::Borrowed(class));
        }

        tracing::debug!(classes = classes.len(), "registered classes");

        let has_entry = classes.contains_key(&entry_class);
        if !has_entry {
            diags.report_global(SemanticErrorKind::MissingEntryClass {
                class: interner.resolve(entry_class).to_string(),
            });
        }

        let hierarchy = Self { classes, wk };
        for class in &program.classes {
            if !hierarchy.validate_ancestry(class, interner, diags) {
                return None;
            }
        }
        has_entry.then_some(hierarchy)
    }

    /// Walk the parent chain of `class` up to `Object`.
    fn validate_ancestry(&self, class: &ClassDecl, interner: &Interner, diags: &mut Diagnostics) -> bool {
        let wk = &self.wk;
        let mut visited = FxHashSet::default();
        visited.insert(class.name);

        let mut current = class;
        loop {
            let parent = current.parent;
            if parent == wk.object {
                return true;
            }

            let file = interner.resolve(current.file);
            if wk.is_primitive(parent) || parent == wk.self_type {
                diags.report(
                    file,
                    current.line,
                    SemanticErrorKind::IllegalParent {
                        class: interner.resolve(current.name).to_string(),
                        parent: interner.resolve(parent).to_string(),
                    },
                );
                return false;
            }

            let Some(next) = self.get(parent) else {
                diags.report(
                    file,
                    current.line,
                    SemanticErrorKind::UndefinedParent {
                        class: interner.resolve(current.name).to_string(),
                        parent: interner.resolve(parent).to_string(),
                    },
                );
                return false;
            };

            if !visited.insert(parent) {
                diags.report(
                    interner.resolve(class.file),
                    class.line,
                    SemanticErrorKind::InheritanceCycle {
                        class: interner.resolve(class.name).to_string(),
                    },
                );
                return false;
            }
            tracing::trace!(
                class = interner.resolve(class.name),
                ancestor = interner.resolve(parent),
                "inheritance chain"
            );
            current = next;
        }
    }

    pub fn get(&self, name: Symbol) -> Option<&ClassDecl> {
        self.classes.get(&name).map(|class| class.as_ref())
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.classes.contains_key(&name)
    }

    /// A registered class or `SELF_TYPE`.
    pub fn is_type_defined(&self, ty: Symbol) -> bool {
        ty == self.wk.self_type || self.contains(ty)
    }

    /// Registered classes in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.classes.values().map(|class| class.as_ref())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn well_known(&self) -> &WellKnown {
        &self.wk
    }

    fn resolve_self_type(&self, ty: Symbol, current: Symbol) -> Symbol {
        if ty == self.wk.self_type { current } else { ty }
    }

    /// Whether `child` conforms to `ancestor` inside class `current`.
    ///
    /// `SELF_TYPE` conforms to its own class and everything above it, but
    /// only `SELF_TYPE` conforms to `SELF_TYPE`.
    pub fn check_inheritance(&self, ancestor: Symbol, child: Symbol, current: Symbol) -> bool {
        if ancestor == self.wk.self_type {
            return child == self.wk.self_type;
        }

        let mut ty = self.resolve_self_type(child, current);
        loop {
            if ty == ancestor {
                return true;
            }
            match self.get(ty) {
                Some(class) if class.parent != self.wk.no_class => ty = class.parent,
                _ => return false,
            }
        }
    }

    /// Ancestors of `ty`, root first, ending with `ty` itself.
    /// Empty when `ty` is not a registered class.
    pub fn inheritance_path(&self, ty: Symbol, current: Symbol) -> Vec<Symbol> {
        let mut ty = self.resolve_self_type(ty, current);
        let mut path = Vec::new();
        while let Some(class) = self.get(ty) {
            path.push(ty);
            if class.parent == self.wk.no_class {
                break;
            }
            ty = class.parent;
        }
        path.reverse();
        path
    }

    /// Least common ancestor. Two `SELF_TYPE`s join to `SELF_TYPE`.
    pub fn common_ancestor(&self, t1: Symbol, t2: Symbol, current: Symbol) -> Symbol {
        if t1 == self.wk.self_type && t2 == self.wk.self_type {
            return self.wk.self_type;
        }

        let p1 = self.inheritance_path(t1, current);
        let p2 = self.inheritance_path(t2, current);
        p1.iter()
            .zip(p2.iter())
            .take_while(|(a, b)| a == b)
            .last()
            .map(|(a, _)| *a)
            .unwrap_or(self.wk.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprIdGen;
    use crate::parser::parse_source;
    use crate::semantic::basic_classes::basic_classes;

    struct Fixture {
        program: Program,
        interner: Interner,
        wk: WellKnown,
    }

    fn fixture(source: &str) -> Fixture {
        let mut interner = Interner::new();
        let wk = WellKnown::new(&mut interner);
        let mut ids = ExprIdGen::new();
        let program = parse_source("test.cl", source, &mut interner, &mut ids).unwrap();
        Fixture { program, interner, wk }
    }

    fn build<'a>(fx: &'a Fixture, diags: &mut Diagnostics) -> Option<ClassHierarchy<'a>> {
        let main = fx.interner.lookup("Main").unwrap_or(fx.wk.object);
        ClassHierarchy::build(&fx.program, basic_classes(&fx.wk), main, fx.wk, &fx.interner, diags)
    }

    const TREE: &str = "
        class Main { main() : Object { 0 }; };
        class A { };
        class B inherits A { };
        class C inherits A { };
        class D inherits B { };
    ";

    #[test]
    fn registers_basics_and_user_classes_in_order() {
        let fx = fixture(TREE);
        let mut diags = Diagnostics::new();
        let h = build(&fx, &mut diags).unwrap();
        assert!(diags.is_empty());

        let names: Vec<&str> = h.classes().map(|c| fx.interner.resolve(c.name)).collect();
        assert_eq!(names, vec!["Object", "IO", "Int", "Bool", "String", "Main", "A", "B", "C", "D"]);
    }

    #[test]
    fn inheritance_and_self_type() {
        let fx = fixture(TREE);
        let mut diags = Diagnostics::new();
        let h = build(&fx, &mut diags).unwrap();
        let sym = |s: &str| fx.interner.lookup(s).unwrap();
        let (a, b, c, d) = (sym("A"), sym("B"), sym("C"), sym("D"));
        let st = fx.wk.self_type;

        assert!(h.check_inheritance(a, d, a));
        assert!(h.check_inheritance(fx.wk.object, d, a));
        assert!(!h.check_inheritance(b, c, a));
        assert!(!h.check_inheritance(d, a, a));

        for ty in [a, b, c, d, fx.wk.object, st] {
            assert!(h.check_inheritance(ty, ty, d));
        }

        // SELF_TYPE inside D behaves like D when it is the child
        assert!(h.check_inheritance(d, st, d));
        assert!(h.check_inheritance(a, st, d));
        assert!(!h.check_inheritance(st, d, d));
        assert!(!h.check_inheritance(c, st, d));
    }

    #[test]
    fn paths_and_common_ancestors() {
        let fx = fixture(TREE);
        let mut diags = Diagnostics::new();
        let h = build(&fx, &mut diags).unwrap();
        let sym = |s: &str| fx.interner.lookup(s).unwrap();
        let (a, b, c, d) = (sym("A"), sym("B"), sym("C"), sym("D"));
        let object = fx.wk.object;

        assert_eq!(h.inheritance_path(d, a), vec![object, a, b, d]);
        assert_eq!(h.inheritance_path(fx.wk.self_type, c), vec![object, a, c]);
        assert!(h.inheritance_path(sym("test.cl"), a).is_empty());

        assert_eq!(h.common_ancestor(d, c, a), a);
        assert_eq!(h.common_ancestor(d, b, a), b);
        assert_eq!(h.common_ancestor(fx.wk.int, d, a), object);
        assert_eq!(h.common_ancestor(fx.wk.self_type, c, d), a);
        assert_eq!(h.common_ancestor(fx.wk.self_type, fx.wk.self_type, d), fx.wk.self_type);
        assert_eq!(h.common_ancestor(sym("test.cl"), d, a), object);
    }

    #[test]
    fn cycle_reports_once_and_aborts() {
        let fx = fixture("
            class Main { };
            class A inherits B { };
            class B inherits A { };
        ");
        let mut diags = Diagnostics::new();
        assert!(build(&fx, &mut diags).is_none());
        assert_eq!(diags.len(), 1);
        assert!(matches!(
            diags.iter().next().unwrap().kind,
            SemanticErrorKind::InheritanceCycle { .. }
        ));
    }

    #[test]
    fn self_inheritance_is_a_cycle() {
        let fx = fixture("class Main inherits Main { };");
        let mut diags = Diagnostics::new();
        assert!(build(&fx, &mut diags).is_none());
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn primitive_parent_rejected_before_lookup() {
        for parent in ["Int", "Bool", "String", "SELF_TYPE"] {
            let fx = fixture(&format!("class Main inherits {parent} {{ }};"));
            let mut diags = Diagnostics::new();
            assert!(build(&fx, &mut diags).is_none());
            assert_eq!(diags.len(), 1, "parent {parent}");
            let msg = diags.iter().next().unwrap().to_string();
            assert_eq!(msg, format!("test.cl:1: Class Main cannot inherit class {parent}."));
        }
    }

    #[test]
    fn undefined_parent() {
        let fx = fixture("class Main inherits Nowhere { };");
        let mut diags = Diagnostics::new();
        assert!(build(&fx, &mut diags).is_none());
        assert!(matches!(
            diags.iter().next().unwrap().kind,
            SemanticErrorKind::UndefinedParent { .. }
        ));
    }

    #[test]
    fn missing_main_has_no_location() {
        let fx = fixture("class A { };");
        let mut interner = fx.interner.clone();
        let main = interner.intern("Main");
        let mut diags = Diagnostics::new();
        let h = ClassHierarchy::build(&fx.program, basic_classes(&fx.wk), main, fx.wk, &interner, &mut diags);
        assert!(h.is_none());
        assert_eq!(diags.iter().next().unwrap().to_string(), "Class Main is not defined.");
    }

    #[test]
    fn missing_main_still_validates_parents() {
        let fx = fixture("class A inherits Int { };");
        let mut interner = fx.interner.clone();
        let main = interner.intern("Main");
        let mut diags = Diagnostics::new();
        let h = ClassHierarchy::build(&fx.program, basic_classes(&fx.wk), main, fx.wk, &interner, &mut diags);
        assert!(h.is_none());
        let messages: Vec<String> = diags.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "Class Main is not defined.".to_string(),
                "test.cl:1: Class A cannot inherit class Int.".to_string(),
            ]
        );
    }

    #[test]
    fn first_redefinition_stops_registration() {
        let fx = fixture("
            class Main { };
            class A { };
            class A { };
            class Main { };
        ");
        let mut diags = Diagnostics::new();
        assert!(build(&fx, &mut diags).is_none());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().to_string(), "test.cl:4: Class A was previously defined.");
    }

    #[test]
    fn redefining_a_basic_class_is_fatal() {
        let fx = fixture("class Main { }; class Int { };");
        let mut diags = Diagnostics::new();
        assert!(build(&fx, &mut diags).is_none());
        assert_eq!(diags.len(), 1);
        assert!(matches!(
            diags.iter().next().unwrap().kind,
            SemanticErrorKind::ClassRedefined { .. }
        ));
    }
}
