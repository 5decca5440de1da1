//! Accumulated semantic errors.

use std::fmt;
use thiserror::Error;

/// What went wrong. The `Display` text is the message printed to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticErrorKind {
    // class hierarchy
    #[error("Class name SELF_TYPE is reserved and cannot be redeclared.")]
    SelfTypeRedeclared,
    #[error("Class {class} was previously defined.")]
    ClassRedefined { class: String },
    #[error("Class {class} is not defined.")]
    MissingEntryClass { class: String },
    #[error("Class {class} inherits from an undefined class {parent}.")]
    UndefinedParent { class: String, parent: String },
    #[error("Class {class} cannot inherit class {parent}.")]
    IllegalParent { class: String, parent: String },
    #[error("Class {class}, or an ancestor of {class}, is involved in an inheritance cycle.")]
    InheritanceCycle { class: String },

    // method tables
    #[error("In redefined method {method} of class {class}, parameter count {found} is different from original count {expected}.")]
    OverrideArity {
        class: String,
        method: String,
        expected: usize,
        found: usize,
    },
    #[error("In redefined method {method} of class {class}, parameter {position} has type {found} instead of original type {expected}.")]
    OverrideFormalType {
        class: String,
        method: String,
        position: usize,
        expected: String,
        found: String,
    },

    // features
    #[error("'self' cannot be the name of an attribute.")]
    SelfAttribute,
    #[error("Attribute {name} is already defined, possibly in an ancestor class.")]
    DuplicateAttribute { name: String },
    #[error("Class {ty} of attribute {name} is undefined.")]
    UndefinedAttributeType { name: String, ty: String },
    #[error("Inferred type {found} of initialization of attribute {name} does not conform to declared type {declared}.")]
    AttributeInitMismatch {
        name: String,
        declared: String,
        found: String,
    },
    #[error("Undefined return type {ty} in method {method}.")]
    UndefinedReturnType { method: String, ty: String },
    #[error("Formal parameter {name} is multiply defined in method {method}.")]
    DuplicateFormal { method: String, name: String },
    #[error("'self' cannot be the name of a formal parameter in method {method}.")]
    SelfFormal { method: String },
    #[error("Class {ty} of formal parameter {name} in method {method} is undefined.")]
    UndefinedFormalType {
        method: String,
        name: String,
        ty: String,
    },
    #[error("Inferred return type {found} of method {method} does not conform to declared return type {declared}.")]
    ReturnTypeMismatch {
        method: String,
        declared: String,
        found: String,
    },

    // expressions
    #[error("Undeclared identifier {name}.")]
    UndeclaredIdentifier { name: String },
    #[error("Cannot assign to 'self'.")]
    AssignToSelf,
    #[error("Assignment to undeclared variable {name}.")]
    AssignUndeclared { name: String },
    #[error("Type {found} of assigned expression does not conform to declared type {declared} of identifier {name}.")]
    AssignMismatch {
        name: String,
        declared: String,
        found: String,
    },
    #[error("non-Int arguments: {left} {op} {right}")]
    NonIntArithmetic {
        op: &'static str,
        left: String,
        right: String,
    },
    #[error("non-Int arguments: {left} {op} {right}")]
    NonIntComparison {
        op: &'static str,
        left: String,
        right: String,
    },
    #[error("Illegal comparison with a basic type: {left} = {right}")]
    IllegalEquality { left: String, right: String },
    #[error("Argument of '~' has type {found} instead of Int.")]
    NonIntNegation { found: String },
    #[error("Argument of 'not' has type {found} instead of Bool.")]
    NonBoolNot { found: String },
    #[error("Predicate of '{construct}' does not have type Bool (found {found}).")]
    NonBoolPredicate { construct: &'static str, found: String },
    #[error("'self' cannot be bound in a {construct}.")]
    SelfBinding { construct: &'static str },
    #[error("Class {ty} of {binding} is undefined.")]
    UndefinedDeclaredType { binding: String, ty: String },
    #[error("Inferred type {found} of initialization of {name} does not conform to identifier's declared type {declared}.")]
    LetInitMismatch {
        name: String,
        declared: String,
        found: String,
    },
    #[error("Duplicate branch {ty} in case statement.")]
    DuplicateCaseBranch { ty: String },
    #[error("Expression type {expr_type} does not conform to declared static dispatch type {target}.")]
    StaticDispatchNotAncestor { expr_type: String, target: String },
    #[error("Dispatch to undefined method {method} in class {class}.")]
    UndefinedMethod { method: String, class: String },
    #[error("Method {method} called with wrong number of arguments: expected {expected}, found {found}.")]
    DispatchArity {
        method: String,
        expected: usize,
        found: usize,
    },
    #[error("In call of method {method}, type {actual} of parameter {position} does not conform to declared type {formal}.")]
    ArgumentMismatch {
        method: String,
        position: usize,
        formal: String,
        actual: String,
    },
    #[error("'new' used with undefined class {ty}.")]
    UndefinedNewType { ty: String },
}

/// One reported error, optionally tied to a source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: Option<String>,
    pub line: Option<usize>,
    pub kind: SemanticErrorKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}: {}", file, line, self.kind),
            (Some(file), None) => write!(f, "{}: {}", file, self.kind),
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// Error reporter: keeps every diagnostic in report order.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, file: &str, line: usize, kind: SemanticErrorKind) {
        tracing::debug!(file, line, error = %kind, "semantic error");
        self.items.push(Diagnostic {
            file: Some(file.to_string()),
            line: Some(line),
            kind,
        });
    }

    /// Report an error that has no source position.
    pub fn report_global(&mut self, kind: SemanticErrorKind) {
        tracing::debug!(error = %kind, "semantic error");
        self.items.push(Diagnostic {
            file: None,
            line: None,
            kind,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn append(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_and_global_formats() {
        let mut diags = Diagnostics::new();
        diags.report("a.cl", 7, SemanticErrorKind::AssignToSelf);
        diags.report_global(SemanticErrorKind::MissingEntryClass {
            class: "Main".into(),
        });

        let lines: Vec<String> = diags.iter().map(|d| d.to_string()).collect();
        assert_eq!(lines[0], "a.cl:7: Cannot assign to 'self'.");
        assert_eq!(lines[1], "Class Main is not defined.");
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn append_keeps_order() {
        let mut first = Diagnostics::new();
        first.report("a.cl", 1, SemanticErrorKind::SelfAttribute);
        let mut second = Diagnostics::new();
        second.report("b.cl", 2, SemanticErrorKind::AssignToSelf);

        first.append(second);
        let files: Vec<_> = first.iter().map(|d| d.file.clone().unwrap()).collect();
        assert_eq!(files, vec!["a.cl", "b.cl"]);
    }
}
