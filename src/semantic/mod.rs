//! Static semantic analysis
//!
//! Runs in two gated phases. The first registers every class and checks that
//! inheritance forms a tree rooted at `Object`; any error there stops
//! analysis. The second builds method tables, validates overrides and types
//! every expression, then stops compilation if anything was reported.

mod analyzer;
mod annotations;
mod basic_classes;
mod checker;
mod diagnostics;
mod dump;
mod hierarchy;
mod method_table;
mod scope;
mod well_known;

pub use analyzer::{check_program, Analysis, AnalysisOptions, Phase, SemanticAnalyzer};
pub use annotations::TypeAnnotations;
pub use basic_classes::{basic_classes, BUILTIN_EXPR};
pub use checker::ClassChecker;
pub use diagnostics::{Diagnostic, Diagnostics, SemanticErrorKind};
pub use dump::write_annotated;
pub use hierarchy::ClassHierarchy;
pub use method_table::{MethodSignature, MethodTables};
pub use scope::ScopeStack;
pub use well_known::WellKnown;
