//! Semantic analysis driver

use crate::ast::Program;
use crate::error::{CoolError, CoolResult};
use crate::intern::Interner;
use super::annotations::TypeAnnotations;
use super::basic_classes::basic_classes;
use super::checker::ClassChecker;
use super::diagnostics::{Diagnostic, Diagnostics};
use super::hierarchy::ClassHierarchy;
use super::method_table::MethodTables;
use super::well_known::WellKnown;

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Class that must exist for the program to be accepted.
    pub entry_class: String,
    /// Check attribute initializers against declared attribute types.
    pub check_attribute_initializers: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            entry_class: "Main".to_string(),
            check_attribute_initializers: true,
        }
    }
}

/// Gate at which analysis stopped because errors had been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Class registration and inheritance validation.
    Hierarchy,
    /// Method tables, override checks and expression typing.
    TypeCheck,
}

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub diagnostics: Vec<Diagnostic>,
    pub annotations: TypeAnnotations,
    pub halted_after: Option<Phase>,
}

impl Analysis {
    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn into_result(self) -> CoolResult<TypeAnnotations> {
        if self.has_errors() {
            Err(CoolError::SemanticHalted {
                diagnostics: self.diagnostics,
            })
        } else {
            Ok(self.annotations)
        }
    }
}

pub struct SemanticAnalyzer<'p> {
    program: &'p Program,
    interner: &'p mut Interner,
    options: AnalysisOptions,
}

impl<'p> SemanticAnalyzer<'p> {
    pub fn new(program: &'p Program, interner: &'p mut Interner, options: AnalysisOptions) -> Self {
        Self {
            program,
            interner,
            options,
        }
    }

    pub fn analyze(self) -> Analysis {
        let wk = WellKnown::new(self.interner);
        let entry_class = self.interner.intern(&self.options.entry_class);
        let interner: &Interner = &*self.interner;
        let mut diagnostics = Diagnostics::new();

        let hierarchy = {
            let _span = tracing::info_span!("hierarchy").entered();
            ClassHierarchy::build(self.program, basic_classes(&wk), entry_class, wk, interner, &mut diagnostics)
        };
        let hierarchy = match hierarchy {
            Some(hierarchy) if diagnostics.is_empty() => hierarchy,
            _ => {
                tracing::info!(errors = diagnostics.len(), "halting after class hierarchy");
                return Analysis {
                    diagnostics: diagnostics.into_vec(),
                    annotations: TypeAnnotations::new(),
                    halted_after: Some(Phase::Hierarchy),
                };
            }
        };

        let _span = tracing::info_span!("type_check").entered();
        let methods = MethodTables::build(&hierarchy);
        methods.check_overrides(&hierarchy, interner, &mut diagnostics);

        let mut annotations = TypeAnnotations::new();
        for class in &self.program.classes {
            let checker = ClassChecker::new(
                class,
                &hierarchy,
                &methods,
                interner,
                self.options.check_attribute_initializers,
            );
            let (class_diagnostics, class_annotations) = checker.check();
            diagnostics.append(class_diagnostics);
            annotations.merge(class_annotations);
        }

        let halted_after = if diagnostics.is_empty() {
            tracing::info!(classes = hierarchy.len(), "semantic analysis passed");
            None
        } else {
            tracing::info!(errors = diagnostics.len(), "halting after type checking");
            Some(Phase::TypeCheck)
        };

        Analysis {
            diagnostics: diagnostics.into_vec(),
            annotations,
            halted_after,
        }
    }
}

/// Analyze `program`, turning any reported error into
/// [`CoolError::SemanticHalted`].
pub fn check_program(program: &Program, interner: &mut Interner, options: AnalysisOptions) -> CoolResult<TypeAnnotations> {
    SemanticAnalyzer::new(program, interner, options).analyze().into_result()
}
