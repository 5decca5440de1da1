pub mod error;
pub mod intern;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use error::{CoolError, CoolResult};
pub use intern::{Interner, Symbol};

use ast::{ExprIdGen, Program};
use semantic::{AnalysisOptions, TypeAnnotations};

/// A program that passed semantic analysis, with the interner its symbols
/// belong to.
#[derive(Debug)]
pub struct CheckedProgram {
    pub program: Program,
    pub annotations: TypeAnnotations,
    pub interner: Interner,
}

/// Front end: lexing, parsing and semantic analysis.
pub struct Compiler {
    options: AnalysisOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_options(AnalysisOptions::default())
    }

    pub fn with_options(options: AnalysisOptions) -> Self {
        Self { options }
    }

    /// Check a single source text named `file`.
    pub fn check_source(&self, file: &str, source: &str) -> CoolResult<CheckedProgram> {
        let mut interner = Interner::new();
        let mut ids = ExprIdGen::new();
        let program = parser::parse_source(file, source, &mut interner, &mut ids)?;
        self.finish(program, interner)
    }

    /// Check several files as one program.
    pub fn check_files<P: AsRef<std::path::Path>>(&self, paths: &[P]) -> CoolResult<CheckedProgram> {
        let mut interner = Interner::new();
        let program = parser::parse_files(paths, &mut interner)?;
        self.finish(program, interner)
    }

    fn finish(&self, program: Program, mut interner: Interner) -> CoolResult<CheckedProgram> {
        let annotations = semantic::check_program(&program, &mut interner, self.options.clone())?;
        Ok(CheckedProgram {
            program,
            annotations,
            interner,
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_world_checks() {
        let source = r#"
class Main inherits IO {
    main() : SELF_TYPE {
        out_string("Hello, World.\n")
    };
};
"#;
        let checked = Compiler::new().check_source("hello.cl", source).unwrap();
        assert!(!checked.annotations.is_empty());
    }

    #[test]
    fn semantic_errors_halt() {
        let source = "class Main { main() : Int { true }; };";
        let err = Compiler::new().check_source("bad.cl", source).unwrap_err();
        assert_eq!(err.to_string(), "Compilation halted due to static semantic errors.");
        assert_eq!(err.diagnostics().len(), 1);
    }
}
