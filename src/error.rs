use thiserror::Error;
use std::fmt;

use crate::semantic::Diagnostic;

#[derive(Error, Debug, Clone)]
pub enum CoolError {
    #[error("{file}:{line}: lexical error: {message}")]
    Lexer { file: String, line: usize, message: String },

    #[error("{file}:{line}: syntax error: {message}")]
    Parser { file: String, line: usize, message: String },

    #[error("Compilation halted due to static semantic errors.")]
    SemanticHalted { diagnostics: Vec<Diagnostic> },

    #[error("IO error: {0}")]
    Io(String),
}

pub type CoolResult<T> = Result<T, CoolError>;

impl CoolError {
    /// Semantic diagnostics carried by a halted analysis, empty otherwise.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CoolError::SemanticHalted { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.line)
    }
}

pub fn lexer_error(file: &str, line: usize, message: impl Into<String>) -> CoolError {
    CoolError::Lexer {
        file: file.to_string(),
        line,
        message: message.into(),
    }
}

pub fn parser_error(file: &str, line: usize, message: impl Into<String>) -> CoolError {
    CoolError::Parser {
        file: file.to_string(),
        line,
        message: message.into(),
    }
}
