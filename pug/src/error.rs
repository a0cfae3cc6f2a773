use std::ops::Range;

use codespan_reporting::diagnostic::Diagnostic;
use thiserror::Error;

use crate::lexer::LexError;
use crate::parser::ParseError;

/// Any failure to turn template source into a node tree.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    #[error("Pug lexer error: {0}")]
    Lex(#[from] LexError),
    #[error("Pug parser error: {0}")]
    Parse(#[from] ParseError),
}

impl TemplateError {
    pub fn span(&self) -> Range<usize> {
        match self {
            TemplateError::Lex(e) => e.span.clone(),
            TemplateError::Parse(e) => e.span.clone(),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        match self {
            TemplateError::Lex(e) => e.to_diagnostic(),
            TemplateError::Parse(e) => e.to_diagnostic(),
        }
    }
}
