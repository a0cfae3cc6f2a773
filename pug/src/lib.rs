pub mod error;
pub mod lexer;
pub mod node;
pub mod parser;

pub use error::TemplateError;
pub use node::{Attribute, Node, NodeKind};

/// Parse template source that is not registered in a codespan file database.
pub fn parse(source: &str) -> Result<Node, TemplateError> {
    parser::Parser::new(source.to_string(), 0).parse()
}
