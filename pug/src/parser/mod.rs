pub mod error;
mod tree;

pub use error::ParseError;

use crate::TemplateError;
use crate::lexer;
use crate::node::Node;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the template source into its `Document` node.
    ///
    /// Lexing stops at the first error; so does tree building. Either way
    /// no partial tree is returned.
    pub fn parse(&self) -> Result<Node, TemplateError> {
        let tokens = lexer::tokenize(&self.source, self.file_id)?;
        let root = tree::build(tokens, self.file_id, self.source.len())?;
        Ok(root)
    }
}
