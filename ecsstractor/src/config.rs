/// How a selector's full path is shown above its nested line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentStyle {
    /// `/* .block__element */`
    #[default]
    Block,
    /// `// .block__element`
    Line,
}

impl CommentStyle {
    /// Opening and closing delimiters; line comments have no closing part.
    pub fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            CommentStyle::Block => ("/* ", " */"),
            CommentStyle::Line => ("// ", ""),
        }
    }
}

/// Rendering and classification options for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatConfig {
    /// Wrap selector bodies in `{ }`.
    pub brackets: bool,
    /// Put the closing brace of an empty body on its own line.
    pub brackets_newline_after: bool,
    /// Whitespace used per nesting level.
    pub indent_unit: String,
    pub element_separator: String,
    pub modifier_separator: String,
    /// Back-reference used in nested lines, usually `&`.
    pub parent_symbol: String,
    pub empty_line_before_nested_selector: bool,
    pub add_comments: bool,
    pub comment_style: CommentStyle,
    /// Render a nested BEM document instead of a flat selector list.
    pub bem_nesting: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            brackets: true,
            brackets_newline_after: false,
            indent_unit: "  ".to_string(),
            element_separator: "__".to_string(),
            modifier_separator: "--".to_string(),
            parent_symbol: "&".to_string(),
            empty_line_before_nested_selector: false,
            add_comments: false,
            comment_style: CommentStyle::Block,
            bem_nesting: true,
        }
    }
}
