use std::ops::Range;

use crate::node::Attribute;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Layout
    Indent,
    Outdent,
    Newline,
    Eos,

    // Element head
    Tag(String),
    /// `#{expression}` in place of a tag name.
    InterpolatedTag(String),
    Class(String),
    Id(String),
    Attributes(Vec<Attribute>),
    AndAttributes(String),
    MixinCall { name: String, args: Option<String> },

    // Element tail
    BlockExpansion, // `: `
    TextBlock,      // trailing `.`
    SelfClosing,    // trailing `/`

    // Tag interpolation inside text: `#[` element `]`
    InterpolationStart,
    InterpolationEnd,

    // Line content
    Text(String),
    /// `:name` with its inline text and raw nested lines.
    Filter { name: String, text: String },
    Code { buffered: bool, source: String },
    Comment { buffered: bool, text: String },
    Keyword { keyword: Keyword, argument: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Doctype,
    If,
    Unless,
    ElseIf,
    Else,
    Case,
    When,
    Default,
    Each,
    While,
    Mixin,
    Include,
    Extends,
    Block,
    Append,
    Prepend,
    Yield,
}

impl Keyword {
    /// Match a line-leading word. `else if` is resolved by the lexer.
    pub fn from_word(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "doctype" => Keyword::Doctype,
            "if" => Keyword::If,
            "unless" => Keyword::Unless,
            "else" => Keyword::Else,
            "case" => Keyword::Case,
            "when" => Keyword::When,
            "default" => Keyword::Default,
            "each" | "for" => Keyword::Each,
            "while" => Keyword::While,
            "mixin" => Keyword::Mixin,
            "include" => Keyword::Include,
            "extends" => Keyword::Extends,
            "block" => Keyword::Block,
            "append" => Keyword::Append,
            "prepend" => Keyword::Prepend,
            "yield" => Keyword::Yield,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Doctype => "doctype",
            Keyword::If => "if",
            Keyword::Unless => "unless",
            Keyword::ElseIf => "else if",
            Keyword::Else => "else",
            Keyword::Case => "case",
            Keyword::When => "when",
            Keyword::Default => "default",
            Keyword::Each => "each",
            Keyword::While => "while",
            Keyword::Mixin => "mixin",
            Keyword::Include => "include",
            Keyword::Extends => "extends",
            Keyword::Block => "block",
            Keyword::Append => "append",
            Keyword::Prepend => "prepend",
            Keyword::Yield => "yield",
        }
    }

    /// Keywords that may be followed by `: element` on the same line.
    pub fn allows_expansion(self) -> bool {
        matches!(self, Keyword::When | Keyword::Default)
    }
}

impl TokenKind {
    /// Short human-readable name used in parser diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Indent => "indentation".to_string(),
            TokenKind::Outdent => "outdent".to_string(),
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Eos => "end of template".to_string(),
            TokenKind::Tag(name) => format!("tag `{}`", name),
            TokenKind::InterpolatedTag(expression) => format!("tag `#{{{}}}`", expression),
            TokenKind::Class(name) => format!("class `.{}`", name),
            TokenKind::Id(name) => format!("id `#{}`", name),
            TokenKind::Attributes(_) => "attribute list".to_string(),
            TokenKind::AndAttributes(_) => "`&attributes`".to_string(),
            TokenKind::MixinCall { name, .. } => format!("mixin call `+{}`", name),
            TokenKind::BlockExpansion => "`:`".to_string(),
            TokenKind::TextBlock => "`.`".to_string(),
            TokenKind::SelfClosing => "`/`".to_string(),
            TokenKind::InterpolationStart => "`#[`".to_string(),
            TokenKind::InterpolationEnd => "`]`".to_string(),
            TokenKind::Text(_) => "text".to_string(),
            TokenKind::Filter { name, .. } => format!("filter `:{}`", name),
            TokenKind::Code { .. } => "code".to_string(),
            TokenKind::Comment { .. } => "comment".to_string(),
            TokenKind::Keyword { keyword, .. } => format!("`{}`", keyword.as_str()),
        }
    }
}
