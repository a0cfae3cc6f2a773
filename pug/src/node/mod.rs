use std::ops::Range;

/// A single `name=value` pair from an element's attribute list.
///
/// `value` holds the raw expression text exactly as written, quotes included
/// (`'a b'`, `"x"`, `isActive`). Bare boolean attributes have no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Attribute {
            name: name.into(),
            value,
        }
    }

    /// The attribute a `.name` shorthand stands for.
    pub fn class_shorthand(class: &str) -> Self {
        Attribute::new("class", Some(format!("'{}'", class)))
    }

    /// The attribute a `#name` shorthand stands for.
    pub fn id_shorthand(id: &str) -> Self {
        Attribute::new("id", Some(format!("'{}'", id)))
    }
}

/// A node in a parsed template.
///
/// Every construct that owns nested markup exposes it through `children`,
/// whatever its kind: element bodies, block expansions, each branch of a
/// conditional, `case` branches, loop bodies and their `else` fallback,
/// mixin definitions and named blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Present on elements and mixin calls (possibly empty).
    pub attributes: Option<Vec<Attribute>>,
    /// Present on nodes that can own nested content (possibly empty).
    pub children: Option<Vec<Node>>,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
}

impl Node {
    pub fn leaf(kind: NodeKind, span: Range<usize>) -> Self {
        Node {
            kind,
            attributes: None,
            children: None,
            span,
        }
    }

    pub fn container(kind: NodeKind, children: Vec<Node>, span: Range<usize>) -> Self {
        Node {
            kind,
            attributes: None,
            children: Some(children),
            span,
        }
    }

    pub fn element(
        kind: NodeKind,
        attributes: Vec<Attribute>,
        children: Vec<Node>,
        span: Range<usize>,
    ) -> Self {
        Node {
            kind,
            attributes: Some(attributes),
            children: Some(children),
            span,
        }
    }

    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn attributes(&self) -> &[Attribute] {
        self.attributes.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The root of a template.
    Document,
    Tag(String),
    /// `#{expression}` used as a tag name.
    InterpolatedTag(String),
    /// `+name(args)`
    MixinCall { name: String, args: Option<String> },
    /// `mixin name(args)`
    MixinDefinition { name: String, args: Option<String> },
    Text(String),
    Code { buffered: bool, source: String },
    Comment { buffered: bool, text: String },
    /// `:name` with its text, unparsed.
    Filter { name: String, text: String },
    Doctype(String),
    /// An `if`/`unless` chain; children are its `Branch` nodes in order.
    Conditional,
    /// `case subject`; children are `when`/`default` branches.
    Case(String),
    Branch { keyword: BranchKeyword, test: Option<String> },
    /// `each`/`for` loop; an `else` fallback is appended as a trailing branch.
    Each(String),
    While(String),
    NamedBlock { mode: BlockMode, name: String },
    Include(String),
    Extends(String),
    Yield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKeyword {
    If,
    Unless,
    ElseIf,
    Else,
    When,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    Replace,
    Append,
    Prepend,
}
