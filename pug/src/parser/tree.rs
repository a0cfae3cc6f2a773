use std::ops::Range;

use crate::lexer::{Keyword, Token, TokenKind};
use crate::node::{Attribute, BlockMode, BranchKeyword, Node, NodeKind};
use crate::parser::error::ParseError;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Assemble a token stream into a `Document` node.
pub(super) fn build(
    tokens: Vec<Token>,
    file_id: usize,
    source_len: usize,
) -> Result<Node, ParseError> {
    let mut state = TreeState::new(tokens, file_id);

    if matches!(state.peek().kind, TokenKind::Indent) {
        return Err(state
            .error_here("unexpected indentation at the start of the template")
            .with_note("the first line of a template must not be indented"));
    }

    let children = state.parse_nodes()?;
    let end = state.peek().clone();
    if !matches!(end.kind, TokenKind::Eos) {
        return Err(ParseError::new(
            format!("unexpected {}", end.kind.describe()),
            end.span,
            state.file_id,
        ));
    }

    Ok(Node::container(NodeKind::Document, children, 0..source_len))
}

// ---------------------------------------------------------------------------
// Tree state
// ---------------------------------------------------------------------------

struct TreeState {
    /// Never empty: the lexer always terminates the stream with `Eos`.
    tokens: Vec<Token>,
    pos: usize,
    file_id: usize,
}

impl TreeState {
    fn new(tokens: Vec<Token>, file_id: usize) -> Self {
        TreeState {
            tokens,
            pos: 0,
            file_id,
        }
    }

    /// Sibling nodes up to the end of the current indentation level.
    fn parse_nodes(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes: Vec<Node> = Vec::new();

        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Eos | TokenKind::Outdent => return Ok(nodes),
                TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::Indent => return Err(self.error_here("unexpected indentation")),
                TokenKind::Keyword {
                    keyword: Keyword::Else | Keyword::ElseIf,
                    ..
                } => {
                    let branch = self.parse_else()?;
                    attach_else(&mut nodes, branch, &token.span, self.file_id)?;
                }
                _ => {
                    let node = self.parse_statement()?;
                    nodes.push(node);
                }
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Node, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Tag(_)
            | TokenKind::InterpolatedTag(_)
            | TokenKind::Class(_)
            | TokenKind::Id(_)
            | TokenKind::Attributes(_)
            | TokenKind::AndAttributes(_)
            | TokenKind::MixinCall { .. } => self.parse_element(),

            TokenKind::Text(text) => {
                self.advance();
                self.leaf(NodeKind::Text(text), token.span, "text")
            }

            TokenKind::InterpolationStart => self.parse_interpolation(),

            TokenKind::Filter { name, text } => {
                self.advance();
                self.leaf(NodeKind::Filter { name, text }, token.span, "a filter")
            }

            TokenKind::Code { buffered, source } => {
                self.advance();
                let kind = NodeKind::Code { buffered, source };
                if buffered {
                    return self.leaf(kind, token.span, "buffered code");
                }
                let children = self.parse_optional_block()?;
                Ok(Node::container(kind, children, token.span.start..self.previous_end()))
            }

            TokenKind::Comment { buffered, text } => {
                self.advance();
                self.leaf(NodeKind::Comment { buffered, text }, token.span, "a comment")
            }

            TokenKind::Keyword { keyword, argument } => {
                self.advance();
                self.parse_keyword(keyword, argument, token.span)
            }

            other => Err(ParseError::new(
                format!("unexpected {}", other.describe()),
                token.span,
                self.file_id,
            )),
        }
    }

    // -----------------------------------------------------------------------
    // Elements
    // -----------------------------------------------------------------------

    /// A tag, mixin call or implicit `div` with its attributes and content.
    fn parse_element(&mut self) -> Result<Node, ParseError> {
        let first = self.peek().clone();
        let start = first.span.start;

        let kind = match first.kind {
            TokenKind::Tag(name) => {
                self.advance();
                NodeKind::Tag(name)
            }
            TokenKind::InterpolatedTag(expression) => {
                self.advance();
                NodeKind::InterpolatedTag(expression)
            }
            TokenKind::MixinCall { name, args } => {
                self.advance();
                NodeKind::MixinCall { name, args }
            }
            _ => NodeKind::Tag("div".to_string()),
        };

        let mut attributes = Vec::new();
        loop {
            match &self.peek().kind {
                TokenKind::Class(name) => attributes.push(Attribute::class_shorthand(name)),
                TokenKind::Id(name) => attributes.push(Attribute::id_shorthand(name)),
                TokenKind::Attributes(list) => attributes.extend(list.iter().cloned()),
                TokenKind::AndAttributes(_) | TokenKind::SelfClosing => {}
                _ => break,
            }
            self.advance();
        }

        let mut children = Vec::new();
        let tail = self.peek().clone();
        match tail.kind {
            TokenKind::BlockExpansion => {
                self.advance();
                if !starts_element(&self.peek().kind) {
                    return Err(ParseError::new(
                        "expected an element after `:`",
                        tail.span,
                        self.file_id,
                    )
                    .with_note("block expansion puts a nested element on the same line, as in `li: a`"));
                }
                children.push(self.parse_element()?);
            }
            TokenKind::Text(_) | TokenKind::InterpolationStart => {
                children.extend(self.parse_text_run()?);
            }
            TokenKind::Code { buffered, source } => {
                self.advance();
                children.push(Node::leaf(NodeKind::Code { buffered, source }, tail.span));
            }
            TokenKind::TextBlock => {
                self.advance();
                children.extend(self.parse_text_run()?);
            }
            _ => {}
        }

        children.extend(self.parse_optional_block()?);
        Ok(Node::element(
            kind,
            attributes,
            children,
            start..self.previous_end(),
        ))
    }

    /// Text with its `#[...]` elements, up to the end of the line or block.
    fn parse_text_run(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Text(text) => {
                    self.advance();
                    nodes.push(Node::leaf(NodeKind::Text(text), token.span));
                }
                TokenKind::InterpolationStart => nodes.push(self.parse_interpolation()?),
                _ => return Ok(nodes),
            }
        }
    }

    /// The element inside `#[...]`.
    fn parse_interpolation(&mut self) -> Result<Node, ParseError> {
        let open = self.advance();
        if !starts_element(&self.peek().kind) {
            return Err(ParseError::new(
                "expected an element inside `#[...]`",
                open.span,
                self.file_id,
            ));
        }
        let element = self.parse_element()?;

        let close = self.peek().clone();
        if !matches!(close.kind, TokenKind::InterpolationEnd) {
            return Err(ParseError::new(
                format!("expected `]` after the interpolated element, found {}", close.kind.describe()),
                close.span,
                self.file_id,
            ));
        }
        self.advance();
        Ok(element)
    }

    // -----------------------------------------------------------------------
    // Keywords
    // -----------------------------------------------------------------------

    fn parse_keyword(
        &mut self,
        keyword: Keyword,
        argument: Option<String>,
        span: Range<usize>,
    ) -> Result<Node, ParseError> {
        match keyword {
            Keyword::If | Keyword::Unless => {
                let branch_keyword = if keyword == Keyword::If {
                    BranchKeyword::If
                } else {
                    BranchKeyword::Unless
                };
                let test = self.required(argument, keyword, &span)?;
                let branch = self.parse_branch_body(
                    NodeKind::Branch {
                        keyword: branch_keyword,
                        test: Some(test),
                    },
                    &span,
                )?;
                let end = branch.span.end;
                Ok(Node::container(
                    NodeKind::Conditional,
                    vec![branch],
                    span.start..end,
                ))
            }

            Keyword::Else | Keyword::ElseIf => Err(ParseError::new(
                format!("`{}` must follow an `if`, `unless` or `each` block", keyword.as_str()),
                span,
                self.file_id,
            )),

            Keyword::Case => {
                let subject = self.required(argument, keyword, &span)?;
                self.parse_case(subject, span)
            }

            Keyword::When | Keyword::Default => Err(ParseError::new(
                format!("`{}` is only allowed inside `case`", keyword.as_str()),
                span,
                self.file_id,
            )),

            Keyword::Each => {
                let expression = self.required(argument, keyword, &span)?;
                let children = self.parse_optional_block()?;
                Ok(Node::container(
                    NodeKind::Each(expression),
                    children,
                    span.start..self.previous_end(),
                ))
            }

            Keyword::While => {
                let test = self.required(argument, keyword, &span)?;
                let children = self.parse_optional_block()?;
                Ok(Node::container(
                    NodeKind::While(test),
                    children,
                    span.start..self.previous_end(),
                ))
            }

            Keyword::Mixin => {
                let signature = self.required(argument, keyword, &span)?;
                let (name, args) = split_mixin_signature(&signature);
                let children = self.parse_optional_block()?;
                Ok(Node::container(
                    NodeKind::MixinDefinition { name, args },
                    children,
                    span.start..self.previous_end(),
                ))
            }

            Keyword::Block | Keyword::Append | Keyword::Prepend => {
                let (mode, name) = named_block(keyword, argument.as_deref().unwrap_or(""));
                let children = self.parse_optional_block()?;
                Ok(Node::container(
                    NodeKind::NamedBlock { mode, name },
                    children,
                    span.start..self.previous_end(),
                ))
            }

            Keyword::Include => {
                let path = self.required(argument, keyword, &span)?;
                self.leaf(NodeKind::Include(path), span, "`include`")
            }

            Keyword::Extends => {
                let path = self.required(argument, keyword, &span)?;
                self.leaf(NodeKind::Extends(path), span, "`extends`")
            }

            Keyword::Doctype => {
                let doctype = argument.unwrap_or_else(|| "html".to_string());
                self.leaf(NodeKind::Doctype(doctype), span, "`doctype`")
            }

            Keyword::Yield => self.leaf(NodeKind::Yield, span, "`yield`"),
        }
    }

    /// `else` / `else if` with its body; the parent attaches it to the chain.
    fn parse_else(&mut self) -> Result<Node, ParseError> {
        let token = self.advance();
        let (keyword, argument) = match token.kind {
            TokenKind::Keyword { keyword, argument } => (keyword, argument),
            other => {
                return Err(ParseError::new(
                    format!("unexpected {}", other.describe()),
                    token.span,
                    self.file_id,
                ));
            }
        };

        let kind = if keyword == Keyword::ElseIf {
            NodeKind::Branch {
                keyword: BranchKeyword::ElseIf,
                test: Some(self.required(argument, keyword, &token.span)?),
            }
        } else {
            NodeKind::Branch {
                keyword: BranchKeyword::Else,
                test: None,
            }
        };
        self.parse_branch_body(kind, &token.span)
    }

    fn parse_case(&mut self, subject: String, span: Range<usize>) -> Result<Node, ParseError> {
        let mut branches = Vec::new();

        if matches!(self.peek().kind, TokenKind::Indent) {
            self.advance();
            loop {
                let token = self.peek().clone();
                match token.kind {
                    TokenKind::Newline | TokenKind::Comment { .. } => {
                        self.advance();
                    }
                    TokenKind::Outdent => {
                        self.advance();
                        break;
                    }
                    TokenKind::Eos => break,
                    TokenKind::Keyword {
                        keyword: Keyword::When,
                        argument,
                    } => {
                        self.advance();
                        let test = self.required(argument, Keyword::When, &token.span)?;
                        branches.push(self.parse_branch_body(
                            NodeKind::Branch {
                                keyword: BranchKeyword::When,
                                test: Some(test),
                            },
                            &token.span,
                        )?);
                    }
                    TokenKind::Keyword {
                        keyword: Keyword::Default,
                        ..
                    } => {
                        self.advance();
                        branches.push(self.parse_branch_body(
                            NodeKind::Branch {
                                keyword: BranchKeyword::Default,
                                test: None,
                            },
                            &token.span,
                        )?);
                    }
                    other => {
                        return Err(ParseError::new(
                            format!(
                                "`case` can only contain `when` and `default` branches, found {}",
                                other.describe()
                            ),
                            token.span,
                            self.file_id,
                        ));
                    }
                }
            }
        }

        Ok(Node::container(
            NodeKind::Case(subject),
            branches,
            span.start..self.previous_end(),
        ))
    }

    /// Optional `: element` expansion followed by an optional indented block.
    fn parse_branch_body(&mut self, kind: NodeKind, span: &Range<usize>) -> Result<Node, ParseError> {
        let mut children = Vec::new();

        let token = self.peek().clone();
        if matches!(token.kind, TokenKind::BlockExpansion) {
            self.advance();
            if !starts_element(&self.peek().kind) {
                return Err(ParseError::new(
                    "expected an element after `:`",
                    token.span,
                    self.file_id,
                ));
            }
            children.push(self.parse_element()?);
        }

        children.extend(self.parse_optional_block()?);
        Ok(Node::container(kind, children, span.start..self.previous_end()))
    }

    // -----------------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------------

    /// The nodes of an indented block, if one follows.
    fn parse_optional_block(&mut self) -> Result<Vec<Node>, ParseError> {
        if !matches!(self.peek().kind, TokenKind::Indent) {
            return Ok(Vec::new());
        }
        self.advance();

        let nodes = self.parse_nodes()?;
        let end = self.peek().clone();
        match end.kind {
            TokenKind::Outdent => {
                self.advance();
                Ok(nodes)
            }
            other => Err(ParseError::new(
                format!("expected the end of an indented block, found {}", other.describe()),
                end.span,
                self.file_id,
            )),
        }
    }

    /// A node that cannot own nested content.
    fn leaf(&self, kind: NodeKind, span: Range<usize>, what: &str) -> Result<Node, ParseError> {
        if matches!(self.peek().kind, TokenKind::Indent) {
            return Err(self
                .error_here(format!("{} cannot have nested content", what))
                .with_note("remove the indentation of the following lines"));
        }
        Ok(Node::leaf(kind, span))
    }

    fn required(
        &self,
        argument: Option<String>,
        keyword: Keyword,
        span: &Range<usize>,
    ) -> Result<String, ParseError> {
        argument.ok_or_else(|| {
            ParseError::new(
                format!("`{}` requires an expression", keyword.as_str()),
                span.clone(),
                self.file_id,
            )
        })
    }

    // -----------------------------------------------------------------------
    // Token access
    // -----------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Consume the current token; `Eos` is never consumed.
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// End offset of the last consumed token that is not layout.
    fn previous_end(&self) -> usize {
        self.tokens[..self.pos]
            .iter()
            .rev()
            .find(|t| {
                !matches!(
                    t.kind,
                    TokenKind::Indent | TokenKind::Outdent | TokenKind::Newline
                )
            })
            .map_or(0, |t| t.span.end)
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.peek().span.clone(), self.file_id)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn starts_element(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Tag(_)
            | TokenKind::InterpolatedTag(_)
            | TokenKind::Class(_)
            | TokenKind::Id(_)
            | TokenKind::Attributes(_)
            | TokenKind::AndAttributes(_)
            | TokenKind::MixinCall { .. }
    )
}

/// Append an `else`/`else if` branch to the chain it continues.
fn attach_else(
    nodes: &mut [Node],
    branch: Node,
    span: &Range<usize>,
    file_id: usize,
) -> Result<(), ParseError> {
    let is_else_if = matches!(
        branch.kind,
        NodeKind::Branch {
            keyword: BranchKeyword::ElseIf,
            ..
        }
    );
    let keyword = if is_else_if { "else if" } else { "else" };

    let Some(target) = nodes.last_mut() else {
        return Err(orphan_else(keyword, span, file_id));
    };

    let accepts = match &target.kind {
        NodeKind::Conditional => !ends_with_else(target),
        NodeKind::Each(_) => !is_else_if && !ends_with_else(target),
        _ => return Err(orphan_else(keyword, span, file_id)),
    };
    if !accepts {
        return Err(ParseError::new(
            format!("unexpected `{}` after the final `else` branch", keyword),
            span.clone(),
            file_id,
        ));
    }

    target.span.end = branch.span.end;
    target.children.get_or_insert_with(Vec::new).push(branch);
    Ok(())
}

fn orphan_else(keyword: &str, span: &Range<usize>, file_id: usize) -> ParseError {
    ParseError::new(
        format!("`{}` must follow an `if`, `unless` or `each` block", keyword),
        span.clone(),
        file_id,
    )
}

fn ends_with_else(node: &Node) -> bool {
    matches!(
        node.children().last().map(|child| &child.kind),
        Some(NodeKind::Branch {
            keyword: BranchKeyword::Else,
            ..
        })
    )
}

/// `name(args)` → (`name`, `Some("args")`).
fn split_mixin_signature(signature: &str) -> (String, Option<String>) {
    match signature.split_once('(') {
        Some((name, rest)) => {
            let args = rest.strip_suffix(')').unwrap_or(rest).trim();
            (name.trim().to_string(), Some(args.to_string()))
        }
        None => (signature.trim().to_string(), None),
    }
}

/// Resolve `block name`, `block append name`, `append name`, ...
fn named_block(keyword: Keyword, argument: &str) -> (BlockMode, String) {
    match keyword {
        Keyword::Append => (BlockMode::Append, argument.to_string()),
        Keyword::Prepend => (BlockMode::Prepend, argument.to_string()),
        _ => match argument.split_once(char::is_whitespace) {
            Some(("append", name)) => (BlockMode::Append, name.trim().to_string()),
            Some(("prepend", name)) => (BlockMode::Prepend, name.trim().to_string()),
            _ => (BlockMode::Replace, argument.to_string()),
        },
    }
}
