pub mod error;
pub mod token;

pub use error::LexError;
pub use token::{Keyword, Token, TokenKind};

use std::ops::Range;

use crate::node::Attribute;

/// Split template source into a flat token stream.
///
/// Layout is reported with `Indent`/`Outdent`/`Newline` tokens; the stream
/// always ends with one `Outdent` per still-open level followed by `Eos`.
/// Lines nested under comments, text blocks (`p.`) and bare `-` code lines
/// are not tokenized: they are collected as the raw body of that token.
pub fn tokenize(source: &str, file_id: usize) -> Result<Vec<Token>, LexError> {
    Lexer::new(source, file_id).run()
}

struct Lexer<'a> {
    source: &'a str,
    file_id: usize,
    pos: usize,
    tokens: Vec<Token>,
    /// Widths of the open indentation levels; the bottom entry is always 0.
    indent_stack: Vec<usize>,
    /// Indentation character fixed by the first indented line.
    indent_char: Option<char>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, file_id: usize) -> Self {
        Lexer {
            source,
            file_id,
            pos: 0,
            tokens: Vec::new(),
            indent_stack: vec![0],
            indent_char: None,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut first_line = true;

        while self.pos < self.source.len() {
            let line = self.rest_of_line();
            if line.trim().is_empty() {
                self.skip_line();
                continue;
            }

            let line_start = self.pos;
            let width = self.measure_indent(line, line_start)?;
            self.pos += width;
            self.track_indent(width, line_start, first_line)?;
            first_line = false;

            self.lex_line()?;
            self.skip_line();
        }

        let end = self.source.len();
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Outdent, end..end);
        }
        self.push(TokenKind::Eos, end..end);
        Ok(self.tokens)
    }

    // -----------------------------------------------------------------------
    // Indentation
    // -----------------------------------------------------------------------

    fn measure_indent(&mut self, line: &str, line_start: usize) -> Result<usize, LexError> {
        let indent = &line[..line.len() - line.trim_start_matches(is_indent_char).len()];
        if indent.is_empty() {
            return Ok(0);
        }

        let has_tabs = indent.contains('\t');
        let has_spaces = indent.contains(' ');
        let used = if has_tabs { '\t' } else { ' ' };
        if (has_tabs && has_spaces) || self.indent_char.is_some_and(|c| c != used) {
            return Err(LexError::new(
                "Invalid indentation, you can use tabs or spaces but not both",
                line_start..line_start + indent.len(),
                self.file_id,
            ));
        }

        self.indent_char = Some(used);
        Ok(indent.len())
    }

    fn track_indent(
        &mut self,
        width: usize,
        line_start: usize,
        first_line: bool,
    ) -> Result<(), LexError> {
        let span = line_start..line_start + width;
        let current = self.current_indent();

        if width > current {
            self.indent_stack.push(width);
            self.push(TokenKind::Indent, span);
        } else if width == current {
            if !first_line {
                self.push(TokenKind::Newline, span);
            }
        } else {
            let mut closed = current;
            while self.current_indent() > width {
                if let Some(level) = self.indent_stack.pop() {
                    closed = level;
                }
                self.push(TokenKind::Outdent, span.clone());
            }
            if self.current_indent() != width {
                return Err(LexError::new(
                    format!(
                        "Inconsistent indentation. Expecting either {} or {} spaces/tabs.",
                        self.current_indent(),
                        closed
                    ),
                    span,
                    self.file_id,
                )
                .with_note("an outdented line must line up with an enclosing level"));
            }
        }
        Ok(())
    }

    fn current_indent(&self) -> usize {
        self.indent_stack.last().copied().unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Lines
    // -----------------------------------------------------------------------

    fn lex_line(&mut self) -> Result<(), LexError> {
        let line = self.rest_of_line();
        let start = self.pos;

        if let Some(rest) = line.strip_prefix("//") {
            let (buffered, text) = match rest.strip_prefix('-') {
                Some(text) => (false, text),
                None => (true, rest),
            };
            let mut text = text.trim().to_string();
            self.pos = self.line_end();
            if let Some(body) = self.raw_block() {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&body);
            }
            self.push(TokenKind::Comment { buffered, text }, start..self.pos);
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix('|') {
            self.pos = self.line_end();
            let text = rest.strip_prefix(' ').unwrap_or(rest);
            let text_start = start + line.len() - text.len();
            return self.push_text(text, text_start..self.pos, true);
        }

        if line.starts_with('<') {
            self.pos = self.line_end();
            return self.push_text(line, start..self.pos, true);
        }

        if line
            .strip_prefix(':')
            .is_some_and(|rest| rest.bytes().next().is_some_and(is_name_byte))
        {
            return self.lex_filter();
        }

        if let Some(rest) = line.strip_prefix('-') {
            let mut source = rest.trim().to_string();
            self.pos = self.line_end();
            if source.is_empty() {
                source = self.raw_block().unwrap_or_default();
            }
            self.push(
                TokenKind::Code {
                    buffered: false,
                    source,
                },
                start..self.pos,
            );
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix("!=").or_else(|| line.strip_prefix('=')) {
            self.pos = self.line_end();
            self.push(
                TokenKind::Code {
                    buffered: true,
                    source: rest.trim().to_string(),
                },
                start..self.pos,
            );
            return Ok(());
        }

        if let Some((keyword, len)) = keyword_at(line) {
            return self.lex_keyword(keyword, len);
        }

        self.lex_inline_element()
    }

    fn lex_keyword(&mut self, keyword: Keyword, len: usize) -> Result<(), LexError> {
        let line = self.rest_of_line();
        let start = self.pos;
        let after = &line[len..];

        let expansion = if keyword.allows_expansion() {
            find_expansion(after)
        } else {
            None
        };
        let argument = after[..expansion.unwrap_or(after.len())].trim();
        let argument = (!argument.is_empty()).then(|| argument.to_string());

        let colon = expansion.map(|i| start + len + i);
        let end = colon.unwrap_or(start + line.len());
        self.push(TokenKind::Keyword { keyword, argument }, start..end);

        match colon {
            Some(colon) => {
                self.push(TokenKind::BlockExpansion, colon..colon + 1);
                self.pos = colon + 1;
                self.skip_while(is_indent_char);
                if self.rest_of_line().is_empty() {
                    return Ok(());
                }
                self.lex_inline_element()
            }
            None => {
                self.pos = self.line_end();
                Ok(())
            }
        }
    }

    /// `:name`, `:outer:inner` or `:name(options)`, then inline text or
    /// nested raw lines. Options are not element attributes and are dropped.
    fn lex_filter(&mut self) -> Result<(), LexError> {
        let line = self.rest_of_line();
        let start = self.pos;

        let mut name_len = 0;
        while let Some(rest) = line[name_len..].strip_prefix(':') {
            let len = rest.bytes().take_while(|b| is_name_byte(*b)).count();
            if len == 0 {
                break;
            }
            name_len += 1 + len;
        }
        let name = line[1..name_len].to_string();
        self.pos += name_len;

        if self.peek() == Some('(') {
            self.lex_attributes()?;
        }

        let mut text = self.rest_of_line().trim().to_string();
        self.pos = self.line_end();
        if let Some(body) = self.raw_block() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&body);
        }
        self.push(TokenKind::Filter { name, text }, start..self.pos);
        Ok(())
    }

    /// An element or mixin call starting at the cursor.
    fn lex_inline_element(&mut self) -> Result<(), LexError> {
        let line = self.rest_of_line();
        let start = self.pos;

        if line.starts_with("#{") {
            self.pos += 1;
            let expression = self.balanced_group('}')?;
            self.push(
                TokenKind::InterpolatedTag(expression.trim().to_string()),
                start..self.pos,
            );
            return self.lex_element_tail();
        }

        if let Some(rest) = line.strip_prefix('+') {
            let name_len = rest.bytes().take_while(|b| is_name_byte(*b)).count();
            if name_len == 0 {
                return Err(LexError::new(
                    "expected a mixin name after `+`",
                    start..start + 1,
                    self.file_id,
                ));
            }
            let name = rest[..name_len].to_string();
            self.pos += 1 + name_len;
            let args = match self.peek() {
                Some('(') => Some(self.balanced_group(')')?),
                _ => None,
            };
            self.push(TokenKind::MixinCall { name, args }, start..self.pos);
            return self.lex_element_tail();
        }

        let name_len = tag_name_len(line);
        if name_len > 0 {
            self.push(
                TokenKind::Tag(line[..name_len].to_string()),
                start..start + name_len,
            );
            self.pos += name_len;
        }
        self.lex_element_tail()
    }

    /// Shorthands, attributes and whatever ends the element line.
    fn lex_element_tail(&mut self) -> Result<(), LexError> {
        loop {
            let line = self.rest_of_line();
            let Some(c) = line.chars().next() else {
                return Ok(());
            };
            let start = self.pos;

            match c {
                '.' => {
                    let after = &line[1..];
                    let name_len = after.bytes().take_while(|b| is_name_byte(*b)).count();
                    if name_len == 0 {
                        if !after.trim().is_empty() {
                            return Err(LexError::new(
                                format!("unexpected text `{}` after `.`", after.trim()),
                                start..start + line.len(),
                                self.file_id,
                            ));
                        }
                        self.pos = self.line_end();
                        self.push(TokenKind::TextBlock, start..start + 1);
                        if let Some(body) = self.raw_block() {
                            // The body is re-indented, so offsets inside it
                            // do not map back onto the source.
                            self.push_text(&body, start + 1..self.pos, false)?;
                        }
                        return Ok(());
                    }

                    let name = &after[..name_len];
                    if !name.bytes().any(|b| b.is_ascii_alphabetic() || b == b'_') {
                        return Err(LexError::new(
                            "Class names must contain at least one letter or underscore.",
                            start..start + 1 + name_len,
                            self.file_id,
                        ));
                    }
                    self.pos += 1 + name_len;
                    self.push(TokenKind::Class(name.to_string()), start..self.pos);
                }
                '#' => {
                    let after = &line[1..];
                    let name_len = after.bytes().take_while(|b| is_name_byte(*b)).count();
                    if name_len == 0 {
                        return Err(LexError::new(
                            "expected an id name after `#`",
                            start..start + 1,
                            self.file_id,
                        ));
                    }
                    self.pos += 1 + name_len;
                    self.push(TokenKind::Id(after[..name_len].to_string()), start..self.pos);
                }
                '(' => {
                    let attributes = self.lex_attributes()?;
                    self.push(TokenKind::Attributes(attributes), start..self.pos);
                }
                '&' if line.starts_with("&attributes(") => {
                    self.pos += "&attributes".len();
                    let object = self.balanced_group(')')?;
                    self.push(TokenKind::AndAttributes(object), start..self.pos);
                }
                ':' if line[1..].is_empty() || line[1..].starts_with(char::is_whitespace) => {
                    self.push(TokenKind::BlockExpansion, start..start + 1);
                    self.pos += 1;
                    self.skip_while(is_indent_char);
                    if self.rest_of_line().is_empty() {
                        return Ok(());
                    }
                    return self.lex_inline_element();
                }
                '=' | '!' if line.starts_with('=') || line.starts_with("!=") => {
                    let skip = if c == '!' { 2 } else { 1 };
                    self.pos = self.line_end();
                    self.push(
                        TokenKind::Code {
                            buffered: true,
                            source: line[skip..].trim().to_string(),
                        },
                        start..self.pos,
                    );
                    return Ok(());
                }
                '/' => {
                    self.pos += 1;
                    self.push(TokenKind::SelfClosing, start..self.pos);
                }
                c if c.is_whitespace() => {
                    let text = &line[c.len_utf8()..];
                    self.pos = self.line_end();
                    if text.trim().is_empty() {
                        return Ok(());
                    }
                    let text_start = start + c.len_utf8();
                    return self.push_text(text, text_start..self.pos, true);
                }
                other => {
                    return Err(LexError::new(
                        format!("unexpected character `{}`", other),
                        start..start + other.len_utf8(),
                        self.file_id,
                    ));
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Attributes and bracketed groups
    // -----------------------------------------------------------------------

    /// `(name=value, flag, other!=expr)`, possibly spanning several lines.
    fn lex_attributes(&mut self) -> Result<Vec<Attribute>, LexError> {
        let open = self.pos;
        self.pos += 1;
        let mut attributes = Vec::new();

        loop {
            self.skip_while(|c| c.is_whitespace() || c == ',');
            let Some(c) = self.peek() else {
                return Err(self.unclosed(open));
            };
            if c == ')' {
                self.pos += 1;
                return Ok(attributes);
            }

            let name_start = self.pos;
            let name = if c == '\'' || c == '"' {
                self.skip_quoted(c)?;
                self.source[name_start + 1..self.pos - 1].to_string()
            } else {
                self.skip_while(|c| !(c.is_whitespace() || matches!(c, '=' | '!' | ',' | '(' | ')')));
                self.source[name_start..self.pos].to_string()
            };
            if name.is_empty() {
                return Err(LexError::new(
                    format!("unexpected character `{}` in attribute list", c),
                    name_start..name_start + c.len_utf8(),
                    self.file_id,
                ));
            }

            self.skip_while(is_indent_char);
            let rest = &self.source[self.pos..];
            let value = if rest.starts_with("!=") {
                self.pos += 2;
                Some(self.attribute_value()?)
            } else if rest.starts_with('=') {
                self.pos += 1;
                Some(self.attribute_value()?)
            } else {
                None
            };
            attributes.push(Attribute::new(name, value));
        }
    }

    /// Raw value expression, ending at top-level whitespace, `,` or `)`.
    fn attribute_value(&mut self) -> Result<String, LexError> {
        self.skip_while(is_indent_char);
        let start = self.pos;
        let mut depth = 0usize;

        while let Some(c) = self.peek() {
            match c {
                '\'' | '"' | '`' => {
                    self.skip_quoted(c)?;
                    continue;
                }
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' if depth > 0 => depth -= 1,
                ')' => break,
                ',' if depth == 0 => break,
                c if c.is_whitespace() && depth == 0 => break,
                _ => {}
            }
            self.pos += c.len_utf8();
        }

        if self.pos == start {
            return Err(LexError::new(
                "expected a value after `=`",
                start.saturating_sub(1)..start,
                self.file_id,
            ));
        }
        Ok(self.source[start..self.pos].to_string())
    }

    /// Inner text of a bracketed group ending in `close`; the cursor must sit
    /// on the opening bracket.
    fn balanced_group(&mut self, close: char) -> Result<String, LexError> {
        let open = self.pos;
        self.pos += 1;
        let mut depth = 0usize;

        while let Some(c) = self.peek() {
            match c {
                '\'' | '"' | '`' => {
                    self.skip_quoted(c)?;
                    continue;
                }
                c if c == close && depth == 0 => {
                    let inner = self.source[open + 1..self.pos].to_string();
                    self.pos += 1;
                    return Ok(inner);
                }
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.pos += c.len_utf8();
        }

        Err(self.unclosed(open))
    }

    /// Skip a quoted string; the cursor must sit on the opening quote.
    /// Only backtick strings may cross a line break.
    fn skip_quoted(&mut self, quote: char) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += quote.len_utf8();

        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                if let Some(escaped) = self.peek() {
                    self.pos += escaped.len_utf8();
                }
                continue;
            }
            if c == '\n' && quote != '`' {
                break;
            }
            self.pos += c.len_utf8();
            if c == quote {
                return Ok(());
            }
        }

        Err(LexError::new(
            "unterminated string in attribute value",
            start..self.pos,
            self.file_id,
        ))
    }

    fn unclosed(&self, open: usize) -> LexError {
        let bracket = self.source[open..].chars().next().unwrap_or('(');
        let error = LexError::new(
            format!(
                "End of file was reached with no closing bracket for `{}`.",
                bracket
            ),
            open..open + bracket.len_utf8(),
            self.file_id,
        );
        if bracket == '(' {
            error.with_note("attribute lists may span several lines but must be closed")
        } else {
            error
        }
    }

    // -----------------------------------------------------------------------
    // Text
    // -----------------------------------------------------------------------

    /// Push `text` as `Text` tokens, lexing each `#[...]` tag interpolation
    /// in it as an inline element between `InterpolationStart` and
    /// `InterpolationEnd`. With `exact`, `text` starts at `span.start` and
    /// every token gets its own span; otherwise all of them get `span`.
    fn push_text(&mut self, text: &str, span: Range<usize>, exact: bool) -> Result<(), LexError> {
        let locate = |from: usize, to: usize| {
            if exact {
                span.start + from..span.start + to
            } else {
                span.clone()
            }
        };

        let mut plain_start = 0;
        let mut search = 0;
        while let Some(found) = text[search..].find("#[") {
            let open = search + found;
            let inner_start = open + 2;
            if text[..open].ends_with('\\') {
                search = inner_start;
                continue;
            }

            let Some(len) = interpolation_len(&text[inner_start..]) else {
                return Err(LexError::new(
                    "End of line was reached with no closing bracket for `#[`.",
                    locate(open, inner_start),
                    self.file_id,
                ));
            };
            let inner_end = inner_start + len;

            if open > plain_start {
                self.push(
                    TokenKind::Text(text[plain_start..open].to_string()),
                    locate(plain_start, open),
                );
            }
            self.push(TokenKind::InterpolationStart, locate(open, inner_start));

            let mut inner = Lexer::new(&text[inner_start..inner_end], self.file_id);
            if let Err(mut error) = inner.lex_inline_element() {
                error.span = locate(inner_start + error.span.start, inner_start + error.span.end);
                return Err(error);
            }
            for token in inner.tokens {
                let span = locate(inner_start + token.span.start, inner_start + token.span.end);
                self.push(token.kind, span);
            }

            self.push(TokenKind::InterpolationEnd, locate(inner_end, inner_end + 1));
            plain_start = inner_end + 1;
            search = plain_start;
        }

        if plain_start == 0 || plain_start < text.len() {
            self.push(
                TokenKind::Text(text[plain_start..].to_string()),
                locate(plain_start, text.len()),
            );
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Raw blocks
    // -----------------------------------------------------------------------

    /// Consume the lines nested deeper than the current level as raw text.
    /// The cursor must sit at the end of the owning line.
    fn raw_block(&mut self) -> Option<String> {
        let source = self.source;
        let parent = self.current_indent();
        let mut lines: Vec<&str> = Vec::new();
        let mut kept = 0;
        let mut base = None;
        let mut cursor = self.pos;
        let mut consumed = self.pos;

        while cursor < source.len() {
            let start = cursor + 1;
            let end = source[start..]
                .find('\n')
                .map_or(source.len(), |i| start + i);
            let line = source[start..end].trim_end_matches('\r');
            cursor = end;

            if line.trim().is_empty() {
                lines.push("");
                continue;
            }
            let width = line.len() - line.trim_start().len();
            if width <= parent {
                break;
            }
            let cut = *base.get_or_insert(width);
            lines.push(line.get(cut.min(width)..).unwrap_or(line.trim_start()));
            kept = lines.len();
            consumed = end;
        }

        if kept == 0 {
            return None;
        }
        lines.truncate(kept);
        self.pos = consumed;
        Some(lines.join("\n"))
    }

    // -----------------------------------------------------------------------
    // Cursor helpers
    // -----------------------------------------------------------------------

    fn push(&mut self, kind: TokenKind, span: Range<usize>) {
        self.tokens.push(Token { kind, span });
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn skip_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// Byte offset of the `\n` ending the current line, or the source length.
    fn line_end(&self) -> usize {
        self.source[self.pos..]
            .find('\n')
            .map_or(self.source.len(), |i| self.pos + i)
    }

    /// Text from the cursor to the end of the line, without the line break.
    fn rest_of_line(&self) -> &'a str {
        let source = self.source;
        source[self.pos..self.line_end()].trim_end_matches('\r')
    }

    fn skip_line(&mut self) {
        self.pos = match self.source[self.pos..].find('\n') {
            Some(i) => self.pos + i + 1,
            None => self.source.len(),
        };
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_indent_char(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Length of a tag name at the start of `line`: a word character, then word
/// characters, `-` or `:`, ending on a word character (`svg:path`, `my-tag`).
fn tag_name_len(line: &str) -> usize {
    let bytes = line.as_bytes();
    if !bytes
        .first()
        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
    {
        return 0;
    }
    let mut end = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':'))
        .count();
    while end > 0 && matches!(bytes[end - 1], b'-' | b':') {
        end -= 1;
    }
    end
}

/// Recognize a line-leading keyword. Returns the keyword and the byte length
/// of the keyword text (`else if` counts as one keyword).
fn keyword_at(line: &str) -> Option<(Keyword, usize)> {
    let word_len = line.bytes().take_while(|b| b.is_ascii_lowercase()).count();
    let keyword = Keyword::from_word(&line[..word_len])?;
    let after = &line[word_len..];

    let at_boundary = after.is_empty()
        || after.starts_with(char::is_whitespace)
        || (keyword.allows_expansion() && after.starts_with(':'));
    if !at_boundary {
        return None;
    }

    if keyword == Keyword::Else {
        let trimmed = after.trim_start();
        if let Some(rest) = trimmed.strip_prefix("if") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Some((Keyword::ElseIf, line.len() - rest.len()));
            }
        }
    }
    Some((keyword, word_len))
}

/// Length of the element inside `#[...]`, up to its closing `]`. Quotes only
/// matter inside attribute lists, so apostrophes in plain text are fine.
fn interpolation_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote = None;
    let mut chars = text.char_indices();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some(_) if c == '\\' => {
                chars.next();
            }
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' if depth > 0 => quote = Some(c),
                ']' if depth == 0 => return Some(i),
                '[' | '(' | '{' => depth += 1,
                ']' | ')' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            },
        }
    }
    None
}

/// Byte offset of a block-expansion colon in a keyword argument: a `:`
/// outside quotes followed by whitespace or the end of the line.
fn find_expansion(argument: &str) -> Option<usize> {
    let mut quote = None;
    let mut chars = argument.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                ':' => {
                    let next = chars.peek().map(|(_, n)| *n);
                    if next.is_none_or(char::is_whitespace) {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
    }
    None
}
