use crate::classify::{Block, Element, Hierarchy};
use crate::config::FormatConfig;
use crate::extract::ClassTokenSet;

/// Render the hierarchy as nested BEM selectors.
pub fn render(hierarchy: &Hierarchy, config: &FormatConfig) -> String {
    let mut emitter = Emitter::new(config);
    for block in hierarchy.blocks() {
        emitter.block(block);
    }

    if config.brackets {
        emitter.out
    } else {
        collapse_blank_lines(&emitter.out)
    }
}

/// Render every class as its own top-level selector.
pub fn render_flat(tokens: &ClassTokenSet, config: &FormatConfig) -> String {
    let (open, close) = if config.brackets { ("{", "}") } else { ("", "") };
    let separator = if config.brackets_newline_after { "\n" } else { "" };

    let text = tokens
        .iter()
        .map(|class| format!(".{} {}{}{}", class, open, separator, close))
        .collect::<Vec<_>>()
        .join("\n");

    if config.brackets {
        text
    } else {
        collapse_blank_lines(&text)
    }
}

/// Cap every run of consecutive line breaks at two (one blank line).
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0;
    for c in text.chars() {
        if c == '\n' {
            run += 1;
            if run > 2 {
                continue;
            }
        } else {
            run = 0;
        }
        out.push(c);
    }
    out
}

struct Emitter<'c> {
    config: &'c FormatConfig,
    out: String,
}

impl<'c> Emitter<'c> {
    fn new(config: &'c FormatConfig) -> Self {
        Emitter {
            config,
            out: String::new(),
        }
    }

    fn block(&mut self, block: &Block) {
        let config = self.config;

        self.out.push('.');
        self.out.push_str(&block.name);
        self.out.push_str(if config.brackets { " {\n" } else { "\n" });

        for modifier in &block.modifiers {
            let path = format!("{}{}{}", block.name, config.modifier_separator, modifier);
            let line = format!("{}{}{}", config.parent_symbol, config.modifier_separator, modifier);
            self.leaf(1, &path, &line, false);
        }

        for element in block.elements() {
            self.element(block, element);
        }

        self.out.push_str(if config.brackets { "}\n" } else { "\n" });
    }

    fn element(&mut self, block: &Block, element: &Element) {
        let config = self.config;
        let path = format!("{}{}{}", block.name, config.element_separator, element.name);
        let has_modifiers = !element.modifiers.is_empty();

        self.comment(true, 1, &path);
        self.gap(true);
        self.indent(1);
        self.out.push_str(&config.parent_symbol);
        self.out.push_str(&config.element_separator);
        self.out.push_str(&element.name);
        self.out.push_str(match (config.brackets, config.brackets_newline_after) {
            (true, true) => " {\n",
            (true, false) => " {",
            (false, _) => "\n",
        });

        if has_modifiers {
            if !config.brackets_newline_after {
                self.out.push('\n');
            }
            for modifier in &element.modifiers {
                let modifier_path = format!("{}{}{}", path, config.modifier_separator, modifier);
                let line = format!("{}{}{}", config.parent_symbol, config.modifier_separator, modifier);
                self.leaf(2, &modifier_path, &line, true);
            }
        }

        if !config.brackets {
            self.out.push('\n');
        } else if config.brackets_newline_after || has_modifiers {
            self.indent(1);
            self.out.push_str("}\n");
        } else {
            // Closes the ` {` left open on the element line.
            self.out.push_str("}\n");
        }
    }

    /// A modifier line with an empty body. Without brackets the line is
    /// followed by a blank line, and `gap_unbracketed` decides whether the
    /// configured empty line precedes it.
    fn leaf(&mut self, depth: usize, path: &str, line: &str, gap_unbracketed: bool) {
        let config = self.config;
        let gap = config.brackets || gap_unbracketed;

        self.comment(gap, depth, path);
        self.gap(gap);
        self.indent(depth);
        self.out.push_str(line);

        if !config.brackets {
            self.out.push_str("\n\n");
        } else if config.brackets_newline_after {
            self.out.push_str(" {\n");
            self.indent(depth);
            self.out.push_str("}\n");
        } else {
            self.out.push_str(" {}\n");
        }
    }

    fn comment(&mut self, gap: bool, depth: usize, path: &str) {
        if !self.config.add_comments {
            return;
        }
        let (open, close) = self.config.comment_style.delimiters();
        self.gap(gap);
        self.indent(depth);
        self.out.push_str(open);
        self.out.push('.');
        self.out.push_str(path);
        self.out.push_str(close);
        self.out.push('\n');
    }

    fn gap(&mut self, enabled: bool) {
        if enabled && self.config.empty_line_before_nested_selector {
            self.out.push('\n');
        }
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(&self.config.indent_unit);
        }
    }
}
