use pug::TemplateError;
use pug::parser::Parser;
use tracing::{debug, info};

use crate::classify::classify;
use crate::config::FormatConfig;
use crate::extract::{ClassTokenSet, extract};
use crate::render::{render, render_flat};

/// Classes found in a template, plus the error that stopped parsing, if any.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Empty when `error` is set.
    pub classes: ClassTokenSet,
    pub error: Option<TemplateError>,
}

/// The rendered stylesheet skeleton for one template.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Always present; empty when the template could not be parsed.
    pub text: String,
    pub classes: ClassTokenSet,
    pub error: Option<TemplateError>,
}

/// Parse `source` and collect its classes. A template that fails to lex or
/// parse yields no classes; the failure is returned alongside.
pub fn extract_source(source: &str, file_id: usize) -> Extraction {
    match Parser::new(source.to_string(), file_id).parse() {
        Ok(root) => {
            let classes = extract(&root);
            debug!(classes = classes.len(), "extracted classes");
            Extraction {
                classes,
                error: None,
            }
        }
        Err(error) => {
            info!(%error, "template could not be parsed");
            Extraction {
                classes: ClassTokenSet::default(),
                error: Some(error),
            }
        }
    }
}

/// Render classes as nested BEM or as a flat list, per `config.bem_nesting`.
pub fn render_classes(classes: &ClassTokenSet, config: &FormatConfig) -> String {
    if !config.bem_nesting {
        return render_flat(classes, config);
    }

    let hierarchy = classify(
        classes,
        &config.element_separator,
        &config.modifier_separator,
    );
    debug!(blocks = hierarchy.len(), "classified selectors");
    render(&hierarchy, config)
}

/// Extract and render in one step. Never fails: a template error leaves the
/// text empty and is reported in `Generated::error`.
pub fn generate(source: &str, file_id: usize, config: &FormatConfig) -> Generated {
    let Extraction { classes, error } = extract_source(source, file_id);
    let text = render_classes(&classes, config);
    Generated {
        text,
        classes,
        error,
    }
}
