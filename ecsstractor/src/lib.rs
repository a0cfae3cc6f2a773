//! Stylesheet skeletons from Pug templates.
//!
//! The pipeline is: parse the template (crate `pug`), `extract` the class
//! names it uses, then either `classify` them into BEM blocks and `render`
//! nested selectors, or `render_flat` one selector per class.
//! [`generate`] runs all of it for one template.

pub mod classify;
pub mod config;
pub mod extract;
pub mod pipeline;
pub mod render;

pub use classify::{Block, Element, Hierarchy, classify};
pub use config::{CommentStyle, FormatConfig};
pub use extract::{ClassTokenSet, extract};
pub use pipeline::{Extraction, Generated, extract_source, generate, render_classes};
pub use render::{render, render_flat};
