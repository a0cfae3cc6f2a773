use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use ecsstractor::{CommentStyle, FormatConfig};

/// Settings file looked up in the working directory.
pub const LOCAL_SETTINGS_FILE: &str = "ecsstractor.toml";

/// Where generated text goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Destination {
    Clipboard,
    #[default]
    #[serde(alias = "newDocument")]
    NewDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStyleSetting {
    /// `/* ... */`
    #[default]
    #[serde(alias = "css")]
    Block,
    /// `// ...`
    #[serde(alias = "scss")]
    Line,
}

impl From<CommentStyleSetting> for CommentStyle {
    fn from(style: CommentStyleSetting) -> Self {
        match style {
            CommentStyleSetting::Block => CommentStyle::Block,
            CommentStyleSetting::Line => CommentStyle::Line,
        }
    }
}

/// Which generation command is running. Every command but `Run` pins the
/// layout switches regardless of the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    #[default]
    Run,
    Bem,
    BemComments,
    Flat,
}

struct Pinned {
    bem_nesting: bool,
    add_comments: bool,
    brackets: bool,
}

impl Preset {
    fn pinned(self) -> Option<Pinned> {
        let (bem_nesting, add_comments, brackets) = match self {
            Preset::Run => return None,
            Preset::Bem => (true, false, true),
            Preset::BemComments => (true, true, true),
            Preset::Flat => (false, false, false),
        };
        Some(Pinned {
            bem_nesting,
            add_comments,
            brackets,
        })
    }
}

/// Persisted user settings. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub add_comment: bool,
    pub brackets: bool,
    pub brackets_newline_after: bool,
    pub destination: Destination,
    pub bem_nesting: bool,
    pub indentation: String,
    pub element_separator: String,
    pub modifier_separator: String,
    pub parent_symbol: String,
    pub empty_line_before_nested_selector: bool,
    pub comment_style: CommentStyleSetting,
}

impl Default for Settings {
    fn default() -> Self {
        let format = FormatConfig::default();
        Settings {
            add_comment: format.add_comments,
            brackets: format.brackets,
            brackets_newline_after: format.brackets_newline_after,
            destination: Destination::default(),
            bem_nesting: format.bem_nesting,
            indentation: format.indent_unit,
            element_separator: format.element_separator,
            modifier_separator: format.modifier_separator,
            parent_symbol: format.parent_symbol,
            empty_line_before_nested_selector: format.empty_line_before_nested_selector,
            comment_style: CommentStyleSetting::default(),
        }
    }
}

impl Settings {
    /// Snapshot the options a generation command runs with.
    pub fn format_config(&self, preset: Preset) -> FormatConfig {
        let mut config = FormatConfig {
            brackets: self.brackets,
            brackets_newline_after: self.brackets_newline_after,
            indent_unit: self.indentation.clone(),
            element_separator: self.element_separator.clone(),
            modifier_separator: self.modifier_separator.clone(),
            parent_symbol: self.parent_symbol.clone(),
            empty_line_before_nested_selector: self.empty_line_before_nested_selector,
            add_comments: self.add_comment,
            comment_style: self.comment_style.into(),
            bem_nesting: self.bem_nesting,
        };

        if let Some(pinned) = preset.pinned() {
            config.bem_nesting = pinned.bem_nesting;
            config.add_comments = pinned.add_comments;
            config.brackets = pinned.brackets;
        }
        config
    }
}

pub fn parse(text: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str(text)
}

pub fn load_file(path: &Path) -> Result<Settings> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read settings file '{}'", path.display()))?;
    parse(&text).with_context(|| format!("invalid settings in '{}'", path.display()))
}

/// Load settings from `explicit`, else the first existing default location,
/// else the built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    match locate(explicit) {
        Some(path) => {
            debug!(path = %path.display(), "loading settings");
            load_file(&path)
        }
        None => {
            debug!("no settings file, using defaults");
            Ok(Settings::default())
        }
    }
}

fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_SETTINGS_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("ecsstractor").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let settings = parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.format_config(Preset::Run), FormatConfig::default());
        assert_eq!(settings.destination, Destination::NewDocument);
    }

    #[test]
    fn every_key() {
        let settings = parse(
            r#"
            add_comment = true
            brackets = false
            brackets_newline_after = true
            destination = "clipboard"
            bem_nesting = false
            indentation = "\t"
            element_separator = "-"
            modifier_separator = "_"
            parent_symbol = "$"
            empty_line_before_nested_selector = true
            comment_style = "line"
            "#,
        )
        .unwrap();

        assert_eq!(settings.destination, Destination::Clipboard);
        assert_eq!(
            settings.format_config(Preset::Run),
            FormatConfig {
                brackets: false,
                brackets_newline_after: true,
                indent_unit: "\t".to_string(),
                element_separator: "-".to_string(),
                modifier_separator: "_".to_string(),
                parent_symbol: "$".to_string(),
                empty_line_before_nested_selector: true,
                add_comments: true,
                comment_style: CommentStyle::Line,
                bem_nesting: false,
            }
        );
    }

    #[test]
    fn value_aliases() {
        let settings = parse("destination = \"newDocument\"\ncomment_style = \"scss\"").unwrap();
        assert_eq!(settings.destination, Destination::NewDocument);
        assert_eq!(settings.comment_style, CommentStyleSetting::Line);

        let settings = parse("comment_style = \"css\"").unwrap();
        assert_eq!(settings.comment_style, CommentStyleSetting::Block);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse("bracket = true").is_err());
        assert!(parse("destination = \"printer\"").is_err());
    }

    #[test]
    fn presets_pin_only_the_layout_switches() {
        let settings = Settings {
            add_comment: true,
            brackets: false,
            bem_nesting: false,
            brackets_newline_after: true,
            parent_symbol: "$".to_string(),
            ..Settings::default()
        };

        let bem = settings.format_config(Preset::Bem);
        assert!(bem.bem_nesting && !bem.add_comments && bem.brackets);
        assert!(bem.brackets_newline_after);
        assert_eq!(bem.parent_symbol, "$");

        let commented = settings.format_config(Preset::BemComments);
        assert!(commented.bem_nesting && commented.add_comments && commented.brackets);

        let flat = settings.format_config(Preset::Flat);
        assert!(!flat.bem_nesting && !flat.add_comments && !flat.brackets);
        assert!(flat.brackets_newline_after);

        let run = settings.format_config(Preset::Run);
        assert!(!run.bem_nesting && run.add_comments && !run.brackets);
    }

    #[test]
    fn load_reports_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "brackets = \"yes\"").unwrap();

        let error = load_file(file.path()).unwrap_err();
        let message = format!("{:#}", error);
        assert!(message.contains(&file.path().display().to_string()));
    }

    #[test]
    fn explicit_path_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "parent_symbol = \"@\"").unwrap();

        let settings = load(Some(file.path())).unwrap();
        assert_eq!(settings.parent_symbol, "@");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
