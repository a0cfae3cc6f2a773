mod delivery;
mod settings;
mod test_runner;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use settings::{Destination, Preset, Settings};

const SUBCOMMANDS: &[&str] = &["run", "bem", "bem-comments", "flat", "test", "help"];

#[derive(Parser)]
#[command(
    name = "ecsstractor",
    version,
    about = "Generate stylesheet skeletons from the classes used in Pug templates"
)]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Settings file (default: ./ecsstractor.toml, then the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate with the layout from the settings file
    Run(GenerateArgs),

    /// Nested BEM selectors with brackets
    Bem(GenerateArgs),

    /// Nested BEM selectors with brackets and a comment above each nested selector
    BemComments(GenerateArgs),

    /// One selector per class, without brackets
    Flat(GenerateArgs),

    /// Run .test.pug fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Pug template to read (stdin when omitted or `-`)
    file: Option<String>,

    /// Only use these lines of the template, 1-based and inclusive (e.g. 4:20)
    #[arg(long, value_parser = parse_line_range)]
    lines: Option<LineRange>,

    /// Where to deliver the result (default: from settings)
    #[arg(long = "to", value_enum)]
    destination: Option<Destination>,

    /// File to create for the new document (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the extracted class names instead of generating selectors
    #[arg(long)]
    list_classes: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.pug file or directory containing them
    path: String,

    /// Run only fixtures in these categories (subfolder names). Repeatable.
    #[arg(short = 'C', long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

/// A 1-based, inclusive range of source lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineRange {
    start: usize,
    end: usize,
}

impl LineRange {
    /// The selected lines, or `None` when nothing non-blank is selected.
    fn select(&self, source: &str) -> Option<String> {
        let selected = source
            .lines()
            .skip(self.start - 1)
            .take(self.end - self.start + 1)
            .collect::<Vec<_>>()
            .join("\n");
        (!selected.trim().is_empty()).then_some(selected)
    }
}

fn parse_line_range(s: &str) -> Result<LineRange, String> {
    let (start, end) = s.split_once(':').unwrap_or((s, s));
    let parse = |n: &str| {
        n.trim()
            .parse::<usize>()
            .map_err(|_| format!("`{}` is not a line number", n))
    };
    let (start, end) = (parse(start)?, parse(end)?);
    if start == 0 || end < start {
        return Err(format!(
            "`{}` is not a range of lines; expected START:END with 1 <= START <= END",
            s
        ));
    }
    Ok(LineRange { start, end })
}

fn main() {
    let args = with_default_subcommand(std::env::args().collect());
    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    let (args, preset) = match cli.command {
        Command::Run(args) => (args, Preset::Run),
        Command::Bem(args) => (args, Preset::Bem),
        Command::BemComments(args) => (args, Preset::BemComments),
        Command::Flat(args) => (args, Preset::Flat),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_fixtures(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    };

    let settings = match settings::load(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    };

    process::exit(do_generate(args, preset, &settings, cli.no_color));
}

/// If the first positional argument is not a known subcommand, inject
/// "run" so `ecsstractor page.pug` works like `ecsstractor run page.pug`.
fn with_default_subcommand(mut args: Vec<String>) -> Vec<String> {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == "-c" || arg == "--config" {
            i += 2;
            continue;
        }
        if arg.starts_with('-') && arg != "-" {
            i += 1;
            continue;
        }
        if !SUBCOMMANDS.contains(&arg) {
            args.insert(i, "run".to_string());
        }
        break;
    }
    args
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_source(file: Option<&str>) -> Result<(String, String), String> {
    match file {
        None | Some("-") => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .map_err(|e| format!("cannot read stdin: {}", e))?;
            Ok(("<stdin>".to_string(), source))
        }
        Some(path) => std::fs::read_to_string(path)
            .map(|source| (path.to_string(), source))
            .map_err(|e| format!("cannot read '{}': {}", path, e)),
    }
}

/// Generate and deliver; returns the process exit code.
fn do_generate(args: GenerateArgs, preset: Preset, settings: &Settings, no_color: bool) -> i32 {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let (name, document) = match read_source(args.file.as_deref()) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    // An empty selection means the whole document.
    let selection = args.lines.and_then(|range| range.select(&document));
    let source = selection.unwrap_or(document);

    let mut files = SimpleFiles::new();
    let file_id = files.add(name, source.clone());

    let config = settings.format_config(preset);
    debug!(?preset, ?config, "generating");
    let generated = ecsstractor::generate(&source, file_id, &config);

    if let Some(error) = &generated.error {
        let writer = StandardStream::stderr(color_choice);
        let term_config = term::Config::default();
        let _ = term::emit_to_write_style(
            &mut writer.lock(),
            &term_config,
            &files,
            &error.to_diagnostic(),
        );
    }

    if args.list_classes {
        for class in generated.classes.iter() {
            println!("{}", class);
        }
    } else {
        let destination = args.destination.unwrap_or(settings.destination);
        if let Err(e) = delivery::deliver(&generated.text, destination, args.output.as_deref()) {
            eprintln!("error: {}", e);
            return 1;
        }
    }

    if generated.error.is_some() { 1 } else { 0 }
}
