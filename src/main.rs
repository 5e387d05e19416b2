//! # Platen CLI
//!
//! Usage:
//!   platen render invoice.json --data data.json -o invoice.pdf
//!   platen render invoice.json --data data.json --html preview.html
//!   platen layout invoice.json --data data.json
//!   platen check invoice.json --data data.json
//!   platen example > invoice.json

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;

use platen::binding::unresolved_bindings;
use platen::html::{to_html, HtmlOptions};
use platen::image_loader::FileAccess;
use platen::layout::collision::overlapping_pairs;
use platen::layout::LayoutConfig;
use platen::model::Template;
use platen::pdf::{Metadata, PdfWriter};
use platen::render::render_template;
use platen::sample::{sample_data, sample_template};
use platen::PlatenError;

/// Platen - lay out fixed-page templates against JSON data
#[derive(Parser, Debug)]
#[command(name = "platen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template to PDF and/or HTML
    Render {
        /// Template JSON file, or `-` for stdin
        template: PathBuf,

        /// Data JSON file
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// PDF output path
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Also (or only, without -o) write an HTML preview
        #[arg(long, value_name = "FILE")]
        html: Option<PathBuf>,

        /// Outline the page margin in the HTML preview
        #[arg(long)]
        margin_guides: bool,

        /// Layout constants as JSON
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Print the repositioned visual tree as JSON
    Layout {
        /// Template JSON file, or `-` for stdin
        template: PathBuf,

        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,

        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Report overlapping elements and bindings the data cannot resolve
    Check {
        /// Template JSON file, or `-` for stdin
        template: PathBuf,

        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,
    },

    /// Print the sample invoice template
    Example {
        /// Print the sample data instead
        #[arg(long)]
        data: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when a check found problems.
fn run() -> Result<bool, PlatenError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            data,
            output,
            html,
            margin_guides,
            config,
        } => {
            let template = read_template(&template)?;
            let data = read_data(data.as_deref())?;
            let config = read_config(config.as_deref())?;
            let tree = render_template(&template, &data, &config);

            if let Some(path) = &html {
                let markup = to_html(&tree, &HtmlOptions { margin_guides });
                fs::write(path, &markup)?;
                eprintln!("✓ Written {} bytes to {}", markup.len(), path.display());
            }

            // PDF unless only HTML was asked for.
            if output.is_some() || html.is_none() {
                let path = output.unwrap_or_else(|| PathBuf::from("output.pdf"));
                let pdf = PdfWriter::new()
                    .with_file_access(FileAccess::Unrestricted)
                    .write(&tree, &Metadata::for_template(&template))?;
                fs::write(&path, &pdf)?;
                eprintln!("✓ Written {} bytes to {}", pdf.len(), path.display());
            }
            Ok(true)
        }

        Commands::Layout { template, data, config } => {
            let template = read_template(&template)?;
            let data = read_data(data.as_deref())?;
            let config = read_config(config.as_deref())?;
            let tree = render_template(&template, &data, &config);
            println!("{}", serde_json::to_string_pretty(&tree)?);
            Ok(true)
        }

        Commands::Check { template, data } => {
            let template = read_template(&template)?;
            let data = read_data(data.as_deref())?;

            let overlaps = overlapping_pairs(&template.elements);
            for (a, b) in &overlaps {
                println!("overlap: '{}' and '{}'", a, b);
            }
            let unresolved = unresolved_bindings(&template.elements, &data);
            for path in &unresolved {
                println!("unresolved binding: {{{{{}}}}}", path);
            }

            let issues = overlaps.len() + unresolved.len();
            if issues == 0 {
                eprintln!("✓ {} elements, no issues", template.elements.len());
                Ok(true)
            } else {
                eprintln!("✗ {} issue(s) found", issues);
                Ok(false)
            }
        }

        Commands::Example { data } => {
            let json = if data {
                serde_json::to_string_pretty(&sample_data())?
            } else {
                serde_json::to_string_pretty(&sample_template())?
            };
            println!("{}", json);
            Ok(true)
        }
    }
}

fn read_input(path: &Path) -> Result<String, PlatenError> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_template(path: &Path) -> Result<Template, PlatenError> {
    Template::from_json(&read_input(path)?)
}

/// Data defaults to an empty object, which renders every binding as its
/// placeholder.
fn read_data(path: Option<&Path>) -> Result<Value, PlatenError> {
    match path {
        Some(path) => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => Ok(Value::Object(Default::default())),
    }
}

fn read_config(path: Option<&Path>) -> Result<LayoutConfig, PlatenError> {
    match path {
        Some(path) => LayoutConfig::from_json(&fs::read_to_string(path)?),
        None => Ok(LayoutConfig::default()),
    }
}
