//! mdiff - compare two versions of an HTML-like document
//!
//! Reports the elements that were added, removed or changed, each with a
//! locator that can be fed back to `mdiff locate`.

use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use markup_diff::{
    compare_files, locate, parse_file, select, to_markup, Change, ChangeSide, ChangeType,
    CompareOptions, Comparison, DfsTreeIterator, Locator, Weights,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit status when the documents differ.
const EXIT_DIFFERENT: u8 = 1;
/// Exit status on any error.
const EXIT_ERROR: u8 = 2;

/// Structure-aware markup comparison
#[derive(Parser, Debug)]
#[command(name = "mdiff")]
#[command(version)]
#[command(about = "Structure-aware comparison of HTML-like documents", long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare two documents
    #[command(visible_alias = "c")]
    Compare {
        /// The earlier version
        before: String,
        /// The later version
        after: String,

        /// Heuristic weights, as inline JSON or a path to a JSON file
        #[arg(short, long)]
        weights: Option<String>,

        /// Compare comments too
        #[arg(long)]
        keep_comments: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Print the nodes a locator selects
    #[command(visible_alias = "l")]
    Locate {
        /// Document to search
        file: String,
        /// Locator or selector
        selector: String,
    },

    /// List the locator of every element
    #[command(visible_alias = "p")]
    Paths {
        /// Document to list
        file: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One line per change, with the markup involved
    Text,
    /// A JSON report
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Compare {
            before,
            after,
            weights,
            keep_comments,
            format,
        } => run_compare(&before, &after, weights.as_deref(), keep_comments, format),
        Commands::Locate { file, selector } => run_locate(&file, &selector),
        Commands::Paths { file } => run_paths(&file),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Reads weights given inline or as a file name.
fn load_weights(source: &str) -> Result<Weights, Box<dyn std::error::Error>> {
    let json = if source.trim_start().starts_with('{') {
        source.to_string()
    } else {
        fs::read_to_string(source)?
    };
    Ok(Weights::from_json(&json)?)
}

/// Compares two files.
fn run_compare(
    before: &str,
    after: &str,
    weights: Option<&str>,
    keep_comments: bool,
    format: Format,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let weights = match weights {
        Some(source) => load_weights(source)?,
        None => Weights::default(),
    };
    let mut options = CompareOptions::with_weights(weights);
    if keep_comments {
        options = options.keep_comments();
    }

    info!(before, after, "comparing");
    let comparison = compare_files(before, after, &options)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        Format::Text => write_text(&mut out, &comparison)?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &Report::from(&comparison))?;
            writeln!(out)?;
        }
    }

    Ok(if comparison.different {
        ExitCode::from(EXIT_DIFFERENT)
    } else {
        ExitCode::SUCCESS
    })
}

fn write_text<W: Write>(out: &mut W, comparison: &Comparison) -> io::Result<()> {
    for change in &comparison.changes {
        writeln!(out, "{}", change)?;
        if let Some(node) = &change.before.node {
            writeln!(out, "  - {}", to_markup(node))?;
        }
        if let Some(node) = &change.after.node {
            writeln!(out, "  + {}", to_markup(node))?;
        }
    }
    Ok(())
}

/// Prints the markup of every node a selector matches.
fn run_locate(file: &str, selector: &str) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let root = parse_file(file)?;
    let found = select(&root, selector)?;
    if found.is_empty() {
        eprintln!("No node matches `{}`", selector);
        return Ok(ExitCode::from(EXIT_DIFFERENT));
    }
    let mut out = io::stdout().lock();
    for node in found {
        writeln!(out, "{}", to_markup(&node))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Prints the locator of every element.
fn run_paths(file: &str) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let root = parse_file(file)?;
    let mut out = io::stdout().lock();
    for node in DfsTreeIterator::new(root) {
        if !node.borrow().is_element() {
            continue;
        }
        if let Some(locator) = locate(&node) {
            writeln!(out, "{}", locator)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// JSON form of a comparison.
#[derive(Serialize)]
struct Report {
    different: bool,
    changes: Vec<ChangeReport>,
}

#[derive(Serialize)]
struct ChangeReport {
    #[serde(rename = "type")]
    change_type: ChangeType,
    before: SideReport,
    after: SideReport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SideReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<Locator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_path: Option<Locator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    markup: Option<String>,
}

impl From<&ChangeSide> for SideReport {
    fn from(side: &ChangeSide) -> Self {
        SideReport {
            path: side.path.clone(),
            parent_path: side.parent_path.clone(),
            markup: side.node.as_ref().map(to_markup),
        }
    }
}

impl From<&Change> for ChangeReport {
    fn from(change: &Change) -> Self {
        ChangeReport {
            change_type: change.change_type,
            before: SideReport::from(&change.before),
            after: SideReport::from(&change.after),
        }
    }
}

impl From<&Comparison> for Report {
    fn from(comparison: &Comparison) -> Self {
        Report {
            different: comparison.different,
            changes: comparison.changes.iter().map(ChangeReport::from).collect(),
        }
    }
}
