//! Inspection CLI for DCA input documents
//!
//! # Usage
//!
//! ```bash
//! # List every flat key with its value kind
//! dca_json index input.json
//!
//! # Resolve a short key (with an optional fallback key)
//! dca_json get input.json beta --fallback inverse-temperature
//!
//! # Show every candidate for a short key
//! dca_json resolve input.json alpha
//!
//! # Bind a matrix and print it
//! dca_json matrix input.json hopping --transpose
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dca_json::{Document, LoadOptions, Matrix, Transposer};

#[derive(Parser)]
#[command(name = "dca_json")]
#[command(version)]
#[command(about = "Inspect DCA input documents: flat keys, key resolution and matrices")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: json, text, or pretty (default)
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,

    /// YAML load options file
    #[arg(long, global = true, env = "DCA_JSON_OPTIONS")]
    options: Option<PathBuf>,

    /// Fail on keys matching more than one entry
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// List every flat key and the kind of its value
    Index {
        /// Input document
        file: PathBuf,
    },

    /// Resolve a key and print its value
    Get {
        file: PathBuf,
        key: String,

        /// Key tried when the first one is not found
        #[arg(long)]
        fallback: Option<String>,
    },

    /// List every flat key a short key matches, marking the winner
    Resolve { file: PathBuf, key: String },

    /// Bind a key into a matrix of floats and print it
    Matrix {
        file: PathBuf,
        key: String,

        /// Bind through a transposed view
        #[arg(long)]
        transpose: bool,
    },
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = load_options(cli.options.as_deref(), cli.strict).and_then(|options| {
        match &cli.command {
            Commands::Index { file } => cmd_index(file, options, cli.format),
            Commands::Get {
                file,
                key,
                fallback,
            } => cmd_get(file, key, fallback.as_deref(), options, cli.format),
            Commands::Resolve { file, key } => cmd_resolve(file, key, options, cli.format),
            Commands::Matrix {
                file,
                key,
                transpose,
            } => cmd_matrix(file, key, *transpose, options, cli.format),
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn load_options(path: Option<&Path>, strict: bool) -> Result<LoadOptions> {
    let options = match path {
        Some(path) => LoadOptions::from_yaml_file(path)?,
        None => LoadOptions::default(),
    };
    Ok(if strict { options.strict() } else { options })
}

fn load(file: &Path, options: LoadOptions) -> Result<Document> {
    Document::load_with(file, options).with_context(|| format!("loading {}", file.display()))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_index(file: &Path, options: LoadOptions, format: OutputFormat) -> Result<()> {
    let doc = load(file, options)?;

    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = doc
                .entries()
                .map(|(key, value)| serde_json::json!({ "key": key, "kind": value.kind() }))
                .collect();
            print_json(&serde_json::json!({ "count": doc.len(), "entries": entries }))?;
        }
        OutputFormat::Text => {
            for (key, value) in doc.entries() {
                println!("{}\t{}", key, value.kind());
            }
        }
        OutputFormat::Pretty => {
            println!(
                "{} {} flat key(s) in {}",
                "OK".green().bold(),
                doc.len(),
                file.display()
            );
            for (key, value) in doc.entries() {
                println!("  {} {}", key.cyan(), format!("({})", value.kind()).dimmed());
            }
        }
    }
    Ok(())
}

fn cmd_get(
    file: &Path,
    key: &str,
    fallback: Option<&str>,
    options: LoadOptions,
    format: OutputFormat,
) -> Result<()> {
    let doc = load(file, options)?;
    let value = match fallback {
        Some(fallback) => doc.get_either(key, fallback)?,
        None => doc.get(key)?,
    };

    match format {
        OutputFormat::Json | OutputFormat::Text => print_json(&serde_json::to_value(value)?)?,
        OutputFormat::Pretty => {
            println!("{} {}", key.cyan().bold(), format!("({})", value.kind()).dimmed());
            println!("{}", serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}

fn cmd_resolve(file: &Path, key: &str, options: LoadOptions, format: OutputFormat) -> Result<()> {
    let doc = load(file, options)?;
    let candidates: Vec<&str> = doc.candidates(key).collect();

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "key": key,
            "winner": candidates.first(),
            "candidates": candidates,
        }))?,
        OutputFormat::Text => {
            for candidate in &candidates {
                println!("{}", candidate);
            }
        }
        OutputFormat::Pretty => {
            if candidates.is_empty() {
                println!("{} no flat key matches '{}'", "MISS".yellow().bold(), key);
            }
            for (i, candidate) in candidates.iter().enumerate() {
                if i == 0 {
                    println!("  {} {}", "*".green().bold(), candidate.green());
                } else {
                    println!("    {}", candidate);
                }
            }
        }
    }
    Ok(())
}

fn cmd_matrix(
    file: &Path,
    key: &str,
    transpose: bool,
    options: LoadOptions,
    format: OutputFormat,
) -> Result<()> {
    let doc = load(file, options)?;

    let matrix = if transpose {
        let mut target: Transposer<Matrix<f64>> = Transposer::default();
        doc.bind(key, &mut target)?;
        transposed_rows(&target)
    } else {
        let mut target: Matrix<f64> = Matrix::default();
        doc.bind(key, &mut target)?;
        (0..target.rows())
            .map(|r| target.row(r).copied().collect())
            .collect()
    };

    let rows = matrix.len();
    let cols = matrix.first().map(Vec::len).unwrap_or(0);

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "key": key,
            "rows": rows,
            "cols": cols,
            "data": matrix,
        }))?,
        OutputFormat::Text | OutputFormat::Pretty => {
            if format == OutputFormat::Pretty {
                println!("{} {} ({}x{})", "Matrix".cyan().bold(), key, rows, cols);
            }
            for row in &matrix {
                let cells: Vec<String> = row.iter().map(|x| format!("{:>12.6}", x)).collect();
                println!("{}", cells.join(" "));
            }
        }
    }
    Ok(())
}

/// Rows of the transposed view, as seen through the adapter
fn transposed_rows(target: &Transposer<Matrix<f64>>) -> Vec<Vec<f64>> {
    let (rows, cols) = (target.inner().cols(), target.inner().rows());
    (0..rows)
        .map(|r| (0..cols).map(|c| target[(r, c)]).collect())
        .collect()
}
