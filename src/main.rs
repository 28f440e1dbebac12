//! # docfind CLI
//!
//! Find keywords in office documents, PDFs, and scans, and print each hit
//! with the sentences around it.
//!
//! ## Usage
//!
//! ```bash
//! docfind --config ./config/docfind.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docfind search <PATH>... --query Q` | Search files and folders for keywords |
//! | `docfind extract <PATH>` | Print the plain text extracted from a file |
//! | `docfind segment <PATH>` | Print the sentences of a file with offsets |
//! | `docfind extractors` | List extractors and external converter status |
//! | `docfind serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! # Two keywords, one sentence of context on each side
//! docfind search ./quy-dinh --query "lãi suất; tài sản bảo đảm" --before 1 --after 1
//!
//! # Machine-readable output
//! docfind search report.docx --query "hạn mức" --format json
//!
//! # Check which external converters are installed
//! docfind extractors
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docfind::progress::ProgressMode;
use docfind::search::{OutputFormat, SearchOverrides};
use docfind::{config, extractors, inspect, logging, search, server};

/// docfind: keyword-in-context search over documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docfind.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "docfind",
    about = "docfind: keyword-in-context search over documents",
    version,
    long_about = "docfind extracts text from DOCX, PPTX, XLSX, PDF, plain-text and scanned \
    files, splits it into sentences, and shows every keyword hit with surrounding context. \
    Matching ignores case and Vietnamese diacritics."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/docfind.toml`. Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/docfind.toml")]
    config: PathBuf,

    /// Enable debug logging on stderr. `RUST_LOG` takes precedence.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search files for keywords and print matching passages.
    ///
    /// Directories are searched recursively, filtered by
    /// `[extract].include_globs`. Files that cannot be extracted are
    /// reported on stderr and skipped.
    Search {
        /// Files or directories to search.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Keywords separated by `;` or `,`. A sentence matches when it
        /// contains any of them.
        #[arg(long, short)]
        query: String,

        /// Sentences of context before each hit.
        #[arg(long)]
        before: Option<usize>,

        /// Sentences of context after each hit.
        #[arg(long)]
        after: Option<usize>,

        /// Maximum passages per file.
        #[arg(long)]
        max_per_document: Option<usize>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Ingest progress on stderr. Defaults to `human` on a terminal.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Print the plain text extracted from a file.
    Extract {
        path: PathBuf,
    },

    /// Print the sentences of a file with their index and byte offsets.
    Segment {
        path: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the extractor chain and whether external converters are installed.
    Extractors,

    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` and serves the upload and search API.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Search {
            paths,
            query,
            before,
            after,
            max_per_document,
            format,
            progress,
        } => {
            let reporter = progress
                .unwrap_or_else(ProgressMode::default_for_tty)
                .reporter();
            let overrides = SearchOverrides {
                before,
                after,
                max_per_document,
            };
            search::run_search(&cfg, &paths, &query, overrides, format, reporter.as_ref())?;
        }
        Commands::Extract { path } => {
            inspect::run_extract(&cfg, &path)?;
        }
        Commands::Segment { path, format } => {
            inspect::run_segment(&cfg, &path, format)?;
        }
        Commands::Extractors => {
            extractors::list_extractors(&cfg)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
