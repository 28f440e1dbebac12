//! `docfind search`: extract a set of files and print keyword snippets.
//!
//! Snippets come out in input order: files as collected, windows in document
//! order within each file. Text output marks keywords in bold yellow on a
//! terminal and with `**` otherwise; JSON output carries both the plain text
//! and an HTML rendering of every snippet.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

use docfind_core::highlight::EmphasisStyle;
use docfind_core::models::{Keyword, Snippet};
use docfind_core::search::{parse_query, SearchParams};
use docfind_core::session::Session;

use crate::config::Config;
use crate::extract::ExtractorChain;
use crate::files::{collect_files, InputFile};
use crate::ingest::{ingest, FailedFile, IngestReport, Upload};
use crate::progress::IngestProgressReporter;

/// Message returned instead of results for a query without keywords.
pub const NO_KEYWORD: &str = "no keyword provided";

/// Output format for CLI commands that print structured data.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Command-line overrides for the `[search]` config table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOverrides {
    pub before: Option<usize>,
    pub after: Option<usize>,
    pub max_per_document: Option<usize>,
}

/// One snippet as returned by the CLI (`--format json`) and the HTTP API.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub document_name: String,
    /// First sentence index of the window.
    pub start: usize,
    /// One past the last sentence index of the window.
    pub end: usize,
    pub text: String,
    pub html: String,
}

impl From<&Snippet> for SearchResult {
    fn from(snippet: &Snippet) -> Self {
        Self {
            document_name: snippet.document_name.clone(),
            start: snippet.window.start,
            end: snippet.window.end,
            text: snippet.text.clone(),
            html: snippet.render_html(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub keywords: Vec<String>,
    pub results: Vec<SearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Search every document in `session`, in upload order.
pub fn search_session(session: &Session, query: &str, params: &SearchParams) -> SearchResponse {
    let keywords = parse_query(query);
    let snippets = session.search(&keywords, params);
    SearchResponse::new(&keywords, &snippets)
}

impl SearchResponse {
    pub fn new(keywords: &[Keyword], snippets: &[Snippet]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.text.clone()).collect(),
            results: snippets.iter().map(SearchResult::from).collect(),
            message: keywords.is_empty().then(|| NO_KEYWORD.to_string()),
        }
    }
}

/// Read files from disk. Unreadable files are recorded as failures.
pub fn read_uploads(files: &[InputFile], report: &mut IngestReport) -> Vec<Upload> {
    let mut uploads = Vec::with_capacity(files.len());
    for file in files {
        match std::fs::read(&file.path) {
            Ok(bytes) => uploads.push(Upload {
                name: file.name.clone(),
                bytes,
            }),
            Err(e) => report.record_failure(&file.name, format!("cannot read file: {}", e)),
        }
    }
    uploads
}

/// Collect, read, extract, and segment `paths` into a fresh session.
pub fn load_session(
    config: &Config,
    paths: &[PathBuf],
    progress: &dyn IngestProgressReporter,
) -> Result<(Session, IngestReport)> {
    let files = collect_files(paths, &config.extract)?;
    tracing::debug!(files = files.len(), "collected input files");

    let mut read_failures = IngestReport::default();
    let uploads = read_uploads(&files, &mut read_failures);

    let chain = ExtractorChain::from_config(&config.extract);
    let mut session = Session::new();
    let mut report = ingest(&mut session, &chain, &uploads, progress);
    report.failed.extend(read_failures.failed);
    Ok((session, report))
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    response: &'a SearchResponse,
    skipped: Vec<FailedFile>,
}

pub fn run_search(
    config: &Config,
    paths: &[PathBuf],
    query: &str,
    overrides: SearchOverrides,
    format: OutputFormat,
    progress: &dyn IngestProgressReporter,
) -> Result<()> {
    let params = config.search.params(
        overrides.before,
        overrides.after,
        overrides.max_per_document,
    );
    if params.max_per_document == 0 {
        anyhow::bail!("--max-per-document must be >= 1");
    }

    let keywords = parse_query(query);
    if keywords.is_empty() && format == OutputFormat::Text {
        println!("No keyword provided.");
        return Ok(());
    }

    let (session, report) = load_session(config, paths, progress)?;
    let snippets = session.search(&keywords, &params);
    tracing::info!(
        documents = session.len(),
        snippets = snippets.len(),
        "search complete"
    );

    match format {
        OutputFormat::Json => {
            let response = SearchResponse::new(&keywords, &snippets);
            let output = JsonOutput {
                response: &response,
                skipped: skipped_files(&report),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            for failed in skipped_files(&report) {
                eprintln!("skipped {}: {}", failed.name, failed.reason);
            }
            let style = if atty::is(atty::Stream::Stdout) {
                EmphasisStyle::ANSI
            } else {
                EmphasisStyle::MARKDOWN
            };
            print_snippets(&snippets, &style);
        }
    }

    Ok(())
}

/// Failed and empty files, in that order.
fn skipped_files(report: &IngestReport) -> Vec<FailedFile> {
    let mut skipped = report.failed.clone();
    skipped.extend(report.empty.iter().map(|name| FailedFile {
        name: name.clone(),
        reason: "no extractable content".to_string(),
    }));
    skipped
}

fn print_snippets(snippets: &[Snippet], style: &EmphasisStyle) {
    if snippets.is_empty() {
        println!("No results.");
        return;
    }

    for (i, snippet) in snippets.iter().enumerate() {
        println!("File: {} | Result #{}", snippet.document_name, i + 1);
        println!("{}", snippet.render(style));
        println!();
    }

    println!("{}", summary_line(snippets));
}

/// "Found N matching passages in M files."
pub fn summary_line(snippets: &[Snippet]) -> String {
    let files: HashSet<&str> = snippets.iter().map(|s| s.document_name.as_str()).collect();
    format!(
        "Found {} matching {} in {} {}.",
        snippets.len(),
        if snippets.len() == 1 { "passage" } else { "passages" },
        files.len(),
        if files.len() == 1 { "file" } else { "files" },
    )
}
