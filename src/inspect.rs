//! `docfind extract` and `docfind segment`: look at one file the way the
//! search pipeline sees it.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use docfind_core::segment::{normalize_text, segment};

use crate::config::Config;
use crate::extract::ExtractorChain;
use crate::search::OutputFormat;

fn extract_file(config: &Config, path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let chain = ExtractorChain::from_config(&config.extract);
    let text = chain
        .extract(&bytes, &name)
        .with_context(|| format!("Failed to extract {}", path.display()))?;
    Ok(text)
}

/// Print the extracted plain text of `path`.
pub fn run_extract(config: &Config, path: &Path) -> Result<()> {
    let text = extract_file(config, path)?;
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[derive(Serialize)]
struct SegmentOutput<'a> {
    index: usize,
    start: usize,
    end: usize,
    text: &'a str,
}

/// Print the sentences of `path` with their index and byte offsets.
pub fn run_segment(config: &Config, path: &Path, format: OutputFormat) -> Result<()> {
    let text = normalize_text(&extract_file(config, path)?);
    let sentences = segment(&text);
    tracing::debug!(sentences = sentences.len(), "segmented");

    match format {
        OutputFormat::Json => {
            let out: Vec<SegmentOutput> = sentences
                .iter()
                .map(|s| SegmentOutput {
                    index: s.index,
                    start: s.start,
                    end: s.end,
                    text: &s.text,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for s in &sentences {
                println!("[{}] {}..{}  {}", s.index, s.start, s.end, s.text);
            }
        }
    }
    Ok(())
}
