//! `docfind extractors`: show the extractor chain and its availability.

use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::extract::ExtractorChain;

/// Status of one extractor in the chain.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractorStatus {
    pub name: String,
    pub extensions: Vec<String>,
    pub available: bool,
}

/// Extractors in the order they are tried.
pub fn get_extractors(config: &Config) -> Vec<ExtractorStatus> {
    let chain = ExtractorChain::from_config(&config.extract);
    chain
        .extractors()
        .iter()
        .map(|e| ExtractorStatus {
            name: e.name().to_string(),
            extensions: e.extensions(),
            available: e.available(),
        })
        .collect()
}

pub fn list_extractors(config: &Config) -> Result<()> {
    let statuses = get_extractors(config);

    println!("{:<12} {:<12} EXTENSIONS", "EXTRACTOR", "STATUS");
    for s in &statuses {
        let status = if s.available { "OK" } else { "NOT FOUND" };
        println!("{:<12} {:<12} {}", s.name, status, s.extensions.join(", "));
    }

    let missing = statuses.iter().filter(|s| !s.available).count();
    if missing > 0 {
        println!();
        println!(
            "{} external converter(s) not on PATH; files they handle fall back or are skipped.",
            missing
        );
    }
    Ok(())
}
