use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use docfind_core::search::SearchParams;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_context")]
    pub context_before: usize,
    #[serde(default = "default_context")]
    pub context_after: usize,
    #[serde(default = "default_max_per_document")]
    pub max_per_document: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            context_before: default_context(),
            context_after: default_context(),
            max_per_document: default_max_per_document(),
        }
    }
}

fn default_context() -> usize {
    3
}
fn default_max_per_document() -> usize {
    200
}

impl SearchConfig {
    /// Search parameters with optional per-request overrides.
    pub fn params(
        &self,
        before: Option<usize>,
        after: Option<usize>,
        max_per_document: Option<usize>,
    ) -> SearchParams {
        SearchParams {
            before: before.unwrap_or(self.context_before),
            after: after.unwrap_or(self.context_after),
            max_per_document: max_per_document.unwrap_or(self.max_per_document),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// External converters, tried after the built-in extractors in the
    /// order listed.
    #[serde(default = "default_commands")]
    pub commands: Vec<CommandConfig>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            commands: default_commands(),
        }
    }
}

/// An external program that converts a file to plain text on stdout.
///
/// `{input}` in `args` is replaced by the path of a temporary copy of the
/// uploaded bytes.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CommandConfig {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub extensions: Vec<String>,
}

fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_include_globs() -> Vec<String> {
    [
        "docx", "doc", "pptx", "xlsx", "pdf", "txt", "md", "png", "jpg", "jpeg", "tif", "tiff",
        "bmp",
    ]
    .iter()
    .map(|ext| format!("**/*.{}", ext))
    .collect()
}

fn default_commands() -> Vec<CommandConfig> {
    let cmd = |name: &str, program: &str, args: &[&str], exts: &[&str]| CommandConfig {
        name: name.to_string(),
        program: program.to_string(),
        args: args.iter().map(|s| s.to_string()).collect(),
        extensions: exts.iter().map(|s| s.to_string()).collect(),
    };
    vec![
        cmd("pdftotext", "pdftotext", &["-layout", "{input}", "-"], &["pdf"]),
        cmd("antiword", "antiword", &["{input}"], &["doc"]),
        cmd(
            "tesseract",
            "tesseract",
            &["{input}", "stdout", "-l", "vie+eng"],
            &["png", "jpg", "jpeg", "tif", "tiff", "bmp"],
        ),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}
fn default_max_upload_bytes() -> usize {
    200 * 1024 * 1024
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

/// Load the config file at `path`, or defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::minimal());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = parse_config(&content)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.search.max_per_document == 0 {
        bail!("search.max_per_document must be >= 1");
    }

    if config.extract.max_file_bytes == 0 {
        bail!("extract.max_file_bytes must be > 0");
    }

    for cmd in &config.extract.commands {
        if cmd.program.trim().is_empty() {
            bail!("extract.commands '{}': program must not be empty", cmd.name);
        }
        if cmd.extensions.is_empty() {
            bail!(
                "extract.commands '{}': at least one extension is required",
                cmd.name
            );
        }
        if !cmd.args.iter().any(|a| a.contains("{input}")) {
            bail!(
                "extract.commands '{}': args must contain the {{input}} placeholder",
                cmd.name
            );
        }
    }

    if config.server.bind.parse::<std::net::SocketAddr>().is_err() {
        bail!(
            "server.bind must be a socket address like 127.0.0.1:8501, got '{}'",
            config.server.bind
        );
    }

    Ok(())
}
