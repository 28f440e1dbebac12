//! Multi-format text extraction.
//!
//! Every format is handled by an [`Extractor`]. An [`ExtractorChain`] holds
//! them in priority order: for a given file, each extractor that supports the
//! file extension is tried in turn until one yields non-empty text. Built-in
//! extractors (plain text, DOCX, PPTX, XLSX, PDF) come first, followed by the
//! external converters configured in `[extract].commands` (e.g. `pdftotext`,
//! `antiword`, `tesseract` for OCR).
//!
//! Extraction never panics: every failure is an [`ExtractError`] carrying a
//! human-readable reason, and the caller skips the file.

use std::io::{Read, Write};
use std::path::Path;
use std::process::Command;

use crate::config::{CommandConfig, ExtractConfig};

/// Maximum sheets to process in an xlsx.
const XLSX_MAX_SHEETS: usize = 100;
/// Maximum cells to process per sheet.
const XLSX_MAX_CELLS_PER_SHEET: usize = 100_000;
/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Why a file could not be turned into text.
#[derive(Debug)]
pub enum ExtractError {
    Unsupported(String),
    TooLarge { size: u64, limit: u64 },
    Text(String),
    Pdf(String),
    Ooxml(String),
    Command { name: String, reason: String },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Unsupported(ext) => write!(f, "unsupported file type: {}", ext),
            ExtractError::TooLarge { size, limit } => {
                write!(f, "file is {} bytes, limit is {} bytes", size, limit)
            }
            ExtractError::Text(e) => write!(f, "text decoding failed: {}", e),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Ooxml(e) => write!(f, "OOXML extraction failed: {}", e),
            ExtractError::Command { name, reason } => write!(f, "{} failed: {}", name, reason),
        }
    }
}

impl std::error::Error for ExtractError {}

/// A single text-extraction capability.
pub trait Extractor: Send + Sync {
    /// Short name shown in logs and `docfind extractors`.
    fn name(&self) -> &str;

    /// Lower-case file extensions this extractor handles.
    fn extensions(&self) -> Vec<String>;

    /// Whether the extractor can run in this environment.
    fn available(&self) -> bool {
        true
    }

    fn extract(&self, bytes: &[u8], file_name: &str) -> Result<String, ExtractError>;

    fn supports(&self, ext: &str) -> bool {
        self.extensions().iter().any(|e| e == ext)
    }
}

/// Lower-cased extension of `file_name`, or an empty string.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Ordered list of extractors tried in priority order.
pub struct ExtractorChain {
    extractors: Vec<Box<dyn Extractor>>,
    max_file_bytes: u64,
}

impl ExtractorChain {
    pub fn new(max_file_bytes: u64) -> Self {
        Self {
            extractors: Vec::new(),
            max_file_bytes,
        }
    }

    /// Built-in extractors followed by the configured external commands.
    pub fn from_config(config: &ExtractConfig) -> Self {
        let mut chain = Self::new(config.max_file_bytes);
        chain.register(Box::new(PlainTextExtractor));
        chain.register(Box::new(DocxExtractor));
        chain.register(Box::new(PptxExtractor));
        chain.register(Box::new(XlsxExtractor));
        chain.register(Box::new(PdfExtractor));
        for cmd in &config.commands {
            chain.register(Box::new(CommandExtractor::new(cmd.clone())));
        }
        chain
    }

    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.push(extractor);
    }

    pub fn extractors(&self) -> &[Box<dyn Extractor>] {
        &self.extractors
    }

    /// Extract text from `bytes`, trying each matching extractor in order.
    ///
    /// Empty output from one extractor (e.g. a scanned PDF without a text
    /// layer) falls through to the next one. The last error is returned when
    /// every candidate fails.
    pub fn extract(&self, bytes: &[u8], file_name: &str) -> Result<String, ExtractError> {
        let size = bytes.len() as u64;
        if size > self.max_file_bytes {
            return Err(ExtractError::TooLarge {
                size,
                limit: self.max_file_bytes,
            });
        }

        let ext = extension_of(file_name);
        let candidates: Vec<&dyn Extractor> = self
            .extractors
            .iter()
            .map(|e| e.as_ref())
            .filter(|e| e.supports(&ext))
            .collect();
        if candidates.is_empty() {
            let shown = if ext.is_empty() { file_name } else { &ext };
            return Err(ExtractError::Unsupported(shown.to_string()));
        }

        let mut last_err = None;
        let mut empty_text = None;
        for extractor in candidates {
            match extractor.extract(bytes, file_name) {
                Ok(text) if text.trim().is_empty() => {
                    tracing::debug!(file = file_name, extractor = extractor.name(), "no text");
                    empty_text = Some(text);
                }
                Ok(text) => {
                    tracing::debug!(
                        file = file_name,
                        extractor = extractor.name(),
                        chars = text.len(),
                        "extracted"
                    );
                    return Ok(text);
                }
                Err(e) => {
                    tracing::debug!(file = file_name, extractor = extractor.name(), error = %e, "extractor failed");
                    last_err = Some(e);
                }
            }
        }

        match (empty_text, last_err) {
            (Some(text), _) => Ok(text),
            (None, Some(e)) => Err(e),
            (None, None) => Err(ExtractError::Unsupported(ext)),
        }
    }
}

// ============ Plain text ============

pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "text"
    }

    fn extensions(&self) -> Vec<String> {
        vec!["txt".to_string(), "md".to_string()]
    }

    fn extract(&self, bytes: &[u8], _file_name: &str) -> Result<String, ExtractError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_string()),
            Err(e) if bytes.contains(&0) => Err(ExtractError::Text(format!("binary content ({})", e))),
            Err(e) => {
                tracing::warn!(error = %e, "invalid UTF-8, decoding lossily");
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

// ============ PDF ============

pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn extensions(&self) -> Vec<String> {
        vec!["pdf".to_string()]
    }

    fn extract(&self, bytes: &[u8], _file_name: &str) -> Result<String, ExtractError> {
        // pdf-extract panics on some malformed inputs
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }));
        match result {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
            Err(_) => Err(ExtractError::Pdf("parser panicked".to_string())),
        }
    }
}

// ============ OOXML ============

type Archive<'a> = zip::ZipArchive<std::io::Cursor<&'a [u8]>>;

fn open_archive(bytes: &[u8]) -> Result<Archive<'_>, ExtractError> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| ExtractError::Ooxml(e.to_string()))
}

fn read_zip_entry_bounded(
    archive: &mut Archive<'_>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

/// Entries matching `prefix<N>.xml`, sorted by `N`.
fn numbered_entries(archive: &Archive<'_>, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(prefix) && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches(prefix)
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

/// Collect text runs (`<x:t>`) from DrawingML/WordprocessingML, emitting a
/// newline at the end of every paragraph (`</x:p>`). Tabs and line breaks
/// become a space and a newline.
fn extract_paragraph_text(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push(' '),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

pub struct DocxExtractor;

impl Extractor for DocxExtractor {
    fn name(&self) -> &str {
        "docx"
    }

    fn extensions(&self) -> Vec<String> {
        vec!["docx".to_string()]
    }

    fn extract(&self, bytes: &[u8], _file_name: &str) -> Result<String, ExtractError> {
        let mut archive = open_archive(bytes)?;
        let xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
        extract_paragraph_text(&xml)
    }
}

pub struct PptxExtractor;

impl Extractor for PptxExtractor {
    fn name(&self) -> &str {
        "pptx"
    }

    fn extensions(&self) -> Vec<String> {
        vec!["pptx".to_string()]
    }

    fn extract(&self, bytes: &[u8], _file_name: &str) -> Result<String, ExtractError> {
        let mut archive = open_archive(bytes)?;
        let mut out = String::new();
        for name in numbered_entries(&archive, "ppt/slides/slide") {
            let xml = read_zip_entry_bounded(&mut archive, &name, MAX_XML_ENTRY_BYTES)?;
            out.push_str(&extract_paragraph_text(&xml)?);
        }
        Ok(out)
    }
}

pub struct XlsxExtractor;

impl Extractor for XlsxExtractor {
    fn name(&self) -> &str {
        "xlsx"
    }

    fn extensions(&self) -> Vec<String> {
        vec!["xlsx".to_string()]
    }

    fn extract(&self, bytes: &[u8], _file_name: &str) -> Result<String, ExtractError> {
        let mut archive = open_archive(bytes)?;
        let shared_strings = read_shared_strings(&mut archive)?;
        let mut sheets = Vec::new();
        for name in numbered_entries(&archive, "xl/worksheets/sheet")
            .into_iter()
            .take(XLSX_MAX_SHEETS)
        {
            let xml = read_zip_entry_bounded(&mut archive, &name, MAX_XML_ENTRY_BYTES)?;
            sheets.push(extract_xlsx_sheet_cells(&xml, &shared_strings)?);
        }
        Ok(sheets.join("\n"))
    }
}

fn read_shared_strings(archive: &mut Archive<'_>) -> Result<Vec<String>, ExtractError> {
    use quick_xml::events::Event;

    if !archive.file_names().any(|n| n == "xl/sharedStrings.xml") {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry_bounded(archive, "xl/sharedStrings.xml", MAX_XML_ENTRY_BYTES)?;
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                if let Some(s) = current.as_mut() {
                    let text = te
                        .unescape()
                        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
                    s.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => strings.extend(current.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// One line per row, cells separated by spaces. Inline and shared strings
/// are kept; numeric cells are skipped.
fn extract_xlsx_sheet_cells(xml: &[u8], shared_strings: &[String]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut rows: Vec<String> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_value = false;
    let mut cell_is_shared_str = false;
    let mut cell_count = 0usize;
    loop {
        if cell_count >= XLSX_MAX_CELLS_PER_SHEET {
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"c" => {
                    cell_is_shared_str = e.attributes().any(|a| {
                        a.as_ref()
                            .map(|a| a.key.as_ref() == b"t" && a.value.as_ref() == b"s")
                            .unwrap_or(false)
                    });
                }
                b"v" | b"t" => in_value = true,
                _ => {}
            },
            Ok(Event::Text(te)) if in_value => {
                let v = te
                    .unescape()
                    .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
                let s = v.trim();
                if cell_is_shared_str {
                    if let Some(text) = s.parse::<usize>().ok().and_then(|i| shared_strings.get(i)) {
                        row.push(text.clone());
                        cell_count += 1;
                    }
                } else if !s.is_empty() && s.parse::<f64>().is_err() {
                    row.push(s.to_string());
                    cell_count += 1;
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => cell_is_shared_str = false,
                b"row" => {
                    if !row.is_empty() {
                        rows.push(row.join(" "));
                        row.clear();
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    if !row.is_empty() {
        rows.push(row.join(" "));
    }
    Ok(rows.join("\n"))
}

// ============ External commands ============

/// Runs a configured converter on a temporary copy of the file and reads
/// plain text from its stdout.
pub struct CommandExtractor {
    config: CommandConfig,
}

impl CommandExtractor {
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }
}

impl Extractor for CommandExtractor {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn extensions(&self) -> Vec<String> {
        self.config
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect()
    }

    fn available(&self) -> bool {
        program_on_path(&self.config.program)
    }

    fn extract(&self, bytes: &[u8], file_name: &str) -> Result<String, ExtractError> {
        let fail = |reason: String| ExtractError::Command {
            name: self.config.name.clone(),
            reason,
        };

        let suffix = format!(".{}", extension_of(file_name));
        let mut input = tempfile::Builder::new()
            .prefix("docfind-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| fail(format!("cannot create temp file: {}", e)))?;
        input
            .write_all(bytes)
            .and_then(|_| input.flush())
            .map_err(|e| fail(format!("cannot write temp file: {}", e)))?;

        let input_path = input.path().to_string_lossy().to_string();
        let args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|a| a.replace("{input}", &input_path))
            .collect();

        let output = Command::new(&self.config.program)
            .args(&args)
            .output()
            .map_err(|e| {
                fail(format!(
                    "failed to execute '{}': {}. Is it installed?",
                    self.config.program, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!("exited with {}: {}", output.status, stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn program_on_path(program: &str) -> bool {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths).any(|dir| {
                dir.join(program).is_file() || dir.join(format!("{}.exe", program)).is_file()
            })
        })
        .unwrap_or(false)
}
