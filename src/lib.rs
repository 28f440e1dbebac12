//! # docfind
//!
//! Keyword-in-context search over uploaded documents.
//!
//! docfind turns DOCX, PPTX, XLSX, PDF, plain-text, and scanned files into
//! text, splits the text into sentences, and returns every keyword hit with a
//! few sentences of surrounding context. Overlapping context is merged into a
//! single passage and keywords are highlighted regardless of case or
//! Vietnamese diacritics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Extractors │──▶│  Segmenter   │──▶│   Session    │
//! │ OOXML/PDF/..│   │  sentences   │   │ hash-cached  │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │ search + merge
//!                      ┌──────────────────────┤
//!                      ▼                      ▼
//!                 ┌──────────┐          ┌──────────┐
//!                 │   CLI    │          │   HTTP   │
//!                 │(docfind) │          │  (axum)  │
//!                 └──────────┘          └──────────┘
//! ```
//!
//! Segmentation, search, and highlighting live in the pure `docfind-core`
//! crate; this crate adds file handling, extraction, and the front-ends.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | Extractor trait, built-in extractors, external converters |
//! | [`files`] | Input file discovery |
//! | [`ingest`] | Batch extraction into a session |
//! | [`progress`] | Ingest progress on stderr |
//! | [`search`] | `docfind search` and result types |
//! | [`inspect`] | `docfind extract` / `docfind segment` |
//! | [`extractors`] | `docfind extractors` |
//! | [`server`] | HTTP API |
//! | [`logging`] | tracing setup |

pub mod config;
pub mod extract;
pub mod extractors;
pub mod files;
pub mod ingest;
pub mod inspect;
pub mod logging;
pub mod progress;
pub mod search;
pub mod server;
