//! # docfind core
//!
//! Pure text logic for docfind: data models, sentence segmentation,
//! diacritic-insensitive normalization, keyword search with context-window
//! merging, snippet highlighting, and the per-session document store.
//!
//! This crate performs no file, network, or process I/O. Text extraction and
//! presentation live in the `docfind` application crate.

pub mod highlight;
pub mod models;
pub mod normalize;
pub mod search;
pub mod segment;
pub mod session;
