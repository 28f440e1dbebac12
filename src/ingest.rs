//! Batch ingestion: bytes → text → segmented documents in a [`Session`].
//!
//! One file's failure never aborts the batch. Every file ends up in exactly
//! one bucket of the returned [`IngestReport`].

use serde::Serialize;

use docfind_core::models::Document;
use docfind_core::session::{content_hash, Admission, Session};

use crate::extract::{ExtractError, ExtractorChain};
use crate::progress::{IngestProgressEvent, IngestProgressReporter};

/// A named blob of uploaded bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A file that could not be ingested and why.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedFile {
    pub name: String,
    pub reason: String,
}

/// Outcome of ingesting a batch of files.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Newly extracted and stored.
    pub added: Vec<String>,
    /// Extracted and stored over an earlier file with the same name.
    pub replaced: Vec<String>,
    /// Identical bytes were already in the session.
    pub cached: Vec<String>,
    /// Extraction succeeded but produced no sentences.
    pub empty: Vec<String>,
    /// Extraction failed.
    pub failed: Vec<FailedFile>,
}

impl IngestReport {
    pub fn record(&mut self, name: &str, admission: Admission) {
        let bucket = match admission {
            Admission::Added => &mut self.added,
            Admission::Replaced => &mut self.replaced,
            Admission::Cached => &mut self.cached,
            Admission::Empty => {
                tracing::warn!(file = name, "no extractable content");
                &mut self.empty
            }
        };
        bucket.push(name.to_string());
    }

    pub fn record_failure(&mut self, name: &str, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(file = name, %reason, "skipping file");
        self.failed.push(FailedFile {
            name: name.to_string(),
            reason,
        });
    }

    /// Files that are searchable after this batch.
    pub fn searchable(&self) -> usize {
        self.added.len() + self.replaced.len() + self.cached.len()
    }

    /// Files that were left out.
    pub fn skipped(&self) -> usize {
        self.empty.len() + self.failed.len()
    }
}

/// Extract and segment one file.
pub fn extract_document(
    chain: &ExtractorChain,
    name: &str,
    hash: &str,
    bytes: &[u8],
) -> Result<Document, ExtractError> {
    let text = chain.extract(bytes, name)?;
    Ok(Document::from_text(name, hash, &text).with_size(bytes.len() as u64))
}

/// A file of an upload batch whose bytes are not in the session yet.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub name: String,
    pub hash: String,
    pub bytes: Vec<u8>,
}

/// An upload batch split into files answered from the session and files that
/// need extraction, so extraction can run without holding the session.
///
/// Bytes that occur more than once in the batch are extracted once. Later
/// copies are settled from the first copy's outcome in [`BatchPlan::commit`].
#[derive(Debug, Default)]
pub struct BatchPlan {
    pending: Vec<PendingFile>,
    /// (index into `pending` of the first copy, name, hash)
    duplicates: Vec<(usize, String, String)>,
}

impl BatchPlan {
    /// Settle `name` from the session when its bytes are known, otherwise
    /// queue it for extraction.
    pub fn admit(
        &mut self,
        session: &mut Session,
        report: &mut IngestReport,
        name: String,
        bytes: Vec<u8>,
    ) {
        let hash = content_hash(&bytes);
        if let Some(admission) = session.reuse(&name, &hash) {
            tracing::debug!(file = %name, "unchanged, reusing cached document");
            report.record(&name, admission);
            return;
        }
        match self.pending.iter().position(|p| p.hash == hash) {
            Some(first) => self.duplicates.push((first, name, hash)),
            None => self.pending.push(PendingFile { name, hash, bytes }),
        }
    }

    /// Files to extract, in upload order. `commit` expects one result per
    /// file, in the same order.
    pub fn take_pending(&mut self) -> Vec<PendingFile> {
        std::mem::take(&mut self.pending)
    }

    /// Store extraction results, then settle every in-batch copy the way its
    /// first copy went.
    pub fn commit(
        self,
        session: &mut Session,
        report: &mut IngestReport,
        extracted: Vec<(String, Result<Document, ExtractError>)>,
    ) {
        for (i, (name, result)) in extracted.into_iter().enumerate() {
            let outcome = match result {
                Ok(doc) => {
                    let admission = session.insert(doc);
                    report.record(&name, admission);
                    Ok(admission)
                }
                Err(e) => {
                    let reason = e.to_string();
                    report.record_failure(&name, reason.clone());
                    Err(reason)
                }
            };

            for (_, copy, hash) in self.duplicates.iter().filter(|(first, _, _)| *first == i) {
                match &outcome {
                    Ok(Admission::Empty) => report.record(copy, Admission::Empty),
                    Ok(_) => {
                        let admission = session.reuse(copy, hash).unwrap_or(Admission::Empty);
                        report.record(copy, admission);
                    }
                    Err(reason) => report.record_failure(copy, reason.clone()),
                }
            }
        }
    }
}

/// Ingest `uploads` into `session` one by one, skipping already-seen bytes.
pub fn ingest(
    session: &mut Session,
    chain: &ExtractorChain,
    uploads: &[Upload],
    progress: &dyn IngestProgressReporter,
) -> IngestReport {
    let mut report = IngestReport::default();
    let total = uploads.len() as u64;

    for (i, upload) in uploads.iter().enumerate() {
        progress.report(IngestProgressEvent::Extracting {
            name: upload.name.clone(),
            n: i as u64 + 1,
            total,
        });

        let hash = content_hash(&upload.bytes);
        if let Some(admission) = session.reuse(&upload.name, &hash) {
            tracing::debug!(file = %upload.name, "unchanged, reusing cached document");
            report.record(&upload.name, admission);
            continue;
        }

        match extract_document(chain, &upload.name, &hash, &upload.bytes) {
            Ok(doc) => {
                tracing::debug!(file = %upload.name, sentences = doc.sentences.len(), "segmented");
                let admission = session.insert(doc);
                report.record(&upload.name, admission);
            }
            Err(e) => report.record_failure(&upload.name, e.to_string()),
        }
    }

    progress.report(IngestProgressEvent::Finished {
        searchable: report.searchable() as u64,
        skipped: report.skipped() as u64,
    });
    report
}
