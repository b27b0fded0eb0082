//! Error types for the web2doc library.
//!
//! Two error families reflect two distinct failure modes:
//!
//! * [`Web2DocError`]: **Caller-facing**: the request cannot be accepted or
//!   answered at all (malformed URL, unknown format, unknown job id, missing
//!   artifact). Returned as `Err(Web2DocError)` from [`crate::JobPipeline`]
//!   methods and never recorded on a job.
//!
//! * [`StageError`]: **Job-scoped**: a pipeline stage failed while a job was
//!   running in the background (navigation timeout, unreachable host, output
//!   directory not writable). The orchestrator catches it and stores its
//!   `Display` text in the job's `error` field; it never reaches the caller
//!   that submitted the job.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned synchronously to callers of the web2doc library.
///
/// Stage failures inside a running job use [`StageError`] and end up on the
/// job record instead.
#[derive(Debug, Error)]
pub enum Web2DocError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The submitted URL does not parse as an absolute URL.
    #[error("Invalid URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    /// The requested output format is not one of the supported formats.
    #[error("Unsupported format '{format}': expected one of pdf, docx")]
    UnsupportedFormat { format: String },

    // ── Lookup errors ─────────────────────────────────────────────────────
    /// No job exists with this id.
    #[error("Job not found: {id}")]
    JobNotFound { id: String },

    /// No artifact with this filename exists in the output directory.
    #[error("File not found: '{filename}'")]
    ArtifactNotFound { filename: String },

    // ── Environment errors ────────────────────────────────────────────────
    /// The output directory could not be created.
    #[error("Output directory '{path}' is unavailable: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The job store rejected an operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Web2DocError {
    /// True for malformed submissions rejected before any job is created.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Web2DocError::InvalidUrl { .. } | Web2DocError::UnsupportedFormat { .. }
        )
    }

    /// True when a lookup by id or filename found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Web2DocError::JobNotFound { .. } | Web2DocError::ArtifactNotFound { .. }
        )
    }
}

/// Failure of a [`crate::store::JobStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job store query failed: {0}")]
    QueryFailed(String),
}

/// Failure of the fetch stage (navigation, timeout, page evaluation).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Navigation did not settle within the configured bound.
    #[error("Navigation timeout of {timeout_ms} ms exceeded for '{url}'")]
    Timeout { url: String, timeout_ms: u64 },

    /// The request could not be sent or the connection failed.
    #[error("Failed to load '{url}': {reason}")]
    Request { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("Failed to load '{url}': HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The response body could not be read as text.
    #[error("Failed to read page body from '{url}': {reason}")]
    Body { url: String, reason: String },

    /// Content extraction did not run to completion.
    #[error("Content extraction failed for '{url}': {reason}")]
    Extraction { url: String, reason: String },

    /// The headless browser could not be launched or driven.
    #[error("Browser error: {0}")]
    Browser(String),
}

/// Failure of the render stage.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The artifact could not be written to (or read back from) the output directory.
    #[error("Failed to write document '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document container could not be encoded.
    #[error("Failed to encode document '{path}': {detail}")]
    Encode { path: PathBuf, detail: String },

    /// The blocking render task did not complete.
    #[error("Render task aborted: {0}")]
    Aborted(String),
}

/// A stage-level failure inside a running job.
///
/// The orchestrator converts any `StageError` into a terminal `failed` job
/// whose `error` field holds this error's message.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_predicates() {
        let e = Web2DocError::UnsupportedFormat {
            format: "odt".into(),
        };
        assert!(e.is_validation());
        assert!(!e.is_not_found());
        assert!(e.to_string().contains("odt"));

        let e = Web2DocError::InvalidUrl {
            input: "not a url".into(),
            reason: "relative URL without a base".into(),
        };
        assert!(e.is_validation());
    }

    #[test]
    fn not_found_predicates() {
        let e = Web2DocError::JobNotFound { id: "abc".into() };
        assert!(e.is_not_found());
        assert!(!e.is_validation());

        let e = Web2DocError::ArtifactNotFound {
            filename: "Report.pdf".into(),
        };
        assert!(e.is_not_found());
        assert!(e.to_string().contains("Report.pdf"));
    }

    #[test]
    fn timeout_display_is_recorded_verbatim() {
        let e: StageError = FetchError::Timeout {
            url: "https://example.com/".into(),
            timeout_ms: 30000,
        }
        .into();
        let msg = e.to_string();
        assert!(msg.contains("30000 ms"), "got: {msg}");
        assert!(msg.contains("https://example.com/"));
    }

    #[test]
    fn render_io_display() {
        let e: StageError = RenderError::Io {
            path: PathBuf::from("downloads/Report.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert!(e.to_string().contains("Report.pdf"));
        assert!(e.to_string().contains("denied"));
    }
}
