//! Job records and the value types that flow through the pipeline.
//!
//! A [`Job`] is the only persisted entity. [`ExtractedContent`] and
//! [`RenderedArtifact`] are ephemeral stage outputs; the artifact's metadata
//! is copied onto the job when it completes.

use crate::error::Web2DocError;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, globally unique job identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = Web2DocError;

    /// Ids that are not UUIDs can never name a job, so they parse to
    /// [`Web2DocError::JobNotFound`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| Web2DocError::JobNotFound { id: s.to_string() })
    }
}

/// Lifecycle state of a job.
///
/// `Pending → Processing → {Completed | Failed}`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Docx,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
        }
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Web2DocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(OutputFormat::Pdf),
            "docx" => Ok(OutputFormat::Docx),
            other => Err(Web2DocError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// A validated submission: an absolute URL and a supported format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub url: Url,
    /// The URL exactly as submitted; recorded on the job and printed on the
    /// document. `url` is its parsed, normalised form.
    pub source: String,
    pub format: OutputFormat,
}

impl JobRequest {
    /// Validate raw caller input.
    ///
    /// Fails with a validation error (and creates nothing) if the URL is not
    /// absolute or the format is unknown.
    pub fn parse(url: &str, format: &str) -> Result<Self, Web2DocError> {
        let parsed = Url::parse(url.trim()).map_err(|e| Web2DocError::InvalidUrl {
            input: url.to_string(),
            reason: e.to_string(),
        })?;
        let format = format.parse()?;
        Ok(Self {
            url: parsed,
            source: url.to_string(),
            format,
        })
    }
}

/// One tracked scrape-and-convert request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub url: String,
    pub format: OutputFormat,
    pub status: JobStatus,
    /// Percentage in 0..=100, non-decreasing while the job runs.
    pub progress: u8,
    pub title: Option<String>,
    pub filename: Option<String>,
    pub file_size: Option<u64>,
    pub pages: Option<u32>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// A fresh `pending` job at 0 % for a validated request.
    pub fn new(request: &JobRequest) -> Self {
        Self {
            id: JobId::new(),
            url: request.source.clone(),
            format: request.format,
            status: JobStatus::Pending,
            progress: 0,
            title: None,
            filename: None,
            file_size: None,
            pages: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Merge a partial update into this record.
    ///
    /// Terminal jobs are frozen: the update is ignored and `false` returned.
    /// Progress never moves backwards.
    pub fn apply(&mut self, update: JobUpdate) -> bool {
        if self.is_terminal() {
            return false;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(progress) = update.progress {
            self.progress = self.progress.max(progress.min(100));
        }
        if let Some(title) = update.title {
            self.title = Some(title);
        }
        if let Some(filename) = update.filename {
            self.filename = Some(filename);
        }
        if let Some(size) = update.file_size {
            self.file_size = Some(size);
        }
        if let Some(pages) = update.pages {
            self.pages = Some(pages);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
        if let Some(at) = update.completed_at {
            self.completed_at = Some(at);
        }
        true
    }
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub title: Option<String>,
    pub filename: Option<String>,
    pub file_size: Option<u64>,
    pub pages: Option<u32>,
    pub error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The `completed` transition: artifact metadata, 100 %, completion time.
    pub fn completed(artifact: &RenderedArtifact) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            progress: Some(100),
            filename: Some(artifact.filename.clone()),
            file_size: Some(artifact.file_size),
            pages: Some(artifact.pages),
            completed_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// The `failed` transition: progress stays where it was.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Readable content pulled out of a rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub title: String,
    /// Structured text; `\n` separates blocks, blank lines surround headings.
    pub text: String,
}

/// Metadata of a written document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedArtifact {
    pub filename: String,
    pub pages: u32,
    pub file_size: u64,
}
