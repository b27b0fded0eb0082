//! # web2doc
//!
//! Scrape a web page, extract its readable text and convert it into a PDF or
//! DOCX document, tracked as an asynchronous job.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL + format
//!  │
//!  ├─ 0. Submit   validate, persist a `pending` job, return immediately
//!  ├─ 1. Fetch    load the page (HTTP, or headless Chromium with `browser`)
//!  ├─ 2. Extract  drop scripts/nav/ads, pick the content root, structure text
//!  ├─ 3. Render   lay out headings and justified body text (spawn_blocking)
//!  └─ 4. Finish   `completed` with filename/pages/size, or `failed` + error
//! ```
//!
//! Progress is reported only through the [`JobStore`]; callers poll it by id.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use web2doc::{JobPipeline, JobStatus, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = JobPipeline::new(PipelineConfig::default())?;
//!     let job = pipeline.submit("https://example.com/", "pdf").await?;
//!     assert_eq!(job.status, JobStatus::Pending);
//!
//!     let done = pipeline
//!         .wait_for_terminal(&job.id, Duration::from_millis(200))
//!         .await?;
//!     match done.status {
//!         JobStatus::Completed => println!("wrote {:?}", done.filename),
//!         _ => eprintln!("failed: {:?}", done.error),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `web2doc` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `browser` | off     | Adds `BrowserFetcher`, a headless-Chromium fetch adapter |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! web2doc = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifacts;
pub mod config;
pub mod error;
pub mod job;
pub mod orchestrator;
pub mod pipeline;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifacts::ArtifactDir;
pub use config::{PipelineConfig, PipelineConfigBuilder, DEFAULT_USER_AGENT};
pub use error::{FetchError, RenderError, StageError, StoreError, Web2DocError};
pub use job::{
    ExtractedContent, Job, JobId, JobRequest, JobStatus, JobUpdate, OutputFormat, RenderedArtifact,
};
pub use orchestrator::JobPipeline;
#[cfg(feature = "browser")]
pub use pipeline::fetch::BrowserFetcher;
pub use pipeline::fetch::{HttpFetcher, PageFetcher};
pub use store::{JobStore, MemoryJobStore};
