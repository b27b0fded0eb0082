//! The job pipeline: validation, job creation and the per-job state machine.
//!
//! ```text
//! submit ──▶ pending(0) ──▶ processing(10) ──▶ fetch(30) ──▶ extracted(60)
//!                                                 │               │
//!                                                 ▼               ▼
//!                                           failed(30)      render(80) ──▶ completed(100)
//!                                                                 │
//!                                                                 ▼
//!                                                           failed(80)
//! ```
//!
//! [`JobPipeline::submit`] validates the request, persists a `pending` job and
//! returns it at once. The state machine then runs on its own Tokio task and
//! reports exclusively through the [`JobStore`]; callers observe it by
//! polling. Every stage failure is caught here and recorded as a terminal
//! `failed` job, so nothing a page does can take the process down.

use crate::artifacts::ArtifactDir;
use crate::config::PipelineConfig;
use crate::error::{FetchError, StageError, Web2DocError};
use crate::job::{Job, JobId, JobRequest, JobStatus, JobUpdate, RenderedArtifact};
use crate::pipeline::fetch::{HttpFetcher, PageFetcher};
use crate::pipeline::render::render_document;
use crate::store::{JobStore, MemoryJobStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Progress after the background task picks the job up.
pub const PROGRESS_STARTED: u8 = 10;
/// Progress while the page is being fetched.
pub const PROGRESS_FETCHING: u8 = 30;
/// Progress once content has been extracted.
pub const PROGRESS_EXTRACTED: u8 = 60;
/// Progress while the document is being rendered.
pub const PROGRESS_RENDERING: u8 = 80;

/// Handle to the scrape-and-convert pipeline.
///
/// Cheap to clone; every clone shares the same store, fetcher and output
/// directory.
#[derive(Clone)]
pub struct JobPipeline {
    config: Arc<PipelineConfig>,
    store: Arc<dyn JobStore>,
    fetcher: Arc<dyn PageFetcher>,
    artifacts: ArtifactDir,
}

impl std::fmt::Debug for JobPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobPipeline")
            .field("config", &self.config)
            .field("artifacts", &self.artifacts)
            .finish_non_exhaustive()
    }
}

impl JobPipeline {
    /// A pipeline with an in-memory store and the HTTP fetcher.
    pub fn new(config: PipelineConfig) -> Result<Self, Web2DocError> {
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        Self::with_components(config, Arc::new(MemoryJobStore::new()), fetcher)
    }

    /// A pipeline over caller-supplied collaborators.
    ///
    /// Creates the output directory if it does not exist.
    pub fn with_components(
        config: PipelineConfig,
        store: Arc<dyn JobStore>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self, Web2DocError> {
        let artifacts = ArtifactDir::open(config.output_dir.clone())?;
        Ok(Self {
            config: Arc::new(config),
            store,
            fetcher,
            artifacts,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn artifact_dir(&self) -> &ArtifactDir {
        &self.artifacts
    }

    /// Validate raw input and start a job.
    ///
    /// Invalid input is rejected before the store is touched. On success the
    /// returned record is `pending` at 0 %; the work continues in the
    /// background.
    pub async fn submit(&self, url: &str, format: &str) -> Result<Job, Web2DocError> {
        let request = JobRequest::parse(url, format)?;
        self.submit_request(request).await
    }

    /// Start a job for an already validated request.
    pub async fn submit_request(&self, request: JobRequest) -> Result<Job, Web2DocError> {
        let job = self.store.create(Job::new(&request)).await?;
        info!(job_id = %job.id, url = %job.url, format = %job.format, "Job accepted");

        let span = info_span!(
            "scrape_job",
            job_id = %job.id,
            url = %job.url,
            format = %job.format,
        );
        let pipeline = self.clone();
        let id = job.id;
        tokio::spawn(async move { pipeline.run(id, request).await }.instrument(span));

        Ok(job)
    }

    /// Drive one job from `pending` to a terminal state.
    async fn run(&self, id: JobId, request: JobRequest) {
        match self.execute(&id, &request).await {
            Ok(artifact) => {
                info!(
                    filename = %artifact.filename,
                    pages = artifact.pages,
                    file_size = artifact.file_size,
                    "Job completed"
                );
                self.record(&id, JobUpdate::completed(&artifact)).await;
            }
            Err(e) => {
                warn!(error = %e, "Job failed");
                self.record(&id, JobUpdate::failed(e.to_string())).await;
            }
        }
    }

    async fn execute(
        &self,
        id: &JobId,
        request: &JobRequest,
    ) -> Result<RenderedArtifact, StageError> {
        self.record(
            id,
            JobUpdate::progress(PROGRESS_STARTED).status(JobStatus::Processing),
        )
        .await;

        self.record(id, JobUpdate::progress(PROGRESS_FETCHING)).await;
        // The adapter owns `fetch_timeout`; the deadline only catches one that
        // ignores it, and leaves room for its teardown.
        let timeout = self.config.fetch_timeout();
        let content = match tokio::time::timeout(
            self.config.fetch_deadline(),
            self.fetcher.fetch_and_extract(&request.url, timeout),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: request.url.to_string(),
                    timeout_ms: self.config.fetch_timeout_ms,
                }
                .into())
            }
        };
        info!(title = %content.title, chars = content.text.len(), "Page extracted");

        self.record(
            id,
            JobUpdate::progress(PROGRESS_EXTRACTED).title(content.title.clone()),
        )
        .await;

        self.record(id, JobUpdate::progress(PROGRESS_RENDERING)).await;
        let artifact = render_document(
            request.format,
            &content,
            &request.source,
            &self.artifacts,
            self.config.compress_streams,
        )
        .await?;

        Ok(artifact)
    }

    /// Persist a job update. Store failures are logged; the job keeps going.
    async fn record(&self, id: &JobId, update: JobUpdate) {
        match self.store.update(id, update).await {
            Ok(Some(job)) => debug!(status = %job.status, progress = job.progress, "Job updated"),
            Ok(None) => debug!("Job record no longer exists; update dropped"),
            Err(e) => error!(error = %e, "Failed to record job update"),
        }
    }

    /// Current record for `id`.
    pub async fn job(&self, id: &JobId) -> Result<Job, Web2DocError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Web2DocError::JobNotFound { id: id.to_string() })
    }

    /// Most recently created completed jobs, newest first.
    ///
    /// `None` uses the configured default limit.
    pub async fn recent_documents(&self, limit: Option<usize>) -> Result<Vec<Job>, Web2DocError> {
        let limit = limit.unwrap_or(self.config.recent_limit);
        Ok(self.store.list_recent_completed(limit).await?)
    }

    /// Delete a job and its artifact.
    ///
    /// Unknown ids fail with [`Web2DocError::JobNotFound`] and change
    /// nothing. Artifact removal is best-effort and tolerates a missing file.
    pub async fn delete_job(&self, id: &JobId) -> Result<Job, Web2DocError> {
        let job = self.job(id).await?;

        if let Some(filename) = &job.filename {
            let removed = self.artifacts.remove(filename).await;
            debug!(job_id = %id, filename = %filename, removed, "Artifact removal");
        }
        if !self.store.delete(id).await? {
            return Err(Web2DocError::JobNotFound { id: id.to_string() });
        }

        info!(job_id = %id, "Job deleted");
        Ok(job)
    }

    /// Resolve a generated artifact by filename.
    pub async fn artifact(&self, filename: &str) -> Result<PathBuf, Web2DocError> {
        self.artifacts.locate(filename).await
    }

    /// Schedule removal of an artifact once it has been delivered.
    pub fn mark_downloaded(&self, filename: &str) -> JoinHandle<bool> {
        debug!(
            filename = %filename,
            delay_secs = self.config.cleanup_delay_secs,
            "Artifact cleanup scheduled"
        );
        self.artifacts
            .schedule_removal(filename, self.config.cleanup_delay())
    }

    /// Poll the store until the job reaches a terminal state.
    pub async fn wait_for_terminal(
        &self,
        id: &JobId,
        poll_interval: Duration,
    ) -> Result<Job, Web2DocError> {
        loop {
            let job = self.job(id).await?;
            if job.is_terminal() {
                return Ok(job);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
