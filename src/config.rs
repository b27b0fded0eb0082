//! Configuration for the scrape-and-convert pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. One struct holds every knob so a single
//! `Arc<PipelineConfig>` can be shared by the orchestrator and every job task
//! it spawns.

use crate::error::Web2DocError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Client identity presented to web servers while fetching a page.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Configuration for a [`crate::JobPipeline`].
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use web2doc::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .output_dir("out")
///     .fetch_timeout_ms(10_000)
///     .build()
///     .unwrap();
/// assert_eq!(config.fetch_timeout_ms, 10_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory that receives generated artifacts. Default: `downloads`.
    ///
    /// Created when the pipeline is constructed. Artifacts are caller-visible
    /// here as soon as a job completes.
    pub output_dir: PathBuf,

    /// Upper bound on navigation plus content extraction, in milliseconds.
    /// Default: 30000.
    ///
    /// A job whose fetch stage exceeds this bound fails with progress frozen
    /// at the fetch-start value.
    pub fetch_timeout_ms: u64,

    /// Extra time the orchestrator allows a fetch adapter past
    /// `fetch_timeout_ms` before abandoning it, in milliseconds. Default: 2000.
    ///
    /// Adapters enforce `fetch_timeout_ms` themselves and release their
    /// resources (browser, page) inside this window.
    pub teardown_grace_ms: u64,

    /// User-Agent header sent by the fetch adapter.
    pub user_agent: String,

    /// Seconds to wait after a successful download before removing the
    /// artifact. Default: 60.
    pub cleanup_delay_secs: u64,

    /// Default number of entries returned by
    /// [`crate::JobPipeline::recent_documents`]. Default: 10.
    pub recent_limit: usize,

    /// Flate-compress PDF page content streams. Default: true.
    pub compress_streams: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            fetch_timeout_ms: 30_000,
            teardown_grace_ms: 2_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cleanup_delay_secs: 60,
            recent_limit: 10,
            compress_streams: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Hard bound the orchestrator puts on one fetch-and-extract call.
    pub fn fetch_deadline(&self) -> Duration {
        self.fetch_timeout() + Duration::from_millis(self.teardown_grace_ms)
    }

    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_secs(self.cleanup_delay_secs)
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn fetch_timeout_ms(mut self, ms: u64) -> Self {
        self.config.fetch_timeout_ms = ms;
        self
    }

    pub fn teardown_grace_ms(mut self, ms: u64) -> Self {
        self.config.teardown_grace_ms = ms;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn cleanup_delay_secs(mut self, secs: u64) -> Self {
        self.config.cleanup_delay_secs = secs;
        self
    }

    pub fn recent_limit(mut self, n: usize) -> Self {
        self.config.recent_limit = n.max(1);
        self
    }

    pub fn compress_streams(mut self, v: bool) -> Self {
        self.config.compress_streams = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Web2DocError> {
        let c = &self.config;
        if c.fetch_timeout_ms == 0 {
            return Err(Web2DocError::InvalidConfig(
                "Fetch timeout must be ≥ 1 ms".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(Web2DocError::InvalidConfig(
                "Output directory must not be empty".into(),
            ));
        }
        if c.user_agent.trim().is_empty() {
            return Err(Web2DocError::InvalidConfig(
                "User agent must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
