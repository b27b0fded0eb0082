//! Fetch adapters: load a page and hand its HTML to the extraction engine.
//!
//! [`PageFetcher`] is the seam the orchestrator depends on. Two adapters ship
//! with the crate:
//!
//! * [`HttpFetcher`]: a single HTTP GET with the configured User-Agent. Fast
//!   and dependency-free at runtime, but sees only server-rendered markup.
//! * `BrowserFetcher` (feature `browser`): drives a headless Chromium, waits
//!   for the network to go idle and extracts from the live DOM. The browser
//!   is torn down on every exit path, including cancellation.
//!
//! Parsing and extraction are CPU-bound and `scraper::Html` is not `Send`,
//! so extraction always runs inside `spawn_blocking`.

use crate::config::PipelineConfig;
use crate::error::{FetchError, Web2DocError};
use crate::job::ExtractedContent;
use crate::pipeline::extract;
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load `url` and extract its readable content within `timeout`.
    async fn fetch_and_extract(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> Result<ExtractedContent, FetchError>;
}

/// Run the extraction engine on a blocking thread.
pub async fn extract_blocking(url: &Url, html: String) -> Result<ExtractedContent, FetchError> {
    tokio::task::spawn_blocking(move || extract::extract_from_html(&html))
        .await
        .map_err(|e| FetchError::Extraction {
            url: url.to_string(),
            reason: format!("Extraction task panicked: {}", e),
        })
}

/// Plain HTTP fetcher built on `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &PipelineConfig) -> Result<Self, Web2DocError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Web2DocError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_and_extract(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> Result<ExtractedContent, FetchError> {
        info!("Fetching page: {}", url);

        let timeout_err = || FetchError::Timeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        };

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    timeout_err()
                } else {
                    FetchError::Request {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|e| {
            if e.is_timeout() {
                timeout_err()
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        debug!(bytes = html.len(), "Page body received");

        extract_blocking(url, html).await
    }
}

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;

#[cfg(feature = "browser")]
mod browser {
    use super::{extract_blocking, PageFetcher};
    use crate::config::PipelineConfig;
    use crate::error::FetchError;
    use crate::job::ExtractedContent;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
    use chromiumoxide::cdp::browser_protocol::page::EventLifecycleEvent;
    use chromiumoxide::Page;
    use futures::StreamExt;
    use reqwest::Url;
    use std::time::Duration;
    use tokio::runtime::Handle;
    use tokio::task::JoinHandle;
    use tracing::{debug, info, warn};

    /// Lifecycle event Chromium emits once the network has been quiet.
    const NETWORK_IDLE: &str = "networkIdle";

    const CDP_REQUEST_SLACK: Duration = Duration::from_secs(5);

    /// Headless Chromium fetcher. Launches one browser per fetch.
    #[derive(Debug, Clone)]
    pub struct BrowserFetcher {
        user_agent: String,
    }

    impl BrowserFetcher {
        pub fn new(config: &PipelineConfig) -> Self {
            Self {
                user_agent: config.user_agent.clone(),
            }
        }
    }

    fn browser_err(e: impl std::fmt::Display) -> FetchError {
        FetchError::Browser(e.to_string())
    }

    /// Owns the browser process, its CDP handler task and the open page.
    ///
    /// [`BrowserSession::close`] is the normal exit. If the session is dropped
    /// instead (the fetch future was cancelled), `Drop` hands the same
    /// teardown to a background task on the runtime captured at launch.
    struct BrowserSession {
        browser: Option<Browser>,
        page: Option<Page>,
        handler_task: Option<JoinHandle<()>>,
        runtime: Handle,
        url: String,
    }

    impl BrowserSession {
        async fn launch(url: &Url, timeout: Duration) -> Result<Self, FetchError> {
            // CDP commands must outlive the navigation bound so it is `load`
            // that reports the timeout.
            let config = BrowserConfig::builder()
                .request_timeout(timeout.saturating_add(CDP_REQUEST_SLACK))
                .build()
                .map_err(browser_err)?;
            let (browser, mut handler) = Browser::launch(config).await.map_err(browser_err)?;
            let handler_task = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            Ok(Self {
                browser: Some(browser),
                page: None,
                handler_task: Some(handler_task),
                runtime: Handle::current(),
                url: url.to_string(),
            })
        }

        async fn open_page(&mut self) -> Result<&Page, FetchError> {
            let browser = self
                .browser
                .as_ref()
                .ok_or_else(|| FetchError::Browser("Browser already closed".into()))?;
            let page = browser.new_page("about:blank").await.map_err(browser_err)?;
            let page: &Page = self.page.insert(page);
            Ok(page)
        }

        async fn close(mut self) {
            teardown(
                self.page.take(),
                self.browser.take(),
                self.handler_task.take(),
                &self.url,
            )
            .await;
        }
    }

    impl Drop for BrowserSession {
        fn drop(&mut self) {
            if self.page.is_none() && self.browser.is_none() && self.handler_task.is_none() {
                return;
            }
            let page = self.page.take();
            let browser = self.browser.take();
            let handler_task = self.handler_task.take();
            let url = std::mem::take(&mut self.url);
            debug!("Browser session dropped for {}; tearing down in background", url);
            self.runtime.spawn(async move {
                teardown(page, browser, handler_task, &url).await;
            });
        }
    }

    /// Close page, then browser, then stop the handler that services them.
    async fn teardown(
        page: Option<Page>,
        browser: Option<Browser>,
        handler_task: Option<JoinHandle<()>>,
        url: &str,
    ) {
        if let Some(page) = page {
            if let Err(e) = page.close().await {
                warn!("Failed to close page for {}: {} (non-fatal)", url, e);
            }
        }
        if let Some(mut browser) = browser {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser for {}: {} (non-fatal)", url, e);
            }
            if let Err(e) = browser.wait().await {
                debug!("Browser process did not exit cleanly: {}", e);
            }
        }
        if let Some(task) = handler_task {
            task.abort();
        }
    }

    #[async_trait]
    impl PageFetcher for BrowserFetcher {
        async fn fetch_and_extract(
            &self,
            url: &Url,
            timeout: Duration,
        ) -> Result<ExtractedContent, FetchError> {
            info!("Loading page in headless browser: {}", url);

            let mut session = BrowserSession::launch(url, timeout).await?;
            let html = match session.open_page().await {
                Ok(page) => load(page, url, &self.user_agent, timeout).await,
                Err(e) => Err(e),
            };
            session.close().await;

            extract_blocking(url, html?).await
        }
    }

    /// Navigate and wait for the main frame's network to go idle.
    async fn load(
        page: &Page,
        url: &Url,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let navigation = async {
            page.set_user_agent(SetUserAgentOverrideParams::new(user_agent.to_string()))
                .await?;
            let mut lifecycle = page.event_listener::<EventLifecycleEvent>().await?;
            page.goto(url.as_str()).await?;
            let main_frame = page.mainframe().await?;
            while let Some(event) = lifecycle.next().await {
                let in_main_frame = main_frame.as_ref().map_or(true, |f| *f == event.frame_id);
                if in_main_frame && event.name == NETWORK_IDLE {
                    break;
                }
            }
            page.content().await
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(Ok(html)) => Ok(html),
            Ok(Err(e)) => Err(FetchError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}
