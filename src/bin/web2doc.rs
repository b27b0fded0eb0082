//! CLI binary for web2doc.
//!
//! A thin shim over the library crate: maps flags to `PipelineConfig`,
//! submits one job per URL and follows them by polling the job store.

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use web2doc::{
    Job, JobId, JobPipeline, JobRequest, JobStatus, OutputFormat, PageFetcher, PipelineConfig,
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Save an article as PDF under ./downloads
  web2doc https://example.com/blog/post

  # Several pages at once, as Word documents
  web2doc --format docx -o out https://example.com/a https://example.com/b

  # Machine-readable job records
  web2doc --json https://example.com/ > jobs.json

ENVIRONMENT VARIABLES:
  WEB2DOC_FORMAT       Output format (pdf, docx)
  WEB2DOC_OUTPUT_DIR   Directory for generated documents
  WEB2DOC_TIMEOUT_MS   Fetch timeout in milliseconds
  WEB2DOC_USER_AGENT   Override the User-Agent sent while fetching
  RUST_LOG             Log filter, overrides -v / -q
"#;

/// Scrape web pages and convert them to PDF or DOCX documents.
#[derive(Parser, Debug)]
#[command(
    name = "web2doc",
    version,
    about = "Scrape web pages and convert them to PDF or DOCX documents",
    long_about = "Fetch each URL, extract its readable text (dropping scripts, navigation, \
ads and banners) and render it as a paginated PDF or a DOCX document. Every URL runs as \
its own background job.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// One or more absolute page URLs.
    #[arg(required = true)]
    urls: Vec<String>,

    /// Output document format.
    #[arg(short, long, env = "WEB2DOC_FORMAT", value_enum, default_value = "pdf")]
    format: FormatArg,

    /// Directory that receives the generated documents.
    #[arg(short, long, env = "WEB2DOC_OUTPUT_DIR", default_value = "downloads")]
    output_dir: PathBuf,

    /// Fetch timeout (navigation plus extraction) in milliseconds.
    #[arg(long, env = "WEB2DOC_TIMEOUT_MS", default_value_t = 30_000,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: u64,

    /// User-Agent presented to web servers.
    #[arg(long, env = "WEB2DOC_USER_AGENT")]
    user_agent: Option<String>,

    /// Write uncompressed PDF content streams.
    #[arg(long, env = "WEB2DOC_NO_COMPRESS")]
    no_compress: bool,

    /// Load pages in a headless Chromium instead of a plain HTTP GET.
    #[cfg(feature = "browser")]
    #[arg(long, env = "WEB2DOC_BROWSER")]
    browser: bool,

    /// Print the final job records as JSON on stdout.
    #[arg(long, env = "WEB2DOC_JSON")]
    json: bool,

    /// Disable progress bars.
    #[arg(long, env = "WEB2DOC_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "WEB2DOC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "WEB2DOC_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Pdf,
    Docx,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Pdf => OutputFormat::Pdf,
            FormatArg::Docx => OutputFormat::Docx,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Progress bars replace INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Validate every URL before starting anything ─────────────────────
    let format = OutputFormat::from(cli.format);
    let requests = cli
        .urls
        .iter()
        .map(|url| JobRequest::parse(url, format.as_str()))
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid input")?;

    let config = build_config(&cli)?;
    let pipeline = build_pipeline(&cli, config)?;

    // ── Submit ───────────────────────────────────────────────────────────
    let mut jobs = Vec::with_capacity(requests.len());
    for request in requests {
        let job = pipeline
            .submit_request(request)
            .await
            .context("Failed to submit job")?;
        jobs.push(job);
    }

    // ── Follow ───────────────────────────────────────────────────────────
    let multi = MultiProgress::new();
    let followers = jobs.iter().map(|job| {
        let bar = show_progress.then(|| job_bar(&multi, job));
        follow(&pipeline, job.id, bar)
    });
    let finished = join_all(followers)
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&finished).context("Failed to serialise jobs")?;
        println!("{json}");
    }
    if !cli.quiet {
        for job in &finished {
            report(&pipeline, job);
        }
    }

    let failed = finished
        .iter()
        .filter(|j| j.status == JobStatus::Failed)
        .count();
    if failed > 0 {
        anyhow::bail!("{} of {} jobs failed", failed, finished.len());
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .output_dir(cli.output_dir.clone())
        .fetch_timeout_ms(cli.timeout_ms)
        .compress_streams(!cli.no_compress);
    if let Some(ua) = &cli.user_agent {
        builder = builder.user_agent(ua.clone());
    }
    builder.build().context("Invalid configuration")
}

#[cfg_attr(not(feature = "browser"), allow(unused_variables))]
fn build_pipeline(cli: &Cli, config: PipelineConfig) -> Result<JobPipeline> {
    #[cfg(feature = "browser")]
    if cli.browser {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(web2doc::BrowserFetcher::new(&config));
        return JobPipeline::with_components(
            config,
            Arc::new(web2doc::MemoryJobStore::new()),
            fetcher,
        )
        .context("Failed to initialise pipeline");
    }

    let fetcher: Arc<dyn PageFetcher> =
        Arc::new(web2doc::HttpFetcher::new(&config).context("Failed to build HTTP client")?);
    JobPipeline::with_components(config, Arc::new(web2doc::MemoryJobStore::new()), fetcher)
        .context("Failed to initialise pipeline")
}

fn job_bar(multi: &MultiProgress, job: &Job) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(100));
    let style = ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold}  [{bar:30.green/238}] {pos:>3}%  {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
    bar.set_style(style);
    bar.set_prefix(shorten(&job.url, 40));
    bar.set_message(job.status.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Poll one job until it is terminal, mirroring its progress on `bar`.
async fn follow(pipeline: &JobPipeline, id: JobId, bar: Option<ProgressBar>) -> Result<Job> {
    let Some(bar) = bar else {
        return pipeline
            .wait_for_terminal(&id, POLL_INTERVAL)
            .await
            .context("Lost track of job");
    };

    loop {
        let job = pipeline.job(&id).await.context("Lost track of job")?;
        bar.set_position(job.progress as u64);
        bar.set_message(job.status.to_string());
        if job.is_terminal() {
            bar.finish_and_clear();
            return Ok(job);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn report(pipeline: &JobPipeline, job: &Job) {
    match job.status {
        JobStatus::Completed => {
            let path = job
                .filename
                .as_deref()
                .map(|f| pipeline.artifact_dir().path_for(f).display().to_string())
                .unwrap_or_default();
            eprintln!(
                "{} {}  {}  →  {}",
                green("✔"),
                job.title.as_deref().unwrap_or(&job.url),
                dim(&format!(
                    "{} page(s), {} bytes",
                    job.pages.unwrap_or(0),
                    job.file_size.unwrap_or(0)
                )),
                bold(&path),
            );
        }
        _ => {
            eprintln!(
                "{} {}  {}",
                red("✘"),
                job.url,
                red(job.error.as_deref().unwrap_or("unknown error")),
            );
        }
    }
}

fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}\u{2026}")
    }
}
