//! Document rendering: write extracted content to a PDF or DOCX artifact.
//!
//! Layout and encoding are CPU-bound, so the whole stage runs inside
//! `spawn_blocking`. The file is written to a temporary sibling in the output
//! directory and renamed into place, so a reader never observes a partially
//! written artifact. The reported size is read back from the filesystem after
//! the write completes.

use super::layout::{self, Document};
use super::{docx, pdf};
use crate::artifacts::ArtifactDir;
use crate::error::RenderError;
use crate::job::{ExtractedContent, OutputFormat, RenderedArtifact};
use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Render `content` into `dir` as `<sanitized-title>.<ext>`.
pub async fn render_document(
    format: OutputFormat,
    content: &ExtractedContent,
    source_url: &str,
    dir: &ArtifactDir,
    compress: bool,
) -> Result<RenderedArtifact, RenderError> {
    let filename = layout::artifact_filename(&content.title, format);
    let path = dir.path_for(&filename);
    let content = content.clone();
    let source_url = source_url.to_string();

    tokio::task::spawn_blocking(move || {
        render_document_blocking(format, &content, &source_url, filename, &path, compress)
    })
    .await
    .map_err(|e| RenderError::Aborted(format!("Render task panicked: {}", e)))?
}

fn render_document_blocking(
    format: OutputFormat,
    content: &ExtractedContent,
    source_url: &str,
    filename: String,
    path: &Path,
    compress: bool,
) -> Result<RenderedArtifact, RenderError> {
    let generated = layout::generated_on(Local::now());
    let doc = Document {
        title: &content.title,
        text: &content.text,
        source_url,
        generated: &generated,
    };

    let io_err = |source: std::io::Error| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    let encode_err = |detail: String| RenderError::Encode {
        path: path.to_path_buf(),
        detail,
    };

    let parent = path.parent().map(PathBuf::from).unwrap_or_default();
    let mut tmp = NamedTempFile::new_in(&parent).map_err(io_err)?;

    match format {
        OutputFormat::Pdf => {
            let bytes = pdf::render_pdf(&doc, compress).map_err(|e| encode_err(e.to_string()))?;
            tmp.write_all(&bytes).map_err(io_err)?;
        }
        OutputFormat::Docx => {
            docx::write_docx(tmp.as_file_mut(), &doc).map_err(|e| encode_err(e.to_string()))?;
        }
    }
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    let file_size = std::fs::metadata(path).map_err(io_err)?.len();
    let pages = layout::estimate_pages(&content.text);
    debug!(filename = %filename, file_size, pages, "Artifact written");

    Ok(RenderedArtifact {
        filename,
        pages,
        file_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(title: &str, text: &str) -> ExtractedContent {
        ExtractedContent {
            title: title.into(),
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn pdf_artifact_is_written_with_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ArtifactDir::open(tmp.path()).unwrap();
        let text = "a".repeat(6001);

        let artifact = render_document(
            OutputFormat::Pdf,
            &content("Hello, World!", &text),
            "https://example.com/",
            &dir,
            true,
        )
        .await
        .unwrap();

        assert_eq!(artifact.filename, "Hello_World.pdf");
        assert_eq!(artifact.pages, 3);
        let on_disk = std::fs::read(dir.path_for("Hello_World.pdf")).unwrap();
        assert_eq!(artifact.file_size, on_disk.len() as u64);
        assert!(on_disk.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn docx_artifact_is_a_zip_package() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ArtifactDir::open(tmp.path()).unwrap();

        let artifact = render_document(
            OutputFormat::Docx,
            &content("Report", "Intro\n\nBody."),
            "https://example.com/",
            &dir,
            false,
        )
        .await
        .unwrap();

        assert_eq!(artifact.filename, "Report.docx");
        assert_eq!(artifact.pages, 1);
        let on_disk = std::fs::read(dir.path_for("Report.docx")).unwrap();
        assert!(on_disk.starts_with(b"PK"));
        assert_eq!(artifact.file_size, on_disk.len() as u64);
    }

    #[tokio::test]
    async fn same_title_overwrites_and_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ArtifactDir::open(tmp.path()).unwrap();

        for text in ["first.", "second, longer body text."] {
            render_document(
                OutputFormat::Pdf,
                &content("Same", text),
                "https://example.com/",
                &dir,
                false,
            )
            .await
            .unwrap();
        }

        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["Same.pdf".to_string()]);
        let body = String::from_utf8_lossy(&std::fs::read(dir.path_for("Same.pdf")).unwrap())
            .into_owned();
        assert!(body.contains("second, longer body text."));
    }

    #[tokio::test]
    async fn missing_output_directory_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ArtifactDir::open(tmp.path().join("out")).unwrap();
        std::fs::remove_dir(dir.root()).unwrap();

        let err = render_document(
            OutputFormat::Pdf,
            &content("X", "y"),
            "https://example.com/",
            &dir,
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }
}
