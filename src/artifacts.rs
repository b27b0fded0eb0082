//! The shared output directory that holds generated documents.
//!
//! Artifacts become visible to callers as soon as they are written. After a
//! successful download they are removed after a fixed delay; removal is
//! best-effort and treats an already-missing file as success.

use crate::error::Web2DocError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    /// Open (and create if needed) the output directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, Web2DocError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| Web2DocError::OutputDir {
            path: root.clone(),
            source: e,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a file with this name would have inside the directory.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Resolve an existing artifact by filename.
    ///
    /// Names that are not a single plain path component never resolve.
    pub async fn locate(&self, filename: &str) -> Result<PathBuf, Web2DocError> {
        let not_found = || Web2DocError::ArtifactNotFound {
            filename: filename.to_string(),
        };
        if !is_plain_filename(filename) {
            return Err(not_found());
        }
        let path = self.path_for(filename);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(not_found()),
        }
    }

    /// Remove an artifact if present. Returns whether a file was removed.
    pub async fn remove(&self, filename: &str) -> bool {
        if !is_plain_filename(filename) {
            return false;
        }
        remove_quietly(&self.path_for(filename)).await
    }

    /// Remove an artifact after `delay`, on a detached task.
    pub fn schedule_removal(&self, filename: &str, delay: Duration) -> JoinHandle<bool> {
        let dir = self.clone();
        let filename = filename.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let removed = dir.remove(&filename).await;
            debug!(filename = %filename, removed, "Scheduled artifact cleanup ran");
            removed
        })
    }
}

async fn remove_quietly(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove artifact");
            false
        }
    }
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn locate_finds_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ArtifactDir::open(tmp.path()).unwrap();
        std::fs::write(dir.path_for("Doc.pdf"), b"%PDF").unwrap();

        let path = dir.locate("Doc.pdf").await.unwrap();
        assert_eq!(path, tmp.path().join("Doc.pdf"));
    }

    #[tokio::test]
    async fn locate_missing_or_traversal_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ArtifactDir::open(tmp.path().join("out")).unwrap();
        std::fs::write(tmp.path().join("secret.txt"), b"x").unwrap();

        assert!(dir.locate("missing.pdf").await.unwrap_err().is_not_found());
        assert!(dir.locate("../secret.txt").await.unwrap_err().is_not_found());
        assert!(dir.locate("").await.is_err());
    }

    #[tokio::test]
    async fn remove_tolerates_absent_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ArtifactDir::open(tmp.path()).unwrap();
        std::fs::write(dir.path_for("a.pdf"), b"x").unwrap();

        assert!(dir.remove("a.pdf").await);
        assert!(!dir.remove("a.pdf").await);
    }

    #[tokio::test]
    async fn scheduled_removal_deletes_after_delay() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ArtifactDir::open(tmp.path()).unwrap();
        std::fs::write(dir.path_for("a.pdf"), b"x").unwrap();

        let handle = dir.schedule_removal("a.pdf", Duration::from_millis(20));
        assert!(dir.path_for("a.pdf").exists());
        assert!(handle.await.unwrap());
        assert!(!dir.path_for("a.pdf").exists());

        // Already gone: still completes cleanly.
        assert!(!dir
            .schedule_removal("a.pdf", Duration::from_millis(1))
            .await
            .unwrap());
    }
}
