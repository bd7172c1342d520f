//! Per-request staging of uploaded images on disk.
//!
//! A [`TransientInputFile`] owns its path exclusively and deletes it when
//! released or dropped, so no exit path of a request can leak one.

use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

pub struct UploadStager {
    dir: PathBuf,
}

impl UploadStager {
    /// Use `dir` for staged uploads, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a fresh, uniquely named file in the staging directory.
    pub async fn stage<B>(&self, label: &str, bytes: B) -> Result<TransientInputFile>
    where
        B: AsRef<[u8]> + Send + 'static,
    {
        let dir = self.dir.clone();
        let prefix = format!("{}-", label);

        let path = tokio::task::spawn_blocking(move || -> Result<TempPath> {
            let mut file = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".upload")
                .tempfile_in(&dir)?;
            file.write_all(bytes.as_ref())?;
            file.flush()?;
            Ok(file.into_temp_path())
        })
        .await
        .map_err(|e| Error::Invariant(format!("Staging task join error: {}", e)))??;

        debug!("Staged {} upload at {}", label, path.display());

        Ok(TransientInputFile {
            label: label.to_string(),
            path,
        })
    }
}

/// An uploaded image staged on disk for the lifetime of one request.
#[derive(Debug)]
pub struct TransientInputFile {
    label: String,
    path: TempPath,
}

impl TransientInputFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&*self.path).await?)
    }

    /// Delete the file now, logging instead of failing if removal errors.
    pub fn release(self) {
        let shown = self.path.display().to_string();
        match self.path.close() {
            Ok(()) => debug!("Removed staged {} upload {}", self.label, shown),
            Err(e) => warn!(
                "Failed to remove staged {} upload {}: {}",
                self.label, shown, e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_writes_and_release_removes() {
        let dir = TempDir::new().unwrap();
        let stager = UploadStager::new(dir.path()).unwrap();

        let staged = stager.stage("subject", b"image-bytes".to_vec()).await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert!(path.starts_with(dir.path()));
        assert_eq!(staged.read().await.unwrap(), b"image-bytes");

        staged.release();
        assert!(!path.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_release_tolerates_already_removed_file() {
        let dir = TempDir::new().unwrap();
        let stager = UploadStager::new(dir.path()).unwrap();

        let staged = stager.stage("garment", vec![7, 8, 9]).await.unwrap();
        std::fs::remove_file(staged.path()).unwrap();

        staged.release();
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = TempDir::new().unwrap();
        let stager = UploadStager::new(dir.path()).unwrap();

        {
            let _subject = stager.stage("subject", vec![1, 2, 3]).await.unwrap();
            let _garment = stager.stage("garment", vec![4, 5, 6]).await.unwrap();
            assert_eq!(entries(dir.path()), 2);
        }

        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_new_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("uploads");

        let stager = UploadStager::new(&nested).unwrap();
        assert!(stager.dir().is_dir());
    }

    #[tokio::test]
    async fn test_stage_fails_when_directory_is_gone() {
        let dir = TempDir::new().unwrap();
        let uploads = dir.path().join("uploads");
        let stager = UploadStager::new(&uploads).unwrap();
        std::fs::remove_dir(&uploads).unwrap();

        let err = stager.stage("subject", vec![0]).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
