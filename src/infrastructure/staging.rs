use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{info, warn};

/// Directory that holds uploads while a request is processing them.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

/// One uploaded file on disk. Removed by [`StagedUpload::remove`], or on drop
/// if the owner bails out early.
#[derive(Debug)]
pub struct StagedUpload {
    path: TempPath,
    size: u64,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Streams `reader` into a fresh file inside the staging directory.
    pub async fn stage<R>(&self, mut reader: R) -> io::Result<StagedUpload>
    where
        R: AsyncRead + Unpin,
    {
        let (file, path) = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".csv")
            .tempfile_in(&self.dir)?
            .into_parts();

        // `path` deletes the file if anything below fails
        let mut file = tokio::fs::File::from_std(file);
        let size = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;

        Ok(StagedUpload { path, size })
    }
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Deletes the file. A failure is logged and otherwise ignored.
    pub fn remove(self) {
        let staged_path = self.path.display().to_string();
        if let Err(e) = self.path.close() {
            warn!("⚠️ Failed to remove staged upload {}: {}", staged_path, e);
        }
    }
}

pub async fn setup_staging(dir: &Path) -> io::Result<StagingArea> {
    tokio::fs::create_dir_all(dir).await?;
    info!("📁 Upload staging: {}", dir.display());
    Ok(StagingArea::new(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stage_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());

        let staged = staging.stage(&b"a,b\n1,2\n"[..]).await.unwrap();
        assert_eq!(staged.size(), 8);
        assert!(staged.path().starts_with(dir.path()));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"a,b\n1,2\n");

        let path = staged.path().to_path_buf();
        staged.remove();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_dropped_upload_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());

        let staged = staging.stage(&b"x"[..]).await.unwrap();
        let path = staged.path().to_path_buf();
        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_setup_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let staging = setup_staging(&nested).await.unwrap();
        assert!(staging.dir().is_dir());
    }
}
