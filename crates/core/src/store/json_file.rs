use crate::store::{ReportStore, StoreError, StoredReport};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One JSON file holding the latest report. Writes go through a sibling
/// temp file and a rename, so a crash mid-save never corrupts the slot.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl ReportStore for JsonFileStore {
    fn load(&self) -> BoxFuture<'_, Result<Option<StoredReport>, StoreError>> {
        async move {
            let bytes = match tokio::fs::read(&self.path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(StoreError::Io(e)),
            };
            let report = serde_json::from_slice(&bytes)?;
            Ok(Some(report))
        }
        .boxed()
    }

    fn save(&self, report: StoredReport) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            let json = serde_json::to_vec_pretty(&report)?;
            let temp = self.temp_path();
            tokio::fs::write(&temp, &json).await?;
            tokio::fs::rename(&temp, &self.path).await?;
            tracing::debug!(path = %self.path.display(), "latest report saved");
            Ok(())
        }
        .boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            match tokio::fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StoreError::Io(e)),
            }
        }
        .boxed()
    }
}
