// File record source
//
// Reads a JSON document from disk on every load, so edits to the file are
// picked up by the next `DataStore::load()`.

use std::path::{Path, PathBuf};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use strata_core::{CoreError, DataProxy, Record};
use tracing::{debug, warn};

use crate::envelope::decode_records;
use crate::error::Error;

/// Reads records from a JSON file.
#[derive(Debug, Clone)]
pub struct FileProxy {
    path: PathBuf,
}

impl FileProxy {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the file.
    pub async fn fetch(&self) -> Result<Vec<Record>, Error> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| Error::Io {
                path: self.path.clone(),
                source,
            })?;
        let records = decode_records(&body)?;
        debug!(path = %self.path.display(), count = records.len(), "records read");
        Ok(records)
    }
}

impl DataProxy for FileProxy {
    fn read(&self) -> BoxFuture<'_, Result<Vec<Record>, CoreError>> {
        async move {
            self.fetch().await.map_err(|e| {
                warn!(path = %self.path.display(), error = %e, "file proxy read failed");
                CoreError::from(e)
            })
        }
        .boxed()
    }
}
