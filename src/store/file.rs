//! Flat-file store using the line format understood by [`loader`](crate::loader).

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use super::PolicyStore;
use crate::error::{StoreError, StoreResult};
use crate::loader;
use crate::types::{GroupEdge, PolicyRows};

/// Rows live in a text file. Group rows are appended; the file is never
/// rewritten.
#[derive(Debug, Clone)]
pub struct FilePolicyStore {
    path: PathBuf,
}

impl FilePolicyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FilePolicyStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl PolicyStore for FilePolicyStore {
    async fn load(&self) -> StoreResult<PolicyRows> {
        let text = fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        let rows = loader::parse_policy(&text)?;
        debug!(
            event = "Store",
            phase = "Loaded",
            path = %self.path.display(),
            rules = rows.rules.len(),
            groups = rows.groups.len()
        );
        Ok(rows)
    }

    async fn append_group(&self, edge: &GroupEdge) -> StoreResult<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        let len = file.metadata().await.map_err(|e| self.io_error(e))?.len();
        let mut row = loader::render_group_edge(edge);
        if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))
                .await
                .map_err(|e| self.io_error(e))?;
            file.read_exact(&mut last)
                .await
                .map_err(|e| self.io_error(e))?;
            if last[0] != b'\n' {
                row.insert(0, '\n');
            }
        }

        file.write_all(row.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;
        file.sync_data().await.map_err(|e| self.io_error(e))?;

        debug!(event = "Store", phase = "Appended", path = %self.path.display(), row = %edge);
        Ok(())
    }
}
