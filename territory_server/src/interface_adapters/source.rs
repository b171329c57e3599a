// File-backed marker store: one file of concatenated records per server cell.

use crate::domain::{MarkerSource, RECORD_LEN, SourceError, pack_server_id};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FileMarkerSource {
    data_dir: PathBuf,
}

impl FileMarkerSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// `territorymapdata_<x << 16 | y>.bin`
    pub fn cell_path(&self, cell_x: u32, cell_y: u32) -> PathBuf {
        self.data_dir.join(format!(
            "territorymapdata_{}.bin",
            pack_server_id(cell_x, cell_y)
        ))
    }
}

#[async_trait]
impl MarkerSource for FileMarkerSource {
    async fn fetch_cell(&self, cell_x: u32, cell_y: u32) -> Result<Vec<Vec<u8>>, SourceError> {
        let path = self.cell_path(cell_x, cell_y);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            // A server that never stored markers has no file yet.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if bytes.len() % RECORD_LEN != 0 {
            return Err(SourceError::MalformedPayload {
                cell_x,
                cell_y,
                len: bytes.len(),
            });
        }

        Ok(bytes.chunks_exact(RECORD_LEN).map(<[u8]>::to_vec).collect())
    }
}
