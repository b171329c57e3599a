use async_trait::async_trait;
use std::path::Path;

use super::errors::{NotifyError, SourceError, UploadError};

// Port for the marker store. Returns the raw records stored for one server cell.
#[async_trait]
pub trait MarkerSource: Send + Sync {
    async fn fetch_cell(&self, cell_x: u32, cell_y: u32) -> Result<Vec<Vec<u8>>, SourceError>;
}

// Port for best-effort mirroring of published artifacts to object storage.
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<(), UploadError>;
}

// Port for announcing a freshly published world map to consumers.
#[async_trait]
pub trait ArtifactNotifier: Send + Sync {
    async fn announce(&self, world_url: &str) -> Result<(), NotifyError>;
}
