// Domain-level errors for ingestion, publication and the outbound collaborators.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    #[error("record too short: {0} bytes")]
    ShortRecord(usize),
    #[error("unknown marker type code {0}")]
    UnknownType(u8),
    #[error("relative position {0} outside [0, 1]")]
    OutOfRange(f64),
    #[error("relative position is not finite")]
    NonFinite,
}

// Marker store failures for one cell.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("marker store unavailable: {0}")]
    Unavailable(String),
    #[error("cell ({cell_x}, {cell_y}) holds a malformed payload of {len} bytes")]
    MalformedPayload { cell_x: u32, cell_y: u32, len: usize },
    #[error("failed to read cell data: {0}")]
    Io(#[from] io::Error),
}

// Failures while staging or publishing an artifact. The prior artifact is left in place.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to create staging directory {path}: {source}")]
    StagingDir { path: PathBuf, source: io::Error },
    #[error("failed to write temp file {path}: {source}")]
    TempFile { path: PathBuf, source: io::Error },
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to replace {path}: {source}")]
    Replace { path: PathBuf, source: io::Error },
    #[error("failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("render task failed: {0}")]
    Task(String),
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to read artifact {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("artifact {0} is outside the output directory")]
    OutsideRoot(PathBuf),
    #[error("upload transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upload rejected with status {0}")]
    Rejected(reqwest::StatusCode),
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notify transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("notify rejected with status {0}")]
    Rejected(reqwest::StatusCode),
}
