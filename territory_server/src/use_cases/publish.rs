// Artifact publication: write to a temp file beside the target, then replace the target.
//
// Replacement is remove-then-rename, so a reader polling the canonical path can briefly
// see it missing. A failure before the rename leaves the previous artifact untouched.

use crate::domain::PublishError;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{
    OnceLock,
    atomic::{AtomicU64, Ordering},
};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Process-unique, monotonically increasing id for temp file names.
pub fn unique_id() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(now_nanos()));
    counter.fetch_add(1, Ordering::Relaxed)
}

/// A fully written temp file waiting to replace its target.
#[derive(Debug)]
pub struct StagedFile {
    temp_path: PathBuf,
    target: PathBuf,
}

impl StagedFile {
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Swaps the staged file into place and returns the published path.
    pub fn commit(self) -> Result<PathBuf, PublishError> {
        match fs::remove_file(&self.target) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                let _ = fs::remove_file(&self.temp_path);
                return Err(PublishError::Replace {
                    path: self.target,
                    source,
                });
            }
        }

        fs::rename(&self.temp_path, &self.target).map_err(|source| PublishError::Replace {
            path: self.target.clone(),
            source,
        })?;
        Ok(self.target)
    }
}

/// Writes a temp file in the target's directory using `write`, creating the directory first.
pub fn stage<F>(target: &Path, write: F) -> Result<StagedFile, PublishError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), PublishError>,
{
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|source| PublishError::StagingDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let extension = target
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let temp_path = dir.join(format!("tmp_{:x}{extension}", unique_id()));

    let result = File::create(&temp_path)
        .map(BufWriter::new)
        .map_err(|source| PublishError::TempFile {
            path: temp_path.clone(),
            source,
        })
        .and_then(|mut writer| {
            write(&mut writer)?;
            writer.flush().map_err(|source| PublishError::TempFile {
                path: temp_path.clone(),
                source,
            })
        });

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(StagedFile {
        temp_path,
        target: target.to_path_buf(),
    })
}

pub fn publish<F>(target: &Path, write: F) -> Result<PathBuf, PublishError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), PublishError>,
{
    stage(target, write)?.commit()
}

pub fn publish_bytes(target: &Path, bytes: &[u8]) -> Result<PathBuf, PublishError> {
    publish(target, |writer| {
        writer
            .write_all(bytes)
            .map_err(|source| PublishError::TempFile {
                path: target.to_path_buf(),
                source,
            })
    })
}
