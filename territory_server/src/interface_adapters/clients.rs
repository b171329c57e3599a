use crate::domain::{ArtifactNotifier, ArtifactUploader, NotifyError, UploadError};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Object storage credentials and addressing for published artifacts.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    pub endpoint: String,
    pub bucket: String,
    /// Normalised to end in `/` (or empty).
    pub key_prefix: String,
    pub access_id: String,
    pub secret_key: String,
}

// Thin reqwest client that mirrors files under `root` into a bucket.
#[derive(Clone)]
pub struct HttpUploader {
    http: reqwest::Client,
    root: PathBuf,
    target: UploadTarget,
}

impl HttpUploader {
    pub fn new(
        root: impl Into<PathBuf>,
        target: UploadTarget,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            root: root.into(),
            target,
        })
    }

    /// Bucket key for a file under the output root, always with `/` separators.
    pub fn object_key(&self, path: &Path) -> Result<String, UploadError> {
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| UploadError::OutsideRoot(path.to_path_buf()))?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        Ok(format!("{}{}", self.target.key_prefix, parts.join("/")))
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.target.endpoint.trim_end_matches('/'),
            self.target.bucket,
            key
        )
    }
}

#[async_trait]
impl ArtifactUploader for HttpUploader {
    async fn upload(&self, path: &Path) -> Result<(), UploadError> {
        let key = self.object_key(path)?;
        let body = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let response = self
            .http
            .put(self.object_url(&key))
            .basic_auth(&self.target.access_id, Some(&self.target.secret_key))
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UploadError::Rejected(response.status()));
        }
        tracing::debug!(%key, "artifact uploaded");
        Ok(())
    }
}

// Used when no storage credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUploader;

#[async_trait]
impl ArtifactUploader for NoopUploader {
    async fn upload(&self, _path: &Path) -> Result<(), UploadError> {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WorldAnnouncement<'a> {
    world: &'a str,
}

// Posts `{"world": url}` to the consumer webhook.
#[derive(Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ArtifactNotifier for WebhookNotifier {
    async fn announce(&self, world_url: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(&self.url)
            .json(&WorldAnnouncement { world: world_url })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl ArtifactNotifier for LogNotifier {
    async fn announce(&self, world_url: &str) -> Result<(), NotifyError> {
        tracing::info!(world = %world_url, "no webhook configured, world map url logged only");
        Ok(())
    }
}
