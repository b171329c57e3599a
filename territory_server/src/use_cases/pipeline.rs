// Fingerprint-gated generation of each artifact family.

use crate::domain::PublishError;
use crate::use_cases::leaderboard::publish_top_tribes;
use crate::use_cases::snapshot::{ChangeGate, MarkerSnapshot};
use crate::use_cases::tiles::{TileSettings, generate_pyramid};
use crate::use_cases::world_map::{WorldMapSettings, generate_world_map};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub enum CycleOutcome {
    /// Fingerprint matched the last generation; nothing was written.
    Skipped,
    /// No cell could be read; the previously published artifacts keep being served.
    SourceUnavailable,
    Published(Vec<PathBuf>),
    /// Generation aborted; the previously published artifacts are untouched.
    Failed(PublishError),
}

#[async_trait]
pub trait ArtifactPipeline: Send {
    fn name(&self) -> &'static str;

    async fn run_cycle(&mut self, snapshot: &MarkerSnapshot) -> CycleOutcome;
}

// Shared gate handling: skip unchanged snapshots, only remember successful generations.
async fn gated<F, Fut>(
    gate: &mut ChangeGate,
    name: &str,
    snapshot: &MarkerSnapshot,
    generate: F,
) -> CycleOutcome
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<PathBuf>, PublishError>>,
{
    if !gate.is_changed(snapshot.fingerprint) {
        info!(
            artifact = name,
            fingerprint = %snapshot.fingerprint,
            "fingerprint unchanged, skipping generation"
        );
        return CycleOutcome::Skipped;
    }

    info!(
        artifact = name,
        markers = snapshot.marker_count(),
        fingerprint = %snapshot.fingerprint,
        "generating"
    );
    match generate().await {
        Ok(paths) => {
            gate.mark_generated(snapshot.fingerprint);
            CycleOutcome::Published(paths)
        }
        Err(error) => {
            warn!(artifact = name, %error, "generation failed, keeping previous artifact");
            CycleOutcome::Failed(error)
        }
    }
}

/// Web viewer tile pyramid under `<www>/territoryTiles`.
pub struct TilePipeline {
    root: PathBuf,
    settings: TileSettings,
    gate: ChangeGate,
}

impl TilePipeline {
    pub fn new(root: PathBuf, settings: TileSettings) -> Self {
        Self {
            root,
            settings,
            gate: ChangeGate::new(),
        }
    }
}

#[async_trait]
impl ArtifactPipeline for TilePipeline {
    fn name(&self) -> &'static str {
        "tiles"
    }

    async fn run_cycle(&mut self, snapshot: &MarkerSnapshot) -> CycleOutcome {
        let root = self.root.clone();
        let settings = self.settings;
        let markers = Arc::clone(&snapshot.markers);
        gated(&mut self.gate, "tiles", snapshot, || {
            generate_pyramid(root, markers, settings)
        })
        .await
    }
}

/// Game client world map and leaderboard under `<www>/gameTiles`.
pub struct WorldMapPipeline {
    dir: PathBuf,
    settings: WorldMapSettings,
    top_tribes: usize,
    gate: ChangeGate,
}

impl WorldMapPipeline {
    pub fn new(dir: PathBuf, settings: WorldMapSettings, top_tribes: usize) -> Self {
        Self {
            dir,
            settings,
            top_tribes,
            gate: ChangeGate::new(),
        }
    }
}

#[async_trait]
impl ArtifactPipeline for WorldMapPipeline {
    fn name(&self) -> &'static str {
        "world_map"
    }

    async fn run_cycle(&mut self, snapshot: &MarkerSnapshot) -> CycleOutcome {
        let dir = self.dir.clone();
        let settings = self.settings;
        let top_tribes = self.top_tribes;
        let markers = Arc::clone(&snapshot.markers);
        gated(&mut self.gate, "world_map", snapshot, || async move {
            tokio::task::spawn_blocking(move || {
                // The world map goes last: once it is replaced the cycle must be announced.
                let leaderboard = publish_top_tribes(&dir, &markers, top_tribes)?;
                let world = generate_world_map(&dir, &markers, &settings)?;
                Ok::<_, PublishError>(vec![world, leaderboard])
            })
            .await
            .map_err(|e| PublishError::Task(e.to_string()))?
        })
        .await
    }
}
