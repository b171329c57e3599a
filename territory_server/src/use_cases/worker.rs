// Background polling loop: snapshot -> gated generation -> upload -> announce.

use crate::domain::{ArtifactNotifier, ArtifactUploader, MarkerSource};
use crate::use_cases::pipeline::{ArtifactPipeline, CycleOutcome};
use crate::use_cases::publish::unique_id;
use crate::use_cases::snapshot::collect_snapshot;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Announces the world map location to consumers once it is fully published.
#[derive(Clone)]
pub struct Announcer {
    notifier: Arc<dyn ArtifactNotifier>,
    endpoint: String,
}

impl Announcer {
    pub fn new(notifier: Arc<dyn ArtifactNotifier>, endpoint: impl Into<String>) -> Self {
        Self {
            notifier,
            endpoint: endpoint.into(),
        }
    }

    /// World map URL with a fresh cache-busting tag.
    pub fn world_url(&self) -> String {
        let tag = unique_id() & 0x7fff_ffff;
        format!("http://{}/gameTiles/world.map?t={tag}", self.endpoint)
    }

    pub async fn announce(&self) {
        let url = self.world_url();
        match self.notifier.announce(&url).await {
            Ok(()) => info!(%url, "world map announced"),
            Err(error) => warn!(%url, %error, "failed to announce world map"),
        }
    }
}

/// Grid dimensions and polling cadence for one worker.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSchedule {
    pub servers_x: u32,
    pub servers_y: u32,
    pub interval: Duration,
}

pub struct Worker<P> {
    pipeline: P,
    source: Arc<dyn MarkerSource>,
    uploader: Arc<dyn ArtifactUploader>,
    announcer: Option<Announcer>,
    schedule: WorkerSchedule,
}

impl<P> Worker<P>
where
    P: ArtifactPipeline,
{
    pub fn new(
        pipeline: P,
        source: Arc<dyn MarkerSource>,
        uploader: Arc<dyn ArtifactUploader>,
        schedule: WorkerSchedule,
    ) -> Self {
        Self {
            pipeline,
            source,
            uploader,
            announcer: None,
            schedule,
        }
    }

    pub fn with_announcer(mut self, announcer: Announcer) -> Self {
        self.announcer = Some(announcer);
        self
    }

    /// One polling cycle. Upload and announcement failures are logged and never undo the
    /// local publish.
    pub async fn tick(&mut self) -> CycleOutcome {
        let name = self.pipeline.name();
        let snapshot = collect_snapshot(
            self.source.as_ref(),
            self.schedule.servers_x,
            self.schedule.servers_y,
        )
        .await;
        let cells = self.schedule.servers_x as usize * self.schedule.servers_y as usize;
        if cells > 0 && snapshot.skipped_cells == cells {
            warn!(artifact = name, cells, "marker store unavailable, keeping previous artifacts");
            return CycleOutcome::SourceUnavailable;
        }
        if snapshot.skipped_cells > 0 {
            warn!(
                artifact = name,
                skipped_cells = snapshot.skipped_cells,
                "continuing with partial marker data"
            );
        }

        let outcome = self.pipeline.run_cycle(&snapshot).await;
        if let CycleOutcome::Published(paths) = &outcome {
            self.upload_all(paths).await;
            if let Some(announcer) = &self.announcer {
                announcer.announce().await;
            }
        }
        outcome
    }

    async fn upload_all(&self, paths: &[PathBuf]) {
        let mut failed = 0usize;
        for path in paths {
            if let Err(error) = self.uploader.upload(path).await {
                failed += 1;
                warn!(path = %path.display(), %error, "artifact upload failed");
            }
        }
        if failed > 0 {
            warn!(failed, total = paths.len(), "some uploads failed");
        }
    }

    /// Polls until the process exits; a failed cycle never stops the loop.
    pub async fn run(mut self) {
        // Consumers refetch on startup even if nothing changes.
        if let Some(announcer) = &self.announcer {
            announcer.announce().await;
        }

        let mut ticker = tokio::time::interval(self.schedule.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            info!(artifact = self.pipeline.name(), "polling markers");
            self.tick().await;
        }
    }
}
