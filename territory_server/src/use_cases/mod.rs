// Use cases layer: snapshot collection, artifact generation and the polling workers.

pub mod leaderboard;
pub mod pipeline;
pub mod publish;
pub mod snapshot;
pub mod tiles;
pub mod worker;
pub mod world_map;

pub use pipeline::{ArtifactPipeline, CycleOutcome, TilePipeline, WorldMapPipeline};
pub use snapshot::{ChangeGate, MarkerSnapshot, collect_snapshot};
pub use tiles::TileSettings;
pub use worker::{Announcer, Worker, WorkerSchedule};
pub use world_map::WorldMapSettings;
