// World snapshot (`world.map`) aggregation and binary encoding for the game client.
//
// Layout, little-endian throughout:
//
// u16 format version (2)
// u16 encoding flag (0x0001, payload is not compressed)
// u16 source resolution
// u16 destination resolution
// u32 owner count
// per owner, ascending owner id:
//     u64 owner id
//     u32 land claim count
//     u32 water claim count
//     land claims:  u16 x, u16 y
//     water claims: u16 x, u16 y

use crate::domain::{
    GridMapper, Marker, MarkerType, PixelProjection, PublishError, SpatialIndex, VirtualRect,
    WorldGeometry,
};
use crate::use_cases::publish::publish_bytes;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

pub const FORMAT_VERSION: u16 = 2;
pub const ENCODING_FLAG: u16 = 0x0001;

// Legacy packing precision baked into format version 2.
const BITS_PER_PIXEL: u32 = 32;

/// `floor(sqrt(32))`, the per-axis resolution multiplier of the snapshot.
pub fn channel_blocks_per_dimension() -> u32 {
    f64::from(BITS_PER_PIXEL).sqrt().floor() as u32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldMapSettings {
    /// In-game map resolution; written as the destination resolution.
    pub game_size: u32,
    pub geometry: WorldGeometry,
}

impl WorldMapSettings {
    /// Resolution claims are quantised to; written as the source resolution.
    pub fn source_resolution(&self) -> u32 {
        self.game_size * channel_blocks_per_dimension()
    }

    pub fn virtual_extent(&self) -> u32 {
        let servers = self.geometry.servers_x.max(self.geometry.servers_y).max(1);
        self.source_resolution() * servers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub x: u16,
    pub y: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerAggregate {
    pub owner_id: u64,
    pub land_claims: Vec<Claim>,
    pub water_claims: Vec<Claim>,
}

impl OwnerAggregate {
    fn new(owner_id: u64) -> Self {
        Self {
            owner_id,
            land_claims: Vec::new(),
            water_claims: Vec::new(),
        }
    }
}

/// Groups every marker into per-owner claim lists in source-resolution pixels, ordered by
/// ascending owner id.
pub fn aggregate_claims(markers: &[Marker], settings: &WorldMapSettings) -> Vec<OwnerAggregate> {
    let extent = settings.virtual_extent();
    let mapper = GridMapper::new(extent, &settings.geometry);
    let index = SpatialIndex::build(markers, &mapper);
    let clip = VirtualRect::square(0.0, 0.0, f64::from(extent));
    let projection = PixelProjection::new(&clip, settings.source_resolution());

    let mut owners: BTreeMap<u64, OwnerAggregate> = BTreeMap::new();
    for entity in index.window(&clip) {
        let (x, y) = projection.to_pixel(entity.virtual_x, entity.virtual_y);
        // Float-to-int casts truncate toward zero and saturate at the u16 bounds.
        let claim = Claim {
            x: x as u16,
            y: y as u16,
        };
        let owner = owners
            .entry(entity.marker.owner_id)
            .or_insert_with(|| OwnerAggregate::new(entity.marker.owner_id));
        match entity.marker.kind {
            MarkerType::Land => owner.land_claims.push(claim),
            MarkerType::Water => owner.water_claims.push(claim),
        }
    }

    owners.into_values().collect()
}

/// Serializes aggregates; they are re-sorted by owner id so callers need not pre-sort.
pub fn encode(
    source_resolution: u16,
    dest_resolution: u16,
    owners: &[OwnerAggregate],
) -> Vec<u8> {
    let claims: usize = owners
        .iter()
        .map(|owner| owner.land_claims.len() + owner.water_claims.len())
        .sum();
    let mut out = Vec::with_capacity(12 + owners.len() * 16 + claims * 4);

    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&ENCODING_FLAG.to_le_bytes());
    out.extend_from_slice(&source_resolution.to_le_bytes());
    out.extend_from_slice(&dest_resolution.to_le_bytes());
    out.extend_from_slice(&(owners.len() as u32).to_le_bytes());

    let mut sorted: Vec<&OwnerAggregate> = owners.iter().collect();
    sorted.sort_by_key(|owner| owner.owner_id);
    for owner in sorted {
        out.extend_from_slice(&owner.owner_id.to_le_bytes());
        out.extend_from_slice(&(owner.land_claims.len() as u32).to_le_bytes());
        out.extend_from_slice(&(owner.water_claims.len() as u32).to_le_bytes());
        for claim in owner.land_claims.iter().chain(&owner.water_claims) {
            out.extend_from_slice(&claim.x.to_le_bytes());
            out.extend_from_slice(&claim.y.to_le_bytes());
        }
    }

    out
}

/// Aggregates, encodes and publishes `world.map` under `dir`.
pub fn generate_world_map(
    dir: &Path,
    markers: &[Marker],
    settings: &WorldMapSettings,
) -> Result<PathBuf, PublishError> {
    let owners = aggregate_claims(markers, settings);
    // Settings validation keeps both resolutions inside u16.
    let bytes = encode(
        settings.source_resolution() as u16,
        settings.game_size as u16,
        &owners,
    );
    let path = publish_bytes(&dir.join("world.map"), &bytes)?;

    info!(owners = owners.len(), bytes = bytes.len(), "world map published");
    Ok(path)
}
