// Top-tribes leaderboard published next to the world map.

use crate::domain::{Marker, OwnerClass, PublishError, count_owners, top_n};
use crate::use_cases::publish::publish;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopTribeEntry {
    #[serde(rename = "tribeID")]
    pub tribe_id: u64,
    pub index: usize,
    pub count: u32,
}

/// Ranks tribes (players and unclaimed markers excluded) by marker count.
pub fn top_tribes(markers: &[Marker], n: usize) -> Vec<TopTribeEntry> {
    let counts = count_owners(markers, |owner_id| OwnerClass::of(owner_id) == OwnerClass::Tribe);
    top_n(&counts, n)
        .into_iter()
        .enumerate()
        .map(|(index, entry)| TopTribeEntry {
            tribe_id: entry.owner_id,
            index,
            count: entry.count,
        })
        .collect()
}

pub fn publish_top_tribes(
    dir: &Path,
    markers: &[Marker],
    n: usize,
) -> Result<PathBuf, PublishError> {
    let entries = top_tribes(markers, n);
    publish(&dir.join("topTribes.json"), |writer| {
        serde_json::to_writer(writer, &entries)?;
        Ok(())
    })
}
