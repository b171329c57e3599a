// Bounded top-N selection of owners by marker count.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use super::marker::Marker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TribeCount {
    pub owner_id: u64,
    pub count: u32,
}

// Greater means earlier on the leaderboard: higher count, then lower owner id.
impl Ord for TribeCount {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.owner_id.cmp(&self.owner_id))
    }
}

impl PartialOrd for TribeCount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Marker counts per owner for the owners accepted by `include`.
pub fn count_owners(markers: &[Marker], include: impl Fn(u64) -> bool) -> HashMap<u64, u32> {
    let mut counts = HashMap::new();
    for marker in markers.iter().filter(|marker| include(marker.owner_id)) {
        *counts.entry(marker.owner_id).or_insert(0u32) += 1;
    }
    counts
}

/// The `n` highest counts ordered by `(count desc, owner_id asc)`.
///
/// Keeps a min-heap of at most `n` entries, so the result matches a full sort on that key.
pub fn top_n(counts: &HashMap<u64, u32>, n: usize) -> Vec<TribeCount> {
    if n == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Reverse<TribeCount>> = BinaryHeap::with_capacity(n + 1);
    for (&owner_id, &count) in counts {
        heap.push(Reverse(TribeCount { owner_id, count }));
        if heap.len() > n {
            // Drop the weakest entry seen so far.
            heap.pop();
        }
    }

    // Ascending on Reverse is descending on rank.
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(entry)| entry)
        .collect()
}
