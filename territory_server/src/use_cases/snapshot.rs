// Marker snapshot collection across the server grid.

use crate::domain::{Fingerprint, Marker, MarkerSource, record_checksum};
use std::sync::Arc;
use tracing::warn;

/// Immutable marker set for one generation cycle, shared read-only across render tasks.
#[derive(Debug, Clone)]
pub struct MarkerSnapshot {
    pub markers: Arc<[Marker]>,
    pub fingerprint: Fingerprint,
    /// Cells dropped because the store failed or returned malformed records.
    pub skipped_cells: usize,
}

impl MarkerSnapshot {
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }
}

/// Reads every cell in `[0, servers_x) x [0, servers_y)`.
///
/// A cell that cannot be fetched, or that holds any malformed record, is skipped whole so
/// the snapshot never mixes a partial cell; the fingerprint covers accepted records only.
pub async fn collect_snapshot<S>(source: &S, servers_x: u32, servers_y: u32) -> MarkerSnapshot
where
    S: MarkerSource + ?Sized,
{
    let mut markers = Vec::new();
    let mut checksums = Vec::new();
    let mut skipped_cells = 0;

    for cell_x in 0..servers_x {
        for cell_y in 0..servers_y {
            let records = match source.fetch_cell(cell_x, cell_y).await {
                Ok(records) => records,
                Err(error) => {
                    warn!(cell_x, cell_y, %error, "marker fetch failed, skipping cell");
                    skipped_cells += 1;
                    continue;
                }
            };

            let parsed: Result<Vec<Marker>, _> = records
                .iter()
                .map(|record| Marker::from_record(cell_x, cell_y, record))
                .collect();
            match parsed {
                Ok(cell_markers) => {
                    checksums.extend(records.iter().map(|record| record_checksum(record)));
                    markers.extend(cell_markers);
                }
                Err(error) => {
                    warn!(cell_x, cell_y, %error, "malformed marker record, skipping cell");
                    skipped_cells += 1;
                }
            }
        }
    }

    MarkerSnapshot {
        markers: markers.into(),
        fingerprint: Fingerprint::from_checksums(checksums),
        skipped_cells,
    }
}

/// Remembers the last fingerprint an artifact was generated from.
#[derive(Debug, Default)]
pub struct ChangeGate {
    previous: Option<Fingerprint>,
}

impl ChangeGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_changed(&self, fingerprint: Fingerprint) -> bool {
        self.previous != Some(fingerprint)
    }

    /// Records a successful generation; failed cycles leave the gate open for a retry.
    pub fn mark_generated(&mut self, fingerprint: Fingerprint) {
        self.previous = Some(fingerprint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarkerType, SourceError, encode_record};
    use async_trait::async_trait;
    use std::collections::HashMap;

    // Fixed per-cell payloads; cells listed in `failing` return an error.
    struct FixedSource {
        cells: HashMap<(u32, u32), Vec<Vec<u8>>>,
        failing: Vec<(u32, u32)>,
    }

    #[async_trait]
    impl MarkerSource for FixedSource {
        async fn fetch_cell(&self, cell_x: u32, cell_y: u32) -> Result<Vec<Vec<u8>>, SourceError> {
            if self.failing.contains(&(cell_x, cell_y)) {
                return Err(SourceError::Unavailable("store down".to_string()));
            }
            Ok(self.cells.get(&(cell_x, cell_y)).cloned().unwrap_or_default())
        }
    }

    fn record(owner: u64, x: u16) -> Vec<u8> {
        encode_record(owner, x, 100, MarkerType::Land).to_vec()
    }

    #[tokio::test]
    async fn when_all_cells_are_readable_then_markers_carry_their_cell() {
        let source = FixedSource {
            cells: HashMap::from([
                ((0, 0), vec![record(1, 10)]),
                ((1, 1), vec![record(2, 20), record(3, 30)]),
            ]),
            failing: Vec::new(),
        };

        let snapshot = collect_snapshot(&source, 2, 2).await;

        assert_eq!(snapshot.marker_count(), 3);
        assert_eq!(snapshot.skipped_cells, 0);
        assert_eq!((snapshot.markers[1].cell_x, snapshot.markers[1].cell_y), (1, 1));
    }

    #[tokio::test]
    async fn when_a_cell_fails_then_other_cells_are_kept() {
        let source = FixedSource {
            cells: HashMap::from([((0, 0), vec![record(1, 10)]), ((0, 1), vec![record(2, 20)])]),
            failing: vec![(0, 1)],
        };

        let snapshot = collect_snapshot(&source, 1, 2).await;

        assert_eq!(snapshot.marker_count(), 1);
        assert_eq!(snapshot.skipped_cells, 1);
        assert_eq!(snapshot.markers[0].owner_id, 1);
    }

    #[tokio::test]
    async fn when_a_cell_has_a_malformed_record_then_the_whole_cell_is_skipped() {
        let mut bad = record(9, 10);
        bad[12] = 7;
        let source = FixedSource {
            cells: HashMap::from([
                ((0, 0), vec![record(1, 10), bad]),
                ((1, 0), vec![record(2, 20)]),
            ]),
            failing: Vec::new(),
        };

        let snapshot = collect_snapshot(&source, 2, 1).await;
        let clean = Fingerprint::from_records([record(2, 20).as_slice()]);

        assert_eq!(snapshot.marker_count(), 1);
        assert_eq!(snapshot.skipped_cells, 1);
        assert_eq!(snapshot.fingerprint, clean);
    }

    #[test]
    fn when_gate_is_fresh_then_any_fingerprint_counts_as_changed() {
        let mut gate = ChangeGate::new();
        let fingerprint = Fingerprint::from_checksums(vec![1, 2, 3]);

        assert!(gate.is_changed(fingerprint));
        gate.mark_generated(fingerprint);
        assert!(!gate.is_changed(fingerprint));
        assert!(gate.is_changed(Fingerprint::from_checksums(vec![1, 2])));
    }
}
