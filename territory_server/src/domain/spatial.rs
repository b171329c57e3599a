// Bounding-box index over markers placed in virtual space.
//
// Entities live in an arena owned by the index; the R-tree stores arena slots only. Every
// box uses the water radius regardless of marker type, so a window query over-selects and
// `SpatialIndex::window` narrows the result with a gutter of the same radius. That keeps
// markers straddling a tile seam visible on both sides without re-indexing per tile.

use rstar::{AABB, RTree, RTreeObject};

use super::coords::{GridMapper, VirtualRect};
use super::marker::Marker;

/// A marker positioned in virtual space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualEntity {
    pub virtual_x: f64,
    pub virtual_y: f64,
    /// Radius of the index box (always the water radius).
    pub index_radius: f64,
    pub marker: Marker,
}

#[derive(Debug, Clone)]
struct SlotBox {
    slot: usize,
    bounds: AABB<[f64; 2]>,
}

impl RTreeObject for SlotBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

/// Immutable index built once per generation cycle.
pub struct SpatialIndex {
    entities: Vec<VirtualEntity>,
    tree: RTree<SlotBox>,
    gutter: f64,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("entities", &self.entities.len())
            .field("gutter", &self.gutter)
            .finish_non_exhaustive()
    }
}

impl SpatialIndex {
    pub fn build(markers: &[Marker], mapper: &GridMapper) -> Self {
        let radius = mapper.water_radius();
        let entities: Vec<VirtualEntity> = markers
            .iter()
            .map(|marker| {
                let (virtual_x, virtual_y) = mapper.to_virtual(marker);
                VirtualEntity {
                    virtual_x,
                    virtual_y,
                    index_radius: radius,
                    marker: *marker,
                }
            })
            .collect();

        let boxes = entities
            .iter()
            .enumerate()
            .map(|(slot, entity)| SlotBox {
                slot,
                bounds: AABB::from_corners(
                    [entity.virtual_x - radius, entity.virtual_y - radius],
                    [entity.virtual_x + radius, entity.virtual_y + radius],
                ),
            })
            .collect();

        Self {
            entities,
            tree: RTree::bulk_load(boxes),
            gutter: radius,
        }
    }

    /// Entities whose index box intersects `area`, in ingestion order.
    pub fn query(&self, area: &VirtualRect) -> Vec<&VirtualEntity> {
        let envelope = AABB::from_corners([area.min_x, area.min_y], [area.max_x, area.max_y]);
        let mut slots: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.slot)
            .collect();
        // Stable draw and claim order regardless of tree layout.
        slots.sort_unstable();
        slots.into_iter().map(|slot| &self.entities[slot]).collect()
    }

    /// Entities that can contribute pixels to `clip`: queried with the gutter added, then
    /// filtered to centers inside the clip window grown by the gutter.
    pub fn window(&self, clip: &VirtualRect) -> Vec<&VirtualEntity> {
        let gutter = self.gutter;
        self.query(&clip.reach(gutter))
            .into_iter()
            .filter(|entity| clip.reaches(entity.virtual_x, entity.virtual_y, gutter))
            .collect()
    }
}
