//! Spatial Hash Grid (Broad Phase)
//!
//! A sparse 2D grid keyed by cell coordinates. Cell size is a power of two
//! (`1 << spatial_shift` units), so mapping an integer AABB to cells is a
//! plain arithmetic shift. Shapes are inserted into every cell their AABB
//! touches; only shapes sharing a cell can become a candidate pair.
//!
//! The hash lives for exactly one tick: it is rebuilt from scratch each
//! `step`, never updated incrementally. Candidate pairs are reported at
//! insertion time against the shapes *already* in a bucket — later inserts
//! never re-report the same pair from the other side, and the server's
//! checked-pair set absorbs duplicates from shapes co-occupying several
//! cells.
//!
//! Author: Moroya Sakamoto

use rustc_hash::FxHashMap;

use crate::aabb::Aabb;
use crate::shape::ShapeId;

/// Default cell granularity: `1 << 5` = 32-unit cells.
pub const DEFAULT_SPATIAL_SHIFT: u32 = 5;

/// Sparse uniform grid over shape AABBs.
pub struct SpatialHash {
    shift: u32,
    cells: FxHashMap<(i32, i32), Vec<ShapeId>>,
}

impl SpatialHash {
    /// Create a grid with `1 << shift` sized cells. The shift is fixed for
    /// the server's lifetime.
    #[must_use]
    pub fn new(shift: u32) -> Self {
        Self {
            shift,
            cells: FxHashMap::default(),
        }
    }

    /// Cell granularity shift.
    #[inline]
    #[must_use]
    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// Empty every bucket, retaining allocated capacity for reuse.
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
    }

    /// Insert a shape into every cell its AABB touches.
    ///
    /// Shapes already present in a visited bucket are appended to
    /// `candidates` (possibly with duplicates when the pair shares several
    /// cells). Passive insertion — used for kinematic-owned shapes —
    /// registers the shape in its buckets without reporting any candidates;
    /// kinematic bodies are tested reactively through motion queries, not
    /// per tick.
    pub fn insert(
        &mut self,
        id: ShapeId,
        aabb: Aabb,
        passive: bool,
        candidates: &mut Vec<ShapeId>,
    ) {
        for cell in aabb.cell_range(self.shift).cells() {
            let bucket = self.cells.entry(cell).or_default();
            if !passive {
                for &other in bucket.iter() {
                    if other != id {
                        candidates.push(other);
                    }
                }
            }
            bucket.push(id);
        }
    }

    /// Collect every shape registered in the cells an AABB touches, without
    /// inserting anything. Used by swept motion queries.
    ///
    /// Results are sorted and deduplicated.
    pub fn query(&self, aabb: Aabb, out: &mut Vec<ShapeId>) {
        for cell in aabb.cell_range(self.shift).cells() {
            if let Some(bucket) = self.cells.get(&cell) {
                out.extend_from_slice(bucket);
            }
        }
        out.sort_unstable();
        out.dedup();
    }

    /// Number of non-empty buckets (diagnostic).
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|b| !b.is_empty()).count()
    }
}
