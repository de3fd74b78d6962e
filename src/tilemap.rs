//! Tile Collision Maps
//!
//! A secondary, simpler collision path for tile-based level geometry: a
//! sparse set of solid cells on a uniform grid, swept against axis by axis.
//! Unlike the polygon pipeline there is no narrow phase — a tile is its own
//! AABB — which makes this path cheap enough for dense level geometry.
//!
//! Maps only answer queries ([`PhysicsServer::test_body_against_map`]);
//! they never participate in the per-tick pair pass.

use core::fmt;

use rustc_hash::FxHashSet;

use crate::body::BodyId;
use crate::math::Vec2;
use crate::server::PhysicsServer;

/// Keeps exact-boundary contacts from registering as overlap.
const EDGE_EPS: f64 = 1e-9;

/// Handle to a registered collision map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MapId(pub(crate) u32);

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map#{}", self.0)
    }
}

/// Result of sweeping a box against tile maps.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MapSweep {
    /// The portion of the requested motion that is free of solid tiles.
    pub motion: Vec2,
    /// Horizontal motion was clamped by a tile.
    pub blocked_x: bool,
    /// Vertical motion was clamped by a tile.
    pub blocked_y: bool,
}

/// Sparse grid of solid tiles.
#[derive(Clone, Debug)]
pub struct CollisionMap {
    tile_size: f64,
    origin: Vec2,
    solid: FxHashSet<(i32, i32)>,
}

impl CollisionMap {
    /// Create an empty map with the given tile size and world origin.
    #[must_use]
    pub fn new(tile_size: f64, origin: Vec2) -> Self {
        Self {
            tile_size,
            origin,
            solid: FxHashSet::default(),
        }
    }

    /// Build a map from rows of tile flags (non-zero = solid). Row index is
    /// the tile Y coordinate, column index the tile X coordinate.
    #[must_use]
    pub fn from_rows(tile_size: f64, origin: Vec2, rows: &[&[u8]]) -> Self {
        let mut map = Self::new(tile_size, origin);
        for (y, row) in rows.iter().enumerate() {
            for (x, &flag) in row.iter().enumerate() {
                if flag != 0 {
                    map.solid.insert((x as i32, y as i32));
                }
            }
        }
        map
    }

    /// Mark or clear one tile.
    pub fn set_solid(&mut self, x: i32, y: i32, solid: bool) {
        if solid {
            self.solid.insert((x, y));
        } else {
            self.solid.remove(&(x, y));
        }
    }

    /// Whether a tile is solid.
    #[inline]
    #[must_use]
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.solid.contains(&(x, y))
    }

    /// Tile size in world units.
    #[inline]
    #[must_use]
    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    #[inline]
    fn tile_coord(&self, v: f64, along_y: bool) -> i32 {
        let o = if along_y { self.origin.y } else { self.origin.x };
        ((v - o) / self.tile_size).floor() as i32
    }

    /// Sweep a box `[min, max]` horizontally by `dx`. Returns the allowed
    /// displacement and whether a tile clamped it.
    pub(crate) fn sweep_x(&self, min: Vec2, max: Vec2, dx: f64) -> (f64, bool) {
        if dx == 0.0 {
            return (0.0, false);
        }
        let row0 = self.tile_coord(min.y + EDGE_EPS, true);
        let row1 = self.tile_coord(max.y - EDGE_EPS, true);

        if dx > 0.0 {
            let start = self.tile_coord(max.x - EDGE_EPS, false);
            let end = self.tile_coord(max.x + dx, false);
            for col in (start + 1)..=end {
                for row in row0..=row1 {
                    if self.is_solid(col, row) {
                        let face = self.origin.x + f64::from(col) * self.tile_size;
                        return ((face - max.x).max(0.0), true);
                    }
                }
            }
        } else {
            let start = self.tile_coord(min.x + EDGE_EPS, false);
            let end = self.tile_coord(min.x + dx, false);
            for col in (end..start).rev() {
                for row in row0..=row1 {
                    if self.is_solid(col, row) {
                        let face = self.origin.x + f64::from(col + 1) * self.tile_size;
                        return ((face - min.x).min(0.0), true);
                    }
                }
            }
        }
        (dx, false)
    }

    /// Sweep a box `[min, max]` vertically by `dy`.
    pub(crate) fn sweep_y(&self, min: Vec2, max: Vec2, dy: f64) -> (f64, bool) {
        if dy == 0.0 {
            return (0.0, false);
        }
        let col0 = self.tile_coord(min.x + EDGE_EPS, false);
        let col1 = self.tile_coord(max.x - EDGE_EPS, false);

        if dy > 0.0 {
            let start = self.tile_coord(max.y - EDGE_EPS, true);
            let end = self.tile_coord(max.y + dy, true);
            for row in (start + 1)..=end {
                for col in col0..=col1 {
                    if self.is_solid(col, row) {
                        let face = self.origin.y + f64::from(row) * self.tile_size;
                        return ((face - max.y).max(0.0), true);
                    }
                }
            }
        } else {
            let start = self.tile_coord(min.y + EDGE_EPS, true);
            let end = self.tile_coord(min.y + dy, true);
            for row in (end..start).rev() {
                for col in col0..=col1 {
                    if self.is_solid(col, row) {
                        let face = self.origin.y + f64::from(row + 1) * self.tile_size;
                        return ((face - min.y).min(0.0), true);
                    }
                }
            }
        }
        (dy, false)
    }

    /// Sweep a box by `motion`, X axis first, Y axis against the
    /// X-adjusted box.
    #[must_use]
    pub fn sweep(&self, min: Vec2, max: Vec2, motion: Vec2) -> MapSweep {
        let (dx, blocked_x) = self.sweep_x(min, max, motion.x);
        let shift = Vec2::new(dx, 0.0);
        let (dy, blocked_y) = self.sweep_y(min + shift, max + shift, motion.y);
        MapSweep {
            motion: Vec2::new(dx, dy),
            blocked_x,
            blocked_y,
        }
    }
}

impl PhysicsServer {
    /// Sweep a body's combined shape bounds through every registered
    /// collision map, clamping the motion per axis.
    ///
    /// Pure query: the body is not moved. Returns `None` for a body with no
    /// shapes (or an unknown handle).
    #[must_use]
    pub fn test_body_against_map(&self, body: BodyId, motion: Vec2) -> Option<MapSweep> {
        let (min, max) = self.body_rect(body)?;

        let mut allowed_x = motion.x;
        let mut blocked_x = false;
        for map in self.maps() {
            let (dx, bx) = map.sweep_x(min, max, allowed_x);
            allowed_x = dx;
            blocked_x |= bx;
        }

        let shift = Vec2::new(allowed_x, 0.0);
        let mut allowed_y = motion.y;
        let mut blocked_y = false;
        for map in self.maps() {
            let (dy, by) = map.sweep_y(min + shift, max + shift, allowed_y);
            allowed_y = dy;
            blocked_y |= by;
        }

        Some(MapSweep {
            motion: Vec2::new(allowed_x, allowed_y),
            blocked_x,
            blocked_y,
        })
    }

    /// Exact f64 bounds of a body's shapes.
    fn body_rect(&self, body: BodyId) -> Option<(Vec2, Vec2)> {
        let body = self.body(body)?;
        let mut min = Vec2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        let mut any = false;
        for sid in &body.shape_ids {
            if let Some(shape) = self.shapes.get(sid) {
                for v in &shape.vertices {
                    min.x = min.x.min(v.x);
                    min.y = min.y.min(v.y);
                    max.x = max.x.max(v.x);
                    max.y = max.y.max(v.y);
                    any = true;
                }
            }
        }
        any.then_some((min, max))
    }
}
