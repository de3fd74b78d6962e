//! Collision Filtering (Layer/Mask System)
//!
//! Bitmask-based filtering deciding which candidate pairs get narrow-phase
//! tested. A pair survives if *either* side scans the other:
//! `(a.mask & b.layer) != 0 || (b.mask & a.layer) != 0`. One interested
//! party is enough — the half that scans gets the response.
//!
//! On top of the bitmasks, bodies carry pairwise exceptions: if A lists B,
//! the pair is suppressed in both directions, body–body interactions only.

use crate::body::CollisionBody;

/// `true` if the layer/mask bits let the pair interact (either direction).
#[inline]
#[must_use]
pub fn scan_match(a: &CollisionBody, b: &CollisionBody) -> bool {
    (a.collision_mask & b.collision_layer) != 0 || (b.collision_mask & a.collision_layer) != 0
}

/// `true` if either body lists the other as a collision exception.
///
/// Exceptions are symmetric: one side listing the other suppresses the pair
/// entirely.
#[inline]
#[must_use]
pub fn excepted(a: &CollisionBody, b: &CollisionBody) -> bool {
    a.collision_exceptions.contains(&b.id) || b.collision_exceptions.contains(&a.id)
}

/// Predefined collision layers for common game setups.
pub mod layers {
    /// Default collision layer
    pub const DEFAULT: u32 = 1 << 0;
    /// Static geometry layer
    pub const WORLD: u32 = 1 << 1;
    /// Player layer
    pub const PLAYER: u32 = 1 << 2;
    /// Enemy layer
    pub const ENEMY: u32 = 1 << 3;
    /// Projectile layer
    pub const PROJECTILE: u32 = 1 << 4;
    /// Trigger volume layer
    pub const TRIGGER: u32 = 1 << 5;
    /// All layers combined
    pub const ALL: u32 = u32::MAX;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyId;
    use crate::math::Vec2;

    fn body(layer: u32, mask: u32) -> CollisionBody {
        CollisionBody::new_rigid(Vec2::ZERO, 1.0)
            .with_layer(layer)
            .with_mask(mask)
    }

    #[test]
    fn test_mutual_match() {
        let a = body(layers::PLAYER, layers::ENEMY);
        let b = body(layers::ENEMY, layers::PLAYER);
        assert!(scan_match(&a, &b));
    }

    #[test]
    fn test_one_way_scan_is_enough() {
        // A scans B's layer; B scans nothing. The pair still interacts.
        let a = body(layers::PLAYER, layers::WORLD);
        let b = body(layers::WORLD, 0);
        assert!(scan_match(&a, &b));
    }

    #[test]
    fn test_no_match() {
        let a = body(layers::PLAYER, layers::ENEMY);
        let b = body(layers::WORLD, layers::WORLD);
        assert!(!scan_match(&a, &b));
    }

    #[test]
    fn test_exception_is_symmetric() {
        let mut a = body(layers::ALL, layers::ALL);
        a.id = BodyId(1);
        let mut b = body(layers::ALL, layers::ALL);
        b.id = BodyId(2);
        assert!(!excepted(&a, &b));

        a.add_collision_exception(BodyId(2));
        assert!(excepted(&a, &b), "A listing B suppresses the pair");
        assert!(excepted(&b, &a), "in both directions");
    }
}
