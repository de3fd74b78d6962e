//! Physics Error Types
//!
//! Unified error type for registration- and construction-time failures
//! (degenerate shapes, unknown handles, duplicate maps). The tick itself
//! never fails: `step` runs to completion and surfaces detected invariant
//! violations through the `log` facade instead.

use crate::body::BodyId;
use crate::shape::ShapeId;
use crate::tilemap::MapId;

/// Unified error type for physics operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PhysicsError {
    /// A convex polygon needs at least 3 vertices.
    #[error("convex polygon needs at least 3 vertices (got {got})")]
    DegenerateShape {
        /// Number of vertices that were provided
        got: usize,
    },
    /// A non-finite (NaN/infinite) value was provided where geometry is required.
    #[error("non-finite value in {context}")]
    NonFinite {
        /// Context describing where the non-finite value was encountered
        context: &'static str,
    },
    /// The body handle does not refer to a live body.
    #[error("body {0} is not registered")]
    UnknownBody(BodyId),
    /// The shape handle does not refer to a live shape.
    #[error("shape {0} is not registered")]
    UnknownShape(ShapeId),
    /// The collision map handle does not refer to a registered map.
    #[error("collision map {0} is not registered")]
    UnknownMap(MapId),
    /// The operation is only valid on a body of a different kind.
    #[error("operation requires a {expected} body")]
    WrongBodyKind {
        /// The body kind the operation requires
        expected: &'static str,
    },
}
