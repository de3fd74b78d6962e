//! Area Trigger Events
//!
//! Areas track which areas and bodies they touch each tick; diffing against
//! the previous tick's sets synthesizes enter/exit events. Enter fires the
//! moment an overlap is recorded for a counterpart absent from the previous
//! tick (first contact of an episode — an object still touching next tick
//! does not refire). Exit fires at end of tick for counterparts present
//! before and absent now.
//!
//! Events queue on the server and are drained by the caller after `step`;
//! the scene layer turns them into user-facing signals.

use crate::body::{BodyId, CollisionBody};

/// What happened at an area boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AreaEventKind {
    /// Another area started overlapping this area.
    AreaEntered,
    /// An overlapping area stopped overlapping.
    AreaExited,
    /// A body started overlapping this area.
    BodyEntered,
    /// An overlapping body stopped overlapping.
    BodyExited,
}

/// One enter/exit occurrence on an area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AreaEvent {
    /// The area whose boundary was crossed.
    pub area: BodyId,
    /// The counterpart that crossed it.
    pub other: BodyId,
    /// Enter or exit, area or body.
    pub kind: AreaEventKind,
}

/// Record an area-area overlap on `area` for this tick.
///
/// Fires `AreaEntered` when `other` was not touching on the previous tick.
/// Multiple shape pairs of the same two bodies collapse to one entry.
pub(crate) fn record_area_overlap(
    area: &mut CollisionBody,
    other: BodyId,
    events: &mut Vec<AreaEvent>,
) {
    if area.touched_areas.contains(&other) {
        return;
    }
    area.touched_areas.push(other);
    if !area.prev_touched_areas.contains(&other) {
        events.push(AreaEvent {
            area: area.id,
            other,
            kind: AreaEventKind::AreaEntered,
        });
    }
}

/// Record an area-body overlap on `area` for this tick.
///
/// Directional: only the area's sets and signals are involved, never the
/// body's.
pub(crate) fn record_body_overlap(
    area: &mut CollisionBody,
    other: BodyId,
    events: &mut Vec<AreaEvent>,
) {
    if area.touched_bodies.contains(&other) {
        return;
    }
    area.touched_bodies.push(other);
    if !area.prev_touched_bodies.contains(&other) {
        events.push(AreaEvent {
            area: area.id,
            other,
            kind: AreaEventKind::BodyEntered,
        });
    }
}

/// Emit exit events for counterparts that were touching last tick and are
/// gone now. Called once per area at end of tick.
pub(crate) fn emit_exit_events(area: &CollisionBody, events: &mut Vec<AreaEvent>) {
    for &other in &area.prev_touched_areas {
        if !area.touched_areas.contains(&other) {
            events.push(AreaEvent {
                area: area.id,
                other,
                kind: AreaEventKind::AreaExited,
            });
        }
    }
    for &other in &area.prev_touched_bodies {
        if !area.touched_bodies.contains(&other) {
            events.push(AreaEvent {
                area: area.id,
                other,
                kind: AreaEventKind::BodyExited,
            });
        }
    }
}
