//! Values the map layer draws while a session is in progress.

use crate::geo::LngLat;
use crate::path::DrawnPath;
use crate::session::DrawingSession;
use crate::snap::SnapResult;

/// Coordinates of the in-progress line: the existing nodes of the path
/// being extended, followed by the placed nodes.
pub fn display_coords(paths: &[DrawnPath], session: &DrawingSession) -> Vec<LngLat> {
    let existing = session
        .extended_path(paths)
        .map(|p| p.coords())
        .unwrap_or_default();
    existing
        .into_iter()
        .chain(session.active_nodes().iter().map(|n| n.coords))
        .collect()
}

/// The ring that clicking would produce, when the pointer is on the root.
pub fn closing_preview(paths: &[DrawnPath], session: &DrawingSession, snap: &SnapResult) -> Option<Vec<LngLat>> {
    if !session.is_drawing() || !snap.is_self_close() {
        return None;
    }
    let mut ring = display_coords(paths, session);
    let root = *ring.first()?;
    ring.push(root);
    Some(ring)
}

/// Where the rubber-band segment starts.
pub fn ghost_line_start(paths: &[DrawnPath], session: &DrawingSession) -> Option<LngLat> {
    session
        .active_nodes()
        .last()
        .map(|n| n.coords)
        .or_else(|| session.extended_path(paths)?.nodes.last().map(|n| n.coords))
}

/// Rubber-band segment from the last placed node to the snapped pointer.
pub fn ghost_line(paths: &[DrawnPath], session: &DrawingSession, snap: &SnapResult) -> Option<(LngLat, LngLat)> {
    if !session.is_drawing() {
        return None;
    }
    ghost_line_start(paths, session).map(|start| (start, snap.coords))
}
