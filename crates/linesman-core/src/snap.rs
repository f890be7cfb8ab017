//! Snapping the pointer onto existing nodes while drawing.

use crate::geo::{LngLat, Projection};
use crate::path::{DrawnPath, NodeId, PathId};
use crate::session::DrawingSession;
use kurbo::Point;

/// What the pointer snapped onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapKind {
    /// The root of the path being drawn; clicking closes the ring.
    SelfClose,
    /// A node on another path; clicking finishes on that node.
    Connect { path_id: PathId, node_id: NodeId },
}

/// Result of a snap operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// Where a node would be placed.
    pub coords: LngLat,
    pub kind: Option<SnapKind>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(coords: LngLat) -> Self {
        Self { coords, kind: None }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.kind.is_some()
    }

    /// Check if the pointer is on the session's own root.
    pub fn is_self_close(&self) -> bool {
        matches!(self.kind, Some(SnapKind::SelfClose))
    }
}

/// Snap the pointer for node placement.
///
/// Closing the session's own ring takes priority over connecting to other
/// paths. Among other visible paths the first node within `radius` in
/// collection order wins, even if a later one is closer. Distances are
/// strict: a node exactly `radius` pixels away does not snap.
pub fn detect_snap<P: Projection + ?Sized>(
    pointer: Point,
    projection: &P,
    paths: &[DrawnPath],
    session: &DrawingSession,
    radius: f64,
) -> SnapResult {
    let raw = projection.unproject(pointer);
    if !session.is_drawing() {
        return SnapResult::none(raw);
    }

    if session.total_len(paths) >= 3 {
        if let Some(root) = session.root(paths) {
            if projection.screen_distance(pointer, root.coords) < radius {
                return SnapResult {
                    coords: root.coords,
                    kind: Some(SnapKind::SelfClose),
                };
            }
        }
    }

    let extending = session.extending();
    for path in paths
        .iter()
        .filter(|p| !p.is_hidden && Some(&p.id) != extending)
    {
        if let Some(node) = path
            .nodes
            .iter()
            .find(|n| projection.screen_distance(pointer, n.coords) < radius)
        {
            return SnapResult {
                coords: node.coords,
                kind: Some(SnapKind::Connect {
                    path_id: path.id.clone(),
                    node_id: node.id.clone(),
                }),
            };
        }
    }

    SnapResult::none(raw)
}

/// Find the visible node nearest the pointer, within `radius` pixels.
///
/// Unlike placement snapping this picks the closest candidate, so a node
/// under the pointer wins over a neighbour from an earlier path. Ties keep
/// the earlier node.
pub fn hit_test_node<P: Projection + ?Sized>(
    pointer: Point,
    projection: &P,
    paths: &[DrawnPath],
    radius: f64,
) -> Option<(PathId, NodeId)> {
    let mut best: Option<(f64, &DrawnPath, &NodeId)> = None;
    for path in paths.iter().filter(|p| !p.is_hidden) {
        for node in &path.nodes {
            let dist = projection.screen_distance(pointer, node.coords);
            if dist < radius && best.is_none_or(|(best_dist, _, _)| dist < best_dist) {
                best = Some((dist, path, &node.id));
            }
        }
    }
    best.map(|(_, path, node_id)| (path.id.clone(), node_id.clone()))
}
