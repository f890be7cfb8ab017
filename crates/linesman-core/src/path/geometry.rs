//! Planar geometry helpers for paths.
//!
//! Coordinates are averaged componentwise in degrees. This is fine for the
//! short edges users draw by hand; nothing here is geodesic.

use super::{DrawnPath, Node, NodeId};
use crate::geo::LngLat;

/// Whether two nodes of `path` share an edge.
///
/// Sequential neighbours always do. On a closed ring the first and last
/// nodes also share the implicit wraparound edge.
pub fn are_adjacent(path: &DrawnPath, a: &NodeId, b: &NodeId) -> bool {
    edge_between(path, a, b).is_some()
}

/// The edge joining two nodes, if they are adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    /// Consecutive nodes; holds the lower index.
    Sequential(usize),
    /// Last node back to the first on a ring.
    Wraparound,
}

fn edge_between(path: &DrawnPath, a: &NodeId, b: &NodeId) -> Option<Edge> {
    let i = path.index_of(a)?;
    let j = path.index_of(b)?;
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    let len = path.nodes.len();

    if hi - lo == 1 {
        Some(Edge::Sequential(lo))
    } else if path.is_closed() && len >= 3 && hi - lo == len - 1 {
        Some(Edge::Wraparound)
    } else {
        None
    }
}

/// A fresh, unnamed node halfway between two others (position and elevation).
pub fn midpoint(n1: &Node, n2: &Node) -> Node {
    Node::new(
        String::new(),
        LngLat::new(
            (n1.coords.lng + n2.coords.lng) / 2.0,
            (n1.coords.lat + n2.coords.lat) / 2.0,
        ),
    )
    .with_z((n1.z + n2.z) / 2.0)
}

/// Split the edge between `a` and `b` with a midpoint node.
///
/// Returns the path unchanged if the nodes are not adjacent. A sequential
/// edge gets the midpoint right after its lower index. The wraparound edge
/// gets it appended to the end of the list, which keeps it on the closing
/// edge of the ring.
pub fn insert_subdivision(path: &DrawnPath, a: &NodeId, b: &NodeId) -> DrawnPath {
    let Some(edge) = edge_between(path, a, b) else {
        return path.clone();
    };

    let mut result = path.clone();
    match edge {
        Edge::Sequential(lo) => {
            let mid = midpoint(&path.nodes[lo], &path.nodes[lo + 1]);
            result.nodes.insert(lo + 1, mid);
        }
        Edge::Wraparound => {
            let last = path.nodes.len() - 1;
            let mid = midpoint(&path.nodes[0], &path.nodes[last]);
            result.nodes.push(mid);
        }
    }
    result
}

/// Flat arithmetic mean of the node positions, for label placement.
pub fn centroid(nodes: &[Node]) -> Option<LngLat> {
    if nodes.is_empty() {
        return None;
    }
    let n = nodes.len() as f64;
    let (lng, lat) = nodes
        .iter()
        .fold((0.0, 0.0), |(lng, lat), node| (lng + node.coords.lng, lat + node.coords.lat));
    Some(LngLat::new(lng / n, lat / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathShape;
    use crate::path::test_support::{node, path};

    fn square(shape: PathShape) -> DrawnPath {
        path(
            "sq",
            vec![
                node("a", 0.0, 0.0),
                node("b", 2.0, 0.0),
                node("c", 2.0, 2.0),
                node("d", 0.0, 2.0),
            ],
            shape,
        )
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn test_sequential_adjacency() {
        let p = square(PathShape::Open);
        assert!(are_adjacent(&p, &id("a"), &id("b")));
        assert!(are_adjacent(&p, &id("c"), &id("b")));
        assert!(!are_adjacent(&p, &id("a"), &id("c")));
        assert!(!are_adjacent(&p, &id("a"), &id("a")));
        assert!(!are_adjacent(&p, &id("a"), &id("missing")));
    }

    #[test]
    fn test_wraparound_only_on_rings() {
        assert!(!are_adjacent(&square(PathShape::Open), &id("a"), &id("d")));
        assert!(are_adjacent(&square(PathShape::Closed), &id("a"), &id("d")));
        assert!(are_adjacent(&square(PathShape::Closed), &id("d"), &id("a")));
    }

    #[test]
    fn test_midpoint() {
        let n1 = node("a", 10.0, 20.0).with_z(-2.0);
        let n2 = node("b", 12.0, 24.0).with_z(4.0);
        let mid = midpoint(&n1, &n2);
        assert_eq!(mid.coords, LngLat::new(11.0, 22.0));
        assert_eq!(mid.z, 1.0);
        assert!(mid.name.is_empty());
        assert_ne!(mid.id, n1.id);
        assert_ne!(mid.id, n2.id);
    }

    #[test]
    fn test_sequential_subdivision_inserts_after_lower_index() {
        let p = square(PathShape::Open);
        let result = insert_subdivision(&p, &id("c"), &id("b"));
        assert_eq!(result.len(), 5);
        assert_eq!(result.nodes[1].id, id("b"));
        assert_eq!(result.nodes[2].coords, LngLat::new(2.0, 1.0));
        assert_eq!(result.nodes[3].id, id("c"));
    }

    #[test]
    fn test_wraparound_subdivision_appends() {
        let p = square(PathShape::Closed);
        let result = insert_subdivision(&p, &id("a"), &id("d"));
        assert_eq!(result.len(), 5);
        assert_eq!(result.nodes[..4], p.nodes[..]);
        assert_eq!(result.nodes[4].coords, LngLat::new(0.0, 1.0));
        assert!(result.is_closed());
    }

    #[test]
    fn test_non_adjacent_subdivision_is_noop() {
        let p = square(PathShape::Closed);
        assert_eq!(insert_subdivision(&p, &id("a"), &id("c")), p);
        let open = square(PathShape::Open);
        assert_eq!(insert_subdivision(&open, &id("a"), &id("d")), open);
    }

    #[test]
    fn test_centroid() {
        let p = square(PathShape::Closed);
        assert_eq!(centroid(&p.nodes), Some(LngLat::new(1.0, 1.0)));
        assert_eq!(centroid(&[]), None);
    }
}
