//! Path and node data model.

pub mod geometry;

use crate::config::{DEFAULT_LAYER_ID, clamp_width};
use crate::geo::LngLat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh unique id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Borrow the raw id string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Opaque identifier of a node.
    NodeId
);
string_id!(
    /// Opaque identifier of a drawn path.
    PathId
);
string_id!(
    /// Opaque key into the external layer registry. Never validated here.
    LayerId
);

impl LayerId {
    /// The layer paths fall back to when theirs is deleted or missing.
    pub fn default_layer() -> Self {
        Self(DEFAULT_LAYER_ID.to_string())
    }
}

/// A single vertex of a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub coords: LngLat,
    /// Elevation in metres; negative means underground.
    pub z: f64,
}

impl Node {
    /// Create a node with a fresh id at ground level.
    pub fn new(name: impl Into<String>, coords: LngLat) -> Self {
        Self {
            id: NodeId::generate(),
            name: name.into(),
            coords,
            z: 0.0,
        }
    }

    /// Set the elevation.
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = z;
        self
    }
}

/// Whether a path is an open polyline or a closed ring.
///
/// A ring's closing edge (last node back to the first) is implicit; the
/// first node is never repeated at the end of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathShape {
    #[default]
    Open,
    Closed,
}

impl PathShape {
    /// The shape a path of `len` nodes may take when `closed` is requested.
    /// Rings need at least three nodes.
    pub fn for_len(closed: bool, len: usize) -> Self {
        if closed && len >= 3 {
            PathShape::Closed
        } else {
            PathShape::Open
        }
    }

    pub fn is_closed(self) -> bool {
        self == PathShape::Closed
    }
}

/// Presentation and grouping options for a new path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathOptions {
    pub name: String,
    pub color: String,
    pub width: f64,
    pub shape: PathShape,
    pub layer_id: LayerId,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: "#3388ff".to_string(),
            width: 4.0,
            shape: PathShape::Open,
            layer_id: LayerId::default_layer(),
        }
    }
}

/// A user-drawn polyline or polygon ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnPath {
    pub id: PathId,
    pub name: String,
    /// Ordered nodes; the order is geometrically significant.
    pub nodes: Vec<Node>,
    /// Hex color string.
    pub color: String,
    /// Stroke width in pixels, always within the clamped range.
    pub width: f64,
    pub shape: PathShape,
    pub layer_id: LayerId,
    pub is_hidden: bool,
}

impl DrawnPath {
    /// Build a path from nodes and options. Width is clamped and a ring
    /// request with fewer than three nodes yields an open path.
    pub fn new(nodes: Vec<Node>, options: PathOptions) -> Self {
        let shape = PathShape::for_len(options.shape.is_closed(), nodes.len());
        Self {
            id: PathId::generate(),
            name: options.name,
            nodes,
            color: options.color,
            width: clamp_width(options.width),
            shape,
            layer_id: options.layer_id,
            is_hidden: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shape.is_closed()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Look up a node by id for in-place edits.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    /// Position of a node in the ordered list.
    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| &n.id == id)
    }

    /// The node a drawing session closes back onto.
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn coords(&self) -> Vec<LngLat> {
        self.nodes.iter().map(|n| n.coords).collect()
    }

    /// Append nodes. The result is closed only if `close` is requested and
    /// the extended path has at least three nodes.
    pub fn extended(mut self, new_nodes: Vec<Node>, close: bool) -> Self {
        self.nodes.extend(new_nodes);
        self.shape = PathShape::for_len(close, self.nodes.len());
        self
    }

    /// Drop the given nodes and re-evaluate the ring shape. Returns `None`
    /// when fewer than two nodes would remain.
    pub fn without_nodes(mut self, ids: &BTreeSet<NodeId>) -> Option<Self> {
        self.nodes.retain(|n| !ids.contains(&n.id));
        if self.nodes.len() < 2 {
            return None;
        }
        self.shape = PathShape::for_len(self.shape.is_closed(), self.nodes.len());
        Some(self)
    }

    /// Where to place the path's label.
    pub fn label_position(&self) -> Option<LngLat> {
        geometry::centroid(&self.nodes)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{node, path};
    use super::*;

    #[test]
    fn test_new_clamps_width_and_shape() {
        let p = DrawnPath::new(
            vec![node("a", 0.0, 0.0), node("b", 1.0, 0.0)],
            PathOptions {
                width: 99.0,
                shape: PathShape::Closed,
                ..PathOptions::default()
            },
        );
        assert_eq!(p.width, 20.0);
        assert_eq!(p.shape, PathShape::Open);
        assert!(!p.is_hidden);
    }

    #[test]
    fn test_extend_close_threshold() {
        let two = path("p", vec![node("a", 0.0, 0.0), node("b", 1.0, 0.0)], PathShape::Open);
        let closed = two.extended(vec![node("c", 1.0, 1.0)], true);
        assert_eq!(closed.len(), 3);
        assert!(closed.is_closed());

        // A single-node base only reaches two nodes, so it stays open
        let mut one = path("q", vec![node("a", 0.0, 0.0), node("b", 1.0, 0.0)], PathShape::Open);
        one.nodes.truncate(1);
        let extended = one.extended(vec![node("c", 1.0, 1.0)], true);
        assert_eq!(extended.len(), 2);
        assert!(!extended.is_closed());
    }

    #[test]
    fn test_without_nodes_reopens_small_ring() {
        let ring = path(
            "r",
            vec![
                node("a", 0.0, 0.0),
                node("b", 1.0, 0.0),
                node("c", 1.0, 1.0),
            ],
            PathShape::Closed,
        );
        let ids: BTreeSet<NodeId> = [NodeId::from("c")].into_iter().collect();
        let trimmed = ring.without_nodes(&ids).unwrap();
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed.shape, PathShape::Open);
    }

    #[test]
    fn test_without_nodes_below_minimum() {
        let p = path(
            "p",
            vec![
                node("a", 0.0, 0.0),
                node("b", 1.0, 0.0),
                node("c", 1.0, 1.0),
            ],
            PathShape::Open,
        );
        let ids: BTreeSet<NodeId> = [NodeId::from("b"), NodeId::from("c")].into_iter().collect();
        assert!(p.without_nodes(&ids).is_none());
    }

    #[test]
    fn test_label_position() {
        let p = path(
            "p",
            vec![node("a", 0.0, 0.0), node("b", 2.0, 4.0)],
            PathShape::Open,
        );
        assert_eq!(p.label_position(), Some(LngLat::new(1.0, 2.0)));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(NodeId::generate(), NodeId::generate());
        assert_ne!(PathId::generate(), PathId::generate());
    }
}
