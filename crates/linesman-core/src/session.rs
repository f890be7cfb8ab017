//! Drawing session state machine.

use crate::config::EditorConfig;
use crate::geo::LngLat;
use crate::path::{DrawnPath, LayerId, Node, PathId, PathOptions, PathShape};
use crate::storage::Storage;
use crate::store::PathStore;

/// What the user is currently drawing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrawingState {
    /// Not drawing; clicks select instead of placing.
    #[default]
    Idle,
    /// Placing the nodes of a path that does not exist yet.
    DrawingNew { active_nodes: Vec<Node> },
    /// Appending nodes to the end of an existing path.
    DrawingExtend {
        path_id: PathId,
        active_nodes: Vec<Node>,
    },
}

/// Drives node placement and commits finished paths to a [`PathStore`].
///
/// Commits that do not have enough nodes are ignored and leave the session
/// drawing, so the user can keep placing nodes.
#[derive(Debug, Clone)]
pub struct DrawingSession {
    state: DrawingState,
    color: String,
    width: f64,
    layer_id: LayerId,
}

impl Default for DrawingSession {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl DrawingSession {
    /// Create an idle session styling new paths from `config`.
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            state: DrawingState::Idle,
            color: config.default_color.clone(),
            width: config.default_width,
            layer_id: LayerId::from(config.default_layer_id.as_str()),
        }
    }

    /// Current state of the session.
    pub fn state(&self) -> &DrawingState {
        &self.state
    }

    /// Whether nodes are being placed.
    pub fn is_drawing(&self) -> bool {
        !matches!(self.state, DrawingState::Idle)
    }

    /// Nodes placed in this session, not yet committed.
    pub fn active_nodes(&self) -> &[Node] {
        match &self.state {
            DrawingState::Idle => &[],
            DrawingState::DrawingNew { active_nodes } => active_nodes,
            DrawingState::DrawingExtend { active_nodes, .. } => active_nodes,
        }
    }

    /// The path being extended, if any.
    pub fn extending(&self) -> Option<&PathId> {
        match &self.state {
            DrawingState::DrawingExtend { path_id, .. } => Some(path_id),
            _ => None,
        }
    }

    /// The path being extended, looked up in `paths`.
    pub fn extended_path<'a>(&self, paths: &'a [DrawnPath]) -> Option<&'a DrawnPath> {
        let id = self.extending()?;
        paths.iter().find(|p| &p.id == id)
    }

    /// The node a ring would close back onto: the first node of the path
    /// being extended, or the first placed node of a new path.
    pub fn root<'a>(&'a self, paths: &'a [DrawnPath]) -> Option<&'a Node> {
        match &self.state {
            DrawingState::Idle => None,
            DrawingState::DrawingNew { active_nodes } => active_nodes.first(),
            DrawingState::DrawingExtend { .. } => self.extended_path(paths).and_then(|p| p.root()),
        }
    }

    /// Nodes already stored on the path being extended.
    pub fn existing_len(&self, paths: &[DrawnPath]) -> usize {
        self.extended_path(paths).map_or(0, |p| p.len())
    }

    /// Existing plus active node count.
    pub fn total_len(&self, paths: &[DrawnPath]) -> usize {
        self.existing_len(paths) + self.active_nodes().len()
    }

    /// Begin drawing a new path.
    pub fn start(&mut self) {
        if self.is_drawing() {
            return;
        }
        log::debug!("Drawing session: Idle -> DrawingNew");
        self.state = DrawingState::DrawingNew {
            active_nodes: Vec::new(),
        };
    }

    /// Begin appending to an existing path.
    pub fn start_extend(&mut self, paths: &[DrawnPath], path_id: &PathId) {
        if self.is_drawing() || !paths.iter().any(|p| &p.id == path_id) {
            return;
        }
        log::debug!("Drawing session: Idle -> DrawingExtend({})", path_id);
        self.state = DrawingState::DrawingExtend {
            path_id: path_id.clone(),
            active_nodes: Vec::new(),
        };
    }

    /// Place a node at `coords`. Ignored while idle.
    pub fn place_node(&mut self, paths: &[DrawnPath], coords: LngLat) {
        if !self.is_drawing() {
            return;
        }
        let node = Node::new(format!("Node {}", self.total_len(paths) + 1), coords);
        match &mut self.state {
            DrawingState::Idle => {}
            DrawingState::DrawingNew { active_nodes } | DrawingState::DrawingExtend { active_nodes, .. } => {
                active_nodes.push(node)
            }
        }
    }

    /// Commit the placed nodes as an open path.
    ///
    /// A new path needs two nodes, an extension needs one.
    pub fn commit_open<S: Storage + ?Sized>(&mut self, store: &mut PathStore<S>) -> Option<PathId> {
        let enough = match &self.state {
            DrawingState::Idle => false,
            DrawingState::DrawingNew { active_nodes } => active_nodes.len() >= 2,
            DrawingState::DrawingExtend { active_nodes, .. } => !active_nodes.is_empty(),
        };
        if !enough {
            return None;
        }
        self.commit(store, Vec::new(), false)
    }

    /// Close the ring back onto the session's own root.
    ///
    /// Needs at least three nodes in total; no node is added.
    pub fn commit_closed_self<S: Storage + ?Sized>(&mut self, store: &mut PathStore<S>) -> Option<PathId> {
        if !self.is_drawing() || self.total_len(&store.paths()) < 3 {
            return None;
        }
        self.commit(store, Vec::new(), true)
    }

    /// Finish on a node of another path by adding one node at `target`.
    ///
    /// The result is closed when it reaches three nodes and open with two.
    /// A new path that would still have fewer than two nodes is not
    /// committed.
    pub fn commit_closed_connect<S: Storage + ?Sized>(
        &mut self,
        store: &mut PathStore<S>,
        target: LngLat,
    ) -> Option<PathId> {
        if !self.is_drawing() {
            return None;
        }
        let total = self.total_len(&store.paths());
        let final_len = total + 1;
        if self.extending().is_none() && final_len < 2 {
            return None;
        }
        let connector = Node::new(format!("Node {}", final_len), target);
        self.commit(store, vec![connector], final_len >= 3)
    }

    /// Abandon the session without committing anything.
    pub fn cancel(&mut self) {
        if self.is_drawing() {
            log::debug!("Drawing session cancelled with {} node(s)", self.active_nodes().len());
        }
        self.state = DrawingState::Idle;
    }

    fn commit<S: Storage + ?Sized>(
        &mut self,
        store: &mut PathStore<S>,
        extra: Vec<Node>,
        close: bool,
    ) -> Option<PathId> {
        let committed = match std::mem::take(&mut self.state) {
            DrawingState::Idle => None,
            DrawingState::DrawingNew { mut active_nodes } => {
                active_nodes.extend(extra);
                let options = PathOptions {
                    name: store.suggested_path_name(),
                    color: self.color.clone(),
                    width: self.width,
                    shape: if close { PathShape::Closed } else { PathShape::Open },
                    layer_id: self.layer_id.clone(),
                };
                store.create_path(active_nodes, options)
            }
            DrawingState::DrawingExtend {
                path_id,
                mut active_nodes,
            } => {
                if store.path(&path_id).is_none() {
                    log::debug!("Extended path {} vanished, dropping session", path_id);
                    return None;
                }
                active_nodes.extend(extra);
                store.extend_path(&path_id, active_nodes, close);
                Some(path_id)
            }
        };
        log::debug!("Drawing session committed (closed: {})", close);
        committed
    }
}
