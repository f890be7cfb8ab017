//! Authoritative path collection with persistence.

use crate::config::{EditorConfig, clamp_width};
use crate::geo::LngLat;
use crate::path::geometry::insert_subdivision;
use crate::path::{DrawnPath, LayerId, Node, NodeId, PathId, PathOptions};
use crate::storage::{Storage, decode_paths, encode_paths, load_or, save_json};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Immutable view of the path collection.
///
/// Every mutation publishes a new snapshot; holders of an older one keep
/// seeing a consistent collection.
pub type PathSnapshot = Arc<Vec<DrawnPath>>;

/// Outcome of editing one path.
enum PathEdit {
    Unchanged,
    Updated(DrawnPath),
    Deleted,
}

/// Owns the path collection and persists it after every mutation.
///
/// Lookups of unknown paths or nodes are silent no-ops that return the
/// current snapshot untouched.
pub struct PathStore<S: Storage + ?Sized> {
    storage: Arc<S>,
    paths: PathSnapshot,
    /// Monotonic count of created paths, used for default names only.
    path_counter: u64,
    paths_key: String,
    counter_key: String,
    default_layer: LayerId,
}

impl<S: Storage + ?Sized> PathStore<S> {
    /// Create an empty store without reading storage.
    pub fn new(storage: Arc<S>, config: &EditorConfig) -> Self {
        Self {
            storage,
            paths: Arc::new(Vec::new()),
            path_counter: 0,
            paths_key: config.paths_key.clone(),
            counter_key: config.path_counter_key.clone(),
            default_layer: LayerId::from(config.default_layer_id.as_str()),
        }
    }

    /// Create a store from whatever storage holds, migrating legacy records.
    pub fn load(storage: Arc<S>, config: &EditorConfig) -> Self {
        let mut store = Self::new(storage, config);

        let text: Option<String> = match store.storage.load(&store.paths_key) {
            Ok(text) => Some(text),
            Err(crate::storage::StorageError::NotFound(_)) => None,
            Err(e) => {
                log::warn!("Failed to load paths: {}", e);
                None
            }
        };
        let paths = match text.map(|t| decode_paths(&t, &store.default_layer)) {
            Some(Ok(paths)) => paths,
            Some(Err(e)) => {
                log::warn!("Discarding unreadable stored paths: {}", e);
                Vec::new()
            }
            None => Vec::new(),
        };

        let counter_default = paths.len() as u64;
        store.path_counter = load_or(&*store.storage, &store.counter_key, counter_default);
        store.paths = Arc::new(paths);
        log::info!(
            "Loaded {} path(s), path counter at {}",
            store.paths.len(),
            store.path_counter
        );
        store
    }

    /// Current snapshot of all paths, in creation order.
    pub fn paths(&self) -> PathSnapshot {
        Arc::clone(&self.paths)
    }

    /// Look up a path by id.
    pub fn path(&self, id: &PathId) -> Option<&DrawnPath> {
        self.paths.iter().find(|p| &p.id == id)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Number of paths ever created through this store (and its predecessors).
    pub fn path_counter(&self) -> u64 {
        self.path_counter
    }

    /// Default name for the next path.
    pub fn suggested_path_name(&self) -> String {
        format!("Path {}", self.path_counter + 1)
    }

    /// The layer orphaned and legacy paths fall back to.
    pub fn default_layer(&self) -> &LayerId {
        &self.default_layer
    }

    /// Paths assigned to a layer, in collection order.
    pub fn paths_in_layer<'a>(&'a self, layer: &'a LayerId) -> impl Iterator<Item = &'a DrawnPath> + 'a {
        self.paths.iter().filter(move |p| &p.layer_id == layer)
    }

    /// Add a new path. Returns `None` (and changes nothing) for fewer than
    /// two nodes.
    pub fn create_path(&mut self, nodes: Vec<Node>, options: PathOptions) -> Option<PathId> {
        if nodes.len() < 2 {
            log::debug!("Refusing to create a path with {} node(s)", nodes.len());
            return None;
        }

        let path = DrawnPath::new(nodes, options);
        let id = path.id.clone();
        log::info!(
            "Created path {} ({} nodes, {:?})",
            id,
            path.nodes.len(),
            path.shape
        );

        let mut paths = self.paths.as_ref().clone();
        paths.push(path);
        self.path_counter += 1;
        self.publish(paths);
        Some(id)
    }

    /// Append nodes to a path. It ends up closed only when `close` is set
    /// and the result has at least three nodes.
    pub fn extend_path(&mut self, id: &PathId, new_nodes: Vec<Node>, close: bool) -> PathSnapshot {
        self.edit_path(id, |path| {
            let extended = path.clone().extended(new_nodes, close);
            if &extended == path {
                PathEdit::Unchanged
            } else {
                PathEdit::Updated(extended)
            }
        })
    }

    /// Delete a path outright.
    pub fn delete_path(&mut self, id: &PathId) -> PathSnapshot {
        self.edit_path(id, |_| PathEdit::Deleted)
    }

    /// Rename a path.
    pub fn update_name(&mut self, id: &PathId, name: impl Into<String>) -> PathSnapshot {
        let name = name.into();
        self.edit_path(id, |path| {
            let mut path = path.clone();
            path.name = name;
            PathEdit::Updated(path)
        })
    }

    /// Set a path's hex color.
    pub fn update_color(&mut self, id: &PathId, color: impl Into<String>) -> PathSnapshot {
        let color = color.into();
        self.edit_path(id, |path| {
            let mut path = path.clone();
            path.color = color;
            PathEdit::Updated(path)
        })
    }

    /// Set the stroke width, clamped to the allowed range.
    pub fn update_width(&mut self, id: &PathId, width: f64) -> PathSnapshot {
        self.edit_path(id, |path| {
            let mut path = path.clone();
            path.width = clamp_width(width);
            PathEdit::Updated(path)
        })
    }

    /// Reassign a single path to another layer.
    pub fn update_layer(&mut self, id: &PathId, layer: LayerId) -> PathSnapshot {
        self.edit_path(id, |path| {
            let mut path = path.clone();
            path.layer_id = layer;
            PathEdit::Updated(path)
        })
    }

    /// Rename a node.
    pub fn update_node_name(&mut self, id: &PathId, node_id: &NodeId, name: impl Into<String>) -> PathSnapshot {
        let name = name.into();
        self.edit_node(id, node_id, |node| node.name = name)
    }

    /// Set a node's elevation in metres.
    pub fn update_node_z(&mut self, id: &PathId, node_id: &NodeId, z: f64) -> PathSnapshot {
        self.edit_node(id, node_id, |node| node.z = z)
    }

    /// Remove nodes from a path. Deletes the path if fewer than two nodes
    /// remain; a ring left with fewer than three becomes open.
    pub fn remove_nodes(&mut self, id: &PathId, node_ids: &BTreeSet<NodeId>) -> PathSnapshot {
        self.edit_path(id, |path| {
            if !path.nodes.iter().any(|n| node_ids.contains(&n.id)) {
                return PathEdit::Unchanged;
            }
            match path.clone().without_nodes(node_ids) {
                Some(trimmed) => PathEdit::Updated(trimmed),
                None => {
                    log::info!("Path {} fell below two nodes, deleting it", path.id);
                    PathEdit::Deleted
                }
            }
        })
    }

    /// Place every node in `start_coords` at its snapshot position plus
    /// `(dx, dy)`. Nodes missing from the snapshot are untouched.
    ///
    /// Positions are always derived from the snapshot, never from the
    /// current coordinates, so repeated calls with the same delta agree.
    pub fn drag_nodes(
        &mut self,
        id: &PathId,
        start_coords: &HashMap<NodeId, LngLat>,
        dx: f64,
        dy: f64,
    ) -> PathSnapshot {
        self.edit_path(id, |path| {
            let mut moved = path.clone();
            let mut changed = false;
            for node in &mut moved.nodes {
                if let Some(start) = start_coords.get(&node.id) {
                    let target = start.offset(dx, dy);
                    if node.coords != target {
                        node.coords = target;
                        changed = true;
                    }
                }
            }
            if changed {
                PathEdit::Updated(moved)
            } else {
                PathEdit::Unchanged
            }
        })
    }

    /// Insert a midpoint node on the edge between two adjacent nodes.
    pub fn subdivide_edge(&mut self, id: &PathId, a: &NodeId, b: &NodeId) -> PathSnapshot {
        self.edit_path(id, |path| {
            let result = insert_subdivision(path, a, b);
            if result.nodes.len() == path.nodes.len() {
                PathEdit::Unchanged
            } else {
                PathEdit::Updated(result)
            }
        })
    }

    pub fn toggle_path_visibility(&mut self, id: &PathId) -> PathSnapshot {
        self.edit_path(id, |path| {
            let mut path = path.clone();
            path.is_hidden = !path.is_hidden;
            PathEdit::Updated(path)
        })
    }

    /// Reassign every path on layer `from` to layer `to`. Used before a
    /// layer is removed from the registry.
    pub fn move_paths_to_layer(&mut self, from: &LayerId, to: &LayerId) -> PathSnapshot {
        if from == to || !self.paths.iter().any(|p| &p.layer_id == from) {
            return self.paths();
        }

        let paths: Vec<DrawnPath> = self
            .paths
            .iter()
            .map(|p| {
                let mut p = p.clone();
                if &p.layer_id == from {
                    p.layer_id = to.clone();
                }
                p
            })
            .collect();
        log::debug!("Moved paths from layer {} to {}", from, to);
        self.publish(paths)
    }

    fn edit_path(&mut self, id: &PathId, f: impl FnOnce(&DrawnPath) -> PathEdit) -> PathSnapshot {
        let Some(index) = self.paths.iter().position(|p| &p.id == id) else {
            return self.paths();
        };

        match f(&self.paths[index]) {
            PathEdit::Unchanged => self.paths(),
            PathEdit::Updated(path) => {
                let mut paths = self.paths.as_ref().clone();
                paths[index] = path;
                self.publish(paths)
            }
            PathEdit::Deleted => {
                let mut paths = self.paths.as_ref().clone();
                paths.remove(index);
                self.publish(paths)
            }
        }
    }

    fn edit_node(&mut self, id: &PathId, node_id: &NodeId, f: impl FnOnce(&mut Node)) -> PathSnapshot {
        self.edit_path(id, |path| {
            let mut path = path.clone();
            match path.node_mut(node_id) {
                Some(node) => {
                    f(node);
                    PathEdit::Updated(path)
                }
                None => PathEdit::Unchanged,
            }
        })
    }

    /// Swap in a new collection and write it through to storage.
    fn publish(&mut self, paths: Vec<DrawnPath>) -> PathSnapshot {
        self.paths = Arc::new(paths);
        self.persist();
        self.paths()
    }

    fn persist(&self) {
        match encode_paths(&self.paths) {
            Ok(text) => {
                if let Err(e) = self.storage.save(&self.paths_key, &text) {
                    log::warn!("Failed to save paths: {}", e);
                }
            }
            Err(e) => log::warn!("Failed to encode paths: {}", e),
        }
        if let Err(e) = save_json(&*self.storage, &self.counter_key, &self.path_counter) {
            log::warn!("Failed to save path counter: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathShape;
    use crate::path::test_support::node;
    use crate::storage::{MemoryStorage, StorageError, StorageResult};

    fn store() -> PathStore<MemoryStorage> {
        PathStore::new(Arc::new(MemoryStorage::new()), &EditorConfig::default())
    }

    fn opts(shape: PathShape, width: f64) -> PathOptions {
        PathOptions {
            name: "Feeder".to_string(),
            width,
            shape,
            ..PathOptions::default()
        }
    }

    fn three_nodes() -> Vec<Node> {
        vec![node("n1", 0.0, 0.0), node("n2", 1.0, 0.0), node("n3", 1.0, 1.0)]
    }

    fn ids(names: &[&str]) -> BTreeSet<NodeId> {
        names.iter().map(|n| NodeId::from(*n)).collect()
    }

    fn assert_invariants(paths: &[DrawnPath]) {
        for p in paths {
            assert!(p.nodes.len() >= 2, "path {} has {} nodes", p.id, p.nodes.len());
            if p.is_closed() {
                assert!(p.nodes.len() >= 3, "ring {} has {} nodes", p.id, p.nodes.len());
            }
            assert!((1.0..=20.0).contains(&p.width));
        }
    }

    #[test]
    fn test_create_path() {
        let mut s = store();
        let id = s.create_path(three_nodes(), opts(PathShape::Open, 4.0)).unwrap();
        let p = s.path(&id).unwrap();
        assert_eq!(p.nodes.len(), 3);
        assert!(!p.is_closed());
        assert_eq!(p.width, 4.0);
        assert!(!p.is_hidden);
        assert_eq!(s.path_counter(), 1);
        assert_eq!(s.suggested_path_name(), "Path 2");
    }

    #[test]
    fn test_create_rejects_single_node() {
        let mut s = store();
        assert!(s.create_path(vec![node("n1", 0.0, 0.0)], opts(PathShape::Open, 4.0)).is_none());
        assert!(s.is_empty());
        assert_eq!(s.path_counter(), 0);
    }

    #[test]
    fn test_snapshots_are_copy_on_write() {
        let mut s = store();
        let id = s.create_path(three_nodes(), opts(PathShape::Open, 4.0)).unwrap();
        let before = s.paths();
        let after = s.update_name(&id, "Renamed");
        assert_eq!(before[0].name, "Feeder");
        assert_eq!(after[0].name, "Renamed");
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut s = store();
        let id = s.create_path(three_nodes(), opts(PathShape::Open, 4.0)).unwrap();
        let before = s.paths();
        let missing = PathId::from("missing");

        assert!(Arc::ptr_eq(&before, &s.update_name(&missing, "x")));
        assert!(Arc::ptr_eq(&before, &s.extend_path(&missing, vec![node("x", 0.0, 0.0)], true)));
        assert!(Arc::ptr_eq(&before, &s.remove_nodes(&missing, &ids(&["n1"]))));
        assert!(Arc::ptr_eq(&before, &s.update_node_z(&id, &NodeId::from("nope"), 3.0)));
        assert!(Arc::ptr_eq(&before, &s.remove_nodes(&id, &ids(&["nope"]))));
        assert!(Arc::ptr_eq(&before, &s.delete_path(&missing)));
    }

    #[test]
    fn test_width_always_clamped() {
        let mut s = store();
        let id = s.create_path(three_nodes(), opts(PathShape::Open, -5.0)).unwrap();
        assert_eq!(s.path(&id).unwrap().width, 1.0);
        for (input, expected) in [(0.5, 1.0), (7.5, 7.5), (1e9, 20.0), (-1e9, 1.0), (f64::NAN, 1.0)] {
            s.update_width(&id, input);
            assert_eq!(s.path(&id).unwrap().width, expected);
        }
    }

    #[test]
    fn test_remove_nodes_auto_deletes() {
        let mut s = store();
        let id = s.create_path(three_nodes(), opts(PathShape::Open, 4.0)).unwrap();
        let paths = s.remove_nodes(&id, &ids(&["n2", "n3"]));
        assert!(paths.is_empty());
        assert!(s.path(&id).is_none());
    }

    #[test]
    fn test_remove_nodes_reopens_ring() {
        let mut s = store();
        let id = s.create_path(three_nodes(), opts(PathShape::Closed, 4.0)).unwrap();
        assert!(s.path(&id).unwrap().is_closed());
        let paths = s.remove_nodes(&id, &ids(&["n2"]));
        assert_eq!(paths[0].nodes.len(), 2);
        assert!(!paths[0].is_closed());
        assert_invariants(&paths);
    }

    #[test]
    fn test_extend_close_threshold() {
        let mut s = store();
        let id = s
            .create_path(vec![node("n1", 0.0, 0.0), node("n2", 1.0, 0.0)], opts(PathShape::Open, 4.0))
            .unwrap();
        let paths = s.extend_path(&id, vec![node("n3", 1.0, 1.0)], true);
        assert_eq!(paths[0].nodes.len(), 3);
        assert!(paths[0].is_closed());
    }

    #[test]
    fn test_extend_open_reopens_ring() {
        let mut s = store();
        let id = s.create_path(three_nodes(), opts(PathShape::Closed, 4.0)).unwrap();
        let paths = s.extend_path(&id, vec![node("n4", 0.0, 1.0)], false);
        assert_eq!(paths[0].nodes.len(), 4);
        assert!(!paths[0].is_closed());
    }

    #[test]
    fn test_drag_nodes_is_idempotent() {
        let mut s = store();
        let id = s.create_path(three_nodes(), opts(PathShape::Open, 4.0)).unwrap();
        let snapshot: HashMap<NodeId, LngLat> = [
            (NodeId::from("n1"), LngLat::new(0.0, 0.0)),
            (NodeId::from("n3"), LngLat::new(1.0, 1.0)),
        ]
        .into_iter()
        .collect();

        let once = s.drag_nodes(&id, &snapshot, 0.25, -0.5);
        let twice = s.drag_nodes(&id, &snapshot, 0.25, -0.5);
        assert_eq!(once, twice);

        let p = &twice[0];
        assert_eq!(p.nodes[0].coords, LngLat::new(0.25, -0.5));
        assert_eq!(p.nodes[1].coords, LngLat::new(1.0, 0.0));
        assert_eq!(p.nodes[2].coords, LngLat::new(1.25, 0.5));
    }

    #[test]
    fn test_drag_nodes_never_accumulates() {
        let mut s = store();
        let id = s.create_path(three_nodes(), opts(PathShape::Open, 4.0)).unwrap();
        let snapshot: HashMap<NodeId, LngLat> =
            [(NodeId::from("n2"), LngLat::new(1.0, 0.0))].into_iter().collect();

        for step in 1..=100 {
            s.drag_nodes(&id, &snapshot, step as f64 * 0.001, 0.0);
        }
        s.drag_nodes(&id, &snapshot, 0.0, 0.0);
        assert_eq!(s.path(&id).unwrap().nodes[1].coords, LngLat::new(1.0, 0.0));
    }

    #[test]
    fn test_wraparound_subdivision() {
        let mut s = store();
        let mut nodes = three_nodes();
        nodes.push(node("n4", 0.0, 1.0));
        let id = s.create_path(nodes, opts(PathShape::Closed, 4.0)).unwrap();

        let paths = s.subdivide_edge(&id, &NodeId::from("n1"), &NodeId::from("n4"));
        let p = &paths[0];
        assert_eq!(p.nodes.len(), 5);
        assert_eq!(p.nodes[4].coords, LngLat::new(0.0, 0.5));
        assert!(p.is_closed());
    }

    #[test]
    fn test_subdivide_non_adjacent_is_noop() {
        let mut s = store();
        let id = s.create_path(three_nodes(), opts(PathShape::Open, 4.0)).unwrap();
        let before = s.paths();
        let after = s.subdivide_edge(&id, &NodeId::from("n1"), &NodeId::from("n3"));
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_node_edits() {
        let mut s = store();
        let id = s.create_path(three_nodes(), opts(PathShape::Open, 4.0)).unwrap();
        s.update_node_name(&id, &NodeId::from("n2"), "Manhole 7");
        s.update_node_z(&id, &NodeId::from("n2"), -2.5);
        let node = s.path(&id).unwrap().node(&NodeId::from("n2")).unwrap().clone();
        assert_eq!(node.name, "Manhole 7");
        assert_eq!(node.z, -2.5);
    }

    #[test]
    fn test_visibility_and_layers() {
        let mut s = store();
        let a = s.create_path(three_nodes(), opts(PathShape::Open, 4.0)).unwrap();
        let b = s.create_path(three_nodes(), opts(PathShape::Open, 4.0)).unwrap();
        let water = LayerId::from("water");

        s.toggle_path_visibility(&a);
        assert!(s.path(&a).unwrap().is_hidden);
        s.toggle_path_visibility(&a);
        assert!(!s.path(&a).unwrap().is_hidden);

        s.update_layer(&a, water.clone());
        s.update_layer(&b, water.clone());
        assert_eq!(s.paths_in_layer(&water).count(), 2);

        s.move_paths_to_layer(&water, &LayerId::default_layer());
        assert_eq!(s.paths_in_layer(&water).count(), 0);
        assert_eq!(s.paths_in_layer(&LayerId::default_layer()).count(), 2);
    }

    #[test]
    fn test_persists_and_reloads() {
        let storage = Arc::new(MemoryStorage::new());
        let config = EditorConfig::default();
        let id = {
            let mut s = PathStore::new(Arc::clone(&storage), &config);
            let id = s.create_path(three_nodes(), opts(PathShape::Closed, 6.0)).unwrap();
            s.update_node_z(&id, &NodeId::from("n1"), -1.0);
            id
        };

        let reloaded = PathStore::load(storage, &config);
        let p = reloaded.path(&id).unwrap();
        assert!(p.is_closed());
        assert_eq!(p.width, 6.0);
        assert_eq!(p.nodes[0].z, -1.0);
        assert_eq!(reloaded.path_counter(), 1);
    }

    #[test]
    fn test_load_migrates_legacy_records() {
        let storage = Arc::new(MemoryStorage::new());
        let config = EditorConfig::default();
        storage
            .save(
                &config.paths_key,
                r##"[{"id": "old", "name": "Legacy", "nodes": [
                    {"id": "a", "name": "", "coords": [0, 0], "z": 0},
                    {"id": "b", "name": "", "coords": [1, 1], "z": 0}
                ], "color": "#123456", "width": 2, "isClosed": false}]"##,
            )
            .unwrap();

        let s = PathStore::load(storage, &config);
        let p = s.path(&PathId::from("old")).unwrap();
        assert_eq!(p.layer_id, LayerId::default_layer());
        assert!(!p.is_hidden);
        // Counter defaults to the number of loaded paths
        assert_eq!(s.path_counter(), 1);
    }

    #[test]
    fn test_load_from_empty_storage() {
        let s = PathStore::load(Arc::new(MemoryStorage::new()), &EditorConfig::default());
        assert!(s.is_empty());
        assert_eq!(s.path_counter(), 0);
    }

    struct FailingStorage;

    impl Storage for FailingStorage {
        fn load(&self, _key: &str) -> StorageResult<String> {
            Err(StorageError::Io("disk on fire".to_string()))
        }

        fn save(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Io("disk on fire".to_string()))
        }
    }

    #[test]
    fn test_storage_failures_do_not_block_edits() {
        let mut s = PathStore::load(Arc::new(FailingStorage), &EditorConfig::default());
        let id = s.create_path(three_nodes(), opts(PathShape::Open, 4.0)).unwrap();
        s.update_name(&id, "Still works");
        assert_eq!(s.path(&id).unwrap().name, "Still works");
    }

    #[test]
    fn test_works_with_trait_object_storage() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut s = PathStore::new(storage, &EditorConfig::default());
        assert!(s.create_path(three_nodes(), opts(PathShape::Open, 4.0)).is_some());
    }

    #[test]
    fn test_invariants_hold_through_edit_sequence() {
        let mut s = store();
        let id = s.create_path(three_nodes(), opts(PathShape::Closed, 4.0)).unwrap();
        assert_invariants(&s.subdivide_edge(&id, &NodeId::from("n1"), &NodeId::from("n3")));
        assert_invariants(&s.remove_nodes(&id, &ids(&["n1", "n2"])));
        assert_invariants(&s.extend_path(&id, vec![node("n5", 5.0, 5.0)], true));
        assert_invariants(&s.update_width(&id, 400.0));
        assert_invariants(&s.remove_nodes(&id, &ids(&["n3", "n5"])));
    }
}
