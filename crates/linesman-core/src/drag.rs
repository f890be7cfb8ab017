//! Dragging one or more nodes of a path.

use crate::geo::LngLat;
use crate::path::{DrawnPath, NodeId, PathId};
use crate::selection::SelectionManager;
use crate::storage::Storage;
use crate::store::{PathSnapshot, PathStore};
use kurbo::Vec2;
use std::collections::HashMap;

/// State for moving nodes at once.
#[derive(Debug, Clone)]
pub struct DragState {
    pub path_id: PathId,
    /// Pointer position where the drag began.
    pub start_pointer: LngLat,
    /// Node positions at drag start (node_id -> original coords).
    pub start_coords: HashMap<NodeId, LngLat>,
}

impl DragState {
    /// Get the drag delta in degrees, as (dlng, dlat).
    pub fn delta(&self, pointer: LngLat) -> Vec2 {
        pointer.delta_from(self.start_pointer)
    }

    /// Ids of the nodes being moved.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.start_coords.keys()
    }
}

/// Turns pointer drags into node moves.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: Option<DragState>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&DragState> {
        self.state.as_ref()
    }

    /// Begin dragging `node_id`.
    ///
    /// Drags the whole selection when the node belongs to it, otherwise just
    /// this node. The selection itself is never changed.
    pub fn on_drag_start(
        &mut self,
        paths: &[DrawnPath],
        selection: &SelectionManager,
        path_id: &PathId,
        node_id: &NodeId,
        pointer: LngLat,
    ) {
        let Some(path) = paths.iter().find(|p| &p.id == path_id) else {
            return;
        };
        if path.node(node_id).is_none() {
            return;
        }

        let drags_selection = selection.editing_path() == Some(path_id) && selection.contains(node_id);
        let start_coords: HashMap<NodeId, LngLat> = path
            .nodes
            .iter()
            .filter(|n| {
                if drags_selection {
                    selection.contains(&n.id)
                } else {
                    &n.id == node_id
                }
            })
            .map(|n| (n.id.clone(), n.coords))
            .collect();

        log::debug!("Drag start on path {} with {} node(s)", path_id, start_coords.len());
        self.state = Some(DragState {
            path_id: path_id.clone(),
            start_pointer: pointer,
            start_coords,
        });
    }

    /// Move the dragged nodes so they follow the pointer. Always offsets the
    /// positions captured at drag start.
    pub fn on_drag<S: Storage + ?Sized>(&self, store: &mut PathStore<S>, pointer: LngLat) -> PathSnapshot {
        match &self.state {
            Some(state) => {
                let delta = state.delta(pointer);
                store.drag_nodes(&state.path_id, &state.start_coords, delta.x, delta.y)
            }
            None => store.paths(),
        }
    }

    /// Finish the drag and discard the start snapshot.
    pub fn on_drag_end(&mut self) {
        if self.state.take().is_some() {
            log::debug!("Drag end");
        }
    }
}
