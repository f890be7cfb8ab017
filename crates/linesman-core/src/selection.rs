//! Node selection within the path being edited.

use crate::path::{DrawnPath, NodeId, PathId};
use std::collections::BTreeSet;

/// Selected nodes, all belonging to one path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionManager {
    editing_path: Option<PathId>,
    selected: BTreeSet<NodeId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path whose nodes are selectable.
    pub fn editing_path(&self) -> Option<&PathId> {
        self.editing_path.as_ref()
    }

    /// Currently selected node ids, in id order.
    pub fn selected(&self) -> &BTreeSet<NodeId> {
        &self.selected
    }

    /// Whether a node is selected.
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.selected.contains(node_id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Switch the edited path. Changing it drops the current selection.
    pub fn set_editing_path(&mut self, path_id: Option<PathId>) {
        if self.editing_path != path_id {
            self.selected.clear();
            self.editing_path = path_id;
        }
    }

    /// Apply a click on a node. Returns whether the selection changed.
    ///
    /// Shift toggles the node and leaves the others alone. A plain click
    /// selects only this node, or clears the selection if it already was
    /// the only one.
    pub fn click_node(&mut self, path_id: &PathId, node_id: &NodeId, shift: bool) -> bool {
        let before = self.clone();
        self.set_editing_path(Some(path_id.clone()));

        if shift {
            if !self.selected.remove(node_id) {
                self.selected.insert(node_id.clone());
            }
        } else if self.selected.len() == 1 && self.selected.contains(node_id) {
            self.selected.clear();
        } else {
            self.selected.clear();
            self.selected.insert(node_id.clone());
        }

        *self != before
    }

    /// Drop the selection and the edited path.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.editing_path = None;
    }

    /// Forget nodes (or the whole edited path) that no longer exist.
    pub fn retain_existing(&mut self, paths: &[DrawnPath]) {
        let Some(path_id) = &self.editing_path else {
            return;
        };
        match paths.iter().find(|p| &p.id == path_id) {
            Some(path) => self.selected.retain(|id| path.node(id).is_some()),
            None => self.clear(),
        }
    }
}
