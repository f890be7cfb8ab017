//! Routes pointer and key events to the editing components.

use crate::config::EditorConfig;
use crate::drag::DragController;
use crate::geo::{LngLat, Projection};
use crate::input::{Key, Modifiers, PointerEvent};
use crate::path::geometry::are_adjacent;
use crate::path::{LayerId, PathId};
use crate::preview;
use crate::selection::SelectionManager;
use crate::session::DrawingSession;
use crate::snap::{SnapKind, SnapResult, detect_snap, hit_test_node};
use crate::storage::Storage;
use crate::store::PathStore;
use kurbo::Point;
use std::sync::Arc;

/// The path editor: store, drawing session, selection and drag state
/// behind one event-driven interface.
pub struct Editor<S: Storage + ?Sized, P: Projection> {
    store: PathStore<S>,
    session: DrawingSession,
    selection: SelectionManager,
    drag: DragController,
    /// Snap result for the latest pointer position.
    last_snap: SnapResult,
    config: EditorConfig,
    projection: P,
}

impl<S: Storage + ?Sized, P: Projection> Editor<S, P> {
    /// Create an editor, loading any stored paths.
    pub fn new(storage: Arc<S>, projection: P, config: EditorConfig) -> Self {
        let store = PathStore::load(storage, &config);
        Self {
            store,
            session: DrawingSession::new(&config),
            selection: SelectionManager::new(),
            drag: DragController::new(),
            last_snap: SnapResult::none(LngLat::default()),
            config,
            projection,
        }
    }

    /// The path store.
    pub fn store(&self) -> &PathStore<S> {
        &self.store
    }

    /// Direct access for property edits (name, color, width, visibility).
    pub fn store_mut(&mut self) -> &mut PathStore<S> {
        &mut self.store
    }

    pub fn session(&self) -> &DrawingSession {
        &self.session
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn last_snap(&self) -> &SnapResult {
        &self.last_snap
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    /// Mutable access for panning and zooming the view.
    pub fn projection_mut(&mut self) -> &mut P {
        &mut self.projection
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Start drawing a new path.
    pub fn begin_drawing(&mut self) {
        self.selection.clear();
        self.session.start();
    }

    /// Start appending to an existing path.
    pub fn begin_extend(&mut self, path_id: &PathId) {
        self.selection.clear();
        self.session.start_extend(&self.store.paths(), path_id);
    }

    /// Dispatch a pointer event.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Click { position, modifiers } => self.click(position, modifiers),
            PointerEvent::DragStart { position } => {
                self.drag_start(position);
            }
            PointerEvent::Drag { position } => self.drag(position),
            PointerEvent::DragEnd => self.drag_end(),
        }
    }

    /// Refresh the snap result for a new pointer position.
    pub fn pointer_move(&mut self, screen: Point) {
        let snap = self.snap_at(screen);
        if snap.kind != self.last_snap.kind {
            log::debug!("Snap changed to {:?}", snap.kind);
        }
        self.last_snap = snap;
    }

    /// Place a node, finish a path, or select a node.
    pub fn click(&mut self, screen: Point, modifiers: Modifiers) {
        if !self.session.is_drawing() {
            self.select_at(screen, modifiers);
            return;
        }

        self.pointer_move(screen);
        match self.last_snap.kind.clone() {
            Some(SnapKind::SelfClose) => {
                self.session.commit_closed_self(&mut self.store);
            }
            Some(SnapKind::Connect { path_id, node_id }) => {
                let target = self
                    .store
                    .path(&path_id)
                    .and_then(|p| p.node(&node_id))
                    .map(|n| n.coords);
                if let Some(target) = target {
                    let committed = self.session.commit_closed_connect(&mut self.store, target);
                    // Too few nodes to finish: the snapped node starts the line instead
                    if committed.is_none() && self.session.is_drawing() {
                        let paths = self.store.paths();
                        self.session.place_node(&paths, target);
                    }
                }
            }
            None => {
                let paths = self.store.paths();
                self.session.place_node(&paths, self.last_snap.coords);
            }
        }

        if !self.session.is_drawing() {
            self.pointer_move(screen);
        }
    }

    fn select_at(&mut self, screen: Point, modifiers: Modifiers) {
        let paths = self.store.paths();
        match hit_test_node(screen, &self.projection, &paths, self.config.snap_radius_px) {
            Some((path_id, node_id)) => {
                self.selection.click_node(&path_id, &node_id, modifiers.shift);
            }
            None => self.selection.clear(),
        }
    }

    /// Begin dragging the node under the pointer. Returns whether a drag
    /// started, so the host can pan the map otherwise.
    pub fn drag_start(&mut self, screen: Point) -> bool {
        if self.session.is_drawing() {
            return false;
        }
        let paths = self.store.paths();
        let Some((path_id, node_id)) = hit_test_node(screen, &self.projection, &paths, self.config.snap_radius_px)
        else {
            return false;
        };
        let pointer = self.projection.unproject(screen);
        self.drag
            .on_drag_start(&paths, &self.selection, &path_id, &node_id, pointer);
        self.drag.is_dragging()
    }

    /// Move the dragged nodes to follow the pointer.
    pub fn drag(&mut self, screen: Point) {
        if self.drag.is_dragging() {
            let pointer = self.projection.unproject(screen);
            self.drag.on_drag(&mut self.store, pointer);
        }
    }

    /// Finish the current drag.
    pub fn drag_end(&mut self) {
        self.drag.on_drag_end();
    }

    /// Apply a key command.
    pub fn key(&mut self, key: Key) {
        match key {
            Key::Escape => self.session.cancel(),
            Key::Enter => {
                self.session.commit_open(&mut self.store);
            }
            Key::Delete | Key::Backspace => self.delete_selected_nodes(),
            Key::Subdivide => self.subdivide_selected(),
        }
    }

    fn delete_selected_nodes(&mut self) {
        if self.session.is_drawing() || self.selection.is_empty() {
            return;
        }
        let Some(path_id) = self.selection.editing_path().cloned() else {
            return;
        };
        let paths = self.store.remove_nodes(&path_id, self.selection.selected());
        self.selection.retain_existing(&paths);
    }

    fn subdivide_selected(&mut self) {
        if self.selection.len() != 2 {
            return;
        }
        let Some(path_id) = self.selection.editing_path().cloned() else {
            return;
        };
        let mut ids = self.selection.selected().iter();
        let (Some(a), Some(b)) = (ids.next(), ids.next()) else {
            return;
        };
        let adjacent = self
            .store
            .path(&path_id)
            .is_some_and(|p| are_adjacent(p, a, b));
        if adjacent {
            let (a, b) = (a.clone(), b.clone());
            self.store.subdivide_edge(&path_id, &a, &b);
        }
    }

    /// Delete a path and drop it from the selection.
    pub fn delete_path(&mut self, path_id: &PathId) {
        if self.session.extending() == Some(path_id) {
            self.session.cancel();
        }
        let paths = self.store.delete_path(path_id);
        self.selection.retain_existing(&paths);
    }

    /// Move the paths of a removed layer onto the default layer.
    pub fn layer_deleted(&mut self, layer: &LayerId) {
        let fallback = self.store.default_layer().clone();
        self.store.move_paths_to_layer(layer, &fallback);
    }

    /// Coordinates of the line being drawn.
    pub fn display_coords(&self) -> Vec<LngLat> {
        preview::display_coords(&self.store.paths(), &self.session)
    }

    pub fn closing_preview(&self) -> Option<Vec<LngLat>> {
        preview::closing_preview(&self.store.paths(), &self.session, &self.last_snap)
    }

    pub fn ghost_line(&self) -> Option<(LngLat, LngLat)> {
        preview::ghost_line(&self.store.paths(), &self.session, &self.last_snap)
    }

    fn snap_at(&self, screen: Point) -> SnapResult {
        detect_snap(
            screen,
            &self.projection,
            &self.store.paths(),
            &self.session,
            self.config.snap_radius_px,
        )
    }
}
