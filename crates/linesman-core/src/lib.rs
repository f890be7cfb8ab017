//! Linesman Core Library
//!
//! Platform-agnostic path model, drawing state machine and persistence for
//! the Linesman utility network editor.

pub mod config;
pub mod drag;
pub mod editor;
pub mod geo;
pub mod input;
pub mod path;
pub mod preview;
pub mod selection;
pub mod session;
pub mod snap;
pub mod storage;
pub mod store;

pub use config::{ConfigError, EditorConfig};
pub use drag::DragController;
pub use editor::Editor;
pub use geo::{LngLat, Projection, Viewport};
pub use input::{Key, Modifiers, PointerEvent};
pub use path::{DrawnPath, LayerId, Node, NodeId, PathId, PathOptions, PathShape};
pub use selection::SelectionManager;
pub use session::{DrawingSession, DrawingState};
pub use snap::{SnapKind, SnapResult, detect_snap, hit_test_node};
pub use storage::{MemoryStorage, Storage, StorageError, StorageResult};
pub use store::{PathSnapshot, PathStore};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
