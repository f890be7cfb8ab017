//! Persisted path records and the load-time migration.
//!
//! The stored form is decoupled from [`DrawnPath`] so older records can be
//! upgraded in one place. Version 0 is a bare array of records that may lack
//! `layerId` and `isHidden`; version 1 wraps the array in an envelope.

use crate::config::clamp_width;
use crate::geo::LngLat;
use crate::path::{DrawnPath, LayerId, Node, NodeId, PathId, PathShape};
use serde::{Deserialize, Serialize};

/// Version written by [`encode_paths`].
pub const CURRENT_VERSION: u32 = 1;

/// Stored form of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    pub coords: LngLat,
    #[serde(default)]
    pub z: f64,
}

/// Stored form of a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRecord {
    pub id: PathId,
    #[serde(default)]
    pub name: String,
    pub nodes: Vec<NodeRecord>,
    pub color: String,
    pub width: f64,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<LayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hidden: Option<bool>,
}

/// Any persisted layout of the path collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersistedPaths {
    Versioned { version: u32, paths: Vec<PathRecord> },
    Legacy(Vec<PathRecord>),
}

impl PersistedPaths {
    pub fn version(&self) -> u32 {
        match self {
            PersistedPaths::Versioned { version, .. } => *version,
            PersistedPaths::Legacy(_) => 0,
        }
    }

    fn into_records(self) -> Vec<PathRecord> {
        match self {
            PersistedPaths::Versioned { paths, .. } => paths,
            PersistedPaths::Legacy(paths) => paths,
        }
    }
}

impl From<&DrawnPath> for PathRecord {
    fn from(path: &DrawnPath) -> Self {
        Self {
            id: path.id.clone(),
            name: path.name.clone(),
            nodes: path
                .nodes
                .iter()
                .map(|n| NodeRecord {
                    id: n.id.clone(),
                    name: n.name.clone(),
                    coords: n.coords,
                    z: n.z,
                })
                .collect(),
            color: path.color.clone(),
            width: path.width,
            is_closed: path.is_closed(),
            layer_id: Some(path.layer_id.clone()),
            is_hidden: Some(path.is_hidden),
        }
    }
}

/// Upgrade a stored record to the current model.
///
/// Returns `None` for records that cannot satisfy the path invariants.
fn migrate_record(record: PathRecord, default_layer: &LayerId) -> Option<DrawnPath> {
    if record.nodes.len() < 2 {
        log::warn!(
            "Dropping stored path {} with {} node(s)",
            record.id,
            record.nodes.len()
        );
        return None;
    }

    let nodes: Vec<Node> = record
        .nodes
        .into_iter()
        .map(|n| Node {
            id: n.id,
            name: n.name,
            coords: n.coords,
            z: n.z,
        })
        .collect();
    let shape = PathShape::for_len(record.is_closed, nodes.len());

    Some(DrawnPath {
        id: record.id,
        name: record.name,
        nodes,
        color: record.color,
        width: clamp_width(record.width),
        shape,
        layer_id: record.layer_id.unwrap_or_else(|| default_layer.clone()),
        is_hidden: record.is_hidden.unwrap_or(false),
    })
}

/// Decode and migrate a stored path collection.
pub fn decode_paths(text: &str, default_layer: &LayerId) -> Result<Vec<DrawnPath>, serde_json::Error> {
    let persisted: PersistedPaths = serde_json::from_str(text)?;
    let version = persisted.version();
    if version > CURRENT_VERSION {
        log::warn!(
            "Stored paths use version {}, newer than {}; reading anyway",
            version,
            CURRENT_VERSION
        );
    }

    let records = persisted.into_records();
    let total = records.len();
    let paths: Vec<DrawnPath> = records
        .into_iter()
        .filter_map(|r| migrate_record(r, default_layer))
        .collect();

    if version < CURRENT_VERSION {
        log::info!("Migrated {} stored path(s) from version {}", paths.len(), version);
    }
    if paths.len() != total {
        log::warn!("Dropped {} malformed stored path(s)", total - paths.len());
    }
    Ok(paths)
}

/// Encode a path collection in the current format.
pub fn encode_paths(paths: &[DrawnPath]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&PersistedPaths::Versioned {
        version: CURRENT_VERSION,
        paths: paths.iter().map(PathRecord::from).collect(),
    })
}
