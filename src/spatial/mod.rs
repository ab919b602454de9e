//! Spatial queries over pigeon positions

pub mod sparse_hash;

pub use sparse_hash::SparseHashGrid;

use crate::core::types::{AgentId, Vec2};

/// "Agents within radius R of point P"
///
/// Result order is unspecified; callers that need a stable order sort it.
pub trait SpatialQuery {
    fn agents_within(&self, center: Vec2, radius: f32) -> Vec<AgentId>;
}
