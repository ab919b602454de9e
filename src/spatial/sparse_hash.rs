//! Sparse hash grid for efficient spatial queries

use ahash::AHashMap;

use crate::core::types::{AgentId, Vec2};
use crate::spatial::SpatialQuery;

/// Sparse hash grid for radius queries over pigeons
///
/// Cells keep `(id, position)` pairs so queries can filter by exact distance
/// without reaching back into the flock.
pub struct SparseHashGrid {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<(AgentId, Vec2)>>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, agent: AgentId, pos: Vec2) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push((agent, pos));
    }

    pub fn remove(&mut self, agent: AgentId, pos: Vec2) {
        let coord = self.cell_coord(pos);
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.retain(|&(a, _)| a != agent);
        }
    }

    /// Number of agents currently indexed
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(Vec::is_empty)
    }

    /// Query all agents in the 3x3 cell neighborhood of `pos`
    pub fn query_neighbors(&self, pos: Vec2) -> impl Iterator<Item = AgentId> + '_ {
        let (cx, cy) = self.cell_coord(pos);

        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                self.cells
                    .get(&(cx + dx, cy + dy))
                    .into_iter()
                    .flatten()
                    .map(|&(agent, _)| agent)
            })
        })
    }

    /// Query agents within `radius` of `center`
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<AgentId> {
        if radius < 0.0 {
            return Vec::new();
        }

        let span = (radius / self.cell_size).ceil() as i32;
        let (cx, cy) = self.cell_coord(center);
        let mut found = Vec::new();

        for dx in -span..=span {
            for dy in -span..=span {
                if let Some(cell) = self.cells.get(&(cx + dx, cy + dy)) {
                    found.extend(
                        cell.iter()
                            .filter(|(_, pos)| center.distance(pos) <= radius)
                            .map(|&(agent, _)| agent),
                    );
                }
            }
        }

        found
    }

    /// Rebuild grid from positions
    pub fn rebuild(&mut self, agents: impl Iterator<Item = (AgentId, Vec2)>) {
        self.clear();
        for (agent, pos) in agents {
            self.insert(agent, pos);
        }
    }
}

impl SpatialQuery for SparseHashGrid {
    fn agents_within(&self, center: Vec2, radius: f32) -> Vec<AgentId> {
        self.query_radius(center, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(points: &[(u32, f32, f32)]) -> SparseHashGrid {
        let mut grid = SparseHashGrid::new(2.0);
        grid.rebuild(
            points
                .iter()
                .map(|&(id, x, y)| (AgentId(id), Vec2::new(x, y))),
        );
        grid
    }

    #[test]
    fn test_radius_query_filters_by_distance() {
        let grid = grid_with(&[(1, 0.0, 0.0), (2, 1.5, 0.0), (3, 3.0, 0.0)]);
        let mut found = grid.query_radius(Vec2::new(0.0, 0.0), 1.5);
        found.sort();
        assert_eq!(found, vec![AgentId(1), AgentId(2)]);
    }

    #[test]
    fn test_radius_larger_than_cell() {
        let grid = grid_with(&[(1, 0.0, 0.0), (2, 9.0, 0.0), (3, -7.5, -1.0)]);
        let mut found = grid.query_radius(Vec2::new(0.0, 0.0), 9.0);
        found.sort();
        assert_eq!(found, vec![AgentId(1), AgentId(2), AgentId(3)]);
    }

    #[test]
    fn test_negative_coordinates_bucket_correctly() {
        let grid = grid_with(&[(1, -0.5, -0.5)]);
        assert_eq!(grid.query_radius(Vec2::new(0.0, 0.0), 1.0), vec![AgentId(1)]);
        assert_eq!(grid.query_neighbors(Vec2::new(0.1, 0.1)).count(), 1);
    }

    #[test]
    fn test_remove_and_len() {
        let mut grid = grid_with(&[(1, 0.0, 0.0), (2, 1.0, 1.0)]);
        assert_eq!(grid.len(), 2);
        grid.remove(AgentId(1), Vec2::new(0.0, 0.0));
        assert_eq!(grid.len(), 1);
        assert!(grid.query_radius(Vec2::new(0.0, 0.0), 0.5).is_empty());
        grid.clear();
        assert!(grid.is_empty());
    }
}
