//! Sparse hash grid for efficient neighbor queries
//!
//! Agents are bucketed by `floor(position / cell_size)`. A radius query
//! only touches the cells overlapping the query square, so the average cost
//! depends on local density rather than on the total agent count.

use ahash::AHashMap;

use crate::core::types::{AgentId, Vec2};

/// Uniform-grid spatial index, rebuilt every tick from agent positions
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<(AgentId, Vec2)>>,
    len: usize,
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: AHashMap::new(),
            len: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn cell_coord(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of occupied cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn insert(&mut self, agent: AgentId, pos: Vec2) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push((agent, pos));
        self.len += 1;
    }

    /// Remove an agent previously inserted at `pos`
    pub fn remove(&mut self, agent: AgentId, pos: Vec2) -> bool {
        let coord = self.cell_coord(pos);
        let Some(cell) = self.cells.get_mut(&coord) else {
            return false;
        };
        let before = cell.len();
        cell.retain(|&(id, _)| id != agent);
        let removed = cell.len() < before;
        if cell.is_empty() {
            self.cells.remove(&coord);
        }
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Move an agent between cells when its position changed
    pub fn update(&mut self, agent: AgentId, old_pos: Vec2, new_pos: Vec2) {
        if self.remove(agent, old_pos) {
            self.insert(agent, new_pos);
        }
    }

    /// Rebuild the grid from scratch, O(n)
    pub fn rebuild(&mut self, agents: impl Iterator<Item = (AgentId, Vec2)>) {
        self.clear();
        for (agent, pos) in agents {
            self.insert(agent, pos);
        }
    }

    /// Ids of all agents with `distance(position, center) <= radius`
    ///
    /// No ordering guarantee. A negative or NaN radius yields nothing.
    pub fn query(&self, center: Vec2, radius: f32) -> Vec<AgentId> {
        let mut found = Vec::new();
        self.for_each_within(center, radius, |id, _| found.push(id));
        found
    }

    /// Like `query`, but also yields each agent's indexed position
    pub fn query_with_positions(&self, center: Vec2, radius: f32) -> Vec<(AgentId, Vec2)> {
        let mut found = Vec::new();
        self.for_each_within(center, radius, |id, pos| found.push((id, pos)));
        found
    }

    fn for_each_within<F>(&self, center: Vec2, radius: f32, mut visit: F)
    where
        F: FnMut(AgentId, Vec2),
    {
        if !(radius >= 0.0) || self.is_empty() || !center.is_finite() {
            return;
        }

        let mut check_cell = |cell: &Vec<(AgentId, Vec2)>| {
            for &(id, pos) in cell {
                if pos.distance(&center) <= radius {
                    visit(id, pos);
                }
            }
        };

        let (cx0, cy0) = self.cell_coord(Vec2::new(center.x - radius, center.y - radius));
        let (cx1, cy1) = self.cell_coord(Vec2::new(center.x + radius, center.y + radius));
        let span_x = (cx1 as i64 - cx0 as i64 + 1) as u64;
        let span_y = (cy1 as i64 - cy0 as i64 + 1) as u64;

        // Query square covers more cells than are occupied: scan occupied cells instead
        if span_x.saturating_mul(span_y) > self.cells.len() as u64 {
            for cell in self.cells.values() {
                check_cell(cell);
            }
            return;
        }

        for cy in cy0..=cy1 {
            for cx in cx0..=cx1 {
                if let Some(cell) = self.cells.get(&(cx, cy)) {
                    check_cell(cell);
                }
            }
        }
    }
}
