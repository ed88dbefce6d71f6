//! Pheromone field: stigmergic signals laid down by crawlers
//!
//! Two channels share one grid geometry. Trail marks paths toward objectives,
//! alarm marks fights in progress. Each tick every cell first evaporates
//! (multiplied by `evaporation`), then gains `diffusion / 8` of the sum of its
//! eight neighbors as they were before diffusing. Cells beyond the edge count
//! as zero and every cell stays within `[0, max_strength]`.

use serde::{Deserialize, Serialize};

use crate::core::config::PheromoneConfig;
use crate::core::types::Vec2;
use crate::spatial::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PheromoneKind {
    Trail,
    Alarm,
}

const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[derive(Debug, Clone)]
pub struct PheromoneField {
    trail: Grid<f32>,
    alarm: Grid<f32>,
    evaporation: f32,
    diffusion: f32,
    max_strength: f32,
    /// Pre-diffusion copy reused across ticks
    scratch: Vec<f32>,
}

impl PheromoneField {
    pub fn new(world_width: f32, world_height: f32, config: &PheromoneConfig) -> Self {
        let trail = Grid::covering(world_width, world_height, config.cell_size);
        let alarm = Grid::covering(world_width, world_height, config.cell_size);
        Self {
            scratch: Vec::with_capacity(trail.as_slice().len()),
            trail,
            alarm,
            evaporation: config.evaporation,
            diffusion: config.diffusion,
            max_strength: config.max_strength,
        }
    }

    pub fn width(&self) -> usize {
        self.trail.width
    }

    pub fn height(&self) -> usize {
        self.trail.height
    }

    pub fn cell_size(&self) -> f32 {
        self.trail.cell_size
    }

    pub fn grid(&self, kind: PheromoneKind) -> &Grid<f32> {
        match kind {
            PheromoneKind::Trail => &self.trail,
            PheromoneKind::Alarm => &self.alarm,
        }
    }

    fn grid_mut(&mut self, kind: PheromoneKind) -> &mut Grid<f32> {
        match kind {
            PheromoneKind::Trail => &mut self.trail,
            PheromoneKind::Alarm => &mut self.alarm,
        }
    }

    /// Add `amount` to the cell containing `position`, saturating at the cap
    ///
    /// Non-positive or non-finite amounts are ignored.
    pub fn deposit(&mut self, position: Vec2, kind: PheromoneKind, amount: f32) {
        if !(amount > 0.0) || !amount.is_finite() {
            return;
        }
        let max = self.max_strength;
        let grid = self.grid_mut(kind);
        let (x, y) = grid.world_to_cell(position);
        if let Some(cell) = grid.get_mut(x, y) {
            *cell = (*cell + amount).min(max);
        }
    }

    /// Strength of the cell containing `position`
    pub fn strength(&self, position: Vec2, kind: PheromoneKind) -> f32 {
        *self.grid(kind).sample(position)
    }

    pub fn evaporate(&mut self) {
        let rate = self.evaporation;
        for grid in [&mut self.trail, &mut self.alarm] {
            for cell in grid.as_mut_slice() {
                *cell *= rate;
            }
        }
    }

    pub fn diffuse(&mut self) {
        if self.diffusion <= 0.0 {
            return;
        }
        let share = self.diffusion / 8.0;
        let max = self.max_strength;
        for kind in [PheromoneKind::Trail, PheromoneKind::Alarm] {
            let mut before = std::mem::take(&mut self.scratch);
            before.clear();
            before.extend_from_slice(self.grid(kind).as_slice());

            let grid = self.grid_mut(kind);
            let (width, height) = (grid.width as i64, grid.height as i64);
            let cells = grid.as_mut_slice();
            for y in 0..height {
                for x in 0..width {
                    let inflow: f32 = NEIGHBOR_OFFSETS
                        .iter()
                        .filter_map(|&(dx, dy)| {
                            let (nx, ny) = (x + dx, y + dy);
                            (nx >= 0 && ny >= 0 && nx < width && ny < height)
                                .then(|| before[(ny * width + nx) as usize])
                        })
                        .sum();
                    let idx = (y * width + x) as usize;
                    cells[idx] = (before[idx] + share * inflow).clamp(0.0, max);
                }
            }
            self.scratch = before;
        }
    }

    /// One tick of field dynamics: evaporate, then diffuse
    pub fn update(&mut self) {
        self.evaporate();
        self.diffuse();
    }

    /// Unit direction toward the strongest of the eight surrounding cells
    ///
    /// Zero when no neighbor is stronger than the cell at `position`.
    pub fn sample_gradient(&self, position: Vec2, kind: PheromoneKind) -> Vec2 {
        let grid = self.grid(kind);
        let (cx, cy) = grid.world_to_cell(position);
        let center = grid.get(cx, cy).copied().unwrap_or(0.0);

        let mut best: Option<((i64, i64), f32)> = None;
        for &(dx, dy) in &NEIGHBOR_OFFSETS {
            let Some(&value) = grid.get_signed(cx as i64 + dx, cy as i64 + dy) else {
                continue;
            };
            if value > center && best.map_or(true, |(_, top)| value > top) {
                best = Some(((dx, dy), value));
            }
        }
        match best {
            Some(((dx, dy), _)) => Vec2::new(dx as f32, dy as f32).normalize(),
            None => Vec2::ZERO,
        }
    }

    /// Sum over every cell of one channel
    pub fn total_mass(&self, kind: PheromoneKind) -> f64 {
        self.grid(kind).as_slice().iter().map(|&v| v as f64).sum()
    }

    pub fn clear(&mut self) {
        self.trail.fill(0.0);
        self.alarm.fill(0.0);
    }
}
