// skysim_core/src/planning/mod.rs

mod astar;
mod grid;

pub use grid::{GridIndex, OccupancyGrid};

use crate::environment::Environment;
use crate::types::{Path, Vec3};

/// How far (in cells, Chebyshev) a blocked or off-grid endpoint may be
/// nudged to its nearest open cell before planning gives up.
const SNAP_RADIUS_CELLS: i32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("grid_resolution must be positive, got {0}")]
    BadResolution(f64),
    #[error("safety_radius must be non-negative, got {0}")]
    BadSafetyRadius(f64),
}

/// A* pathfinder over a uniform discretization of the flight volume.
///
/// The grid is built once at construction; each `find_path` call is a
/// one-shot, side-effect-free search. Unreachability is a normal outcome
/// (`None`), not an error, and callers choose their own recovery.
#[derive(Debug, Clone)]
pub struct GridPlanner {
    grid: OccupancyGrid,
}

impl GridPlanner {
    pub fn new(
        environment: &Environment,
        grid_resolution: f64,
        safety_radius: f64,
    ) -> Result<Self, PlanningError> {
        if !(grid_resolution > 0.0) {
            return Err(PlanningError::BadResolution(grid_resolution));
        }
        if safety_radius < 0.0 {
            return Err(PlanningError::BadSafetyRadius(safety_radius));
        }
        Ok(Self {
            grid: OccupancyGrid::from_environment(environment, grid_resolution, safety_radius),
        })
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Plans an obstacle-free waypoint sequence of cell centers from
    /// `start` to `goal`. Returns `None` when either endpoint has no open
    /// cell within the snap radius, or when no route exists.
    pub fn find_path(&self, start: &Vec3, goal: &Vec3) -> Option<Path> {
        let start_cell = self.snap_to_open(self.grid.world_to_index(start))?;
        let goal_cell = self.snap_to_open(self.grid.world_to_index(goal))?;
        let cells = astar::search(&self.grid, start_cell, goal_cell)?;
        Some(cells.into_iter().map(|c| self.grid.cell_center(c)).collect())
    }

    /// The cell itself when open, otherwise the nearest open cell within
    /// `SNAP_RADIUS_CELLS`, scanned in a fixed order for determinism.
    fn snap_to_open(&self, cell: GridIndex) -> Option<GridIndex> {
        if !self.grid.is_occupied(cell) {
            return Some(cell);
        }
        let mut best: Option<(f64, GridIndex)> = None;
        for dx in -SNAP_RADIUS_CELLS..=SNAP_RADIUS_CELLS {
            for dy in -SNAP_RADIUS_CELLS..=SNAP_RADIUS_CELLS {
                for dz in -SNAP_RADIUS_CELLS..=SNAP_RADIUS_CELLS {
                    let candidate = GridIndex {
                        x: cell.x + dx,
                        y: cell.y + dy,
                        z: cell.z + dz,
                    };
                    if self.grid.is_occupied(candidate) {
                        continue;
                    }
                    let distance_sq = (dx * dx + dy * dy + dz * dz) as f64;
                    if best.map_or(true, |(b, _)| distance_sq < b) {
                        best = Some((distance_sq, candidate));
                    }
                }
            }
        }
        best.map(|(_, cell)| cell)
    }
}
