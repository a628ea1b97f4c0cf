// skysim_core/src/planning/grid.rs

use crate::environment::Environment;
use crate::types::Vec3;

/// A 3D index into the planning grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GridIndex {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Uniform occupancy discretization of the flight volume.
///
/// A cell is occupied when its center is blocked at the vehicle's safety
/// radius. Out-of-bounds queries count as occupied.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    resolution: f64,
    origin: Vec3,
    nx: i32,
    ny: i32,
    nz: i32,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    pub fn from_environment(
        environment: &Environment,
        resolution: f64,
        safety_radius: f64,
    ) -> Self {
        let b = environment.boundaries();
        let origin = Vec3::new(b.x_min, b.y_min, b.z_min);
        let nx = ((b.x_max - b.x_min) / resolution).ceil().max(1.0) as i32;
        let ny = ((b.y_max - b.y_min) / resolution).ceil().max(1.0) as i32;
        let nz = ((b.z_max - b.z_min) / resolution).ceil().max(1.0) as i32;

        let mut grid = Self {
            resolution,
            origin,
            nx,
            ny,
            nz,
            cells: vec![false; (nx * ny * nz) as usize],
        };
        for x in 0..nx {
            for y in 0..ny {
                for z in 0..nz {
                    let index = GridIndex { x, y, z };
                    let blocked =
                        environment.is_blocked(&grid.cell_center(index), safety_radius);
                    let flat = grid.flatten(index);
                    grid.cells[flat] = blocked;
                }
            }
        }
        grid
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn dimensions(&self) -> (i32, i32, i32) {
        (self.nx, self.ny, self.nz)
    }

    pub fn in_bounds(&self, index: GridIndex) -> bool {
        index.x >= 0
            && index.x < self.nx
            && index.y >= 0
            && index.y < self.ny
            && index.z >= 0
            && index.z < self.nz
    }

    pub fn is_occupied(&self, index: GridIndex) -> bool {
        if !self.in_bounds(index) {
            return true;
        }
        self.cells[self.flatten(index)]
    }

    /// Cell containing `point`, clamped into the grid so positions on the
    /// boundary faces map to the outermost cells.
    pub fn world_to_index(&self, point: &Vec3) -> GridIndex {
        let to_cell = |value: f64, origin: f64, count: i32| -> i32 {
            (((value - origin) / self.resolution).floor() as i32).clamp(0, count - 1)
        };
        GridIndex {
            x: to_cell(point.x, self.origin.x, self.nx),
            y: to_cell(point.y, self.origin.y, self.ny),
            z: to_cell(point.z, self.origin.z, self.nz),
        }
    }

    pub fn cell_center(&self, index: GridIndex) -> Vec3 {
        self.origin
            + Vec3::new(
                (index.x as f64 + 0.5) * self.resolution,
                (index.y as f64 + 0.5) * self.resolution,
                (index.z as f64 + 0.5) * self.resolution,
            )
    }

    fn flatten(&self, index: GridIndex) -> usize {
        ((index.x * self.ny + index.y) * self.nz + index.z) as usize
    }
}
