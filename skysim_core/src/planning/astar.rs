// skysim_core/src/planning/astar.rs

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use super::grid::{GridIndex, OccupancyGrid};

/// A frontier entry. Ordering is reversed for min-heap behavior: lowest f
/// first, ties broken by lower heuristic, then by discovery order so the
/// search is fully deterministic.
#[derive(Debug, Copy, Clone)]
struct FrontierItem {
    f: f64,
    h: f64,
    order: u64,
    cell: GridIndex,
}

impl Eq for FrontierItem {}
impl PartialEq for FrontierItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Ord for FrontierItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then(other.h.partial_cmp(&self.h).unwrap_or(Ordering::Equal))
            .then(other.order.cmp(&self.order))
    }
}
impl PartialOrd for FrontierItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// All 26 neighbor offsets in a fixed iteration order.
fn neighbor_offsets() -> impl Iterator<Item = (i32, i32, i32)> {
    (-1..=1).flat_map(|dx| {
        (-1..=1).flat_map(move |dy| {
            (-1..=1).filter_map(move |dz| {
                if dx == 0 && dy == 0 && dz == 0 {
                    None
                } else {
                    Some((dx, dy, dz))
                }
            })
        })
    })
}

fn euclidean(a: GridIndex, b: GridIndex, resolution: f64) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    let dz = (a.z - b.z) as f64;
    (dx * dx + dy * dy + dz * dz).sqrt() * resolution
}

/// A* over the 26-connected occupancy grid. Edge cost and heuristic are
/// both Euclidean cell-center distances, so the heuristic is admissible
/// and consistent and the returned path is optimal under this metric.
pub(crate) fn search(
    grid: &OccupancyGrid,
    start: GridIndex,
    goal: GridIndex,
) -> Option<Vec<GridIndex>> {
    let resolution = grid.resolution();
    let mut open = BinaryHeap::new();
    let mut g_score: HashMap<GridIndex, f64> = HashMap::new();
    let mut parent: HashMap<GridIndex, GridIndex> = HashMap::new();
    let mut discovery: u64 = 0;

    g_score.insert(start, 0.0);
    open.push(FrontierItem {
        f: euclidean(start, goal, resolution),
        h: euclidean(start, goal, resolution),
        order: discovery,
        cell: start,
    });

    while let Some(item) = open.pop() {
        let current = item.cell;
        let current_g = g_score[&current];
        // Stale heap entry from a previously improved route.
        if item.f > current_g + item.h + 1e-9 {
            continue;
        }
        if current == goal {
            return Some(reconstruct(&parent, current));
        }

        for (dx, dy, dz) in neighbor_offsets() {
            let neighbor = GridIndex {
                x: current.x + dx,
                y: current.y + dy,
                z: current.z + dz,
            };
            if grid.is_occupied(neighbor) {
                continue;
            }
            let tentative = current_g + euclidean(current, neighbor, resolution);
            if g_score
                .get(&neighbor)
                .map_or(true, |&known| tentative < known - 1e-12)
            {
                g_score.insert(neighbor, tentative);
                parent.insert(neighbor, current);
                discovery += 1;
                let h = euclidean(neighbor, goal, resolution);
                open.push(FrontierItem {
                    f: tentative + h,
                    h,
                    order: discovery,
                    cell: neighbor,
                });
            }
        }
    }

    None // frontier exhausted: the goal is unreachable
}

fn reconstruct(parent: &HashMap<GridIndex, GridIndex>, goal: GridIndex) -> Vec<GridIndex> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&previous) = parent.get(&current) {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}
