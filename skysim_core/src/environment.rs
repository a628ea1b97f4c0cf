// skysim_core/src/environment.rs

use crate::types::Vec3;

/// A static obstacle in the flight volume. Immutable once loaded.
///
/// Cylinders stand on their base center and extend `height` along +Z,
/// matching the scenario-file convention.
#[derive(Debug, Clone, PartialEq)]
pub enum Obstacle {
    Sphere { center: Vec3, radius: f64 },
    Box { center: Vec3, half_extents: Vec3 },
    Cylinder { center: Vec3, radius: f64, height: f64 },
}

impl Obstacle {
    /// Distance from `point` to this obstacle's surface; zero inside.
    pub fn surface_distance(&self, point: &Vec3) -> f64 {
        match self {
            Obstacle::Sphere { center, radius } => ((point - center).norm() - radius).max(0.0),
            Obstacle::Box {
                center,
                half_extents,
            } => {
                let delta = point - center;
                let outside = Vec3::new(
                    (delta.x.abs() - half_extents.x).max(0.0),
                    (delta.y.abs() - half_extents.y).max(0.0),
                    (delta.z.abs() - half_extents.z).max(0.0),
                );
                outside.norm()
            }
            Obstacle::Cylinder {
                center,
                radius,
                height,
            } => {
                let radial =
                    ((point.x - center.x).powi(2) + (point.y - center.y).powi(2)).sqrt() - radius;
                let below = center.z - point.z;
                let above = point.z - (center.z + height);
                let dr = radial.max(0.0);
                let dz = below.max(above).max(0.0);
                (dr * dr + dz * dz).sqrt()
            }
        }
    }

    /// Closest intersection of the ray `origin + t * direction` with this
    /// obstacle, for `t >= 0`. `direction` must be unit length.
    pub fn ray_distance(&self, origin: &Vec3, direction: &Vec3) -> Option<f64> {
        match self {
            Obstacle::Sphere { center, radius } => {
                ray_sphere(origin, direction, center, *radius)
            }
            Obstacle::Box {
                center,
                half_extents,
            } => ray_aabb(origin, direction, &(center - half_extents), &(center + half_extents)),
            Obstacle::Cylinder {
                center,
                radius,
                height,
            } => ray_cylinder(origin, direction, center, *radius, *height),
        }
    }
}

/// The axis-aligned flight volume. Leaving it ends the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundaries {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl Boundaries {
    pub fn contains(&self, point: &Vec3) -> bool {
        point.x >= self.x_min
            && point.x <= self.x_max
            && point.y >= self.y_min
            && point.y <= self.y_max
            && point.z >= self.z_min
            && point.z <= self.z_max
    }

    /// Distance along `direction` until the ray leaves the volume, assuming
    /// `origin` is inside. `None` when the direction never reaches a face
    /// (only possible for a zero direction component on every axis).
    pub fn exit_distance(&self, origin: &Vec3, direction: &Vec3) -> Option<f64> {
        let mut t_exit = f64::INFINITY;
        for (o, d, lo, hi) in [
            (origin.x, direction.x, self.x_min, self.x_max),
            (origin.y, direction.y, self.y_min, self.y_max),
            (origin.z, direction.z, self.z_min, self.z_max),
        ] {
            if d.abs() < f64::EPSILON {
                continue;
            }
            let t = if d > 0.0 { (hi - o) / d } else { (lo - o) / d };
            if t >= 0.0 {
                t_exit = t_exit.min(t);
            }
        }
        t_exit.is_finite().then_some(t_exit)
    }
}

/// Obstacle registry plus the bounding volume.
///
/// Owned by the `Simulator` and read-shared with the sensor suite and the
/// planner. Obstacle iteration order is insertion order.
#[derive(Debug, Clone)]
pub struct Environment {
    boundaries: Boundaries,
    obstacles: Vec<Obstacle>,
}

impl Environment {
    pub fn new(boundaries: Boundaries, obstacles: Vec<Obstacle>) -> Self {
        Self {
            boundaries,
            obstacles,
        }
    }

    pub fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// True if `point` lies within `inflation` of any obstacle surface, or
    /// outside the bounding volume altogether.
    pub fn is_blocked(&self, point: &Vec3, inflation: f64) -> bool {
        if !self.boundaries.contains(point) {
            return true;
        }
        self.obstacles
            .iter()
            .any(|obstacle| obstacle.surface_distance(point) <= inflation)
    }

    /// Closest analytic hit along `direction` against all obstacles and the
    /// bounding volume, capped at `max_range`. Used for LiDAR beams.
    pub fn distance_to_nearest(&self, origin: &Vec3, direction: &Vec3, max_range: f64) -> f64 {
        let mut nearest = self
            .boundaries
            .exit_distance(origin, direction)
            .unwrap_or(max_range);
        for obstacle in &self.obstacles {
            if let Some(t) = obstacle.ray_distance(origin, direction) {
                nearest = nearest.min(t);
            }
        }
        nearest.min(max_range)
    }
}

// =========================================================================
// == Closed-form ray intersections ==
// =========================================================================

fn ray_sphere(origin: &Vec3, direction: &Vec3, center: &Vec3, radius: f64) -> Option<f64> {
    let oc = origin - center;
    let b = oc.dot(direction);
    let c = oc.dot(&oc) - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let t_near = -b - sqrt_d;
    if t_near >= 0.0 {
        return Some(t_near);
    }
    let t_far = -b + sqrt_d;
    (t_far >= 0.0).then_some(0.0) // origin is inside the sphere
}

/// Slab method. Returns the entry distance, or zero when the origin is
/// already inside the box.
fn ray_aabb(origin: &Vec3, direction: &Vec3, min: &Vec3, max: &Vec3) -> Option<f64> {
    let mut t_entry = f64::NEG_INFINITY;
    let mut t_exit = f64::INFINITY;
    for axis in 0..3 {
        let (o, d, lo, hi) = (origin[axis], direction[axis], min[axis], max[axis]);
        if d.abs() < f64::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let t0 = (lo - o) / d;
        let t1 = (hi - o) / d;
        t_entry = t_entry.max(t0.min(t1));
        t_exit = t_exit.min(t0.max(t1));
    }
    if t_entry > t_exit || t_exit < 0.0 {
        return None;
    }
    Some(t_entry.max(0.0))
}

fn ray_cylinder(
    origin: &Vec3,
    direction: &Vec3,
    base: &Vec3,
    radius: f64,
    height: f64,
) -> Option<f64> {
    let z_lo = base.z;
    let z_hi = base.z + height;
    let mut best: Option<f64> = None;
    let mut consider = |t: f64| {
        if t >= 0.0 && best.map_or(true, |b| t < b) {
            best = Some(t);
        }
    };

    // Lateral surface: quadratic in the XY projection.
    let ox = origin.x - base.x;
    let oy = origin.y - base.y;
    let a = direction.x * direction.x + direction.y * direction.y;
    if a > f64::EPSILON {
        let b = ox * direction.x + oy * direction.y;
        let c = ox * ox + oy * oy - radius * radius;
        let discriminant = b * b - a * c;
        if discriminant >= 0.0 {
            let sqrt_d = discriminant.sqrt();
            for t in [(-b - sqrt_d) / a, (-b + sqrt_d) / a] {
                let z = origin.z + t * direction.z;
                if z >= z_lo && z <= z_hi {
                    consider(t);
                }
            }
        }
    }

    // End caps.
    if direction.z.abs() > f64::EPSILON {
        for plane_z in [z_lo, z_hi] {
            let t = (plane_z - origin.z) / direction.z;
            let x = origin.x + t * direction.x - base.x;
            let y = origin.y + t * direction.y - base.y;
            if x * x + y * y <= radius * radius {
                consider(t);
            }
        }
    }

    // Origin inside the solid: report contact immediately.
    if best.is_none() {
        let inside_radial = ox * ox + oy * oy <= radius * radius;
        if inside_radial && origin.z >= z_lo && origin.z <= z_hi {
            return Some(0.0);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn test_bounds() -> Boundaries {
        Boundaries {
            x_min: -50.0,
            x_max: 50.0,
            y_min: -50.0,
            y_max: 50.0,
            z_min: 0.0,
            z_max: 20.0,
        }
    }

    #[test]
    fn sphere_surface_distance() {
        let sphere = Obstacle::Sphere {
            center: Vec3::new(0.0, 0.0, 5.0),
            radius: 2.0,
        };
        assert_abs_diff_eq!(
            sphere.surface_distance(&Vec3::new(5.0, 0.0, 5.0)),
            3.0,
            epsilon = 1e-12
        );
        // Interior points are at distance zero.
        assert_eq!(sphere.surface_distance(&Vec3::new(0.5, 0.0, 5.0)), 0.0);
    }

    #[test]
    fn box_surface_distance_uses_half_extents() {
        let bx = Obstacle::Box {
            center: Vec3::new(0.0, 0.0, 0.0),
            half_extents: Vec3::new(1.0, 2.0, 3.0),
        };
        assert_abs_diff_eq!(
            bx.surface_distance(&Vec3::new(3.0, 0.0, 0.0)),
            2.0,
            epsilon = 1e-12
        );
        // Corner distance combines all three axes.
        assert_abs_diff_eq!(
            bx.surface_distance(&Vec3::new(2.0, 3.0, 4.0)),
            (3.0f64).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn cylinder_surface_distance_caps_and_side() {
        let cyl = Obstacle::Cylinder {
            center: Vec3::new(0.0, 0.0, 0.0),
            radius: 1.0,
            height: 4.0,
        };
        assert_abs_diff_eq!(
            cyl.surface_distance(&Vec3::new(3.0, 0.0, 2.0)),
            2.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            cyl.surface_distance(&Vec3::new(0.0, 0.0, 6.0)),
            2.0,
            epsilon = 1e-12
        );
        assert_eq!(cyl.surface_distance(&Vec3::new(0.2, 0.0, 1.0)), 0.0);
    }

    #[test]
    fn blocked_respects_inflation_and_bounds() {
        let env = Environment::new(
            test_bounds(),
            vec![Obstacle::Sphere {
                center: Vec3::new(10.0, 0.0, 5.0),
                radius: 2.0,
            }],
        );
        assert!(env.is_blocked(&Vec3::new(10.0, 0.0, 5.0), 0.0));
        assert!(env.is_blocked(&Vec3::new(13.0, 0.0, 5.0), 1.5));
        assert!(!env.is_blocked(&Vec3::new(13.0, 0.0, 5.0), 0.5));
        // Outside the volume counts as blocked regardless of obstacles.
        assert!(env.is_blocked(&Vec3::new(60.0, 0.0, 5.0), 0.0));
    }

    #[test]
    fn ray_hits_sphere_head_on() {
        let env = Environment::new(
            test_bounds(),
            vec![Obstacle::Sphere {
                center: Vec3::new(10.0, 0.0, 5.0),
                radius: 2.0,
            }],
        );
        let d = env.distance_to_nearest(
            &Vec3::new(0.0, 0.0, 5.0),
            &Vec3::new(1.0, 0.0, 0.0),
            30.0,
        );
        assert_abs_diff_eq!(d, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn ray_misses_report_boundary_or_cap() {
        let env = Environment::new(test_bounds(), Vec::new());
        // Boundary at x = 50 is 40 m away from x = 10.
        let d = env.distance_to_nearest(
            &Vec3::new(10.0, 0.0, 5.0),
            &Vec3::new(1.0, 0.0, 0.0),
            100.0,
        );
        assert_abs_diff_eq!(d, 40.0, epsilon = 1e-9);
        // Capped at max_range when the boundary is further.
        let capped = env.distance_to_nearest(
            &Vec3::new(10.0, 0.0, 5.0),
            &Vec3::new(1.0, 0.0, 0.0),
            15.0,
        );
        assert_abs_diff_eq!(capped, 15.0, epsilon = 1e-9);
    }

    #[test]
    fn ray_hits_box_and_cylinder() {
        let env = Environment::new(
            test_bounds(),
            vec![
                Obstacle::Box {
                    center: Vec3::new(0.0, 10.0, 5.0),
                    half_extents: Vec3::new(2.0, 2.0, 5.0),
                },
                Obstacle::Cylinder {
                    center: Vec3::new(-10.0, 0.0, 0.0),
                    radius: 1.5,
                    height: 8.0,
                },
            ],
        );
        let to_box = env.distance_to_nearest(
            &Vec3::new(0.0, 0.0, 5.0),
            &Vec3::new(0.0, 1.0, 0.0),
            30.0,
        );
        assert_abs_diff_eq!(to_box, 8.0, epsilon = 1e-9);

        let to_cyl = env.distance_to_nearest(
            &Vec3::new(0.0, 0.0, 5.0),
            &Vec3::new(-1.0, 0.0, 0.0),
            30.0,
        );
        assert_abs_diff_eq!(to_cyl, 8.5, epsilon = 1e-9);
    }

    #[test]
    fn cylinder_cap_hit_from_above() {
        let cyl = Obstacle::Cylinder {
            center: Vec3::new(0.0, 0.0, 0.0),
            radius: 2.0,
            height: 4.0,
        };
        let t = cyl
            .ray_distance(&Vec3::new(0.0, 0.0, 10.0), &Vec3::new(0.0, 0.0, -1.0))
            .unwrap();
        assert_abs_diff_eq!(t, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn obstacle_order_is_stable() {
        let obstacles = vec![
            Obstacle::Sphere {
                center: Vec3::zeros(),
                radius: 1.0,
            },
            Obstacle::Cylinder {
                center: Vec3::new(1.0, 1.0, 0.0),
                radius: 0.5,
                height: 2.0,
            },
        ];
        let env = Environment::new(test_bounds(), obstacles.clone());
        assert_eq!(env.obstacles(), obstacles.as_slice());
    }
}
