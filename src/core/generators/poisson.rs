use crate::geometry::{Point, Rect};
use crate::utils::error::{HoneycombError, Result};
use rand::Rng;
use std::f64::consts::{SQRT_2, TAU};

/// Acceleration grid may hold this many cells per allowed point.
const GRID_CELLS_PER_POINT: usize = 4;
const MIN_GRID_CELLS: usize = 4096;

/// Upper-bound estimate of the number of points a Poisson-disc fill with
/// minimum distance `radius` produces (hexagonal packing density).
pub fn estimated_points(bounds: Rect, radius: f64) -> usize {
    let area_per_point = 3f64.sqrt() / 2.0 * radius * radius;
    (bounds.area() / area_per_point).ceil() as usize
}

/// 泊松盤採樣（Bridson 演算法）
///
/// Every accepted point lies in `[min, max)` and keeps at least `radius`
/// from all others. Each active point tries `candidates` samples at a
/// distance in `[radius, 2·radius)` before it is retired.
pub fn poisson_disc_points<R: Rng + ?Sized>(
    bounds: Rect,
    radius: f64,
    candidates: u32,
    max_points: usize,
    rng: &mut R,
) -> Result<Vec<Point>> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(HoneycombError::geometry(format!(
            "Poisson radius must be positive (got {})",
            radius
        )));
    }

    let cell_size = radius / SQRT_2;
    let columns = (bounds.width() / cell_size).ceil().max(1.0);
    let rows = (bounds.height() / cell_size).ceil().max(1.0);

    // 細長邊界的面積很小，但網格可能大到無法配置
    let max_cells = max_points
        .saturating_mul(GRID_CELLS_PER_POINT)
        .max(MIN_GRID_CELLS);
    if columns * rows > max_cells as f64 {
        return Err(HoneycombError::LimitExceeded {
            message: format!(
                "Poisson grid needs {:.0} x {:.0} cells, limit is {}",
                columns, rows, max_cells
            ),
        });
    }

    let grid_width = columns as usize;
    let grid_height = rows as usize;
    let mut grid: Vec<Option<usize>> = vec![None; grid_width * grid_height];

    let cell_of = |p: &Point| -> (usize, usize) {
        let gx = ((p.x - bounds.min.x) / cell_size) as usize;
        let gy = ((p.y - bounds.min.y) / cell_size) as usize;
        (gx.min(grid_width - 1), gy.min(grid_height - 1))
    };

    let first = Point::new(
        rng.gen_range(bounds.min.x..bounds.max.x),
        rng.gen_range(bounds.min.y..bounds.max.y),
    );
    let mut points = vec![first];
    let mut active = vec![0usize];
    let (fx, fy) = cell_of(&first);
    grid[fy * grid_width + fx] = Some(0);

    while !active.is_empty() {
        let slot = rng.gen_range(0..active.len());
        let origin = points[active.swap_remove(slot)];

        for _ in 0..candidates {
            let theta = rng.gen_range(0.0..TAU);
            let r = rng.gen_range(radius..2.0 * radius);
            let candidate = Point::new(origin.x + r * theta.cos(), origin.y + r * theta.sin());

            if candidate.x < bounds.min.x
                || candidate.x >= bounds.max.x
                || candidate.y < bounds.min.y
                || candidate.y >= bounds.max.y
            {
                continue;
            }

            let (gx, gy) = cell_of(&candidate);
            let too_close = (gx.saturating_sub(2)..(gx + 3).min(grid_width)).any(|i| {
                (gy.saturating_sub(2)..(gy + 3).min(grid_height)).any(|j| {
                    grid[j * grid_width + i]
                        .map(|k| points[k].distance(&candidate) < radius)
                        .unwrap_or(false)
                })
            });
            if too_close {
                continue;
            }

            if points.len() >= max_points {
                return Err(HoneycombError::LimitExceeded {
                    message: format!("Poisson fill exceeded {} points", max_points),
                });
            }
            let index = points.len();
            points.push(candidate);
            active.push(index);
            grid[gy * grid_width + gx] = Some(index);
        }
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_minimum_distance_holds() {
        let bounds = Rect::from_size(5.0, 3.0);
        let mut rng = StdRng::seed_from_u64(9);
        let radius = 0.25;
        let points = poisson_disc_points(bounds, radius, 30, 100_000, &mut rng).unwrap();

        assert!(points.len() > 50);
        assert!(points.len() <= estimated_points(bounds, radius));
        for (i, a) in points.iter().enumerate() {
            assert!(a.x >= 0.0 && a.x < 5.0 && a.y >= 0.0 && a.y < 3.0);
            for b in &points[i + 1..] {
                assert!(a.distance(b) >= radius);
            }
        }
    }

    #[test]
    fn test_rejects_non_positive_radius() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = poisson_disc_points(Rect::from_size(1.0, 1.0), 0.0, 30, 10, &mut rng);
        assert!(matches!(result, Err(HoneycombError::GeometryError { .. })));
    }

    #[test]
    fn test_point_limit() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = poisson_disc_points(Rect::from_size(10.0, 10.0), 0.1, 30, 20, &mut rng);
        assert!(matches!(result, Err(HoneycombError::LimitExceeded { .. })));
    }

    #[test]
    fn test_skewed_boundary_rejected_before_grid_allocation() {
        let bounds = Rect::from_size(1e12, 1e-12);
        // area estimate stays small even though the grid would not fit in memory
        assert!(estimated_points(bounds, 0.05) < 1_000);

        let mut rng = StdRng::seed_from_u64(1);
        let result = poisson_disc_points(bounds, 0.05, 30, 250_000, &mut rng);
        match result {
            Err(HoneycombError::LimitExceeded { message }) => {
                assert!(message.contains("Poisson grid"), "{}", message)
            }
            other => panic!("expected grid limit, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_thin_strip_within_limits_still_fills() {
        let bounds = Rect::from_size(50.0, 0.01);
        let mut rng = StdRng::seed_from_u64(2);
        let points = poisson_disc_points(bounds, 0.05, 30, 250_000, &mut rng).unwrap();
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.y >= 0.0 && p.y < 0.01));
    }

    #[test]
    fn test_same_seed_same_points() {
        let bounds = Rect::from_size(2.0, 2.0);
        let a = poisson_disc_points(bounds, 0.2, 30, 10_000, &mut StdRng::seed_from_u64(4)).unwrap();
        let b = poisson_disc_points(bounds, 0.2, 30, 10_000, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(a, b);
    }
}
