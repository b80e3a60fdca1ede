use crate::geometry::{linspace, Point, Rect};
use rand::Rng;

/// 規則網格加上隨機抖動
///
/// Grid nodes span the full boundary (`linspace(0, W, cols)` by
/// `linspace(0, H, rows)`, row-major), each displaced per axis by
/// `(u - 0.5) * (W / cols) * strength` with `u` uniform in `[0, 1)`.
pub fn jitter_grid_points<R: Rng + ?Sized>(
    bounds: Rect,
    grid_cols: usize,
    grid_rows: usize,
    jitter_strength: f64,
    rng: &mut R,
) -> Vec<Point> {
    let xs = linspace(bounds.min.x, bounds.max.x, grid_cols);
    let ys = linspace(bounds.min.y, bounds.max.y, grid_rows);
    let max_jitter = average_cell_width(bounds, grid_cols) * jitter_strength;

    let mut points = Vec::with_capacity(xs.len() * ys.len());
    for y in &ys {
        for x in &xs {
            let dx = (rng.gen::<f64>() - 0.5) * max_jitter;
            let dy = (rng.gen::<f64>() - 0.5) * max_jitter;
            points.push(Point::new(x + dx, y + dy));
        }
    }
    points
}

pub fn average_cell_width(bounds: Rect, grid_cols: usize) -> f64 {
    bounds.width() / grid_cols.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_grid_without_jitter_hits_nodes() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = jitter_grid_points(Rect::from_size(10.0, 4.0), 3, 2, 0.0, &mut rng);
        assert_eq!(
            points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(5.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(0.0, 4.0),
                Point::new(5.0, 4.0),
                Point::new(10.0, 4.0),
            ]
        );
    }

    #[test]
    fn test_jitter_is_bounded() {
        let bounds = Rect::from_size(10.0, 10.0);
        let mut rng = StdRng::seed_from_u64(2);
        let points = jitter_grid_points(bounds, 5, 5, 1.0, &mut rng);
        let plain = jitter_grid_points(bounds, 5, 5, 0.0, &mut rng);
        // half of the average cell width
        let limit = average_cell_width(bounds, 5) / 2.0;
        for (p, q) in points.iter().zip(plain.iter()) {
            assert!((p.x - q.x).abs() <= limit);
            assert!((p.y - q.y).abs() <= limit);
        }
    }

    #[test]
    fn test_single_column_sits_at_origin() {
        let mut rng = StdRng::seed_from_u64(3);
        let points = jitter_grid_points(Rect::from_size(1.0, 1.0), 1, 1, 0.0, &mut rng);
        assert_eq!(points, vec![Point::new(0.0, 0.0)]);
    }
}
