use crate::geometry::{Point, Rect};
use rand::Rng;
use std::f64::consts::PI;

/// Spiral spacing giving one point per `cell_mm²` of area.
///
/// Point `i` sits at radius `c·sqrt(i)`, so the spiral density is
/// `1 / (π c²)` points per unit area.
pub fn spacing_for_cell(cell_mm: f64) -> f64 {
    cell_mm / PI.sqrt()
}

/// Number of spiral points needed before the spiral reaches every corner.
pub fn points_to_cover(bounds: Rect, spacing: f64) -> usize {
    let center = bounds.center();
    let max_radius = (center.x - bounds.min.x).hypot(center.y - bounds.min.y);
    (max_radius / spacing).powi(2) as usize + 1
}

/// 向日葵（費馬螺線）分佈
///
/// Spiral points outside the boundary are discarded; if more than
/// `num_points` remain a uniform random subset is kept. Optional jitter is
/// clamped back into the boundary.
pub fn sunflower_points<R: Rng + ?Sized>(
    bounds: Rect,
    num_points: usize,
    spacing: f64,
    jitter_strength: f64,
    rng: &mut R,
) -> Vec<Point> {
    let golden_ratio = (1.0 + 5f64.sqrt()) / 2.0;
    let center = bounds.center();
    let total = num_points.max(points_to_cover(bounds, spacing));

    let mut points: Vec<Point> = (0..total)
        .map(|i| {
            let r = spacing * (i as f64).sqrt();
            let theta = 2.0 * PI * i as f64 / golden_ratio;
            Point::new(center.x + r * theta.cos(), center.y + r * theta.sin())
        })
        .filter(|p| bounds.contains(p))
        .collect();

    if points.len() > num_points {
        points = rand::seq::index::sample(rng, points.len(), num_points)
            .iter()
            .map(|i| points[i])
            .collect();
    }

    if jitter_strength > 0.0 && num_points > 0 {
        let avg_dist = (bounds.area() / num_points as f64).sqrt();
        let max_jitter = avg_dist * jitter_strength;
        for p in points.iter_mut() {
            let dx = (rng.gen::<f64>() - 0.5) * max_jitter;
            let dy = (rng.gen::<f64>() - 0.5) * max_jitter;
            *p = bounds.clamp(Point::new(p.x + dx, p.y + dy));
        }
    }

    points
}
