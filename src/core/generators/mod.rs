//! Point distributions that seed the Voronoi patterns.

pub mod jitter_grid;
pub mod poisson;
pub mod sunflower;

pub use jitter_grid::jitter_grid_points;
pub use poisson::poisson_disc_points;
pub use sunflower::sunflower_points;

use crate::core::pattern::{Label, PatternSpec};
use crate::geometry::Rect;
use crate::utils::error::{HoneycombError, Result};
use rand::{rngs::StdRng, SeedableRng};

/// Parameters of one generator run, already derived from a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RunKind {
    JitterGrid {
        grid_cols: usize,
        grid_rows: usize,
        cell_gap_mm: f64,
        jitter_strength: f64,
        relaxation_steps: u32,
    },
    Sunflower {
        num_points: usize,
        spacing_mm: f64,
        cell_gap_mm: f64,
        jitter_strength: f64,
        relaxation_steps: u32,
    },
    Poisson {
        radius_mm: f64,
        candidates: u32,
        cell_gap_mm: f64,
    },
}

impl RunKind {
    /// 產生前估計點數，用來拒絕過大的任務
    pub fn estimated_points(&self, bounds: Rect) -> usize {
        match self {
            RunKind::JitterGrid {
                grid_cols,
                grid_rows,
                ..
            } => grid_cols.saturating_mul(*grid_rows),
            RunKind::Sunflower {
                num_points,
                spacing_mm,
                ..
            } => (*num_points).max(sunflower::points_to_cover(bounds, *spacing_mm)),
            RunKind::Poisson { radius_mm, .. } => poisson::estimated_points(bounds, *radius_mm),
        }
    }

    /// Runs the point distribution and assembles the pattern input.
    pub fn pattern_spec(
        &self,
        bounds: Rect,
        seed: Option<u64>,
        label: Option<Label>,
        max_points: usize,
    ) -> Result<PatternSpec> {
        let estimate = self.estimated_points(bounds);
        if estimate > max_points {
            return Err(HoneycombError::LimitExceeded {
                message: format!(
                    "run needs about {} points, limit is {}",
                    estimate, max_points
                ),
            });
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let spec = match *self {
            RunKind::JitterGrid {
                grid_cols,
                grid_rows,
                cell_gap_mm,
                jitter_strength,
                relaxation_steps,
            } => PatternSpec {
                bounds,
                sites: jitter_grid_points(bounds, grid_cols, grid_rows, jitter_strength, &mut rng),
                relaxation_steps,
                cell_gap_mm,
                average_cell_size: jitter_grid::average_cell_width(bounds, grid_cols),
                label,
            },
            RunKind::Sunflower {
                num_points,
                spacing_mm,
                cell_gap_mm,
                jitter_strength,
                relaxation_steps,
            } => PatternSpec {
                bounds,
                sites: sunflower_points(bounds, num_points, spacing_mm, jitter_strength, &mut rng),
                relaxation_steps,
                cell_gap_mm,
                average_cell_size: (bounds.area() / num_points.max(1) as f64).sqrt(),
                label,
            },
            RunKind::Poisson {
                radius_mm,
                candidates,
                cell_gap_mm,
            } => {
                let sites = poisson_disc_points(bounds, radius_mm, candidates, max_points, &mut rng)?;
                let average_cell_size = (bounds.area() / sites.len().max(1) as f64).sqrt();
                PatternSpec {
                    bounds,
                    sites,
                    relaxation_steps: 0,
                    cell_gap_mm,
                    average_cell_size,
                    label,
                }
            }
        };

        tracing::debug!(
            sites = spec.sites.len(),
            relaxation_steps = spec.relaxation_steps,
            "Generated seed points"
        );
        Ok(spec)
    }
}
