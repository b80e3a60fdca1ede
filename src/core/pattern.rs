use crate::dxf::{DxfDocument, LAYER_BOUNDARY, LAYER_LABEL, LAYER_PATTERN};
use crate::geometry::{relax, voronoi_cells, Point, Polygon, Rect};

const MIN_SCALE_FACTOR: f64 = 0.1;
/// Approximate advance of one glyph relative to the text height.
const GLYPH_WIDTH_RATIO: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub height_mm: f64,
}

impl Label {
    /// 文字佔用區域，位於邊界中心
    pub fn keep_out(&self, bounds: Rect) -> Rect {
        let width = self.height_mm * GLYPH_WIDTH_RATIO * self.text.chars().count() as f64;
        Rect::centered(bounds.center(), width, self.height_mm)
    }
}

/// Everything needed to turn seed points into a finished pattern.
#[derive(Debug, Clone)]
pub struct PatternSpec {
    pub bounds: Rect,
    pub sites: Vec<Point>,
    pub relaxation_steps: u32,
    pub cell_gap_mm: f64,
    /// Reference cell size used to turn the gap into a shrink factor.
    pub average_cell_size: f64,
    pub label: Option<Label>,
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub bounds: Rect,
    pub cells: Vec<Polygon>,
    pub label: Option<Label>,
}

pub fn shrink_factor(cell_gap_mm: f64, average_cell_size: f64) -> f64 {
    if average_cell_size <= 0.0 {
        return MIN_SCALE_FACTOR;
    }
    (1.0 - cell_gap_mm / average_cell_size).max(MIN_SCALE_FACTOR)
}

impl Pattern {
    pub fn build(spec: PatternSpec) -> Self {
        let sites = if spec.relaxation_steps > 0 {
            relax(spec.sites, spec.bounds, spec.relaxation_steps)
        } else {
            spec.sites
        };

        let mut cells: Vec<Polygon> = voronoi_cells(&sites, spec.bounds)
            .into_iter()
            .flatten()
            .collect();

        if spec.cell_gap_mm > 0.0 && !cells.is_empty() {
            let factor = shrink_factor(spec.cell_gap_mm, spec.average_cell_size);
            cells = cells
                .iter()
                .map(|cell| cell.scaled_about_centroid(factor))
                .collect();
        }

        if let Some(label) = &spec.label {
            let keep_out = label.keep_out(spec.bounds);
            let before = cells.len();
            cells.retain(|cell| {
                cell.bounding_box()
                    .map(|bbox| !bbox.intersects(&keep_out))
                    .unwrap_or(true)
            });
            tracing::debug!(removed = before - cells.len(), "Cleared label area");
        }

        Self {
            bounds: spec.bounds,
            cells,
            label: spec.label,
        }
    }

    pub fn to_dxf(&self) -> DxfDocument {
        let mut doc = DxfDocument::new();
        doc.set_extents(self.bounds);
        doc.add_polygon(LAYER_BOUNDARY, &self.bounds.to_polygon());
        for cell in &self.cells {
            doc.add_polygon(LAYER_PATTERN, cell);
        }
        if let Some(label) = &self.label {
            doc.add_text(LAYER_LABEL, self.bounds.center(), label.height_mm, &label.text);
        }
        doc
    }
}
