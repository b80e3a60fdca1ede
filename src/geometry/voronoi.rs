//! Voronoi cells clipped to a rectangular boundary.
//!
//! Each cell starts as the boundary rectangle and is cut by the bisector
//! half-plane of every neighbour that can still reach it. Neighbours are
//! visited ring by ring on a bucket grid; the scan stops once the next ring
//! is farther than twice the cell's current radius, since no site beyond
//! that distance can cut the cell.

use super::{Point, Polygon, Rect};

const COINCIDENT_EPSILON: f64 = 1e-18;
const MIN_CELL_AREA: f64 = 1e-15;
const MAX_BUCKETS_PER_AXIS: usize = 2048;

struct SiteGrid<'a> {
    sites: &'a [Point],
    bounds: Rect,
    cols: usize,
    rows: usize,
    bucket_width: f64,
    bucket_height: f64,
    buckets: Vec<Vec<usize>>,
}

impl<'a> SiteGrid<'a> {
    fn new(sites: &'a [Point], bounds: Rect) -> Self {
        // 每個 bucket 大約放一個點
        let target = (bounds.area() / sites.len().max(1) as f64).sqrt();
        let cols = ((bounds.width() / target).ceil() as usize).clamp(1, MAX_BUCKETS_PER_AXIS);
        let rows = ((bounds.height() / target).ceil() as usize).clamp(1, MAX_BUCKETS_PER_AXIS);

        let mut grid = Self {
            sites,
            bounds,
            cols,
            rows,
            bucket_width: bounds.width() / cols as f64,
            bucket_height: bounds.height() / rows as f64,
            buckets: vec![Vec::new(); cols * rows],
        };

        for (i, site) in sites.iter().enumerate() {
            let (bx, by) = grid.bucket_of(site);
            grid.buckets[by * cols + bx].push(i);
        }
        grid
    }

    /// Sites outside the boundary are projected onto it first; projection is
    /// 1-Lipschitz, so ring distances stay valid lower bounds.
    fn bucket_of(&self, p: &Point) -> (usize, usize) {
        let c = self.bounds.clamp(*p);
        let bx = ((c.x - self.bounds.min.x) / self.bucket_width) as usize;
        let by = ((c.y - self.bounds.min.y) / self.bucket_height) as usize;
        (bx.min(self.cols - 1), by.min(self.rows - 1))
    }

    fn bucket(&self, x: isize, y: isize) -> &[usize] {
        if x < 0 || y < 0 || x as usize >= self.cols || y as usize >= self.rows {
            return &[];
        }
        &self.buckets[y as usize * self.cols + x as usize]
    }

    /// Site indices in buckets at Chebyshev distance exactly `r` from `(bx, by)`.
    /// Only buckets inside the grid are visited.
    fn ring(&self, bx: usize, by: usize, r: usize) -> Vec<usize> {
        let (bx, by, r) = (bx as isize, by as isize, r as isize);
        if r == 0 {
            return self.bucket(bx, by).to_vec();
        }

        let (max_x, max_y) = (self.cols as isize - 1, self.rows as isize - 1);
        let mut out = Vec::new();
        for x in (bx - r).max(0)..=(bx + r).min(max_x) {
            out.extend_from_slice(self.bucket(x, by - r));
            out.extend_from_slice(self.bucket(x, by + r));
        }
        for y in (by - r + 1).max(0)..(by + r).min(max_y + 1) {
            out.extend_from_slice(self.bucket(bx - r, y));
            out.extend_from_slice(self.bucket(bx + r, y));
        }
        out
    }

    /// Lower bound on the distance from a site in bucket `(bx, by)` to any
    /// site outside rings `0..=r`, measured per axis. An axis with no
    /// buckets left beyond ring `r` does not bound the distance.
    fn unvisited_distance(&self, bx: usize, by: usize, r: usize) -> f64 {
        let next = r + 1;
        let columns_left = bx >= next || bx + next < self.cols;
        let rows_left = by >= next || by + next < self.rows;
        let reach = r as f64;

        match (columns_left, rows_left) {
            (false, false) => f64::INFINITY,
            (true, false) => reach * self.bucket_width,
            (false, true) => reach * self.bucket_height,
            (true, true) => reach * self.bucket_width.min(self.bucket_height),
        }
    }

    fn cell(&self, index: usize) -> Option<Polygon> {
        let site = self.sites[index];
        let mut cell = self.bounds.to_polygon();
        let (bx, by) = self.bucket_of(&site);
        let max_ring = self.cols.max(self.rows);

        for r in 0..=max_ring {
            for j in self.ring(bx, by, r) {
                if j == index {
                    continue;
                }
                let other = self.sites[j];
                if site.distance_squared(&other) < COINCIDENT_EPSILON {
                    // 重複點：由索引較小者擁有這個單元
                    if j < index {
                        return None;
                    }
                    continue;
                }
                let mid = Point::new((site.x + other.x) / 2.0, (site.y + other.y) / 2.0);
                let normal = Point::new(other.x - site.x, other.y - site.y);
                cell = cell.clip_half_plane(mid, normal);
                if cell.is_empty() {
                    return None;
                }
            }

            if self.unvisited_distance(bx, by, r) >= 2.0 * cell.max_distance_from(&site) {
                break;
            }
        }

        if cell.area() <= MIN_CELL_AREA {
            return None;
        }
        Some(cell)
    }
}

/// Voronoi cell of every site, clipped to `bounds`.
///
/// The result is indexed like `sites`; `None` marks a duplicate site or a
/// site whose cell does not reach into the boundary.
pub fn voronoi_cells(sites: &[Point], bounds: Rect) -> Vec<Option<Polygon>> {
    if sites.is_empty() {
        return Vec::new();
    }
    let grid = SiteGrid::new(sites, bounds);
    (0..sites.len()).map(|i| grid.cell(i)).collect()
}

/// Lloyd relaxation: moves every site to the centroid of its cell, clamped
/// to the boundary, `steps` times.
pub fn relax(sites: Vec<Point>, bounds: Rect, steps: u32) -> Vec<Point> {
    let mut sites = sites;
    for step in 0..steps {
        let cells = voronoi_cells(&sites, bounds);
        sites = sites
            .iter()
            .zip(cells.iter())
            .map(|(site, cell)| match cell.as_ref().and_then(Polygon::centroid) {
                Some(centroid) => bounds.clamp(centroid),
                None => *site,
            })
            .collect();
        tracing::trace!(step, sites = sites.len(), "Lloyd relaxation step finished");
    }
    sites
}
