//! Planar geometry used by the pattern generators.
//!
//! All coordinates are millimetres with the origin at the lower-left corner
//! of the boundary rectangle.

pub mod voronoi;

pub use voronoi::{relax, voronoi_cells};

const EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Axis-aligned rectangle `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn from_size(width: f64, height: f64) -> Self {
        Self {
            min: Point::new(0.0, 0.0),
            max: Point::new(width, height),
        }
    }

    /// 以中心點與寬高建立矩形
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self {
            min: Point::new(center.x - width / 2.0, center.y - height / 2.0),
            max: Point::new(center.x + width / 2.0, center.y + height / 2.0),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
        )
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Corners in counter-clockwise order starting at `min`.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
        ]
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(self.corners().to_vec())
    }
}

/// Simple polygon stored as an open ring (last vertex is not repeated).
///
/// Voronoi cells are always convex and counter-clockwise; other helpers do
/// not rely on that.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }

    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Area centroid; falls back to the vertex mean for degenerate rings.
    pub fn centroid(&self) -> Option<Point> {
        let n = self.vertices.len();
        if n == 0 {
            return None;
        }
        let a = self.signed_area();
        if a.abs() < EPSILON {
            let sx: f64 = self.vertices.iter().map(|p| p.x).sum();
            let sy: f64 = self.vertices.iter().map(|p| p.y).sum();
            return Some(Point::new(sx / n as f64, sy / n as f64));
        }
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let p = self.vertices[i];
            let q = self.vertices[(i + 1) % n];
            let cross = p.x * q.y - q.x * p.y;
            cx += (p.x + q.x) * cross;
            cy += (p.y + q.y) * cross;
        }
        Some(Point::new(cx / (6.0 * a), cy / (6.0 * a)))
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        let first = *self.vertices.first()?;
        let mut rect = Rect {
            min: first,
            max: first,
        };
        for p in &self.vertices[1..] {
            rect.min.x = rect.min.x.min(p.x);
            rect.min.y = rect.min.y.min(p.y);
            rect.max.x = rect.max.x.max(p.x);
            rect.max.y = rect.max.y.max(p.y);
        }
        Some(rect)
    }

    /// 以形心為中心縮放，用來在相鄰單元之間留出線寬
    pub fn scaled_about_centroid(&self, factor: f64) -> Polygon {
        match self.centroid() {
            Some(c) => Polygon::new(
                self.vertices
                    .iter()
                    .map(|p| Point::new(c.x + (p.x - c.x) * factor, c.y + (p.y - c.y) * factor))
                    .collect(),
            ),
            None => self.clone(),
        }
    }

    /// Keeps the part of the polygon where `(p - origin) · normal <= 0`
    /// (Sutherland–Hodgman against a single half-plane).
    pub fn clip_half_plane(&self, origin: Point, normal: Point) -> Polygon {
        let side = |p: &Point| (p.x - origin.x) * normal.x + (p.y - origin.y) * normal.y;
        let n = self.vertices.len();
        let mut out = Vec::with_capacity(n + 1);

        for i in 0..n {
            let current = self.vertices[i];
            let next = self.vertices[(i + 1) % n];
            let dc = side(&current);
            let dn = side(&next);

            if dc <= 0.0 {
                out.push(current);
            }
            if (dc < 0.0 && dn > 0.0) || (dc > 0.0 && dn < 0.0) {
                let t = dc / (dc - dn);
                out.push(Point::new(
                    current.x + (next.x - current.x) * t,
                    current.y + (next.y - current.y) * t,
                ));
            }
        }

        Polygon::new(out)
    }

    /// Largest distance from `p` to any vertex.
    pub fn max_distance_from(&self, p: &Point) -> f64 {
        self.vertices
            .iter()
            .map(|v| v.distance_squared(p))
            .fold(0.0, f64::max)
            .sqrt()
    }
}

/// Evenly spaced samples over `[start, end]`; a single sample sits at `start`.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}
