//! Minimal ASCII DXF (AutoCAD R12 / AC1009) writer.
//!
//! Only what the pattern files need: a layer table, closed polylines and
//! single-line text. Output is deterministic for identical input.

use crate::geometry::{Point, Polygon, Rect};
use std::fmt::Write;

pub const LAYER_BOUNDARY: &str = "Boundary";
pub const LAYER_PATTERN: &str = "Pattern";
pub const LAYER_LABEL: &str = "Label";

pub const DXF_CONTENT_TYPE: &str = "image/vnd.dxf";

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub color: u8,
}

#[derive(Debug, Clone, PartialEq)]
enum Entity {
    Polyline { layer: String, vertices: Vec<Point> },
    Text {
        layer: String,
        position: Point,
        height: f64,
        content: String,
    },
}

#[derive(Debug, Clone)]
pub struct DxfDocument {
    layers: Vec<Layer>,
    entities: Vec<Entity>,
    extents: Option<Rect>,
}

impl Default for DxfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DxfDocument {
    /// 建立文件並預先登錄三個標準圖層
    pub fn new() -> Self {
        Self {
            layers: vec![
                Layer {
                    name: LAYER_BOUNDARY.to_string(),
                    color: 1,
                },
                Layer {
                    name: LAYER_PATTERN.to_string(),
                    color: 7,
                },
                Layer {
                    name: LAYER_LABEL.to_string(),
                    color: 3,
                },
            ],
            entities: Vec::new(),
            extents: None,
        }
    }

    pub fn set_extents(&mut self, extents: Rect) {
        self.extents = Some(extents);
    }

    pub fn add_closed_polyline(&mut self, layer: &str, vertices: &[Point]) {
        if vertices.len() < 2 {
            return;
        }
        self.entities.push(Entity::Polyline {
            layer: layer.to_string(),
            vertices: vertices.to_vec(),
        });
    }

    pub fn add_polygon(&mut self, layer: &str, polygon: &Polygon) {
        self.add_closed_polyline(layer, &polygon.vertices);
    }

    /// Single-line text centred on `position`.
    pub fn add_text(&mut self, layer: &str, position: Point, height: f64, content: &str) {
        self.entities.push(Entity::Text {
            layer: layer.to_string(),
            position,
            height,
            content: sanitize_text(content),
        });
    }

    pub fn polyline_count(&self, layer: &str) -> usize {
        self.entities
            .iter()
            .filter(|e| matches!(e, Entity::Polyline { layer: l, .. } if l == layer))
            .count()
    }

    pub fn to_dxf_string(&self) -> String {
        let mut out = String::new();
        self.write_header(&mut out);
        self.write_tables(&mut out);
        self.write_entities(&mut out);
        pair(&mut out, 0, "EOF");
        out
    }

    fn write_header(&self, out: &mut String) {
        pair(out, 0, "SECTION");
        pair(out, 2, "HEADER");
        pair(out, 9, "$ACADVER");
        pair(out, 1, "AC1009");
        // 4 = millimetres
        pair(out, 9, "$INSUNITS");
        pair(out, 70, 4);
        if let Some(extents) = self.extents {
            pair(out, 9, "$EXTMIN");
            point(out, 0, extents.min);
            pair(out, 9, "$EXTMAX");
            point(out, 0, extents.max);
        }
        pair(out, 0, "ENDSEC");
    }

    fn write_tables(&self, out: &mut String) {
        pair(out, 0, "SECTION");
        pair(out, 2, "TABLES");

        pair(out, 0, "TABLE");
        pair(out, 2, "LTYPE");
        pair(out, 70, 1);
        pair(out, 0, "LTYPE");
        pair(out, 2, "CONTINUOUS");
        pair(out, 70, 0);
        pair(out, 3, "Solid line");
        pair(out, 72, 65);
        pair(out, 73, 0);
        pair(out, 40, 0.0);
        pair(out, 0, "ENDTAB");

        pair(out, 0, "TABLE");
        pair(out, 2, "LAYER");
        pair(out, 70, self.layers.len() + 1);
        write_layer(out, "0", 7);
        for layer in &self.layers {
            write_layer(out, &layer.name, layer.color);
        }
        pair(out, 0, "ENDTAB");

        pair(out, 0, "ENDSEC");
    }

    fn write_entities(&self, out: &mut String) {
        pair(out, 0, "SECTION");
        pair(out, 2, "ENTITIES");
        for entity in &self.entities {
            match entity {
                Entity::Polyline { layer, vertices } => {
                    pair(out, 0, "POLYLINE");
                    pair(out, 8, layer);
                    pair(out, 66, 1);
                    point(out, 0, Point::new(0.0, 0.0));
                    pair(out, 70, 1);
                    for v in vertices {
                        pair(out, 0, "VERTEX");
                        pair(out, 8, layer);
                        point(out, 0, *v);
                    }
                    pair(out, 0, "SEQEND");
                    pair(out, 8, layer);
                }
                Entity::Text {
                    layer,
                    position,
                    height,
                    content,
                } => {
                    pair(out, 0, "TEXT");
                    pair(out, 8, layer);
                    point(out, 0, *position);
                    pair(out, 40, height);
                    pair(out, 1, content);
                    pair(out, 72, 1);
                    point(out, 1, *position);
                    pair(out, 73, 2);
                }
            }
        }
        pair(out, 0, "ENDSEC");
    }
}

fn write_layer(out: &mut String, name: &str, color: u8) {
    pair(out, 0, "LAYER");
    pair(out, 2, name);
    pair(out, 70, 0);
    pair(out, 62, color);
    pair(out, 6, "CONTINUOUS");
}

fn pair(out: &mut String, code: u16, value: impl std::fmt::Display) {
    // String 的 fmt::Write 不會失敗
    let _ = write!(out, "{:>3}\n{}\n", code, value);
}

/// Writes a 2D point with group codes `10+offset`, `20+offset`, `30+offset`.
fn point(out: &mut String, offset: u16, p: Point) {
    pair(out, 10 + offset, p.x);
    pair(out, 20 + offset, p.y);
    pair(out, 30 + offset, 0.0);
}

/// DXF values are line-oriented; strip anything that would break a pair.
fn sanitize_text(content: &str) -> String {
    content
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}
