//! Annotation model
//!
//! Annotations live in overlay coordinates: origin top-left, y growing down,
//! one unit per CSS pixel of the unscaled page. `position` is always the
//! top-left corner of the object's bounding box.

use crate::error::AnnotateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Current version of the serialized annotation document
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn contains(&self, p: Point, tolerance: f64) -> bool {
        p.x >= self.x - tolerance
            && p.x <= self.x + self.width + tolerance
            && p.y >= self.y - tolerance
            && p.y <= self.y + self.height + tolerance
    }
}

/// An sRGB color, written as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color { r: 0xff, g: 0, b: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::RED
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = AnnotateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AnnotateError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Color {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl TryFrom<String> for Color {
    type Error = AnnotateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// One user-created overlay element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnotationObject {
    Text {
        position: Point,
        content: String,
        color: Color,
        font_size: f64,
        font_family: String,
    },
    /// Stroked outline, transparent fill
    Rectangle {
        position: Point,
        size: Size,
        stroke_color: Color,
        stroke_width: f64,
    },
    /// Stroked outline, transparent fill
    Circle {
        position: Point,
        radius: f64,
        stroke_color: Color,
        stroke_width: f64,
    },
    FreehandPath {
        points: Vec<Point>,
        stroke_color: Color,
        stroke_width: f64,
    },
}

impl AnnotationObject {
    pub fn kind(&self) -> &'static str {
        match self {
            AnnotationObject::Text { .. } => "text",
            AnnotationObject::Rectangle { .. } => "rectangle",
            AnnotationObject::Circle { .. } => "circle",
            AnnotationObject::FreehandPath { .. } => "freehand_path",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            AnnotationObject::Text { color, .. } => *color,
            AnnotationObject::Rectangle { stroke_color, .. }
            | AnnotationObject::Circle { stroke_color, .. }
            | AnnotationObject::FreehandPath { stroke_color, .. } => *stroke_color,
        }
    }

    pub fn set_color(&mut self, new: Color) {
        match self {
            AnnotationObject::Text { color, .. } => *color = new,
            AnnotationObject::Rectangle { stroke_color, .. }
            | AnnotationObject::Circle { stroke_color, .. }
            | AnnotationObject::FreehandPath { stroke_color, .. } => *stroke_color = new,
        }
    }

    /// Bounding box. Text metrics are approximated from the font size.
    pub fn bounds(&self) -> Bounds {
        match self {
            AnnotationObject::Text {
                position,
                content,
                font_size,
                ..
            } => Bounds {
                x: position.x,
                y: position.y,
                width: content.chars().count().max(1) as f64 * font_size * 0.6,
                height: font_size * 1.2,
            },
            AnnotationObject::Rectangle { position, size, .. } => Bounds {
                x: position.x,
                y: position.y,
                width: size.width,
                height: size.height,
            },
            AnnotationObject::Circle {
                position, radius, ..
            } => Bounds {
                x: position.x,
                y: position.y,
                width: radius * 2.0,
                height: radius * 2.0,
            },
            AnnotationObject::FreehandPath { points, .. } => {
                let Some(first) = points.first() else {
                    return Bounds {
                        x: 0.0,
                        y: 0.0,
                        width: 0.0,
                        height: 0.0,
                    };
                };
                let (mut min, mut max) = (*first, *first);
                for p in points {
                    min.x = min.x.min(p.x);
                    min.y = min.y.min(p.y);
                    max.x = max.x.max(p.x);
                    max.y = max.y.max(p.y);
                }
                Bounds {
                    x: min.x,
                    y: min.y,
                    width: max.x - min.x,
                    height: max.y - min.y,
                }
            }
        }
    }

    /// Hit test against the bounding box, widened by half the stroke
    pub fn contains(&self, p: Point) -> bool {
        let tolerance = match self {
            AnnotationObject::Text { .. } => 0.0,
            AnnotationObject::Rectangle { stroke_width, .. }
            | AnnotationObject::Circle { stroke_width, .. }
            | AnnotationObject::FreehandPath { stroke_width, .. } => stroke_width / 2.0,
        };
        self.bounds().contains(p, tolerance)
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            AnnotationObject::Text { position, .. }
            | AnnotationObject::Rectangle { position, .. }
            | AnnotationObject::Circle { position, .. } => {
                position.x += dx;
                position.y += dy;
            }
            AnnotationObject::FreehandPath { points, .. } => {
                for p in points {
                    p.x += dx;
                    p.y += dy;
                }
            }
        }
    }

    /// Scale uniformly about the top-left corner of the bounding box.
    ///
    /// Returns false and leaves the object untouched for a non-positive or
    /// non-finite factor.
    pub fn scale(&mut self, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let origin = self.bounds();
        match self {
            AnnotationObject::Text { font_size, .. } => *font_size *= factor,
            AnnotationObject::Rectangle { size, .. } => {
                size.width *= factor;
                size.height *= factor;
            }
            AnnotationObject::Circle { radius, .. } => *radius *= factor,
            AnnotationObject::FreehandPath { points, .. } => {
                for p in points {
                    p.x = origin.x + (p.x - origin.x) * factor;
                    p.y = origin.y + (p.y - origin.y) * factor;
                }
            }
        }
        true
    }
}

/// Serialized form of every page's annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    pub version: u32,
    pub pages: BTreeMap<u32, Vec<AnnotationObject>>,
}

impl AnnotationDocument {
    pub fn new(pages: BTreeMap<u32, Vec<AnnotationObject>>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            pages,
        }
    }

    pub fn to_json(&self) -> Result<String, AnnotateError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and check the schema version
    pub fn from_json(json: &str) -> Result<Self, AnnotateError> {
        #[derive(Deserialize)]
        struct VersionProbe {
            version: u32,
        }

        let probe: VersionProbe = serde_json::from_str(json)?;
        if probe.version != SCHEMA_VERSION {
            return Err(AnnotateError::UnsupportedSchema(probe.version));
        }
        Ok(serde_json::from_str(json)?)
    }
}
