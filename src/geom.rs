#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// A point in stage, parent or local space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Whether `pt` lies inside the rectangle. The right and bottom edges are exclusive.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x < self.x + self.width && pt.y >= self.y && pt.y < self.y + self.height
    }
}

/// Placement of a node inside its parent: translate, then scale.
///
/// `x` / `y` are in parent units. Scale factors of zero collapse the node;
/// converting into such a space yields non-finite coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, scale_x: 1.0, scale_y: 1.0 }
    }
}

impl Transform {
    /// Convert a parent-space point into this node's local space.
    #[must_use]
    pub fn to_local(&self, parent: Point) -> Point {
        Point {
            x: (parent.x - self.x) / self.scale_x,
            y: (parent.y - self.y) / self.scale_y,
        }
    }

    /// Convert a local-space point into the parent's space.
    #[must_use]
    pub fn to_parent(&self, local: Point) -> Point {
        Point {
            x: local.x * self.scale_x + self.x,
            y: local.y * self.scale_y + self.y,
        }
    }
}
