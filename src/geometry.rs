//! Integer viewport geometry for floating panels.
//!
//! Positions are top-left corners in logical pixels. Everything here is a
//! pure function so the drag controller and the viewport-safety pass share
//! exactly one clamp rule.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A point (or offset) in viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Round a floating-point cursor position from the windowing system.
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self {
            x: x.round() as i32,
            y: y.round() as i32,
        }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Width and height in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Axis-aligned rectangle: origin plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(Point::new(x, y), Size::new(width, height))
    }

    pub fn right(&self) -> i32 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> i32 {
        self.origin.y + self.size.height
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.origin.x && p.x < self.right() && p.y >= self.origin.y && p.y < self.bottom()
    }

    /// Convert to a kurbo rect for drawing.
    pub fn to_kurbo(&self) -> vello::kurbo::Rect {
        vello::kurbo::Rect::new(
            self.origin.x as f64,
            self.origin.y as f64,
            self.right() as f64,
            self.bottom() as f64,
        )
    }
}

/// Offset of the pointer from the panel's top-left corner at grab time.
pub fn grab_offset(pointer: Point, panel_origin: Point) -> Point {
    pointer - panel_origin
}

/// Candidate top-left for a panel being dragged: pointer minus grab offset.
pub fn drag_target(pointer: Point, offset: Point) -> Point {
    pointer - offset
}

/// Clamp one axis. When the extent does not fit between the margins the
/// coordinate is pinned to the margin so the header stays reachable.
fn clamp_axis(value: i32, extent: i32, available: i32, margin: i32) -> i32 {
    if extent.saturating_add(margin.saturating_mul(2)) > available {
        return margin;
    }
    let max = available.saturating_sub(extent).saturating_sub(margin);
    value.clamp(margin, max.max(margin))
}

/// Constrain `position` so a panel of `size` stays inside `viewport`
/// inset by `margin` on every side. A negative margin counts as zero.
pub fn clamp_to_viewport(position: Point, size: Size, viewport: Size, margin: i32) -> Point {
    Point::new(
        clamp_axis(position.x, size.width, viewport.width, margin.max(0)),
        clamp_axis(position.y, size.height, viewport.height, margin.max(0)),
    )
}
