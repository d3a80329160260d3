//! Axis-aligned bounding boxes.

use glam::Vec2;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Create bounds from a center and a half extent (the AABB of a disc).
    #[inline]
    pub fn from_center(cx: f32, cy: f32, half: f32) -> Self {
        Self {
            min_x: cx - half,
            min_y: cy - half,
            max_x: cx + half,
            max_y: cy + half,
        }
    }

    /// Check if two bounds intersect. Touching edges do not count.
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.min_x >= self.max_x
            || other.max_x <= self.min_x
            || other.min_y >= self.max_y
            || other.max_y <= self.min_y)
    }

    /// Check if a disc overlaps this box (strictly).
    #[inline]
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let nearest = Vec2::new(
            center.x.clamp(self.min_x, self.max_x),
            center.y.clamp(self.min_y, self.max_y),
        );
        center.distance_squared(nearest) < radius * radius
    }

    /// Shrink every edge by `amount`. Collapses to the center when too small.
    pub fn inset(&self, amount: f32) -> Bounds {
        let cx = self.center_x();
        let cy = self.center_y();
        let (min_x, max_x) = if self.width() >= amount * 2.0 {
            (self.min_x + amount, self.max_x - amount)
        } else {
            (cx, cx)
        };
        let (min_y, max_y) = if self.height() >= amount * 2.0 {
            (self.min_y + amount, self.max_y - amount)
        } else {
            (cy, cy)
        };
        Bounds::new(min_x, min_y, max_x, max_y)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        (self.min_x + self.max_x) / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        (self.min_y + self.max_y) / 2.0
    }
}
