//! Ray fan geometry.
//!
//! Every movement step starts by deriving a [`RaycastEnvelope`] from the
//! body's current world bounds. The bounds are shrunk by the skin width so
//! rays start just inside the shape, and the number of rays along each edge
//! follows the configured ray density rather than a fixed count.

use bevy::prelude::*;

use crate::config::RaycastConfig;

/// Minimum number of rays along any edge.
pub const MIN_RAY_COUNT: usize = 2;

/// Corner points of the skin-shrunk body bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RaycastOrigins {
    pub bottom_left: Vec2,
    pub bottom_right: Vec2,
    pub top_left: Vec2,
    pub top_right: Vec2,
}

impl RaycastOrigins {
    /// Corners of `bounds`.
    pub fn from_rect(bounds: Rect) -> Self {
        Self {
            bottom_left: bounds.min,
            bottom_right: Vec2::new(bounds.max.x, bounds.min.y),
            top_left: Vec2::new(bounds.min.x, bounds.max.y),
            top_right: bounds.max,
        }
    }

    /// Bottom corner on the side of `direction_x` (right for +1, left otherwise).
    #[inline]
    pub fn bottom(&self, direction_x: f32) -> Vec2 {
        if direction_x == -1.0 {
            self.bottom_left
        } else {
            self.bottom_right
        }
    }

    /// Left corner of the edge facing `direction_y` (bottom for -1, top otherwise).
    #[inline]
    pub fn left_leading(&self, direction_y: f32) -> Vec2 {
        if direction_y == -1.0 {
            self.bottom_left
        } else {
            self.top_left
        }
    }
}

/// Ray origins, counts and spacing for one movement step.
///
/// Callers must not assume fixed ray counts: they change with the body's
/// size and are recomputed on every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastEnvelope {
    pub origins: RaycastOrigins,
    /// Rays fanned vertically along the left/right edges.
    pub horizontal_ray_count: usize,
    /// Rays fanned horizontally along the top/bottom edges.
    pub vertical_ray_count: usize,
    pub horizontal_ray_spacing: f32,
    pub vertical_ray_spacing: f32,
}

impl RaycastEnvelope {
    /// Compute the envelope for a body with the given world bounds.
    pub fn compute(bounds: Rect, config: &RaycastConfig) -> Self {
        let shrunk = shrink(bounds, config.skin_width);
        let size = shrunk.size();

        let horizontal_ray_count = ray_count(size.y, config.dst_between_rays);
        let vertical_ray_count = ray_count(size.x, config.dst_between_rays);

        Self {
            origins: RaycastOrigins::from_rect(shrunk),
            horizontal_ray_count,
            vertical_ray_count,
            horizontal_ray_spacing: size.y / (horizontal_ray_count - 1) as f32,
            vertical_ray_spacing: size.x / (vertical_ray_count - 1) as f32,
        }
    }

    /// The skin-shrunk bounds the origins were taken from.
    pub fn shrunk_bounds(&self) -> Rect {
        Rect {
            min: self.origins.bottom_left,
            max: self.origins.top_right,
        }
    }
}

/// Move every side of `bounds` inward by `skin`, collapsing onto the center
/// when the box is thinner than the skin.
fn shrink(bounds: Rect, skin: f32) -> Rect {
    let center = bounds.center();
    Rect {
        min: (bounds.min + Vec2::splat(skin)).min(center),
        max: (bounds.max - Vec2::splat(skin)).max(center),
    }
}

fn ray_count(span: f32, dst_between_rays: f32) -> usize {
    if dst_between_rays <= 0.0 || !dst_between_rays.is_finite() {
        return MIN_RAY_COUNT;
    }
    let count = (span / dst_between_rays).round();
    if count.is_finite() && count > MIN_RAY_COUNT as f32 {
        count as usize
    } else {
        MIN_RAY_COUNT
    }
}
