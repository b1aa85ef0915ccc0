//! Ray hit records.
//!
//! The physics backend answers every ray query with a [`CollisionData`],
//! which the sweeps use for distance clamping and slope classification.

use bevy::prelude::*;

/// Information about a raycast hit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec2,
    /// World position of the hit point.
    pub point: Vec2,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec2, point: Vec2, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }

    /// Angle between the hit surface normal and world up, in radians.
    ///
    /// 0 for flat floors, `PI / 2` for vertical walls.
    #[inline]
    pub fn slope_angle(&self) -> f32 {
        self.normal.dot(Vec2::Y).clamp(-1.0, 1.0).acos()
    }
}
