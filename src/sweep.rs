//! Collision sweep for kinematic characters.
//!
//! A [`CollisionSweep`] takes the displacement a character wants to make
//! this step and corrects it against the world, in a fixed order:
//!
//! 1. reset the per-step [`CollisionState`]
//! 2. stick to descending slopes when moving down
//! 3. horizontal rays along the leading edge, climbing walkable slopes
//! 4. vertical rays from the post-horizontal position, re-checking the
//!    slope angle while climbing
//!
//! The sweep never writes positions. It returns the corrected displacement
//! and the caller applies it.

use bevy::prelude::*;

use crate::backend::{KinematicBody, RayCaster, RaycastRequest};
use crate::collision::CollisionData;
use crate::config::CharacterConfig;
use crate::raycast::RaycastEnvelope;
use crate::state::{CollisionState, RaysData};

/// Length of the slope ray cast below a descending character.
const DESCEND_RAY_LENGTH: f32 = 1.0e6;

/// Direction sign where zero counts as positive.
#[inline]
pub(crate) fn sign(x: f32) -> f32 {
    if x >= 0.0 { 1.0 } else { -1.0 }
}

/// One movement step of a character body against the world.
pub struct CollisionSweep<'a, C: ?Sized> {
    caster: &'a C,
    entity: Entity,
    envelope: RaycastEnvelope,
    config: &'a CharacterConfig,
}

impl<'a, C: RayCaster + ?Sized> CollisionSweep<'a, C> {
    /// Prepare a sweep from the body's current bounds.
    pub fn new(caster: &'a C, body: &KinematicBody, config: &'a CharacterConfig) -> Self {
        Self {
            caster,
            entity: body.entity,
            envelope: RaycastEnvelope::compute(body.bounds, &config.raycast),
            config,
        }
    }

    pub fn envelope(&self) -> &RaycastEnvelope {
        &self.envelope
    }

    /// Correct `velocity` (a displacement for this step) against the world.
    ///
    /// `standing_on_platform` forces `below` afterwards, for passengers moved
    /// by a platform that already knows they are on top of it.
    pub fn move_body(
        &self,
        velocity: Vec2,
        standing_on_platform: bool,
        collisions: &mut CollisionState,
        rays: &mut RaysData,
    ) -> Vec2 {
        let mut velocity = velocity;
        rays.clear();
        collisions.reset(velocity);

        if velocity.x != 0.0 {
            collisions.face_dir = sign(velocity.x);
        }

        if velocity.y < 0.0 {
            self.descend_slope(&mut velocity, collisions);
        }

        self.horizontal_collisions(&mut velocity, collisions, rays);

        if velocity.y != 0.0 {
            self.vertical_collisions(&mut velocity, collisions, rays);
        }

        if standing_on_platform {
            collisions.below = true;
        }

        velocity
    }

    fn cast(
        &self,
        origin: Vec2,
        direction: Vec2,
        length: f32,
        rays: Option<&mut RaysData>,
    ) -> Option<CollisionData> {
        let request = RaycastRequest::new(origin, direction, length)
            .with_mask(self.config.raycast.collision_mask)
            .excluding(self.entity);
        let hit = self.caster.cast_ray(&request);
        if let Some(rays) = rays {
            rays.push(origin, request.end(), hit.map(|hit| hit.point));
        }
        hit
    }

    fn descend_slope(&self, velocity: &mut Vec2, collisions: &mut CollisionState) {
        let direction_x = sign(velocity.x);
        // Trailing corner: it is the one still above the slope.
        let origin = self.envelope.origins.bottom(-direction_x);

        let Some(hit) = self.cast(origin, Vec2::NEG_Y, DESCEND_RAY_LENGTH, None) else {
            return;
        };

        let slope_angle = hit.slope_angle();
        if slope_angle == 0.0 || slope_angle > self.config.max_descend_angle {
            return;
        }
        if sign(hit.normal.x) != direction_x {
            return;
        }
        if hit.distance - self.config.raycast.skin_width > slope_angle.tan() * velocity.x.abs() {
            return;
        }

        let move_distance = velocity.x.abs();
        velocity.x = slope_angle.cos() * move_distance * sign(velocity.x);
        velocity.y -= slope_angle.sin() * move_distance;

        collisions.slope_angle = slope_angle;
        collisions.descending_slope = true;
        collisions.below = true;
    }

    fn horizontal_collisions(
        &self,
        velocity: &mut Vec2,
        collisions: &mut CollisionState,
        rays: &mut RaysData,
    ) {
        let skin_width = self.config.raycast.skin_width;
        let direction_x = collisions.face_dir;
        // Long enough to find a wall the body is resting against.
        let mut ray_length = (velocity.x.abs() + skin_width).max(2.0 * skin_width);
        let origins = &self.envelope.origins;

        for i in 0..self.envelope.horizontal_ray_count {
            let origin = origins.bottom(direction_x)
                + Vec2::Y * (self.envelope.horizontal_ray_spacing * i as f32);

            let direction = Vec2::X * direction_x;
            let Some(hit) = self.cast(origin, direction, ray_length, Some(&mut *rays)) else {
                continue;
            };
            if hit.distance == 0.0 {
                continue;
            }

            let slope_angle = hit.slope_angle();

            if i == 0 && slope_angle <= self.config.max_climb_angle {
                if collisions.descending_slope {
                    collisions.descending_slope = false;
                    *velocity = collisions.velocity_old;
                }
                let mut distance_to_slope_start = 0.0;
                if slope_angle != collisions.slope_angle_old {
                    distance_to_slope_start = hit.distance - skin_width;
                    velocity.x -= distance_to_slope_start * direction_x;
                }
                climb_slope(velocity, slope_angle, collisions);
                velocity.x += distance_to_slope_start * direction_x;
            }

            if !collisions.climbing_slope || slope_angle > self.config.max_climb_angle {
                velocity.x = (hit.distance - skin_width) * direction_x;
                ray_length = hit.distance;

                if collisions.climbing_slope {
                    velocity.y = collisions.slope_angle.tan() * velocity.x.abs();
                }

                collisions.left = direction_x == -1.0;
                collisions.right = direction_x == 1.0;
            }
        }
    }

    fn vertical_collisions(
        &self,
        velocity: &mut Vec2,
        collisions: &mut CollisionState,
        rays: &mut RaysData,
    ) {
        let skin_width = self.config.raycast.skin_width;
        let direction_y = sign(velocity.y);
        let mut ray_length = velocity.y.abs() + skin_width;
        let origins = &self.envelope.origins;

        for i in 0..self.envelope.vertical_ray_count {
            // Rays start from where the horizontal correction put the body.
            let origin = origins.left_leading(direction_y)
                + Vec2::X * (self.envelope.vertical_ray_spacing * i as f32 + velocity.x);

            let direction = Vec2::Y * direction_y;
            let Some(hit) = self.cast(origin, direction, ray_length, Some(&mut *rays)) else {
                continue;
            };

            velocity.y = (hit.distance - skin_width) * direction_y;
            ray_length = hit.distance;

            if collisions.climbing_slope {
                velocity.x = velocity.y / collisions.slope_angle.tan() * sign(velocity.x);
            }

            if direction_y == -1.0 {
                collisions.below = true;
            } else {
                collisions.above = true;
            }
        }

        if collisions.climbing_slope {
            let direction_x = sign(velocity.x);
            let ray_length = velocity.x.abs() + skin_width;
            let origin = origins.bottom(direction_x) + Vec2::Y * velocity.y;

            let direction = Vec2::X * direction_x;
            if let Some(hit) = self.cast(origin, direction, ray_length, Some(rays)) {
                let slope_angle = hit.slope_angle();
                if slope_angle != collisions.slope_angle {
                    velocity.x = (hit.distance - skin_width) * direction_x;
                    collisions.slope_angle = slope_angle;
                }
            }
        }
    }
}

/// Redirect `velocity` up a slope, unless it already rises faster.
fn climb_slope(velocity: &mut Vec2, slope_angle: f32, collisions: &mut CollisionState) {
    let move_distance = velocity.x.abs();
    let climb_velocity_y = slope_angle.sin() * move_distance;

    if velocity.y <= climb_velocity_y {
        velocity.y = climb_velocity_y;
        velocity.x = slope_angle.cos() * move_distance * sign(velocity.x);
        collisions.below = true;
        collisions.climbing_slope = true;
        collisions.slope_angle = slope_angle;
    }
}
