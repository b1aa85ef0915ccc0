//! Waypoint platforms that carry passengers.
//!
//! A platform step has three parts, and the order is what keeps riders
//! seated:
//!
//! 1. [`PlatformController::plan_step`] advances along the waypoints and
//!    casts the passenger rays, producing one [`PassengerMovement`] per body.
//! 2. [`PlatformController::move_passengers`] with `before_move_platform =
//!    true` moves bodies that are in the platform's way.
//! 3. The caller applies the platform displacement, then calls
//!    `move_passengers` again with `false` for bodies riding on top.
//!
//! The platform never touches character controllers itself. It hands the
//! directives to a [`PassengerRegistry`] owned by the caller.

use bevy::prelude::*;

use crate::backend::{KinematicBody, RayCaster, RaycastRequest};
use crate::collision::CollisionData;
use crate::config::PlatformConfig;
use crate::raycast::RaycastEnvelope;
use crate::state::RaysData;
use crate::sweep::sign;

/// A forced move of one passenger for the current platform step.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct PassengerMovement {
    pub passenger: Entity,
    /// Displacement to apply to the passenger.
    pub velocity: Vec2,
    /// Passenger is on top of the platform and counts as grounded.
    pub standing_on_platform: bool,
    /// Move before the platform (pushed) rather than after it (carried).
    pub move_before_platform: bool,
}

/// Dispatches passenger moves to character controllers.
pub trait PassengerRegistry {
    /// Move `passenger` by `velocity` with zero input.
    ///
    /// Returns `false` if `passenger` has no character controller.
    fn move_passenger(&mut self, passenger: Entity, velocity: Vec2, standing_on_platform: bool)
    -> bool;
}

impl<F> PassengerRegistry for F
where
    F: FnMut(Entity, Vec2, bool) -> bool,
{
    fn move_passenger(
        &mut self,
        passenger: Entity,
        velocity: Vec2,
        standing_on_platform: bool,
    ) -> bool {
        self(passenger, velocity, standing_on_platform)
    }
}

/// Runtime state of a platform following waypoints.
///
/// Attached automatically to entities with a [`PlatformConfig`], using the
/// entity's position at that time to place the waypoints.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct PlatformController {
    global_waypoints: Vec<Vec2>,
    from_waypoint_index: usize,
    percent_between_waypoints: f32,
    next_move_time: f32,
    time: f32,
    passenger_movement: Vec<PassengerMovement>,
    rays: RaysData,
}

impl PlatformController {
    /// Create a controller for a platform currently at `position`.
    pub fn new(config: &PlatformConfig, position: Vec2) -> Self {
        Self {
            global_waypoints: config
                .local_waypoints
                .iter()
                .map(|waypoint| *waypoint + position)
                .collect(),
            from_waypoint_index: 0,
            percent_between_waypoints: 0.0,
            next_move_time: 0.0,
            time: 0.0,
            passenger_movement: Vec::new(),
            rays: RaysData::default(),
        }
    }

    /// World-space waypoints, in current travel order.
    pub fn global_waypoints(&self) -> &[Vec2] {
        &self.global_waypoints
    }

    pub fn from_waypoint_index(&self) -> usize {
        self.from_waypoint_index
    }

    /// Progress along the current segment, in `0..=1`.
    pub fn percent_between_waypoints(&self) -> f32 {
        self.percent_between_waypoints
    }

    /// Passenger directives of the last step.
    pub fn passenger_movement(&self) -> &[PassengerMovement] {
        &self.passenger_movement
    }

    /// Passenger rays of the last step.
    pub fn rays(&self) -> &RaysData {
        &self.rays
    }

    /// Advance time, compute this step's displacement and the passenger
    /// directives for it. Returns the platform displacement.
    pub fn plan_step<C: RayCaster + ?Sized>(
        &mut self,
        caster: &C,
        body: &KinematicBody,
        config: &PlatformConfig,
        dt: f32,
    ) -> Vec2 {
        self.time += dt;
        let velocity = self.calculate_platform_movement(config, body.position, dt);
        self.calculate_passenger_movement(caster, body, config, velocity);
        velocity
    }

    /// Displacement from `position` to the next point on the path.
    ///
    /// Zero while waiting at a waypoint or with fewer than two waypoints.
    pub fn calculate_platform_movement(
        &mut self,
        config: &PlatformConfig,
        position: Vec2,
        dt: f32,
    ) -> Vec2 {
        let count = self.global_waypoints.len();
        if self.time < self.next_move_time || count < 2 {
            return Vec2::ZERO;
        }

        self.from_waypoint_index %= count;
        let to_waypoint_index = (self.from_waypoint_index + 1) % count;
        let from = self.global_waypoints[self.from_waypoint_index];
        let to = self.global_waypoints[to_waypoint_index];

        let distance = from.distance(to);
        let progress = if distance > 0.0 {
            dt * config.speed / distance
        } else {
            1.0
        };
        self.percent_between_waypoints =
            (self.percent_between_waypoints + progress).clamp(0.0, 1.0);
        let eased = Self::ease(self.percent_between_waypoints, config.ease_amount);
        let new_position = from.lerp(to, eased);

        if self.percent_between_waypoints >= 1.0 {
            self.percent_between_waypoints = 0.0;
            self.from_waypoint_index += 1;

            if !config.cyclic && self.from_waypoint_index >= count - 1 {
                self.from_waypoint_index = 0;
                self.global_waypoints.reverse();
            }
            self.next_move_time = self.time + config.wait_time;
        }

        new_position - position
    }

    /// S-curve easing, linear for `ease_amount = 0`.
    pub fn ease(x: f32, ease_amount: f32) -> f32 {
        let a = ease_amount + 1.0;
        let rising = x.powf(a);
        rising / (rising + (1.0 - x).powf(a))
    }

    /// Rebuild the passenger directives for a platform move of `velocity`.
    pub fn calculate_passenger_movement<C: RayCaster + ?Sized>(
        &mut self,
        caster: &C,
        body: &KinematicBody,
        config: &PlatformConfig,
        velocity: Vec2,
    ) {
        self.passenger_movement.clear();
        self.rays.clear();

        let envelope = RaycastEnvelope::compute(body.bounds, &config.raycast);
        let origins = envelope.origins;
        let skin_width = config.raycast.skin_width;
        let direction_x = sign(velocity.x);
        let direction_y = sign(velocity.y);

        let mut cast = |origin: Vec2, direction: Vec2, length: f32| -> Option<CollisionData> {
            let request = RaycastRequest::new(origin, direction, length)
                .with_mask(config.passenger_mask)
                .excluding(body.entity);
            let hit = caster.cast_ray(&request);
            self.rays.push(origin, request.end(), hit.map(|hit| hit.point));
            hit
        };
        let mut directives: Vec<PassengerMovement> = Vec::new();
        let mut add = |hit: CollisionData, velocity: Vec2, standing: bool, before: bool| {
            let Some(passenger) = hit.entity else {
                return;
            };
            if directives.iter().any(|m| m.passenger == passenger) {
                return;
            }
            directives.push(PassengerMovement {
                passenger,
                velocity,
                standing_on_platform: standing,
                move_before_platform: before,
            });
        };

        // Vertically moving: bodies above a rising platform or below a
        // falling one are pushed out of the way.
        if velocity.y != 0.0 {
            let ray_length = velocity.y.abs() + skin_width;
            for i in 0..envelope.vertical_ray_count {
                let offset = envelope.vertical_ray_spacing * i as f32;
                let origin = origins.left_leading(direction_y) + Vec2::X * offset;
                let Some(hit) = cast(origin, Vec2::Y * direction_y, ray_length) else {
                    continue;
                };
                if hit.distance == 0.0 {
                    continue;
                }
                let push_x = if direction_y == 1.0 { velocity.x } else { 0.0 };
                let push_y = velocity.y - (hit.distance - skin_width) * direction_y;
                add(hit, Vec2::new(push_x, push_y), direction_y == 1.0, true);
            }
        }

        // Horizontally moving: bodies at the leading side are pushed.
        if velocity.x != 0.0 {
            let ray_length = velocity.x.abs() + skin_width;
            for i in 0..envelope.horizontal_ray_count {
                let offset = envelope.horizontal_ray_spacing * i as f32;
                let origin = origins.bottom(direction_x) + Vec2::Y * offset;
                let Some(hit) = cast(origin, Vec2::X * direction_x, ray_length) else {
                    continue;
                };
                if hit.distance == 0.0 {
                    continue;
                }
                let push_x = velocity.x - (hit.distance - skin_width) * direction_x;
                add(hit, Vec2::new(push_x, -skin_width), false, true);
            }
        }

        // Riders on top of a platform moving sideways or down are carried
        // after the platform moves.
        if direction_y == -1.0 || (velocity.y == 0.0 && velocity.x != 0.0) {
            let ray_length = skin_width * 2.0;
            for i in 0..envelope.vertical_ray_count {
                let offset = envelope.vertical_ray_spacing * i as f32;
                let origin = origins.top_left + Vec2::X * offset;
                let Some(hit) = cast(origin, Vec2::Y, ray_length) else {
                    continue;
                };
                if hit.distance == 0.0 {
                    continue;
                }
                add(hit, velocity, true, false);
            }
        }

        self.passenger_movement = directives;
    }

    /// Dispatch the directives whose `move_before_platform` matches.
    ///
    /// A passenger the registry does not know is logged and skipped.
    pub fn move_passengers<R: PassengerRegistry + ?Sized>(
        &self,
        registry: &mut R,
        before_move_platform: bool,
        platform: Entity,
    ) {
        for movement in &self.passenger_movement {
            if movement.move_before_platform != before_move_platform {
                continue;
            }
            if !registry.move_passenger(
                movement.passenger,
                movement.velocity,
                movement.standing_on_platform,
            ) {
                warn!(
                    "Platform {platform}: passenger {} has no character controller, skipped",
                    movement.passenger
                );
            }
        }
    }
}
