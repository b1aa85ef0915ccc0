//! Controller configuration components.
//!
//! This module defines the tuning for the raycast envelope, the character
//! movement state machine and the waypoint platforms. Defaults match a
//! character roughly one unit wide and two units tall.

use bevy::prelude::*;

/// Ray envelope settings shared by characters and platforms.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct RaycastConfig {
    /// Collision groups the controller's rays can hit.
    pub collision_mask: u32,
    /// Inward margin rays start from, so they never begin on the surface.
    pub skin_width: f32,
    /// Target distance between neighbouring rays along an edge.
    pub dst_between_rays: f32,
}

impl Default for RaycastConfig {
    fn default() -> Self {
        Self {
            collision_mask: u32::MAX,
            skin_width: 0.015,
            dst_between_rays: 0.25,
        }
    }
}

impl RaycastConfig {
    /// Builder: set collision mask.
    pub fn with_collision_mask(mut self, mask: u32) -> Self {
        self.collision_mask = mask;
        self
    }

    /// Builder: set skin width.
    pub fn with_skin_width(mut self, skin_width: f32) -> Self {
        self.skin_width = skin_width;
        self
    }

    /// Builder: set distance between rays.
    pub fn with_dst_between_rays(mut self, distance: f32) -> Self {
        self.dst_between_rays = distance;
        self
    }
}

/// Jump parameters derived from apex time and jump heights.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct JumpConstants {
    /// Vertical acceleration (negative).
    pub gravity: f32,
    /// Launch velocity that reaches `max_jump_height`.
    pub max_jump_velocity: f32,
    /// Velocity a released jump is cut down to, reaching `min_jump_height`.
    pub min_jump_velocity: f32,
}

impl JumpConstants {
    /// Projectile-motion solution for the given apex time and heights.
    pub fn new(time_to_jump_apex: f32, max_jump_height: f32, min_jump_height: f32) -> Self {
        let gravity = -(2.0 * max_jump_height) / time_to_jump_apex.powi(2);
        Self {
            gravity,
            max_jump_velocity: gravity.abs() * time_to_jump_apex,
            min_jump_velocity: (2.0 * gravity.abs() * min_jump_height).sqrt(),
        }
    }
}

/// Configuration parameters for a kinematic platformer character.
///
/// Adding this component to an entity makes the controller plugin attach a
/// [`KinematicCharacterController`](crate::character::KinematicCharacterController)
/// and a [`MovementInput`](crate::intent::MovementInput) to it.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct CharacterConfig {
    /// Ray envelope settings.
    pub raycast: RaycastConfig,

    // === Slope Settings ===
    /// Steepest slope the character walks up (radians).
    pub max_climb_angle: f32,
    /// Steepest slope the character sticks to while walking down (radians).
    pub max_descend_angle: f32,

    // === Movement Settings ===
    /// Horizontal speed at full input (units/second).
    pub move_speed: f32,
    /// Smoothing time scale while airborne.
    pub acceleration_time_airborne: f32,
    /// Smoothing time scale while grounded.
    pub acceleration_time_grounded: f32,
    /// Base of the exponential horizontal smoothing.
    pub velocity_x_smoothing: f32,
    /// Horizontal speeds below this snap to zero.
    pub velocity_x_min: f32,

    // === Wall Settings ===
    /// Fastest fall speed while sliding down a wall.
    pub wall_slide_speed_max: f32,
    /// Time the character sticks to a wall after pushing away from it.
    pub wall_stick_time: f32,
    /// Jump velocity when pushing towards the wall.
    pub wall_jump_climb: Vec2,
    /// Jump velocity with no horizontal input.
    pub wall_jump_off: Vec2,
    /// Jump velocity when pushing away from the wall.
    pub wall_leap: Vec2,

    // === Jump Settings ===
    /// Time to reach the apex of a full jump (seconds).
    pub time_to_jump_apex: f32,
    /// Apex height of a held jump.
    pub max_jump_height: f32,
    /// Apex height of a jump released immediately.
    pub min_jump_height: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            raycast: RaycastConfig::default(),

            max_climb_angle: 80f32.to_radians(),
            max_descend_angle: 80f32.to_radians(),

            move_speed: 6.0,
            acceleration_time_airborne: 0.2,
            acceleration_time_grounded: 0.1,
            velocity_x_smoothing: 0.2,
            velocity_x_min: 0.0001,

            wall_slide_speed_max: 3.0,
            wall_stick_time: 0.25,
            wall_jump_climb: Vec2::new(10.0, 10.0),
            wall_jump_off: Vec2::new(10.0, 10.0),
            wall_leap: Vec2::new(10.0, 15.0),

            time_to_jump_apex: 0.4,
            max_jump_height: 4.0,
            min_jump_height: 1.0,
        }
    }
}

impl CharacterConfig {
    /// Config for a player character (the defaults).
    pub fn player() -> Self {
        Self::default()
    }

    /// Config with quicker acceleration and a snappier, lower jump.
    pub fn snappy() -> Self {
        Self {
            acceleration_time_airborne: 0.1,
            acceleration_time_grounded: 0.05,
            time_to_jump_apex: 0.3,
            max_jump_height: 3.0,
            ..default()
        }
    }

    /// Derived gravity and jump velocities.
    #[inline]
    pub fn jump_constants(&self) -> JumpConstants {
        JumpConstants::new(
            self.time_to_jump_apex,
            self.max_jump_height,
            self.min_jump_height,
        )
    }

    /// Builder: set ray envelope settings.
    pub fn with_raycast(mut self, raycast: RaycastConfig) -> Self {
        self.raycast = raycast;
        self
    }

    /// Builder: set collision mask.
    pub fn with_collision_mask(mut self, mask: u32) -> Self {
        self.raycast.collision_mask = mask;
        self
    }

    /// Builder: set slope limits (radians).
    pub fn with_slope_limits(mut self, max_climb: f32, max_descend: f32) -> Self {
        self.max_climb_angle = max_climb;
        self.max_descend_angle = max_descend;
        self
    }

    /// Builder: set move speed.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Builder: set acceleration time scales.
    pub fn with_acceleration_times(mut self, grounded: f32, airborne: f32) -> Self {
        self.acceleration_time_grounded = grounded;
        self.acceleration_time_airborne = airborne;
        self
    }

    /// Builder: set jump shape.
    pub fn with_jump(
        mut self,
        time_to_jump_apex: f32,
        max_jump_height: f32,
        min_jump_height: f32,
    ) -> Self {
        self.time_to_jump_apex = time_to_jump_apex;
        self.max_jump_height = max_jump_height;
        self.min_jump_height = min_jump_height;
        self
    }

    /// Builder: set wall slide and stick parameters.
    pub fn with_wall_slide(mut self, slide_speed_max: f32, stick_time: f32) -> Self {
        self.wall_slide_speed_max = slide_speed_max;
        self.wall_stick_time = stick_time;
        self
    }

    /// Builder: set the three wall jump velocities.
    pub fn with_wall_jumps(mut self, climb: Vec2, off: Vec2, leap: Vec2) -> Self {
        self.wall_jump_climb = climb;
        self.wall_jump_off = off;
        self.wall_leap = leap;
        self
    }
}

/// Configuration for a platform moving along waypoints.
///
/// Waypoints are offsets from the platform's position when its controller is
/// created. Adding this component to an entity makes the controller plugin
/// attach a [`PlatformController`](crate::platform::PlatformController).
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct PlatformConfig {
    /// Ray envelope settings. Only `skin_width` and `dst_between_rays` are
    /// used; passenger rays use `passenger_mask`.
    pub raycast: RaycastConfig,
    /// Path offsets relative to the starting position.
    pub local_waypoints: Vec<Vec2>,
    /// Collision groups that count as passengers.
    pub passenger_mask: u32,
    /// Travel speed (units/second).
    pub speed: f32,
    /// Pause at each waypoint (seconds).
    pub wait_time: f32,
    /// Loop back to the first waypoint instead of reversing.
    pub cyclic: bool,
    /// Easing exponent offset, 0 is linear.
    pub ease_amount: f32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            raycast: RaycastConfig::default(),
            local_waypoints: Vec::new(),
            passenger_mask: u32::MAX,
            speed: 5.0,
            wait_time: 0.0,
            cyclic: false,
            ease_amount: 0.0,
        }
    }
}

impl PlatformConfig {
    /// Platform following the given local waypoints.
    pub fn new(local_waypoints: impl IntoIterator<Item = Vec2>) -> Self {
        Self {
            local_waypoints: local_waypoints.into_iter().collect(),
            ..default()
        }
    }

    /// Platform moving back and forth between its start and `offset`.
    pub fn between(offset: Vec2) -> Self {
        Self::new([Vec2::ZERO, offset])
    }

    /// Builder: set speed.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Builder: set wait time at each waypoint.
    pub fn with_wait_time(mut self, wait_time: f32) -> Self {
        self.wait_time = wait_time;
        self
    }

    /// Builder: loop instead of reversing.
    pub fn with_cyclic(mut self, cyclic: bool) -> Self {
        self.cyclic = cyclic;
        self
    }

    /// Builder: set easing, clamped to `0..=2`.
    pub fn with_ease_amount(mut self, ease_amount: f32) -> Self {
        self.ease_amount = ease_amount.clamp(0.0, 2.0);
        self
    }

    /// Builder: set passenger mask.
    pub fn with_passenger_mask(mut self, mask: u32) -> Self {
        self.passenger_mask = mask;
        self
    }

    /// Builder: set ray envelope settings.
    pub fn with_raycast(mut self, raycast: RaycastConfig) -> Self {
        self.raycast = raycast;
        self
    }
}
