//! Kinematic platformer character controller.
//!
//! Turns [`MovementInput`] and gravity into a velocity every physics step
//! and moves the body with a [`CollisionSweep`]. Handles horizontal
//! smoothing, wall slide and stick, wall jumps and variable jump height.

use bevy::prelude::*;

use crate::backend::{KinematicBody, RayCaster};
use crate::config::{CharacterConfig, JumpConstants};
use crate::intent::MovementInput;
use crate::state::{CollisionState, RaysData};
use crate::sweep::{CollisionSweep, sign};

/// Runtime state of a kinematic character.
///
/// Attached automatically to entities with a [`CharacterConfig`]. The
/// velocity is integrated across steps; the collision state is rebuilt by
/// every move.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct KinematicCharacterController {
    /// Velocity in units/second.
    pub velocity: Vec2,
    time_to_wall_unstick: f32,
    jump: JumpConstants,
    collisions: CollisionState,
    rays: RaysData,
}

impl Default for KinematicCharacterController {
    fn default() -> Self {
        Self::new(&CharacterConfig::default())
    }
}

impl KinematicCharacterController {
    /// Create a controller, deriving the jump constants from `config`.
    pub fn new(config: &CharacterConfig) -> Self {
        Self {
            velocity: Vec2::ZERO,
            time_to_wall_unstick: 0.0,
            jump: config.jump_constants(),
            collisions: CollisionState::default(),
            rays: RaysData::default(),
        }
    }

    /// Contacts of the last move.
    pub fn collisions(&self) -> &CollisionState {
        &self.collisions
    }

    /// Mutable contacts, e.g. to reset the drop-through latch.
    pub fn collisions_mut(&mut self) -> &mut CollisionState {
        &mut self.collisions
    }

    /// Rays cast by the last move.
    pub fn rays(&self) -> &RaysData {
        &self.rays
    }

    pub fn jump_constants(&self) -> &JumpConstants {
        &self.jump
    }

    /// Remaining wall stick time.
    pub fn time_to_wall_unstick(&self) -> f32 {
        self.time_to_wall_unstick
    }

    pub fn is_grounded(&self) -> bool {
        self.collisions.below
    }

    /// Run one physics step and return the displacement to apply.
    ///
    /// Consumes the jump request and release latched on `input`.
    pub fn update<C: RayCaster + ?Sized>(
        &mut self,
        caster: &C,
        body: &KinematicBody,
        config: &CharacterConfig,
        input: &mut MovementInput,
        dt: f32,
    ) -> Vec2 {
        let axis_x = input.axis.x;
        let wall_dir_x = self.collisions.wall_dir_x();

        self.smooth_horizontal(config, axis_x, dt);

        let mut wall_sliding = false;
        if self.collisions.touching_wall() && !self.collisions.below && self.velocity.y < 0.0 {
            wall_sliding = true;
            self.wall_slide(config, axis_x, wall_dir_x, dt);
        }

        if input.take_jump_request() {
            if wall_sliding {
                let jump = if axis_x == 0.0 {
                    config.wall_jump_off
                } else if sign(axis_x) == wall_dir_x {
                    config.wall_jump_climb
                } else {
                    config.wall_leap
                };
                self.velocity = Vec2::new(-wall_dir_x * jump.x, jump.y);
            }
            // Independent of the wall jump.
            if self.collisions.below {
                self.velocity.y = self.jump.max_jump_velocity;
            }
        }

        if input.take_jump_release() && self.velocity.y > self.jump.min_jump_velocity {
            self.velocity.y = self.jump.min_jump_velocity;
        }

        self.velocity.y += self.jump.gravity * dt;

        let displacement = self.move_body(caster, body, config, self.velocity * dt, false);

        if self.collisions.above || self.collisions.below {
            self.velocity.y = 0.0;
        }

        displacement
    }

    /// Move by a forced displacement with no input, as a platform does to
    /// its passengers. Returns the corrected displacement.
    pub fn move_with_zero_input<C: RayCaster + ?Sized>(
        &mut self,
        caster: &C,
        body: &KinematicBody,
        config: &CharacterConfig,
        displacement: Vec2,
        standing_on_platform: bool,
    ) -> Vec2 {
        self.move_body(caster, body, config, displacement, standing_on_platform)
    }

    fn move_body<C: RayCaster + ?Sized>(
        &mut self,
        caster: &C,
        body: &KinematicBody,
        config: &CharacterConfig,
        displacement: Vec2,
        standing_on_platform: bool,
    ) -> Vec2 {
        CollisionSweep::new(caster, body, config).move_body(
            displacement,
            standing_on_platform,
            &mut self.collisions,
            &mut self.rays,
        )
    }

    fn smooth_horizontal(&mut self, config: &CharacterConfig, axis_x: f32, dt: f32) {
        let target_velocity_x = axis_x * config.move_speed;
        let acceleration_time = if self.collisions.below {
            config.acceleration_time_grounded
        } else {
            config.acceleration_time_airborne
        };
        let smoothing = config.velocity_x_smoothing * acceleration_time;
        let factor = 1.0 - smoothing.powf(dt);

        self.velocity.x += (target_velocity_x - self.velocity.x) * factor;
        if self.velocity.x.abs() < config.velocity_x_min {
            self.velocity.x = 0.0;
        }
    }

    fn wall_slide(&mut self, config: &CharacterConfig, axis_x: f32, wall_dir_x: f32, dt: f32) {
        if self.velocity.y < -config.wall_slide_speed_max {
            self.velocity.y = -config.wall_slide_speed_max;
        }

        if self.time_to_wall_unstick > 0.0 {
            self.velocity.x = 0.0;

            let pushing_away = axis_x != 0.0 && sign(axis_x) != wall_dir_x;
            if pushing_away {
                self.time_to_wall_unstick -= dt;
            } else {
                self.time_to_wall_unstick = config.wall_stick_time;
            }
        } else {
            self.time_to_wall_unstick = config.wall_stick_time;
        }
    }
}
