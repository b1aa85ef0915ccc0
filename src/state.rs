//! Collision state and state marker components.
//!
//! [`CollisionState`] is the per-character record the sweeps write every
//! step. The marker components mirror it for ECS queries and are added or
//! removed by [`sync_state_markers`](crate::systems::sync_state_markers).

use bevy::prelude::*;

/// Contacts and slope state of a character after its last move.
///
/// Owned by exactly one controller. Everything except `slope_angle_old`,
/// `velocity_old`, `face_dir` and `falling_through_platform` is cleared at
/// the start of every move.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct CollisionState {
    pub above: bool,
    pub below: bool,
    pub left: bool,
    pub right: bool,

    pub climbing_slope: bool,
    pub descending_slope: bool,
    /// Angle of the slope being walked on this step (radians).
    pub slope_angle: f32,
    /// `slope_angle` of the previous step.
    pub slope_angle_old: f32,
    /// Displacement requested for this step, before any correction.
    pub velocity_old: Vec2,
    /// Horizontal direction of the last non-zero move (+1 or -1).
    pub face_dir: f32,
    /// Drop-through latch for one-way platforms. Nothing sets it yet.
    pub falling_through_platform: bool,
}

impl Default for CollisionState {
    fn default() -> Self {
        Self {
            above: false,
            below: false,
            left: false,
            right: false,
            climbing_slope: false,
            descending_slope: false,
            slope_angle: 0.0,
            slope_angle_old: 0.0,
            velocity_old: Vec2::ZERO,
            face_dir: 1.0,
            falling_through_platform: false,
        }
    }
}

impl CollisionState {
    /// Clear per-step contacts before a move of `velocity`.
    pub fn reset(&mut self, velocity: Vec2) {
        self.above = false;
        self.below = false;
        self.left = false;
        self.right = false;
        self.climbing_slope = false;
        self.descending_slope = false;

        self.slope_angle_old = self.slope_angle;
        self.slope_angle = 0.0;
        self.velocity_old = velocity;
    }

    /// Clear the drop-through latch.
    pub fn reset_falling_through_platform(&mut self) {
        self.falling_through_platform = false;
    }

    #[inline]
    pub fn touching_wall(&self) -> bool {
        self.left || self.right
    }

    /// Direction of the touched wall: -1 for left, +1 otherwise.
    #[inline]
    pub fn wall_dir_x(&self) -> f32 {
        if self.left { -1.0 } else { 1.0 }
    }
}

/// One ray cast during the last step, for debug overlays.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct RayTrace {
    pub from: Vec2,
    pub to: Vec2,
    /// Hit point, if the ray hit anything.
    pub hit: Option<Vec2>,
}

/// Rays cast during the last step. Overwritten every step.
#[derive(Reflect, Debug, Clone, Default, PartialEq)]
pub struct RaysData {
    pub rays: Vec<RayTrace>,
}

impl RaysData {
    pub fn clear(&mut self) {
        self.rays.clear();
    }

    pub fn push(&mut self, from: Vec2, to: Vec2, hit: Option<Vec2>) {
        self.rays.push(RayTrace { from, to, hit });
    }

    pub fn len(&self) -> usize {
        self.rays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RayTrace> {
        self.rays.iter()
    }

    /// Rays that hit something.
    pub fn hits(&self) -> impl Iterator<Item = &RayTrace> {
        self.rays.iter().filter(|ray| ray.hit.is_some())
    }
}

/// Marker component indicating the character is grounded.
///
/// Present while the last move ended with a contact below.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_kinematic_controller::prelude::*;
///
/// fn count_grounded(q: Query<(), With<Grounded>>) -> usize {
///     q.iter().count()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the character is touching a wall.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct TouchingWall {
    /// Side of the wall: -1 for left, +1 for right.
    pub direction: f32,
}

impl Default for TouchingWall {
    fn default() -> Self {
        Self { direction: 1.0 }
    }
}

impl TouchingWall {
    pub fn new(direction: f32) -> Self {
        Self { direction }
    }

    pub fn is_left(&self) -> bool {
        self.direction < 0.0
    }

    pub fn is_right(&self) -> bool {
        self.direction > 0.0
    }
}

/// Marker component indicating the character's head is against a ceiling.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct TouchingCeiling;
