//! Movement input component.
//!
//! Input represents the desired movement from the player or AI. The
//! character controller reads it once per physics step.

use bevy::prelude::*;

/// Player or AI input for a kinematic character.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_kinematic_controller::prelude::*;
///
/// let mut input = MovementInput::new();
/// input.set_input(Vec2::new(1.0, 0.0));
/// assert!(input.is_moving());
///
/// // Jump key pressed: a jump is latched for the next physics step.
/// input.set_jump_key_state(true);
/// assert!(input.has_jump_request());
///
/// // Holding the key does not latch another one.
/// assert!(input.take_jump_request());
/// input.set_jump_key_state(true);
/// assert!(!input.has_jump_request());
/// ```
#[derive(Component, Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(Component)]
pub struct MovementInput {
    /// Control axis. Only `x` drives movement; `y` is carried for callers.
    pub axis: Vec2,
    /// Whether the jump key is currently held.
    pub jump_held: bool,
    jump_request: bool,
    jump_release: bool,
}

impl MovementInput {
    /// Create empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the control axis, each component clamped to `-1..=1`.
    pub fn set_input(&mut self, axis: Vec2) {
        self.axis = axis.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Set the horizontal axis only.
    pub fn set_horizontal(&mut self, x: f32) {
        self.axis.x = x.clamp(-1.0, 1.0);
    }

    /// Clear the axis.
    pub fn clear(&mut self) {
        self.axis = Vec2::ZERO;
    }

    /// Whether there is horizontal input.
    pub fn is_moving(&self) -> bool {
        self.axis.x != 0.0
    }

    /// Report the jump key state.
    ///
    /// Pressing latches a jump request, releasing latches a jump release.
    /// Both are consumed by the next controller step.
    pub fn set_jump_key_state(&mut self, is_down: bool) {
        if is_down && !self.jump_held {
            self.jump_request = true;
        } else if !is_down && self.jump_held {
            self.jump_release = true;
        }
        self.jump_held = is_down;
    }

    pub fn has_jump_request(&self) -> bool {
        self.jump_request
    }

    pub fn has_jump_release(&self) -> bool {
        self.jump_release
    }

    /// Consume the jump request.
    pub fn take_jump_request(&mut self) -> bool {
        std::mem::take(&mut self.jump_request)
    }

    /// Consume the jump release.
    pub fn take_jump_release(&mut self) -> bool {
        std::mem::take(&mut self.jump_release)
    }
}
