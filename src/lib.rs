//! # `msg_kinematic_controller`
//!
//! A raycast-driven 2D kinematic platformer controller with physics backend
//! abstraction.
//!
//! This crate provides:
//! - Kinematic characters that sweep their displacement against the world
//!   with fans of rays instead of relying on the physics solver
//! - Slope climbing and descending up to configurable angles
//! - Variable-height jumps, wall sliding, wall sticking and three wall jumps
//! - Moving platforms following waypoints, carrying and pushing passengers
//! - A physics backend abstraction (Rapier2D included)
//!
//! ## Architecture
//!
//! Every body carries a skin-inset envelope of ray origins. Each physics
//! step:
//! 1. Platforms advance along their waypoints and move their passengers,
//!    some before and some after the platform itself
//! 2. Characters turn their input into a velocity and sweep it against the
//!    world, clamping it at walls, floors and ceilings
//! 3. Marker components are synced from each character's collision state
//!
//! The controllers never write positions. They return corrected
//! displacements and the backend systems apply them.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use msg_kinematic_controller::prelude::*;
//!
//! // Tuning for a character and a platform moving 6 units right
//! let character = CharacterConfig::player();
//! let platform = PlatformConfig::between(Vec2::new(6.0, 0.0)).with_wait_time(0.5);
//!
//! // Spawn these with a Transform and a kinematic collider; the plugin
//! // attaches the runtime controllers.
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod character;
pub mod collision;
pub mod config;
pub mod intent;
pub mod platform;
pub mod raycast;
pub mod state;
pub mod sweep;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

#[cfg(test)]
mod test_world;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{KinematicBody, KinematicPhysicsBackend, RayCaster, RaycastRequest};
    pub use crate::character::KinematicCharacterController;
    pub use crate::collision::CollisionData;
    pub use crate::config::{CharacterConfig, JumpConstants, PlatformConfig, RaycastConfig};
    pub use crate::intent::MovementInput;
    pub use crate::platform::{PassengerMovement, PassengerRegistry, PlatformController};
    pub use crate::state::{
        Airborne, CollisionState, Grounded, RayTrace, RaysData, TouchingCeiling, TouchingWall,
    };
    pub use crate::{KinematicControllerPlugin, KinematicControllerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dKinematicBundle};
}

/// System sets of one controller step, chained in this order in
/// `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KinematicControllerSet {
    /// Attach runtime controllers to newly configured entities.
    Preparation,
    /// Move platforms and dispatch their passengers.
    Platforms,
    /// Step character controllers.
    Characters,
    /// Sync marker components from collision state.
    StateSync,
}

/// Main plugin for the kinematic controllers.
///
/// This plugin is generic over a physics backend `B` which provides the
/// ray queries and the systems stepping platforms and characters.
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use msg_kinematic_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(KinematicControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct KinematicControllerPlugin<B: backend::KinematicPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::KinematicPhysicsBackend> Default for KinematicControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::KinematicPhysicsBackend> Plugin for KinematicControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        app.register_type::<config::RaycastConfig>();
        app.register_type::<config::JumpConstants>();
        app.register_type::<config::CharacterConfig>();
        app.register_type::<config::PlatformConfig>();
        app.register_type::<intent::MovementInput>();
        app.register_type::<character::KinematicCharacterController>();
        app.register_type::<platform::PlatformController>();
        app.register_type::<platform::PassengerMovement>();
        app.register_type::<state::CollisionState>();
        app.register_type::<state::RaysData>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::TouchingWall>();
        app.register_type::<state::TouchingCeiling>();

        app.configure_sets(
            FixedUpdate,
            (
                KinematicControllerSet::Preparation,
                KinematicControllerSet::Platforms,
                KinematicControllerSet::Characters,
                KinematicControllerSet::StateSync,
            )
                .chain(),
        );

        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                systems::attach_character_controllers,
                systems::attach_platform_controllers,
            )
                .in_set(KinematicControllerSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(KinematicControllerSet::StateSync),
        );
    }
}
