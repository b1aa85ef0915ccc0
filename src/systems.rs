//! Backend-independent controller systems.
//!
//! Attaching runtime controllers to configured entities and mirroring the
//! collision state into marker components. The stepping systems live in
//! the backend modules since they need the physics world's ray queries.

use bevy::prelude::*;

use crate::character::KinematicCharacterController;
use crate::config::{CharacterConfig, PlatformConfig};
use crate::intent::MovementInput;
use crate::platform::PlatformController;
use crate::state::{Airborne, Grounded, TouchingCeiling, TouchingWall};

/// Attach a [`KinematicCharacterController`] to every entity with a
/// [`CharacterConfig`] that does not have one yet.
///
/// Entities without [`MovementInput`] get an empty one. Child entities are
/// skipped with a warning, since controllers move the local `Transform`.
pub fn attach_character_controllers(
    mut commands: Commands,
    q_new: Query<
        (Entity, Ref<CharacterConfig>, Has<MovementInput>, Has<ChildOf>),
        Without<KinematicCharacterController>,
    >,
) {
    for (entity, config, has_input, is_child) in &q_new {
        if is_child {
            if config.is_added() {
                warn!("Character {entity} is a child entity and will not be driven");
            }
            continue;
        }
        let mut entity_commands = commands.entity(entity);
        entity_commands.insert(KinematicCharacterController::new(&config));
        if !has_input {
            entity_commands.insert(MovementInput::default());
        }
        debug!("Attached character controller to {entity}");
    }
}

/// Attach a [`PlatformController`] to every entity with a [`PlatformConfig`]
/// that does not have one yet.
///
/// Waypoints are placed relative to the entity's translation at this point.
/// Child entities are skipped with a warning.
pub fn attach_platform_controllers(
    mut commands: Commands,
    q_new: Query<
        (Entity, Ref<PlatformConfig>, &Transform, Has<ChildOf>),
        Without<PlatformController>,
    >,
) {
    for (entity, config, transform, is_child) in &q_new {
        if is_child {
            if config.is_added() {
                warn!("Platform {entity} is a child entity and will not be driven");
            }
            continue;
        }
        let position = transform.translation.xy();
        commands
            .entity(entity)
            .insert(PlatformController::new(&config, position));
        debug!(
            "Attached platform controller to {entity} with {} waypoints",
            config.local_waypoints.len()
        );
    }
}

/// Sync state marker components with the controller's collision state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &KinematicCharacterController,
        Has<Grounded>,
        Has<Airborne>,
        Option<&TouchingWall>,
        Has<TouchingCeiling>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne, wall, has_ceiling) in &q_controllers {
        let collisions = controller.collisions();

        // Grounded/Airborne
        if collisions.below && !has_grounded {
            commands.entity(entity).insert(Grounded);
            commands.entity(entity).remove::<Airborne>();
        } else if !collisions.below && has_grounded {
            commands.entity(entity).remove::<Grounded>();
            commands.entity(entity).insert(Airborne);
        } else if !collisions.below && !has_airborne {
            commands.entity(entity).insert(Airborne);
        }

        if collisions.touching_wall() {
            let direction = collisions.wall_dir_x();
            if wall.is_none_or(|wall| wall.direction != direction) {
                commands.entity(entity).insert(TouchingWall::new(direction));
            }
        } else if wall.is_some() {
            commands.entity(entity).remove::<TouchingWall>();
        }

        if collisions.above && !has_ceiling {
            commands.entity(entity).insert(TouchingCeiling);
        } else if !collisions.above && has_ceiling {
            commands.entity(entity).remove::<TouchingCeiling>();
        }
    }
}
