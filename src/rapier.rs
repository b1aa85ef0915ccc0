//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.
//!
//! Characters and platforms are kinematic position-based bodies. The step
//! systems cast rays against the `RapierContext`, write the corrected
//! displacement into the entity's `Transform` and move the collider in the
//! query pipeline right away, so later rays in the same step see it.
//!
//! Controllers must sit on root entities: bounds and displacement are read
//! from and written to the local `Transform`.

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::{KinematicBody, KinematicPhysicsBackend, RaycastRequest};
use crate::character::KinematicCharacterController;
use crate::collision::CollisionData;
use crate::config::{CharacterConfig, PlatformConfig};
use crate::intent::MovementInput;
use crate::platform::PlatformController;

/// Rapier2D physics backend for the kinematic controllers.
pub struct Rapier2dBackend;

impl KinematicPhysicsBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }
}

/// Plugin that sets up the Rapier2D step systems.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        use crate::KinematicControllerSet;

        // Platforms first so riders see this step's platform motion.
        app.add_systems(
            FixedUpdate,
            rapier_move_platforms.in_set(KinematicControllerSet::Platforms),
        );
        app.add_systems(
            FixedUpdate,
            rapier_move_characters.in_set(KinematicControllerSet::Characters),
        );
    }
}

/// World-space bounds of a collider placed by `transform`.
///
/// `transform` is read as world space, which holds for the root entities
/// the controllers drive.
pub fn collider_bounds(collider: &Collider, transform: &Transform) -> Rect {
    let aabb = collider.raw.compute_local_aabb();
    let (_, _, angle) = transform.rotation.to_euler(EulerRot::XYZ);
    let rotation = Vec2::from_angle(angle);
    let translation = transform.translation.xy();

    let corners = [
        Vec2::new(aabb.mins.x, aabb.mins.y),
        Vec2::new(aabb.maxs.x, aabb.mins.y),
        Vec2::new(aabb.mins.x, aabb.maxs.y),
        Vec2::new(aabb.maxs.x, aabb.maxs.y),
    ];
    let mut bounds = Rect::from_center_size(translation + rotation.rotate(corners[0]), Vec2::ZERO);
    for corner in &corners[1..] {
        bounds = bounds.union_point(translation + rotation.rotate(*corner));
    }
    bounds
}

/// Snapshot of a kinematic entity for one step.
pub fn kinematic_body(entity: Entity, transform: &Transform, collider: &Collider) -> KinematicBody {
    KinematicBody::new(
        entity,
        transform.translation.xy(),
        collider_bounds(collider, transform),
    )
}

/// Perform a raycast using RapierContext.
///
/// The request mask is matched against the colliders' collision group
/// memberships. Sensors never block rays.
pub fn rapier_raycast(context: &RapierContext, request: &RaycastRequest) -> Option<CollisionData> {
    if request.direction == Vec2::ZERO {
        return None;
    }

    let mut filter = QueryFilter::default()
        .exclude_sensors()
        .groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(request.collision_mask),
        ));
    if let Some(entity) = request.exclude {
        filter = filter.exclude_rigid_body(entity).exclude_collider(entity);
    }

    context
        .cast_ray_and_get_normal(
            request.origin,
            request.direction,
            request.max_distance,
            true, // solid: a ray starting inside a collider hits at 0
            filter,
        )
        .map(|(hit_entity, hit)| {
            CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
        })
}

/// Read-only view of a writable context, for ray queries.
fn read_context<'a>(context: &'a RapierContextMut<'_>) -> RapierContext<'a> {
    RapierContext {
        simulation: &context.simulation,
        colliders: &context.colliders,
        joints: &context.joints,
        query_pipeline: &context.query_pipeline,
        rigidbody_set: &context.rigidbody_set,
    }
}

/// Move the collider of `entity` to its current translation and refit the
/// query pipeline around it.
///
/// Rapier only moves kinematic colliders during its own step, so without
/// this every later ray in the same step would hit the old position.
fn sync_collider(context: &mut RapierContextMut<'_>, entity: Entity, transform: &Transform) {
    let Some(&handle) = context.colliders.entity2collider().get(&entity) else {
        return;
    };
    let Some(collider) = context.colliders.colliders.get_mut(handle) else {
        return;
    };
    collider.set_translation(transform.translation.xy().into());
    context.query_pipeline.query_pipeline.update_incremental(
        &context.colliders.colliders,
        &[handle],
        &[],
        true,
    );
}

type PassengerQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static CharacterConfig,
        &'static mut KinematicCharacterController,
        &'static mut Transform,
        &'static Collider,
    ),
    Without<PlatformController>,
>;

/// Dispatch one pass of a platform's passenger directives.
///
/// The character query is the passenger registry: a passenger without a
/// character controller is logged and skipped.
fn carry_passengers(
    context: &mut RapierContextMut<'_>,
    q_characters: &mut PassengerQuery,
    platform: &PlatformController,
    platform_entity: Entity,
    before_move_platform: bool,
) {
    let mut registry = |passenger: Entity, velocity: Vec2, standing: bool| {
        let Ok((config, mut controller, mut transform, collider)) = q_characters.get_mut(passenger)
        else {
            return false;
        };
        let body = kinematic_body(passenger, &transform, collider);
        let moved = {
            let view = read_context(&*context);
            let caster = |request: &RaycastRequest| rapier_raycast(&view, request);
            controller.move_with_zero_input(&caster, &body, config, velocity, standing)
        };
        transform.translation += moved.extend(0.0);
        sync_collider(&mut *context, passenger, &transform);
        true
    };

    platform.move_passengers(&mut registry, before_move_platform, platform_entity);
}

/// Move every platform along its waypoints and carry its passengers.
///
/// Every move is written back into the query pipeline right away, so riders
/// carried after the platform are seated on its new position.
#[allow(clippy::type_complexity)]
fn rapier_move_platforms(
    mut rapier_context: WriteRapierContext,
    time: Res<Time<Fixed>>,
    mut q_platforms: Query<
        (
            Entity,
            &PlatformConfig,
            &mut PlatformController,
            &mut Transform,
            &Collider,
        ),
        Without<KinematicCharacterController>,
    >,
    mut q_characters: PassengerQuery,
) {
    let Ok(mut context) = rapier_context.single_mut() else {
        return;
    };
    let dt = time.timestep().as_secs_f32();

    for (entity, config, mut platform, mut transform, collider) in &mut q_platforms {
        let body = kinematic_body(entity, &transform, collider);
        let velocity = {
            let view = read_context(&context);
            let caster = |request: &RaycastRequest| rapier_raycast(&view, request);
            platform.plan_step(&caster, &body, config, dt)
        };

        carry_passengers(&mut context, &mut q_characters, &platform, entity, true);
        transform.translation += velocity.extend(0.0);
        sync_collider(&mut context, entity, &transform);
        carry_passengers(&mut context, &mut q_characters, &platform, entity, false);
    }
}

/// Step every character controller with its current input.
fn rapier_move_characters(
    mut rapier_context: WriteRapierContext,
    time: Res<Time<Fixed>>,
    mut q_characters: Query<(
        Entity,
        &CharacterConfig,
        &mut KinematicCharacterController,
        &mut MovementInput,
        &mut Transform,
        &Collider,
    )>,
) {
    let Ok(mut context) = rapier_context.single_mut() else {
        return;
    };
    let dt = time.timestep().as_secs_f32();

    for (entity, config, mut controller, mut input, mut transform, collider) in &mut q_characters {
        let body = kinematic_body(entity, &transform, collider);
        let displacement = {
            let view = read_context(&context);
            let caster = |request: &RaycastRequest| rapier_raycast(&view, request);
            controller.update(&caster, &body, config, &mut input, dt)
        };
        transform.translation += displacement.extend(0.0);
        sync_collider(&mut context, entity, &transform);
    }
}

/// Bundle for a kinematic character or platform with Rapier2D physics.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use msg_kinematic_controller::prelude::*;
/// use msg_kinematic_controller::rapier::Rapier2dKinematicBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 5.0, 0.0),
///         CharacterConfig::player(),
///         Rapier2dKinematicBundle::cuboid(Vec2::new(0.5, 1.0)),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier2dKinematicBundle {
    /// Always [`RigidBody::KinematicPositionBased`]: the controllers write
    /// the `Transform`, Rapier only follows it.
    pub rigid_body: RigidBody,
    pub collider: Collider,
    /// Memberships are what ray masks of other controllers match against.
    pub collision_groups: CollisionGroups,
}

impl Rapier2dKinematicBundle {
    /// Create a bundle with the given collider.
    pub fn new(collider: Collider) -> Self {
        Self {
            rigid_body: RigidBody::KinematicPositionBased,
            collider,
            collision_groups: CollisionGroups::default(),
        }
    }

    /// Box collider with the given half extents.
    pub fn cuboid(half_extents: Vec2) -> Self {
        Self::new(Collider::cuboid(half_extents.x, half_extents.y))
    }

    /// Set collision group memberships, as matched by ray masks.
    pub fn with_memberships(mut self, memberships: u32) -> Self {
        self.collision_groups.memberships = Group::from_bits_truncate(memberships);
        self
    }
}
