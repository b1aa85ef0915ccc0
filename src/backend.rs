//! Physics backend abstraction.
//!
//! The controllers never talk to a physics engine directly. They need three
//! things from the physics world:
//!
//! - ray intersection queries ([`RayCaster`])
//! - the current bounds of the body they drive ([`KinematicBody`])
//! - a place to write the corrected displacement back to (done by the caller)
//!
//! A backend ([`KinematicPhysicsBackend`]) wires these up for a concrete
//! engine and installs the systems that step the controllers. See the
//! `rapier` module's `Rapier2dBackend` for the Bevy Rapier2D implementation.

use bevy::prelude::*;

use crate::collision::CollisionData;

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the kinematic
/// controllers. The backend plugin is responsible for scheduling the
/// platform and character step systems in
/// [`KinematicControllerSet::Platforms`](crate::KinematicControllerSet::Platforms)
/// and [`KinematicControllerSet::Characters`](crate::KinematicControllerSet::Characters),
/// since those need the engine's ray query at system-parameter level.
pub trait KinematicPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;
}

/// Ray intersection query against the physics world.
///
/// Implementations must return the closest hit along the ray within
/// `max_distance`, ignoring the excluded entity and any body whose collision
/// groups do not intersect `collision_mask`.
///
/// Any `Fn(&RaycastRequest) -> Option<CollisionData>` is a `RayCaster`, which
/// is how backends hand a borrowed query context to the controllers.
pub trait RayCaster {
    /// Cast a single ray and return the closest hit.
    fn cast_ray(&self, request: &RaycastRequest) -> Option<CollisionData>;
}

impl<F> RayCaster for F
where
    F: Fn(&RaycastRequest) -> Option<CollisionData>,
{
    fn cast_ray(&self, request: &RaycastRequest) -> Option<CollisionData> {
        self(request)
    }
}

/// Helper struct for building raycasts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastRequest {
    /// Origin point of the ray.
    pub origin: Vec2,
    /// Direction of the ray (normalized).
    pub direction: Vec2,
    /// Maximum distance to cast.
    pub max_distance: f32,
    /// Collision groups the ray can hit.
    pub collision_mask: u32,
    /// Entity to exclude from results.
    pub exclude: Option<Entity>,
}

impl RaycastRequest {
    /// Create a new raycast request that can hit everything.
    pub fn new(origin: Vec2, direction: Vec2, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            max_distance,
            collision_mask: u32::MAX,
            exclude: None,
        }
    }

    /// Restrict the ray to the given collision groups.
    pub fn with_mask(mut self, collision_mask: u32) -> Self {
        self.collision_mask = collision_mask;
        self
    }

    /// Exclude an entity from the raycast.
    pub fn excluding(mut self, entity: Entity) -> Self {
        self.exclude = Some(entity);
        self
    }

    /// End point of the ray at full length.
    #[inline]
    pub fn end(&self) -> Vec2 {
        self.origin + self.direction * self.max_distance
    }
}

/// Snapshot of the body a controller drives, taken right before a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicBody {
    /// Body identity, excluded from the body's own ray queries.
    pub entity: Entity,
    /// Current world position.
    pub position: Vec2,
    /// Current world-space axis-aligned bounds, including rotation.
    pub bounds: Rect,
}

impl KinematicBody {
    /// Create a body snapshot.
    pub fn new(entity: Entity, position: Vec2, bounds: Rect) -> Self {
        Self {
            entity,
            position,
            bounds,
        }
    }

    /// Create a snapshot of an axis-aligned box centered on `position`.
    pub fn from_half_extents(entity: Entity, position: Vec2, half_extents: Vec2) -> Self {
        Self::new(
            entity,
            position,
            Rect::from_center_half_size(position, half_extents),
        )
    }

    /// The same body moved by `delta`.
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            entity: self.entity,
            position: self.position + delta,
            bounds: Rect {
                min: self.bounds.min + delta,
                max: self.bounds.max + delta,
            },
        }
    }
}
