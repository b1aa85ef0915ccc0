//! Analytic ray world for unit tests.
//!
//! Static geometry is a set of one-sided segments (rays only hit their front
//! face), and movable bodies are axis-aligned boxes keyed by entity.

use bevy::prelude::*;

use crate::backend::{KinematicBody, RayCaster, RaycastRequest};
use crate::collision::CollisionData;

/// Collision group of static geometry.
pub const GROUND_GROUP: u32 = 0b01;
/// Collision group of test bodies unless set otherwise.
pub const BODY_GROUP: u32 = 0b10;

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: Vec2,
    b: Vec2,
    normal: Vec2,
}

impl Segment {
    /// Segment whose front face is on the left of `a -> b`.
    fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            a,
            b,
            normal: (b - a).perp().normalize(),
        }
    }

    fn intersect(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<(f32, Vec2)> {
        if direction.dot(self.normal) >= 0.0 {
            return None;
        }
        let edge = self.b - self.a;
        let denominator = direction.perp_dot(edge);
        if denominator == 0.0 {
            return None;
        }
        let to_start = self.a - origin;
        let t = to_start.perp_dot(edge) / denominator;
        let u = to_start.perp_dot(direction) / denominator;
        if !(0.0..=max_distance).contains(&t) || !(0.0..=1.0).contains(&u) {
            return None;
        }
        Some((t, self.normal))
    }
}

#[derive(Debug, Clone, Copy)]
struct TestBox {
    entity: Entity,
    center: Vec2,
    half_extents: Vec2,
    groups: u32,
}

impl TestBox {
    fn segments(&self) -> [Segment; 4] {
        let min = self.center - self.half_extents;
        let max = self.center + self.half_extents;
        let bottom_right = Vec2::new(max.x, min.y);
        let top_left = Vec2::new(min.x, max.y);
        // Counter-clockwise so every face points outward.
        [
            Segment::new(bottom_right, min),
            Segment::new(max, bottom_right),
            Segment::new(top_left, max),
            Segment::new(min, top_left),
        ]
    }
}

#[derive(Debug, Default)]
pub struct TestWorld {
    segments: Vec<Segment>,
    boxes: Vec<TestBox>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Floor surface at `y`, solid below.
    pub fn with_floor(mut self, y: f32, x0: f32, x1: f32) -> Self {
        self.segments
            .push(Segment::new(Vec2::new(x0, y), Vec2::new(x1, y)));
        self
    }

    /// Ceiling surface at `y`, solid above.
    pub fn with_ceiling(mut self, y: f32, x0: f32, x1: f32) -> Self {
        self.segments
            .push(Segment::new(Vec2::new(x1, y), Vec2::new(x0, y)));
        self
    }

    /// Wall surface at `x` whose front face points along `facing` (-1 or 1).
    pub fn with_wall(mut self, x: f32, y0: f32, y1: f32, facing: f32) -> Self {
        let (a, b) = if facing < 0.0 {
            (Vec2::new(x, y0), Vec2::new(x, y1))
        } else {
            (Vec2::new(x, y1), Vec2::new(x, y0))
        };
        self.segments.push(Segment::new(a, b));
        self
    }

    /// Walkable ramp starting at `start`, rising at `angle` towards +x.
    pub fn with_ramp(mut self, start: Vec2, angle: f32, length: f32) -> Self {
        let end = start + Vec2::from_angle(angle) * length;
        self.segments.push(Segment::new(start, end));
        self
    }

    /// Add a movable box in [`BODY_GROUP`].
    pub fn add_box(&mut self, entity: Entity, center: Vec2, half_extents: Vec2) {
        self.add_box_in_groups(entity, center, half_extents, BODY_GROUP);
    }

    pub fn add_box_in_groups(
        &mut self,
        entity: Entity,
        center: Vec2,
        half_extents: Vec2,
        groups: u32,
    ) {
        self.boxes.push(TestBox {
            entity,
            center,
            half_extents,
            groups,
        });
    }

    /// Snapshot of a box as a kinematic body.
    pub fn body(&self, entity: Entity) -> Option<KinematicBody> {
        self.boxes
            .iter()
            .find(|b| b.entity == entity)
            .map(|b| KinematicBody::from_half_extents(b.entity, b.center, b.half_extents))
    }

    pub fn position(&self, entity: Entity) -> Option<Vec2> {
        self.boxes
            .iter()
            .find(|b| b.entity == entity)
            .map(|b| b.center)
    }

    pub fn translate(&mut self, entity: Entity, delta: Vec2) {
        if let Some(b) = self.boxes.iter_mut().find(|b| b.entity == entity) {
            b.center += delta;
        }
    }
}

impl RayCaster for TestWorld {
    fn cast_ray(&self, request: &RaycastRequest) -> Option<CollisionData> {
        let origin = request.origin;
        let direction = request.direction;
        let mut closest: Option<CollisionData> = None;

        let mut consider = |hit: Option<(f32, Vec2)>, entity: Option<Entity>| {
            let Some((distance, normal)) = hit else {
                return;
            };
            if closest.is_none_or(|c| distance < c.distance) {
                closest = Some(CollisionData::new(
                    distance,
                    normal,
                    origin + direction * distance,
                    entity,
                ));
            }
        };

        if request.collision_mask & GROUND_GROUP != 0 {
            for segment in &self.segments {
                consider(
                    segment.intersect(origin, direction, request.max_distance),
                    None,
                );
            }
        }

        for body in &self.boxes {
            if Some(body.entity) == request.exclude || request.collision_mask & body.groups == 0 {
                continue;
            }
            for segment in body.segments() {
                consider(
                    segment.intersect(origin, direction, request.max_distance),
                    Some(body.entity),
                );
            }
        }

        closest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_is_hit_from_above_only() {
        let world = TestWorld::new().with_floor(0.0, -5.0, 5.0);

        let down = world.cast_ray(&RaycastRequest::new(Vec2::new(0.0, 2.0), Vec2::NEG_Y, 5.0));
        let up = world.cast_ray(&RaycastRequest::new(Vec2::new(0.0, -2.0), Vec2::Y, 5.0));

        let down = down.unwrap();
        assert!((down.distance - 2.0).abs() < 1e-6);
        assert_eq!(down.normal, Vec2::Y);
        assert!(up.is_none());
    }

    #[test]
    fn box_faces_point_outward() {
        let mut world = TestWorld::new();
        let entity = Entity::from_raw(3);
        world.add_box(entity, Vec2::ZERO, Vec2::splat(1.0));

        let from_left = world
            .cast_ray(&RaycastRequest::new(Vec2::new(-3.0, 0.0), Vec2::X, 5.0))
            .unwrap();
        let from_above = world
            .cast_ray(&RaycastRequest::new(Vec2::new(0.0, 3.0), Vec2::NEG_Y, 5.0))
            .unwrap();

        assert_eq!(from_left.normal, Vec2::NEG_X);
        assert_eq!(from_left.entity, Some(entity));
        assert!((from_left.distance - 2.0).abs() < 1e-6);
        assert_eq!(from_above.normal, Vec2::Y);
    }

    #[test]
    fn mask_and_exclusion_filter_boxes() {
        let mut world = TestWorld::new();
        let entity = Entity::from_raw(3);
        world.add_box(entity, Vec2::ZERO, Vec2::splat(1.0));
        let request = RaycastRequest::new(Vec2::new(-3.0, 0.0), Vec2::X, 5.0);

        assert!(world.cast_ray(&request.excluding(entity)).is_none());
        assert!(world.cast_ray(&request.with_mask(GROUND_GROUP)).is_none());
        assert!(world.cast_ray(&request.with_mask(BODY_GROUP)).is_some());
    }
}
