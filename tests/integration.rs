//! Integration tests for the kinematic controllers.
//!
//! These tests run the full plugin stack against Rapier2D colliders.

#![cfg(feature = "rapier2d")]

use bevy::prelude::*;
use bevy::time::Virtual;
use bevy_rapier2d::prelude::*;
use msg_kinematic_controller::prelude::*;
use msg_kinematic_controller::prelude::KinematicCharacterController;

const CHARACTER_HALF_EXTENTS: Vec2 = Vec2::new(0.5, 1.0);

/// Create a minimal test app with physics and the kinematic controllers.
fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(TransformPlugin);
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
    app.add_plugins(KinematicControllerPlugin::<Rapier2dBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));

    app.finish();
    app.cleanup();
    app
}

/// Spawn a static box collider.
fn spawn_ground(app: &mut App, position: Vec2, half_size: Vec2) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            RigidBody::Fixed,
            Collider::cuboid(half_size.x, half_size.y),
        ))
        .id()
}

fn spawn_character(app: &mut App, position: Vec2) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            CharacterConfig::player(),
            Rapier2dKinematicBundle::cuboid(CHARACTER_HALF_EXTENTS),
        ))
        .id()
}

fn spawn_platform(
    app: &mut App,
    position: Vec2,
    half_size: Vec2,
    config: PlatformConfig,
) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            config,
            Rapier2dKinematicBundle::cuboid(half_size),
        ))
        .id()
}

/// Run one physics step.
fn tick(app: &mut App) {
    let timestep = std::time::Duration::from_secs_f64(1.0 / 60.0);
    app.world_mut()
        .resource_mut::<Time<Virtual>>()
        .advance_by(timestep);
    app.update();
    app.world_mut().run_schedule(FixedUpdate);
    app.update();
}

/// Run the app for N physics frames.
fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        tick(app);
    }
}

fn position(app: &App, entity: Entity) -> Vec2 {
    app.world()
        .get::<Transform>(entity)
        .map(|t| t.translation.xy())
        .unwrap_or(Vec2::NAN)
}

fn set_input(app: &mut App, entity: Entity, axis: Vec2) {
    if let Some(mut input) = app.world_mut().get_mut::<MovementInput>(entity) {
        input.set_input(axis);
    }
}

fn set_jump_key(app: &mut App, entity: Entity, is_down: bool) {
    if let Some(mut input) = app.world_mut().get_mut::<MovementInput>(entity) {
        input.set_jump_key_state(is_down);
    }
}

// ==================== Character Tests ====================

mod character {
    use super::*;

    #[test]
    fn controllers_are_attached() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app, Vec2::new(0.0, 5.0));

        tick(&mut app);

        let world = app.world();
        assert!(world.get::<KinematicCharacterController>(character).is_some());
        assert!(world.get::<MovementInput>(character).is_some());
        assert!(world.get::<Airborne>(character).is_some());
    }

    #[test]
    fn falls_and_lands_on_ground() {
        let mut app = create_test_app();
        // Ground top at y = 0.
        spawn_ground(&mut app, Vec2::new(0.0, -1.0), Vec2::new(20.0, 1.0));
        let character = spawn_character(&mut app, Vec2::new(0.0, 5.0));

        run_frames(&mut app, 120);

        let pos = position(&app, character);
        println!("PROOF: landed at y = {}", pos.y);
        assert!(app.world().get::<Grounded>(character).is_some());
        assert!(app.world().get::<Airborne>(character).is_none());
        assert!((pos.y - CHARACTER_HALF_EXTENTS.y).abs() < 0.1);

        let Some(controller) = app.world().get::<KinematicCharacterController>(character) else {
            panic!("controller missing");
        };
        assert!(controller.collisions().below);
        assert_eq!(controller.velocity.y, 0.0);
        assert!(!controller.rays().is_empty());
    }

    #[test]
    fn walks_with_input() {
        let mut app = create_test_app();
        spawn_ground(&mut app, Vec2::new(0.0, -1.0), Vec2::new(50.0, 1.0));
        let character = spawn_character(&mut app, Vec2::new(0.0, 1.5));
        run_frames(&mut app, 60);

        let start = position(&app, character);
        set_input(&mut app, character, Vec2::X);
        run_frames(&mut app, 60);

        let end = position(&app, character);
        println!("PROOF: walked from {} to {}", start.x, end.x);
        assert!(end.x - start.x > 2.0);
        assert!((end.y - start.y).abs() < 0.1);
    }

    #[test]
    fn jumps_when_grounded() {
        let mut app = create_test_app();
        spawn_ground(&mut app, Vec2::new(0.0, -1.0), Vec2::new(20.0, 1.0));
        let character = spawn_character(&mut app, Vec2::new(0.0, 1.5));
        run_frames(&mut app, 60);
        let ground_y = position(&app, character).y;

        set_jump_key(&mut app, character, true);
        let mut peak = ground_y;
        for _ in 0..60 {
            tick(&mut app);
            peak = peak.max(position(&app, character).y);
        }
        set_jump_key(&mut app, character, false);

        println!("PROOF: jump peak {} above ground", peak - ground_y);
        assert!(peak - ground_y > 2.0);

        run_frames(&mut app, 120);
        assert!(app.world().get::<Grounded>(character).is_some());
    }

    #[test]
    fn wall_contact_sets_marker() {
        let mut app = create_test_app();
        spawn_ground(&mut app, Vec2::new(0.0, -1.0), Vec2::new(20.0, 1.0));
        // Wall face at x = 3.
        spawn_ground(&mut app, Vec2::new(4.0, 5.0), Vec2::new(1.0, 5.0));
        let character = spawn_character(&mut app, Vec2::new(0.0, 1.5));
        run_frames(&mut app, 30);

        set_input(&mut app, character, Vec2::X);
        run_frames(&mut app, 120);

        let pos = position(&app, character);
        println!("PROOF: stopped at x = {}", pos.x);
        assert!(pos.x + CHARACTER_HALF_EXTENTS.x <= 3.0 + 0.05);
        assert!(
            app.world()
                .get::<TouchingWall>(character)
                .is_some_and(|wall| wall.is_right())
        );
    }
}

// ==================== Platform Tests ====================

mod platforms {
    use super::*;

    #[test]
    fn ping_pongs_between_waypoints() {
        let mut app = create_test_app();
        let platform = spawn_platform(
            &mut app,
            Vec2::ZERO,
            Vec2::new(1.0, 0.25),
            PlatformConfig::between(Vec2::new(4.0, 0.0)).with_speed(5.0),
        );

        let mut max_x = f32::MIN;
        let mut came_back = false;
        for _ in 0..200 {
            tick(&mut app);
            let x = position(&app, platform).x;
            assert!((-0.01..=4.01).contains(&x), "platform left its path at {x}");
            max_x = max_x.max(x);
            if max_x > 3.9 && x < 0.1 {
                came_back = true;
            }
        }

        println!("PROOF: max x {max_x}, came back {came_back}");
        assert!(max_x > 3.9);
        assert!(came_back);
    }

    #[test]
    fn carries_rider() {
        let mut app = create_test_app();
        let platform = spawn_platform(
            &mut app,
            Vec2::ZERO,
            Vec2::new(2.0, 0.25),
            PlatformConfig::between(Vec2::new(20.0, 0.0)).with_speed(2.0),
        );
        let rider = spawn_character(&mut app, Vec2::new(0.0, 1.3));

        run_frames(&mut app, 90);

        let platform_pos = position(&app, platform);
        let rider_pos = position(&app, rider);
        println!("PROOF: platform at {platform_pos}, rider at {rider_pos}");
        assert!(platform_pos.x > 1.0);
        assert!((rider_pos.x - platform_pos.x).abs() < 0.2);
        assert!((rider_pos.y - platform_pos.y - 1.25).abs() < 0.1);
        assert!(app.world().get::<Grounded>(rider).is_some());

        let Some(controller) = app.world().get::<PlatformController>(platform) else {
            panic!("platform controller missing");
        };
        assert!(!controller.rays().is_empty());
    }

    #[test]
    fn descending_platform_keeps_rider_seated() {
        let mut app = create_test_app();
        let half_size = Vec2::new(2.0, 0.25);
        let platform = spawn_platform(
            &mut app,
            Vec2::ZERO,
            half_size,
            PlatformConfig::between(Vec2::new(0.0, -20.0)).with_speed(3.0),
        );
        let rider = spawn_character(&mut app, Vec2::new(0.0, 1.3));
        run_frames(&mut app, 30);

        let mut grounded = 0;
        let mut max_gap = 0.0_f32;
        for _ in 0..90 {
            tick(&mut app);
            let platform_top = position(&app, platform).y + half_size.y;
            let rider_bottom = position(&app, rider).y - CHARACTER_HALF_EXTENTS.y;
            max_gap = max_gap.max((rider_bottom - platform_top).abs());
            if app.world().get::<Grounded>(rider).is_some() {
                grounded += 1;
            }
        }

        println!("PROOF: grounded {grounded}/90, max gap {max_gap}");
        assert!(position(&app, platform).y < -4.0);
        assert_eq!(grounded, 90);
        assert!(max_gap < 0.05);
    }

    #[test]
    fn despawned_passenger_is_dropped() {
        let mut app = create_test_app();
        let platform = spawn_platform(
            &mut app,
            Vec2::ZERO,
            Vec2::new(2.0, 0.25),
            PlatformConfig::between(Vec2::new(20.0, 0.0)).with_speed(2.0),
        );
        let rider = spawn_character(&mut app, Vec2::new(0.0, 1.3));
        run_frames(&mut app, 30);

        app.world_mut().despawn(rider);
        let before = position(&app, platform);
        run_frames(&mut app, 30);

        assert!(position(&app, platform).x > before.x);
    }
}
