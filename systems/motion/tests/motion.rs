use std::time::Duration;

use caveslave_core::{CellCoord, Command, Event, Facing, GameMode, TileKind};
use caveslave_system_motion::{Damping, Motion, MotionConfig, MotionInput};
use caveslave_world::{self as world, query, Grid, World, WorldSettings};
use glam::Vec2;

const RIGHT: MotionInput = MotionInput {
    horizontal: 1.0,
    vertical: 0.0,
    jump_pressed: false,
};

fn world_with(grid: Grid) -> World {
    World::from_grid(grid, &WorldSettings::default()).expect("valid settings")
}

fn teleport(world: &mut World, position: Vec2, velocity: Vec2) {
    let mut body = query::player(world);
    body.rect.x = position.x;
    body.rect.y = position.y;
    body.velocity = velocity;
    let mut events = Vec::new();
    world::apply(world, Command::MovePlayer { body }, &mut events);
}

fn enter_play_mode(world: &mut World) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SetPlayMode {
            mode: GameMode::Play,
        },
        &mut events,
    );
    events
}

fn frame(
    world: &mut World,
    motion: &mut Motion,
    events: &[Event],
    input: MotionInput,
    dt: Duration,
) -> Vec<Event> {
    let mut commands = Vec::new();
    motion.handle(
        events,
        input,
        query::player(world),
        query::tile_view(world),
        dt,
        &mut commands,
    );

    let mut next = Vec::new();
    for command in commands {
        world::apply(world, command, &mut next);
    }
    next
}

#[test]
fn player_moving_right_stops_against_tile() {
    let mut grid = Grid::new(10, 10).expect("valid grid");
    assert!(grid.place(CellCoord::new(2, 1), TileKind::new(1)));
    let mut world = world_with(grid);
    teleport(&mut world, Vec2::new(10.0, 10.0), Vec2::new(100.0, 0.0));
    let events = enter_play_mode(&mut world);

    let mut motion = Motion::default();
    let _ = frame(
        &mut world,
        &mut motion,
        &events,
        RIGHT,
        Duration::from_millis(100),
    );

    let player = query::player(&world);
    assert!(
        player.rect.x <= 16.0 - 8.0,
        "player tunneled to x = {}",
        player.rect.x
    );
    assert_eq!(player.velocity.x, 0.0);
}

#[test]
fn diagonal_motion_into_corner_never_tunnels() {
    for step in 0..24 {
        let dt = 1.0 / 240.0 + f64::from(step) * (1.0 / 15.0 - 1.0 / 240.0) / 23.0;
        let dt = Duration::from_secs_f64(dt);

        let mut world = world_with(Grid::bordered(10, 10).expect("valid grid"));
        teleport(&mut world, Vec2::new(40.0, 40.0), Vec2::ZERO);
        let mut events = enter_play_mode(&mut world);
        let mut motion = Motion::default();

        let mut elapsed = Duration::ZERO;
        while elapsed < Duration::from_secs(3) {
            events = frame(&mut world, &mut motion, &events, RIGHT, dt);
            elapsed += dt;

            let rect = query::player(&world).rect;
            assert!(
                rect.right() <= 72.0 + 1e-3 && rect.bottom() <= 72.0 + 1e-3,
                "dt {:?}: player escaped the corner at ({}, {})",
                dt,
                rect.x,
                rect.y
            );
        }

        let rect = query::player(&world).rect;
        assert!(
            (rect.x - 64.0).abs() < 1e-3 && (rect.y - 64.0).abs() < 1e-3,
            "dt {:?}: player rests at ({}, {})",
            dt,
            rect.x,
            rect.y
        );
    }
}

#[test]
fn players_up_to_a_tile_wide_come_to_rest_on_the_floor() {
    for player_size in [4.0, 6.0, 8.0] {
        let settings = WorldSettings {
            columns: 12,
            rows: 12,
            player_size,
            ..WorldSettings::default()
        };
        let mut world = World::with_settings(&settings).expect("valid settings");
        let mut events = enter_play_mode(&mut world);
        let mut motion = Motion::default();

        for _ in 0..240 {
            events = frame(
                &mut world,
                &mut motion,
                &events,
                MotionInput::default(),
                Duration::from_secs_f64(1.0 / 60.0),
            );
        }

        let rect = query::player(&world).rect;
        assert!(
            (rect.bottom() - 88.0).abs() < 1e-3,
            "player of size {player_size} rests with bottom at {}",
            rect.bottom()
        );
    }
}

#[test]
fn editor_flight_ignores_solid_tiles() {
    let mut world = world_with(Grid::bordered(10, 10).expect("valid grid"));
    teleport(&mut world, Vec2::new(12.0, 40.0), Vec2::ZERO);
    let mut motion = Motion::default();

    let input = MotionInput {
        horizontal: -1.0,
        vertical: 0.0,
        jump_pressed: false,
    };
    let _ = frame(
        &mut world,
        &mut motion,
        &[],
        input,
        Duration::from_millis(100),
    );

    let player = query::player(&world);
    assert_eq!(player.velocity, Vec2::new(-400.0, 0.0));
    assert!((player.rect.x + 28.0).abs() < 1e-3);
    assert_eq!(player.facing, Facing::Right, "facing only tracks play input");
}

#[test]
fn editor_flight_resets_velocity_without_input() {
    let mut world = world_with(Grid::new(10, 10).expect("valid grid"));
    teleport(&mut world, Vec2::new(40.0, 40.0), Vec2::new(250.0, -90.0));
    let mut motion = Motion::default();

    let _ = frame(
        &mut world,
        &mut motion,
        &[],
        MotionInput::default(),
        Duration::from_millis(16),
    );

    let player = query::player(&world);
    assert_eq!(player.velocity, Vec2::ZERO);
    assert_eq!(player.rect.position(), Vec2::new(40.0, 40.0));
}

#[test]
fn jump_replaces_vertical_velocity() {
    let mut world = world_with(Grid::new(10, 10).expect("valid grid"));
    teleport(&mut world, Vec2::new(40.0, 40.0), Vec2::new(0.0, 350.0));
    let events = enter_play_mode(&mut world);
    let mut motion = Motion::default();

    let input = MotionInput {
        jump_pressed: true,
        ..MotionInput::default()
    };
    let _ = frame(&mut world, &mut motion, &events, input, Duration::from_millis(10));

    let player = query::player(&world);
    assert!((player.velocity.y - (-200.0 + 8.0)).abs() < 1e-3);
    assert!(player.rect.y < 40.0);
}

#[test]
fn gravity_is_capped_at_max_fall_speed() {
    let mut world = world_with(Grid::new(10, 10).expect("valid grid"));
    teleport(&mut world, Vec2::new(40.0, 0.0), Vec2::new(0.0, 590.0));
    let events = enter_play_mode(&mut world);
    let mut motion = Motion::default();

    let _ = frame(
        &mut world,
        &mut motion,
        &events,
        MotionInput::default(),
        Duration::from_millis(100),
    );

    assert_eq!(query::player(&world).velocity.y, 600.0);
}

#[test]
fn idle_play_input_damps_once_per_frame() {
    let mut world = world_with(Grid::new(30, 30).expect("valid grid"));
    teleport(&mut world, Vec2::new(40.0, 40.0), Vec2::new(100.0, 0.0));
    let events = enter_play_mode(&mut world);
    let mut motion = Motion::default();

    let _ = frame(
        &mut world,
        &mut motion,
        &events,
        MotionInput::default(),
        Duration::from_millis(50),
    );

    let player = query::player(&world);
    assert!((player.velocity.x - 10.0).abs() < 1e-4);
    assert_eq!(player.facing, Facing::Right);
}

#[test]
fn exponential_damping_is_frame_rate_independent() {
    let config = MotionConfig {
        damping: Damping::Exponential { half_life: 0.05 },
        ..MotionConfig::default()
    };

    let mut velocities = Vec::new();
    for frames in [2_u32, 8] {
        let mut world = world_with(Grid::new(30, 30).expect("valid grid"));
        teleport(&mut world, Vec2::new(40.0, 40.0), Vec2::new(100.0, 0.0));
        let mut events = enter_play_mode(&mut world);
        let mut motion = Motion::new(config);
        let dt = Duration::from_millis(100) / frames;
        for _ in 0..frames {
            events = frame(&mut world, &mut motion, &events, MotionInput::default(), dt);
        }
        velocities.push(query::player(&world).velocity.x);
    }

    assert!((velocities[0] - 25.0).abs() < 1e-2);
    assert!((velocities[0] - velocities[1]).abs() < 1e-2);
}

#[test]
fn facing_follows_horizontal_input_in_play_mode() {
    let mut world = world_with(Grid::new(30, 30).expect("valid grid"));
    teleport(&mut world, Vec2::new(80.0, 40.0), Vec2::ZERO);
    let events = enter_play_mode(&mut world);
    let mut motion = Motion::default();

    let left = MotionInput {
        horizontal: -1.0,
        ..MotionInput::default()
    };
    let next = frame(&mut world, &mut motion, &events, left, Duration::from_millis(16));
    assert_eq!(query::player(&world).facing, Facing::Left);

    let _ = frame(
        &mut world,
        &mut motion,
        &next,
        MotionInput::default(),
        Duration::from_millis(16),
    );
    assert_eq!(query::player(&world).facing, Facing::Left);
}
