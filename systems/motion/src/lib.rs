#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player motion system covering free flight and gravity-driven platforming.

mod collision;

use std::time::Duration;

use caveslave_core::{Command, Event, Facing, GameMode, PlayerBody, TileGridView};
use glam::Vec2;

/// Horizontal velocity decay applied in play mode while no direction is held.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Damping {
    /// Multiplies the velocity by a constant once per frame, regardless of frame time.
    PerFrame {
        /// Fraction of the velocity kept each frame.
        factor: f32,
    },
    /// Halves the velocity every `half_life` seconds of simulated time.
    Exponential {
        /// Seconds until the velocity drops to half.
        half_life: f32,
    },
}

impl Damping {
    /// Applies the decay to a horizontal velocity for a frame of `dt` seconds.
    #[must_use]
    pub fn apply(self, velocity: f32, dt: f32) -> f32 {
        match self {
            Self::PerFrame { factor } => velocity * factor,
            Self::Exponential { half_life } if half_life > 0.0 => {
                velocity * 0.5_f32.powf(dt / half_life)
            }
            Self::Exponential { .. } => 0.0,
        }
    }
}

impl Default for Damping {
    fn default() -> Self {
        Self::PerFrame { factor: 0.1 }
    }
}

/// Tunables that shape player motion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionConfig {
    /// Downward acceleration in world units per second squared.
    pub gravity: f32,
    /// Upward speed assigned when a jump starts.
    pub jump_power: f32,
    /// Speed used while flying in editor mode.
    pub free_fly_speed: f32,
    /// Largest downward speed reachable through gravity.
    pub max_fall_speed: f32,
    /// Decay of horizontal velocity without input.
    pub damping: Damping,
    /// Frame time above which the simulation runs slower than real time.
    pub max_frame_delta: Duration,
    /// Longest integration step used for a single collision pass.
    pub max_substep: Duration,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            gravity: 800.0,
            jump_power: 200.0,
            free_fly_speed: 400.0,
            max_fall_speed: 600.0,
            damping: Damping::default(),
            max_frame_delta: Duration::from_millis(250),
            max_substep: Duration::from_secs_f64(1.0 / 240.0),
        }
    }
}

/// Directional input consumed by the motion system each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionInput {
    /// Horizontal axis in `[-1, 1]`; positive moves right.
    pub horizontal: f32,
    /// Vertical axis in `[-1, 1]`; positive moves down the screen.
    pub vertical: f32,
    /// Whether the jump key went down this frame.
    pub jump_pressed: bool,
}

/// Pure system that integrates the player body and proposes its next state.
#[derive(Debug)]
pub struct Motion {
    config: MotionConfig,
    play_mode: GameMode,
}

impl Motion {
    /// Creates a motion system that starts in editor mode.
    #[must_use]
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            play_mode: GameMode::Editor,
        }
    }

    /// Tunables driving the integration.
    #[must_use]
    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Consumes world events and the current body to emit a movement command.
    pub fn handle(
        &mut self,
        events: &[Event],
        input: MotionInput,
        body: PlayerBody,
        tiles: TileGridView<'_>,
        dt: Duration,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::PlayModeChanged { mode } = event {
                self.play_mode = *mode;
            }
        }

        let next = match self.play_mode {
            GameMode::Editor => fly(body, input, &self.config, dt),
            GameMode::Play => step(body, input, &tiles, &self.config, dt),
        };

        if next != body {
            out.push(Command::MovePlayer { body: next });
        }
    }
}

impl Default for Motion {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

/// Editor-mode integration: velocity follows input exactly, collisions are ignored.
#[must_use]
pub fn fly(
    mut body: PlayerBody,
    input: MotionInput,
    config: &MotionConfig,
    dt: Duration,
) -> PlayerBody {
    let dt = clamp_delta(dt, config).as_secs_f32();
    body.velocity = Vec2::new(input.horizontal, input.vertical) * config.free_fly_speed;
    body.rect.x += body.velocity.x * dt;
    body.rect.y += body.velocity.y * dt;
    body
}

/// Play-mode integration: damping, jump, gravity, facing, then axis-separated collision.
///
/// Velocity changes are applied once for the whole frame. Movement is split
/// into sub-steps no longer than [`MotionConfig::max_substep`] so that fast
/// bodies cannot skip over a tile between two collision passes.
#[must_use]
pub fn step(
    mut body: PlayerBody,
    input: MotionInput,
    tiles: &TileGridView<'_>,
    config: &MotionConfig,
    dt: Duration,
) -> PlayerBody {
    let dt = clamp_delta(dt, config);
    let seconds = dt.as_secs_f32();

    if input.horizontal == 0.0 {
        body.velocity.x = config.damping.apply(body.velocity.x, seconds);
    } else {
        body.velocity.x = input.horizontal * body.max_horizontal_speed;
    }

    if input.jump_pressed {
        body.velocity.y = -config.jump_power;
    }

    body.velocity.y = (body.velocity.y + config.gravity * seconds).min(config.max_fall_speed);

    if let Some(facing) = Facing::from_axis(input.horizontal) {
        body.facing = facing;
    }

    let substeps = substep_count(dt, config.max_substep);
    if substeps > 0 {
        let h = seconds / substeps as f32;
        for _ in 0..substeps {
            collision::advance_axes(&mut body, tiles, h);
        }
    }

    body
}

fn clamp_delta(dt: Duration, config: &MotionConfig) -> Duration {
    dt.min(config.max_frame_delta)
}

fn substep_count(dt: Duration, max_substep: Duration) -> u32 {
    if dt.is_zero() {
        return 0;
    }
    if max_substep.is_zero() {
        return 1;
    }
    let ratio = dt.as_secs_f64() / max_substep.as_secs_f64();
    // Tolerate rounding so that a frame of exactly `max_substep` stays one step.
    (ratio - 1e-6).ceil().max(1.0) as u32
}
