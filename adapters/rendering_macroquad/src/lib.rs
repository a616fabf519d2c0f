#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for CaveSlave.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! World-space content is projected manually through the scene's
//! [`CameraView`] so that the simulation owns the camera parameters and the
//! backend only draws what it is handed.

mod sprites;

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use caveslave_core::{CameraView, GameMode, Rect, TileKind, TILE_RESOLUTION};
use caveslave_rendering::{
    tile_sheet_source, Color, FrameInput, HeldKeys, Presentation, PressedKeys, RenderingBackend,
    Scene, SpriteKey,
};
use glam::Vec2;
use macroquad::{
    input::{
        is_key_down, is_key_pressed, is_mouse_button_down, is_quit_requested, mouse_position,
        mouse_wheel, prevent_quit, KeyCode, MouseButton,
    },
    shapes::{draw_rectangle, draw_rectangle_lines},
    text::draw_text,
};

use self::sprites::SpriteAtlas;

const UI_FONT_SIZE: f32 = 20.0;
const UI_MARGIN: f32 = 10.0;
const UI_PREVIEW_SIZE: f32 = 32.0;
const GHOST_ALPHA: f32 = 0.5;
const MAX_FRAME_SECONDS: f32 = 1.0;

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    load_sprites: bool,
    manifest_path: PathBuf,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            load_sprites: true,
            manifest_path: PathBuf::from("assets/manifest.toml"),
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame rate metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Configures whether the backend should attempt to load sprite assets.
    #[must_use]
    pub fn with_sprite_loading(mut self, enabled: bool) -> Self {
        self.load_sprites = enabled;
        self
    }

    /// Overrides the sprite manifest location.
    #[must_use]
    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }
}

/// Averages frame counts over one-second windows.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FpsMetrics {
    per_second: f32,
    avg_render: Duration,
}

impl FpsCounter {
    fn record_frame(&mut self, frame: Duration, render: Duration) -> Option<FpsMetrics> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        self.render_accum += render;

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let metrics = FpsMetrics {
            per_second: self.frames as f32 / self.elapsed.as_secs_f32(),
            avg_render: self.render_accum / self.frames,
        };
        *self = Self::default();
        Some(metrics)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            load_sprites,
            manifest_path,
        } = self;

        let Presentation {
            window_title,
            window_size,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: i32::try_from(window_size.0).unwrap_or(i32::MAX),
            window_height: i32::try_from(window_size.1).unwrap_or(i32::MAX),
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            // Closing the window raises the exit prompt instead of quitting.
            prevent_quit();
            let mut scene = scene;
            let sprite_atlas = if load_sprites {
                match SpriteAtlas::from_manifest_path(&manifest_path) {
                    Ok(atlas) => Some(atlas),
                    Err(error) => {
                        log::warn!("drawing without sprites: {error:#}");
                        None
                    }
                }
            } else {
                None
            };

            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                let frame_dt = frame_duration(macroquad::time::get_frame_time());
                let frame_input = gather_frame_input();

                update_scene(frame_dt, frame_input, &mut scene);
                if scene.exit_confirmed {
                    break;
                }

                let render_start = Instant::now();
                macroquad::window::clear_background(background);
                let viewport = frame_input.viewport;
                draw_tiles(&scene, viewport, sprite_atlas.as_ref());
                draw_ghost_tile(&scene, sprite_atlas.as_ref());
                draw_player(&scene, sprite_atlas.as_ref());
                draw_ui(&scene, viewport, sprite_atlas.as_ref());
                let render_duration = render_start.elapsed();

                if let Some(metrics) = fps_counter.record_frame(frame_dt, render_duration) {
                    if show_fps {
                        log::info!(
                            "FPS: {:.2} | render: {:>6.2}ms",
                            metrics.per_second,
                            metrics.avg_render.as_secs_f64() * 1_000.0,
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Converts macroquad's frame time into a bounded duration.
fn frame_duration(seconds: f32) -> Duration {
    if !seconds.is_finite() {
        return Duration::ZERO;
    }
    Duration::from_secs_f32(seconds.clamp(0.0, MAX_FRAME_SECONDS))
}

fn gather_frame_input() -> FrameInput {
    let (cursor_x, cursor_y) = mouse_position();
    let (_, wheel_y) = mouse_wheel();

    FrameInput {
        mouse_position: Vec2::new(cursor_x, cursor_y),
        mouse_wheel: normalise_wheel(wheel_y),
        viewport: Vec2::new(
            macroquad::window::screen_width(),
            macroquad::window::screen_height(),
        ),
        held: HeldKeys {
            modifier: is_key_down(KeyCode::LeftControl),
            left: is_key_down(KeyCode::A),
            right: is_key_down(KeyCode::D),
            up: is_key_down(KeyCode::W),
            down: is_key_down(KeyCode::S),
            jump: is_key_down(KeyCode::Space),
            paint: is_mouse_button_down(MouseButton::Left),
            erase: is_mouse_button_down(MouseButton::Right),
        },
        pressed: PressedKeys {
            jump: is_key_pressed(KeyCode::Space),
            escape: is_key_pressed(KeyCode::Escape),
            close_requested: is_quit_requested(),
            confirm: is_key_pressed(KeyCode::Y),
            deny: is_key_pressed(KeyCode::N),
            toggle_mode: is_key_pressed(KeyCode::F4),
            load_level: is_key_pressed(KeyCode::F5),
            save_level: is_key_pressed(KeyCode::F6),
        },
    }
}

/// Maps platform-specific wheel deltas onto whole notches.
fn normalise_wheel(delta: f32) -> f32 {
    if delta.is_finite() && delta != 0.0 {
        delta.signum()
    } else {
        0.0
    }
}

/// Projects a world-space rectangle onto the screen.
fn screen_rect(camera: &CameraView, rect: Rect) -> Rect {
    let top_left = camera.world_to_screen(rect.position());
    Rect::from_position_and_size(top_left, rect.size() * camera.zoom)
}

fn tile_color(kind: TileKind) -> Color {
    match kind.get() {
        0 => Color::new(0.0, 0.0, 0.0, 0.0),
        1 => Color::from_rgb_u8(121, 85, 58),
        2 => Color::from_rgb_u8(96, 108, 56),
        3 => Color::from_rgb_u8(128, 128, 128),
        4 => Color::from_rgb_u8(176, 137, 104),
        5 => Color::from_rgb_u8(64, 96, 160),
        6 => Color::from_rgb_u8(60, 60, 70),
        _ => Color::from_rgb_u8(190, 60, 60),
    }
}

fn draw_tile(kind: TileKind, dest: Rect, tint: Color, sprite_atlas: Option<&SpriteAtlas>) {
    let sheet = sprite_atlas.and_then(|atlas| {
        let source = tile_sheet_source(kind, TILE_RESOLUTION, atlas.width(SpriteKey::TileSheet)?)?;
        Some((atlas, source))
    });

    if let Some((atlas, source)) = sheet {
        if let Err(error) = atlas.draw(
            SpriteKey::TileSheet,
            Some(source),
            dest,
            false,
            to_macroquad_color(tint),
        ) {
            log::debug!("failed to draw tile {}: {error:#}", kind.get());
        }
        return;
    }

    let fill = tile_color(kind);
    draw_rectangle(
        dest.x,
        dest.y,
        dest.width,
        dest.height,
        to_macroquad_color(fill.with_alpha(fill.alpha * tint.alpha)),
    );
}

fn draw_tiles(scene: &Scene, viewport: Vec2, sprite_atlas: Option<&SpriteAtlas>) {
    let grid = &scene.tile_grid;
    let visible = grid.visible_cells(scene.camera.visible_bounds(viewport));
    let opaque = Color::new(1.0, 1.0, 1.0, 1.0);

    for (column, row) in visible.cells() {
        let Some(kind) = grid.tile(column, row) else {
            continue;
        };
        if !kind.is_solid() {
            continue;
        }
        let dest = screen_rect(&scene.camera, grid.cell_rect(column, row));
        draw_tile(kind, dest, opaque, sprite_atlas);
    }
}

fn draw_ghost_tile(scene: &Scene, sprite_atlas: Option<&SpriteAtlas>) {
    if scene.play_mode != GameMode::Editor {
        return;
    }
    let Some(ghost) = scene.ghost_tile else {
        return;
    };

    let length = scene.tile_grid.tile_length;
    let world = Rect::new(
        ghost.cell.column() as f32 * length,
        ghost.cell.row() as f32 * length,
        length,
        length,
    );
    let dest = screen_rect(&scene.camera, world);
    draw_tile(
        ghost.kind,
        dest,
        Color::new(1.0, 1.0, 1.0, GHOST_ALPHA),
        sprite_atlas,
    );
    draw_rectangle_lines(
        dest.x,
        dest.y,
        dest.width,
        dest.height,
        1.0,
        to_macroquad_color(Color::new(1.0, 1.0, 1.0, GHOST_ALPHA)),
    );
}

fn draw_player(scene: &Scene, sprite_atlas: Option<&SpriteAtlas>) {
    let dest = screen_rect(&scene.camera, scene.player.rect);
    let white = to_macroquad_color(Color::new(1.0, 1.0, 1.0, 1.0));

    if let Some(atlas) = sprite_atlas {
        match atlas.draw(
            SpriteKey::Player,
            None,
            dest,
            scene.player.horizontal_flip(),
            white,
        ) {
            Ok(()) => return,
            Err(error) => log::debug!("failed to draw player sprite: {error:#}"),
        }
    }

    draw_rectangle(
        dest.x,
        dest.y,
        dest.width,
        dest.height,
        to_macroquad_color(Color::from_rgb_u8(230, 200, 80)),
    );
}

fn draw_ui(scene: &Scene, viewport: Vec2, sprite_atlas: Option<&SpriteAtlas>) {
    let text_color = to_macroquad_color(Color::new(1.0, 1.0, 1.0, 1.0));

    let _ = draw_text(
        caveslave_core::WINDOW_TITLE,
        UI_MARGIN,
        UI_MARGIN + UI_FONT_SIZE,
        UI_FONT_SIZE,
        text_color,
    );
    let _ = draw_text(
        mode_label(scene.play_mode),
        UI_MARGIN,
        UI_MARGIN + UI_FONT_SIZE * 2.0,
        UI_FONT_SIZE,
        text_color,
    );

    let preview = Rect::new(
        viewport.x - UI_MARGIN - UI_PREVIEW_SIZE,
        UI_MARGIN,
        UI_PREVIEW_SIZE,
        UI_PREVIEW_SIZE,
    );
    draw_tile(
        scene.tile_selection,
        preview,
        Color::new(1.0, 1.0, 1.0, 1.0),
        sprite_atlas,
    );
    draw_rectangle_lines(
        preview.x,
        preview.y,
        preview.width,
        preview.height,
        2.0,
        text_color,
    );

    if let Some(status) = &scene.status {
        let _ = draw_text(
            status,
            UI_MARGIN,
            viewport.y - UI_MARGIN,
            UI_FONT_SIZE,
            text_color,
        );
    }

    if scene.exit_prompt {
        draw_rectangle(
            0.0,
            0.0,
            viewport.x,
            viewport.y,
            to_macroquad_color(Color::new(0.0, 0.0, 0.0, 0.6)),
        );
        let _ = draw_text(
            "Are you sure you want to exit? [Y/N]",
            viewport.x / 2.0 - 170.0,
            viewport.y / 2.0,
            UI_FONT_SIZE * 1.5,
            text_color,
        );
    }
}

fn mode_label(mode: GameMode) -> &'static str {
    match mode {
        GameMode::Editor => "Editor mode (F4 to play)",
        GameMode::Play => "Play mode (F4 to edit)",
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
