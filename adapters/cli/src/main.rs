#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the CaveSlave editor and platformer.

mod config;
mod prompt;
mod simulation;

use std::path::PathBuf;

use anyhow::{Context, Result};
use caveslave_core::WINDOW_TITLE;
use caveslave_persistence::{LevelStore, DEFAULT_LEVELS_DIR};
use caveslave_rendering::{Color, Presentation, RenderingBackend};
use caveslave_rendering_macroquad::MacroquadBackend;
use caveslave_system_camera::CenteredCamera;
use caveslave_system_motion::Motion;
use caveslave_world::World;
use clap::Parser;

use crate::{config::GameConfig, prompt::StdinPrompt, simulation::Simulation};

/// Command-line arguments accepted by the binary.
#[derive(Debug, Parser)]
#[command(name = "caveslave", about = "Tile editor and platformer sandbox")]
struct CliArgs {
    /// TOML file overriding window, grid, physics and camera settings.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Directory holding level JSON files.
    #[arg(long, value_name = "DIR")]
    levels_dir: Option<PathBuf>,
    /// Level to load before the first frame.
    #[arg(long, value_name = "NAME")]
    level: Option<String>,
    /// Synchronise presentation with the display refresh rate.
    #[arg(long)]
    vsync: bool,
    /// Log frame rate metrics once per second.
    #[arg(long)]
    show_fps: bool,
    /// Skip sprite loading and draw tiles with the built-in palette.
    #[arg(long)]
    no_sprites: bool,
    /// Sprite manifest location.
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,
}

/// Entry point for the CaveSlave command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => GameConfig::default(),
    };

    let world = World::with_settings(&config.world_settings())
        .context("failed to construct the world from the grid settings")?;
    let store = LevelStore::new(
        args.levels_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEVELS_DIR)),
    );
    let mut simulation = Simulation::new(
        world,
        Motion::new(config.motion_config()),
        CenteredCamera::new(config.camera.zoom),
        store,
        StdinPrompt,
    );
    if let Some(name) = &args.level {
        simulation.load_level(name);
    }

    let scene = simulation
        .scene()
        .context("failed to build the initial scene")?;
    let presentation = Presentation::new(
        WINDOW_TITLE,
        (config.window.width, config.window.height),
        Color::from_rgb_u8(20, 18, 24),
        scene,
    );

    let mut backend = MacroquadBackend::new()
        .with_vsync(args.vsync || config.window.vsync)
        .with_show_fps(args.show_fps || config.window.show_fps)
        .with_sprite_loading(!args.no_sprites);
    if let Some(manifest) = &args.manifest {
        backend = backend.with_manifest_path(manifest);
    }

    log::info!(
        "starting {WINDOW_TITLE} with a {}x{} grid",
        config.grid.columns,
        config.grid.rows
    );
    backend.run(presentation, move |dt, input, scene| {
        simulation.advance(dt, input);
        if let Err(error) = simulation.populate_scene(scene) {
            log::error!("failed to present frame: {error}");
        }
    })
}
