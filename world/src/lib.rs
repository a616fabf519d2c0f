#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for CaveSlave.

mod grid;

use grid::{DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS};
pub use grid::{Grid, GridError};

use caveslave_core::{
    Command, Event, GameMode, PlayerBody, TileKind, TILE_RESOLUTION, TILE_TYPE_COUNT,
};
use glam::Vec2;

const DEFAULT_PLAYER_SIZE: f32 = 8.0;
const DEFAULT_MAX_HORIZONTAL_SPEED: f32 = 100.0;

/// Parameters used to construct a fresh world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldSettings {
    /// Columns of the initial bordered grid.
    pub columns: u32,
    /// Rows of the initial bordered grid.
    pub rows: u32,
    /// Side length of a tile in world units.
    pub tile_length: f32,
    /// Side length of the square player body.
    pub player_size: f32,
    /// Largest horizontal speed of the player in play mode.
    pub max_horizontal_speed: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            columns: DEFAULT_GRID_COLUMNS,
            rows: DEFAULT_GRID_ROWS,
            tile_length: TILE_RESOLUTION as f32,
            player_size: DEFAULT_PLAYER_SIZE,
            max_horizontal_speed: DEFAULT_MAX_HORIZONTAL_SPEED,
        }
    }
}

/// Represents the authoritative CaveSlave world state.
#[derive(Clone, Debug)]
pub struct World {
    grid: Grid,
    player: PlayerBody,
    play_mode: GameMode,
    tile_selection: TileKind,
    tile_length: f32,
}

impl WorldSettings {
    /// Rejects tile and player sizes the collision pass cannot handle.
    pub fn validate(&self) -> Result<(), GridError> {
        let tile_length = self.tile_length;
        if !(tile_length.is_finite() && tile_length > 0.0) {
            return Err(GridError::InvalidTileLength { tile_length });
        }

        let player_size = self.player_size;
        if !(player_size.is_finite() && player_size > 0.0 && player_size <= tile_length) {
            return Err(GridError::PlayerSize {
                player_size,
                tile_length,
            });
        }

        Ok(())
    }
}

impl World {
    /// Creates a world with a bordered 64x64 grid and the player at its center.
    #[must_use]
    pub fn new() -> Self {
        Self::assemble(Grid::default(), &WorldSettings::default())
    }

    /// Creates a world from explicit settings, rejecting degenerate grids.
    pub fn with_settings(settings: &WorldSettings) -> Result<Self, GridError> {
        settings.validate()?;
        let grid = Grid::bordered(settings.columns, settings.rows)?;
        Ok(Self::assemble(grid, settings))
    }

    /// Creates a world around an existing grid.
    pub fn from_grid(grid: Grid, settings: &WorldSettings) -> Result<Self, GridError> {
        settings.validate()?;
        Ok(Self::assemble(grid, settings))
    }

    fn assemble(grid: Grid, settings: &WorldSettings) -> Self {
        let center = Vec2::new(
            grid.columns() as f32 * settings.tile_length / 2.0,
            grid.rows() as f32 * settings.tile_length / 2.0,
        );
        let size = Vec2::splat(settings.player_size);
        let player = PlayerBody::new(center - size / 2.0, size, settings.max_horizontal_speed);

        Self {
            grid,
            player,
            play_mode: GameMode::Editor,
            tile_selection: TileKind::new(1),
            tile_length: settings.tile_length,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceTile { cell, kind } => {
            let changed = world.grid.tile(cell).is_ok_and(|current| current != kind);
            if changed && world.grid.place(cell, kind) {
                out_events.push(Event::TilePlaced { cell, kind });
            }
        }
        Command::SetPlayMode { mode } => {
            if world.play_mode != mode {
                world.play_mode = mode;
                log::info!("switched to {mode:?} mode");
                out_events.push(Event::PlayModeChanged { mode });
            }
        }
        Command::SelectTile { kind } => {
            if kind.get() >= TILE_TYPE_COUNT {
                log::debug!("ignoring selection of unknown tile type {}", kind.get());
                return;
            }
            if world.tile_selection != kind {
                world.tile_selection = kind;
                out_events.push(Event::TileSelected { kind });
            }
        }
        Command::MovePlayer { body } => {
            world.player = body;
        }
        Command::InstallLevel { level } => match Grid::from_level(&level) {
            Ok(grid) => {
                world.grid = grid;
                log::info!("installed {}x{} level", level.width, level.height);
                out_events.push(Event::LevelInstalled {
                    width: level.width,
                    height: level.height,
                });
            }
            Err(GridError::Level(reason)) => {
                log::warn!("rejected level: {reason}");
                out_events.push(Event::LevelRejected { reason });
            }
            Err(error) => {
                log::warn!("rejected level: {error}");
            }
        },
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use caveslave_core::{GameMode, PlayerBody, TileGridView, TileKind};

    use super::{Grid, World};

    /// Provides read-only access to the tile grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Captures a read-only tile view sized with the world's tile length.
    #[must_use]
    pub fn tile_view(world: &World) -> TileGridView<'_> {
        world.grid.view(world.tile_length)
    }

    /// Side length of a tile in world units.
    #[must_use]
    pub fn tile_length(world: &World) -> f32 {
        world.tile_length
    }

    /// Current kinematic state of the player.
    #[must_use]
    pub fn player(world: &World) -> PlayerBody {
        world.player
    }

    /// Mode the world is currently in.
    #[must_use]
    pub fn play_mode(world: &World) -> GameMode {
        world.play_mode
    }

    /// Tile type used when painting.
    #[must_use]
    pub fn tile_selection(world: &World) -> TileKind {
        world.tile_selection
    }
}
