#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for CaveSlave adapters.

use anyhow::Result as AnyResult;
use caveslave_core::{CameraView, CellCoord, Facing, GameMode, Rect, TileKind};
use glam::Vec2;
use std::time::Duration;
use thiserror::Error;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with the provided alpha.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

/// Keys and buttons that are currently held down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeldKeys {
    /// Zoom modifier (left control).
    pub modifier: bool,
    /// Move left (`A`).
    pub left: bool,
    /// Move right (`D`).
    pub right: bool,
    /// Move up (`W`).
    pub up: bool,
    /// Move down (`S`).
    pub down: bool,
    /// Jump key (space).
    pub jump: bool,
    /// Primary mouse button.
    pub paint: bool,
    /// Secondary mouse button.
    pub erase: bool,
}

/// Keys that went down during this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PressedKeys {
    /// Jump key (space).
    pub jump: bool,
    /// Escape; opens the exit prompt.
    pub escape: bool,
    /// The window close button; opens the exit prompt like Escape.
    pub close_requested: bool,
    /// `Y`; confirms the exit prompt.
    pub confirm: bool,
    /// `N`; dismisses the exit prompt.
    pub deny: bool,
    /// `F4`; switches between editor and play mode.
    pub toggle_mode: bool,
    /// `F5`; loads a level.
    pub load_level: bool,
    /// `F6`; saves the current level.
    pub save_level: bool,
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Cursor position in screen pixels.
    pub mouse_position: Vec2,
    /// Vertical wheel movement since the previous frame.
    pub mouse_wheel: f32,
    /// Size of the drawable area in screen pixels.
    pub viewport: Vec2,
    /// Keys held down.
    pub held: HeldKeys,
    /// Keys pressed this frame.
    pub pressed: PressedKeys,
}

/// Half-open range of grid cells `[first, end)` along both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    /// First visible column.
    pub first_column: u32,
    /// First visible row.
    pub first_row: u32,
    /// One past the last visible column.
    pub end_column: u32,
    /// One past the last visible row.
    pub end_row: u32,
}

impl CellRange {
    /// Reports whether the range contains no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_column >= self.end_column || self.first_row >= self.end_row
    }

    /// Iterates the cells of the range in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> {
        let columns = self.first_column..self.end_column;
        (self.first_row..self.end_row)
            .flat_map(move |row| columns.clone().map(move |column| (column, row)))
    }
}

/// Describes the tile grid drawn beneath the player.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of columns in the grid.
    pub columns: u32,
    /// Number of rows in the grid.
    pub rows: u32,
    /// Side length of a tile in world units.
    pub tile_length: f32,
    /// Row-major tile types.
    pub tiles: Vec<TileKind>,
}

impl TileGridPresentation {
    /// Creates a grid presentation, validating its shape.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_length: f32,
        tiles: Vec<TileKind>,
    ) -> Result<Self, RenderingError> {
        if !(tile_length.is_finite() && tile_length > 0.0) {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        let expected = columns as usize * rows as usize;
        if tiles.len() != expected {
            return Err(RenderingError::TileCountMismatch {
                expected,
                found: tiles.len(),
            });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
            tiles,
        })
    }

    /// Tile stored at the provided column and row.
    #[must_use]
    pub fn tile(&self, column: u32, row: u32) -> Option<TileKind> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.tiles
            .get(row as usize * self.columns as usize + column as usize)
            .copied()
    }

    /// World-space rectangle covered by the provided cell.
    #[must_use]
    pub fn cell_rect(&self, column: u32, row: u32) -> Rect {
        Rect::new(
            column as f32 * self.tile_length,
            row as f32 * self.tile_length,
            self.tile_length,
            self.tile_length,
        )
    }

    /// Cells intersecting the provided world-space bounds, clamped to the grid.
    #[must_use]
    pub fn visible_cells(&self, bounds: Rect) -> CellRange {
        let clamp_start = |value: f32, limit: u32| -> u32 {
            let cell = (value / self.tile_length).floor();
            if cell.is_nan() || cell <= 0.0 {
                0
            } else {
                (cell as u32).min(limit)
            }
        };
        let clamp_end = |value: f32, limit: u32| -> u32 {
            let cell = (value / self.tile_length).ceil();
            if cell.is_nan() || cell <= 0.0 {
                0
            } else {
                (cell as u32).min(limit)
            }
        };

        CellRange {
            first_column: clamp_start(bounds.x, self.columns),
            first_row: clamp_start(bounds.y, self.rows),
            end_column: clamp_end(bounds.right(), self.columns),
            end_row: clamp_end(bounds.bottom(), self.rows),
        }
    }
}

/// Player sprite placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerPresentation {
    /// World-space rectangle of the sprite.
    pub rect: Rect,
    /// Direction the sprite faces.
    pub facing: Facing,
}

impl PlayerPresentation {
    /// Whether the sprite is mirrored horizontally.
    #[must_use]
    pub const fn horizontal_flip(&self) -> bool {
        matches!(self.facing, Facing::Left)
    }
}

/// Translucent tile drawn under the cursor while editing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GhostTile {
    /// Hovered cell.
    pub cell: CellCoord,
    /// Tile type that would be painted.
    pub kind: TileKind,
}

/// Scene description combining the tile grid, the player and overlays.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tile grid composing the level.
    pub tile_grid: TileGridPresentation,
    /// Player sprite.
    pub player: PlayerPresentation,
    /// Projection used for world-space content.
    pub camera: CameraView,
    /// Active play mode.
    pub play_mode: GameMode,
    /// Tile type used for painting, previewed in the UI.
    pub tile_selection: TileKind,
    /// Ghost tile under the cursor, only present in editor mode.
    pub ghost_tile: Option<GhostTile>,
    /// Latest operator-facing status message.
    pub status: Option<String>,
    /// Whether the exit confirmation prompt is visible.
    pub exit_prompt: bool,
    /// Set once the player confirmed the exit prompt.
    pub exit_confirmed: bool,
}

impl Scene {
    /// Creates a scene with no overlays.
    #[must_use]
    pub fn new(
        tile_grid: TileGridPresentation,
        player: PlayerPresentation,
        camera: CameraView,
        play_mode: GameMode,
        tile_selection: TileKind,
    ) -> Self {
        Self {
            tile_grid,
            player,
            camera,
            play_mode,
            tile_selection,
            ghost_tile: None,
            status: None,
            exit_prompt: false,
            exit_confirmed: false,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Requested window size in pixels.
    pub window_size: (u32, u32),
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(
        window_title: T,
        window_size: (u32, u32),
        clear_color: Color,
        scene: Scene,
    ) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            window_size,
            clear_color,
            scene,
        }
    }
}

/// Sprites a backend may load from its manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpriteKey {
    /// Horizontal strip of square tiles indexed by tile type.
    TileSheet,
    /// Player character, authored facing right.
    Player,
}

/// Rendering backend capable of presenting CaveSlave scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the measured frame delta,
    /// per-frame input captured by the adapter, and may mutate the scene before
    /// it is rendered. Backends stop once [`Scene::exit_confirmed`] is set.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Error)]
pub enum RenderingError {
    /// Tiles must have a positive, finite side length.
    #[error("tile_length must be positive (received {tile_length})")]
    InvalidTileLength {
        /// Provided length that failed validation.
        tile_length: f32,
    },
    /// The tile list does not match the grid dimensions.
    #[error("expected {expected} tiles, received {found}")]
    TileCountMismatch {
        /// Tiles required by the dimensions.
        expected: usize,
        /// Tiles provided.
        found: usize,
    },
}

/// Source rectangle of a tile type inside a tile sheet.
///
/// Tiles are laid out left to right in rows of `sheet_width / resolution`
/// entries. Returns `None` for degenerate sheets.
#[must_use]
pub fn tile_sheet_source(kind: TileKind, resolution: u32, sheet_width: u32) -> Option<Rect> {
    if resolution == 0 {
        return None;
    }
    let per_row = sheet_width / resolution;
    if per_row == 0 {
        return None;
    }

    let index = u32::from(kind.get());
    let x = (index * resolution) % (per_row * resolution);
    let y = (index / per_row) * resolution;
    Some(Rect::new(
        x as f32,
        y as f32,
        resolution as f32,
        resolution as f32,
    ))
}
