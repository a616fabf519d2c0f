#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the CaveSlave engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that systems observe on the next pass. Systems read immutable views such as
//! [`TileGridView`] and never mutate world state directly.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title shown by adapters when the game boots.
pub const WINDOW_TITLE: &str = "CaveSlave";

/// Side length of a single square tile expressed in world units.
pub const TILE_RESOLUTION: u32 = 8;

/// Number of tile variants available in the tile sheet, including the empty tile.
pub const TILE_TYPE_COUNT: u16 = 8;

/// Describes the active gameplay mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Free-fly movement with tile painting enabled.
    #[default]
    Editor,
    /// Gravity and collision affected movement; painting disabled.
    Play,
}

impl GameMode {
    /// Returns the opposite mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Editor => Self::Play,
            Self::Play => Self::Editor,
        }
    }
}

/// Horizontal direction the player sprite faces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Sprite mirrored to look toward decreasing x.
    Left,
    /// Sprite drawn as authored, looking toward increasing x.
    #[default]
    Right,
}

impl Facing {
    /// Derives a facing from a horizontal input axis, or `None` when the axis is idle.
    #[must_use]
    pub fn from_axis(horizontal: f32) -> Option<Self> {
        if horizontal < 0.0 {
            Some(Self::Left)
        } else if horizontal > 0.0 {
            Some(Self::Right)
        } else {
            None
        }
    }
}

/// Type index stored in a single grid cell.
///
/// Zero is the empty tile. Every other value is solid and doubles as the
/// index of the texture drawn for the cell.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TileKind(u16);

impl TileKind {
    /// The empty, non-solid tile.
    pub const EMPTY: Self = Self(0);

    /// Tile variant used for the border of default grids.
    pub const BORDER: Self = Self(6);

    /// Creates a tile kind from its raw type index.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the raw type index.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// Reports whether the tile participates in collision.
    #[must_use]
    pub const fn is_solid(&self) -> bool {
        self.0 != 0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed because cursor and player positions routinely land
/// outside the grid; the grid rejects such cells instead of the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the cell shifted by the provided column and row deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self {
            column: self.column.saturating_add(columns),
            row: self.row.saturating_add(rows),
        }
    }

    /// Cell containing the provided world-space point for the given tile length.
    #[must_use]
    pub fn containing(point: Vec2, tile_length: f32) -> Self {
        Self {
            column: (point.x / tile_length).floor() as i32,
            row: (point.y / tile_length).floor() as i32,
        }
    }
}

/// Axis-aligned rectangle in world units, anchored at its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge; y grows downward.
    pub y: f32,
    /// Extent along x.
    pub width: f32,
    /// Extent along y.
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and extents.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from a top-left position and a size vector.
    #[must_use]
    pub fn from_position_and_size(position: Vec2, size: Vec2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    /// Top-left corner.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Extents as a vector.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Geometric center.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Reports whether the rectangles share a region of positive area.
    ///
    /// Rectangles that merely touch along an edge do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Returns the overlapping region, if the rectangles overlap.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.overlaps(other) {
            return None;
        }

        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

/// Kinematic state of the player character.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerBody {
    /// Position and size of the player sprite in world units.
    pub rect: Rect,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Direction the sprite faces.
    pub facing: Facing,
    /// Largest horizontal speed reachable in play mode.
    pub max_horizontal_speed: f32,
}

impl PlayerBody {
    /// Creates a resting body at the provided position.
    #[must_use]
    pub fn new(position: Vec2, size: Vec2, max_horizontal_speed: f32) -> Self {
        Self {
            rect: Rect::from_position_and_size(position, size),
            velocity: Vec2::ZERO,
            facing: Facing::Right,
            max_horizontal_speed,
        }
    }

    /// Center of the player rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }
}

/// Projection parameters mapping world space onto the screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    /// Screen-space point the target is drawn at.
    pub offset: Vec2,
    /// World-space point the camera looks at.
    pub target: Vec2,
    /// Rotation around the target in degrees.
    pub rotation: f32,
    /// Scale factor from world units to screen pixels.
    pub zoom: f32,
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            target: Vec2::ZERO,
            rotation: 0.0,
            zoom: 1.0,
        }
    }
}

impl CameraView {
    /// Projects a world-space point onto the screen.
    #[must_use]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let rotation = Vec2::from_angle(self.rotation.to_radians());
        rotation.rotate((world - self.target) * self.zoom) + self.offset
    }

    /// Maps a screen-space point back into world space.
    #[must_use]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let inverse_rotation = Vec2::from_angle(-self.rotation.to_radians());
        inverse_rotation.rotate(screen - self.offset) / self.zoom + self.target
    }

    /// World-space rectangle visible through a viewport of the provided size.
    ///
    /// Rotation is ignored; the bounds are centered on the target.
    #[must_use]
    pub fn visible_bounds(&self, viewport: Vec2) -> Rect {
        let half = viewport / (2.0 * self.zoom);
        Rect::from_position_and_size(self.target - half, half * 2.0)
    }
}

/// Read-only view into the dense, row-major tile grid.
#[derive(Clone, Copy, Debug)]
pub struct TileGridView<'a> {
    tiles: &'a [TileKind],
    columns: u32,
    rows: u32,
    tile_length: f32,
}

impl<'a> TileGridView<'a> {
    /// Captures a new view backed by the provided row-major tile slice.
    #[must_use]
    pub fn new(tiles: &'a [TileKind], columns: u32, rows: u32, tile_length: f32) -> Self {
        Self {
            tiles,
            columns,
            rows,
            tile_length,
        }
    }

    /// Returns the tile stored at the provided cell, or `None` outside the grid.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<TileKind> {
        self.index(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Reports whether the cell lies inside the grid and holds a solid tile.
    #[must_use]
    pub fn is_solid(&self, cell: CellCoord) -> bool {
        self.tile(cell).is_some_and(|tile| tile.is_solid())
    }

    /// World-space rectangle covered by the provided cell.
    #[must_use]
    pub fn cell_rect(&self, cell: CellCoord) -> Rect {
        Rect::new(
            cell.column() as f32 * self.tile_length,
            cell.row() as f32 * self.tile_length,
            self.tile_length,
            self.tile_length,
        )
    }

    /// Cell containing the provided world-space point.
    #[must_use]
    pub fn cell_at(&self, point: Vec2) -> CellCoord {
        CellCoord::containing(point, self.tile_length)
    }

    /// Side length of a single tile in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Provides the dimensions of the underlying grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Returns an iterator over all tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = TileKind> + 'a {
        self.tiles.iter().copied()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column < self.columns && row < self.rows {
            let width = usize::try_from(self.columns).ok()?;
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Serializable description of a stored level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    /// Number of tile columns.
    pub width: u32,
    /// Number of tile rows.
    pub height: u32,
    /// Tile type matrix, one inner vector per row.
    pub tiles: Vec<Vec<u16>>,
}

impl LevelData {
    /// Checks that the tile matrix matches the declared dimensions.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::ZeroDimension {
                width: self.width,
                height: self.height,
            });
        }

        let expected_rows = usize::try_from(self.height).unwrap_or(usize::MAX);
        if self.tiles.len() != expected_rows {
            return Err(LevelError::RowCount {
                expected: self.height,
                found: self.tiles.len(),
            });
        }

        let expected_columns = usize::try_from(self.width).unwrap_or(usize::MAX);
        for (row, tiles) in self.tiles.iter().enumerate() {
            if tiles.len() != expected_columns {
                return Err(LevelError::RowLength {
                    row,
                    expected: self.width,
                    found: tiles.len(),
                });
            }
        }

        Ok(())
    }
}

/// Reasons a level description may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum LevelError {
    /// The level declared a zero width or height.
    #[error("level dimensions must be positive (received {width}x{height})")]
    ZeroDimension {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },
    /// The number of rows in the matrix does not match the declared height.
    #[error("level declares {expected} rows but stores {found}")]
    RowCount {
        /// Declared height.
        expected: u32,
        /// Rows actually present.
        found: usize,
    },
    /// A row does not match the declared width.
    #[error("level row {row} stores {found} tiles, expected {expected}")]
    RowLength {
        /// Index of the offending row.
        row: usize,
        /// Declared width.
        expected: u32,
        /// Tiles actually present in the row.
        found: usize,
    },
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Writes a tile into the grid. Cells outside the grid are ignored.
    PlaceTile {
        /// Cell receiving the tile.
        cell: CellCoord,
        /// Tile type to store.
        kind: TileKind,
    },
    /// Requests that the world transition to the provided mode.
    SetPlayMode {
        /// Mode the world should activate.
        mode: GameMode,
    },
    /// Changes the tile type used for painting.
    SelectTile {
        /// Newly selected tile type.
        kind: TileKind,
    },
    /// Replaces the player's kinematic state with an integrated one.
    MovePlayer {
        /// State computed by the motion system.
        body: PlayerBody,
    },
    /// Replaces the grid with a stored level, if it validates.
    InstallLevel {
        /// Level to install.
        level: LevelData,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the world entered a new mode.
    PlayModeChanged {
        /// Mode that became active.
        mode: GameMode,
    },
    /// Confirms that a grid cell changed.
    TilePlaced {
        /// Cell that changed.
        cell: CellCoord,
        /// Tile type now stored there.
        kind: TileKind,
    },
    /// Confirms that the paint selection changed.
    TileSelected {
        /// Newly selected tile type.
        kind: TileKind,
    },
    /// Confirms that a stored level replaced the grid.
    LevelInstalled {
        /// Columns of the installed grid.
        width: u32,
        /// Rows of the installed grid.
        height: u32,
    },
    /// Reports that a level was rejected and the previous grid kept.
    LevelRejected {
        /// Validation failure.
        reason: LevelError,
    },
}
