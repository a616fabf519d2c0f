use caveslave_core::{CellCoord, LevelData, LevelError, TileGridView, TileKind};
use thiserror::Error;

pub(crate) const DEFAULT_GRID_COLUMNS: u32 = 64;
pub(crate) const DEFAULT_GRID_ROWS: u32 = 64;

/// Errors raised by tile grid construction and lookups.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GridError {
    /// The grid was requested with a zero width or height.
    #[error("grid dimensions must be positive (received {columns}x{rows})")]
    ZeroDimension {
        /// Requested columns.
        columns: u32,
        /// Requested rows.
        rows: u32,
    },
    /// A lookup addressed a cell outside the grid.
    #[error("cell ({column}, {row}) lies outside the {columns}x{rows} grid")]
    OutOfBounds {
        /// Requested column.
        column: i32,
        /// Requested row.
        row: i32,
        /// Grid columns.
        columns: u32,
        /// Grid rows.
        rows: u32,
    },
    /// The tile length is not a positive finite number.
    #[error("tile length must be positive and finite (received {tile_length})")]
    InvalidTileLength {
        /// Requested tile length.
        tile_length: f32,
    },
    /// The player does not fit inside a single tile.
    ///
    /// Collision only inspects the cells around the player's center cell, so a
    /// larger body would pass through tiles outside that neighborhood.
    #[error("player size {player_size} must be positive and at most the tile length {tile_length}")]
    PlayerSize {
        /// Requested player side length.
        player_size: f32,
        /// Tile side length the player is checked against.
        tile_length: f32,
    },
    /// A stored level failed validation.
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// Dense, row-major matrix of tiles describing the level geometry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    tiles: Vec<TileKind>,
}

impl Grid {
    /// Creates a grid where every cell holds the empty tile.
    pub fn new(columns: u32, rows: u32) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::ZeroDimension { columns, rows });
        }

        let capacity = (columns as usize) * (rows as usize);
        Ok(Self {
            columns,
            rows,
            tiles: vec![TileKind::EMPTY; capacity],
        })
    }

    /// Creates a grid enclosed by a one-tile-thick border of [`TileKind::BORDER`].
    pub fn bordered(columns: u32, rows: u32) -> Result<Self, GridError> {
        let mut grid = Self::new(columns, rows)?;
        grid.frame();
        Ok(grid)
    }

    /// Rebuilds a grid from a stored level description.
    pub fn from_level(level: &LevelData) -> Result<Self, GridError> {
        level.validate()?;
        let tiles = level
            .tiles
            .iter()
            .flat_map(|row| row.iter().copied().map(TileKind::new))
            .collect();

        Ok(Self {
            columns: level.width,
            rows: level.height,
            tiles,
        })
    }

    /// Captures the grid as a serializable level description.
    #[must_use]
    pub fn to_level(&self) -> LevelData {
        let tiles = self
            .tiles
            .chunks(self.columns as usize)
            .map(|row| row.iter().map(TileKind::get).collect())
            .collect();

        LevelData {
            width: self.columns,
            height: self.rows,
            tiles,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Writes a tile into the grid.
    ///
    /// Returns `false` and leaves the grid untouched when the cell lies outside
    /// the grid, which happens routinely for off-grid cursor positions.
    pub fn place(&mut self, cell: CellCoord, kind: TileKind) -> bool {
        match self.index(cell) {
            Some(index) => {
                self.tiles[index] = kind;
                true
            }
            None => false,
        }
    }

    /// Reads the tile stored at the provided cell.
    pub fn tile(&self, cell: CellCoord) -> Result<TileKind, GridError> {
        self.index(cell)
            .map(|index| self.tiles[index])
            .ok_or(GridError::OutOfBounds {
                column: cell.column(),
                row: cell.row(),
                columns: self.columns,
                rows: self.rows,
            })
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Captures a read-only view suitable for systems.
    #[must_use]
    pub fn view(&self, tile_length: f32) -> TileGridView<'_> {
        TileGridView::new(&self.tiles, self.columns, self.rows, tile_length)
    }

    fn frame(&mut self) {
        let last_column = self.columns as i32 - 1;
        let last_row = self.rows as i32 - 1;

        for column in 0..=last_column {
            let _ = self.place(CellCoord::new(column, 0), TileKind::BORDER);
            let _ = self.place(CellCoord::new(column, last_row), TileKind::BORDER);
        }
        for row in 0..=last_row {
            let _ = self.place(CellCoord::new(0, row), TileKind::BORDER);
            let _ = self.place(CellCoord::new(last_column, row), TileKind::BORDER);
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(row as usize * self.columns as usize + column as usize)
    }
}

impl Default for Grid {
    /// Bordered 64x64 grid used when no level is loaded.
    fn default() -> Self {
        let mut grid = Self {
            columns: DEFAULT_GRID_COLUMNS,
            rows: DEFAULT_GRID_ROWS,
            tiles: vec![
                TileKind::EMPTY;
                DEFAULT_GRID_COLUMNS as usize * DEFAULT_GRID_ROWS as usize
            ],
        };
        grid.frame();
        grid
    }
}
