#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure editor-mode system responsible for tile painting and paint selection.

use caveslave_core::{CellCoord, Command, Event, GameMode, TileKind, TILE_TYPE_COUNT};

/// Ghost tile drawn under the cursor while editing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePreview {
    /// Cell hovered by the cursor.
    pub cell: CellCoord,
    /// Tile type a left click would paint.
    pub kind: TileKind,
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditorInput {
    /// Primary button held; paints the selected tile.
    pub paint_held: bool,
    /// Secondary button held; clears the hovered cell.
    pub erase_held: bool,
    /// Cell under the cursor, if the cursor maps onto world space.
    pub cursor_cell: Option<CellCoord>,
    /// Requests the next tile type in the sheet.
    pub cycle_forward: bool,
    /// Wheel notches used to scroll through tile types.
    pub wheel_steps: i32,
}

/// Pure system that turns editor input into tile commands.
#[derive(Debug, Default)]
pub struct Editor {
    play_mode: GameMode,
}

impl Editor {
    /// Consumes world events and editor input to emit painting commands.
    ///
    /// Holding both buttons erases, matching the order in which the buttons
    /// are processed.
    pub fn handle(
        &mut self,
        events: &[Event],
        selection: TileKind,
        input: EditorInput,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::PlayModeChanged { mode } = event {
                self.play_mode = *mode;
            }
        }

        if self.play_mode != GameMode::Editor {
            return;
        }

        let steps = input.wheel_steps + i32::from(input.cycle_forward);
        let selection = if steps != 0 {
            let next = cycle_selection(selection, steps);
            out.push(Command::SelectTile { kind: next });
            next
        } else {
            selection
        };

        let Some(cell) = input.cursor_cell else {
            return;
        };

        if input.erase_held {
            out.push(Command::PlaceTile {
                cell,
                kind: TileKind::EMPTY,
            });
        } else if input.paint_held {
            out.push(Command::PlaceTile {
                cell,
                kind: selection,
            });
        }
    }

    /// Reports the ghost tile to draw under the cursor, if any.
    #[must_use]
    pub fn preview(
        &self,
        selection: TileKind,
        cursor_cell: Option<CellCoord>,
    ) -> Option<TilePreview> {
        if self.play_mode != GameMode::Editor {
            return None;
        }

        cursor_cell.map(|cell| TilePreview {
            cell,
            kind: selection,
        })
    }
}

/// Moves the selection by `steps`, wrapping within the solid tile types.
///
/// The empty tile is never selectable; erasing uses the secondary button.
#[must_use]
pub fn cycle_selection(current: TileKind, steps: i32) -> TileKind {
    let solid_types = i32::from(TILE_TYPE_COUNT) - 1;
    let offset = (i32::from(current.get()) - 1 + steps).rem_euclid(solid_types);
    TileKind::new((offset + 1) as u16)
}
