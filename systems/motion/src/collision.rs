//! Axis-separated collision between the player body and solid tiles.

use caveslave_core::{CellCoord, PlayerBody, TileGridView};

/// Advances the body by `h` seconds, resolving collisions after each axis.
///
/// Horizontal velocity is clamped to the body's maximum first. X advances and
/// the neighborhood is resolved, then Y advances and it is resolved again, so
/// each pass only has to undo movement along a single axis.
///
/// Push-out direction comes from comparing the body and tile positions, so
/// travel per call must stay well below one tile. [`crate::step`] splits each
/// frame into sub-steps that satisfy this.
pub(crate) fn advance_axes(body: &mut PlayerBody, tiles: &TileGridView<'_>, h: f32) {
    let limit = body.max_horizontal_speed;
    body.velocity.x = body.velocity.x.clamp(-limit, limit);

    body.rect.x += body.velocity.x * h;
    resolve_collisions(body, tiles);

    body.rect.y += body.velocity.y * h;
    resolve_collisions(body, tiles);
}

/// Pushes the body out of every solid tile in the 3x3 neighborhood of its cell.
///
/// Cells are visited row by row. Out-of-grid and empty cells are skipped.
pub(crate) fn resolve_collisions(body: &mut PlayerBody, tiles: &TileGridView<'_>) {
    let center = tiles.cell_at(body.center());

    for row in -1..=1 {
        for column in -1..=1 {
            let cell = center.offset(column, row);
            if tiles.is_solid(cell) {
                resolve_tile(body, tiles, cell);
            }
        }
    }
}

fn resolve_tile(body: &mut PlayerBody, tiles: &TileGridView<'_>, cell: CellCoord) {
    let tile = tiles.cell_rect(cell);
    let Some(overlap) = body.rect.intersection(&tile) else {
        return;
    };

    if overlap.width < overlap.height {
        body.rect.x = if body.rect.x < tile.x {
            tile.x - body.rect.width
        } else {
            tile.right()
        };
        body.velocity.x = 0.0;
    } else if body.rect.y < tile.y {
        body.rect.y = tile.y - body.rect.height;
        if body.velocity.y > 0.0 {
            body.velocity.y = 0.0;
        }
    } else {
        body.rect.y = tile.bottom();
        if body.velocity.y < 0.0 {
            body.velocity.y = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caveslave_core::{Rect, TileKind};
    use glam::Vec2;

    const TILE: f32 = 8.0;

    struct Tiles {
        columns: u32,
        rows: u32,
        tiles: Vec<TileKind>,
    }

    impl Tiles {
        fn empty(columns: u32, rows: u32) -> Self {
            Self {
                columns,
                rows,
                tiles: vec![TileKind::EMPTY; (columns * rows) as usize],
            }
        }

        fn with_solid(mut self, column: u32, row: u32) -> Self {
            let index = (row * self.columns + column) as usize;
            self.tiles[index] = TileKind::new(1);
            self
        }

        fn view(&self) -> TileGridView<'_> {
            TileGridView::new(&self.tiles, self.columns, self.rows, TILE)
        }
    }

    fn body(x: f32, y: f32, velocity: Vec2) -> PlayerBody {
        let mut body = PlayerBody::new(Vec2::new(x, y), Vec2::splat(8.0), 100.0);
        body.velocity = velocity;
        body
    }

    #[test]
    fn moving_right_into_tile_stops_flush_against_it() {
        let tiles = Tiles::empty(10, 10).with_solid(2, 1);
        let mut player = body(10.0, 10.0, Vec2::new(100.0, 0.0));

        for _ in 0..10 {
            advance_axes(&mut player, &tiles.view(), 0.01);
        }

        assert!(player.rect.x <= 16.0 - 8.0);
        assert_eq!(player.rect.x, 8.0);
        assert_eq!(player.velocity.x, 0.0);
    }

    #[test]
    fn horizontal_speed_is_clamped_before_moving() {
        let tiles = Tiles::empty(10, 10);
        let mut player = body(8.0, 8.0, Vec2::new(-500.0, 0.0));

        advance_axes(&mut player, &tiles.view(), 0.01);

        assert_eq!(player.velocity.x, -100.0);
        assert!((player.rect.x - 7.0).abs() < 1e-5);
    }

    #[test]
    fn landing_zeroes_downward_velocity() {
        let tiles = Tiles::empty(10, 10).with_solid(2, 3);
        let mut player = body(16.0, 17.0, Vec2::new(0.0, 300.0));

        resolve_collisions(&mut player, &tiles.view());

        assert_eq!(player.rect.y, 16.0);
        assert_eq!(player.velocity.y, 0.0);
    }

    #[test]
    fn upward_velocity_survives_push_up() {
        let tiles = Tiles::empty(10, 10).with_solid(2, 3);
        let mut player = body(16.0, 17.0, Vec2::new(0.0, -50.0));

        resolve_collisions(&mut player, &tiles.view());

        assert_eq!(player.rect.y, 16.0);
        assert_eq!(player.velocity.y, -50.0);
    }

    #[test]
    fn ceiling_hit_zeroes_upward_velocity() {
        let tiles = Tiles::empty(10, 10).with_solid(2, 1);
        let mut player = body(16.0, 15.0, Vec2::new(0.0, -200.0));

        resolve_collisions(&mut player, &tiles.view());

        assert_eq!(player.rect.y, 16.0);
        assert_eq!(player.velocity.y, 0.0);
    }

    #[test]
    fn equal_overlap_resolves_vertically() {
        let tiles = Tiles::empty(10, 10).with_solid(2, 2);
        let mut player = body(10.0, 10.0, Vec2::new(40.0, 40.0));

        resolve_collisions(&mut player, &tiles.view());

        assert_eq!(player.rect, Rect::new(10.0, 8.0, 8.0, 8.0));
        assert_eq!(player.velocity, Vec2::new(40.0, 0.0));
    }

    #[test]
    fn out_of_grid_player_is_tolerated() {
        let tiles = Tiles::empty(4, 4).with_solid(0, 0);
        let mut player = body(-100.0, 250.0, Vec2::new(30.0, 30.0));

        advance_axes(&mut player, &tiles.view(), 0.5);

        assert_eq!(player.rect.position(), Vec2::new(-85.0, 265.0));
    }

    #[test]
    fn touching_tiles_are_not_collisions() {
        let tiles = Tiles::empty(10, 10).with_solid(3, 2);
        let mut player = body(16.0, 16.0, Vec2::new(0.0, 0.0));

        resolve_collisions(&mut player, &tiles.view());

        assert_eq!(player.rect.position(), Vec2::new(16.0, 16.0));
    }
}
