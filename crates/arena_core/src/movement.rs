use crate::player::{InputState, Player, PLAYER_RADIUS};
use crate::tile::TileGrid;

const RADIUS_SQ: f64 = PLAYER_RADIUS * PLAYER_RADIUS;

/// Unit intent direction from held keys. Opposing keys cancel; diagonals are
/// normalized so diagonal movement is not faster.
pub fn input_direction(input: InputState) -> (f64, f64) {
    let x = (input.d as i8 - input.a as i8) as f64;
    let y = (input.s as i8 - input.w as i8) as f64;
    if x != 0.0 && y != 0.0 {
        (x * std::f64::consts::FRAC_1_SQRT_2, y * std::f64::consts::FRAC_1_SQRT_2)
    } else {
        (x, y)
    }
}

fn circle_overlaps_tile(cx: f64, cy: f64, tx: i16, ty: i16) -> bool {
    let nearest_x = cx.clamp(tx as f64 - 0.5, tx as f64 + 0.5);
    let nearest_y = cy.clamp(ty as f64 - 0.5, ty as f64 + 0.5);
    let dx = cx - nearest_x;
    let dy = cy - nearest_y;
    dx * dx + dy * dy <= RADIUS_SQ
}

/// Whether a collision circle centered at `(cx, cy)` overlaps any blocking
/// tile (or the out-of-map boundary).
pub fn position_blocked(grid: &TileGrid, cx: f64, cy: f64) -> bool {
    let x0 = (cx - PLAYER_RADIUS).floor() as i16 - 1;
    let x1 = (cx + PLAYER_RADIUS).floor() as i16 + 1;
    let y0 = (cy - PLAYER_RADIUS).floor() as i16 - 1;
    let y1 = (cy + PLAYER_RADIUS).floor() as i16 + 1;

    for ty in y0..=y1 {
        for tx in x0..=x1 {
            if grid.get(tx, ty).blocks_movement() && circle_overlaps_tile(cx, cy, tx, ty) {
                return true;
            }
        }
    }
    false
}

/// Advance one player by `dt` with axis-decomposed swept collision. Each axis
/// is accepted or rejected independently, which produces wall sliding.
pub fn move_player(player: &mut Player, grid: &TileGrid, base_speed: f64, dt: f64) {
    let (dir_x, dir_y) = input_direction(player.input);
    let speed = base_speed * player.speed_multiplier();
    player.vx = dir_x * speed;
    player.vy = dir_y * speed;

    let nx = player.x + player.vx * dt;
    if !position_blocked(grid, nx, player.y) {
        player.x = nx;
    }

    let ny = player.y + player.vy * dt;
    if !position_blocked(grid, player.x, ny) {
        player.y = ny;
    }

    let max_x = grid.width() as f64 - 1.0 - PLAYER_RADIUS;
    let max_y = grid.height() as f64 - 1.0 - PLAYER_RADIUS;
    player.x = player.x.clamp(PLAYER_RADIUS, max_x);
    player.y = player.y.clamp(PLAYER_RADIUS, max_y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileKind;

    fn open_grid(size: i16) -> TileGrid {
        TileGrid::new(size, size)
    }

    fn test_player(x: f64, y: f64) -> Player {
        let mut player = Player::new("p1".to_string(), "P1".to_string(), None, 0, (0, 0));
        player.x = x;
        player.y = y;
        player
    }

    #[test]
    fn diagonal_input_is_unit_length() {
        let dir = input_direction(InputState {
            w: false,
            a: false,
            s: true,
            d: true,
        });
        let mag = (dir.0 * dir.0 + dir.1 * dir.1).sqrt();
        assert!((mag - 1.0).abs() < 1e-12);
    }

    #[test]
    fn opposing_keys_cancel() {
        let dir = input_direction(InputState {
            w: true,
            a: true,
            s: true,
            d: true,
        });
        assert_eq!(dir, (0.0, 0.0));
    }

    #[test]
    fn slides_along_a_wall_column() {
        let mut grid = open_grid(5);
        for y in 0..5 {
            grid.set(2, y, TileKind::Wall);
        }

        let mut player = test_player(1.0, 2.5);
        player.input = InputState {
            w: false,
            a: false,
            s: false,
            d: true,
        };
        for _ in 0..10 {
            move_player(&mut player, &grid, 5.0, 0.05);
        }
        // The wall column's near face is at x = 1.5; the center can never
        // pass 1.1 and the discrete proposals are rejected before that.
        assert!(player.x <= 1.5 - PLAYER_RADIUS + 1e-9);
        assert_eq!(player.y, 2.5);

        // Holding s as well slides along y while x stays pinned.
        let pinned_x = player.x;
        player.input.s = true;
        for _ in 0..10 {
            move_player(&mut player, &grid, 5.0, 0.05);
        }
        assert_eq!(player.x, pinned_x);
        assert!(player.y > 2.5);
    }

    #[test]
    fn clamps_to_map_interior() {
        let grid = open_grid(10);
        let mut player = test_player(0.5, 0.5);
        player.input = InputState {
            w: true,
            a: true,
            s: false,
            d: false,
        };
        for _ in 0..40 {
            move_player(&mut player, &grid, 5.0, 0.05);
        }
        assert!(player.x >= PLAYER_RADIUS);
        assert!(player.y >= PLAYER_RADIUS);
    }

    #[test]
    fn open_floor_velocity_matches_speed() {
        let grid = open_grid(20);
        let mut player = test_player(10.0, 10.0);
        player.input = InputState {
            w: false,
            a: false,
            s: false,
            d: true,
        };
        move_player(&mut player, &grid, 5.0, 0.05);
        assert!((player.x - 10.25).abs() < 1e-9);
        assert_eq!(player.vx, 5.0);
        assert_eq!(player.vy, 0.0);
    }

    #[test]
    fn speed_stacks_scale_velocity() {
        let grid = open_grid(20);
        let mut player = test_player(10.0, 10.0);
        player.speed_stacks = 2;
        player.input = InputState {
            w: false,
            a: false,
            s: false,
            d: true,
        };
        move_player(&mut player, &grid, 5.0, 0.05);
        assert!((player.vx - 6.5).abs() < 1e-9);
    }
}
