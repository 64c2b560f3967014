use crate::tile::{TileGrid, TileKind};
use crate::types::TilePos;
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::VecDeque;

const SPAWN_MARGIN: i16 = 10;
const SPAWN_CLEARING: i16 = 5;
const GENERATOR_MIN_SPACING: f64 = 15.0;
const GENERATOR_PLACEMENT_ATTEMPTS: u32 = 1000;
const WALL_GENERATOR_CLEARANCE: f64 = 3.0;
const HOLE_GENERATOR_CLEARANCE: f64 = 5.0;
const HOLE_PLACEMENT_ATTEMPTS: u32 = 100;
const MIRROR_CHANCE: f64 = 0.3;

/// Output of one successful generation run. `generators` and `spawn_points`
/// are read-only after this.
#[derive(Clone, Debug)]
pub struct GeneratedMap {
    pub grid: TileGrid,
    pub generators: Vec<TilePos>,
    pub spawn_points: Vec<TilePos>,
}

/// Build a map, retrying whole attempts until every spawn point can reach
/// every other over walkable/generator tiles. Count shortfalls from crowded
/// placement rolls are tolerated; only failed connectivity restarts.
pub fn generate(size: i16, rng: &mut StdRng) -> GeneratedMap {
    loop {
        let map = build_attempt(size, rng);
        if spawns_connected(&map.grid, &map.spawn_points) {
            return map;
        }
    }
}

fn build_attempt(size: i16, rng: &mut StdRng) -> GeneratedMap {
    let mut grid = TileGrid::new(size, size);

    for x in 0..size {
        grid.set(x, 0, TileKind::Wall);
        grid.set(x, size - 1, TileKind::Wall);
    }
    for y in 0..size {
        grid.set(0, y, TileKind::Wall);
        grid.set(size - 1, y, TileKind::Wall);
    }

    let generators = place_generators(&mut grid, size, rng);
    place_wall_clusters(&mut grid, size, &generators, rng);
    place_holes(&mut grid, size, &generators, rng);

    for (x, y) in grid.positions().collect::<Vec<_>>() {
        if grid.get(x, y) == TileKind::Wall && rng.gen_bool(MIRROR_CHANCE) {
            grid.set(x, y, TileKind::Mirror);
        }
    }

    let m = SPAWN_MARGIN;
    let spawn_points = vec![
        (m, m),
        (size - 1 - m, m),
        (m, size - 1 - m),
        (size - 1 - m, size - 1 - m),
    ];

    for &(sx, sy) in &spawn_points {
        for dy in -SPAWN_CLEARING..=SPAWN_CLEARING {
            for dx in -SPAWN_CLEARING..=SPAWN_CLEARING {
                grid.set(sx + dx, sy + dy, TileKind::Walkable);
            }
        }
    }

    // Clearings may have paved over generator tiles; drop those entries.
    let generators: Vec<TilePos> = generators
        .into_iter()
        .filter(|&(x, y)| grid.get(x, y) == TileKind::Generator)
        .collect();

    GeneratedMap {
        grid,
        generators,
        spawn_points,
    }
}

fn distance(a: TilePos, b: TilePos) -> f64 {
    let dx = (a.0 - b.0) as f64;
    let dy = (a.1 - b.1) as f64;
    (dx * dx + dy * dy).sqrt()
}

fn place_generators(grid: &mut TileGrid, size: i16, rng: &mut StdRng) -> Vec<TilePos> {
    let target = rng.gen_range(8..=12);
    let mut placed: Vec<TilePos> = Vec::with_capacity(target);
    let mut attempts = 0;

    while placed.len() < target && attempts < GENERATOR_PLACEMENT_ATTEMPTS {
        attempts += 1;
        let pos = (
            rng.gen_range(SPAWN_MARGIN..=size - SPAWN_MARGIN - 1),
            rng.gen_range(SPAWN_MARGIN..=size - SPAWN_MARGIN - 1),
        );
        if placed
            .iter()
            .all(|&other| distance(pos, other) >= GENERATOR_MIN_SPACING)
        {
            grid.set(pos.0, pos.1, TileKind::Generator);
            placed.push(pos);
        }
    }

    placed
}

fn place_wall_clusters(grid: &mut TileGrid, size: i16, generators: &[TilePos], rng: &mut StdRng) {
    let clusters = rng.gen_range(15..=25);

    for _ in 0..clusters {
        let mut cursor = (
            rng.gen_range(5..=size - 6),
            rng.gen_range(5..=size - 6),
        );
        let cluster_size = rng.gen_range(3..=10);

        for _ in 0..cluster_size {
            let clear_of_generators = generators
                .iter()
                .all(|&g| distance(cursor, g) >= WALL_GENERATOR_CLEARANCE);
            if grid.get(cursor.0, cursor.1) == TileKind::Walkable && clear_of_generators {
                grid.set(cursor.0, cursor.1, TileKind::Wall);
            }

            // Random-walk one cardinal step; out-of-range steps simply fail
            // the walkable check above.
            match rng.gen_range(0..4) {
                0 => cursor.0 += 1,
                1 => cursor.0 -= 1,
                2 => cursor.1 += 1,
                _ => cursor.1 -= 1,
            }
        }
    }
}

fn place_holes(grid: &mut TileGrid, size: i16, generators: &[TilePos], rng: &mut StdRng) {
    let holes = rng.gen_range(5..=10);

    for _ in 0..holes {
        for _ in 0..HOLE_PLACEMENT_ATTEMPTS {
            let pos = (rng.gen_range(1..size - 1), rng.gen_range(1..size - 1));
            let clear_of_generators = generators
                .iter()
                .all(|&g| distance(pos, g) >= HOLE_GENERATOR_CLEARANCE);
            if grid.get(pos.0, pos.1) == TileKind::Walkable && clear_of_generators {
                grid.set(pos.0, pos.1, TileKind::Hole);
                break;
            }
        }
    }
}

/// BFS flood fill from the first spawn over capturable tiles; true when all
/// spawns are reachable from it.
fn spawns_connected(grid: &TileGrid, spawns: &[TilePos]) -> bool {
    let Some(&start) = spawns.first() else {
        return true;
    };

    let width = grid.width() as usize;
    let height = grid.height() as usize;
    let mut visited = vec![false; width * height];
    let mut queue = VecDeque::new();

    visited[start.1 as usize * width + start.0 as usize] = true;
    queue.push_back(start);

    while let Some((x, y)) = queue.pop_front() {
        for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
            if !grid.in_bounds(nx, ny) {
                continue;
            }
            let idx = ny as usize * width + nx as usize;
            if visited[idx] || !grid.get(nx, ny).is_capturable() {
                continue;
            }
            visited[idx] = true;
            queue.push_back((nx, ny));
        }
    }

    spawns
        .iter()
        .all(|&(x, y)| visited[y as usize * width + x as usize])
}
