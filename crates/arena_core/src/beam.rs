use crate::tile::{tile_index, TileGrid, TileKind};
use crate::types::{TilePos, UserId};
use slotmap::new_key_type;

new_key_type! { pub struct BeamId; }

/// Distance ahead of the shooter sampled by the muzzle check.
pub const MUZZLE_OFFSET: f64 = 0.6;
/// Angular offset of the two extra multishot beams.
pub const MULTISHOT_SPREAD: f64 = std::f64::consts::PI / 12.0;
/// Directions below this magnitude fall back to +x.
const MIN_DIRECTION: f64 = 1e-3;
/// How far inside the free side of a wall face a stopped beam rests.
const EDGE_STOP_INSET: f64 = 1e-2;
/// How far past the entry face a reflected beam re-enters the world.
const REFLECT_OFFSET: f64 = 0.1;
/// Hard cap on tiles visited per segment.
const TRAVERSAL_CAP: usize = 500;

#[derive(Clone, Debug)]
pub struct Beam {
    pub owner: UserId,
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub dir_x: f64,
    pub dir_y: f64,
    pub speed: f64,
    pub time_alive: f64,
    pub piercing_used: bool,
    pub active: bool,
}

/// Normalize a requested firing direction; near-zero input falls back to +x
/// so a beam is never instantiated with a degenerate direction.
pub fn normalize_direction(dx: f64, dy: f64) -> (f64, f64) {
    let mag = (dx * dx + dy * dy).sqrt();
    if mag < MIN_DIRECTION {
        (1.0, 0.0)
    } else {
        (dx / mag, dy / mag)
    }
}

/// The directions a shot request expands to: one beam, or three fanned at
/// ±15° with multishot. Each direction is muzzle-checked independently.
pub fn spread_directions(dx: f64, dy: f64, multishot: bool) -> Vec<(f64, f64)> {
    let (dx, dy) = normalize_direction(dx, dy);
    if !multishot {
        return vec![(dx, dy)];
    }
    let rotate = |angle: f64| {
        let (sin, cos) = angle.sin_cos();
        (dx * cos - dy * sin, dx * sin + dy * cos)
    };
    vec![
        (dx, dy),
        rotate(MULTISHOT_SPREAD),
        rotate(-MULTISHOT_SPREAD),
    ]
}

/// Build a beam at the shooter's position, or `None` when the muzzle sample
/// point lands in a wall, hole, or out of bounds. Mirrors do not block the
/// muzzle; point-blank mirror shots reflect on their first update.
pub fn spawn_beam(
    grid: &TileGrid,
    owner: &UserId,
    color: &str,
    px: f64,
    py: f64,
    dx: f64,
    dy: f64,
    speed: f64,
) -> Option<Beam> {
    let (dir_x, dir_y) = normalize_direction(dx, dy);
    let probe = grid.at_point(px + MUZZLE_OFFSET * dir_x, py + MUZZLE_OFFSET * dir_y);
    if matches!(probe, TileKind::Wall | TileKind::Hole | TileKind::Boundary) {
        return None;
    }
    Some(Beam {
        owner: owner.clone(),
        color: color.to_string(),
        x: px,
        y: py,
        dir_x,
        dir_y,
        speed,
        time_alive: 0.0,
        piercing_used: false,
        active: true,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HitKind {
    Wall,
    Mirror,
    /// Hole or boundary: the beam simply dies.
    Absorb,
}

#[derive(Clone, Copy, Debug)]
struct Hit {
    pos: TilePos,
    kind: HitKind,
}

struct Trace {
    captured: Vec<TilePos>,
    hit: Option<Hit>,
    pierced: bool,
}

/// Visit every tile the segment enters, in order, via DDA over the
/// half-integer tile boundaries. A simultaneous X/Y crossing steps
/// diagonally, so a ray grazing a corner visits the diagonal neighbor
/// rather than both orthogonal ones.
fn trace_segment(
    grid: &TileGrid,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    can_pierce: bool,
) -> Trace {
    let dx = x1 - x0;
    let dy = y1 - y0;

    let mut tx = tile_index(x0);
    let mut ty = tile_index(y0);

    let step_x: i16 = if dx > 0.0 { 1 } else { -1 };
    let step_y: i16 = if dy > 0.0 { 1 } else { -1 };

    let t_delta_x = if dx != 0.0 {
        (1.0 / dx).abs()
    } else {
        f64::INFINITY
    };
    let t_delta_y = if dy != 0.0 {
        (1.0 / dy).abs()
    } else {
        f64::INFINITY
    };

    let mut t_max_x = if dx != 0.0 {
        ((tx as f64 + 0.5 * step_x as f64) - x0) / dx
    } else {
        f64::INFINITY
    };
    let mut t_max_y = if dy != 0.0 {
        ((ty as f64 + 0.5 * step_y as f64) - y0) / dy
    } else {
        f64::INFINITY
    };

    let mut trace = Trace {
        captured: Vec::new(),
        hit: None,
        pierced: false,
    };

    if visit(grid, tx, ty, can_pierce, &mut trace) {
        return trace;
    }

    for _ in 0..TRAVERSAL_CAP {
        if t_max_x > 1.0 && t_max_y > 1.0 {
            break;
        }
        if t_max_x < t_max_y {
            tx += step_x;
            t_max_x += t_delta_x;
        } else if t_max_y < t_max_x {
            ty += step_y;
            t_max_y += t_delta_y;
        } else {
            tx += step_x;
            ty += step_y;
            t_max_x += t_delta_x;
            t_max_y += t_delta_y;
        }
        if visit(grid, tx, ty, can_pierce, &mut trace) {
            break;
        }
    }

    trace
}

/// Classify one visited tile. Returns true when traversal must stop.
fn visit(grid: &TileGrid, tx: i16, ty: i16, can_pierce: bool, trace: &mut Trace) -> bool {
    match grid.get(tx, ty) {
        TileKind::Walkable | TileKind::Generator => {
            trace.captured.push((tx, ty));
            false
        }
        TileKind::Wall => {
            if can_pierce && !trace.pierced {
                trace.pierced = true;
                false
            } else {
                trace.hit = Some(Hit {
                    pos: (tx, ty),
                    kind: HitKind::Wall,
                });
                true
            }
        }
        TileKind::Mirror => {
            trace.hit = Some(Hit {
                pos: (tx, ty),
                kind: HitKind::Mirror,
            });
            true
        }
        TileKind::Hole | TileKind::Boundary => {
            trace.hit = Some(Hit {
                pos: (tx, ty),
                kind: HitKind::Absorb,
            });
            true
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Face {
    Left,
    Right,
    Top,
    Bottom,
}

/// Exact entry point of the ray into a tile: the smallest positive `t`
/// intersection with one of the four edges whose hit point lies within the
/// perpendicular span of that edge.
fn entry_face(x: f64, y: f64, dx: f64, dy: f64, tile: TilePos) -> Option<(Face, f64, f64)> {
    let cx = tile.0 as f64;
    let cy = tile.1 as f64;
    let mut best: Option<(Face, f64)> = None;

    let mut consider = |face: Face, t: f64, span: f64, lo: f64, hi: f64| {
        if t > 0.0 && span >= lo && span <= hi {
            match best {
                Some((_, best_t)) if best_t <= t => {}
                _ => best = Some((face, t)),
            }
        }
    };

    if dx != 0.0 {
        let t = (cx - 0.5 - x) / dx;
        consider(Face::Left, t, y + t * dy, cy - 0.5, cy + 0.5);
        let t = (cx + 0.5 - x) / dx;
        consider(Face::Right, t, y + t * dy, cy - 0.5, cy + 0.5);
    }
    if dy != 0.0 {
        let t = (cy - 0.5 - y) / dy;
        consider(Face::Top, t, x + t * dx, cx - 0.5, cx + 0.5);
        let t = (cy + 0.5 - y) / dy;
        consider(Face::Bottom, t, x + t * dx, cx - 0.5, cx + 0.5);
    }

    best.map(|(face, t)| (face, x + t * dx, y + t * dy))
}

/// Stop point against a wall tile: the ray's intersection with the entry
/// face, pulled back out of the wall by a small inset. Face selection uses
/// the dominant axis and sign of the direction.
fn edge_stop(x: f64, y: f64, dx: f64, dy: f64, tile: TilePos) -> (f64, f64) {
    let cx = tile.0 as f64;
    let cy = tile.1 as f64;
    if dx.abs() >= dy.abs() {
        let face_x = cx - 0.5 * dx.signum();
        let t = (face_x - x) / dx;
        (face_x - EDGE_STOP_INSET * dx.signum(), y + t * dy)
    } else {
        let face_y = cy - 0.5 * dy.signum();
        let t = (face_y - y) / dy;
        (x + t * dx, face_y - EDGE_STOP_INSET * dy.signum())
    }
}

/// What one beam did during a tick.
pub struct BeamTickOutcome {
    /// Capturable tiles the beam passed through, in traversal order, up to
    /// but excluding any blocking tile.
    pub captured: Vec<TilePos>,
    /// True when the beam became inactive this tick.
    pub ended: bool,
}

/// Advance one beam by `dt`, resolving captures, wall stops, piercing, and
/// mirror reflection.
pub fn update_beam(
    beam: &mut Beam,
    grid: &TileGrid,
    dt: f64,
    owner_piercing: bool,
    max_age: f64,
) -> BeamTickOutcome {
    if beam.time_alive + dt >= max_age {
        beam.active = false;
        return BeamTickOutcome {
            captured: Vec::new(),
            ended: true,
        };
    }

    let nx = beam.x + beam.dir_x * beam.speed * dt;
    let ny = beam.y + beam.dir_y * beam.speed * dt;
    let can_pierce = owner_piercing && !beam.piercing_used;

    let trace = trace_segment(grid, beam.x, beam.y, nx, ny, can_pierce);
    if trace.pierced {
        beam.piercing_used = true;
    }
    beam.time_alive += dt;

    let ended = match trace.hit {
        None => {
            beam.x = nx;
            beam.y = ny;
            false
        }
        Some(Hit {
            pos,
            kind: HitKind::Wall,
        }) => {
            let (sx, sy) = edge_stop(beam.x, beam.y, beam.dir_x, beam.dir_y, pos);
            beam.x = sx;
            beam.y = sy;
            beam.active = false;
            true
        }
        Some(Hit {
            pos,
            kind: HitKind::Mirror,
        }) => reflect(beam, grid, pos),
        Some(Hit {
            kind: HitKind::Absorb,
            ..
        }) => {
            beam.active = false;
            true
        }
    };

    BeamTickOutcome {
        captured: trace.captured,
        ended,
    }
}

/// Reflect off the face the beam entered through: left/right faces negate
/// the x direction, top/bottom the y direction. The beam re-enters slightly
/// past the face; a re-entry point inside another blocking tile terminates
/// the beam at the entry point instead.
fn reflect(beam: &mut Beam, grid: &TileGrid, tile: TilePos) -> bool {
    let Some((face, ex, ey)) = entry_face(beam.x, beam.y, beam.dir_x, beam.dir_y, tile) else {
        beam.active = false;
        return true;
    };

    let (ndx, ndy) = match face {
        Face::Left | Face::Right => (-beam.dir_x, beam.dir_y),
        Face::Top | Face::Bottom => (beam.dir_x, -beam.dir_y),
    };

    let rx = ex + ndx * REFLECT_OFFSET;
    let ry = ey + ndy * REFLECT_OFFSET;
    if grid.at_point(rx, ry).blocks_beam() {
        beam.x = ex;
        beam.y = ey;
        beam.active = false;
        return true;
    }

    beam.x = rx;
    beam.y = ry;
    beam.dir_x = ndx;
    beam.dir_y = ndy;
    false
}
