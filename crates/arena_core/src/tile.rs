use crate::types::TilePos;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileKind {
    Walkable,
    Generator,
    Wall,
    Mirror,
    Hole,
    /// Synthetic kind for out-of-bounds reads; never stored in a grid.
    Boundary,
}

impl TileKind {
    /// Tiles a player's collision circle may not overlap.
    pub fn blocks_movement(self) -> bool {
        matches!(
            self,
            TileKind::Wall | TileKind::Mirror | TileKind::Hole | TileKind::Boundary
        )
    }

    /// Tiles that stop, deflect, or absorb a beam.
    pub fn blocks_beam(self) -> bool {
        matches!(
            self,
            TileKind::Wall | TileKind::Mirror | TileKind::Hole | TileKind::Boundary
        )
    }

    /// Only walkable and generator tiles can carry an owner.
    pub fn is_capturable(self) -> bool {
        matches!(self, TileKind::Walkable | TileKind::Generator)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TileKind::Walkable => "walkable",
            TileKind::Generator => "generator",
            TileKind::Wall => "wall",
            TileKind::Mirror => "mirror",
            TileKind::Hole => "hole",
            TileKind::Boundary => "boundary",
        }
    }
}

/// Index of the tile containing a continuous coordinate. Tile `n` spans
/// `[n - 0.5, n + 0.5)`.
#[inline]
pub fn tile_index(v: f64) -> i16 {
    (v + 0.5).floor() as i16
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    width: i16,
    height: i16,
    cells: Vec<TileKind>,
}

impl TileGrid {
    pub fn new(width: i16, height: i16) -> Self {
        Self {
            width,
            height,
            cells: vec![TileKind::Walkable; (width as usize) * (height as usize)],
        }
    }

    #[inline]
    pub fn width(&self) -> i16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i16 {
        self.height
    }

    #[inline]
    fn idx(&self, x: i16, y: i16) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    #[inline]
    pub fn in_bounds(&self, x: i16, y: i16) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Kind at `(x, y)`, or `Boundary` when out of bounds.
    #[inline]
    pub fn get(&self, x: i16, y: i16) -> TileKind {
        if self.in_bounds(x, y) {
            self.cells[self.idx(x, y)]
        } else {
            TileKind::Boundary
        }
    }

    #[inline]
    pub fn set(&mut self, x: i16, y: i16, kind: TileKind) {
        if self.in_bounds(x, y) {
            let idx = self.idx(x, y);
            self.cells[idx] = kind;
        }
    }

    /// Kind of the tile containing a continuous point.
    #[inline]
    pub fn at_point(&self, x: f64, y: f64) -> TileKind {
        self.get(tile_index(x), tile_index(y))
    }

    /// All coordinates in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = TilePos> + '_ {
        let width = self.width;
        let height = self.height;
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }

    /// Coordinates of every capturable tile.
    pub fn capturable_positions(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.positions()
            .filter(move |&(x, y)| self.get(x, y).is_capturable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reads_are_boundary() {
        let grid = TileGrid::new(10, 10);
        assert_eq!(grid.get(-1, 5), TileKind::Boundary);
        assert_eq!(grid.get(10, 5), TileKind::Boundary);
        assert_eq!(grid.get(5, 5), TileKind::Walkable);
    }

    #[test]
    fn tile_index_uses_centered_spans() {
        assert_eq!(tile_index(5.0), 5);
        assert_eq!(tile_index(5.49), 5);
        assert_eq!(tile_index(5.5), 6);
        assert_eq!(tile_index(4.51), 5);
        assert_eq!(tile_index(-0.4), 0);
    }

    #[test]
    fn capturable_excludes_blocking_kinds() {
        let mut grid = TileGrid::new(3, 3);
        grid.set(0, 0, TileKind::Wall);
        grid.set(1, 0, TileKind::Mirror);
        grid.set(2, 0, TileKind::Hole);
        grid.set(0, 1, TileKind::Generator);
        let capturable: Vec<_> = grid.capturable_positions().collect();
        assert_eq!(capturable.len(), 6);
        assert!(capturable.contains(&(0, 1)));
        assert!(!capturable.contains(&(0, 0)));
    }
}
