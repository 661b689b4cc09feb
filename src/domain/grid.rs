/// The spatial model: a fixed `width × height` row-major array of tiles.
///
/// Occupancy is stored on the tiles as `ActorId`s. The grid knows nothing
/// about actors themselves; `sim::world::World` keeps the two views in sync.
///
/// Coordinates are `usize`. Neighbour arithmetic goes through `offset`, which
/// returns `None` off the edge instead of wrapping.

use crate::error::GridError;

use super::entity::{ActorId, Direction};
use super::tile::{Tile, TileKind};

/// Neighbour order for `adjacent`: +x, −x, +y, −y.
pub const ADJACENT: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Build a grid from row-major kinds. Missing trailing cells become Path.
    pub fn from_kinds(width: usize, height: usize, kinds: &[TileKind]) -> Self {
        let mut tiles = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let kind = kinds.get(y * width + x).copied().unwrap_or_default();
                tiles.push(Tile::new(kind, x, y));
            }
        }
        Grid { width, height, tiles }
    }

    pub fn filled(width: usize, height: usize, kind: TileKind) -> Self {
        Grid::from_kinds(width, height, &vec![kind; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// `(x + dx, y + dy)` if that lands inside the grid.
    pub fn offset(&self, x: usize, y: usize, dx: i32, dy: i32) -> Option<(usize, usize)> {
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        if nx < 0 || ny < 0 {
            return None;
        }
        let (nx, ny) = (nx as usize, ny as usize);
        self.in_bounds(nx, ny).then_some((nx, ny))
    }

    pub fn step(&self, x: usize, y: usize, dir: Direction) -> Option<(usize, usize)> {
        let (dx, dy) = dir.delta();
        self.offset(x, y, dx, dy)
    }

    fn bounds_error(&self, x: usize, y: usize) -> GridError {
        GridError::OutOfBounds { x, y, width: self.width, height: self.height }
    }

    /// Checked access. Out-of-bounds is a caller bug and reported as such.
    pub fn tile(&self, x: usize, y: usize) -> Result<&Tile, GridError> {
        self.get(x, y).ok_or_else(|| self.bounds_error(x, y))
    }

    /// Lenient access for neighbour probing.
    pub fn get(&self, x: usize, y: usize) -> Option<&Tile> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.tiles.get(y * self.width + x)
    }

    pub fn kind_at(&self, x: usize, y: usize) -> Option<TileKind> {
        self.get(x, y).map(Tile::kind)
    }

    pub fn occupant_at(&self, x: usize, y: usize) -> Option<ActorId> {
        self.get(x, y).and_then(Tile::occupant)
    }

    /// In-bounds orthogonal neighbours in `ADJACENT` order.
    pub fn adjacent(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        ADJACENT
            .iter()
            .filter_map(|&(dx, dy)| self.offset(x, y, dx, dy))
            .collect()
    }

    /// Replace the tile at `(x, y)`, keeping its occupant. Path is the only
    /// kind a live level ever changes a tile into.
    pub fn change_tile(&mut self, x: usize, y: usize, kind: TileKind) -> Result<(), GridError> {
        if !self.in_bounds(x, y) {
            return Err(self.bounds_error(x, y));
        }
        if kind != TileKind::Path {
            return Err(GridError::InvalidTileChange { x, y, target: kind });
        }
        let idx = y * self.width + x;
        let occupant = self.tiles[idx].occupant();
        let mut fresh = Tile::new(kind, x, y);
        fresh.set_occupant(occupant);
        self.tiles[idx] = fresh;
        Ok(())
    }

    /// Collected keys, opened doors, blasted walls: all become Path.
    pub fn remove_tile(&mut self, x: usize, y: usize) -> Result<(), GridError> {
        self.change_tile(x, y, TileKind::Path)
    }

    pub(crate) fn set_occupant(
        &mut self,
        x: usize,
        y: usize,
        occupant: Option<ActorId>,
    ) -> Result<(), GridError> {
        if !self.in_bounds(x, y) {
            return Err(self.bounds_error(x, y));
        }
        self.tiles[y * self.width + x].set_occupant(occupant);
        Ok(())
    }

    /// Row-major iteration over every tile.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn kinds(&self) -> Vec<TileKind> {
        self.tiles.iter().map(Tile::kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_order_is_plus_x_minus_x_plus_y_minus_y() {
        let g = Grid::filled(3, 3, TileKind::Path);
        assert_eq!(g.adjacent(1, 1), vec![(2, 1), (0, 1), (1, 2), (1, 0)]);
    }

    #[test]
    fn adjacent_drops_out_of_bounds() {
        let g = Grid::filled(3, 3, TileKind::Path);
        assert_eq!(g.adjacent(0, 0), vec![(1, 0), (0, 1)]);
        assert_eq!(g.adjacent(2, 2), vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn tile_out_of_bounds_is_an_error() {
        let g = Grid::filled(2, 2, TileKind::Wall);
        assert!(matches!(g.tile(2, 0), Err(GridError::OutOfBounds { .. })));
        assert!(g.get(0, 5).is_none());
        assert_eq!(g.tile(1, 1).map(Tile::kind), Ok(TileKind::Wall));
    }

    #[test]
    fn change_tile_keeps_occupant() {
        let mut g = Grid::filled(2, 1, TileKind::Dirt);
        g.set_occupant(1, 0, Some(ActorId(4))).unwrap();
        g.change_tile(1, 0, TileKind::Path).unwrap();
        let t = g.tile(1, 0).unwrap();
        assert_eq!(t.kind(), TileKind::Path);
        assert_eq!(t.occupant(), Some(ActorId(4)));
    }

    #[test]
    fn change_tile_rejects_non_path_targets() {
        let mut g = Grid::filled(2, 1, TileKind::Path);
        assert_eq!(
            g.change_tile(0, 0, TileKind::Wall),
            Err(GridError::InvalidTileChange { x: 0, y: 0, target: TileKind::Wall })
        );
        assert!(matches!(
            g.remove_tile(9, 0),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn offset_refuses_to_wrap() {
        let g = Grid::filled(4, 4, TileKind::Path);
        assert_eq!(g.offset(0, 0, -1, 0), None);
        assert_eq!(g.offset(3, 3, 1, 0), None);
        assert_eq!(g.step(1, 1, Direction::North), Some((1, 0)));
    }
}
