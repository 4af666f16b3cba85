#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative per-cell solving state.
//!
//! The [`Grid`] stores, for every cell of a `width x height` lattice, the set
//! of tiles still possible there, the tile it collapsed to (if any) and
//! whether it was pinned by the author. Cells change only through the
//! mutators on [`Grid`]; systems read the grid and call those mutators.

use std::sync::Arc;

use tilewave_core::{
    CellCoord, CellRect, CellRectSize, ConfigurationError, GridError, Possibilities, Side, TileId,
    Violation,
};
use tilewave_tileset::TileSet;

/// Solving state of a single cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    collapsed: Option<TileId>,
    possibilities: Possibilities,
    locked: bool,
}

impl Cell {
    fn open(tile_count: usize) -> Self {
        Self {
            collapsed: None,
            possibilities: Possibilities::full(tile_count),
            locked: false,
        }
    }

    /// Tile the cell collapsed to, if any.
    #[must_use]
    pub fn collapsed(&self) -> Option<TileId> {
        self.collapsed
    }

    /// Tiles still permitted in the cell.
    #[must_use]
    pub fn possibilities(&self) -> &Possibilities {
        &self.possibilities
    }

    /// Reports whether the cell was pinned before solving and must not change.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Reports whether the cell holds a final tile.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.collapsed.is_some()
    }

    /// Number of remaining tile choices.
    #[must_use]
    pub fn entropy(&self) -> usize {
        self.possibilities.len()
    }

    /// Reports whether no tile fits the cell any more.
    #[must_use]
    pub fn is_contradiction(&self) -> bool {
        self.collapsed.is_none() && self.possibilities.is_empty()
    }
}

/// Result of narrowing a cell's possibilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Restriction {
    /// Nothing was removed.
    Unchanged,
    /// Some tiles were removed and at least one remains.
    Narrowed,
    /// The last remaining tiles were removed.
    Emptied,
}

impl Restriction {
    /// Reports whether the possibility set shrank.
    #[must_use]
    pub const fn shrank(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Dense lattice of cells sharing one tile set.
#[derive(Clone, Debug)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Arc<TileSet>,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid where every cell may still hold any tile.
    pub fn new(width: u32, height: u32, tiles: Arc<TileSet>) -> Result<Self, ConfigurationError> {
        if width == 0 || height == 0 {
            return Err(ConfigurationError::EmptyGrid { width, height });
        }
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64)
            .map_err(|_| ConfigurationError::EmptyGrid { width, height })?;
        let cells = vec![Cell::open(tiles.len()); capacity];
        Ok(Self {
            width,
            height,
            tiles,
            cells,
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile set the grid was created for.
    #[must_use]
    pub fn tile_set(&self) -> &TileSet {
        &self.tiles
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Rectangle covering the whole grid.
    #[must_use]
    pub const fn bounds(&self) -> CellRect {
        CellRect::from_origin_and_size(
            CellCoord::new(0, 0),
            CellRectSize::new(self.width, self.height),
        )
    }

    /// Reports whether `cell` lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// Packed row-major index of `cell`.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }

    /// Cell coordinate stored at packed `index`.
    #[must_use]
    pub fn coord(&self, index: usize) -> Option<CellCoord> {
        if index >= self.cells.len() {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// State of `cell`.
    pub fn cell(&self, cell: CellCoord) -> Result<&Cell, GridError> {
        let index = self.checked_index(cell)?;
        Ok(&self.cells[index])
    }

    /// Tile `cell` collapsed to, if any.
    pub fn collapsed_at(&self, cell: CellCoord) -> Result<Option<TileId>, GridError> {
        self.cell(cell).map(Cell::collapsed)
    }

    /// Tiles still permitted in `cell`.
    pub fn possibilities_at(&self, cell: CellCoord) -> Result<&Possibilities, GridError> {
        self.cell(cell).map(Cell::possibilities)
    }

    /// Iterates every cell with its coordinate in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &Cell)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let coord = CellCoord::new((index % width) as u32, (index / width) as u32);
            (coord, cell)
        })
    }

    /// In-bounds neighbours of `cell` in north, east, south, west order.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = (Side, CellCoord)> {
        let mut candidates = [None; 4];
        let mut count = 0;

        for side in Side::ALL {
            if let Some(neighbor) = cell.step(side) {
                if self.contains(neighbor) {
                    candidates[count] = Some((side, neighbor));
                    count += 1;
                }
            }
        }

        candidates.into_iter().take(count).flatten()
    }

    /// Collapses `cell` to `tile`.
    ///
    /// The tile must still be possible in the cell. Locked cells accept only
    /// the tile they were locked to.
    pub fn collapse(&mut self, cell: CellCoord, tile: TileId) -> Result<(), GridError> {
        let index = self.checked_index(cell)?;
        let capacity = self.tiles.len();
        let slot = &mut self.cells[index];

        if slot.locked {
            return if slot.collapsed == Some(tile) {
                Ok(())
            } else {
                Err(GridError::InvariantViolation {
                    cell,
                    violation: Violation::LockedCell { tile },
                })
            };
        }

        if !slot.possibilities.contains(tile) {
            return Err(GridError::InvariantViolation {
                cell,
                violation: Violation::TileNotPossible { tile },
            });
        }

        slot.collapsed = Some(tile);
        slot.possibilities = Possibilities::single(capacity, tile);
        Ok(())
    }

    /// Collapses `cell` to `tile` and pins it so later resets leave it alone.
    pub fn lock(&mut self, cell: CellCoord, tile: TileId) -> Result<(), GridError> {
        self.collapse(cell, tile)?;
        let index = self.checked_index(cell)?;
        self.cells[index].locked = true;
        Ok(())
    }

    /// Intersects the possibilities of `cell` with `allowed`.
    ///
    /// Collapsed and locked cells are never narrowed. The returned value tells
    /// whether the set shrank, and whether it shrank to nothing.
    pub fn restrict_possibilities(
        &mut self,
        cell: CellCoord,
        allowed: &Possibilities,
    ) -> Result<Restriction, GridError> {
        let index = self.checked_index(cell)?;
        let slot = &mut self.cells[index];
        if slot.locked || slot.collapsed.is_some() {
            return Ok(Restriction::Unchanged);
        }

        if !slot.possibilities.intersect_with(allowed) {
            return Ok(Restriction::Unchanged);
        }

        if slot.possibilities.is_empty() {
            Ok(Restriction::Emptied)
        } else {
            Ok(Restriction::Narrowed)
        }
    }

    /// Reopens every unlocked cell of `region` to the full tile set.
    ///
    /// The region is clipped to the grid; the clipped rectangle is returned.
    /// A region that misses the grid entirely is out of bounds.
    pub fn reset_region(&mut self, region: CellRect) -> Result<CellRect, GridError> {
        let clipped = region
            .clipped_to(self.width, self.height)
            .ok_or(GridError::OutOfBounds {
                cell: region.origin(),
                width: self.width,
                height: self.height,
            })?;

        let tile_count = self.tiles.len();
        for cell in clipped.cells() {
            if let Some(index) = self.index(cell) {
                let slot = &mut self.cells[index];
                if !slot.locked {
                    *slot = Cell::open(tile_count);
                }
            }
        }
        Ok(clipped)
    }

    /// Reopens every unlocked cell of the grid.
    pub fn reset_all(&mut self) -> CellRect {
        let tile_count = self.tiles.len();
        for slot in self.cells.iter_mut().filter(|slot| !slot.locked) {
            *slot = Cell::open(tile_count);
        }
        self.bounds()
    }

    /// Cells pinned by the author.
    pub fn locked_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.iter()
            .filter(|(_, cell)| cell.is_locked())
            .map(|(coord, _)| coord)
    }

    /// Number of collapsed cells.
    #[must_use]
    pub fn collapsed_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_collapsed()).count()
    }

    /// Reports whether every cell holds a final tile.
    #[must_use]
    pub fn is_fully_collapsed(&self) -> bool {
        self.cells.iter().all(Cell::is_collapsed)
    }

    /// Verifies that every collapsed cell holds exactly its own tile.
    pub fn check_invariants(&self) -> Result<(), GridError> {
        for (coord, cell) in self.iter() {
            if let Some(tile) = cell.collapsed {
                let count = cell.possibilities.len();
                if count != 1 || !cell.possibilities.contains(tile) {
                    return Err(GridError::InvariantViolation {
                        cell: coord,
                        violation: Violation::NonSingletonCollapse { count },
                    });
                }
            }
        }
        Ok(())
    }

    fn checked_index(&self, cell: CellCoord) -> Result<usize, GridError> {
        self.index(cell).ok_or(GridError::OutOfBounds {
            cell,
            width: self.width,
            height: self.height,
        })
    }
}

/// Query functions that provide read-only views of a grid for collaborators.
pub mod query {
    use tilewave_core::TileId;

    use super::Grid;

    /// Collapsed tile of every cell in row-major order.
    #[must_use]
    pub fn collapsed_tiles(grid: &Grid) -> Vec<Option<TileId>> {
        grid.cells.iter().map(|cell| cell.collapsed).collect()
    }

    /// Number of collapsed cells alongside the total cell count.
    #[must_use]
    pub fn progress(grid: &Grid) -> (usize, usize) {
        (grid.collapsed_count(), grid.cell_count())
    }

    /// Normalised entropy of every cell in row-major order.
    ///
    /// Each value is `(|possibilities| + 1) / (tile_count + 1)`, so open cells
    /// read as 1.0 and contradictions stay visible above zero.
    #[must_use]
    pub fn entropy_map(grid: &Grid) -> Vec<f32> {
        let denominator = (grid.tile_set().len() + 1) as f32;
        grid.cells
            .iter()
            .map(|cell| (cell.entropy() + 1) as f32 / denominator)
            .collect()
    }

    /// Reports every adjacent pair of collapsed cells whose tiles may not touch.
    #[must_use]
    pub fn incompatible_pairs(grid: &Grid) -> Vec<(super::CellCoord, super::CellCoord)> {
        let mut pairs = Vec::new();
        for (coord, cell) in grid.iter() {
            let Some(tile) = cell.collapsed else {
                continue;
            };
            for side in [super::Side::East, super::Side::South] {
                let Some(neighbor) = coord.step(side).filter(|next| grid.contains(*next)) else {
                    continue;
                };
                let Ok(Some(other)) = grid.collapsed_at(neighbor) else {
                    continue;
                };
                if !grid.tile_set().compatible_tiles(Some(tile), side).contains(other) {
                    pairs.push((coord, neighbor));
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilewave_core::TileDefinition;

    fn grid(width: u32, height: u32) -> Grid {
        let tiles = TileSet::new(vec![
            TileDefinition::from_strs("a", ["a"; 4], 1.0),
            TileDefinition::from_strs("b", ["b"; 4], 1.0),
            TileDefinition::from_strs("c", ["c"; 4], 1.0),
        ])
        .expect("valid tile set");
        Grid::new(width, height, Arc::new(tiles)).expect("valid grid")
    }

    #[test]
    fn new_grid_is_fully_open() {
        let grid = grid(3, 2);
        assert_eq!(grid.cell_count(), 6);
        for (_, cell) in grid.iter() {
            assert_eq!(cell.entropy(), 3);
            assert!(!cell.is_collapsed());
            assert!(!cell.is_locked());
        }
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        let tiles = TileSet::new(vec![TileDefinition::from_strs("a", ["a"; 4], 1.0)])
            .expect("valid tile set");
        let error = Grid::new(0, 4, Arc::new(tiles)).unwrap_err();
        assert_eq!(error, ConfigurationError::EmptyGrid { width: 0, height: 4 });
    }

    #[test]
    fn neighbors_respect_bounds() {
        let grid = grid(3, 3);
        let corner: Vec<_> = grid.neighbors(CellCoord::new(0, 0)).collect();
        assert_eq!(
            corner,
            vec![
                (Side::East, CellCoord::new(1, 0)),
                (Side::South, CellCoord::new(0, 1)),
            ]
        );
        assert_eq!(grid.neighbors(CellCoord::new(1, 1)).count(), 4);
        assert_eq!(grid.neighbors(CellCoord::new(2, 2)).count(), 2);
    }

    #[test]
    fn index_and_coord_agree() {
        let grid = grid(4, 3);
        let cell = CellCoord::new(3, 2);
        let index = grid.index(cell).expect("in bounds");
        assert_eq!(index, 11);
        assert_eq!(grid.coord(index), Some(cell));
        assert_eq!(grid.index(CellCoord::new(4, 0)), None);
    }

    #[test]
    fn collapse_sets_singleton() {
        let mut grid = grid(2, 2);
        let cell = CellCoord::new(1, 1);
        grid.collapse(cell, TileId::new(2)).expect("collapse");
        let state = grid.cell(cell).expect("cell");
        assert_eq!(state.collapsed(), Some(TileId::new(2)));
        assert_eq!(state.entropy(), 1);
        grid.check_invariants().expect("invariants hold");
    }

    #[test]
    fn collapse_out_of_bounds_is_reported() {
        let mut grid = grid(2, 2);
        let error = grid.collapse(CellCoord::new(2, 0), TileId::new(0)).unwrap_err();
        assert!(matches!(error, GridError::OutOfBounds { .. }));
    }

    #[test]
    fn collapse_to_impossible_tile_is_a_violation() {
        let mut grid = grid(2, 2);
        let cell = CellCoord::new(0, 0);
        let only_a = Possibilities::single(3, TileId::new(0));
        assert_eq!(
            grid.restrict_possibilities(cell, &only_a).expect("restrict"),
            Restriction::Narrowed
        );
        let error = grid.collapse(cell, TileId::new(1)).unwrap_err();
        assert_eq!(
            error,
            GridError::InvariantViolation {
                cell,
                violation: Violation::TileNotPossible {
                    tile: TileId::new(1)
                },
            }
        );
    }

    #[test]
    fn restriction_reports_shrink_and_empty() {
        let mut grid = grid(1, 1);
        let cell = CellCoord::new(0, 0);
        let everything = Possibilities::full(3);
        assert_eq!(
            grid.restrict_possibilities(cell, &everything).expect("restrict"),
            Restriction::Unchanged
        );
        let two = Possibilities::from_tiles(3, [TileId::new(0), TileId::new(1)]);
        assert!(grid.restrict_possibilities(cell, &two).expect("restrict").shrank());
        assert_eq!(
            grid.restrict_possibilities(cell, &Possibilities::empty(3))
                .expect("restrict"),
            Restriction::Emptied
        );
        assert!(grid.cell(cell).expect("cell").is_contradiction());
    }

    #[test]
    fn locked_cells_ignore_restriction_and_reset() {
        let mut grid = grid(3, 3);
        let pinned = CellCoord::new(1, 1);
        grid.lock(pinned, TileId::new(1)).expect("lock");
        assert_eq!(
            grid.restrict_possibilities(pinned, &Possibilities::empty(3))
                .expect("restrict"),
            Restriction::Unchanged
        );
        grid.collapse(CellCoord::new(0, 0), TileId::new(0)).expect("collapse");

        let cleared = grid.reset_all();
        assert_eq!(cleared, grid.bounds());
        assert_eq!(grid.collapsed_at(pinned).expect("cell"), Some(TileId::new(1)));
        assert_eq!(grid.collapsed_at(CellCoord::new(0, 0)).expect("cell"), None);
        assert_eq!(grid.locked_cells().collect::<Vec<_>>(), vec![pinned]);
    }

    #[test]
    fn locked_cell_rejects_a_different_tile() {
        let mut grid = grid(1, 1);
        let cell = CellCoord::new(0, 0);
        grid.lock(cell, TileId::new(0)).expect("lock");
        grid.lock(cell, TileId::new(0)).expect("same tile is accepted");
        let error = grid.lock(cell, TileId::new(2)).unwrap_err();
        assert!(matches!(
            error,
            GridError::InvariantViolation {
                violation: Violation::LockedCell { .. },
                ..
            }
        ));
    }

    #[test]
    fn reset_region_clips_and_reopens() {
        let mut grid = grid(4, 4);
        for (index, cell) in [CellCoord::new(3, 3), CellCoord::new(0, 0)].into_iter().enumerate() {
            grid.collapse(cell, TileId::new(index as u32)).expect("collapse");
        }
        let region =
            CellRect::from_origin_and_size(CellCoord::new(2, 2), CellRectSize::new(5, 5));
        let clipped = grid.reset_region(region).expect("overlaps");
        assert_eq!(clipped.size(), CellRectSize::new(2, 2));
        assert_eq!(grid.collapsed_at(CellCoord::new(3, 3)).expect("cell"), None);
        assert_eq!(
            grid.collapsed_at(CellCoord::new(0, 0)).expect("cell"),
            Some(TileId::new(1))
        );

        let outside =
            CellRect::from_origin_and_size(CellCoord::new(9, 9), CellRectSize::new(1, 1));
        assert!(matches!(
            grid.reset_region(outside),
            Err(GridError::OutOfBounds { .. })
        ));
    }
}
