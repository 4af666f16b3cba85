#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Minimum-entropy cell selection and weight-proportional tile choice.

use rand::Rng;
use tilewave_core::{CellCoord, GridError, Possibilities, TileId};
use tilewave_grid::Grid;
use tilewave_tileset::TileSet;

/// Outcome of scanning the grid for the next cell to collapse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Every cell is collapsed.
    Done,
    /// An uncollapsed cell has no possibilities left.
    Contradiction(CellCoord),
    /// The cell chosen for the next collapse.
    Cell(CellCoord),
}

/// Picks cells and tiles for the solver.
#[derive(Debug, Default)]
pub struct SelectionPolicy {
    ties: Vec<CellCoord>,
}

impl SelectionPolicy {
    /// Scans every uncollapsed cell and picks one with the fewest possibilities.
    ///
    /// Cells are scanned in row-major order. The first cell found without any
    /// possibility is reported as a contradiction. Ties at the minimum entropy
    /// are broken uniformly with `rng`.
    pub fn select_cell<R>(&mut self, grid: &Grid, rng: &mut R) -> Selection
    where
        R: Rng,
    {
        self.ties.clear();
        let mut minimum = usize::MAX;

        for (coord, cell) in grid.iter() {
            if cell.is_collapsed() {
                continue;
            }
            let entropy = cell.entropy();
            if entropy == 0 {
                return Selection::Contradiction(coord);
            }
            if entropy < minimum {
                minimum = entropy;
                self.ties.clear();
            }
            if entropy == minimum {
                self.ties.push(coord);
            }
        }

        match self.ties.len() {
            0 => Selection::Done,
            1 => Selection::Cell(self.ties[0]),
            count => Selection::Cell(self.ties[rng.gen_range(0..count)]),
        }
    }

    /// Draws a tile for `cell` proportionally to the weights of its possibilities.
    ///
    /// Returns `None` when the cell has no possibilities left.
    pub fn select_tile<R>(
        &self,
        grid: &Grid,
        cell: CellCoord,
        rng: &mut R,
    ) -> Result<Option<TileId>, GridError>
    where
        R: Rng,
    {
        let possibilities = grid.possibilities_at(cell)?;
        Ok(choose_tile(grid.tile_set(), possibilities, rng))
    }
}

/// Draws one tile of `possibilities` proportionally to its weight in `tiles`.
pub fn choose_tile<R>(tiles: &TileSet, possibilities: &Possibilities, rng: &mut R) -> Option<TileId>
where
    R: Rng,
{
    let candidates: Vec<(TileId, f64)> = possibilities
        .iter()
        .map(|tile| (tile, tiles.weight(tile)))
        .collect();
    weighted_choice(&candidates, rng.gen::<f64>())
}

/// Cumulative-sum draw over `candidates` for a uniform `roll` in `[0, 1)`.
///
/// Weights are normalised by their total. The first candidate whose running
/// share reaches `roll` wins; rounding that leaves `roll` above the final sum
/// falls back to the first candidate.
#[must_use]
pub fn weighted_choice(candidates: &[(TileId, f64)], roll: f64) -> Option<TileId> {
    let (first, _) = *candidates.first()?;
    let total: f64 = candidates.iter().map(|(_, weight)| weight).sum();
    if !(total.is_finite() && total > 0.0) {
        return Some(first);
    }

    let mut cumulative = 0.0;
    for (tile, weight) in candidates {
        cumulative += weight / total;
        if roll <= cumulative {
            return Some(*tile);
        }
    }
    Some(first)
}
