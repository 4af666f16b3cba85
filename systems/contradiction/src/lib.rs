#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Recovery from cells whose possibility set ran empty.
//!
//! A contradiction is expected during solving. The handler reopens part of the
//! grid according to its [`RepairStrategy`] and re-propagates so the solver can
//! carry on; counting attempts is left to the caller.

use rand::Rng;
use tilewave_core::{
    CellCoord, CellRect, CellRectSize, ConfigurationError, GridError, TileId,
};
use tilewave_grid::Grid;
use tilewave_system_propagation::{PropagationEngine, PropagationReport};
use tracing::debug;

/// Side length of the default square repair window.
pub const DEFAULT_REPAIR_WINDOW: u32 = 5;

/// How much of the grid is reopened when a contradiction is found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepairStrategy {
    /// Reset a window centred on the offending cell.
    LocalWindow {
        /// Window width in cells.
        width: u32,
        /// Window height in cells.
        height: u32,
    },
    /// Reset every unlocked cell, then place random tiles to restart the solve.
    FullReset {
        /// Number of random tiles placed after the reset.
        reseed_count: usize,
    },
}

impl RepairStrategy {
    /// Rejects windows with a zero dimension.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Self::LocalWindow { width, height } if width == 0 || height == 0 => {
                Err(ConfigurationError::InvalidRepairWindow { width, height })
            }
            _ => Ok(()),
        }
    }
}

impl Default for RepairStrategy {
    fn default() -> Self {
        Self::LocalWindow {
            width: DEFAULT_REPAIR_WINDOW,
            height: DEFAULT_REPAIR_WINDOW,
        }
    }
}

/// Tile placed at random while reseeding a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Cell that received the tile.
    pub cell: CellCoord,
    /// Tile that was placed.
    pub tile: TileId,
}

/// Summary of a single repair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repair {
    /// Cell whose contradiction triggered the repair.
    pub cell: CellCoord,
    /// Region that was reopened, clipped to the grid.
    pub region: CellRect,
    /// Tiles placed at random after a full reset.
    pub placements: Vec<Placement>,
    /// Propagation performed after reopening the region.
    pub propagation: PropagationReport,
}

/// Applies the configured repair strategy to contradictions.
#[derive(Clone, Debug, Default)]
pub struct ContradictionHandler {
    strategy: RepairStrategy,
}

impl ContradictionHandler {
    /// Creates a handler using `strategy`.
    pub fn new(strategy: RepairStrategy) -> Result<Self, ConfigurationError> {
        strategy.validate()?;
        Ok(Self { strategy })
    }

    /// Strategy applied by [`ContradictionHandler::repair`].
    #[must_use]
    pub const fn strategy(&self) -> RepairStrategy {
        self.strategy
    }

    /// Reopens the grid around `cell` and re-propagates.
    pub fn repair<R>(
        &self,
        grid: &mut Grid,
        engine: &mut PropagationEngine,
        cell: CellCoord,
        rng: &mut R,
    ) -> Result<Repair, GridError>
    where
        R: Rng,
    {
        if !grid.contains(cell) {
            return Err(GridError::OutOfBounds {
                cell,
                width: grid.width(),
                height: grid.height(),
            });
        }

        let repair = match self.strategy {
            RepairStrategy::LocalWindow { width, height } => {
                let window = CellRect::centered_on(cell, CellRectSize::new(width, height));
                let region = grid.reset_region(window)?;
                let propagation = engine.propagate_region(grid, region)?;
                Repair {
                    cell,
                    region,
                    placements: Vec::new(),
                    propagation,
                }
            }
            RepairStrategy::FullReset { reseed_count } => {
                let (region, propagation, placements) =
                    restart(grid, engine, reseed_count, rng)?;
                Repair {
                    cell,
                    region,
                    placements,
                    propagation,
                }
            }
        };

        debug!(
            column = cell.column(),
            row = cell.row(),
            reopened = repair.region.size().width() * repair.region.size().height(),
            placements = repair.placements.len(),
            "contradiction_repaired"
        );
        Ok(repair)
    }
}

/// Reopens every unlocked cell, re-derives constraints from locked cells and
/// places `reseed_count` random tiles.
pub fn restart<R>(
    grid: &mut Grid,
    engine: &mut PropagationEngine,
    reseed_count: usize,
    rng: &mut R,
) -> Result<(CellRect, PropagationReport, Vec<Placement>), GridError>
where
    R: Rng,
{
    let region = grid.reset_all();
    let locked: Vec<CellCoord> = grid.locked_cells().collect();
    let propagation = engine.propagate_all(grid, locked)?;

    let mut placements = Vec::with_capacity(reseed_count);
    for _ in 0..reseed_count {
        match place_random_tile(grid, engine, rng)? {
            Some((placement, _)) => placements.push(placement),
            None => break,
        }
    }
    Ok((region, propagation, placements))
}

/// Collapses a random open cell to one of its remaining tiles and propagates.
///
/// Only cells that are neither collapsed, locked nor contradictory qualify;
/// the cell and the tile are both drawn uniformly. Returns `None` when no such
/// cell exists.
pub fn place_random_tile<R>(
    grid: &mut Grid,
    engine: &mut PropagationEngine,
    rng: &mut R,
) -> Result<Option<(Placement, PropagationReport)>, GridError>
where
    R: Rng,
{
    let open: Vec<CellCoord> = grid
        .iter()
        .filter(|(_, cell)| !cell.is_collapsed() && !cell.is_locked() && cell.entropy() > 0)
        .map(|(coord, _)| coord)
        .collect();
    if open.is_empty() {
        return Ok(None);
    }

    let cell = open[rng.gen_range(0..open.len())];
    let candidates: Vec<TileId> = grid.possibilities_at(cell)?.iter().collect();
    let tile = candidates[rng.gen_range(0..candidates.len())];

    grid.collapse(cell, tile)?;
    let propagation = engine.propagate_from(grid, cell)?;
    Ok(Some((Placement { cell, tile }, propagation)))
}
