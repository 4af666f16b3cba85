#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Step-driven orchestrator tying the solving systems together.
//!
//! A [`Solver`] owns the grid, the shared tile set, the random source and the
//! attempt counter. Each [`Solver::step`] performs one select, collapse and
//! propagate cycle, or repairs a contradiction, so hosts can spread the work
//! across frames with [`Solver::run_batch`].

use std::{fmt, mem, sync::Arc};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tilewave_core::{
    CellCoord, CellRect, ConfigurationError, GridError, Possibilities, Seed, SolverEvent,
    TileDefinition, TileId,
};
use tilewave_grid::{query, Grid, Restriction};
use tilewave_system_contradiction::{place_random_tile, restart, ContradictionHandler};
use tilewave_system_propagation::PropagationEngine;
use tilewave_system_selection::{Selection, SelectionPolicy};
use tilewave_tileset::TileSet;
use tracing::{info, trace, warn};

mod config;

pub use config::{SolverConfig, DEFAULT_MAX_ATTEMPTS};
pub use tilewave_system_contradiction::RepairStrategy;
pub use tilewave_system_propagation::{PropagationBudget, DEFAULT_PROPAGATION_STEPS};

/// Lifecycle of a solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverState {
    /// Seeds are being placed; only observable while constructing.
    Seeding,
    /// Cells remain to be collapsed.
    Running,
    /// Every cell is collapsed.
    Done,
}

/// What a single [`Solver::step`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// A cell was collapsed and its consequences propagated.
    Collapsed {
        /// Cell that was collapsed.
        cell: CellCoord,
        /// Tile assigned to the cell.
        tile: TileId,
    },
    /// A contradiction was found and repaired.
    Repaired {
        /// Cell whose possibility set was empty.
        cell: CellCoord,
        /// Attempt counter after the repair.
        attempts: u64,
    },
    /// Nothing left to do.
    Done,
}

/// Aggregate result of [`Solver::run_batch`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Steps that collapsed a cell.
    pub collapsed: usize,
    /// Steps that repaired a contradiction.
    pub repaired: usize,
    /// Whether the solve is complete.
    pub done: bool,
}

impl BatchSummary {
    /// Steps that performed work.
    #[must_use]
    pub const fn steps(&self) -> usize {
        self.collapsed + self.repaired
    }
}

/// Collapsed-cell count versus the total, rendered as `n/N`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Cells holding a final tile.
    pub collapsed: usize,
    /// Cells in the grid.
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collapsed, self.total)
    }
}

/// Errors reported by the solver.
#[derive(Debug, Error, PartialEq)]
pub enum SolverError {
    /// The tile set, seeds or settings were rejected.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A grid access was out of bounds or broke an engine invariant.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The attempt ceiling was reached without completing the grid.
    #[error("no consistent tiling found after {attempts} repair attempts")]
    Unsatisfiable {
        /// Repairs performed before giving up.
        attempts: u64,
    },
}

type CompletionHook = Box<dyn FnMut(&Grid, &TileSet)>;

/// Wave function collapse solver over a rectangular grid.
pub struct Solver<R = ChaCha8Rng> {
    grid: Grid,
    tiles: Arc<TileSet>,
    rng: R,
    config: SolverConfig,
    state: SolverState,
    attempts: u64,
    propagation: PropagationEngine,
    selection: SelectionPolicy,
    contradiction: ContradictionHandler,
    events: Vec<SolverEvent>,
    completion_hook: Option<CompletionHook>,
}

impl Solver<ChaCha8Rng> {
    /// Creates a solver whose randomness is reproducible from `seed`.
    pub fn seeded(
        definitions: Vec<TileDefinition>,
        width: u32,
        height: u32,
        seeds: &[Seed],
        config: SolverConfig,
        seed: u64,
    ) -> Result<Self, SolverError> {
        Self::new(
            definitions,
            width,
            height,
            seeds,
            config,
            ChaCha8Rng::seed_from_u64(seed),
        )
    }
}

impl<R> Solver<R>
where
    R: Rng,
{
    /// Validates `definitions`, builds the grid and places `seeds`.
    pub fn new(
        definitions: Vec<TileDefinition>,
        width: u32,
        height: u32,
        seeds: &[Seed],
        config: SolverConfig,
        rng: R,
    ) -> Result<Self, SolverError> {
        let tiles = TileSet::new(definitions)?;
        Self::with_tile_set(Arc::new(tiles), width, height, seeds, config, rng)
    }

    /// Builds the grid over an already validated tile set and places `seeds`.
    ///
    /// Seeds are collapsed and locked before any propagation runs. Neighbouring
    /// seeds whose tiles may not touch are rejected with
    /// [`ConfigurationError::IncompatibleSeeds`]; a seed that merely leaves an
    /// open neighbour without candidates surfaces later as a contradiction.
    pub fn with_tile_set(
        tiles: Arc<TileSet>,
        width: u32,
        height: u32,
        seeds: &[Seed],
        config: SolverConfig,
        rng: R,
    ) -> Result<Self, SolverError> {
        config.validate()?;
        let contradiction = ContradictionHandler::new(config.repair)?;
        let grid = Grid::new(width, height, Arc::clone(&tiles))?;

        let mut solver = Self {
            grid,
            tiles,
            rng,
            config,
            state: SolverState::Seeding,
            attempts: 0,
            propagation: PropagationEngine::new(config.propagation),
            selection: SelectionPolicy::default(),
            contradiction,
            events: Vec::new(),
            completion_hook: None,
        };
        solver.place_seeds(seeds)?;
        solver.state = SolverState::Running;
        Ok(solver)
    }

    fn place_seeds(&mut self, seeds: &[Seed]) -> Result<(), SolverError> {
        for seed in seeds {
            if !self.tiles.contains(seed.tile) {
                return Err(ConfigurationError::UnknownTileId { tile: seed.tile }.into());
            }
            if let Some(existing) = self.grid.collapsed_at(seed.cell)? {
                if existing != seed.tile {
                    return Err(ConfigurationError::ConflictingSeeds { cell: seed.cell }.into());
                }
                continue;
            }
            self.grid.lock(seed.cell, seed.tile)?;
        }
        self.check_seed_adjacency(seeds)?;

        let report = self
            .propagation
            .propagate_all(&mut self.grid, seeds.iter().map(|seed| seed.cell))?;
        if let Some(cell) = report.contradiction {
            warn!(
                column = cell.column(),
                row = cell.row(),
                "seeds_leave_contradiction"
            );
        }
        Ok(())
    }

    fn check_seed_adjacency(&self, seeds: &[Seed]) -> Result<(), SolverError> {
        for seed in seeds {
            for (side, neighbor) in self.grid.neighbors(seed.cell) {
                let Some(other) = self.grid.collapsed_at(neighbor)? else {
                    continue;
                };
                if !self
                    .tiles
                    .compatible_tiles(Some(seed.tile), side)
                    .contains(other)
                {
                    return Err(ConfigurationError::IncompatibleSeeds {
                        first: seed.cell,
                        second: neighbor,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Performs one collapse-and-propagate cycle, or repairs one contradiction.
    ///
    /// The step that collapses the last open cell also completes the solve.
    pub fn step(&mut self) -> Result<StepOutcome, SolverError> {
        if self.state == SolverState::Done {
            return Ok(StepOutcome::Done);
        }

        let cell = match self.selection.select_cell(&self.grid, &mut self.rng) {
            Selection::Done => {
                self.finish();
                return Ok(StepOutcome::Done);
            }
            Selection::Contradiction(cell) => return self.repair(cell),
            Selection::Cell(cell) => cell,
        };
        if self.propagation.refresh(&mut self.grid, cell)? == Restriction::Emptied {
            return self.repair(cell);
        }

        let Some(tile) = self.selection.select_tile(&self.grid, cell, &mut self.rng)? else {
            return self.repair(cell);
        };

        let collapsed = self.grid.collapse(cell, tile);
        debug_assert!(
            collapsed.is_ok(),
            "selected tile must be possible: {collapsed:?}"
        );
        collapsed?;
        let _ = self.propagation.propagate_from(&mut self.grid, cell)?;

        trace!(
            column = cell.column(),
            row = cell.row(),
            tile = tile.get(),
            "tile_collapsed"
        );
        self.events.push(SolverEvent::TileCollapsed { cell, tile });
        if self.grid.is_fully_collapsed() {
            self.finish();
        }
        Ok(StepOutcome::Collapsed { cell, tile })
    }

    /// Performs up to `max_steps` steps, stopping early once the grid is complete.
    pub fn run_batch(&mut self, max_steps: usize) -> Result<BatchSummary, SolverError> {
        let mut summary = BatchSummary::default();
        for _ in 0..max_steps {
            match self.step()? {
                StepOutcome::Collapsed { .. } => summary.collapsed += 1,
                StepOutcome::Repaired { .. } => summary.repaired += 1,
                StepOutcome::Done => break,
            }
        }
        summary.done = self.is_done();
        Ok(summary)
    }

    /// Steps until the grid is complete or the attempt ceiling is hit.
    pub fn run_to_completion(&mut self) -> Result<BatchSummary, SolverError> {
        let mut summary = BatchSummary::default();
        loop {
            match self.step()? {
                StepOutcome::Collapsed { .. } => summary.collapsed += 1,
                StepOutcome::Repaired { .. } => summary.repaired += 1,
                StepOutcome::Done => {
                    summary.done = true;
                    return Ok(summary);
                }
            }
        }
    }

    fn repair(&mut self, cell: CellCoord) -> Result<StepOutcome, SolverError> {
        if let Some(limit) = self.config.max_attempts {
            if self.attempts >= limit {
                warn!(attempts = self.attempts, "attempt_ceiling_reached");
                return Err(SolverError::Unsatisfiable {
                    attempts: self.attempts,
                });
            }
        }

        self.attempts += 1;
        let repair =
            self.contradiction
                .repair(&mut self.grid, &mut self.propagation, cell, &mut self.rng)?;
        self.events.push(SolverEvent::ContradictionRepaired {
            cell,
            region: repair.region,
            attempts: self.attempts,
        });
        for placement in repair.placements {
            self.events.push(SolverEvent::TileCollapsed {
                cell: placement.cell,
                tile: placement.tile,
            });
        }
        self.state = SolverState::Running;
        Ok(StepOutcome::Repaired {
            cell,
            attempts: self.attempts,
        })
    }

    fn finish(&mut self) {
        self.state = SolverState::Done;
        info!(attempts = self.attempts, "generation_completed");
        self.events.push(SolverEvent::GenerationCompleted {
            attempts: self.attempts,
        });
        if let Some(hook) = self.completion_hook.as_mut() {
            hook(&self.grid, self.tiles.as_ref());
        }
    }

    /// Reopens every unlocked cell of `region` and resumes solving.
    ///
    /// The region is clipped to the grid and the clipped rectangle returned;
    /// a region that misses the grid entirely is out of bounds.
    pub fn force_reset_region(&mut self, region: CellRect) -> Result<CellRect, SolverError> {
        let clipped = self.grid.reset_region(region)?;
        let _ = self.propagation.propagate_region(&mut self.grid, clipped)?;
        self.state = SolverState::Running;
        info!(
            column = clipped.origin().column(),
            row = clipped.origin().row(),
            width = clipped.size().width(),
            height = clipped.size().height(),
            "region_reset"
        );
        self.events.push(SolverEvent::RegionReset { region: clipped });
        Ok(clipped)
    }

    /// Reopens every unlocked cell and resumes solving.
    ///
    /// The attempt counter is kept.
    pub fn force_reset_all(&mut self) -> Result<CellRect, SolverError> {
        let (region, _, _) = restart(&mut self.grid, &mut self.propagation, 0, &mut self.rng)?;
        self.state = SolverState::Running;
        info!("grid_reset");
        self.events.push(SolverEvent::RegionReset { region });
        Ok(region)
    }

    /// Collapses a random open cell to a random remaining tile and propagates.
    ///
    /// Returns `None` when every cell is collapsed, locked or contradictory.
    pub fn place_random_tile(&mut self) -> Result<Option<(CellCoord, TileId)>, SolverError> {
        let placed = place_random_tile(&mut self.grid, &mut self.propagation, &mut self.rng)?;
        Ok(placed.map(|(placement, _)| {
            self.events.push(SolverEvent::TileCollapsed {
                cell: placement.cell,
                tile: placement.tile,
            });
            (placement.cell, placement.tile)
        }))
    }

    /// Registers a callback fired each time the solve transitions into [`SolverState::Done`].
    pub fn set_completion_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&Grid, &TileSet) + 'static,
    {
        self.completion_hook = Some(Box::new(hook));
    }
}

impl<R> Solver<R> {
    /// Reports whether every cell is collapsed and the completion hook has fired.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == SolverState::Done
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Contradiction repairs performed so far.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Settings the solver was created with.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Tile `(x, y)` collapsed to, if any.
    pub fn collapsed_at(&self, x: u32, y: u32) -> Result<Option<TileId>, SolverError> {
        Ok(self.grid.collapsed_at(CellCoord::new(x, y))?)
    }

    /// Tiles still permitted at `(x, y)`.
    pub fn possibilities_at(&self, x: u32, y: u32) -> Result<&Possibilities, SolverError> {
        Ok(self.grid.possibilities_at(CellCoord::new(x, y))?)
    }

    /// Collapsed cells versus total cells.
    #[must_use]
    pub fn progress(&self) -> Progress {
        let (collapsed, total) = query::progress(&self.grid);
        Progress { collapsed, total }
    }

    /// Normalised per-cell entropy in row-major order, for heat-map rendering.
    #[must_use]
    pub fn entropy_map(&self) -> Vec<f32> {
        query::entropy_map(&self.grid)
    }

    /// Read-only view of the grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Tile set shared with the grid.
    #[must_use]
    pub fn tile_set(&self) -> &TileSet {
        &self.tiles
    }

    /// Takes every event recorded since the previous drain.
    pub fn drain_events(&mut self) -> Vec<SolverEvent> {
        mem::take(&mut self.events)
    }
}

impl<R> fmt::Debug for Solver<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("width", &self.grid.width())
            .field("height", &self.grid.height())
            .field("tiles", &self.tiles.len())
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
