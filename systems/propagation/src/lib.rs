#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frontier-limited constraint propagation over a grid.
//!
//! After a cell changes, its neighbours are pushed onto a FIFO worklist. Each
//! popped cell is intersected with what its neighbours still support; when it
//! shrinks, its own neighbours are queued in turn. The number of pops per call
//! is bounded by a [`PropagationBudget`], so a call may return before the grid
//! is locally consistent.

use std::collections::VecDeque;

use tilewave_core::{CellCoord, CellRect, GridError};
use tilewave_grid::{Grid, Restriction};
use tracing::debug;

/// Worklist pops performed per call by the default budget.
pub const DEFAULT_PROPAGATION_STEPS: usize = 11;

/// Limit on how much work a single propagation call may perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropagationBudget {
    /// Stop after this many worklist pops.
    Steps(usize),
    /// Keep going until the worklist drains.
    Fixpoint,
}

impl PropagationBudget {
    fn allows(self, pops: usize) -> bool {
        match self {
            Self::Steps(limit) => pops < limit,
            Self::Fixpoint => true,
        }
    }
}

impl Default for PropagationBudget {
    fn default() -> Self {
        Self::Steps(DEFAULT_PROPAGATION_STEPS)
    }
}

/// Summary of a single propagation call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Worklist entries processed.
    pub pops: usize,
    /// Cells whose possibility set shrank.
    pub narrowed: usize,
    /// First cell driven to an empty possibility set, if any.
    pub contradiction: Option<CellCoord>,
    /// Cells still queued when the budget ran out.
    pub abandoned: usize,
}

impl PropagationReport {
    /// Reports whether the worklist drained without hitting the budget.
    #[must_use]
    pub const fn converged(&self) -> bool {
        self.abandoned == 0 && self.contradiction.is_none()
    }

    fn absorb(&mut self, other: PropagationReport) {
        self.pops += other.pops;
        self.narrowed += other.narrowed;
        self.abandoned += other.abandoned;
        if self.contradiction.is_none() {
            self.contradiction = other.contradiction;
        }
    }
}

/// Reusable propagation workspace.
#[derive(Debug, Default)]
pub struct PropagationEngine {
    budget: PropagationBudget,
    queue: VecDeque<CellCoord>,
    pending: Vec<bool>,
}

impl PropagationEngine {
    /// Creates an engine that spends at most `budget` per call.
    #[must_use]
    pub fn new(budget: PropagationBudget) -> Self {
        Self {
            budget,
            queue: VecDeque::new(),
            pending: Vec::new(),
        }
    }

    /// Budget applied to each call.
    #[must_use]
    pub const fn budget(&self) -> PropagationBudget {
        self.budget
    }

    /// Propagates the consequences of a change at `cell` to its neighbours.
    pub fn propagate_from(
        &mut self,
        grid: &mut Grid,
        cell: CellCoord,
    ) -> Result<PropagationReport, GridError> {
        if !grid.contains(cell) {
            return Err(GridError::OutOfBounds {
                cell,
                width: grid.width(),
                height: grid.height(),
            });
        }
        let neighbors: Vec<CellCoord> = grid.neighbors(cell).map(|(_, next)| next).collect();
        self.run(grid, neighbors)
    }

    /// Re-derives the cells along the border of a freshly reset `region`.
    ///
    /// The region is clipped to the grid first. Every perimeter cell is
    /// narrowed against its neighbours; inner cells are reached as the
    /// narrowing ripples inwards.
    pub fn propagate_region(
        &mut self,
        grid: &mut Grid,
        region: CellRect,
    ) -> Result<PropagationReport, GridError> {
        let clipped = region
            .clipped_to(grid.width(), grid.height())
            .ok_or(GridError::OutOfBounds {
                cell: region.origin(),
                width: grid.width(),
                height: grid.height(),
            })?;
        let border: Vec<CellCoord> = clipped.perimeter().collect();
        self.run(grid, border)
    }

    /// Propagates outward from every cell in `sources`, one call per source.
    ///
    /// Stops at the first contradiction.
    pub fn propagate_all(
        &mut self,
        grid: &mut Grid,
        sources: impl IntoIterator<Item = CellCoord>,
    ) -> Result<PropagationReport, GridError> {
        let mut total = PropagationReport::default();
        for source in sources {
            total.absorb(self.propagate_from(grid, source)?);
            if total.contradiction.is_some() {
                break;
            }
        }
        Ok(total)
    }

    /// Re-derives a single cell from its current neighbours without queueing further work.
    ///
    /// Used right before a collapse so a cell left stale by an exhausted budget
    /// never receives a tile its neighbours rule out.
    pub fn refresh(&self, grid: &mut Grid, cell: CellCoord) -> Result<Restriction, GridError> {
        if !grid.contains(cell) {
            return Err(GridError::OutOfBounds {
                cell,
                width: grid.width(),
                height: grid.height(),
            });
        }
        narrow(grid, cell)
    }

    fn run(
        &mut self,
        grid: &mut Grid,
        initial: Vec<CellCoord>,
    ) -> Result<PropagationReport, GridError> {
        self.reset_workspace(grid);
        for cell in initial {
            self.enqueue(grid, cell);
        }

        let mut report = PropagationReport::default();
        while self.budget.allows(report.pops) {
            let Some(cell) = self.queue.pop_front() else {
                break;
            };
            if let Some(index) = grid.index(cell) {
                self.pending[index] = false;
            }
            report.pops += 1;

            match narrow(grid, cell)? {
                Restriction::Unchanged => {}
                Restriction::Narrowed => {
                    report.narrowed += 1;
                    let neighbors: Vec<CellCoord> =
                        grid.neighbors(cell).map(|(_, next)| next).collect();
                    for neighbor in neighbors {
                        self.enqueue(grid, neighbor);
                    }
                }
                Restriction::Emptied => {
                    report.narrowed += 1;
                    report.contradiction = Some(cell);
                    debug!(
                        column = cell.column(),
                        row = cell.row(),
                        pops = report.pops,
                        "propagation_contradiction"
                    );
                    break;
                }
            }
        }

        report.abandoned = self.queue.len();
        self.queue.clear();
        Ok(report)
    }

    fn reset_workspace(&mut self, grid: &Grid) {
        self.queue.clear();
        self.pending.clear();
        self.pending.resize(grid.cell_count(), false);
    }

    fn enqueue(&mut self, grid: &Grid, cell: CellCoord) {
        let Some(index) = grid.index(cell) else {
            return;
        };
        let Ok(state) = grid.cell(cell) else {
            return;
        };
        if state.is_collapsed() || state.is_locked() || self.pending[index] {
            return;
        }
        self.pending[index] = true;
        self.queue.push_back(cell);
    }
}

/// Intersects `cell` with what every neighbour still supports across the shared edge.
///
/// A neighbour with no possibilities left is itself a contradiction and places
/// no constraint.
fn narrow(grid: &mut Grid, cell: CellCoord) -> Result<Restriction, GridError> {
    let tiles = grid.tile_set();
    let mut allowed = tiles.all();
    for (side, neighbor) in grid.neighbors(cell) {
        let sources = grid.possibilities_at(neighbor)?;
        if sources.is_empty() {
            continue;
        }
        let supported = tiles.supported_by(sources, side.opposite());
        let _ = allowed.intersect_with(&supported);
    }
    grid.restrict_possibilities(cell, &allowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_matches_step_cap() {
        assert_eq!(
            PropagationBudget::default(),
            PropagationBudget::Steps(DEFAULT_PROPAGATION_STEPS)
        );
        assert!(PropagationBudget::Steps(2).allows(1));
        assert!(!PropagationBudget::Steps(2).allows(2));
        assert!(PropagationBudget::Fixpoint.allows(usize::MAX));
    }

    #[test]
    fn reports_accumulate() {
        let mut total = PropagationReport::default();
        total.absorb(PropagationReport {
            pops: 3,
            narrowed: 1,
            contradiction: None,
            abandoned: 0,
        });
        total.absorb(PropagationReport {
            pops: 2,
            narrowed: 2,
            contradiction: Some(CellCoord::new(1, 0)),
            abandoned: 4,
        });
        assert_eq!(total.pops, 5);
        assert_eq!(total.narrowed, 3);
        assert_eq!(total.contradiction, Some(CellCoord::new(1, 0)));
        assert!(!total.converged());
    }
}
