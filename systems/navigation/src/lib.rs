#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Travel-cost navigation field derived from a solved grid.
//!
//! Each tile may carry a `travel_cost` metadata entry between 0 (open road)
//! and 1 (slowest terrain). Once a grid is fully collapsed the field records
//! that cost per cell and answers cheapest-route queries over it.

use std::{cmp::Ordering, collections::BinaryHeap};

use tilewave_core::{CellCoord, Side};
use tilewave_grid::Grid;

/// Cost assumed for tiles that carry no `travel_cost` metadata.
pub const DEFAULT_TRAVEL_COST: f64 = 1.0;

/// Slowest speed multiplier a walker is ever reduced to.
pub const MIN_SPEED_FACTOR: f64 = 0.25;

/// Per-cell travel costs in row-major order.
///
/// Cells that are not collapsed have no cost and cannot be entered.
#[derive(Clone, Debug, PartialEq)]
pub struct TravelCostField {
    width: u32,
    height: u32,
    costs: Vec<Option<f64>>,
}

impl TravelCostField {
    /// Reads the travel cost of every collapsed cell of `grid`.
    #[must_use]
    pub fn from_grid(grid: &Grid) -> Self {
        let tiles = grid.tile_set();
        let costs = grid
            .iter()
            .map(|(_, cell)| {
                let tile = cell.collapsed()?;
                let cost = tiles
                    .definition(tile)
                    .and_then(|definition| definition.travel_cost())
                    .unwrap_or(DEFAULT_TRAVEL_COST);
                Some(cost.clamp(0.0, 1.0))
            })
            .collect();

        Self {
            width: grid.width(),
            height: grid.height(),
            costs,
        }
    }

    /// Width of the field in cells.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the field in cells.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dense costs stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Option<f64>] {
        &self.costs
    }

    /// Travel cost captured for `cell`, if it lies within the field and is passable.
    #[must_use]
    pub fn cost(&self, cell: CellCoord) -> Option<f64> {
        self.offset(cell)
            .and_then(|offset| self.costs.get(offset).copied().flatten())
    }

    /// Speed multiplier of a walker standing on `cell`.
    #[must_use]
    pub fn speed_factor(&self, cell: CellCoord) -> Option<f64> {
        self.cost(cell)
            .map(|cost| (1.0 - cost).max(MIN_SPEED_FACTOR))
    }

    /// Cheapest accumulated cost from every cell to the nearest goal.
    ///
    /// Entering a cell costs `1 + travel_cost`, so shorter routes still win on
    /// uniform terrain. Unreachable cells hold `None`.
    #[must_use]
    pub fn distances_to(&self, goals: &[CellCoord]) -> Vec<Option<f64>> {
        let mut distances: Vec<Option<f64>> = vec![None; self.costs.len()];
        let mut frontier = BinaryHeap::new();

        for &goal in goals {
            let Some(offset) = self.offset(goal) else {
                continue;
            };
            if self.costs[offset].is_none() || distances[offset].is_some() {
                continue;
            }
            distances[offset] = Some(0.0);
            frontier.push(Frontier {
                cost: 0.0,
                cell: goal,
            });
        }

        while let Some(Frontier { cost, cell }) = frontier.pop() {
            let Some(offset) = self.offset(cell) else {
                continue;
            };
            if distances[offset].is_some_and(|best| best < cost) {
                continue;
            }
            let Some(step) = self.costs[offset].map(|travel| 1.0 + travel) else {
                continue;
            };

            for neighbor in neighbors(cell, self.width, self.height) {
                let Some(neighbor_offset) = self.offset(neighbor) else {
                    continue;
                };
                if self.costs[neighbor_offset].is_none() {
                    continue;
                }
                let candidate = cost + step;
                if distances[neighbor_offset].is_some_and(|best| best <= candidate) {
                    continue;
                }
                distances[neighbor_offset] = Some(candidate);
                frontier.push(Frontier {
                    cost: candidate,
                    cell: neighbor,
                });
            }
        }

        distances
    }

    /// Cheapest route from `start` to `goal`, both ends included.
    #[must_use]
    pub fn route(&self, start: CellCoord, goal: CellCoord) -> Option<Vec<CellCoord>> {
        let distances = self.distances_to(&[goal]);
        let mut current = start;
        let mut remaining = distances[self.offset(start)?]?;
        let mut path = vec![start];

        while current != goal {
            let (next, distance) = neighbors(current, self.width, self.height)
                .filter_map(|neighbor| {
                    let distance = distances[self.offset(neighbor)?]?;
                    Some((neighbor, distance))
                })
                .min_by(|left, right| left.1.total_cmp(&right.1))?;
            if distance >= remaining {
                return None;
            }
            remaining = distance;
            current = next;
            path.push(current);
        }

        Some(path)
    }

    fn offset(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.width || cell.row() >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

#[derive(Clone, Copy, Debug)]
struct Frontier {
    cost: f64,
    cell: CellCoord,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    // Reversed so the max-heap pops the cheapest entry first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

fn neighbors(cell: CellCoord, width: u32, height: u32) -> impl Iterator<Item = CellCoord> {
    Side::ALL
        .into_iter()
        .filter_map(move |side| cell.step(side))
        .filter(move |next| next.column() < width && next.row() < height)
}
