//! Plain-text views of a grid for the terminal.

use std::fmt::Write as _;

use tilewave_grid::{query, Grid};

/// Printed for a cell that still has several candidates.
pub(crate) const UNDECIDED_GLYPH: char = '?';
/// Printed for a cell with no candidates left.
pub(crate) const CONTRADICTION_GLYPH: char = '!';
/// Printed for a collapsed tile that carries no glyph tag.
pub(crate) const UNTAGGED_GLYPH: char = '*';

const HEAT_RAMP: [char; 5] = [' ', '.', ':', '+', '#'];

/// Renders one character per cell, rows separated by newlines.
pub(crate) fn glyph_map(grid: &Grid) -> String {
    let tiles = grid.tile_set();
    let mut out = String::with_capacity(grid.cell_count() + grid.height() as usize);
    for (coord, cell) in grid.iter() {
        let glyph = match cell.collapsed() {
            Some(tile) => tiles
                .definition(tile)
                .and_then(|definition| definition.glyph())
                .unwrap_or(UNTAGGED_GLYPH),
            None if cell.is_contradiction() => CONTRADICTION_GLYPH,
            None => UNDECIDED_GLYPH,
        };
        out.push(glyph);
        if coord.column() + 1 == grid.width() {
            out.push('\n');
        }
    }
    out
}

/// Renders normalized entropy as a character ramp, blank meaning collapsed.
pub(crate) fn heatmap(grid: &Grid) -> String {
    let entropy = query::entropy_map(grid);
    let mut out = String::with_capacity(entropy.len() + grid.height() as usize);
    for (index, value) in entropy.iter().enumerate() {
        let collapsed = grid
            .coord(index)
            .and_then(|coord| grid.cell(coord).ok())
            .map_or(false, |cell| cell.is_collapsed());
        let glyph = if collapsed {
            HEAT_RAMP[0]
        } else {
            let last = HEAT_RAMP.len() - 1;
            let level = (value.clamp(0.0, 1.0) * last as f32).ceil() as usize;
            HEAT_RAMP[level.clamp(1, last)]
        };
        out.push(glyph);
        if (index + 1) % grid.width() as usize == 0 {
            out.push('\n');
        }
    }
    out
}

/// One line per tile name with the glyph used for it.
pub(crate) fn legend(grid: &Grid) -> String {
    let mut out = String::new();
    for (_, definition) in grid.tile_set().iter() {
        let glyph = definition.glyph().unwrap_or(UNTAGGED_GLYPH);
        let _ = writeln!(out, "{glyph} {}", definition.name());
    }
    out
}
