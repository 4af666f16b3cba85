//! Built-in pathfinder terrain used when no scenario file is given.
//!
//! Water, forest and grass meet through transition tiles; `s` marks a shore
//! and `m` a forest margin inside the three-token signatures. Paths run
//! through grass only.

use tilewave_core::{MetadataValue, TileDefinition, GLYPH_KEY, TRAVEL_COST_KEY};
use tilewave_tileset::authoring::rotation_family;

struct TerrainTile {
    name: &'static str,
    edges: [&'static str; 4],
    weight: f64,
    travel_cost: f64,
    glyph: char,
    rotates: bool,
}

const TERRAIN: [TerrainTile; 14] = [
    TerrainTile {
        name: "water",
        edges: ["www"; 4],
        weight: 10.0,
        travel_cost: 1.0,
        glyph: '~',
        rotates: false,
    },
    TerrainTile {
        name: "forest",
        edges: ["fff"; 4],
        weight: 10.0,
        travel_cost: 1.0,
        glyph: '#',
        rotates: false,
    },
    TerrainTile {
        name: "grass",
        edges: ["ggg"; 4],
        weight: 20.0,
        travel_cost: 0.25,
        glyph: '.',
        rotates: false,
    },
    TerrainTile {
        name: "path_crossing",
        edges: ["gpg"; 4],
        weight: 1.0,
        travel_cost: 0.0,
        glyph: '+',
        rotates: false,
    },
    TerrainTile {
        name: "shore",
        edges: ["wsg", "ggg", "gsw", "www"],
        weight: 3.0,
        travel_cost: 0.5,
        glyph: ',',
        rotates: true,
    },
    TerrainTile {
        name: "water_corner",
        edges: ["wsg", "ggg", "ggg", "gsw"],
        weight: 3.0,
        travel_cost: 0.95,
        glyph: ',',
        rotates: true,
    },
    TerrainTile {
        name: "island_corner",
        edges: ["wsg", "gsw", "www", "www"],
        weight: 2.0,
        travel_cost: 0.95,
        glyph: '%',
        rotates: true,
    },
    TerrainTile {
        name: "forest_edge",
        edges: ["fmg", "ggg", "gmf", "fff"],
        weight: 3.0,
        travel_cost: 0.85,
        glyph: '"',
        rotates: true,
    },
    TerrainTile {
        name: "corner_forest_edge",
        edges: ["fmg", "ggg", "ggg", "gmf"],
        weight: 3.0,
        travel_cost: 0.85,
        glyph: '"',
        rotates: true,
    },
    TerrainTile {
        name: "clearing_corner",
        edges: ["fmg", "gmf", "fff", "fff"],
        weight: 2.0,
        travel_cost: 0.95,
        glyph: '&',
        rotates: true,
    },
    TerrainTile {
        name: "straight_path",
        edges: ["gpg", "ggg", "gpg", "ggg"],
        weight: 2.0,
        travel_cost: 0.0,
        glyph: '=',
        rotates: true,
    },
    TerrainTile {
        name: "corner_path",
        edges: ["gpg", "gpg", "ggg", "ggg"],
        weight: 2.0,
        travel_cost: 0.0,
        glyph: '+',
        rotates: true,
    },
    TerrainTile {
        name: "path_junction",
        edges: ["gpg", "gpg", "ggg", "gpg"],
        weight: 1.0,
        travel_cost: 0.0,
        glyph: '+',
        rotates: true,
    },
    TerrainTile {
        name: "square",
        edges: ["gpg", "ggg", "ggg", "ggg"],
        weight: 1.0,
        travel_cost: 0.0,
        glyph: 'o',
        rotates: true,
    },
];

/// Every terrain definition, with rotating tiles expanded to four orientations.
pub(crate) fn definitions() -> Vec<TileDefinition> {
    let mut definitions = Vec::new();
    for tile in &TERRAIN {
        let base = TileDefinition::from_strs(tile.name, tile.edges, tile.weight)
            .with_metadata(TRAVEL_COST_KEY, MetadataValue::Number(tile.travel_cost))
            .with_metadata(GLYPH_KEY, MetadataValue::Text(tile.glyph.to_string()));
        if tile.rotates {
            definitions.extend(rotation_family(&base));
        } else {
            definitions.push(base);
        }
    }
    definitions
}
