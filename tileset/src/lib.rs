#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Validated tile sets and the adjacency rule shared by every solver stage.
//!
//! A [`TileSet`] is immutable once built. Construction validates the authored
//! definitions and precomputes, for every tile and side, which tiles may sit
//! across that side. [`TileSet::compatible_tiles`] is the only adjacency query
//! the rest of the workspace uses.

use std::collections::HashMap;

use tilewave_core::{ConfigurationError, Possibilities, Side, TileDefinition, TileId};

pub mod authoring;

/// Immutable collection of tile definitions plus their adjacency table.
#[derive(Clone, Debug)]
pub struct TileSet {
    definitions: Vec<TileDefinition>,
    names: HashMap<String, TileId>,
    adjacency: Vec<[Possibilities; 4]>,
    signature_length: usize,
}

impl TileSet {
    /// Validates `definitions` and builds the adjacency table.
    ///
    /// Every signature must be non-empty and share the length of the first
    /// tile's north signature. Weights must be finite and strictly positive and
    /// names must be unique.
    pub fn new(definitions: Vec<TileDefinition>) -> Result<Self, ConfigurationError> {
        let first = definitions.first().ok_or(ConfigurationError::EmptyTileSet)?;
        let signature_length = first.edge(Side::North).len();

        let mut names = HashMap::with_capacity(definitions.len());
        for (index, definition) in definitions.iter().enumerate() {
            validate_definition(definition, signature_length)?;
            let id = TileId::new(u32::try_from(index).unwrap_or(u32::MAX));
            if names.insert(definition.name().to_owned(), id).is_some() {
                return Err(ConfigurationError::DuplicateTileName {
                    name: definition.name().to_owned(),
                });
            }
        }

        let capacity = definitions.len();
        let adjacency = definitions
            .iter()
            .map(|source| {
                Side::ALL.map(|side| {
                    Possibilities::from_tiles(
                        capacity,
                        definitions
                            .iter()
                            .enumerate()
                            .filter(|(_, candidate)| edges_match(source, side, candidate))
                            .map(|(index, _)| TileId::new(index as u32)),
                    )
                })
            })
            .collect();

        Ok(Self {
            definitions,
            names,
            adjacency,
            signature_length,
        })
    }

    /// Number of tiles in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Always `false`: construction rejects empty sets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Connector token count shared by every signature in the set.
    #[must_use]
    pub fn signature_length(&self) -> usize {
        self.signature_length
    }

    /// Iterates every tile identifier in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = TileId> + '_ {
        (0..self.definitions.len()).map(|index| TileId::new(index as u32))
    }

    /// Set containing every tile.
    #[must_use]
    pub fn all(&self) -> Possibilities {
        Possibilities::full(self.definitions.len())
    }

    /// Reports whether `tile` belongs to the set.
    #[must_use]
    pub fn contains(&self, tile: TileId) -> bool {
        tile.index() < self.definitions.len()
    }

    /// Definition registered under `tile`.
    #[must_use]
    pub fn definition(&self, tile: TileId) -> Option<&TileDefinition> {
        self.definitions.get(tile.index())
    }

    /// Iterates identifiers alongside their definitions.
    pub fn iter(&self) -> impl Iterator<Item = (TileId, &TileDefinition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| (TileId::new(index as u32), definition))
    }

    /// Identifier registered under `name`.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<TileId> {
        self.names.get(name).copied()
    }

    /// Identifier registered under `name`, as a configuration error when absent.
    pub fn resolve(&self, name: &str) -> Result<TileId, ConfigurationError> {
        self.id_of(name)
            .ok_or_else(|| ConfigurationError::UnknownTileName {
                name: name.to_owned(),
            })
    }

    /// Selection weight of `tile`; unknown tiles weigh nothing.
    #[must_use]
    pub fn weight(&self, tile: TileId) -> f64 {
        self.definition(tile).map_or(0.0, TileDefinition::weight)
    }

    /// Tiles allowed across `side` of `source`.
    ///
    /// An absent source stands for an open boundary and permits every tile.
    /// Otherwise a tile `t` is returned when the source's signature on `side`,
    /// reversed, equals `t`'s signature on the opposite side.
    #[must_use]
    pub fn compatible_tiles(&self, source: Option<TileId>, side: Side) -> Possibilities {
        match source.and_then(|tile| self.adjacency.get(tile.index())) {
            Some(sides) => sides[side.index()].clone(),
            None => self.all(),
        }
    }

    /// Tiles allowed across `side` of at least one tile in `sources`.
    ///
    /// This is the union of [`TileSet::compatible_tiles`] over the set and is
    /// what propagation intersects a neighbouring cell with.
    #[must_use]
    pub fn supported_by(&self, sources: &Possibilities, side: Side) -> Possibilities {
        let mut allowed = Possibilities::empty(self.definitions.len());
        for tile in sources {
            if let Some(sides) = self.adjacency.get(tile.index()) {
                allowed.union_with(&sides[side.index()]);
            }
        }
        allowed
    }
}

fn validate_definition(
    definition: &TileDefinition,
    signature_length: usize,
) -> Result<(), ConfigurationError> {
    let weight = definition.weight();
    if !(weight.is_finite() && weight > 0.0) {
        return Err(ConfigurationError::NonPositiveWeight {
            tile: definition.name().to_owned(),
            weight,
        });
    }

    for side in Side::ALL {
        let signature = definition.edge(side);
        if signature.is_empty() {
            return Err(ConfigurationError::EmptySignature {
                tile: definition.name().to_owned(),
                side,
            });
        }
        if signature.len() != signature_length {
            return Err(ConfigurationError::SignatureLengthMismatch {
                tile: definition.name().to_owned(),
                side,
                expected: signature_length,
                found: signature.len(),
            });
        }
    }

    Ok(())
}

fn edges_match(source: &TileDefinition, side: Side, candidate: &TileDefinition) -> bool {
    source.edge(side).reversed() == *candidate.edge(side.opposite())
}
