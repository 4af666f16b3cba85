//! Helpers for authoring tile definitions without writing every orientation by hand.

use tilewave_core::{
    CellCoord, ConfigurationError, EdgeSignature, Seed, Side, TileDefinition,
};

use crate::TileSet;

/// Number of orientations produced for a rotation family.
pub const ROTATION_COUNT: usize = 4;

/// Rotates `base` by `quarter_turns` clockwise.
///
/// The signature authored on side `s` ends up on side `s + quarter_turns`.
/// Name, weight and metadata are carried over unchanged.
#[must_use]
pub fn rotate(base: &TileDefinition, quarter_turns: usize) -> TileDefinition {
    let edges = base.edges();
    let rotated: [EdgeSignature; 4] = Side::ALL.map(|side| {
        let source = side.rotated_clockwise(ROTATION_COUNT - quarter_turns % ROTATION_COUNT);
        edges[source.index()].clone()
    });
    TileDefinition::new(base.name(), rotated, base.weight())
        .with_metadata_map(base.metadata().clone())
}

/// Expands `base` into its four orientations named `{name}_0` through `{name}_3`.
///
/// The first entry keeps the authored orientation; entry `i` is rotated `i`
/// quarter turns clockwise. All four share weight and metadata; callers may
/// override individual entries afterwards with [`TileDefinition::with_weight`].
#[must_use]
pub fn rotation_family(base: &TileDefinition) -> [TileDefinition; ROTATION_COUNT] {
    std::array::from_fn(|turns| {
        rotate(base, turns).with_name(format!("{}_{turns}", base.name()))
    })
}

/// Rectangular cluster of pre-wired tiles that only fit together one way.
///
/// Each template cell carries a four-character rule, one character per side in
/// north, east, south, west order. The character `x` marks an outer edge that
/// joins the surrounding filler terrain; any other character names a private
/// connector that only matches the same character on the touching cell. With
/// filler `s` and letter `r`, an outer edge becomes `sssss` and connector `1`
/// becomes `sr1rs`.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureTemplate {
    name: String,
    letter: char,
    filler: char,
    weight: f64,
    rules: Vec<Vec<String>>,
}

/// Rule character that marks an outer edge of a feature.
pub const OUTER_EDGE: char = 'x';

impl FeatureTemplate {
    /// Creates a template from rows of per-cell rules.
    ///
    /// `letter` namespaces the connectors so different features never join.
    pub fn new<R, S>(
        name: impl Into<String>,
        letter: char,
        filler: char,
        rules: R,
    ) -> Result<Self, ConfigurationError>
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let rules: Vec<Vec<String>> = rules
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        let invalid = |reason: String| ConfigurationError::InvalidFeatureTemplate {
            name: name.clone(),
            reason,
        };

        let width = rules.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(invalid("template has no cells".to_owned()));
        }
        for (y, row) in rules.iter().enumerate() {
            if row.len() != width {
                return Err(invalid(format!(
                    "row {y} has {} cells, expected {width}",
                    row.len()
                )));
            }
            for (x, rule) in row.iter().enumerate() {
                if rule.chars().count() != 4 {
                    return Err(invalid(format!(
                        "rule '{rule}' at ({x}, {y}) must name exactly four sides"
                    )));
                }
            }
        }

        Ok(Self {
            name,
            letter,
            filler,
            weight: 1.0,
            rules,
        })
    }

    /// Overrides the weight given to every generated tile.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Template name, also the prefix of every generated tile name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template width in cells.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.rules.first().map_or(0, |row| row.len() as u32)
    }

    /// Template height in cells.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.rules.len() as u32
    }

    /// Signature shared by every outer edge, e.g. `sssss`.
    #[must_use]
    pub fn outer_signature(&self) -> EdgeSignature {
        EdgeSignature::new(std::iter::repeat(self.filler).take(5).collect::<String>())
    }

    /// Name of the tile generated for template cell `(x, y)`.
    #[must_use]
    pub fn tile_name(&self, x: u32, y: u32) -> String {
        format!("{}_{x}_{y}", self.name)
    }

    /// One definition per template cell, in row-major order.
    #[must_use]
    pub fn definitions(&self) -> Vec<TileDefinition> {
        let mut definitions = Vec::with_capacity(self.rules.len() * self.width() as usize);
        for (y, row) in self.rules.iter().enumerate() {
            for (x, rule) in row.iter().enumerate() {
                let mut tokens = rule.chars();
                let edges: [EdgeSignature; 4] = std::array::from_fn(|_| {
                    match tokens.next() {
                        Some(OUTER_EDGE) | None => self.outer_signature(),
                        Some(connector) => EdgeSignature::new(format!(
                            "{filler}{letter}{connector}{letter}{filler}",
                            filler = self.filler,
                            letter = self.letter,
                        )),
                    }
                });
                definitions.push(TileDefinition::new(
                    self.tile_name(x as u32, y as u32),
                    edges,
                    self.weight,
                ));
            }
        }
        definitions
    }

    /// Seeds placing the whole cluster with its top-left cell at `origin`.
    ///
    /// Every generated tile must already be part of `tiles`.
    pub fn stamp(&self, tiles: &TileSet, origin: CellCoord) -> Result<Vec<Seed>, ConfigurationError> {
        let mut seeds = Vec::with_capacity((self.width() * self.height()) as usize);
        for y in 0..self.height() {
            for x in 0..self.width() {
                let tile = tiles.resolve(&self.tile_name(x, y))?;
                let cell = CellCoord::new(origin.column() + x, origin.row() + y);
                seeds.push(Seed::new(cell, tile));
            }
        }
        Ok(seeds)
    }
}
