//! TOML scenario files describing a tile set, a grid and solver settings.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tilewave_core::{
    CellCoord, EdgeSignature, MetadataValue, Seed, TileDefinition, GLYPH_KEY, TRAVEL_COST_KEY,
};
use tilewave_solver::{PropagationBudget, RepairStrategy, SolverConfig};
use tilewave_tileset::{
    authoring::{rotation_family, FeatureTemplate},
    TileSet,
};

const SUPPORTED_SCENARIO_VERSION: u32 = 1;

/// Everything needed to start a solve.
#[derive(Clone, Debug)]
pub(crate) struct Scenario {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rng_seed: u64,
    pub(crate) solver: SolverConfig,
    pub(crate) definitions: Vec<TileDefinition>,
    pub(crate) placements: Vec<Placement>,
}

/// Authored tile or feature pinned before solving starts.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Placement {
    Tile { name: String, at: CellCoord },
    Feature { template: FeatureTemplate, at: CellCoord },
}

impl Scenario {
    /// Resolves every placement into seeds against the finished tile set.
    pub(crate) fn seeds(&self, tiles: &TileSet) -> Result<Vec<Seed>> {
        let mut seeds = Vec::new();
        for placement in &self.placements {
            match placement {
                Placement::Tile { name, at } => {
                    let tile = tiles
                        .resolve(name)
                        .with_context(|| format!("seed at {at} names an unknown tile"))?;
                    seeds.push(Seed::new(*at, tile));
                }
                Placement::Feature { template, at } => {
                    let stamped = template
                        .stamp(tiles, *at)
                        .with_context(|| format!("failed to stamp feature `{}`", template.name()))?;
                    seeds.extend(stamped);
                }
            }
        }
        Ok(seeds)
    }
}

/// Reads and validates a scenario file.
pub(crate) fn load(path: &Path) -> Result<Scenario> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid scenario {}", path.display()))
}

/// Parses a scenario from TOML source.
pub(crate) fn parse(contents: &str) -> Result<Scenario> {
    let file: ScenarioFile =
        toml::from_str(contents).context("failed to parse scenario toml contents")?;
    if file.version != SUPPORTED_SCENARIO_VERSION {
        bail!(
            "unsupported scenario version {}; expected {}",
            file.version,
            SUPPORTED_SCENARIO_VERSION
        );
    }
    if file.tiles.is_empty() {
        bail!("scenario defines no tiles");
    }

    let mut definitions = Vec::new();
    for tile in file.tiles {
        let rotations = tile.rotations;
        let base = tile.into_definition();
        if rotations {
            definitions.extend(rotation_family(&base));
        } else {
            definitions.push(base);
        }
    }

    let mut placements = Vec::new();
    for feature in file.features {
        let glyph = feature.glyph;
        let template = FeatureTemplate::new(
            feature.name,
            feature.letter,
            feature.filler,
            feature.rules,
        )?
        .with_weight(feature.weight);
        definitions.extend(template.definitions().into_iter().map(|definition| {
            match glyph {
                Some(glyph) => {
                    definition.with_metadata(GLYPH_KEY, MetadataValue::Text(glyph.to_string()))
                }
                None => definition,
            }
        }));
        if let Some([column, row]) = feature.at {
            placements.push(Placement::Feature {
                template,
                at: CellCoord::new(column, row),
            });
        }
    }

    placements.extend(file.seeds.into_iter().map(|seed| Placement::Tile {
        name: seed.tile,
        at: CellCoord::new(seed.at[0], seed.at[1]),
    }));

    Ok(Scenario {
        width: file.grid.width,
        height: file.grid.height,
        rng_seed: file.solver.seed,
        solver: file.solver.into_config()?,
        definitions,
        placements,
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    version: u32,
    grid: GridSection,
    #[serde(default)]
    solver: SolverSection,
    #[serde(default)]
    tiles: Vec<TileEntry>,
    #[serde(default)]
    features: Vec<FeatureEntry>,
    #[serde(default)]
    seeds: Vec<SeedEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GridSection {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SolverSection {
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    propagation: PropagationEntry,
    #[serde(default)]
    repair: RepairEntry,
    #[serde(default = "default_max_attempts")]
    max_attempts: Option<u64>,
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            seed: 0,
            propagation: PropagationEntry::default(),
            repair: RepairEntry::default(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl SolverSection {
    fn into_config(self) -> Result<SolverConfig> {
        let propagation = match self.propagation {
            PropagationEntry::Fixpoint => PropagationBudget::Fixpoint,
            PropagationEntry::Steps(0) => bail!("propagation step budget must be positive"),
            PropagationEntry::Steps(steps) => PropagationBudget::Steps(steps),
        };
        let repair = match self.repair {
            RepairEntry::LocalWindow { width, height } => {
                RepairStrategy::LocalWindow { width, height }
            }
            RepairEntry::FullReset { reseed_count } => RepairStrategy::FullReset { reseed_count },
        };
        let config = SolverConfig {
            propagation,
            repair,
            max_attempts: self.max_attempts,
        };
        config.validate()?;
        Ok(config)
    }
}

fn default_max_attempts() -> Option<u64> {
    SolverConfig::default().max_attempts
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PropagationEntry {
    Steps(usize),
    Fixpoint,
}

impl Default for PropagationEntry {
    fn default() -> Self {
        match PropagationBudget::default() {
            PropagationBudget::Steps(steps) => Self::Steps(steps),
            PropagationBudget::Fixpoint => Self::Fixpoint,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
enum RepairEntry {
    LocalWindow { width: u32, height: u32 },
    FullReset { reseed_count: usize },
}

impl Default for RepairEntry {
    fn default() -> Self {
        match RepairStrategy::default() {
            RepairStrategy::LocalWindow { width, height } => Self::LocalWindow { width, height },
            RepairStrategy::FullReset { reseed_count } => Self::FullReset { reseed_count },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TileEntry {
    name: String,
    edges: [String; 4],
    weight: f64,
    #[serde(default)]
    travel_cost: Option<f64>,
    #[serde(default)]
    glyph: Option<char>,
    #[serde(default)]
    rotations: bool,
}

impl TileEntry {
    fn into_definition(self) -> TileDefinition {
        let mut definition =
            TileDefinition::new(self.name, self.edges.map(EdgeSignature::new), self.weight);
        if let Some(cost) = self.travel_cost {
            definition = definition.with_metadata(TRAVEL_COST_KEY, MetadataValue::Number(cost));
        }
        if let Some(glyph) = self.glyph {
            definition = definition.with_metadata(GLYPH_KEY, MetadataValue::Text(glyph.to_string()));
        }
        definition
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FeatureEntry {
    name: String,
    letter: char,
    #[serde(default = "default_filler")]
    filler: char,
    #[serde(default = "default_feature_weight")]
    weight: f64,
    rules: Vec<Vec<String>>,
    #[serde(default)]
    glyph: Option<char>,
    #[serde(default)]
    at: Option<[u32; 2]>,
}

fn default_filler() -> char {
    's'
}

fn default_feature_weight() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedEntry {
    tile: String,
    at: [u32; 2],
}
