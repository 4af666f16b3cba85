#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tilewave solver.
//!
//! This crate defines the value types every other crate speaks in: tile
//! identifiers, grid coordinates and rectangles, the four cardinal sides,
//! edge signatures, authored tile definitions and the dense possibility set
//! tracked per cell. It also owns the error taxonomy and the event stream the
//! solver publishes to its collaborators. Nothing in here performs solving;
//! the tile set, grid and systems crates build on these contracts.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod possibilities;

pub use possibilities::{Possibilities, PossibilitiesIter};

/// Unique identifier assigned to a tile definition within a tile set.
///
/// Identifiers are dense: the n-th definition handed to a tile set receives
/// `TileId::new(n)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Position of the tile within dense per-tile tables.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile#{}", self.0)
    }
}

/// One of the four sides of a square tile.
///
/// Sides are ordered clockwise starting at the top, which is also the order
/// edge signatures are authored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Top edge, facing decreasing row indices.
    North,
    /// Right edge, facing increasing column indices.
    East,
    /// Bottom edge, facing increasing row indices.
    South,
    /// Left edge, facing decreasing column indices.
    West,
}

impl Side {
    /// All sides in authoring order.
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    /// Zero-based position of the side in authoring order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Side located at `index` modulo four.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// Side facing this one across a shared edge.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Side reached after turning `quarter_turns` steps clockwise.
    #[must_use]
    pub const fn rotated_clockwise(self, quarter_turns: usize) -> Self {
        Self::from_index(self.index() + quarter_turns % 4)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        };
        f.write_str(name)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Adjacent coordinate across `side`, if it does not underflow.
    ///
    /// Upper bounds are not checked here; grids filter the result against
    /// their own dimensions.
    #[must_use]
    pub fn step(self, side: Side) -> Option<CellCoord> {
        match side {
            Side::North => self
                .row
                .checked_sub(1)
                .map(|row| CellCoord::new(self.column, row)),
            Side::East => self
                .column
                .checked_add(1)
                .map(|column| CellCoord::new(column, self.row)),
            Side::South => self
                .row
                .checked_add(1)
                .map(|row| CellCoord::new(self.column, row)),
            Side::West => self
                .column
                .checked_sub(1)
                .map(|column| CellCoord::new(column, self.row)),
        }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Rectangle of `size` whose middle cell is `center`.
    ///
    /// For even sizes the extra cell falls on the lower/right side. The origin
    /// saturates at zero, so windows near the top-left edge shrink rather than
    /// wrap.
    #[must_use]
    pub fn centered_on(center: CellCoord, size: CellRectSize) -> Self {
        let start_column = center.column().saturating_sub(size.width() / 2);
        let start_row = center.row().saturating_sub(size.height() / 2);
        let end_column = center
            .column()
            .saturating_add(size.width() - size.width() / 2);
        let end_row = center.row().saturating_add(size.height() - size.height() / 2);
        Self {
            origin: CellCoord::new(start_column, start_row),
            size: CellRectSize::new(end_column - start_column, end_row - start_row),
        }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Reports whether the rectangle covers no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size.width() == 0 || self.size.height() == 0
    }

    /// Reports whether `cell` lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let column = u64::from(cell.column());
        let row = u64::from(cell.row());
        let left = u64::from(self.origin.column());
        let top = u64::from(self.origin.row());
        column >= left
            && row >= top
            && column < left + u64::from(self.size.width())
            && row < top + u64::from(self.size.height())
    }

    /// Intersection of the rectangle with a `width` x `height` grid anchored at zero.
    ///
    /// Returns `None` when nothing of the rectangle remains.
    #[must_use]
    pub fn clipped_to(&self, width: u32, height: u32) -> Option<CellRect> {
        let left = self.origin.column();
        let top = self.origin.row();
        let right = left.saturating_add(self.size.width()).min(width);
        let bottom = top.saturating_add(self.size.height()).min(height);
        if left >= right || top >= bottom {
            return None;
        }
        Some(CellRect::from_origin_and_size(
            CellCoord::new(left, top),
            CellRectSize::new(right - left, bottom - top),
        ))
    }

    /// Iterates the covered cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let size = self.size;
        (0..size.height()).flat_map(move |dy| {
            (0..size.width())
                .map(move |dx| CellCoord::new(origin.column() + dx, origin.row() + dy))
        })
    }

    /// Iterates the cells lying on the rectangle's perimeter in row-major order.
    pub fn perimeter(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let size = self.size;
        self.cells().filter(move |cell| {
            cell.column() == origin.column()
                || cell.row() == origin.row()
                || cell.column() + 1 == origin.column() + size.width()
                || cell.row() + 1 == origin.row() + size.height()
        })
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Connector pattern describing one side of a tile.
///
/// Two tiles may touch when the signature of one side, read backwards, equals
/// the signature of the touching side of the neighbour. Tiles are read in
/// opposite directions along a shared edge, hence the reversal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeSignature(String);

impl EdgeSignature {
    /// Creates a signature from its connector tokens.
    #[must_use]
    pub fn new(tokens: impl Into<String>) -> Self {
        Self(tokens.into())
    }

    /// Connector tokens as authored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of connector tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Reports whether the signature carries no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Signature read in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> EdgeSignature {
        Self(self.0.chars().rev().collect())
    }
}

impl From<&str> for EdgeSignature {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for EdgeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value stored in a tile's open metadata map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    /// Numeric tag such as a traversal cost.
    Number(f64),
    /// Free-form text tag.
    Text(String),
}

/// Open extension map carrying domain tags next to the solver-relevant fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileMetadata {
    entries: BTreeMap<String, MetadataValue>,
}

impl TileMetadata {
    /// Creates an empty metadata map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: MetadataValue) -> Option<MetadataValue> {
        self.entries.insert(key.into(), value)
    }

    /// Raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    /// Numeric value stored under `key`.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.entries.get(key) {
            Some(MetadataValue::Number(value)) => Some(*value),
            _ => None,
        }
    }

    /// Text value stored under `key`.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(MetadataValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Reports whether no tags are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Metadata key conventionally holding a tile's traversal cost.
pub const TRAVEL_COST_KEY: &str = "travel_cost";

/// Metadata key conventionally holding the character used to print a tile.
pub const GLYPH_KEY: &str = "glyph";

/// Authored description of a single tile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    name: String,
    edges: [EdgeSignature; 4],
    weight: f64,
    #[serde(default)]
    metadata: TileMetadata,
}

impl TileDefinition {
    /// Creates a definition from its name, signatures (north, east, south, west) and weight.
    #[must_use]
    pub fn new(name: impl Into<String>, edges: [EdgeSignature; 4], weight: f64) -> Self {
        Self {
            name: name.into(),
            edges,
            weight,
            metadata: TileMetadata::new(),
        }
    }

    /// Convenience constructor taking string slices for the signatures.
    #[must_use]
    pub fn from_strs(name: impl Into<String>, edges: [&str; 4], weight: f64) -> Self {
        Self::new(name, edges.map(EdgeSignature::from), weight)
    }

    /// Attaches a metadata tag, replacing any previous value under the key.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        let _ = self.metadata.insert(key, value);
        self
    }

    /// Overrides the selection weight.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Renames the definition.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the whole metadata map.
    #[must_use]
    pub fn with_metadata_map(mut self, metadata: TileMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Stable authored name of the tile.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signature on the provided side.
    #[must_use]
    pub fn edge(&self, side: Side) -> &EdgeSignature {
        &self.edges[side.index()]
    }

    /// All four signatures in authoring order.
    #[must_use]
    pub fn edges(&self) -> &[EdgeSignature; 4] {
        &self.edges
    }

    /// Relative selection weight.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Open metadata map.
    #[must_use]
    pub fn metadata(&self) -> &TileMetadata {
        &self.metadata
    }

    /// Traversal cost tag, if authored.
    #[must_use]
    pub fn travel_cost(&self) -> Option<f64> {
        self.metadata.number(TRAVEL_COST_KEY)
    }

    /// Display glyph tag, if authored.
    #[must_use]
    pub fn glyph(&self) -> Option<char> {
        self.metadata
            .text(GLYPH_KEY)
            .and_then(|text| text.chars().next())
    }
}

/// Pre-authored placement of a tile, fixed before solving starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seed {
    /// Cell receiving the tile.
    pub cell: CellCoord,
    /// Tile placed in the cell.
    pub tile: TileId,
}

impl Seed {
    /// Creates a seed placing `tile` at `cell`.
    #[must_use]
    pub const fn new(cell: CellCoord, tile: TileId) -> Self {
        Self { cell, tile }
    }
}

/// Reasons a tile set or solver configuration is rejected at construction.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigurationError {
    /// No tile definitions were supplied.
    #[error("tile set must contain at least one tile")]
    EmptyTileSet,
    /// Two definitions share the same name.
    #[error("tile name '{name}' is defined more than once")]
    DuplicateTileName {
        /// Name used by more than one definition.
        name: String,
    },
    /// A side carries no connector tokens.
    #[error("tile '{tile}' has an empty {side} signature")]
    EmptySignature {
        /// Name of the offending tile.
        tile: String,
        /// Side carrying the empty signature.
        side: Side,
    },
    /// A signature's length disagrees with the rest of the set.
    #[error("tile '{tile}' has a {side} signature of length {found}, expected {expected}")]
    SignatureLengthMismatch {
        /// Name of the offending tile.
        tile: String,
        /// Side carrying the mismatched signature.
        side: Side,
        /// Length shared by the rest of the tile set.
        expected: usize,
        /// Length found on the offending side.
        found: usize,
    },
    /// A weight is zero, negative or not a number.
    #[error("tile '{tile}' has non-positive weight {weight}")]
    NonPositiveWeight {
        /// Name of the offending tile.
        tile: String,
        /// Weight that was rejected.
        weight: f64,
    },
    /// A grid dimension is zero.
    #[error("grid dimensions {width}x{height} must both be non-zero")]
    EmptyGrid {
        /// Requested column count.
        width: u32,
        /// Requested row count.
        height: u32,
    },
    /// A seed or template references an identifier outside the tile set.
    #[error("{tile} is not part of the tile set")]
    UnknownTileId {
        /// Identifier that failed to resolve.
        tile: TileId,
    },
    /// A seed or template references a name outside the tile set.
    #[error("tile '{name}' is not part of the tile set")]
    UnknownTileName {
        /// Name that failed to resolve.
        name: String,
    },
    /// Two seeds on neighbouring cells hold tiles that may not touch.
    #[error("seeds at {first} and {second} hold tiles that may not touch")]
    IncompatibleSeeds {
        /// Seed whose neighbour rejects it.
        first: CellCoord,
        /// Neighbouring seed.
        second: CellCoord,
    },
    /// Two seeds target the same cell with different tiles.
    #[error("conflicting seeds at cell {cell}")]
    ConflictingSeeds {
        /// Cell targeted more than once.
        cell: CellCoord,
    },
    /// A feature template is malformed.
    #[error("feature template '{name}' is invalid: {reason}")]
    InvalidFeatureTemplate {
        /// Name of the template.
        name: String,
        /// Human-readable description of the defect.
        reason: String,
    },
    /// A repair window has a zero dimension.
    #[error("repair window {width}x{height} must both be non-zero")]
    InvalidRepairWindow {
        /// Requested window width.
        width: u32,
        /// Requested window height.
        height: u32,
    },
}

/// Broken engine invariants detected by grid mutators.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum Violation {
    /// A collapse targeted a tile no longer possible in the cell.
    #[error("{tile} is not among the cell's possibilities")]
    TileNotPossible {
        /// Tile requested for the collapse.
        tile: TileId,
    },
    /// A collapsed cell holds more or fewer than one possibility.
    #[error("collapsed cell holds {count} possibilities")]
    NonSingletonCollapse {
        /// Number of possibilities found.
        count: usize,
    },
    /// A collapse tried to change a locked cell to a different tile.
    #[error("locked cell cannot be collapsed to {tile}")]
    LockedCell {
        /// Tile requested for the collapse.
        tile: TileId,
    },
}

/// Errors returned by grid accessors and mutators.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// The requested cell lies outside `[0, width) x [0, height)`.
    #[error("cell {cell} lies outside the {width}x{height} grid")]
    OutOfBounds {
        /// Cell that was requested.
        cell: CellCoord,
        /// Grid width in cells.
        width: u32,
        /// Grid height in cells.
        height: u32,
    },
    /// An engine invariant would have been broken.
    #[error("invariant violated at cell {cell}: {violation}")]
    InvariantViolation {
        /// Cell where the violation was detected.
        cell: CellCoord,
        /// Description of the violation.
        violation: Violation,
    },
}

/// Events published by the solver while it works through a grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolverEvent {
    /// A cell was collapsed to a single tile.
    TileCollapsed {
        /// Cell that was collapsed.
        cell: CellCoord,
        /// Tile assigned to the cell.
        tile: TileId,
    },
    /// A contradiction was detected and a region was reopened.
    ContradictionRepaired {
        /// Cell whose possibility set became empty.
        cell: CellCoord,
        /// Region that was reset.
        region: CellRect,
        /// Attempt counter after the repair.
        attempts: u64,
    },
    /// A caller forced a region back to the unsolved state.
    RegionReset {
        /// Region that was reset.
        region: CellRect,
    },
    /// Every cell is collapsed.
    GenerationCompleted {
        /// Number of contradiction repairs performed to get here.
        attempts: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn opposite_sides_pair_up() {
        assert_eq!(Side::North.opposite(), Side::South);
        assert_eq!(Side::East.opposite(), Side::West);
        assert_eq!(Side::South.opposite(), Side::North);
        assert_eq!(Side::West.opposite(), Side::East);
    }

    #[test]
    fn rotating_sides_wraps_clockwise() {
        assert_eq!(Side::North.rotated_clockwise(1), Side::East);
        assert_eq!(Side::West.rotated_clockwise(1), Side::North);
        assert_eq!(Side::South.rotated_clockwise(6), Side::North);
    }

    #[test]
    fn step_refuses_to_underflow() {
        let origin = CellCoord::new(0, 0);
        assert_eq!(origin.step(Side::North), None);
        assert_eq!(origin.step(Side::West), None);
        assert_eq!(origin.step(Side::East), Some(CellCoord::new(1, 0)));
        assert_eq!(origin.step(Side::South), Some(CellCoord::new(0, 1)));
    }

    #[test]
    fn centered_window_covers_five_by_five() {
        let rect = CellRect::centered_on(CellCoord::new(5, 5), CellRectSize::new(5, 5));
        assert_eq!(rect.origin(), CellCoord::new(3, 3));
        assert_eq!(rect.size(), CellRectSize::new(5, 5));
        assert!(rect.contains(CellCoord::new(7, 7)));
        assert!(!rect.contains(CellCoord::new(8, 7)));
    }

    #[test]
    fn centered_window_shrinks_at_origin() {
        let rect = CellRect::centered_on(CellCoord::new(1, 0), CellRectSize::new(5, 5));
        assert_eq!(rect.origin(), CellCoord::new(0, 0));
        assert_eq!(rect.size(), CellRectSize::new(4, 3));
    }

    #[test]
    fn clipping_drops_cells_outside_grid() {
        let rect =
            CellRect::from_origin_and_size(CellCoord::new(3, 1), CellRectSize::new(5, 5));
        let clipped = rect.clipped_to(4, 4).expect("overlaps");
        assert_eq!(clipped.origin(), CellCoord::new(3, 1));
        assert_eq!(clipped.size(), CellRectSize::new(1, 3));

        let outside =
            CellRect::from_origin_and_size(CellCoord::new(9, 9), CellRectSize::new(2, 2));
        assert_eq!(outside.clipped_to(4, 4), None);
    }

    #[test]
    fn perimeter_skips_interior() {
        let rect =
            CellRect::from_origin_and_size(CellCoord::new(0, 0), CellRectSize::new(3, 3));
        let perimeter: Vec<_> = rect.perimeter().collect();
        assert_eq!(perimeter.len(), 8);
        assert!(!perimeter.contains(&CellCoord::new(1, 1)));
    }

    #[test]
    fn reversed_signature_reads_backwards() {
        let signature = EdgeSignature::new("gpw");
        assert_eq!(signature.reversed(), EdgeSignature::new("wpg"));
        assert_eq!(signature.len(), 3);
    }

    #[test]
    fn metadata_accessors_are_typed() {
        let tile = TileDefinition::from_strs("grass", ["ggg"; 4], 20.0)
            .with_metadata(TRAVEL_COST_KEY, MetadataValue::Number(0.25))
            .with_metadata(GLYPH_KEY, MetadataValue::Text("\"".to_owned()));
        assert_eq!(tile.travel_cost(), Some(0.25));
        assert_eq!(tile.glyph(), Some('"'));
        assert_eq!(tile.metadata().text(TRAVEL_COST_KEY), None);
    }

    #[test]
    fn tile_definition_round_trips_through_bincode() {
        let tile = TileDefinition::from_strs("shore", ["wsg", "ggg", "gsw", "www"], 3.0);
        assert_round_trip(&tile);
    }

    #[test]
    fn tagged_tile_definition_round_trips_through_bincode() {
        let tile = TileDefinition::from_strs("grass", ["g"; 4], 1.0)
            .with_metadata(TRAVEL_COST_KEY, MetadataValue::Number(0.25))
            .with_metadata(GLYPH_KEY, MetadataValue::Text(".".to_owned()));
        assert_round_trip(&tile);

        let bytes = bincode::serialize(&tile).expect("serialize");
        let restored: TileDefinition = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored.travel_cost(), Some(0.25));
        assert_eq!(restored.glyph(), Some('.'));
    }

    #[test]
    fn cell_rect_round_trips_through_bincode() {
        let rect =
            CellRect::from_origin_and_size(CellCoord::new(5, 7), CellRectSize::new(2, 3));
        assert_round_trip(&rect);
    }
}
