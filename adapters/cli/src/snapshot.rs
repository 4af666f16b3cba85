//! Single-line, copy-pasteable encoding of a solved tile map.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tilewave_core::TileId;
use tilewave_grid::Grid;
use tilewave_tileset::TileSet;

const SNAPSHOT_DOMAIN: &str = "tilewave";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "tilewave:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Tile names per cell in row-major order; `None` marks an uncollapsed cell.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TileMapSnapshot {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) tiles: Vec<Option<String>>,
}

impl TileMapSnapshot {
    /// Captures the current contents of `grid`.
    pub(crate) fn capture(grid: &Grid) -> Self {
        let tiles = grid.tile_set();
        Self {
            columns: grid.width(),
            rows: grid.height(),
            tiles: grid
                .iter()
                .map(|(_, cell)| {
                    cell.collapsed()
                        .and_then(|tile| tiles.definition(tile))
                        .map(|definition| definition.name().to_owned())
                })
                .collect(),
        }
    }

    /// Resolves every stored name against `tiles`.
    pub(crate) fn resolve(&self, tiles: &TileSet) -> Result<Vec<Option<TileId>>, SnapshotError> {
        self.tiles
            .iter()
            .map(|name| match name {
                Some(name) => tiles
                    .id_of(name)
                    .map(Some)
                    .ok_or_else(|| SnapshotError::UnknownTile(name.clone())),
                None => Ok(None),
            })
            .collect()
    }

    /// Encodes the snapshot into a single-line string.
    pub(crate) fn encode(&self) -> Result<String, SnapshotError> {
        let payload = SerializableSnapshot {
            tiles: self.tiles.clone(),
        };
        let json = serde_json::to_vec(&payload).map_err(SnapshotError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            self.columns, self.rows
        ))
    }

    /// Decodes a snapshot from its string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, SnapshotError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SnapshotError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(SnapshotError::MissingPrefix)?;
        let version = parts.next().ok_or(SnapshotError::MissingVersion)?;
        let dimensions = parts.next().ok_or(SnapshotError::MissingDimensions)?;
        let payload = parts.next().ok_or(SnapshotError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(SnapshotError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(SnapshotError::InvalidEncoding)?;
        let decoded: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(SnapshotError::InvalidPayload)?;

        let expected = columns as usize * rows as usize;
        if decoded.tiles.len() != expected {
            return Err(SnapshotError::CellCountMismatch {
                expected,
                found: decoded.tiles.len(),
            });
        }

        Ok(Self {
            columns,
            rows,
            tiles: decoded.tiles,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct SerializableSnapshot {
    tiles: Vec<Option<String>>,
}

/// Errors raised while decoding or resolving snapshot strings.
#[derive(Debug, Error)]
pub(crate) enum SnapshotError {
    #[error("snapshot string was empty")]
    EmptyPayload,
    #[error("snapshot string is missing the prefix")]
    MissingPrefix,
    #[error("snapshot string is missing the version")]
    MissingVersion,
    #[error("snapshot string is missing the grid dimensions")]
    MissingDimensions,
    #[error("snapshot string is missing the payload")]
    MissingPayload,
    #[error("snapshot prefix '{0}' is not supported")]
    InvalidPrefix(String),
    #[error("snapshot version '{0}' is not supported")]
    UnsupportedVersion(String),
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    #[error("could not decode snapshot payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    #[error("could not process snapshot payload")]
    InvalidPayload(#[source] serde_json::Error),
    #[error("snapshot lists {found} cells but its dimensions need {expected}")]
    CellCountMismatch { expected: usize, found: usize },
    #[error("snapshot names unknown tile '{0}'")]
    UnknownTile(String),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), SnapshotError> {
    let invalid = || SnapshotError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;
    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;
    if columns == 0 || rows == 0 {
        return Err(invalid());
    }
    Ok((columns, rows))
}
