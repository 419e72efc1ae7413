//! Tile geometry and tile-to-range resolution
//!
//! A tile at zoom `z` covers `max_width / 2^z` bases of the absolute coordinate
//! space. Resolving a tile splits its window into one fetch range per chromosome
//! it touches, expressed in chromosome-local coordinates.

use crate::core::index::ChromosomeIndex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Default tile size (also the number of bins per dimension)
pub const DEFAULT_TILE_SIZE: u64 = 1024;

/// Widest tile window served, in bases; wider tiles resolve to nothing
pub const MAX_TILE_WIDTH: f64 = 200_000.0;

/// How the sub-ranges of one tile are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    /// One sub-range at a time, in chromosome order
    Sequential,
    /// All sub-ranges at once, reassembled in chromosome order
    #[default]
    Concurrent,
}

/// Tileset parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilesetConfig {
    pub tile_size: u64,
    pub max_tile_width: f64,
    pub fetch_strategy: FetchStrategy,
}

impl Default for TilesetConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            max_tile_width: MAX_TILE_WIDTH,
            fetch_strategy: FetchStrategy::default(),
        }
    }
}

/// Tileset description handed to the visualization host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TilesetInfo {
    pub tile_size: u64,
    pub bins_per_dimension: u64,
    pub max_zoom: u32,
    pub max_width: u64,
    pub min_pos: [u64; 1],
    pub max_pos: [u64; 1],
}

impl TilesetInfo {
    /// Derive tileset info for a genome of the index's total length
    pub fn from_index(index: &ChromosomeIndex, tile_size: u64) -> Self {
        let total_length = index.total_length();
        Self {
            tile_size,
            bins_per_dimension: tile_size,
            max_zoom: max_zoom(total_length, tile_size),
            max_width: total_length,
            min_pos: [0],
            max_pos: [total_length],
        }
    }

    /// Width in bases of one tile at `zoom`
    pub fn tile_width(&self, zoom: u32) -> f64 {
        self.max_width as f64 / 2f64.powf(f64::from(zoom))
    }
}

/// `ceil(log2(total_length / tile_size))`, never below zero
fn max_zoom(total_length: u64, tile_size: u64) -> u32 {
    if tile_size == 0 || total_length <= tile_size {
        return 0;
    }
    (total_length as f64 / tile_size as f64).log2().ceil() as u32
}

/// One tile along the single linear axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileRequest {
    pub zoom: u32,
    pub tile_index: u64,
}

impl TileRequest {
    /// Tile `tile_index` at `zoom`
    pub fn new(zoom: u32, tile_index: u64) -> Self {
        Self { zoom, tile_index }
    }
}

impl fmt::Display for TileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.zoom, self.tile_index)
    }
}

/// Error for malformed `z.x` tile ids
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid tile id '{0}': expected '<zoom>.<tile_index>'")]
pub struct TileIdError(pub String);

impl FromStr for TileRequest {
    type Err = TileIdError;

    /// Parse a `"{zoom}.{tile_index}"` id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TileIdError(s.to_string());
        let mut parts = s.split('.');
        let zoom = parts.next().and_then(|z| z.trim().parse().ok()).ok_or_else(invalid)?;
        let tile_index = parts.next().and_then(|x| x.trim().parse().ok()).ok_or_else(invalid)?;
        Ok(Self { zoom, tile_index })
    }
}

/// Fetch-ready range on one chromosome, in local coordinates `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChromosomeSubRange {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl ChromosomeSubRange {
    /// Width of the range in bases
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// True when the range covers no bases
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for ChromosomeSubRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

/// Splits tile windows into per-chromosome fetch ranges
#[derive(Debug, Clone, Copy)]
pub struct TileRangeResolver<'a> {
    index: &'a ChromosomeIndex,
    info: &'a TilesetInfo,
    max_tile_width: f64,
}

impl<'a> TileRangeResolver<'a> {
    /// Resolver using the default maximum tile width
    pub fn new(index: &'a ChromosomeIndex, info: &'a TilesetInfo) -> Self {
        Self::with_max_tile_width(index, info, MAX_TILE_WIDTH)
    }

    /// Resolver with a custom maximum tile width
    pub fn with_max_tile_width(
        index: &'a ChromosomeIndex,
        info: &'a TilesetInfo,
        max_tile_width: f64,
    ) -> Self {
        Self {
            index,
            info,
            max_tile_width,
        }
    }

    /// Absolute `[start, end)` window covered by a tile
    pub fn window(&self, tile: TileRequest) -> (f64, f64) {
        let width = self.info.tile_width(tile.zoom);
        let min_pos = self.info.min_pos[0] as f64;
        let start = min_pos + tile.tile_index as f64 * width;
        let end = min_pos + (tile.tile_index as f64 + 1.0) * width;
        (start, end)
    }

    /// Whether a tile at `zoom` is too wide to serve
    pub fn is_zoomed_out(&self, zoom: u32) -> bool {
        self.info.tile_width(zoom) > self.max_tile_width
    }

    /// Resolve a tile into sub-ranges, one per chromosome, in index order
    ///
    /// Returns an empty list when the tile is wider than the maximum tile width
    /// or lies entirely past the end of the genome.
    pub fn resolve(&self, tile: TileRequest) -> Vec<ChromosomeSubRange> {
        if self.is_zoomed_out(tile.zoom) {
            log::debug!(
                "tile {} is {} bases wide, over the {} limit",
                tile,
                self.info.tile_width(tile.zoom),
                self.max_tile_width
            );
            return Vec::new();
        }

        let (mut window_start, window_end) = self.window(tile);
        let mut ranges = Vec::new();

        for entry in self.index.entries() {
            let chrom_start = entry.cumulative_start as f64;
            let chrom_end = entry.cumulative_end() as f64;

            if !(chrom_start <= window_start && window_start < chrom_end) {
                continue;
            }

            if window_end > chrom_end {
                // window runs past this chromosome: take the rest of it and move on
                ranges.push(ChromosomeSubRange {
                    chrom: entry.name.clone(),
                    start: (window_start - chrom_start).floor() as u64,
                    end: entry.length,
                });
                window_start = chrom_end;
            } else {
                ranges.push(ChromosomeSubRange {
                    chrom: entry.name.clone(),
                    start: (window_start - chrom_start).floor() as u64,
                    end: ((window_end - chrom_start).ceil() as u64).min(entry.length),
                });
                break;
            }
        }

        log::debug!("tile {} resolved to {} sub-range(s)", tile, ranges.len());
        ranges
    }
}
