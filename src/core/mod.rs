//! Core coordinate functionality
//!
//! This module contains the chromosome ordering, the cumulative-offset
//! chromosome index, and the tile-to-range resolution algorithm.

mod chrom_order;
mod error;
mod index;
pub mod io;
mod tiles;

pub use chrom_order::{natural_cmp, sort_chromosomes};
pub use error::{
    FetchError, IndexError, IndexResult, ParseError, Result, TileError, TileResult,
    VcfTilesetError,
};
pub use index::{ChromosomeEntry, ChromosomeIndex, RelativePosition, SizesRow, MAX_GENOME_LENGTH};
pub use io::{detect_compression, open_text, read_text, CompressionFormat};
pub use tiles::{
    ChromosomeSubRange, FetchStrategy, TileIdError, TileRangeResolver, TileRequest,
    TilesetConfig, TilesetInfo, DEFAULT_TILE_SIZE, MAX_TILE_WIDTH,
};
