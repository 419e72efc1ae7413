//! vcf-tileset - tile-based variant fetching over a flattened genome
//!
//! Maps between per-chromosome `(name, offset)` coordinates and a single
//! absolute genome coordinate, and resolves `(zoom, tile_index)` tile requests
//! into per-chromosome fetch ranges against an indexed variant source.
//!
//! # Features
//!
//! - Cumulative-offset chromosome index with clamped absolute-to-relative lookup
//! - Natural chromosome ordering when no sizes table is given
//! - Tile-to-range resolution split at chromosome boundaries
//! - Cancellable, order-preserving tile assembly over async collaborators
//!
//! # Example
//!
//! ```ignore
//! use vcf_tileset::{FetchSession, FileChromSizes, LocalVcfReader, TileRequest, VcfLineParser};
//!
//! let session = FetchSession::new(
//!     FileChromSizes::new("hg38.chrom.sizes"),
//!     LocalVcfReader::open("calls.vcf.gz")?,
//!     VcfLineParser,
//! );
//!
//! let info = session.compute_tileset_info().await?;
//! let records = session.fetch_tile(TileRequest::new(14, 2031)).await?;
//! ```

pub mod core;
pub mod fetch;
pub mod formats;

// Re-export commonly used types
pub use crate::core::{
    natural_cmp, ChromosomeEntry, ChromosomeIndex, ChromosomeSubRange, FetchError, FetchStrategy,
    IndexError, ParseError, RelativePosition, SizesRow, TileError, TileRangeResolver,
    TileRequest, TilesetConfig, TilesetInfo, VcfTilesetError,
};
pub use crate::fetch::{
    CancelHandle, CancelToken, ChromSizesSource, FetchSession, IndexedVariantReader,
    VariantParser,
};
pub use crate::formats::{FileChromSizes, InMemoryChromSizes, LocalVcfReader, VcfLineParser, VcfRecord};
