//! Error types for vcf-tileset
//!
//! Defines all error types used throughout the library.

use thiserror::Error;

/// Main error type for vcf-tileset operations
#[derive(Debug, Error)]
pub enum VcfTilesetError {
    /// Chromosome index construction or lookup errors
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Upstream collaborator errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Variant record parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Tile request errors
    #[error("Tile error: {0}")]
    Tile(#[from] TileError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building or querying a [`ChromosomeIndex`](crate::core::ChromosomeIndex)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A sizes row is malformed or carries a non-numeric / negative length
    #[error("Invalid chromosome sizes data at row {line}: {message}")]
    InvalidSizesData { line: usize, message: String },

    /// The same chromosome name appears twice
    #[error("Duplicate chromosome in sizes data: {0}")]
    DuplicateChromosome(String),

    /// Coordinate conversion requested for a chromosome absent from the index
    #[error("Unknown chromosome: {0}")]
    UnknownChromosome(String),

    /// Conversion attempted on an index with no entries
    #[error("Chromosome index is empty")]
    EmptyIndex,

    /// Offset would place the position past the addressable range
    #[error("Offset {offset} on {chrom} is out of range")]
    OffsetOutOfRange { chrom: String, offset: u64 },
}

/// Errors reported by the external collaborators (sizes source, variant reader)
#[derive(Debug, Error)]
pub enum FetchError {
    /// Malformed upstream data
    #[error("Malformed input at line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// Any other upstream failure
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while parsing a variant header or record line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Empty line
    #[error("Empty line")]
    EmptyLine,

    /// Too few tab-separated fields
    #[error("Too few fields: expected at least {expected}, found {found}")]
    TooFewFields { expected: usize, found: usize },

    /// Numeric field could not be parsed
    #[error("Invalid number in {0}: '{1}'")]
    InvalidNumber(&'static str, String),

    /// Header blob is unusable
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Errors that fail a whole tile request
#[derive(Debug, Error)]
pub enum TileError {
    /// Structural problem with the chromosome index
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The sizes source could not be read
    #[error("Failed to load chromosome sizes: {0}")]
    SizesFetchFailure(#[source] FetchError),

    /// The variant reader could not return its header
    #[error("Failed to fetch variant header: {0}")]
    HeaderFetchFailure(#[source] FetchError),

    /// The variant reader failed for one sub-range; no partial tile is returned
    #[error("Upstream fetch failed for {chrom}:{start}-{end}: {source}")]
    UpstreamFetchFailure {
        chrom: String,
        start: u64,
        end: u64,
        #[source]
        source: FetchError,
    },

    /// A fetched line or the header blob could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The tile request was superseded before it completed
    #[error("Tile request cancelled")]
    Cancelled,

    /// No chromosome sizes are available for this session
    #[error("Tileset is not ready: no chromosome sizes available")]
    NotReady,
}

/// Result type alias for vcf-tileset operations
pub type Result<T> = std::result::Result<T, VcfTilesetError>;

/// Result type alias for index operations
pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// Result type alias for tile operations
pub type TileResult<T> = std::result::Result<T, TileError>;
