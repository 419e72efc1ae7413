//! Interfaces of the external collaborators a fetch session drives

use crate::core::{FetchError, ParseError, SizesRow};
use std::future::Future;

/// Supplies the raw rows of a chromosome sizes table
pub trait ChromSizesSource: Send + Sync {
    /// Load all rows in table order.
    ///
    /// `Ok(None)` signals that the table does not exist, which leaves the
    /// session not ready rather than failing it.
    fn load_rows(&self) -> impl Future<Output = Result<Option<Vec<SizesRow>>, FetchError>> + Send;
}

/// Random access to variant lines by chromosome-local range
pub trait IndexedVariantReader: Send + Sync {
    /// The stored header blob
    fn header(&self) -> impl Future<Output = Result<String, FetchError>> + Send;

    /// Yield every raw record line overlapping `[start, end)` on `chrom`
    fn lines(
        &self,
        chrom: &str,
        start: u64,
        end: u64,
        on_line: &mut (dyn FnMut(String) + Send),
    ) -> impl Future<Output = Result<(), FetchError>> + Send;

    /// Chromosome names and lengths known to the reader, in no particular order.
    /// Used to infer an index when no sizes table is available.
    fn contig_lengths(&self) -> impl Future<Output = Result<Vec<(String, u64)>, FetchError>> + Send {
        async { Ok(Vec::new()) }
    }
}

/// Turns a header blob and raw lines into structured records
pub trait VariantParser: Send + Sync {
    type Header: Send + Sync;
    type Record: Send;

    fn parse_header(&self, blob: &str) -> Result<Self::Header, ParseError>;

    fn parse_line(&self, header: &Self::Header, line: &str) -> Result<Self::Record, ParseError>;
}
