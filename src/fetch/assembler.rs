//! Per-tile record assembly
//!
//! Fetches every sub-range of a tile from the variant reader, parses the lines
//! with the cached header, and concatenates the records in chromosome order.
//! Records are neither sorted, deduplicated nor filtered; a single failed
//! sub-range fails the whole tile.

use crate::core::{ChromosomeSubRange, FetchStrategy, TileError, TileResult};
use crate::fetch::cancel::CancelToken;
use crate::fetch::source::{IndexedVariantReader, VariantParser};
use futures::future::try_join_all;

/// Fetches and parses the sub-ranges of one tile against a parsed header
pub struct TileAssembler<'a, R, P: VariantParser> {
    reader: &'a R,
    parser: &'a P,
    header: &'a P::Header,
    strategy: FetchStrategy,
}

impl<'a, R, P> TileAssembler<'a, R, P>
where
    R: IndexedVariantReader,
    P: VariantParser,
{
    /// Borrow the collaborators for one tile
    pub fn new(reader: &'a R, parser: &'a P, header: &'a P::Header, strategy: FetchStrategy) -> Self {
        Self {
            reader,
            parser,
            header,
            strategy,
        }
    }

    /// Fetch and parse all `ranges`, returning records in range order
    pub async fn assemble(
        &self,
        ranges: &[ChromosomeSubRange],
        cancel: &CancelToken,
    ) -> TileResult<Vec<P::Record>> {
        if cancel.is_cancelled() {
            return Err(TileError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TileError::Cancelled),
            result = self.fetch_all(ranges) => result,
        }
    }

    async fn fetch_all(&self, ranges: &[ChromosomeSubRange]) -> TileResult<Vec<P::Record>> {
        match self.strategy {
            FetchStrategy::Sequential => {
                let mut records = Vec::new();
                for range in ranges {
                    records.extend(self.fetch_range(range).await?);
                }
                Ok(records)
            }
            FetchStrategy::Concurrent => {
                // try_join_all keeps input order
                let parts = try_join_all(ranges.iter().map(|range| self.fetch_range(range))).await?;
                Ok(parts.into_iter().flatten().collect())
            }
        }
    }

    async fn fetch_range(&self, range: &ChromosomeSubRange) -> TileResult<Vec<P::Record>> {
        let mut lines = Vec::new();
        self.reader
            .lines(&range.chrom, range.start, range.end, &mut |line: String| lines.push(line))
            .await
            .map_err(|source| TileError::UpstreamFetchFailure {
                chrom: range.chrom.clone(),
                start: range.start,
                end: range.end,
                source,
            })?;

        log::debug!("fetched {} line(s) for {}", lines.len(), range);

        lines
            .iter()
            .map(|line| self.parser.parse_line(self.header, line).map_err(TileError::from))
            .collect()
    }
}
