//! Fetch session: the tileset query surface exposed to a visualization host
//!
//! A session owns its collaborators and, once initialised, an immutable
//! chromosome index, the derived tileset info, and the parsed variant header.
//! Initialisation happens at most once; every tile request after that only
//! reads the shared state, so distinct tiles can be fetched in parallel.

use crate::core::{
    ChromosomeIndex, ChromosomeSubRange, TileError, TileRangeResolver, TileRequest, TileResult,
    TilesetConfig, TilesetInfo,
};
use crate::fetch::assembler::TileAssembler;
use crate::fetch::cancel::CancelToken;
use crate::fetch::source::{ChromSizesSource, IndexedVariantReader, VariantParser};
use futures::future::join_all;
use tokio::sync::OnceCell;

struct SessionState<H> {
    index: ChromosomeIndex,
    info: TilesetInfo,
    header: H,
}

/// Tileset query surface over one sizes source, variant reader and parser
pub struct FetchSession<S, R, P: VariantParser> {
    sizes: S,
    reader: R,
    parser: P,
    config: TilesetConfig,
    /// `Some(None)` once initialised without any chromosome sizes
    state: OnceCell<Option<SessionState<P::Header>>>,
}

impl<S, R, P> FetchSession<S, R, P>
where
    S: ChromSizesSource,
    R: IndexedVariantReader,
    P: VariantParser,
{
    /// Session with the default configuration
    pub fn new(sizes: S, reader: R, parser: P) -> Self {
        Self::with_config(sizes, reader, parser, TilesetConfig::default())
    }

    /// Session with an explicit configuration
    pub fn with_config(sizes: S, reader: R, parser: P, config: TilesetConfig) -> Self {
        Self {
            sizes,
            reader,
            parser,
            config,
            state: OnceCell::new(),
        }
    }

    /// Configuration in effect
    pub fn config(&self) -> &TilesetConfig {
        &self.config
    }

    /// Whether initialisation has completed with a usable chromosome index
    pub fn is_ready(&self) -> bool {
        matches!(self.state.get(), Some(Some(_)))
    }

    /// Tileset info, computed on first call and cached for the session.
    ///
    /// `Ok(None)` means no chromosome sizes are available; the session stays
    /// not ready.
    pub async fn compute_tileset_info(&self) -> TileResult<Option<TilesetInfo>> {
        Ok(self.state().await?.map(|state| state.info.clone()))
    }

    /// The session's chromosome index, initialising if needed
    pub async fn index(&self) -> TileResult<Option<&ChromosomeIndex>> {
        Ok(self.state().await?.map(|state| &state.index))
    }

    /// Per-chromosome fetch ranges for one tile, without fetching
    pub async fn resolve_tile(&self, tile: TileRequest) -> TileResult<Vec<ChromosomeSubRange>> {
        let state = self.ready_state().await?;
        Ok(self.resolver(state).resolve(tile))
    }

    /// Fetch all variant records of one tile
    pub async fn fetch_tile(&self, tile: TileRequest) -> TileResult<Vec<P::Record>> {
        self.fetch_tile_with_cancel(tile, &CancelToken::never()).await
    }

    /// Fetch one tile, giving up with [`TileError::Cancelled`] once `cancel` fires
    pub async fn fetch_tile_with_cancel(
        &self,
        tile: TileRequest,
        cancel: &CancelToken,
    ) -> TileResult<Vec<P::Record>> {
        let state = self.ready_state().await?;
        let ranges = self.resolver(state).resolve(tile);
        if ranges.is_empty() {
            return Ok(Vec::new());
        }

        let assembler = TileAssembler::new(
            &self.reader,
            &self.parser,
            &state.header,
            self.config.fetch_strategy,
        );
        let records = assembler.assemble(&ranges, cancel).await?;
        log::debug!("tile {} assembled {} record(s)", tile, records.len());
        Ok(records)
    }

    /// Fetch a batch of `"{zoom}.{tile_index}"` tiles concurrently
    ///
    /// Ids that do not parse are skipped with a warning. Results are returned
    /// in input order.
    pub async fn fetch_tiles<I, T>(&self, tile_ids: I) -> Vec<(TileRequest, TileResult<Vec<P::Record>>)>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut tiles = Vec::new();
        for id in tile_ids {
            match id.as_ref().parse::<TileRequest>() {
                Ok(tile) => tiles.push(tile),
                Err(e) => log::warn!("{}", e),
            }
        }

        let results = join_all(tiles.iter().map(|&tile| self.fetch_tile(tile))).await;
        tiles.into_iter().zip(results).collect()
    }

    fn resolver<'s>(&self, state: &'s SessionState<P::Header>) -> TileRangeResolver<'s> {
        TileRangeResolver::with_max_tile_width(&state.index, &state.info, self.config.max_tile_width)
    }

    async fn ready_state(&self) -> TileResult<&SessionState<P::Header>> {
        self.state().await?.ok_or(TileError::NotReady)
    }

    async fn state(&self) -> TileResult<Option<&SessionState<P::Header>>> {
        self.state
            .get_or_try_init(|| self.initialize())
            .await
            .map(Option::as_ref)
    }

    async fn initialize(&self) -> TileResult<Option<SessionState<P::Header>>> {
        let Some(index) = self.load_index().await? else {
            log::warn!("no chromosome sizes available; tileset is not ready");
            return Ok(None);
        };

        let blob = self
            .reader
            .header()
            .await
            .map_err(TileError::HeaderFetchFailure)?;
        let header = self.parser.parse_header(&blob)?;
        let info = TilesetInfo::from_index(&index, self.config.tile_size);

        log::info!(
            "tileset ready: {} chromosome(s), {} bases, max zoom {}",
            index.len(),
            index.total_length(),
            info.max_zoom
        );

        Ok(Some(SessionState {
            index,
            info,
            header,
        }))
    }

    /// Sizes table in its own order, or else the reader's contigs in natural order
    async fn load_index(&self) -> TileResult<Option<ChromosomeIndex>> {
        let rows = self
            .sizes
            .load_rows()
            .await
            .map_err(TileError::SizesFetchFailure)?;
        if let Some(rows) = rows {
            return Ok(Some(ChromosomeIndex::from_sizes_rows(&rows)?));
        }

        let contigs = self
            .reader
            .contig_lengths()
            .await
            .map_err(TileError::HeaderFetchFailure)?;
        if contigs.is_empty() {
            return Ok(None);
        }
        log::info!("inferring chromosome order from {} reader contig(s)", contigs.len());
        Ok(Some(ChromosomeIndex::from_unordered(contigs)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FetchError, IndexError, ParseError, SizesRow};
    use crate::fetch::cancel::CancelHandle;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingSizes {
        rows: Option<Vec<SizesRow>>,
        loads: AtomicUsize,
    }

    impl CountingSizes {
        fn new(rows: Option<Vec<(&str, &str)>>) -> Self {
            Self {
                rows: rows.map(|r| r.into_iter().map(|(n, l)| SizesRow::new(n, l)).collect()),
                loads: AtomicUsize::new(0),
            }
        }
    }

    impl ChromSizesSource for CountingSizes {
        async fn load_rows(&self) -> Result<Option<Vec<SizesRow>>, FetchError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.clone())
        }
    }

    /// Serves one line per 100 bases of every requested range
    #[derive(Default)]
    struct GridReader {
        contigs: Vec<(String, u64)>,
        requests: Mutex<Vec<(String, u64, u64)>>,
    }

    impl IndexedVariantReader for GridReader {
        async fn header(&self) -> Result<String, FetchError> {
            Ok("##grid".to_string())
        }

        async fn lines(
            &self,
            chrom: &str,
            start: u64,
            end: u64,
            on_line: &mut (dyn FnMut(String) + Send),
        ) -> Result<(), FetchError> {
            self.requests.lock().unwrap().push((chrom.to_string(), start, end));
            let first = start.div_ceil(100) * 100;
            for pos in (first..end).step_by(100) {
                on_line(format!("{}\t{}", chrom, pos));
            }
            Ok(())
        }

        async fn contig_lengths(&self) -> Result<Vec<(String, u64)>, FetchError> {
            Ok(self.contigs.clone())
        }
    }

    struct PairParser;

    impl VariantParser for PairParser {
        type Header = String;
        type Record = (String, u64);

        fn parse_header(&self, blob: &str) -> Result<String, ParseError> {
            Ok(blob.to_string())
        }

        fn parse_line(&self, header: &String, line: &str) -> Result<(String, u64), ParseError> {
            assert_eq!(header, "##grid");
            let (chrom, pos) = line.split_once('\t').ok_or(ParseError::TooFewFields {
                expected: 2,
                found: 1,
            })?;
            let pos = pos
                .parse()
                .map_err(|_| ParseError::InvalidNumber("POS", pos.to_string()))?;
            Ok((chrom.to_string(), pos))
        }
    }

    fn two_chrom_session() -> FetchSession<CountingSizes, GridReader, PairParser> {
        FetchSession::new(
            CountingSizes::new(Some(vec![("chr1", "1000"), ("chr2", "2000")])),
            GridReader::default(),
            PairParser,
        )
    }

    #[tokio::test]
    async fn test_tileset_info() {
        let session = two_chrom_session();
        assert!(!session.is_ready());

        let info = session.compute_tileset_info().await.unwrap().unwrap();
        assert_eq!(info.max_width, 3000);
        assert_eq!(info.max_zoom, 2);
        assert_eq!(info.tile_size, 1024);
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_tileset_info_is_cached() {
        let session = two_chrom_session();
        let first = session.compute_tileset_info().await.unwrap();
        let second = session.compute_tileset_info().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(session.sizes.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_whole_genome_tile() {
        let session = two_chrom_session();
        let records = session.fetch_tile(TileRequest::new(0, 0)).await.unwrap();

        assert_eq!(records.len(), 30);
        assert_eq!(records[0], ("chr1".to_string(), 0));
        assert_eq!(records[9], ("chr1".to_string(), 900));
        assert_eq!(records[10], ("chr2".to_string(), 0));
        assert_eq!(records[29], ("chr2".to_string(), 1900));

        let requests = session.reader.requests.lock().unwrap().clone();
        assert_eq!(
            requests,
            vec![("chr1".to_string(), 0, 1000), ("chr2".to_string(), 0, 2000)]
        );
    }

    #[tokio::test]
    async fn test_zoomed_out_tile_is_empty() {
        let config = TilesetConfig {
            max_tile_width: 1000.0,
            ..TilesetConfig::default()
        };
        let session = FetchSession::with_config(
            CountingSizes::new(Some(vec![("chr1", "1000"), ("chr2", "2000")])),
            GridReader::default(),
            PairParser,
            config,
        );

        assert!(session.fetch_tile(TileRequest::new(0, 0)).await.unwrap().is_empty());
        assert!(session.reader.requests.lock().unwrap().is_empty());
        assert_eq!(session.fetch_tile(TileRequest::new(2, 0)).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_missing_sizes_not_ready() {
        let session = FetchSession::new(CountingSizes::new(None), GridReader::default(), PairParser);

        assert_eq!(session.compute_tileset_info().await.unwrap(), None);
        assert!(!session.is_ready());
        assert!(matches!(
            session.fetch_tile(TileRequest::new(0, 0)).await,
            Err(TileError::NotReady)
        ));
        // absence is cached too
        assert_eq!(session.sizes.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_reader_contigs() {
        let reader = GridReader {
            contigs: vec![
                ("chrX".to_string(), 300),
                ("chr10".to_string(), 200),
                ("chr2".to_string(), 100),
            ],
            ..Default::default()
        };
        let session = FetchSession::new(CountingSizes::new(None), reader, PairParser);

        let index = session.index().await.unwrap().unwrap();
        let names: Vec<&str> = index.chrom_names().collect();
        assert_eq!(names, vec!["chr2", "chr10", "chrX"]);
        assert_eq!(index.total_length(), 600);
    }

    #[tokio::test]
    async fn test_invalid_sizes_surface() {
        let session = FetchSession::new(
            CountingSizes::new(Some(vec![("chr1", "abc")])),
            GridReader::default(),
            PairParser,
        );

        let err = session.compute_tileset_info().await.unwrap_err();
        assert!(matches!(
            err,
            TileError::Index(IndexError::InvalidSizesData { line: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_tile() {
        let session = two_chrom_session();
        let ranges = session.resolve_tile(TileRequest::new(2, 1)).await.unwrap();
        let spans: Vec<String> = ranges.iter().map(|r| r.to_string()).collect();
        assert_eq!(spans, vec!["chr1:750-1000", "chr2:0-500"]);
    }

    #[tokio::test]
    async fn test_fetch_tiles_batch() {
        let session = two_chrom_session();
        let results = session.fetch_tiles(["2.0", "bogus", "2.1"]).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, TileRequest::new(2, 0));
        assert_eq!(results[1].0, TileRequest::new(2, 1));
        assert_eq!(results[0].1.as_ref().unwrap().len(), 8);
        // [750, 1000) on chr1 and [0, 500) on chr2
        assert_eq!(results[1].1.as_ref().unwrap().len(), 2 + 5);
    }

    #[tokio::test]
    async fn test_cancelled_tile() {
        let session = two_chrom_session();
        let handle = CancelHandle::new();
        handle.cancel();

        let result = session
            .fetch_tile_with_cancel(TileRequest::new(0, 0), &handle.token())
            .await;
        assert!(matches!(result, Err(TileError::Cancelled)));
    }
}
