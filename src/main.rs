//! vcf-tileset CLI entry point
//!
//! Inspect tilesets and fetch variant tiles from a local VCF.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use vcf_tileset::core::{ChromosomeIndex, DEFAULT_TILE_SIZE, MAX_TILE_WIDTH};
use vcf_tileset::formats::load_index_file;
use vcf_tileset::{
    FetchSession, FetchStrategy, FileChromSizes, LocalVcfReader, TileRangeResolver, TileRequest,
    TilesetConfig, TilesetInfo, VcfLineParser, VcfRecord,
};

#[derive(Parser)]
#[command(name = "vcf-tileset")]
#[command(about = "Tile-based variant fetching over a flattened genome coordinate space")]
#[command(version)]
struct Cli {
    /// Tile size (also bins per dimension)
    #[arg(long = "tile-size", global = true, default_value_t = DEFAULT_TILE_SIZE)]
    tile_size: u64,

    /// Widest tile window served, in bases
    #[arg(long = "max-tile-width", global = true, default_value_t = MAX_TILE_WIDTH)]
    max_tile_width: f64,

    /// Fetch the sub-ranges of a tile one at a time instead of concurrently
    #[arg(long, global = true)]
    sequential: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print tileset info as JSON
    Info {
        /// Chromosome sizes file (name<TAB>length)
        #[arg(short = 'c', long)]
        chromsizes: PathBuf,
        /// VCF file (plain, gzip or bzip2)
        #[arg(short = 'v', long)]
        vcf: PathBuf,
    },
    /// Print the per-chromosome fetch ranges of one tile
    Ranges {
        /// Chromosome sizes file (name<TAB>length)
        #[arg(short = 'c', long)]
        chromsizes: PathBuf,
        /// Zoom level
        zoom: u32,
        /// Tile index at that zoom level
        tile_index: u64,
    },
    /// Fetch tiles and print one JSON object per tile
    Tile {
        /// Chromosome sizes file (name<TAB>length)
        #[arg(short = 'c', long)]
        chromsizes: PathBuf,
        /// VCF file (plain, gzip or bzip2)
        #[arg(short = 'v', long)]
        vcf: PathBuf,
        /// Tile ids as <zoom>.<tile_index>
        #[arg(required = true)]
        tiles: Vec<String>,
    },
    /// Convert an absolute genome position to chromosome coordinates
    Locate {
        /// Chromosome sizes file (name<TAB>length)
        #[arg(short = 'c', long)]
        chromsizes: PathBuf,
        /// Absolute position (may be negative)
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },
}

#[derive(Serialize)]
struct TileOutput<'a> {
    tile: String,
    records: &'a [VcfRecord],
}

#[derive(Serialize)]
struct LocateOutput<'a> {
    chrom: &'a str,
    offset: u64,
    out_of_bounds: i64,
    entry_index: usize,
}

impl Cli {
    fn config(&self) -> TilesetConfig {
        TilesetConfig {
            tile_size: self.tile_size,
            max_tile_width: self.max_tile_width,
            fetch_strategy: if self.sequential {
                FetchStrategy::Sequential
            } else {
                FetchStrategy::Concurrent
            },
        }
    }
}

fn load_index(path: &Path) -> anyhow::Result<ChromosomeIndex> {
    load_index_file(path)
        .with_context(|| format!("Failed to load chromosome sizes: {:?}", path))?
        .with_context(|| format!("Chromosome sizes not found: {:?}", path))
}

fn open_session(
    chromsizes: &Path,
    vcf: &Path,
    config: TilesetConfig,
) -> anyhow::Result<FetchSession<FileChromSizes, LocalVcfReader, VcfLineParser>> {
    let start = Instant::now();
    eprintln!("Loading VCF file: {:?}", vcf);

    let reader = LocalVcfReader::open(vcf)
        .with_context(|| format!("Failed to load VCF file: {:?}", vcf))?;
    eprintln!(
        "Loaded {} records in {:.2}s",
        reader.record_count(),
        start.elapsed().as_secs_f64()
    );

    Ok(FetchSession::with_config(
        FileChromSizes::new(chromsizes),
        reader,
        VcfLineParser,
        config,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.config();
    let start = Instant::now();

    match &cli.command {
        Commands::Info { chromsizes, vcf } => {
            let session = open_session(chromsizes, vcf, config)?;
            let info = session
                .compute_tileset_info()
                .await?
                .with_context(|| format!("Chromosome sizes not found: {:?}", chromsizes))?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Ranges {
            chromsizes,
            zoom,
            tile_index,
        } => {
            let index = load_index(chromsizes)?;
            let info = TilesetInfo::from_index(&index, config.tile_size);
            let resolver =
                TileRangeResolver::with_max_tile_width(&index, &info, config.max_tile_width);
            let tile = TileRequest::new(*zoom, *tile_index);

            if resolver.is_zoomed_out(*zoom) {
                eprintln!(
                    "Tile {} is {:.0} bases wide; zoom in past {:.0} bases to fetch records",
                    tile,
                    info.tile_width(*zoom),
                    config.max_tile_width
                );
            }
            let ranges = resolver.resolve(tile);
            println!("{}", serde_json::to_string_pretty(&ranges)?);
        }

        Commands::Tile {
            chromsizes,
            vcf,
            tiles,
        } => {
            let session = open_session(chromsizes, vcf, config)?;
            let results = session.fetch_tiles(tiles).await;

            let mut failed = 0usize;
            let mut total_records = 0usize;
            for (tile, result) in &results {
                match result {
                    Ok(records) => {
                        total_records += records.len();
                        let output = TileOutput {
                            tile: tile.to_string(),
                            records,
                        };
                        println!("{}", serde_json::to_string(&output)?);
                    }
                    Err(e) => {
                        failed += 1;
                        eprintln!("Tile {} failed: {}", tile, e);
                    }
                }
            }

            eprintln!("\n=== Tile Statistics ===");
            eprintln!("Requested:       {}", tiles.len());
            eprintln!("Fetched:         {}", results.len() - failed);
            eprintln!("Failed:          {}", failed);
            eprintln!("Records:         {}", total_records);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());

            if failed > 0 {
                anyhow::bail!("{} tile(s) failed", failed);
            }
        }

        Commands::Locate {
            chromsizes,
            position,
        } => {
            let index = load_index(chromsizes)?;
            let rel = index.to_relative(*position)?;
            let output = LocateOutput {
                chrom: rel.chrom,
                offset: rel.offset,
                out_of_bounds: rel.out_of_bounds,
                entry_index: rel.entry_index,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
