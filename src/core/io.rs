//! Text input for sizes tables and VCF files
//!
//! Opens plain, gzip or bzip2 text transparently. Large plain files are
//! memory-mapped instead of read through a buffer.

use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Default buffer size for BufReader (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Threshold for using memory mapping (100MB)
pub const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Compression format of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Plain text (uncompressed)
    Plain,
    /// Gzip / BGZF compressed (.gz)
    Gzip,
    /// Bzip2 compressed (.bz2)
    Bzip2,
}

/// Detect compression format from file extension, then magic bytes
pub fn detect_compression(path: &Path) -> io::Result<CompressionFormat> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    if extension == "gz" || extension == "bgz" {
        return Ok(CompressionFormat::Gzip);
    }
    if extension == "bz2" {
        return Ok(CompressionFormat::Bzip2);
    }

    let mut file = File::open(path)?;
    let mut magic = [0u8; 3];
    let bytes_read = file.read(&mut magic)?;

    Ok(compression_from_magic(&magic[..bytes_read]))
}

fn compression_from_magic(magic: &[u8]) -> CompressionFormat {
    if magic.len() >= 2 && magic[0] == 0x1f && magic[1] == 0x8b {
        CompressionFormat::Gzip
    } else if magic.len() >= 3 && magic[..3] == [0x42, 0x5a, 0x68] {
        // "BZh"
        CompressionFormat::Bzip2
    } else {
        CompressionFormat::Plain
    }
}

/// Memory-mapped file reader
pub struct MappedReader {
    mmap: Mmap,
    position: usize,
}

impl MappedReader {
    /// Create a new memory-mapped reader
    pub fn new(file: &File) -> io::Result<Self> {
        // SAFETY: We assume the file won't be modified while mapped
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap, position: 0 })
    }
}

impl Read for MappedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.mmap[self.position..];
        let to_read = std::cmp::min(buf.len(), remaining.len());
        buf[..to_read].copy_from_slice(&remaining[..to_read]);
        self.position += to_read;
        Ok(to_read)
    }
}

impl BufRead for MappedReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(&self.mmap[self.position..])
    }

    fn consume(&mut self, amt: usize) {
        self.position = std::cmp::min(self.position + amt, self.mmap.len());
    }
}

/// Open a text file for line reading, decompressing if needed
pub fn open_text<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    let format = detect_compression(path)?;
    let file = File::open(path)?;

    Ok(match format {
        CompressionFormat::Gzip => Box::new(BufReader::with_capacity(
            DEFAULT_BUFFER_SIZE,
            flate2::read::MultiGzDecoder::new(file),
        )),
        CompressionFormat::Bzip2 => Box::new(BufReader::with_capacity(
            DEFAULT_BUFFER_SIZE,
            bzip2::read::BzDecoder::new(file),
        )),
        CompressionFormat::Plain => {
            if file.metadata()?.len() >= MMAP_THRESHOLD {
                Box::new(MappedReader::new(&file)?)
            } else {
                Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))
            }
        }
    })
}

/// Read a whole (possibly compressed) text file into a string
pub fn read_text<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut reader = open_text(path)?;
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(text)
}
