//! Concrete collaborators
//!
//! Adapters for chromosome sizes tables and local VCF files.

pub mod chromsizes;
pub mod vcf;

pub use chromsizes::{
    load_index_file, parse_sizes_text, read_sizes_file, FileChromSizes, InMemoryChromSizes,
};
pub use vcf::{LocalVcfReader, SampleCall, VariantType, VcfHeader, VcfLineParser, VcfRecord};
