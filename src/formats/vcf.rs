//! VCF collaborators
//!
//! [`VcfLineParser`] turns header blobs and record lines into [`VcfRecord`]s.
//! [`LocalVcfReader`] serves record lines from a local VCF by overlap query.

use crate::core::{open_text, FetchError, ParseError};
use crate::fetch::{IndexedVariantReader, VariantParser};
use memchr::memchr_iter;
use rust_lapper::{Interval, Lapper};
use serde::Serialize;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// VCF requires at least 8 fields (CHROM, POS, ID, REF, ALT, QUAL, FILTER, INFO)
const MIN_FIELDS: usize = 8;

/// Split a line on tabs
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::with_capacity(10);
    let mut start = 0;
    for tab in memchr_iter(b'\t', line.as_bytes()) {
        fields.push(&line[start..tab]);
        start = tab + 1;
    }
    fields.push(&line[start..]);
    fields
}

/// `.` means missing in most VCF columns
fn non_missing(value: &str) -> Option<&str> {
    if value.is_empty() || value == "." {
        None
    } else {
        Some(value)
    }
}

/// Parse a `##contig=<ID=chr1,length=248956422,...>` line
pub fn parse_contig_line(line: &str) -> Option<(String, u64)> {
    let body = line.strip_prefix("##contig=<")?.strip_suffix('>')?;
    let mut id = None;
    let mut length = None;
    for item in body.split(',') {
        match item.split_once('=') {
            Some(("ID", value)) => id = Some(value.to_string()),
            Some(("length", value)) => length = value.parse().ok(),
            _ => {}
        }
    }
    Some((id?, length?))
}

/// Parsed VCF header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcfHeader {
    /// `##` meta-information lines, verbatim
    pub meta: Vec<String>,
    /// Sample names from the `#CHROM` line
    pub samples: Vec<String>,
    /// Declared contigs with lengths, in header order
    pub contigs: Vec<(String, u64)>,
}

impl VcfHeader {
    /// Parse the `##` meta lines and the `#CHROM` column line
    pub fn parse(blob: &str) -> Result<Self, ParseError> {
        let mut header = VcfHeader::default();

        for line in blob.lines() {
            if line.starts_with("##") {
                if let Some(contig) = parse_contig_line(line) {
                    header.contigs.push(contig);
                }
                header.meta.push(line.to_string());
            } else if line.starts_with("#CHROM") {
                let fields = split_fields(line);
                if fields.len() < MIN_FIELDS {
                    return Err(ParseError::InvalidHeader(format!(
                        "#CHROM line has {} columns, expected at least {}",
                        fields.len(),
                        MIN_FIELDS
                    )));
                }
                header.samples = fields.iter().skip(9).map(|s| s.to_string()).collect();
            } else if !line.trim().is_empty() {
                return Err(ParseError::InvalidHeader(format!(
                    "unexpected non-header line '{}'",
                    line
                )));
            }
        }

        Ok(header)
    }
}

/// Variant type based on REF and first ALT lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VariantType {
    Substitution,
    Insertion,
    Deletion,
}

/// Genotype columns of one sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleCall {
    pub name: String,
    /// Values in FORMAT key order
    pub values: Vec<String>,
}

/// A parsed VCF data line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VcfRecord {
    pub chrom: String,
    /// 1-based position
    pub pos: u64,
    pub id: Option<String>,
    pub ref_allele: String,
    pub alt_alleles: Vec<String>,
    pub qual: Option<f64>,
    pub filters: Vec<String>,
    /// INFO entries in file order; flags have no value
    pub info: Vec<(String, Option<String>)>,
    pub format: Vec<String>,
    pub samples: Vec<SampleCall>,
}

impl VcfRecord {
    /// 0-based start of the reference span
    pub fn start(&self) -> u64 {
        self.pos.saturating_sub(1)
    }

    /// 0-based exclusive end of the reference span
    pub fn end(&self) -> u64 {
        self.start() + (self.ref_allele.len() as u64).max(1)
    }

    /// Look up an INFO entry. Flags yield `Some(None)`.
    pub fn info_value(&self, key: &str) -> Option<Option<&str>> {
        self.info
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    /// Classify the record from its REF and first ALT allele
    pub fn variant_type(&self) -> VariantType {
        let ref_len = self.ref_allele.len();
        let alt_len = self.alt_alleles.first().map(|a| a.len()).unwrap_or(0);

        if ref_len == alt_len {
            VariantType::Substitution
        } else if alt_len > ref_len {
            VariantType::Insertion
        } else {
            VariantType::Deletion
        }
    }
}

/// [`VariantParser`] for VCF text
#[derive(Debug, Clone, Copy, Default)]
pub struct VcfLineParser;

impl VariantParser for VcfLineParser {
    type Header = VcfHeader;
    type Record = VcfRecord;

    fn parse_header(&self, blob: &str) -> Result<VcfHeader, ParseError> {
        VcfHeader::parse(blob)
    }

    fn parse_line(&self, header: &VcfHeader, line: &str) -> Result<VcfRecord, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(ParseError::EmptyLine);
        }

        let fields = split_fields(line);
        if fields.len() < MIN_FIELDS {
            return Err(ParseError::TooFewFields {
                expected: MIN_FIELDS,
                found: fields.len(),
            });
        }

        let pos = fields[1]
            .parse()
            .map_err(|_| ParseError::InvalidNumber("POS", fields[1].to_string()))?;
        let qual = match non_missing(fields[5]) {
            Some(q) => Some(
                q.parse()
                    .map_err(|_| ParseError::InvalidNumber("QUAL", q.to_string()))?,
            ),
            None => None,
        };

        let info = non_missing(fields[7])
            .map(|info| {
                info.split(';')
                    .map(|item| match item.split_once('=') {
                        Some((k, v)) => (k.to_string(), Some(v.to_string())),
                        None => (item.to_string(), None),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let format: Vec<String> = fields
            .get(8)
            .and_then(|f| non_missing(f))
            .map(|f| f.split(':').map(str::to_string).collect())
            .unwrap_or_default();

        let samples = fields
            .iter()
            .skip(9)
            .enumerate()
            .map(|(i, column)| SampleCall {
                name: header
                    .samples
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("sample{}", i + 1)),
                values: column.split(':').map(str::to_string).collect(),
            })
            .collect();

        Ok(VcfRecord {
            chrom: fields[0].to_string(),
            pos,
            id: non_missing(fields[2]).map(str::to_string),
            ref_allele: fields[3].to_string(),
            alt_alleles: non_missing(fields[4])
                .map(|alt| alt.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            qual,
            filters: non_missing(fields[6])
                .map(|f| f.split(';').map(str::to_string).collect())
                .unwrap_or_default(),
            info,
            format,
            samples,
        })
    }
}

/// In-memory overlap index over a local VCF file
///
/// Each record is keyed by its 0-based half-open reference span, so a query for
/// `[start, end)` returns every record whose span overlaps it, in position order.
pub struct LocalVcfReader {
    header: String,
    contigs: Vec<(String, u64)>,
    records: HashMap<String, Lapper<u64, String>>,
    record_count: usize,
}

impl LocalVcfReader {
    /// Load a plain, gzip or bzip2 VCF
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FetchError> {
        let reader = open_text(path.as_ref())?;
        Self::from_reader(reader)
    }

    /// Read and index a whole VCF stream
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, FetchError> {
        let mut header = String::new();
        let mut contigs = Vec::new();
        let mut by_chrom: HashMap<String, Vec<Interval<u64, String>>> = HashMap::new();
        let mut record_count = 0;

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                if let Some(contig) = parse_contig_line(line) {
                    contigs.push(contig);
                }
                header.push_str(line);
                header.push('\n');
                continue;
            }

            let (chrom, start, stop) = record_span(line).ok_or_else(|| FetchError::Malformed {
                line: i + 1,
                message: "expected CHROM, POS and REF columns".to_string(),
            })?;
            by_chrom.entry(chrom.to_string()).or_default().push(Interval {
                start,
                stop,
                val: line.to_string(),
            });
            record_count += 1;
        }

        let records = by_chrom
            .into_iter()
            .map(|(chrom, intervals)| (chrom, Lapper::new(intervals)))
            .collect();

        log::debug!("loaded {} VCF record(s)", record_count);

        Ok(Self {
            header,
            contigs,
            records,
            record_count,
        })
    }

    /// Number of indexed records
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Chromosomes with at least one record
    pub fn chroms(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(|s| s.as_str())
    }
}

/// `(chrom, start, stop)` of a record line's reference span, 0-based half-open
fn record_span(line: &str) -> Option<(&str, u64, u64)> {
    let mut fields = line.splitn(5, '\t');
    let chrom = fields.next().filter(|c| !c.is_empty())?;
    let pos: u64 = fields.next()?.parse().ok()?;
    let _id = fields.next()?;
    let ref_len = fields.next()?.len().max(1) as u64;

    let start = pos.saturating_sub(1);
    Some((chrom, start, start + ref_len))
}

impl IndexedVariantReader for LocalVcfReader {
    async fn header(&self) -> Result<String, FetchError> {
        Ok(self.header.clone())
    }

    async fn lines(
        &self,
        chrom: &str,
        start: u64,
        end: u64,
        on_line: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), FetchError> {
        if let Some(lapper) = self.records.get(chrom) {
            for interval in lapper.find(start, end) {
                on_line(interval.val.clone());
            }
        }
        Ok(())
    }

    async fn contig_lengths(&self) -> Result<Vec<(String, u64)>, FetchError> {
        Ok(self.contigs.clone())
    }
}
