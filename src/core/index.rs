//! Cumulative-offset chromosome index
//!
//! Maps between chromosome-relative `(name, offset)` coordinates and a single
//! absolute coordinate over the concatenation of all chromosomes in index order.

use crate::core::chrom_order::sort_chromosomes;
use crate::core::error::{IndexError, IndexResult};
use serde::Serialize;
use std::collections::HashMap;

/// Largest total genome length an index accepts
pub const MAX_GENOME_LENGTH: u64 = i64::MAX as u64;

/// One raw row of a chromosome sizes table, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizesRow {
    /// Chromosome name (first column)
    pub name: String,
    /// Unparsed length (second column)
    pub length: String,
}

impl SizesRow {
    /// Create a row from its two columns
    pub fn new(name: impl Into<String>, length: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: length.into(),
        }
    }
}

/// A chromosome and its place in the absolute coordinate space
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChromosomeEntry {
    /// Chromosome name
    pub name: String,
    /// Absolute coordinate of the first base (0-based)
    pub cumulative_start: u64,
    /// Chromosome length in bases
    pub length: u64,
}

impl ChromosomeEntry {
    /// Absolute coordinate one past the last base
    pub fn cumulative_end(&self) -> u64 {
        self.cumulative_start + self.length
    }
}

/// Result of converting an absolute position to chromosome-relative form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativePosition<'a> {
    /// Chromosome containing (or nearest to) the position
    pub chrom: &'a str,
    /// Offset within `chrom`, clamped to the genome bounds
    pub offset: u64,
    /// Signed distance the position lies outside the genome; 0 when inside
    pub out_of_bounds: i64,
    /// Index of `chrom` in index order
    pub entry_index: usize,
}

/// Immutable chromosome index built once per fetch session
///
/// `ChromosomeIndex::default()` is the empty, not-ready index.
#[derive(Debug, Clone, Default)]
pub struct ChromosomeIndex {
    entries: Vec<ChromosomeEntry>,
    /// Chromosome name -> position in `entries`
    by_name: HashMap<String, usize>,
    total_length: u64,
}

impl ChromosomeIndex {
    /// Build an index from `(name, length)` pairs, keeping their order verbatim.
    /// At least one chromosome is required, and the total length must fit in
    /// an `i64` so every absolute position is addressable by `to_relative`.
    pub fn new<I, S>(chromosomes: I) -> IndexResult<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut entries = Vec::new();
        let mut by_name = HashMap::new();
        let mut running_total = 0u64;

        for (name, length) in chromosomes {
            let name = name.into();
            if by_name.contains_key(&name) {
                return Err(IndexError::DuplicateChromosome(name));
            }
            let line = entries.len() + 1;
            let next_total = running_total
                .checked_add(length)
                .filter(|&total| total <= MAX_GENOME_LENGTH)
                .ok_or_else(|| IndexError::InvalidSizesData {
                    line,
                    message: format!(
                        "length {} of '{}' takes the genome past {} bases",
                        length, name, MAX_GENOME_LENGTH
                    ),
                })?;
            by_name.insert(name.clone(), entries.len());
            entries.push(ChromosomeEntry {
                name,
                cumulative_start: running_total,
                length,
            });
            running_total = next_total;
        }

        if entries.is_empty() {
            return Err(IndexError::EmptyIndex);
        }

        Ok(Self {
            entries,
            by_name,
            total_length: running_total,
        })
    }

    /// Build an index from raw sizes-table rows; row order is the chromosome order
    ///
    /// # Example
    /// ```
    /// use vcf_tileset::core::{ChromosomeIndex, SizesRow};
    ///
    /// let rows = vec![SizesRow::new("chr1", "1000"), SizesRow::new("chr2", "2000")];
    /// let index = ChromosomeIndex::from_sizes_rows(&rows).unwrap();
    /// assert_eq!(index.total_length(), 3000);
    /// ```
    pub fn from_sizes_rows(rows: &[SizesRow]) -> IndexResult<Self> {
        let parsed = rows
            .iter()
            .enumerate()
            .map(|(i, row)| parse_length(&row.length, i + 1).map(|len| (row.name.clone(), len)))
            .collect::<IndexResult<Vec<_>>>()?;
        Self::new(parsed)
    }

    /// Build an index from chromosomes with no authoritative order,
    /// sorting them naturally first
    pub fn from_unordered(mut chromosomes: Vec<(String, u64)>) -> IndexResult<Self> {
        sort_chromosomes(&mut chromosomes);
        Self::new(chromosomes)
    }

    /// Absolute coordinate of `offset` on `chrom`. No bounds clamping is done.
    pub fn to_absolute(&self, chrom: &str, offset: u64) -> IndexResult<u64> {
        let entry = self
            .entry(chrom)
            .ok_or_else(|| IndexError::UnknownChromosome(chrom.to_string()))?;
        entry
            .cumulative_start
            .checked_add(offset)
            .ok_or_else(|| IndexError::OffsetOutOfRange {
                chrom: chrom.to_string(),
                offset,
            })
    }

    /// Chromosome-relative form of an absolute coordinate
    ///
    /// Positions before the genome start clamp to offset 1 on the first
    /// chromosome; positions past the end clamp to the last chromosome's length.
    /// In both cases the shortfall / excess is reported in `out_of_bounds`,
    /// saturating at `i64::MIN`.
    pub fn to_relative(&self, position: i64) -> IndexResult<RelativePosition<'_>> {
        if self.entries.is_empty() {
            return Err(IndexError::EmptyIndex);
        }

        let position = i128::from(position);
        // rightmost entry with cumulative_start <= position
        let entry_index = self
            .entries
            .partition_point(|e| i128::from(e.cumulative_start) <= position)
            .saturating_sub(1);
        let entry = &self.entries[entry_index];
        let last_index = self.entries.len() - 1;

        let mut chrom_pos = position - i128::from(entry.cumulative_start);
        let mut out_of_bounds = 0i128;

        if chrom_pos < 0 {
            // before the start of the genome
            out_of_bounds = chrom_pos - 1;
            chrom_pos = 1;
        }

        let length = i128::from(entry.length);
        if entry_index == last_index && chrom_pos > length {
            // beyond the last chromosome
            out_of_bounds = chrom_pos - length;
            chrom_pos = length;
        }

        Ok(RelativePosition {
            chrom: &entry.name,
            offset: chrom_pos as u64,
            out_of_bounds: out_of_bounds.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64,
            entry_index,
        })
    }

    /// Entries in index order
    pub fn entries(&self) -> &[ChromosomeEntry] {
        &self.entries
    }

    /// Look up a chromosome entry by name
    pub fn entry(&self, chrom: &str) -> Option<&ChromosomeEntry> {
        self.by_name.get(chrom).map(|&i| &self.entries[i])
    }

    /// Length of a chromosome
    pub fn chrom_length(&self, chrom: &str) -> Option<u64> {
        self.entry(chrom).map(|e| e.length)
    }

    /// Check if a chromosome exists in the index
    pub fn contains(&self, chrom: &str) -> bool {
        self.by_name.contains_key(chrom)
    }

    /// Chromosome names in index order
    pub fn chrom_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Sum of all chromosome lengths
    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// Number of chromosomes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for the not-ready default index
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a length column; `line` is the 1-based row number for error reporting
fn parse_length(value: &str, line: usize) -> IndexResult<u64> {
    let trimmed = value.trim();
    if trimmed.starts_with('-') {
        return Err(IndexError::InvalidSizesData {
            line,
            message: format!("negative length '{}'", trimmed),
        });
    }
    trimmed.parse::<u64>().map_err(|_| IndexError::InvalidSizesData {
        line,
        message: format!("non-numeric length '{}'", trimmed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_index() -> ChromosomeIndex {
        ChromosomeIndex::new(vec![("chr1", 1000), ("chr2", 2000), ("chr3", 500)]).unwrap()
    }

    #[test]
    fn test_index_creation() {
        let index = create_test_index();

        assert_eq!(index.len(), 3);
        assert_eq!(index.total_length(), 3500);
        assert!(index.contains("chr2"));
        assert!(!index.contains("chr4"));

        let starts: Vec<u64> = index.entries().iter().map(|e| e.cumulative_start).collect();
        assert_eq!(starts, vec![0, 1000, 3000]);
    }

    #[test]
    fn test_cumulative_invariant() {
        let index = create_test_index();
        for pair in index.entries().windows(2) {
            assert_eq!(pair[1].cumulative_start, pair[0].cumulative_end());
        }
        let last = index.entries().last().unwrap();
        assert_eq!(index.total_length(), last.cumulative_end());
    }

    #[test]
    fn test_from_sizes_rows() {
        let rows = vec![SizesRow::new("chrB", " 20 "), SizesRow::new("chrA", "10")];
        let index = ChromosomeIndex::from_sizes_rows(&rows).unwrap();

        // row order is kept, not sorted
        let names: Vec<&str> = index.chrom_names().collect();
        assert_eq!(names, vec!["chrB", "chrA"]);
        assert_eq!(index.chrom_length("chrA"), Some(10));
    }

    #[test]
    fn test_invalid_sizes() {
        let rows = vec![SizesRow::new("chr1", "10"), SizesRow::new("chr2", "ten")];
        assert!(matches!(
            ChromosomeIndex::from_sizes_rows(&rows),
            Err(IndexError::InvalidSizesData { line: 2, .. })
        ));

        let rows = vec![SizesRow::new("chr1", "-10")];
        assert!(matches!(
            ChromosomeIndex::from_sizes_rows(&rows),
            Err(IndexError::InvalidSizesData { line: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_chromosome() {
        let result = ChromosomeIndex::new(vec![("chr1", 10), ("chr1", 20)]);
        assert_eq!(result.unwrap_err(), IndexError::DuplicateChromosome("chr1".to_string()));
    }

    #[test]
    fn test_from_unordered() {
        let index = ChromosomeIndex::from_unordered(vec![
            ("chrX".to_string(), 5),
            ("chr10".to_string(), 5),
            ("chr2".to_string(), 5),
        ])
        .unwrap();
        let names: Vec<&str> = index.chrom_names().collect();
        assert_eq!(names, vec!["chr2", "chr10", "chrX"]);
    }

    #[test]
    fn test_to_absolute() {
        let index = create_test_index();
        assert_eq!(index.to_absolute("chr1", 0).unwrap(), 0);
        assert_eq!(index.to_absolute("chr2", 5).unwrap(), 1005);
        // no clamping
        assert_eq!(index.to_absolute("chr3", 900).unwrap(), 3900);
        assert_eq!(
            index.to_absolute("chrZ", 0),
            Err(IndexError::UnknownChromosome("chrZ".to_string()))
        );
    }

    #[test]
    fn test_to_relative_inside() {
        let index = create_test_index();

        let rel = index.to_relative(1500).unwrap();
        assert_eq!((rel.chrom, rel.offset, rel.out_of_bounds, rel.entry_index), ("chr2", 500, 0, 1));

        // chromosome boundary belongs to the next chromosome
        let rel = index.to_relative(1000).unwrap();
        assert_eq!((rel.chrom, rel.offset), ("chr2", 0));

        let rel = index.to_relative(999).unwrap();
        assert_eq!((rel.chrom, rel.offset), ("chr1", 999));
    }

    #[test]
    fn test_to_relative_before_start() {
        let index = create_test_index();
        let rel = index.to_relative(-5).unwrap();
        assert_eq!(rel.chrom, "chr1");
        assert_eq!(rel.offset, 1);
        assert_eq!(rel.out_of_bounds, -6);
        assert_eq!(rel.entry_index, 0);
    }

    #[test]
    fn test_to_relative_after_end() {
        let index = create_test_index();
        let rel = index.to_relative(3600).unwrap();
        assert_eq!(rel.chrom, "chr3");
        assert_eq!(rel.offset, 500);
        assert_eq!(rel.out_of_bounds, 100);

        // the genome end itself is not out of bounds
        let rel = index.to_relative(3500).unwrap();
        assert_eq!((rel.offset, rel.out_of_bounds), (500, 0));
    }

    #[test]
    fn test_empty_index() {
        let result = ChromosomeIndex::new(Vec::<(String, u64)>::new());
        assert_eq!(result.unwrap_err(), IndexError::EmptyIndex);

        let index = ChromosomeIndex::default();
        assert!(index.is_empty());
        assert_eq!(index.to_relative(0), Err(IndexError::EmptyIndex));
    }

    #[test]
    fn test_to_relative_extreme_positions() {
        let index = ChromosomeIndex::new(vec![("chr1", 1000)]).unwrap();

        let rel = index.to_relative(i64::MIN).unwrap();
        assert_eq!((rel.chrom, rel.offset, rel.out_of_bounds), ("chr1", 1, i64::MIN));

        let rel = index.to_relative(i64::MAX).unwrap();
        assert_eq!((rel.offset, rel.out_of_bounds), (1000, i64::MAX - 1000));
    }

    #[test]
    fn test_genome_length_overflow() {
        let rows = vec![
            SizesRow::new("chr1", "18446744073709551615"),
            SizesRow::new("chr2", "1"),
        ];
        assert!(matches!(
            ChromosomeIndex::from_sizes_rows(&rows),
            Err(IndexError::InvalidSizesData { line: 1, .. })
        ));

        let result = ChromosomeIndex::new(vec![("chr1", MAX_GENOME_LENGTH), ("chr2", 1)]);
        assert!(matches!(result, Err(IndexError::InvalidSizesData { line: 2, .. })));

        let index = ChromosomeIndex::new(vec![("chr1", MAX_GENOME_LENGTH - 1), ("chr2", 1)]).unwrap();
        assert_eq!(index.total_length(), MAX_GENOME_LENGTH);
        let rel = index.to_relative(i64::MAX).unwrap();
        assert_eq!((rel.chrom, rel.offset, rel.out_of_bounds), ("chr2", 1, 0));
    }

    #[test]
    fn test_to_absolute_overflow() {
        let index = ChromosomeIndex::new(vec![("chr1", 1000), ("chr2", 1000)]).unwrap();
        assert_eq!(
            index.to_absolute("chr2", u64::MAX),
            Err(IndexError::OffsetOutOfRange {
                chrom: "chr2".to_string(),
                offset: u64::MAX,
            })
        );
    }
}
