//! Window generation.
//!
//! A [`Window`] is one unit of aggregation: one or more sorted sub-ranges,
//! optionally labelled with the locus it came from. Windows are produced
//! lazily, either by sliding a fixed-width window along a sequence
//! ([`SlidingWindows`]) or by walking the loci of an annotation file
//! ([`LocusIndex`] / [`LocusWindows`]).

use crate::attribute;
use crate::gff::{GffReader, GffRecord, Result};
use crate::interval::SubRange;
use log::{debug, warn};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// A set of sorted sub-ranges scored together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub ranges: Vec<SubRange>,
    pub locus: Option<String>,
}

impl Window {
    /// A window with a single range and no locus.
    pub fn single(start: u64, end: u64) -> Self {
        Self {
            ranges: vec![SubRange::new(start, end)],
            locus: None,
        }
    }

    /// Reported extent: first range start to last range end.
    pub fn span(&self) -> Option<SubRange> {
        let first = self.ranges.first()?;
        let last = self.ranges.last()?;
        Some(SubRange::new(first.start, last.end))
    }
}

/// Fixed-width windows advancing by a fixed step.
///
/// Starting at `lower`, emits `[i, min(i + width - 1, upper)]` and advances
/// `i` by `step` until `i` passes `upper`. The last window is truncated at
/// `upper` rather than dropped.
#[derive(Debug, Clone)]
pub struct SlidingWindows {
    cursor: Option<u64>,
    width: u64,
    step: u64,
    upper: u64,
}

impl SlidingWindows {
    pub fn new(width: u64, step: u64, lower: u64, upper: u64) -> Self {
        Self {
            cursor: Some(lower),
            width: width.max(1),
            step: step.max(1),
            upper,
        }
    }

    /// One window per coordinate.
    pub fn per_coordinate(lower: u64, upper: u64) -> Self {
        Self::new(1, 1, lower, upper)
    }
}

impl Iterator for SlidingWindows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        let start = self.cursor.filter(|&i| i <= self.upper)?;
        let end = start.saturating_add(self.width - 1).min(self.upper);
        self.cursor = start.checked_add(self.step);
        Some(Window::single(start, end))
    }
}

/// Locus ranges of an annotation file, grouped by sequence.
#[derive(Debug, Default)]
pub struct LocusIndex {
    loci: FxHashMap<String, BTreeMap<String, Vec<SubRange>>>,
    skipped: usize,
}

impl LocusIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an annotation file.
    pub fn from_path<P: AsRef<Path>>(path: P, tag: &str, merge: Option<&str>) -> Result<Self> {
        Self::from_reader(GffReader::from_path(path)?, tag, merge)
    }

    /// Build by consuming an annotation stream.
    ///
    /// With `merge` set, only records of that feature are used and their ids
    /// lose a trailing `.suffix`, folding exons onto their gene.
    pub fn from_reader<R: Read>(mut reader: GffReader<R>, tag: &str, merge: Option<&str>) -> Result<Self> {
        let mut index = Self::new();
        while let Some(record) = reader.read_record()? {
            index.insert(&record, tag, merge);
        }
        debug!(
            "annotation: {} loci on {} sequences, {} records without a locus id",
            index.len(),
            index.loci.len(),
            index.skipped
        );
        Ok(index)
    }

    /// Add one annotation record. Returns false if it was not used.
    pub fn insert(&mut self, record: &GffRecord, tag: &str, merge: Option<&str>) -> bool {
        if let Some(feature) = merge {
            if record.feature != feature {
                return false;
            }
        }

        let Some(id) = attribute::locus_id(&record.attribute, tag) else {
            warn!(
                "{}:{}-{} {}: no '{}' attribute or locus id, skipped",
                record.seqname, record.start, record.end, record.feature, tag
            );
            self.skipped += 1;
            return false;
        };
        let id = if merge.is_some() {
            attribute::strip_suffix_id(id)
        } else {
            id
        };

        self.loci
            .entry(record.seqname.clone())
            .or_default()
            .entry(id.to_string())
            .or_default()
            .push(record.range());
        true
    }

    /// Remove and return the windows of one sequence.
    pub fn take_sequence(&mut self, seqname: &str) -> LocusWindows {
        LocusWindows {
            loci: self.loci.remove(seqname).unwrap_or_default(),
        }
    }

    /// Number of loci still held.
    pub fn len(&self) -> usize {
        self.loci.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }

    /// Records dropped for lacking a locus id.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Ranges recorded for a locus, in insertion order.
    pub fn ranges(&self, seqname: &str, locus: &str) -> Option<&[SubRange]> {
        self.loci.get(seqname)?.get(locus).map(Vec::as_slice)
    }
}

/// Windows of one sequence's loci, in lexicographic locus order.
#[derive(Debug, Default)]
pub struct LocusWindows {
    loci: BTreeMap<String, Vec<SubRange>>,
}

impl LocusWindows {
    pub fn remaining(&self) -> usize {
        self.loci.len()
    }
}

impl Iterator for LocusWindows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        let (locus, mut ranges) = self.loci.pop_first()?;
        ranges.sort_unstable();
        ranges.dedup();
        Some(Window {
            ranges,
            locus: Some(locus),
        })
    }
}

/// Windows of one sequence from either generator.
#[derive(Debug)]
pub enum WindowSource {
    Sliding(SlidingWindows),
    Loci(LocusWindows),
}

impl Iterator for WindowSource {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        match self {
            WindowSource::Sliding(windows) => windows.next(),
            WindowSource::Loci(windows) => windows.next(),
        }
    }
}
