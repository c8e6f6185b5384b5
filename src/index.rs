//! In-memory record index for one sequence.
//!
//! Records are sorted by start. Alongside them the index keeps the running
//! maximum of end coordinates, which is monotonic even when the ends
//! themselves are not; the binary search and the downward expansion both
//! use it so that long intervals enclosing shorter ones are never missed.

use crate::gff::{GffRecord, Result};
use log::debug;

/// Sorted records of one sequence.
#[derive(Debug, Clone)]
pub struct SequenceIndex {
    seqname: String,
    records: Vec<GffRecord>,
    max_end: Vec<u64>,
}

impl SequenceIndex {
    /// Build an index, sorting records by start. The sort is stable.
    pub fn new(seqname: impl Into<String>, mut records: Vec<GffRecord>) -> Self {
        records.sort_by_key(|r| r.start);

        let mut max_end = Vec::with_capacity(records.len());
        let mut running = 0u64;
        for record in &records {
            running = running.max(record.end);
            max_end.push(running);
        }

        let seqname = seqname.into();
        debug!("index {}: {} records", seqname, records.len());
        Self {
            seqname,
            records,
            max_end,
        }
    }

    /// Build an index from a record stream.
    pub fn from_records<I>(seqname: impl Into<String>, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<GffRecord>>,
    {
        let records = records.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(Self::new(seqname, records))
    }

    pub fn seqname(&self) -> &str {
        &self.seqname
    }

    pub fn records(&self) -> &[GffRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// End of the last record in sorted order.
    pub fn last_end(&self) -> Option<u64> {
        self.records.last().map(|r| r.end)
    }

    /// Binary search for any record overlapping `[lo, hi]`.
    fn find_seed(&self, lo: u64, hi: u64) -> Option<usize> {
        let mut low = 0;
        let mut high = self.records.len();

        while low < high {
            let mid = low + (high - low) / 2;
            let record = &self.records[mid];
            if self.max_end[mid] < lo {
                // Nothing at or left of mid reaches lo.
                low = mid + 1;
            } else if record.start > hi {
                high = mid;
            } else if record.overlaps(lo, hi) {
                return Some(mid);
            } else {
                // Some record left of mid reaches lo and starts before hi.
                high = mid;
            }
        }
        None
    }

    /// Lazily yield every record overlapping `[lo, hi]`, each once.
    pub fn matches(&self, lo: u64, hi: u64) -> BinaryMatches<'_> {
        match self.find_seed(lo, hi) {
            Some(seed) => BinaryMatches {
                index: self,
                lo,
                hi,
                seed,
                upper: seed,
                lower: seed,
                phase: Phase::Up,
            },
            None => BinaryMatches {
                index: self,
                lo,
                hi,
                seed: 0,
                upper: 0,
                lower: 0,
                phase: Phase::Done,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Up,
    Down,
    Seed,
    Done,
}

/// Records overlapping one sub-range, expanding outward from a seed.
///
/// Neighbors above the seed come first, then neighbors below, then the seed.
#[derive(Debug, Clone)]
pub struct BinaryMatches<'a> {
    index: &'a SequenceIndex,
    lo: u64,
    hi: u64,
    seed: usize,
    upper: usize,
    lower: usize,
    phase: Phase,
}

impl<'a> Iterator for BinaryMatches<'a> {
    type Item = &'a GffRecord;

    fn next(&mut self) -> Option<&'a GffRecord> {
        let records = &self.index.records;
        loop {
            match self.phase {
                Phase::Up => {
                    let next = self.upper + 1;
                    if next < records.len() && records[next].start <= self.hi {
                        self.upper = next;
                        if records[next].overlaps(self.lo, self.hi) {
                            return Some(&records[next]);
                        }
                    } else {
                        self.phase = Phase::Down;
                    }
                }
                Phase::Down => {
                    if self.lower > 0 && self.index.max_end[self.lower - 1] >= self.lo {
                        self.lower -= 1;
                        if records[self.lower].overlaps(self.lo, self.hi) {
                            return Some(&records[self.lower]);
                        }
                    } else {
                        self.phase = Phase::Seed;
                    }
                }
                Phase::Seed => {
                    self.phase = Phase::Done;
                    return Some(&records[self.seed]);
                }
                Phase::Done => return None,
            }
        }
    }
}
