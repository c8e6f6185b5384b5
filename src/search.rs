//! Range search: the records overlapping a window.
//!
//! Two strategies share one interface:
//! - [`RangeSearch::Binary`] searches a sorted in-memory [`SequenceIndex`]
//!   in O(log n + k) per sub-range.
//! - [`RangeSearch::Linear`] re-opens the input for every sub-range and
//!   scans the sequence's records in file order. It assumes records are
//!   ascending by start within the sequence and costs O(n) per sub-range.
//!
//! A window's sub-ranges are searched in order and their matches chained.
//! Matches are reported per sub-range, so a record spanning two sub-ranges
//! is seen twice.

use crate::gff::{GffRecord, GffSource, Result, SequenceFilter};
use crate::index::{BinaryMatches, SequenceIndex};
use crate::interval::SubRange;
use crate::window::Window;
use std::borrow::Cow;
use std::path::Path;

/// Where a sequence's records are looked up.
pub enum RangeSearch<'a, S: GffSource + ?Sized = Path> {
    Binary(&'a SequenceIndex),
    Linear { source: &'a S, seqname: &'a str },
}

impl<S: GffSource + ?Sized> Clone for RangeSearch<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: GffSource + ?Sized> Copy for RangeSearch<'_, S> {}

impl<'a, S: GffSource + ?Sized + 'a> RangeSearch<'a, S> {
    /// Records overlapping one sub-range.
    pub fn sub_range(&self, range: SubRange) -> Result<SubRangeMatches<'a, S>> {
        match *self {
            RangeSearch::Binary(index) => Ok(SubRangeMatches::Binary(
                index.matches(range.start, range.end),
            )),
            RangeSearch::Linear { source, seqname } => {
                let records = source.open()?.sequence_records(seqname);
                Ok(SubRangeMatches::Linear(LinearMatches {
                    records,
                    lo: range.start,
                    hi: range.end,
                    done: false,
                }))
            }
        }
    }

    /// Records overlapping any sub-range of `window`, sub-range by sub-range.
    pub fn window(&self, window: &Window) -> WindowMatches<'a, S> {
        WindowMatches {
            search: *self,
            ranges: window.ranges.clone().into_iter(),
            current: None,
        }
    }
}

/// Linear scan of one sequence for one sub-range.
pub struct LinearMatches<'a, S: GffSource + ?Sized + 'a> {
    records: SequenceFilter<S::Reader<'a>>,
    lo: u64,
    hi: u64,
    done: bool,
}

impl<'a, S: GffSource + ?Sized + 'a> Iterator for LinearMatches<'a, S> {
    type Item = Result<GffRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.records.next() {
                None => self.done = true,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(record)) => {
                    if record.start > self.hi {
                        self.done = true;
                    } else if record.overlaps(self.lo, self.hi) {
                        return Some(Ok(record));
                    }
                }
            }
        }
        None
    }
}

/// Matches for one sub-range, from either strategy.
pub enum SubRangeMatches<'a, S: GffSource + ?Sized + 'a> {
    Binary(BinaryMatches<'a>),
    Linear(LinearMatches<'a, S>),
}

impl<'a, S: GffSource + ?Sized + 'a> Iterator for SubRangeMatches<'a, S> {
    type Item = Result<Cow<'a, GffRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SubRangeMatches::Binary(matches) => matches.next().map(|r| Ok(Cow::Borrowed(r))),
            SubRangeMatches::Linear(matches) => matches.next().map(|r| r.map(Cow::Owned)),
        }
    }
}

/// Matches of every sub-range of a window, flattened in sub-range order.
pub struct WindowMatches<'a, S: GffSource + ?Sized + 'a> {
    search: RangeSearch<'a, S>,
    ranges: std::vec::IntoIter<SubRange>,
    current: Option<SubRangeMatches<'a, S>>,
}

impl<'a, S: GffSource + ?Sized + 'a> Iterator for WindowMatches<'a, S> {
    type Item = Result<Cow<'a, GffRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = &mut self.current {
                match current.next() {
                    Some(item) => return Some(item),
                    None => self.current = None,
                }
            }
            let range = self.ranges.next()?;
            match self.search.sub_range(range) {
                Ok(matches) => self.current = Some(matches),
                Err(e) => {
                    self.ranges = Vec::new().into_iter();
                    return Some(Err(e));
                }
            }
        }
    }
}
