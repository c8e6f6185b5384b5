//! Streaming GFF reader.
//!
//! A GFF line has nine tab-separated columns:
//! `sequence source feature start end score strand frame attribute`.
//! Coordinates are 1-based and closed.

use crate::interval::{Strand, SubRange};
use crate::streaming::parsing::{is_comment, parse_u64_fast, split_gff_fields, trim_line_end};
use log::warn;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::ConfigError;

/// Input buffer size (256 KB).
const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Initial line buffer capacity.
const DEFAULT_LINE_BUFFER: usize = 1024;

/// Errors surfaced by the scoring engine.
#[derive(Error, Debug)]
pub enum GffError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{}: {source}", .path.display())]
    File { path: PathBuf, source: io::Error },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, GffError>;

/// One annotation line.
#[derive(Debug, Clone, PartialEq)]
pub struct GffRecord {
    /// Lowercased sequence name.
    pub seqname: String,
    pub source: String,
    pub feature: String,
    pub start: u64,
    pub end: u64,
    /// None for the `.` placeholder or any non-numeric or non-finite score.
    pub score: Option<f64>,
    pub strand: Strand,
    pub frame: String,
    pub attribute: String,
}

impl GffRecord {
    #[inline]
    pub fn range(&self) -> SubRange {
        SubRange::new(self.start, self.end)
    }

    /// Closed-interval overlap with `[lo, hi]`.
    #[inline]
    pub fn overlaps(&self, lo: u64, hi: u64) -> bool {
        self.range().overlaps(lo, hi)
    }
}

impl fmt::Display for GffRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t",
            self.seqname, self.source, self.feature, self.start, self.end
        )?;
        match self.score {
            Some(score) => write!(f, "{}", score)?,
            None => write!(f, ".")?,
        }
        write!(f, "\t{}\t{}\t{}", self.strand, self.frame, self.attribute)
    }
}

/// Parse one non-comment line. Returns None for malformed lines.
pub fn parse_record(line: &str) -> Option<GffRecord> {
    let fields = split_gff_fields(line)?;
    let start = parse_u64_fast(fields[3].trim().as_bytes())?;
    let end = parse_u64_fast(fields[4].trim().as_bytes())?;

    Some(GffRecord {
        seqname: fields[0].to_lowercase(),
        source: fields[1].to_string(),
        feature: fields[2].to_string(),
        start,
        end,
        score: fields[5]
            .trim()
            .parse()
            .ok()
            .filter(|s: &f64| s.is_finite()),
        strand: Strand::parse(fields[6]),
        frame: fields[7].to_string(),
        attribute: fields[8].replace('\r', ""),
    })
}

/// Result of reading one line.
#[derive(Debug, Clone, PartialEq)]
pub enum GffLine {
    Record(GffRecord),
    /// Comment, blank or malformed line. Not the end of input.
    Skip,
}

/// A streaming GFF reader.
pub struct GffReader<R: Read> {
    reader: BufReader<R>,
    path: Option<PathBuf>,
    line_number: usize,
    buffer: Vec<u8>,
    malformed: usize,
}

impl GffReader<File> {
    /// Open a GFF file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| GffError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = Self::new(file);
        reader.path = Some(path.to_path_buf());
        Ok(reader)
    }
}

impl<R: Read> GffReader<R> {
    /// Create a new GFF reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_INPUT_BUFFER, reader),
            path: None,
            line_number: 0,
            buffer: Vec::with_capacity(DEFAULT_LINE_BUFFER),
            malformed: 0,
        }
    }

    /// Read one line: a record, a skip marker, or None at end of input.
    pub fn read_line(&mut self) -> Result<Option<GffLine>> {
        self.buffer.clear();
        let bytes_read = match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(n) => n,
            Err(source) => {
                return Err(match &self.path {
                    Some(path) => GffError::File {
                        path: path.clone(),
                        source,
                    },
                    None => GffError::Io(source),
                })
            }
        };
        if bytes_read == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let Ok(text) = std::str::from_utf8(&self.buffer) else {
            self.malformed += 1;
            warn!(
                "{}line {}: invalid UTF-8, skipped",
                self.location(),
                self.line_number
            );
            return Ok(Some(GffLine::Skip));
        };
        let line = trim_line_end(text);
        if line.trim().is_empty() || is_comment(line) {
            return Ok(Some(GffLine::Skip));
        }

        match parse_record(line) {
            Some(record) => Ok(Some(GffLine::Record(record))),
            None => {
                self.malformed += 1;
                warn!(
                    "{}line {}: not a 9-column GFF record, skipped",
                    self.location(),
                    self.line_number
                );
                Ok(Some(GffLine::Skip))
            }
        }
    }

    /// Read the next record, passing over skipped lines.
    pub fn read_record(&mut self) -> Result<Option<GffRecord>> {
        loop {
            match self.read_line()? {
                Some(GffLine::Record(record)) => return Ok(Some(record)),
                Some(GffLine::Skip) => continue,
                None => return Ok(None),
            }
        }
    }

    /// Lines read so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Malformed lines skipped so far.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    fn location(&self) -> String {
        match &self.path {
            Some(path) => format!("{}: ", path.display()),
            None => String::new(),
        }
    }

    /// Get an iterator over the records of one sequence.
    pub fn sequence_records(self, seqname: impl Into<String>) -> SequenceFilter<R> {
        SequenceFilter {
            reader: self,
            seqname: seqname.into(),
        }
    }
}

/// Something that can be opened for reading more than once.
///
/// Unsorted input is re-scanned for every window, and per-sequence indexes
/// may re-read the input, so sources hand out fresh readers on demand.
pub trait GffSource {
    type Reader<'s>: Read
    where
        Self: 's;

    fn open(&self) -> Result<GffReader<Self::Reader<'_>>>;
}

impl GffSource for Path {
    type Reader<'s> = File;

    fn open(&self) -> Result<GffReader<File>> {
        GffReader::from_path(self)
    }
}

impl GffSource for [u8] {
    type Reader<'s> = &'s [u8];

    fn open(&self) -> Result<GffReader<&[u8]>> {
        Ok(GffReader::new(self))
    }
}

/// Records of a single sequence, drawn from a full stream.
pub struct SequenceFilter<R: Read> {
    reader: GffReader<R>,
    seqname: String,
}

impl<R: Read> Iterator for SequenceFilter<R> {
    type Item = Result<GffRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_record() {
                Ok(Some(record)) if record.seqname == self.seqname => return Some(Ok(record)),
                Ok(Some(_)) => continue,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Outcome of one [`LookaheadReader::next_for`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookahead {
    /// A record of the requested sequence.
    Match(GffRecord),
    /// A skipped line; call again.
    Skip,
    /// The next record belongs to another sequence and is held back.
    Deferred,
    /// End of input.
    End,
}

/// Shares one stream between consumers that each read one sequence.
///
/// At most one record is held back: when a pulled record belongs to a
/// different sequence than requested, it stays buffered for the consumer
/// of that sequence.
pub struct LookaheadReader<R: Read> {
    reader: GffReader<R>,
    pending: Option<GffRecord>,
}

impl<R: Read> LookaheadReader<R> {
    pub fn new(reader: GffReader<R>) -> Self {
        Self {
            reader,
            pending: None,
        }
    }

    /// Pull the next record of `seqname`.
    pub fn next_for(&mut self, seqname: &str) -> Result<Lookahead> {
        if let Some(pending) = &self.pending {
            if pending.seqname == seqname {
                return Ok(self.pending.take().map_or(Lookahead::End, Lookahead::Match));
            }
            return Ok(Lookahead::Deferred);
        }

        match self.reader.read_line()? {
            None => Ok(Lookahead::End),
            Some(GffLine::Skip) => Ok(Lookahead::Skip),
            Some(GffLine::Record(record)) if record.seqname == seqname => {
                Ok(Lookahead::Match(record))
            }
            Some(GffLine::Record(record)) => {
                self.pending = Some(record);
                Ok(Lookahead::Deferred)
            }
        }
    }

    /// Sequence of the held-back record, if any.
    pub fn pending_sequence(&self) -> Option<&str> {
        self.pending.as_ref().map(|r| r.seqname.as_str())
    }

    /// Iterate over `seqname`'s records until another sequence or end of input.
    pub fn sequence<'a>(&'a mut self, seqname: &'a str) -> SequenceRecords<'a, R> {
        SequenceRecords {
            reader: self,
            seqname,
        }
    }
}

/// Records of one sequence pulled through a [`LookaheadReader`].
pub struct SequenceRecords<'a, R: Read> {
    reader: &'a mut LookaheadReader<R>,
    seqname: &'a str,
}

impl<R: Read> Iterator for SequenceRecords<'_, R> {
    type Item = Result<GffRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.next_for(self.seqname) {
                Ok(Lookahead::Match(record)) => return Some(Ok(record)),
                Ok(Lookahead::Skip) => continue,
                Ok(Lookahead::Deferred) | Ok(Lookahead::End) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Per-sequence totals collected by [`scan_sequences`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceSummary {
    pub records: usize,
    /// End coordinate of the last record seen, in file order.
    pub last_end: u64,
}

/// Distinct sequences of an input, from one lightweight pass.
#[derive(Debug, Clone, Default)]
pub struct SequenceScan {
    pub sequences: BTreeMap<String, SequenceSummary>,
    /// Each sequence's records are contiguous and sequences appear in
    /// sorted-name order, so one shared stream can serve all of them.
    pub grouped: bool,
}

impl SequenceScan {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }
}

/// Collect the distinct sequences of a stream without keeping records.
pub fn scan_sequences<R: Read>(mut reader: GffReader<R>) -> Result<SequenceScan> {
    let mut scan = SequenceScan::default();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut current: Option<String> = None;
    let mut contiguous = true;
    let mut in_order = true;

    while let Some(record) = reader.read_record()? {
        if current.as_deref() != Some(record.seqname.as_str()) {
            if !seen.insert(record.seqname.clone()) {
                contiguous = false;
            }
            if let Some(prev) = &current {
                if prev.as_str() > record.seqname.as_str() {
                    in_order = false;
                }
            }
            current = Some(record.seqname.clone());
        }
        let summary = scan.sequences.entry(record.seqname).or_default();
        summary.records += 1;
        summary.last_end = record.end;
    }

    scan.grouped = contiguous && in_order;
    Ok(scan)
}
