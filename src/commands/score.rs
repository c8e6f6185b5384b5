//! Score command: aggregate GFF records over windows and emit GFF.
//!
//! Processing is per sequence, in sorted-name order:
//!
//! 1. A first pass over the input lists the distinct sequences.
//! 2. For each sequence, windows come from the annotation loci or from a
//!    sliding window over `[1, upper]`.
//! 3. Every window's sub-ranges are searched, the matches fed to the
//!    scheme's aggregator, and one record written per scored window.
//!
//! With sorting on, each sequence is loaded into a [`SequenceIndex`] and
//! dropped before the next one. Grouped input is read once through a
//! shared [`LookaheadReader`]; anything else is re-read per sequence.
//! With sorting off, nothing is held in memory and every sub-range
//! re-scans the input.

use crate::config::ScoreConfig;
use crate::gff::{scan_sequences, GffSource, LookaheadReader, Result, SequenceSummary};
use crate::index::SequenceIndex;
use crate::scoring::{Aggregator, WindowScorer};
use crate::search::RangeSearch;
use crate::streaming::GffWriter;
use crate::window::{LocusIndex, SlidingWindows, Window, WindowSource};
use log::{debug, info};
use std::io::Write;
use std::path::Path;

/// Counters reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreStats {
    /// Sequences processed.
    pub sequences: usize,
    /// Windows generated, scored or not.
    pub windows: u64,
    /// Windows without data.
    pub empty: u64,
    /// Output lines written.
    pub lines: u64,
}

/// Window scoring over one GFF input.
#[derive(Debug, Clone)]
pub struct ScoreCommand {
    config: ScoreConfig,
}

impl ScoreCommand {
    /// Validates the configuration up front.
    pub fn new(config: ScoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Score a GFF file, loading the configured annotation if any.
    pub fn run<P: AsRef<Path>, W: Write>(&self, input: P, output: W) -> Result<ScoreStats> {
        let loci = self.load_loci()?;
        self.run_source(input.as_ref(), loci, output)
    }

    fn load_loci(&self) -> Result<Option<LocusIndex>> {
        match &self.config.annotation {
            Some(path) => {
                let loci =
                    LocusIndex::from_path(path, &self.config.tag, self.config.merge.as_deref())?;
                info!("loaded {} loci from {}", loci.len(), path.display());
                Ok(Some(loci))
            }
            None => Ok(None),
        }
    }

    /// Score any re-readable source against an optional locus index.
    pub fn run_source<S, W>(
        &self,
        input: &S,
        mut loci: Option<LocusIndex>,
        output: W,
    ) -> Result<ScoreStats>
    where
        S: GffSource + ?Sized,
        W: Write,
    {
        let scan = scan_sequences(input.open()?)?;
        info!(
            "{} sequences, {}",
            scan.sequences.len(),
            if scan.grouped { "grouped" } else { "interleaved" }
        );

        let label = self.config.feature_label();
        let mut writer = GffWriter::new(output);
        let mut stats = ScoreStats::default();

        let mut shared = if self.config.sort && scan.grouped {
            Some(LookaheadReader::new(input.open()?))
        } else {
            None
        };

        for (seqname, summary) in &scan.sequences {
            let index = if self.config.sort {
                let index = match shared.as_mut() {
                    Some(lookahead) => {
                        SequenceIndex::from_records(seqname.as_str(), lookahead.sequence(seqname))?
                    }
                    None => SequenceIndex::from_records(
                        seqname.as_str(),
                        input.open()?.sequence_records(seqname.as_str()),
                    )?,
                };
                Some(index)
            } else {
                None
            };

            let search = match &index {
                Some(index) => RangeSearch::Binary(index),
                None => RangeSearch::Linear {
                    source: input,
                    seqname: seqname.as_str(),
                },
            };
            debug!(
                "{}: {} search",
                seqname,
                if index.is_some() { "binary" } else { "linear" }
            );
            let upper = self.upper_bound(seqname, index.as_ref(), summary);
            let windows = match loci.as_mut() {
                Some(loci) => WindowSource::Loci(loci.take_sequence(seqname)),
                None => WindowSource::Sliding(SlidingWindows::new(
                    self.config.width,
                    self.config.step,
                    1,
                    upper,
                )),
            };

            let before = stats;
            for window in windows {
                self.score_window(search, &window, seqname, &label, &mut writer, &mut stats)?;
            }
            stats.sequences += 1;
            info!(
                "{}: {} records, {} windows, {} empty",
                seqname,
                summary.records,
                stats.windows - before.windows,
                stats.empty - before.empty
            );
        }

        if let Some(loci) = &loci {
            if !loci.is_empty() {
                debug!("{} loci on sequences absent from input", loci.len());
            }
        }

        writer.flush()?;
        stats.lines = writer.lines();
        Ok(stats)
    }

    /// Last coordinate of sliding windows: the genome table entry if present,
    /// otherwise the last record's end.
    fn upper_bound(
        &self,
        seqname: &str,
        index: Option<&SequenceIndex>,
        summary: &SequenceSummary,
    ) -> u64 {
        if let Some(length) = self.config.lengths.as_ref().and_then(|t| t.length(seqname)) {
            return length;
        }
        index
            .and_then(SequenceIndex::last_end)
            .unwrap_or(summary.last_end)
    }

    fn score_window<S, W>(
        &self,
        search: RangeSearch<'_, S>,
        window: &Window,
        seqname: &str,
        label: &str,
        writer: &mut GffWriter<W>,
        stats: &mut ScoreStats,
    ) -> Result<()>
    where
        S: GffSource + ?Sized,
        W: Write,
    {
        let Some(span) = window.span() else {
            return Ok(());
        };
        stats.windows += 1;

        let mut aggregator = Aggregator::new(self.config.scheme, self.config.reverse);
        for record in search.window(window) {
            let record = record?;
            aggregator.push(&record);
        }

        match aggregator.finish() {
            Some(result) => writer.write_window(
                seqname,
                label,
                span.start,
                span.end,
                window.locus.as_deref(),
                Some(&result),
            ),
            None => {
                stats.empty += 1;
                if self.config.no_skip {
                    writer.write_window(
                        seqname,
                        label,
                        span.start,
                        span.end,
                        window.locus.as_deref(),
                        None,
                    )
                } else {
                    Ok(())
                }
            }
        }
    }
}
